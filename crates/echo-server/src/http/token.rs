//! Token endpoint handlers.
//!
//! `POST /api/oauth/token` serves both supported grants;
//! `POST /api/oauth/refresh` serves `refresh_token` only. Both accept the
//! request as `application/json` or `application/x-www-form-urlencoded` and
//! treat the two encodings identically.

use axum::Json;
use axum::body::Bytes;
use axum::extract::State;
use axum::http::{HeaderMap, StatusCode, header};
use axum::response::{IntoResponse, Response};

use echo_auth::error::AuthError;
use echo_auth::oauth::{TokenError, TokenErrorCode, TokenRequest, TokenResponse};

use crate::AppState;

/// `POST /api/oauth/token`.
pub async fn token_handler(
    State(state): State<AppState>,
    headers: HeaderMap,
    body: Bytes,
) -> Response {
    let request = match parse_token_request(&headers, &body) {
        Ok(request) => request,
        Err(e) => return token_error_response(&e),
    };

    tracing::debug!(
        grant_type = ?request.grant_type,
        client_id = ?request.client_id,
        "processing token request"
    );

    match state.tokens.handle(request).await {
        Ok(response) => token_success_response(&response),
        Err(e) => token_error_response(&e),
    }
}

/// `POST /api/oauth/refresh`.
///
/// Same wire contract as the token endpoint, restricted to the
/// `refresh_token` grant.
pub async fn refresh_handler(
    State(state): State<AppState>,
    headers: HeaderMap,
    body: Bytes,
) -> Response {
    let request = match parse_token_request(&headers, &body) {
        Ok(request) => request,
        Err(e) => return token_error_response(&e),
    };

    match state.tokens.refresh(request).await {
        Ok(response) => token_success_response(&response),
        Err(e) => token_error_response(&e),
    }
}

/// Decodes the request body according to its content type.
///
/// A missing content type is treated as form-urlencoded; anything other than
/// JSON or form data is rejected.
fn parse_token_request(headers: &HeaderMap, body: &Bytes) -> Result<TokenRequest, AuthError> {
    let content_type = headers
        .get(header::CONTENT_TYPE)
        .and_then(|value| value.to_str().ok())
        .unwrap_or("");
    let mime = content_type.split(';').next().unwrap_or("").trim();

    match mime {
        "application/json" => serde_json::from_slice(body)
            .map_err(|e| AuthError::invalid_request(format!("invalid JSON body: {e}"))),
        "application/x-www-form-urlencoded" | "" => serde_urlencoded::from_bytes(body)
            .map_err(|e| AuthError::invalid_request(format!("invalid form body: {e}"))),
        other => Err(AuthError::invalid_request(format!(
            "unsupported content type: {other}"
        ))),
    }
}

/// Tokens must never be cached by intermediaries (RFC 6749 section 5.1).
fn token_success_response(response: &TokenResponse) -> Response {
    (
        StatusCode::OK,
        [
            (header::CACHE_CONTROL, "no-store"),
            (header::PRAGMA, "no-cache"),
        ],
        Json(response),
    )
        .into_response()
}

/// Maps an [`AuthError`] onto the RFC 6749 token error vocabulary.
fn token_error_response(error: &AuthError) -> Response {
    let code = match error.oauth_error_code() {
        "invalid_client" => TokenErrorCode::InvalidClient,
        "invalid_grant" => TokenErrorCode::InvalidGrant,
        "unsupported_grant_type" => TokenErrorCode::UnsupportedGrantType,
        "server_error" => TokenErrorCode::ServerError,
        _ => TokenErrorCode::InvalidRequest,
    };

    let description = if error.is_server_error() {
        tracing::error!(category = %error.category(), error = %error, "token endpoint failure");
        "An unexpected error occurred".to_string()
    } else {
        tracing::debug!(category = %error.category(), error = %error, "rejected token request");
        error.to_string()
    };

    let status =
        StatusCode::from_u16(code.http_status()).unwrap_or(StatusCode::INTERNAL_SERVER_ERROR);
    (
        status,
        Json(TokenError::with_description(code, description)),
    )
        .into_response()
}
