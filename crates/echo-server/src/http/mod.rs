//! HTTP routing and handlers for the OAuth endpoints.

pub mod authorize;
pub mod consent;
pub mod token;

use axum::http::StatusCode;
use axum::response::{IntoResponse, Response};
use axum::routing::{get, post};
use axum::{Json, Router};
use tower_http::cors::CorsLayer;
use tower_http::trace::TraceLayer;

use echo_auth::error::AuthError;
use echo_auth::oauth::OAuthErrorResponse;

use crate::AppState;

/// Name of the session cookie set by the Echo control app's login flow.
pub const SESSION_COOKIE: &str = "echo_session";

/// Builds the router for all OAuth endpoints.
pub fn router(state: AppState) -> Router {
    Router::new()
        .route("/healthz", get(health_handler))
        .route(
            "/api/oauth/authorize",
            get(authorize::authorize_handler).post(authorize::authorize_submit_handler),
        )
        .route(
            "/api/oauth/authorize/decision",
            post(authorize::decision_handler),
        )
        .route("/api/oauth/token", post(token::token_handler))
        .route("/api/oauth/refresh", post(token::refresh_handler))
        .layer(TraceLayer::new_for_http())
        .layer(CorsLayer::permissive())
        .with_state(state)
}

/// Liveness probe.
async fn health_handler() -> Response {
    Json(serde_json::json!({ "status": "ok" })).into_response()
}

/// Builds the standard `{error, error_description}` JSON response for
/// authorization endpoint failures.
pub(crate) fn oauth_error_response(error: &AuthError) -> Response {
    if error.is_server_error() {
        tracing::error!(category = %error.category(), error = %error, "authorize endpoint failure");
    } else {
        tracing::debug!(category = %error.category(), error = %error, "rejected authorize request");
    }

    let status =
        StatusCode::from_u16(error.http_status()).unwrap_or(StatusCode::INTERNAL_SERVER_ERROR);
    (status, Json(OAuthErrorResponse::from_error(error))).into_response()
}
