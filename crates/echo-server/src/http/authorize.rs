//! Authorization endpoint handlers.
//!
//! `GET /api/oauth/authorize` drives the interactive flow: parameter
//! validation, session resolution, login redirect, consent page, and for
//! `prompt=none` the silent issue-and-redirect path. The consent form posts
//! back to `/api/oauth/authorize/decision`; XHR clients can instead POST the
//! request as JSON and receive the callback URL in the body.

use axum::Json;
use axum::extract::{OriginalUri, Query, State};
use axum::http::{StatusCode, header};
use axum::response::{Html, IntoResponse, Response};
use axum_extra::extract::CookieJar;
use serde::{Deserialize, Serialize};
use url::Url;

use echo_auth::error::AuthError;
use echo_auth::oauth::{AuthorizationRequest, OAuthErrorResponse, RawAuthorizationRequest};
use echo_auth::types::EchoApp;

use crate::AppState;
use crate::http::{SESSION_COOKIE, consent, oauth_error_response};

/// Response body for the JSON authorization flow.
#[derive(Debug, Serialize, Deserialize)]
pub struct AuthorizeResponse {
    /// Callback URL carrying the authorization code and state.
    pub redirect_url: String,
}

/// Consent form fields posted back from the consent page.
#[derive(Debug, Deserialize)]
pub struct ConsentForm {
    /// `approve`, `deny`, or `authorize_url`.
    pub action: String,
    #[serde(default)]
    client_id: Option<String>,
    #[serde(default)]
    redirect_uri: Option<String>,
    #[serde(default)]
    code_challenge: Option<String>,
    #[serde(default)]
    code_challenge_method: Option<String>,
    #[serde(default)]
    scope: Option<String>,
    #[serde(default)]
    state: Option<String>,
}

impl ConsentForm {
    fn into_raw(self) -> RawAuthorizationRequest {
        RawAuthorizationRequest {
            client_id: self.client_id,
            redirect_uri: self.redirect_uri,
            code_challenge: self.code_challenge,
            code_challenge_method: self.code_challenge_method,
            scope: self.scope,
            state: self.state,
            ..Default::default()
        }
    }
}

/// `GET /api/oauth/authorize`.
pub async fn authorize_handler(
    State(state): State<AppState>,
    OriginalUri(uri): OriginalUri,
    jar: CookieJar,
    Query(raw): Query<RawAuthorizationRequest>,
) -> Response {
    let request = match raw.validate() {
        Ok(request) => request,
        Err(e) => return oauth_error_response(&e),
    };
    let app = match state.authorization.lookup_app(&request).await {
        Ok(app) => app,
        Err(e) => return oauth_error_response(&e),
    };
    let user = match session_user(&state, &jar).await {
        Ok(user) => user,
        Err(e) => return oauth_error_response(&e),
    };

    if !app.authorizes_redirect(request.redirect_uri.as_str()) {
        // The app owner gets a chance to fix the allowlist inline instead of
        // a dead-end error.
        if let Some(user_id) = &user
            && app.is_owned_by(user_id)
        {
            return Html(consent::render_callback_authorization_page(&app, &request))
                .into_response();
        }
        return oauth_error_response(&AuthError::invalid_request(
            "redirect_uri is not authorized for this app",
        ));
    }

    let Some(user_id) = user else {
        if request.prompt_none {
            return oauth_error_response(&AuthError::LoginRequired);
        }
        return login_redirect(&state, &uri.to_string());
    };

    if request.prompt_none {
        return match state.authorization.grant(&request, &user_id).await {
            Ok(callback) => found(&callback),
            Err(e) => oauth_error_response(&e),
        };
    }

    Html(consent::render_consent_page(&app, &request)).into_response()
}

/// `POST /api/oauth/authorize` (JSON, for XHR clients).
///
/// Performs the same validation as the GET endpoint but requires an
/// authenticated session and returns the callback URL in the body instead of
/// redirecting.
pub async fn authorize_submit_handler(
    State(state): State<AppState>,
    jar: CookieJar,
    Json(raw): Json<RawAuthorizationRequest>,
) -> Response {
    let (request, _app) = match state.authorization.resolve(raw).await {
        Ok(resolved) => resolved,
        Err(e) => return oauth_error_response(&e),
    };

    let Some(user_id) = (match session_user(&state, &jar).await {
        Ok(user) => user,
        Err(e) => return oauth_error_response(&e),
    }) else {
        return login_required_response();
    };

    match state.authorization.grant(&request, &user_id).await {
        Ok(redirect_url) => Json(AuthorizeResponse { redirect_url }).into_response(),
        Err(e) => oauth_error_response(&e),
    }
}

/// `POST /api/oauth/authorize/decision` (consent form submission).
pub async fn decision_handler(
    State(state): State<AppState>,
    jar: CookieJar,
    axum::Form(form): axum::Form<ConsentForm>,
) -> Response {
    let action = form.action.clone();
    let request = match form.into_raw().validate() {
        Ok(request) => request,
        Err(e) => return oauth_error_response(&e),
    };
    let app = match state.authorization.lookup_app(&request).await {
        Ok(app) => app,
        Err(e) => return oauth_error_response(&e),
    };
    let Some(user_id) = (match session_user(&state, &jar).await {
        Ok(user) => user,
        Err(e) => return oauth_error_response(&e),
    }) else {
        return login_required_response();
    };

    match action.as_str() {
        "approve" => {
            if !redirect_authorized(&app, &request) {
                return unauthorized_redirect_response();
            }
            grant_and_redirect(&state, &request, &user_id).await
        }
        "authorize_url" => {
            if let Err(e) = state
                .authorization
                .authorize_callback_url(&app, &user_id, request.redirect_uri.as_str())
                .await
            {
                return oauth_error_response(&e);
            }
            grant_and_redirect(&state, &request, &user_id).await
        }
        "deny" => {
            if !redirect_authorized(&app, &request) {
                return unauthorized_redirect_response();
            }
            let callback =
                request.error_callback_url("access_denied", "The user denied the request");
            found(&callback)
        }
        other => oauth_error_response(&AuthError::invalid_request(format!(
            "unknown action: {other}"
        ))),
    }
}

fn redirect_authorized(app: &EchoApp, request: &AuthorizationRequest) -> bool {
    app.authorizes_redirect(request.redirect_uri.as_str())
}

fn unauthorized_redirect_response() -> Response {
    oauth_error_response(&AuthError::invalid_request(
        "redirect_uri is not authorized for this app",
    ))
}

fn login_required_response() -> Response {
    (
        StatusCode::UNAUTHORIZED,
        Json(OAuthErrorResponse::from_error(&AuthError::LoginRequired)),
    )
        .into_response()
}

/// Redirects an unauthenticated user to the control app's login page, with
/// the original authorize URL as the post-login destination.
fn login_redirect(state: &AppState, original_uri: &str) -> Response {
    let mut login = match Url::parse(&state.config.control_app_base_url) {
        Ok(url) => url,
        Err(e) => {
            return oauth_error_response(&AuthError::configuration(format!(
                "invalid control app base URL: {e}"
            )));
        }
    };
    login.set_path("/login");
    login
        .query_pairs_mut()
        .append_pair("redirect_url", original_uri);
    found(login.as_str())
}

/// Builds a `302 Found` redirect. OAuth front-channel redirects use 302
/// rather than axum's default 303.
fn found(location: &str) -> Response {
    (StatusCode::FOUND, [(header::LOCATION, location.to_string())]).into_response()
}

async fn session_user(state: &AppState, jar: &CookieJar) -> Result<Option<String>, AuthError> {
    match jar.get(SESSION_COOKIE) {
        None => Ok(None),
        Some(cookie) => state.sessions.find_user_by_token(cookie.value()).await,
    }
}

async fn grant_and_redirect(
    state: &AppState,
    request: &AuthorizationRequest,
    user_id: &str,
) -> Response {
    match state.authorization.grant(request, user_id).await {
        Ok(callback) => found(&callback),
        Err(e) => oauth_error_response(&e),
    }
}
