//! Authorization endpoint request validation.
//!
//! Raw query or JSON-body parameters are parsed into a typed
//! [`AuthorizationRequest`] before anything else happens. Validation is pure:
//! an invalid combination of parameters never reaches client lookup, session
//! resolution, or code issuance.
//!
//! # OAuth 2.0 Authorization Code Flow
//!
//! 1. Client redirects the user to the authorization endpoint
//! 2. Server validates the parameters, the app, and the redirect URI
//! 3. User authenticates and consents (or `prompt=none` skips consent)
//! 4. Server redirects back to the app with a signed authorization code
//! 5. App exchanges the code for tokens at the token endpoint

use serde::{Deserialize, Serialize};
use url::Url;
use uuid::Uuid;

use crate::error::AuthError;
use crate::oauth::pkce::{PkceChallenge, PkceChallengeMethod};

/// Raw authorization request parameters as received on the wire.
///
/// Everything is optional at this layer; [`RawAuthorizationRequest::validate`]
/// decides what is required and with which defaults.
///
/// # Example
///
/// ```ignore
/// GET /api/oauth/authorize?
///   response_type=code
///   &client_id=0b2a9eb8-56e2-4a19-a967-5c53dbb5a28b
///   &redirect_uri=http://localhost:3000/callback
///   &scope=llm:invoke offline_access
///   &state=abc123xyz
///   &code_challenge=E9Melhoa2OwvFrEMTJguCHaoeK1t8URWbuGJSstw-cM
///   &code_challenge_method=S256
/// ```
#[derive(Debug, Clone, Default, Deserialize, Serialize)]
pub struct RawAuthorizationRequest {
    /// Client identifier (UUID of a registered Echo app).
    #[serde(default)]
    pub client_id: Option<String>,

    /// Redirect URI where the code will be sent.
    #[serde(default)]
    pub redirect_uri: Option<String>,

    /// PKCE code challenge (base64url, 43-128 characters).
    #[serde(default)]
    pub code_challenge: Option<String>,

    /// PKCE code challenge method. Must be `S256`.
    #[serde(default)]
    pub code_challenge_method: Option<String>,

    /// Requested scopes (space-separated). Defaults to
    /// `llm:invoke offline_access`.
    #[serde(default)]
    pub scope: Option<String>,

    /// Opaque client state, echoed back verbatim on redirect.
    /// Defaults to a random id when absent.
    #[serde(default)]
    pub state: Option<String>,

    /// Must be `code` when present; defaults to `code`.
    #[serde(default)]
    pub response_type: Option<String>,

    /// `prompt=none` requests silent authorization (no consent UI, error
    /// instead of login redirect).
    #[serde(default)]
    pub prompt: Option<String>,
}

impl RawAuthorizationRequest {
    /// Validates the raw parameters into a typed request.
    ///
    /// # Errors
    ///
    /// Returns `invalid_request` for malformed `client_id`, `redirect_uri`
    /// or PKCE parameters, and `unsupported_response_type` for any
    /// `response_type` other than `code`.
    pub fn validate(self) -> Result<AuthorizationRequest, AuthError> {
        let client_id = self
            .client_id
            .as_deref()
            .filter(|s| !s.is_empty())
            .ok_or_else(|| AuthError::invalid_request("client_id is required"))?;
        let client_id = Uuid::parse_str(client_id)
            .map_err(|_| AuthError::invalid_request("client_id must be a valid UUID"))?;

        let redirect_uri = self
            .redirect_uri
            .as_deref()
            .filter(|s| !s.is_empty())
            .ok_or_else(|| AuthError::invalid_request("redirect_uri is required"))?;
        let redirect_uri = Url::parse(redirect_uri)
            .map_err(|_| AuthError::invalid_request("redirect_uri must be an absolute URL"))?;

        match self.response_type.as_deref() {
            None | Some("code") => {}
            Some(other) => return Err(AuthError::unsupported_response_type(other)),
        }

        let code_challenge = self
            .code_challenge
            .ok_or_else(|| AuthError::invalid_request("code_challenge is required"))?;
        let code_challenge = PkceChallenge::new(code_challenge)
            .map_err(|e| AuthError::invalid_request(e.to_string()))?;

        let code_challenge_method =
            PkceChallengeMethod::parse(self.code_challenge_method.as_deref().unwrap_or(""))
                .map_err(|e| AuthError::invalid_request(e.to_string()))?;

        let scope = self
            .scope
            .filter(|s| !s.trim().is_empty())
            .unwrap_or_else(|| crate::config::DEFAULT_SCOPE.to_string());

        let state = self
            .state
            .filter(|s| !s.is_empty())
            .unwrap_or_else(generate_state);

        let prompt_none = self.prompt.as_deref() == Some("none");

        Ok(AuthorizationRequest {
            client_id,
            redirect_uri,
            code_challenge,
            code_challenge_method,
            scope,
            state,
            prompt_none,
        })
    }
}

/// A fully validated authorization request.
///
/// Construction goes through [`RawAuthorizationRequest::validate`]; holding
/// one of these means every parameter-level check has already passed.
#[derive(Debug, Clone)]
pub struct AuthorizationRequest {
    /// UUID of the registered Echo app.
    pub client_id: Uuid,
    /// Absolute callback URL. Allowlist-checked separately against the app.
    pub redirect_uri: Url,
    /// PKCE code challenge.
    pub code_challenge: PkceChallenge,
    /// PKCE challenge method (always S256).
    pub code_challenge_method: PkceChallengeMethod,
    /// Granted scope string (space-separated).
    pub scope: String,
    /// Client state, echoed back on the redirect.
    pub state: String,
    /// Whether this is a silent (`prompt=none`) request.
    pub prompt_none: bool,
}

impl AuthorizationRequest {
    /// Splits the scope string into individual scopes for display.
    #[must_use]
    pub fn scopes(&self) -> Vec<&str> {
        self.scope.split_whitespace().collect()
    }

    /// Builds the callback redirect URL carrying the issued code and the
    /// echoed state.
    #[must_use]
    pub fn callback_url(&self, code: &str) -> String {
        let mut url = self.redirect_uri.clone();
        url.query_pairs_mut()
            .append_pair("code", code)
            .append_pair("state", &self.state);
        url.to_string()
    }

    /// Builds a callback redirect URL carrying an OAuth error instead of a
    /// code (used when the user denies consent).
    #[must_use]
    pub fn error_callback_url(&self, error: &str, description: &str) -> String {
        let mut url = self.redirect_uri.clone();
        url.query_pairs_mut()
            .append_pair("error", error)
            .append_pair("error_description", description)
            .append_pair("state", &self.state);
        url.to_string()
    }
}

/// Standard OAuth error body: `{error, error_description}`.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct OAuthErrorResponse {
    /// OAuth 2.0 error code.
    pub error: String,

    /// Human-readable error description.
    #[serde(skip_serializing_if = "Option::is_none")]
    pub error_description: Option<String>,
}

impl OAuthErrorResponse {
    /// Creates an error body from an [`AuthError`].
    ///
    /// Server-side errors get a generic description; the detail stays in the
    /// logs.
    #[must_use]
    pub fn from_error(error: &AuthError) -> Self {
        let description = if error.is_server_error() {
            "An unexpected error occurred".to_string()
        } else {
            error.to_string()
        };
        Self {
            error: error.oauth_error_code().to_string(),
            error_description: Some(description),
        }
    }
}

/// Generates a random opaque state value for requests that omit `state`.
fn generate_state() -> String {
    use rand::Rng;
    use rand::distributions::Alphanumeric;
    rand::thread_rng()
        .sample_iter(&Alphanumeric)
        .take(16)
        .map(char::from)
        .collect()
}

#[cfg(test)]
mod tests {
    use super::*;

    fn raw_request() -> RawAuthorizationRequest {
        RawAuthorizationRequest {
            client_id: Some(Uuid::new_v4().to_string()),
            redirect_uri: Some("http://localhost:3000/callback".to_string()),
            code_challenge: Some("E9Melhoa2OwvFrEMTJguCHaoeK1t8URWbuGJSstw-cM".to_string()),
            code_challenge_method: Some("S256".to_string()),
            scope: None,
            state: Some("abc123".to_string()),
            response_type: Some("code".to_string()),
            prompt: None,
        }
    }

    #[test]
    fn test_valid_request() {
        let request = raw_request().validate().unwrap();
        assert_eq!(request.scope, "llm:invoke offline_access");
        assert_eq!(request.state, "abc123");
        assert!(!request.prompt_none);
        assert_eq!(
            request.code_challenge_method,
            PkceChallengeMethod::S256
        );
    }

    #[test]
    fn test_client_id_must_be_uuid() {
        let mut raw = raw_request();
        raw.client_id = Some("not-a-uuid".to_string());
        let err = raw.validate().unwrap_err();
        assert_eq!(err.oauth_error_code(), "invalid_request");
        assert!(err.to_string().contains("UUID"));
    }

    #[test]
    fn test_client_id_required() {
        let mut raw = raw_request();
        raw.client_id = None;
        let err = raw.validate().unwrap_err();
        assert_eq!(err.oauth_error_code(), "invalid_request");
    }

    #[test]
    fn test_redirect_uri_must_be_absolute() {
        let mut raw = raw_request();
        raw.redirect_uri = Some("/relative/path".to_string());
        let err = raw.validate().unwrap_err();
        assert_eq!(err.oauth_error_code(), "invalid_request");
        assert!(err.to_string().contains("absolute URL"));
    }

    #[test]
    fn test_response_type_defaults_to_code() {
        let mut raw = raw_request();
        raw.response_type = None;
        assert!(raw.validate().is_ok());
    }

    #[test]
    fn test_response_type_token_rejected() {
        let mut raw = raw_request();
        raw.response_type = Some("token".to_string());
        let err = raw.validate().unwrap_err();
        assert_eq!(err.oauth_error_code(), "unsupported_response_type");
    }

    #[test]
    fn test_challenge_length_boundaries() {
        for (len, ok) in [(42, false), (43, true), (128, true), (129, false)] {
            let mut raw = raw_request();
            raw.code_challenge = Some("a".repeat(len));
            assert_eq!(raw.validate().is_ok(), ok, "challenge length {len}");
        }
    }

    #[test]
    fn test_challenge_method_case_sensitive() {
        for method in ["s256", "plain", "SHA1", ""] {
            let mut raw = raw_request();
            raw.code_challenge_method = Some(method.to_string());
            let err = raw.validate().unwrap_err();
            assert_eq!(err.oauth_error_code(), "invalid_request");
            assert!(
                err.to_string()
                    .contains("Only S256 code challenge method is supported"),
                "method {method:?}"
            );
        }
    }

    #[test]
    fn test_missing_challenge_method_rejected() {
        let mut raw = raw_request();
        raw.code_challenge_method = None;
        assert!(raw.validate().is_err());
    }

    #[test]
    fn test_state_defaulted_when_absent() {
        let mut raw = raw_request();
        raw.state = None;
        let request = raw.validate().unwrap();
        assert_eq!(request.state.len(), 16);
    }

    #[test]
    fn test_prompt_none() {
        let mut raw = raw_request();
        raw.prompt = Some("none".to_string());
        assert!(raw.validate().unwrap().prompt_none);

        let mut raw = raw_request();
        raw.prompt = Some("login".to_string());
        assert!(!raw.validate().unwrap().prompt_none);
    }

    #[test]
    fn test_callback_url() {
        let request = raw_request().validate().unwrap();
        let url = request.callback_url("signed-code");
        assert!(url.starts_with("http://localhost:3000/callback?"));
        assert!(url.contains("code=signed-code"));
        assert!(url.contains("state=abc123"));
    }

    #[test]
    fn test_error_callback_url() {
        let request = raw_request().validate().unwrap();
        let url = request.error_callback_url("access_denied", "The user denied the request");
        assert!(url.contains("error=access_denied"));
        assert!(url.contains("state=abc123"));
    }

    #[test]
    fn test_error_response_shape() {
        let body = OAuthErrorResponse::from_error(&AuthError::invalid_request("bad param"));
        assert_eq!(body.error, "invalid_request");
        assert_eq!(
            body.error_description.as_deref(),
            Some("Invalid request: bad param")
        );

        // server errors stay generic
        let body = OAuthErrorResponse::from_error(&AuthError::storage("connection refused"));
        assert_eq!(body.error, "server_error");
        assert_eq!(
            body.error_description.as_deref(),
            Some("An unexpected error occurred")
        );
    }
}
