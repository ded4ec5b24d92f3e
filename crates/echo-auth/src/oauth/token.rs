//! Token endpoint wire types.
//!
//! Request, response, and error shapes for the token and refresh endpoints.
//! Supported grants:
//!
//! - `authorization_code` - exchange a signed code (+ PKCE verifier) for tokens
//! - `refresh_token` - rotate a refresh token into a new token pair

use serde::{Deserialize, Serialize};
use std::fmt;

/// Token request parameters.
///
/// Accepted as `application/json` or `application/x-www-form-urlencoded`,
/// handled identically. Required fields depend on `grant_type`:
///
/// - `authorization_code`: `code`, `redirect_uri`, `code_verifier`, `client_id`
/// - `refresh_token`: `refresh_token`, `client_id`
#[derive(Debug, Clone, Default, Deserialize, Serialize)]
pub struct TokenRequest {
    /// OAuth 2.0 grant type. Absent is distinguishable from wrong so the
    /// two cases can report different errors.
    #[serde(default)]
    pub grant_type: Option<String>,

    /// Authorization code (for `authorization_code` grant).
    #[serde(default)]
    pub code: Option<String>,

    /// Redirect URI; must match the one bound into the code.
    #[serde(default)]
    pub redirect_uri: Option<String>,

    /// PKCE code verifier (for `authorization_code` grant).
    #[serde(default)]
    pub code_verifier: Option<String>,

    /// Client ID (UUID of the Echo app).
    #[serde(default)]
    pub client_id: Option<String>,

    /// Refresh token (for `refresh_token` grant).
    #[serde(default)]
    pub refresh_token: Option<String>,

    /// Requested scope (for `refresh_token` grant; informational).
    #[serde(default)]
    pub scope: Option<String>,
}

/// Successful token response.
///
/// # Example Response
///
/// ```json
/// {
///   "access_token": "eyJhbG...",
///   "token_type": "Bearer",
///   "expires_in": 3600,
///   "scope": "llm:invoke offline_access",
///   "refresh_token": "p5Wg...",
///   "refresh_token_expires_in": 2592000
/// }
/// ```
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct TokenResponse {
    /// The access token (JWT).
    pub access_token: String,

    /// Token type, always "Bearer".
    pub token_type: String,

    /// Access token lifetime in seconds.
    pub expires_in: u64,

    /// Granted scopes (space-separated).
    pub scope: String,

    /// Rotating refresh token.
    #[serde(skip_serializing_if = "Option::is_none")]
    pub refresh_token: Option<String>,

    /// Refresh token lifetime in seconds.
    #[serde(skip_serializing_if = "Option::is_none")]
    pub refresh_token_expires_in: Option<u64>,
}

impl TokenResponse {
    /// Creates a new token response with required fields.
    #[must_use]
    pub fn new(access_token: String, expires_in: u64, scope: String) -> Self {
        Self {
            access_token,
            token_type: "Bearer".to_string(),
            expires_in,
            scope,
            refresh_token: None,
            refresh_token_expires_in: None,
        }
    }

    /// Sets the refresh token and its lifetime.
    #[must_use]
    pub fn with_refresh_token(mut self, token: String, expires_in: u64) -> Self {
        self.refresh_token = Some(token);
        self.refresh_token_expires_in = Some(expires_in);
        self
    }
}

/// Token error response body.
///
/// # Example Response
///
/// ```json
/// {
///   "error": "invalid_grant",
///   "error_description": "authorization code expired"
/// }
/// ```
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct TokenError {
    /// OAuth 2.0 error code.
    pub error: TokenErrorCode,

    /// Human-readable error description.
    #[serde(skip_serializing_if = "Option::is_none")]
    pub error_description: Option<String>,
}

impl TokenError {
    /// Creates a new token error.
    #[must_use]
    pub fn new(error: TokenErrorCode) -> Self {
        Self {
            error,
            error_description: None,
        }
    }

    /// Creates a new token error with description.
    #[must_use]
    pub fn with_description(error: TokenErrorCode, description: impl Into<String>) -> Self {
        Self {
            error,
            error_description: Some(description.into()),
        }
    }
}

/// OAuth 2.0 token error codes (RFC 6749 section 5.2).
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum TokenErrorCode {
    /// The request is malformed or missing a required parameter.
    InvalidRequest,

    /// Client authentication failed (unknown client).
    InvalidClient,

    /// The code or refresh token is invalid, expired, consumed, or was
    /// issued to another client.
    InvalidGrant,

    /// The grant type is not supported by this server.
    UnsupportedGrantType,

    /// The authorization server encountered an unexpected condition.
    ServerError,
}

impl TokenErrorCode {
    /// Returns the string representation of the error code.
    #[must_use]
    pub fn as_str(&self) -> &'static str {
        match self {
            Self::InvalidRequest => "invalid_request",
            Self::InvalidClient => "invalid_client",
            Self::InvalidGrant => "invalid_grant",
            Self::UnsupportedGrantType => "unsupported_grant_type",
            Self::ServerError => "server_error",
        }
    }

    /// Returns the HTTP status code for this error.
    #[must_use]
    pub fn http_status(&self) -> u16 {
        match self {
            Self::InvalidClient => 401,
            Self::ServerError => 500,
            Self::InvalidRequest | Self::InvalidGrant | Self::UnsupportedGrantType => 400,
        }
    }
}

impl fmt::Display for TokenErrorCode {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "{}", self.as_str())
    }
}
