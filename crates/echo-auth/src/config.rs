//! OAuth server configuration.
//!
//! Configuration is environment-first: every knob can be set through an
//! `OAUTH_*`/`ECHO_*` variable, with documented defaults for local
//! development. The signing secret has no default and must be provided.

use serde::{Deserialize, Serialize};
use std::time::Duration;

use crate::error::AuthError;

/// Default scope granted when an authorization request omits `scope`.
pub const DEFAULT_SCOPE: &str = "llm:invoke offline_access";

/// Authorization code lifetime. Fixed at five minutes; codes are meant to be
/// redeemed immediately after the redirect.
pub const AUTHORIZATION_CODE_LIFETIME: Duration = Duration::from_secs(300);

/// OAuth 2.0 server configuration.
///
/// # Example (env)
///
/// ```text
/// OAUTH_CODE_SIGNING_JWT_SECRET=dev-secret-change-me
/// OAUTH_ACCESS_TOKEN_EXPIRY_SECONDS=3600
/// OAUTH_REFRESH_TOKEN_EXPIRY_SECONDS=2592000
/// OAUTH_REFRESH_TOKEN_ARCHIVE_GRACE_MS=10000
/// ECHO_CONTROL_APP_BASE_URL=http://localhost:3000
/// ```
#[derive(Debug, Clone, Deserialize, Serialize)]
pub struct OAuthConfig {
    /// HS256 secret used to sign authorization codes and access tokens.
    /// Process-wide, read once at startup.
    pub code_signing_secret: String,

    /// Access token lifetime.
    /// Shorter lifetimes are more secure but require more frequent refresh.
    #[serde(with = "humantime_serde")]
    pub access_token_lifetime: Duration,

    /// Refresh token lifetime.
    /// Can be longer since refresh tokens rotate on every use.
    #[serde(with = "humantime_serde")]
    pub refresh_token_lifetime: Duration,

    /// Grace window during which a rotated-out refresh token stays
    /// redeemable, absorbing racing retries from the same client.
    #[serde(with = "humantime_serde")]
    pub refresh_token_archive_grace: Duration,

    /// Base URL of the Echo control app, used to build login and consent
    /// redirects.
    pub control_app_base_url: String,
}

impl OAuthConfig {
    /// Builds a config from process environment variables.
    ///
    /// # Errors
    ///
    /// Returns `AuthError::Configuration` if `OAUTH_CODE_SIGNING_JWT_SECRET`
    /// is missing or empty, or if a numeric variable fails to parse.
    pub fn from_env() -> Result<Self, AuthError> {
        let code_signing_secret = std::env::var("OAUTH_CODE_SIGNING_JWT_SECRET")
            .ok()
            .filter(|s| !s.is_empty())
            .ok_or_else(|| {
                AuthError::configuration("OAUTH_CODE_SIGNING_JWT_SECRET must be set")
            })?;

        let access_token_lifetime =
            env_duration_secs("OAUTH_ACCESS_TOKEN_EXPIRY_SECONDS", 3600)?;
        let refresh_token_lifetime =
            env_duration_secs("OAUTH_REFRESH_TOKEN_EXPIRY_SECONDS", 30 * 24 * 3600)?;
        let refresh_token_archive_grace =
            env_duration_millis("OAUTH_REFRESH_TOKEN_ARCHIVE_GRACE_MS", 10_000)?;

        let control_app_base_url = std::env::var("ECHO_CONTROL_APP_BASE_URL")
            .unwrap_or_else(|_| "http://localhost:3000".to_string());

        Ok(Self {
            code_signing_secret,
            access_token_lifetime,
            refresh_token_lifetime,
            refresh_token_archive_grace,
            control_app_base_url,
        })
    }

    /// Builds a config with the given secret and default lifetimes.
    ///
    /// Intended for tests and embedding; production servers should use
    /// [`OAuthConfig::from_env`].
    #[must_use]
    pub fn with_secret(secret: impl Into<String>) -> Self {
        Self {
            code_signing_secret: secret.into(),
            access_token_lifetime: Duration::from_secs(3600),
            refresh_token_lifetime: Duration::from_secs(30 * 24 * 3600),
            refresh_token_archive_grace: Duration::from_millis(10_000),
            control_app_base_url: "http://localhost:3000".to_string(),
        }
    }
}

fn env_duration_secs(var: &str, default_secs: u64) -> Result<Duration, AuthError> {
    match std::env::var(var) {
        Ok(raw) => raw
            .parse::<u64>()
            .map(Duration::from_secs)
            .map_err(|_| AuthError::configuration(format!("{var} must be an integer: {raw:?}"))),
        Err(_) => Ok(Duration::from_secs(default_secs)),
    }
}

fn env_duration_millis(var: &str, default_ms: u64) -> Result<Duration, AuthError> {
    match std::env::var(var) {
        Ok(raw) => raw
            .parse::<u64>()
            .map(Duration::from_millis)
            .map_err(|_| AuthError::configuration(format!("{var} must be an integer: {raw:?}"))),
        Err(_) => Ok(Duration::from_millis(default_ms)),
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_with_secret_defaults() {
        let config = OAuthConfig::with_secret("test-secret");
        assert_eq!(config.code_signing_secret, "test-secret");
        assert_eq!(config.access_token_lifetime, Duration::from_secs(3600));
        assert_eq!(
            config.refresh_token_lifetime,
            Duration::from_secs(30 * 24 * 3600)
        );
        assert_eq!(
            config.refresh_token_archive_grace,
            Duration::from_millis(10_000)
        );
        assert_eq!(config.control_app_base_url, "http://localhost:3000");
    }

    #[test]
    fn test_code_lifetime_constant() {
        assert_eq!(AUTHORIZATION_CODE_LIFETIME, Duration::from_secs(300));
    }

    #[test]
    fn test_default_scope() {
        assert_eq!(DEFAULT_SCOPE, "llm:invoke offline_access");
    }
}
