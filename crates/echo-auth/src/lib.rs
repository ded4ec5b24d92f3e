//! # echo-auth
//!
//! OAuth 2.0 authorization server core for the Echo platform.
//!
//! This crate provides:
//! - Authorization code flow with mandatory PKCE (S256)
//! - Self-contained signed authorization codes with single-use enforcement
//! - Access token issuance and rotating refresh tokens
//! - Storage traits with in-memory implementations for development
//!
//! ## Overview
//!
//! Echo apps are public OAuth clients identified by a UUID. The server never
//! stores pending authorization state: the authorization code is an HS256 JWT
//! carrying the whole grant context, and single use is enforced by atomically
//! consuming the random nonce embedded in each code at exchange time. Refresh
//! tokens rotate on every use, with a short grace window during which the
//! rotated-out token stays redeemable.
//!
//! ## Modules
//!
//! - [`config`] - Environment-driven server configuration
//! - [`error`] - OAuth-vocabulary error type
//! - [`oauth`] - PKCE, request validation, codes, and the flow services
//! - [`storage`] - Persistence seams and in-memory backends
//! - [`types`] - Domain types (apps, refresh tokens)

pub mod config;
pub mod error;
pub mod oauth;
pub mod storage;
pub mod types;

pub use config::{AUTHORIZATION_CODE_LIFETIME, DEFAULT_SCOPE, OAuthConfig};
pub use error::{AuthError, ErrorCategory};
pub use oauth::{
    AccessTokenClaims, AuthorizationCodeClaims, AuthorizationRequest, AuthorizationService,
    CodeSigner, OAuthErrorResponse, PkceChallenge, PkceChallengeMethod, PkceError, PkceVerifier,
    RawAuthorizationRequest, TokenError, TokenErrorCode, TokenRequest, TokenResponse,
    TokenService,
};
pub use storage::{
    AppMembershipStorage, AppStorage, ConsumedCodeStorage, RefreshTokenStorage, SessionStorage,
};
pub use types::{EchoApp, RefreshToken};

/// Type alias for authentication/authorization results.
pub type AuthResult<T> = Result<T, AuthError>;

/// Prelude module for convenient imports.
///
/// ```
/// use echo_auth::prelude::*;
/// ```
pub mod prelude {
    pub use crate::AuthResult;
    pub use crate::config::OAuthConfig;
    pub use crate::error::AuthError;
    pub use crate::oauth::{
        AuthorizationService, CodeSigner, RawAuthorizationRequest, TokenRequest, TokenResponse,
        TokenService,
    };
    pub use crate::storage::{
        AppMembershipStorage, AppStorage, ConsumedCodeStorage, RefreshTokenStorage,
        SessionStorage,
    };
    pub use crate::types::{EchoApp, RefreshToken};
}
