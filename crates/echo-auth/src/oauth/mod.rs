//! OAuth 2.0 authorization code flow with PKCE.
//!
//! The flow in order of appearance:
//!
//! 1. [`authorize`] - validates authorization requests and builds redirects
//! 2. [`pkce`] - RFC 7636 verifier/challenge handling (S256 only)
//! 3. [`code`] - self-contained signed authorization codes
//! 4. [`token`] - token endpoint wire types
//! 5. [`service`] - the services the HTTP handlers delegate to

pub mod authorize;
pub mod code;
pub mod pkce;
pub mod service;
pub mod token;

pub use authorize::{AuthorizationRequest, OAuthErrorResponse, RawAuthorizationRequest};
pub use code::{AuthorizationCodeClaims, CodeSigner};
pub use pkce::{PkceChallenge, PkceChallengeMethod, PkceError, PkceVerifier};
pub use service::{AccessTokenClaims, AuthorizationService, TokenService};
pub use token::{TokenError, TokenErrorCode, TokenRequest, TokenResponse};
