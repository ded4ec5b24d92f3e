//! Self-contained signed authorization codes.
//!
//! An authorization code is an HS256 JWT carrying the whole grant context:
//! client, redirect URI, PKCE challenge, scope, user, and a random nonce.
//! Nothing is written to storage at issuance; the signature makes the code
//! self-verifying. Single use is enforced at redemption time by atomically
//! consuming the nonce (see [`crate::storage::ConsumedCodeStorage`]).

use base64::{Engine, engine::general_purpose::URL_SAFE_NO_PAD};
use jsonwebtoken::{Algorithm, DecodingKey, EncodingKey, Header, Validation, decode, encode};
use serde::{Deserialize, Serialize};
use time::OffsetDateTime;
use uuid::Uuid;

use crate::config::AUTHORIZATION_CODE_LIFETIME;
use crate::error::AuthError;
use crate::oauth::authorize::AuthorizationRequest;

/// Claims embedded in a signed authorization code.
///
/// Claim names are camelCase on the wire for compatibility with existing
/// Echo SDK clients.
#[derive(Debug, Clone, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct AuthorizationCodeClaims {
    /// UUID of the app the code was issued to.
    pub client_id: Uuid,

    /// Redirect URI the code was bound to; must match at exchange.
    pub redirect_uri: String,

    /// PKCE code challenge the verifier must hash to.
    pub code_challenge: String,

    /// PKCE challenge method (always `S256`).
    pub code_challenge_method: String,

    /// Granted scope string.
    pub scope: String,

    /// Authenticated user the grant belongs to.
    pub user_id: String,

    /// Expiry, unix seconds. Codes live for five minutes.
    pub exp: i64,

    /// Random nonce identifying this code for single-use tracking.
    pub code: String,
}

impl AuthorizationCodeClaims {
    /// Expiry as an [`OffsetDateTime`].
    ///
    /// # Errors
    ///
    /// Returns `invalid_grant` if the timestamp is out of range.
    pub fn expires_at(&self) -> Result<OffsetDateTime, AuthError> {
        OffsetDateTime::from_unix_timestamp(self.exp)
            .map_err(|_| AuthError::invalid_grant("authorization code has an invalid expiry"))
    }
}

/// Signs and verifies authorization codes with a process-wide HS256 secret.
pub struct CodeSigner {
    encoding_key: EncodingKey,
    decoding_key: DecodingKey,
}

impl CodeSigner {
    /// Creates a signer from the shared secret
    /// (`OAUTH_CODE_SIGNING_JWT_SECRET`).
    #[must_use]
    pub fn new(secret: &str) -> Self {
        Self {
            encoding_key: EncodingKey::from_secret(secret.as_bytes()),
            decoding_key: DecodingKey::from_secret(secret.as_bytes()),
        }
    }

    /// Issues a signed authorization code for a validated, authorized,
    /// authenticated request.
    ///
    /// # Errors
    ///
    /// Returns `AuthError::Internal` if JWT encoding fails.
    pub fn issue(
        &self,
        request: &AuthorizationRequest,
        user_id: &str,
    ) -> Result<String, AuthError> {
        let exp = OffsetDateTime::now_utc() + AUTHORIZATION_CODE_LIFETIME;
        let claims = AuthorizationCodeClaims {
            client_id: request.client_id,
            redirect_uri: request.redirect_uri.to_string(),
            code_challenge: request.code_challenge.as_str().to_string(),
            code_challenge_method: request.code_challenge_method.as_str().to_string(),
            scope: request.scope.clone(),
            user_id: user_id.to_string(),
            exp: exp.unix_timestamp(),
            code: generate_nonce(),
        };
        self.sign(&claims)
    }

    /// Signs an explicit claims struct. Exposed for tests that need control
    /// over the expiry.
    pub fn sign(&self, claims: &AuthorizationCodeClaims) -> Result<String, AuthError> {
        encode(&Header::new(Algorithm::HS256), claims, &self.encoding_key)
            .map_err(|e| AuthError::internal(format!("failed to sign authorization code: {e}")))
    }

    /// Verifies a presented code's signature and expiry.
    ///
    /// # Errors
    ///
    /// Returns `invalid_grant` for an expired, tampered, or otherwise
    /// unparseable code.
    pub fn verify(&self, code: &str) -> Result<AuthorizationCodeClaims, AuthError> {
        let mut validation = Validation::new(Algorithm::HS256);
        // No leeway: a 300-second code is expired at second 301.
        validation.leeway = 0;

        decode::<AuthorizationCodeClaims>(code, &self.decoding_key, &validation)
            .map(|data| data.claims)
            .map_err(|e| match e.kind() {
                jsonwebtoken::errors::ErrorKind::ExpiredSignature => {
                    AuthError::invalid_grant("authorization code expired")
                }
                _ => AuthError::invalid_grant("invalid authorization code"),
            })
    }
}

/// Generates a random 32-character base64url nonce (24 random bytes).
fn generate_nonce() -> String {
    use rand::Rng;
    let mut bytes = [0u8; 24];
    rand::thread_rng().fill(&mut bytes);
    URL_SAFE_NO_PAD.encode(bytes)
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::oauth::authorize::RawAuthorizationRequest;

    fn request() -> AuthorizationRequest {
        RawAuthorizationRequest {
            client_id: Some(Uuid::new_v4().to_string()),
            redirect_uri: Some("http://localhost:3000/callback".to_string()),
            code_challenge: Some("E9Melhoa2OwvFrEMTJguCHaoeK1t8URWbuGJSstw-cM".to_string()),
            code_challenge_method: Some("S256".to_string()),
            state: Some("xyz".to_string()),
            ..Default::default()
        }
        .validate()
        .unwrap()
    }

    #[test]
    fn test_issue_and_verify_roundtrip() {
        let signer = CodeSigner::new("test-secret");
        let request = request();

        let code = signer.issue(&request, "user-1").unwrap();
        let claims = signer.verify(&code).unwrap();

        assert_eq!(claims.client_id, request.client_id);
        assert_eq!(claims.redirect_uri, request.redirect_uri.to_string());
        assert_eq!(
            claims.code_challenge,
            "E9Melhoa2OwvFrEMTJguCHaoeK1t8URWbuGJSstw-cM"
        );
        assert_eq!(claims.code_challenge_method, "S256");
        assert_eq!(claims.scope, "llm:invoke offline_access");
        assert_eq!(claims.user_id, "user-1");
        assert_eq!(claims.code.len(), 32);
    }

    #[test]
    fn test_nonce_is_unique_per_code() {
        let signer = CodeSigner::new("test-secret");
        let request = request();

        let c1 = signer.verify(&signer.issue(&request, "u").unwrap()).unwrap();
        let c2 = signer.verify(&signer.issue(&request, "u").unwrap()).unwrap();
        assert_ne!(c1.code, c2.code);
    }

    #[test]
    fn test_expiry_is_five_minutes() {
        let signer = CodeSigner::new("test-secret");
        let code = signer.issue(&request(), "user-1").unwrap();
        let claims = signer.verify(&code).unwrap();

        let now = OffsetDateTime::now_utc().unix_timestamp();
        let ttl = claims.exp - now;
        assert!((295..=300).contains(&ttl), "unexpected ttl {ttl}");
    }

    #[test]
    fn test_expired_code_rejected() {
        let signer = CodeSigner::new("test-secret");
        let request = request();

        let claims = AuthorizationCodeClaims {
            client_id: request.client_id,
            redirect_uri: request.redirect_uri.to_string(),
            code_challenge: request.code_challenge.as_str().to_string(),
            code_challenge_method: "S256".to_string(),
            scope: request.scope.clone(),
            user_id: "user-1".to_string(),
            exp: OffsetDateTime::now_utc().unix_timestamp() - 10,
            code: "nonce".to_string(),
        };

        let code = signer.sign(&claims).unwrap();
        let err = signer.verify(&code).unwrap_err();
        assert_eq!(err.oauth_error_code(), "invalid_grant");
        assert!(err.to_string().contains("expired"));
    }

    #[test]
    fn test_wrong_secret_rejected() {
        let signer = CodeSigner::new("secret-a");
        let other = CodeSigner::new("secret-b");

        let code = signer.issue(&request(), "user-1").unwrap();
        let err = other.verify(&code).unwrap_err();
        assert_eq!(err.oauth_error_code(), "invalid_grant");
    }

    #[test]
    fn test_garbage_rejected() {
        let signer = CodeSigner::new("test-secret");
        assert!(signer.verify("not-a-jwt").is_err());
        assert!(signer.verify("").is_err());
    }
}
