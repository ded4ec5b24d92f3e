//! Authorization and token services.
//!
//! The services hold the flow logic behind the HTTP endpoints. Handlers do
//! transport concerns (query/body parsing, cookies, redirects) and delegate
//! everything else here, so the grant rules are testable without a server.

use std::sync::Arc;

use jsonwebtoken::{Algorithm, EncodingKey, Header, encode};
use serde::{Deserialize, Serialize};
use time::OffsetDateTime;
use uuid::Uuid;

use crate::config::OAuthConfig;
use crate::error::AuthError;
use crate::oauth::authorize::{AuthorizationRequest, RawAuthorizationRequest};
use crate::oauth::code::CodeSigner;
use crate::oauth::pkce::{PkceChallenge, PkceVerifier};
use crate::oauth::token::{TokenRequest, TokenResponse};
use crate::storage::{
    AppMembershipStorage, AppStorage, ConsumedCodeStorage, RefreshTokenStorage,
};
use crate::types::{EchoApp, RefreshToken};

// =============================================================================
// Authorization Service
// =============================================================================

/// Service behind the authorization endpoint.
///
/// Validates incoming requests against the registered app and issues signed
/// authorization codes once the user has authenticated and consented.
pub struct AuthorizationService {
    apps: Arc<dyn AppStorage>,
    memberships: Arc<dyn AppMembershipStorage>,
    signer: Arc<CodeSigner>,
}

impl AuthorizationService {
    /// Creates a new authorization service.
    pub fn new(
        apps: Arc<dyn AppStorage>,
        memberships: Arc<dyn AppMembershipStorage>,
        signer: Arc<CodeSigner>,
    ) -> Self {
        Self {
            apps,
            memberships,
            signer,
        }
    }

    /// Validates raw parameters and resolves the app they refer to.
    ///
    /// This is the front half of the authorization flow: everything that can
    /// be checked before knowing who the user is.
    ///
    /// # Errors
    ///
    /// Returns `invalid_request` for malformed parameters or an unauthorized
    /// `redirect_uri`, and `invalid_client` for an unknown app.
    pub async fn resolve(
        &self,
        raw: RawAuthorizationRequest,
    ) -> Result<(AuthorizationRequest, EchoApp), AuthError> {
        let request = raw.validate()?;
        let app = self.lookup_app(&request).await?;

        if !app.authorizes_redirect(request.redirect_uri.as_str()) {
            tracing::warn!(
                client_id = %request.client_id,
                redirect_uri = %request.redirect_uri,
                "rejected unauthorized redirect_uri"
            );
            return Err(AuthError::invalid_request(
                "redirect_uri is not authorized for this app",
            ));
        }

        Ok((request, app))
    }

    /// Looks up the app a validated request refers to.
    ///
    /// Unlike [`AuthorizationService::resolve`] this does not check the
    /// redirect allowlist, so callers that want to offer the app owner a
    /// chance to authorize a new callback URL can look at the app first.
    ///
    /// # Errors
    ///
    /// Returns `invalid_client` for an unknown app.
    pub async fn lookup_app(&self, request: &AuthorizationRequest) -> Result<EchoApp, AuthError> {
        self.apps
            .find_by_id(request.client_id)
            .await?
            .ok_or_else(|| AuthError::invalid_client("app not found"))
    }

    /// Adds a callback URL to the app's allowlist on behalf of its owner.
    ///
    /// # Errors
    ///
    /// Returns `access_denied` if `user_id` does not own the app.
    pub async fn authorize_callback_url(
        &self,
        app: &EchoApp,
        user_id: &str,
        url: &str,
    ) -> Result<(), AuthError> {
        if !app.is_owned_by(user_id) {
            return Err(AuthError::access_denied(
                "only the app owner can authorize a new callback URL",
            ));
        }
        self.apps.add_callback_url(app.id, url).await?;
        tracing::info!(app_id = %app.id, url = %url, "authorized new callback URL");
        Ok(())
    }

    /// Completes the grant for an authenticated user: provisions the app
    /// membership, issues a signed code, and builds the callback redirect.
    ///
    /// # Errors
    ///
    /// Returns a storage error if membership provisioning fails, or an
    /// internal error if code signing fails.
    pub async fn grant(
        &self,
        request: &AuthorizationRequest,
        user_id: &str,
    ) -> Result<String, AuthError> {
        self.memberships
            .ensure_membership(request.client_id, user_id)
            .await?;

        let code = self.signer.issue(request, user_id)?;

        tracing::info!(
            client_id = %request.client_id,
            user_id = %user_id,
            scope = %request.scope,
            "issued authorization code"
        );

        Ok(request.callback_url(&code))
    }
}

// =============================================================================
// Access Token Claims
// =============================================================================

/// Claims carried by an issued access token.
///
/// Like authorization codes, access tokens are HS256 JWTs with camelCase
/// claim names on the wire.
#[derive(Debug, Clone, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct AccessTokenClaims {
    /// User the token acts on behalf of.
    pub user_id: String,

    /// App the token was issued to.
    pub app_id: Uuid,

    /// Granted scopes (space-separated).
    pub scope: String,

    /// Issued-at, unix seconds.
    pub iat: i64,

    /// Expiry, unix seconds.
    pub exp: i64,
}

// =============================================================================
// Token Service
// =============================================================================

/// Service behind the token and refresh endpoints.
///
/// Handles the `authorization_code` and `refresh_token` grants: verifies the
/// presented credential, enforces single use and rotation, and mints the
/// access/refresh token pair.
pub struct TokenService {
    config: OAuthConfig,
    signer: Arc<CodeSigner>,
    access_key: EncodingKey,
    apps: Arc<dyn AppStorage>,
    consumed_codes: Arc<dyn ConsumedCodeStorage>,
    refresh_tokens: Arc<dyn RefreshTokenStorage>,
}

impl TokenService {
    /// Creates a new token service.
    pub fn new(
        config: OAuthConfig,
        signer: Arc<CodeSigner>,
        apps: Arc<dyn AppStorage>,
        consumed_codes: Arc<dyn ConsumedCodeStorage>,
        refresh_tokens: Arc<dyn RefreshTokenStorage>,
    ) -> Self {
        let access_key = EncodingKey::from_secret(config.code_signing_secret.as_bytes());
        Self {
            config,
            signer,
            access_key,
            apps,
            consumed_codes,
            refresh_tokens,
        }
    }

    /// Dispatches a token request by grant type.
    ///
    /// # Errors
    ///
    /// Returns `invalid_request` when `grant_type` is absent and
    /// `unsupported_grant_type` for any grant other than
    /// `authorization_code` or `refresh_token`.
    pub async fn handle(&self, request: TokenRequest) -> Result<TokenResponse, AuthError> {
        match request.grant_type.as_deref() {
            None => Err(AuthError::invalid_request("grant_type is required")),
            Some("authorization_code") => self.exchange_code(request).await,
            Some("refresh_token") => self.refresh(request).await,
            Some(other) => Err(AuthError::unsupported_grant_type(other)),
        }
    }

    /// Exchanges a signed authorization code (plus PKCE verifier) for a
    /// token pair.
    ///
    /// The PKCE check runs before the code is consumed, so a mismatched
    /// verifier does not burn the code.
    ///
    /// # Errors
    ///
    /// Returns `invalid_request` for missing or malformed parameters and
    /// `invalid_grant` for an expired, tampered, replayed, or mismatched
    /// code.
    pub async fn exchange_code(&self, request: TokenRequest) -> Result<TokenResponse, AuthError> {
        match request.grant_type.as_deref() {
            None => return Err(AuthError::invalid_request("grant_type is required")),
            Some("authorization_code") => {}
            Some(other) => return Err(AuthError::unsupported_grant_type(other)),
        }

        let code = request
            .code
            .as_deref()
            .filter(|s| !s.is_empty())
            .ok_or_else(|| AuthError::invalid_request("code is required"))?;
        let code_verifier = request
            .code_verifier
            .clone()
            .filter(|s| !s.is_empty())
            .ok_or_else(|| AuthError::invalid_request("code_verifier is required"))?;
        let redirect_uri = request
            .redirect_uri
            .as_deref()
            .filter(|s| !s.is_empty())
            .ok_or_else(|| AuthError::invalid_request("redirect_uri is required"))?;
        let client_id = request
            .client_id
            .as_deref()
            .filter(|s| !s.is_empty())
            .ok_or_else(|| AuthError::invalid_request("client_id is required"))?;
        let client_id = Uuid::parse_str(client_id)
            .map_err(|_| AuthError::invalid_request("client_id must be a valid UUID"))?;

        let claims = self.signer.verify(code)?;

        if claims.client_id != client_id {
            return Err(AuthError::invalid_grant(
                "authorization code was issued to another client",
            ));
        }
        if claims.redirect_uri != redirect_uri {
            return Err(AuthError::invalid_grant(
                "redirect_uri does not match the authorization request",
            ));
        }

        // Shape errors are invalid_request; only a well-formed verifier that
        // fails the hash comparison is invalid_grant.
        let verifier = PkceVerifier::new(code_verifier)
            .map_err(|e| AuthError::invalid_request(e.to_string()))?;
        let challenge = PkceChallenge::new(claims.code_challenge.clone())
            .map_err(|_| AuthError::invalid_grant("invalid authorization code"))?;
        challenge
            .verify(&verifier)
            .map_err(|e| AuthError::invalid_grant(e.to_string()))?;

        let consumed = self
            .consumed_codes
            .mark_consumed(&claims.code, claims.expires_at()?)
            .await?;
        if !consumed {
            tracing::warn!(
                client_id = %claims.client_id,
                "rejected replayed authorization code"
            );
            return Err(AuthError::invalid_grant(
                "authorization code has already been used",
            ));
        }

        self.issue_tokens(claims.client_id, &claims.user_id, claims.scope)
            .await
    }

    /// Rotates a refresh token into a new token pair.
    ///
    /// The presented token is archived rather than deleted; it stays
    /// redeemable for the configured grace window so a client retrying a
    /// refresh over a flaky connection does not lose its session.
    ///
    /// # Errors
    ///
    /// Returns `invalid_request` for missing parameters, `invalid_client`
    /// for an unknown app, and `invalid_grant` for an unknown, expired,
    /// revoked, or grace-elapsed token.
    pub async fn refresh(&self, request: TokenRequest) -> Result<TokenResponse, AuthError> {
        match request.grant_type.as_deref() {
            None => return Err(AuthError::invalid_request("grant_type is required")),
            Some("refresh_token") => {}
            Some(other) => return Err(AuthError::unsupported_grant_type(other)),
        }

        let refresh_token = request
            .refresh_token
            .as_deref()
            .filter(|s| !s.is_empty())
            .ok_or_else(|| AuthError::invalid_request("refresh_token is required"))?;
        let client_id = request
            .client_id
            .as_deref()
            .filter(|s| !s.is_empty())
            .ok_or_else(|| AuthError::invalid_request("client_id is required"))?;
        let client_id = Uuid::parse_str(client_id)
            .map_err(|_| AuthError::invalid_request("client_id must be a valid UUID"))?;

        let app = self
            .apps
            .find_by_id(client_id)
            .await?
            .ok_or_else(|| AuthError::invalid_client("app not found"))?;

        let token_hash = RefreshToken::hash_token(refresh_token);
        let stored = self
            .refresh_tokens
            .find_by_hash(&token_hash)
            .await?
            .ok_or_else(|| AuthError::invalid_grant("invalid refresh token"))?;

        if stored.app_id != app.id {
            return Err(AuthError::invalid_grant(
                "refresh token was issued to another client",
            ));
        }
        if !stored.is_redeemable(self.config.refresh_token_archive_grace) {
            tracing::warn!(
                app_id = %stored.app_id,
                token_id = %stored.id,
                "rejected dead refresh token"
            );
            return Err(AuthError::invalid_grant("refresh token is no longer valid"));
        }

        self.refresh_tokens
            .archive(&token_hash, OffsetDateTime::now_utc())
            .await?;

        tracing::info!(
            app_id = %stored.app_id,
            user_id = %stored.user_id,
            "rotated refresh token"
        );

        self.issue_tokens(stored.app_id, &stored.user_id, stored.scope)
            .await
    }

    /// Mints an access token JWT and a fresh refresh token record.
    async fn issue_tokens(
        &self,
        app_id: Uuid,
        user_id: &str,
        scope: String,
    ) -> Result<TokenResponse, AuthError> {
        let now = OffsetDateTime::now_utc();

        let claims = AccessTokenClaims {
            user_id: user_id.to_string(),
            app_id,
            scope: scope.clone(),
            iat: now.unix_timestamp(),
            exp: (now + self.config.access_token_lifetime).unix_timestamp(),
        };
        let access_token = encode(&Header::new(Algorithm::HS256), &claims, &self.access_key)
            .map_err(|e| AuthError::internal(format!("failed to sign access token: {e}")))?;

        let refresh_value = RefreshToken::generate_token();
        let record = RefreshToken {
            id: Uuid::new_v4(),
            token_hash: RefreshToken::hash_token(&refresh_value),
            app_id,
            user_id: user_id.to_string(),
            scope: scope.clone(),
            created_at: now,
            expires_at: now + self.config.refresh_token_lifetime,
            archived_at: None,
            revoked_at: None,
        };
        self.refresh_tokens.create(&record).await?;

        Ok(TokenResponse::new(
            access_token,
            self.config.access_token_lifetime.as_secs(),
            scope,
        )
        .with_refresh_token(
            refresh_value,
            self.config.refresh_token_lifetime.as_secs(),
        ))
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::storage::{
        InMemoryAppStorage, InMemoryConsumedCodeStorage, InMemoryMembershipStorage,
        InMemoryRefreshTokenStorage,
    };
    use jsonwebtoken::{DecodingKey, Validation, decode};

    struct Fixture {
        authorization: AuthorizationService,
        tokens: TokenService,
        refresh_tokens: Arc<InMemoryRefreshTokenStorage>,
        app_id: Uuid,
    }

    const SECRET: &str = "test-secret";

    async fn fixture() -> Fixture {
        let apps = Arc::new(InMemoryAppStorage::new());
        let app_id = Uuid::new_v4();
        apps.insert(EchoApp {
            id: app_id,
            name: "Test App".to_string(),
            owner_user_id: "owner-1".to_string(),
            authorized_callback_urls: vec!["https://app.example.com/callback".to_string()],
            is_public: true,
        })
        .await;

        let memberships = Arc::new(InMemoryMembershipStorage::new());
        let consumed = Arc::new(InMemoryConsumedCodeStorage::new());
        let refresh_tokens = Arc::new(InMemoryRefreshTokenStorage::new());
        let signer = Arc::new(CodeSigner::new(SECRET));

        let authorization =
            AuthorizationService::new(apps.clone(), memberships.clone(), signer.clone());
        let tokens = TokenService::new(
            OAuthConfig::with_secret(SECRET),
            signer,
            apps.clone(),
            consumed,
            refresh_tokens.clone(),
        );

        Fixture {
            authorization,
            tokens,
            refresh_tokens,
            app_id,
        }
    }

    fn raw_request(app_id: Uuid, challenge: &PkceChallenge) -> RawAuthorizationRequest {
        RawAuthorizationRequest {
            client_id: Some(app_id.to_string()),
            redirect_uri: Some("http://localhost:3000/callback".to_string()),
            code_challenge: Some(challenge.as_str().to_string()),
            code_challenge_method: Some("S256".to_string()),
            state: Some("state-1".to_string()),
            ..Default::default()
        }
    }

    /// Runs authorize + grant and extracts the code from the callback URL.
    async fn issue_code(fx: &Fixture, verifier: &PkceVerifier) -> String {
        let challenge = PkceChallenge::from_verifier(verifier);
        let (request, _app) = fx
            .authorization
            .resolve(raw_request(fx.app_id, &challenge))
            .await
            .unwrap();
        let callback = fx.authorization.grant(&request, "user-1").await.unwrap();

        let url = url::Url::parse(&callback).unwrap();
        url.query_pairs()
            .find(|(k, _)| k == "code")
            .map(|(_, v)| v.into_owned())
            .unwrap()
    }

    fn exchange_request(fx: &Fixture, code: &str, verifier: &PkceVerifier) -> TokenRequest {
        TokenRequest {
            grant_type: Some("authorization_code".to_string()),
            code: Some(code.to_string()),
            redirect_uri: Some("http://localhost:3000/callback".to_string()),
            code_verifier: Some(verifier.as_str().to_string()),
            client_id: Some(fx.app_id.to_string()),
            ..Default::default()
        }
    }

    #[tokio::test]
    async fn test_full_code_exchange() {
        let fx = fixture().await;
        let verifier = PkceVerifier::generate();
        let code = issue_code(&fx, &verifier).await;

        let response = fx
            .tokens
            .handle(exchange_request(&fx, &code, &verifier))
            .await
            .unwrap();

        assert_eq!(response.token_type, "Bearer");
        assert_eq!(response.expires_in, 3600);
        assert_eq!(response.scope, "llm:invoke offline_access");
        assert!(response.refresh_token.is_some());
        assert_eq!(response.refresh_token_expires_in, Some(30 * 24 * 3600));

        // the access token is a verifiable HS256 JWT
        let mut validation = Validation::new(Algorithm::HS256);
        validation.leeway = 0;
        let decoded = decode::<AccessTokenClaims>(
            &response.access_token,
            &DecodingKey::from_secret(SECRET.as_bytes()),
            &validation,
        )
        .unwrap();
        assert_eq!(decoded.claims.user_id, "user-1");
        assert_eq!(decoded.claims.app_id, fx.app_id);
    }

    #[tokio::test]
    async fn test_code_is_single_use() {
        let fx = fixture().await;
        let verifier = PkceVerifier::generate();
        let code = issue_code(&fx, &verifier).await;

        fx.tokens
            .handle(exchange_request(&fx, &code, &verifier))
            .await
            .unwrap();

        let err = fx
            .tokens
            .handle(exchange_request(&fx, &code, &verifier))
            .await
            .unwrap_err();
        assert_eq!(err.oauth_error_code(), "invalid_grant");
        assert!(err.to_string().contains("already been used"));
    }

    #[tokio::test]
    async fn test_wrong_verifier_rejected_without_burning_code() {
        let fx = fixture().await;
        let verifier = PkceVerifier::generate();
        let code = issue_code(&fx, &verifier).await;

        let wrong = PkceVerifier::generate();
        let err = fx
            .tokens
            .handle(exchange_request(&fx, &code, &wrong))
            .await
            .unwrap_err();
        assert_eq!(err.oauth_error_code(), "invalid_grant");
        assert!(err.to_string().contains("code verifier invalid"));

        // the mismatch did not consume the code
        fx.tokens
            .handle(exchange_request(&fx, &code, &verifier))
            .await
            .unwrap();
    }

    #[tokio::test]
    async fn test_malformed_verifier_is_invalid_request() {
        let fx = fixture().await;
        let verifier = PkceVerifier::generate();
        let code = issue_code(&fx, &verifier).await;

        let mut request = exchange_request(&fx, &code, &verifier);
        request.code_verifier = Some("too-short".to_string());
        let err = fx.tokens.handle(request).await.unwrap_err();
        assert_eq!(err.oauth_error_code(), "invalid_request");
    }

    #[tokio::test]
    async fn test_redirect_uri_must_match_code() {
        let fx = fixture().await;
        let verifier = PkceVerifier::generate();
        let code = issue_code(&fx, &verifier).await;

        let mut request = exchange_request(&fx, &code, &verifier);
        request.redirect_uri = Some("http://localhost:4000/other".to_string());
        let err = fx.tokens.handle(request).await.unwrap_err();
        assert_eq!(err.oauth_error_code(), "invalid_grant");
    }

    #[tokio::test]
    async fn test_client_id_must_match_code() {
        let fx = fixture().await;
        let verifier = PkceVerifier::generate();
        let code = issue_code(&fx, &verifier).await;

        let mut request = exchange_request(&fx, &code, &verifier);
        request.client_id = Some(Uuid::new_v4().to_string());
        let err = fx.tokens.handle(request).await.unwrap_err();
        assert_eq!(err.oauth_error_code(), "invalid_grant");
        assert!(err.to_string().contains("another client"));
    }

    #[tokio::test]
    async fn test_grant_type_dispatch() {
        let fx = fixture().await;

        let err = fx.tokens.handle(TokenRequest::default()).await.unwrap_err();
        assert_eq!(err.oauth_error_code(), "invalid_request");

        let err = fx
            .tokens
            .handle(TokenRequest {
                grant_type: Some("password".to_string()),
                ..Default::default()
            })
            .await
            .unwrap_err();
        assert_eq!(err.oauth_error_code(), "unsupported_grant_type");
    }

    #[tokio::test]
    async fn test_refresh_rotation() {
        let fx = fixture().await;
        let verifier = PkceVerifier::generate();
        let code = issue_code(&fx, &verifier).await;
        let initial = fx
            .tokens
            .handle(exchange_request(&fx, &code, &verifier))
            .await
            .unwrap();
        let first_refresh = initial.refresh_token.unwrap();

        let rotated = fx
            .tokens
            .refresh(TokenRequest {
                grant_type: Some("refresh_token".to_string()),
                refresh_token: Some(first_refresh.clone()),
                client_id: Some(fx.app_id.to_string()),
                ..Default::default()
            })
            .await
            .unwrap();
        let second_refresh = rotated.refresh_token.unwrap();
        assert_ne!(first_refresh, second_refresh);
        assert_eq!(rotated.scope, "llm:invoke offline_access");

        // the old token is archived, not gone: still redeemable inside the
        // default ten second grace window
        fx.tokens
            .refresh(TokenRequest {
                grant_type: Some("refresh_token".to_string()),
                refresh_token: Some(first_refresh.clone()),
                client_id: Some(fx.app_id.to_string()),
                ..Default::default()
            })
            .await
            .unwrap();

        // and the new token works too
        fx.tokens
            .refresh(TokenRequest {
                grant_type: Some("refresh_token".to_string()),
                refresh_token: Some(second_refresh),
                client_id: Some(fx.app_id.to_string()),
                ..Default::default()
            })
            .await
            .unwrap();
    }

    #[tokio::test]
    async fn test_refresh_rejects_revoked_token() {
        let fx = fixture().await;
        let verifier = PkceVerifier::generate();
        let code = issue_code(&fx, &verifier).await;
        let initial = fx
            .tokens
            .handle(exchange_request(&fx, &code, &verifier))
            .await
            .unwrap();
        let refresh_value = initial.refresh_token.unwrap();

        fx.refresh_tokens
            .revoke(&RefreshToken::hash_token(&refresh_value))
            .await
            .unwrap();

        let err = fx
            .tokens
            .refresh(TokenRequest {
                grant_type: Some("refresh_token".to_string()),
                refresh_token: Some(refresh_value),
                client_id: Some(fx.app_id.to_string()),
                ..Default::default()
            })
            .await
            .unwrap_err();
        assert_eq!(err.oauth_error_code(), "invalid_grant");
    }

    #[tokio::test]
    async fn test_refresh_unknown_token_and_client() {
        let fx = fixture().await;

        let err = fx
            .tokens
            .refresh(TokenRequest {
                grant_type: Some("refresh_token".to_string()),
                refresh_token: Some("no-such-token".to_string()),
                client_id: Some(fx.app_id.to_string()),
                ..Default::default()
            })
            .await
            .unwrap_err();
        assert_eq!(err.oauth_error_code(), "invalid_grant");

        let err = fx
            .tokens
            .refresh(TokenRequest {
                grant_type: Some("refresh_token".to_string()),
                refresh_token: Some("whatever".to_string()),
                client_id: Some(Uuid::new_v4().to_string()),
                ..Default::default()
            })
            .await
            .unwrap_err();
        assert_eq!(err.oauth_error_code(), "invalid_client");
    }

    #[tokio::test]
    async fn test_refresh_grant_type_required() {
        let fx = fixture().await;

        let err = fx
            .tokens
            .refresh(TokenRequest {
                refresh_token: Some("tok".to_string()),
                client_id: Some(fx.app_id.to_string()),
                ..Default::default()
            })
            .await
            .unwrap_err();
        assert_eq!(err.oauth_error_code(), "invalid_request");

        let err = fx
            .tokens
            .refresh(TokenRequest {
                grant_type: Some("authorization_code".to_string()),
                refresh_token: Some("tok".to_string()),
                client_id: Some(fx.app_id.to_string()),
                ..Default::default()
            })
            .await
            .unwrap_err();
        assert_eq!(err.oauth_error_code(), "unsupported_grant_type");
    }

    #[tokio::test]
    async fn test_resolve_rejects_unknown_app_and_redirect() {
        let fx = fixture().await;
        let verifier = PkceVerifier::generate();
        let challenge = PkceChallenge::from_verifier(&verifier);

        let mut raw = raw_request(Uuid::new_v4(), &challenge);
        let err = fx.authorization.resolve(raw).await.unwrap_err();
        assert_eq!(err.oauth_error_code(), "invalid_client");

        raw = raw_request(fx.app_id, &challenge);
        raw.redirect_uri = Some("https://evil.example.com/cb".to_string());
        let err = fx.authorization.resolve(raw).await.unwrap_err();
        assert_eq!(err.oauth_error_code(), "invalid_request");
        assert!(err.to_string().contains("not authorized for this app"));
    }

    #[tokio::test]
    async fn test_resolve_accepts_registered_callback() {
        let fx = fixture().await;
        let verifier = PkceVerifier::generate();
        let challenge = PkceChallenge::from_verifier(&verifier);

        let mut raw = raw_request(fx.app_id, &challenge);
        raw.redirect_uri = Some("https://app.example.com/callback/".to_string());
        // one trailing slash of difference is tolerated
        assert!(fx.authorization.resolve(raw).await.is_ok());
    }
}
