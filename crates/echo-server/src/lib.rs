//! # echo-server
//!
//! HTTP server exposing the Echo OAuth 2.0 endpoints:
//!
//! - `GET /api/oauth/authorize` - authorization endpoint (consent UI)
//! - `POST /api/oauth/authorize` - authorization decision for XHR clients
//! - `POST /api/oauth/authorize/decision` - consent form submission
//! - `POST /api/oauth/token` - token endpoint (code exchange and refresh)
//! - `POST /api/oauth/refresh` - refresh-only token endpoint
//! - `GET /healthz` - liveness probe
//!
//! The flow logic lives in [`echo_auth`]; this crate wires it to axum.

pub mod http;
pub mod observability;

use std::sync::Arc;

use axum::Router;

use echo_auth::config::OAuthConfig;
use echo_auth::oauth::{AuthorizationService, CodeSigner, TokenService};
use echo_auth::storage::{
    AppMembershipStorage, AppStorage, ConsumedCodeStorage, InMemoryAppStorage,
    InMemoryConsumedCodeStorage, InMemoryMembershipStorage, InMemoryRefreshTokenStorage,
    InMemorySessionStorage, RefreshTokenStorage, SessionStorage,
};

/// Shared state for all OAuth endpoints.
#[derive(Clone)]
pub struct AppState {
    /// Server configuration.
    pub config: OAuthConfig,
    /// Authorization endpoint service.
    pub authorization: Arc<AuthorizationService>,
    /// Token endpoint service.
    pub tokens: Arc<TokenService>,
    /// Session lookup for the `echo_session` cookie.
    pub sessions: Arc<dyn SessionStorage>,
}

impl AppState {
    /// Wires the services from a configuration and a set of storage
    /// backends.
    pub fn new(
        config: OAuthConfig,
        apps: Arc<dyn AppStorage>,
        sessions: Arc<dyn SessionStorage>,
        memberships: Arc<dyn AppMembershipStorage>,
        consumed_codes: Arc<dyn ConsumedCodeStorage>,
        refresh_tokens: Arc<dyn RefreshTokenStorage>,
    ) -> Self {
        let signer = Arc::new(CodeSigner::new(&config.code_signing_secret));
        let authorization = Arc::new(AuthorizationService::new(
            apps.clone(),
            memberships,
            signer.clone(),
        ));
        let tokens = Arc::new(TokenService::new(
            config.clone(),
            signer,
            apps,
            consumed_codes,
            refresh_tokens,
        ));

        Self {
            config,
            authorization,
            tokens,
            sessions,
        }
    }
}

/// Handles onto the in-memory backends behind an [`AppState`], for seeding
/// apps and sessions in development and tests.
pub struct InMemoryBackends {
    /// App registry.
    pub apps: Arc<InMemoryAppStorage>,
    /// Session store.
    pub sessions: Arc<InMemorySessionStorage>,
    /// Refresh token store.
    pub refresh_tokens: Arc<InMemoryRefreshTokenStorage>,
}

/// Builds an [`AppState`] backed entirely by in-memory storage.
#[must_use]
pub fn in_memory_state(config: OAuthConfig) -> (AppState, InMemoryBackends) {
    let apps = Arc::new(InMemoryAppStorage::new());
    let sessions = Arc::new(InMemorySessionStorage::new());
    let refresh_tokens = Arc::new(InMemoryRefreshTokenStorage::new());

    let state = AppState::new(
        config,
        apps.clone(),
        sessions.clone(),
        Arc::new(InMemoryMembershipStorage::new()),
        Arc::new(InMemoryConsumedCodeStorage::new()),
        refresh_tokens.clone(),
    );

    (
        state,
        InMemoryBackends {
            apps,
            sessions,
            refresh_tokens,
        },
    )
}

/// Builds the axum application.
#[must_use]
pub fn build_app(state: AppState) -> Router {
    http::router(state)
}
