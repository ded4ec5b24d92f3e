//! In-memory storage implementations.
//!
//! Backing store for development and tests. All maps are guarded by
//! `tokio::sync::RwLock`; the write paths that need check-then-act
//! semantics (nonce consumption, archive-once) hold the write lock across
//! both steps, which gives the atomicity the traits require within one
//! process.

use std::collections::{HashMap, HashSet};

use async_trait::async_trait;
use time::OffsetDateTime;
use tokio::sync::RwLock;
use uuid::Uuid;

use crate::AuthResult;
use crate::error::AuthError;
use crate::storage::{
    AppMembershipStorage, AppStorage, ConsumedCodeStorage, RefreshTokenStorage, SessionStorage,
};
use crate::types::{EchoApp, RefreshToken};

// =============================================================================
// Apps
// =============================================================================

/// In-memory app registry.
#[derive(Default)]
pub struct InMemoryAppStorage {
    apps: RwLock<HashMap<Uuid, EchoApp>>,
}

impl InMemoryAppStorage {
    /// Creates an empty registry.
    #[must_use]
    pub fn new() -> Self {
        Self::default()
    }

    /// Registers an app.
    pub async fn insert(&self, app: EchoApp) {
        self.apps.write().await.insert(app.id, app);
    }
}

#[async_trait]
impl AppStorage for InMemoryAppStorage {
    async fn find_by_id(&self, id: Uuid) -> AuthResult<Option<EchoApp>> {
        Ok(self.apps.read().await.get(&id).cloned())
    }

    async fn add_callback_url(&self, app_id: Uuid, url: &str) -> AuthResult<()> {
        let mut apps = self.apps.write().await;
        let app = apps
            .get_mut(&app_id)
            .ok_or_else(|| AuthError::storage(format!("app {app_id} not found")))?;
        if !app.authorized_callback_urls.iter().any(|u| u == url) {
            app.authorized_callback_urls.push(url.to_string());
        }
        Ok(())
    }
}

// =============================================================================
// Sessions
// =============================================================================

/// In-memory session token map.
#[derive(Default)]
pub struct InMemorySessionStorage {
    sessions: RwLock<HashMap<String, String>>,
}

impl InMemorySessionStorage {
    /// Creates an empty session store.
    #[must_use]
    pub fn new() -> Self {
        Self::default()
    }

    /// Records a session token for a user.
    pub async fn insert(&self, token: impl Into<String>, user_id: impl Into<String>) {
        self.sessions
            .write()
            .await
            .insert(token.into(), user_id.into());
    }
}

#[async_trait]
impl SessionStorage for InMemorySessionStorage {
    async fn find_user_by_token(&self, token: &str) -> AuthResult<Option<String>> {
        Ok(self.sessions.read().await.get(token).cloned())
    }
}

// =============================================================================
// Memberships
// =============================================================================

/// In-memory app membership set.
#[derive(Default)]
pub struct InMemoryMembershipStorage {
    memberships: RwLock<HashSet<(Uuid, String)>>,
}

impl InMemoryMembershipStorage {
    /// Creates an empty membership store.
    #[must_use]
    pub fn new() -> Self {
        Self::default()
    }

    /// Returns `true` if a membership record exists.
    pub async fn contains(&self, app_id: Uuid, user_id: &str) -> bool {
        self.memberships
            .read()
            .await
            .contains(&(app_id, user_id.to_string()))
    }
}

#[async_trait]
impl AppMembershipStorage for InMemoryMembershipStorage {
    async fn ensure_membership(&self, app_id: Uuid, user_id: &str) -> AuthResult<()> {
        self.memberships
            .write()
            .await
            .insert((app_id, user_id.to_string()));
        Ok(())
    }
}

// =============================================================================
// Consumed codes
// =============================================================================

/// In-memory consumed-nonce set with expiry-based cleanup.
#[derive(Default)]
pub struct InMemoryConsumedCodeStorage {
    consumed: RwLock<HashMap<String, OffsetDateTime>>,
}

impl InMemoryConsumedCodeStorage {
    /// Creates an empty store.
    #[must_use]
    pub fn new() -> Self {
        Self::default()
    }
}

#[async_trait]
impl ConsumedCodeStorage for InMemoryConsumedCodeStorage {
    async fn mark_consumed(&self, nonce: &str, expires_at: OffsetDateTime) -> AuthResult<bool> {
        let mut consumed = self.consumed.write().await;
        if consumed.contains_key(nonce) {
            return Ok(false);
        }
        consumed.insert(nonce.to_string(), expires_at);
        Ok(true)
    }

    async fn cleanup_expired(&self) -> AuthResult<u64> {
        let now = OffsetDateTime::now_utc();
        let mut consumed = self.consumed.write().await;
        let before = consumed.len();
        consumed.retain(|_, expires_at| *expires_at > now);
        Ok((before - consumed.len()) as u64)
    }
}

// =============================================================================
// Refresh tokens
// =============================================================================

/// In-memory refresh token store keyed by token hash.
#[derive(Default)]
pub struct InMemoryRefreshTokenStorage {
    tokens: RwLock<HashMap<String, RefreshToken>>,
}

impl InMemoryRefreshTokenStorage {
    /// Creates an empty store.
    #[must_use]
    pub fn new() -> Self {
        Self::default()
    }
}

#[async_trait]
impl RefreshTokenStorage for InMemoryRefreshTokenStorage {
    async fn create(&self, token: &RefreshToken) -> AuthResult<()> {
        self.tokens
            .write()
            .await
            .insert(token.token_hash.clone(), token.clone());
        Ok(())
    }

    async fn find_by_hash(&self, token_hash: &str) -> AuthResult<Option<RefreshToken>> {
        Ok(self.tokens.read().await.get(token_hash).cloned())
    }

    async fn archive(&self, token_hash: &str, archived_at: OffsetDateTime) -> AuthResult<()> {
        let mut tokens = self.tokens.write().await;
        let token = tokens
            .get_mut(token_hash)
            .ok_or_else(|| AuthError::storage("refresh token not found"))?;
        if token.archived_at.is_none() {
            token.archived_at = Some(archived_at);
        }
        Ok(())
    }

    async fn revoke(&self, token_hash: &str) -> AuthResult<()> {
        let mut tokens = self.tokens.write().await;
        let token = tokens
            .get_mut(token_hash)
            .ok_or_else(|| AuthError::storage("refresh token not found"))?;
        token.revoked_at = Some(OffsetDateTime::now_utc());
        Ok(())
    }

    async fn cleanup_expired(&self) -> AuthResult<u64> {
        let now = OffsetDateTime::now_utc();
        let mut tokens = self.tokens.write().await;
        let before = tokens.len();
        tokens.retain(|_, t| t.expires_at > now && t.revoked_at.is_none());
        Ok((before - tokens.len()) as u64)
    }
}
