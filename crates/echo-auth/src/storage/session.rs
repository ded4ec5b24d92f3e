//! User session storage trait.
//!
//! Sessions are created and managed by the surrounding platform's login
//! flow; the OAuth endpoints only resolve a session-cookie token to a user.

use async_trait::async_trait;

use crate::AuthResult;

/// Read-only lookup of the authenticated user behind a session token.
#[async_trait]
pub trait SessionStorage: Send + Sync {
    /// Resolve a session token to a user id.
    ///
    /// Returns `None` for unknown or expired tokens.
    ///
    /// # Errors
    ///
    /// Returns an error if the storage operation fails.
    async fn find_user_by_token(&self, token: &str) -> AuthResult<Option<String>>;
}
