//! Refresh token storage trait.
//!
//! # Security Considerations
//!
//! - Tokens are stored as SHA-256 hashes only
//! - Archival (rotation) and revocation must be atomic
//! - Expired tokens should be cleaned up periodically

use async_trait::async_trait;
use time::OffsetDateTime;

use crate::AuthResult;
use crate::types::RefreshToken;

/// Storage trait for refresh tokens.
#[async_trait]
pub trait RefreshTokenStorage: Send + Sync {
    /// Stores a new refresh token record (with hashed token value).
    ///
    /// # Errors
    ///
    /// Returns an error if the token cannot be stored.
    async fn create(&self, token: &RefreshToken) -> AuthResult<()>;

    /// Finds a refresh token by the SHA-256 hash of its value.
    ///
    /// Returns the record regardless of expiry/archive/revocation status;
    /// callers decide redeemability via
    /// [`RefreshToken::is_redeemable`](crate::types::RefreshToken::is_redeemable).
    ///
    /// # Errors
    ///
    /// Returns an error if the storage operation fails.
    async fn find_by_hash(&self, token_hash: &str) -> AuthResult<Option<RefreshToken>>;

    /// Marks a token as archived (rotated out) at the given instant.
    ///
    /// A token is archived at most once: if `archived_at` is already set,
    /// this is a no-op, so the grace window is always measured from the
    /// first rotation.
    ///
    /// # Errors
    ///
    /// Returns an error if the token is not found or the operation fails.
    async fn archive(&self, token_hash: &str, archived_at: OffsetDateTime) -> AuthResult<()>;

    /// Revokes a token immediately. Once revoked, the token cannot be used,
    /// grace window or not.
    ///
    /// # Errors
    ///
    /// Returns an error if the token is not found or the operation fails.
    async fn revoke(&self, token_hash: &str) -> AuthResult<()>;

    /// Deletes expired and dead-archived tokens.
    ///
    /// # Returns
    ///
    /// The number of tokens deleted.
    ///
    /// # Errors
    ///
    /// Returns an error if the cleanup operation fails.
    async fn cleanup_expired(&self) -> AuthResult<u64>;
}
