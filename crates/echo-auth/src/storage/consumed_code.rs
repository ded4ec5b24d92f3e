//! Consumed authorization-code storage trait.
//!
//! Authorization codes are self-contained signed JWTs, so their authenticity
//! needs no storage, but "use exactly once" does. This trait tracks the
//! random nonce embedded in each code; a nonce can be consumed exactly once.
//!
//! # Security Considerations
//!
//! - `mark_consumed` must be atomic: two concurrent exchanges of the same
//!   code must not both succeed
//! - Entries only need to live as long as the code TTL (five minutes);
//!   after that the signature check rejects the code anyway
//! - Expired entries should be cleaned up periodically

use async_trait::async_trait;
use time::OffsetDateTime;

use crate::AuthResult;

/// Storage trait for single-use authorization-code nonces.
#[async_trait]
pub trait ConsumedCodeStorage: Send + Sync {
    /// Atomically marks a code nonce as consumed if not already consumed.
    ///
    /// # Arguments
    ///
    /// * `nonce` - The code's random nonce claim
    /// * `expires_at` - When this entry can be cleaned up (the code's exp)
    ///
    /// # Returns
    ///
    /// `true` if the nonce was consumed now (first use), `false` if it had
    /// already been consumed (replay).
    ///
    /// # Errors
    ///
    /// Returns an error if the storage operation fails.
    ///
    /// # Atomicity
    ///
    /// Implementations must make the check-and-mark a single atomic step,
    /// e.g. a conditional insert:
    ///
    /// ```sql
    /// INSERT INTO consumed_codes (nonce, expires_at)
    /// VALUES ($1, $2)
    /// ON CONFLICT (nonce) DO NOTHING
    /// RETURNING nonce
    /// ```
    async fn mark_consumed(&self, nonce: &str, expires_at: OffsetDateTime) -> AuthResult<bool>;

    /// Deletes entries whose `expires_at` has passed.
    ///
    /// # Returns
    ///
    /// The number of entries deleted.
    ///
    /// # Errors
    ///
    /// Returns an error if the cleanup operation fails.
    async fn cleanup_expired(&self) -> AuthResult<u64>;
}
