//! Refresh token domain type.
//!
//! Refresh tokens rotate on every use. The token value is never stored;
//! only its SHA-256 hash is persisted. A rotated-out token is *archived*
//! rather than immediately invalidated: it stays redeemable for a short
//! grace window so a client retrying a refresh over a flaky connection does
//! not lose its session.

use serde::{Deserialize, Serialize};
use std::time::Duration;
use time::OffsetDateTime;
use uuid::Uuid;

/// Refresh token record as persisted.
///
/// # Validation at redemption
///
/// 1. Hash the incoming token and look up by hash
/// 2. Reject if expired or revoked
/// 3. Reject if archived and the grace window has elapsed
#[derive(Debug, Clone, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct RefreshToken {
    /// Unique identifier for this refresh token record.
    pub id: Uuid,

    /// SHA-256 hash of the actual token value (hex-encoded).
    pub token_hash: String,

    /// App the token was issued to.
    pub app_id: Uuid,

    /// User who authorized the grant.
    pub user_id: String,

    /// Granted scopes (space-separated).
    pub scope: String,

    /// When this token was created.
    #[serde(with = "time::serde::rfc3339")]
    pub created_at: OffsetDateTime,

    /// When this token expires.
    #[serde(with = "time::serde::rfc3339")]
    pub expires_at: OffsetDateTime,

    /// When this token was rotated out (None = current token).
    /// An archived token remains redeemable for the configured grace
    /// window measured from this instant.
    #[serde(
        default,
        skip_serializing_if = "Option::is_none",
        with = "time::serde::rfc3339::option"
    )]
    pub archived_at: Option<OffsetDateTime>,

    /// When this token was revoked (None = not revoked).
    #[serde(
        default,
        skip_serializing_if = "Option::is_none",
        with = "time::serde::rfc3339::option"
    )]
    pub revoked_at: Option<OffsetDateTime>,
}

impl RefreshToken {
    /// Returns `true` if this token has expired.
    #[must_use]
    pub fn is_expired(&self) -> bool {
        OffsetDateTime::now_utc() > self.expires_at
    }

    /// Returns `true` if this token has been revoked.
    #[must_use]
    pub fn is_revoked(&self) -> bool {
        self.revoked_at.is_some()
    }

    /// Returns `true` if this token may still be redeemed.
    ///
    /// Archived tokens stay redeemable until `archived_at + grace`; during
    /// that overlap both the old and the new token are valid, which is a
    /// deliberate relaxation for retry tolerance.
    #[must_use]
    pub fn is_redeemable(&self, grace: Duration) -> bool {
        if self.is_expired() || self.is_revoked() {
            return false;
        }
        match self.archived_at {
            None => true,
            Some(archived_at) => OffsetDateTime::now_utc() <= archived_at + grace,
        }
    }

    /// Hash a token value using SHA-256 (hex-encoded).
    #[must_use]
    pub fn hash_token(token: &str) -> String {
        use sha2::{Digest, Sha256};
        let mut hasher = Sha256::new();
        hasher.update(token.as_bytes());
        hex::encode(hasher.finalize())
    }

    /// Generate a cryptographically secure random token value.
    ///
    /// Returns a 256-bit random value encoded as base64url (43 characters).
    #[must_use]
    pub fn generate_token() -> String {
        use base64::Engine;
        use base64::engine::general_purpose::URL_SAFE_NO_PAD;

        let mut bytes = [0u8; 32];
        rand::Rng::fill(&mut rand::thread_rng(), &mut bytes);
        URL_SAFE_NO_PAD.encode(bytes)
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    fn token(
        expires_at: OffsetDateTime,
        archived_at: Option<OffsetDateTime>,
        revoked_at: Option<OffsetDateTime>,
    ) -> RefreshToken {
        RefreshToken {
            id: Uuid::new_v4(),
            token_hash: RefreshToken::hash_token("test-token"),
            app_id: Uuid::new_v4(),
            user_id: "user-1".to_string(),
            scope: "llm:invoke offline_access".to_string(),
            created_at: OffsetDateTime::now_utc(),
            expires_at,
            archived_at,
            revoked_at,
        }
    }

    #[test]
    fn test_hash_token() {
        let hash = RefreshToken::hash_token("test-token-value");
        assert_eq!(hash.len(), 64);
        assert_eq!(hash, RefreshToken::hash_token("test-token-value"));
        assert_ne!(hash, RefreshToken::hash_token("different-token"));
    }

    #[test]
    fn test_generate_token() {
        let value = RefreshToken::generate_token();
        assert_eq!(value.len(), 43);
        assert!(
            value
                .chars()
                .all(|c| c.is_ascii_alphanumeric() || c == '-' || c == '_')
        );
        assert_ne!(value, RefreshToken::generate_token());
    }

    #[test]
    fn test_expiry() {
        let now = OffsetDateTime::now_utc();
        assert!(!token(now + time::Duration::hours(1), None, None).is_expired());
        assert!(token(now - time::Duration::minutes(1), None, None).is_expired());
    }

    #[test]
    fn test_redeemable_current_token() {
        let now = OffsetDateTime::now_utc();
        let grace = Duration::from_millis(10_000);

        let current = token(now + time::Duration::hours(1), None, None);
        assert!(current.is_redeemable(grace));
    }

    #[test]
    fn test_redeemable_within_grace() {
        let now = OffsetDateTime::now_utc();
        let grace = Duration::from_millis(10_000);

        // Archived two seconds ago: still inside the 10 s grace window
        let archived = token(
            now + time::Duration::hours(1),
            Some(now - time::Duration::seconds(2)),
            None,
        );
        assert!(archived.is_redeemable(grace));
    }

    #[test]
    fn test_not_redeemable_after_grace() {
        let now = OffsetDateTime::now_utc();
        let grace = Duration::from_millis(10_000);

        let archived = token(
            now + time::Duration::hours(1),
            Some(now - time::Duration::seconds(20)),
            None,
        );
        assert!(!archived.is_redeemable(grace));
    }

    #[test]
    fn test_not_redeemable_when_revoked_or_expired() {
        let now = OffsetDateTime::now_utc();
        let grace = Duration::from_millis(10_000);

        let revoked = token(now + time::Duration::hours(1), None, Some(now));
        assert!(!revoked.is_redeemable(grace));

        let expired = token(now - time::Duration::minutes(1), None, None);
        assert!(!expired.is_redeemable(grace));
    }

    #[test]
    fn test_serialization_roundtrip() {
        let original = token(
            OffsetDateTime::now_utc() + time::Duration::hours(1),
            None,
            None,
        );
        let json = serde_json::to_string(&original).unwrap();
        let decoded: RefreshToken = serde_json::from_str(&json).unwrap();
        assert_eq!(original.id, decoded.id);
        assert_eq!(original.token_hash, decoded.token_hash);
        assert_eq!(original.app_id, decoded.app_id);
        assert!(decoded.archived_at.is_none());
    }
}
