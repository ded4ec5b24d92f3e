//! App membership storage trait.
//!
//! The first time a user authorizes an app, a per-app user record is
//! provisioned so usage can later be attributed and billed. The OAuth flow
//! only needs the get-or-create operation.

use async_trait::async_trait;
use uuid::Uuid;

use crate::AuthResult;

/// Lazily provisions the app-user relationship.
#[async_trait]
pub trait AppMembershipStorage: Send + Sync {
    /// Ensure a membership record exists for `(app_id, user_id)`.
    ///
    /// Idempotent get-or-create: calling this for an existing membership is
    /// a no-op.
    ///
    /// # Errors
    ///
    /// Returns an error if the storage operation fails. The authorize flow
    /// surfaces that as `server_error`.
    async fn ensure_membership(&self, app_id: Uuid, user_id: &str) -> AuthResult<()>;
}
