//! App storage trait.
//!
//! Defines the read side of the app registry the OAuth flow consults, plus
//! the one write the consent page's owner remediation needs.

use async_trait::async_trait;
use uuid::Uuid;

use crate::AuthResult;
use crate::types::EchoApp;

/// Storage operations for registered Echo apps.
///
/// The OAuth flow treats apps as read-only projections; creation and
/// management belong to the surrounding platform. The single mutation,
/// [`AppStorage::add_callback_url`], backs the owner-facing "authorize this
/// URL" action on the consent page.
#[async_trait]
pub trait AppStorage: Send + Sync {
    /// Find an app by its id (the OAuth `client_id`).
    ///
    /// Returns `None` if no such app exists.
    ///
    /// # Errors
    ///
    /// Returns an error if the storage operation fails.
    async fn find_by_id(&self, id: Uuid) -> AuthResult<Option<EchoApp>>;

    /// Append a callback URL to an app's allowlist.
    ///
    /// Idempotent: adding a URL that is already listed is a no-op.
    ///
    /// # Errors
    ///
    /// Returns an error if the app doesn't exist or the operation fails.
    async fn add_callback_url(&self, app_id: Uuid, url: &str) -> AuthResult<()>;
}
