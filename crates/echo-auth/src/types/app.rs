//! Echo app (OAuth client) domain type.
//!
//! Apps are created and managed by the surrounding platform; the OAuth flow
//! only reads them. All apps are public PKCE clients; there are no client
//! secrets.

use serde::{Deserialize, Serialize};
use uuid::Uuid;

/// A registered Echo application.
#[derive(Debug, Clone, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct EchoApp {
    /// App identifier; doubles as the OAuth `client_id`.
    pub id: Uuid,

    /// Display name shown on the consent page.
    pub name: String,

    /// User who owns the app. Owners may add callback URLs inline from the
    /// consent page.
    pub owner_user_id: String,

    /// Allowlisted callback URLs.
    pub authorized_callback_urls: Vec<String>,

    /// Whether the app is publicly listed.
    pub is_public: bool,
}

impl EchoApp {
    /// Checks whether a redirect URI is authorized for this app.
    ///
    /// A URI is authorized if it targets localhost over http (development
    /// exception), exactly matches an allowlist entry, or matches after a
    /// single trailing slash is stripped from either side. No further
    /// normalization is applied: scheme, host case, and ports must match
    /// byte for byte.
    #[must_use]
    pub fn authorizes_redirect(&self, redirect_uri: &str) -> bool {
        if redirect_uri.starts_with("http://localhost:") {
            return true;
        }

        let candidate = strip_one_trailing_slash(redirect_uri);
        self.authorized_callback_urls
            .iter()
            .any(|allowed| strip_one_trailing_slash(allowed) == candidate)
    }

    /// Returns `true` if the given user owns this app.
    #[must_use]
    pub fn is_owned_by(&self, user_id: &str) -> bool {
        self.owner_user_id == user_id
    }
}

/// Strips at most one trailing slash.
fn strip_one_trailing_slash(url: &str) -> &str {
    url.strip_suffix('/').unwrap_or(url)
}
