//! Domain types for the OAuth flow.

pub mod app;
pub mod refresh_token;

pub use app::EchoApp;
pub use refresh_token::RefreshToken;
