//! Storage traits for the OAuth flow.
//!
//! This module defines the persistence seams the flow depends on:
//!
//! - Registered apps and their callback allowlists
//! - User sessions (externally managed, read-only here)
//! - App membership records (lazily provisioned)
//! - Consumed authorization-code nonces (replay prevention)
//! - Refresh tokens
//!
//! In-memory implementations suitable for development and tests live in
//! [`memory`]; production deployments plug in their own backends.

pub mod app;
pub mod consumed_code;
pub mod membership;
pub mod memory;
pub mod refresh_token;
pub mod session;

pub use app::AppStorage;
pub use consumed_code::ConsumedCodeStorage;
pub use membership::AppMembershipStorage;
pub use memory::{
    InMemoryAppStorage, InMemoryConsumedCodeStorage, InMemoryMembershipStorage,
    InMemoryRefreshTokenStorage, InMemorySessionStorage,
};
pub use refresh_token::RefreshTokenStorage;
pub use session::SessionStorage;
