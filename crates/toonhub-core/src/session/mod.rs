//! Session and identity
//!
//! Answers "who is signed in" for the rest of the application.
//!
//! ## Architecture
//!
//! - **Provider port**: the `IdentityProvider` trait and the raw session types
//! - **Hosted client**: `HostedAuthClient`, the GoTrue-style HTTP implementation
//! - **Manager**: `SessionManager`, which resolves the session at startup and
//!   keeps a watched `Option<User>` current from provider pushes
//!
//! Consumers depend on the manager and the `User` it publishes; only the
//! auth commands talk to the provider directly.

mod client;
mod manager;
mod provider;

pub use client::HostedAuthClient;
pub use manager::{fallback_avatar_url, SessionManager, User};
pub use provider::{
    IdentityProvider, ProviderSession, SessionChange, SessionError, SignUpOutcome,
};
