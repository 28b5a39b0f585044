//! Identity provider boundary
//!
//! The port every identity backend implements, plus the raw session shape
//! the backend hands back. Consumers never see protocol detail; they get
//! the session triple and a push subscription for changes.

use async_trait::async_trait;
use serde::{Deserialize, Serialize};
use thiserror::Error;
use tokio::sync::broadcast;

use crate::storage::StorageError;

/// Raw session data returned by an identity provider
#[derive(Debug, Clone, Serialize, Deserialize, PartialEq, Eq)]
pub struct ProviderSession {
    /// Opaque provider-assigned user id
    pub user_id: String,
    /// Email-like account identifier, when the provider has one
    pub email: Option<String>,
    /// Avatar URL from provider metadata, when present
    pub avatar_url: Option<String>,
}

/// Push notification about a session transition
#[derive(Debug, Clone)]
pub enum SessionChange {
    /// A session became active (sign-in or token acceptance)
    SignedIn(ProviderSession),
    /// The session ended
    SignedOut,
}

/// Result of a sign-up attempt
#[derive(Debug, Clone)]
pub struct SignUpOutcome {
    /// The active session, when the provider signs the account in
    /// immediately. `None` means the provider wants the email address
    /// confirmed before the first sign-in.
    pub session: Option<ProviderSession>,
}

/// Errors from the identity boundary
#[derive(Error, Debug)]
pub enum SessionError {
    /// No provider endpoint configured
    #[error("Identity provider is not configured. Set auth_url and auth_anon_key in the config file.")]
    NotConfigured,

    /// Configured provider URL is not parseable
    #[error("Invalid identity provider URL '{url}': {reason}")]
    InvalidProviderUrl { url: String, reason: String },

    /// Transport-level failure talking to the provider
    #[error("Identity provider request failed: {0}")]
    Request(#[from] reqwest::Error),

    /// The provider refused the request (bad credentials, rejected token, ...)
    #[error("Identity provider rejected the request: {0}")]
    Rejected(String),

    /// The provider answered with a payload the client could not understand
    #[error("Identity provider returned an unexpected payload: {0}")]
    Malformed(String),

    /// The cached session token could not be read or written
    #[error("Failed to access the cached session token: {0}")]
    TokenCache(#[from] StorageError),
}

/// Boundary to a hosted identity provider
///
/// Implementations perform the actual authentication protocol. The rest of
/// the application only consumes `ProviderSession` values and the change
/// subscription.
#[async_trait]
pub trait IdentityProvider: Send + Sync {
    /// Resolve the currently signed-in session, if any
    ///
    /// Returns `Ok(None)` when nobody is signed in or a cached credential
    /// is no longer accepted. Errors are reserved for failures that leave
    /// the signed-in state unknown (e.g. the provider was unreachable).
    async fn current_session(&self) -> Result<Option<ProviderSession>, SessionError>;

    /// Sign in with email and password
    async fn sign_in_with_password(
        &self,
        email: &str,
        password: &str,
    ) -> Result<ProviderSession, SessionError>;

    /// Create an account with email and password
    async fn sign_up_with_password(
        &self,
        email: &str,
        password: &str,
    ) -> Result<SignUpOutcome, SessionError>;

    /// Complete an external (OAuth-style) sign-in with its access token
    async fn sign_in_with_token(&self, access_token: &str)
        -> Result<ProviderSession, SessionError>;

    /// URL that starts an OAuth-style sign-in for `provider` in a browser
    ///
    /// After the redirect completes, the resulting access token is handed
    /// to [`sign_in_with_token`](Self::sign_in_with_token).
    fn oauth_authorize_url(&self, provider: &str, redirect_to: &str)
        -> Result<String, SessionError>;

    /// End the current session
    async fn sign_out(&self) -> Result<(), SessionError>;

    /// Subscribe to push notifications about session changes
    fn subscribe(&self) -> broadcast::Receiver<SessionChange>;
}
