//! Session lifecycle management
//!
//! Owns the resolved `Option<User>` for the whole application: the session
//! is resolved once at startup, then kept current by following the
//! provider's change subscription until shutdown. Everything else reads the
//! current value or watches it; nothing else mutates it.

use std::sync::Arc;

use serde::Serialize;
use tokio::sync::{broadcast, watch};
use tokio::task::JoinHandle;
use tracing::{debug, warn};

use super::provider::{IdentityProvider, ProviderSession, SessionChange};

/// Username used when the provider supplies no email-like identifier
const FALLBACK_USERNAME: &str = "user";

/// The resolved identity of the signed-in user
#[derive(Debug, Clone, Serialize, PartialEq, Eq)]
pub struct User {
    /// Provider-assigned id, also the entry author id
    pub id: String,
    /// Display name shown on entries and comments
    pub username: String,
    /// Avatar URL, always present (placeholder when the provider has none)
    pub avatar: String,
}

impl User {
    /// Derive the user-facing identity from a raw provider session
    ///
    /// The username is the local part of the email address, falling back to
    /// "user". A missing avatar becomes a generated placeholder keyed by
    /// the user id, so two sessions for the same account always render the
    /// same face.
    pub fn from_provider(session: &ProviderSession) -> Self {
        let username = session
            .email
            .as_deref()
            .and_then(|email| email.split('@').next())
            .filter(|part| !part.is_empty())
            .unwrap_or(FALLBACK_USERNAME)
            .to_string();

        let avatar = session
            .avatar_url
            .clone()
            .unwrap_or_else(|| fallback_avatar_url(&session.user_id));

        Self {
            id: session.user_id.clone(),
            username,
            avatar,
        }
    }
}

/// Deterministic placeholder avatar for a user id
pub fn fallback_avatar_url(id: &str) -> String {
    format!("https://api.dicebear.com/7.x/avataaars/svg?seed={}", id)
}

/// Tracks the signed-in user across the life of the process
///
/// Created with [`SessionManager::start`], which resolves the initial
/// session and spawns a listener task over the provider's change
/// subscription. Dropping the manager stops the listener.
pub struct SessionManager {
    current_rx: watch::Receiver<Option<User>>,
    listener: Option<JoinHandle<()>>,
}

impl SessionManager {
    /// Resolve the initial session and start following provider changes
    ///
    /// A provider failure during resolution degrades to signed-out with a
    /// logged warning; it never blocks startup.
    pub async fn start(provider: Arc<dyn IdentityProvider>) -> Self {
        let initial = match provider.current_session().await {
            Ok(session) => session.map(|s| User::from_provider(&s)),
            Err(err) => {
                warn!(error = %err, "Could not resolve the session, starting signed out");
                None
            }
        };

        let (current_tx, current_rx) = watch::channel(initial);
        let changes = provider.subscribe();
        let listener = tokio::spawn(follow_changes(changes, current_tx));

        Self {
            current_rx,
            listener: Some(listener),
        }
    }

    /// The currently signed-in user, if any
    pub fn current_user(&self) -> Option<User> {
        self.current_rx.borrow().clone()
    }

    /// Watch the signed-in user for changes
    pub fn subscribe(&self) -> watch::Receiver<Option<User>> {
        self.current_rx.clone()
    }

    /// Stop following provider changes
    ///
    /// After this returns no further session updates are published.
    pub fn shutdown(&mut self) {
        if let Some(listener) = self.listener.take() {
            listener.abort();
        }
    }
}

impl Drop for SessionManager {
    fn drop(&mut self) {
        self.shutdown();
    }
}

/// Apply provider change notifications to the watched value
async fn follow_changes(
    mut changes: broadcast::Receiver<SessionChange>,
    current: watch::Sender<Option<User>>,
) {
    loop {
        match changes.recv().await {
            Ok(SessionChange::SignedIn(session)) => {
                let user = User::from_provider(&session);
                debug!(username = %user.username, "Session signed in");
                let _ = current.send(Some(user));
            }
            Ok(SessionChange::SignedOut) => {
                debug!("Session signed out");
                let _ = current.send(None);
            }
            Err(broadcast::error::RecvError::Lagged(skipped)) => {
                // Only the latest state matters, so keep going
                warn!(skipped, "Missed session changes, continuing from the latest");
            }
            Err(broadcast::error::RecvError::Closed) => break,
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::session::provider::{SessionError, SignUpOutcome};
    use async_trait::async_trait;

    struct StubProvider {
        session: Option<ProviderSession>,
        fail_resolution: bool,
        changes: broadcast::Sender<SessionChange>,
    }

    impl StubProvider {
        fn new(session: Option<ProviderSession>) -> Self {
            let (changes, _) = broadcast::channel(16);
            Self {
                session,
                fail_resolution: false,
                changes,
            }
        }

        fn failing() -> Self {
            let mut stub = Self::new(None);
            stub.fail_resolution = true;
            stub
        }
    }

    #[async_trait]
    impl IdentityProvider for StubProvider {
        async fn current_session(&self) -> Result<Option<ProviderSession>, SessionError> {
            if self.fail_resolution {
                return Err(SessionError::Rejected("provider offline".to_string()));
            }
            Ok(self.session.clone())
        }

        async fn sign_in_with_password(
            &self,
            _email: &str,
            _password: &str,
        ) -> Result<ProviderSession, SessionError> {
            Err(SessionError::Rejected("not supported".to_string()))
        }

        async fn sign_up_with_password(
            &self,
            _email: &str,
            _password: &str,
        ) -> Result<SignUpOutcome, SessionError> {
            Err(SessionError::Rejected("not supported".to_string()))
        }

        async fn sign_in_with_token(
            &self,
            _access_token: &str,
        ) -> Result<ProviderSession, SessionError> {
            Err(SessionError::Rejected("not supported".to_string()))
        }

        fn oauth_authorize_url(
            &self,
            _provider: &str,
            _redirect_to: &str,
        ) -> Result<String, SessionError> {
            Err(SessionError::Rejected("not supported".to_string()))
        }

        async fn sign_out(&self) -> Result<(), SessionError> {
            Ok(())
        }

        fn subscribe(&self) -> broadcast::Receiver<SessionChange> {
            self.changes.subscribe()
        }
    }

    fn sample_session() -> ProviderSession {
        ProviderSession {
            user_id: "u-1".to_string(),
            email: Some("erin@example.com".to_string()),
            avatar_url: Some("https://img.example.com/erin.png".to_string()),
        }
    }

    #[test]
    fn test_user_from_provider() {
        let user = User::from_provider(&sample_session());

        assert_eq!(user.id, "u-1");
        assert_eq!(user.username, "erin");
        assert_eq!(user.avatar, "https://img.example.com/erin.png");
    }

    #[test]
    fn test_user_without_email_gets_fallback_name() {
        let session = ProviderSession {
            user_id: "u-2".to_string(),
            email: None,
            avatar_url: None,
        };
        let user = User::from_provider(&session);

        assert_eq!(user.username, "user");
        assert_eq!(user.avatar, fallback_avatar_url("u-2"));
    }

    #[test]
    fn test_user_with_empty_local_part_gets_fallback_name() {
        let session = ProviderSession {
            user_id: "u-3".to_string(),
            email: Some("@example.com".to_string()),
            avatar_url: None,
        };
        let user = User::from_provider(&session);

        assert_eq!(user.username, "user");
    }

    #[tokio::test]
    async fn test_start_resolves_initial_session() {
        let provider = Arc::new(StubProvider::new(Some(sample_session())));
        let manager = SessionManager::start(provider).await;

        let user = manager.current_user().unwrap();
        assert_eq!(user.username, "erin");
    }

    #[tokio::test]
    async fn test_start_without_session() {
        let provider = Arc::new(StubProvider::new(None));
        let manager = SessionManager::start(provider).await;

        assert!(manager.current_user().is_none());
    }

    #[tokio::test]
    async fn test_resolution_failure_starts_signed_out() {
        let provider = Arc::new(StubProvider::failing());
        let manager = SessionManager::start(provider).await;

        assert!(manager.current_user().is_none());
    }

    #[tokio::test]
    async fn test_follows_sign_in_and_sign_out() {
        let provider = Arc::new(StubProvider::new(None));
        let manager = SessionManager::start(provider.clone()).await;
        let mut watched = manager.subscribe();

        provider
            .changes
            .send(SessionChange::SignedIn(sample_session()))
            .unwrap();
        watched.changed().await.unwrap();
        assert_eq!(
            watched.borrow().as_ref().map(|u| u.username.clone()),
            Some("erin".to_string())
        );

        provider.changes.send(SessionChange::SignedOut).unwrap();
        watched.changed().await.unwrap();
        assert!(watched.borrow().is_none());
    }

    #[tokio::test]
    async fn test_shutdown_stops_updates() {
        let provider = Arc::new(StubProvider::new(None));
        let mut manager = SessionManager::start(provider.clone()).await;
        manager.shutdown();

        // The listener is gone, so this change must not surface
        let _ = provider.changes.send(SessionChange::SignedIn(sample_session()));
        tokio::time::sleep(std::time::Duration::from_millis(20)).await;

        assert!(manager.current_user().is_none());
    }
}
