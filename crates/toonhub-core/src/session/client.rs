//! Hosted identity provider client
//!
//! Talks to a GoTrue-style auth REST surface: password grant, signup,
//! session lookup, logout, and OAuth authorize URLs. The access token is
//! cached on disk so a sign-in survives across process runs; the cached
//! token is validated against the provider on every resolution and is
//! discarded the moment the provider stops accepting it.

use std::fs;
use std::path::PathBuf;
use std::time::Duration;

use async_trait::async_trait;
use serde::{Deserialize, Serialize};
use tokio::sync::broadcast;
use tracing::{debug, info, warn};

use super::provider::{
    IdentityProvider, ProviderSession, SessionChange, SessionError, SignUpOutcome,
};
use crate::config::Config;
use crate::storage::{self, StorageError};

/// Request timeout in seconds
const REQUEST_TIMEOUT: u64 = 10;

/// Capacity of the session-change broadcast channel
const EVENT_CAPACITY: usize = 16;

/// Client for a hosted GoTrue-style identity provider
pub struct HostedAuthClient {
    http: reqwest::Client,
    base_url: String,
    anon_key: String,
    token_path: PathBuf,
    events: broadcast::Sender<SessionChange>,
}

/// On-disk shape of the cached access token
#[derive(Debug, Serialize, Deserialize)]
struct CachedToken {
    access_token: String,
}

/// Successful token grant from the provider
#[derive(Debug, Deserialize)]
struct TokenResponse {
    access_token: String,
    user: WireUser,
}

/// User record as the provider serializes it
#[derive(Debug, Deserialize)]
struct WireUser {
    id: String,
    #[serde(default)]
    email: Option<String>,
    #[serde(default)]
    user_metadata: Option<WireMetadata>,
}

#[derive(Debug, Default, Deserialize)]
struct WireMetadata {
    #[serde(default)]
    avatar_url: Option<String>,
}

/// Error payload; the provider uses different field names per endpoint
#[derive(Debug, Default, Deserialize)]
#[serde(default)]
struct ErrorBody {
    error_description: Option<String>,
    msg: Option<String>,
    message: Option<String>,
}

impl WireUser {
    fn into_session(self) -> ProviderSession {
        ProviderSession {
            user_id: self.id,
            email: self.email.filter(|e| !e.is_empty()),
            avatar_url: self
                .user_metadata
                .unwrap_or_default()
                .avatar_url
                .filter(|u| !u.is_empty()),
        }
    }
}

impl HostedAuthClient {
    /// Create a client from configuration
    ///
    /// Requires `auth_url` and `auth_anon_key` to be set; the token cache
    /// lives next to the entry snapshot in the data directory.
    pub fn from_config(config: &Config) -> Result<Self, SessionError> {
        let base_url = config.auth_url.clone().ok_or(SessionError::NotConfigured)?;
        let anon_key = config
            .auth_anon_key
            .clone()
            .ok_or(SessionError::NotConfigured)?;

        reqwest::Url::parse(&base_url).map_err(|e| SessionError::InvalidProviderUrl {
            url: base_url.clone(),
            reason: e.to_string(),
        })?;

        let http = reqwest::Client::builder()
            .timeout(Duration::from_secs(REQUEST_TIMEOUT))
            .build()?;

        let (events, _) = broadcast::channel(EVENT_CAPACITY);

        Ok(Self {
            http,
            base_url: base_url.trim_end_matches('/').to_string(),
            anon_key,
            token_path: config.session_token_path(),
            events,
        })
    }

    fn endpoint(&self, path: &str) -> String {
        format!("{}/auth/v1/{}", self.base_url, path)
    }

    fn emit(&self, change: SessionChange) {
        // No subscribers is fine; the send result only reports that
        let _ = self.events.send(change);
    }

    /// Look up the user behind an access token
    ///
    /// `Ok(None)` means the provider no longer accepts the token.
    async fn fetch_user(&self, access_token: &str) -> Result<Option<ProviderSession>, SessionError> {
        let response = self
            .http
            .get(self.endpoint("user"))
            .header("apikey", &self.anon_key)
            .bearer_auth(access_token)
            .send()
            .await?;

        let status = response.status();
        if status == reqwest::StatusCode::UNAUTHORIZED || status == reqwest::StatusCode::FORBIDDEN {
            return Ok(None);
        }

        let body = response.text().await?;
        if !status.is_success() {
            return Err(SessionError::Rejected(provider_message(&body, status)));
        }

        let user: WireUser = serde_json::from_str(&body)
            .map_err(|e| SessionError::Malformed(format!("user record: {}", e)))?;
        Ok(Some(user.into_session()))
    }

    fn load_cached_token(&self) -> Result<Option<String>, SessionError> {
        if !self.token_path.exists() {
            return Ok(None);
        }

        let raw = fs::read_to_string(&self.token_path)
            .map_err(|e| StorageError::from_io(e, self.token_path.clone()))?;

        match serde_json::from_str::<CachedToken>(&raw) {
            Ok(cached) => Ok(Some(cached.access_token)),
            Err(err) => {
                warn!(
                    path = %self.token_path.display(),
                    error = %err,
                    "Session token cache is unreadable, treating as signed out"
                );
                Ok(None)
            }
        }
    }

    fn store_token(&self, access_token: &str) -> Result<(), SessionError> {
        let cached = CachedToken {
            access_token: access_token.to_string(),
        };
        let data =
            serde_json::to_vec_pretty(&cached).map_err(|source| StorageError::Encode { source })?;
        // Bearer credential; the cache file stays owner-only
        storage::atomic_write_private(&self.token_path, &data)?;
        debug!(path = %self.token_path.display(), "Cached session token");
        Ok(())
    }

    fn clear_token(&self) -> Result<(), SessionError> {
        if self.token_path.exists() {
            fs::remove_file(&self.token_path)
                .map_err(|e| StorageError::from_io(e, self.token_path.clone()))?;
        }
        Ok(())
    }
}

#[async_trait]
impl IdentityProvider for HostedAuthClient {
    async fn current_session(&self) -> Result<Option<ProviderSession>, SessionError> {
        let token = match self.load_cached_token()? {
            Some(token) => token,
            None => return Ok(None),
        };

        match self.fetch_user(&token).await? {
            Some(session) => Ok(Some(session)),
            None => {
                debug!("Cached session token is no longer accepted, clearing it");
                self.clear_token()?;
                Ok(None)
            }
        }
    }

    async fn sign_in_with_password(
        &self,
        email: &str,
        password: &str,
    ) -> Result<ProviderSession, SessionError> {
        let response = self
            .http
            .post(self.endpoint("token"))
            .query(&[("grant_type", "password")])
            .header("apikey", &self.anon_key)
            .json(&serde_json::json!({ "email": email, "password": password }))
            .send()
            .await?;

        let status = response.status();
        let body = response.text().await?;
        if !status.is_success() {
            return Err(SessionError::Rejected(provider_message(&body, status)));
        }

        let token: TokenResponse = serde_json::from_str(&body)
            .map_err(|e| SessionError::Malformed(format!("token grant: {}", e)))?;

        let session = token.user.into_session();
        self.store_token(&token.access_token)?;
        self.emit(SessionChange::SignedIn(session.clone()));
        info!(user_id = %session.user_id, "Signed in with password");
        Ok(session)
    }

    async fn sign_up_with_password(
        &self,
        email: &str,
        password: &str,
    ) -> Result<SignUpOutcome, SessionError> {
        let response = self
            .http
            .post(self.endpoint("signup"))
            .header("apikey", &self.anon_key)
            .json(&serde_json::json!({ "email": email, "password": password }))
            .send()
            .await?;

        let status = response.status();
        let body = response.text().await?;
        if !status.is_success() {
            return Err(SessionError::Rejected(provider_message(&body, status)));
        }

        // With email confirmation disabled the provider answers with a full
        // token grant; otherwise it returns just the pending user record.
        if let Ok(token) = serde_json::from_str::<TokenResponse>(&body) {
            let session = token.user.into_session();
            self.store_token(&token.access_token)?;
            self.emit(SessionChange::SignedIn(session.clone()));
            info!(user_id = %session.user_id, "Signed up and signed in");
            return Ok(SignUpOutcome {
                session: Some(session),
            });
        }

        info!("Signed up, waiting for email confirmation");
        Ok(SignUpOutcome { session: None })
    }

    async fn sign_in_with_token(
        &self,
        access_token: &str,
    ) -> Result<ProviderSession, SessionError> {
        match self.fetch_user(access_token).await? {
            Some(session) => {
                self.store_token(access_token)?;
                self.emit(SessionChange::SignedIn(session.clone()));
                info!(user_id = %session.user_id, "Signed in with access token");
                Ok(session)
            }
            None => Err(SessionError::Rejected(
                "the access token was not accepted".to_string(),
            )),
        }
    }

    fn oauth_authorize_url(
        &self,
        provider: &str,
        redirect_to: &str,
    ) -> Result<String, SessionError> {
        let mut url = reqwest::Url::parse(&self.endpoint("authorize")).map_err(|e| {
            SessionError::InvalidProviderUrl {
                url: self.base_url.clone(),
                reason: e.to_string(),
            }
        })?;
        url.query_pairs_mut()
            .append_pair("provider", provider)
            .append_pair("redirect_to", redirect_to);
        Ok(url.to_string())
    }

    async fn sign_out(&self) -> Result<(), SessionError> {
        if let Some(token) = self.load_cached_token()? {
            let result = self
                .http
                .post(self.endpoint("logout"))
                .header("apikey", &self.anon_key)
                .bearer_auth(&token)
                .send()
                .await;
            if let Err(err) = result {
                warn!(error = %err, "Provider logout failed, discarding the local session anyway");
            }
        }

        self.clear_token()?;
        self.emit(SessionChange::SignedOut);
        info!("Signed out");
        Ok(())
    }

    fn subscribe(&self) -> broadcast::Receiver<SessionChange> {
        self.events.subscribe()
    }
}

/// Best human-readable message out of a provider error body
fn provider_message(body: &str, status: reqwest::StatusCode) -> String {
    let parsed: ErrorBody = serde_json::from_str(body).unwrap_or_default();
    parsed
        .error_description
        .or(parsed.msg)
        .or(parsed.message)
        .filter(|m| !m.is_empty())
        .unwrap_or_else(|| format!("HTTP {}", status))
}

#[cfg(test)]
mod tests {
    use super::*;
    use tempfile::TempDir;

    fn test_config(temp_dir: &TempDir) -> Config {
        Config {
            data_dir: temp_dir.path().to_path_buf(),
            auth_url: Some("https://auth.example.com".to_string()),
            auth_anon_key: Some("anon-key".to_string()),
            ..Default::default()
        }
    }

    #[test]
    fn test_from_config_requires_endpoint() {
        let temp_dir = TempDir::new().unwrap();
        let mut config = test_config(&temp_dir);
        config.auth_url = None;

        let result = HostedAuthClient::from_config(&config);
        assert!(matches!(result, Err(SessionError::NotConfigured)));
    }

    #[test]
    fn test_from_config_requires_anon_key() {
        let temp_dir = TempDir::new().unwrap();
        let mut config = test_config(&temp_dir);
        config.auth_anon_key = None;

        let result = HostedAuthClient::from_config(&config);
        assert!(matches!(result, Err(SessionError::NotConfigured)));
    }

    #[test]
    fn test_from_config_rejects_invalid_url() {
        let temp_dir = TempDir::new().unwrap();
        let mut config = test_config(&temp_dir);
        config.auth_url = Some("not a url".to_string());

        let result = HostedAuthClient::from_config(&config);
        assert!(matches!(
            result,
            Err(SessionError::InvalidProviderUrl { .. })
        ));
    }

    #[test]
    fn test_endpoint_trims_trailing_slash() {
        let temp_dir = TempDir::new().unwrap();
        let mut config = test_config(&temp_dir);
        config.auth_url = Some("https://auth.example.com/".to_string());

        let client = HostedAuthClient::from_config(&config).unwrap();
        assert_eq!(
            client.endpoint("signup"),
            "https://auth.example.com/auth/v1/signup"
        );
    }

    #[test]
    fn test_oauth_authorize_url_encodes_parameters() {
        let temp_dir = TempDir::new().unwrap();
        let client = HostedAuthClient::from_config(&test_config(&temp_dir)).unwrap();

        let url = client
            .oauth_authorize_url("github", "https://example.com/done?step=1")
            .unwrap();

        assert!(url.starts_with("https://auth.example.com/auth/v1/authorize?"));
        assert!(url.contains("provider=github"));
        assert!(url.contains("redirect_to=https%3A%2F%2Fexample.com%2Fdone%3Fstep%3D1"));
    }

    #[test]
    fn test_token_cache_round_trip() {
        let temp_dir = TempDir::new().unwrap();
        let client = HostedAuthClient::from_config(&test_config(&temp_dir)).unwrap();

        assert_eq!(client.load_cached_token().unwrap(), None);

        client.store_token("abc123").unwrap();
        assert_eq!(client.load_cached_token().unwrap().as_deref(), Some("abc123"));

        client.clear_token().unwrap();
        assert_eq!(client.load_cached_token().unwrap(), None);
        assert!(!client.token_path.exists());
    }

    #[test]
    fn test_unreadable_token_cache_treated_as_signed_out() {
        let temp_dir = TempDir::new().unwrap();
        let client = HostedAuthClient::from_config(&test_config(&temp_dir)).unwrap();

        fs::write(&client.token_path, b"not json at all").unwrap();

        assert_eq!(client.load_cached_token().unwrap(), None);
    }

    #[test]
    #[cfg(unix)]
    fn test_token_cache_is_owner_only() {
        use std::os::unix::fs::PermissionsExt;

        let temp_dir = TempDir::new().unwrap();
        let client = HostedAuthClient::from_config(&test_config(&temp_dir)).unwrap();

        client.store_token("abc123").unwrap();

        let mode = fs::metadata(&client.token_path).unwrap().permissions().mode();
        assert_eq!(mode & 0o777, 0o600);
    }

    #[test]
    fn test_provider_message_prefers_description() {
        let body = r#"{"error":"invalid_grant","error_description":"Invalid login credentials"}"#;
        let message = provider_message(body, reqwest::StatusCode::BAD_REQUEST);
        assert_eq!(message, "Invalid login credentials");
    }

    #[test]
    fn test_provider_message_falls_back_to_msg() {
        let body = r#"{"msg":"User already registered"}"#;
        let message = provider_message(body, reqwest::StatusCode::UNPROCESSABLE_ENTITY);
        assert_eq!(message, "User already registered");
    }

    #[test]
    fn test_provider_message_falls_back_to_status() {
        let message = provider_message("<html>gateway</html>", reqwest::StatusCode::BAD_GATEWAY);
        assert_eq!(message, "HTTP 502 Bad Gateway");
    }

    #[test]
    fn test_wire_user_conversion() {
        let user: WireUser = serde_json::from_str(
            r#"{"id":"u-1","email":"erin@example.com","user_metadata":{"avatar_url":"https://img.example.com/erin.png"}}"#,
        )
        .unwrap();
        let session = user.into_session();

        assert_eq!(session.user_id, "u-1");
        assert_eq!(session.email.as_deref(), Some("erin@example.com"));
        assert_eq!(
            session.avatar_url.as_deref(),
            Some("https://img.example.com/erin.png")
        );
    }

    #[test]
    fn test_wire_user_conversion_filters_empty_fields() {
        let user: WireUser =
            serde_json::from_str(r#"{"id":"u-2","email":"","user_metadata":{"avatar_url":""}}"#)
                .unwrap();
        let session = user.into_session();

        assert_eq!(session.email, None);
        assert_eq!(session.avatar_url, None);
    }

    #[test]
    fn test_wire_user_conversion_without_metadata() {
        let user: WireUser = serde_json::from_str(r#"{"id":"u-3"}"#).unwrap();
        let session = user.into_session();

        assert_eq!(session.user_id, "u-3");
        assert_eq!(session.email, None);
        assert_eq!(session.avatar_url, None);
    }
}
