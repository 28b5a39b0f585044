//! Application configuration
//!
//! Configuration is loaded from:
//! 1. Default values
//! 2. Config file (~/.config/toonhub/config.toml)
//! 3. Environment variables (TOONHUB_* prefix)
//!
//! Environment variables take precedence over config file values.

use anyhow::{Context, Result};
use serde::{Deserialize, Serialize};
use std::path::PathBuf;

/// Environment variable prefix
const ENV_PREFIX: &str = "TOONHUB";

/// Default AI model used for submission autofill
const DEFAULT_AI_MODEL: &str = "gemini-3-flash-preview";

/// Application configuration
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct Config {
    /// Directory for data storage (entry snapshot, session token cache)
    #[serde(default = "default_data_dir")]
    pub data_dir: PathBuf,

    /// Base URL of the hosted identity provider (optional)
    #[serde(default)]
    pub auth_url: Option<String>,

    /// Publishable API key for the identity provider
    #[serde(default)]
    pub auth_anon_key: Option<String>,

    /// API key for the AI autofill service
    #[serde(default)]
    pub ai_api_key: Option<String>,

    /// Model name for the AI autofill service
    #[serde(default = "default_ai_model")]
    pub ai_model: String,
}

impl Default for Config {
    fn default() -> Self {
        Self {
            data_dir: default_data_dir(),
            auth_url: None,
            auth_anon_key: None,
            ai_api_key: None,
            ai_model: default_ai_model(),
        }
    }
}

impl Config {
    /// Load configuration from default location and environment
    ///
    /// Order of precedence (highest to lowest):
    /// 1. Environment variables (TOONHUB_DATA_DIR, TOONHUB_AUTH_URL, ...)
    /// 2. Config file (~/.config/toonhub/config.toml or TOONHUB_CONFIG)
    /// 3. Default values
    pub fn load() -> Result<Self> {
        Self::load_from_path(&Self::config_file_path())
    }

    /// Load configuration from a specific path
    ///
    /// Environment variables are still applied as overrides.
    /// If the file doesn't exist, defaults are used.
    pub fn load_from_path(path: &PathBuf) -> Result<Self> {
        let mut config = if path.exists() {
            let content = std::fs::read_to_string(path)
                .with_context(|| format!("Failed to read config file: {:?}", path))?;
            toml::from_str(&content)
                .with_context(|| format!("Failed to parse config file: {:?}", path))?
        } else {
            Self::default()
        };

        config.apply_env_overrides();
        config.ensure_data_dir()?;
        Ok(config)
    }

    /// Load configuration from a TOML string (useful for testing)
    pub fn load_from_str(toml_content: &str) -> Result<Self> {
        let mut config: Config =
            toml::from_str(toml_content).context("Failed to parse config TOML")?;
        config.apply_env_overrides();
        Ok(config)
    }

    /// Apply environment variable overrides
    fn apply_env_overrides(&mut self) {
        // TOONHUB_DATA_DIR
        if let Ok(val) = std::env::var(format!("{}_DATA_DIR", ENV_PREFIX)) {
            self.data_dir = PathBuf::from(val);
        }

        // TOONHUB_AUTH_URL
        if let Ok(val) = std::env::var(format!("{}_AUTH_URL", ENV_PREFIX)) {
            self.auth_url = if val.is_empty() { None } else { Some(val) };
        }

        // TOONHUB_AUTH_ANON_KEY
        if let Ok(val) = std::env::var(format!("{}_AUTH_ANON_KEY", ENV_PREFIX)) {
            self.auth_anon_key = if val.is_empty() { None } else { Some(val) };
        }

        // TOONHUB_AI_API_KEY
        if let Ok(val) = std::env::var(format!("{}_AI_API_KEY", ENV_PREFIX)) {
            self.ai_api_key = if val.is_empty() { None } else { Some(val) };
        }

        // TOONHUB_AI_MODEL
        if let Ok(val) = std::env::var(format!("{}_AI_MODEL", ENV_PREFIX)) {
            if !val.is_empty() {
                self.ai_model = val;
            }
        }
    }

    /// Ensure data directory exists
    fn ensure_data_dir(&self) -> Result<()> {
        if !self.data_dir.exists() {
            std::fs::create_dir_all(&self.data_dir)
                .with_context(|| format!("Failed to create data directory: {:?}", self.data_dir))?;
        }
        Ok(())
    }

    /// Save configuration to file
    pub fn save(&self) -> Result<()> {
        let config_path = Self::config_file_path();

        if let Some(parent) = config_path.parent() {
            std::fs::create_dir_all(parent)
                .with_context(|| format!("Failed to create config directory: {:?}", parent))?;
        }

        let content = toml::to_string_pretty(self).context("Failed to serialize config")?;
        std::fs::write(&config_path, content)
            .with_context(|| format!("Failed to write config file: {:?}", config_path))?;
        Ok(())
    }

    /// Get the config file path
    ///
    /// Can be overridden with TOONHUB_CONFIG environment variable
    pub fn config_file_path() -> PathBuf {
        if let Ok(path) = std::env::var(format!("{}_CONFIG", ENV_PREFIX)) {
            return PathBuf::from(path);
        }

        dirs::config_dir()
            .unwrap_or_else(|| PathBuf::from("."))
            .join("toonhub")
            .join("config.toml")
    }

    /// Get the path to the entry snapshot file
    pub fn entries_path(&self) -> PathBuf {
        self.data_dir.join("entries.json")
    }

    /// Get the path to the cached session token
    pub fn session_token_path(&self) -> PathBuf {
        self.data_dir.join("session.json")
    }
}

/// Get the default data directory
fn default_data_dir() -> PathBuf {
    dirs::data_local_dir()
        .unwrap_or_else(|| PathBuf::from("."))
        .join("toonhub")
}

/// Get the default AI model name
fn default_ai_model() -> String {
    DEFAULT_AI_MODEL.to_string()
}

#[cfg(test)]
mod tests {
    use super::*;
    use std::env;
    use std::sync::Mutex;

    // Mutex to serialize tests that touch environment variables
    static ENV_MUTEX: Mutex<()> = Mutex::new(());

    /// Guard that locks env access and saves/restores env vars
    struct EnvGuard<'a> {
        _lock: std::sync::MutexGuard<'a, ()>,
        saved: Vec<(String, Option<String>)>,
    }

    impl<'a> EnvGuard<'a> {
        fn new(vars: &[&str]) -> Self {
            let lock = ENV_MUTEX.lock().unwrap();
            let saved = vars
                .iter()
                .map(|&name| (name.to_string(), env::var(name).ok()))
                .collect();
            // Clear all the vars
            for name in vars {
                env::remove_var(name);
            }
            Self { _lock: lock, saved }
        }
    }

    impl Drop for EnvGuard<'_> {
        fn drop(&mut self) {
            for (name, value) in &self.saved {
                match value {
                    Some(v) => env::set_var(name, v),
                    None => env::remove_var(name),
                }
            }
        }
    }

    const ENV_VARS: &[&str] = &[
        "TOONHUB_DATA_DIR",
        "TOONHUB_AUTH_URL",
        "TOONHUB_AUTH_ANON_KEY",
        "TOONHUB_AI_API_KEY",
        "TOONHUB_AI_MODEL",
    ];

    #[test]
    fn test_default_config() {
        let config = Config::default();
        assert!(config.auth_url.is_none());
        assert!(config.auth_anon_key.is_none());
        assert!(config.ai_api_key.is_none());
        assert_eq!(config.ai_model, DEFAULT_AI_MODEL);
        assert!(config.data_dir.ends_with("toonhub"));
    }

    #[test]
    fn test_file_paths() {
        let config = Config::default();

        let entries = config.entries_path();
        assert!(entries.ends_with("entries.json"));

        let token = config.session_token_path();
        assert!(token.ends_with("session.json"));
    }

    #[test]
    fn test_env_override_data_dir() {
        let _guard = EnvGuard::new(ENV_VARS);

        let mut config = Config::default();

        env::set_var("TOONHUB_DATA_DIR", "/tmp/toonhub-test");
        config.apply_env_overrides();

        assert_eq!(config.data_dir, PathBuf::from("/tmp/toonhub-test"));
    }

    #[test]
    fn test_env_override_auth() {
        let _guard = EnvGuard::new(ENV_VARS);

        let mut config = Config::default();

        env::set_var("TOONHUB_AUTH_URL", "https://auth.example.com");
        env::set_var("TOONHUB_AUTH_ANON_KEY", "anon-key");
        config.apply_env_overrides();
        assert_eq!(config.auth_url, Some("https://auth.example.com".to_string()));
        assert_eq!(config.auth_anon_key, Some("anon-key".to_string()));

        // Empty string clears them
        env::set_var("TOONHUB_AUTH_URL", "");
        config.apply_env_overrides();
        assert!(config.auth_url.is_none());
    }

    #[test]
    fn test_env_override_ai_model() {
        let _guard = EnvGuard::new(ENV_VARS);

        let mut config = Config::default();

        env::set_var("TOONHUB_AI_MODEL", "gemini-other");
        config.apply_env_overrides();
        assert_eq!(config.ai_model, "gemini-other");

        // Empty string keeps the default rather than blanking the model
        env::set_var("TOONHUB_AI_MODEL", "");
        config.ai_model = default_ai_model();
        config.apply_env_overrides();
        assert_eq!(config.ai_model, DEFAULT_AI_MODEL);
    }

    #[test]
    fn test_serialization() {
        let _guard = EnvGuard::new(ENV_VARS);

        let config = Config {
            data_dir: PathBuf::from("/data/toonhub"),
            auth_url: Some("https://auth.example.com".to_string()),
            auth_anon_key: Some("anon-key".to_string()),
            ai_api_key: None,
            ai_model: DEFAULT_AI_MODEL.to_string(),
        };

        let toml_str = toml::to_string_pretty(&config).unwrap();
        assert!(toml_str.contains("data_dir"));
        assert!(toml_str.contains("auth_url"));
        assert!(toml_str.contains("ai_model"));

        let parsed: Config = toml::from_str(&toml_str).unwrap();
        assert_eq!(parsed.data_dir, config.data_dir);
        assert_eq!(parsed.auth_url, config.auth_url);
        assert_eq!(parsed.ai_model, config.ai_model);
    }

    #[test]
    fn test_load_from_str() {
        let _guard = EnvGuard::new(ENV_VARS);

        let toml = r#"
            data_dir = "/custom/data"
            auth_url = "https://auth.example.com"
            auth_anon_key = "anon-key"
        "#;

        let config = Config::load_from_str(toml).unwrap();
        assert_eq!(config.data_dir, PathBuf::from("/custom/data"));
        assert_eq!(config.auth_url, Some("https://auth.example.com".to_string()));
        assert_eq!(config.ai_model, DEFAULT_AI_MODEL);
    }

    #[test]
    fn test_load_from_path_missing_file() {
        let _guard = EnvGuard::new(ENV_VARS);

        let temp = tempfile::TempDir::new().unwrap();
        env::set_var(
            "TOONHUB_DATA_DIR",
            temp.path().join("data").to_str().unwrap(),
        );

        let path = PathBuf::from("/nonexistent/config.toml");
        let config = Config::load_from_path(&path).unwrap();
        // Should return defaults when file doesn't exist
        assert!(config.auth_url.is_none());
        assert!(config.data_dir.exists());
    }
}
