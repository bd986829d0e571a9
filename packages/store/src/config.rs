//! # Backend configuration: project credentials for the hosted service
//!
//! [`BackendConfig`] carries the opaque credentials the client needs to talk to its
//! Firebase project. None of them are secrets in the server sense (they ship inside
//! the web bundle), but they differ per deployment, so they are supplied at build or
//! process start rather than hard-coded.
//!
//! ## Sources
//!
//! | Constructor | Where values come from |
//! |-------------|------------------------|
//! | [`from_env`](BackendConfig::from_env) | `FIREBASE_*` environment variables, after loading a `.env` file with `dotenvy` (native builds). |
//! | [`from_build_env`](BackendConfig::from_build_env) | The same variables captured at compile time with `option_env!` (wasm builds, where there is no process environment). |
//! | [`from_toml`](BackendConfig::from_toml) | A TOML document with the same field names. |
//!
//! ```toml
//! api_key = "AIza..."
//! auth_domain = "my-blog.firebaseapp.com"
//! project_id = "my-blog"
//! storage_bucket = "my-blog.appspot.com"
//! messaging_sender_id = "1234567890"
//! app_id = "1:1234567890:web:abcdef"
//! database_url = "https://my-blog-default-rtdb.firebaseio.com"
//! ```
//!
//! `api_key` and `database_url` are required by every request the client makes;
//! [`validate`](BackendConfig::validate) rejects a config without them.

use serde::{Deserialize, Serialize};

/// Credentials of the hosted backend project.
#[derive(Clone, Debug, Default, PartialEq, Serialize, Deserialize)]
pub struct BackendConfig {
    #[serde(default)]
    pub api_key: String,
    #[serde(default)]
    pub auth_domain: String,
    #[serde(default)]
    pub project_id: String,
    #[serde(default)]
    pub storage_bucket: String,
    #[serde(default)]
    pub messaging_sender_id: String,
    #[serde(default)]
    pub app_id: String,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub measurement_id: Option<String>,
    #[serde(default)]
    pub database_url: String,
}

/// Configuration could not be loaded.
#[derive(Debug, thiserror::Error)]
pub enum ConfigError {
    #[error("missing configuration value: {0}")]
    Missing(&'static str),

    #[error("invalid configuration file: {0}")]
    Toml(#[from] toml::de::Error),
}

macro_rules! build_env {
    ($name:literal) => {
        option_env!($name).unwrap_or_default().to_string()
    };
}

impl BackendConfig {
    /// Load from `FIREBASE_*` environment variables.
    pub fn from_env() -> Result<Self, ConfigError> {
        dotenvy::dotenv().ok();

        let var = |name: &str| std::env::var(name).unwrap_or_default();
        let config = Self {
            api_key: var("FIREBASE_API_KEY"),
            auth_domain: var("FIREBASE_AUTH_DOMAIN"),
            project_id: var("FIREBASE_PROJECT_ID"),
            storage_bucket: var("FIREBASE_STORAGE_BUCKET"),
            messaging_sender_id: var("FIREBASE_MESSAGING_SENDER_ID"),
            app_id: var("FIREBASE_APP_ID"),
            measurement_id: std::env::var("FIREBASE_MEASUREMENT_ID")
                .ok()
                .filter(|v| !v.is_empty()),
            database_url: var("FIREBASE_DATABASE_URL"),
        };
        config.validate()
    }

    /// Values captured from the build environment.
    pub fn from_build_env() -> Result<Self, ConfigError> {
        let measurement_id = build_env!("FIREBASE_MEASUREMENT_ID");
        let config = Self {
            api_key: build_env!("FIREBASE_API_KEY"),
            auth_domain: build_env!("FIREBASE_AUTH_DOMAIN"),
            project_id: build_env!("FIREBASE_PROJECT_ID"),
            storage_bucket: build_env!("FIREBASE_STORAGE_BUCKET"),
            messaging_sender_id: build_env!("FIREBASE_MESSAGING_SENDER_ID"),
            app_id: build_env!("FIREBASE_APP_ID"),
            measurement_id: Some(measurement_id).filter(|v| !v.is_empty()),
            database_url: build_env!("FIREBASE_DATABASE_URL"),
        };
        config.validate()
    }

    /// Parse from a TOML string.
    pub fn from_toml(s: &str) -> Result<Self, ConfigError> {
        let config: Self = toml::from_str(s)?;
        config.validate()
    }

    /// Check required values are present.
    pub fn validate(self) -> Result<Self, ConfigError> {
        if self.api_key.trim().is_empty() {
            return Err(ConfigError::Missing("api_key"));
        }
        if self.database_url.trim().is_empty() {
            return Err(ConfigError::Missing("database_url"));
        }
        Ok(self)
    }

    /// Database URL without a trailing slash.
    pub fn database_root(&self) -> &str {
        self.database_url.trim_end_matches('/')
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    const FULL: &str = r#"
api_key = "key"
auth_domain = "blog.firebaseapp.com"
project_id = "blog"
storage_bucket = "blog.appspot.com"
messaging_sender_id = "42"
app_id = "1:42:web:abc"
database_url = "https://blog-default-rtdb.firebaseio.com/"
"#;

    #[test]
    fn test_from_toml() {
        let config = BackendConfig::from_toml(FULL).unwrap();
        assert_eq!(config.api_key, "key");
        assert_eq!(config.project_id, "blog");
        assert!(config.measurement_id.is_none());
        assert_eq!(
            config.database_root(),
            "https://blog-default-rtdb.firebaseio.com"
        );
    }

    #[test]
    fn test_missing_required_values() {
        let err = BackendConfig::from_toml(r#"database_url = "https://x""#).unwrap_err();
        assert!(matches!(err, ConfigError::Missing("api_key")));

        let err = BackendConfig::from_toml(r#"api_key = "key""#).unwrap_err();
        assert!(matches!(err, ConfigError::Missing("database_url")));
    }

    #[test]
    fn test_invalid_toml() {
        let err = BackendConfig::from_toml("api_key = ").unwrap_err();
        assert!(matches!(err, ConfigError::Toml(_)));
    }
}
