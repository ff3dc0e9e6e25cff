//! Gateway configuration loaded from the environment.

use std::time::Duration;

use thiserror::Error;

use crate::session::Session;

pub const URL_VAR: &str = "SUPABASE_URL";
pub const ANON_KEY_VAR: &str = "SUPABASE_ANON_KEY";
pub const ACCESS_TOKEN_VAR: &str = "SUPABASE_ACCESS_TOKEN";
pub const TIMEOUT_VAR: &str = "CLINICSTOCK_TIMEOUT_SECS";

const DEFAULT_TIMEOUT_SECS: u64 = 15;

#[derive(Debug, Error, PartialEq, Eq)]
pub enum ConfigError {
    #[error("{0} is not set")]
    Missing(&'static str),
    #[error("{key} is invalid: {message}")]
    Invalid { key: &'static str, message: String },
}

#[derive(Clone)]
pub struct GatewayConfig {
    /// Project URL, e.g. `https://xyz.supabase.co`.
    pub url: String,
    pub anon_key: String,
    pub access_token: Option<String>,
    pub timeout: Duration,
}

impl GatewayConfig {
    pub fn new(url: impl Into<String>, anon_key: impl Into<String>) -> Self {
        Self {
            url: url.into().trim_end_matches('/').to_string(),
            anon_key: anon_key.into(),
            access_token: None,
            timeout: Duration::from_secs(DEFAULT_TIMEOUT_SECS),
        }
    }

    /// Load from process environment variables.
    pub fn from_env() -> Result<Self, ConfigError> {
        Self::from_lookup(|key| std::env::var(key).ok())
    }

    /// Load through an arbitrary lookup (tests pass a map here).
    pub fn from_lookup<F>(lookup: F) -> Result<Self, ConfigError>
    where
        F: Fn(&str) -> Option<String>,
    {
        let non_empty = |key: &str| lookup(key).filter(|v| !v.trim().is_empty());

        let url = non_empty(URL_VAR).ok_or(ConfigError::Missing(URL_VAR))?;
        if !(url.starts_with("http://") || url.starts_with("https://")) {
            return Err(ConfigError::Invalid {
                key: URL_VAR,
                message: format!("expected an http(s) URL, got {url:?}"),
            });
        }
        let anon_key = non_empty(ANON_KEY_VAR).ok_or(ConfigError::Missing(ANON_KEY_VAR))?;

        let timeout = match non_empty(TIMEOUT_VAR) {
            None => Duration::from_secs(DEFAULT_TIMEOUT_SECS),
            Some(raw) => {
                let secs: u64 = raw.trim().parse().map_err(|e| ConfigError::Invalid {
                    key: TIMEOUT_VAR,
                    message: format!("{e}"),
                })?;
                if secs == 0 {
                    return Err(ConfigError::Invalid {
                        key: TIMEOUT_VAR,
                        message: "must be at least 1 second".to_string(),
                    });
                }
                Duration::from_secs(secs)
            }
        };

        let mut config = Self::new(url, anon_key);
        config.access_token = non_empty(ACCESS_TOKEN_VAR);
        config.timeout = timeout;
        Ok(config)
    }

    pub fn with_access_token(mut self, token: impl Into<String>) -> Self {
        self.access_token = Some(token.into());
        self
    }

    pub fn session(&self) -> Option<Session> {
        self.access_token.clone().and_then(Session::from_token)
    }
}

impl core::fmt::Debug for GatewayConfig {
    fn fmt(&self, f: &mut core::fmt::Formatter<'_>) -> core::fmt::Result {
        f.debug_struct("GatewayConfig")
            .field("url", &self.url)
            .field("anon_key", &"<redacted>")
            .field("access_token", &self.access_token.as_ref().map(|_| "<redacted>"))
            .field("timeout", &self.timeout)
            .finish()
    }
}
