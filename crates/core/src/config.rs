//! Client configuration, read from the environment

use std::path::PathBuf;
use std::time::Duration;

use crate::error::Error;
use crate::Result;

pub const DEFAULT_API_URL: &str = "http://localhost:5000/api";
const DEFAULT_DATA_DIR: &str = ".taskflux";
const DEFAULT_TIMEOUT_SECONDS: u64 = 30;
const SESSION_FILE_NAME: &str = "session.json";

/// Settings shared by the API gateway and the session store
#[derive(Debug, Clone)]
pub struct ClientConfig {
    /// Base URL every request path is appended to, without a trailing slash
    pub base_url: String,
    /// Directory holding the persisted session
    pub data_dir: PathBuf,
    /// Timeout applied to every request
    pub timeout: Duration,
}

impl Default for ClientConfig {
    fn default() -> Self {
        Self {
            base_url: DEFAULT_API_URL.to_string(),
            data_dir: PathBuf::from(DEFAULT_DATA_DIR),
            timeout: Duration::from_secs(DEFAULT_TIMEOUT_SECONDS),
        }
    }
}

impl ClientConfig {
    /// Build a config from `TASKFLUX_API_URL`, `TASKFLUX_DATA_DIR` and
    /// `TASKFLUX_HTTP_TIMEOUT_SECS`, falling back to defaults for unset values.
    pub fn from_env() -> Result<Self> {
        let base_url = std::env::var("TASKFLUX_API_URL")
            .ok()
            .map(|value| value.trim().to_string())
            .filter(|value| !value.is_empty())
            .unwrap_or_else(|| DEFAULT_API_URL.to_string());
        let data_dir = std::env::var("TASKFLUX_DATA_DIR")
            .ok()
            .filter(|value| !value.trim().is_empty())
            .map(PathBuf::from)
            .unwrap_or_else(|| PathBuf::from(DEFAULT_DATA_DIR));
        let timeout_seconds = std::env::var("TASKFLUX_HTTP_TIMEOUT_SECS")
            .ok()
            .and_then(|raw| raw.trim().parse::<u64>().ok())
            .filter(|secs| *secs > 0)
            .unwrap_or(DEFAULT_TIMEOUT_SECONDS);

        let config = Self::default()
            .with_base_url(base_url)?
            .with_data_dir(data_dir)
            .with_timeout(Duration::from_secs(timeout_seconds));
        Ok(config)
    }

    /// Set the base URL; it must be an http(s) URL.
    pub fn with_base_url(mut self, base_url: impl Into<String>) -> Result<Self> {
        self.base_url = normalize_base_url(&base_url.into())?;
        Ok(self)
    }

    pub fn with_data_dir(mut self, data_dir: impl Into<PathBuf>) -> Self {
        self.data_dir = data_dir.into();
        self
    }

    pub fn with_timeout(mut self, timeout: Duration) -> Self {
        self.timeout = timeout;
        self
    }

    /// File the session store persists to
    pub fn session_path(&self) -> PathBuf {
        self.data_dir.join(SESSION_FILE_NAME)
    }
}

fn normalize_base_url(raw: &str) -> Result<String> {
    let trimmed = raw.trim().trim_end_matches('/');
    if !(trimmed.starts_with("http://") || trimmed.starts_with("https://")) {
        return Err(Error::Config(format!(
            "API URL must start with http:// or https://, got '{}'",
            raw
        )));
    }
    Ok(trimmed.to_string())
}
