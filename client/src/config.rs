//! Client configuration.
//!
//! Values come from the environment (after `.env` is loaded by the binary)
//! with defaults for everything, so a bare `eventdesk` invocation talks to the
//! public backend.

use crate::error::{ClientError, Result};
use std::path::PathBuf;
use std::time::Duration;

/// Production backend.
pub const DEFAULT_API_URL: &str = "https://event-platform-backend.onrender.com";

/// Where the bearer token is persisted, relative to the working directory.
pub const DEFAULT_TOKEN_PATH: &str = ".eventdesk/token";

/// Per-request timeout.
pub const DEFAULT_REQUEST_TIMEOUT_SECS: u64 = 30;

/// Environment variable names.
pub mod vars {
    /// Base URL of the API.
    pub const API_URL: &str = "EVENTDESK_API_URL";
    /// Token file path.
    pub const TOKEN_PATH: &str = "EVENTDESK_TOKEN_PATH";
    /// Request timeout in seconds.
    pub const REQUEST_TIMEOUT_SECS: &str = "EVENTDESK_REQUEST_TIMEOUT_SECS";
}

/// Client configuration.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct ClientConfig {
    /// Base URL of the API, without a trailing slash.
    pub api_url: String,

    /// File holding the persisted token.
    ///
    /// Default: `.eventdesk/token`
    pub token_path: PathBuf,

    /// Timeout applied to every HTTP request.
    ///
    /// Default: 30 seconds
    pub request_timeout: Duration,
}

impl ClientConfig {
    /// Create a configuration for the given API base URL.
    ///
    /// # Errors
    ///
    /// Returns [`ClientError::Config`] if `api_url` is not an absolute
    /// `http`/`https` URL.
    pub fn new(api_url: impl Into<String>) -> Result<Self> {
        Ok(Self {
            api_url: normalize_api_url(&api_url.into())?,
            token_path: PathBuf::from(DEFAULT_TOKEN_PATH),
            request_timeout: Duration::from_secs(DEFAULT_REQUEST_TIMEOUT_SECS),
        })
    }

    /// Load configuration from process environment variables.
    ///
    /// # Errors
    ///
    /// Returns [`ClientError::Config`] if `EVENTDESK_API_URL` is malformed.
    pub fn from_env() -> Result<Self> {
        Self::from_lookup(|key| std::env::var(key).ok())
    }

    /// Load configuration through an arbitrary variable lookup.
    ///
    /// An unparsable timeout falls back to the default.
    ///
    /// # Errors
    ///
    /// Returns [`ClientError::Config`] if the API URL is malformed.
    pub fn from_lookup<F>(lookup: F) -> Result<Self>
    where
        F: Fn(&str) -> Option<String>,
    {
        let api_url = lookup(vars::API_URL).unwrap_or_else(|| DEFAULT_API_URL.to_string());
        let token_path = lookup(vars::TOKEN_PATH)
            .filter(|p| !p.trim().is_empty())
            .map_or_else(|| PathBuf::from(DEFAULT_TOKEN_PATH), PathBuf::from);
        let timeout_secs = lookup(vars::REQUEST_TIMEOUT_SECS)
            .and_then(|s| s.trim().parse::<u64>().ok())
            .filter(|secs| *secs > 0)
            .unwrap_or(DEFAULT_REQUEST_TIMEOUT_SECS);

        Ok(Self::new(api_url)?
            .with_token_path(token_path)
            .with_request_timeout(Duration::from_secs(timeout_secs)))
    }

    /// Set the token file path.
    #[must_use]
    pub fn with_token_path(mut self, path: impl Into<PathBuf>) -> Self {
        self.token_path = path.into();
        self
    }

    /// Set the request timeout.
    #[must_use]
    pub const fn with_request_timeout(mut self, timeout: Duration) -> Self {
        self.request_timeout = timeout;
        self
    }

    /// Join an API path (`/api/...`) onto the base URL.
    #[must_use]
    pub fn endpoint(&self, path: &str) -> String {
        format!("{}{path}", self.api_url)
    }
}

impl Default for ClientConfig {
    fn default() -> Self {
        Self {
            api_url: DEFAULT_API_URL.to_string(),
            token_path: PathBuf::from(DEFAULT_TOKEN_PATH),
            request_timeout: Duration::from_secs(DEFAULT_REQUEST_TIMEOUT_SECS),
        }
    }
}

fn normalize_api_url(raw: &str) -> Result<String> {
    let trimmed = raw.trim().trim_end_matches('/');

    let url = reqwest::Url::parse(trimmed)
        .map_err(|e| ClientError::Config(format!("invalid API URL {trimmed:?}: {e}")))?;

    if !matches!(url.scheme(), "http" | "https") {
        return Err(ClientError::Config(format!(
            "API URL must use http or https, got {:?}",
            url.scheme()
        )));
    }

    Ok(trimmed.to_string())
}
