//! Client configuration.
//!
//! Values come from `SHORTLET_*` environment variables, falling back to
//! defaults that match a local development backend. A timeout of `0` seconds
//! disables that limit.

use std::path::PathBuf;
use std::time::Duration;

use shortlet_application::RefreshPolicy;
use url::Url;

/// Default API root of a local backend.
pub const DEFAULT_BASE_URL: &str = "http://127.0.0.1:5000/api";

/// Environment variable holding the API root.
pub const ENV_BASE_URL: &str = "SHORTLET_BASE_URL";
/// Environment variable holding the per-request timeout in seconds.
pub const ENV_REQUEST_TIMEOUT: &str = "SHORTLET_REQUEST_TIMEOUT_SECS";
/// Environment variable holding the refresh timeout in seconds.
pub const ENV_REFRESH_TIMEOUT: &str = "SHORTLET_REFRESH_TIMEOUT_SECS";
/// Environment variable holding the queued-request timeout in seconds.
pub const ENV_QUEUE_TIMEOUT: &str = "SHORTLET_QUEUE_TIMEOUT_SECS";
/// Environment variable overriding the `User-Agent` header.
pub const ENV_USER_AGENT: &str = "SHORTLET_USER_AGENT";
/// Environment variable holding the session file path.
pub const ENV_SESSION_FILE: &str = "SHORTLET_SESSION_FILE";

const DEFAULT_REQUEST_TIMEOUT: Duration = Duration::from_secs(30);

/// Error type for configuration loading.
#[derive(Debug, thiserror::Error)]
pub enum ConfigError {
    /// The base URL does not parse or cannot carry paths.
    #[error("invalid base URL {value:?}: {reason}")]
    InvalidBaseUrl {
        /// Offending value
        value: String,
        /// Parser message
        reason: String,
    },

    /// A numeric setting does not parse.
    #[error("{key} must be a whole number of seconds, got {value:?}")]
    InvalidSeconds {
        /// Environment variable name
        key: &'static str,
        /// Offending value
        value: String,
    },
}

/// Settings for the HTTP transport, refresh protocol and session storage.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct ClientConfig {
    /// API root every request path is appended to.
    pub base_url: Url,
    /// Limit on a single HTTP exchange.
    pub request_timeout: Option<Duration>,
    /// Limit on the token refresh call.
    pub refresh_timeout: Option<Duration>,
    /// Limit on a queued request's wait for a refresh.
    pub queue_timeout: Option<Duration>,
    /// `User-Agent` header value.
    pub user_agent: String,
    /// Where the session is persisted; `None` keeps it in memory only.
    pub session_file: Option<PathBuf>,
}

impl Default for ClientConfig {
    #[allow(clippy::expect_used)]
    fn default() -> Self {
        let policy = RefreshPolicy::default();
        Self {
            base_url: Url::parse(DEFAULT_BASE_URL).expect("default base URL is valid"),
            request_timeout: Some(DEFAULT_REQUEST_TIMEOUT),
            refresh_timeout: policy.refresh_timeout,
            queue_timeout: policy.queue_timeout,
            user_agent: default_user_agent(),
            session_file: default_session_file(),
        }
    }
}

impl ClientConfig {
    /// Loads configuration from the process environment.
    ///
    /// # Errors
    ///
    /// Returns an error if a variable is set to an unparsable value.
    pub fn from_env() -> Result<Self, ConfigError> {
        Self::from_lookup(|key| std::env::var(key).ok())
    }

    /// Loads configuration through `lookup`, which maps a variable name to
    /// its value.
    ///
    /// # Errors
    ///
    /// Returns an error if a variable is set to an unparsable value.
    pub fn from_lookup(lookup: impl Fn(&str) -> Option<String>) -> Result<Self, ConfigError> {
        let mut config = Self::default();
        let get = |key: &str| lookup(key).filter(|value| !value.trim().is_empty());

        if let Some(value) = get(ENV_BASE_URL) {
            config.base_url = parse_base_url(&value)?;
        }
        if let Some(value) = get(ENV_REQUEST_TIMEOUT) {
            config.request_timeout = parse_seconds(ENV_REQUEST_TIMEOUT, &value)?;
        }
        if let Some(value) = get(ENV_REFRESH_TIMEOUT) {
            config.refresh_timeout = parse_seconds(ENV_REFRESH_TIMEOUT, &value)?;
        }
        if let Some(value) = get(ENV_QUEUE_TIMEOUT) {
            config.queue_timeout = parse_seconds(ENV_QUEUE_TIMEOUT, &value)?;
        }
        if let Some(value) = get(ENV_USER_AGENT) {
            config.user_agent = value;
        }
        if let Some(value) = get(ENV_SESSION_FILE) {
            config.session_file = Some(PathBuf::from(value));
        }

        Ok(config)
    }

    /// Replaces the base URL.
    ///
    /// # Errors
    ///
    /// Returns an error if `value` is not an absolute http(s) URL.
    pub fn with_base_url(mut self, value: &str) -> Result<Self, ConfigError> {
        self.base_url = parse_base_url(value)?;
        Ok(self)
    }

    /// Refresh time limits for the authenticated client.
    #[must_use]
    pub const fn refresh_policy(&self) -> RefreshPolicy {
        RefreshPolicy {
            refresh_timeout: self.refresh_timeout,
            queue_timeout: self.queue_timeout,
        }
    }
}

/// `<config dir>/shortlet/session.json`, when the platform has a config dir.
#[must_use]
pub fn default_session_file() -> Option<PathBuf> {
    dirs::config_dir().map(|dir| dir.join("shortlet").join("session.json"))
}

fn default_user_agent() -> String {
    format!("shortlet/{}", env!("CARGO_PKG_VERSION"))
}

fn parse_base_url(value: &str) -> Result<Url, ConfigError> {
    let invalid = |reason: String| ConfigError::InvalidBaseUrl {
        value: value.to_string(),
        reason,
    };

    let url = Url::parse(value.trim()).map_err(|e| invalid(e.to_string()))?;
    if !matches!(url.scheme(), "http" | "https") {
        return Err(invalid(format!("unsupported scheme {}", url.scheme())));
    }
    if url.cannot_be_a_base() {
        return Err(invalid("URL cannot carry a path".to_string()));
    }
    Ok(url)
}

fn parse_seconds(key: &'static str, value: &str) -> Result<Option<Duration>, ConfigError> {
    let seconds: u64 = value
        .trim()
        .parse()
        .map_err(|_| ConfigError::InvalidSeconds {
            key,
            value: value.to_string(),
        })?;
    Ok((seconds > 0).then_some(Duration::from_secs(seconds)))
}
