use std::env;
use std::time::Duration;
use thiserror::Error;

/// Default server address used by the client and the CLI.
pub const DEFAULT_BASE_URL: &str = "http://localhost:5232";
/// Default per-attempt request timeout.
pub const DEFAULT_TIMEOUT: Duration = Duration::from_secs(30);
/// Default number of attempts per logical request.
pub const DEFAULT_RETRIES: u32 = 3;
/// Default interface the server binds to.
pub const DEFAULT_HOST: &str = "127.0.0.1";
/// Default port the server binds to.
pub const DEFAULT_PORT: u16 = 5232;

/// Errors encountered while loading configuration from environment variables.
#[derive(Debug, Error, PartialEq, Eq)]
pub enum ConfigError {
    /// Environment variable contained a value that could not be parsed.
    #[error("Invalid value for environment variable: {0}")]
    InvalidValue(String),
}

/// Settings for one client session. Built once and never mutated while a session is open.
#[derive(Debug, Clone, PartialEq)]
pub struct ClientConfig {
    /// Root URL of the memo server.
    pub base_url: String,
    /// Bearer token sent with every request.
    pub token: Option<String>,
    /// Timeout applied to each individual attempt.
    pub timeout: Duration,
    /// Number of attempts per logical request; zero still makes one attempt.
    pub retries: u32,
}

impl Default for ClientConfig {
    fn default() -> Self {
        Self {
            base_url: DEFAULT_BASE_URL.to_string(),
            token: None,
            timeout: DEFAULT_TIMEOUT,
            retries: DEFAULT_RETRIES,
        }
    }
}

impl ClientConfig {
    /// Defaults pointed at `base_url`.
    pub fn new(base_url: impl Into<String>) -> Self {
        Self {
            base_url: base_url.into(),
            ..Self::default()
        }
    }

    /// Set the bearer token.
    pub fn with_token(mut self, token: impl Into<String>) -> Self {
        self.token = Some(token.into());
        self
    }

    /// Set the per-attempt timeout.
    pub fn with_timeout(mut self, timeout: Duration) -> Self {
        self.timeout = timeout;
        self
    }

    /// Set the attempt budget.
    pub fn with_retries(mut self, retries: u32) -> Self {
        self.retries = retries;
        self
    }

    /// Attempts made per logical request.
    pub fn max_attempts(&self) -> u32 {
        self.retries.max(1)
    }

    /// Check the invariants a session relies on.
    pub fn validate(&self) -> Result<(), ConfigError> {
        if self.timeout.is_zero() {
            return Err(ConfigError::InvalidValue("MEMOS_TIMEOUT".into()));
        }
        if self.base_url.trim().is_empty() {
            return Err(ConfigError::InvalidValue("MEMOS_URL".into()));
        }
        Ok(())
    }

    /// Load client settings from the process environment (and `.env`).
    pub fn from_env() -> Result<Self, ConfigError> {
        load_dotenv();
        Self::from_lookup(|key| env::var(key).ok())
    }

    /// Load client settings through `lookup`, falling back to defaults for unset keys.
    pub fn from_lookup<F>(lookup: F) -> Result<Self, ConfigError>
    where
        F: Fn(&str) -> Option<String>,
    {
        let get = |key: &str| lookup(key).filter(|value| !value.trim().is_empty());
        let config = Self {
            base_url: get("MEMOS_URL").unwrap_or_else(|| DEFAULT_BASE_URL.to_string()),
            token: get("MEMOS_TOKEN"),
            timeout: get("MEMOS_TIMEOUT")
                .map(|value| parse_timeout(&value))
                .transpose()?
                .unwrap_or(DEFAULT_TIMEOUT),
            retries: get("MEMOS_RETRIES")
                .map(|value| {
                    value
                        .trim()
                        .parse()
                        .map_err(|_| ConfigError::InvalidValue("MEMOS_RETRIES".into()))
                })
                .transpose()?
                .unwrap_or(DEFAULT_RETRIES),
        };
        config.validate()?;
        tracing::debug!(
            base_url = %config.base_url,
            has_token = config.token.is_some(),
            timeout_ms = config.timeout.as_millis() as u64,
            retries = config.retries,
            "Loaded client configuration"
        );
        Ok(config)
    }
}

/// Address the HTTP server binds to.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct ServerConfig {
    /// Interface to bind.
    pub host: String,
    /// Port to bind.
    pub port: u16,
}

impl Default for ServerConfig {
    fn default() -> Self {
        Self {
            host: DEFAULT_HOST.to_string(),
            port: DEFAULT_PORT,
        }
    }
}

impl ServerConfig {
    /// Load server settings from the process environment (and `.env`).
    pub fn from_env() -> Result<Self, ConfigError> {
        load_dotenv();
        Self::from_lookup(|key| env::var(key).ok())
    }

    /// Load server settings through `lookup`, falling back to defaults for unset keys.
    pub fn from_lookup<F>(lookup: F) -> Result<Self, ConfigError>
    where
        F: Fn(&str) -> Option<String>,
    {
        let get = |key: &str| lookup(key).filter(|value| !value.trim().is_empty());
        Ok(Self {
            host: get("MEMOS_HOST").unwrap_or_else(|| DEFAULT_HOST.to_string()),
            port: get("MEMOS_PORT")
                .map(|value| {
                    value
                        .trim()
                        .parse()
                        .map_err(|_| ConfigError::InvalidValue("MEMOS_PORT".into()))
                })
                .transpose()?
                .unwrap_or(DEFAULT_PORT),
        })
    }
}

/// Read a `.env` file from the working directory into the process environment, if present.
pub fn load_dotenv() {
    dotenvy::dotenv().ok();
}

/// Parse a timeout given in (possibly fractional) seconds.
pub fn parse_timeout(value: &str) -> Result<Duration, ConfigError> {
    let seconds: f64 = value
        .trim()
        .parse()
        .map_err(|_| ConfigError::InvalidValue("MEMOS_TIMEOUT".into()))?;
    if !seconds.is_finite() || seconds <= 0.0 {
        return Err(ConfigError::InvalidValue("MEMOS_TIMEOUT".into()));
    }
    Ok(Duration::from_secs_f64(seconds))
}
