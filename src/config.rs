//! Configuration file parser for the `feedfan` service.
//!
//! The config file is optional: a missing file yields `Config::default()`.
//! Unknown keys are silently ignored by serde (with `deny_unknown_fields` off),
//! though we log a warning when the file contains potential typos.
use serde::Deserialize;
use std::net::SocketAddr;
use std::path::Path;
use std::time::Duration;
use thiserror::Error;

// ============================================================================
// Error Types
// ============================================================================

#[derive(Debug, Error)]
pub enum ConfigError {
    #[error("Failed to read config file: {0}")]
    Io(#[from] std::io::Error),

    #[error("Invalid TOML in config file: {0}")]
    Parse(#[from] toml::de::Error),

    /// Config file exceeds maximum allowed size.
    #[error("Config file too large: {0}")]
    TooLarge(String),

    /// An environment override could not be interpreted.
    #[error("Invalid value for {name}: {value}")]
    InvalidOverride { name: &'static str, value: String },

    /// No CORS origins configured outside of development.
    #[error("CORS_ALLOWED_ORIGINS is not set; refusing to start in environment '{0}'")]
    MissingCorsOrigins(String),
}

// ============================================================================
// Configuration Structs
// ============================================================================

/// Top-level service configuration.
///
/// All fields use `#[serde(default)]` so any subset of keys can be specified.
/// Missing keys fall back to `Default::default()`.
#[derive(Debug, Clone, Deserialize)]
#[serde(default)]
pub struct Config {
    /// Address the HTTP server listens on.
    pub bind_address: SocketAddr,

    /// Deployment environment name. Only `development` (or empty) may run
    /// without explicit CORS origins.
    pub environment: String,

    /// Origins allowed to call the API. `"*"` allows any origin.
    pub cors_allowed_origins: Vec<String>,

    /// Outbound fetch policy shared by every batch.
    pub fetch: FetchSettings,
}

impl Default for Config {
    fn default() -> Self {
        Self {
            bind_address: SocketAddr::from(([0, 0, 0, 0], 8080)),
            environment: "development".to_string(),
            cors_allowed_origins: Vec::new(),
            fetch: FetchSettings::default(),
        }
    }
}

/// Outbound HTTP policy for feed retrieval.
///
/// Constructed once at startup and handed to [`crate::feed::FeedFetcher`];
/// never mutated afterwards.
#[derive(Debug, Clone, Deserialize)]
#[serde(default)]
pub struct FetchSettings {
    /// Total per-request budget (connect, redirects, headers and body).
    pub timeout_ms: u64,

    /// Redirect hops followed before the request fails.
    pub max_redirects: usize,

    /// `User-Agent` header sent with every request.
    pub user_agent: String,

    /// Response bodies larger than this are rejected while reading.
    pub max_body_bytes: usize,

    /// In-flight fetches per batch. 0 = one per URL (unbounded).
    pub max_concurrency: usize,

    /// Whether loopback/private/link-local hosts may be fetched.
    pub allow_private_hosts: bool,
}

impl Default for FetchSettings {
    fn default() -> Self {
        Self {
            timeout_ms: 10_000,
            max_redirects: 10,
            user_agent: concat!("feedfan/", env!("CARGO_PKG_VERSION"), " (RSS Reader)").to_string(),
            max_body_bytes: 10 * 1024 * 1024,
            max_concurrency: 0,
            allow_private_hosts: true,
        }
    }
}

impl FetchSettings {
    pub fn timeout(&self) -> Duration {
        Duration::from_millis(self.timeout_ms)
    }

    /// Effective fan-out for a batch of `batch_len` URLs (never zero).
    pub fn concurrency_for(&self, batch_len: usize) -> usize {
        let limit = if self.max_concurrency == 0 {
            batch_len
        } else {
            self.max_concurrency.min(batch_len)
        };
        limit.max(1)
    }
}

/// Resolved cross-origin policy for the HTTP front end.
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum CorsOrigins {
    Any,
    List(Vec<String>),
}

impl Config {
    /// Maximum config file size (1 MB).
    const MAX_FILE_SIZE: u64 = 1_048_576;

    const KNOWN_KEYS: [&'static str; 4] = [
        "bind_address",
        "environment",
        "cors_allowed_origins",
        "fetch",
    ];

    /// Load configuration from a TOML file.
    ///
    /// - Missing file → `Ok(Config::default())`
    /// - Empty file → `Ok(Config::default())`
    /// - Invalid TOML → `Err(ConfigError::Parse)` with line number info
    /// - Unknown keys → silently accepted (serde default behavior), logged as warning
    pub fn load(path: &Path) -> Result<Self, ConfigError> {
        // Check file size before reading
        match std::fs::metadata(path) {
            Ok(meta) if meta.len() > Self::MAX_FILE_SIZE => {
                return Err(ConfigError::TooLarge(format!(
                    "Config file is {} bytes (max {} bytes)",
                    meta.len(),
                    Self::MAX_FILE_SIZE
                )));
            }
            Err(e) if e.kind() == std::io::ErrorKind::NotFound => {
                tracing::debug!(path = %path.display(), "No config file found, using defaults");
                return Ok(Self::default());
            }
            Err(e) => return Err(ConfigError::Io(e)),
            Ok(_) => {}
        }

        let content = match std::fs::read_to_string(path) {
            Ok(c) => c,
            Err(e) if e.kind() == std::io::ErrorKind::NotFound => {
                // Race condition: file deleted between metadata and read
                tracing::debug!(path = %path.display(), "Config file disappeared, using defaults");
                return Ok(Self::default());
            }
            Err(e) => return Err(ConfigError::Io(e)),
        };

        Self::from_toml_str(&content)
    }

    /// Parse configuration from TOML text, warning about unrecognised top-level keys.
    pub fn from_toml_str(content: &str) -> Result<Self, ConfigError> {
        if content.trim().is_empty() {
            tracing::debug!("Config file is empty, using defaults");
            return Ok(Self::default());
        }

        if let Ok(raw) = content.parse::<toml::Table>() {
            for key in raw.keys() {
                if !Self::KNOWN_KEYS.contains(&key.as_str()) {
                    tracing::warn!(key = %key, "Unknown key in config file, ignoring");
                }
            }
        }

        let config: Config = toml::from_str(content)?;
        tracing::info!(
            bind = %config.bind_address,
            environment = %config.environment,
            "Loaded configuration"
        );
        Ok(config)
    }

    /// Apply `CORS_ALLOWED_ORIGINS`, `APP_ENV` and `FEEDFAN_BIND` from the process environment.
    pub fn apply_env(&mut self) -> Result<(), ConfigError> {
        self.apply_overrides(|name| std::env::var(name).ok())
    }

    /// Apply overrides from an arbitrary lookup. Empty values are ignored.
    pub fn apply_overrides<F>(&mut self, lookup: F) -> Result<(), ConfigError>
    where
        F: Fn(&str) -> Option<String>,
    {
        let get = |name: &str| lookup(name).filter(|v| !v.trim().is_empty());

        if let Some(origins) = get("CORS_ALLOWED_ORIGINS") {
            self.cors_allowed_origins = origins
                .split(',')
                .map(str::trim)
                .filter(|o| !o.is_empty())
                .map(str::to_string)
                .collect();
        }

        if let Some(env) = get("APP_ENV") {
            self.environment = env.trim().to_string();
        }

        if let Some(bind) = get("FEEDFAN_BIND") {
            self.bind_address = bind
                .trim()
                .parse()
                .map_err(|_| ConfigError::InvalidOverride {
                    name: "FEEDFAN_BIND",
                    value: bind,
                })?;
        }

        Ok(())
    }

    pub fn is_development(&self) -> bool {
        let env = self.environment.trim();
        env.is_empty() || env.eq_ignore_ascii_case("development")
    }

    /// Decide which origins the API accepts.
    ///
    /// With no configured origins, development falls back to any origin and
    /// every other environment is refused.
    pub fn cors_origins(&self) -> Result<CorsOrigins, ConfigError> {
        if self.cors_allowed_origins.iter().any(|o| o == "*") {
            return Ok(CorsOrigins::Any);
        }

        if self.cors_allowed_origins.is_empty() {
            if self.is_development() {
                tracing::info!("CORS: no origins configured, allowing any origin in development");
                return Ok(CorsOrigins::Any);
            }
            return Err(ConfigError::MissingCorsOrigins(self.environment.clone()));
        }

        Ok(CorsOrigins::List(self.cors_allowed_origins.clone()))
    }
}

// ============================================================================
// Tests
// ============================================================================
