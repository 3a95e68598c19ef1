//! Configuration file parser for ~/.config/feedstamp/config.toml.
//!
//! The config file is optional: a missing file yields `Config::default()`.
//! Unknown keys are silently ignored by serde (with `deny_unknown_fields` off),
//! though we log a warning when the file contains potential typos.
use serde::Deserialize;
use std::path::Path;
use std::time::Duration;
use thiserror::Error;
use url::Url;

use crate::feed::FetchLimits;

/// Environment variable that overrides `feed_url` from the config file.
pub const FEED_URL_ENV: &str = "FEEDSTAMP_FEED_URL";

// ============================================================================
// Error Types
// ============================================================================

#[derive(Debug, Error)]
pub enum ConfigError {
    #[error("Failed to read config file: {0}")]
    Io(#[from] std::io::Error),

    #[error("Invalid TOML in config file: {0}")]
    Parse(#[from] toml::de::Error),

    /// SEC-014: Config file exceeds maximum allowed size.
    #[error("Config file too large: {0}")]
    TooLarge(String),

    #[error("Invalid feed URL '{url}': {reason}")]
    InvalidFeedUrl { url: String, reason: String },
}

// ============================================================================
// Configuration Structs
// ============================================================================

/// Top-level relay configuration.
///
/// All fields use `#[serde(default)]` so any subset of keys can be specified.
/// Missing keys fall back to `Default::default()`.
#[derive(Debug, Clone, PartialEq, Eq, Deserialize)]
#[serde(default)]
pub struct Config {
    /// The upstream RSS feed to relay.
    pub feed_url: String,

    /// Whole-request timeout in seconds. 0 = no explicit timeout.
    pub request_timeout_secs: u64,

    /// Maximum accepted feed body in bytes. 0 = unlimited.
    pub max_feed_bytes: u64,

    /// Socket address for `feedstamp serve`.
    pub listen_addr: String,
}

impl Default for Config {
    fn default() -> Self {
        Self {
            feed_url: "https://feeds.feedburner.com/blogspot/amDG".to_string(),
            request_timeout_secs: 0,
            max_feed_bytes: 10 * 1024 * 1024,
            listen_addr: "127.0.0.1:3000".to_string(),
        }
    }
}

impl Config {
    /// SEC-014: Maximum config file size (1 MB).
    const MAX_FILE_SIZE: u64 = 1_048_576;

    const KNOWN_KEYS: [&'static str; 4] = [
        "feed_url",
        "request_timeout_secs",
        "max_feed_bytes",
        "listen_addr",
    ];

    /// Load configuration from a TOML file.
    ///
    /// - Missing file → `Ok(Config::default())`
    /// - Empty file → `Ok(Config::default())`
    /// - Invalid TOML → `Err(ConfigError::Parse)` with line number info
    /// - Unknown keys → silently accepted (serde default behavior), logged as warning
    pub fn load(path: &Path) -> Result<Self, ConfigError> {
        // SEC-014: Check file size before reading to prevent memory exhaustion
        // from a maliciously large or corrupted config file.
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

        if content.trim().is_empty() {
            tracing::debug!(path = %path.display(), "Config file is empty, using defaults");
            return Ok(Self::default());
        }

        // Parse the TOML content first as a raw table to detect unknown keys
        if let Ok(raw) = content.parse::<toml::Table>() {
            for key in raw.keys() {
                if !Self::KNOWN_KEYS.contains(&key.as_str()) {
                    tracing::warn!(key = %key, "Unknown key in config file, ignoring");
                }
            }
        }

        let config: Config = toml::from_str(&content)?;
        tracing::info!(path = %path.display(), feed = %config.feed_url, "Loaded configuration");
        Ok(config)
    }

    /// Applies the `FEEDSTAMP_FEED_URL` environment override, if set.
    pub fn with_env_overrides(self) -> Self {
        self.with_feed_url_override(std::env::var(FEED_URL_ENV).ok())
    }

    /// Replaces `feed_url` when `url` is a non-blank string.
    pub fn with_feed_url_override(mut self, url: Option<String>) -> Self {
        if let Some(url) = url.filter(|u| !u.trim().is_empty()) {
            tracing::debug!(feed = %url, "Feed URL overridden");
            self.feed_url = url;
        }
        self
    }

    /// Checks that `feed_url` is an absolute http(s) URL.
    pub fn validate(&self) -> Result<(), ConfigError> {
        let invalid = |reason: String| ConfigError::InvalidFeedUrl {
            url: self.feed_url.clone(),
            reason,
        };

        let url = Url::parse(&self.feed_url).map_err(|e| invalid(e.to_string()))?;
        match url.scheme() {
            "http" | "https" => Ok(()),
            scheme => Err(invalid(format!(
                "unsupported scheme {scheme} (only http/https allowed)"
            ))),
        }
    }

    /// Transport limits for the fetcher, with 0 mapped to "no limit".
    pub fn fetch_limits(&self) -> FetchLimits {
        FetchLimits {
            timeout: (self.request_timeout_secs > 0)
                .then(|| Duration::from_secs(self.request_timeout_secs)),
            max_bytes: (self.max_feed_bytes > 0)
                .then(|| usize::try_from(self.max_feed_bytes).unwrap_or(usize::MAX)),
        }
    }
}

// ============================================================================
// Tests
// ============================================================================
