//! Configuration module for tempmail.

use serde::Deserialize;
use std::path::Path;
use std::time::Duration;

use crate::{Result, TempMailError};

/// HTTP server configuration.
#[derive(Debug, Clone, Deserialize)]
pub struct ServerConfig {
    /// Host address to bind.
    #[serde(default = "default_host")]
    pub host: String,
    /// Port number to listen on.
    #[serde(default = "default_port")]
    pub port: u16,
    /// CORS allowed origins.
    #[serde(default)]
    pub cors_origins: Vec<String>,
    /// Rate limit for general API endpoints (requests per minute).
    #[serde(default = "default_api_rate_limit")]
    pub api_rate_limit: u32,
    /// Rate limit for mailbox creation (requests per minute).
    #[serde(default = "default_register_rate_limit")]
    pub register_rate_limit: u32,
}

fn default_host() -> String {
    "0.0.0.0".to_string()
}

fn default_port() -> u16 {
    8080
}

fn default_api_rate_limit() -> u32 {
    300
}

fn default_register_rate_limit() -> u32 {
    30
}

impl Default for ServerConfig {
    fn default() -> Self {
        Self {
            host: default_host(),
            port: default_port(),
            cors_origins: vec![],
            api_rate_limit: default_api_rate_limit(),
            register_rate_limit: default_register_rate_limit(),
        }
    }
}

/// Mailbox policy configuration.
#[derive(Debug, Clone, Deserialize)]
pub struct MailConfig {
    /// Domains addresses may be issued under.
    #[serde(default = "default_domains")]
    pub domains: Vec<String>,
    /// Lifetime of a freshly registered mailbox in seconds.
    #[serde(default = "default_expiration")]
    pub expiration_secs: u64,
    /// Lifetime granted by a refresh in seconds.
    #[serde(default = "default_extension")]
    pub extension_secs: u64,
    /// Maximum preview length in characters.
    #[serde(default = "default_preview_length")]
    pub preview_length: usize,
    /// Length of generated local parts.
    #[serde(default = "default_local_part_length")]
    pub local_part_length: usize,
    /// Interval of the expiry sweep in seconds (0 = disabled).
    #[serde(default = "default_sweep_interval")]
    pub sweep_interval_secs: u64,
}

fn default_domains() -> Vec<String> {
    vec!["hide-mail.org".to_string(), "private-mail.org".to_string()]
}

fn default_expiration() -> u64 {
    3600 // 1 hour
}

fn default_extension() -> u64 {
    3600
}

fn default_preview_length() -> usize {
    200
}

fn default_local_part_length() -> usize {
    10
}

fn default_sweep_interval() -> u64 {
    60
}

impl MailConfig {
    /// Mailbox lifetime as a duration.
    pub fn expiration(&self) -> Duration {
        Duration::from_secs(self.expiration_secs)
    }

    /// Refresh lifetime as a duration.
    pub fn extension(&self) -> Duration {
        Duration::from_secs(self.extension_secs)
    }
}

impl Default for MailConfig {
    fn default() -> Self {
        Self {
            domains: default_domains(),
            expiration_secs: default_expiration(),
            extension_secs: default_extension(),
            preview_length: default_preview_length(),
            local_part_length: default_local_part_length(),
            sweep_interval_secs: default_sweep_interval(),
        }
    }
}

/// Key-value store configuration.
#[derive(Debug, Clone, Deserialize)]
pub struct StoreConfig {
    /// Upper bound for a single store call in milliseconds.
    #[serde(default = "default_store_timeout")]
    pub timeout_ms: u64,
    /// Number of lock stripes used to serialize per-mailbox operations.
    #[serde(default = "default_lock_stripes")]
    pub lock_stripes: usize,
}

fn default_store_timeout() -> u64 {
    2000
}

fn default_lock_stripes() -> usize {
    256
}

impl StoreConfig {
    /// Store call timeout as a duration.
    pub fn timeout(&self) -> Duration {
        Duration::from_millis(self.timeout_ms)
    }
}

impl Default for StoreConfig {
    fn default() -> Self {
        Self {
            timeout_ms: default_store_timeout(),
            lock_stripes: default_lock_stripes(),
        }
    }
}

/// Logging configuration.
#[derive(Debug, Clone, Deserialize)]
pub struct LoggingConfig {
    /// Log level (trace, debug, info, warn, error).
    #[serde(default = "default_log_level")]
    pub level: String,
    /// Path to the log file.
    #[serde(default = "default_log_file")]
    pub file: String,
}

fn default_log_level() -> String {
    "info".to_string()
}

fn default_log_file() -> String {
    "logs/tempmail.log".to_string()
}

impl Default for LoggingConfig {
    fn default() -> Self {
        Self {
            level: default_log_level(),
            file: default_log_file(),
        }
    }
}

/// Main configuration structure.
#[derive(Debug, Clone, Deserialize, Default)]
pub struct Config {
    /// Server configuration.
    #[serde(default)]
    pub server: ServerConfig,
    /// Mailbox policy.
    #[serde(default)]
    pub mail: MailConfig,
    /// Key-value store configuration.
    #[serde(default)]
    pub store: StoreConfig,
    /// Logging configuration.
    #[serde(default)]
    pub logging: LoggingConfig,
}

impl Config {
    /// Load configuration from a TOML file.
    pub fn load<P: AsRef<Path>>(path: P) -> Result<Self> {
        let content = std::fs::read_to_string(path.as_ref()).map_err(TempMailError::Io)?;
        Self::parse(&content)
    }

    /// Load configuration from a TOML file and apply environment variable overrides.
    pub fn load_with_env<P: AsRef<Path>>(path: P) -> Result<Self> {
        let mut config = Self::load(path)?;
        config.apply_env_overrides();
        Ok(config)
    }

    /// Parse configuration from a TOML string.
    pub fn parse(s: &str) -> Result<Self> {
        toml::from_str(s).map_err(|e| TempMailError::Config(format!("config parse error: {e}")))
    }

    /// Apply environment variable overrides to the configuration.
    ///
    /// Supported environment variables:
    /// - `TEMPMAIL_DOMAINS`: comma-separated domain list
    /// - `TEMPMAIL_PORT`: HTTP port
    pub fn apply_env_overrides(&mut self) {
        if let Ok(domains) = std::env::var("TEMPMAIL_DOMAINS") {
            let domains: Vec<String> = domains
                .split(',')
                .map(|d| d.trim().to_string())
                .filter(|d| !d.is_empty())
                .collect();
            if !domains.is_empty() {
                self.mail.domains = domains;
            }
        }

        if let Ok(port) = std::env::var("TEMPMAIL_PORT") {
            match port.parse() {
                Ok(port) => self.server.port = port,
                Err(_) => tracing::warn!(value = %port, "Ignoring invalid TEMPMAIL_PORT"),
            }
        }
    }

    /// Validate the configuration.
    ///
    /// Returns an error if:
    /// - No domain is configured, or a domain is malformed
    /// - Expiration or extension is zero
    pub fn validate(&self) -> Result<()> {
        if self.mail.domains.is_empty() {
            return Err(TempMailError::Config(
                "at least one mail domain must be configured".to_string(),
            ));
        }
        for domain in &self.mail.domains {
            if domain.contains('@') || !domain.contains('.') {
                return Err(TempMailError::Config(format!("malformed domain: {domain}")));
            }
        }
        if self.mail.expiration_secs == 0 || self.mail.extension_secs == 0 {
            return Err(TempMailError::Config(
                "expiration_secs and extension_secs must be positive".to_string(),
            ));
        }
        Ok(())
    }
}
