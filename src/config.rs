//! Configuration system for the activation endpoint.
//!
//! Configuration is loaded from multiple sources with the following precedence:
//! 1. Environment variables (highest priority)
//! 2. `regist.toml` file
//! 3. Default values (lowest priority)
//!
//! # Environment Variables
//!
//! - `REGIST_SERVER_HOST` - Server bind address
//! - `REGIST_SERVER_PORT` - Server port
//! - `REGIST_READ_TIMEOUT_SECS` - Idle read timeout per session (0 disables)
//! - `REGIST_WRITE_TIMEOUT_SECS` - Response write timeout (0 disables)
//! - `REGIST_MAX_LINE_BYTES` - Largest accepted request line
//! - `REGIST_CRYPTO_KEY` - 32-byte AES key (UTF-8)
//! - `REGIST_CRYPTO_IV` - 16-byte AES IV (UTF-8)
//! - `REGIST_LOGGING_ENABLED` - Enable console logging
//! - `REGIST_LOG_LEVEL` - Log level (trace, debug, info, warn, error)

use config::Config;
use serde::Deserialize;
use std::env;
use std::sync::OnceLock;
use std::time::Duration;

use crate::errors::{RegistError, RegistResult};

/// Global configuration singleton.
static CONFIG: OnceLock<RegistConfig> = OnceLock::new();

/// Default TCP port of the activation endpoint.
pub const DEFAULT_PORT: u16 = 8989;

/// Key shared with deployed clients.
pub const LEGACY_AES_KEY: &str = "Higashitateuricho206KamigyokuKYT";

/// IV shared with deployed clients.
pub const LEGACY_AES_IV: &str = "DD5PCSoftware001";

/// Root configuration structure.
#[derive(Debug, Clone, Default, Deserialize)]
#[serde(default)]
pub struct RegistConfig {
    /// Server configuration
    pub server: ServerConfig,
    /// Symmetric cipher material
    pub crypto: CryptoConfig,
    /// Logging configuration
    pub logging: LoggingConfig,
}

/// Server configuration.
#[derive(Debug, Clone, Deserialize)]
#[serde(default)]
pub struct ServerConfig {
    /// Host address to bind to
    pub host: String,
    /// Port to listen on
    pub port: u16,
    /// Idle read timeout in seconds, 0 disables it
    pub read_timeout_secs: u64,
    /// Response write timeout in seconds, 0 disables it
    pub write_timeout_secs: u64,
    /// Upper bound on a single request line
    pub max_line_bytes: usize,
}

impl Default for ServerConfig {
    fn default() -> Self {
        Self {
            host: "0.0.0.0".to_string(),
            port: DEFAULT_PORT,
            read_timeout_secs: 300,
            write_timeout_secs: 30,
            max_line_bytes: 64 * 1024,
        }
    }
}

impl ServerConfig {
    pub fn read_timeout(&self) -> Option<Duration> {
        (self.read_timeout_secs > 0).then(|| Duration::from_secs(self.read_timeout_secs))
    }

    pub fn write_timeout(&self) -> Option<Duration> {
        (self.write_timeout_secs > 0).then(|| Duration::from_secs(self.write_timeout_secs))
    }

    /// `host:port` string suitable for `TcpListener::bind`.
    pub fn bind_address(&self) -> String {
        format!("{}:{}", self.host, self.port)
    }
}

/// Cipher key material.
///
/// Both values are taken as raw UTF-8 bytes, so the key must be exactly
/// 32 bytes and the IV exactly 16 bytes long.
#[derive(Debug, Clone, Deserialize)]
#[serde(default)]
pub struct CryptoConfig {
    pub key: String,
    pub iv: String,
}

impl Default for CryptoConfig {
    fn default() -> Self {
        Self {
            key: LEGACY_AES_KEY.to_string(),
            iv: LEGACY_AES_IV.to_string(),
        }
    }
}

/// Logging configuration.
#[derive(Debug, Clone, Deserialize)]
#[serde(default)]
pub struct LoggingConfig {
    /// Enable logging
    pub enabled: bool,
    /// Log level: trace, debug, info, warn, error
    pub level: String,
}

impl Default for LoggingConfig {
    fn default() -> Self {
        Self {
            enabled: true,
            level: "info".to_string(),
        }
    }
}

fn config_err(e: config::ConfigError) -> RegistError {
    RegistError::ConfigError(e.to_string())
}

fn env_parsed<T: std::str::FromStr>(name: &str) -> Option<T> {
    env::var(name).ok().and_then(|v| v.parse::<T>().ok())
}

impl RegistConfig {
    /// Load configuration from file and environment.
    ///
    /// Configuration is loaded in this order (later sources override earlier):
    /// 1. Default values
    /// 2. `regist.toml` file (optional)
    /// 3. Environment variables
    pub fn load() -> RegistResult<Self> {
        let defaults = RegistConfig::default();

        let builder = Config::builder()
            .set_default("server.host", defaults.server.host)
            .map_err(config_err)?
            .set_default("server.port", i64::from(defaults.server.port))
            .map_err(config_err)?
            .set_default(
                "server.read_timeout_secs",
                defaults.server.read_timeout_secs as i64,
            )
            .map_err(config_err)?
            .set_default(
                "server.write_timeout_secs",
                defaults.server.write_timeout_secs as i64,
            )
            .map_err(config_err)?
            .set_default("server.max_line_bytes", defaults.server.max_line_bytes as i64)
            .map_err(config_err)?
            .set_default("crypto.key", defaults.crypto.key)
            .map_err(config_err)?
            .set_default("crypto.iv", defaults.crypto.iv)
            .map_err(config_err)?
            .set_default("logging.enabled", defaults.logging.enabled)
            .map_err(config_err)?
            .set_default("logging.level", defaults.logging.level)
            .map_err(config_err)?
            // Load from regist.toml (optional)
            .add_source(config::File::with_name("regist").required(false))
            // Override with environment variables
            .set_override_option("server.host", env::var("REGIST_SERVER_HOST").ok())
            .map_err(config_err)?
            .set_override_option("server.port", env_parsed::<i64>("REGIST_SERVER_PORT"))
            .map_err(config_err)?
            .set_override_option(
                "server.read_timeout_secs",
                env_parsed::<i64>("REGIST_READ_TIMEOUT_SECS"),
            )
            .map_err(config_err)?
            .set_override_option(
                "server.write_timeout_secs",
                env_parsed::<i64>("REGIST_WRITE_TIMEOUT_SECS"),
            )
            .map_err(config_err)?
            .set_override_option(
                "server.max_line_bytes",
                env_parsed::<i64>("REGIST_MAX_LINE_BYTES"),
            )
            .map_err(config_err)?
            .set_override_option("crypto.key", env::var("REGIST_CRYPTO_KEY").ok())
            .map_err(config_err)?
            .set_override_option("crypto.iv", env::var("REGIST_CRYPTO_IV").ok())
            .map_err(config_err)?
            .set_override_option(
                "logging.enabled",
                env_parsed::<bool>("REGIST_LOGGING_ENABLED"),
            )
            .map_err(config_err)?
            .set_override_option("logging.level", env::var("REGIST_LOG_LEVEL").ok())
            .map_err(config_err)?;

        let settings = builder
            .build()
            .map_err(|e| RegistError::ConfigError(format!("failed to build config: {e}")))?;

        settings
            .try_deserialize()
            .map_err(|e| RegistError::ConfigError(format!("failed to deserialize config: {e}")))
    }

    /// Validate the configuration.
    pub fn validate(&self) -> RegistResult<()> {
        if self.server.port == 0 {
            return Err(RegistError::ConfigError(
                "server.port must be greater than 0".to_string(),
            ));
        }

        if self.server.max_line_bytes == 0 {
            return Err(RegistError::ConfigError(
                "server.max_line_bytes must be greater than 0".to_string(),
            ));
        }

        if self.crypto.key.len() != 32 {
            return Err(RegistError::ConfigError(format!(
                "crypto.key must be exactly 32 bytes, got {}",
                self.crypto.key.len()
            )));
        }
        if self.crypto.iv.len() != 16 {
            return Err(RegistError::ConfigError(format!(
                "crypto.iv must be exactly 16 bytes, got {}",
                self.crypto.iv.len()
            )));
        }

        match self.logging.level.to_lowercase().as_str() {
            "trace" | "debug" | "info" | "warn" | "error" => {}
            other => {
                return Err(RegistError::ConfigError(format!(
                    "logging.level must be one of: trace, debug, info, warn, error. Got '{other}'"
                )));
            }
        }

        Ok(())
    }
}

/// Get the global configuration.
///
/// This loads the configuration on first access and caches it.
/// Returns an error if configuration loading or validation fails.
pub fn get_config() -> RegistResult<&'static RegistConfig> {
    if let Some(config) = CONFIG.get() {
        return Ok(config);
    }

    let config = RegistConfig::load()?;
    config.validate()?;

    // Another thread may have won the race; either value is valid.
    Ok(CONFIG.get_or_init(|| config))
}
