//! Configuration module for portprobe

use crate::error::ProbeError;
use serde::{Deserialize, Serialize};
use std::fs;
use std::net::Ipv4Addr;
use std::path::Path;
use std::time::Duration;

/// Default deadline for an outbound connect attempt
pub const DEFAULT_CONNECT_TIMEOUT_MS: u64 = 1000;

/// Default guard around a local bind attempt
pub const DEFAULT_BIND_TIMEOUT_MS: u64 = 500;

/// Main configuration structure for probe operations
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(default)]
pub struct ProbeConfig {
    /// Timeout for each outbound connection attempt in milliseconds
    pub connect_timeout_ms: u64,

    /// Upper bound for a local bind attempt in milliseconds
    pub bind_timeout_ms: u64,

    /// Local address used for bind checks instead of the primary interface address
    pub bind_address: Option<Ipv4Addr>,
}

impl Default for ProbeConfig {
    fn default() -> Self {
        Self {
            connect_timeout_ms: DEFAULT_CONNECT_TIMEOUT_MS,
            bind_timeout_ms: DEFAULT_BIND_TIMEOUT_MS,
            bind_address: None,
        }
    }
}

impl ProbeConfig {
    /// Create a new probe configuration with default values
    pub fn new() -> Self {
        Self::default()
    }

    /// Set the connect timeout in milliseconds
    pub fn with_connect_timeout(mut self, timeout_ms: u64) -> Self {
        self.connect_timeout_ms = timeout_ms;
        self
    }

    /// Set the bind guard timeout in milliseconds
    pub fn with_bind_timeout(mut self, timeout_ms: u64) -> Self {
        self.bind_timeout_ms = timeout_ms;
        self
    }

    /// Pin the local address used by bind checks
    pub fn with_bind_address(mut self, address: Ipv4Addr) -> Self {
        self.bind_address = Some(address);
        self
    }

    /// Get connect timeout as Duration
    pub fn connect_timeout(&self) -> Duration {
        Duration::from_millis(self.connect_timeout_ms)
    }

    /// Get bind timeout as Duration
    pub fn bind_timeout(&self) -> Duration {
        Duration::from_millis(self.bind_timeout_ms)
    }

    /// Load configuration from TOML file
    pub fn from_toml_file<P: AsRef<Path>>(path: P) -> crate::Result<Self> {
        let content = fs::read_to_string(path.as_ref()).map_err(|e| {
            ProbeError::ConfigError(format!(
                "Failed to read config file {}: {}",
                path.as_ref().display(),
                e
            ))
        })?;

        let config: ProbeConfig = toml::from_str(&content)
            .map_err(|e| ProbeError::ConfigError(format!("Failed to parse TOML: {}", e)))?;

        config.validate()?;
        Ok(config)
    }

    /// Load configuration from `~/.portprobe.toml`, falling back to defaults
    pub fn load_default_config() -> Self {
        let home_dir = dirs::home_dir().unwrap_or_else(|| std::path::PathBuf::from("."));
        let config_path = home_dir.join(".portprobe.toml");

        if config_path.exists() {
            match Self::from_toml_file(&config_path) {
                Ok(config) => {
                    log::info!("Loaded config from {}", config_path.display());
                    return config;
                }
                Err(e) => log::warn!("Ignoring {}: {}", config_path.display(), e),
            }
        }

        Self::default()
    }

    /// Validate the configuration
    pub fn validate(&self) -> crate::Result<()> {
        if self.connect_timeout_ms == 0 {
            return Err(ProbeError::ConfigError(
                "connect_timeout_ms must be greater than 0".to_string(),
            ));
        }

        if self.bind_timeout_ms == 0 {
            return Err(ProbeError::ConfigError(
                "bind_timeout_ms must be greater than 0".to_string(),
            ));
        }

        Ok(())
    }
}
