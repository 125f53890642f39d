//! Configuration file support for xcvrsyncd
//!
//! Loads and validates xcvrsyncd configuration from TOML files.
//! Default location: /etc/sonic/xcvrsyncd.conf

use serde::{Deserialize, Serialize};
use std::fs;
use std::path::{Path, PathBuf};
use std::time::Duration;

use sonic_xcvr_common::{XcvrError, XcvrResult};

/// Management service endpoint configuration
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct MgmtConfig {
    /// Platform management service host
    #[serde(default = "default_mgmt_host")]
    pub host: String,

    /// Platform management service port
    #[serde(default = "default_mgmt_port")]
    pub port: u16,

    /// Connection timeout in seconds
    #[serde(default = "default_connect_timeout")]
    pub connect_timeout_secs: u64,
}

/// Change-event watcher configuration
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct WatcherConfig {
    /// Ticks between presence polls
    #[serde(default = "default_poll_interval_ticks")]
    pub poll_interval_ticks: u32,

    /// Length of one watcher tick in seconds
    #[serde(default = "default_tick_secs")]
    pub tick_secs: u64,
}

/// EEPROM snapshot cache configuration
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct EepromConfig {
    /// Path of the shared EEPROM cache file
    #[serde(default = "default_cache_path")]
    pub cache_path: PathBuf,
}

/// Complete xcvrsyncd configuration
#[derive(Debug, Clone, Default, Serialize, Deserialize)]
pub struct XcvrConfig {
    /// Management service endpoint
    #[serde(default)]
    pub mgmt: MgmtConfig,

    /// Watcher cadence settings
    #[serde(default)]
    pub watcher: WatcherConfig,

    /// EEPROM cache settings
    #[serde(default)]
    pub eeprom: EepromConfig,
}

// Default functions
fn default_mgmt_host() -> String {
    "127.0.0.1".to_string()
}

fn default_mgmt_port() -> u16 {
    9090
}

fn default_connect_timeout() -> u64 {
    5
}

fn default_poll_interval_ticks() -> u32 {
    4
}

fn default_tick_secs() -> u64 {
    1
}

fn default_cache_path() -> PathBuf {
    PathBuf::from("/var/run/platform/sfp/cache")
}

// Default implementations
impl Default for MgmtConfig {
    fn default() -> Self {
        Self {
            host: default_mgmt_host(),
            port: default_mgmt_port(),
            connect_timeout_secs: default_connect_timeout(),
        }
    }
}

impl Default for WatcherConfig {
    fn default() -> Self {
        Self {
            poll_interval_ticks: default_poll_interval_ticks(),
            tick_secs: default_tick_secs(),
        }
    }
}

impl Default for EepromConfig {
    fn default() -> Self {
        Self {
            cache_path: default_cache_path(),
        }
    }
}

impl XcvrConfig {
    /// Load configuration from file, falling back to defaults if file not found
    pub fn load_or_default(path: impl AsRef<Path>) -> XcvrResult<Self> {
        let path = path.as_ref();

        match fs::read_to_string(path) {
            Ok(content) => {
                let config: Self = toml::from_str(&content).map_err(|e| {
                    XcvrError::config(
                        "config_file",
                        format!("failed to parse {}: {}", path.display(), e),
                    )
                })?;
                config.validate()?;
                Ok(config)
            }
            Err(e) if e.kind() == std::io::ErrorKind::NotFound => {
                eprintln!(
                    "xcvrsyncd: Config file {} not found, using defaults",
                    path.display()
                );
                Ok(Self::default())
            }
            Err(e) => Err(XcvrError::Io(e)),
        }
    }

    /// Load from default location or defaults
    pub fn load() -> XcvrResult<Self> {
        Self::load_or_default("/etc/sonic/xcvrsyncd.conf")
    }

    /// Get connection timeout as Duration
    pub fn connect_timeout(&self) -> Duration {
        Duration::from_secs(self.mgmt.connect_timeout_secs)
    }

    /// Get the length of one watcher tick as Duration
    pub fn tick(&self) -> Duration {
        Duration::from_secs(self.watcher.tick_secs)
    }

    /// Validate configuration
    pub fn validate(&self) -> XcvrResult<()> {
        if self.mgmt.port == 0 {
            return Err(XcvrError::config("mgmt.port", "must be > 0"));
        }

        if self.watcher.poll_interval_ticks == 0 {
            return Err(XcvrError::config("watcher.poll_interval_ticks", "must be > 0"));
        }

        if self.watcher.tick_secs == 0 {
            return Err(XcvrError::config("watcher.tick_secs", "must be > 0"));
        }

        if self.eeprom.cache_path.as_os_str().is_empty() {
            return Err(XcvrError::config("eeprom.cache_path", "must not be empty"));
        }

        Ok(())
    }
}
