use std::fs;
use std::path::{Path, PathBuf};
use std::time::Duration;

use log::warn;
use serde::{Deserialize, Serialize};

use crate::error::{MonitorError, Result};

pub const DEFAULT_CYCLE_INTERVAL_MS: u64 = 1000;
pub const DEFAULT_MAX_HOSTS: usize = 100;
pub const DEFAULT_BATCH_SIZE: usize = 5;
pub const DEFAULT_HISTORY_CAPACITY: usize = 50;
pub const DEFAULT_PROBE_TIMEOUT_MS: u64 = 1000;

const CONFIG_DIR_NAME: &str = "LivePingMonitor";
const CONFIG_FILE_NAME: &str = "config.json";

/// Tunables of a monitoring session.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
#[serde(default)]
pub struct MonitorConfig {
    /// Delay between the end of one cycle and the start of the next.
    pub cycle_interval_ms: u64,
    pub max_hosts: usize,
    /// Maximum number of probes in flight at once within a cycle.
    pub batch_size: usize,
    /// Samples retained per host for windowed statistics.
    pub history_capacity: usize,
    pub probe_timeout_ms: u64,
    pub resolve_hostnames: bool,
}

impl Default for MonitorConfig {
    fn default() -> Self {
        Self {
            cycle_interval_ms: DEFAULT_CYCLE_INTERVAL_MS,
            max_hosts: DEFAULT_MAX_HOSTS,
            batch_size: DEFAULT_BATCH_SIZE,
            history_capacity: DEFAULT_HISTORY_CAPACITY,
            probe_timeout_ms: DEFAULT_PROBE_TIMEOUT_MS,
            resolve_hostnames: true,
        }
    }
}

impl MonitorConfig {
    /// Returns a copy with zero sizes raised to 1.
    pub fn validated(mut self) -> Self {
        self.max_hosts = self.max_hosts.max(1);
        self.batch_size = self.batch_size.max(1);
        self.history_capacity = self.history_capacity.max(1);
        self.probe_timeout_ms = self.probe_timeout_ms.max(1);
        self
    }

    pub fn cycle_interval(&self) -> Duration {
        Duration::from_millis(self.cycle_interval_ms)
    }

    pub fn probe_timeout(&self) -> Duration {
        Duration::from_millis(self.probe_timeout_ms)
    }
}

/// Settings persisted between runs of the desktop app.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(default)]
pub struct AppConfig {
    pub hosts_input: String,
    pub good_threshold_ms: f64,
    pub warning_threshold_ms: f64,
    pub monitor: MonitorConfig,
}

impl Default for AppConfig {
    fn default() -> Self {
        Self {
            hosts_input: "8.8.8.8, 1.1.1.1".to_string(),
            good_threshold_ms: 50.0,
            warning_threshold_ms: 150.0,
            monitor: MonitorConfig::default(),
        }
    }
}

impl AppConfig {
    pub fn get_config_path() -> Result<PathBuf> {
        let config_dir = dirs::config_dir()
            .ok_or_else(|| MonitorError::Config("could not find config directory".into()))?
            .join(CONFIG_DIR_NAME);

        fs::create_dir_all(&config_dir).map_err(|e| MonitorError::Config(e.to_string()))?;
        Ok(config_dir.join(CONFIG_FILE_NAME))
    }

    pub fn load() -> Self {
        match Self::get_config_path() {
            Ok(path) => Self::load_from(&path),
            Err(e) => {
                warn!("Failed to get config path: {e}");
                AppConfig::default()
            }
        }
    }

    /// Reads the config at `path`, falling back to defaults if it is missing or unreadable.
    pub fn load_from(path: &Path) -> Self {
        if !path.exists() {
            return AppConfig::default();
        }
        let parsed = fs::read_to_string(path)
            .map_err(|e| e.to_string())
            .and_then(|content| {
                serde_json::from_str::<AppConfig>(&content).map_err(|e| e.to_string())
            });
        match parsed {
            Ok(mut config) => {
                config.monitor = config.monitor.validated();
                config
            }
            Err(e) => {
                warn!("Failed to read config {}: {e}", path.display());
                AppConfig::default()
            }
        }
    }

    pub fn save(&self) -> Result<()> {
        let path = Self::get_config_path()?;
        self.save_to(&path)
    }

    pub fn save_to(&self, path: &Path) -> Result<()> {
        let content =
            serde_json::to_string_pretty(self).map_err(|e| MonitorError::Config(e.to_string()))?;
        fs::write(path, content).map_err(|e| MonitorError::Config(e.to_string()))?;
        Ok(())
    }
}
