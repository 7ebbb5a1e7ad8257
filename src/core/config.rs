use crate::core::{MonitorError, Result};
use serde::{Deserialize, Serialize};
use std::path::{Path, PathBuf};
use std::time::Duration;

pub const DEFAULT_PACKAGE: &str = "com.streamtablet";
pub const DEFAULT_CORES: u32 = 8;
pub const DEFAULT_TOP_THREADS: usize = 8;

/// Run settings shared by both collection modes.
///
/// Every field has a default, so a JSON file only needs the keys it changes.
#[derive(Debug, Clone, Serialize, Deserialize)]
#[serde(default)]
pub struct Config {
    pub package: String,
    /// Multiplier applied to every percentage. Must match the device's core count.
    pub cores: u32,
    pub top_threads: usize,
    pub retry_delay_ms: u64,
    pub serial: Option<String>,
    pub adb_path: Option<PathBuf>,
    pub device_script: String,
    pub device_output: String,
}
impl Default for Config {
    fn default() -> Self {
        Self {
            package: DEFAULT_PACKAGE.to_string(),
            cores: DEFAULT_CORES,
            top_threads: DEFAULT_TOP_THREADS,
            retry_delay_ms: 1000,
            serial: None,
            adb_path: None,
            device_script: "/data/local/tmp/cpu_monitor.sh".to_string(),
            device_output: "/data/local/tmp/cpu_data.csv".to_string(),
        }
    }
}
impl Config {
    pub fn load(path: Option<&Path>) -> Result<Self> {
        let Some(path) = path else {
            return Ok(Self::default());
        };
        let raw = std::fs::read_to_string(path)?;
        let config: Config = serde_json::from_str(&raw)?;
        config.validate()?;
        Ok(config)
    }
    pub fn validate(&self) -> Result<()> {
        if self.package.trim().is_empty() {
            return Err(MonitorError::Parse("package name is empty".to_string()));
        }
        if self.cores == 0 {
            return Err(MonitorError::Parse("core count must be at least 1".to_string()));
        }
        if self.top_threads == 0 {
            return Err(MonitorError::Parse("top thread count must be at least 1".to_string()));
        }
        Ok(())
    }
    pub fn retry_delay(&self) -> Duration {
        Duration::from_millis(self.retry_delay_ms)
    }
    /// File name of the on-device script, used to stop it with `pkill -f`.
    pub fn device_script_name(&self) -> &str {
        self.device_script
            .rsplit('/')
            .next()
            .unwrap_or(&self.device_script)
    }
}
