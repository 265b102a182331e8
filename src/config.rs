use anyhow::Result;
use serde::{Deserialize, Serialize};
use std::fs;
use std::path::Path;
use std::time::Duration;

pub const DEFAULT_VISIBILITY_WINDOW_MS: u64 = 5000;

#[derive(Debug, Clone, Deserialize, Serialize)]
#[serde(default)]
pub struct HubConfig {
    pub visibility_window_ms: u64,
    pub event_capacity: usize,
}

impl HubConfig {
    pub fn visibility_window(&self) -> Duration {
        Duration::from_millis(self.visibility_window_ms)
    }
}

impl Default for HubConfig {
    fn default() -> Self {
        Self {
            visibility_window_ms: DEFAULT_VISIBILITY_WINDOW_MS,
            event_capacity: 1000,
        }
    }
}

#[derive(Debug, Clone, Deserialize, Serialize)]
#[serde(default)]
pub struct ServerConfig {
    pub bind_address: String,
}

impl Default for ServerConfig {
    fn default() -> Self {
        Self {
            bind_address: "0.0.0.0:5000".to_string(),
        }
    }
}

#[derive(Debug, Clone, Deserialize, Serialize)]
#[serde(default)]
pub struct CleanupConfig {
    pub tick_interval_ms: u64,
    pub resources_per_project: usize,
    pub max_expire_days: i64,
    pub projects: Vec<String>,
}

impl CleanupConfig {
    pub fn tick_interval(&self) -> Duration {
        Duration::from_millis(self.tick_interval_ms)
    }
}

impl Default for CleanupConfig {
    fn default() -> Self {
        Self {
            tick_interval_ms: 15000,
            resources_per_project: 5,
            max_expire_days: 90,
            projects: vec![
                "Project Alpha".to_string(),
                "Project Beta".to_string(),
                "Project Gamma".to_string(),
                "Project Delta".to_string(),
            ],
        }
    }
}

#[derive(Debug, Clone, Default, Deserialize, Serialize)]
#[serde(default)]
pub struct CloudPulseConfig {
    pub hub: HubConfig,
    pub server: ServerConfig,
    pub cleanup: CleanupConfig,
}

impl CloudPulseConfig {
    pub fn from_file(path: impl AsRef<Path>) -> Result<Self> {
        let contents = fs::read_to_string(path)?;
        let config: CloudPulseConfig = toml::from_str(&contents)?;
        Ok(config)
    }

    /// Loads `path`, falling back to defaults with a warning.
    pub fn load_or_default(path: impl AsRef<Path>) -> Self {
        let path = path.as_ref();
        match Self::from_file(path) {
            Ok(config) => {
                log::info!("✅ Loaded configuration from {:?}", path);
                config
            }
            Err(e) => {
                log::warn!(
                    "Failed to load config from {:?}: {}. Using default configuration.",
                    path, e
                );
                Self::default()
            }
        }
    }
}
