// config/mod.rs
use serde::Deserialize;
use config::Config;
use std::time::Duration;
use validator::Validate;

use crate::engine::EngineConfig;
use crate::models::DeviceKind;

#[derive(Debug, Deserialize, Validate)]
pub struct Settings {
    #[validate(nested)]
    pub server: ServerSettings,
    #[validate(nested)]
    pub remote: RemoteSettings,
    #[validate(nested)]
    pub sync: SyncSettings,
    pub metrics: MetricsSettings,
    #[serde(default)]
    #[validate(nested)]
    pub devices: Vec<DeviceSettings>,
}

#[derive(Debug, Deserialize, Validate)]
pub struct ServerSettings {
    #[validate(length(min = 1))]
    pub address: String,
}

#[derive(Debug, Deserialize, Validate)]
pub struct RemoteSettings {
    #[validate(url)]
    pub base_url: String,
    /// Transport-level timeout; no retries are layered on top.
    pub request_timeout_ms: Option<u64>,
}

impl RemoteSettings {
    pub fn request_timeout(&self) -> Option<Duration> {
        self.request_timeout_ms.map(Duration::from_millis)
    }
}

#[derive(Debug, Deserialize, Validate)]
pub struct SyncSettings {
    #[serde(default = "default_poll_interval_ms")]
    #[validate(range(min = 100))]
    pub poll_interval_ms: u64,
    #[serde(default)]
    pub discard_stale_cycles: bool,
}

fn default_poll_interval_ms() -> u64 {
    2000
}

impl SyncSettings {
    pub fn engine_config(&self) -> EngineConfig {
        EngineConfig {
            poll_interval: Duration::from_millis(self.poll_interval_ms),
            discard_stale_cycles: self.discard_stale_cycles,
        }
    }
}

#[derive(Debug, Deserialize)]
pub struct MetricsSettings {
    pub enabled: bool,
    pub port: u16,
}

#[derive(Debug, Deserialize, Validate)]
pub struct DeviceSettings {
    #[validate(length(min = 1))]
    pub id: String,
    pub kind: DeviceKind,
}

impl Settings {
    pub fn new() -> Result<Self, config::ConfigError> {
        let settings = Config::builder()
            .add_source(config::File::with_name("config/config"))
            .add_source(config::Environment::with_prefix("APP").separator("__"))
            .build()?;

        settings.try_deserialize()
    }

    pub fn from_toml(raw: &str) -> Result<Self, config::ConfigError> {
        Config::builder()
            .add_source(config::File::from_str(raw, config::FileFormat::Toml))
            .build()?
            .try_deserialize()
    }
}
