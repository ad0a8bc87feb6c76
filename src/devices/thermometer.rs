// thermometer.rs
use async_trait::async_trait;
use chrono::{Local, TimeZone};
use serde::{Deserialize, Serialize};
use std::fmt;
use std::sync::Arc;
use tokio::sync::RwLock;
use utoipa::ToSchema;

use super::merge::{coerce_number, number_or_zero, present, text_or};
use super::{PresentationSink, RenderedState};
use crate::{
    error::SyncError,
    models::{Command, CommandName, DeviceKind, DeviceSnapshot, Intent},
};

/// Units the `set_unit` command accepts.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize, ToSchema)]
pub enum TemperatureUnit {
    C,
    F,
}

impl TemperatureUnit {
    pub fn as_str(self) -> &'static str {
        match self {
            TemperatureUnit::C => "C",
            TemperatureUnit::F => "F",
        }
    }
}

impl fmt::Display for TemperatureUnit {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.as_str())
    }
}

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct ThermometerState {
    pub display_temperature: f64,
    /// Shown as reported, even when it is neither C nor F.
    pub display_unit: String,
    pub humidity: f64,
    /// Epoch seconds of the device's last report.
    pub timestamp: Option<i64>,
}

impl Default for ThermometerState {
    fn default() -> Self {
        Self {
            display_temperature: 0.0,
            display_unit: TemperatureUnit::C.to_string(),
            humidity: 0.0,
            timestamp: None,
        }
    }
}

impl ThermometerState {
    /// Unit the switch asks for: F from C, C from anything else.
    pub fn next_unit(&self) -> TemperatureUnit {
        if self.display_unit == TemperatureUnit::C.as_str() {
            TemperatureUnit::F
        } else {
            TemperatureUnit::C
        }
    }

    pub fn temperature_label(&self) -> String {
        format!("{:.1}°{}", self.display_temperature, self.display_unit)
    }

    pub fn humidity_label(&self) -> String {
        format!("{}%", self.humidity)
    }

    /// Local wall-clock time of `timestamp`, for display only.
    pub fn last_update_label(&self) -> Option<String> {
        let ts = self.timestamp?;
        let at = Local.timestamp_opt(ts, 0).single()?;
        Some(format!("Last update: {}", at.format("%H:%M:%S")))
    }
}

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize, ToSchema)]
pub struct ThermometerView {
    pub temperature_label: String,
    pub display_unit: String,
    pub humidity_label: String,
    pub switch_label: String,
    pub last_update: Option<String>,
}

impl From<&ThermometerState> for ThermometerView {
    fn from(state: &ThermometerState) -> Self {
        Self {
            temperature_label: state.temperature_label(),
            display_unit: state.display_unit.clone(),
            humidity_label: state.humidity_label(),
            switch_label: format!("Switch to °{}", state.next_unit()),
            last_update: state.last_update_label(),
        }
    }
}

pub struct Thermometer {
    device_id: String,
    state: RwLock<ThermometerState>,
    sink: Arc<dyn PresentationSink>,
}

impl Thermometer {
    pub fn new(device_id: &str, sink: Arc<dyn PresentationSink>) -> Self {
        Self {
            device_id: device_id.to_string(),
            state: RwLock::new(ThermometerState::default()),
            sink,
        }
    }
}

#[async_trait]
impl super::Device for Thermometer {
    fn device_id(&self) -> &str {
        &self.device_id
    }

    fn kind(&self) -> DeviceKind {
        DeviceKind::Thermometer
    }

    async fn rendered(&self) -> RenderedState {
        RenderedState::Thermometer(self.state.read().await.clone())
    }

    /// The unit switch never touches local state; the next poll shows the
    /// change once the device has applied it.
    async fn apply_optimistic(&self, intent: Intent) -> Result<Option<Command>, SyncError> {
        match intent {
            Intent::ToggleUnit => {
                let target = self.state.read().await.next_unit();
                Ok(Some(Command::new(
                    &self.device_id,
                    CommandName::SetUnit,
                    target.as_str(),
                )))
            }
            other => Err(SyncError::UnsupportedIntent {
                kind: DeviceKind::Thermometer,
                intent: other.name(),
            }),
        }
    }

    async fn merge_from_remote(&self, snapshot: Option<&DeviceSnapshot>) {
        let Some(snapshot) = snapshot else { return };
        let merged = ThermometerState {
            display_temperature: number_or_zero(snapshot, "display_temperature"),
            display_unit: text_or(snapshot, "display_unit", TemperatureUnit::C.as_str()),
            humidity: number_or_zero(snapshot, "humidity"),
            timestamp: present(snapshot, "timestamp")
                .map(coerce_number)
                .filter(|ts| *ts != 0.0)
                .map(|ts| ts.trunc() as i64),
        };
        let mut state = self.state.write().await;
        *state = merged;
        self.sink
            .render(&self.device_id, &RenderedState::Thermometer(state.clone()));
    }
}
