// smart_lamp.rs
use async_trait::async_trait;
use serde::{Deserialize, Serialize};
use std::sync::Arc;
use tokio::sync::RwLock;
use utoipa::ToSchema;

use super::merge::{clamp_percent, number_or_zero, scalar_number, text_or};
use super::{PresentationSink, RenderedState};
use crate::{
    error::SyncError,
    models::{Command, CommandName, DeviceKind, DeviceSnapshot, Intent, Scalar},
};

const ON: &str = "ON";
const OFF: &str = "OFF";
const WHITE: &str = "#ffffff";

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct LampState {
    pub status: String,
    /// Whatever number the store reports; only user input is clamped.
    pub brightness: f64,
    pub color: String,
}

impl LampState {
    pub fn is_on(&self) -> bool {
        self.status == ON
    }
}

impl Default for LampState {
    fn default() -> Self {
        Self {
            status: OFF.to_string(),
            brightness: 50.0,
            color: WHITE.to_string(),
        }
    }
}

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize, ToSchema)]
pub struct LampView {
    pub status: String,
    pub is_on: bool,
    pub brightness: f64,
    pub brightness_label: String,
    pub color: String,
    /// Glow strength, 0 when the lamp is off.
    pub glow_intensity: f64,
}

impl From<&LampState> for LampView {
    fn from(state: &LampState) -> Self {
        let is_on = state.is_on();
        Self {
            status: state.status.clone(),
            is_on,
            brightness: state.brightness,
            brightness_label: format!("{}%", state.brightness),
            color: if state.color.is_empty() {
                WHITE.to_string()
            } else {
                state.color.clone()
            },
            glow_intensity: if is_on {
                state.brightness / 10.0
            } else {
                0.0
            },
        }
    }
}

pub struct SmartLamp {
    device_id: String,
    state: RwLock<LampState>,
    sink: Arc<dyn PresentationSink>,
}

impl SmartLamp {
    pub fn new(device_id: &str, sink: Arc<dyn PresentationSink>) -> Self {
        Self {
            device_id: device_id.to_string(),
            state: RwLock::new(LampState::default()),
            sink,
        }
    }

    fn render(&self, state: &LampState) {
        self.sink
            .render(&self.device_id, &RenderedState::Lamp(state.clone()));
    }
}

fn parse_brightness(value: &Scalar) -> Result<u8, SyncError> {
    scalar_number(value)
        .map(clamp_percent)
        .ok_or_else(|| SyncError::InvalidIntent(format!("brightness {value:?} is not a number")))
}

#[async_trait]
impl super::Device for SmartLamp {
    fn device_id(&self) -> &str {
        &self.device_id
    }

    fn kind(&self) -> DeviceKind {
        DeviceKind::Lamp
    }

    async fn rendered(&self) -> RenderedState {
        RenderedState::Lamp(self.state.read().await.clone())
    }

    async fn apply_optimistic(&self, intent: Intent) -> Result<Option<Command>, SyncError> {
        let mut state = self.state.write().await;
        let command = match intent {
            Intent::TogglePower => {
                let next = if state.is_on() { OFF } else { ON };
                state.status = next.to_string();
                Some(Command::new(&self.device_id, CommandName::SetStatus, next))
            }
            Intent::SetBrightness(value) => {
                let brightness = parse_brightness(&value)?;
                state.brightness = f64::from(brightness);
                Some(Command::new(
                    &self.device_id,
                    CommandName::SetBrightness,
                    i64::from(brightness),
                ))
            }
            Intent::PreviewBrightness(value) => {
                state.brightness = f64::from(parse_brightness(&value)?);
                None
            }
            Intent::SetColor(color) => {
                state.color = color.clone();
                Some(Command::new(&self.device_id, CommandName::SetColor, color))
            }
            other => {
                return Err(SyncError::UnsupportedIntent {
                    kind: DeviceKind::Lamp,
                    intent: other.name(),
                });
            }
        };
        self.render(&state);
        Ok(command)
    }

    async fn merge_from_remote(&self, snapshot: Option<&DeviceSnapshot>) {
        let Some(snapshot) = snapshot else { return };
        let merged = LampState {
            status: text_or(snapshot, "status", OFF),
            brightness: number_or_zero(snapshot, "brightness"),
            color: text_or(snapshot, "color", WHITE),
        };
        let mut state = self.state.write().await;
        *state = merged;
        self.render(&state);
    }
}
