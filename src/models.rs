use serde::{Deserialize, Serialize};
use serde_json::Value;
use std::fmt;
use std::sync::Arc;
use utoipa::ToSchema;

use crate::devices::DeviceView;
use crate::engine::SyncEngine;
use crate::events::ViewBus;

#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize, ToSchema)]
#[serde(rename_all = "snake_case")]
pub enum DeviceKind {
    Lamp,
    Lock,
    Thermometer,
}

impl fmt::Display for DeviceKind {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(match self {
            DeviceKind::Lamp => "lamp",
            DeviceKind::Lock => "lock",
            DeviceKind::Thermometer => "thermometer",
        })
    }
}

/// One device's entry in the remote `GET /devices` listing.
///
/// Only `deviceId` is required; everything else is kept as loose JSON and
/// interpreted by the adapter that owns the identifier.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct DeviceSnapshot {
    #[serde(rename = "deviceId")]
    pub device_id: String,
    #[serde(flatten)]
    pub fields: serde_json::Map<String, Value>,
}

impl DeviceSnapshot {
    pub fn new(device_id: impl Into<String>) -> Self {
        Self {
            device_id: device_id.into(),
            fields: serde_json::Map::new(),
        }
    }

    pub fn with(mut self, name: &str, value: impl Into<Value>) -> Self {
        self.fields.insert(name.to_string(), value.into());
        self
    }

    pub fn field(&self, name: &str) -> Option<&Value> {
        self.fields.get(name)
    }
}

/// Scalar payload of a command or an intent.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize, ToSchema)]
#[serde(untagged)]
pub enum Scalar {
    Int(i64),
    Float(f64),
    Text(String),
}

impl From<&str> for Scalar {
    fn from(value: &str) -> Self {
        Scalar::Text(value.to_string())
    }
}

impl From<String> for Scalar {
    fn from(value: String) -> Self {
        Scalar::Text(value)
    }
}

impl From<i64> for Scalar {
    fn from(value: i64) -> Self {
        Scalar::Int(value)
    }
}

impl fmt::Display for Scalar {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            Scalar::Int(v) => write!(f, "{v}"),
            Scalar::Float(v) => write!(f, "{v}"),
            Scalar::Text(v) => f.write_str(v),
        }
    }
}

#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize, ToSchema)]
#[serde(rename_all = "snake_case")]
pub enum CommandName {
    SetStatus,
    SetBrightness,
    SetColor,
    SetUnit,
}

impl CommandName {
    pub fn as_str(&self) -> &'static str {
        match self {
            CommandName::SetStatus => "set_status",
            CommandName::SetBrightness => "set_brightness",
            CommandName::SetColor => "set_color",
            CommandName::SetUnit => "set_unit",
        }
    }
}

impl fmt::Display for CommandName {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.as_str())
    }
}

/// Body of `POST /command`. No id, no ordering token.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize, ToSchema)]
pub struct Command {
    #[serde(rename = "deviceId")]
    pub device_id: String,
    pub command: CommandName,
    pub value: Scalar,
}

impl Command {
    pub fn new(device_id: &str, command: CommandName, value: impl Into<Scalar>) -> Self {
        Self {
            device_id: device_id.to_string(),
            command,
            value: value.into(),
        }
    }
}

/// What the user did on a widget.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize, ToSchema)]
#[serde(tag = "action", content = "value", rename_all = "snake_case")]
pub enum Intent {
    TogglePower,
    SetBrightness(Scalar),
    /// Slider dragged but not released: render only.
    PreviewBrightness(Scalar),
    SetColor(String),
    ToggleLock,
    ToggleUnit,
}

impl Intent {
    pub fn name(&self) -> &'static str {
        match self {
            Intent::TogglePower => "toggle_power",
            Intent::SetBrightness(_) => "set_brightness",
            Intent::PreviewBrightness(_) => "preview_brightness",
            Intent::SetColor(_) => "set_color",
            Intent::ToggleLock => "toggle_lock",
            Intent::ToggleUnit => "toggle_unit",
        }
    }
}

#[derive(Debug, Clone, Serialize, Deserialize, ToSchema)]
#[serde(tag = "type", rename_all = "snake_case")]
pub enum WsMessage {
    DeviceRendered { device_id: String, view: DeviceView },
    Intent { device_id: String, intent: Intent },
    Error { message: String, code: u16 },
}

pub struct AppState {
    pub engine: Arc<SyncEngine>,
    pub bus: Arc<ViewBus>,
}

impl AppState {
    pub fn new(engine: Arc<SyncEngine>, bus: Arc<ViewBus>) -> Self {
        Self { engine, bus }
    }
}
