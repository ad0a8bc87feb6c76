// devices/mod.rs
mod merge;
mod smart_lamp;
mod smart_lock;
mod thermometer;

pub use smart_lamp::{LampState, LampView, SmartLamp};
pub use smart_lock::{LockState, LockView, SmartLock};
pub use thermometer::{TemperatureUnit, Thermometer, ThermometerState, ThermometerView};

use serde::{Deserialize, Serialize};
use std::sync::Arc;
use utoipa::ToSchema;

use crate::error::SyncError;
use crate::models::{Command, DeviceKind, DeviceSnapshot, Intent};

/// A widget's live adapter: owns the rendered state of one device.
///
/// Both mutating operations render through the adapter's sink before they
/// return. Writes from either side simply replace the state; the newest one
/// is what the user sees.
#[async_trait::async_trait]
pub trait Device: Send + Sync {
    fn device_id(&self) -> &str;

    fn kind(&self) -> DeviceKind;

    async fn rendered(&self) -> RenderedState;

    /// Applies a user intent locally and returns the command to send, if any.
    async fn apply_optimistic(&self, intent: Intent) -> Result<Option<Command>, SyncError>;

    /// Reconciles against this device's slice of a poll. `None` keeps the
    /// current state and renders nothing.
    async fn merge_from_remote(&self, snapshot: Option<&DeviceSnapshot>);
}

/// Receives every state the adapters render.
pub trait PresentationSink: Send + Sync {
    fn render(&self, device_id: &str, state: &RenderedState);
}

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(tag = "kind", rename_all = "snake_case")]
pub enum RenderedState {
    Lamp(LampState),
    Lock(LockState),
    Thermometer(ThermometerState),
}

impl RenderedState {
    pub fn kind(&self) -> DeviceKind {
        match self {
            RenderedState::Lamp(_) => DeviceKind::Lamp,
            RenderedState::Lock(_) => DeviceKind::Lock,
            RenderedState::Thermometer(_) => DeviceKind::Thermometer,
        }
    }
}

/// Display-ready projection of a [`RenderedState`].
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize, ToSchema)]
#[serde(tag = "kind", rename_all = "snake_case")]
pub enum DeviceView {
    Lamp(LampView),
    Lock(LockView),
    Thermometer(ThermometerView),
}

impl From<&RenderedState> for DeviceView {
    fn from(state: &RenderedState) -> Self {
        match state {
            RenderedState::Lamp(s) => DeviceView::Lamp(LampView::from(s)),
            RenderedState::Lock(s) => DeviceView::Lock(LockView::from(s)),
            RenderedState::Thermometer(s) => DeviceView::Thermometer(ThermometerView::from(s)),
        }
    }
}

pub fn build_device(
    kind: DeviceKind,
    device_id: &str,
    sink: Arc<dyn PresentationSink>,
) -> Arc<dyn Device> {
    match kind {
        DeviceKind::Lamp => Arc::new(SmartLamp::new(device_id, sink)),
        DeviceKind::Lock => Arc::new(SmartLock::new(device_id, sink)),
        DeviceKind::Thermometer => Arc::new(Thermometer::new(device_id, sink)),
    }
}
