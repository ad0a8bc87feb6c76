// smart_lock.rs
use async_trait::async_trait;
use serde::{Deserialize, Serialize};
use std::sync::Arc;
use tokio::sync::RwLock;
use utoipa::ToSchema;

use super::merge::present;
use super::{PresentationSink, RenderedState};
use crate::{
    error::SyncError,
    models::{Command, CommandName, DeviceKind, DeviceSnapshot, Intent},
};

const LOCKED: &str = "LOCKED";
const UNLOCKED: &str = "UNLOCKED";

/// Status is whatever the store reports; only `LOCKED` reads as locked.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct LockState {
    pub status: String,
}

impl LockState {
    pub fn is_locked(&self) -> bool {
        self.status == LOCKED
    }

    pub fn inverted(&self) -> &'static str {
        if self.is_locked() { UNLOCKED } else { LOCKED }
    }
}

impl Default for LockState {
    fn default() -> Self {
        Self {
            status: LOCKED.to_string(),
        }
    }
}

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize, ToSchema)]
pub struct LockView {
    pub status: String,
    pub is_locked: bool,
    pub action_label: String,
}

impl From<&LockState> for LockView {
    fn from(state: &LockState) -> Self {
        let is_locked = state.is_locked();
        Self {
            status: if is_locked { LOCKED } else { UNLOCKED }.to_string(),
            is_locked,
            action_label: if is_locked {
                "Remote Unlock"
            } else {
                "Remote Lock"
            }
            .to_string(),
        }
    }
}

pub struct SmartLock {
    device_id: String,
    state: RwLock<LockState>,
    sink: Arc<dyn PresentationSink>,
}

impl SmartLock {
    pub fn new(device_id: &str, sink: Arc<dyn PresentationSink>) -> Self {
        Self {
            device_id: device_id.to_string(),
            state: RwLock::new(LockState::default()),
            sink,
        }
    }

    fn render(&self, state: &LockState) {
        self.sink
            .render(&self.device_id, &RenderedState::Lock(state.clone()));
    }
}

#[async_trait]
impl super::Device for SmartLock {
    fn device_id(&self) -> &str {
        &self.device_id
    }

    fn kind(&self) -> DeviceKind {
        DeviceKind::Lock
    }

    async fn rendered(&self) -> RenderedState {
        RenderedState::Lock(self.state.read().await.clone())
    }

    /// Toggling inverts the local belief, not the store's. Two quick clicks
    /// send two opposite commands.
    async fn apply_optimistic(&self, intent: Intent) -> Result<Option<Command>, SyncError> {
        match intent {
            Intent::ToggleLock => {
                let mut state = self.state.write().await;
                let next = state.inverted();
                state.status = next.to_string();
                self.render(&state);
                Ok(Some(Command::new(&self.device_id, CommandName::SetStatus, next)))
            }
            other => Err(SyncError::UnsupportedIntent {
                kind: DeviceKind::Lock,
                intent: other.name(),
            }),
        }
    }

    /// Only a slice carrying a status touches the lock; otherwise the prior
    /// value stays on screen without a re-render.
    async fn merge_from_remote(&self, snapshot: Option<&DeviceSnapshot>) {
        let Some(status) = snapshot.and_then(|s| present(s, "status")) else {
            return;
        };
        let mut state = self.state.write().await;
        state.status = match status {
            serde_json::Value::String(s) => s.clone(),
            other => other.to_string(),
        };
        self.render(&state);
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::devices::{Device, testing::RecordingSink};
    use crate::models::Scalar;

    fn lock() -> (SmartLock, Arc<RecordingSink>) {
        let sink = Arc::new(RecordingSink::default());
        (SmartLock::new("lock1", sink.clone()), sink)
    }

    async fn status(lock: &SmartLock) -> String {
        match lock.rendered().await {
            RenderedState::Lock(s) => s.status,
            other => panic!("expected lock state, got {other:?}"),
        }
    }

    #[tokio::test]
    async fn toggle_inverts_current_status() {
        let (lock, sink) = lock();
        for (current, expected) in [(LOCKED, UNLOCKED), (UNLOCKED, LOCKED)] {
            lock.merge_from_remote(Some(&DeviceSnapshot::new("lock1").with("status", current)))
                .await;
            let cmd = lock
                .apply_optimistic(Intent::ToggleLock)
                .await
                .unwrap()
                .unwrap();
            assert_eq!(cmd.command, CommandName::SetStatus);
            assert_eq!(cmd.value, Scalar::from(expected));
            assert_eq!(status(&lock).await, expected);
        }
        assert_eq!(sink.count(), 4);
    }

    #[tokio::test]
    async fn double_toggle_sends_two_different_commands() {
        let (lock, _sink) = lock();
        let first = lock.apply_optimistic(Intent::ToggleLock).await.unwrap();
        let second = lock.apply_optimistic(Intent::ToggleLock).await.unwrap();
        assert_eq!(first.map(|c| c.value), Some(Scalar::from(UNLOCKED)));
        assert_eq!(second.map(|c| c.value), Some(Scalar::from(LOCKED)));
    }

    #[tokio::test]
    async fn missing_status_keeps_prior_value_without_render() {
        let (lock, sink) = lock();
        lock.apply_optimistic(Intent::ToggleLock).await.unwrap();
        assert_eq!(sink.count(), 1);

        lock.merge_from_remote(Some(&DeviceSnapshot::new("lock1").with("battery", 80)))
            .await;
        lock.merge_from_remote(Some(&DeviceSnapshot::new("lock1").with("status", "")))
            .await;
        assert_eq!(status(&lock).await, UNLOCKED);
        assert_eq!(sink.count(), 1);
    }

    #[tokio::test]
    async fn unknown_status_passes_through() {
        let (lock, _sink) = lock();
        lock.merge_from_remote(Some(&DeviceSnapshot::new("lock1").with("status", "JAMMED")))
            .await;
        assert_eq!(status(&lock).await, "JAMMED");

        let cmd = lock.apply_optimistic(Intent::ToggleLock).await.unwrap();
        assert_eq!(cmd.map(|c| c.value), Some(Scalar::from(LOCKED)));
    }

    #[tokio::test]
    async fn lamp_intents_are_unsupported() {
        let (lock, sink) = lock();
        assert!(lock.apply_optimistic(Intent::TogglePower).await.is_err());
        assert_eq!(sink.count(), 0);
    }
}
