// registry.rs
use std::sync::Arc;
use tokio::sync::RwLock;

use crate::devices::Device;

/// Append-only, ordered list of live adapters.
///
/// Identifiers are not checked for uniqueness: two adapters registered under
/// the same id are both fed the same slice on every cycle.
#[derive(Default)]
pub struct Registry {
    adapters: RwLock<Vec<Arc<dyn Device>>>,
}

impl Registry {
    pub fn new() -> Self {
        Self::default()
    }

    pub async fn register(&self, adapter: Arc<dyn Device>) {
        tracing::debug!(device_id = adapter.device_id(), kind = %adapter.kind(), "adapter registered");
        self.adapters.write().await.push(adapter);
    }

    /// Snapshot of the adapters in registration order.
    pub async fn all(&self) -> Vec<Arc<dyn Device>> {
        self.adapters.read().await.clone()
    }

    pub async fn find(&self, device_id: &str) -> Vec<Arc<dyn Device>> {
        self.adapters
            .read()
            .await
            .iter()
            .filter(|a| a.device_id() == device_id)
            .cloned()
            .collect()
    }

    pub async fn len(&self) -> usize {
        self.adapters.read().await.len()
    }

    pub async fn is_empty(&self) -> bool {
        self.adapters.read().await.is_empty()
    }
}
