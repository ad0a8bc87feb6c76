// events/mod.rs
use dashmap::DashMap;
use tokio::sync::broadcast;
use tracing::trace;
use uuid::Uuid;

use crate::devices::{DeviceView, PresentationSink, RenderedState};
use crate::models::WsMessage;

/// Fans rendered device states out to connected dashboards and remembers
/// the latest view of each device for clients that join later.
pub struct ViewBus {
    views: DashMap<String, DeviceView>,
    clients: DashMap<Uuid, broadcast::Sender<WsMessage>>,
}

impl ViewBus {
    pub fn new() -> Self {
        Self {
            views: DashMap::new(),
            clients: DashMap::new(),
        }
    }

    pub fn add_client(&self, client_id: Uuid, tx: broadcast::Sender<WsMessage>) {
        self.clients.insert(client_id, tx);
    }

    pub fn remove_client(&self, client_id: &Uuid) {
        self.clients.remove(client_id);
    }

    pub fn client_count(&self) -> usize {
        self.clients.len()
    }

    /// Latest view of every device, ordered by identifier.
    pub fn snapshot(&self) -> Vec<WsMessage> {
        let mut views: Vec<(String, DeviceView)> = self
            .views
            .iter()
            .map(|e| (e.key().clone(), e.value().clone()))
            .collect();
        views.sort_by(|a, b| a.0.cmp(&b.0));
        views
            .into_iter()
            .map(|(device_id, view)| WsMessage::DeviceRendered { device_id, view })
            .collect()
    }

    pub fn view(&self, device_id: &str) -> Option<DeviceView> {
        self.views.get(device_id).map(|v| v.value().clone())
    }

    pub fn publish(&self, message: WsMessage) {
        for client in self.clients.iter() {
            let _ = client.value().send(message.clone());
        }
    }
}

impl Default for ViewBus {
    fn default() -> Self {
        Self::new()
    }
}

impl PresentationSink for ViewBus {
    fn render(&self, device_id: &str, state: &RenderedState) {
        let view = DeviceView::from(state);
        trace!(device_id, kind = %state.kind(), "render");
        self.views.insert(device_id.to_string(), view.clone());
        self.publish(WsMessage::DeviceRendered {
            device_id: device_id.to_string(),
            view,
        });
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::devices::{LampState, LockState};

    #[tokio::test]
    async fn render_is_cached_and_broadcast() {
        let bus = ViewBus::new();
        let (tx, mut rx) = broadcast::channel(8);
        let client = Uuid::new_v4();
        bus.add_client(client, tx);

        bus.render("lock1", &RenderedState::Lock(LockState::default()));
        bus.render("lamp1", &RenderedState::Lamp(LampState::default()));

        match rx.recv().await.unwrap() {
            WsMessage::DeviceRendered { device_id, view } => {
                assert_eq!(device_id, "lock1");
                assert!(matches!(view, DeviceView::Lock(ref v) if v.is_locked));
            }
            other => panic!("unexpected {other:?}"),
        }

        let ids: Vec<String> = bus
            .snapshot()
            .into_iter()
            .filter_map(|m| match m {
                WsMessage::DeviceRendered { device_id, .. } => Some(device_id),
                _ => None,
            })
            .collect();
        assert_eq!(ids, ["lamp1", "lock1"]);

        bus.remove_client(&client);
        assert_eq!(bus.client_count(), 0);
    }

    #[test]
    fn rendered_message_wire_shape() {
        let bus = ViewBus::new();
        bus.render("lamp1", &RenderedState::Lamp(LampState::default()));
        let json = serde_json::to_value(&bus.snapshot()[0]).unwrap();
        assert_eq!(json["type"], "device_rendered");
        assert_eq!(json["device_id"], "lamp1");
        assert_eq!(json["view"]["kind"], "lamp");
        assert_eq!(json["view"]["brightness_label"], "50%");
    }
}
