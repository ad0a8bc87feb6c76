// utils.rs
use super::models::AppState;
use tracing::info;
use uuid::Uuid;

pub async fn cleanup_client_connection(client_id: Uuid, state: &AppState) {
    state.bus.remove_client(&client_id);
    info!(%client_id, remaining = state.bus.client_count(), "Client disconnected");
}
