// handlers.rs

use crate::{
    models::{AppState, WsMessage},
    utils,
};
use axum::{
    Json,
    extract::{
        State, WebSocketUpgrade,
        ws::{Message, WebSocket},
    },
    response::IntoResponse,
};
use futures_util::{SinkExt, StreamExt};
use serde::Serialize;
use std::sync::Arc;
use tokio::sync::broadcast;
use tracing::{error, info, warn};
use utoipa::ToSchema;
use uuid::Uuid;

#[derive(Debug, Serialize, ToSchema)]
pub struct HealthReport {
    pub devices: usize,
    pub polling: bool,
    pub last_cycle: u64,
    pub clients: usize,
}

#[utoipa::path(
    get,
    path = "/healthz",
    responses((status = 200, description = "Sync engine status", body = HealthReport))
)]
pub async fn health(State(state): State<Arc<AppState>>) -> Json<HealthReport> {
    Json(HealthReport {
        devices: state.engine.registry().len().await,
        polling: state.engine.is_running().await,
        last_cycle: state.engine.last_applied_cycle(),
        clients: state.bus.client_count(),
    })
}

pub async fn handle_client_ws_upgrade(
    ws: WebSocketUpgrade,
    State(state): State<Arc<AppState>>,
) -> impl IntoResponse {
    info!("Client connection attempt");
    ws.on_upgrade(|socket| handle_client(socket, state))
}

fn encode(msg: &WsMessage) -> Option<Message> {
    match serde_json::to_string(msg) {
        Ok(text) => Some(Message::Text(text.into())),
        Err(e) => {
            error!("Failed to encode message: {}", e);
            None
        }
    }
}

async fn handle_client(socket: WebSocket, state: Arc<AppState>) {
    let (mut sender, mut receiver) = socket.split();
    let client_id = Uuid::new_v4();
    let (tx, rx) = broadcast::channel(100);
    state.bus.add_client(client_id, tx.clone());
    let initial = state.bus.snapshot();
    info!(%client_id, devices = initial.len(), "Client connected");

    let send_task = tokio::spawn(async move {
        for msg in &initial {
            let Some(frame) = encode(msg) else { continue };
            if sender.send(frame).await.is_err() {
                return;
            }
        }
        let mut rx = rx;
        loop {
            let msg = match rx.recv().await {
                Ok(msg) => msg,
                Err(broadcast::error::RecvError::Lagged(skipped)) => {
                    warn!(%client_id, skipped, "Client lagging, renders dropped");
                    continue;
                }
                Err(broadcast::error::RecvError::Closed) => break,
            };
            let Some(frame) = encode(&msg) else { continue };
            if sender.send(frame).await.is_err() {
                break;
            }
        }
    });

    let recv_task = tokio::spawn({
        let state = Arc::clone(&state);
        async move {
            while let Some(Ok(msg)) = receiver.next().await {
                let text = match msg {
                    Message::Text(text) => text,
                    Message::Close(_) => break,
                    _ => continue,
                };
                match serde_json::from_str::<WsMessage>(text.as_str()) {
                    Ok(WsMessage::Intent { device_id, intent }) => {
                        if let Err(e) = state.engine.handle_intent(&device_id, intent).await {
                            warn!(%device_id, error = %e, "Intent rejected");
                            let _ = tx.send(WsMessage::Error {
                                message: e.to_string(),
                                code: e.code(),
                            });
                        }
                    }
                    Ok(_) => {}
                    Err(e) => {
                        error!("Invalid message format: {}", e);
                        let _ = tx.send(WsMessage::Error {
                            message: format!("Invalid message: {e}"),
                            code: 400,
                        });
                    }
                }
            }
        }
    });

    tokio::pin!(send_task, recv_task);
    tokio::select! {
        _ = &mut send_task => recv_task.abort(),
        _ = &mut recv_task => send_task.abort(),
    };

    utils::cleanup_client_connection(client_id, &state).await;
}
