// main.rs
use axum::{Router, routing::get};
use std::sync::Arc;
use tracing_subscriber::EnvFilter;
use utoipa::OpenApi;
use utoipa_swagger_ui::SwaggerUi;
use validator::Validate;

use device_sync::{
    HttpRemote, SyncEngine,
    config::Settings,
    devices::{self, PresentationSink},
    docs,
    events::ViewBus,
    handlers::{handle_client_ws_upgrade, health},
    metrics::{MetricsObserver, setup_metrics},
    models::AppState,
};

#[tokio::main]
async fn main() -> anyhow::Result<()> {
    tracing_subscriber::fmt()
        .with_env_filter(
            EnvFilter::try_from_default_env().unwrap_or_else(|_| EnvFilter::new("info")),
        )
        .init();

    let settings = Settings::new()
        .map_err(|e| anyhow::anyhow!("Failed to load config: {}", e))?;
    settings
        .validate()
        .map_err(|e| anyhow::anyhow!("Invalid config: {}", e))?;

    if settings.metrics.enabled {
        setup_metrics(settings.metrics.port)?;
        tracing::info!("Metrics exported on port {}", settings.metrics.port);
    }

    let remote = HttpRemote::new(&settings.remote.base_url, settings.remote.request_timeout())?;
    let engine = Arc::new(SyncEngine::new(
        Arc::new(remote),
        Arc::new(MetricsObserver),
        settings.sync.engine_config(),
    ));
    let bus = Arc::new(ViewBus::new());
    let sink: Arc<dyn PresentationSink> = bus.clone();
    for device in &settings.devices {
        engine
            .register(devices::build_device(device.kind, &device.id, Arc::clone(&sink)))
            .await;
    }
    tracing::info!(devices = settings.devices.len(), "Devices registered");

    engine.start().await;

    let state = Arc::new(AppState::new(Arc::clone(&engine), bus));
    let app = Router::new()
        .route("/ws/client", get(handle_client_ws_upgrade))
        .route("/healthz", get(health))
        .merge(SwaggerUi::new("/docs").url("/api-doc/openapi.json", docs::ApiDoc::openapi()))
        .with_state(state);

    let listener = tokio::net::TcpListener::bind(&settings.server.address)
        .await
        .map_err(|e| anyhow::anyhow!("Failed to bind address: {}", e))?;

    tracing::info!("Server started on {}", settings.server.address);

    axum::serve(listener, app)
        .with_graceful_shutdown(async {
            let _ = tokio::signal::ctrl_c().await;
        })
        .await
        .map_err(|e| anyhow::anyhow!("Server error: {}", e))?;

    engine.stop().await;
    Ok(())
}
