use utoipa::OpenApi;
use crate::{devices, handlers, models};

#[derive(OpenApi)]
#[openapi(
    paths(handlers::health),
    components(
        schemas(
            models::WsMessage,
            models::Intent,
            models::Scalar,
            models::Command,
            models::CommandName,
            models::DeviceKind,
            devices::DeviceView,
            devices::LampView,
            devices::LockView,
            devices::ThermometerView,
            devices::TemperatureUnit,
            handlers::HealthReport,
        )
    )
)]
pub struct ApiDoc;
