//! Telemetry connection status and device value endpoints

use axum::{
    extract::{Path, State},
    routing::get,
    Json, Router,
};
use serde::Serialize;

use crate::error::{ApiError, ApiResult};
use crate::telemetry::TelemetryStatus;
use crate::AppState;

#[derive(Debug, Serialize)]
pub struct DeviceValueResponse {
    pub device: String,
    pub value: i64,
}

/// GET /api/telemetry/status
pub async fn telemetry_status(State(state): State<AppState>) -> Json<TelemetryStatus> {
    Json(state.telemetry.status().await)
}

/// GET /api/telemetry/devices/:device
pub async fn device_value(
    State(state): State<AppState>,
    Path(device): Path<String>,
) -> ApiResult<Json<DeviceValueResponse>> {
    let value = state
        .telemetry
        .get_value(&device)
        .await
        .ok_or_else(|| ApiError::NotFound(format!("Device {}", device)))?;

    Ok(Json(DeviceValueResponse { device, value }))
}

pub fn telemetry_routes() -> Router<AppState> {
    Router::new()
        .route("/api/telemetry/status", get(telemetry_status))
        .route("/api/telemetry/devices/:device", get(device_value))
}
