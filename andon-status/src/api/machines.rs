//! Machine status endpoints

use axum::{
    extract::{Path, State},
    routing::get,
    Json, Router,
};

use crate::error::{ApiError, ApiResult};
use crate::models::{MachineId, MachineStatusDisplay};
use crate::AppState;

/// GET /api/machines
///
/// Every machine ordered by id; empty when the status source is unreachable.
pub async fn list_machines(State(state): State<AppState>) -> Json<Vec<MachineStatusDisplay>> {
    Json(state.aggregator.list_all().await)
}

/// GET /api/machines/:id
pub async fn get_machine(
    State(state): State<AppState>,
    Path(id): Path<String>,
) -> ApiResult<Json<MachineStatusDisplay>> {
    let machine_id: MachineId = id
        .parse()
        .map_err(|_| ApiError::BadRequest(format!("Invalid machine id: {}", id)))?;

    state
        .aggregator
        .get(machine_id)
        .await
        .map(Json)
        .ok_or_else(|| ApiError::NotFound(format!("Machine {}", machine_id)))
}

pub fn machine_routes() -> Router<AppState> {
    Router::new()
        .route("/api/machines", get(list_machines))
        .route("/api/machines/:id", get(get_machine))
}
