//! System/health API handlers.
//!
//! # Purpose
//! Lightweight endpoints for service metadata and health checks, used by
//! operators, probes, and automation.
use crate::api::error::{ApiError, api_internal};
use crate::api::types::{HealthStatus, SystemInfo};
use crate::app::AppState;
use axum::Json;
use axum::extract::State;

#[utoipa::path(
    get,
    path = "/v1/system/info",
    tag = "system",
    responses(
        (status = 200, description = "Service identity and capabilities", body = SystemInfo)
    )
)]
pub(crate) async fn system_info(State(state): State<AppState>) -> Json<SystemInfo> {
    let policy_version = state.engine.snapshot().await.version.clone();
    Json(SystemInfo {
        region_id: state.region_id.clone(),
        api_version: state.api_version.clone(),
        policy_version,
        features: state.features.clone(),
    })
}

#[utoipa::path(
    get,
    path = "/v1/system/health",
    tag = "system",
    responses(
        (status = 200, description = "Gatekeeper health", body = HealthStatus),
        (status = 500, description = "Backing store unreachable", body = crate::api::types::ErrorResponse)
    )
)]
pub(crate) async fn system_health(
    State(state): State<AppState>,
) -> Result<Json<HealthStatus>, ApiError> {
    state
        .store
        .health_check()
        .await
        .map_err(|err| api_internal("store health check failed", &err))?;
    Ok(Json(HealthStatus {
        status: "ok".to_string(),
    }))
}
