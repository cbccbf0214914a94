//! The authorization endpoint.
//!
//! # Purpose
//! `POST /v1/authorize` is the mandatory gate callers hit before every read
//! or write against tenant data. Allow and deny both come back as `200` with
//! the decision body; `503` with a distinct code means the engine could not
//! decide or could not record, and the caller must treat that as denied.
use crate::api::error::{ApiError, api_gate_error};
use crate::api::types::{AuthorizeRequest, AuthorizeResponse};
use crate::app::AppState;
use argus_authz::{AuthorizationRequest, EnvironmentSnapshot, NamespaceName};
use axum::Json;
use axum::extract::State;

#[utoipa::path(
    post,
    path = "/v1/authorize",
    tag = "authorize",
    request_body = AuthorizeRequest,
    responses(
        (status = 200, description = "Decision (allow or deny, with reason)", body = AuthorizeResponse),
        (status = 503, description = "Engine unavailable or decision unrecordable; treat as denied", body = crate::api::types::ErrorResponse)
    )
)]
pub(crate) async fn authorize(
    State(state): State<AppState>,
    Json(body): Json<AuthorizeRequest>,
) -> Result<Json<AuthorizeResponse>, ApiError> {
    let request = AuthorizationRequest {
        identity: body.identity,
        action: body.action,
        namespace: NamespaceName::new(body.namespace),
        classification: body.classification,
        environment: body.environment.unwrap_or_else(EnvironmentSnapshot::now),
    };
    match state.gate.authorize(&request).await {
        Ok(decision) => Ok(Json(AuthorizeResponse { decision })),
        Err(err) => Err(api_gate_error(&err)),
    }
}
