//! Namespace administration handlers.
//!
//! # Purpose
//! Create, resolve, list, and transition namespaces. Mutating operations go
//! through the same `authorize` gate as data access: the handler first asks
//! the engine for a decision (which is itself audited), then performs the
//! registry change.
use crate::api::error::{
    ApiError, api_conflict, api_forbidden, api_gate_error, api_internal, api_not_found,
    api_validation_error,
};
use crate::api::types::{
    NamespaceCreateRequest, NamespaceListResponse, NamespaceStatusRequest,
};
use crate::api::identity_from_headers;
use crate::app::AppState;
use crate::engine::NamespaceError;
use crate::model::NamespaceRecord;
use crate::store::StoreError;
use argus_authz::{
    Action, AuthorizationRequest, EnvironmentSnapshot, Identity, NamespaceName,
    ResourceClassification,
};
use axum::Json;
use axum::extract::{Path, Query, State};
use axum::http::{HeaderMap, StatusCode};
use axum::response::IntoResponse;
use std::collections::HashMap;

/// Run the mandatory gate for a management action and turn a deny into a
/// `403` carrying the decision's reason.
async fn gate_admin_action(
    state: &AppState,
    identity: Identity,
    action: Action,
    namespace: &str,
) -> Result<(), ApiError> {
    let request = AuthorizationRequest {
        identity,
        action,
        namespace: NamespaceName::new(namespace),
        classification: ResourceClassification::Internal,
        environment: EnvironmentSnapshot::now(),
    };
    let decision = state
        .gate
        .authorize(&request)
        .await
        .map_err(|err| api_gate_error(&err))?;
    if !decision.is_allowed() {
        let reason = decision.reason.unwrap_or_else(|| "denied".to_string());
        return Err(api_forbidden(&reason));
    }
    Ok(())
}

#[utoipa::path(
    post,
    path = "/v1/namespaces",
    tag = "namespaces",
    request_body = NamespaceCreateRequest,
    responses(
        (status = 201, description = "Namespace created", body = NamespaceRecord),
        (status = 400, description = "Name violates the convention", body = crate::api::types::ErrorResponse),
        (status = 403, description = "Denied by the authorization engine", body = crate::api::types::ErrorResponse),
        (status = 409, description = "Namespace already exists", body = crate::api::types::ErrorResponse)
    )
)]
pub(crate) async fn create_namespace(
    State(state): State<AppState>,
    headers: HeaderMap,
    Json(body): Json<NamespaceCreateRequest>,
) -> Result<impl IntoResponse, ApiError> {
    let identity = identity_from_headers(&headers)?;
    let created_by = identity.principal_id.to_string();
    gate_admin_action(&state, identity, Action::NamespaceCreate, &body.name).await?;

    match state
        .namespaces
        .create(&body.name, &body.business_unit, &body.region, &created_by)
        .await
    {
        Ok(record) => Ok((StatusCode::CREATED, Json(record))),
        Err(NamespaceError::InvalidName(reason)) => Err(api_validation_error(&reason)),
        Err(NamespaceError::Store(StoreError::Conflict(_))) => {
            Err(api_conflict("already_exists", "namespace already exists"))
        }
        Err(NamespaceError::Store(err)) => Err(api_internal("failed to create namespace", &err)),
        Err(NamespaceError::InvalidTransition { .. }) => {
            Err(api_validation_error("invalid namespace state"))
        }
    }
}

#[utoipa::path(
    get,
    path = "/v1/namespaces",
    tag = "namespaces",
    params(
        ("business_unit" = Option<String>, Query, description = "Filter by owning business unit")
    ),
    responses(
        (status = 200, description = "List namespaces", body = NamespaceListResponse)
    )
)]
pub(crate) async fn list_namespaces(
    Query(params): Query<HashMap<String, String>>,
    State(state): State<AppState>,
) -> Result<Json<NamespaceListResponse>, ApiError> {
    let business_unit = params.get("business_unit").map(String::as_str);
    let items = state
        .namespaces
        .list(business_unit)
        .await
        .map_err(|err| api_internal("failed to list namespaces", &err))?;
    Ok(Json(NamespaceListResponse { items }))
}

#[utoipa::path(
    get,
    path = "/v1/namespaces/{name}",
    tag = "namespaces",
    params(
        ("name" = String, Path, description = "Namespace name")
    ),
    responses(
        (status = 200, description = "Namespace record", body = NamespaceRecord),
        (status = 404, description = "Namespace not found", body = crate::api::types::ErrorResponse)
    )
)]
pub(crate) async fn get_namespace(
    Path(name): Path<String>,
    State(state): State<AppState>,
) -> Result<Json<NamespaceRecord>, ApiError> {
    match state.namespaces.resolve(&name).await {
        Ok(record) => Ok(Json(record)),
        Err(StoreError::NotFound(_)) => Err(api_not_found("namespace not found")),
        Err(err) => Err(api_internal("failed to resolve namespace", &err)),
    }
}

#[utoipa::path(
    patch,
    path = "/v1/namespaces/{name}/status",
    tag = "namespaces",
    params(
        ("name" = String, Path, description = "Namespace name")
    ),
    request_body = NamespaceStatusRequest,
    responses(
        (status = 200, description = "Status updated", body = NamespaceRecord),
        (status = 400, description = "Transition skips a lifecycle state", body = crate::api::types::ErrorResponse),
        (status = 403, description = "Denied by the authorization engine", body = crate::api::types::ErrorResponse),
        (status = 404, description = "Namespace not found", body = crate::api::types::ErrorResponse),
        (status = 409, description = "Concurrent transition lost the race", body = crate::api::types::ErrorResponse)
    )
)]
pub(crate) async fn update_namespace_status(
    Path(name): Path<String>,
    State(state): State<AppState>,
    headers: HeaderMap,
    Json(body): Json<NamespaceStatusRequest>,
) -> Result<Json<NamespaceRecord>, ApiError> {
    let identity = identity_from_headers(&headers)?;
    gate_admin_action(&state, identity, Action::NamespaceStatus, &name).await?;

    match state.namespaces.transition(&name, body.status).await {
        Ok(record) => Ok(Json(record)),
        Err(NamespaceError::InvalidTransition { from, to }) => Err(api_validation_error(
            &format!("invalid status transition: {from} -> {to}"),
        )),
        Err(NamespaceError::Store(StoreError::NotFound(_))) => {
            Err(api_not_found("namespace not found"))
        }
        Err(NamespaceError::Store(StoreError::Conflict(reason))) => {
            Err(api_conflict("transition_conflict", &reason))
        }
        Err(NamespaceError::Store(err)) => {
            Err(api_internal("failed to update namespace status", &err))
        }
        Err(NamespaceError::InvalidName(reason)) => Err(api_validation_error(&reason)),
    }
}
