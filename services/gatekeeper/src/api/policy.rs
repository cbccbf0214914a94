//! Policy rule-set administration.
//!
//! # Purpose
//! Installing a rule set persists the versioned document and atomically
//! activates it; readers of the engine never observe a partially applied
//! set. Installation is an Admin action gated through `authorize` like
//! everything else.
use crate::api::error::{
    ApiError, api_conflict, api_forbidden, api_gate_error, api_internal, api_validation_error,
};
use crate::api::identity_from_headers;
use crate::api::types::{RuleSetInstallResponse, RuleSetResponse};
use crate::app::AppState;
use crate::store::StoreError;
use argus_authz::{
    Action, AuthorizationRequest, EnvironmentSnapshot, ResourceClassification, RuleSet,
};
use axum::Json;
use axum::extract::State;
use axum::http::HeaderMap;

#[utoipa::path(
    get,
    path = "/v1/policy/rules",
    tag = "policy",
    responses(
        (status = 200, description = "The active rule set", body = RuleSetResponse)
    )
)]
pub(crate) async fn get_rules(
    State(state): State<AppState>,
) -> Result<Json<RuleSetResponse>, ApiError> {
    let rules = state.engine.snapshot().await;
    Ok(Json(RuleSetResponse {
        rules: (*rules).clone(),
    }))
}

#[utoipa::path(
    put,
    path = "/v1/policy/rules",
    tag = "policy",
    request_body(content = Object, content_type = "application/json", description = "The rule set document to install"),
    responses(
        (status = 200, description = "Rule set installed and activated", body = RuleSetInstallResponse),
        (status = 400, description = "Rule set failed validation", body = crate::api::types::ErrorResponse),
        (status = 403, description = "Denied by the authorization engine", body = crate::api::types::ErrorResponse),
        (status = 409, description = "Version already installed", body = crate::api::types::ErrorResponse)
    )
)]
pub(crate) async fn install_rules(
    State(state): State<AppState>,
    headers: HeaderMap,
    Json(rules): Json<RuleSet>,
) -> Result<Json<RuleSetInstallResponse>, ApiError> {
    let identity = identity_from_headers(&headers)?;

    // A reload is not addressed to any tenant namespace; the gate still
    // records who did it and when.
    let target = identity.namespace.to_string();
    let request = AuthorizationRequest {
        identity,
        action: Action::PolicyReload,
        namespace: argus_authz::NamespaceName::new(target),
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

    // Validate before persisting so the store never holds a set the engine
    // would refuse to activate.
    if let Err(err) = rules.validate() {
        return Err(api_validation_error(&err.to_string()));
    }

    match state.store.store_rule_set(&rules).await {
        Ok(()) => {}
        Err(StoreError::Conflict(reason)) => {
            return Err(api_conflict("version_exists", &reason));
        }
        Err(err) => return Err(api_internal("failed to persist rule set", &err)),
    }

    let active_version = rules.version.clone();
    let replaced_version = state.engine.reload(rules).await.map_err(|err| {
        // Validation already passed; a failure here is unexpected.
        tracing::error!(error = %err, "rule set activation failed after persist");
        api_validation_error(&err.to_string())
    })?;

    Ok(Json(RuleSetInstallResponse {
        active_version,
        replaced_version,
    }))
}
