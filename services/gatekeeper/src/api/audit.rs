//! Compliance query over the audit ledger.
//!
//! # Purpose
//! Read-only access to recorded decisions for compliance tooling. The read
//! itself is a gated action: the handler first authorizes `audit.view` for
//! the caller — which appends its own ledger entry, flagged broad when the
//! target is not the auditor's own namespace — and only then queries.
use crate::api::error::{ApiError, api_forbidden, api_gate_error, api_internal, api_validation_error};
use crate::api::identity_from_headers;
use crate::api::types::AuditEntriesResponse;
use crate::app::AppState;
use crate::model::AuditFilter;
use argus_authz::{
    Action, AuthorizationRequest, EnvironmentSnapshot, NamespaceName, Outcome,
    ResourceClassification,
};
use axum::Json;
use axum::extract::{Query, State};
use axum::http::HeaderMap;
use chrono::{DateTime, Utc};
use std::collections::HashMap;

#[utoipa::path(
    get,
    path = "/v1/audit/entries",
    tag = "audit",
    params(
        ("namespace" = Option<String>, Query, description = "Filter by namespace"),
        ("principal" = Option<String>, Query, description = "Filter by principal id"),
        ("outcome" = Option<String>, Query, description = "Filter by outcome: allow|deny"),
        ("broad_only" = Option<bool>, Query, description = "Only broad (cross-namespace) accesses"),
        ("from" = Option<String>, Query, description = "Inclusive RFC 3339 lower bound"),
        ("to" = Option<String>, Query, description = "Exclusive RFC 3339 upper bound"),
        ("limit" = Option<u64>, Query, description = "Max entries to return")
    ),
    responses(
        (status = 200, description = "Matching entries in append order", body = AuditEntriesResponse),
        (status = 400, description = "Malformed filter", body = crate::api::types::ErrorResponse),
        (status = 403, description = "Caller is not an auditor", body = crate::api::types::ErrorResponse)
    )
)]
pub(crate) async fn query_entries(
    Query(params): Query<HashMap<String, String>>,
    State(state): State<AppState>,
    headers: HeaderMap,
) -> Result<Json<AuditEntriesResponse>, ApiError> {
    let identity = identity_from_headers(&headers)?;
    let filter = parse_filter(&params)?;

    // The audited namespace is the filter target when given, otherwise the
    // auditor's own namespace; cross-namespace reads come back flagged broad
    // in their own ledger entry.
    let target = filter
        .namespace
        .clone()
        .unwrap_or_else(|| identity.namespace.to_string());
    let request = AuthorizationRequest {
        identity,
        action: Action::AuditView,
        namespace: NamespaceName::new(target),
        classification: ResourceClassification::Confidential,
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

    let items = state
        .ledger
        .query(&filter)
        .await
        .map_err(|err| api_internal("failed to query audit ledger", &err))?;
    Ok(Json(AuditEntriesResponse { items }))
}

fn parse_filter(params: &HashMap<String, String>) -> Result<AuditFilter, ApiError> {
    let outcome = match params.get("outcome").map(String::as_str) {
        None => None,
        Some("allow") => Some(Outcome::Allow),
        Some("deny") => Some(Outcome::Deny),
        Some(other) => {
            return Err(api_validation_error(&format!(
                "unknown outcome filter: {other}"
            )));
        }
    };
    Ok(AuditFilter {
        namespace: params.get("namespace").cloned(),
        principal_id: params.get("principal").cloned(),
        outcome,
        broad_access_only: params
            .get("broad_only")
            .map(|value| value == "true")
            .unwrap_or(false),
        from: parse_time(params, "from")?,
        to: parse_time(params, "to")?,
        limit: params
            .get("limit")
            .and_then(|value| value.parse::<usize>().ok())
            .unwrap_or(0),
    })
}

fn parse_time(
    params: &HashMap<String, String>,
    key: &str,
) -> Result<Option<DateTime<Utc>>, ApiError> {
    match params.get(key) {
        None => Ok(None),
        Some(raw) => DateTime::parse_from_rfc3339(raw)
            .map(|value| Some(value.with_timezone(&Utc)))
            .map_err(|_| api_validation_error(&format!("malformed {key} timestamp: {raw}"))),
    }
}
