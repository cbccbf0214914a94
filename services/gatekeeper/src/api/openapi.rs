//! OpenAPI schema aggregation for the gatekeeper API.
//!
//! # Purpose
//! Collects all routes and schema types into a single OpenAPI document for
//! docs and client generation.
use crate::api::{
    audit, authorize, namespaces, policy, system,
    types::{
        AuditEntriesResponse, AuthorizeRequest, AuthorizeResponse, ErrorResponse, FeatureFlags,
        HealthStatus, NamespaceCreateRequest, NamespaceListResponse, NamespaceStatusRequest,
        RuleSetInstallResponse, RuleSetResponse, SystemInfo,
    },
};
use crate::model::{AuditEntry, NamespaceRecord, NamespaceStatus};
use utoipa::OpenApi;

#[derive(OpenApi)]
#[openapi(
    info(
        title = "argus-gatekeeper",
        version = "v1",
        description = "Argus authorization decision service HTTP API"
    ),
    paths(
        system::system_info,
        system::system_health,
        authorize::authorize,
        namespaces::create_namespace,
        namespaces::list_namespaces,
        namespaces::get_namespace,
        namespaces::update_namespace_status,
        audit::query_entries,
        policy::get_rules,
        policy::install_rules,
    ),
    components(schemas(
        AuditEntriesResponse,
        AuditEntry,
        AuthorizeRequest,
        AuthorizeResponse,
        ErrorResponse,
        FeatureFlags,
        HealthStatus,
        NamespaceCreateRequest,
        NamespaceListResponse,
        NamespaceRecord,
        NamespaceStatus,
        NamespaceStatusRequest,
        RuleSetInstallResponse,
        RuleSetResponse,
        SystemInfo,
    )),
    tags(
        (name = "authorize", description = "The mandatory decision gate"),
        (name = "namespaces", description = "Tenant partition registry"),
        (name = "audit", description = "Compliance queries over the decision ledger"),
        (name = "policy", description = "Versioned rule-set administration"),
        (name = "system", description = "Service metadata and health")
    )
)]
pub struct ApiDoc;

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn openapi_document_builds() {
        let doc = ApiDoc::openapi();
        let json = doc.to_json().expect("openapi json");
        assert!(json.contains("/v1/authorize"));
        assert!(json.contains("/v1/audit/entries"));
        assert!(json.contains("/v1/policy/rules"));
    }
}
