//! HTTP API request/response types.
//!
//! # Purpose
//! Defines shared payload shapes for the gatekeeper REST API and OpenAPI
//! schema generation.
use crate::model::{AuditEntry, NamespaceRecord, NamespaceStatus};
use argus_authz::{
    Action, Decision, EnvironmentSnapshot, Identity, ResourceClassification, RuleSet,
};
use serde::{Deserialize, Serialize};
use utoipa::ToSchema;

#[derive(Debug, Serialize, Deserialize, ToSchema, Clone)]
pub struct FeatureFlags {
    pub durable_storage: bool,
}

#[derive(Debug, Serialize, Deserialize, ToSchema, Clone)]
pub struct SystemInfo {
    pub region_id: String,
    pub api_version: String,
    pub policy_version: String,
    pub features: FeatureFlags,
}

#[derive(Debug, Serialize, Deserialize, ToSchema, Clone)]
pub struct HealthStatus {
    pub status: String,
}

#[derive(Debug, Serialize, Deserialize, ToSchema)]
pub struct ErrorResponse {
    pub code: String,
    pub message: String,
}

/// Body of `POST /v1/authorize`. The identity snapshot arrives verified by
/// the upstream authentication gateway; this service trusts it without
/// re-verifying signatures.
#[derive(Debug, Serialize, Deserialize, ToSchema, Clone)]
pub struct AuthorizeRequest {
    #[schema(value_type = Object)]
    pub identity: Identity,
    #[schema(value_type = String)]
    pub action: Action,
    pub namespace: String,
    #[schema(value_type = String)]
    pub classification: ResourceClassification,
    /// Environment snapshot; defaults to the decision time when omitted.
    #[serde(default, skip_serializing_if = "Option::is_none")]
    #[schema(value_type = Option<Object>)]
    pub environment: Option<EnvironmentSnapshot>,
}

#[derive(Debug, Serialize, Deserialize, ToSchema, Clone)]
pub struct AuthorizeResponse {
    #[schema(value_type = Object)]
    pub decision: Decision,
}

#[derive(Debug, Serialize, Deserialize, ToSchema, Clone)]
pub struct NamespaceCreateRequest {
    pub name: String,
    pub business_unit: String,
    pub region: String,
}

#[derive(Debug, Serialize, Deserialize, ToSchema, Clone)]
pub struct NamespaceStatusRequest {
    pub status: NamespaceStatus,
}

#[derive(Debug, Serialize, Deserialize, ToSchema, Clone)]
pub struct NamespaceListResponse {
    pub items: Vec<NamespaceRecord>,
}

#[derive(Debug, Serialize, Deserialize, ToSchema, Clone)]
pub struct AuditEntriesResponse {
    pub items: Vec<AuditEntry>,
}

#[derive(Debug, Serialize, Deserialize, ToSchema, Clone)]
pub struct RuleSetResponse {
    #[schema(value_type = Object)]
    pub rules: RuleSet,
}

#[derive(Debug, Serialize, Deserialize, ToSchema, Clone)]
pub struct RuleSetInstallResponse {
    pub active_version: String,
    pub replaced_version: String,
}
