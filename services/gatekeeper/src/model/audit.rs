//! Audit ledger entry models.
//!
//! # Purpose
//! Defines the immutable record written for every authorization decision and
//! the filter shape for compliance queries. There is deliberately no update
//! or patch payload here: entries are created once and never touched again.
use argus_authz::{Action, DecisionBasis, DenyKind, Outcome, Role};
use chrono::{DateTime, Utc};
use serde::{Deserialize, Serialize};
use utoipa::ToSchema;

/// A decision awaiting its ledger sequence number.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct NewAuditEntry {
    pub decided_at: DateTime<Utc>,
    pub principal_id: String,
    pub role: Role,
    pub action: Action,
    pub namespace: String,
    pub classification: String,
    pub outcome: Outcome,
    pub basis: DecisionBasis,
    pub deny_kind: Option<DenyKind>,
    pub reason: Option<String>,
    pub broad_access: bool,
    pub policy_version: String,
    pub network_origin: Option<String>,
    pub device_managed: bool,
    pub device_encrypted: bool,
}

/// A durably recorded decision. `seq` is assigned by the ledger and is
/// monotonically increasing, so entries for one namespace are observed in
/// append order.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize, ToSchema)]
pub struct AuditEntry {
    pub seq: u64,
    pub decided_at: DateTime<Utc>,
    pub principal_id: String,
    #[schema(value_type = String)]
    pub role: Role,
    #[schema(value_type = String)]
    pub action: Action,
    pub namespace: String,
    pub classification: String,
    #[schema(value_type = String)]
    pub outcome: Outcome,
    #[schema(value_type = Object)]
    pub basis: DecisionBasis,
    #[schema(value_type = Option<String>)]
    pub deny_kind: Option<DenyKind>,
    pub reason: Option<String>,
    pub broad_access: bool,
    pub policy_version: String,
    pub network_origin: Option<String>,
    pub device_managed: bool,
    pub device_encrypted: bool,
}

impl AuditEntry {
    pub fn from_new(seq: u64, entry: NewAuditEntry) -> Self {
        Self {
            seq,
            decided_at: entry.decided_at,
            principal_id: entry.principal_id,
            role: entry.role,
            action: entry.action,
            namespace: entry.namespace,
            classification: entry.classification,
            outcome: entry.outcome,
            basis: entry.basis,
            deny_kind: entry.deny_kind,
            reason: entry.reason,
            broad_access: entry.broad_access,
            policy_version: entry.policy_version,
            network_origin: entry.network_origin,
            device_managed: entry.device_managed,
            device_encrypted: entry.device_encrypted,
        }
    }
}

/// Filters for compliance queries. All fields are conjunctive; `None` means
/// no constraint.
#[derive(Debug, Clone, Default, PartialEq, Eq)]
pub struct AuditFilter {
    pub namespace: Option<String>,
    pub principal_id: Option<String>,
    pub outcome: Option<Outcome>,
    pub broad_access_only: bool,
    pub from: Option<DateTime<Utc>>,
    pub to: Option<DateTime<Utc>>,
    pub limit: usize,
}

impl AuditFilter {
    pub fn matches(&self, entry: &AuditEntry) -> bool {
        if let Some(namespace) = &self.namespace
            && entry.namespace != *namespace
        {
            return false;
        }
        if let Some(principal) = &self.principal_id
            && entry.principal_id != *principal
        {
            return false;
        }
        if let Some(outcome) = self.outcome
            && entry.outcome != outcome
        {
            return false;
        }
        if self.broad_access_only && !entry.broad_access {
            return false;
        }
        if let Some(from) = self.from
            && entry.decided_at < from
        {
            return false;
        }
        if let Some(to) = self.to
            && entry.decided_at >= to
        {
            return false;
        }
        true
    }
}
