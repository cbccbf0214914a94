//! Authorization decision types.
//!
//! # Purpose
//! The value the coordinator returns and the ledger records: allow or deny,
//! what produced it, and why.
//!
//! # Key invariants
//! - A deny always carries a human-readable reason; the constructors make a
//!   reason-less deny unrepresentable.
//! - Decisions are written once to the audit ledger and never persisted as
//!   mutable entities.
use crate::rule::RuleId;
use chrono::{DateTime, Utc};
use serde::{Deserialize, Serialize};

#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum Outcome {
    Allow,
    Deny,
}

/// Which check produced the decision.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum DecisionBasis {
    /// The namespace resolution / status gate (step 1).
    NamespaceGuard,
    /// The fixed role→permission table (step 2).
    RoleCheck,
    /// The namespace access validation (step 3).
    AccessValidation,
    /// A policy rule matched (step 4).
    Rule { id: RuleId },
    /// No policy rule matched (step 4, default deny).
    DefaultDeny,
    /// The engine failed to evaluate or record; the request fails closed.
    EngineFailure,
}

/// Classifies denials so callers and operators can tell expected policy
/// outcomes apart from authorization-service failures.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum DenyKind {
    /// Target namespace missing or its status forbids the action.
    NamespaceUnavailable,
    /// The role does not carry the required permission.
    PermissionDenied,
    /// The namespace access validation refused the target.
    NamespaceMismatch,
    /// An attribute-based rule denied, or nothing matched.
    PolicyDenied,
    /// The policy engine or ledger was unreachable; the request fails
    /// closed. Distinct from a legitimate denial.
    ServiceUnavailable,
}

#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct Decision {
    pub outcome: Outcome,
    pub basis: DecisionBasis,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub deny_kind: Option<DenyKind>,
    /// Human-readable reason. Always present on a deny.
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub reason: Option<String>,
    /// True when an Admin or Auditor addressed a namespace other than their
    /// own; such accesses are separately visible in the audit trail.
    pub broad_access: bool,
    /// Version of the rule set that was active at decision time.
    pub policy_version: String,
    pub decided_at: DateTime<Utc>,
}

impl Decision {
    pub fn allow(basis: DecisionBasis, broad_access: bool, policy_version: String) -> Self {
        Self {
            outcome: Outcome::Allow,
            basis,
            deny_kind: None,
            reason: None,
            broad_access,
            policy_version,
            decided_at: Utc::now(),
        }
    }

    pub fn deny(
        basis: DecisionBasis,
        kind: DenyKind,
        reason: impl Into<String>,
        broad_access: bool,
        policy_version: String,
    ) -> Self {
        Self {
            outcome: Outcome::Deny,
            basis,
            deny_kind: Some(kind),
            reason: Some(reason.into()),
            broad_access,
            policy_version,
            decided_at: Utc::now(),
        }
    }

    pub fn is_allowed(&self) -> bool {
        self.outcome == Outcome::Allow
    }
}
