//! Argus authorization primitives shared by the gatekeeper service and its
//! callers.
//!
//! # Purpose
//! Centralizes the authorization model: the fixed role/permission registry,
//! the action vocabulary, identity and environment snapshots, the declarative
//! policy-rule data model, and the pure rule evaluator that turns a request
//! into an allow/deny decision.
//!
//! # How it fits
//! The gatekeeper service resolves namespaces, loads the active rule set, and
//! records decisions; everything it evaluates is defined here so that other
//! services (and tests) share one vocabulary and one evaluation semantics.
//!
//! # Key invariants
//! - Role→permission tables are code-defined and fixed at build time; there
//!   is no API that mutates them.
//! - Rule evaluation is deterministic: rules run in declared order, the first
//!   matching rule wins, and the absence of any match is a denial.
//! - Every deny decision carries a human-readable reason.
//!
//! # Common pitfalls
//! - Constructing identifier newtypes from unvalidated input; callers own
//!   boundary validation.
//! - Treating a missing rule match as "no opinion" — it is a deny.

mod action;
mod decision;
mod errors;
mod evaluate;
mod identity;
mod role;
mod rule;
mod types;

pub use action::{AccessKind, Action};
pub use decision::{Decision, DecisionBasis, DenyKind, Outcome};
pub use errors::{AuthzError, AuthzResult};
pub use evaluate::{Evaluation, ResourceAttributes, evaluate};
pub use identity::{
    AuthorizationRequest, DeviceTrust, EnvironmentSnapshot, Identity, ResourceClassification,
};
pub use role::{Permission, Role, has_permission, permission_for_action, permissions_for};
pub use rule::{
    DeviceRequirement, Effect, NamespaceMatch, PolicyRule, RuleId, RuleSet, TimeWindow, Weekday,
};
pub use types::{BusinessUnit, NamespaceName, PrincipalId};
