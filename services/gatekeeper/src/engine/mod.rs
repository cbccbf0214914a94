//! The authorization engine: namespace manager, policy engine, audit ledger,
//! and the coordinator that chains them into one mandatory gate.
use thiserror::Error;

pub mod gate;
pub mod ledger;
pub mod namespaces;
pub mod policy;

pub use gate::Gate;
pub use ledger::AuditLedger;
pub use namespaces::{AccessScope, NamespaceError, NamespaceManager};
pub use policy::{LocalPolicyEngine, PolicyEvaluator};

/// Infrastructure failures of the gate itself. Denials are not errors — they
/// come back as `Decision`s — so anything here means the engine could not
/// decide or could not record, and the caller must treat it as a denial.
#[derive(Debug, Error)]
pub enum GateError {
    /// Policy engine or a backing store was unreachable or exceeded its
    /// budget. Distinct from "denied by policy" so operators can tell an
    /// outage from a legitimate denial.
    #[error("authorization service unavailable: {0}")]
    Unavailable(String),
    /// The decision could not be durably recorded. An unrecorded allow is
    /// unauditable, so the surrounding request is denied no matter what the
    /// policy engine decided.
    #[error("audit write failed: {0}")]
    AuditWriteFailed(String),
}
