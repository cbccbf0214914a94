//! Namespace records and lifecycle.
//!
//! # Purpose
//! Defines the tenant-partition record the registry stores and the status
//! state machine that gates data access.
use argus_authz::AccessKind;
use chrono::{DateTime, Utc};
use serde::{Deserialize, Serialize};
use utoipa::ToSchema;

/// Lifecycle status of a namespace.
///
/// Transitions never skip a state: Active ⇄ Suspended → Archived, and
/// Archived is terminal.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize, ToSchema)]
#[serde(rename_all = "snake_case")]
pub enum NamespaceStatus {
    Active,
    Suspended,
    Archived,
}

impl NamespaceStatus {
    pub fn as_str(self) -> &'static str {
        match self {
            NamespaceStatus::Active => "active",
            NamespaceStatus::Suspended => "suspended",
            NamespaceStatus::Archived => "archived",
        }
    }

    pub fn can_transition(self, to: NamespaceStatus) -> bool {
        matches!(
            (self, to),
            (NamespaceStatus::Active, NamespaceStatus::Suspended)
                | (NamespaceStatus::Suspended, NamespaceStatus::Active)
                | (NamespaceStatus::Suspended, NamespaceStatus::Archived)
        )
    }

    /// Whether the status admits the given kind of access. Suspended blocks
    /// queries and writes alike; Archived is read-only. Control operations
    /// (status changes, audit reads) are not gated here.
    pub fn permits(self, kind: AccessKind) -> bool {
        match (self, kind) {
            (_, AccessKind::Control) => true,
            (NamespaceStatus::Active, _) => true,
            (NamespaceStatus::Suspended, _) => false,
            (NamespaceStatus::Archived, AccessKind::DataRead) => true,
            (NamespaceStatus::Archived, AccessKind::DataWrite) => false,
        }
    }
}

impl std::fmt::Display for NamespaceStatus {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.write_str(self.as_str())
    }
}

impl std::str::FromStr for NamespaceStatus {
    type Err = ();

    fn from_str(value: &str) -> Result<Self, Self::Err> {
        match value {
            "active" => Ok(NamespaceStatus::Active),
            "suspended" => Ok(NamespaceStatus::Suspended),
            "archived" => Ok(NamespaceStatus::Archived),
            _ => Err(()),
        }
    }
}

/// One tenant partition.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize, ToSchema)]
pub struct NamespaceRecord {
    pub name: String,
    pub business_unit: String,
    pub region: String,
    pub status: NamespaceStatus,
    pub created_by: String,
    pub created_at: DateTime<Utc>,
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn transitions_never_skip_states() {
        assert!(NamespaceStatus::Active.can_transition(NamespaceStatus::Suspended));
        assert!(NamespaceStatus::Suspended.can_transition(NamespaceStatus::Active));
        assert!(NamespaceStatus::Suspended.can_transition(NamespaceStatus::Archived));

        assert!(!NamespaceStatus::Active.can_transition(NamespaceStatus::Archived));
        assert!(!NamespaceStatus::Archived.can_transition(NamespaceStatus::Active));
        assert!(!NamespaceStatus::Archived.can_transition(NamespaceStatus::Suspended));
        assert!(!NamespaceStatus::Active.can_transition(NamespaceStatus::Active));
    }

    #[test]
    fn suspended_blocks_reads_and_writes() {
        assert!(!NamespaceStatus::Suspended.permits(AccessKind::DataRead));
        assert!(!NamespaceStatus::Suspended.permits(AccessKind::DataWrite));
        assert!(NamespaceStatus::Suspended.permits(AccessKind::Control));
    }

    #[test]
    fn archived_is_read_only() {
        assert!(NamespaceStatus::Archived.permits(AccessKind::DataRead));
        assert!(!NamespaceStatus::Archived.permits(AccessKind::DataWrite));
    }
}
