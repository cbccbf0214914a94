use serde::{Deserialize, Serialize};

/// Operations a caller can request against the engine.
///
/// The canonical dotted strings are the wire vocabulary used in requests,
/// policy rules, and audit entries.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
pub enum Action {
    #[serde(rename = "retrieval.query")]
    Query,
    #[serde(rename = "retrieval.ingest")]
    Ingest,
    #[serde(rename = "ns.create")]
    NamespaceCreate,
    #[serde(rename = "ns.status")]
    NamespaceStatus,
    #[serde(rename = "audit.view")]
    AuditView,
    #[serde(rename = "policy.reload")]
    PolicyReload,
}

/// How an action touches tenant data, used by the namespace status gate.
///
/// `Control` actions operate on the engine's own registry or ledger and are
/// not blocked by a namespace's Suspended/Archived status.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum AccessKind {
    DataRead,
    DataWrite,
    Control,
}

impl Action {
    pub fn as_str(self) -> &'static str {
        match self {
            Action::Query => "retrieval.query",
            Action::Ingest => "retrieval.ingest",
            Action::NamespaceCreate => "ns.create",
            Action::NamespaceStatus => "ns.status",
            Action::AuditView => "audit.view",
            Action::PolicyReload => "policy.reload",
        }
    }

    pub fn access_kind(self) -> AccessKind {
        match self {
            Action::Query => AccessKind::DataRead,
            Action::Ingest => AccessKind::DataWrite,
            Action::NamespaceCreate
            | Action::NamespaceStatus
            | Action::AuditView
            | Action::PolicyReload => AccessKind::Control,
        }
    }

    /// Whether the target namespace must already exist for the action to be
    /// evaluated. Creation targets a name that must not exist yet, and a
    /// policy reload is not addressed to any tenant namespace.
    pub fn requires_existing_namespace(self) -> bool {
        !matches!(self, Action::NamespaceCreate | Action::PolicyReload)
    }
}

impl std::fmt::Display for Action {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.write_str(self.as_str())
    }
}

impl std::str::FromStr for Action {
    type Err = ();

    fn from_str(value: &str) -> Result<Self, Self::Err> {
        match value {
            "retrieval.query" => Ok(Action::Query),
            "retrieval.ingest" => Ok(Action::Ingest),
            "ns.create" => Ok(Action::NamespaceCreate),
            "ns.status" => Ok(Action::NamespaceStatus),
            "audit.view" => Ok(Action::AuditView),
            "policy.reload" => Ok(Action::PolicyReload),
            _ => Err(()),
        }
    }
}
