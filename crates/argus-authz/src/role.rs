//! Fixed role and permission registry.
//!
//! # Purpose
//! Defines the three engine roles, the atomic permissions they carry, and the
//! lookup functions the coordinator uses as its RBAC gate.
//!
//! # Key invariants
//! - The role→permission tables below are the only source of truth and are
//!   fixed at build time. Changing a role's permissions is a deployment, not
//!   an API call.
//! - Permissions attach to roles, never to individual identities.
use crate::action::Action;
use serde::{Deserialize, Serialize};

/// Engine role. Identities carry exactly one.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum Role {
    Admin,
    Operator,
    Auditor,
}

impl Role {
    pub fn as_str(self) -> &'static str {
        match self {
            Role::Admin => "admin",
            Role::Operator => "operator",
            Role::Auditor => "auditor",
        }
    }
}

impl std::fmt::Display for Role {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.write_str(self.as_str())
    }
}

impl std::str::FromStr for Role {
    type Err = ();

    fn from_str(value: &str) -> Result<Self, Self::Err> {
        match value {
            "admin" => Ok(Role::Admin),
            "operator" => Ok(Role::Operator),
            "auditor" => Ok(Role::Auditor),
            _ => Err(()),
        }
    }
}

/// Atomic capability assigned to roles.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum Permission {
    QueryOwnNamespace,
    QueryAnyNamespace,
    IngestOwnNamespace,
    CreateNamespace,
    ManageNamespaces,
    ViewAuditLog,
    ReloadPolicies,
}

impl Permission {
    pub fn as_str(self) -> &'static str {
        match self {
            Permission::QueryOwnNamespace => "query.own",
            Permission::QueryAnyNamespace => "query.any",
            Permission::IngestOwnNamespace => "ingest.own",
            Permission::CreateNamespace => "ns.create",
            Permission::ManageNamespaces => "ns.manage",
            Permission::ViewAuditLog => "audit.view",
            Permission::ReloadPolicies => "policy.reload",
        }
    }
}

impl std::fmt::Display for Permission {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.write_str(self.as_str())
    }
}

/// The permission set carried by a role.
pub fn permissions_for(role: Role) -> &'static [Permission] {
    match role {
        Role::Admin => &[
            Permission::QueryOwnNamespace,
            Permission::QueryAnyNamespace,
            Permission::IngestOwnNamespace,
            Permission::CreateNamespace,
            Permission::ManageNamespaces,
            Permission::ReloadPolicies,
        ],
        Role::Operator => &[
            Permission::QueryOwnNamespace,
            Permission::IngestOwnNamespace,
        ],
        Role::Auditor => &[
            Permission::QueryOwnNamespace,
            Permission::QueryAnyNamespace,
            Permission::ViewAuditLog,
        ],
    }
}

pub fn has_permission(role: Role, permission: Permission) -> bool {
    permissions_for(role).contains(&permission)
}

/// The permission an action requires. Querying across namespaces needs the
/// broader capability, so the mapping depends on whether the target is the
/// identity's own namespace.
pub fn permission_for_action(action: Action, own_namespace: bool) -> Permission {
    match action {
        Action::Query if own_namespace => Permission::QueryOwnNamespace,
        Action::Query => Permission::QueryAnyNamespace,
        Action::Ingest => Permission::IngestOwnNamespace,
        Action::NamespaceCreate => Permission::CreateNamespace,
        Action::NamespaceStatus => Permission::ManageNamespaces,
        Action::AuditView => Permission::ViewAuditLog,
        Action::PolicyReload => Permission::ReloadPolicies,
    }
}
