//! Namespace manager: naming convention, lifecycle, and access validation.
//!
//! # Purpose
//! The sole authority on namespace existence and status. Creation is
//! delegated to the store's atomic insert so concurrent creates with the
//! same name have exactly one winner; this module owns the naming convention
//! and the lifecycle state machine on top of it.
//!
//! # Key invariants
//! - A namespace name is `{business_unit}-{environment}`: lowercase
//!   alphanumeric segments joined by single dashes, prefixed by the owning
//!   business unit. The convention prevents cross-team collisions.
//! - Status transitions go through the store as compare-and-set updates, so
//!   no concurrent transition can skip a lifecycle state.
//! - An Operator's target namespace is derived from the identity, never
//!   taken from untrusted input: any mismatch is refused here.
use crate::model::{NamespaceRecord, NamespaceStatus};
use crate::store::{GatekeeperStore, StoreError, StoreResult};
use argus_authz::{Identity, NamespaceName, Role};
use chrono::Utc;
use std::sync::Arc;
use thiserror::Error;

#[derive(Debug, Error)]
pub enum NamespaceError {
    #[error("invalid namespace name: {0}")]
    InvalidName(String),
    #[error("invalid status transition: {from} -> {to}")]
    InvalidTransition {
        from: NamespaceStatus,
        to: NamespaceStatus,
    },
    #[error(transparent)]
    Store(#[from] StoreError),
}

/// How a permitted request relates to the identity's own namespace.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum AccessScope {
    /// The target is the identity's assigned namespace.
    Home,
    /// Admin/Auditor access to another namespace; flagged in the audit entry.
    Broad,
}

pub struct NamespaceManager {
    store: Arc<dyn GatekeeperStore>,
}

impl NamespaceManager {
    pub fn new(store: Arc<dyn GatekeeperStore>) -> Self {
        Self { store }
    }

    /// Create a namespace after validating the naming convention. The
    /// conflict check is the store's atomic insert, not a separate read.
    pub async fn create(
        &self,
        name: &str,
        business_unit: &str,
        region: &str,
        created_by: &str,
    ) -> Result<NamespaceRecord, NamespaceError> {
        validate_name(name, business_unit).map_err(NamespaceError::InvalidName)?;
        let record = NamespaceRecord {
            name: name.to_string(),
            business_unit: business_unit.to_string(),
            region: region.to_string(),
            status: NamespaceStatus::Active,
            created_by: created_by.to_string(),
            created_at: Utc::now(),
        };
        let created = self.store.create_namespace(record).await?;
        tracing::info!(namespace = %created.name, business_unit = %created.business_unit, "namespace created");
        Ok(created)
    }

    pub async fn resolve(&self, name: &str) -> StoreResult<NamespaceRecord> {
        self.store.get_namespace(name).await
    }

    pub async fn list(&self, business_unit: Option<&str>) -> StoreResult<Vec<NamespaceRecord>> {
        self.store.list_namespaces(business_unit).await
    }

    /// Drive one lifecycle transition. The current status is read first to
    /// produce a precise error, but the store update re-checks it
    /// (compare-and-set), so a racing transition loses cleanly.
    pub async fn transition(
        &self,
        name: &str,
        to: NamespaceStatus,
    ) -> Result<NamespaceRecord, NamespaceError> {
        let current = self.store.get_namespace(name).await?;
        if !current.status.can_transition(to) {
            return Err(NamespaceError::InvalidTransition {
                from: current.status,
                to,
            });
        }
        let updated = self
            .store
            .update_namespace_status(name, current.status, to)
            .await?;
        tracing::info!(namespace = %name, from = %current.status, to = %to, "namespace status changed");
        Ok(updated)
    }

    /// Validate that `identity` may address `target` at all. Operators are
    /// confined to their assigned namespace; Admin and Auditor may cross,
    /// and every cross access is reported as `Broad` so the coordinator can
    /// flag the audit entry.
    pub fn access_scope(
        &self,
        identity: &Identity,
        target: &NamespaceName,
    ) -> Result<AccessScope, String> {
        if identity.namespace == *target {
            return Ok(AccessScope::Home);
        }
        match identity.role {
            Role::Admin | Role::Auditor => Ok(AccessScope::Broad),
            Role::Operator => Err(format!(
                "namespace mismatch: operator {} is assigned to {} and cannot address {}",
                identity.principal_id, identity.namespace, target
            )),
        }
    }
}

/// Check a namespace name against the `{business_unit}-{environment}`
/// convention.
pub fn validate_name(name: &str, business_unit: &str) -> Result<(), String> {
    if business_unit.is_empty() || !business_unit.split('-').all(is_valid_segment) {
        return Err(format!("invalid business unit: {business_unit:?}"));
    }
    let Some(environment) = name.strip_prefix(business_unit).and_then(|rest| rest.strip_prefix('-'))
    else {
        return Err(format!(
            "name {name:?} must start with the owning business unit {business_unit:?}"
        ));
    };
    if environment.is_empty() || !environment.split('-').all(is_valid_segment) {
        return Err(format!("name {name:?} has an invalid environment suffix"));
    }
    Ok(())
}

fn is_valid_segment(segment: &str) -> bool {
    !segment.is_empty()
        && segment
            .chars()
            .all(|c| c.is_ascii_lowercase() || c.is_ascii_digit())
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::store::{StoreConfig, memory::InMemoryStore};
    use argus_authz::{DeviceTrust, PrincipalId};

    fn manager() -> NamespaceManager {
        NamespaceManager::new(Arc::new(InMemoryStore::new(StoreConfig {
            audit_query_limit: 100,
        })))
    }

    fn identity(role: Role, namespace: &str) -> Identity {
        Identity {
            principal_id: PrincipalId::new("u-1"),
            role,
            namespace: NamespaceName::new(namespace),
            region: "eu-west".to_string(),
            device: DeviceTrust::default(),
        }
    }

    #[test]
    fn name_convention_accepts_unit_prefixed_names() {
        assert!(validate_name("hr-prod", "hr").is_ok());
        assert!(validate_name("finance-prod", "finance").is_ok());
        assert!(validate_name("finance-eu-staging", "finance-eu").is_ok());
    }

    #[test]
    fn name_convention_rejects_foreign_prefixes_and_bad_segments() {
        assert!(validate_name("finance-prod", "hr").is_err());
        assert!(validate_name("hr", "hr").is_err());
        assert!(validate_name("hr-", "hr").is_err());
        assert!(validate_name("hr-Prod", "hr").is_err());
        assert!(validate_name("hr--prod", "hr").is_err());
        assert!(validate_name("hrprod", "hr").is_err());
    }

    #[tokio::test]
    async fn create_rejects_invalid_name_before_touching_the_store() {
        let manager = manager();
        let err = manager
            .create("finance-prod", "hr", "eu-west", "u-admin")
            .await
            .expect_err("invalid name");
        assert!(matches!(err, NamespaceError::InvalidName(_)));
        assert!(manager.list(None).await.expect("list").is_empty());
    }

    #[tokio::test]
    async fn lifecycle_cannot_skip_states() {
        let manager = manager();
        manager
            .create("hr-prod", "hr", "eu-west", "u-admin")
            .await
            .expect("create");

        let err = manager
            .transition("hr-prod", NamespaceStatus::Archived)
            .await
            .expect_err("skip");
        assert!(matches!(err, NamespaceError::InvalidTransition { .. }));

        manager
            .transition("hr-prod", NamespaceStatus::Suspended)
            .await
            .expect("suspend");
        // Reactivation from Suspended is allowed.
        manager
            .transition("hr-prod", NamespaceStatus::Active)
            .await
            .expect("reactivate");
        manager
            .transition("hr-prod", NamespaceStatus::Suspended)
            .await
            .expect("suspend again");
        let archived = manager
            .transition("hr-prod", NamespaceStatus::Archived)
            .await
            .expect("archive");
        assert_eq!(archived.status, NamespaceStatus::Archived);

        // Archived is terminal.
        let err = manager
            .transition("hr-prod", NamespaceStatus::Active)
            .await
            .expect_err("terminal");
        assert!(matches!(err, NamespaceError::InvalidTransition { .. }));
    }

    #[test]
    fn operator_is_confined_to_home_namespace() {
        let manager = manager();
        let operator = identity(Role::Operator, "hr-prod");
        assert_eq!(
            manager
                .access_scope(&operator, &NamespaceName::new("hr-prod"))
                .expect("home"),
            AccessScope::Home
        );
        let err = manager
            .access_scope(&operator, &NamespaceName::new("finance-prod"))
            .expect_err("mismatch");
        assert!(err.contains("namespace mismatch"));
    }

    #[test]
    fn admin_and_auditor_cross_access_is_broad() {
        let manager = manager();
        for role in [Role::Admin, Role::Auditor] {
            let id = identity(role, "hr-prod");
            assert_eq!(
                manager
                    .access_scope(&id, &NamespaceName::new("finance-prod"))
                    .expect("broad"),
                AccessScope::Broad
            );
        }
    }
}
