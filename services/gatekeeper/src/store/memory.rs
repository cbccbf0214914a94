//! In-memory implementation of the gatekeeper store.
//!
//! # Purpose
//! Implements `GatekeeperStore` entirely in memory using `HashMap`s guarded
//! by `tokio::sync::RwLock`. It exists for:
//! - local development and tests (no external dependencies)
//! - deployments where durability is not required
//!
//! # Durability and consistency
//! - **Not durable**: all state is lost on process restart, which also means
//!   the regulatory retention obligation of the audit ledger cannot be met by
//!   this backend. Production deployments use Postgres.
//! - **Single-process consistency**: mutations take the write lock, so
//!   concurrent namespace creation with the same name observes exactly one
//!   winner, and audit appends are totally ordered by `next_seq`.
//!
//! # Append-only ledger
//! The audit log is a `Vec` that only ever grows. The `seq` assigned under
//! the write lock is monotonically increasing, so per-namespace order is the
//! global append order restricted to that namespace.
use super::{GatekeeperStore, StoreConfig, StoreError, StoreResult};
use crate::model::{AuditEntry, AuditFilter, NamespaceRecord, NamespaceStatus, NewAuditEntry};
use argus_authz::RuleSet;
use async_trait::async_trait;
use std::collections::HashMap;
use std::sync::Arc;
use tokio::sync::RwLock;

/// Append-only in-memory audit log with a monotonically increasing sequence.
#[derive(Debug, Default)]
struct AuditLog {
    next_seq: u64,
    entries: Vec<AuditEntry>,
}

impl AuditLog {
    fn append(&mut self, entry: NewAuditEntry) -> u64 {
        let seq = self.next_seq;
        self.next_seq += 1;
        self.entries.push(AuditEntry::from_new(seq, entry));
        seq
    }
}

pub struct InMemoryStore {
    config: StoreConfig,
    /// Authoritative namespace records keyed by name.
    namespaces: Arc<RwLock<HashMap<String, NamespaceRecord>>>,
    /// Append-only decision log.
    audit: Arc<RwLock<AuditLog>>,
    /// Installed rule-set versions, oldest first. The active set is the last.
    rule_sets: Arc<RwLock<Vec<RuleSet>>>,
}

impl InMemoryStore {
    pub fn new(config: StoreConfig) -> Self {
        Self {
            config,
            namespaces: Arc::new(RwLock::new(HashMap::new())),
            audit: Arc::new(RwLock::new(AuditLog::default())),
            rule_sets: Arc::new(RwLock::new(Vec::new())),
        }
    }
}

#[async_trait]
impl GatekeeperStore for InMemoryStore {
    async fn create_namespace(&self, record: NamespaceRecord) -> StoreResult<NamespaceRecord> {
        // Conflict detection and insertion happen under one write lock, so
        // concurrent creates with the same name see exactly one winner.
        let mut namespaces = self.namespaces.write().await;
        if namespaces.contains_key(&record.name) {
            return Err(StoreError::Conflict("namespace exists".into()));
        }
        namespaces.insert(record.name.clone(), record.clone());
        metrics::gauge!("argus_namespaces_total").set(namespaces.len() as f64);
        Ok(record)
    }

    async fn get_namespace(&self, name: &str) -> StoreResult<NamespaceRecord> {
        self.namespaces
            .read()
            .await
            .get(name)
            .cloned()
            .ok_or_else(|| StoreError::NotFound("namespace".into()))
    }

    async fn list_namespaces(
        &self,
        business_unit: Option<&str>,
    ) -> StoreResult<Vec<NamespaceRecord>> {
        let namespaces = self.namespaces.read().await;
        let mut items: Vec<_> = namespaces
            .values()
            .filter(|record| business_unit.is_none_or(|unit| record.business_unit == unit))
            .cloned()
            .collect();
        items.sort_by(|a, b| a.name.cmp(&b.name));
        Ok(items)
    }

    async fn update_namespace_status(
        &self,
        name: &str,
        from: NamespaceStatus,
        to: NamespaceStatus,
    ) -> StoreResult<NamespaceRecord> {
        let mut namespaces = self.namespaces.write().await;
        let record = namespaces
            .get_mut(name)
            .ok_or_else(|| StoreError::NotFound("namespace".into()))?;
        if record.status != from {
            return Err(StoreError::Conflict(format!(
                "namespace status is {}, expected {}",
                record.status, from
            )));
        }
        record.status = to;
        Ok(record.clone())
    }

    async fn namespace_exists(&self, name: &str) -> StoreResult<bool> {
        Ok(self.namespaces.read().await.contains_key(name))
    }

    async fn append_audit(&self, entry: NewAuditEntry) -> StoreResult<u64> {
        let seq = self.audit.write().await.append(entry);
        Ok(seq)
    }

    async fn query_audit(&self, filter: &AuditFilter) -> StoreResult<Vec<AuditEntry>> {
        let limit = if filter.limit == 0 {
            self.config.audit_query_limit as usize
        } else {
            filter.limit.min(self.config.audit_query_limit as usize)
        };
        let audit = self.audit.read().await;
        Ok(audit
            .entries
            .iter()
            .filter(|entry| filter.matches(entry))
            .take(limit)
            .cloned()
            .collect())
    }

    async fn load_rule_set(&self) -> StoreResult<Option<RuleSet>> {
        Ok(self.rule_sets.read().await.last().cloned())
    }

    async fn store_rule_set(&self, rules: &RuleSet) -> StoreResult<()> {
        let mut sets = self.rule_sets.write().await;
        if sets.iter().any(|set| set.version == rules.version) {
            return Err(StoreError::Conflict(format!(
                "rule set version {} already installed",
                rules.version
            )));
        }
        sets.push(rules.clone());
        Ok(())
    }

    async fn health_check(&self) -> StoreResult<()> {
        // In-memory backend is always healthy while the process runs.
        Ok(())
    }

    fn is_durable(&self) -> bool {
        false
    }

    fn backend_name(&self) -> &'static str {
        "memory"
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use argus_authz::{Action, DecisionBasis, Outcome, Role};
    use chrono::Utc;

    fn store() -> InMemoryStore {
        InMemoryStore::new(StoreConfig {
            audit_query_limit: 100,
        })
    }

    fn record(name: &str) -> NamespaceRecord {
        NamespaceRecord {
            name: name.to_string(),
            business_unit: name.split('-').next().unwrap_or_default().to_string(),
            region: "eu-west".to_string(),
            status: NamespaceStatus::Active,
            created_by: "u-admin".to_string(),
            created_at: Utc::now(),
        }
    }

    fn audit_entry(namespace: &str) -> NewAuditEntry {
        NewAuditEntry {
            decided_at: Utc::now(),
            principal_id: "u-1".to_string(),
            role: Role::Operator,
            action: Action::Query,
            namespace: namespace.to_string(),
            classification: "internal".to_string(),
            outcome: Outcome::Allow,
            basis: DecisionBasis::DefaultDeny,
            deny_kind: None,
            reason: None,
            broad_access: false,
            policy_version: "v1".to_string(),
            network_origin: None,
            device_managed: true,
            device_encrypted: true,
        }
    }

    #[tokio::test]
    async fn create_conflict_detection() {
        let store = store();
        store.create_namespace(record("hr-prod")).await.expect("create");
        let err = store
            .create_namespace(record("hr-prod"))
            .await
            .expect_err("conflict");
        assert!(matches!(err, StoreError::Conflict(_)));
    }

    #[tokio::test]
    async fn concurrent_creates_have_one_winner() {
        let store = Arc::new(store());
        let mut handles = Vec::new();
        for _ in 0..16 {
            let store = store.clone();
            handles.push(tokio::spawn(async move {
                store.create_namespace(record("finance-prod")).await
            }));
        }
        let mut successes = 0;
        let mut conflicts = 0;
        for handle in handles {
            match handle.await.expect("join") {
                Ok(_) => successes += 1,
                Err(StoreError::Conflict(_)) => conflicts += 1,
                Err(other) => panic!("unexpected error: {other}"),
            }
        }
        assert_eq!(successes, 1);
        assert_eq!(conflicts, 15);
    }

    #[tokio::test]
    async fn status_cas_rejects_stale_expectation() {
        let store = store();
        store.create_namespace(record("hr-prod")).await.expect("create");
        store
            .update_namespace_status("hr-prod", NamespaceStatus::Active, NamespaceStatus::Suspended)
            .await
            .expect("suspend");
        let err = store
            .update_namespace_status("hr-prod", NamespaceStatus::Active, NamespaceStatus::Suspended)
            .await
            .expect_err("stale");
        assert!(matches!(err, StoreError::Conflict(_)));
    }

    #[tokio::test]
    async fn audit_appends_are_sequenced_and_ordered() {
        let store = store();
        let first = store.append_audit(audit_entry("hr-prod")).await.expect("append");
        let second = store.append_audit(audit_entry("hr-prod")).await.expect("append");
        assert!(second > first);

        let entries = store
            .query_audit(&AuditFilter {
                namespace: Some("hr-prod".to_string()),
                limit: 10,
                ..AuditFilter::default()
            })
            .await
            .expect("query");
        assert_eq!(entries.len(), 2);
        assert!(entries[0].seq < entries[1].seq);
    }

    #[tokio::test]
    async fn audit_query_respects_limit_cap() {
        let store = store();
        for _ in 0..5 {
            store.append_audit(audit_entry("hr-prod")).await.expect("append");
        }
        let entries = store
            .query_audit(&AuditFilter {
                limit: 2,
                ..AuditFilter::default()
            })
            .await
            .expect("query");
        assert_eq!(entries.len(), 2);
    }

    #[tokio::test]
    async fn rule_set_history_returns_latest() {
        let store = store();
        assert!(store.load_rule_set().await.expect("load").is_none());
        store
            .store_rule_set(&RuleSet::empty("v1"))
            .await
            .expect("store v1");
        store
            .store_rule_set(&RuleSet::empty("v2"))
            .await
            .expect("store v2");
        let active = store.load_rule_set().await.expect("load").expect("some");
        assert_eq!(active.version, "v2");

        let err = store
            .store_rule_set(&RuleSet::empty("v2"))
            .await
            .expect_err("duplicate version");
        assert!(matches!(err, StoreError::Conflict(_)));
    }

    #[tokio::test]
    async fn backend_identity() {
        let store = store();
        store.health_check().await.expect("health");
        assert!(!store.is_durable());
        assert_eq!(store.backend_name(), "memory");
    }
}
