use crate::model::{AuditEntry, AuditFilter, NamespaceRecord, NamespaceStatus, NewAuditEntry};
use argus_authz::RuleSet;
use async_trait::async_trait;
use thiserror::Error;

pub mod memory;
pub mod postgres;

#[derive(Debug, Clone)]
pub struct StoreConfig {
    /// Max audit entries returned per query.
    pub audit_query_limit: u64,
}

#[derive(Debug, Error)]
pub enum StoreError {
    #[error("not found: {0}")]
    NotFound(String),
    #[error("conflict: {0}")]
    Conflict(String),
    #[error(transparent)]
    Unexpected(#[from] anyhow::Error),
}

pub type StoreResult<T> = Result<T, StoreError>;

impl From<sqlx::Error> for StoreError {
    fn from(err: sqlx::Error) -> Self {
        StoreError::Unexpected(err.into())
    }
}

impl From<sqlx::migrate::MigrateError> for StoreError {
    fn from(err: sqlx::migrate::MigrateError) -> Self {
        StoreError::Unexpected(err.into())
    }
}

/// Storage contract for the gatekeeper.
///
/// The audit portion of this trait is append-only by construction: there is
/// no method that updates or deletes an entry, and the Postgres backend
/// additionally enforces immutability with a storage-level trigger so the
/// guarantee survives application bugs.
#[async_trait]
pub trait GatekeeperStore: Send + Sync {
    async fn create_namespace(&self, record: NamespaceRecord) -> StoreResult<NamespaceRecord>;
    async fn get_namespace(&self, name: &str) -> StoreResult<NamespaceRecord>;
    async fn list_namespaces(&self, business_unit: Option<&str>)
    -> StoreResult<Vec<NamespaceRecord>>;
    /// Compare-and-set status update: succeeds only if the stored status
    /// still equals `from`, so concurrent transitions cannot skip states.
    async fn update_namespace_status(
        &self,
        name: &str,
        from: NamespaceStatus,
        to: NamespaceStatus,
    ) -> StoreResult<NamespaceRecord>;
    async fn namespace_exists(&self, name: &str) -> StoreResult<bool>;

    async fn append_audit(&self, entry: NewAuditEntry) -> StoreResult<u64>;
    async fn query_audit(&self, filter: &AuditFilter) -> StoreResult<Vec<AuditEntry>>;

    async fn load_rule_set(&self) -> StoreResult<Option<RuleSet>>;
    /// Install a new rule-set version. The previous versions are retained as
    /// history; `load_rule_set` returns the latest.
    async fn store_rule_set(&self, rules: &RuleSet) -> StoreResult<()>;

    async fn health_check(&self) -> StoreResult<()>;
    fn is_durable(&self) -> bool;
    fn backend_name(&self) -> &'static str;
}
