//! Postgres-backed implementation of the gatekeeper store.
//!
//! # What this module is
//! Implements [`GatekeeperStore`] using Postgres (via `sqlx`) as the durable
//! backend for the namespace registry, the audit ledger, and the versioned
//! policy rule sets.
//!
//! # Key invariants
//! - `audit_entries` is append-only. Beyond the trait offering no mutation
//!   method, the schema installs a trigger that rejects every UPDATE/DELETE,
//!   so immutability holds independently of application correctness.
//! - `seq` is assigned by Postgres (`BIGSERIAL`) and is monotonically
//!   increasing, so per-namespace append order is observable by queries.
//! - Namespace creation relies on the primary key plus
//!   `ON CONFLICT DO NOTHING`: under concurrent creates with the same name,
//!   exactly one insert wins and the others report a conflict. There is no
//!   read-then-write window.
//! - Status transitions are compare-and-set (`WHERE status = $expected`), so
//!   racing transitions cannot skip lifecycle states.
//!
//! # Operational notes
//! - Migrations run at startup via `sqlx::migrate!("./migrations")`; if they
//!   fail we fail startup rather than serving a partially functional engine.
//! - Connection pooling/timeouts are explicitly configured because hanging
//!   forever on DB failures is unacceptable for an authorization service
//!   that must fail closed, not stall open.
//! - Database URLs may contain credentials; avoid logging them.
//! - Ledger retention is a multi-year, regulation-driven policy executed by
//!   an external process with its own DB privileges; this service never
//!   deletes audit rows.
use super::{GatekeeperStore, StoreConfig, StoreError, StoreResult};
use crate::config::PostgresConfig;
use crate::model::{AuditEntry, AuditFilter, NamespaceRecord, NamespaceStatus, NewAuditEntry};
use argus_authz::{Action, DenyKind, Outcome, Role, RuleSet};
use async_trait::async_trait;
use chrono::{DateTime, Utc};
use serde_json::Value;
use sqlx::postgres::{PgConnectOptions, PgPoolOptions};
use sqlx::{FromRow, PgPool};
use std::str::FromStr;
use std::time::Duration;

/// Durable gatekeeper store backed by Postgres.
pub struct PostgresStore {
    pool: PgPool,
    config: StoreConfig,
}

/// Row shape for the `namespaces` table.
///
/// DB-facing structs are kept separate from domain types so schema details
/// (column names, string enums) stay localized to this module.
#[derive(Debug, Clone, FromRow)]
struct DbNamespace {
    name: String,
    business_unit: String,
    region: String,
    status: String,
    created_by: String,
    created_at: DateTime<Utc>,
}

/// Row shape for the `audit_entries` table.
#[derive(Debug, Clone, FromRow)]
struct DbAuditEntry {
    seq: i64,
    decided_at: DateTime<Utc>,
    principal_id: String,
    role: String,
    action: String,
    namespace: String,
    classification: String,
    outcome: String,
    basis: Value,
    deny_kind: Option<String>,
    reason: Option<String>,
    broad_access: bool,
    policy_version: String,
    network_origin: Option<String>,
    device_managed: bool,
    device_encrypted: bool,
}

impl PostgresStore {
    /// Connect to Postgres and run migrations.
    pub async fn connect(pg: &PostgresConfig, config: StoreConfig) -> StoreResult<Self> {
        Self::connect_internal(pg, config, true).await
    }

    /// Connect without applying migrations. For tests that manage the schema
    /// externally.
    #[cfg(any(test, feature = "pg-tests"))]
    pub async fn connect_without_migrations(
        pg: &PostgresConfig,
        config: StoreConfig,
    ) -> StoreResult<Self> {
        Self::connect_internal(pg, config, false).await
    }

    async fn connect_internal(
        pg: &PostgresConfig,
        config: StoreConfig,
        run_migrations: bool,
    ) -> StoreResult<Self> {
        // `acquire_timeout` bounds how long a request waits for a pooled
        // connection before failing fast; a stalled pool must become a
        // ServiceUnavailable denial upstream, never a hang.
        let connect_options = PgConnectOptions::from_str(&pg.url)?;
        let pool = PgPoolOptions::new()
            .max_connections(pg.max_connections)
            .acquire_timeout(Duration::from_millis(pg.acquire_timeout_ms))
            .connect_with(connect_options)
            .await?;

        if run_migrations {
            sqlx::migrate!("./migrations").run(&pool).await?;
        }

        Ok(Self { pool, config })
    }
}

#[async_trait]
impl GatekeeperStore for PostgresStore {
    async fn create_namespace(&self, record: NamespaceRecord) -> StoreResult<NamespaceRecord> {
        // `ON CONFLICT DO NOTHING` makes creation race-safe: the uniqueness
        // decision happens inside Postgres, not in a read-then-write window.
        let result = sqlx::query(
            r#"INSERT INTO namespaces (name, business_unit, region, status, created_by, created_at)
               VALUES ($1, $2, $3, $4, $5, $6)
               ON CONFLICT (name) DO NOTHING"#,
        )
        .bind(&record.name)
        .bind(&record.business_unit)
        .bind(&record.region)
        .bind(record.status.as_str())
        .bind(&record.created_by)
        .bind(record.created_at)
        .execute(&self.pool)
        .await?;

        if result.rows_affected() == 0 {
            return Err(StoreError::Conflict("namespace exists".into()));
        }
        metrics::counter!("argus_namespace_creates_total").increment(1);
        Ok(record)
    }

    async fn get_namespace(&self, name: &str) -> StoreResult<NamespaceRecord> {
        let row = sqlx::query_as::<_, DbNamespace>(
            r#"SELECT name, business_unit, region, status, created_by, created_at
               FROM namespaces WHERE name = $1"#,
        )
        .bind(name)
        .fetch_optional(&self.pool)
        .await?
        .ok_or_else(|| StoreError::NotFound("namespace".into()))?;
        namespace_from_db(row)
    }

    async fn list_namespaces(
        &self,
        business_unit: Option<&str>,
    ) -> StoreResult<Vec<NamespaceRecord>> {
        let rows = sqlx::query_as::<_, DbNamespace>(
            r#"SELECT name, business_unit, region, status, created_by, created_at
               FROM namespaces
               WHERE ($1::text IS NULL OR business_unit = $1)
               ORDER BY name"#,
        )
        .bind(business_unit)
        .fetch_all(&self.pool)
        .await?;
        rows.into_iter().map(namespace_from_db).collect()
    }

    async fn update_namespace_status(
        &self,
        name: &str,
        from: NamespaceStatus,
        to: NamespaceStatus,
    ) -> StoreResult<NamespaceRecord> {
        // Compare-and-set: the row is updated only if the stored status still
        // matches the caller's expectation.
        let updated = sqlx::query_as::<_, DbNamespace>(
            r#"UPDATE namespaces SET status = $3
               WHERE name = $1 AND status = $2
               RETURNING name, business_unit, region, status, created_by, created_at"#,
        )
        .bind(name)
        .bind(from.as_str())
        .bind(to.as_str())
        .fetch_optional(&self.pool)
        .await?;

        match updated {
            Some(row) => namespace_from_db(row),
            None => {
                let exists = self.namespace_exists(name).await?;
                if exists {
                    Err(StoreError::Conflict(format!(
                        "namespace status changed concurrently, expected {from}"
                    )))
                } else {
                    Err(StoreError::NotFound("namespace".into()))
                }
            }
        }
    }

    async fn namespace_exists(&self, name: &str) -> StoreResult<bool> {
        let count =
            sqlx::query_scalar::<_, i64>("SELECT COUNT(*) FROM namespaces WHERE name = $1")
                .bind(name)
                .fetch_one(&self.pool)
                .await?;
        Ok(count > 0)
    }

    async fn append_audit(&self, entry: NewAuditEntry) -> StoreResult<u64> {
        let seq = sqlx::query_scalar::<_, i64>(
            r#"INSERT INTO audit_entries
               (decided_at, principal_id, role, action, namespace, classification,
                outcome, basis, deny_kind, reason, broad_access, policy_version,
                network_origin, device_managed, device_encrypted)
               VALUES ($1, $2, $3, $4, $5, $6, $7, $8, $9, $10, $11, $12, $13, $14, $15)
               RETURNING seq"#,
        )
        .bind(entry.decided_at)
        .bind(&entry.principal_id)
        .bind(entry.role.as_str())
        .bind(entry.action.as_str())
        .bind(&entry.namespace)
        .bind(&entry.classification)
        .bind(outcome_str(entry.outcome))
        .bind(serde_json::to_value(&entry.basis).unwrap_or(Value::Null))
        .bind(entry.deny_kind.map(deny_kind_str))
        .bind(&entry.reason)
        .bind(entry.broad_access)
        .bind(&entry.policy_version)
        .bind(&entry.network_origin)
        .bind(entry.device_managed)
        .bind(entry.device_encrypted)
        .fetch_one(&self.pool)
        .await?;
        Ok(seq as u64)
    }

    async fn query_audit(&self, filter: &AuditFilter) -> StoreResult<Vec<AuditEntry>> {
        let limit = if filter.limit == 0 {
            self.config.audit_query_limit as i64
        } else {
            (filter.limit as i64).min(self.config.audit_query_limit as i64)
        };
        let rows = sqlx::query_as::<_, DbAuditEntry>(
            r#"SELECT seq, decided_at, principal_id, role, action, namespace, classification,
                      outcome, basis, deny_kind, reason, broad_access, policy_version,
                      network_origin, device_managed, device_encrypted
               FROM audit_entries
               WHERE ($1::text IS NULL OR namespace = $1)
                 AND ($2::text IS NULL OR principal_id = $2)
                 AND ($3::text IS NULL OR outcome = $3)
                 AND (NOT $4 OR broad_access)
                 AND ($5::timestamptz IS NULL OR decided_at >= $5)
                 AND ($6::timestamptz IS NULL OR decided_at < $6)
               ORDER BY seq
               LIMIT $7"#,
        )
        .bind(&filter.namespace)
        .bind(&filter.principal_id)
        .bind(filter.outcome.map(outcome_str))
        .bind(filter.broad_access_only)
        .bind(filter.from)
        .bind(filter.to)
        .bind(limit)
        .fetch_all(&self.pool)
        .await?;
        rows.into_iter().map(audit_entry_from_db).collect()
    }

    async fn load_rule_set(&self) -> StoreResult<Option<RuleSet>> {
        let document = sqlx::query_scalar::<_, Value>(
            "SELECT document FROM policy_rule_sets ORDER BY id DESC LIMIT 1",
        )
        .fetch_optional(&self.pool)
        .await?;
        match document {
            Some(value) => {
                let rules: RuleSet = serde_json::from_value(value)
                    .map_err(|err| StoreError::Unexpected(err.into()))?;
                Ok(Some(rules))
            }
            None => Ok(None),
        }
    }

    async fn store_rule_set(&self, rules: &RuleSet) -> StoreResult<()> {
        let document =
            serde_json::to_value(rules).map_err(|err| StoreError::Unexpected(err.into()))?;
        let insert = sqlx::query(
            "INSERT INTO policy_rule_sets (version, document) VALUES ($1, $2)",
        )
        .bind(&rules.version)
        .bind(document)
        .execute(&self.pool)
        .await;
        if let Err(err) = insert {
            if is_unique_violation(&err) {
                return Err(StoreError::Conflict(format!(
                    "rule set version {} already installed",
                    rules.version
                )));
            }
            return Err(StoreError::Unexpected(err.into()));
        }
        Ok(())
    }

    async fn health_check(&self) -> StoreResult<()> {
        sqlx::query_scalar::<_, i32>("SELECT 1")
            .fetch_one(&self.pool)
            .await?;
        Ok(())
    }

    fn is_durable(&self) -> bool {
        true
    }

    fn backend_name(&self) -> &'static str {
        "postgres"
    }
}

fn is_unique_violation(err: &sqlx::Error) -> bool {
    if let sqlx::Error::Database(db_err) = err {
        return db_err.code().map(|code| code == "23505").unwrap_or(false);
    }
    false
}

fn namespace_from_db(row: DbNamespace) -> StoreResult<NamespaceRecord> {
    let status = NamespaceStatus::from_str(&row.status)
        .map_err(|_| StoreError::Unexpected(anyhow::anyhow!("bad status: {}", row.status)))?;
    Ok(NamespaceRecord {
        name: row.name,
        business_unit: row.business_unit,
        region: row.region,
        status,
        created_by: row.created_by,
        created_at: row.created_at,
    })
}

fn audit_entry_from_db(row: DbAuditEntry) -> StoreResult<AuditEntry> {
    let role = Role::from_str(&row.role)
        .map_err(|_| StoreError::Unexpected(anyhow::anyhow!("bad role: {}", row.role)))?;
    let action = Action::from_str(&row.action)
        .map_err(|_| StoreError::Unexpected(anyhow::anyhow!("bad action: {}", row.action)))?;
    let outcome = parse_outcome(&row.outcome)?;
    let basis = serde_json::from_value(row.basis)
        .map_err(|err| StoreError::Unexpected(err.into()))?;
    let deny_kind = row.deny_kind.as_deref().map(parse_deny_kind).transpose()?;
    Ok(AuditEntry {
        seq: row.seq as u64,
        decided_at: row.decided_at,
        principal_id: row.principal_id,
        role,
        action,
        namespace: row.namespace,
        classification: row.classification,
        outcome,
        basis,
        deny_kind,
        reason: row.reason,
        broad_access: row.broad_access,
        policy_version: row.policy_version,
        network_origin: row.network_origin,
        device_managed: row.device_managed,
        device_encrypted: row.device_encrypted,
    })
}

fn outcome_str(outcome: Outcome) -> &'static str {
    match outcome {
        Outcome::Allow => "allow",
        Outcome::Deny => "deny",
    }
}

fn parse_outcome(value: &str) -> StoreResult<Outcome> {
    match value {
        "allow" => Ok(Outcome::Allow),
        "deny" => Ok(Outcome::Deny),
        other => Err(StoreError::Unexpected(anyhow::anyhow!(
            "bad outcome: {other}"
        ))),
    }
}

fn deny_kind_str(kind: DenyKind) -> &'static str {
    match kind {
        DenyKind::NamespaceUnavailable => "namespace_unavailable",
        DenyKind::PermissionDenied => "permission_denied",
        DenyKind::NamespaceMismatch => "namespace_mismatch",
        DenyKind::PolicyDenied => "policy_denied",
        DenyKind::ServiceUnavailable => "service_unavailable",
    }
}

fn parse_deny_kind(value: &str) -> StoreResult<DenyKind> {
    match value {
        "namespace_unavailable" => Ok(DenyKind::NamespaceUnavailable),
        "permission_denied" => Ok(DenyKind::PermissionDenied),
        "namespace_mismatch" => Ok(DenyKind::NamespaceMismatch),
        "policy_denied" => Ok(DenyKind::PolicyDenied),
        "service_unavailable" => Ok(DenyKind::ServiceUnavailable),
        other => Err(StoreError::Unexpected(anyhow::anyhow!(
            "bad deny kind: {other}"
        ))),
    }
}
