//! Audit ledger: every decision is durably recorded or the request fails.
//!
//! # Purpose
//! Thin layer over the store's append-only audit surface that adds the
//! write timeout and the fail-closed semantics: an append that errors or
//! exceeds its deadline becomes `GateError::AuditWriteFailed`, which the
//! coordinator treats as a denial of the surrounding request.
//!
//! # Key invariants
//! - There is no update or delete here, mirroring the store trait; the
//!   Postgres backend additionally rejects rewrites at the storage layer.
//! - Appends are independently durable; sequence numbers come back from the
//!   store and are monotonically increasing.
use super::GateError;
use crate::model::{AuditEntry, AuditFilter, NewAuditEntry};
use crate::store::{GatekeeperStore, StoreResult};
use std::sync::Arc;
use std::time::Duration;

pub struct AuditLedger {
    store: Arc<dyn GatekeeperStore>,
    append_timeout: Duration,
}

impl AuditLedger {
    pub fn new(store: Arc<dyn GatekeeperStore>, append_timeout: Duration) -> Self {
        Self {
            store,
            append_timeout,
        }
    }

    /// Durably record one decision. Timeouts and store failures surface as
    /// `AuditWriteFailed`; the caller must not report success past this.
    pub async fn record(&self, entry: NewAuditEntry) -> Result<u64, GateError> {
        let append = self.store.append_audit(entry);
        match tokio::time::timeout(self.append_timeout, append).await {
            Ok(Ok(seq)) => {
                metrics::counter!("argus_audit_appends_total").increment(1);
                Ok(seq)
            }
            Ok(Err(err)) => {
                metrics::counter!("argus_audit_append_failures_total").increment(1);
                tracing::error!(error = %err, "audit ledger append failed");
                Err(GateError::AuditWriteFailed(err.to_string()))
            }
            Err(_) => {
                metrics::counter!("argus_audit_append_failures_total").increment(1);
                tracing::error!(
                    timeout_ms = self.append_timeout.as_millis() as u64,
                    "audit ledger append timed out"
                );
                Err(GateError::AuditWriteFailed("append timed out".to_string()))
            }
        }
    }

    /// Compliance query over recorded entries. Read-only; the HTTP layer
    /// gates it on the Auditor role and the access itself is logged.
    pub async fn query(&self, filter: &AuditFilter) -> StoreResult<Vec<AuditEntry>> {
        self.store.query_audit(filter).await
    }
}
