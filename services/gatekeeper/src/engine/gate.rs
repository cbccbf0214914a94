//! Authorization coordinator: the single mandatory gate.
//!
//! # Purpose
//! Chains the namespace registry, the role table, the policy engine, and the
//! audit ledger into one `authorize` call. Every data-access path in front
//! of the retrieval system goes through here; there is no second door.
//!
//! # Pipeline
//! 1. Resolve the target namespace and apply the status gate.
//! 2. Check the identity's role against the fixed permission table.
//! 3. Validate namespace access (operators never leave their own namespace).
//! 4. Evaluate attribute-based rules under a strict latency budget.
//! 5. Durably append the decision to the audit ledger.
//! 6. Return the decision.
//!
//! No step after a deny is reachable: each check returns early. Failures of
//! the engine itself (policy timeout, ledger down) are not denials by
//! policy — they surface as `GateError` so operators can tell an outage from
//! a refusal — but the caller must still treat them as denied.
use super::namespaces::{AccessScope, NamespaceManager};
use super::policy::PolicyEvaluator;
use super::{AuditLedger, GateError};
use crate::model::NewAuditEntry;
use crate::store::StoreError;
use argus_authz::{
    AuthorizationRequest, BusinessUnit, Decision, DecisionBasis, DenyKind, ResourceAttributes,
    has_permission, permission_for_action,
};
use std::sync::Arc;
use std::time::{Duration, Instant};

pub struct Gate {
    namespaces: Arc<NamespaceManager>,
    evaluator: Arc<dyn PolicyEvaluator>,
    ledger: Arc<AuditLedger>,
    policy_budget: Duration,
}

impl Gate {
    pub fn new(
        namespaces: Arc<NamespaceManager>,
        evaluator: Arc<dyn PolicyEvaluator>,
        ledger: Arc<AuditLedger>,
        policy_budget: Duration,
    ) -> Self {
        Self {
            namespaces,
            evaluator,
            ledger,
            policy_budget,
        }
    }

    /// Decide one request. `Ok(decision)` may be an allow or a recorded
    /// deny; `Err` means the engine could not decide or could not record,
    /// and the caller must treat the request as denied.
    pub async fn authorize(
        &self,
        request: &AuthorizationRequest,
    ) -> Result<Decision, GateError> {
        let started = Instant::now();
        let policy_version = self.evaluator.active_version().await;
        let own = request.targets_own_namespace();

        // Step 1: resolve the target and apply the status gate.
        let resource = if request.action.requires_existing_namespace() {
            match self.namespaces.resolve(request.namespace.as_str()).await {
                Ok(record) => {
                    if !record.status.permits(request.action.access_kind()) {
                        let decision = Decision::deny(
                            DecisionBasis::NamespaceGuard,
                            DenyKind::NamespaceUnavailable,
                            format!(
                                "namespace {} is {} and does not accept {}",
                                record.name, record.status, request.action
                            ),
                            !own,
                            policy_version,
                        );
                        return self.finish(request, decision, started).await;
                    }
                    ResourceAttributes {
                        namespace: request.namespace.clone(),
                        business_unit: BusinessUnit::new(record.business_unit),
                        region: record.region,
                    }
                }
                Err(StoreError::NotFound(_)) => {
                    let decision = Decision::deny(
                        DecisionBasis::NamespaceGuard,
                        DenyKind::NamespaceUnavailable,
                        format!("namespace {} not found", request.namespace),
                        !own,
                        policy_version,
                    );
                    return self.finish(request, decision, started).await;
                }
                Err(err) => {
                    return self
                        .unavailable(
                            request,
                            policy_version,
                            format!("namespace registry error: {err}"),
                            started,
                        )
                        .await;
                }
            }
        } else {
            // Creation targets a name that does not exist yet, and a policy
            // reload is not addressed to tenant data; rules still see the
            // requested name and the identity's own region.
            ResourceAttributes {
                namespace: request.namespace.clone(),
                business_unit: BusinessUnit::new(derive_business_unit(
                    request.namespace.as_str(),
                )),
                region: request.identity.region.clone(),
            }
        };

        // Step 2: fixed role→permission table, against the base capability
        // the action implies. Whether the caller may point it across
        // namespaces is step 3's question, so an operator aiming at a
        // foreign namespace is refused there with the precise reason.
        let permission = permission_for_action(request.action, true);
        if !has_permission(request.identity.role, permission) {
            let decision = Decision::deny(
                DecisionBasis::RoleCheck,
                DenyKind::PermissionDenied,
                format!(
                    "role {} lacks permission {}",
                    request.identity.role, permission
                ),
                !own,
                policy_version,
            );
            return self.finish(request, decision, started).await;
        }

        // Step 3: namespace access validation. The operator's target is
        // derived from identity; any mismatch is refused here. A broad
        // scope additionally requires the cross-namespace variant of the
        // permission where one exists.
        let broad = match self
            .namespaces
            .access_scope(&request.identity, &request.namespace)
        {
            Ok(AccessScope::Home) => false,
            Ok(AccessScope::Broad) => {
                let cross = permission_for_action(request.action, false);
                if !has_permission(request.identity.role, cross) {
                    let decision = Decision::deny(
                        DecisionBasis::RoleCheck,
                        DenyKind::PermissionDenied,
                        format!(
                            "role {} lacks permission {}",
                            request.identity.role, cross
                        ),
                        true,
                        policy_version,
                    );
                    return self.finish(request, decision, started).await;
                }
                true
            }
            Err(reason) => {
                let decision = Decision::deny(
                    DecisionBasis::AccessValidation,
                    DenyKind::NamespaceMismatch,
                    reason,
                    !own,
                    policy_version,
                );
                return self.finish(request, decision, started).await;
            }
        };

        // Step 4: attribute-based rules under a strict budget. Overrunning
        // the budget is engine unavailability, never an implicit allow.
        let evaluation = match tokio::time::timeout(
            self.policy_budget,
            self.evaluator.evaluate(request, &resource),
        )
        .await
        {
            Ok(Ok(evaluation)) => evaluation,
            Ok(Err(err)) => {
                return self
                    .unavailable(
                        request,
                        policy_version,
                        format!("policy engine error: {err}"),
                        started,
                    )
                    .await;
            }
            Err(_) => {
                return self
                    .unavailable(
                        request,
                        policy_version,
                        format!(
                            "policy evaluation exceeded {}ms budget",
                            self.policy_budget.as_millis()
                        ),
                        started,
                    )
                    .await;
            }
        };

        let decision = match (evaluation.allowed, evaluation.matched) {
            (true, Some(id)) => {
                Decision::allow(DecisionBasis::Rule { id }, broad, policy_version)
            }
            // An allow must name the rule that produced it; anything else
            // from an evaluator fails closed.
            (true, None) => Decision::deny(
                DecisionBasis::DefaultDeny,
                DenyKind::PolicyDenied,
                "evaluator returned an allow without a matching rule",
                broad,
                policy_version,
            ),
            (false, Some(id)) => {
                let reason = format!("denied by policy rule {id}");
                Decision::deny(
                    DecisionBasis::Rule { id },
                    DenyKind::PolicyDenied,
                    reason,
                    broad,
                    policy_version,
                )
            }
            (false, None) => Decision::deny(
                DecisionBasis::DefaultDeny,
                DenyKind::PolicyDenied,
                "no policy rule matched",
                broad,
                policy_version,
            ),
        };

        // Steps 5–6: record, then return.
        self.finish(request, decision, started).await
    }

    /// Append the decision to the ledger and hand it back. An append failure
    /// is fatal: an unrecorded allow is unauditable, so the request is
    /// denied regardless of what was decided.
    async fn finish(
        &self,
        request: &AuthorizationRequest,
        decision: Decision,
        started: Instant,
    ) -> Result<Decision, GateError> {
        self.ledger.record(entry_for(request, &decision)).await?;
        observe(request, &decision, started);
        Ok(decision)
    }

    /// Fail closed on engine unavailability: record a deny best-effort and
    /// surface the distinct error.
    async fn unavailable(
        &self,
        request: &AuthorizationRequest,
        policy_version: String,
        message: String,
        started: Instant,
    ) -> Result<Decision, GateError> {
        tracing::error!(
            principal = %request.identity.principal_id,
            namespace = %request.namespace,
            action = %request.action,
            error = %message,
            "authorization service unavailable; failing closed"
        );
        let decision = Decision::deny(
            DecisionBasis::EngineFailure,
            DenyKind::ServiceUnavailable,
            message.clone(),
            !request.targets_own_namespace(),
            policy_version,
        );
        // Best effort: when the same outage also takes the ledger down the
        // entry is lost, but the caller still gets a closed failure.
        let _ = self.ledger.record(entry_for(request, &decision)).await;
        observe(request, &decision, started);
        Err(GateError::Unavailable(message))
    }
}

fn entry_for(request: &AuthorizationRequest, decision: &Decision) -> NewAuditEntry {
    NewAuditEntry {
        decided_at: decision.decided_at,
        principal_id: request.identity.principal_id.to_string(),
        role: request.identity.role,
        action: request.action,
        namespace: request.namespace.to_string(),
        classification: request.classification.as_str().to_string(),
        outcome: decision.outcome,
        basis: decision.basis.clone(),
        deny_kind: decision.deny_kind,
        reason: decision.reason.clone(),
        broad_access: decision.broad_access,
        policy_version: decision.policy_version.clone(),
        network_origin: request.environment.network_origin.clone(),
        device_managed: request.identity.device.managed,
        device_encrypted: request.identity.device.encrypted,
    }
}

fn observe(request: &AuthorizationRequest, decision: &Decision, started: Instant) {
    let outcome = if decision.is_allowed() { "allow" } else { "deny" };
    metrics::counter!("argus_decisions_total", "outcome" => outcome).increment(1);
    if let Some(kind) = decision.deny_kind {
        let kind = match kind {
            DenyKind::NamespaceUnavailable => "namespace_unavailable",
            DenyKind::PermissionDenied => "permission_denied",
            DenyKind::NamespaceMismatch => "namespace_mismatch",
            DenyKind::PolicyDenied => "policy_denied",
            DenyKind::ServiceUnavailable => "service_unavailable",
        };
        metrics::counter!("argus_denials_total", "kind" => kind).increment(1);
        tracing::info!(
            principal = %request.identity.principal_id,
            namespace = %request.namespace,
            action = %request.action,
            kind,
            reason = decision.reason.as_deref().unwrap_or_default(),
            "request denied"
        );
    }
    if decision.broad_access {
        metrics::counter!("argus_broad_access_total").increment(1);
    }
    metrics::histogram!("argus_authorize_duration_seconds")
        .record(started.elapsed().as_secs_f64());
}

fn derive_business_unit(namespace: &str) -> String {
    namespace
        .rsplit_once('-')
        .map(|(unit, _)| unit)
        .unwrap_or(namespace)
        .to_string()
}
