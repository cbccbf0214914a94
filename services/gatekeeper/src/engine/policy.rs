//! Policy engine: versioned rule sets with atomic hot reload.
//!
//! # Purpose
//! Holds the active rule set and evaluates requests against it. The rule set
//! is replaced wholesale on reload — readers clone the `Arc` under a read
//! lock and evaluate against that snapshot, so a concurrent reload can never
//! expose a partially updated rule set.
//!
//! # Key invariants
//! - A rule set is validated before it becomes active; an invalid upload
//!   leaves the previous set in place.
//! - Evaluation itself is the pure `argus_authz::evaluate`; everything
//!   stateful lives behind this handle.
use argus_authz::{
    AuthorizationRequest, AuthzResult, Evaluation, ResourceAttributes, RuleSet, evaluate,
};
use async_trait::async_trait;
use std::sync::Arc;
use tokio::sync::RwLock;

/// The seam the coordinator evaluates through. An out-of-process rule engine
/// would implement this with a network client; the in-process engine below is
/// the default. Either way the coordinator wraps the call in a strict budget
/// and fails closed on overrun.
#[async_trait]
pub trait PolicyEvaluator: Send + Sync {
    async fn evaluate(
        &self,
        request: &AuthorizationRequest,
        resource: &ResourceAttributes,
    ) -> anyhow::Result<Evaluation>;

    /// Version of the currently active rule set, stamped into decisions.
    async fn active_version(&self) -> String;
}

/// In-process policy engine over an atomically swappable rule set.
pub struct LocalPolicyEngine {
    active: RwLock<Arc<RuleSet>>,
}

impl LocalPolicyEngine {
    pub fn new(initial: RuleSet) -> Self {
        Self {
            active: RwLock::new(Arc::new(initial)),
        }
    }

    /// Validate and atomically activate a new rule set. Returns the version
    /// that was replaced.
    pub async fn reload(&self, rules: RuleSet) -> AuthzResult<String> {
        rules.validate()?;
        let mut active = self.active.write().await;
        let previous = active.version.clone();
        *active = Arc::new(rules);
        metrics::counter!("argus_policy_reloads_total").increment(1);
        tracing::info!(previous = %previous, active = %active.version, "policy rule set reloaded");
        Ok(previous)
    }

    /// Snapshot of the active rule set for admin reads.
    pub async fn snapshot(&self) -> Arc<RuleSet> {
        self.active.read().await.clone()
    }
}

#[async_trait]
impl PolicyEvaluator for LocalPolicyEngine {
    async fn evaluate(
        &self,
        request: &AuthorizationRequest,
        resource: &ResourceAttributes,
    ) -> anyhow::Result<Evaluation> {
        // Clone the Arc and drop the lock before evaluating: the evaluation
        // sees one consistent rule set for its entire walk.
        let rules = self.active.read().await.clone();
        Ok(evaluate(&rules, request, resource))
    }

    async fn active_version(&self) -> String {
        self.active.read().await.version.clone()
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use argus_authz::{
        Action, AuthzError, DeviceTrust, Effect, EnvironmentSnapshot, Identity, NamespaceMatch,
        NamespaceName, PolicyRule, PrincipalId, ResourceClassification, Role, RuleId,
        BusinessUnit,
    };

    fn request() -> AuthorizationRequest {
        AuthorizationRequest {
            identity: Identity {
                principal_id: PrincipalId::new("u-1"),
                role: Role::Operator,
                namespace: NamespaceName::new("hr-prod"),
                region: "eu-west".to_string(),
                device: DeviceTrust::default(),
            },
            action: Action::Query,
            namespace: NamespaceName::new("hr-prod"),
            classification: ResourceClassification::Internal,
            environment: EnvironmentSnapshot::now(),
        }
    }

    fn resource() -> ResourceAttributes {
        ResourceAttributes {
            namespace: NamespaceName::new("hr-prod"),
            business_unit: BusinessUnit::new("hr"),
            region: "eu-west".to_string(),
        }
    }

    fn allow_home_rule() -> PolicyRule {
        PolicyRule {
            id: RuleId::new("allow-home"),
            description: String::new(),
            effect: Effect::Allow,
            roles: Vec::new(),
            namespace: NamespaceMatch::Home,
            actions: Vec::new(),
            classifications: Vec::new(),
            window: None,
            require_location_match: false,
            device: None,
        }
    }

    #[tokio::test]
    async fn reload_round_trip_changes_the_same_request() {
        let engine = LocalPolicyEngine::new(RuleSet::empty("v0"));
        let request = request();
        let resource = resource();

        let before = engine.evaluate(&request, &resource).await.expect("evaluate");
        assert!(!before.allowed);

        engine
            .reload(RuleSet {
                version: "v1".to_string(),
                rules: vec![allow_home_rule()],
            })
            .await
            .expect("reload");
        let during = engine.evaluate(&request, &resource).await.expect("evaluate");
        assert!(during.allowed);
        assert_eq!(engine.active_version().await, "v1");

        // Removing the rule again restores the denial.
        engine.reload(RuleSet::empty("v2")).await.expect("reload");
        let after = engine.evaluate(&request, &resource).await.expect("evaluate");
        assert!(!after.allowed);
    }

    #[tokio::test]
    async fn invalid_rule_set_leaves_active_set_untouched() {
        let engine = LocalPolicyEngine::new(RuleSet::empty("v0"));
        let invalid = RuleSet {
            version: "v1".to_string(),
            rules: vec![allow_home_rule(), allow_home_rule()],
        };
        let err = engine.reload(invalid).await.expect_err("duplicate ids");
        assert!(matches!(err, AuthzError::DuplicateRuleId(_)));
        assert_eq!(engine.active_version().await, "v0");
    }

    #[tokio::test]
    async fn concurrent_readers_see_whole_rule_sets() {
        let engine = Arc::new(LocalPolicyEngine::new(RuleSet::empty("v0")));
        let request = request();
        let resource = resource();

        let mut readers = Vec::new();
        for _ in 0..8 {
            let engine = engine.clone();
            let request = request.clone();
            let resource = resource.clone();
            readers.push(tokio::spawn(async move {
                for _ in 0..50 {
                    let evaluation = engine.evaluate(&request, &resource).await.expect("evaluate");
                    // Either the empty set (deny) or the reloaded set
                    // (allow via the home rule); never anything else.
                    if evaluation.allowed {
                        assert_eq!(evaluation.matched, Some(RuleId::new("allow-home")));
                    } else {
                        assert_eq!(evaluation.matched, None);
                    }
                }
            }));
        }

        let writer = {
            let engine = engine.clone();
            tokio::spawn(async move {
                for generation in 1..10u32 {
                    let rules = if generation % 2 == 0 {
                        RuleSet::empty(format!("v{generation}"))
                    } else {
                        RuleSet {
                            version: format!("v{generation}"),
                            rules: vec![allow_home_rule()],
                        }
                    };
                    engine.reload(rules).await.expect("reload");
                }
            })
        };

        for reader in readers {
            reader.await.expect("reader");
        }
        writer.await.expect("writer");
    }
}
