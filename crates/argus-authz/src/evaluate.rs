//! Pure, ordered rule evaluation.
//!
//! # Purpose
//! Turns an authorization request plus resolved resource attributes into an
//! allow/deny outcome by walking the active rule set in order.
//!
//! # Key invariants
//! - Evaluation is deterministic: same rule set, same request, same result.
//! - The first matching rule decides; later rules are never consulted.
//! - No rule matching the request is a denial, never an allow.
use crate::identity::AuthorizationRequest;
use crate::rule::{Effect, NamespaceMatch, PolicyRule, RuleId, RuleSet};
use crate::types::{BusinessUnit, NamespaceName};

/// Attributes of the resolved target resource consulted by rules.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct ResourceAttributes {
    pub namespace: NamespaceName,
    pub business_unit: BusinessUnit,
    pub region: String,
}

/// Outcome of one evaluation pass.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct Evaluation {
    pub allowed: bool,
    /// The rule that decided, or `None` for the default deny.
    pub matched: Option<RuleId>,
}

impl Evaluation {
    pub fn default_deny() -> Self {
        Self {
            allowed: false,
            matched: None,
        }
    }
}

/// Evaluate `request` against `rules` in declared order.
pub fn evaluate(
    rules: &RuleSet,
    request: &AuthorizationRequest,
    resource: &ResourceAttributes,
) -> Evaluation {
    for rule in &rules.rules {
        if rule_matches(rule, request, resource) {
            return Evaluation {
                allowed: rule.effect == Effect::Allow,
                matched: Some(rule.id.clone()),
            };
        }
    }
    Evaluation::default_deny()
}

fn rule_matches(
    rule: &PolicyRule,
    request: &AuthorizationRequest,
    resource: &ResourceAttributes,
) -> bool {
    if !rule.roles.is_empty() && !rule.roles.contains(&request.identity.role) {
        return false;
    }

    match &rule.namespace {
        NamespaceMatch::Any => {}
        NamespaceMatch::Home => {
            if !request.targets_own_namespace() {
                return false;
            }
        }
        NamespaceMatch::Named { name } => {
            if request.namespace != *name {
                return false;
            }
        }
    }

    if !rule.actions.is_empty() && !rule.actions.contains(&request.action) {
        return false;
    }

    if !rule.classifications.is_empty()
        && !rule.classifications.contains(&request.classification)
    {
        return false;
    }

    if let Some(window) = &rule.window
        && !window.contains(request.environment.timestamp)
    {
        return false;
    }

    if rule.require_location_match && request.identity.region != resource.region {
        return false;
    }

    if let Some(device) = &rule.device {
        if let Some(managed) = device.managed
            && request.identity.device.managed != managed
        {
            return false;
        }
        if let Some(encrypted) = device.encrypted
            && request.identity.device.encrypted != encrypted
        {
            return false;
        }
    }

    true
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::action::Action;
    use crate::identity::{
        DeviceTrust, EnvironmentSnapshot, Identity, ResourceClassification,
    };
    use crate::role::Role;
    use crate::rule::{DeviceRequirement, TimeWindow, Weekday};
    use crate::types::PrincipalId;
    use chrono::{NaiveTime, TimeZone, Utc};

    fn request(role: Role, target: &str) -> AuthorizationRequest {
        AuthorizationRequest {
            identity: Identity {
                principal_id: PrincipalId::new("u-1"),
                role,
                namespace: NamespaceName::new("hr-prod"),
                region: "eu-west".to_string(),
                device: DeviceTrust {
                    managed: true,
                    encrypted: true,
                },
            },
            action: Action::Query,
            namespace: NamespaceName::new(target),
            classification: ResourceClassification::Internal,
            environment: EnvironmentSnapshot {
                // 2026-01-05 is a Monday.
                timestamp: Utc.with_ymd_and_hms(2026, 1, 5, 12, 0, 0).unwrap(),
                network_origin: None,
            },
        }
    }

    fn resource(namespace: &str, region: &str) -> ResourceAttributes {
        ResourceAttributes {
            namespace: NamespaceName::new(namespace),
            business_unit: BusinessUnit::new("hr"),
            region: region.to_string(),
        }
    }

    fn rule(id: &str, effect: Effect) -> PolicyRule {
        PolicyRule {
            id: RuleId::new(id),
            description: String::new(),
            effect,
            roles: Vec::new(),
            namespace: NamespaceMatch::Any,
            actions: Vec::new(),
            classifications: Vec::new(),
            window: None,
            require_location_match: false,
            device: None,
        }
    }

    #[test]
    fn no_matching_rule_is_a_deny() {
        let rules = RuleSet::empty("v1");
        let evaluation = evaluate(&rules, &request(Role::Operator, "hr-prod"), &resource("hr-prod", "eu-west"));
        assert!(!evaluation.allowed);
        assert_eq!(evaluation.matched, None);
    }

    #[test]
    fn first_matching_rule_wins() {
        let mut deny = rule("deny-all", Effect::Deny);
        deny.roles = vec![Role::Operator];
        let allow = rule("allow-all", Effect::Allow);
        let rules = RuleSet {
            version: "v1".to_string(),
            rules: vec![deny, allow],
        };

        let operator = evaluate(&rules, &request(Role::Operator, "hr-prod"), &resource("hr-prod", "eu-west"));
        assert!(!operator.allowed);
        assert_eq!(operator.matched, Some(RuleId::new("deny-all")));

        let auditor = evaluate(&rules, &request(Role::Auditor, "hr-prod"), &resource("hr-prod", "eu-west"));
        assert!(auditor.allowed);
        assert_eq!(auditor.matched, Some(RuleId::new("allow-all")));
    }

    #[test]
    fn home_namespace_match_rejects_cross_target() {
        let mut allow = rule("allow-home", Effect::Allow);
        allow.namespace = NamespaceMatch::Home;
        let rules = RuleSet {
            version: "v1".to_string(),
            rules: vec![allow],
        };

        assert!(evaluate(&rules, &request(Role::Operator, "hr-prod"), &resource("hr-prod", "eu-west")).allowed);
        assert!(!evaluate(&rules, &request(Role::Operator, "finance-prod"), &resource("finance-prod", "eu-west")).allowed);
    }

    #[test]
    fn window_restricts_sensitive_access_to_business_hours() {
        let mut allow = rule("allow-business-hours", Effect::Allow);
        allow.classifications = vec![ResourceClassification::Internal];
        allow.window = Some(TimeWindow {
            days: vec![Weekday::Mon, Weekday::Tue, Weekday::Wed, Weekday::Thu, Weekday::Fri],
            start: NaiveTime::from_hms_opt(9, 0, 0).expect("time"),
            end: NaiveTime::from_hms_opt(17, 0, 0).expect("time"),
        });
        let rules = RuleSet {
            version: "v1".to_string(),
            rules: vec![allow],
        };

        let mut in_hours = request(Role::Operator, "hr-prod");
        assert!(evaluate(&rules, &in_hours, &resource("hr-prod", "eu-west")).allowed);

        in_hours.environment.timestamp = Utc.with_ymd_and_hms(2026, 1, 5, 22, 0, 0).unwrap();
        assert!(!evaluate(&rules, &in_hours, &resource("hr-prod", "eu-west")).allowed);
    }

    #[test]
    fn location_match_compares_identity_and_resource_regions() {
        let mut allow = rule("allow-colocated", Effect::Allow);
        allow.require_location_match = true;
        let rules = RuleSet {
            version: "v1".to_string(),
            rules: vec![allow],
        };

        assert!(evaluate(&rules, &request(Role::Operator, "hr-prod"), &resource("hr-prod", "eu-west")).allowed);
        assert!(!evaluate(&rules, &request(Role::Operator, "hr-prod"), &resource("hr-prod", "us-east")).allowed);
    }

    #[test]
    fn device_predicate_targets_untrusted_devices() {
        let mut deny = rule("deny-unmanaged-restricted", Effect::Deny);
        deny.classifications = vec![ResourceClassification::Restricted];
        deny.device = Some(DeviceRequirement {
            managed: Some(false),
            encrypted: None,
        });
        let allow = rule("allow-rest", Effect::Allow);
        let rules = RuleSet {
            version: "v1".to_string(),
            rules: vec![deny, allow],
        };

        let mut restricted = request(Role::Operator, "hr-prod");
        restricted.classification = ResourceClassification::Restricted;
        // Managed device falls through to the general allow.
        let trusted = evaluate(&rules, &restricted, &resource("hr-prod", "eu-west"));
        assert!(trusted.allowed);

        restricted.identity.device.managed = false;
        let untrusted = evaluate(&rules, &restricted, &resource("hr-prod", "eu-west"));
        assert!(!untrusted.allowed);
        assert_eq!(
            untrusted.matched,
            Some(RuleId::new("deny-unmanaged-restricted"))
        );
    }

    #[test]
    fn evaluation_is_deterministic() {
        let mut allow = rule("allow-internal", Effect::Allow);
        allow.classifications = vec![ResourceClassification::Internal];
        let rules = RuleSet {
            version: "v1".to_string(),
            rules: vec![allow],
        };
        let req = request(Role::Operator, "hr-prod");
        let res = resource("hr-prod", "eu-west");
        let first = evaluate(&rules, &req, &res);
        let second = evaluate(&rules, &req, &res);
        assert_eq!(first, second);
    }
}
