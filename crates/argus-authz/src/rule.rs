//! Declarative policy-rule data model.
//!
//! # Purpose
//! Defines the versioned rule set the policy engine evaluates: rules are
//! stored and deployed as data, never as imperative code paths.
//!
//! # Key invariants
//! - A rule set is valid only if its version is non-empty and rule ids are
//!   unique; the engine refuses to activate anything else.
//! - Rules are evaluated in declared order; serialization preserves order.
//! - Time windows are expressed in UTC.
use crate::action::Action;
use crate::errors::{AuthzError, AuthzResult};
use crate::identity::ResourceClassification;
use crate::role::Role;
use crate::types::NamespaceName;
use chrono::{DateTime, Datelike, NaiveTime, Utc};
use serde::{Deserialize, Serialize};
use std::collections::HashSet;

/// Rule identifier wrapper.
#[derive(Debug, Clone, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(transparent)]
pub struct RuleId(String);

impl RuleId {
    pub fn new(value: impl Into<String>) -> Self {
        Self(value.into())
    }

    pub fn as_str(&self) -> &str {
        &self.0
    }
}

impl std::fmt::Display for RuleId {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.write_str(&self.0)
    }
}

/// Rule outcome when the rule matches.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum Effect {
    Allow,
    Deny,
}

/// How a rule constrains the target namespace.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum NamespaceMatch {
    /// Matches any target namespace.
    Any,
    /// Matches only when the target equals the identity's own namespace.
    Home,
    /// Matches one specific namespace by name.
    Named { name: NamespaceName },
}

impl Default for NamespaceMatch {
    fn default() -> Self {
        NamespaceMatch::Any
    }
}

/// Day of week for rule windows. UTC-based, independent of locale.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum Weekday {
    Mon,
    Tue,
    Wed,
    Thu,
    Fri,
    Sat,
    Sun,
}

impl From<chrono::Weekday> for Weekday {
    fn from(value: chrono::Weekday) -> Self {
        match value {
            chrono::Weekday::Mon => Weekday::Mon,
            chrono::Weekday::Tue => Weekday::Tue,
            chrono::Weekday::Wed => Weekday::Wed,
            chrono::Weekday::Thu => Weekday::Thu,
            chrono::Weekday::Fri => Weekday::Fri,
            chrono::Weekday::Sat => Weekday::Sat,
            chrono::Weekday::Sun => Weekday::Sun,
        }
    }
}

/// Recurring UTC time window, e.g. business hours for sensitive resources.
///
/// A window with `start > end` wraps past midnight.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct TimeWindow {
    /// Days on which the window applies. Empty means every day.
    #[serde(default)]
    pub days: Vec<Weekday>,
    pub start: NaiveTime,
    pub end: NaiveTime,
}

impl TimeWindow {
    pub fn contains(&self, at: DateTime<Utc>) -> bool {
        if !self.days.is_empty() {
            let day = Weekday::from(at.weekday());
            if !self.days.contains(&day) {
                return false;
            }
        }
        let time = at.time();
        if self.start <= self.end {
            time >= self.start && time < self.end
        } else {
            time >= self.start || time < self.end
        }
    }
}

/// Device-posture predicate a rule can impose. Each field, when present,
/// must equal the identity's device attribute for the rule to match, so a
/// deny rule can target untrusted devices (`managed: false`) just as an
/// allow rule can demand trusted ones (`managed: true`).
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq, Serialize, Deserialize)]
pub struct DeviceRequirement {
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub managed: Option<bool>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub encrypted: Option<bool>,
}

/// One declarative predicate over identity, resource, action, and
/// environment attributes. Empty condition lists match anything.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct PolicyRule {
    pub id: RuleId,
    #[serde(default)]
    pub description: String,
    pub effect: Effect,
    #[serde(default)]
    pub roles: Vec<Role>,
    #[serde(default)]
    pub namespace: NamespaceMatch,
    #[serde(default)]
    pub actions: Vec<Action>,
    #[serde(default)]
    pub classifications: Vec<ResourceClassification>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub window: Option<TimeWindow>,
    /// Require the identity's region to equal the resource's region.
    #[serde(default)]
    pub require_location_match: bool,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub device: Option<DeviceRequirement>,
}

/// Versioned, ordered collection of rules. The engine swaps whole rule sets
/// atomically; there is no per-rule mutation.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct RuleSet {
    pub version: String,
    pub rules: Vec<PolicyRule>,
}

impl RuleSet {
    /// An empty rule set: everything falls through to the default deny.
    pub fn empty(version: impl Into<String>) -> Self {
        Self {
            version: version.into(),
            rules: Vec::new(),
        }
    }

    pub fn validate(&self) -> AuthzResult<()> {
        if self.version.trim().is_empty() {
            return Err(AuthzError::EmptyRuleSetVersion);
        }
        let mut seen = HashSet::new();
        for rule in &self.rules {
            if rule.id.as_str().trim().is_empty() {
                return Err(AuthzError::InvalidRule("empty rule id".to_string()));
            }
            if !seen.insert(rule.id.as_str()) {
                return Err(AuthzError::DuplicateRuleId(rule.id.to_string()));
            }
        }
        Ok(())
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use chrono::TimeZone;

    fn allow_rule(id: &str) -> PolicyRule {
        PolicyRule {
            id: RuleId::new(id),
            description: String::new(),
            effect: Effect::Allow,
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
    fn validate_rejects_duplicate_ids() {
        let set = RuleSet {
            version: "v1".to_string(),
            rules: vec![allow_rule("r1"), allow_rule("r1")],
        };
        assert!(matches!(
            set.validate(),
            Err(AuthzError::DuplicateRuleId(_))
        ));
    }

    #[test]
    fn validate_rejects_empty_version() {
        let set = RuleSet::empty("  ");
        assert!(matches!(
            set.validate(),
            Err(AuthzError::EmptyRuleSetVersion)
        ));
    }

    #[test]
    fn window_contains_business_hours() {
        let window = TimeWindow {
            days: vec![Weekday::Mon, Weekday::Tue, Weekday::Wed, Weekday::Thu, Weekday::Fri],
            start: NaiveTime::from_hms_opt(9, 0, 0).expect("time"),
            end: NaiveTime::from_hms_opt(17, 0, 0).expect("time"),
        };
        // 2026-01-05 is a Monday.
        let monday_noon = Utc.with_ymd_and_hms(2026, 1, 5, 12, 0, 0).unwrap();
        let monday_night = Utc.with_ymd_and_hms(2026, 1, 5, 22, 0, 0).unwrap();
        let saturday_noon = Utc.with_ymd_and_hms(2026, 1, 10, 12, 0, 0).unwrap();
        assert!(window.contains(monday_noon));
        assert!(!window.contains(monday_night));
        assert!(!window.contains(saturday_noon));
    }

    #[test]
    fn window_wraps_past_midnight() {
        let window = TimeWindow {
            days: Vec::new(),
            start: NaiveTime::from_hms_opt(22, 0, 0).expect("time"),
            end: NaiveTime::from_hms_opt(6, 0, 0).expect("time"),
        };
        let late = Utc.with_ymd_and_hms(2026, 1, 5, 23, 0, 0).unwrap();
        let early = Utc.with_ymd_and_hms(2026, 1, 5, 5, 0, 0).unwrap();
        let noon = Utc.with_ymd_and_hms(2026, 1, 5, 12, 0, 0).unwrap();
        assert!(window.contains(late));
        assert!(window.contains(early));
        assert!(!window.contains(noon));
    }

    #[test]
    fn rule_set_yaml_roundtrip_preserves_order() {
        let yaml = r#"
version: "2026-01-05.1"
rules:
  - id: deny-unmanaged-restricted
    effect: deny
    classifications: [restricted]
    device: { managed: false }
  - id: allow-operators-home
    effect: allow
    roles: [operator]
    namespace: home
    actions: [retrieval.query, retrieval.ingest]
"#;
        let set: RuleSet = serde_yaml::from_str(yaml).expect("parse rule set");
        set.validate().expect("valid");
        assert_eq!(set.rules.len(), 2);
        assert_eq!(set.rules[0].id.as_str(), "deny-unmanaged-restricted");
        assert_eq!(set.rules[1].namespace, NamespaceMatch::Home);
        let json = serde_json::to_string(&set).expect("serialize");
        let back: RuleSet = serde_json::from_str(&json).expect("deserialize");
        assert_eq!(back, set);
    }
}
