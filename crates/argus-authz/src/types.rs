//! Strongly typed identifiers for authorization-related resources.
//!
//! # Purpose
//! Wraps string identifiers to reduce accidental mix-ups between principals,
//! namespaces, and business units.
//!
//! # Key invariants
//! - Each wrapper preserves the inner string exactly; `Display` and `as_str`
//!   return the original value.
//! - Naming-convention validation happens at the namespace-manager boundary,
//!   not here.
use serde::{Deserialize, Serialize};

/// Principal identifier wrapper.
///
/// The value is the stable subject identifier minted by the upstream
/// authentication provider; this engine never derives or rewrites it.
#[derive(Debug, Clone, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(transparent)]
pub struct PrincipalId(String);

impl PrincipalId {
    pub fn new(value: impl Into<String>) -> Self {
        Self(value.into())
    }

    pub fn as_str(&self) -> &str {
        &self.0
    }
}

impl std::fmt::Display for PrincipalId {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.write_str(&self.0)
    }
}

/// Namespace identifier wrapper.
///
/// A namespace is the unit of tenant isolation. Names follow the
/// `{business_unit}-{environment}` convention enforced when a namespace is
/// created.
#[derive(Debug, Clone, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(transparent)]
pub struct NamespaceName(String);

impl NamespaceName {
    pub fn new(value: impl Into<String>) -> Self {
        Self(value.into())
    }

    pub fn as_str(&self) -> &str {
        &self.0
    }
}

impl std::fmt::Display for NamespaceName {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.write_str(&self.0)
    }
}

/// Business-unit identifier wrapper.
#[derive(Debug, Clone, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(transparent)]
pub struct BusinessUnit(String);

impl BusinessUnit {
    pub fn new(value: impl Into<String>) -> Self {
        Self(value.into())
    }

    pub fn as_str(&self) -> &str {
        &self.0
    }
}

impl std::fmt::Display for BusinessUnit {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.write_str(&self.0)
    }
}
