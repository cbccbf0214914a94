//! Identity and request snapshots.
//!
//! # Purpose
//! Defines the verified-identity snapshot handed to the engine by the
//! upstream authentication provider, the per-request environment snapshot,
//! and the ephemeral authorization request that binds them together.
//!
//! # Key invariants
//! - Identity fields are read-only to this engine; they are trusted only
//!   because the caller confirms cryptographic verification happened
//!   upstream. The engine performs no signature verification itself.
//! - An `AuthorizationRequest` is a value: it is built, decided, audited,
//!   and dropped. Nothing mutates it.
use crate::action::Action;
use crate::role::Role;
use crate::types::{NamespaceName, PrincipalId};
use chrono::{DateTime, Utc};
use serde::{Deserialize, Serialize};

/// Device-trust attributes asserted by the upstream device-posture service.
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq, Serialize, Deserialize)]
pub struct DeviceTrust {
    #[serde(default)]
    pub managed: bool,
    #[serde(default)]
    pub encrypted: bool,
}

/// Authenticated principal snapshot.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct Identity {
    pub principal_id: PrincipalId,
    pub role: Role,
    /// The namespace this identity is assigned to. For operators this is the
    /// only namespace they may ever address.
    pub namespace: NamespaceName,
    /// Location/region attribute used by location-equality rules.
    pub region: String,
    #[serde(default)]
    pub device: DeviceTrust,
}

/// Environment attributes captured at decision time.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct EnvironmentSnapshot {
    pub timestamp: DateTime<Utc>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub network_origin: Option<String>,
}

impl EnvironmentSnapshot {
    pub fn now() -> Self {
        Self {
            timestamp: Utc::now(),
            network_origin: None,
        }
    }
}

/// Sensitivity classification of the resource being addressed.
///
/// Ordered from least to most sensitive so rules can express ceilings.
#[derive(
    Debug, Clone, Copy, PartialEq, Eq, PartialOrd, Ord, Hash, Serialize, Deserialize,
)]
#[serde(rename_all = "snake_case")]
pub enum ResourceClassification {
    Public,
    Internal,
    Confidential,
    Restricted,
}

impl ResourceClassification {
    pub fn as_str(self) -> &'static str {
        match self {
            ResourceClassification::Public => "public",
            ResourceClassification::Internal => "internal",
            ResourceClassification::Confidential => "confidential",
            ResourceClassification::Restricted => "restricted",
        }
    }
}

impl std::fmt::Display for ResourceClassification {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.write_str(self.as_str())
    }
}

impl std::str::FromStr for ResourceClassification {
    type Err = ();

    fn from_str(value: &str) -> Result<Self, Self::Err> {
        match value {
            "public" => Ok(ResourceClassification::Public),
            "internal" => Ok(ResourceClassification::Internal),
            "confidential" => Ok(ResourceClassification::Confidential),
            "restricted" => Ok(ResourceClassification::Restricted),
            _ => Err(()),
        }
    }
}

/// Ephemeral authorization request: one identity, one action, one target.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct AuthorizationRequest {
    pub identity: Identity,
    pub action: Action,
    /// Target namespace. For operators the coordinator refuses any value
    /// that differs from the identity's own namespace; there is no override.
    pub namespace: NamespaceName,
    pub classification: ResourceClassification,
    pub environment: EnvironmentSnapshot,
}

impl AuthorizationRequest {
    /// Whether the request addresses the identity's own namespace.
    pub fn targets_own_namespace(&self) -> bool {
        self.namespace == self.identity.namespace
    }
}
