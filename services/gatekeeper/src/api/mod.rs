//! Gatekeeper HTTP API module.
//!
//! # Purpose
//! Exposes route handler modules and the shared helper that reconstructs the
//! verified identity from gateway-injected headers.
pub mod audit;
pub mod authorize;
pub mod error;
pub mod namespaces;
pub mod openapi;
pub mod policy;
pub mod system;
pub mod types;

use crate::api::error::{ApiError, api_unauthorized};
use argus_authz::{DeviceTrust, Identity, NamespaceName, PrincipalId, Role};
use axum::http::HeaderMap;
use std::str::FromStr;

/// Reconstruct the verified identity from `x-identity-*` headers.
///
/// The fronting authentication gateway validates the caller's token and
/// injects these headers; this service performs no signature verification of
/// its own. Requests that reach the management surface without the full
/// header set are rejected before any engine work.
pub(crate) fn identity_from_headers(headers: &HeaderMap) -> Result<Identity, ApiError> {
    let principal = required_header(headers, "x-identity-principal")?;
    let role = required_header(headers, "x-identity-role")?;
    let role = Role::from_str(role)
        .map_err(|_| api_unauthorized(&format!("unknown identity role: {role}")))?;
    let namespace = required_header(headers, "x-identity-namespace")?;
    let region = required_header(headers, "x-identity-region")?;
    let device = DeviceTrust {
        managed: bool_header(headers, "x-identity-device-managed"),
        encrypted: bool_header(headers, "x-identity-device-encrypted"),
    };
    Ok(Identity {
        principal_id: PrincipalId::new(principal),
        role,
        namespace: NamespaceName::new(namespace),
        region: region.to_string(),
        device,
    })
}

fn required_header<'a>(headers: &'a HeaderMap, name: &str) -> Result<&'a str, ApiError> {
    headers
        .get(name)
        .and_then(|value| value.to_str().ok())
        .filter(|value| !value.is_empty())
        .ok_or_else(|| api_unauthorized(&format!("missing identity header: {name}")))
}

fn bool_header(headers: &HeaderMap, name: &str) -> bool {
    headers
        .get(name)
        .and_then(|value| value.to_str().ok())
        .map(|value| value == "true")
        .unwrap_or(false)
}
