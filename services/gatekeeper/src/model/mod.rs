//! Gatekeeper data models shared by storage and the HTTP API.
pub mod audit;
pub mod namespace;

pub use audit::{AuditEntry, AuditFilter, NewAuditEntry};
pub use namespace::{NamespaceRecord, NamespaceStatus};
