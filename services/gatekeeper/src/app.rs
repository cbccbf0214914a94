//! Gatekeeper HTTP application wiring.
//!
//! # Purpose
//! Builds the Axum router, configures middleware, and defines the shared
//! application state injected into handlers.
//!
//! # Notes
//! This module centralizes route composition to keep `main` small and
//! testable.
use crate::api;
use crate::api::openapi::ApiDoc;
use crate::api::types::FeatureFlags;
use crate::engine::{AuditLedger, Gate, LocalPolicyEngine, NamespaceManager};
use crate::observability;
use crate::store::GatekeeperStore;
use axum::Router;
use std::sync::Arc;
use tower_http::trace::TraceLayer;
use tracing_opentelemetry::OpenTelemetrySpanExt;
use utoipa::OpenApi;

#[derive(Clone)]
pub struct AppState {
    pub region_id: String,
    pub api_version: String,
    pub features: FeatureFlags,
    pub store: Arc<dyn GatekeeperStore>,
    pub namespaces: Arc<NamespaceManager>,
    pub engine: Arc<LocalPolicyEngine>,
    pub ledger: Arc<AuditLedger>,
    pub gate: Arc<Gate>,
}

pub fn build_router(state: AppState) -> Router {
    let trace_layer =
        TraceLayer::new_for_http().make_span_with(|request: &axum::http::Request<_>| {
            let parent = observability::trace_context_from_headers(request.headers());
            let span = tracing::info_span!(
                "http.request",
                method = %request.method(),
                uri = %request.uri(),
                version = ?request.version()
            );
            span.set_parent(parent);
            span
        });

    Router::new()
        .route(
            "/v1/system/info",
            axum::routing::get(api::system::system_info),
        )
        .route(
            "/v1/system/health",
            axum::routing::get(api::system::system_health),
        )
        .route(
            "/v1/authorize",
            axum::routing::post(api::authorize::authorize),
        )
        .route(
            "/v1/namespaces",
            axum::routing::get(api::namespaces::list_namespaces)
                .post(api::namespaces::create_namespace),
        )
        .route(
            "/v1/namespaces/{name}",
            axum::routing::get(api::namespaces::get_namespace),
        )
        .route(
            "/v1/namespaces/{name}/status",
            axum::routing::patch(api::namespaces::update_namespace_status),
        )
        .route(
            "/v1/audit/entries",
            axum::routing::get(api::audit::query_entries),
        )
        .route(
            "/v1/policy/rules",
            axum::routing::get(api::policy::get_rules).put(api::policy::install_rules),
        )
        .merge(
            utoipa_swagger_ui::SwaggerUi::new("/docs").url("/v1/openapi.json", ApiDoc::openapi()),
        )
        .layer(trace_layer)
        .with_state(state)
}
