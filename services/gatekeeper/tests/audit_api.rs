mod common;

use argus_authz::RuleSet;
use axum::body::Body;
use axum::http::{Request, StatusCode};
use common::read_json;
use gatekeeper::api::types::FeatureFlags;
use gatekeeper::app::{AppState, build_router};
use gatekeeper::engine::{AuditLedger, Gate, LocalPolicyEngine, NamespaceManager};
use gatekeeper::store::memory::InMemoryStore;
use gatekeeper::store::{GatekeeperStore, StoreConfig};
use http_helpers::{json_request, json_request_as};
use std::sync::Arc;
use std::time::Duration;
use tower::ServiceExt;

fn rules() -> RuleSet {
    serde_yaml::from_str(
        r#"
version: "audit-1"
rules:
  - id: allow-auditor-ledger
    effect: allow
    roles: [auditor]
    actions: [audit.view]
  - id: allow-home-data
    effect: allow
    namespace: home
    actions: [retrieval.query, retrieval.ingest]
"#,
    )
    .expect("rules")
}

async fn app() -> axum::routing::RouterIntoService<axum::body::Body, ()> {
    let store: Arc<dyn GatekeeperStore> = Arc::new(InMemoryStore::new(StoreConfig {
        audit_query_limit: 500,
    }));
    let namespaces = Arc::new(NamespaceManager::new(store.clone()));
    for (name, unit) in [("hr-prod", "hr"), ("finance-prod", "finance")] {
        namespaces
            .create(name, unit, "eu-west", "u-admin")
            .await
            .expect("seed namespace");
    }
    let engine = Arc::new(LocalPolicyEngine::new(rules()));
    let ledger = Arc::new(AuditLedger::new(store.clone(), Duration::from_secs(1)));
    let gate = Arc::new(Gate::new(
        namespaces.clone(),
        engine.clone(),
        ledger.clone(),
        Duration::from_millis(50),
    ));
    let state = AppState {
        region_id: "local".to_string(),
        api_version: "v1".to_string(),
        features: FeatureFlags {
            durable_storage: false,
        },
        store,
        namespaces,
        engine,
        ledger,
        gate,
    };
    build_router(state).into_service()
}

fn query_body(role: &str, home: &str, target: &str) -> serde_json::Value {
    serde_json::json!({
        "identity": {
            "principal_id": format!("u-{role}"),
            "role": role,
            "namespace": home,
            "region": "eu-west",
            "device": { "managed": true, "encrypted": true }
        },
        "action": "retrieval.query",
        "namespace": target,
        "classification": "internal"
    })
}

#[tokio::test]
async fn auditor_cross_namespace_read_is_allowed_and_flagged_broad() {
    let app = app().await;

    // Generate one decision in finance-prod first.
    let seed = json_request(
        "POST",
        "/v1/authorize",
        query_body("operator", "finance-prod", "finance-prod"),
    );
    let response = app.clone().oneshot(seed).await.expect("seed");
    assert_eq!(response.status(), StatusCode::OK);

    // Auditor homed in hr-prod reads finance-prod entries.
    let audit = json_request_as(
        "GET",
        "/v1/audit/entries?namespace=finance-prod",
        "auditor",
        "hr-prod",
        None,
    );
    let response = app.clone().oneshot(audit).await.expect("audit");
    assert_eq!(response.status(), StatusCode::OK);
    let payload = read_json(response).await;
    let items = payload["items"].as_array().expect("items");
    // The operator's decision plus the auditor's own broad access.
    assert_eq!(items.len(), 2);
    assert_eq!(items[1]["action"], "audit.view");
    assert_eq!(items[1]["broad_access"], true);
    assert_eq!(items[1]["role"], "auditor");
}

#[tokio::test]
async fn operator_and_admin_cannot_read_the_ledger() {
    let app = app().await;
    for role in ["operator", "admin"] {
        let audit = json_request_as(
            "GET",
            "/v1/audit/entries?namespace=hr-prod",
            role,
            "hr-prod",
            None,
        );
        let response = app.clone().oneshot(audit).await.expect("audit");
        assert_eq!(response.status(), StatusCode::FORBIDDEN, "{role}");
    }
}

#[tokio::test]
async fn refused_ledger_reads_are_themselves_recorded() {
    let app = app().await;
    let audit = json_request_as(
        "GET",
        "/v1/audit/entries?namespace=hr-prod",
        "operator",
        "hr-prod",
        None,
    );
    let response = app.clone().oneshot(audit).await.expect("audit");
    assert_eq!(response.status(), StatusCode::FORBIDDEN);

    let check = json_request_as(
        "GET",
        "/v1/audit/entries?namespace=hr-prod&outcome=deny",
        "auditor",
        "hr-prod",
        None,
    );
    let response = app.clone().oneshot(check).await.expect("check");
    assert_eq!(response.status(), StatusCode::OK);
    let payload = read_json(response).await;
    let items = payload["items"].as_array().expect("items");
    assert_eq!(items.len(), 1);
    assert_eq!(items[0]["action"], "audit.view");
    assert_eq!(items[0]["deny_kind"], "permission_denied");
}

#[tokio::test]
async fn filters_narrow_results() {
    let app = app().await;
    for target in ["hr-prod", "hr-prod", "finance-prod"] {
        let request = json_request(
            "POST",
            "/v1/authorize",
            query_body("operator", target, target),
        );
        let response = app.clone().oneshot(request).await.expect("authorize");
        assert_eq!(response.status(), StatusCode::OK);
    }

    let filtered = json_request_as(
        "GET",
        "/v1/audit/entries?namespace=hr-prod&outcome=allow&limit=10",
        "auditor",
        "hr-prod",
        None,
    );
    let response = app.clone().oneshot(filtered).await.expect("filtered");
    assert_eq!(response.status(), StatusCode::OK);
    let payload = read_json(response).await;
    // Two allowed hr-prod queries plus the auditor's own allowed audit.view,
    // which is appended before the ledger is read.
    assert_eq!(payload["items"].as_array().unwrap().len(), 3);

    let bad_outcome = json_request_as(
        "GET",
        "/v1/audit/entries?outcome=maybe",
        "auditor",
        "hr-prod",
        None,
    );
    let response = app.clone().oneshot(bad_outcome).await.expect("bad outcome");
    assert_eq!(response.status(), StatusCode::BAD_REQUEST);
}

#[tokio::test]
async fn ledger_has_no_mutation_routes() {
    let app = app().await;
    // The API surface simply offers no way to rewrite history: anything but
    // GET on the audit path is rejected by routing.
    for method in ["PUT", "PATCH", "DELETE", "POST"] {
        let request = Request::builder()
            .method(method)
            .uri("/v1/audit/entries")
            .body(Body::empty())
            .expect("request");
        let response = app.clone().oneshot(request).await.expect("response");
        assert_eq!(
            response.status(),
            StatusCode::METHOD_NOT_ALLOWED,
            "{method}"
        );
    }
}
