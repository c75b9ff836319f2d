//! Integration tests for the Pactwatch HTTP API.
//!
//! Uses axum-test to test the API handlers without starting a real server.

// Allow unwrap and panic in tests - these are standard for test code
// Allow holding MutexGuard across await - env-var tests are serialized
#![allow(clippy::unwrap_used, clippy::panic, clippy::await_holding_lock)]

use axum::http::{HeaderValue, StatusCode};
use axum_test::TestServer;
use base64::{Engine as _, engine::general_purpose::STANDARD as BASE64};
use chrono::NaiveDate;
use pactwatch::api::{
    AppState, ClassifyResponse, ContractJson, ContractListResponse, ErrorResponse,
    HealthResponse, RefreshResponse, SessionResponse, create_router,
};
use pactwatch::store::{HttpContractStore, MemoryContractStore, StoreBackend};
use pactwatch::{AuthSession, UserSession, Workspace};
use pactwatch_core::{
    Clock, ContractId, ContractRecord, ContractStatus, DashboardSummary, FixedClock, RiskLevel,
    UserId,
};
use serde_json::json;
use std::sync::{Arc, Mutex};

/// Serializes every test, since some of them set `PACTWATCH_API_KEY`.
static ENV_TEST_MUTEX: Mutex<()> = Mutex::new(());

// =============================================================================
// HELPER FUNCTIONS
// =============================================================================

struct TestGuard {
    _guard: std::sync::MutexGuard<'static, ()>,
}

impl Drop for TestGuard {
    fn drop(&mut self) {
        // SAFETY: Tests run sequentially under ENV_TEST_MUTEX, so no concurrent env access.
        unsafe { std::env::remove_var("PACTWATCH_API_KEY") };
    }
}

fn lock_env() -> TestGuard {
    let guard = ENV_TEST_MUTEX.lock().unwrap_or_else(|e| e.into_inner());
    // SAFETY: Tests run sequentially under ENV_TEST_MUTEX, so no concurrent env access.
    unsafe { std::env::remove_var("PACTWATCH_API_KEY") };
    TestGuard { _guard: guard }
}

fn date(s: &str) -> NaiveDate {
    NaiveDate::parse_from_str(s, "%Y-%m-%d").unwrap()
}

fn clock() -> Arc<dyn Clock> {
    Arc::new(FixedClock::at_date(date("2026-01-01")))
}

fn user() -> UserSession {
    UserSession::new(UserId::new("u-1"), "ada@example.com", "token")
}

fn record(id: &str, name: &str, expires: &str, status: ContractStatus) -> ContractRecord {
    ContractRecord::new(
        ContractId::new(id),
        name,
        "Service Agreement",
        format!("{name} Corp"),
        date(expires),
        status,
    )
}

/// Four contracts, one per interesting tier, relative to 2026-01-01.
fn portfolio() -> Vec<ContractRecord> {
    vec![
        record("c-1", "Lease", "2026-01-11", ContractStatus::Active),
        record("c-2", "Supply", "2026-02-15", ContractStatus::Active),
        record("c-3", "NDA", "2026-12-31", ContractStatus::Draft),
        record("c-4", "Hosting", "2025-12-01", ContractStatus::Expired),
    ]
}

/// A signed-in workspace over a seeded memory store, catalog already loaded.
async fn create_populated_state() -> AppState {
    let store = MemoryContractStore::with_clock(clock());
    store.seed(&UserId::new("u-1"), portfolio());

    let mut workspace = Workspace::new(
        StoreBackend::Memory(store),
        AuthSession::signed_in(user()),
        clock(),
    );
    workspace.refresh().await.unwrap();
    AppState::new(workspace)
}

async fn create_populated_test_server() -> (TestServer, AppState, TestGuard) {
    let guard = lock_env();
    let state = create_populated_state().await;
    let server = TestServer::new(create_router(state.clone())).unwrap();
    (server, state, guard)
}

fn list(response: &axum_test::TestResponse) -> Vec<String> {
    let body: ContractListResponse<ContractJson> = response.json();
    body.contracts
        .into_iter()
        .map(|c| c.record.id.to_string())
        .collect()
}

// =============================================================================
// HEALTH ENDPOINT TESTS
// =============================================================================

#[tokio::test]
async fn test_health_endpoint() {
    let (server, _state, _guard) = create_populated_test_server().await;

    let response = server.get("/health").await;

    response.assert_status_ok();
    let health: HealthResponse = response.json();
    assert_eq!(health.status, "ok");
    assert_eq!(health.version, env!("CARGO_PKG_VERSION"));
}

// =============================================================================
// CONTRACT LIST TESTS
// =============================================================================

#[tokio::test]
async fn test_list_preserves_store_order_and_classifies() {
    let (server, _state, _guard) = create_populated_test_server().await;

    let response = server.get("/contracts").await;

    response.assert_status_ok();
    let body: ContractListResponse<ContractJson> = response.json();
    assert_eq!(body.count, 4);
    let tiers: Vec<(String, RiskLevel)> = body
        .contracts
        .iter()
        .map(|c| (c.record.id.to_string(), c.risk_level))
        .collect();
    assert_eq!(
        tiers,
        vec![
            ("c-1".to_string(), RiskLevel::High),
            ("c-2".to_string(), RiskLevel::Medium),
            ("c-3".to_string(), RiskLevel::Low),
            ("c-4".to_string(), RiskLevel::High),
        ]
    );
}

#[tokio::test]
async fn test_list_wire_format_uses_camel_case() {
    let (server, _state, _guard) = create_populated_test_server().await;

    let response = server.get("/contracts").await;
    let body: serde_json::Value = response.json();
    let first = &body["contracts"][0];

    assert_eq!(first["id"], "c-1");
    assert_eq!(first["type"], "Service Agreement");
    assert_eq!(first["expirationDate"], "2026-01-11");
    assert_eq!(first["riskLevel"], "High");
    assert_eq!(first["status"], "Active");
}

#[tokio::test]
async fn test_list_filters() {
    let (server, _state, _guard) = create_populated_test_server().await;

    let high = server.get("/contracts?risk=high").await;
    assert_eq!(list(&high), vec!["c-1", "c-4"]);

    let drafts = server.get("/contracts?status=Draft").await;
    assert_eq!(list(&drafts), vec!["c-3"]);

    let search = server.get("/contracts?search=SUPP").await;
    assert_eq!(list(&search), vec!["c-2"]);

    let combined = server.get("/contracts?risk=high&status=active").await;
    assert_eq!(list(&combined), vec!["c-1"]);
}

#[tokio::test]
async fn test_list_rejects_unknown_risk() {
    let (server, _state, _guard) = create_populated_test_server().await;

    let response = server.get("/contracts?risk=extreme").await;

    response.assert_status(StatusCode::BAD_REQUEST);
    let error: ErrorResponse = response.json();
    assert!(error.error.contains("extreme"));
}

// =============================================================================
// DASHBOARD TESTS
// =============================================================================

#[tokio::test]
async fn test_dashboard_summary() {
    let (server, _state, _guard) = create_populated_test_server().await;

    let response = server.get("/dashboard").await;

    response.assert_status_ok();
    let summary: DashboardSummary = response.json();
    assert_eq!(summary.total, 4);
    assert_eq!(summary.by_risk.high, 2);
    assert_eq!(summary.by_risk.medium, 1);
    assert_eq!(summary.by_risk.low, 1);
    assert_eq!(summary.by_status.active, 2);
    assert_eq!(summary.by_status.draft, 1);
    assert_eq!(summary.by_status.expired, 1);

    assert_eq!(summary.expiring_soon.len(), 1);
    assert_eq!(summary.expiring_soon[0].id, ContractId::new("c-1"));
    assert_eq!(summary.expiring_soon[0].days_remaining, 10);
}

// =============================================================================
// UPLOAD TESTS
// =============================================================================

#[tokio::test]
async fn test_upload_prepends_draft() {
    let (server, _state, _guard) = create_populated_test_server().await;

    let response = server
        .post("/contracts")
        .json(&json!({
            "file_name": "Renewal.pdf",
            "content_base64": BASE64.encode(b"%PDF-1.7"),
        }))
        .await;

    response.assert_status(StatusCode::CREATED);
    let uploaded: ContractJson = response.json();
    assert_eq!(uploaded.record.name, "Renewal");
    assert_eq!(uploaded.record.contract_type, "PDF");
    assert_eq!(uploaded.record.status, ContractStatus::Draft);
    assert_eq!(uploaded.record.expiration_date, date("2027-01-01"));
    assert_eq!(uploaded.risk_level, RiskLevel::Low);

    let ids = list(&server.get("/contracts").await);
    assert_eq!(ids.len(), 5);
    assert_eq!(ids[0], uploaded.record.id.as_str());
    assert_eq!(&ids[1..], ["c-1", "c-2", "c-3", "c-4"]);
}

#[tokio::test]
async fn test_upload_rejects_bad_payloads() {
    let (server, _state, _guard) = create_populated_test_server().await;

    let not_base64 = server
        .post("/contracts")
        .json(&json!({"file_name": "a.pdf", "content_base64": "***"}))
        .await;
    not_base64.assert_status(StatusCode::BAD_REQUEST);

    let empty = server
        .post("/contracts")
        .json(&json!({"file_name": "a.pdf", "content_base64": ""}))
        .await;
    empty.assert_status(StatusCode::BAD_REQUEST);

    let body: ContractListResponse<ContractJson> = server.get("/contracts").await.json();
    assert_eq!(body.count, 4);
}

// =============================================================================
// REFRESH / SESSION TESTS
// =============================================================================

#[tokio::test]
async fn test_refresh_replaces_catalog() {
    let (server, state, _guard) = create_populated_test_server().await;

    {
        let workspace = state.workspace.read().await;
        let StoreBackend::Memory(store) = workspace.store() else {
            panic!("memory backend expected");
        };
        store.seed(
            &UserId::new("u-1"),
            vec![record("c-9", "Licence", "2026-03-15", ContractStatus::Active)],
        );
    }

    let response = server.post("/contracts/refresh").await;

    response.assert_status_ok();
    let refreshed: RefreshResponse = response.json();
    assert_eq!(refreshed.count, 1);
    assert_eq!(list(&server.get("/contracts").await), vec!["c-9"]);
}

#[tokio::test]
async fn test_sign_out_clears_catalog() {
    let (server, state, _guard) = create_populated_test_server().await;

    let session: SessionResponse = server.get("/session").await.json();
    assert!(session.signed_in);
    assert_eq!(session.user_id.as_deref(), Some("u-1"));

    let response = server.post("/session/sign-out").await;
    response.assert_status_ok();
    let session: SessionResponse = response.json();
    assert!(!session.signed_in);

    assert!(state.workspace.read().await.catalog().is_empty());
    server
        .get("/contracts")
        .await
        .assert_status(StatusCode::UNAUTHORIZED);
    server
        .get("/dashboard")
        .await
        .assert_status(StatusCode::UNAUTHORIZED);
}

#[tokio::test]
async fn test_unreachable_store_is_bad_gateway() {
    let _guard = lock_env();
    let workspace = Workspace::new(
        StoreBackend::Http(HttpContractStore::new("http://127.0.0.1:1", None)),
        AuthSession::signed_in(user()),
        clock(),
    );
    let server = TestServer::new(create_router(AppState::new(workspace))).unwrap();

    let response = server.post("/contracts/refresh").await;

    response.assert_status(StatusCode::BAD_GATEWAY);
    let error: ErrorResponse = response.json();
    assert!(error.error.starts_with("Fetch failed"));
}

// =============================================================================
// CLASSIFY TESTS
// =============================================================================

#[tokio::test]
async fn test_classify_boundaries() {
    let (server, _state, _guard) = create_populated_test_server().await;

    let cases = [
        ("2026-01-30", 29, RiskLevel::High),
        ("2026-01-31", 30, RiskLevel::Medium),
        ("2026-03-01", 59, RiskLevel::Medium),
        ("2026-03-02", 60, RiskLevel::Low),
        ("2025-12-25", -7, RiskLevel::High),
    ];
    for (expires, days, level) in cases {
        let response = server
            .get(&format!("/classify?expires={expires}&today=2026-01-01"))
            .await;
        response.assert_status_ok();
        let body: ClassifyResponse = response.json();
        assert_eq!(body.days_remaining, days, "{expires}");
        assert_eq!(body.risk_level, level, "{expires}");
    }
}

#[tokio::test]
async fn test_classify_defaults_to_server_clock() {
    let (server, _state, _guard) = create_populated_test_server().await;

    let body: ClassifyResponse = server.get("/classify?expires=2026-01-11").await.json();

    assert_eq!(body.reference.date_naive(), date("2026-01-01"));
    assert_eq!(body.days_remaining, 10);
}

#[tokio::test]
async fn test_classify_rejects_bad_date() {
    let (server, _state, _guard) = create_populated_test_server().await;

    let response = server.get("/classify?expires=tomorrow").await;

    response.assert_status(StatusCode::BAD_REQUEST);
}

// =============================================================================
// AUTH TESTS
// =============================================================================

async fn create_auth_test_server(api_key: &str) -> (TestServer, TestGuard) {
    let guard = lock_env();
    // SAFETY: Tests run sequentially under ENV_TEST_MUTEX, so no concurrent env access.
    unsafe { std::env::set_var("PACTWATCH_API_KEY", api_key) };
    let state = create_populated_state().await;
    (TestServer::new(create_router(state)).unwrap(), guard)
}

#[tokio::test]
async fn test_auth_valid_bearer_token() {
    let api_key = "test-secret-key-12345";
    let (server, _guard) = create_auth_test_server(api_key).await;

    let response = server
        .get("/contracts")
        .add_header(
            axum::http::header::AUTHORIZATION,
            format!("Bearer {}", api_key)
                .parse::<HeaderValue>()
                .unwrap(),
        )
        .await;

    response.assert_status_ok();
}

#[tokio::test]
async fn test_auth_rejects_missing_or_wrong_token() {
    let (server, _guard) = create_auth_test_server("correct-key").await;

    let missing = server.get("/contracts").await;
    missing.assert_status(StatusCode::UNAUTHORIZED);
    let error: ErrorResponse = missing.json();
    assert_eq!(error.error, "Unauthorized");

    server
        .get("/contracts")
        .add_header(
            axum::http::header::AUTHORIZATION,
            "Bearer wrong-key".parse::<HeaderValue>().unwrap(),
        )
        .await
        .assert_status(StatusCode::UNAUTHORIZED);

    // The key alone, without the Bearer scheme, is not accepted.
    server
        .get("/contracts")
        .add_header(
            axum::http::header::AUTHORIZATION,
            "correct-key".parse::<HeaderValue>().unwrap(),
        )
        .await
        .assert_status(StatusCode::UNAUTHORIZED);
}

#[tokio::test]
async fn test_auth_health_is_exempt() {
    let (server, _guard) = create_auth_test_server("correct-key").await;

    server.get("/health").await.assert_status_ok();
}
