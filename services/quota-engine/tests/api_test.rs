use std::sync::Arc;

use axum::body::{to_bytes, Body};
use axum::http::{header, Request, StatusCode};
use axum::Router;
use serde_json::{json, Value};
use tempfile::{tempdir, TempDir};
use thetai_quota_engine::api::{create_router, ApiState};
use thetai_quota_engine::config::QuotaEngineConfig;
use thetai_quota_engine::quota::QuotaManager;
use thetai_quota_engine::storage::QuotaDatabase;
use thetai_quota_engine::wallet::WalletManager;
use tower::ServiceExt;

struct TestApp {
    _temp: TempDir,
    router: Router,
}

fn setup() -> TestApp {
    let temp = tempdir().expect("failed to create temp dir");
    let config = QuotaEngineConfig {
        data_dir: temp.path().to_path_buf(),
        ..QuotaEngineConfig::default()
    };
    let database =
        Arc::new(QuotaDatabase::new(config.data_dir.clone()).expect("failed to open database"));
    let quota = Arc::new(QuotaManager::new(Arc::clone(&database)));
    let wallet = Arc::new(WalletManager::new(Arc::clone(&database), &config));
    let state = Arc::new(ApiState::new(quota, wallet, config));

    TestApp {
        _temp: temp,
        router: create_router(state),
    }
}

fn user_id() -> String {
    format!("user-{}", uuid::Uuid::new_v4())
}

async fn post_json(router: &Router, uri: &str, body: Value) -> (StatusCode, Value) {
    let request = Request::builder()
        .method("POST")
        .uri(uri)
        .header(header::CONTENT_TYPE, "application/json")
        .body(Body::from(body.to_string()))
        .expect("failed to build request");
    send(router, request).await
}

async fn get(router: &Router, uri: &str) -> (StatusCode, Value) {
    let request = Request::builder()
        .uri(uri)
        .body(Body::empty())
        .expect("failed to build request");
    send(router, request).await
}

async fn send(router: &Router, request: Request<Body>) -> (StatusCode, Value) {
    let response = router
        .clone()
        .oneshot(request)
        .await
        .expect("request failed");
    let status = response.status();
    let bytes = to_bytes(response.into_body(), usize::MAX)
        .await
        .expect("failed to read body");
    let value = serde_json::from_slice(&bytes).unwrap_or(Value::Null);
    (status, value)
}

#[tokio::test]
async fn health_reports_service_name() {
    let app = setup();
    let (status, body) = get(&app.router, "/health").await;
    assert_eq!(status, StatusCode::OK);
    assert_eq!(body["status"], "healthy");
    assert_eq!(body["service"], "quota-engine");
}

#[tokio::test]
async fn message_increment_returns_allowed_verdict() {
    let app = setup();
    let user = user_id();

    let (status, body) = post_json(
        &app.router,
        "/api/quota/message",
        json!({ "user_id": user, "has_image": true }),
    )
    .await;

    assert_eq!(status, StatusCode::OK);
    assert_eq!(body["allowed"], true);
    assert_eq!(body["usage"]["messages_used"], 1);
    assert_eq!(body["usage"]["images_in_prompts_used"], 1);
    assert_eq!(body["usage"]["tier"], "free");
    assert!(body.get("reason").is_none());
}

#[tokio::test]
async fn message_refusal_carries_reason_and_reset() {
    let app = setup();
    let user = user_id();

    for _ in 0..50 {
        let (status, body) = post_json(
            &app.router,
            "/api/quota/message",
            json!({ "user_id": user }),
        )
        .await;
        assert_eq!(status, StatusCode::OK);
        assert_eq!(body["allowed"], true);
    }

    let (status, body) = post_json(
        &app.router,
        "/api/quota/message",
        json!({ "user_id": user }),
    )
    .await;

    assert_eq!(status, StatusCode::OK);
    assert_eq!(body["allowed"], false);
    assert_eq!(body["reason"], "messages_limit");
    assert!(body["resets_at"].is_string());
    assert!(body.get("usage").is_none());
}

#[tokio::test]
async fn image_gen_refusal_uses_its_own_reason_code() {
    let app = setup();
    let user = user_id();

    for _ in 0..5 {
        let (_, body) = post_json(
            &app.router,
            "/api/quota/image-gen",
            json!({ "user_id": user }),
        )
        .await;
        assert_eq!(body["allowed"], true);
    }

    let (status, body) = post_json(
        &app.router,
        "/api/quota/image-gen",
        json!({ "user_id": user }),
    )
    .await;

    assert_eq!(status, StatusCode::OK);
    assert_eq!(body["allowed"], false);
    assert_eq!(body["reason"], "images_gen_limit");
    assert!(body["resets_at"].is_string());
}

#[tokio::test]
async fn limits_endpoint_returns_snapshot() {
    let app = setup();
    let user = user_id();

    post_json(
        &app.router,
        "/api/quota/message",
        json!({ "user_id": user }),
    )
    .await;

    let (status, body) = get(&app.router, &format!("/api/quota/{user}/limits")).await;
    assert_eq!(status, StatusCode::OK);
    assert_eq!(body["usage"]["messages_used"], 1);
    assert_eq!(body["usage"]["messages_limit"], 50);
    assert_eq!(body["usage"]["messages_remaining"], 49);
    assert!(body["usage"]["usage_resets_at"].is_string());
    assert!(body["usage"]["image_gen_resets_at"].is_string());
}

#[tokio::test]
async fn reset_check_reports_no_op_on_fresh_user() {
    let app = setup();
    let user = user_id();

    let (status, body) = post_json(
        &app.router,
        "/api/quota/reset-check",
        json!({ "user_id": user }),
    )
    .await;

    assert_eq!(status, StatusCode::OK);
    assert_eq!(body["usage_reset"], false);
    assert_eq!(body["image_gen_reset"], false);
}

#[tokio::test]
async fn empty_user_id_is_a_bad_request() {
    let app = setup();

    let (status, body) = post_json(
        &app.router,
        "/api/quota/message",
        json!({ "user_id": "  " }),
    )
    .await;

    assert_eq!(status, StatusCode::BAD_REQUEST);
    assert_eq!(body["code"], "invalid_user_id");
}

#[tokio::test]
async fn wallet_award_upgrade_flow() {
    let app = setup();
    let user = user_id();

    let (status, body) = post_json(
        &app.router,
        "/api/wallet/award",
        json!({ "user_id": user, "amount": 500, "source": "trivia-game" }),
    )
    .await;
    assert_eq!(status, StatusCode::OK);
    assert_eq!(body["balance"], 500);

    let (status, body) = post_json(
        &app.router,
        "/api/tier/upgrade",
        json!({ "user_id": user }),
    )
    .await;
    assert_eq!(status, StatusCode::OK);
    assert_eq!(body["tier"], "plus");
    assert_eq!(body["price_paid"], 500);
    assert_eq!(body["balance"], 0);

    let (status, body) = post_json(
        &app.router,
        "/api/tier/upgrade",
        json!({ "user_id": user }),
    )
    .await;
    assert_eq!(status, StatusCode::CONFLICT);
    assert_eq!(body["code"], "already_plus");

    let (status, body) = get(&app.router, &format!("/api/quota/{user}/limits")).await;
    assert_eq!(status, StatusCode::OK);
    assert_eq!(body["usage"]["tier"], "plus");
    assert_eq!(body["usage"]["messages_limit"], 1000);
}

#[tokio::test]
async fn insufficient_spend_is_a_conflict() {
    let app = setup();
    let user = user_id();

    post_json(
        &app.router,
        "/api/wallet/award",
        json!({ "user_id": user, "amount": 10, "source": "test" }),
    )
    .await;

    let (status, body) = post_json(
        &app.router,
        "/api/wallet/spend",
        json!({ "user_id": user, "amount": 11 }),
    )
    .await;
    assert_eq!(status, StatusCode::CONFLICT);
    assert_eq!(body["code"], "insufficient_balance");

    let (status, body) = get(&app.router, &format!("/api/wallet/{user}")).await;
    assert_eq!(status, StatusCode::OK);
    assert_eq!(body["balance"], 10);
}

#[tokio::test]
async fn promo_creation_and_discounted_upgrade() {
    let app = setup();
    let user = user_id();

    let (status, body) = post_json(
        &app.router,
        "/api/promo",
        json!({ "code": "LAUNCH20", "discount_percent": 20, "max_uses": 100 }),
    )
    .await;
    assert_eq!(status, StatusCode::OK);
    assert_eq!(body["code"], "LAUNCH20");

    post_json(
        &app.router,
        "/api/wallet/award",
        json!({ "user_id": user, "amount": 400, "source": "test" }),
    )
    .await;

    let (status, body) = post_json(
        &app.router,
        "/api/tier/upgrade",
        json!({ "user_id": user, "promo_code": "LAUNCH20" }),
    )
    .await;
    assert_eq!(status, StatusCode::OK);
    assert_eq!(body["price_paid"], 400);
    assert_eq!(body["promo_code"], "LAUNCH20");
}
