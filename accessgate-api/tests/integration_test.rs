/// Integration tests for the accessgate API
///
/// These tests drive the full router against an in-memory store:
/// - Webhook intake and background provisioning
/// - Idempotent redelivery
/// - Event filtering and payload validation
/// - Login verification
/// - Liveness and health

mod common;

use accessgate_shared::auth::password::verify_password;
use accessgate_shared::store::MemoryUserStore;
use axum::body::Body;
use axum::http::{Method, Request, StatusCode};
use common::TestContext;
use serde_json::json;
use tower::ServiceExt;

#[tokio::test]
async fn test_paid_invoice_creates_user_and_sends_one_email() {
    let ctx = TestContext::new();

    let (status, body) = ctx.webhook("invoice_paid", "Ana Silva", "ana@example.com").await;
    assert_eq!(status, StatusCode::OK);
    assert_eq!(body, json!({ "status": "success - processing in background" }));

    ctx.drain().await;

    let users = ctx.store.users().await;
    assert_eq!(users.len(), 1);
    assert_eq!(users[0].name, "Ana Silva");
    assert_eq!(users[0].email, "ana@example.com");

    let sent = ctx.notifier.sent();
    assert_eq!(sent.len(), 1);
    assert_eq!(sent[0].email, "ana@example.com");

    let password = sent[0].password.expose();
    assert_eq!(password.len(), 8);
    assert!(password.chars().all(|c| c.is_ascii_alphanumeric()));
    assert!(!users[0].password_hash.contains(password));
    assert!(verify_password(password, &users[0].password_hash));
}

#[tokio::test]
async fn test_duplicate_delivery_is_a_no_op() {
    let ctx = TestContext::new();

    ctx.webhook("invoice_paid", "Ana Silva", "ana@example.com").await;
    ctx.drain().await;

    let (status, body) = ctx.webhook("invoice_paid", "Ana Silva", "ana@example.com").await;
    assert_eq!(status, StatusCode::OK);
    assert_eq!(body["status"], "success - processing in background");
    ctx.drain().await;

    assert_eq!(ctx.store.len().await, 1);
    assert_eq!(ctx.notifier.sent().len(), 1);
}

#[tokio::test]
async fn test_redelivery_with_different_case_is_a_no_op() {
    let ctx = TestContext::new();

    ctx.webhook("invoice_paid", "Ana Silva", "ana@example.com").await;
    ctx.drain().await;
    ctx.webhook("invoice_paid", "Ana Silva", "ANA@Example.COM").await;
    ctx.drain().await;

    assert_eq!(ctx.store.len().await, 1);
    assert_eq!(ctx.notifier.sent().len(), 1);
}

#[tokio::test]
async fn test_concurrent_deliveries_create_one_user() {
    let ctx = TestContext::new();

    let (a, b, c) = tokio::join!(
        ctx.webhook("invoice_paid", "Ana Silva", "ana@example.com"),
        ctx.webhook("invoice_paid", "Ana Silva", "ana@example.com"),
        ctx.webhook("invoice_paid", "Ana Silva", "ana@example.com"),
    );
    assert_eq!(a.0, StatusCode::OK);
    assert_eq!(b.0, StatusCode::OK);
    assert_eq!(c.0, StatusCode::OK);

    ctx.drain().await;

    assert_eq!(ctx.store.len().await, 1);
    assert_eq!(ctx.notifier.sent().len(), 1);
}

#[tokio::test]
async fn test_other_events_are_ignored() {
    let ctx = TestContext::new();

    let (status, body) = ctx.webhook("invoice_created", "Ana Silva", "ana@example.com").await;
    assert_eq!(status, StatusCode::OK);
    assert_eq!(body, json!({ "status": "event_ignored", "event": "invoice_created" }));

    ctx.drain().await;

    assert!(ctx.store.is_empty().await);
    assert_eq!(ctx.store.insert_attempts(), 0);
    assert!(ctx.notifier.sent().is_empty());
}

#[tokio::test]
async fn test_aliased_payload_fields_are_accepted() {
    let ctx = TestContext::new();

    let (status, _) = ctx
        .post_json(
            "/webhook-endpoint",
            json!({
                "event_name": "invoice_paid",
                "customer_name": "Ana Silva",
                "customer_email": "ana@example.com",
            }),
        )
        .await;
    assert_eq!(status, StatusCode::OK);

    ctx.drain().await;
    assert_eq!(ctx.store.len().await, 1);
}

#[tokio::test]
async fn test_invalid_email_is_rejected_before_dispatch() {
    let ctx = TestContext::new();

    let (status, body) = ctx.webhook("invoice_paid", "Ana Silva", "not-an-email").await;
    assert_eq!(status, StatusCode::UNPROCESSABLE_ENTITY);
    assert_eq!(body["status"], "validation_error");
    assert_eq!(body["details"][0]["field"], "cus_email");

    ctx.drain().await;
    assert!(ctx.store.is_empty().await);
    assert!(ctx.notifier.sent().is_empty());
}

#[tokio::test]
async fn test_blank_name_is_rejected_before_dispatch() {
    let ctx = TestContext::new();

    let (status, body) = ctx.webhook("invoice_paid", "   ", "blank@example.com").await;
    assert_eq!(status, StatusCode::UNPROCESSABLE_ENTITY);
    assert_eq!(body["status"], "validation_error");
    assert_eq!(body["details"][0]["field"], "cus_name");
    assert_eq!(body["details"][0]["message"], "Name must not be blank");

    ctx.drain().await;
    assert!(ctx.store.is_empty().await);
    assert_eq!(ctx.store.insert_attempts(), 0);
    assert!(ctx.notifier.sent().is_empty());
}

#[tokio::test]
async fn test_missing_fields_are_rejected() {
    let ctx = TestContext::new();

    let (status, body) = ctx
        .post_json(
            "/webhook-endpoint",
            json!({ "event_name": "invoice_paid", "cus_name": "Ana Silva" }),
        )
        .await;
    assert_eq!(status, StatusCode::BAD_REQUEST);
    assert_eq!(body["status"], "bad_request");

    ctx.drain().await;
    assert!(ctx.store.is_empty().await);
}

#[tokio::test]
async fn test_malformed_json_is_rejected() {
    let ctx = TestContext::new();

    let (status, _) = ctx
        .request(Method::POST, "/webhook-endpoint", Some("{not json".to_string()))
        .await;
    assert_eq!(status, StatusCode::BAD_REQUEST);
}

#[tokio::test]
async fn test_webhook_acknowledges_even_when_store_fails() {
    let ctx = TestContext::with_store(MemoryUserStore::new().fail_lookups());

    let (status, body) = ctx.webhook("invoice_paid", "Ana Silva", "ana@example.com").await;
    assert_eq!(status, StatusCode::OK);
    assert_eq!(body["status"], "success - processing in background");

    ctx.drain().await;
    assert!(ctx.notifier.sent().is_empty());
}

#[tokio::test]
async fn test_login_with_emailed_password() {
    let ctx = TestContext::new();

    ctx.webhook("invoice_paid", "Ana Silva", "ana@example.com").await;
    ctx.drain().await;
    let password = ctx.notifier.sent()[0].password.expose().to_string();

    let (status, body) = ctx.login("ana@example.com", &password).await;
    assert_eq!(status, StatusCode::OK);
    assert_eq!(body, json!({ "status": "success" }));

    let (status, _) = ctx.login("Ana@Example.COM", &password).await;
    assert_eq!(status, StatusCode::OK);
}

#[tokio::test]
async fn test_login_failures_are_indistinguishable() {
    let ctx = TestContext::new();

    ctx.webhook("invoice_paid", "Ana Silva", "ana@example.com").await;
    ctx.drain().await;

    let (wrong_status, wrong_body) = ctx.login("ana@example.com", "wrong-password").await;
    let (unknown_status, unknown_body) = ctx.login("nobody@example.com", "wrong-password").await;

    assert_eq!(wrong_status, StatusCode::UNAUTHORIZED);
    assert_eq!(unknown_status, StatusCode::UNAUTHORIZED);
    assert_eq!(wrong_body, json!({ "status": "invalid_credentials" }));
    assert_eq!(wrong_body, unknown_body);
}

#[tokio::test]
async fn test_login_rejects_invalid_email_syntax() {
    let ctx = TestContext::new();

    let (status, body) = ctx.login("not-an-email", "whatever").await;
    assert_eq!(status, StatusCode::UNPROCESSABLE_ENTITY);
    assert_eq!(body["status"], "validation_error");
}

#[tokio::test]
async fn test_login_store_failure_is_internal_error() {
    let ctx = TestContext::with_store(MemoryUserStore::new().fail_lookups());

    let (status, body) = ctx.login("ana@example.com", "whatever").await;
    assert_eq!(status, StatusCode::INTERNAL_SERVER_ERROR);
    assert_eq!(body["status"], "internal_error");
    assert!(body["message"].is_string());
}

#[tokio::test]
async fn test_root_liveness() {
    let ctx = TestContext::new();

    let (status, body) = ctx.get_json("/").await;
    assert_eq!(status, StatusCode::OK);
    assert_eq!(body, json!({ "message": "accessgate API is up" }));
}

#[tokio::test]
async fn test_root_head_has_empty_body() {
    let ctx = TestContext::new();

    let (status, body) = ctx.request(Method::HEAD, "/", None).await;
    assert_eq!(status, StatusCode::OK);
    assert!(body.is_empty());
}

#[tokio::test]
async fn test_health_reports_store_status() {
    let ctx = TestContext::new();

    let (status, body) = ctx.get_json("/health").await;
    assert_eq!(status, StatusCode::OK);
    assert_eq!(body["status"], "healthy");
    assert_eq!(body["database"], "connected");
    assert_eq!(body["version"], env!("CARGO_PKG_VERSION"));
}

#[tokio::test]
async fn test_security_headers_on_api_responses() {
    let ctx = TestContext::new();

    let response = ctx
        .app
        .clone()
        .oneshot(Request::builder().uri("/").body(Body::empty()).unwrap())
        .await
        .unwrap();

    assert_eq!(response.headers().get("x-content-type-options").unwrap(), "nosniff");
    assert_eq!(response.headers().get("cache-control").unwrap(), "no-store");
}
