//! In-process router tests.
//!
//! Every request here is answered before the handler reaches the database,
//! so the suite runs without `PostgreSQL`.

#![allow(clippy::unwrap_used)]

use axum::{
    body::{Body, to_bytes},
    http::{Method, Request, StatusCode, header},
    response::Response,
};
use chrono::{Duration, Utc};
use serde_json::{Value, json};
use tower::ServiceExt;

use babycash_api::services::auth::JwtKeys;
use babycash_core::{UserId, UserRole};
use babycash_integration_tests::{TEST_JWT_SECRET, TEST_ORIGIN, test_app};

async fn send(request: Request<Body>) -> Response {
    test_app().oneshot(request).await.unwrap()
}

async fn get(uri: &str) -> Response {
    send(Request::builder().uri(uri).body(Body::empty()).unwrap()).await
}

async fn post_json(uri: &str, body: &Value) -> Response {
    send(
        Request::builder()
            .method(Method::POST)
            .uri(uri)
            .header(header::CONTENT_TYPE, "application/json")
            .body(Body::from(body.to_string()))
            .unwrap(),
    )
    .await
}

async fn get_with_token(uri: &str, token: &str) -> Response {
    send(
        Request::builder()
            .uri(uri)
            .header(header::AUTHORIZATION, format!("Bearer {token}"))
            .body(Body::empty())
            .unwrap(),
    )
    .await
}

async fn json_body(response: Response) -> Value {
    let bytes = to_bytes(response.into_body(), usize::MAX).await.unwrap();
    serde_json::from_slice(&bytes).unwrap()
}

// ============================================================================
// Probes
// ============================================================================

#[tokio::test]
async fn test_liveness_probe() {
    let response = get("/health").await;
    assert_eq!(response.status(), StatusCode::OK);

    let bytes = to_bytes(response.into_body(), usize::MAX).await.unwrap();
    assert_eq!(&bytes[..], b"ok");
}

#[tokio::test]
async fn test_api_health_reports_service() {
    let response = get("/api/health").await;
    assert_eq!(response.status(), StatusCode::OK);

    let body = json_body(response).await;
    assert_eq!(body["status"], "UP");
    assert_eq!(body["service"], "babycash-api");
    assert!(body["timestamp"].is_string());
}

#[tokio::test]
async fn test_readiness_fails_without_database() {
    let response = get("/health/ready").await;
    assert_eq!(response.status(), StatusCode::SERVICE_UNAVAILABLE);
}

// ============================================================================
// Middleware
// ============================================================================

#[tokio::test]
async fn test_security_headers_on_every_response() {
    let response = get("/api/health").await;
    let headers = response.headers();

    assert_eq!(headers["x-frame-options"], "DENY");
    assert_eq!(headers["x-content-type-options"], "nosniff");
    assert_eq!(headers["cache-control"], "no-store");
    assert!(headers.contains_key("referrer-policy"));
    assert!(headers.contains_key("content-security-policy"));
}

#[tokio::test]
async fn test_request_id_generated_and_echoed() {
    let response = get("/health").await;
    let generated = response.headers()["x-request-id"].to_str().unwrap();
    assert_eq!(generated.len(), 36);

    let response = send(
        Request::builder()
            .uri("/health")
            .header("x-request-id", "edge-7f3a")
            .body(Body::empty())
            .unwrap(),
    )
    .await;
    assert_eq!(response.headers()["x-request-id"], "edge-7f3a");
}

#[tokio::test]
async fn test_cors_preflight_for_allowed_origin() {
    let response = send(
        Request::builder()
            .method(Method::OPTIONS)
            .uri("/api/cart")
            .header(header::ORIGIN, TEST_ORIGIN)
            .header(header::ACCESS_CONTROL_REQUEST_METHOD, "POST")
            .header(header::ACCESS_CONTROL_REQUEST_HEADERS, "authorization,content-type")
            .body(Body::empty())
            .unwrap(),
    )
    .await;

    assert!(response.status().is_success());
    let headers = response.headers();
    assert_eq!(headers[header::ACCESS_CONTROL_ALLOW_ORIGIN], TEST_ORIGIN);
    assert_eq!(headers[header::ACCESS_CONTROL_ALLOW_CREDENTIALS], "true");
}

#[tokio::test]
async fn test_cors_ignores_unknown_origin() {
    let response = send(
        Request::builder()
            .uri("/api/health")
            .header(header::ORIGIN, "https://evil.example")
            .body(Body::empty())
            .unwrap(),
    )
    .await;

    assert_eq!(response.status(), StatusCode::OK);
    assert!(!response.headers().contains_key(header::ACCESS_CONTROL_ALLOW_ORIGIN));
}

// ============================================================================
// Authentication
// ============================================================================

#[tokio::test]
async fn test_protected_routes_require_token() {
    for uri in ["/api/cart", "/api/orders", "/api/loyalty/points", "/api/users/profile"] {
        let response = get(uri).await;
        assert_eq!(response.status(), StatusCode::UNAUTHORIZED, "{uri}");
    }

    let body = json_body(get("/api/admin/orders").await).await;
    assert_eq!(body["status"], 401);
    assert_eq!(body["error"], "Unauthorized");
    assert_eq!(body["message"], "Missing bearer token");
}

#[tokio::test]
async fn test_non_bearer_scheme_rejected() {
    let response = send(
        Request::builder()
            .uri("/api/cart")
            .header(header::AUTHORIZATION, "Basic YW5hOnNlY3JldA==")
            .body(Body::empty())
            .unwrap(),
    )
    .await;
    assert_eq!(response.status(), StatusCode::UNAUTHORIZED);
}

#[tokio::test]
async fn test_garbage_token_rejected() {
    let response = get_with_token("/api/cart", "not-a-jwt").await;
    assert_eq!(response.status(), StatusCode::UNAUTHORIZED);

    let body = json_body(response).await;
    assert_eq!(body["message"], "Invalid or expired token");
}

#[tokio::test]
async fn test_token_signed_with_other_key_rejected() {
    let keys = JwtKeys::from_secret(b"Zq8!rT4@wY1#uI6$oP3%aS9^dF2&gH7*", Duration::minutes(15));
    let token = keys
        .issue_at(UserId::new(1), "ana@babycash.com", UserRole::Admin, Utc::now())
        .unwrap();

    let response = get_with_token("/api/admin/orders/stats", &token).await;
    assert_eq!(response.status(), StatusCode::UNAUTHORIZED);
}

#[tokio::test]
async fn test_expired_token_rejected() {
    let keys = JwtKeys::from_secret(TEST_JWT_SECRET.as_bytes(), Duration::minutes(15));
    let token = keys
        .issue_at(
            UserId::new(1),
            "ana@babycash.com",
            UserRole::User,
            Utc::now() - Duration::hours(2),
        )
        .unwrap();

    let response = get_with_token("/api/cart", &token).await;
    assert_eq!(response.status(), StatusCode::UNAUTHORIZED);
}

// ============================================================================
// Validation
// ============================================================================

#[tokio::test]
async fn test_register_reports_every_invalid_field() {
    let response = post_json(
        "/api/auth/register",
        &json!({
            "email": "not-an-email",
            "password": "short",
            "firstName": "A",
            "lastName": "Gómez",
            "phone": "12345"
        }),
    )
    .await;
    assert_eq!(response.status(), StatusCode::BAD_REQUEST);

    let body = json_body(response).await;
    assert_eq!(body["message"], "Validation failed");
    let errors = body["errors"].as_object().unwrap();
    assert!(errors.contains_key("email"));
    assert!(errors.contains_key("password"));
    assert!(errors.contains_key("firstName"));
    assert!(errors.contains_key("phone"));
    assert!(!errors.contains_key("lastName"));
}

#[tokio::test]
async fn test_login_requires_fields() {
    let response = post_json("/api/auth/login", &json!({"email": "", "password": ""})).await;
    assert_eq!(response.status(), StatusCode::BAD_REQUEST);

    let body = json_body(response).await;
    assert!(body["errors"]["email"].is_string());
    assert!(body["errors"]["password"].is_string());
}

#[tokio::test]
async fn test_reset_password_rejects_malformed_code() {
    let response = post_json(
        "/api/auth/reset-password",
        &json!({
            "code": "12ab",
            "newPassword": "Nuev@Clave2024",
            "confirmPassword": "Nuev@Clave2024"
        }),
    )
    .await;
    assert_eq!(response.status(), StatusCode::BAD_REQUEST);
    assert_eq!(json_body(response).await["message"], "Invalid or expired reset code");
}

#[tokio::test]
async fn test_forgot_password_rejects_bad_email() {
    let response = post_json("/api/auth/forgot-password", &json!({"email": "ana@"})).await;
    assert_eq!(response.status(), StatusCode::BAD_REQUEST);
    assert_eq!(json_body(response).await["message"], "Invalid email address");
}

#[tokio::test]
async fn test_unknown_product_category_is_bad_request() {
    let response = get("/api/products/category/SHOES").await;
    assert_eq!(response.status(), StatusCode::BAD_REQUEST);

    let response = get("/api/products?category=shoes").await;
    assert_eq!(response.status(), StatusCode::BAD_REQUEST);
}

#[tokio::test]
async fn test_contact_form_validation() {
    let response = post_json(
        "/api/contact/send",
        &json!({
            "name": "",
            "email": "ana@babycash.com",
            "subject": "Pedido",
            "message": "Hola"
        }),
    )
    .await;
    assert_eq!(response.status(), StatusCode::BAD_REQUEST);
    assert!(json_body(response).await["errors"]["name"].is_string());
}

#[tokio::test]
async fn test_contact_form_rejects_values_longer_than_columns() {
    let response = post_json(
        "/api/contact/send",
        &json!({
            "name": "N".repeat(101),
            "email": "ana@babycash.com",
            "phone": format!("+{}", "1".repeat(20)),
            "subject": "Pedido mayorista",
            "message": "M".repeat(1001)
        }),
    )
    .await;
    assert_eq!(response.status(), StatusCode::BAD_REQUEST);

    let body = json_body(response).await;
    assert_eq!(body["errors"]["phone"], "must be a valid phone number");
    assert!(body["errors"]["name"].is_string());
    assert!(body["errors"]["message"].is_string());
    assert!(body["errors"]["subject"].is_null());
}

#[tokio::test]
async fn test_unknown_route_is_not_found() {
    let response = get("/api/does-not-exist").await;
    assert_eq!(response.status(), StatusCode::NOT_FOUND);
}
