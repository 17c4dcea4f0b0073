//! End-to-end shopper flows against a running API.
//!
//! These tests require:
//! - A running `PostgreSQL` database, migrated and seeded (`bc-cli migrate`, `bc-cli seed`)
//! - The API running with `API_RATE_LIMIT=false` (`cargo run -p babycash-api`)
//!
//! Run with: `cargo test -p babycash-integration-tests -- --ignored`

#![allow(clippy::unwrap_used, clippy::expect_used)]

use reqwest::{Client, StatusCode};
use serde_json::{Value, json};
use uuid::Uuid;

use babycash_integration_tests::api_base_url;

const PASSWORD: &str = "Bebe2024seguro";

struct Session {
    client: Client,
    token: String,
    refresh_token: String,
}

/// Register a fresh shopper with a unique email.
async fn register(client: &Client) -> (String, Session) {
    let email = format!("flow-{}@babycash.test", Uuid::new_v4().simple());
    let resp = client
        .post(format!("{}/api/auth/register", api_base_url()))
        .json(&json!({
            "email": email,
            "password": PASSWORD,
            "firstName": "Laura",
            "lastName": "Martínez",
            "phone": "3104567890"
        }))
        .send()
        .await
        .expect("Failed to register");
    assert_eq!(resp.status(), StatusCode::CREATED);

    let body: Value = resp.json().await.unwrap();
    assert_eq!(body["role"], "USER");
    (
        email,
        Session {
            client: client.clone(),
            token: body["token"].as_str().unwrap().to_string(),
            refresh_token: body["refreshToken"].as_str().unwrap().to_string(),
        },
    )
}

impl Session {
    async fn get(&self, path: &str) -> reqwest::Response {
        self.client
            .get(format!("{}{path}", api_base_url()))
            .bearer_auth(&self.token)
            .send()
            .await
            .expect("Request failed")
    }

    async fn send_json(&self, method: reqwest::Method, path: &str, body: &Value) -> reqwest::Response {
        self.client
            .request(method, format!("{}{path}", api_base_url()))
            .bearer_auth(&self.token)
            .json(body)
            .send()
            .await
            .expect("Request failed")
    }
}

#[tokio::test]
#[ignore = "requires a running API and database"]
async fn test_register_login_and_refresh_rotation() {
    let client = Client::new();
    let (email, session) = register(&client).await;

    let resp = client
        .post(format!("{}/api/auth/login", api_base_url()))
        .json(&json!({"email": email.to_uppercase(), "password": PASSWORD}))
        .send()
        .await
        .unwrap();
    assert_eq!(resp.status(), StatusCode::OK);

    let resp = client
        .post(format!("{}/api/auth/login", api_base_url()))
        .json(&json!({"email": email, "password": "wrong-pass1"}))
        .send()
        .await
        .unwrap();
    assert_eq!(resp.status(), StatusCode::UNAUTHORIZED);

    let refresh = |token: String| {
        let client = client.clone();
        async move {
            client
                .post(format!("{}/api/auth/refresh", api_base_url()))
                .json(&json!({"refreshToken": token}))
                .send()
                .await
                .unwrap()
        }
    };

    let resp = refresh(session.refresh_token.clone()).await;
    assert_eq!(resp.status(), StatusCode::OK);
    let rotated: Value = resp.json().await.unwrap();
    assert_ne!(rotated["refreshToken"], session.refresh_token.as_str());

    // The rotated-out token is now revoked.
    let resp = refresh(session.refresh_token.clone()).await;
    assert_eq!(resp.status(), StatusCode::BAD_REQUEST);
}

#[tokio::test]
#[ignore = "requires a running API and database"]
async fn test_profile_update() {
    let client = Client::new();
    let (email, session) = register(&client).await;

    let resp = session
        .send_json(
            reqwest::Method::PUT,
            "/api/users/profile",
            &json!({
                "firstName": "Laura Sofía",
                "lastName": "Martínez",
                "address": "Carrera 7 #72-41, Bogotá"
            }),
        )
        .await;
    assert_eq!(resp.status(), StatusCode::OK);

    let profile: Value = session.get("/api/users/profile").await.json().await.unwrap();
    assert_eq!(profile["email"], email.as_str());
    assert_eq!(profile["firstName"], "Laura Sofía");
    assert_eq!(profile["phone"], Value::Null);
}

#[tokio::test]
#[ignore = "requires a running API and seeded database"]
async fn test_cart_checkout_and_cancel() {
    let client = Client::new();
    let (_, session) = register(&client).await;

    let products: Value = session.get("/api/products?size=5").await.json().await.unwrap();
    let product = products["content"]
        .as_array()
        .and_then(|p| p.iter().find(|p| p["stock"].as_i64().unwrap_or(0) >= 2))
        .expect("seeded catalog should have a product in stock")
        .clone();
    let product_id = product["id"].as_i64().unwrap();

    let resp = session
        .send_json(
            reqwest::Method::POST,
            "/api/cart/add",
            &json!({"productId": product_id, "quantity": 2}),
        )
        .await;
    assert_eq!(resp.status(), StatusCode::OK);
    let cart: Value = resp.json().await.unwrap();
    assert_eq!(cart["totalItems"], 2);

    let resp = session
        .send_json(
            reqwest::Method::POST,
            "/api/orders",
            &json!({
                "shippingAddress": "Calle 100 #15-20, Bogotá",
                "items": [{"productId": product_id, "quantity": 2}]
            }),
        )
        .await;
    assert_eq!(resp.status(), StatusCode::CREATED);
    let order: Value = resp.json().await.unwrap();
    assert_eq!(order["status"], "PENDING");
    let order_number = order["orderNumber"].as_str().unwrap();

    let by_number: Value = session
        .get(&format!("/api/orders/number/{order_number}"))
        .await
        .json()
        .await
        .unwrap();
    assert_eq!(by_number["id"], order["id"]);

    let resp = session
        .send_json(
            reqwest::Method::PUT,
            &format!("/api/orders/{}/cancel", order["id"]),
            &json!({}),
        )
        .await;
    assert_eq!(resp.status(), StatusCode::OK);
    let cancelled: Value = resp.json().await.unwrap();
    assert_eq!(cancelled["status"], "CANCELLED");

    // Cancelling twice is a business error.
    let resp = session
        .send_json(
            reqwest::Method::PUT,
            &format!("/api/orders/{}/cancel", order["id"]),
            &json!({}),
        )
        .await;
    assert_eq!(resp.status(), StatusCode::BAD_REQUEST);

    // No points for an order that never reached delivery.
    let points: Value = session.get("/api/loyalty/points").await.json().await.unwrap();
    assert_eq!(points["totalPoints"], 0);
    assert_eq!(points["tier"], "BRONZE");
}

#[tokio::test]
#[ignore = "requires a running API and database"]
async fn test_shopper_cannot_reach_admin_routes() {
    let client = Client::new();
    let (_, session) = register(&client).await;

    let resp = session.get("/api/admin/orders").await;
    assert_eq!(resp.status(), StatusCode::FORBIDDEN);

    let resp = session.get("/api/contact/admin/messages").await;
    assert_eq!(resp.status(), StatusCode::FORBIDDEN);
}
