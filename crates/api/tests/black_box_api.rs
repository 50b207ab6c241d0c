use std::sync::Arc;

use chrono::{Duration as ChronoDuration, Utc};
use jsonwebtoken::{Algorithm, EncodingKey, Header};
use reqwest::StatusCode;
use serde_json::{Value, json};

use spendtrack_api::app::{build_app, services::AppServices};
use spendtrack_auth::JwtClaims;
use spendtrack_core::UserId;
use spendtrack_infra::AppConfig;

const JWT_SECRET: &str = "test-secret";

struct TestServer {
    base_url: String,
    client: reqwest::Client,
    handle: tokio::task::JoinHandle<()>,
}

impl TestServer {
    async fn spawn() -> Self {
        Self::start(AppServices::in_memory(&test_config())).await
    }

    async fn start(services: AppServices) -> Self {
        // Same router as prod, bound to an ephemeral port.
        let app = build_app(Arc::new(services), JWT_SECRET);
        let listener = tokio::net::TcpListener::bind("127.0.0.1:0")
            .await
            .expect("failed to bind ephemeral port");
        let addr = listener.local_addr().unwrap();
        let base_url = format!("http://{}", addr);

        let handle = tokio::spawn(async move {
            axum::serve(listener, app).await.unwrap();
        });

        Self {
            base_url,
            client: reqwest::Client::new(),
            handle,
        }
    }

    fn url(&self, path: &str) -> String {
        format!("{}{}", self.base_url, path)
    }

    async fn create(&self, token: &str, body: Value) -> (StatusCode, Value) {
        let res = self
            .client
            .post(self.url("/api/expenses"))
            .bearer_auth(token)
            .json(&body)
            .send()
            .await
            .unwrap();
        (res.status(), res.json().await.unwrap())
    }

    async fn list(&self, token: &str) -> Vec<Value> {
        let res = self
            .client
            .get(self.url("/api/expenses"))
            .bearer_auth(token)
            .send()
            .await
            .unwrap();
        assert_eq!(res.status(), StatusCode::OK);
        let body: Value = res.json().await.unwrap();
        assert_eq!(body["message"], "Expenses fetched");
        body["data"].as_array().unwrap().clone()
    }

    async fn update(&self, token: &str, id: &str, body: Value) -> (StatusCode, Value) {
        let res = self
            .client
            .put(self.url(&format!("/api/expenses/{id}")))
            .bearer_auth(token)
            .json(&body)
            .send()
            .await
            .unwrap();
        (res.status(), res.json().await.unwrap())
    }

    async fn delete(&self, token: &str, id: &str) -> (StatusCode, Value) {
        let res = self
            .client
            .delete(self.url(&format!("/api/expenses/{id}")))
            .bearer_auth(token)
            .send()
            .await
            .unwrap();
        (res.status(), res.json().await.unwrap())
    }
}

impl Drop for TestServer {
    fn drop(&mut self) {
        self.handle.abort();
    }
}

fn test_config() -> AppConfig {
    AppConfig::from_lookup(|key| match key {
        "JWT_SECRET" => Some(JWT_SECRET.to_string()),
        _ => None,
    })
    .expect("test config")
}

fn mint_jwt(sub: UserId) -> String {
    mint_claims(&JwtClaims::new(sub, Utc::now(), ChronoDuration::minutes(10)))
}

fn mint_claims(claims: &JwtClaims) -> String {
    jsonwebtoken::encode(
        &Header::new(Algorithm::HS256),
        claims,
        &EncodingKey::from_secret(JWT_SECRET.as_bytes()),
    )
    .expect("failed to encode jwt")
}

fn coffee() -> Value {
    json!({ "title": "Coffee", "amount": 3.5, "category": "Food" })
}

#[tokio::test]
async fn public_endpoints_need_no_token() {
    let srv = TestServer::spawn().await;

    let res = srv.client.get(srv.url("/")).send().await.unwrap();
    assert_eq!(res.status(), StatusCode::OK);
    assert_eq!(res.text().await.unwrap(), "API is running...");

    let res = srv.client.get(srv.url("/health")).send().await.unwrap();
    assert_eq!(res.status(), StatusCode::OK);
}

#[tokio::test]
async fn auth_required_for_protected_endpoints() {
    let srv = TestServer::spawn().await;

    let res = srv.client.get(srv.url("/api/expenses")).send().await.unwrap();
    assert_eq!(res.status(), StatusCode::UNAUTHORIZED);
    let body: Value = res.json().await.unwrap();
    assert_eq!(body["message"], "Not authorized");

    let res = srv
        .client
        .get(srv.url("/api/auth/me"))
        .bearer_auth("not-a-jwt")
        .send()
        .await
        .unwrap();
    assert_eq!(res.status(), StatusCode::UNAUTHORIZED);
}

#[tokio::test]
async fn expired_or_foreign_tokens_are_rejected() {
    let srv = TestServer::spawn().await;
    let now = Utc::now();

    let expired = mint_claims(&JwtClaims {
        sub: UserId::new(),
        issued_at: now - ChronoDuration::hours(2),
        expires_at: now - ChronoDuration::hours(1),
    });
    let foreign = jsonwebtoken::encode(
        &Header::new(Algorithm::HS256),
        &JwtClaims::new(UserId::new(), now, ChronoDuration::minutes(10)),
        &EncodingKey::from_secret(b"someone-else"),
    )
    .unwrap();

    for token in [expired, foreign] {
        let res = srv
            .client
            .get(srv.url("/api/expenses"))
            .bearer_auth(token)
            .send()
            .await
            .unwrap();
        assert_eq!(res.status(), StatusCode::UNAUTHORIZED);
    }
}

#[tokio::test]
async fn signup_login_and_me() {
    let srv = TestServer::spawn().await;

    let res = srv
        .client
        .post(srv.url("/api/auth/signup"))
        .json(&json!({ "name": "Ada", "email": "Ada@Example.com", "password": "secret1" }))
        .send()
        .await
        .unwrap();
    assert_eq!(res.status(), StatusCode::CREATED);
    let body: Value = res.json().await.unwrap();
    assert_eq!(body["message"], "User registered successfully");
    assert_eq!(body["data"]["user"]["email"], "ada@example.com");
    assert!(body["data"]["user"].get("passwordHash").is_none());
    let user_id = body["data"]["user"]["id"].as_str().unwrap().to_string();

    let res = srv
        .client
        .post(srv.url("/api/auth/signup"))
        .json(&json!({ "name": "Again", "email": "ada@example.com", "password": "secret1" }))
        .send()
        .await
        .unwrap();
    assert_eq!(res.status(), StatusCode::CONFLICT);

    let res = srv
        .client
        .post(srv.url("/api/auth/login"))
        .json(&json!({ "email": "ada@example.com", "password": "wrong-password" }))
        .send()
        .await
        .unwrap();
    assert_eq!(res.status(), StatusCode::UNAUTHORIZED);
    let body: Value = res.json().await.unwrap();
    assert_eq!(body["message"], "Invalid credentials");

    let res = srv
        .client
        .post(srv.url("/api/auth/login"))
        .json(&json!({ "email": "ada@example.com", "password": "secret1" }))
        .send()
        .await
        .unwrap();
    assert_eq!(res.status(), StatusCode::OK);
    let body: Value = res.json().await.unwrap();
    assert_eq!(body["message"], "Login successful");
    let token = body["data"]["token"].as_str().unwrap().to_string();

    let res = srv
        .client
        .get(srv.url("/api/auth/me"))
        .bearer_auth(&token)
        .send()
        .await
        .unwrap();
    assert_eq!(res.status(), StatusCode::OK);
    let body: Value = res.json().await.unwrap();
    assert_eq!(body["data"]["user"]["id"], user_id.as_str());
    assert_eq!(body["data"]["user"]["name"], "Ada");

    let res = srv
        .client
        .post(srv.url("/api/auth/logout"))
        .bearer_auth(&token)
        .send()
        .await
        .unwrap();
    assert_eq!(res.status(), StatusCode::OK);
}

#[tokio::test]
async fn signup_input_errors_are_bad_requests() {
    let srv = TestServer::spawn().await;

    let res = srv
        .client
        .post(srv.url("/api/auth/signup"))
        .json(&json!({ "name": "Ada", "email": "ada@example.com", "password": "123" }))
        .send()
        .await
        .unwrap();
    assert_eq!(res.status(), StatusCode::BAD_REQUEST);
    let body: Value = res.json().await.unwrap();
    assert_eq!(body["message"], "Password must be at least 6 characters");

    let res = srv
        .client
        .post(srv.url("/api/auth/signup"))
        .header("content-type", "application/json")
        .body("{not json")
        .send()
        .await
        .unwrap();
    assert_eq!(res.status(), StatusCode::BAD_REQUEST);
    let body: Value = res.json().await.unwrap();
    assert_eq!(body["message"], "Invalid JSON body");
}

#[tokio::test]
async fn demo_user_can_log_in() {
    let config = test_config();
    let services = AppServices::in_memory(&config);
    services.identity.ensure_demo_user(&config.demo_user).await.unwrap();
    let srv = TestServer::start(services).await;

    let res = srv
        .client
        .post(srv.url("/api/auth/login"))
        .json(&json!({ "email": "demo@tracker.com", "password": "password123" }))
        .send()
        .await
        .unwrap();
    assert_eq!(res.status(), StatusCode::OK);
}

#[tokio::test]
async fn rejected_update_leaves_record_and_other_owners_see_nothing() {
    let srv = TestServer::spawn().await;
    let alice = mint_jwt(UserId::new());
    let bob = mint_jwt(UserId::new());

    let (status, body) = srv.create(&alice, coffee()).await;
    assert_eq!(status, StatusCode::CREATED);
    assert_eq!(body["message"], "Expense created");
    assert_eq!(body["data"]["amount"], 3.5);
    let created = body["data"].clone();
    let id = created["id"].as_str().unwrap().to_string();

    let (status, body) = srv
        .update(&alice, &id, json!({ "title": "Coffee", "amount": -1, "category": "Food" }))
        .await;
    assert_eq!(status, StatusCode::BAD_REQUEST);
    assert_eq!(body["message"], "Validation failed");
    assert_eq!(body["errors"], json!(["Amount must be greater than 0"]));
    assert_eq!(srv.list(&alice).await, vec![created.clone()]);

    assert!(srv.list(&bob).await.is_empty());
    let (status, body) = srv.update(&bob, &id, coffee()).await;
    assert_eq!(status, StatusCode::NOT_FOUND);
    assert_eq!(body["message"], "Expense not found");
    let (status, _) = srv.delete(&bob, &id).await;
    assert_eq!(status, StatusCode::NOT_FOUND);

    assert_eq!(srv.list(&alice).await, vec![created]);
}

#[tokio::test]
async fn update_normalizes_and_keeps_identity() {
    let srv = TestServer::spawn().await;
    let owner = UserId::new();
    let token = mint_jwt(owner);

    let (_, body) = srv.create(&token, coffee()).await;
    let created = body["data"].clone();
    let id = created["id"].as_str().unwrap();

    let (status, body) = srv
        .update(
            &token,
            id,
            json!({
                "title": "  Flat white ",
                "amount": "4.25",
                "category": " Food ",
                "date": "2025-03-01",
                "owner": UserId::new().to_string(),
            }),
        )
        .await;
    assert_eq!(status, StatusCode::OK);
    assert_eq!(body["message"], "Expense updated");
    let updated = &body["data"];
    assert_eq!(updated["id"], created["id"]);
    assert_eq!(updated["owner"], owner.to_string().as_str());
    assert_eq!(updated["title"], "Flat white");
    assert_eq!(updated["amount"], 4.25);
    assert_eq!(updated["category"], "Food");
    assert_eq!(updated["createdAt"], created["createdAt"]);
    assert!(updated["date"].as_str().unwrap().starts_with("2025-03-01T00:00:00"));
}

#[tokio::test]
async fn owner_in_create_body_is_ignored() {
    let srv = TestServer::spawn().await;
    let owner = UserId::new();
    let victim = UserId::new();
    let token = mint_jwt(owner);

    let (status, body) = srv
        .create(
            &token,
            json!({ "title": "Lunch", "amount": 12, "category": "Food", "owner": victim.to_string() }),
        )
        .await;
    assert_eq!(status, StatusCode::CREATED);
    assert_eq!(body["data"]["owner"], owner.to_string().as_str());
    assert!(srv.list(&mint_jwt(victim)).await.is_empty());
}

#[tokio::test]
async fn list_is_newest_first() {
    let srv = TestServer::spawn().await;
    let token = mint_jwt(UserId::new());

    let mut ids = Vec::new();
    for title in ["first", "second", "third"] {
        let (status, body) = srv
            .create(&token, json!({ "title": title, "amount": 1, "category": "Other" }))
            .await;
        assert_eq!(status, StatusCode::CREATED);
        ids.push(body["data"]["id"].clone());
    }
    ids.reverse();

    let listed: Vec<Value> = srv.list(&token).await.into_iter().map(|e| e["id"].clone()).collect();
    assert_eq!(listed, ids);
}

#[tokio::test]
async fn validation_reports_first_failure_only() {
    let srv = TestServer::spawn().await;
    let token = mint_jwt(UserId::new());

    let (status, body) = srv
        .create(&token, json!({ "title": "   ", "amount": 0, "category": "", "date": "nope" }))
        .await;
    assert_eq!(status, StatusCode::BAD_REQUEST);
    assert_eq!(body["errors"], json!(["Title is required"]));

    let (status, body) = srv
        .create(&token, json!({ "title": "Taxi", "amount": 20, "category": "Travel", "date": "not a date" }))
        .await;
    assert_eq!(status, StatusCode::BAD_REQUEST);
    assert_eq!(body["errors"], json!(["Date is invalid"]));

    assert!(srv.list(&token).await.is_empty());
}

#[tokio::test]
async fn malformed_ids_and_double_delete() {
    let srv = TestServer::spawn().await;
    let token = mint_jwt(UserId::new());

    let (status, body) = srv.delete(&token, "not-an-id").await;
    assert_eq!(status, StatusCode::BAD_REQUEST);
    assert_eq!(body["message"], "Invalid expense id");

    let (status, body) = srv.update(&token, "12345", json!({ "title": "" })).await;
    assert_eq!(status, StatusCode::BAD_REQUEST);
    assert_eq!(body["message"], "Invalid expense id");

    let (_, body) = srv.create(&token, coffee()).await;
    let created = body["data"].clone();
    let id = created["id"].as_str().unwrap().to_string();

    let (status, body) = srv.delete(&token, &id).await;
    assert_eq!(status, StatusCode::OK);
    assert_eq!(body["message"], "Expense deleted");
    assert_eq!(body["data"]["id"], id.as_str());
    assert_eq!(body["data"], created);

    let (status, _) = srv.delete(&token, &id).await;
    assert_eq!(status, StatusCode::NOT_FOUND);
    assert!(srv.list(&token).await.is_empty());
}

#[tokio::test]
async fn out_of_range_amount_is_a_validation_error() {
    let srv = TestServer::spawn().await;
    let token = mint_jwt(UserId::new());

    let res = srv
        .client
        .post(srv.url("/api/expenses"))
        .bearer_auth(&token)
        .header("content-type", "application/json")
        .body(r#"{"title": "Coffee", "amount": 1e400, "category": "Food"}"#)
        .send()
        .await
        .unwrap();
    assert_eq!(res.status(), StatusCode::BAD_REQUEST);
    let body: Value = res.json().await.unwrap();
    assert_eq!(body["message"], "Validation failed");
    assert_eq!(body["errors"], json!(["Amount must be greater than 0"]));
    assert!(srv.list(&token).await.is_empty());
}
