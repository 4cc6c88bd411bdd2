//! Shared fixtures for the HTTP integration tests.
//!
//! The router runs against the in-memory store and accepts HS256 identity
//! tokens signed with a test secret, so no database or identity provider
//! is needed.

// Not every test binary uses every helper.
#![allow(dead_code)]

use std::sync::Arc;

use alumni_events_api::{
    app::{create_app, AppState},
    config::{
        AttendanceConfig, Config, DatabaseConfig, JwtAuthConfig, LoggingConfig, SecurityConfig,
        ServerConfig,
    },
};
use axum::{
    body::Body,
    http::{header, Method, Request, StatusCode},
    response::Response,
    Router,
};
use chrono::{Duration, Utc};
use domain::store::InMemoryEventStore;
use fake::faker::company::en::CatchPhrase;
use fake::Fake;
use serde_json::{json, Value};
use shared::jwt::{IdentityClaims, JwtConfig, Role};
use tower::ServiceExt;
use uuid::Uuid;

pub const TEST_JWT_SECRET: &str = "integration-test-secret-0123456789";
pub const TEST_APP_BASE_URL: &str = "https://alumni.example.edu";

pub fn test_config() -> Config {
    Config {
        server: ServerConfig {
            host: "127.0.0.1".to_string(),
            port: 8080,
            request_timeout_secs: 30,
            app_base_url: TEST_APP_BASE_URL.to_string(),
        },
        database: DatabaseConfig {
            url: "postgres://unused@localhost/unused".to_string(),
            max_connections: 5,
            min_connections: 1,
            connect_timeout_secs: 5,
            idle_timeout_secs: 60,
        },
        logging: LoggingConfig {
            level: "warn".to_string(),
            format: "pretty".to_string(),
        },
        security: SecurityConfig::default(),
        jwt: JwtAuthConfig {
            public_key: String::new(),
            shared_secret: TEST_JWT_SECRET.to_string(),
            leeway_secs: 0,
        },
        attendance: AttendanceConfig::default(),
    }
}

/// Router plus handles the tests poke at directly.
#[derive(Clone)]
pub struct TestApp {
    pub router: Router,
    pub store: Arc<InMemoryEventStore>,
    signer: JwtConfig,
}

impl TestApp {
    pub fn new() -> Self {
        let store = Arc::new(InMemoryEventStore::new());
        let state = AppState::new(test_config(), store.clone()).expect("app state");
        let signer = JwtConfig::from_shared_secret(TEST_JWT_SECRET, 0).expect("signer");
        Self {
            router: create_app(state),
            store,
            signer,
        }
    }

    pub async fn send(&self, request: Request<Body>) -> Response {
        self.router.clone().oneshot(request).await.unwrap()
    }

    /// Sends and returns status plus parsed JSON body (`Null` if empty).
    pub async fn call(&self, request: Request<Body>) -> (StatusCode, Value) {
        let response = self.send(request).await;
        let status = response.status();
        (status, parse_response_body(response).await)
    }

    pub fn admin_token(&self) -> String {
        self.sign(IdentityClaims::new(
            Uuid::new_v4(),
            Role::Admin,
            "",
            "",
            None,
            3600,
        ))
    }

    /// A fresh alumnus with the given batch and department.
    pub fn alumni(&self, batch: &str, department: &str) -> TestAlumnus {
        self.alumni_with_tier(batch, department, None)
    }

    pub fn alumni_with_tier(
        &self,
        batch: &str,
        department: &str,
        tier: Option<&str>,
    ) -> TestAlumnus {
        let id = Uuid::new_v4();
        let token = self.sign(IdentityClaims::new(
            id,
            Role::Alumni,
            batch,
            department,
            tier.map(str::to_string),
            3600,
        ));
        TestAlumnus { id, token }
    }

    pub fn sign(&self, claims: IdentityClaims) -> String {
        self.signer.sign(&claims).expect("sign test token")
    }

    /// Creates an event through the admin API and returns its ID.
    pub async fn create_event(&self, body: Value) -> Uuid {
        let (status, json) = self
            .call(json_request_with_auth(
                Method::POST,
                "/api/v1/admin/events",
                body,
                &self.admin_token(),
            ))
            .await;
        assert_eq!(status, StatusCode::CREATED, "create event failed: {json}");
        json["id"].as_str().unwrap().parse().unwrap()
    }

    pub async fn transition(&self, event_id: Uuid, action: &str) -> (StatusCode, Value) {
        self.call(json_request_with_auth(
            Method::POST,
            &format!("/api/v1/admin/events/{event_id}/{action}"),
            json!({}),
            &self.admin_token(),
        ))
        .await
    }

    /// Creates and publishes an event with open registration.
    pub async fn published_event(&self, body: Value) -> Uuid {
        let event_id = self.create_event(body).await;
        let (status, json) = self.transition(event_id, "publish").await;
        assert_eq!(status, StatusCode::OK, "publish failed: {json}");
        event_id
    }

    pub async fn register(&self, event_id: Uuid, alumnus: &TestAlumnus) -> (StatusCode, Value) {
        self.call(json_request_with_auth(
            Method::POST,
            &format!("/api/v1/events/{event_id}/registrations"),
            json!({ "fee_paid": true }),
            &alumnus.token,
        ))
        .await
    }

    pub async fn get_event(&self, event_id: Uuid, token: &str) -> (StatusCode, Value) {
        self.call(get_request_with_auth(
            &format!("/api/v1/events/{event_id}"),
            token,
        ))
        .await
    }

    /// Issues an attendance token and returns the plaintext secret.
    pub async fn issue_token(&self, event_id: Uuid) -> String {
        let (status, json) = self
            .call(json_request_with_auth(
                Method::POST,
                &format!("/api/v1/admin/events/{event_id}/attendance-token"),
                json!({}),
                &self.admin_token(),
            ))
            .await;
        assert_eq!(status, StatusCode::CREATED, "issue token failed: {json}");
        json["token"].as_str().unwrap().to_string()
    }

    pub async fn mark(
        &self,
        event_id: Uuid,
        token: &str,
        alumnus: &TestAlumnus,
    ) -> (StatusCode, Value) {
        self.call(json_request_with_auth(
            Method::POST,
            &format!("/api/v1/events/{event_id}/attendance"),
            json!({ "token": token }),
            &alumnus.token,
        ))
        .await
    }
}

pub struct TestAlumnus {
    pub id: Uuid,
    pub token: String,
}

/// Event body with registration open now and the event a week out.
pub fn event_body(capacity: Option<i32>) -> Value {
    let now = Utc::now();
    let start = now + Duration::days(7);
    let title: String = CatchPhrase().fake();
    let mut body = json!({
        "title": title,
        "start_date_time": start,
        "end_date_time": start + Duration::hours(4),
        "registration_opens_at": now - Duration::days(1),
        "registration_closes_at": start,
    });
    if let Some(capacity) = capacity {
        body["capacity"] = json!(capacity);
    }
    body
}

pub fn json_request_with_auth(
    method: Method,
    uri: &str,
    body: Value,
    token: &str,
) -> Request<Body> {
    Request::builder()
        .method(method)
        .uri(uri)
        .header(header::CONTENT_TYPE, "application/json")
        .header(header::AUTHORIZATION, format!("Bearer {}", token))
        .body(Body::from(body.to_string()))
        .unwrap()
}

pub fn get_request_with_auth(uri: &str, token: &str) -> Request<Body> {
    Request::builder()
        .method(Method::GET)
        .uri(uri)
        .header(header::AUTHORIZATION, format!("Bearer {}", token))
        .body(Body::empty())
        .unwrap()
}

pub fn delete_request_with_auth(uri: &str, token: &str) -> Request<Body> {
    Request::builder()
        .method(Method::DELETE)
        .uri(uri)
        .header(header::AUTHORIZATION, format!("Bearer {}", token))
        .body(Body::empty())
        .unwrap()
}

pub async fn parse_response_body(response: Response) -> Value {
    let body = axum::body::to_bytes(response.into_body(), usize::MAX)
        .await
        .unwrap();
    serde_json::from_slice(&body).unwrap_or(Value::Null)
}
