//! Test helpers for review-service integration tests.
//!
//! `TestApp::spawn` boots the real HTTP server on a random port against a
//! throwaway MongoDB database. When MongoDB is not reachable it returns `None`
//! and the calling test skips itself.

#![allow(dead_code)]

use axum::{
    body::Body,
    http::{HeaderMap, Request, StatusCode},
    Router,
};
use http_body_util::BodyExt;
use review_service::config::{
    CorsConfig, Environment, JwtConfig, MongoConfig, RateLimitConfig, ReviewConfig, StorageConfig,
};
use review_service::services::MongoDb;
use review_service::startup::{AppState, Application};
use service_core::config::Config as CoreConfig;
use std::net::{IpAddr, Ipv4Addr};
use std::path::Path;
use tower::ServiceExt;
use uuid::Uuid;

pub const TEST_JWT_SECRET: &str = "integration-test-secret";
pub const TEST_PASSWORD: &str = "s3cret-pass";
pub const TEST_BOUNDARY: &str = "XREVIEWBOUNDARY";

/// Nothing listens here, so every query fails after a short server selection.
pub const UNREACHABLE_MONGODB_URI: &str =
    "mongodb://127.0.0.1:9/?serverSelectionTimeoutMS=300&connectTimeoutMS=300";

pub fn mongo_uri() -> String {
    std::env::var("TEST_MONGODB_URI").unwrap_or_else(|_| {
        "mongodb://localhost:27017/?serverSelectionTimeoutMS=2000".to_string()
    })
}

/// Config for tests: random port, unique database and upload dir, generous rate limits.
pub fn test_config(db_name: &str, upload_dir: &str) -> ReviewConfig {
    ReviewConfig {
        common: CoreConfig {
            host: IpAddr::V4(Ipv4Addr::LOCALHOST),
            port: 0,
        },
        environment: Environment::Dev,
        service_name: "review-service".to_string(),
        log_level: "info".to_string(),
        otlp_endpoint: None,
        mongodb: MongoConfig {
            uri: mongo_uri(),
            database: db_name.to_string(),
        },
        jwt: JwtConfig {
            secret: TEST_JWT_SECRET.to_string(),
            expiry_hours: 12,
        },
        storage: StorageConfig {
            upload_dir: upload_dir.to_string(),
            max_file_bytes: 1024 * 1024,
        },
        cors: CorsConfig {
            frontend_origin: None,
        },
        rate_limit: RateLimitConfig {
            login_attempts: 1000,
            login_window_seconds: 60,
            register_attempts: 1000,
            register_window_seconds: 60,
        },
    }
}

pub struct TestApp {
    pub address: String,
    pub port: u16,
    pub db: MongoDb,
    pub db_name: String,
    pub upload_dir: String,
    pub client: reqwest::Client,
}

impl TestApp {
    pub async fn spawn() -> Option<Self> {
        Self::spawn_with(|_| {}).await
    }

    /// Spawn with a tweaked config (e.g. tight rate limits).
    pub async fn spawn_with(customize: impl FnOnce(&mut ReviewConfig)) -> Option<Self> {
        let db_name = format!("review_test_{}", Uuid::new_v4().simple());
        let upload_dir = format!("target/test-uploads-{}", Uuid::new_v4());

        let reachable = MongoDb::connect(&mongo_uri(), &db_name).await.ok()?;
        if reachable.health_check().await.is_err() {
            eprintln!("MongoDB not reachable at {}, skipping test", mongo_uri());
            return None;
        }

        let mut config = test_config(&db_name, &upload_dir);
        customize(&mut config);

        let app = Application::build(config)
            .await
            .expect("Failed to build test application");

        let port = app.port();
        let db = app.db().clone();
        let address = format!("http://127.0.0.1:{}", port);

        tokio::spawn(async move {
            app.run_until_stopped().await.ok();
        });

        let client = reqwest::Client::new();
        let health_url = format!("{}/health", address);
        for _ in 0..50 {
            if client.get(&health_url).send().await.is_ok() {
                break;
            }
            tokio::time::sleep(tokio::time::Duration::from_millis(50)).await;
        }

        Some(TestApp {
            address,
            port,
            db,
            db_name,
            upload_dir,
            client,
        })
    }

    pub fn url(&self, path: &str) -> String {
        format!("{}{}", self.address, path)
    }

    pub async fn register(&self, fullname: &str, password: &str) -> reqwest::Response {
        self.client
            .post(self.url("/register"))
            .json(&serde_json::json!({
                "fullname": fullname,
                "department": "CSE",
                "password": password,
            }))
            .send()
            .await
            .expect("Failed to execute request")
    }

    pub async fn login(&self, fullname: &str, password: &str) -> reqwest::Response {
        self.client
            .post(self.url("/teacher-login"))
            .json(&serde_json::json!({ "fullname": fullname, "password": password }))
            .send()
            .await
            .expect("Failed to execute request")
    }

    /// Register a fresh teacher and return a bearer token for them.
    pub async fn teacher_token(&self, fullname: &str) -> String {
        let res = self.register(fullname, TEST_PASSWORD).await;
        assert!(res.status().is_success(), "register failed: {}", res.status());

        let res = self.login(fullname, TEST_PASSWORD).await;
        assert!(res.status().is_success(), "login failed: {}", res.status());
        let body: serde_json::Value = res.json().await.expect("Failed to parse JSON");
        body["token"]
            .as_str()
            .expect("token missing from login response")
            .to_string()
    }

    pub async fn post_json(
        &self,
        path: &str,
        token: &str,
        body: serde_json::Value,
    ) -> reqwest::Response {
        self.client
            .post(self.url(path))
            .bearer_auth(token)
            .json(&body)
            .send()
            .await
            .expect("Failed to execute request")
    }

    pub async fn get_auth(&self, path: &str, token: &str) -> reqwest::Response {
        self.client
            .get(self.url(path))
            .bearer_auth(token)
            .send()
            .await
            .expect("Failed to execute request")
    }

    /// POST a review form to `/saveReview` or `/submitReview`.
    pub async fn post_review(
        &self,
        path: &str,
        token: &str,
        review_data: serde_json::Value,
        files: &[(&str, &str, &[u8])],
    ) -> reqwest::Response {
        let mut form = reqwest::multipart::Form::new().text("reviewData", review_data.to_string());
        for (name, mime, bytes) in files {
            form = form.part(
                "files",
                reqwest::multipart::Part::bytes(bytes.to_vec())
                    .file_name(name.to_string())
                    .mime_str(mime)
                    .expect("valid mime type"),
            );
        }

        self.client
            .post(self.url(path))
            .bearer_auth(token)
            .multipart(form)
            .send()
            .await
            .expect("Failed to execute request")
    }

    /// Drop the test database and upload directory.
    pub async fn cleanup(&self) {
        let _ = self.db.client().database(&self.db_name).drop(None).await;
        let _ = tokio::fs::remove_dir_all(&self.upload_dir).await;
    }
}

/// State for router-level tests. The Mongo client is lazy and points at
/// [`UNREACHABLE_MONGODB_URI`], so requests that reach a query fail with 500.
pub async fn offline_state(upload_dir: &Path) -> AppState {
    let mut config = test_config(
        "review_offline",
        upload_dir.to_str().expect("utf-8 temp path"),
    );
    config.mongodb.uri = UNREACHABLE_MONGODB_URI.to_string();
    AppState::new(config)
        .await
        .expect("Failed to build application state")
}

/// Drive one request through the router; the body is parsed as JSON when possible.
pub async fn send(router: &Router, request: Request<Body>) -> (StatusCode, HeaderMap, serde_json::Value) {
    let response = router
        .clone()
        .oneshot(request)
        .await
        .expect("router is infallible");
    let status = response.status();
    let headers = response.headers().clone();
    let bytes = response
        .into_body()
        .collect()
        .await
        .expect("Failed to read body")
        .to_bytes();
    let body = serde_json::from_slice(&bytes).unwrap_or(serde_json::Value::Null);
    (status, headers, body)
}

/// `multipart/form-data` body with a `reviewData` part and `files` parts,
/// delimited by [`TEST_BOUNDARY`].
pub fn review_form_body(review_data: &str, files: &[(&str, &str, &[u8])]) -> Vec<u8> {
    let mut body = Vec::new();
    body.extend_from_slice(
        format!(
            "--{TEST_BOUNDARY}\r\nContent-Disposition: form-data; name=\"reviewData\"\r\n\r\n{review_data}\r\n"
        )
        .as_bytes(),
    );
    for (name, mime, bytes) in files {
        body.extend_from_slice(
            format!(
                "--{TEST_BOUNDARY}\r\nContent-Disposition: form-data; name=\"files\"; filename=\"{name}\"\r\nContent-Type: {mime}\r\n\r\n"
            )
            .as_bytes(),
        );
        body.extend_from_slice(bytes);
        body.extend_from_slice(b"\r\n");
    }
    body.extend_from_slice(format!("--{TEST_BOUNDARY}--\r\n").as_bytes());
    body
}

pub fn review_form_request(path: &str, token: &str, body: Vec<u8>) -> Request<Body> {
    Request::builder()
        .method("POST")
        .uri(path)
        .header("authorization", format!("Bearer {}", token))
        .header(
            "content-type",
            format!("multipart/form-data; boundary={}", TEST_BOUNDARY),
        )
        .body(Body::from(body))
        .unwrap()
}

/// Number of entries in an upload directory.
pub fn stored_file_count(dir: &Path) -> usize {
    std::fs::read_dir(dir).map(|entries| entries.count()).unwrap_or(0)
}
