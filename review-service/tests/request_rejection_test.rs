//! Bodies the extractors cannot read still come back as `{ "error": ... }` JSON.

mod common;

use axum::{
    body::Body,
    http::{header, Request, StatusCode},
};
use common::{offline_state, send};
use review_service::startup::build_router;

#[tokio::test]
async fn forgot_password_without_body_is_acknowledged() {
    let dir = tempfile::tempdir().unwrap();
    let router = build_router(offline_state(dir.path()).await);

    let request = Request::builder()
        .method("POST")
        .uri("/forgot-password")
        .body(Body::empty())
        .unwrap();

    let (status, _, body) = send(&router, request).await;
    assert_eq!(status, StatusCode::OK);
    assert!(body["message"]
        .as_str()
        .unwrap_or_default()
        .ends_with("(You entered: )"));
}

#[tokio::test]
async fn malformed_login_json_is_a_json_error() {
    let dir = tempfile::tempdir().unwrap();
    let router = build_router(offline_state(dir.path()).await);

    let request = Request::builder()
        .method("POST")
        .uri("/teacher-login")
        .header(header::CONTENT_TYPE, "application/json")
        .body(Body::from(r#"{"fullname": "Ada", "password":"#))
        .unwrap();

    let (status, headers, body) = send(&router, request).await;
    assert_eq!(status, StatusCode::BAD_REQUEST);
    assert_eq!(
        headers.get(header::CONTENT_TYPE).unwrap(),
        "application/json"
    );
    assert!(body["error"]
        .as_str()
        .unwrap_or_default()
        .starts_with("Json parse error"));
}

#[tokio::test]
async fn login_without_content_type_is_a_json_error() {
    let dir = tempfile::tempdir().unwrap();
    let router = build_router(offline_state(dir.path()).await);

    let request = Request::builder()
        .method("POST")
        .uri("/teacher-login")
        .body(Body::from(r#"{"fullname":"Ada","password":"x"}"#))
        .unwrap();

    let (status, _, body) = send(&router, request).await;
    assert_eq!(status, StatusCode::BAD_REQUEST);
    assert!(body["error"].is_string());
}

#[tokio::test]
async fn review_sent_as_json_is_a_json_error() {
    let dir = tempfile::tempdir().unwrap();
    let state = offline_state(dir.path()).await;
    let token = state.jwt.issue("teacher-1", "Ada Lovelace").unwrap();
    let router = build_router(state);

    let request = Request::builder()
        .method("POST")
        .uri("/saveReview")
        .header(header::AUTHORIZATION, format!("Bearer {}", token))
        .header(header::CONTENT_TYPE, "application/json")
        .body(Body::from(r#"{"studentId":"21CS001"}"#))
        .unwrap();

    let (status, _, body) = send(&router, request).await;
    assert_eq!(status, StatusCode::BAD_REQUEST);
    assert!(body["error"]
        .as_str()
        .unwrap_or_default()
        .starts_with("Invalid multipart request"));
}
