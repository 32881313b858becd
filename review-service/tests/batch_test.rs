mod common;

use common::TestApp;
use serde_json::{json, Value};

#[tokio::test]
async fn create_batch_and_list_by_section() {
    let Some(app) = TestApp::spawn().await else {
        return;
    };
    let token = app.teacher_token("Barbara Liskov").await;

    for (class_name, batch_name) in [("CSE-A", "B1"), ("CSE-A", "B2"), ("CSE-B", "B1")] {
        let response = app
            .post_json(
                "/batches",
                &token,
                json!({ "className": class_name, "batchName": batch_name }),
            )
            .await;
        assert_eq!(response.status(), 200);
        let body: Value = response.json().await.unwrap();
        assert_eq!(body["message"], "Batch added");
        assert_eq!(body["batch"]["className"], class_name);
        assert_eq!(body["batch"]["projectTitle"], "");
    }

    let response = app.get_auth("/batches/CSE-A", &token).await;
    assert_eq!(response.status(), 200);
    let batches: Vec<Value> = response.json().await.unwrap();
    let names: Vec<&str> = batches
        .iter()
        .map(|b| b["batchName"].as_str().unwrap_or_default())
        .collect();
    assert_eq!(names, vec!["B1", "B2"]);

    let response = app.get_auth("/batches/CSE-Z", &token).await;
    let batches: Vec<Value> = response.json().await.unwrap();
    assert!(batches.is_empty());

    app.cleanup().await;
}

#[tokio::test]
async fn create_batch_requires_names() {
    let Some(app) = TestApp::spawn().await else {
        return;
    };
    let token = app.teacher_token("Edsger Dijkstra").await;

    let response = app
        .post_json("/batches", &token, json!({ "className": "CSE-A" }))
        .await;
    assert_eq!(response.status(), 422);

    app.cleanup().await;
}

#[tokio::test]
async fn batches_are_scoped_to_their_teacher() {
    let Some(app) = TestApp::spawn().await else {
        return;
    };
    let owner = app.teacher_token("Owner Teacher").await;
    let other = app.teacher_token("Other Teacher").await;

    let response = app
        .post_json(
            "/batches",
            &owner,
            json!({ "className": "ECE-C", "batchName": "B7" }),
        )
        .await;
    assert_eq!(response.status(), 200);

    let response = app.get_auth("/batches/ECE-C", &other).await;
    let batches: Vec<Value> = response.json().await.unwrap();
    assert!(batches.is_empty());

    let response = app.get_auth("/studentinfo", &other).await;
    let batches: Vec<Value> = response.json().await.unwrap();
    assert!(batches.is_empty());

    app.cleanup().await;
}

#[tokio::test]
async fn student_info_upserts_the_named_batch() {
    let Some(app) = TestApp::spawn().await else {
        return;
    };
    let token = app.teacher_token("Donald Knuth").await;

    let created: Value = app
        .post_json(
            "/batches",
            &token,
            json!({ "className": "CSE-A", "batchName": "B3" }),
        )
        .await
        .json()
        .await
        .unwrap();
    let batch_id = created["batch"]["_id"].as_str().unwrap().to_string();

    let response = app
        .post_json(
            "/studentinfo",
            &token,
            json!({
                "batch": "B3",
                "projectTitle": "Smart Irrigation",
                "students": [
                    { "regNo": "21CS001", "name": "Asha" },
                    { "regNo": "21CS002", "name": "Ravi" }
                ]
            }),
        )
        .await;
    assert_eq!(response.status(), 200);
    let body: Value = response.json().await.unwrap();
    assert_eq!(body["message"], "Student info saved");
    assert_eq!(body["record"]["_id"], batch_id.as_str());
    assert_eq!(body["record"]["students"].as_array().unwrap().len(), 2);

    // Saving again replaces the list instead of appending to it.
    let response = app
        .post_json(
            "/studentinfo",
            &token,
            json!({
                "batch": "B3",
                "projectTitle": "Smart Irrigation v2",
                "students": [{ "regNo": "21CS001", "marks": "18" }]
            }),
        )
        .await;
    assert_eq!(response.status(), 200);

    let response = app.get_auth("/studentinfo", &token).await;
    let batches: Vec<Value> = response.json().await.unwrap();
    assert_eq!(batches.len(), 1);
    assert_eq!(batches[0]["_id"], batch_id.as_str());
    assert_eq!(batches[0]["projectTitle"], "Smart Irrigation v2");
    assert_eq!(batches[0]["students"][0]["marks"], "18");

    app.cleanup().await;
}

#[tokio::test]
async fn student_info_creates_missing_batch() {
    let Some(app) = TestApp::spawn().await else {
        return;
    };
    let token = app.teacher_token("Frances Allen").await;

    let response = app
        .post_json(
            "/studentinfo",
            &token,
            json!({ "batch": "B9", "students": [{ "regNo": "21EC010" }] }),
        )
        .await;
    assert_eq!(response.status(), 200);
    let body: Value = response.json().await.unwrap();
    assert_eq!(body["record"]["batchName"], "B9");

    app.cleanup().await;
}

#[tokio::test]
async fn student_without_reg_no_is_rejected() {
    let Some(app) = TestApp::spawn().await else {
        return;
    };
    let token = app.teacher_token("John Backus").await;

    let blank = app
        .post_json(
            "/studentinfo",
            &token,
            json!({ "batch": "B1", "students": [{ "regNo": "21CS001" }, { "regNo": "" }] }),
        )
        .await;
    assert_eq!(blank.status(), 400);

    let missing = app
        .post_json(
            "/studentinfo",
            &token,
            json!({ "batch": "B1", "students": [{ "name": "No Number" }] }),
        )
        .await;
    assert_eq!(missing.status(), 400);

    let response = app.get_auth("/studentinfo", &token).await;
    let batches: Vec<Value> = response.json().await.unwrap();
    assert!(batches.is_empty());

    app.cleanup().await;
}
