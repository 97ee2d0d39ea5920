//! Web API Subscribe Job State Tests
//!
//! Integration tests for polling and dismissing subscribe job states.

mod common;

use std::time::Duration;

use axum::http::header::{AUTHORIZATION, IF_MODIFIED_SINCE, LAST_MODIFIED};
use axum::http::StatusCode;
use serde_json::{json, Value};

use common::{bearer, create_test_server, get_json, register_user};
use feedloft::job::SubscribeJobStateRepository;
use feedloft::JobState;

#[tokio::test]
async fn test_index_empty_is_not_found() {
    let (server, _db) = create_test_server().await;
    let (token, _) = register_user(&server, "alice@example.com").await;

    let response = server
        .get("/api/subscribe_job_states")
        .add_header(AUTHORIZATION, bearer(&token))
        .await;

    response.assert_status(StatusCode::NOT_FOUND);
    assert!(response.text().is_empty());
}

#[tokio::test]
async fn test_index_lists_own_jobs() {
    let (server, db) = create_test_server().await;
    let (token, user_id) = register_user(&server, "alice@example.com").await;
    let (_, other_id) = register_user(&server, "bob@example.com").await;

    let repo = SubscribeJobStateRepository::new(db.pool());
    repo.create(user_id, "https://a.example.com/feed")
        .await
        .unwrap();
    repo.create(user_id, "https://b.example.com/feed")
        .await
        .unwrap();
    repo.create(other_id, "https://c.example.com/feed")
        .await
        .unwrap();

    let body = get_json(&server, &token, "/api/subscribe_job_states").await;
    let jobs = body.as_array().unwrap();
    assert_eq!(jobs.len(), 2);
    assert_eq!(jobs[0]["fetch_url"], "https://a.example.com/feed");
    assert_eq!(jobs[0]["state"], "RUNNING");
    assert_eq!(jobs[1]["fetch_url"], "https://b.example.com/feed");
    assert!(jobs[0].get("user_id").is_none());
}

#[tokio::test]
async fn test_show_sets_last_modified() {
    let (server, db) = create_test_server().await;
    let (token, user_id) = register_user(&server, "alice@example.com").await;

    let repo = SubscribeJobStateRepository::new(db.pool());
    let job = repo
        .create(user_id, "https://a.example.com/feed")
        .await
        .unwrap();
    repo.set_state(job.id, JobState::Success, None).await.unwrap();

    let response = server
        .get(&format!("/api/subscribe_job_states/{}", job.id))
        .add_header(AUTHORIZATION, bearer(&token))
        .await;

    response.assert_status_ok();
    assert!(response.headers().contains_key(LAST_MODIFIED));

    let body: Value = response.json();
    assert_eq!(body["id"], job.id);
    assert_eq!(body["state"], "SUCCESS");
}

#[tokio::test]
async fn test_show_not_modified() {
    let (server, db) = create_test_server().await;
    let (token, user_id) = register_user(&server, "alice@example.com").await;

    let job = SubscribeJobStateRepository::new(db.pool())
        .create(user_id, "https://a.example.com/feed")
        .await
        .unwrap();
    let path = format!("/api/subscribe_job_states/{}", job.id);

    let first = server
        .get(&path)
        .add_header(AUTHORIZATION, bearer(&token))
        .await;
    first.assert_status_ok();
    let last_modified = first
        .headers()
        .get(LAST_MODIFIED)
        .unwrap()
        .to_str()
        .unwrap()
        .to_string();

    let second = server
        .get(&path)
        .add_header(AUTHORIZATION, bearer(&token))
        .add_header(IF_MODIFIED_SINCE, last_modified)
        .await;
    second.assert_status(StatusCode::NOT_MODIFIED);

    let stale = server
        .get(&path)
        .add_header(AUTHORIZATION, bearer(&token))
        .add_header(
            IF_MODIFIED_SINCE,
            "Mon, 01 Jan 2001 00:00:00 GMT".to_string(),
        )
        .await;
    stale.assert_status_ok();
}

#[tokio::test]
async fn test_show_other_users_job_is_not_found() {
    let (server, db) = create_test_server().await;
    let (_, owner_id) = register_user(&server, "alice@example.com").await;
    let (token, _) = register_user(&server, "bob@example.com").await;

    let job = SubscribeJobStateRepository::new(db.pool())
        .create(owner_id, "https://a.example.com/feed")
        .await
        .unwrap();

    let response = server
        .get(&format!("/api/subscribe_job_states/{}", job.id))
        .add_header(AUTHORIZATION, bearer(&token))
        .await;

    response.assert_status(StatusCode::NOT_FOUND);
}

#[tokio::test]
async fn test_destroy() {
    let (server, db) = create_test_server().await;
    let (token, user_id) = register_user(&server, "alice@example.com").await;

    let job = SubscribeJobStateRepository::new(db.pool())
        .create(user_id, "https://a.example.com/feed")
        .await
        .unwrap();
    let path = format!("/api/subscribe_job_states/{}", job.id);

    server
        .delete(&path)
        .add_header(AUTHORIZATION, bearer(&token))
        .await
        .assert_status_ok();

    server
        .get(&path)
        .add_header(AUTHORIZATION, bearer(&token))
        .await
        .assert_status(StatusCode::NOT_FOUND);

    server
        .delete(&path)
        .add_header(AUTHORIZATION, bearer(&token))
        .await
        .assert_status(StatusCode::NOT_FOUND);
}

#[tokio::test]
async fn test_destroy_other_users_job_is_not_found() {
    let (server, db) = create_test_server().await;
    let (_, owner_id) = register_user(&server, "alice@example.com").await;
    let (token, _) = register_user(&server, "bob@example.com").await;

    let job = SubscribeJobStateRepository::new(db.pool())
        .create(owner_id, "https://a.example.com/feed")
        .await
        .unwrap();

    server
        .delete(&format!("/api/subscribe_job_states/{}", job.id))
        .add_header(AUTHORIZATION, bearer(&token))
        .await
        .assert_status(StatusCode::NOT_FOUND);

    let kept = SubscribeJobStateRepository::new(db.pool())
        .get_by_id(job.id)
        .await
        .unwrap();
    assert!(kept.is_some());
}

#[tokio::test]
async fn test_subscribe_creates_job_that_fails() {
    let (server, _db) = create_test_server().await;
    let (token, _) = register_user(&server, "alice@example.com").await;

    let response = server
        .post("/api/feeds")
        .add_header(AUTHORIZATION, bearer(&token))
        .json(&json!({ "url": "http://localhost/feed.xml" }))
        .await;

    response.assert_status(StatusCode::ACCEPTED);
    let job: Value = response.json();
    assert_eq!(job["fetch_url"], "http://localhost/feed.xml");
    assert_eq!(job["state"], "RUNNING");

    let path = format!("/api/subscribe_job_states/{}", job["id"]);
    let mut state = Value::Null;
    for _ in 0..50 {
        let body = get_json(&server, &token, &path).await;
        state = body["state"].clone();
        if state != "RUNNING" {
            break;
        }
        tokio::time::sleep(Duration::from_millis(20)).await;
    }
    assert_eq!(state, "ERROR");
}
