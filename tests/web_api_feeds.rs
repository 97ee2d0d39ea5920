//! Web API Feed Tests
//!
//! Integration tests for subscribed feeds, their entries and folders.

mod common;

use axum::http::header::AUTHORIZATION;
use axum::http::StatusCode;
use serde_json::{json, Value};

use common::{bearer, create_test_server, get_json, register_user, seed_feed, FEED_URL};

// ============================================================================
// Feeds
// ============================================================================

#[tokio::test]
async fn test_list_feeds_empty() {
    let (server, _db) = create_test_server().await;
    let (token, _) = register_user(&server, "alice@example.com").await;

    let body = get_json(&server, &token, "/api/feeds").await;
    assert_eq!(body, json!([]));
}

#[tokio::test]
async fn test_list_feeds_with_unread_counts() {
    let (server, db) = create_test_server().await;
    let (token, user_id) = register_user(&server, "alice@example.com").await;
    let feed_id = seed_feed(&db, user_id).await;

    let body = get_json(&server, &token, "/api/feeds").await;
    let feeds = body.as_array().unwrap();
    assert_eq!(feeds.len(), 1);
    assert_eq!(feeds[0]["id"], feed_id);
    assert_eq!(feeds[0]["title"], "xkcd.com");
    assert_eq!(feeds[0]["fetch_url"], FEED_URL);
    assert_eq!(feeds[0]["unread_count"], 2);
    assert!(feeds[0]["folder_id"].is_null());
}

#[tokio::test]
async fn test_subscribe_rejects_blank_url() {
    let (server, _db) = create_test_server().await;
    let (token, _) = register_user(&server, "alice@example.com").await;

    let response = server
        .post("/api/feeds")
        .add_header(AUTHORIZATION, bearer(&token))
        .json(&json!({ "url": "" }))
        .await;

    response.assert_status(StatusCode::UNPROCESSABLE_ENTITY);
}

#[tokio::test]
async fn test_unsubscribe() {
    let (server, db) = create_test_server().await;
    let (token, user_id) = register_user(&server, "alice@example.com").await;
    let feed_id = seed_feed(&db, user_id).await;
    let path = format!("/api/feeds/{}", feed_id);

    server
        .delete(&path)
        .add_header(AUTHORIZATION, bearer(&token))
        .await
        .assert_status(StatusCode::NO_CONTENT);

    let body = get_json(&server, &token, "/api/feeds").await;
    assert_eq!(body, json!([]));

    server
        .delete(&path)
        .add_header(AUTHORIZATION, bearer(&token))
        .await
        .assert_status(StatusCode::NOT_FOUND);
}

// ============================================================================
// Entries
// ============================================================================

#[tokio::test]
async fn test_list_entries_newest_first() {
    let (server, db) = create_test_server().await;
    let (token, user_id) = register_user(&server, "alice@example.com").await;
    let feed_id = seed_feed(&db, user_id).await;

    let body = get_json(&server, &token, &format!("/api/feeds/{}/entries", feed_id)).await;
    let entries = body.as_array().unwrap();
    assert_eq!(entries.len(), 2);
    assert_eq!(entries[0]["title"], "Comic Two");
    assert_eq!(entries[0]["url"], "https://xkcd.com/2/");
    assert_eq!(entries[0]["read"], false);
    assert_eq!(entries[1]["title"], "Comic One");
}

#[tokio::test]
async fn test_list_entries_respects_limit() {
    let (server, db) = create_test_server().await;
    let (token, user_id) = register_user(&server, "alice@example.com").await;
    let feed_id = seed_feed(&db, user_id).await;

    let body = get_json(
        &server,
        &token,
        &format!("/api/feeds/{}/entries?limit=1", feed_id),
    )
    .await;
    assert_eq!(body.as_array().unwrap().len(), 1);
}

#[tokio::test]
async fn test_list_entries_requires_subscription() {
    let (server, db) = create_test_server().await;
    let (_, owner_id) = register_user(&server, "alice@example.com").await;
    let (token, _) = register_user(&server, "bob@example.com").await;
    let feed_id = seed_feed(&db, owner_id).await;

    server
        .get(&format!("/api/feeds/{}/entries", feed_id))
        .add_header(AUTHORIZATION, bearer(&token))
        .await
        .assert_status(StatusCode::NOT_FOUND);
}

#[tokio::test]
async fn test_entry_read_state() {
    let (server, db) = create_test_server().await;
    let (token, user_id) = register_user(&server, "alice@example.com").await;
    let feed_id = seed_feed(&db, user_id).await;

    let entries = get_json(&server, &token, &format!("/api/feeds/{}/entries", feed_id)).await;
    let entry_id = entries[0]["id"].as_i64().unwrap();

    let response = server
        .put(&format!("/api/entries/{}/state", entry_id))
        .add_header(AUTHORIZATION, bearer(&token))
        .json(&json!({ "read": true }))
        .await;
    response.assert_status_ok();
    let body: Value = response.json();
    assert_eq!(body["read"], true);

    let entry = get_json(&server, &token, &format!("/api/entries/{}", entry_id)).await;
    assert_eq!(entry["read"], true);

    // Read entries are hidden unless asked for
    let unread = get_json(&server, &token, &format!("/api/feeds/{}/entries", feed_id)).await;
    assert_eq!(unread.as_array().unwrap().len(), 1);
    let all = get_json(
        &server,
        &token,
        &format!("/api/feeds/{}/entries?include_read=true", feed_id),
    )
    .await;
    assert_eq!(all.as_array().unwrap().len(), 2);

    let feeds = get_json(&server, &token, "/api/feeds").await;
    assert_eq!(feeds[0]["unread_count"], 1);
}

#[tokio::test]
async fn test_read_state_is_per_user() {
    let (server, db) = create_test_server().await;
    let (alice, alice_id) = register_user(&server, "alice@example.com").await;
    let (bob, bob_id) = register_user(&server, "bob@example.com").await;
    let feed_id = seed_feed(&db, alice_id).await;
    seed_feed(&db, bob_id).await;

    let entries = get_json(&server, &alice, &format!("/api/feeds/{}/entries", feed_id)).await;
    let entry_id = entries[0]["id"].as_i64().unwrap();

    server
        .put(&format!("/api/entries/{}/state", entry_id))
        .add_header(AUTHORIZATION, bearer(&alice))
        .json(&json!({ "read": true }))
        .await
        .assert_status_ok();

    let entry = get_json(&server, &bob, &format!("/api/entries/{}", entry_id)).await;
    assert_eq!(entry["read"], false);
}

#[tokio::test]
async fn test_entry_of_unsubscribed_feed() {
    let (server, db) = create_test_server().await;
    let (alice, alice_id) = register_user(&server, "alice@example.com").await;
    let (bob, _) = register_user(&server, "bob@example.com").await;
    let feed_id = seed_feed(&db, alice_id).await;

    let entries = get_json(&server, &alice, &format!("/api/feeds/{}/entries", feed_id)).await;
    let entry_id = entries[0]["id"].as_i64().unwrap();

    server
        .get(&format!("/api/entries/{}", entry_id))
        .add_header(AUTHORIZATION, bearer(&bob))
        .await
        .assert_status(StatusCode::NOT_FOUND);

    server
        .put(&format!("/api/entries/{}/state", entry_id))
        .add_header(AUTHORIZATION, bearer(&bob))
        .json(&json!({ "read": true }))
        .await
        .assert_status(StatusCode::FORBIDDEN);
}

#[tokio::test]
async fn test_mark_feed_read() {
    let (server, db) = create_test_server().await;
    let (token, user_id) = register_user(&server, "alice@example.com").await;
    let feed_id = seed_feed(&db, user_id).await;

    let response = server
        .put(&format!("/api/feeds/{}/read", feed_id))
        .add_header(AUTHORIZATION, bearer(&token))
        .await;
    response.assert_status_ok();
    let body: Value = response.json();
    assert_eq!(body["updated"], 2);

    let feeds = get_json(&server, &token, "/api/feeds").await;
    assert_eq!(feeds[0]["unread_count"], 0);
}

// ============================================================================
// Folders
// ============================================================================

#[tokio::test]
async fn test_create_and_list_folders() {
    let (server, _db) = create_test_server().await;
    let (token, _) = register_user(&server, "alice@example.com").await;

    let response = server
        .post("/api/folders")
        .add_header(AUTHORIZATION, bearer(&token))
        .json(&json!({ "title": "  Comics  " }))
        .await;
    response.assert_status(StatusCode::CREATED);
    let folder: Value = response.json();
    assert_eq!(folder["title"], "Comics");

    let folders = get_json(&server, &token, "/api/folders").await;
    assert_eq!(folders.as_array().unwrap().len(), 1);
    assert_eq!(folders[0]["id"], folder["id"]);
}

#[tokio::test]
async fn test_create_folder_rejects_duplicates_and_blank() {
    let (server, _db) = create_test_server().await;
    let (token, _) = register_user(&server, "alice@example.com").await;

    server
        .post("/api/folders")
        .add_header(AUTHORIZATION, bearer(&token))
        .json(&json!({ "title": "Comics" }))
        .await
        .assert_status(StatusCode::CREATED);

    server
        .post("/api/folders")
        .add_header(AUTHORIZATION, bearer(&token))
        .json(&json!({ "title": "Comics" }))
        .await
        .assert_status(StatusCode::UNPROCESSABLE_ENTITY);

    server
        .post("/api/folders")
        .add_header(AUTHORIZATION, bearer(&token))
        .json(&json!({ "title": "   " }))
        .await
        .assert_status(StatusCode::UNPROCESSABLE_ENTITY);
}

#[tokio::test]
async fn test_move_feed_between_folders() {
    let (server, db) = create_test_server().await;
    let (token, user_id) = register_user(&server, "alice@example.com").await;
    let feed_id = seed_feed(&db, user_id).await;

    let folder: Value = server
        .post("/api/folders")
        .add_header(AUTHORIZATION, bearer(&token))
        .json(&json!({ "title": "Comics" }))
        .await
        .json();
    let folder_path = format!("/api/feeds/{}/folder", feed_id);

    server
        .put(&folder_path)
        .add_header(AUTHORIZATION, bearer(&token))
        .json(&json!({ "folder_id": folder["id"] }))
        .await
        .assert_status(StatusCode::NO_CONTENT);

    let feeds = get_json(&server, &token, "/api/feeds").await;
    assert_eq!(feeds[0]["folder_id"], folder["id"]);

    server
        .put(&folder_path)
        .add_header(AUTHORIZATION, bearer(&token))
        .json(&json!({ "folder_id": null }))
        .await
        .assert_status(StatusCode::NO_CONTENT);

    let feeds = get_json(&server, &token, "/api/feeds").await;
    assert!(feeds[0]["folder_id"].is_null());
}

#[tokio::test]
async fn test_move_feed_to_other_users_folder() {
    let (server, db) = create_test_server().await;
    let (alice, alice_id) = register_user(&server, "alice@example.com").await;
    let (bob, _) = register_user(&server, "bob@example.com").await;
    let feed_id = seed_feed(&db, alice_id).await;

    let folder: Value = server
        .post("/api/folders")
        .add_header(AUTHORIZATION, bearer(&bob))
        .json(&json!({ "title": "Bob's" }))
        .await
        .json();

    server
        .put(&format!("/api/feeds/{}/folder", feed_id))
        .add_header(AUTHORIZATION, bearer(&alice))
        .json(&json!({ "folder_id": folder["id"] }))
        .await
        .assert_status(StatusCode::NOT_FOUND);
}

#[tokio::test]
async fn test_delete_folder_keeps_subscription() {
    let (server, db) = create_test_server().await;
    let (token, user_id) = register_user(&server, "alice@example.com").await;
    let feed_id = seed_feed(&db, user_id).await;

    let folder: Value = server
        .post("/api/folders")
        .add_header(AUTHORIZATION, bearer(&token))
        .json(&json!({ "title": "Comics" }))
        .await
        .json();

    server
        .put(&format!("/api/feeds/{}/folder", feed_id))
        .add_header(AUTHORIZATION, bearer(&token))
        .json(&json!({ "folder_id": folder["id"] }))
        .await
        .assert_status(StatusCode::NO_CONTENT);

    server
        .delete(&format!("/api/folders/{}", folder["id"]))
        .add_header(AUTHORIZATION, bearer(&token))
        .await
        .assert_status(StatusCode::NO_CONTENT);

    let feeds = get_json(&server, &token, "/api/feeds").await;
    assert_eq!(feeds.as_array().unwrap().len(), 1);
    assert!(feeds[0]["folder_id"].is_null());

    let folders = get_json(&server, &token, "/api/folders").await;
    assert_eq!(folders, json!([]));
}
