//! Test helpers for the JSON API tests.

#![allow(dead_code)]

use std::sync::Arc;

use axum::http::header::AUTHORIZATION;
use axum_test::TestServer;
use serde_json::{json, Value};

use feedloft::config::FeedsConfig;
use feedloft::feed::parse_feed;
use feedloft::web::handlers::AppState;
use feedloft::web::middleware::JwtState;
use feedloft::web::{create_health_router, create_router};
use feedloft::{Database, FeedFetcher, FeedService, JobRunner, SubscriptionService};

pub const JWT_SECRET: &str = "test-secret-key-for-testing-only";
pub const PASSWORD: &str = "password123";

pub const FEED_URL: &str = "https://xkcd.com/rss.xml";

pub const RSS: &str = r#"<?xml version="1.0" encoding="UTF-8"?>
<rss version="2.0">
  <channel>
    <title>xkcd.com</title>
    <link>https://xkcd.com/</link>
    <item>
      <title>Comic One</title>
      <link>https://xkcd.com/1/</link>
      <guid>https://xkcd.com/1/</guid>
      <pubDate>Mon, 01 Jan 2024 00:00:00 +0000</pubDate>
      <description>&lt;p&gt;First&lt;/p&gt;</description>
    </item>
    <item>
      <title>Comic Two</title>
      <link>https://xkcd.com/2/</link>
      <guid>https://xkcd.com/2/</guid>
      <pubDate>Tue, 02 Jan 2024 00:00:00 +0000</pubDate>
      <description>&lt;p&gt;Second&lt;/p&gt;</description>
    </item>
  </channel>
</rss>"#;

/// Create a test server with an in-memory database.
pub async fn create_test_server() -> (TestServer, Arc<Database>) {
    let db = Arc::new(
        Database::open_in_memory()
            .await
            .expect("Failed to create test database"),
    );
    let fetcher =
        Arc::new(FeedFetcher::new(&FeedsConfig::default()).expect("Failed to create fetcher"));
    let jobs = JobRunner::new(db.clone(), fetcher, 100);
    let jwt = Arc::new(JwtState::new(JWT_SECRET));
    let app_state = Arc::new(AppState::new(db.clone(), jwt, 900, jobs));

    let router = create_router(app_state, &[]).merge(create_health_router());
    let server = TestServer::new(router).expect("Failed to create test server");

    (server, db)
}

/// Register a user and return `(access_token, user_id)`.
pub async fn register_user(server: &TestServer, email: &str) -> (String, i64) {
    let response = server
        .post("/api/auth/register")
        .json(&json!({
            "email": email,
            "password": PASSWORD,
            "name": "Reader"
        }))
        .await;
    response.assert_status(axum::http::StatusCode::CREATED);

    let body: Value = response.json();
    let token = body["access_token"]
        .as_str()
        .expect("access_token missing")
        .to_string();
    let user_id = body["user"]["id"].as_i64().expect("user id missing");
    (token, user_id)
}

/// Build an `Authorization` header value.
pub fn bearer(token: &str) -> String {
    format!("Bearer {}", token)
}

/// Authenticated GET returning the JSON body.
pub async fn get_json(server: &TestServer, token: &str, path: &str) -> Value {
    let response = server
        .get(path)
        .add_header(AUTHORIZATION, bearer(token))
        .await;
    response.assert_status_ok();
    response.json::<Value>()
}

/// Subscribe `user_id` to the fixture feed and import its entries.
///
/// Returns the feed id.
pub async fn seed_feed(db: &Database, user_id: i64) -> i64 {
    let (feed, _) = SubscriptionService::new(db)
        .subscribe(user_id, FEED_URL)
        .await
        .expect("subscribe failed");
    let parsed = parse_feed(RSS.as_bytes()).expect("fixture should parse");
    FeedService::new(db, 100)
        .import_parsed(&feed, parsed)
        .await
        .expect("import failed");
    feed.id
}
