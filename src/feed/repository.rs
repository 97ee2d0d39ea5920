//! Feed repository for Feedloft.

use sqlx::SqlitePool;

use super::types::{Feed, FeedRow, NewFeed, MAX_CONSECUTIVE_ERRORS};
use crate::{FeedloftError, Result};

const FEED_COLUMNS: &str = "id, fetch_url, url, title, last_fetched_at, fetch_error_count, \
                            last_error, created_at, updated_at";

/// Repository for feed operations.
pub struct FeedRepository<'a> {
    pool: &'a SqlitePool,
}

impl<'a> FeedRepository<'a> {
    /// Create a new FeedRepository.
    pub fn new(pool: &'a SqlitePool) -> Self {
        Self { pool }
    }

    /// Create a new feed.
    pub async fn create(&self, feed: &NewFeed) -> Result<Feed> {
        let result = sqlx::query("INSERT INTO feeds (fetch_url, title, url) VALUES (?, ?, ?)")
            .bind(&feed.fetch_url)
            .bind(&feed.title)
            .bind(&feed.url)
            .execute(self.pool)
            .await
            .map_err(|e| FeedloftError::Database(e.to_string()))?;

        self.get_by_id(result.last_insert_rowid())
            .await?
            .ok_or_else(|| FeedloftError::NotFound("feed".to_string()))
    }

    /// Get the feed with the given fetch URL, creating it if needed.
    pub async fn find_or_create(&self, fetch_url: &str) -> Result<Feed> {
        sqlx::query("INSERT OR IGNORE INTO feeds (fetch_url) VALUES (?)")
            .bind(fetch_url)
            .execute(self.pool)
            .await
            .map_err(|e| FeedloftError::Database(e.to_string()))?;

        self.get_by_fetch_url(fetch_url)
            .await?
            .ok_or_else(|| FeedloftError::NotFound("feed".to_string()))
    }

    /// Get a feed by ID.
    pub async fn get_by_id(&self, id: i64) -> Result<Option<Feed>> {
        let row = sqlx::query_as::<_, FeedRow>(&format!(
            "SELECT {FEED_COLUMNS} FROM feeds WHERE id = ?"
        ))
        .bind(id)
        .fetch_optional(self.pool)
        .await
        .map_err(|e| FeedloftError::Database(e.to_string()))?;

        Ok(row.map(Feed::from))
    }

    /// Get a feed by its fetch URL.
    pub async fn get_by_fetch_url(&self, fetch_url: &str) -> Result<Option<Feed>> {
        let row = sqlx::query_as::<_, FeedRow>(&format!(
            "SELECT {FEED_COLUMNS} FROM feeds WHERE fetch_url = ?"
        ))
        .bind(fetch_url)
        .fetch_optional(self.pool)
        .await
        .map_err(|e| FeedloftError::Database(e.to_string()))?;

        Ok(row.map(Feed::from))
    }

    /// List feeds that have at least one subscriber and have not failed
    /// too many times in a row, least recently fetched first.
    pub async fn list_for_update(&self) -> Result<Vec<Feed>> {
        let rows = sqlx::query_as::<_, FeedRow>(&format!(
            "SELECT {FEED_COLUMNS} FROM feeds
             WHERE fetch_error_count < ?
               AND EXISTS (SELECT 1 FROM feed_subscriptions s WHERE s.feed_id = feeds.id)
             ORDER BY last_fetched_at IS NOT NULL, last_fetched_at, id"
        ))
        .bind(MAX_CONSECUTIVE_ERRORS)
        .fetch_all(self.pool)
        .await
        .map_err(|e| FeedloftError::Database(e.to_string()))?;

        Ok(rows.into_iter().map(Feed::from).collect())
    }

    /// Update title and site URL from a fetched document.
    pub async fn update_metadata(&self, id: i64, title: &str, url: Option<&str>) -> Result<bool> {
        let result = sqlx::query(
            "UPDATE feeds SET title = ?, url = COALESCE(?, url), updated_at = datetime('now')
             WHERE id = ?",
        )
        .bind(title)
        .bind(url)
        .bind(id)
        .execute(self.pool)
        .await
        .map_err(|e| FeedloftError::Database(e.to_string()))?;

        Ok(result.rows_affected() > 0)
    }

    /// Record a successful fetch and clear the error count.
    pub async fn mark_fetched(&self, id: i64) -> Result<bool> {
        let result = sqlx::query(
            "UPDATE feeds
             SET last_fetched_at = datetime('now'), fetch_error_count = 0, last_error = NULL,
                 updated_at = datetime('now')
             WHERE id = ?",
        )
        .bind(id)
        .execute(self.pool)
        .await
        .map_err(|e| FeedloftError::Database(e.to_string()))?;

        Ok(result.rows_affected() > 0)
    }

    /// Increment the error count and store the error message.
    pub async fn record_error(&self, id: i64, error: &str) -> Result<bool> {
        let result = sqlx::query(
            "UPDATE feeds
             SET fetch_error_count = fetch_error_count + 1, last_error = ?,
                 updated_at = datetime('now')
             WHERE id = ?",
        )
        .bind(error)
        .bind(id)
        .execute(self.pool)
        .await
        .map_err(|e| FeedloftError::Database(e.to_string()))?;

        Ok(result.rows_affected() > 0)
    }

    /// Delete a feed with its entries, subscriptions and tombstones.
    pub async fn delete(&self, id: i64) -> Result<bool> {
        let result = sqlx::query("DELETE FROM feeds WHERE id = ?")
            .bind(id)
            .execute(self.pool)
            .await
            .map_err(|e| FeedloftError::Database(e.to_string()))?;

        Ok(result.rows_affected() > 0)
    }
}
