//! Subscription and folder repositories.

use sqlx::{SqliteConnection, SqlitePool};
use tracing::debug;

use super::types::{
    FeedSubscription, FeedSubscriptionRow, Folder, FolderRow, SubscribedFeed, SubscribedFeedRow,
};
use crate::{FeedloftError, Result};

const SUBSCRIPTION_COLUMNS: &str = "id, user_id, feed_id, folder_id, created_at";
const FOLDER_COLUMNS: &str = "id, user_id, title, subscriptions_updated_at, created_at";

/// Repository for feed subscriptions.
pub struct SubscriptionRepository<'a> {
    pool: &'a SqlitePool,
}

impl<'a> SubscriptionRepository<'a> {
    /// Create a new SubscriptionRepository.
    pub fn new(pool: &'a SqlitePool) -> Self {
        Self { pool }
    }

    /// Subscribe a user to a feed.
    ///
    /// A new subscription gets an unread state for every entry the feed
    /// already has. Subscribing twice returns the existing subscription.
    pub async fn subscribe(&self, user_id: i64, feed_id: i64) -> Result<FeedSubscription> {
        let mut tx = self.pool.begin().await?;

        let inserted =
            sqlx::query("INSERT OR IGNORE INTO feed_subscriptions (user_id, feed_id) VALUES (?, ?)")
                .bind(user_id)
                .bind(feed_id)
                .execute(&mut *tx)
                .await?
                .rows_affected();

        if inserted > 0 {
            let seeded = sqlx::query(
                "INSERT OR IGNORE INTO entry_states (read, user_id, entry_id)
                 SELECT 0, ?, id FROM entries WHERE feed_id = ?",
            )
            .bind(user_id)
            .bind(feed_id)
            .execute(&mut *tx)
            .await?
            .rows_affected();
            debug!(user_id, feed_id, seeded, "Subscribed to feed");
        }

        let subscription = fetch_subscription(&mut tx, user_id, feed_id)
            .await?
            .ok_or_else(|| FeedloftError::NotFound("subscription".to_string()))?;
        tx.commit().await?;

        Ok(subscription)
    }

    /// Remove a subscription together with the user's states for the
    /// feed's entries.
    ///
    /// Returns false if the user was not subscribed.
    pub async fn unsubscribe(&self, user_id: i64, feed_id: i64) -> Result<bool> {
        let mut tx = self.pool.begin().await?;

        sqlx::query(
            "DELETE FROM entry_states
             WHERE user_id = ? AND entry_id IN (SELECT id FROM entries WHERE feed_id = ?)",
        )
        .bind(user_id)
        .bind(feed_id)
        .execute(&mut *tx)
        .await?;

        let removed = sqlx::query("DELETE FROM feed_subscriptions WHERE user_id = ? AND feed_id = ?")
            .bind(user_id)
            .bind(feed_id)
            .execute(&mut *tx)
            .await?
            .rows_affected();

        tx.commit().await?;
        Ok(removed > 0)
    }

    /// Get a user's subscription to a feed.
    pub async fn get(&self, user_id: i64, feed_id: i64) -> Result<Option<FeedSubscription>> {
        let mut conn = self
            .pool
            .acquire()
            .await
            .map_err(|e| FeedloftError::Database(e.to_string()))?;
        fetch_subscription(&mut conn, user_id, feed_id).await
    }

    /// Whether the user is subscribed to the feed.
    pub async fn is_subscribed(&self, user_id: i64, feed_id: i64) -> Result<bool> {
        Ok(self.get(user_id, feed_id).await?.is_some())
    }

    /// List a user's subscribed feeds with unread counts, ordered by title.
    pub async fn list_for_user(&self, user_id: i64) -> Result<Vec<SubscribedFeed>> {
        let rows = sqlx::query_as::<_, SubscribedFeedRow>(
            "SELECT f.id, f.fetch_url, f.url, f.title, f.last_fetched_at, f.fetch_error_count,
                    f.last_error, f.created_at, f.updated_at, s.folder_id,
                    (SELECT COUNT(*) FROM entry_states es
                     JOIN entries e ON e.id = es.entry_id
                     WHERE e.feed_id = f.id AND es.user_id = s.user_id AND es.read = 0)
                        AS unread_count
             FROM feed_subscriptions s
             JOIN feeds f ON f.id = s.feed_id
             WHERE s.user_id = ?
             ORDER BY f.title COLLATE NOCASE, f.id",
        )
        .bind(user_id)
        .fetch_all(self.pool)
        .await
        .map_err(|e| FeedloftError::Database(e.to_string()))?;

        Ok(rows.into_iter().map(SubscribedFeed::from).collect())
    }

    /// File a subscription under a folder, or under none.
    ///
    /// Both the previous and the new folder have their
    /// `subscriptions_updated_at` bumped. Returns false if the user is not
    /// subscribed to the feed.
    pub async fn set_folder(
        &self,
        user_id: i64,
        feed_id: i64,
        folder_id: Option<i64>,
    ) -> Result<bool> {
        let mut tx = self.pool.begin().await?;

        let Some(current) = fetch_subscription(&mut tx, user_id, feed_id).await? else {
            return Ok(false);
        };

        sqlx::query("UPDATE feed_subscriptions SET folder_id = ? WHERE id = ?")
            .bind(folder_id)
            .bind(current.id)
            .execute(&mut *tx)
            .await?;

        for id in [current.folder_id, folder_id].into_iter().flatten() {
            sqlx::query(
                "UPDATE folders SET subscriptions_updated_at = datetime('now') WHERE id = ?",
            )
            .bind(id)
            .execute(&mut *tx)
            .await?;
        }

        tx.commit().await?;
        Ok(true)
    }

    /// Number of subscribers of a feed.
    pub async fn count_subscribers(&self, feed_id: i64) -> Result<i64> {
        let count: i64 =
            sqlx::query_scalar("SELECT COUNT(*) FROM feed_subscriptions WHERE feed_id = ?")
                .bind(feed_id)
                .fetch_one(self.pool)
                .await
                .map_err(|e| FeedloftError::Database(e.to_string()))?;
        Ok(count)
    }
}

async fn fetch_subscription(
    conn: &mut SqliteConnection,
    user_id: i64,
    feed_id: i64,
) -> Result<Option<FeedSubscription>> {
    let row = sqlx::query_as::<_, FeedSubscriptionRow>(&format!(
        "SELECT {SUBSCRIPTION_COLUMNS} FROM feed_subscriptions WHERE user_id = ? AND feed_id = ?"
    ))
    .bind(user_id)
    .bind(feed_id)
    .fetch_optional(&mut *conn)
    .await?;

    Ok(row.map(FeedSubscription::from))
}

/// Repository for folders.
pub struct FolderRepository<'a> {
    pool: &'a SqlitePool,
}

impl<'a> FolderRepository<'a> {
    /// Create a new FolderRepository.
    pub fn new(pool: &'a SqlitePool) -> Self {
        Self { pool }
    }

    /// Create a folder.
    pub async fn create(&self, user_id: i64, title: &str) -> Result<Folder> {
        let result = sqlx::query("INSERT INTO folders (user_id, title) VALUES (?, ?)")
            .bind(user_id)
            .bind(title)
            .execute(self.pool)
            .await
            .map_err(|e| FeedloftError::Database(e.to_string()))?;

        self.get_by_id(result.last_insert_rowid())
            .await?
            .ok_or_else(|| FeedloftError::NotFound("folder".to_string()))
    }

    /// Get a folder by ID.
    pub async fn get_by_id(&self, id: i64) -> Result<Option<Folder>> {
        let row = sqlx::query_as::<_, FolderRow>(&format!(
            "SELECT {FOLDER_COLUMNS} FROM folders WHERE id = ?"
        ))
        .bind(id)
        .fetch_optional(self.pool)
        .await
        .map_err(|e| FeedloftError::Database(e.to_string()))?;

        Ok(row.map(Folder::from))
    }

    /// Get a folder by ID if it belongs to the user.
    pub async fn get_for_user(&self, id: i64, user_id: i64) -> Result<Option<Folder>> {
        Ok(self
            .get_by_id(id)
            .await?
            .filter(|folder| folder.user_id == user_id))
    }

    /// Get a user's folder by title.
    pub async fn get_by_title(&self, user_id: i64, title: &str) -> Result<Option<Folder>> {
        let row = sqlx::query_as::<_, FolderRow>(&format!(
            "SELECT {FOLDER_COLUMNS} FROM folders WHERE user_id = ? AND title = ?"
        ))
        .bind(user_id)
        .bind(title)
        .fetch_optional(self.pool)
        .await
        .map_err(|e| FeedloftError::Database(e.to_string()))?;

        Ok(row.map(Folder::from))
    }

    /// List a user's folders ordered by title.
    pub async fn list_for_user(&self, user_id: i64) -> Result<Vec<Folder>> {
        let rows = sqlx::query_as::<_, FolderRow>(&format!(
            "SELECT {FOLDER_COLUMNS} FROM folders WHERE user_id = ? ORDER BY title COLLATE NOCASE, id"
        ))
        .bind(user_id)
        .fetch_all(self.pool)
        .await
        .map_err(|e| FeedloftError::Database(e.to_string()))?;

        Ok(rows.into_iter().map(Folder::from).collect())
    }

    /// Delete a folder. Its subscriptions become unfiled.
    pub async fn delete(&self, id: i64) -> Result<bool> {
        let result = sqlx::query("DELETE FROM folders WHERE id = ?")
            .bind(id)
            .execute(self.pool)
            .await
            .map_err(|e| FeedloftError::Database(e.to_string()))?;

        Ok(result.rows_affected() > 0)
    }
}
