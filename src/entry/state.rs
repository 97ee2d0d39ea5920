//! Per-user read state of entries.

use sqlx::SqlitePool;

use super::types::{EntryState, EntryStateRow};
use crate::{FeedloftError, Result};

/// Repository for entry read states.
pub struct EntryStateRepository<'a> {
    pool: &'a SqlitePool,
}

impl<'a> EntryStateRepository<'a> {
    /// Create a new EntryStateRepository.
    pub fn new(pool: &'a SqlitePool) -> Self {
        Self { pool }
    }

    /// Get the state row for a user and entry.
    pub async fn get(&self, entry_id: i64, user_id: i64) -> Result<Option<EntryState>> {
        let row = sqlx::query_as::<_, EntryStateRow>(
            "SELECT id, read, user_id, entry_id, created_at, updated_at
             FROM entry_states WHERE entry_id = ? AND user_id = ?",
        )
        .bind(entry_id)
        .bind(user_id)
        .fetch_optional(self.pool)
        .await
        .map_err(|e| FeedloftError::Database(e.to_string()))?;

        Ok(row.map(EntryState::from))
    }

    /// Whether the user has read the entry.
    ///
    /// The user must be subscribed to the entry's feed; asking for anyone
    /// else is an error rather than an implicit "unread".
    pub async fn read_by(&self, entry_id: i64, user_id: i64) -> Result<bool> {
        if let Some(state) = self.get(entry_id, user_id).await? {
            return Ok(state.read);
        }
        self.require_subscription(entry_id, user_id).await?;
        Ok(false)
    }

    /// Mark an entry read or unread for a subscribed user.
    pub async fn set_read(&self, entry_id: i64, user_id: i64, read: bool) -> Result<()> {
        self.require_subscription(entry_id, user_id).await?;

        sqlx::query(
            "INSERT INTO entry_states (read, user_id, entry_id) VALUES (?, ?, ?)
             ON CONFLICT(user_id, entry_id)
             DO UPDATE SET read = excluded.read, updated_at = datetime('now')",
        )
        .bind(read)
        .bind(user_id)
        .bind(entry_id)
        .execute(self.pool)
        .await
        .map_err(|e| FeedloftError::Database(e.to_string()))?;

        Ok(())
    }

    /// Mark every entry of a feed read for the user.
    ///
    /// Returns the number of states that changed.
    pub async fn mark_feed_read(&self, feed_id: i64, user_id: i64) -> Result<u64> {
        if !self.is_subscribed(feed_id, user_id).await? {
            return Err(FeedloftError::NotSubscribed { user_id, feed_id });
        }

        let result = sqlx::query(
            "UPDATE entry_states SET read = 1, updated_at = datetime('now')
             WHERE user_id = ? AND read = 0
               AND entry_id IN (SELECT id FROM entries WHERE feed_id = ?)",
        )
        .bind(user_id)
        .bind(feed_id)
        .execute(self.pool)
        .await
        .map_err(|e| FeedloftError::Database(e.to_string()))?;

        Ok(result.rows_affected())
    }

    /// Number of unread entries of a feed for the user.
    pub async fn count_unread(&self, feed_id: i64, user_id: i64) -> Result<i64> {
        let count: i64 = sqlx::query_scalar(
            "SELECT COUNT(*) FROM entry_states s
             JOIN entries e ON e.id = s.entry_id
             WHERE e.feed_id = ? AND s.user_id = ? AND s.read = 0",
        )
        .bind(feed_id)
        .bind(user_id)
        .fetch_one(self.pool)
        .await
        .map_err(|e| FeedloftError::Database(e.to_string()))?;
        Ok(count)
    }

    /// Number of state rows owned by a user.
    pub async fn count_for_user(&self, user_id: i64) -> Result<i64> {
        let count: i64 = sqlx::query_scalar("SELECT COUNT(*) FROM entry_states WHERE user_id = ?")
            .bind(user_id)
            .fetch_one(self.pool)
            .await
            .map_err(|e| FeedloftError::Database(e.to_string()))?;
        Ok(count)
    }

    /// Number of state rows attached to an entry.
    pub async fn count_for_entry(&self, entry_id: i64) -> Result<i64> {
        let count: i64 =
            sqlx::query_scalar("SELECT COUNT(*) FROM entry_states WHERE entry_id = ?")
                .bind(entry_id)
                .fetch_one(self.pool)
                .await
                .map_err(|e| FeedloftError::Database(e.to_string()))?;
        Ok(count)
    }

    async fn is_subscribed(&self, feed_id: i64, user_id: i64) -> Result<bool> {
        let subscribed: bool = sqlx::query_scalar(
            "SELECT EXISTS(SELECT 1 FROM feed_subscriptions WHERE feed_id = ? AND user_id = ?)",
        )
        .bind(feed_id)
        .bind(user_id)
        .fetch_one(self.pool)
        .await
        .map_err(|e| FeedloftError::Database(e.to_string()))?;
        Ok(subscribed)
    }

    /// Fails with NotFound for a missing entry and NotSubscribed when the
    /// user is not subscribed to its feed.
    async fn require_subscription(&self, entry_id: i64, user_id: i64) -> Result<()> {
        let feed_id: Option<i64> = sqlx::query_scalar("SELECT feed_id FROM entries WHERE id = ?")
            .bind(entry_id)
            .fetch_optional(self.pool)
            .await
            .map_err(|e| FeedloftError::Database(e.to_string()))?;
        let feed_id = feed_id.ok_or_else(|| FeedloftError::NotFound("entry".to_string()))?;

        if self.is_subscribed(feed_id, user_id).await? {
            Ok(())
        } else {
            Err(FeedloftError::NotSubscribed { user_id, feed_id })
        }
    }
}
