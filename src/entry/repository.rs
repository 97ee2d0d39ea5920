//! Entry repository.
//!
//! Entries are normalized and validated inside the same transaction that
//! saves them. Creating an entry also creates an unread [`EntryState`] for
//! every user subscribed to its feed.
//!
//! [`EntryState`]: super::types::EntryState

use chrono::SecondsFormat;
use sqlx::{SqliteConnection, SqlitePool};
use tracing::debug;

use super::normalize::{is_http_url, normalize_entry, NormalizedEntry};
use super::types::{Entry, EntryRow, NewEntry, UserEntry, UserEntryRow};
use crate::{FeedloftError, Result};

const ENTRY_COLUMNS: &str = "e.id, e.feed_id, e.guid, e.url, e.title, e.author, e.content, \
                             e.summary, e.published, e.created_at, e.updated_at";

/// Default page size for entry listings.
pub const DEFAULT_ENTRY_LIMIT: i64 = 100;

/// Repository for entry operations.
pub struct EntryRepository<'a> {
    pool: &'a SqlitePool,
}

impl<'a> EntryRepository<'a> {
    /// Create a new EntryRepository.
    pub fn new(pool: &'a SqlitePool) -> Self {
        Self { pool }
    }

    /// Normalize, validate and insert a new entry.
    ///
    /// Fails with a validation error if the feed doesn't exist, the URL is
    /// not an absolute http(s) URL or the guid is already used in the feed.
    pub async fn create(&self, entry: &NewEntry) -> Result<Entry> {
        let id = self.insert(entry, false).await?.ok_or_else(|| {
            FeedloftError::Validation("guid has already been taken".to_string())
        })?;
        self.get_by_id(id)
            .await?
            .ok_or_else(|| FeedloftError::NotFound("entry".to_string()))
    }

    /// Like [`create`](Self::create), but returns `None` instead of an error
    /// when the guid is already used by an entry or tombstone of the feed.
    pub async fn create_if_new(&self, entry: &NewEntry) -> Result<Option<Entry>> {
        match self.insert(entry, true).await? {
            Some(id) => self.get_by_id(id).await,
            None => Ok(None),
        }
    }

    async fn insert(&self, entry: &NewEntry, skip_taken: bool) -> Result<Option<i64>> {
        let mut tx = self.pool.begin().await?;

        let normalized = normalize_for_feed(&mut tx, entry).await?;
        if guid_taken(&mut tx, entry.feed_id, &normalized.guid, None).await? {
            if skip_taken {
                return Ok(None);
            }
            return Err(FeedloftError::Validation(
                "guid has already been taken".to_string(),
            ));
        }

        let id = sqlx::query(
            "INSERT INTO entries (feed_id, guid, url, title, author, content, summary, published)
             VALUES (?, ?, ?, ?, ?, ?, ?, ?)",
        )
        .bind(entry.feed_id)
        .bind(&normalized.guid)
        .bind(&normalized.url)
        .bind(&normalized.title)
        .bind(&normalized.author)
        .bind(&normalized.content)
        .bind(&normalized.summary)
        .bind(normalized.published.to_rfc3339_opts(SecondsFormat::Secs, true))
        .execute(&mut *tx)
        .await?
        .last_insert_rowid();

        // One unread state per current subscriber
        let states = sqlx::query(
            "INSERT INTO entry_states (read, user_id, entry_id)
             SELECT 0, user_id, ? FROM feed_subscriptions WHERE feed_id = ?",
        )
        .bind(id)
        .bind(entry.feed_id)
        .execute(&mut *tx)
        .await?;

        tx.commit().await?;

        debug!(
            entry_id = id,
            feed_id = entry.feed_id,
            states = states.rows_affected(),
            "Entry created"
        );
        Ok(Some(id))
    }

    /// Re-normalize, validate and save an existing entry.
    ///
    /// Entry states are left untouched.
    pub async fn update(&self, entry: &Entry) -> Result<Entry> {
        let mut tx = self.pool.begin().await?;

        let normalized = normalize_for_feed(&mut tx, &NewEntry::from(entry)).await?;
        if guid_taken(&mut tx, entry.feed_id, &normalized.guid, Some(entry.id)).await? {
            return Err(FeedloftError::Validation(
                "guid has already been taken".to_string(),
            ));
        }

        let result = sqlx::query(
            "UPDATE entries
             SET guid = ?, url = ?, title = ?, author = ?, content = ?, summary = ?,
                 published = ?, updated_at = datetime('now')
             WHERE id = ?",
        )
        .bind(&normalized.guid)
        .bind(&normalized.url)
        .bind(&normalized.title)
        .bind(&normalized.author)
        .bind(&normalized.content)
        .bind(&normalized.summary)
        .bind(normalized.published.to_rfc3339_opts(SecondsFormat::Secs, true))
        .bind(entry.id)
        .execute(&mut *tx)
        .await?;

        if result.rows_affected() == 0 {
            return Err(FeedloftError::NotFound("entry".to_string()));
        }
        tx.commit().await?;

        self.get_by_id(entry.id)
            .await?
            .ok_or_else(|| FeedloftError::NotFound("entry".to_string()))
    }

    /// Get an entry by ID.
    pub async fn get_by_id(&self, id: i64) -> Result<Option<Entry>> {
        let row = sqlx::query_as::<_, EntryRow>(&format!(
            "SELECT {ENTRY_COLUMNS} FROM entries e WHERE e.id = ?"
        ))
        .bind(id)
        .fetch_optional(self.pool)
        .await
        .map_err(|e| FeedloftError::Database(e.to_string()))?;

        Ok(row.map(Entry::from))
    }

    /// Get an entry by feed and guid.
    pub async fn get_by_guid(&self, feed_id: i64, guid: &str) -> Result<Option<Entry>> {
        let row = sqlx::query_as::<_, EntryRow>(&format!(
            "SELECT {ENTRY_COLUMNS} FROM entries e WHERE e.feed_id = ? AND e.guid = ?"
        ))
        .bind(feed_id)
        .bind(guid)
        .fetch_optional(self.pool)
        .await
        .map_err(|e| FeedloftError::Database(e.to_string()))?;

        Ok(row.map(Entry::from))
    }

    /// Discard all but the newest `keep` entries of a feed.
    ///
    /// Returns the number of entries discarded.
    pub async fn prune(&self, feed_id: i64, keep: usize) -> Result<u64> {
        let stale: Vec<i64> = sqlx::query_scalar(
            "SELECT id FROM entries WHERE feed_id = ?
             ORDER BY published DESC, id DESC
             LIMIT -1 OFFSET ?",
        )
        .bind(feed_id)
        .bind(i64::try_from(keep).unwrap_or(i64::MAX))
        .fetch_all(self.pool)
        .await
        .map_err(|e| FeedloftError::Database(e.to_string()))?;

        let mut discarded = 0;
        for id in stale {
            if self.discard(id).await? {
                discarded += 1;
            }
        }
        Ok(discarded)
    }

    /// List a feed's entries with the user's read state, newest first.
    ///
    /// Only entries the user has a state for are returned.
    pub async fn list_for_user(
        &self,
        feed_id: i64,
        user_id: i64,
        include_read: bool,
        limit: i64,
    ) -> Result<Vec<UserEntry>> {
        let rows = sqlx::query_as::<_, UserEntryRow>(&format!(
            "SELECT {ENTRY_COLUMNS}, s.read FROM entries e
             JOIN entry_states s ON s.entry_id = e.id AND s.user_id = ?
             WHERE e.feed_id = ? AND (? OR s.read = 0)
             ORDER BY e.published DESC, e.id DESC
             LIMIT ?"
        ))
        .bind(user_id)
        .bind(feed_id)
        .bind(include_read)
        .bind(limit)
        .fetch_all(self.pool)
        .await
        .map_err(|e| FeedloftError::Database(e.to_string()))?;

        Ok(rows.into_iter().map(UserEntry::from).collect())
    }

    /// Get an entry with the user's read state.
    pub async fn get_for_user(&self, id: i64, user_id: i64) -> Result<Option<UserEntry>> {
        let row = sqlx::query_as::<_, UserEntryRow>(&format!(
            "SELECT {ENTRY_COLUMNS}, s.read FROM entries e
             JOIN entry_states s ON s.entry_id = e.id AND s.user_id = ?
             WHERE e.id = ?"
        ))
        .bind(user_id)
        .bind(id)
        .fetch_optional(self.pool)
        .await
        .map_err(|e| FeedloftError::Database(e.to_string()))?;

        Ok(row.map(UserEntry::from))
    }

    /// Hard-delete an entry. Its states are deleted with it.
    pub async fn delete(&self, id: i64) -> Result<bool> {
        let result = sqlx::query("DELETE FROM entries WHERE id = ?")
            .bind(id)
            .execute(self.pool)
            .await
            .map_err(|e| FeedloftError::Database(e.to_string()))?;

        Ok(result.rows_affected() > 0)
    }

    /// Soft-delete an entry.
    ///
    /// The entry is removed and a tombstone keeps its guid reserved so the
    /// next fetch of the feed does not bring it back.
    pub async fn discard(&self, id: i64) -> Result<bool> {
        let mut tx = self.pool.begin().await?;

        let key: Option<(i64, String)> =
            sqlx::query_as("SELECT feed_id, guid FROM entries WHERE id = ?")
                .bind(id)
                .fetch_optional(&mut *tx)
                .await?;
        let Some((feed_id, guid)) = key else {
            return Ok(false);
        };

        sqlx::query("INSERT OR IGNORE INTO deleted_entries (feed_id, guid) VALUES (?, ?)")
            .bind(feed_id)
            .bind(&guid)
            .execute(&mut *tx)
            .await?;
        sqlx::query("DELETE FROM entries WHERE id = ?")
            .bind(id)
            .execute(&mut *tx)
            .await?;

        tx.commit().await?;
        debug!(entry_id = id, feed_id, guid = %guid, "Entry discarded");
        Ok(true)
    }

    /// Whether the guid is used by an entry or tombstone of the feed.
    pub async fn guid_taken(&self, feed_id: i64, guid: &str) -> Result<bool> {
        let mut conn = self.pool.acquire().await?;
        guid_taken(&mut conn, feed_id, guid, None).await
    }

    /// Number of entries in a feed.
    pub async fn count_by_feed(&self, feed_id: i64) -> Result<i64> {
        let count: i64 = sqlx::query_scalar("SELECT COUNT(*) FROM entries WHERE feed_id = ?")
            .bind(feed_id)
            .fetch_one(self.pool)
            .await
            .map_err(|e| FeedloftError::Database(e.to_string()))?;
        Ok(count)
    }
}

/// Normalize an entry against its feed and validate the result.
async fn normalize_for_feed(
    conn: &mut SqliteConnection,
    entry: &NewEntry,
) -> Result<NormalizedEntry> {
    // Site URL when known, the fetch URL otherwise
    let base_url: Option<String> = sqlx::query_scalar(
        "SELECT COALESCE(NULLIF(TRIM(url), ''), fetch_url) FROM feeds WHERE id = ?",
    )
    .bind(entry.feed_id)
    .fetch_optional(&mut *conn)
    .await?;
    let Some(base_url) = base_url else {
        return Err(FeedloftError::Validation("feed does not exist".to_string()));
    };

    let normalized = normalize_entry(entry, Some(&base_url));
    validate(&normalized)?;
    Ok(normalized)
}

fn validate(entry: &NormalizedEntry) -> Result<()> {
    if !is_http_url(&entry.url) {
        return Err(FeedloftError::Validation(format!(
            "url is not a valid http(s) URL: {:?}",
            entry.url
        )));
    }
    if entry.guid.is_empty() {
        return Err(FeedloftError::Validation("guid can't be blank".to_string()));
    }
    Ok(())
}

async fn guid_taken(
    conn: &mut SqliteConnection,
    feed_id: i64,
    guid: &str,
    exclude_id: Option<i64>,
) -> Result<bool> {
    let taken: bool = sqlx::query_scalar(
        "SELECT EXISTS(SELECT 1 FROM entries WHERE feed_id = ? AND guid = ? AND id != ?)
             OR EXISTS(SELECT 1 FROM deleted_entries WHERE feed_id = ? AND guid = ?)",
    )
    .bind(feed_id)
    .bind(guid)
    .bind(exclude_id.unwrap_or(-1))
    .bind(feed_id)
    .bind(guid)
    .fetch_one(&mut *conn)
    .await?;
    Ok(taken)
}
