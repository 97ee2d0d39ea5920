//! Job state repositories.

use sqlx::SqlitePool;

use super::types::{
    JobState, OpmlExportJobState, OpmlExportJobStateRow, SubscribeJobState, SubscribeJobStateRow,
};
use crate::{FeedloftError, Result};

const SUBSCRIBE_JOB_COLUMNS: &str = "id, user_id, fetch_url, state, feed_id, created_at, updated_at";

/// Repository for subscribe job states.
pub struct SubscribeJobStateRepository<'a> {
    pool: &'a SqlitePool,
}

impl<'a> SubscribeJobStateRepository<'a> {
    /// Create a new SubscribeJobStateRepository.
    pub fn new(pool: &'a SqlitePool) -> Self {
        Self { pool }
    }

    /// Record a new running subscribe job.
    pub async fn create(&self, user_id: i64, fetch_url: &str) -> Result<SubscribeJobState> {
        let result = sqlx::query(
            "INSERT INTO subscribe_job_states (user_id, fetch_url, state) VALUES (?, ?, ?)",
        )
        .bind(user_id)
        .bind(fetch_url)
        .bind(JobState::Running.as_str())
        .execute(self.pool)
        .await
        .map_err(|e| FeedloftError::Database(e.to_string()))?;

        self.get_by_id(result.last_insert_rowid())
            .await?
            .ok_or_else(|| FeedloftError::NotFound("subscribe job state".to_string()))
    }

    /// Get a job state by ID.
    pub async fn get_by_id(&self, id: i64) -> Result<Option<SubscribeJobState>> {
        let row = sqlx::query_as::<_, SubscribeJobStateRow>(&format!(
            "SELECT {SUBSCRIBE_JOB_COLUMNS} FROM subscribe_job_states WHERE id = ?"
        ))
        .bind(id)
        .fetch_optional(self.pool)
        .await
        .map_err(|e| FeedloftError::Database(e.to_string()))?;

        Ok(row.map(SubscribeJobState::from))
    }

    /// Get a job state by ID if it belongs to the user.
    pub async fn get_for_user(&self, id: i64, user_id: i64) -> Result<Option<SubscribeJobState>> {
        let row = sqlx::query_as::<_, SubscribeJobStateRow>(&format!(
            "SELECT {SUBSCRIBE_JOB_COLUMNS} FROM subscribe_job_states WHERE id = ? AND user_id = ?"
        ))
        .bind(id)
        .bind(user_id)
        .fetch_optional(self.pool)
        .await
        .map_err(|e| FeedloftError::Database(e.to_string()))?;

        Ok(row.map(SubscribeJobState::from))
    }

    /// List a user's job states, oldest first.
    pub async fn list_for_user(&self, user_id: i64) -> Result<Vec<SubscribeJobState>> {
        let rows = sqlx::query_as::<_, SubscribeJobStateRow>(&format!(
            "SELECT {SUBSCRIBE_JOB_COLUMNS} FROM subscribe_job_states WHERE user_id = ? ORDER BY id"
        ))
        .bind(user_id)
        .fetch_all(self.pool)
        .await
        .map_err(|e| FeedloftError::Database(e.to_string()))?;

        Ok(rows.into_iter().map(SubscribeJobState::from).collect())
    }

    /// Move a job to a new state.
    ///
    /// Subscribe jobs are never in the NONE state.
    pub async fn set_state(&self, id: i64, state: JobState, feed_id: Option<i64>) -> Result<bool> {
        if state == JobState::None {
            return Err(FeedloftError::Validation(
                "subscribe job state can't be NONE".to_string(),
            ));
        }

        let result = sqlx::query(
            "UPDATE subscribe_job_states
             SET state = ?, feed_id = COALESCE(?, feed_id), updated_at = datetime('now')
             WHERE id = ?",
        )
        .bind(state.as_str())
        .bind(feed_id)
        .bind(id)
        .execute(self.pool)
        .await
        .map_err(|e| FeedloftError::Database(e.to_string()))?;

        Ok(result.rows_affected() > 0)
    }

    /// Delete a job state owned by the user.
    pub async fn delete_for_user(&self, id: i64, user_id: i64) -> Result<bool> {
        let result = sqlx::query("DELETE FROM subscribe_job_states WHERE id = ? AND user_id = ?")
            .bind(id)
            .bind(user_id)
            .execute(self.pool)
            .await
            .map_err(|e| FeedloftError::Database(e.to_string()))?;

        Ok(result.rows_affected() > 0)
    }
}

/// Repository for OPML export job states.
pub struct OpmlExportJobStateRepository<'a> {
    pool: &'a SqlitePool,
}

impl<'a> OpmlExportJobStateRepository<'a> {
    /// Create a new OpmlExportJobStateRepository.
    pub fn new(pool: &'a SqlitePool) -> Self {
        Self { pool }
    }

    /// Get the user's export state, if one was ever stored.
    pub async fn get(&self, user_id: i64) -> Result<Option<OpmlExportJobState>> {
        let row = sqlx::query_as::<_, OpmlExportJobStateRow>(
            "SELECT user_id, state, show_alert, export_date
             FROM opml_export_job_states WHERE user_id = ?",
        )
        .bind(user_id)
        .fetch_optional(self.pool)
        .await
        .map_err(|e| FeedloftError::Database(e.to_string()))?;

        Ok(row.map(OpmlExportJobState::from))
    }

    /// Get the user's export state, or the default one.
    pub async fn get_or_default(&self, user_id: i64) -> Result<OpmlExportJobState> {
        Ok(self
            .get(user_id)
            .await?
            .unwrap_or_else(|| OpmlExportJobState::default_for(user_id)))
    }

    /// Mark a new export as running and show its alert.
    ///
    /// Any previous export document is dropped.
    pub async fn start(&self, user_id: i64) -> Result<()> {
        sqlx::query(
            "INSERT INTO opml_export_job_states (user_id, state, show_alert) VALUES (?, ?, 1)
             ON CONFLICT(user_id) DO UPDATE SET
                state = excluded.state, show_alert = 1, opml_data = NULL,
                updated_at = datetime('now')",
        )
        .bind(user_id)
        .bind(JobState::Running.as_str())
        .execute(self.pool)
        .await
        .map_err(|e| FeedloftError::Database(e.to_string()))?;
        Ok(())
    }

    /// Set the export state.
    pub async fn set_state(&self, user_id: i64, state: JobState) -> Result<()> {
        sqlx::query(
            "INSERT INTO opml_export_job_states (user_id, state) VALUES (?, ?)
             ON CONFLICT(user_id) DO UPDATE SET
                state = excluded.state, updated_at = datetime('now')",
        )
        .bind(user_id)
        .bind(state.as_str())
        .execute(self.pool)
        .await
        .map_err(|e| FeedloftError::Database(e.to_string()))?;
        Ok(())
    }

    /// Store a finished export document.
    pub async fn finish_success(&self, user_id: i64, opml: &str) -> Result<()> {
        sqlx::query(
            "INSERT INTO opml_export_job_states (user_id, state, export_date, opml_data)
             VALUES (?, ?, datetime('now'), ?)
             ON CONFLICT(user_id) DO UPDATE SET
                state = excluded.state, export_date = excluded.export_date,
                opml_data = excluded.opml_data, updated_at = datetime('now')",
        )
        .bind(user_id)
        .bind(JobState::Success.as_str())
        .bind(opml)
        .execute(self.pool)
        .await
        .map_err(|e| FeedloftError::Database(e.to_string()))?;
        Ok(())
    }

    /// Show or dismiss the export alert.
    pub async fn set_show_alert(&self, user_id: i64, show_alert: bool) -> Result<()> {
        sqlx::query(
            "INSERT INTO opml_export_job_states (user_id, show_alert) VALUES (?, ?)
             ON CONFLICT(user_id) DO UPDATE SET
                show_alert = excluded.show_alert, updated_at = datetime('now')",
        )
        .bind(user_id)
        .bind(show_alert)
        .execute(self.pool)
        .await
        .map_err(|e| FeedloftError::Database(e.to_string()))?;
        Ok(())
    }

    /// Dismiss the export alert.
    pub async fn hide_alert(&self, user_id: i64) -> Result<()> {
        self.set_show_alert(user_id, false).await
    }

    /// The document of the last successful export.
    pub async fn export_data(&self, user_id: i64) -> Result<Option<String>> {
        let data: Option<Option<String>> = sqlx::query_scalar(
            "SELECT opml_data FROM opml_export_job_states WHERE user_id = ? AND state = ?",
        )
        .bind(user_id)
        .bind(JobState::Success.as_str())
        .fetch_optional(self.pool)
        .await
        .map_err(|e| FeedloftError::Database(e.to_string()))?;

        Ok(data.flatten())
    }
}
