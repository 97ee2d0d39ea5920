//! Job state types.

use std::fmt;

use chrono::{DateTime, Utc};
use serde::{Deserialize, Serialize};

use crate::datetime::{parse_datetime, parse_datetime_opt};

/// State of a background job.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Default, Serialize, Deserialize)]
#[serde(rename_all = "SCREAMING_SNAKE_CASE")]
pub enum JobState {
    /// No job has run yet.
    #[default]
    None,
    /// The job is in progress.
    Running,
    /// The job finished successfully.
    Success,
    /// The job failed.
    Error,
}

impl JobState {
    /// Convert to the stored string form.
    pub fn as_str(&self) -> &'static str {
        match self {
            JobState::None => "NONE",
            JobState::Running => "RUNNING",
            JobState::Success => "SUCCESS",
            JobState::Error => "ERROR",
        }
    }

    /// Parse the stored string form.
    pub fn from_str(s: &str) -> Option<Self> {
        match s {
            "NONE" => Some(JobState::None),
            "RUNNING" => Some(JobState::Running),
            "SUCCESS" => Some(JobState::Success),
            "ERROR" => Some(JobState::Error),
            _ => None,
        }
    }

    /// Whether the job has stopped running.
    pub fn is_finished(&self) -> bool {
        matches!(self, JobState::Success | JobState::Error)
    }
}

impl fmt::Display for JobState {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.as_str())
    }
}

/// Progress of one attempt to subscribe to a feed.
#[derive(Debug, Clone)]
pub struct SubscribeJobState {
    /// Job state ID.
    pub id: i64,
    /// User who started the job.
    pub user_id: i64,
    /// URL being subscribed to.
    pub fetch_url: String,
    /// Current state.
    pub state: JobState,
    /// Subscribed feed, once the job succeeded.
    pub feed_id: Option<i64>,
    /// When the job started.
    pub created_at: DateTime<Utc>,
    /// When the state last changed.
    pub updated_at: DateTime<Utc>,
}

#[derive(Debug, Clone, sqlx::FromRow)]
pub(crate) struct SubscribeJobStateRow {
    id: i64,
    user_id: i64,
    fetch_url: String,
    state: String,
    feed_id: Option<i64>,
    created_at: String,
    updated_at: String,
}

impl From<SubscribeJobStateRow> for SubscribeJobState {
    fn from(row: SubscribeJobStateRow) -> Self {
        SubscribeJobState {
            id: row.id,
            user_id: row.user_id,
            fetch_url: row.fetch_url,
            // the column is constrained to the known states
            state: JobState::from_str(&row.state).unwrap_or(JobState::Error),
            feed_id: row.feed_id,
            created_at: parse_datetime(&row.created_at),
            updated_at: parse_datetime(&row.updated_at),
        }
    }
}

/// State of a user's most recent OPML export.
///
/// There is at most one per user; a user who never exported gets the
/// default (NONE, alert shown).
#[derive(Debug, Clone, PartialEq)]
pub struct OpmlExportJobState {
    /// Owning user.
    pub user_id: i64,
    /// Current state.
    pub state: JobState,
    /// Whether the export alert should be displayed.
    pub show_alert: bool,
    /// When the last successful export finished.
    pub export_date: Option<DateTime<Utc>>,
}

impl OpmlExportJobState {
    /// The state of a user who never exported.
    pub fn default_for(user_id: i64) -> Self {
        Self {
            user_id,
            state: JobState::None,
            show_alert: true,
            export_date: None,
        }
    }
}

#[derive(Debug, Clone, sqlx::FromRow)]
pub(crate) struct OpmlExportJobStateRow {
    user_id: i64,
    state: String,
    show_alert: bool,
    export_date: Option<String>,
}

impl From<OpmlExportJobStateRow> for OpmlExportJobState {
    fn from(row: OpmlExportJobStateRow) -> Self {
        OpmlExportJobState {
            user_id: row.user_id,
            state: JobState::from_str(&row.state).unwrap_or(JobState::Error),
            show_alert: row.show_alert,
            export_date: row.export_date.as_deref().and_then(parse_datetime_opt),
        }
    }
}
