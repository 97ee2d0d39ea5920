//! Feed types for Feedloft.

use chrono::{DateTime, Utc};

use crate::datetime::{parse_datetime, parse_datetime_opt};

/// Consecutive fetch errors after which the updater skips a feed.
pub const MAX_CONSECUTIVE_ERRORS: i64 = 10;

/// A feed shared by all of its subscribers.
#[derive(Debug, Clone)]
pub struct Feed {
    /// Feed ID.
    pub id: i64,
    /// URL the feed document is fetched from.
    pub fetch_url: String,
    /// Site URL (the website the feed belongs to).
    pub url: Option<String>,
    /// Feed title.
    pub title: String,
    /// Last successful fetch.
    pub last_fetched_at: Option<DateTime<Utc>>,
    /// Number of consecutive fetch errors.
    pub fetch_error_count: i64,
    /// Last error message.
    pub last_error: Option<String>,
    /// When the feed was created.
    pub created_at: DateTime<Utc>,
    /// When the feed was last updated.
    pub updated_at: DateTime<Utc>,
}

impl Feed {
    /// Check if the feed has exceeded the error threshold.
    pub fn has_exceeded_error_threshold(&self) -> bool {
        self.fetch_error_count >= MAX_CONSECUTIVE_ERRORS
    }

    /// Title to display, falling back to the fetch URL.
    pub fn display_title(&self) -> &str {
        if self.title.is_empty() {
            &self.fetch_url
        } else {
            &self.title
        }
    }
}

/// Row type for feeds from database.
#[derive(Debug, Clone, sqlx::FromRow)]
pub(crate) struct FeedRow {
    id: i64,
    fetch_url: String,
    url: Option<String>,
    title: String,
    last_fetched_at: Option<String>,
    fetch_error_count: i64,
    last_error: Option<String>,
    created_at: String,
    updated_at: String,
}

impl From<FeedRow> for Feed {
    fn from(row: FeedRow) -> Self {
        Feed {
            id: row.id,
            fetch_url: row.fetch_url,
            url: row.url,
            title: row.title,
            last_fetched_at: row.last_fetched_at.and_then(|s| parse_datetime_opt(&s)),
            fetch_error_count: row.fetch_error_count,
            last_error: row.last_error,
            created_at: parse_datetime(&row.created_at),
            updated_at: parse_datetime(&row.updated_at),
        }
    }
}

/// New feed for creation.
#[derive(Debug, Clone)]
pub struct NewFeed {
    /// URL the feed document is fetched from.
    pub fetch_url: String,
    /// Feed title.
    pub title: String,
    /// Site URL.
    pub url: Option<String>,
}

impl NewFeed {
    /// Create a new feed with an empty title.
    pub fn new(fetch_url: impl Into<String>) -> Self {
        Self {
            fetch_url: fetch_url.into(),
            title: String::new(),
            url: None,
        }
    }

    /// Set the title.
    pub fn with_title(mut self, title: impl Into<String>) -> Self {
        self.title = title.into();
        self
    }

    /// Set the site URL.
    pub fn with_url(mut self, url: impl Into<String>) -> Self {
        self.url = Some(url.into());
        self
    }
}

/// Parsed feed data from fetching.
#[derive(Debug, Clone, Default)]
pub struct ParsedFeed {
    /// Feed title.
    pub title: Option<String>,
    /// Site URL.
    pub site_url: Option<String>,
    /// Feed entries, in document order.
    pub entries: Vec<ParsedEntry>,
}

/// Parsed entry data from fetching.
///
/// Fields are raw document values; HTML is left intact.
#[derive(Debug, Clone, Default)]
pub struct ParsedEntry {
    /// RSS guid or Atom id.
    pub guid: Option<String>,
    /// Link to the original article.
    pub url: Option<String>,
    /// Entry title.
    pub title: Option<String>,
    /// Author name.
    pub author: Option<String>,
    /// Full content.
    pub content: Option<String>,
    /// Summary or description.
    pub summary: Option<String>,
    /// Publication (or last update) time.
    pub published: Option<DateTime<Utc>>,
}
