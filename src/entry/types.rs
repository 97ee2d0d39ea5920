//! Entry and EntryState types.

use chrono::{DateTime, Utc};

use super::normalize::NormalizedEntry;
use crate::datetime::parse_datetime;

/// A single feed item.
#[derive(Debug, Clone)]
pub struct Entry {
    /// Entry ID.
    pub id: i64,
    /// Feed this entry belongs to.
    pub feed_id: i64,
    /// Unique id within the feed.
    pub guid: String,
    /// Absolute article URL.
    pub url: String,
    /// Plain-text title.
    pub title: String,
    /// Plain-text author.
    pub author: Option<String>,
    /// Sanitized content markup.
    pub content: Option<String>,
    /// Sanitized summary markup.
    pub summary: Option<String>,
    /// Publication time.
    pub published: DateTime<Utc>,
    /// When the entry was stored.
    pub created_at: DateTime<Utc>,
    /// When the entry was last updated.
    pub updated_at: DateTime<Utc>,
}

#[derive(Debug, Clone, sqlx::FromRow)]
pub(crate) struct EntryRow {
    id: i64,
    feed_id: i64,
    guid: String,
    url: String,
    title: String,
    author: Option<String>,
    content: Option<String>,
    summary: Option<String>,
    published: String,
    created_at: String,
    updated_at: String,
}

impl From<EntryRow> for Entry {
    fn from(row: EntryRow) -> Self {
        Entry {
            id: row.id,
            feed_id: row.feed_id,
            guid: row.guid,
            url: row.url,
            title: row.title,
            author: row.author,
            content: row.content,
            summary: row.summary,
            published: parse_datetime(&row.published),
            created_at: parse_datetime(&row.created_at),
            updated_at: parse_datetime(&row.updated_at),
        }
    }
}

/// An entry together with the requesting user's read state.
#[derive(Debug, Clone)]
pub struct UserEntry {
    /// The entry.
    pub entry: Entry,
    /// Whether the user has read it.
    pub read: bool,
}

#[derive(Debug, Clone, sqlx::FromRow)]
pub(crate) struct UserEntryRow {
    #[sqlx(flatten)]
    entry: EntryRow,
    read: bool,
}

impl From<UserEntryRow> for UserEntry {
    fn from(row: UserEntryRow) -> Self {
        UserEntry {
            entry: row.entry.into(),
            read: row.read,
        }
    }
}

/// Raw entry data as found in a feed document.
///
/// Text fields are byte sequences in any encoding; they are normalized
/// before the entry is validated and saved.
#[derive(Debug, Clone, Default)]
pub struct NewEntry {
    /// Feed this entry belongs to.
    pub feed_id: i64,
    /// RSS guid or Atom id.
    pub guid: Option<Vec<u8>>,
    /// Article URL, possibly relative to the feed.
    pub url: Option<Vec<u8>>,
    /// Title.
    pub title: Option<Vec<u8>>,
    /// Author.
    pub author: Option<Vec<u8>>,
    /// Content markup.
    pub content: Option<Vec<u8>>,
    /// Summary markup.
    pub summary: Option<Vec<u8>>,
    /// Publication time; defaults to now.
    pub published: Option<DateTime<Utc>>,
}

impl NewEntry {
    /// Create an empty entry for the given feed.
    pub fn new(feed_id: i64) -> Self {
        Self {
            feed_id,
            ..Default::default()
        }
    }

    /// Rebuild raw data from already normalized fields.
    pub fn from_normalized(feed_id: i64, entry: &NormalizedEntry) -> Self {
        Self {
            feed_id,
            guid: Some(entry.guid.clone().into_bytes()),
            url: Some(entry.url.clone().into_bytes()),
            title: Some(entry.title.clone().into_bytes()),
            author: entry.author.clone().map(String::into_bytes),
            content: entry.content.clone().map(String::into_bytes),
            summary: entry.summary.clone().map(String::into_bytes),
            published: Some(entry.published),
        }
    }

    /// Set the guid.
    pub fn with_guid(mut self, guid: impl AsRef<[u8]>) -> Self {
        self.guid = Some(guid.as_ref().to_vec());
        self
    }

    /// Set the URL.
    pub fn with_url(mut self, url: impl AsRef<[u8]>) -> Self {
        self.url = Some(url.as_ref().to_vec());
        self
    }

    /// Set the title.
    pub fn with_title(mut self, title: impl AsRef<[u8]>) -> Self {
        self.title = Some(title.as_ref().to_vec());
        self
    }

    /// Set the author.
    pub fn with_author(mut self, author: impl AsRef<[u8]>) -> Self {
        self.author = Some(author.as_ref().to_vec());
        self
    }

    /// Set the content.
    pub fn with_content(mut self, content: impl AsRef<[u8]>) -> Self {
        self.content = Some(content.as_ref().to_vec());
        self
    }

    /// Set the summary.
    pub fn with_summary(mut self, summary: impl AsRef<[u8]>) -> Self {
        self.summary = Some(summary.as_ref().to_vec());
        self
    }

    /// Set the publication time.
    pub fn with_published(mut self, published: DateTime<Utc>) -> Self {
        self.published = Some(published);
        self
    }
}

impl From<&Entry> for NewEntry {
    fn from(entry: &Entry) -> Self {
        Self {
            feed_id: entry.feed_id,
            guid: Some(entry.guid.clone().into_bytes()),
            url: Some(entry.url.clone().into_bytes()),
            title: Some(entry.title.clone().into_bytes()),
            author: entry.author.clone().map(String::into_bytes),
            content: entry.content.clone().map(String::into_bytes),
            summary: entry.summary.clone().map(String::into_bytes),
            published: Some(entry.published),
        }
    }
}

/// Per-user read/unread marker for an entry.
#[derive(Debug, Clone)]
pub struct EntryState {
    /// EntryState ID.
    pub id: i64,
    /// Whether the entry has been read.
    pub read: bool,
    /// Owning user.
    pub user_id: i64,
    /// Entry this state belongs to.
    pub entry_id: i64,
    /// When the state was created.
    pub created_at: DateTime<Utc>,
    /// When the state last changed.
    pub updated_at: DateTime<Utc>,
}

#[derive(Debug, Clone, sqlx::FromRow)]
pub(crate) struct EntryStateRow {
    id: i64,
    read: bool,
    user_id: i64,
    entry_id: i64,
    created_at: String,
    updated_at: String,
}

impl From<EntryStateRow> for EntryState {
    fn from(row: EntryStateRow) -> Self {
        EntryState {
            id: row.id,
            read: row.read,
            user_id: row.user_id,
            entry_id: row.entry_id,
            created_at: parse_datetime(&row.created_at),
            updated_at: parse_datetime(&row.updated_at),
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_new_entry_builder_accepts_bytes_and_str() {
        let entry = NewEntry::new(7)
            .with_title(b"\xE8 title")
            .with_url("http://some.link");
        assert_eq!(entry.feed_id, 7);
        assert_eq!(entry.title.as_deref(), Some(&b"\xE8 title"[..]));
        assert_eq!(entry.url.as_deref(), Some(&b"http://some.link"[..]));
        assert!(entry.guid.is_none());
        assert!(entry.published.is_none());
    }

    #[test]
    fn test_new_entry_from_entry() {
        let now = Utc::now();
        let entry = Entry {
            id: 1,
            feed_id: 2,
            guid: "guid".to_string(),
            url: "http://some.link".to_string(),
            title: "title".to_string(),
            author: None,
            content: Some("<p>c</p>".to_string()),
            summary: None,
            published: now,
            created_at: now,
            updated_at: now,
        };
        let new_entry = NewEntry::from(&entry);
        assert_eq!(new_entry.feed_id, 2);
        assert_eq!(new_entry.content.as_deref(), Some(&b"<p>c</p>"[..]));
        assert_eq!(new_entry.published, Some(now));
    }
}
