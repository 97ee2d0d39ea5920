//! Feed import service.
//!
//! Turns fetched feed documents into stored entries and keeps the feed's
//! fetch bookkeeping current.

use tracing::{debug, info, warn};

use crate::db::Database;
use crate::entry::{EntryRepository, NewEntry};
use crate::feed::fetcher::FeedFetcher;
use crate::feed::repository::FeedRepository;
use crate::feed::types::{Feed, ParsedEntry, ParsedFeed};
use crate::{FeedloftError, Result};

/// Outcome of importing one fetched document.
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq)]
pub struct ImportSummary {
    /// Entries stored.
    pub created: usize,
    /// Entries already present or discarded.
    pub skipped: usize,
    /// Entries rejected by validation.
    pub invalid: usize,
}

/// Service for feed import operations.
pub struct FeedService<'a> {
    db: &'a Database,
    max_entries: usize,
    retention: Option<usize>,
}

impl<'a> FeedService<'a> {
    /// Create a new FeedService importing at most `max_entries` entries per
    /// document.
    pub fn new(db: &'a Database, max_entries: usize) -> Self {
        Self {
            db,
            max_entries,
            retention: None,
        }
    }

    /// Keep at most `keep` entries per feed, discarding the oldest after
    /// each import.
    pub fn with_retention(mut self, keep: usize) -> Self {
        self.retention = Some(keep);
        self
    }

    /// Store the new entries of a parsed document.
    ///
    /// Entries whose guid already exists in the feed (or was discarded) are
    /// skipped; invalid entries are logged and skipped. The feed title and
    /// site URL are taken from the document and the fetch is recorded.
    pub async fn import_parsed(&self, feed: &Feed, parsed: ParsedFeed) -> Result<ImportSummary> {
        let feed_repo = FeedRepository::new(self.db.pool());
        let entry_repo = EntryRepository::new(self.db.pool());

        let title = parsed
            .title
            .as_deref()
            .map(|t| crate::entry::normalize::plain_text(t.as_bytes()))
            .filter(|t| !t.is_empty())
            .unwrap_or_else(|| feed.title.clone());
        feed_repo
            .update_metadata(feed.id, &title, parsed.site_url.as_deref())
            .await?;

        let mut summary = ImportSummary::default();
        for parsed_entry in parsed.entries.into_iter().take(self.max_entries) {
            let new_entry = to_new_entry(feed.id, parsed_entry);
            match entry_repo.create_if_new(&new_entry).await {
                Ok(Some(_)) => summary.created += 1,
                Ok(None) => summary.skipped += 1,
                Err(FeedloftError::Validation(msg)) => {
                    debug!(feed_id = feed.id, "Skipping invalid entry: {}", msg);
                    summary.invalid += 1;
                }
                Err(e) => return Err(e),
            }
        }

        if let Some(keep) = self.retention {
            let discarded = entry_repo.prune(feed.id, keep).await?;
            if discarded > 0 {
                debug!(feed_id = feed.id, discarded, "Old entries discarded");
            }
        }

        feed_repo.mark_fetched(feed.id).await?;

        if summary.created > 0 {
            info!(
                feed_id = feed.id,
                created = summary.created,
                skipped = summary.skipped,
                "Feed updated"
            );
        } else {
            debug!(feed_id = feed.id, "Feed updated: no new entries");
        }
        Ok(summary)
    }

    /// Fetch a feed and import its entries.
    ///
    /// Fetch failures are recorded on the feed before being returned.
    pub async fn refresh(&self, fetcher: &FeedFetcher, feed: &Feed) -> Result<ImportSummary> {
        match fetcher.fetch(&feed.fetch_url).await {
            Ok(parsed) => self.import_parsed(feed, parsed).await,
            Err(e) => {
                warn!(feed_id = feed.id, url = %feed.fetch_url, "Failed to fetch feed: {}", e);
                FeedRepository::new(self.db.pool())
                    .record_error(feed.id, &e.to_string())
                    .await?;
                Err(e)
            }
        }
    }
}

fn to_new_entry(feed_id: i64, parsed: ParsedEntry) -> NewEntry {
    let mut entry = NewEntry::new(feed_id);
    if let Some(guid) = parsed.guid {
        entry = entry.with_guid(guid);
    }
    if let Some(url) = parsed.url {
        entry = entry.with_url(url);
    }
    if let Some(title) = parsed.title {
        entry = entry.with_title(title);
    }
    if let Some(author) = parsed.author {
        entry = entry.with_author(author);
    }
    if let Some(content) = parsed.content {
        entry = entry.with_content(content);
    }
    if let Some(summary) = parsed.summary {
        entry = entry.with_summary(summary);
    }
    if let Some(published) = parsed.published {
        entry = entry.with_published(published);
    }
    entry
}
