//! Background feed updater.
//!
//! Periodically refreshes every subscribed feed that has not been disabled
//! by repeated fetch errors.

use std::sync::Arc;

use tokio::time::{interval, Duration};
use tracing::{debug, error, info, warn};

use crate::config::FeedsConfig;
use crate::db::Database;
use crate::feed::fetcher::FeedFetcher;
use crate::feed::repository::FeedRepository;
use crate::feed::service::FeedService;
use crate::feed::types::{Feed, MAX_CONSECUTIVE_ERRORS};

/// Feed background updater.
pub struct FeedUpdater {
    db: Arc<Database>,
    fetcher: Arc<FeedFetcher>,
    check_interval: Duration,
    max_entries: usize,
    retention: usize,
}

impl FeedUpdater {
    /// Create a new FeedUpdater from the feeds configuration.
    pub fn new(db: Arc<Database>, fetcher: Arc<FeedFetcher>, config: &FeedsConfig) -> Self {
        Self {
            db,
            fetcher,
            check_interval: Duration::from_secs(config.update_interval_secs),
            max_entries: config.max_entries_per_fetch,
            retention: config.max_entries_per_feed,
        }
    }

    /// Run the updater loop forever.
    pub async fn run(&self) {
        info!(
            "Feed updater started (interval: {} seconds)",
            self.check_interval.as_secs()
        );

        let mut timer = interval(self.check_interval);
        loop {
            timer.tick().await;
            self.update_all().await;
        }
    }

    /// Refresh every feed due for update once.
    ///
    /// Returns the number of feeds refreshed successfully.
    pub async fn update_all(&self) -> usize {
        let feeds = match FeedRepository::new(self.db.pool()).list_for_update().await {
            Ok(feeds) => feeds,
            Err(e) => {
                error!("Failed to list feeds for update: {}", e);
                return 0;
            }
        };

        if feeds.is_empty() {
            debug!("No feeds to update");
            return 0;
        }

        info!("Updating {} feed(s)", feeds.len());
        let mut updated = 0;
        for feed in feeds {
            if self.update_feed(&feed).await {
                updated += 1;
            }
        }
        updated
    }

    async fn update_feed(&self, feed: &Feed) -> bool {
        let service = FeedService::new(&self.db, self.max_entries).with_retention(self.retention);
        match service.refresh(&self.fetcher, feed).await {
            Ok(_) => true,
            Err(e) => {
                // refresh already recorded the error on the feed
                if feed.fetch_error_count + 1 >= MAX_CONSECUTIVE_ERRORS {
                    warn!(
                        feed_id = feed.id,
                        "Feed disabled after {} consecutive errors", MAX_CONSECUTIVE_ERRORS
                    );
                } else {
                    debug!(feed_id = feed.id, "Feed update failed: {}", e);
                }
                false
            }
        }
    }
}

/// Start the feed updater as a background task.
pub fn start_feed_updater(
    db: Arc<Database>,
    fetcher: Arc<FeedFetcher>,
    config: &FeedsConfig,
) -> tokio::task::JoinHandle<()> {
    let updater = FeedUpdater::new(db, fetcher, config);
    tokio::spawn(async move {
        updater.run().await;
    })
}
