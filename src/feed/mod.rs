//! Feed fetching, storage and background refresh.

pub mod fetcher;
pub mod repository;
pub mod service;
pub mod types;
pub mod updater;

pub use fetcher::{parse_feed, validate_url, FeedFetcher};
pub use repository::FeedRepository;
pub use service::{FeedService, ImportSummary};
pub use types::{Feed, NewFeed, ParsedEntry, ParsedFeed, MAX_CONSECUTIVE_ERRORS};
pub use updater::{start_feed_updater, FeedUpdater};
