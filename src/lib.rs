//! Feedloft - a multi-user feed reader.
//!
//! Feeds are fetched in the background, their entries normalized and
//! sanitized, and per-user read state is kept for every subscriber. A JSON
//! API exposes subscriptions, entries, folders and background job states.

pub mod auth;
pub mod config;
pub mod datetime;
pub mod db;
pub mod entry;
pub mod error;
pub mod feed;
pub mod job;
pub mod logging;
pub mod subscription;
pub mod web;

pub use auth::{authenticate, hash_password, register, verify_password, RegistrationRequest};
pub use config::Config;
pub use db::{Database, NewUser, User, UserRepository};
pub use entry::{Entry, EntryRepository, EntryState, EntryStateRepository, NewEntry};
pub use error::{FeedloftError, Result};
pub use feed::{Feed, FeedFetcher, FeedRepository, FeedService, FeedUpdater};
pub use job::{JobRunner, JobState, OpmlExportJobState, SubscribeJobState};
pub use subscription::{Folder, SubscriptionService};
pub use web::WebServer;
