//! Feed subscriptions and folders.

pub mod repository;
pub mod service;
pub mod types;

pub use repository::{FolderRepository, SubscriptionRepository};
pub use service::SubscriptionService;
pub use types::{FeedSubscription, Folder, SubscribedFeed, MAX_FOLDER_TITLE_LENGTH};
