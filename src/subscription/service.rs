//! Subscription service for Feedloft.
//!
//! Business rules on top of the subscription and folder repositories:
//! ownership checks, title validation and idempotent subscribe.

use tracing::info;

use super::repository::{FolderRepository, SubscriptionRepository};
use super::types::{FeedSubscription, Folder, SubscribedFeed, MAX_FOLDER_TITLE_LENGTH};
use crate::db::Database;
use crate::feed::{validate_url, Feed, FeedRepository};
use crate::{FeedloftError, Result};

/// Service for subscription and folder operations.
pub struct SubscriptionService<'a> {
    db: &'a Database,
}

impl<'a> SubscriptionService<'a> {
    /// Create a new SubscriptionService.
    pub fn new(db: &'a Database) -> Self {
        Self { db }
    }

    /// Subscribe a user to the feed at `fetch_url`, creating the feed if it
    /// is not known yet.
    ///
    /// Subscribing to an already subscribed feed is a no-op.
    pub async fn subscribe(&self, user_id: i64, fetch_url: &str) -> Result<(Feed, FeedSubscription)> {
        let fetch_url = fetch_url.trim();
        validate_url(fetch_url)?;
        let feed = FeedRepository::new(self.db.pool())
            .find_or_create(fetch_url)
            .await?;
        let subscription = SubscriptionRepository::new(self.db.pool())
            .subscribe(user_id, feed.id)
            .await?;
        Ok((feed, subscription))
    }

    /// Unsubscribe a user from a feed.
    pub async fn unsubscribe(&self, user_id: i64, feed_id: i64) -> Result<()> {
        let removed = SubscriptionRepository::new(self.db.pool())
            .unsubscribe(user_id, feed_id)
            .await?;
        if !removed {
            return Err(FeedloftError::NotFound("subscription".to_string()));
        }
        info!(user_id, feed_id, "Unsubscribed from feed");
        Ok(())
    }

    /// List the user's feeds with unread counts.
    pub async fn list_feeds(&self, user_id: i64) -> Result<Vec<SubscribedFeed>> {
        SubscriptionRepository::new(self.db.pool())
            .list_for_user(user_id)
            .await
    }

    /// Get a feed the user is subscribed to.
    pub async fn get_feed(&self, user_id: i64, feed_id: i64) -> Result<Feed> {
        if !SubscriptionRepository::new(self.db.pool())
            .is_subscribed(user_id, feed_id)
            .await?
        {
            return Err(FeedloftError::NotFound("feed".to_string()));
        }
        FeedRepository::new(self.db.pool())
            .get_by_id(feed_id)
            .await?
            .ok_or_else(|| FeedloftError::NotFound("feed".to_string()))
    }

    /// Create a folder.
    pub async fn create_folder(&self, user_id: i64, title: &str) -> Result<Folder> {
        let title = title.trim();
        if title.is_empty() {
            return Err(FeedloftError::Validation(
                "folder title can't be blank".to_string(),
            ));
        }
        if title.chars().count() > MAX_FOLDER_TITLE_LENGTH {
            return Err(FeedloftError::Validation(format!(
                "folder title must be at most {} characters",
                MAX_FOLDER_TITLE_LENGTH
            )));
        }

        let folders = FolderRepository::new(self.db.pool());
        if folders.get_by_title(user_id, title).await?.is_some() {
            return Err(FeedloftError::Validation(
                "folder title already exists".to_string(),
            ));
        }
        folders.create(user_id, title).await
    }

    /// List the user's folders.
    pub async fn list_folders(&self, user_id: i64) -> Result<Vec<Folder>> {
        FolderRepository::new(self.db.pool())
            .list_for_user(user_id)
            .await
    }

    /// Move a subscribed feed into one of the user's folders.
    pub async fn move_to_folder(&self, user_id: i64, feed_id: i64, folder_id: i64) -> Result<()> {
        FolderRepository::new(self.db.pool())
            .get_for_user(folder_id, user_id)
            .await?
            .ok_or_else(|| FeedloftError::NotFound("folder".to_string()))?;

        self.set_folder(user_id, feed_id, Some(folder_id)).await
    }

    /// Take a subscribed feed out of its folder.
    pub async fn remove_from_folder(&self, user_id: i64, feed_id: i64) -> Result<()> {
        self.set_folder(user_id, feed_id, None).await
    }

    /// Delete one of the user's folders. Its feeds stay subscribed.
    pub async fn delete_folder(&self, user_id: i64, folder_id: i64) -> Result<()> {
        let folders = FolderRepository::new(self.db.pool());
        folders
            .get_for_user(folder_id, user_id)
            .await?
            .ok_or_else(|| FeedloftError::NotFound("folder".to_string()))?;
        folders.delete(folder_id).await?;
        Ok(())
    }

    async fn set_folder(&self, user_id: i64, feed_id: i64, folder_id: Option<i64>) -> Result<()> {
        let updated = SubscriptionRepository::new(self.db.pool())
            .set_folder(user_id, feed_id, folder_id)
            .await?;
        if updated {
            Ok(())
        } else {
            Err(FeedloftError::NotFound("subscription".to_string()))
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::db::{NewUser, UserRepository};

    async fn setup() -> (Database, i64, i64) {
        let db = Database::open_in_memory().await.unwrap();
        let users = UserRepository::new(db.pool());
        let alice = users
            .create(&NewUser::new("alice@example.com", "hash", "Alice"))
            .await
            .unwrap()
            .id;
        let bob = users
            .create(&NewUser::new("bob@example.com", "hash", "Bob"))
            .await
            .unwrap()
            .id;
        (db, alice, bob)
    }

    #[tokio::test]
    async fn test_subscribe_creates_feed_once() {
        let (db, alice, bob) = setup().await;
        let service = SubscriptionService::new(&db);

        let (feed, _) = service
            .subscribe(alice, "http://feed.server.com/rss")
            .await
            .unwrap();
        let (again, _) = service
            .subscribe(bob, " http://feed.server.com/rss ")
            .await
            .unwrap();
        assert_eq!(feed.id, again.id);

        service
            .subscribe(alice, "http://feed.server.com/rss")
            .await
            .unwrap();
        assert_eq!(service.list_feeds(alice).await.unwrap().len(), 1);
    }

    #[tokio::test]
    async fn test_subscribe_rejects_bad_url() {
        let (db, alice, _) = setup().await;
        let result = SubscriptionService::new(&db)
            .subscribe(alice, "ftp://feed.server.com")
            .await;
        assert!(matches!(result, Err(FeedloftError::Validation(_))));
    }

    #[tokio::test]
    async fn test_unsubscribe() {
        let (db, alice, bob) = setup().await;
        let service = SubscriptionService::new(&db);
        let (feed, _) = service
            .subscribe(alice, "http://feed.server.com/rss")
            .await
            .unwrap();

        assert!(matches!(
            service.unsubscribe(bob, feed.id).await,
            Err(FeedloftError::NotFound(_))
        ));
        service.unsubscribe(alice, feed.id).await.unwrap();
        assert!(service.list_feeds(alice).await.unwrap().is_empty());
        assert!(matches!(
            service.get_feed(alice, feed.id).await,
            Err(FeedloftError::NotFound(_))
        ));
    }

    #[tokio::test]
    async fn test_create_folder_validation() {
        let (db, alice, bob) = setup().await;
        let service = SubscriptionService::new(&db);

        let folder = service.create_folder(alice, "  Comics ").await.unwrap();
        assert_eq!(folder.title, "Comics");

        assert!(matches!(
            service.create_folder(alice, "   ").await,
            Err(FeedloftError::Validation(_))
        ));
        assert!(matches!(
            service.create_folder(alice, &"x".repeat(101)).await,
            Err(FeedloftError::Validation(_))
        ));
        assert!(matches!(
            service.create_folder(alice, "Comics").await,
            Err(FeedloftError::Validation(_))
        ));
        // Titles are unique per user only
        service.create_folder(bob, "Comics").await.unwrap();
    }

    #[tokio::test]
    async fn test_move_to_folder_requires_ownership() {
        let (db, alice, bob) = setup().await;
        let service = SubscriptionService::new(&db);
        let (feed, _) = service
            .subscribe(alice, "http://feed.server.com/rss")
            .await
            .unwrap();
        let bobs = service.create_folder(bob, "Bob's").await.unwrap();
        let alices = service.create_folder(alice, "Alice's").await.unwrap();

        assert!(matches!(
            service.move_to_folder(alice, feed.id, bobs.id).await,
            Err(FeedloftError::NotFound(_))
        ));

        service.move_to_folder(alice, feed.id, alices.id).await.unwrap();
        let feeds = service.list_feeds(alice).await.unwrap();
        assert_eq!(feeds[0].folder_id, Some(alices.id));

        service.remove_from_folder(alice, feed.id).await.unwrap();
        let feeds = service.list_feeds(alice).await.unwrap();
        assert_eq!(feeds[0].folder_id, None);
    }

    #[tokio::test]
    async fn test_move_unsubscribed_feed() {
        let (db, alice, _) = setup().await;
        let service = SubscriptionService::new(&db);
        let folder = service.create_folder(alice, "News").await.unwrap();
        assert!(matches!(
            service.move_to_folder(alice, 42, folder.id).await,
            Err(FeedloftError::NotFound(_))
        ));
    }

    #[tokio::test]
    async fn test_delete_folder() {
        let (db, alice, bob) = setup().await;
        let service = SubscriptionService::new(&db);
        let folder = service.create_folder(alice, "News").await.unwrap();

        assert!(matches!(
            service.delete_folder(bob, folder.id).await,
            Err(FeedloftError::NotFound(_))
        ));
        service.delete_folder(alice, folder.id).await.unwrap();
        assert!(service.list_folders(alice).await.unwrap().is_empty());
    }
}
