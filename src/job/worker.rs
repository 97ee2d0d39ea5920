//! Background job runner.
//!
//! Jobs are spawned onto the tokio runtime; their progress is persisted as
//! job-state rows which clients poll.

use std::sync::Arc;

use chrono::Utc;
use tracing::{error, info, warn};

use super::opml::build_opml;
use super::repository::{OpmlExportJobStateRepository, SubscribeJobStateRepository};
use super::types::{JobState, SubscribeJobState};
use crate::db::{Database, UserRepository};
use crate::feed::{FeedFetcher, FeedService, ParsedFeed};
use crate::subscription::{FolderRepository, SubscriptionRepository, SubscriptionService};
use crate::{FeedloftError, Result};

/// Starts and runs subscribe and OPML export jobs.
#[derive(Clone)]
pub struct JobRunner {
    db: Arc<Database>,
    fetcher: Arc<FeedFetcher>,
    max_entries: usize,
}

impl JobRunner {
    /// Create a new JobRunner.
    pub fn new(db: Arc<Database>, fetcher: Arc<FeedFetcher>, max_entries: usize) -> Self {
        Self {
            db,
            fetcher,
            max_entries,
        }
    }

    /// Record a subscribe job and run it in the background.
    ///
    /// Returns the RUNNING job state immediately.
    pub async fn start_subscribe(&self, user_id: i64, fetch_url: &str) -> Result<SubscribeJobState> {
        let fetch_url = fetch_url.trim();
        if fetch_url.is_empty() {
            return Err(FeedloftError::Validation("url can't be blank".to_string()));
        }

        let job = SubscribeJobStateRepository::new(self.db.pool())
            .create(user_id, fetch_url)
            .await?;
        info!(job_id = job.id, user_id, url = %fetch_url, "Subscribe job started");

        let runner = self.clone();
        let spawned = job.clone();
        tokio::spawn(async move {
            runner.run_subscribe(spawned).await;
        });

        Ok(job)
    }

    /// Fetch the job's URL and subscribe its user, recording the outcome.
    pub async fn run_subscribe(&self, job: SubscribeJobState) {
        let outcome = match self.fetcher.fetch(&job.fetch_url).await {
            Ok(parsed) => self.complete_subscribe(&job, parsed).await,
            Err(e) => Err(e),
        };

        if let Err(e) = outcome {
            warn!(job_id = job.id, url = %job.fetch_url, "Subscribe job failed: {}", e);
            if let Err(e) = SubscribeJobStateRepository::new(self.db.pool())
                .set_state(job.id, JobState::Error, None)
                .await
            {
                error!(job_id = job.id, "Failed to record subscribe job error: {}", e);
            }
        }
    }

    /// Subscribe the job's user to an already fetched feed and import its
    /// entries.
    pub async fn complete_subscribe(
        &self,
        job: &SubscribeJobState,
        parsed: ParsedFeed,
    ) -> Result<SubscribeJobState> {
        let (feed, _) = SubscriptionService::new(&self.db)
            .subscribe(job.user_id, &job.fetch_url)
            .await?;
        let summary = FeedService::new(&self.db, self.max_entries)
            .import_parsed(&feed, parsed)
            .await?;

        let jobs = SubscribeJobStateRepository::new(self.db.pool());
        jobs.set_state(job.id, JobState::Success, Some(feed.id))
            .await?;
        info!(
            job_id = job.id,
            feed_id = feed.id,
            created = summary.created,
            "Subscribe job finished"
        );

        jobs.get_by_id(job.id)
            .await?
            .ok_or_else(|| FeedloftError::NotFound("subscribe job state".to_string()))
    }

    /// Mark an OPML export as running and build it in the background.
    pub async fn start_opml_export(&self, user_id: i64) -> Result<()> {
        OpmlExportJobStateRepository::new(self.db.pool())
            .start(user_id)
            .await?;
        info!(user_id, "OPML export started");

        let runner = self.clone();
        tokio::spawn(async move {
            runner.run_opml_export(user_id).await;
        });
        Ok(())
    }

    /// Build and store the user's OPML document, recording the outcome.
    pub async fn run_opml_export(&self, user_id: i64) {
        let repo = OpmlExportJobStateRepository::new(self.db.pool());
        let outcome = match self.build_export(user_id).await {
            Ok(opml) => repo.finish_success(user_id, &opml).await.map(|()| opml.len()),
            Err(e) => Err(e),
        };

        match outcome {
            Ok(bytes) => info!(user_id, bytes, "OPML export finished"),
            Err(e) => {
                warn!(user_id, "OPML export failed: {}", e);
                if let Err(e) = repo.set_state(user_id, JobState::Error).await {
                    error!(user_id, "Failed to record OPML export error: {}", e);
                }
            }
        }
    }

    async fn build_export(&self, user_id: i64) -> Result<String> {
        let user = UserRepository::new(self.db.pool())
            .get_by_id(user_id)
            .await?
            .ok_or_else(|| FeedloftError::NotFound("user".to_string()))?;
        let feeds = SubscriptionRepository::new(self.db.pool())
            .list_for_user(user_id)
            .await?;
        let folders = FolderRepository::new(self.db.pool())
            .list_for_user(user_id)
            .await?;
        Ok(build_opml(&user.email, &feeds, &folders, Utc::now()))
    }
}
