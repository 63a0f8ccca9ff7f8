//! Periodic cleanup of expired sessions

use anyhow::Result;
use chrono::Duration;
use common::clock::{Clock, SystemClock};
use common::error::{DatabaseError, DatabaseResult};
use std::sync::Arc;
use tokio_cron_scheduler::{Job, JobScheduler};
use tracing::{error, info};

use crate::repositories::SessionStore;
use crate::session::SessionSettings;

/// Deletes session rows that can no longer be verified or refreshed
#[derive(Clone)]
pub struct SessionJanitor {
    sessions: Arc<dyn SessionStore>,
    clock: Arc<dyn Clock>,
    /// Rows are kept this long past expiry so grace-period refreshes still find them
    retention: Duration,
    store_timeout: std::time::Duration,
}

impl SessionJanitor {
    pub fn new(sessions: Arc<dyn SessionStore>, settings: &SessionSettings) -> Self {
        Self {
            sessions,
            clock: Arc::new(SystemClock),
            retention: settings.grace_period,
            store_timeout: settings.store_timeout,
        }
    }

    #[must_use]
    pub fn with_clock(mut self, clock: Arc<dyn Clock>) -> Self {
        self.clock = clock;
        self
    }

    /// Run one sweep now and return the number of deleted rows.
    ///
    /// The cutoff is now minus the grace period: a row goes once its expiry
    /// plus the grace period has passed, so sessions that can still be
    /// refreshed are left alone.
    pub async fn run_once(&self) -> DatabaseResult<u64> {
        let cutoff = self.clock.now() - self.retention;
        tokio::time::timeout(self.store_timeout, self.sessions.delete_expired(cutoff))
            .await
            .map_err(DatabaseError::from)?
    }

    /// Run one sweep, logging instead of propagating failures
    pub async fn sweep(&self) {
        match self.run_once().await {
            Ok(0) => info!("Session janitor found no expired sessions"),
            Ok(deleted) => info!("Session janitor deleted {} expired sessions", deleted),
            Err(e) => error!("Session janitor sweep failed: {}", e),
        }
    }

    /// Schedule the sweep on a cron expression
    pub async fn start(&self, schedule: &str) -> Result<JanitorHandle> {
        let janitor = self.clone();

        let scheduler = JobScheduler::new().await?;

        let job = Job::new_async(schedule, move |_, _| {
            let janitor = janitor.clone();
            Box::pin(async move {
                janitor.sweep().await;
            })
        })?;

        scheduler.add(job).await?;
        scheduler.start().await?;

        info!("Started session janitor with schedule: {}", schedule);
        Ok(JanitorHandle { scheduler })
    }
}

/// Running janitor schedule
pub struct JanitorHandle {
    scheduler: JobScheduler,
}

impl JanitorHandle {
    /// Stop the schedule; an in-flight sweep is not interrupted
    pub async fn shutdown(mut self) -> Result<()> {
        self.scheduler.shutdown().await?;
        info!("Session janitor stopped");
        Ok(())
    }
}
