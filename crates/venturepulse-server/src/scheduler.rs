//! Background job scheduler.
//!
//! Initialises a [`JobScheduler`] at server startup and registers the daily
//! trend-refresh job.

use std::sync::Arc;

use chrono::Utc;
use sqlx::PgPool;
use tokio_cron_scheduler::{Job, JobScheduler, JobSchedulerError};

use venturepulse_core::AppConfig;
use venturepulse_pipeline::{refresh_source, PgStore, RefreshLocks, RefreshTarget};
use venturepulse_signals::FeedClient;

/// Builds and starts the background job scheduler.
///
/// Returns the running [`JobScheduler`] handle, which must be kept alive
/// for the lifetime of the process; dropping it shuts down all jobs.
///
/// # Errors
///
/// Returns [`JobSchedulerError`] if the scheduler cannot be initialised,
/// a job cannot be registered, or the scheduler fails to start.
pub async fn build_scheduler(
    pool: PgPool,
    config: Arc<AppConfig>,
    locks: Arc<RefreshLocks>,
    feed: Arc<FeedClient>,
) -> Result<JobScheduler, JobSchedulerError> {
    let scheduler = JobScheduler::new().await?;

    register_refresh_job(&scheduler, pool, config, locks, feed).await?;

    scheduler.start().await?;
    Ok(scheduler)
}

/// Register the daily trend-refresh job.
///
/// Runs every day at 05:00 UTC (`0 0 5 * * *`), walking every active source
/// and running a full refresh cycle for each. Per-source failures are logged
/// and skipped so one broken feed cannot stall the rest.
async fn register_refresh_job(
    scheduler: &JobScheduler,
    pool: PgPool,
    config: Arc<AppConfig>,
    locks: Arc<RefreshLocks>,
    feed: Arc<FeedClient>,
) -> Result<(), JobSchedulerError> {
    let job = Job::new_async("0 0 5 * * *", move |_uuid, _lock| {
        let pool = pool.clone();
        let config = Arc::clone(&config);
        let locks = Arc::clone(&locks);
        let feed = Arc::clone(&feed);

        Box::pin(async move {
            tracing::info!("scheduler: starting daily trend refresh");
            run_refresh_job(&pool, &config, &locks, &feed).await;
            tracing::info!("scheduler: daily trend refresh complete");
        })
    })?;

    scheduler.add(job).await?;
    Ok(())
}

/// Drive a refresh cycle for every active source.
async fn run_refresh_job(
    pool: &PgPool,
    config: &AppConfig,
    locks: &RefreshLocks,
    feed: &FeedClient,
) {
    let sources = match venturepulse_db::sources::list_active_sources(pool).await {
        Ok(s) => s,
        Err(e) => {
            tracing::error!(error = %e, "scheduler: failed to load active sources");
            return;
        }
    };

    if sources.is_empty() {
        tracing::info!("scheduler: no active trend sources; skipping");
        return;
    }

    let store = PgStore::new(pool.clone());
    for source in &sources {
        let target = RefreshTarget {
            id: source.id,
            source_type: source.source_type,
            feed_url: source.feed_url.clone(),
        };
        match refresh_source(
            &store,
            feed,
            locks,
            &target,
            config.refresh_item_limit,
            Utc::now(),
        )
        .await
        {
            Ok(report) => {
                tracing::info!(
                    source = %source.name,
                    fetched = report.fetched,
                    inserted = report.inserted,
                    "scheduler: source refreshed"
                );
            }
            Err(e) => {
                tracing::error!(source = %source.name, error = %e, "scheduler: source refresh failed");
            }
        }
    }
}
