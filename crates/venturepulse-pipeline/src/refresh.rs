//! The windowed trend refresh cycle.
//!
//! Per source: prune rows older than the start of yesterday, fetch the
//! current top items, prune today's rows (a same-day rerun replaces its own
//! output), insert the fetched items ranked by hot score, and stamp the
//! source. A fetch failure aborts the cycle after the first prune, leaving
//! yesterday's rows serving and the stamp untouched.

use std::collections::HashSet;
use std::future::Future;
use std::sync::Mutex;

use chrono::{DateTime, Duration, NaiveTime, Utc};
use uuid::Uuid;

use venturepulse_core::{SignalItem, SourceType};
use venturepulse_signals::{hot_score, reconcile, FeedClient, SignalError};

use crate::error::RefreshError;
use crate::store::TrendStore;

/// The source fields one refresh cycle needs.
#[derive(Debug, Clone)]
pub struct RefreshTarget {
    pub id: Uuid,
    pub source_type: SourceType,
    pub feed_url: Option<String>,
}

/// Upstream fetch seam for the refresh cycle.
pub trait TrendFetch {
    fn fetch_top(
        &self,
        source_type: SourceType,
        feed_url: Option<&str>,
        limit: usize,
    ) -> impl Future<Output = Result<Vec<SignalItem>, SignalError>> + Send;
}

impl TrendFetch for FeedClient {
    async fn fetch_top(
        &self,
        source_type: SourceType,
        feed_url: Option<&str>,
        limit: usize,
    ) -> Result<Vec<SignalItem>, SignalError> {
        self.fetch_top_items(source_type, feed_url, limit).await
    }
}

/// In-process per-source refresh locks.
///
/// Two concurrent cycles for the same source would double-delete and
/// double-insert each other's window; the second caller gets
/// [`RefreshError::AlreadyRunning`] instead. Different sources refresh
/// concurrently.
#[derive(Debug, Default)]
pub struct RefreshLocks {
    running: Mutex<HashSet<Uuid>>,
}

impl RefreshLocks {
    #[must_use]
    pub fn new() -> Self {
        Self::default()
    }

    /// Try to claim the lock for a source. Returns `None` when a cycle for
    /// that source is already running.
    pub fn acquire(&self, source_id: Uuid) -> Option<RefreshGuard<'_>> {
        let mut running = self.running.lock().unwrap_or_else(std::sync::PoisonError::into_inner);
        if running.insert(source_id) {
            Some(RefreshGuard {
                locks: self,
                source_id,
            })
        } else {
            None
        }
    }
}

/// Releases the per-source lock on drop, on every exit path.
pub struct RefreshGuard<'a> {
    locks: &'a RefreshLocks,
    source_id: Uuid,
}

impl Drop for RefreshGuard<'_> {
    fn drop(&mut self) {
        let mut running = self
            .locks
            .running
            .lock()
            .unwrap_or_else(std::sync::PoisonError::into_inner);
        running.remove(&self.source_id);
    }
}

/// What one completed cycle did.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct RefreshReport {
    pub pruned_old: u64,
    pub pruned_today: u64,
    pub fetched: usize,
    pub inserted: u64,
}

/// Run one refresh cycle for one source.
///
/// `now` is injected so the day-window arithmetic is testable; callers pass
/// `Utc::now()`.
///
/// # Errors
///
/// - [`RefreshError::AlreadyRunning`] when the source's lock is held.
/// - [`RefreshError::Fetch`] when the upstream fetch fails; the cycle aborts
///   with yesterday's rows intact and no stamp.
/// - [`RefreshError::Store`] on any persistence failure.
pub async fn refresh_source<St, F>(
    store: &St,
    fetch: &F,
    locks: &RefreshLocks,
    target: &RefreshTarget,
    limit: usize,
    now: DateTime<Utc>,
) -> Result<RefreshReport, RefreshError>
where
    St: TrendStore + Sync,
    F: TrendFetch + Sync,
{
    let _guard = locks
        .acquire(target.id)
        .ok_or(RefreshError::AlreadyRunning(target.id))?;

    let start_of_today = now.date_naive().and_time(NaiveTime::MIN).and_utc();
    let start_of_yesterday = start_of_today - Duration::days(1);

    let pruned_old = store.delete_before(target.id, start_of_yesterday).await?;

    let items = fetch
        .fetch_top(target.source_type, target.feed_url.as_deref(), limit)
        .await?;
    tracing::debug!(source_id = %target.id, fetched = items.len(), "trend fetch resolved");

    let pruned_today = store.delete_since(target.id, start_of_today).await?;

    let fetched = items.len();
    let surviving = store.surviving_external_ids(target.id).await?;
    let fresh = reconcile(items, &surviving);

    let ranked: Vec<(SignalItem, f64)> = fresh
        .into_iter()
        .map(|item| {
            let hot = hot_score(item.score, item.comment_count);
            (item, hot)
        })
        .collect();
    let inserted = store.insert_batch(target.id, &ranked).await?;

    store.stamp_refreshed(target.id, now).await?;
    tracing::info!(
        source_id = %target.id,
        pruned_old,
        pruned_today,
        fetched,
        inserted,
        "refresh cycle committed"
    );

    Ok(RefreshReport {
        pruned_old,
        pruned_today,
        fetched,
        inserted,
    })
}
