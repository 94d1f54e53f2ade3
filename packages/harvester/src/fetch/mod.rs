//! Phase 2: concurrent detail fetching.
//!
//! A fixed-size worker pool visits each backlog record's URL in its own
//! browser page. Failures are per-record: they are logged and counted,
//! the record stays in the backlog, and sibling workers keep going.

use std::future::Future;
use std::sync::Arc;
use std::time::Instant;

use tokio::sync::Semaphore;
use tokio::task::JoinSet;
use tokio_util::sync::CancellationToken;
use tracing::{info, warn};

use crate::browser::{jitter_sleep, navigate, wait_for_selector, SessionPool};
use crate::config::PipelineConfig;
use crate::error::{FetchError, Result};
use crate::scrape::detail::{parse_detail_page, DESCRIPTION_READY};
use crate::traits::JobStore;
use crate::types::{JobPosting, RunReport};

/// Run `work` over `items` with at most `limit` tasks in flight.
///
/// A permit is acquired before each task is spawned, so in-flight tasks
/// never exceed `limit` and every item eventually gets a worker. The
/// token stops dispatch of further items; tasks already running finish.
/// Each task reports success as `true`; the return value is
/// `(succeeded, failed)` over the items dispatched.
pub async fn for_each_bounded<T, F, Fut>(
    items: Vec<T>,
    limit: usize,
    cancel: &CancellationToken,
    work: F,
) -> (usize, usize)
where
    T: Send + 'static,
    F: Fn(T) -> Fut,
    Fut: Future<Output = bool> + Send + 'static,
{
    let semaphore = Arc::new(Semaphore::new(limit));
    let mut tasks = JoinSet::new();
    let mut succeeded = 0usize;
    let mut failed = 0usize;

    for item in items {
        if cancel.is_cancelled() {
            break;
        }
        let permit = match semaphore.clone().acquire_owned().await {
            Ok(permit) => permit,
            Err(_) => break,
        };
        let fut = work(item);
        tasks.spawn(async move {
            let ok = fut.await;
            drop(permit);
            ok
        });
    }

    while let Some(joined) = tasks.join_next().await {
        match joined {
            Ok(true) => succeeded += 1,
            Ok(false) => failed += 1,
            Err(e) => {
                warn!(error = %e, "detail task panicked");
                failed += 1;
            }
        }
    }

    (succeeded, failed)
}

/// Worker-pool driver for the detail-fetch phase.
pub struct DetailFetcher {
    store: Arc<dyn JobStore>,
    pool: Arc<SessionPool>,
    config: PipelineConfig,
}

impl DetailFetcher {
    pub fn new(store: Arc<dyn JobStore>, pool: Arc<SessionPool>, config: PipelineConfig) -> Self {
        Self {
            store,
            pool,
            config,
        }
    }

    /// Drain the detail backlog through the worker pool.
    ///
    /// Always returns a report; per-record failures never abort the run.
    pub async fn run(&self, cancel: &CancellationToken) -> Result<RunReport> {
        let started = Instant::now();
        let backlog = self.store.detail_backlog(None).await?;
        let total = backlog.len();
        info!(backlog = total, workers = self.config.fetch_concurrency, "starting detail fetch");

        let store = self.store.clone();
        let pool = self.pool.clone();
        let config = self.config.clone();

        let (succeeded, failed) = for_each_bounded(
            backlog,
            self.config.fetch_concurrency,
            cancel,
            move |posting| {
                let store = store.clone();
                let pool = pool.clone();
                let config = config.clone();
                async move {
                    let url = posting.url.clone();
                    match fetch_one(&posting, store.as_ref(), &pool, &config).await {
                        Ok(()) => true,
                        Err(e) => {
                            warn!(url = %url, error = %e, "detail fetch failed; record stays in backlog");
                            false
                        }
                    }
                }
            },
        )
        .await;

        // A cancelled run must not leave the Chrome process behind. All
        // in-flight tasks have finished by now, so this closes cleanly.
        if cancel.is_cancelled() {
            info!("run cancelled; closing browser sessions");
            self.pool.shutdown().await;
        }

        let report = RunReport {
            processed: succeeded + failed,
            succeeded,
            failed,
            elapsed: started.elapsed(),
        };
        info!(
            processed = report.processed,
            succeeded = report.succeeded,
            failed = report.failed,
            "detail fetch finished"
        );
        Ok(report)
    }
}

/// Fetch and persist one posting's detail fields.
async fn fetch_one(
    posting: &JobPosting,
    store: &dyn JobStore,
    pool: &SessionPool,
    config: &PipelineConfig,
) -> std::result::Result<(), FetchError> {
    jitter_sleep(&config.jitter).await;

    let page = pool.page().await?;
    navigate(&page, &posting.url, config.navigation_timeout).await?;

    // The description renders late on script-heavy pages. Its absence
    // after the wait is not fatal; the parse just yields empty fields.
    if !wait_for_selector(&page, DESCRIPTION_READY, config.content_timeout).await {
        warn!(url = %posting.url, "description selector never appeared");
    }

    let html = page.content().await.map_err(|e| FetchError::Content {
        url: posting.url.clone(),
        source: Box::new(e),
    })?;

    let details = parse_detail_page(&html);

    store
        .apply_details(&posting.source, &posting.external_id, &details)
        .await
        .map_err(|e| FetchError::Persist {
            url: posting.url.clone(),
            source: Box::new(e),
        })?;

    page.close().await;
    Ok(())
}

#[cfg(test)]
mod tests {
    use super::*;
    use std::sync::atomic::{AtomicUsize, Ordering};
    use std::time::Duration;

    #[tokio::test]
    async fn in_flight_tasks_never_exceed_the_limit() {
        let in_flight = Arc::new(AtomicUsize::new(0));
        let high_water = Arc::new(AtomicUsize::new(0));
        let cancel = CancellationToken::new();

        let items: Vec<u32> = (0..20).collect();
        let (succeeded, failed) = for_each_bounded(items, 3, &cancel, {
            let in_flight = in_flight.clone();
            let high_water = high_water.clone();
            move |_| {
                let in_flight = in_flight.clone();
                let high_water = high_water.clone();
                async move {
                    let now = in_flight.fetch_add(1, Ordering::SeqCst) + 1;
                    high_water.fetch_max(now, Ordering::SeqCst);
                    tokio::time::sleep(Duration::from_millis(10)).await;
                    in_flight.fetch_sub(1, Ordering::SeqCst);
                    true
                }
            }
        })
        .await;

        assert_eq!(succeeded, 20);
        assert_eq!(failed, 0);
        assert!(high_water.load(Ordering::SeqCst) <= 3);
    }

    #[tokio::test]
    async fn failures_are_counted_not_propagated() {
        let cancel = CancellationToken::new();
        let items: Vec<u32> = (0..10).collect();
        let (succeeded, failed) =
            for_each_bounded(items, 4, &cancel, |n| async move { n % 2 == 0 }).await;
        assert_eq!(succeeded, 5);
        assert_eq!(failed, 5);
    }

    #[tokio::test]
    async fn cancellation_stops_dispatch() {
        let cancel = CancellationToken::new();
        cancel.cancel();
        let items: Vec<u32> = (0..10).collect();
        let (succeeded, failed) =
            for_each_bounded(items, 2, &cancel, |_| async move { true }).await;
        assert_eq!(succeeded + failed, 0);
    }
}
