//! Headless-browser session management.
//!
//! A [`SessionPool`] owns one Chrome process and hands out isolated pages
//! on demand; the run owns the pool's lifecycle (no module-level browser
//! state). Concurrency is bounded by the caller's scheduler, not here:
//! each pipeline task opens at most one page at a time and closes it when
//! the record is done, so open pages never exceed the worker-pool size.

use std::future::Future;
use std::ops::Deref;
use std::time::Duration;

use chromiumoxide::browser::{Browser, BrowserConfig};
use chromiumoxide::Page;
use futures::StreamExt;
use rand::Rng;
use tokio::sync::Mutex;
use tokio::task::JoinHandle;
use tokio::time::Instant;
use tracing::{debug, warn};

use crate::config::JitterRange;
use crate::error::{FetchError, HarvestError, Result};

/// How often selector waits re-poll the DOM.
const SELECTOR_POLL_INTERVAL: Duration = Duration::from_millis(250);

/// Upper bound on waiting for the event handler to drain after close.
const HANDLER_DRAIN_TIMEOUT: Duration = Duration::from_secs(5);

/// A pool of browser sessions backed by a single Chrome process.
///
/// Shareable behind an `Arc`; [`SessionPool::shutdown`] takes `&self` so
/// any holder (including a cancelled run) can close the browser.
pub struct SessionPool {
    browser: Mutex<Option<Browser>>,
    handler_task: Mutex<Option<JoinHandle<()>>>,
}

impl SessionPool {
    /// Launch Chrome and start draining its event handler.
    pub async fn launch(headless: bool) -> Result<Self> {
        let mut builder = BrowserConfig::builder();
        if !headless {
            builder = builder.with_head();
        }
        let config = builder
            .build()
            .map_err(|e| HarvestError::Browser(e.into()))?;

        let (browser, mut handler) = Browser::launch(config)
            .await
            .map_err(|e| HarvestError::Browser(Box::new(e)))?;

        // The handler stream must be polled for the browser to make
        // progress; it ends when the browser process exits.
        let handler_task = tokio::spawn(async move {
            while let Some(event) = handler.next().await {
                if event.is_err() {
                    break;
                }
            }
        });

        Ok(Self {
            browser: Mutex::new(Some(browser)),
            handler_task: Mutex::new(Some(handler_task)),
        })
    }

    /// Open a fresh page wrapped in a cleanup guard.
    ///
    /// Fails once the pool has been shut down.
    pub async fn page(&self) -> std::result::Result<PageGuard, FetchError> {
        let browser = self.browser.lock().await;
        let browser = browser
            .as_ref()
            .ok_or_else(|| FetchError::Session("browser already closed".into()))?;
        let page = browser
            .new_page("about:blank")
            .await
            .map_err(|e| FetchError::Session(Box::new(e)))?;
        Ok(PageGuard::new(page))
    }

    /// Close the browser and drain the handler task.
    ///
    /// Called on normal completion and on cancellation so no Chrome
    /// process outlives the run. Idempotent: later calls are no-ops.
    pub async fn shutdown(&self) {
        if let Some(mut browser) = self.browser.lock().await.take() {
            if let Err(e) = browser.close().await {
                warn!(error = %e, "failed to close browser cleanly");
            }
        }
        // Closing the browser ends the handler stream; wait for the
        // drain to finish, bounded in case the process is wedged.
        if let Some(mut task) = self.handler_task.lock().await.take() {
            if tokio::time::timeout(HANDLER_DRAIN_TIMEOUT, &mut task)
                .await
                .is_err()
            {
                warn!("handler task did not drain in time; aborting it");
                task.abort();
            }
        }
    }
}

/// RAII guard for a page.
///
/// chromiumoxide pages need an explicit async `close()`; without it they
/// leak CDP connections until the browser hits its target limit. The
/// explicit close path is preferred; `Drop` spawns a best-effort cleanup
/// task for error paths.
pub struct PageGuard {
    page: Option<Page>,
    runtime: tokio::runtime::Handle,
}

impl PageGuard {
    fn new(page: Page) -> Self {
        Self {
            page: Some(page),
            runtime: tokio::runtime::Handle::current(),
        }
    }

    /// Close the page, consuming the guard.
    pub async fn close(mut self) {
        if let Some(page) = self.page.take() {
            if let Err(e) = page.close().await {
                warn!(error = %e, "failed to close page");
            }
        }
    }
}

impl Deref for PageGuard {
    type Target = Page;

    fn deref(&self) -> &Self::Target {
        self.page.as_ref().expect("page already closed")
    }
}

impl Drop for PageGuard {
    fn drop(&mut self) {
        if let Some(page) = self.page.take() {
            self.runtime.spawn(async move {
                if let Err(e) = page.close().await {
                    debug!(error = %e, "page cleanup in drop failed");
                }
            });
        }
    }
}

/// Navigate and wait for the load to settle, bounded by `timeout`.
pub async fn navigate(
    page: &Page,
    url: &str,
    timeout: Duration,
) -> std::result::Result<(), FetchError> {
    let result = tokio::time::timeout(timeout, async {
        page.goto(url).await?;
        page.wait_for_navigation().await?;
        Ok::<_, chromiumoxide::error::CdpError>(())
    })
    .await;

    match result {
        Ok(Ok(())) => Ok(()),
        Ok(Err(e)) => Err(FetchError::Navigation {
            url: url.to_string(),
            source: Box::new(e),
        }),
        Err(_) => Err(FetchError::Timeout {
            url: url.to_string(),
        }),
    }
}

/// Poll for a selector until it appears or `timeout` elapses.
///
/// Returns whether the selector materialized; absence is a signal for the
/// caller to interpret (end of results, or an empty field), never an error.
pub async fn wait_for_selector(page: &Page, selector: &str, timeout: Duration) -> bool {
    wait_for_any_selector(page, &[selector], timeout).await
}

/// Poll for any of the candidate selectors under one shared deadline.
///
/// All candidates are checked on every poll, so a page using the last
/// known layout is detected as fast as one using the first, and a page
/// matching none gives up after a single `timeout`.
pub async fn wait_for_any_selector(page: &Page, candidates: &[&str], timeout: Duration) -> bool {
    poll_with_deadline(timeout, || async move {
        for candidate in candidates {
            if page.find_element(*candidate).await.is_ok() {
                return true;
            }
        }
        false
    })
    .await
}

/// Re-run `check` every poll interval until it succeeds or the single
/// shared deadline passes.
async fn poll_with_deadline<F, Fut>(timeout: Duration, mut check: F) -> bool
where
    F: FnMut() -> Fut,
    Fut: Future<Output = bool>,
{
    let deadline = Instant::now() + timeout;
    loop {
        if check().await {
            return true;
        }
        if Instant::now() >= deadline {
            return false;
        }
        tokio::time::sleep(SELECTOR_POLL_INTERVAL).await;
    }
}

/// Sleep a random human-like duration from the configured jitter range.
pub async fn jitter_sleep(jitter: &JitterRange) {
    let millis = if jitter.min_ms >= jitter.max_ms {
        jitter.min_ms
    } else {
        rand::thread_rng().gen_range(jitter.min_ms..=jitter.max_ms)
    };
    tokio::time::sleep(Duration::from_millis(millis)).await;
}
