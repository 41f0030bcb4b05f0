use std::sync::{Arc, Mutex, MutexGuard, PoisonError};
use std::time::Duration;

use chrono::{Local, NaiveDateTime};
use tracing::info;

use crate::task::DeferredTask;

#[derive(Debug, Default)]
struct RefreshState {
    last_crawled_at: Option<NaiveDateTime>,
    pending: Option<DeferredTask>,
}

/// Mock "re-crawl" button. Nothing is fetched; completion only stamps the time.
#[derive(Debug, Clone)]
pub struct CrawlRefresher {
    delay: Duration,
    inner: Arc<Mutex<RefreshState>>,
}

impl CrawlRefresher {
    pub fn new(delay: Duration) -> Self {
        Self {
            delay,
            inner: Arc::new(Mutex::new(RefreshState::default())),
        }
    }

    fn lock(&self) -> MutexGuard<'_, RefreshState> {
        self.inner.lock().unwrap_or_else(PoisonError::into_inner)
    }

    /// Returns `false` when a refresh is already running.
    pub fn refresh(&self) -> bool {
        let mut state = self.lock();
        if state.pending.is_some() {
            return false;
        }
        let inner = self.inner.clone();
        let task = DeferredTask::start(
            "crawl_refresh",
            self.delay,
            || Local::now().naive_local(),
            move |stamp| {
                let mut state = inner.lock().unwrap_or_else(PoisonError::into_inner);
                state.pending = None;
                state.last_crawled_at = Some(stamp);
            },
        );
        state.pending = Some(task);
        info!("crawl refresh started");
        true
    }

    pub fn is_refreshing(&self) -> bool {
        self.lock().pending.is_some()
    }

    pub fn last_crawled_at(&self) -> Option<NaiveDateTime> {
        self.lock().last_crawled_at
    }

    /// `YYYY-MM-DD HH:MM`, or `—` before the first refresh.
    pub fn last_crawled_label(&self) -> String {
        self.last_crawled_at()
            .map(|t| t.format("%Y-%m-%d %H:%M").to_string())
            .unwrap_or_else(|| "—".to_string())
    }
}
