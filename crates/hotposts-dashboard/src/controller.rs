//! The view controller: owns the dashboard state and sequences every fetch.

use std::sync::{Arc, Mutex, PoisonError};
use std::time::Duration;

use hotposts_core::{AppConfig, CrawlOutcome};
use hotposts_gateway::{GatewayClient, GatewayError};
use thiserror::Error;
use tokio::sync::watch;

use crate::read_state::{KeyValueStore, ReadSet, ReadState};
use crate::refresh::KeywordRefresh;
use crate::state::{DashboardState, FilterChange, NoticeKind, PostsTicket};
use crate::view::DashboardView;

pub const CRAWL_TRANSPORT_ERROR: &str = "수집 중 오류가 발생했습니다.";

#[derive(Debug, Error)]
pub enum CrawlError {
    #[error("a crawl is already running")]
    AlreadyRunning,

    #[error("crawl failed: {0}")]
    Rejected(String),

    #[error(transparent)]
    Gateway(#[from] GatewayError),
}

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct DashboardConfig {
    pub page_size: u32,
    pub keyword_refresh: Duration,
    pub message_ttl: Duration,
}

impl Default for DashboardConfig {
    fn default() -> Self {
        Self {
            page_size: 30,
            keyword_refresh: Duration::from_secs(3600),
            message_ttl: Duration::from_secs(5),
        }
    }
}

impl DashboardConfig {
    #[must_use]
    pub fn from_app_config(config: &AppConfig) -> Self {
        Self {
            page_size: config.page_size,
            keyword_refresh: Duration::from_secs(config.keyword_refresh_secs),
            message_ttl: Duration::from_secs(config.message_ttl_secs),
        }
    }
}

/// Applies `f` to the current state under the channel lock and publishes
/// the result.
fn update<R: Default>(
    tx: &watch::Sender<DashboardState>,
    f: impl FnOnce(DashboardState) -> (DashboardState, R),
) -> R {
    let mut out = R::default();
    tx.send_modify(|state| {
        let (next, r) = f(std::mem::take(state));
        *state = next;
        out = r;
    });
    out
}

/// Resets `crawling` when dropped, whatever way the crawl ends.
struct CrawlingGuard<'a> {
    state: &'a watch::Sender<DashboardState>,
}

impl Drop for CrawlingGuard<'_> {
    fn drop(&mut self) {
        update(self.state, |s| (s.end_crawl(), ()));
    }
}

pub struct Dashboard {
    client: GatewayClient,
    config: DashboardConfig,
    state: Arc<watch::Sender<DashboardState>>,
    read: Mutex<ReadState>,
}

impl Dashboard {
    pub fn new(
        client: GatewayClient,
        config: DashboardConfig,
        store: impl KeyValueStore + 'static,
    ) -> Self {
        let (tx, _rx) = watch::channel(DashboardState::new(config.page_size));
        Self {
            client,
            config,
            state: Arc::new(tx),
            read: Mutex::new(ReadState::load(store)),
        }
    }

    #[must_use]
    pub fn config(&self) -> &DashboardConfig {
        &self.config
    }

    /// Receiver notified on every state replacement.
    #[must_use]
    pub fn subscribe(&self) -> watch::Receiver<DashboardState> {
        self.state.subscribe()
    }

    #[must_use]
    pub fn snapshot(&self) -> DashboardState {
        self.state.borrow().clone()
    }

    #[must_use]
    pub fn read_set(&self) -> ReadSet {
        self.read
            .lock()
            .unwrap_or_else(PoisonError::into_inner)
            .set()
            .clone()
    }

    #[must_use]
    pub fn view(&self) -> DashboardView {
        DashboardView::build(&self.snapshot(), &self.read_set())
    }

    /// Runs the initial loads, then starts the periodic keyword refresh.
    ///
    /// The returned handle must be stopped (or dropped) when the view goes
    /// away.
    pub async fn mount(self: &Arc<Self>) -> KeywordRefresh {
        tokio::join!(
            self.load_stats(),
            self.load_categories(),
            self.load_keywords(),
            self.load_posts(),
        );
        KeywordRefresh::spawn(Arc::clone(self), self.config.keyword_refresh)
    }

    /// Fetches the current filter's page. Only the most recently started
    /// load may write its result.
    pub async fn load_posts(&self) {
        let ticket = update(&self.state, |s| {
            let (s, ticket) = s.begin_posts_load();
            (s, Some(ticket))
        });
        if let Some(ticket) = ticket {
            self.complete_posts_load(ticket).await;
        }
    }

    async fn complete_posts_load(&self, ticket: PostsTicket) {
        let result = self.client.list_posts(&ticket.query).await;
        if let Err(e) = &result {
            tracing::warn!(token = ticket.token, error = %e, "failed to load posts");
        }
        let token = ticket.token;
        let applied = update(&self.state, |s| {
            s.finish_posts_load(token, result)
        });
        if !applied {
            tracing::debug!(token, "discarded stale posts response");
        }
    }

    pub async fn load_stats(&self) {
        match self.client.stats().await {
            Ok(stats) => update(&self.state, |s| (s.with_stats(stats), ())),
            Err(e) => tracing::warn!(error = %e, "failed to load stats"),
        }
    }

    pub async fn load_categories(&self) {
        match self.client.categories().await {
            Ok(categories) => update(&self.state, |s| (s.with_categories(categories), ())),
            Err(e) => tracing::warn!(error = %e, "failed to load categories"),
        }
    }

    pub async fn load_keywords(&self) {
        match self.client.trending_keywords().await {
            Ok(keywords) => update(&self.state, |s| (s.with_keywords(keywords), ())),
            Err(e) => tracing::warn!(error = %e, "failed to load trending keywords"),
        }
    }

    /// Merges `change` into the filter and reloads posts if it changed.
    /// Returns whether a reload happened.
    pub async fn set_filter(&self, change: FilterChange) -> bool {
        let ticket = update(&self.state, |s| {
            let (s, changed) = s.apply_filter(change);
            if changed {
                let (s, ticket) = s.begin_posts_load();
                (s, Some(ticket))
            } else {
                (s, None)
            }
        });
        match ticket {
            Some(ticket) => {
                self.complete_posts_load(ticket).await;
                true
            }
            None => false,
        }
    }

    /// Same as typing the keyword into the search box.
    pub async fn select_keyword(&self, keyword: &str) -> bool {
        self.set_filter(FilterChange::search(keyword)).await
    }

    pub async fn next_page(&self) -> bool {
        let page = self.state.borrow().filter.page.saturating_add(1);
        self.set_filter(FilterChange::page(page)).await
    }

    pub async fn prev_page(&self) -> bool {
        let page = self.state.borrow().filter.page.saturating_sub(1);
        self.set_filter(FilterChange::page(page)).await
    }

    /// Records that `post_id` was opened. Never fails and never waits on I/O
    /// beyond the local store write.
    pub fn mark_read(&self, post_id: &str) -> bool {
        let mut read = self.read.lock().unwrap_or_else(PoisonError::into_inner);
        let added = read.mark(post_id);
        drop(read);
        if added {
            // Wake subscribers so read dimming is re-rendered.
            self.state.send_modify(|_| {});
        }
        added
    }

    /// Triggers a crawl, shows its result, and on success refreshes stats,
    /// posts, categories and keywords once each.
    ///
    /// # Errors
    ///
    /// - [`CrawlError::AlreadyRunning`] if another crawl has not finished.
    /// - [`CrawlError::Rejected`] if the backend reports `success: false`.
    /// - [`CrawlError::Gateway`] on transport, status or body errors.
    pub async fn run_crawl(&self) -> Result<CrawlOutcome, CrawlError> {
        let started = update(&self.state, DashboardState::begin_crawl);
        if !started {
            return Err(CrawlError::AlreadyRunning);
        }

        let result = {
            let _guard = CrawlingGuard { state: &self.state };
            let result = self.client.run_crawler().await;
            let (kind, text) = crawl_notice(&result);
            self.show_notice(kind, text);
            result
        };

        match result {
            Ok(outcome) if outcome.success => {
                tracing::info!(
                    fetched = outcome.fetched,
                    saved = outcome.saved,
                    "crawl finished; refreshing views"
                );
                tokio::join!(
                    self.load_stats(),
                    self.load_posts(),
                    self.load_categories(),
                    self.load_keywords(),
                );
                Ok(outcome)
            }
            Ok(outcome) => {
                let reason = outcome.error.unwrap_or_default();
                tracing::warn!(error = %reason, "backend reported crawl failure");
                Err(CrawlError::Rejected(reason))
            }
            Err(e) => {
                tracing::warn!(error = %e, "crawl request failed");
                Err(CrawlError::Gateway(e))
            }
        }
    }

    fn show_notice(&self, kind: NoticeKind, text: String) {
        let id = update(&self.state, |s| s.post_notice(kind, text));
        let state = Arc::clone(&self.state);
        let ttl = self.config.message_ttl;
        tokio::spawn(async move {
            tokio::time::sleep(ttl).await;
            update(&state, |s| (s.dismiss_notice(id), ()));
        });
    }
}

/// Message shown after a crawl attempt.
#[must_use]
pub fn crawl_notice(result: &Result<CrawlOutcome, GatewayError>) -> (NoticeKind, String) {
    match result {
        Ok(outcome) if outcome.success => (
            NoticeKind::Success,
            format!(
                "수집 완료: {}개 중 {}개 신규 저장",
                outcome.fetched.unwrap_or(0),
                outcome.saved.unwrap_or(0)
            ),
        ),
        Ok(outcome) => (
            NoticeKind::Failure,
            match outcome.error.as_deref() {
                Some(reason) if !reason.is_empty() => format!("수집 실패: {reason}"),
                _ => "수집 실패".to_string(),
            },
        ),
        Err(_) => (NoticeKind::Failure, CRAWL_TRANSPORT_ERROR.to_string()),
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn success_notice_summarises_counts() {
        let outcome = CrawlOutcome {
            success: true,
            fetched: Some(50),
            saved: Some(12),
            ..CrawlOutcome::default()
        };
        assert_eq!(
            crawl_notice(&Ok(outcome)),
            (
                NoticeKind::Success,
                "수집 완료: 50개 중 12개 신규 저장".to_string()
            )
        );
    }

    #[test]
    fn rejected_notice_carries_backend_reason() {
        let outcome = CrawlOutcome {
            success: false,
            error: Some("timeout".to_string()),
            ..CrawlOutcome::default()
        };
        assert_eq!(
            crawl_notice(&Ok(outcome)),
            (NoticeKind::Failure, "수집 실패: timeout".to_string())
        );
    }

    #[test]
    fn dashboard_config_from_app_config() {
        let app = AppConfig {
            env: hotposts_core::Environment::Test,
            bind_addr: "127.0.0.1:3000".parse().unwrap(),
            log_level: "debug".to_string(),
            backend_url: "http://localhost:8001".to_string(),
            upstream_timeout_secs: 5,
            user_agent: "test".to_string(),
            api_url: "http://localhost:3000".to_string(),
            page_size: 20,
            keyword_refresh_secs: 60,
            message_ttl_secs: 2,
            read_state_path: "read_state.json".into(),
        };
        let config = DashboardConfig::from_app_config(&app);
        assert_eq!(config.page_size, 20);
        assert_eq!(config.keyword_refresh, Duration::from_secs(60));
        assert_eq!(config.message_ttl, Duration::from_secs(2));
    }
}
