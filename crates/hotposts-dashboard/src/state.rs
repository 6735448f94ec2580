//! The dashboard's single state record and its transitions.
//!
//! Every transition consumes the current [`DashboardState`] and returns the
//! next one, so an observer only ever sees a whole record. The controller
//! applies them under the `watch` channel's lock.

use hotposts_core::{Category, Keyword, Post, PostPage, PostQuery, SortKey, Stats};
use hotposts_gateway::GatewayError;

pub const POSTS_ERROR: &str =
    "게시글을 불러오는데 실패했습니다. 백엔드 서버가 실행 중인지 확인하세요.";

/// Filter bar and pagination input. `page` is 1-based.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct FilterState {
    pub search: String,
    pub category: String,
    pub sort: SortKey,
    pub page: u32,
}

impl Default for FilterState {
    fn default() -> Self {
        Self {
            search: String::new(),
            category: String::new(),
            sort: SortKey::default(),
            page: 1,
        }
    }
}

/// A partial update to [`FilterState`]; `None` fields are left as they are.
#[derive(Debug, Clone, Default, PartialEq, Eq)]
pub struct FilterChange {
    pub search: Option<String>,
    pub category: Option<String>,
    pub sort: Option<SortKey>,
    pub page: Option<u32>,
}

impl FilterChange {
    #[must_use]
    pub fn search(search: impl Into<String>) -> Self {
        Self {
            search: Some(search.into()),
            ..Self::default()
        }
    }

    #[must_use]
    pub fn category(category: impl Into<String>) -> Self {
        Self {
            category: Some(category.into()),
            ..Self::default()
        }
    }

    #[must_use]
    pub fn sort(sort: SortKey) -> Self {
        Self {
            sort: Some(sort),
            ..Self::default()
        }
    }

    #[must_use]
    pub fn page(page: u32) -> Self {
        Self {
            page: Some(page),
            ..Self::default()
        }
    }

    fn touches_query(&self) -> bool {
        self.search.is_some() || self.category.is_some() || self.sort.is_some()
    }
}

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum Dataset {
    Empty,
    Populated,
    Errored,
}

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum NoticeKind {
    Success,
    Failure,
}

/// Transient crawl result message.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct Notice {
    pub id: u64,
    pub kind: NoticeKind,
    pub text: String,
}

/// Handed out by [`DashboardState::begin_posts_load`]; only the ticket with
/// the latest token may write its result back.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct PostsTicket {
    pub token: u64,
    pub query: PostQuery,
}

#[derive(Debug, Clone, PartialEq, Eq)]
pub struct DashboardState {
    pub filter: FilterState,
    pub page_size: u32,
    pub posts: Vec<Post>,
    pub total: u64,
    pub stats: Option<Stats>,
    pub categories: Vec<Category>,
    pub keywords: Vec<Keyword>,
    pub loading: bool,
    pub error: Option<String>,
    pub crawling: bool,
    pub notice: Option<Notice>,
    latest_posts_token: u64,
    last_notice_id: u64,
}

impl Default for DashboardState {
    fn default() -> Self {
        Self::new(30)
    }
}

impl DashboardState {
    /// Initial state: nothing loaded yet, and the first posts load pending.
    #[must_use]
    pub fn new(page_size: u32) -> Self {
        Self {
            filter: FilterState::default(),
            page_size: page_size.max(1),
            posts: Vec::new(),
            total: 0,
            stats: None,
            categories: Vec::new(),
            keywords: Vec::new(),
            loading: true,
            error: None,
            crawling: false,
            notice: None,
            latest_posts_token: 0,
            last_notice_id: 0,
        }
    }

    #[must_use]
    pub fn total_pages(&self) -> u32 {
        let pages = self.total.div_ceil(u64::from(self.page_size));
        u32::try_from(pages).unwrap_or(u32::MAX)
    }

    #[must_use]
    pub fn dataset(&self) -> Dataset {
        if self.error.is_some() {
            Dataset::Errored
        } else if self.posts.is_empty() {
            Dataset::Empty
        } else {
            Dataset::Populated
        }
    }

    #[must_use]
    pub fn current_query(&self) -> PostQuery {
        PostQuery::for_page(
            self.filter.page,
            self.page_size,
            self.filter.sort,
            &self.filter.search,
            &self.filter.category,
        )
    }

    /// Merges `change` into the filter.
    ///
    /// Any search, category or sort value sends the view back to page 1; a
    /// page-only change is clamped to `[1, total_pages]`. Returns whether the
    /// filter actually changed.
    #[must_use]
    pub fn apply_filter(mut self, change: FilterChange) -> (Self, bool) {
        let before = self.filter.clone();

        if change.touches_query() {
            if let Some(search) = change.search {
                self.filter.search = search;
            }
            if let Some(category) = change.category {
                self.filter.category = category;
            }
            if let Some(sort) = change.sort {
                self.filter.sort = sort;
            }
            self.filter.page = 1;
        } else if let Some(page) = change.page {
            self.filter.page = page.clamp(1, self.total_pages().max(1));
        }

        let changed = self.filter != before;
        (self, changed)
    }

    /// Marks a posts load as in flight and issues a fresh token.
    #[must_use]
    pub fn begin_posts_load(mut self) -> (Self, PostsTicket) {
        self.latest_posts_token += 1;
        self.loading = true;
        self.error = None;
        let ticket = PostsTicket {
            token: self.latest_posts_token,
            query: self.current_query(),
        };
        (self, ticket)
    }

    /// Writes a posts result back if `token` is still the latest one.
    ///
    /// On failure the previous posts and total are kept and only the fixed
    /// user-facing error is set; the cause is for the caller to log. Returns
    /// whether the result was applied.
    #[must_use]
    pub fn finish_posts_load(
        mut self,
        token: u64,
        result: Result<PostPage, GatewayError>,
    ) -> (Self, bool) {
        if token != self.latest_posts_token {
            return (self, false);
        }
        self.loading = false;
        match result {
            Ok(page) => {
                self.posts = page.posts;
                self.total = page.total;
                self.error = None;
            }
            Err(_) => self.error = Some(POSTS_ERROR.to_string()),
        }
        (self, true)
    }

    #[must_use]
    pub fn with_stats(mut self, stats: Stats) -> Self {
        self.stats = Some(stats);
        self
    }

    #[must_use]
    pub fn with_categories(mut self, categories: Vec<Category>) -> Self {
        self.categories = categories;
        self
    }

    #[must_use]
    pub fn with_keywords(mut self, mut keywords: Vec<Keyword>) -> Self {
        keywords.sort_by_key(|k| k.rank);
        self.keywords = keywords;
        self
    }

    /// Starts a crawl unless one is already running. Clears any previous notice.
    #[must_use]
    pub fn begin_crawl(mut self) -> (Self, bool) {
        if self.crawling {
            return (self, false);
        }
        self.crawling = true;
        self.notice = None;
        (self, true)
    }

    #[must_use]
    pub fn end_crawl(mut self) -> Self {
        self.crawling = false;
        self
    }

    #[must_use]
    pub fn post_notice(mut self, kind: NoticeKind, text: String) -> (Self, u64) {
        self.last_notice_id += 1;
        let id = self.last_notice_id;
        self.notice = Some(Notice { id, kind, text });
        (self, id)
    }

    /// Clears the notice only if it is still the one identified by `id`.
    #[must_use]
    pub fn dismiss_notice(mut self, id: u64) -> Self {
        if self.notice.as_ref().is_some_and(|n| n.id == id) {
            self.notice = None;
        }
        self
    }
}

#[cfg(test)]
#[path = "state_test.rs"]
mod tests;
