use std::fmt;
use std::str::FromStr;

use serde::{Deserialize, Serialize};

/// A crawled post as returned by the backend's `/api/posts` endpoints.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct Post {
    /// Backend row id; unique within a result page.
    pub id: i64,
    /// Post id on the crawled board, used as the read-state identity.
    pub post_id: String,
    pub category: Option<String>,
    pub title: String,
    pub url: String,
    pub view_count: i64,
    pub comment_count: i64,
    pub published_at: Option<String>,
    pub collected_at: String,
}

/// One page of posts plus the total number of posts matching the filter.
#[derive(Debug, Clone, Default, PartialEq, Eq, Serialize, Deserialize)]
pub struct PostPage {
    pub posts: Vec<Post>,
    pub total: u64,
}

#[derive(Debug, Clone, Copy, Default, PartialEq, Eq, Serialize, Deserialize)]
pub struct Stats {
    pub total_posts: u64,
    pub today_collected: u64,
}

#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct Category {
    pub category: String,
    pub count: u64,
}

/// A trending term. Ranks are 1-based and dense; rank 1 is the most popular.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct Keyword {
    pub rank: u32,
    pub keyword: String,
    pub count: u64,
}

#[derive(Debug, Clone, Default, PartialEq, Eq, Serialize, Deserialize)]
pub struct TrendingKeywords {
    pub keywords: Vec<Keyword>,
}

/// Body of `POST /api/crawler/run`.
#[derive(Debug, Clone, Default, PartialEq, Eq, Serialize, Deserialize)]
pub struct CrawlOutcome {
    pub success: bool,
    #[serde(default)]
    pub fetched: Option<u64>,
    #[serde(default)]
    pub saved: Option<u64>,
    #[serde(default)]
    pub message: Option<String>,
    #[serde(default)]
    pub error: Option<String>,
}

/// Sort keys the dashboard offers. Results are always ordered descending.
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum SortKey {
    #[default]
    CollectedAt,
    ViewCount,
    CommentCount,
}

impl SortKey {
    pub const ALL: [SortKey; 3] = [
        SortKey::CollectedAt,
        SortKey::ViewCount,
        SortKey::CommentCount,
    ];

    #[must_use]
    pub fn as_str(self) -> &'static str {
        match self {
            SortKey::CollectedAt => "collected_at",
            SortKey::ViewCount => "view_count",
            SortKey::CommentCount => "comment_count",
        }
    }
}

impl fmt::Display for SortKey {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.as_str())
    }
}

impl FromStr for SortKey {
    type Err = String;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        SortKey::ALL
            .into_iter()
            .find(|key| key.as_str() == s)
            .ok_or_else(|| format!("unknown sort key \"{s}\""))
    }
}

/// Query for `GET /api/posts`.
///
/// Empty `search`/`category` values are dropped at construction so they are
/// omitted from the query string instead of being sent as empty strings.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct PostQuery {
    pub limit: u32,
    pub offset: u64,
    pub sort_by: SortKey,
    pub search: Option<String>,
    pub category: Option<String>,
}

impl PostQuery {
    /// Builds the query for a 1-based `page` of `page_size` posts.
    #[must_use]
    pub fn for_page(
        page: u32,
        page_size: u32,
        sort_by: SortKey,
        search: &str,
        category: &str,
    ) -> Self {
        let non_empty = |s: &str| (!s.is_empty()).then(|| s.to_string());
        Self {
            limit: page_size,
            offset: u64::from(page.max(1) - 1) * u64::from(page_size),
            sort_by,
            search: non_empty(search),
            category: non_empty(category),
        }
    }

    /// Query pairs in wire order: `limit, offset, sort_by, order, search, category`.
    #[must_use]
    pub fn query_pairs(&self) -> Vec<(&'static str, String)> {
        let mut pairs = vec![
            ("limit", self.limit.to_string()),
            ("offset", self.offset.to_string()),
            ("sort_by", self.sort_by.as_str().to_string()),
            ("order", "desc".to_string()),
        ];
        if let Some(search) = &self.search {
            pairs.push(("search", search.clone()));
        }
        if let Some(category) = &self.category {
            pairs.push(("category", category.clone()));
        }
        pairs
    }
}
