//! Presentation: a pure mapping from dashboard state to what is shown.

use std::fmt;

use hotposts_core::SortKey;

use crate::read_state::ReadSet;
use crate::state::{DashboardState, Notice};

pub const TITLE: &str = "더쿠 인기글 모음";

#[derive(Debug, Clone, PartialEq, Eq)]
pub struct StatCard {
    pub label: &'static str,
    pub value: String,
}

#[derive(Debug, Clone, PartialEq, Eq)]
pub struct KeywordChip {
    pub rank: u32,
    pub keyword: String,
    pub count: u64,
}

#[derive(Debug, Clone, PartialEq, Eq)]
pub struct SelectOption {
    pub value: String,
    pub label: String,
    pub selected: bool,
}

#[derive(Debug, Clone, PartialEq, Eq)]
pub struct FilterBar {
    pub search: String,
    pub categories: Vec<SelectOption>,
    pub sorts: Vec<SelectOption>,
}

#[derive(Debug, Clone, PartialEq, Eq)]
pub struct PostRow {
    pub post_id: String,
    pub category: Option<String>,
    pub title: String,
    pub url: String,
    pub views: String,
    pub comments: String,
    pub published_at: String,
    /// Already opened; rendered dimmed.
    pub read: bool,
}

#[derive(Debug, Clone, PartialEq, Eq)]
pub enum ListBody {
    Loading,
    Error(String),
    Empty,
    Posts(Vec<PostRow>),
}

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct Pagination {
    pub page: u32,
    pub total_pages: u32,
    pub prev_enabled: bool,
    pub next_enabled: bool,
}

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct CrawlButton {
    pub label: &'static str,
    pub enabled: bool,
}

#[derive(Debug, Clone, PartialEq, Eq)]
pub struct DashboardView {
    pub stats: Vec<StatCard>,
    pub keywords: Vec<KeywordChip>,
    pub filters: FilterBar,
    pub crawl_button: CrawlButton,
    pub notice: Option<Notice>,
    pub body: ListBody,
    /// Shown only when there is more than one page.
    pub pagination: Option<Pagination>,
}

#[must_use]
pub fn sort_label(sort: SortKey) -> &'static str {
    match sort {
        SortKey::CollectedAt => "최신순",
        SortKey::ViewCount => "조회수순",
        SortKey::CommentCount => "댓글수순",
    }
}

/// Groups digits in threes with commas, as `ko-KR` number formatting does.
#[must_use]
pub fn format_count(n: i64) -> String {
    let digits = n.unsigned_abs().to_string();
    let mut out = String::with_capacity(digits.len() + digits.len() / 3 + 1);
    if n < 0 {
        out.push('-');
    }
    for (i, ch) in digits.chars().enumerate() {
        if i > 0 && (digits.len() - i) % 3 == 0 {
            out.push(',');
        }
        out.push(ch);
    }
    out
}

#[must_use]
pub fn format_unsigned(n: u64) -> String {
    format_count(i64::try_from(n).unwrap_or(i64::MAX))
}

impl DashboardView {
    #[must_use]
    pub fn build(state: &DashboardState, read: &ReadSet) -> Self {
        let (total, today) = state.stats.as_ref().map_or_else(
            || ("-".to_string(), "-".to_string()),
            |s| {
                (
                    format_unsigned(s.total_posts),
                    format_unsigned(s.today_collected),
                )
            },
        );
        let stats = vec![
            StatCard {
                label: "전체 수집",
                value: total,
            },
            StatCard {
                label: "오늘 수집",
                value: today,
            },
        ];

        let keywords = state
            .keywords
            .iter()
            .map(|k| KeywordChip {
                rank: k.rank,
                keyword: k.keyword.clone(),
                count: k.count,
            })
            .collect();

        let mut categories = vec![SelectOption {
            value: String::new(),
            label: "전체 카테고리".to_string(),
            selected: state.filter.category.is_empty(),
        }];
        categories.extend(state.categories.iter().map(|c| SelectOption {
            value: c.category.clone(),
            label: format!("{} ({})", c.category, c.count),
            selected: state.filter.category == c.category,
        }));

        let sorts = SortKey::ALL
            .into_iter()
            .map(|sort| SelectOption {
                value: sort.as_str().to_string(),
                label: sort_label(sort).to_string(),
                selected: state.filter.sort == sort,
            })
            .collect();

        let body = if state.loading {
            ListBody::Loading
        } else if let Some(error) = &state.error {
            ListBody::Error(error.clone())
        } else if state.posts.is_empty() {
            ListBody::Empty
        } else {
            ListBody::Posts(
                state
                    .posts
                    .iter()
                    .map(|p| PostRow {
                        post_id: p.post_id.clone(),
                        category: p.category.clone().filter(|c| !c.is_empty()),
                        title: p.title.clone(),
                        url: p.url.clone(),
                        views: format_count(p.view_count),
                        comments: format_count(p.comment_count),
                        published_at: p.published_at.clone().unwrap_or_default(),
                        read: read.contains(&p.post_id),
                    })
                    .collect(),
            )
        };

        let total_pages = state.total_pages();
        let pagination = (total_pages > 1).then(|| Pagination {
            page: state.filter.page,
            total_pages,
            prev_enabled: state.filter.page > 1,
            next_enabled: state.filter.page < total_pages,
        });

        let crawl_button = if state.crawling {
            CrawlButton {
                label: "수집 중...",
                enabled: false,
            }
        } else {
            CrawlButton {
                label: "지금 수집",
                enabled: true,
            }
        };

        Self {
            stats,
            keywords,
            filters: FilterBar {
                search: state.filter.search.clone(),
                categories,
                sorts,
            },
            crawl_button,
            notice: state.notice.clone(),
            body,
            pagination,
        }
    }
}

impl fmt::Display for DashboardView {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        writeln!(f, "{TITLE}")?;

        let stats: Vec<String> = self
            .stats
            .iter()
            .map(|c| format!("{}: {}", c.label, c.value))
            .collect();
        writeln!(f, "{}", stats.join(" | "))?;

        if !self.keywords.is_empty() {
            let chips: Vec<String> = self
                .keywords
                .iter()
                .map(|k| format!("{}. {} ({})", k.rank, k.keyword, k.count))
                .collect();
            writeln!(f, "실시간 키워드: {}", chips.join("  "))?;
        }

        let selected = |options: &[SelectOption]| {
            options
                .iter()
                .find(|o| o.selected)
                .map_or_else(String::new, |o| o.label.clone())
        };
        writeln!(
            f,
            "검색: \"{}\" | 카테고리: {} | 정렬: {}",
            self.filters.search,
            selected(&self.filters.categories),
            selected(&self.filters.sorts)
        )?;

        let button = if self.crawl_button.enabled {
            format!("[{}]", self.crawl_button.label)
        } else {
            format!("({})", self.crawl_button.label)
        };
        writeln!(f, "{button}")?;
        if let Some(notice) = &self.notice {
            writeln!(f, "* {}", notice.text)?;
        }

        writeln!(f, "{}", "-".repeat(40))?;
        match &self.body {
            ListBody::Loading => writeln!(f, "불러오는 중...")?,
            ListBody::Error(message) => writeln!(f, "{message}")?,
            ListBody::Empty => writeln!(f, "게시글이 없습니다.")?,
            ListBody::Posts(rows) => {
                for row in rows {
                    let marker = if row.read { "·" } else { " " };
                    let category = row
                        .category
                        .as_ref()
                        .map(|c| format!("[{c}] "))
                        .unwrap_or_default();
                    writeln!(f, "{marker} {category}{}", row.title)?;
                    writeln!(
                        f,
                        "    조회 {} · 댓글 {} · {}",
                        row.views, row.comments, row.published_at
                    )?;
                    writeln!(f, "    {}", row.url)?;
                }
            }
        }

        if let Some(p) = &self.pagination {
            writeln!(f, "{}", "-".repeat(40))?;
            let prev = if p.prev_enabled { "< 이전" } else { "  이전" };
            let next = if p.next_enabled { "다음 >" } else { "다음  " };
            writeln!(f, "{prev} | {} / {} | {next}", p.page, p.total_pages)?;
        }
        Ok(())
    }
}
