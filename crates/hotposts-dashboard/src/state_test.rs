use super::*;

fn post(id: i64) -> Post {
    Post {
        id,
        post_id: format!("p{id}"),
        category: Some("이슈".to_string()),
        title: format!("title {id}"),
        url: format!("https://theqoo.net/hot/{id}"),
        view_count: 100,
        comment_count: 3,
        published_at: None,
        collected_at: "2025-01-01 00:00:00".to_string(),
    }
}

fn upstream_failure() -> GatewayError {
    GatewayError::UnexpectedStatus {
        status: 500,
        url: "http://localhost:8001/api/posts".to_string(),
    }
}

fn loaded(total: u64, ids: &[i64]) -> DashboardState {
    let (state, ticket) = DashboardState::new(30).begin_posts_load();
    let page = PostPage {
        posts: ids.iter().copied().map(post).collect(),
        total,
    };
    let (state, applied) = state.finish_posts_load(ticket.token, Ok(page));
    assert!(applied);
    state
}

#[test]
fn initial_state_is_loading_first_page() {
    let state = DashboardState::new(30);
    assert!(state.loading);
    assert_eq!(state.filter.page, 1);
    assert_eq!(state.total_pages(), 0);
    assert_eq!(state.dataset(), Dataset::Empty);
}

#[test]
fn zero_page_size_is_raised_to_one() {
    assert_eq!(DashboardState::new(0).page_size, 1);
}

#[test]
fn search_category_and_sort_changes_reset_page() {
    let changes = [
        FilterChange::search("고양이"),
        FilterChange::category("이슈"),
        FilterChange::sort(SortKey::CommentCount),
    ];
    for change in changes {
        let (state, _) = loaded(300, &[1]).apply_filter(FilterChange::page(4));
        assert_eq!(state.filter.page, 4);
        let (state, changed) = state.apply_filter(change.clone());
        assert!(changed, "{change:?} should change the filter");
        assert_eq!(state.filter.page, 1, "{change:?} should reset page");
    }
}

#[test]
fn search_change_wins_over_page_in_same_update() {
    let change = FilterChange {
        search: Some("컴백".to_string()),
        page: Some(5),
        ..FilterChange::default()
    };
    let (state, _) = loaded(300, &[1]).apply_filter(change);
    assert_eq!(state.filter.page, 1);
    assert_eq!(state.filter.search, "컴백");
}

#[test]
fn page_change_is_clamped_to_total_pages() {
    // 61 posts at 30 per page is 3 pages.
    let state = loaded(61, &[1]);
    assert_eq!(state.total_pages(), 3);

    let (state, changed) = state.apply_filter(FilterChange::page(9));
    assert!(changed);
    assert_eq!(state.filter.page, 3);

    let (state, _) = state.apply_filter(FilterChange::page(0));
    assert_eq!(state.filter.page, 1);
}

#[test]
fn page_change_without_results_stays_on_first_page() {
    let (state, changed) = loaded(0, &[]).apply_filter(FilterChange::page(2));
    assert!(!changed);
    assert_eq!(state.filter.page, 1);
}

#[test]
fn page_change_keeps_other_fields() {
    let (state, _) = loaded(90, &[1]).apply_filter(FilterChange {
        search: Some("a".to_string()),
        category: Some("b".to_string()),
        sort: Some(SortKey::ViewCount),
        page: None,
    });
    let (state, _) = state.apply_filter(FilterChange::page(2));
    assert_eq!(state.filter.search, "a");
    assert_eq!(state.filter.category, "b");
    assert_eq!(state.filter.sort, SortKey::ViewCount);
    assert_eq!(state.filter.page, 2);
}

#[test]
fn identical_change_reports_unchanged() {
    let (state, changed) = loaded(10, &[1]).apply_filter(FilterChange::search(""));
    assert!(!changed);
    assert_eq!(state.filter, FilterState::default());
}

#[test]
fn begin_posts_load_uses_current_filter() {
    let (state, _) = loaded(10, &[1]).apply_filter(FilterChange::search("고양이"));
    let (state, _) = state.apply_filter(FilterChange::sort(SortKey::ViewCount));
    let (state, ticket) = state.begin_posts_load();
    assert!(state.loading);
    assert_eq!(ticket.query.search.as_deref(), Some("고양이"));
    assert_eq!(ticket.query.category, None);
    assert_eq!(ticket.query.sort_by, SortKey::ViewCount);
    assert_eq!(ticket.query.offset, 0);
}

#[test]
fn stale_posts_result_is_discarded() {
    let state = DashboardState::new(30);
    let (state, first) = state.begin_posts_load();
    let (state, second) = state.begin_posts_load();

    let newer = PostPage {
        posts: vec![post(2)],
        total: 1,
    };
    let (state, applied) = state.finish_posts_load(second.token, Ok(newer));
    assert!(applied);

    let older = PostPage {
        posts: vec![post(1)],
        total: 1,
    };
    let (state, applied) = state.finish_posts_load(first.token, Ok(older));
    assert!(!applied);
    assert_eq!(state.posts[0].id, 2);
    assert!(!state.loading);
}

#[test]
fn stale_completion_does_not_clear_loading() {
    let (state, first) = DashboardState::new(30).begin_posts_load();
    let (state, _second) = state.begin_posts_load();
    let (state, applied) = state.finish_posts_load(first.token, Err(upstream_failure()));
    assert!(!applied);
    assert!(state.loading);
    assert_eq!(state.error, None);
}

#[test]
fn failed_load_keeps_previous_posts_and_sets_error() {
    let state = loaded(42, &[1, 2]);
    let (state, ticket) = state.begin_posts_load();
    let (state, _) = state.finish_posts_load(ticket.token, Err(upstream_failure()));

    assert_eq!(state.posts.len(), 2);
    assert_eq!(state.total, 42);
    assert_eq!(state.error.as_deref(), Some(POSTS_ERROR));
    assert_eq!(state.dataset(), Dataset::Errored);

    let (state, ticket) = state.begin_posts_load();
    assert_eq!(state.error, None);
    let page = PostPage {
        posts: vec![post(9)],
        total: 1,
    };
    let (state, _) = state.finish_posts_load(ticket.token, Ok(page));
    assert_eq!(state.dataset(), Dataset::Populated);
    assert_eq!(state.posts.len(), 1);
    assert_eq!(state.posts[0].id, 9);
    assert_eq!(state.total, 1);
}

#[test]
fn keywords_are_kept_in_rank_order() {
    let state = DashboardState::new(30).with_keywords(vec![
        Keyword {
            rank: 2,
            keyword: "컴백".to_string(),
            count: 5,
        },
        Keyword {
            rank: 1,
            keyword: "고양이".to_string(),
            count: 9,
        },
    ]);
    let ranks: Vec<u32> = state.keywords.iter().map(|k| k.rank).collect();
    assert_eq!(ranks, vec![1, 2]);
}

#[test]
fn crawl_is_mutually_exclusive() {
    let (state, started) = DashboardState::new(30).begin_crawl();
    assert!(started);
    let (state, started_again) = state.begin_crawl();
    assert!(!started_again);
    assert!(state.crawling);
    assert!(!state.end_crawl().crawling);
}

#[test]
fn begin_crawl_clears_previous_notice() {
    let (state, _) = DashboardState::new(30).post_notice(NoticeKind::Success, "old".to_string());
    let (state, _) = state.begin_crawl();
    assert_eq!(state.notice, None);
}

#[test]
fn dismissing_an_old_notice_keeps_the_newer_one() {
    let (state, old_id) =
        DashboardState::new(30).post_notice(NoticeKind::Success, "first".to_string());
    let (state, new_id) = state.post_notice(NoticeKind::Failure, "second".to_string());
    assert_ne!(old_id, new_id);

    let state = state.dismiss_notice(old_id);
    assert_eq!(state.notice.as_ref().map(|n| n.text.as_str()), Some("second"));

    let state = state.dismiss_notice(new_id);
    assert_eq!(state.notice, None);
}
