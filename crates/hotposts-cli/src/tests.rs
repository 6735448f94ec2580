use super::*;

use hotposts_dashboard::{KeyValueStore, MemoryStore};
use serde_json::json;
use wiremock::matchers::{method, path, query_param};
use wiremock::{Mock, MockServer, ResponseTemplate};

#[test]
fn parses_posts_with_filters() {
    let cli = Cli::try_parse_from([
        "hotposts",
        "posts",
        "--search",
        "고양이",
        "--sort",
        "view_count",
        "--page",
        "2",
    ])
    .expect("expected valid cli args");

    let Commands::Posts {
        search,
        category,
        sort,
        page,
    } = cli.command
    else {
        panic!("expected posts command");
    };
    assert_eq!(search.as_deref(), Some("고양이"));
    assert_eq!(category, None);
    assert_eq!(sort, SortKey::ViewCount);
    assert_eq!(page, 2);
}

#[test]
fn posts_defaults_to_latest_first_page() {
    let cli = Cli::try_parse_from(["hotposts", "posts"]).expect("expected valid cli args");
    assert!(matches!(
        cli.command,
        Commands::Posts {
            sort: SortKey::CollectedAt,
            page: 1,
            ..
        }
    ));
}

#[test]
fn rejects_unknown_sort_key() {
    let result = Cli::try_parse_from(["hotposts", "posts", "--sort", "likes"]);
    assert!(result.is_err());
}

#[test]
fn parses_open_with_post_id() {
    let cli = Cli::try_parse_from(["hotposts", "open", "3312"]).expect("expected valid cli args");
    assert!(matches!(cli.command, Commands::Open { ref post_id } if post_id == "3312"));
}

#[test]
fn subcommand_is_required() {
    assert!(Cli::try_parse_from(["hotposts"]).is_err());
}

fn test_client(server: &MockServer) -> GatewayClient {
    GatewayClient::new(&server.uri(), 5, "hotposts-test/0.1").expect("client")
}

fn test_dashboard(server: &MockServer) -> Dashboard {
    Dashboard::new(
        test_client(server),
        DashboardConfig::default(),
        MemoryStore::new(),
    )
}

#[tokio::test]
async fn stats_prints_grouped_totals() {
    let server = MockServer::start().await;
    Mock::given(method("GET"))
        .and(path("/api/posts/stats"))
        .respond_with(
            ResponseTemplate::new(200)
                .set_body_json(json!({"total_posts": 12034, "today_collected": 87})),
        )
        .mount(&server)
        .await;

    let mut out = Vec::new();
    commands::run_stats(&test_client(&server), &mut out)
        .await
        .expect("stats should succeed");
    let text = String::from_utf8(out).expect("utf8");
    assert_eq!(text, "전체 수집: 12,034\n오늘 수집: 87\n");
}

#[tokio::test]
async fn posts_prints_requested_page() {
    let server = MockServer::start().await;
    Mock::given(method("GET"))
        .and(path("/api/posts"))
        .and(query_param("offset", "0"))
        .respond_with(ResponseTemplate::new(200).set_body_json(json!({
            "total": 45,
            "posts": [{
                "id": 1, "post_id": "1", "title": "first page", "url": "https://theqoo.net/hot/1",
                "view_count": 10, "comment_count": 1, "collected_at": "2025-01-01 00:00:00"
            }]
        })))
        .mount(&server)
        .await;
    Mock::given(method("GET"))
        .and(path("/api/posts"))
        .and(query_param("offset", "30"))
        .respond_with(ResponseTemplate::new(200).set_body_json(json!({
            "total": 45,
            "posts": [{
                "id": 2, "post_id": "2", "title": "second page", "url": "https://theqoo.net/hot/2",
                "view_count": 10, "comment_count": 1, "collected_at": "2025-01-01 00:00:00"
            }]
        })))
        .mount(&server)
        .await;

    let args = commands::PostsArgs {
        search: None,
        category: None,
        sort: SortKey::CollectedAt,
        page: 2,
    };
    let mut out = Vec::new();
    commands::run_posts(&test_dashboard(&server), args, &mut out)
        .await
        .expect("posts should render");
    let text = String::from_utf8(out).expect("utf8");
    assert!(text.contains("second page"));
    assert!(text.contains("2 / 2"));
}

#[tokio::test]
async fn crawl_prints_summary() {
    let server = MockServer::start().await;
    Mock::given(method("POST"))
        .and(path("/api/crawler/run"))
        .respond_with(
            ResponseTemplate::new(200)
                .set_body_json(json!({"success": false, "error": "timeout"})),
        )
        .mount(&server)
        .await;

    let mut out = Vec::new();
    commands::run_crawl(&test_dashboard(&server), &mut out)
        .await
        .expect("a rejected crawl is reported, not an error");
    assert_eq!(String::from_utf8(out).expect("utf8"), "수집 실패: timeout\n");
}

#[tokio::test]
async fn open_marks_post_read_and_prints_url() {
    let server = MockServer::start().await;
    Mock::given(method("GET"))
        .and(path("/api/posts/3312"))
        .respond_with(ResponseTemplate::new(200).set_body_json(json!({
            "id": 7, "post_id": "3312", "title": "t", "url": "https://theqoo.net/hot/3312",
            "view_count": 1, "comment_count": 0, "collected_at": "2025-01-01 00:00:00"
        })))
        .mount(&server)
        .await;

    let dir = tempfile::tempdir().expect("tempdir");
    let store_path = dir.path().join("read_state.json");
    let mut read = ReadState::load(JsonFileStore::open(&store_path));
    let mut out = Vec::new();
    commands::run_open(&test_client(&server), &mut read, "3312", &mut out)
        .await
        .expect("open should succeed");

    assert_eq!(
        String::from_utf8(out).expect("utf8"),
        "https://theqoo.net/hot/3312\n"
    );
    let reopened = JsonFileStore::open(&store_path);
    assert_eq!(
        reopened
            .get(hotposts_dashboard::read_state::READ_POSTS_KEY)
            .expect("store")
            .as_deref(),
        Some(r#"["3312"]"#)
    );
}
