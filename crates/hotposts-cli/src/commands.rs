//! Subcommand handlers. Output goes to the writer passed in so handlers can
//! be exercised against a buffer.

use std::io::Write;
use std::sync::Arc;

use hotposts_core::SortKey;
use hotposts_dashboard::view::format_unsigned;
use hotposts_dashboard::{CrawlError, Dashboard, FilterChange, ReadState};
use hotposts_gateway::GatewayClient;

#[derive(Debug, Clone, PartialEq, Eq)]
pub(crate) struct PostsArgs {
    pub search: Option<String>,
    pub category: Option<String>,
    pub sort: SortKey,
    pub page: u32,
}

/// Loads the requested page and prints the rendered dashboard.
///
/// # Errors
///
/// Returns an error if the output cannot be written.
pub(crate) async fn run_posts(
    dashboard: &Dashboard,
    args: PostsArgs,
    out: &mut impl Write,
) -> anyhow::Result<()> {
    tokio::join!(dashboard.load_stats(), dashboard.load_categories());

    let change = FilterChange {
        search: args.search,
        category: args.category,
        sort: Some(args.sort),
        page: None,
    };
    if !dashboard.set_filter(change).await {
        dashboard.load_posts().await;
    }
    // The page can only be clamped once the total is known.
    if args.page > 1 {
        dashboard.set_filter(FilterChange::page(args.page)).await;
    }

    write!(out, "{}", dashboard.view())?;
    Ok(())
}

/// # Errors
///
/// Returns an error if the stats request fails or output cannot be written.
pub(crate) async fn run_stats(client: &GatewayClient, out: &mut impl Write) -> anyhow::Result<()> {
    let stats = client.stats().await?;
    writeln!(out, "전체 수집: {}", format_unsigned(stats.total_posts))?;
    writeln!(out, "오늘 수집: {}", format_unsigned(stats.today_collected))?;
    Ok(())
}

/// Runs one crawl and prints the resulting notice.
///
/// A crawl the backend rejects is reported but is not an error exit.
///
/// # Errors
///
/// Returns an error on transport failure or if output cannot be written.
pub(crate) async fn run_crawl(dashboard: &Dashboard, out: &mut impl Write) -> anyhow::Result<()> {
    let result = dashboard.run_crawl().await;
    if let Some(notice) = dashboard.snapshot().notice {
        writeln!(out, "{}", notice.text)?;
    }
    match result {
        Ok(_) | Err(CrawlError::Rejected(_)) => Ok(()),
        Err(e) => Err(e.into()),
    }
}

/// Looks up `post_id`, marks it read and prints its URL.
///
/// # Errors
///
/// Returns an error if the post cannot be fetched or output cannot be
/// written.
pub(crate) async fn run_open(
    client: &GatewayClient,
    read: &mut ReadState,
    post_id: &str,
    out: &mut impl Write,
) -> anyhow::Result<()> {
    let post = client.get_post(post_id).await?;
    read.mark(&post.post_id);
    writeln!(out, "{}", post.url)?;
    Ok(())
}

/// Mounts the dashboard and redraws it on every state change until Ctrl-C.
///
/// # Errors
///
/// Returns an error if the Ctrl-C handler cannot be installed.
pub(crate) async fn run_watch(dashboard: Arc<Dashboard>) -> anyhow::Result<()> {
    let mut rx = dashboard.subscribe();
    let render = {
        let dashboard = Arc::clone(&dashboard);
        tokio::spawn(async move {
            while rx.changed().await.is_ok() {
                // Clear screen and home the cursor.
                print!("\x1b[2J\x1b[H{}", dashboard.view());
            }
        })
    };

    let refresh = dashboard.mount().await;
    tokio::signal::ctrl_c().await?;
    tracing::info!("stopping dashboard");
    refresh.stop().await;
    render.abort();
    Ok(())
}
