mod commands;

use std::sync::Arc;

use clap::{Parser, Subcommand};
use hotposts_core::SortKey;
use hotposts_dashboard::{Dashboard, DashboardConfig, JsonFileStore, ReadState};
use hotposts_gateway::GatewayClient;
use tracing_subscriber::EnvFilter;

#[derive(Debug, Parser)]
#[command(name = "hotposts")]
#[command(about = "Browse and refresh collected hot posts from the terminal")]
struct Cli {
    #[command(subcommand)]
    command: Commands,
}

#[derive(Debug, Subcommand)]
enum Commands {
    /// Show one page of posts
    Posts {
        /// Title search text
        #[arg(long)]
        search: Option<String>,
        /// Exact category name
        #[arg(long)]
        category: Option<String>,
        /// Sort column: collected_at, view_count or comment_count
        #[arg(long, default_value = "collected_at")]
        sort: SortKey,
        /// 1-based page number
        #[arg(long, default_value = "1")]
        page: u32,
    },
    /// Show collection totals
    Stats,
    /// Run the crawler once and report what was saved
    Crawl,
    /// Print a post's URL and remember it as read
    Open {
        post_id: String,
    },
    /// Keep the dashboard on screen, re-rendering on every change
    Watch,
}

#[tokio::main]
async fn main() -> anyhow::Result<()> {
    dotenvy::dotenv().ok();
    let cli = Cli::parse();
    let config = hotposts_core::load_app_config()?;
    let env_filter = EnvFilter::try_from_default_env()
        .or_else(|_| EnvFilter::try_new(config.log_level.clone()))?;
    tracing_subscriber::fmt()
        .with_env_filter(env_filter)
        .with_writer(std::io::stderr)
        .init();

    let client = GatewayClient::new(
        &config.api_url,
        config.upstream_timeout_secs,
        &config.user_agent,
    )?;
    let dashboard = || {
        Dashboard::new(
            client.clone(),
            DashboardConfig::from_app_config(&config),
            JsonFileStore::open(&config.read_state_path),
        )
    };
    let mut out = std::io::stdout().lock();

    match cli.command {
        Commands::Posts {
            search,
            category,
            sort,
            page,
        } => {
            let args = commands::PostsArgs {
                search,
                category,
                sort,
                page,
            };
            commands::run_posts(&dashboard(), args, &mut out).await?;
        }
        Commands::Stats => commands::run_stats(&client, &mut out).await?,
        Commands::Crawl => commands::run_crawl(&dashboard(), &mut out).await?,
        Commands::Open { post_id } => {
            let mut read = ReadState::load(JsonFileStore::open(&config.read_state_path));
            commands::run_open(&client, &mut read, &post_id, &mut out).await?;
        }
        Commands::Watch => {
            drop(out);
            commands::run_watch(Arc::new(dashboard())).await?;
        }
    }

    Ok(())
}

#[cfg(test)]
mod tests;
