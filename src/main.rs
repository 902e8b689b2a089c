mod cli;

use anyhow::Result;
use clap::Parser;
use tracing_subscriber::EnvFilter;

use cli::{CacheCommand, Cli, Commands};
use showreel::config::Settings;
use showreel::types::{Feed, RepoSummary, Staleness, VideoSummary};
use showreel::Showreel;

#[tokio::main]
async fn main() -> Result<()> {
    tracing_subscriber::fmt()
        .with_env_filter(EnvFilter::try_from_default_env().unwrap_or_else(|_| EnvFilter::new("showreel=info")))
        .with_writer(std::io::stderr)
        .init();

    let cli = Cli::parse();
    let mut settings = Settings::load(cli.config.as_deref())?;
    if let Some(url) = cli.database { settings.database_url = Some(url); }
    let reel = Showreel::connect(settings, true).await?;

    match cli.command {
        Commands::Videos { json } => {
            let feed = reel.resolve_videos().await;
            if json {
                println!("{}", serde_json::to_string_pretty(&feed)?);
            } else {
                let channel = reel.settings().youtube.channel_id.clone().unwrap_or_default();
                let title = if feed.staleness == Staleness::StaticFallback { "Featured Videos" } else { "Latest Videos" };
                print_header(title, &feed);
                for v in feed.videos() {
                    print_video(v, &channel);
                }
            }
        }
        Commands::Repos { json } => {
            let feed = reel.resolve_repos().await;
            if json {
                println!("{}", serde_json::to_string_pretty(&feed)?);
            } else {
                print_header("Projects", &feed);
                for r in feed.repos() {
                    print_repo(r);
                }
            }
        }
        Commands::Cache { action } => match action {
            CacheCommand::Clear { prefix } => {
                let removed = reel.clear_cache_prefix(prefix.as_deref()).await?;
                println!("Removed {} cache entries", removed);
            }
            CacheCommand::Stats => {
                let stats = reel.cache_stats().await?;
                println!("Entries: {} ({} expired)", stats.entries, stats.expired_entries);
            }
            CacheCommand::Vacuum => {
                reel.vacuum_db().await?;
                println!("Vacuumed cache database");
            }
        },
    }
    Ok(())
}

fn print_header<T>(title: &str, feed: &Feed<T>) {
    println!("{} [{}]", title, feed.staleness.as_str());
    if let Some(ts) = feed.fetched_at {
        println!("Last updated: {} (epoch ms)", ts);
    }
    if let Some(notice) = feed.notice() {
        println!("Note: {}", notice);
    }
    println!();
}

fn print_video(v: &VideoSummary, channel: &str) {
    println!("{}", v.title);
    println!("  {}", v.watch_url(channel));
    println!("  published {}", v.published_at);
}

fn print_repo(r: &RepoSummary) {
    let lang = r.language.as_deref().unwrap_or("-");
    println!("{} ({}, {} stars, {} forks)", r.name, lang, r.stargazers_count, r.forks_count);
    if let Some(d) = r.description.as_deref().filter(|d| !d.is_empty()) {
        println!("  {}", d);
    }
    println!("  {}", r.html_url);
}
