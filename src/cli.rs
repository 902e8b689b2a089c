use std::path::PathBuf;

use clap::{Parser, Subcommand};

/// Resolve portfolio feeds and manage their cache
#[derive(Parser)]
#[command(name = "showreel")]
#[command(about = "Cached YouTube and GitHub feeds for a portfolio page", long_about = None)]
pub struct Cli {
    /// Settings file (defaults to config.toml in the platform config dir)
    #[arg(long, global = true)]
    pub config: Option<PathBuf>,

    /// Database URL for the feed cache (overrides settings)
    #[arg(long, global = true)]
    pub database: Option<String>,

    #[command(subcommand)]
    pub command: Commands,
}

#[derive(Subcommand)]
pub enum Commands {
    /// Show the latest channel videos
    Videos {
        /// Print the resolved feed as JSON
        #[arg(long)]
        json: bool,
    },
    /// Show recently updated repositories
    Repos {
        #[arg(long)]
        json: bool,
    },
    /// Inspect or maintain the feed cache
    Cache {
        #[command(subcommand)]
        action: CacheCommand,
    },
}

#[derive(Subcommand)]
pub enum CacheCommand {
    /// Remove cached entries
    Clear {
        /// Only remove keys starting with this prefix (e.g. "youtube|")
        #[arg(short, long)]
        prefix: Option<String>,
    },
    /// Count cached and expired entries
    Stats,
    /// Compact the cache database
    Vacuum,
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn parses_global_flags_after_subcommand() {
        let cli = Cli::try_parse_from(["showreel", "videos", "--json", "--database", "sqlite::memory:"]).unwrap();
        assert_eq!(cli.database.as_deref(), Some("sqlite::memory:"));
        assert!(matches!(cli.command, Commands::Videos { json: true }));
    }

    #[test]
    fn parses_cache_clear_prefix() {
        let cli = Cli::try_parse_from(["showreel", "cache", "clear", "-p", "github|"]).unwrap();
        match cli.command {
            Commands::Cache { action: CacheCommand::Clear { prefix } } => assert_eq!(prefix.as_deref(), Some("github|")),
            _ => panic!("expected cache clear"),
        }
    }
}
