//! Command-line interface definitions for the Korean news digest.
//!
//! This module defines the CLI arguments and subcommands using the `clap` crate.
//! Global options can also be provided via environment variables.

use clap::{Parser, Subcommand};
use std::path::PathBuf;

/// Command-line arguments for the Korean news digest.
///
/// # Examples
///
/// ```sh
/// # Load the media-company catalog into the registry
/// korean-news-digest seed --file data/mediacompany.json
///
/// # List political headlines from one source
/// korean-news-digest list --category 정치 --source 조선일보
///
/// # Summarize one article (needs OPENAI_API_KEY)
/// korean-news-digest summarize https://www.yna.co.kr/view/AKR... --category 정치 --source 연합뉴스
/// ```
#[derive(Parser, Debug)]
#[command(author, version, about)]
pub struct Cli {
    /// Optional path to config.yaml file
    #[arg(short, long, global = true, env = "NEWS_DIGEST_CONFIG")]
    pub config: Option<String>,

    /// SQLite database file (overrides the config file)
    #[arg(long, global = true, env = "NEWS_DIGEST_DB")]
    pub database: Option<PathBuf>,

    /// API key for the OpenAI-compatible summarizer endpoint
    #[arg(long, global = true, env = "OPENAI_API_KEY", hide_env_values = true)]
    pub openai_api_key: Option<String>,

    /// Print results as JSON instead of text
    #[arg(long, global = true)]
    pub json: bool,

    #[command(subcommand)]
    pub command: Command,
}

#[derive(Subcommand, Debug, PartialEq, Eq)]
pub enum Command {
    /// Load a media-company JSON catalog into the source registry
    Seed {
        #[arg(short, long, default_value = "data/mediacompany.json")]
        file: PathBuf,
    },

    /// Show registered sources
    Sources {
        #[arg(long)]
        category: Option<String>,
    },

    /// Show categories that have at least one source
    Categories,

    /// Register a source, or update an existing (name, category)
    AddSource {
        #[arg(long)]
        name: String,
        #[arg(long)]
        category: String,
        /// Listing page URL
        #[arg(long)]
        url: String,
        /// Origin for relative links; derived from --url when omitted
        #[arg(long)]
        base_url: Option<String>,
    },

    /// Remove a source (stored articles are kept)
    RemoveSource {
        #[arg(long)]
        name: String,
        #[arg(long)]
        category: String,
    },

    /// Scrape article candidates for a category
    List {
        #[arg(long)]
        category: String,
        /// Only this source; every source of the category when omitted
        #[arg(long)]
        source: Option<String>,
    },

    /// Extract the body text of one article
    Extract { url: String },

    /// Extract, summarize and store one article
    Summarize {
        url: String,
        #[arg(long)]
        category: String,
        #[arg(long)]
        source: String,
        /// Title from the listing; the extracted title is used when omitted
        #[arg(long)]
        title: Option<String>,
    },

    /// Show stored summaries, newest first
    History {
        #[arg(long)]
        category: Option<String>,
    },
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_cli_parsing() {
        let cli = Cli::parse_from([
            "korean-news-digest",
            "list",
            "--category",
            "정치",
            "--source",
            "조선일보",
        ]);

        assert_eq!(
            cli.command,
            Command::List {
                category: "정치".into(),
                source: Some("조선일보".into()),
            }
        );
        assert!(!cli.json);
    }

    #[test]
    fn test_cli_global_flags_after_subcommand() {
        let cli = Cli::parse_from([
            "korean-news-digest",
            "history",
            "--json",
            "-c",
            "/tmp/config.yaml",
            "--database",
            "/tmp/news.db",
        ]);

        assert_eq!(cli.command, Command::History { category: None });
        assert!(cli.json);
        assert_eq!(cli.config.as_deref(), Some("/tmp/config.yaml"));
        assert_eq!(cli.database, Some(PathBuf::from("/tmp/news.db")));
    }

    #[test]
    fn test_cli_seed_default_file() {
        let cli = Cli::parse_from(["korean-news-digest", "seed"]);
        assert_eq!(
            cli.command,
            Command::Seed {
                file: PathBuf::from("data/mediacompany.json")
            }
        );
    }

    #[test]
    fn test_cli_summarize_requires_category_and_source() {
        assert!(Cli::try_parse_from(["korean-news-digest", "summarize", "https://a.test/1"]).is_err());

        let cli = Cli::try_parse_from([
            "korean-news-digest",
            "summarize",
            "https://a.test/1",
            "--category",
            "경제",
            "--source",
            "연합뉴스",
        ])
        .unwrap();
        assert!(matches!(cli.command, Command::Summarize { title: None, .. }));
    }
}
