//! # Korean News Digest
//!
//! Scrapes Korean news sites, extracts article bodies, summarizes them
//! through an OpenAI-compatible LLM API and keeps the summaries in a local
//! SQLite file.
//!
//! ## Features
//!
//! - Source registry of (press, category) listing pages, seeded from a JSON catalog
//! - Listing scraper with a static HTTP tier and a headless Chromium fallback
//! - Content scraper with per-site selector rules for 연합뉴스, ZDNet, 한국일보,
//!   조선일보 and 중앙일보, plus generic rules for everything else
//! - Summaries stored by URL and never recomputed
//!
//! ## Usage
//!
//! ```sh
//! korean-news-digest seed
//! korean-news-digest list --category 경제
//! korean-news-digest summarize <url> --category 경제 --source 연합뉴스
//! ```
//!
//! ## Architecture
//!
//! 1. **Registry**: pick a (category, source) from the catalog
//! 2. **Listing**: scrape candidate (title, URL) pairs, or fall back to samples
//! 3. **Content**: extract the body of one chosen URL
//! 4. **Summary**: send the body to the LLM and store the result

use clap::Parser;
use std::error::Error;
use tracing::{debug, info, instrument};
use tracing_subscriber::{EnvFilter, fmt as tfmt};

mod api;
mod cli;
mod config;
mod error;
mod models;
mod pipeline;
mod scrapers;
mod seed;
mod storage;
mod utils;

use api::ArticleSummarizer;
use cli::{Cli, Command};
use config::AppConfig;
use models::Source;
use pipeline::Pipeline;
use scrapers::NewsScraper;
use serde::Serialize;
use storage::{ArticleStore, Registry};
use utils::truncate_for_log;

#[tokio::main]
#[instrument]
async fn main() -> Result<(), Box<dyn Error>> {
    // --- Tracing init ---
    let filter = EnvFilter::try_from_default_env().unwrap_or_else(|_| EnvFilter::new("info"));
    tfmt()
        .with_env_filter(filter)
        .with_target(true)
        .with_file(false)
        .with_line_number(false)
        .with_writer(std::io::stderr)
        .with_timer(tracing_subscriber::fmt::time::UtcTime::rfc_3339())
        .init();

    let start_time = std::time::Instant::now();

    // Parse CLI
    let args = Cli::parse();
    debug!(command = ?args.command, "Parsed CLI arguments");

    let mut config = AppConfig::load(args.config.as_deref()).await?;
    if let Some(database) = &args.database {
        config.database_path = database.clone();
    }
    info!(database = %config.database_path.display(), "korean_news_digest starting up");

    let registry = Registry::new(&config.database_path);
    let store = ArticleStore::new(&config.database_path);

    match args.command {
        Command::Seed { file } => {
            let count = seed::seed_from_file(&file, &registry).await?;
            println!("{count}개의 뉴스 소스를 등록했습니다.");
        }

        Command::Sources { category } => {
            let sources = registry.get_sources(category.as_deref()).await?;
            emit(args.json, &sources, |sources| {
                for s in sources {
                    println!("{}\t{}\t{}", s.name, s.category, s.listing_url);
                }
            })?;
        }

        Command::Categories => {
            let categories = registry.categories().await?;
            emit(args.json, &categories, |categories| {
                for c in categories {
                    println!("{c}");
                }
            })?;
        }

        Command::AddSource {
            name,
            category,
            url,
            base_url,
        } => {
            let source = Source::new(&name, &category, &url, base_url.as_deref())?;
            registry.add_source(&source).await?;
            println!("{} - {} 등록됨 ({})", source.name, source.category, source.base_url);
        }

        Command::RemoveSource { name, category } => {
            if registry.delete_source(&name, &category).await? {
                println!("{name} - {category} 삭제됨");
            } else {
                println!("{name} - {category} 등록되어 있지 않음");
            }
        }

        Command::List { category, source } => {
            let scraper = NewsScraper::new(&config, registry)?;
            let candidates = scraper.list_articles(&category, source.as_deref()).await;
            emit(args.json, &candidates, |candidates| {
                for (i, c) in candidates.iter().enumerate() {
                    println!("{:>2}. [{}] {}\n    {}", i + 1, c.source_name, c.title, c.url);
                }
            })?;
        }

        Command::Extract { url } => {
            let scraper = NewsScraper::new(&config, registry)?;
            match scraper.extract_content(&url).await {
                Some(content) => emit(args.json, &content, |content| {
                    println!("제목: {}", content.title);
                    println!("추출 방식: {}", content.extraction_method);
                    println!("\n{}", content.body);
                })?,
                None => return Err(format!("뉴스 내용을 가져올 수 없습니다: {url}").into()),
            }
        }

        Command::Summarize {
            url,
            category,
            source,
            title,
        } => {
            let api_key = args
                .openai_api_key
                .as_deref()
                .ok_or("OpenAI API key required (--openai-api-key or OPENAI_API_KEY)")?;
            let summarizer = ArticleSummarizer::from_config(&config.summarizer, api_key)?;
            let scraper = NewsScraper::new(&config, registry)?;
            let pipeline = Pipeline::new(scraper, store, summarizer);

            let article = pipeline
                .process_article(&url, title.as_deref(), &category, &source)
                .await?;
            info!(id = article.id, summary = %truncate_for_log(&article.summary, 80), "Summary ready");
            emit(args.json, &article, |article| {
                println!("# {}", article.title);
                println!("{} | {} | {}\n", article.source_name, article.category, article.created_at);
                println!("{}", article.summary);
            })?;
        }

        Command::History { category } => {
            let articles = store.list(category.as_deref()).await?;
            emit(args.json, &articles, |articles| {
                for a in articles {
                    println!(
                        "{}\t{}\t[{}] {}\n\t{}",
                        a.created_at,
                        a.source_name,
                        a.category,
                        a.title,
                        truncate_for_log(&a.summary, 120)
                    );
                }
            })?;
        }
    }

    info!(elapsed_ms = start_time.elapsed().as_millis(), "Done");
    Ok(())
}

/// Print `value` as pretty JSON, or through `text` for humans.
fn emit<T, F>(json: bool, value: &T, text: F) -> Result<(), Box<dyn Error>>
where
    T: Serialize + ?Sized,
    F: FnOnce(&T),
{
    if json {
        println!("{}", serde_json::to_string_pretty(value)?);
    } else {
        text(value);
    }
    Ok(())
}
