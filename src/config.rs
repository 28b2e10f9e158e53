//! Application configuration loaded from an optional YAML file.
//!
//! Every field has a default, so a missing file or a partial file is fine.
//! Secrets (the summarizer API key) are not read from here; they come from
//! the command line or the environment.

use serde::{Deserialize, Serialize};
use std::error::Error;
use std::path::PathBuf;
use std::time::Duration;
use tracing::{info, instrument};

/// Top-level application configuration.
#[derive(Debug, Clone, Deserialize, Serialize)]
pub struct AppConfig {
    /// SQLite file shared by the source registry and the article store.
    #[serde(default = "default_database_path")]
    pub database_path: PathBuf,

    #[serde(default)]
    pub static_fetch: StaticFetchConfig,

    #[serde(default)]
    pub browser: BrowserConfig,

    #[serde(default)]
    pub summarizer: SummarizerConfig,
}

/// Settings for the plain HTTP tier.
#[derive(Debug, Clone, Deserialize, Serialize)]
pub struct StaticFetchConfig {
    #[serde(default = "default_timeout_secs")]
    pub timeout_secs: u64,

    #[serde(default = "default_user_agent")]
    pub user_agent: String,

    #[serde(default = "default_accept_language")]
    pub accept_language: String,
}

/// Settings for the headless browser tier.
#[derive(Debug, Clone, Deserialize, Serialize)]
pub struct BrowserConfig {
    /// Explicit Chrome/Chromium binary; auto-detected when absent.
    #[serde(default)]
    pub chrome_executable: Option<PathBuf>,

    #[serde(default = "default_render_wait_secs")]
    pub render_wait_secs: u64,

    #[serde(default = "default_scroll_bottom_wait_secs")]
    pub scroll_bottom_wait_secs: u64,

    #[serde(default = "default_scroll_top_wait_secs")]
    pub scroll_top_wait_secs: u64,

    /// Upper bound for one render, from navigation to the last selector.
    #[serde(default = "default_page_timeout_secs")]
    pub page_timeout_secs: u64,

    #[serde(default = "default_window_width")]
    pub window_width: u32,

    #[serde(default = "default_window_height")]
    pub window_height: u32,

    #[serde(default = "default_user_agent")]
    pub user_agent: String,
}

/// Settings for the OpenAI-compatible summarizer.
#[derive(Debug, Clone, Deserialize, Serialize)]
pub struct SummarizerConfig {
    #[serde(default = "default_endpoint")]
    pub endpoint: String,

    #[serde(default = "default_model")]
    pub model: String,

    #[serde(default = "default_max_tokens")]
    pub max_tokens: u32,

    #[serde(default = "default_temperature")]
    pub temperature: f32,

    #[serde(default = "default_max_retries")]
    pub max_retries: usize,
}

// ── Defaults ─────────────────────────────────────────────────────────────────

fn default_database_path() -> PathBuf {
    PathBuf::from("news_assistant.db")
}
fn default_timeout_secs() -> u64 {
    15
}
fn default_user_agent() -> String {
    "Mozilla/5.0 (Windows NT 10.0; Win64; x64) AppleWebKit/537.36 (KHTML, like Gecko) Chrome/120.0.0.0 Safari/537.36".to_string()
}
fn default_accept_language() -> String {
    "ko-KR,ko;q=0.8,en-US;q=0.5,en;q=0.3".to_string()
}
fn default_render_wait_secs() -> u64 {
    5
}
fn default_scroll_bottom_wait_secs() -> u64 {
    3
}
fn default_scroll_top_wait_secs() -> u64 {
    2
}
fn default_page_timeout_secs() -> u64 {
    90
}
fn default_window_width() -> u32 {
    1920
}
fn default_window_height() -> u32 {
    1080
}
fn default_endpoint() -> String {
    "https://api.openai.com/v1/chat/completions".to_string()
}
fn default_model() -> String {
    "gpt-4o-mini".to_string()
}
fn default_max_tokens() -> u32 {
    1000
}
fn default_temperature() -> f32 {
    0.3
}
fn default_max_retries() -> usize {
    5
}

impl Default for StaticFetchConfig {
    fn default() -> Self {
        Self {
            timeout_secs: default_timeout_secs(),
            user_agent: default_user_agent(),
            accept_language: default_accept_language(),
        }
    }
}

impl Default for BrowserConfig {
    fn default() -> Self {
        Self {
            chrome_executable: None,
            render_wait_secs: default_render_wait_secs(),
            scroll_bottom_wait_secs: default_scroll_bottom_wait_secs(),
            scroll_top_wait_secs: default_scroll_top_wait_secs(),
            page_timeout_secs: default_page_timeout_secs(),
            window_width: default_window_width(),
            window_height: default_window_height(),
            user_agent: default_user_agent(),
        }
    }
}

impl Default for SummarizerConfig {
    fn default() -> Self {
        Self {
            endpoint: default_endpoint(),
            model: default_model(),
            max_tokens: default_max_tokens(),
            temperature: default_temperature(),
            max_retries: default_max_retries(),
        }
    }
}

impl Default for AppConfig {
    fn default() -> Self {
        Self {
            database_path: default_database_path(),
            static_fetch: StaticFetchConfig::default(),
            browser: BrowserConfig::default(),
            summarizer: SummarizerConfig::default(),
        }
    }
}

impl StaticFetchConfig {
    pub fn timeout(&self) -> Duration {
        Duration::from_secs(self.timeout_secs)
    }
}

impl BrowserConfig {
    pub fn page_timeout(&self) -> Duration {
        Duration::from_secs(self.page_timeout_secs)
    }
}

// ── Loader ───────────────────────────────────────────────────────────────────

impl AppConfig {
    /// Load configuration from a YAML file, or defaults when no path is given.
    ///
    /// # Errors
    ///
    /// Returns an error if the file cannot be read or is not valid YAML for
    /// this schema. A missing optional path is not an error.
    #[instrument(level = "info")]
    pub async fn load(path: Option<&str>) -> Result<Self, Box<dyn Error>> {
        let Some(path) = path else {
            info!("No config file given; using defaults");
            return Ok(Self::default());
        };

        let raw = tokio::fs::read_to_string(path).await?;
        let config = Self::from_yaml(&raw)?;
        info!(path, database = %config.database_path.display(), "Loaded configuration");
        Ok(config)
    }

    pub fn from_yaml(raw: &str) -> Result<Self, serde_yaml::Error> {
        serde_yaml::from_str(raw)
    }
}
