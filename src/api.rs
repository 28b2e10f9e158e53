//! Summarizer backend: an OpenAI-compatible chat-completions client with
//! exponential backoff retry logic.
//!
//! The scraping core treats summarization as opaque: it hands over a title
//! and a body and stores whatever text comes back.
//!
//! # Architecture
//!
//! - [`AskAsync`]: core trait for one prompt/response round trip
//! - [`ChatCompletionsClient`]: `POST {endpoint}` with a system + user message
//! - [`RetryAsk`]: decorator that adds retry logic to any `AskAsync`
//! - [`Summarizer`]: what the caller flow depends on
//! - [`ArticleSummarizer`]: builds the Korean summary prompt on top of an asker
//!
//! # Retry Strategy
//!
//! - Up to `max_retries` retry attempts (5 by default)
//! - Exponential backoff starting at 1 second
//! - Maximum delay capped at 30 seconds
//! - Random jitter (0-250ms) added to prevent thundering herd

use crate::config::SummarizerConfig;
use crate::utils::truncate_for_log;
use rand::{Rng, rng};
use serde::{Deserialize, Serialize};
use std::error::Error;
use std::fmt;
use std::time::{Duration as StdDuration, Instant};
use tokio::time::sleep;
use tracing::{debug, error, info, instrument, warn};

const SYSTEM_PROMPT: &str =
    "당신은 전문적인 뉴스 분석가입니다. 뉴스를 정확하고 상세하게 요약하는 것이 전문입니다.";

/// Trait for async LLM interaction.
///
/// Implementors send text to an LLM and return its response. Decorators such
/// as [`RetryAsk`] wrap another implementor.
pub trait AskAsync {
    /// The type of response returned by the LLM.
    type Response;

    /// Send text to the LLM and receive a response.
    ///
    /// # Arguments
    ///
    /// * `text` - The input text to send to the LLM
    async fn ask(&self, text: &str) -> Result<Self::Response, Box<dyn Error>>;
}

/// Wrapper that adds exponential backoff retry logic to any [`AskAsync`] implementation.
///
/// # Backoff Strategy
///
/// The delay between retries follows this formula:
/// ```text
/// delay = min(base_delay * 2^(attempt-1), max_delay) + random_jitter(0..250ms)
/// ```
pub struct RetryAsk<T> {
    /// The underlying LLM client to wrap.
    inner: T,
    /// Maximum number of retry attempts before giving up.
    max_retries: usize,
    /// Initial delay between retries (doubles with each attempt).
    base_delay: StdDuration,
    /// Maximum delay cap to prevent excessive waiting.
    max_delay: StdDuration,
}

impl<T> RetryAsk<T>
where
    T: AskAsync,
{
    /// Create a new retry wrapper around an existing [`AskAsync`] implementation.
    ///
    /// # Arguments
    ///
    /// * `inner` - The underlying LLM client to wrap
    /// * `max_retries` - Maximum number of retry attempts (5 recommended)
    /// * `base_delay` - Initial delay between retries (1 second recommended)
    pub fn new(inner: T, max_retries: usize, base_delay: StdDuration) -> Self {
        Self {
            inner,
            max_retries,
            base_delay,
            max_delay: StdDuration::from_secs(30),
        }
    }
}

impl<T> fmt::Debug for RetryAsk<T> {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.debug_struct("RetryAsk")
            .field("max_retries", &self.max_retries)
            .field("base_delay", &self.base_delay)
            .field("max_delay", &self.max_delay)
            .finish()
    }
}

impl<T> AskAsync for RetryAsk<T>
where
    T: AskAsync + fmt::Debug,
{
    type Response = T::Response;

    #[instrument(level = "info", skip_all)]
    async fn ask(&self, text: &str) -> Result<Self::Response, Box<dyn Error>> {
        let total_t0 = Instant::now();
        let mut attempt = 0usize;

        loop {
            let attempt_t0 = Instant::now();
            match self.inner.ask(text).await {
                Ok(resp) => {
                    return Ok(resp);
                }
                Err(e) => {
                    attempt += 1;
                    let attempt_dt = attempt_t0.elapsed();
                    let total_dt = total_t0.elapsed();

                    if attempt > self.max_retries {
                        error!(
                            attempt,
                            max = self.max_retries,
                            elapsed_ms_attempt = attempt_dt.as_millis(),
                            elapsed_ms_total = total_dt.as_millis(),
                            error = %e,
                            "ask() exhausted retries"
                        );
                        return Err(e);
                    }

                    // backoff calc
                    let shift = u32::try_from(attempt - 1).unwrap_or(u32::MAX).min(16);
                    let delay = self
                        .base_delay
                        .saturating_mul(1 << shift)
                        .min(self.max_delay);
                    let jitter_ms: u64 = rng().random_range(0..=250);
                    let delay = delay + StdDuration::from_millis(jitter_ms);

                    warn!(
                        attempt,
                        max = self.max_retries,
                        elapsed_ms_attempt = attempt_dt.as_millis(),
                        elapsed_ms_total = total_dt.as_millis(),
                        ?delay,
                        error = %e,
                        "ask() attempt failed; backing off"
                    );
                    sleep(delay).await;
                }
            }
        }
    }
}

// ── Chat completions ─────────────────────────────────────────────────────────

#[derive(Debug, Serialize)]
struct ChatMessage<'a> {
    role: &'a str,
    content: &'a str,
}

#[derive(Debug, Serialize)]
struct ChatRequest<'a> {
    model: &'a str,
    messages: Vec<ChatMessage<'a>>,
    max_tokens: u32,
    temperature: f32,
}

#[derive(Debug, Deserialize)]
struct ChatResponse {
    #[serde(default)]
    choices: Vec<ChatChoice>,
}

#[derive(Debug, Deserialize)]
struct ChatChoice {
    message: ChatReply,
}

#[derive(Debug, Deserialize)]
struct ChatReply {
    #[serde(default)]
    content: Option<String>,
}

/// Minimal OpenAI-compatible chat-completions client.
///
/// Every request carries [`SYSTEM_PROMPT`] followed by the caller's text as
/// the user message.
pub struct ChatCompletionsClient {
    http: reqwest::Client,
    endpoint: String,
    api_key: String,
    model: String,
    max_tokens: u32,
    temperature: f32,
}

impl fmt::Debug for ChatCompletionsClient {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.debug_struct("ChatCompletionsClient")
            .field("endpoint", &self.endpoint)
            .field("model", &self.model)
            .field("max_tokens", &self.max_tokens)
            .field("temperature", &self.temperature)
            .finish_non_exhaustive()
    }
}

impl ChatCompletionsClient {
    /// Build a client for `config.endpoint` authenticated with `api_key`.
    ///
    /// # Errors
    ///
    /// Returns an error if the HTTP client cannot be constructed.
    pub fn new(config: &SummarizerConfig, api_key: &str) -> Result<Self, Box<dyn Error>> {
        let http = reqwest::Client::builder()
            .timeout(StdDuration::from_secs(120))
            .build()?;
        Ok(Self {
            http,
            endpoint: config.endpoint.clone(),
            api_key: api_key.to_string(),
            model: config.model.clone(),
            max_tokens: config.max_tokens,
            temperature: config.temperature,
        })
    }
}

impl AskAsync for ChatCompletionsClient {
    type Response = String;

    #[instrument(level = "info", skip_all, fields(model = %self.model))]
    async fn ask(&self, text: &str) -> Result<Self::Response, Box<dyn Error>> {
        let t0 = Instant::now();
        let request = ChatRequest {
            model: &self.model,
            messages: vec![
                ChatMessage {
                    role: "system",
                    content: SYSTEM_PROMPT,
                },
                ChatMessage {
                    role: "user",
                    content: text,
                },
            ],
            max_tokens: self.max_tokens,
            temperature: self.temperature,
        };

        let response = self
            .http
            .post(&self.endpoint)
            .bearer_auth(&self.api_key)
            .json(&request)
            .send()
            .await?;

        let status = response.status();
        if !status.is_success() {
            let body = response.text().await.unwrap_or_default();
            warn!(
                %status,
                elapsed_ms = t0.elapsed().as_millis(),
                body = %truncate_for_log(&body, 300),
                "API call failed"
            );
            return Err(format!("chat completions returned HTTP {status}").into());
        }

        let parsed: ChatResponse = response.json().await?;
        let content = parsed
            .choices
            .into_iter()
            .next()
            .and_then(|choice| choice.message.content)
            .map(|c| c.trim().to_string())
            .filter(|c| !c.is_empty())
            .ok_or("chat completions returned no content")?;

        debug!(
            elapsed_ms = t0.elapsed().as_millis(),
            chars = content.chars().count(),
            "API call succeeded"
        );
        Ok(content)
    }
}

// ── Summarizer ───────────────────────────────────────────────────────────────

/// Turns an article into a summary. Opaque to the scraping core.
pub trait Summarizer {
    async fn summarize(&self, title: &str, body: &str) -> Result<String, Box<dyn Error>>;
}

/// Korean summary prompt for one article.
pub fn summary_prompt(title: &str, body: &str) -> String {
    format!(
        "다음 뉴스 기사를 한국어로 상세하게 요약해주세요:\n\n\
         제목: {title}\n\n\
         본문 내용:\n{body}\n\n\
         요약 시 다음 사항을 포함해주세요:\n\
         1. 핵심 내용 (3-4문장)\n\
         2. 주요 사실과 데이터\n\
         3. 배경 정보\n\
         4. 영향과 의미\n\
         5. 관련 맥락\n\n\
         요약은 500-800자 정도로 작성해주세요."
    )
}

/// [`Summarizer`] backed by any string-returning [`AskAsync`], with retries.
#[derive(Debug)]
pub struct ArticleSummarizer<A> {
    asker: RetryAsk<A>,
}

impl<A> ArticleSummarizer<A>
where
    A: AskAsync<Response = String>,
{
    pub fn new(asker: A, max_retries: usize) -> Self {
        Self {
            asker: RetryAsk::new(asker, max_retries, StdDuration::from_secs(1)),
        }
    }
}

impl ArticleSummarizer<ChatCompletionsClient> {
    /// Summarizer talking to the configured chat-completions endpoint.
    pub fn from_config(config: &SummarizerConfig, api_key: &str) -> Result<Self, Box<dyn Error>> {
        Ok(Self::new(
            ChatCompletionsClient::new(config, api_key)?,
            config.max_retries,
        ))
    }
}

impl<A> Summarizer for ArticleSummarizer<A>
where
    A: AskAsync<Response = String> + fmt::Debug,
{
    #[instrument(level = "info", skip_all, fields(title = %truncate_for_log(title, 40)))]
    async fn summarize(&self, title: &str, body: &str) -> Result<String, Box<dyn Error>> {
        let t0 = Instant::now();
        let res = self.asker.ask(&summary_prompt(title, body)).await;
        match &res {
            Ok(summary) => info!(
                elapsed_ms_total = t0.elapsed().as_millis(),
                chars = summary.chars().count(),
                "Summary generated"
            ),
            Err(e) => {
                error!(elapsed_ms_total = t0.elapsed().as_millis(), error = %e, "Summary failed")
            }
        }
        res
    }
}
