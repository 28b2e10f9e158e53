//! Dynamic tier: render the page in a headless Chromium and query the live DOM.
//!
//! Each fetch launches its own browser process, owned exclusively by that
//! call. The session is closed on every exit path: success, extraction miss,
//! navigation failure, script failure and render timeout. Nothing is reused
//! across calls.
//!
//! # Render choreography
//!
//! 1. Launch with automation flags disabled and a fixed window/viewport
//! 2. Inject a script hiding `navigator.webdriver`, then navigate
//! 3. Wait for scripts to run (5s by default)
//! 4. Scroll to the bottom (wait 3s) and back to the top (wait 2s) so
//!    lazy-loaded lists and bodies are attached
//! 5. Evaluate the selector cascade (CSS and XPath) in the page
//!
//! The whole render is bounded by `page_timeout_secs`.

use super::cascade::{LinkHarvest, accept_title, first_accepted};
use super::selectors::{
    DYNAMIC_NESTED_TITLE, HARVEST_PER_SELECTOR, Selector, TITLE_PLACEHOLDER, title_rules,
};
use crate::config::BrowserConfig;
use crate::error::ScrapeError;
use crate::models::{ExtractedContent, ExtractionMethod, ListingCandidate, Source};
use chromiumoxide::browser::{Browser, BrowserConfig as LaunchConfig};
use chromiumoxide::cdp::browser_protocol::page::AddScriptToEvaluateOnNewDocumentParams;
use chromiumoxide::handler::viewport::Viewport;
use chromiumoxide::page::Page;
use futures::StreamExt;
use serde::Deserialize;
use serde::de::DeserializeOwned;
use std::time::Duration;
use tokio::task::JoinHandle;
use tokio::time::{sleep, timeout};
use tracing::{debug, info, instrument, warn};

const STEALTH_JS: &str = r#"
    Object.defineProperty(navigator, 'webdriver', { get: () => undefined });
    Object.defineProperty(navigator, 'languages', { get: () => ['ko-KR', 'ko', 'en-US', 'en'] });
    window.chrome = { runtime: {} };
"#;

/// Resolves a selector descriptor to an array of elements in document order.
const QUERY_JS: &str = r#"
    const __query = (kind, expr) => {
        if (kind === 'xpath') {
            const snap = document.evaluate(expr, document, null, XPathResult.ORDERED_NODE_SNAPSHOT_TYPE, null);
            const out = [];
            for (let i = 0; i < snap.snapshotLength; i++) {
                const node = snap.snapshotItem(i);
                if (node && node.nodeType === Node.ELEMENT_NODE) out.push(node);
            }
            return out;
        }
        return Array.from(document.querySelectorAll(expr));
    };
    const __text = (el) => ((el && (el.innerText || el.textContent)) || '').trim();
"#;

/// A rendered anchor as reported by the page.
#[derive(Debug, Deserialize)]
struct RenderedLink {
    href: Option<String>,
    text: String,
    nested: Option<String>,
}

/// Headless browser fetcher.
#[derive(Debug, Clone)]
pub struct DynamicFetcher {
    config: BrowserConfig,
}

impl DynamicFetcher {
    pub fn new(config: &BrowserConfig) -> Self {
        Self {
            config: config.clone(),
        }
    }

    /// Render an article and run the body-text cascade in the live DOM.
    ///
    /// # Returns
    ///
    /// `Ok(Some(_))` with method `dynamic` on success, `Ok(None)` when no
    /// rendered block clears the length gate.
    ///
    /// # Errors
    ///
    /// [`ScrapeError::BrowserUnavailable`] when no browser can be launched,
    /// [`ScrapeError::Render`] or [`ScrapeError::RenderTimeout`] when the
    /// page could not be rendered. None of these are retried.
    #[instrument(level = "info", skip_all, fields(%url))]
    pub async fn fetch_content(
        &self,
        url: &str,
        rules: &[Selector],
    ) -> Result<Option<ExtractedContent>, ScrapeError> {
        let session = BrowserSession::launch(&self.config).await?;
        let outcome = timeout(
            self.config.page_timeout(),
            self.render_content(&session, url, rules),
        )
        .await;
        session.close().await;

        outcome.map_err(|_| ScrapeError::RenderTimeout {
            url: url.to_string(),
            secs: self.config.page_timeout_secs,
        })?
    }

    /// Render a source's listing page and harvest rendered anchors.
    #[instrument(level = "info", skip_all, fields(source = %source.name, url = %source.listing_url))]
    pub async fn fetch_listing(
        &self,
        source: &Source,
        rules: &[Selector],
    ) -> Result<Vec<ListingCandidate>, ScrapeError> {
        let session = BrowserSession::launch(&self.config).await?;
        let outcome = timeout(
            self.config.page_timeout(),
            self.render_listing(&session, source, rules),
        )
        .await;
        session.close().await;

        outcome.map_err(|_| ScrapeError::RenderTimeout {
            url: source.listing_url.clone(),
            secs: self.config.page_timeout_secs,
        })?
    }

    async fn render_content(
        &self,
        session: &BrowserSession,
        url: &str,
        rules: &[Selector],
    ) -> Result<Option<ExtractedContent>, ScrapeError> {
        let page = self.open_rendered(session, url).await?;

        for selector in rules {
            let blocks: Vec<String> = match evaluate(&page, url, &texts_script(selector)).await {
                Ok(blocks) => blocks,
                Err(e) => {
                    debug!(selector = %selector.expr(), error = %e, "Selector evaluation failed");
                    continue;
                }
            };
            debug!(selector = %selector.expr(), matched = blocks.len(), "Content selector evaluated");

            if let Some(body) = first_accepted(&blocks) {
                info!(selector = %selector.expr(), chars = body.chars().count(), "Rendered article body found");
                return Ok(Some(ExtractedContent {
                    title: rendered_title(&page, url).await,
                    body,
                    url: url.to_string(),
                    extraction_method: ExtractionMethod::Dynamic,
                }));
            }
        }

        debug!(%url, rules = rules.len(), "No rendered block passed the length gate");
        Ok(None)
    }

    async fn render_listing(
        &self,
        session: &BrowserSession,
        source: &Source,
        rules: &[Selector],
    ) -> Result<Vec<ListingCandidate>, ScrapeError> {
        let url = source.listing_url.as_str();
        let page = self.open_rendered(session, url).await?;
        let mut harvest = LinkHarvest::new(source);

        for selector in rules {
            let links: Vec<RenderedLink> = match evaluate(&page, url, &links_script(selector)).await {
                Ok(links) => links,
                Err(e) => {
                    debug!(selector = %selector.expr(), error = %e, "Selector evaluation failed");
                    continue;
                }
            };
            debug!(selector = %selector.expr(), matched = links.len(), "Listing selector evaluated");

            for link in &links {
                let Some(href) = link.href.as_deref() else {
                    continue;
                };
                harvest.offer(href, &link.text, link.nested.as_deref());
                if harvest.is_full() {
                    break;
                }
            }

            if !harvest.is_empty() {
                info!(selector = %selector.expr(), count = harvest.len(), "Rendered listing candidates collected");
                break;
            }
        }

        Ok(harvest.into_candidates())
    }

    /// Open `url` in a fresh tab and run the wait/scroll choreography.
    async fn open_rendered(&self, session: &BrowserSession, url: &str) -> Result<Page, ScrapeError> {
        let render_error = |e: chromiumoxide::error::CdpError| ScrapeError::Render {
            url: url.to_string(),
            reason: e.to_string(),
        };

        let page = session.browser.new_page("about:blank").await.map_err(render_error)?;
        if let Err(e) = page
            .execute(AddScriptToEvaluateOnNewDocumentParams::new(STEALTH_JS))
            .await
        {
            debug!(error = %e, "Stealth script injection failed");
        }
        page.goto(url).await.map_err(render_error)?;
        info!(%url, "Page loaded");

        sleep(Duration::from_secs(self.config.render_wait_secs)).await;
        scroll(&page, "window.scrollTo(0, document.body.scrollHeight);").await;
        sleep(Duration::from_secs(self.config.scroll_bottom_wait_secs)).await;
        scroll(&page, "window.scrollTo(0, 0);").await;
        sleep(Duration::from_secs(self.config.scroll_top_wait_secs)).await;

        Ok(page)
    }
}

async fn scroll(page: &Page, script: &str) {
    if let Err(e) = page.evaluate(script).await {
        debug!(error = %e, "Scroll script failed");
    }
}

async fn evaluate<T: DeserializeOwned>(page: &Page, url: &str, script: &str) -> Result<T, ScrapeError> {
    let render_error = |reason: String| ScrapeError::Render {
        url: url.to_string(),
        reason,
    };
    page.evaluate(script)
        .await
        .map_err(|e| render_error(e.to_string()))?
        .into_value()
        .map_err(|e| render_error(e.to_string()))
}

/// Title cascade against the live DOM, mirroring the static tier.
async fn rendered_title(page: &Page, url: &str) -> String {
    for selector in title_rules() {
        let first: Vec<String> = evaluate(page, url, &first_text_script(&selector))
            .await
            .unwrap_or_default();
        if let Some(title) = first.first().and_then(|t| accept_title(t)) {
            return title;
        }
    }
    TITLE_PLACEHOLDER.to_string()
}

fn kind_and_expr(selector: &Selector) -> (&'static str, String) {
    let kind = match selector {
        Selector::Css(_) => "css",
        Selector::XPath(_) => "xpath",
    };
    // JSON string literals are valid JavaScript string literals.
    let expr = serde_json::Value::from(selector.expr()).to_string();
    (kind, expr)
}

/// Script returning the text of every element matched by `selector`.
fn texts_script(selector: &Selector) -> String {
    let (kind, expr) = kind_and_expr(selector);
    format!("(() => {{ {QUERY_JS} return __query('{kind}', {expr}).map(__text); }})()")
}

/// Script returning the text of the first element matched by `selector`.
fn first_text_script(selector: &Selector) -> String {
    let (kind, expr) = kind_and_expr(selector);
    format!("(() => {{ {QUERY_JS} return __query('{kind}', {expr}).slice(0, 1).map(__text); }})()")
}

/// Script returning href, text and nested headline of the first anchors.
fn links_script(selector: &Selector) -> String {
    let (kind, expr) = kind_and_expr(selector);
    let nested = serde_json::Value::from(DYNAMIC_NESTED_TITLE.to_vec()).to_string();
    format!(
        "(() => {{ {QUERY_JS}
            const nestedTags = {nested};
            return __query('{kind}', {expr}).slice(0, {HARVEST_PER_SELECTOR}).map((el) => {{
                let nested = null;
                for (const tag of nestedTags) {{
                    const inner = el.querySelector(tag);
                    if (inner && __text(inner)) {{ nested = __text(inner); break; }}
                }}
                return {{ href: el.href || el.getAttribute('href'), text: __text(el), nested }};
            }});
        }})()"
    )
}

/// Chromium switches used for every launch.
///
/// The library defaults are disabled because they include `--enable-automation`
/// and `--lang=en_US`; the remaining defaults are listed here explicitly.
const BASE_ARGS: &[&str] = &[
    "--disable-background-networking",
    "--disable-background-timer-throttling",
    "--disable-backgrounding-occluded-windows",
    "--disable-breakpad",
    "--disable-client-side-phishing-detection",
    "--disable-component-extensions-with-background-pages",
    "--disable-default-apps",
    "--disable-dev-shm-usage",
    "--disable-extensions",
    "--disable-features=TranslateUI",
    "--disable-hang-monitor",
    "--disable-ipc-flooding-protection",
    "--disable-popup-blocking",
    "--disable-prompt-on-repost",
    "--disable-renderer-backgrounding",
    "--disable-sync",
    "--force-color-profile=srgb",
    "--metrics-recording-only",
    "--no-first-run",
    "--password-store=basic",
    "--use-mock-keychain",
    "--disable-blink-features=AutomationControlled",
    "--disable-infobars",
    "--disable-gpu",
    "--lang=ko-KR",
];

/// Upper bound for each teardown step before the process is killed.
const CLOSE_GRACE: Duration = Duration::from_secs(10);

/// Command-line switches for one launch.
fn launch_args(config: &BrowserConfig) -> Vec<String> {
    BASE_ARGS
        .iter()
        .map(|arg| arg.to_string())
        .chain(std::iter::once(format!("--user-agent={}", config.user_agent)))
        .collect()
}

fn launch_config(config: &BrowserConfig) -> Result<LaunchConfig, ScrapeError> {
    let mut builder = LaunchConfig::builder()
        .disable_default_args()
        .window_size(config.window_width, config.window_height)
        .viewport(Viewport {
            width: config.window_width,
            height: config.window_height,
            device_scale_factor: Some(1.0),
            ..Default::default()
        })
        .no_sandbox()
        .args(launch_args(config));
    if let Some(path) = &config.chrome_executable {
        builder = builder.chrome_executable(path);
    }
    builder.build().map_err(ScrapeError::BrowserUnavailable)
}

/// The process-control surface teardown needs from a browser.
trait BrowserProcess {
    async fn close(&mut self) -> Result<(), String>;
    async fn wait(&mut self) -> Result<(), String>;
    async fn kill(&mut self) -> Result<(), String>;
}

impl BrowserProcess for Browser {
    async fn close(&mut self) -> Result<(), String> {
        Browser::close(self).await.map(|_| ()).map_err(|e| e.to_string())
    }

    async fn wait(&mut self) -> Result<(), String> {
        Browser::wait(self).await.map(|_| ()).map_err(|e| e.to_string())
    }

    async fn kill(&mut self) -> Result<(), String> {
        match Browser::kill(self).await {
            Some(result) => result.map_err(|e| e.to_string()),
            None => Ok(()),
        }
    }
}

/// Ask the browser to quit and reap it; kill it when either step fails or
/// takes longer than `grace`.
async fn shut_down<P: BrowserProcess>(process: &mut P, grace: Duration) {
    let closed = match timeout(grace, process.close()).await {
        Ok(Ok(())) => true,
        Ok(Err(e)) => {
            warn!(error = %e, "Browser did not close cleanly; killing");
            false
        }
        Err(_) => {
            warn!(grace_secs = grace.as_secs(), "Browser close timed out; killing");
            false
        }
    };

    if closed {
        match timeout(grace, process.wait()).await {
            Ok(Ok(())) => {
                debug!("Browser session closed");
                return;
            }
            Ok(Err(e)) => warn!(error = %e, "Browser process could not be reaped; killing"),
            Err(_) => warn!(grace_secs = grace.as_secs(), "Browser exit timed out; killing"),
        }
    }

    match timeout(grace, process.kill()).await {
        Ok(Ok(())) => debug!("Browser process killed"),
        Ok(Err(e)) => warn!(error = %e, "Browser process could not be killed"),
        Err(_) => warn!("Browser kill timed out"),
    }
}

/// A launched browser plus the task driving its CDP connection.
struct BrowserSession {
    browser: Browser,
    handler: JoinHandle<()>,
}

impl BrowserSession {
    async fn launch(config: &BrowserConfig) -> Result<Self, ScrapeError> {
        let (browser, mut handler) = Browser::launch(launch_config(config)?)
            .await
            .map_err(|e| ScrapeError::BrowserUnavailable(e.to_string()))?;
        let handler = tokio::spawn(async move { while handler.next().await.is_some() {} });
        debug!("Browser session launched");

        Ok(Self { browser, handler })
    }

    /// Quit the browser and make sure its process is gone.
    async fn close(mut self) {
        shut_down(&mut self.browser, CLOSE_GRACE).await;
    }
}

impl Drop for BrowserSession {
    fn drop(&mut self) {
        self.handler.abort();
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::scrapers::selectors::content_rules;

    fn unavailable_browser() -> BrowserConfig {
        BrowserConfig {
            chrome_executable: Some("/nonexistent/chromium-for-tests".into()),
            ..BrowserConfig::default()
        }
    }

    #[test]
    fn test_scripts_embed_escaped_selectors() {
        let script = texts_script(&Selector::Css("[class*=\"article\"]"));
        assert!(script.contains(r#"__query('css', "[class*=\"article\"]")"#));

        let script = links_script(&Selector::XPath("//ul/li//strong/a"));
        assert!(script.contains(r#"__query('xpath', "//ul/li//strong/a")"#));
        assert!(script.contains(".slice(0, 20)"));
        assert!(script.contains(r#"["h3","strong"]"#));
    }

    #[test]
    fn test_launch_args_disable_automation() {
        let config = BrowserConfig::default();
        let args = launch_args(&config);
        assert!(args.iter().any(|a| a == "--disable-blink-features=AutomationControlled"));
        assert!(!args.iter().any(|a| a == "--enable-automation"));
        assert_eq!(args.iter().filter(|a| a.starts_with("--lang=")).count(), 1);
        assert!(args.contains(&"--lang=ko-KR".to_string()));
        assert!(args.contains(&format!("--user-agent={}", config.user_agent)));
    }

    #[derive(Default)]
    struct FakeProcess {
        close_fails: bool,
        close_hangs: bool,
        steps: Vec<&'static str>,
    }

    impl BrowserProcess for FakeProcess {
        async fn close(&mut self) -> Result<(), String> {
            self.steps.push("close");
            if self.close_hangs {
                futures::future::pending::<()>().await;
            }
            if self.close_fails {
                return Err("Browser.close: connection reset".into());
            }
            Ok(())
        }

        async fn wait(&mut self) -> Result<(), String> {
            self.steps.push("wait");
            Ok(())
        }

        async fn kill(&mut self) -> Result<(), String> {
            self.steps.push("kill");
            Ok(())
        }
    }

    #[tokio::test]
    async fn test_clean_close_waits_without_killing() {
        let mut process = FakeProcess::default();
        shut_down(&mut process, Duration::from_millis(200)).await;
        assert_eq!(process.steps, ["close", "wait"]);
    }

    #[tokio::test]
    async fn test_failed_close_kills_instead_of_waiting() {
        let mut process = FakeProcess {
            close_fails: true,
            ..FakeProcess::default()
        };
        shut_down(&mut process, Duration::from_millis(200)).await;
        assert_eq!(process.steps, ["close", "kill"]);
    }

    #[tokio::test]
    async fn test_hung_close_is_bounded_and_killed() {
        let mut process = FakeProcess {
            close_hangs: true,
            ..FakeProcess::default()
        };
        let started = std::time::Instant::now();
        shut_down(&mut process, Duration::from_millis(50)).await;
        assert!(started.elapsed() < Duration::from_secs(5));
        assert_eq!(process.steps, ["close", "kill"]);
    }

    #[tokio::test]
    async fn test_missing_browser_is_reported_not_panicked() {
        let fetcher = DynamicFetcher::new(&unavailable_browser());
        let result = fetcher
            .fetch_content("https://example.com/article", &content_rules(None))
            .await;
        assert!(matches!(result, Err(ScrapeError::BrowserUnavailable(_))));
    }

    #[tokio::test]
    async fn test_missing_browser_fails_listing() {
        let fetcher = DynamicFetcher::new(&unavailable_browser());
        let source = Source {
            name: "연합뉴스".into(),
            category: "경제".into(),
            base_url: "https://www.yna.co.kr".into(),
            listing_url: "https://www.yna.co.kr/economy/all".into(),
        };
        let result = fetcher.fetch_listing(&source, &[Selector::Css("article a")]).await;
        assert!(matches!(result, Err(ScrapeError::BrowserUnavailable(_))));
    }
}
