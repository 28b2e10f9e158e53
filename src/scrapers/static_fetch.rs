//! Static tier: one HTTP GET, parsed with `scraper`.
//!
//! The page is fetched with a desktop browser user agent and a Korean
//! `Accept-Language`, then the selector cascade runs against the parsed
//! markup. Failures are returned to the caller untouched; this tier never
//! retries and never decides about fallback.
//!
//! XPath rules cannot be evaluated against `scraper` documents and are
//! skipped here; they only take effect in the dynamic tier.

use super::cascade::{LinkHarvest, accept_body, accept_title};
use super::selectors::{
    HARVEST_PER_SELECTOR, STATIC_NESTED_TITLE, Selector, TITLE_PLACEHOLDER, title_rules,
};
use crate::config::StaticFetchConfig;
use crate::error::ScrapeError;
use crate::models::{ExtractedContent, ExtractionMethod, ListingCandidate, Source};
use itertools::Itertools;
use reqwest::header::{ACCEPT, ACCEPT_LANGUAGE, HeaderMap, HeaderValue, UPGRADE_INSECURE_REQUESTS};
use scraper::{ElementRef, Html, Selector as CssSelector};
use tracing::{debug, info, instrument, warn};

const ACCEPT_HTML: &str = "text/html,application/xhtml+xml,application/xml;q=0.9,image/webp,*/*;q=0.8";

/// Plain HTTP fetcher for listing pages and article bodies.
#[derive(Debug, Clone)]
pub struct StaticFetcher {
    client: reqwest::Client,
}

impl StaticFetcher {
    /// Build the HTTP client with browser-like default headers.
    ///
    /// # Errors
    ///
    /// Returns an error if the configured user agent or language header is not
    /// a valid header value, or the TLS backend cannot be initialised.
    pub fn new(config: &StaticFetchConfig) -> Result<Self, Box<dyn std::error::Error>> {
        let mut headers = HeaderMap::new();
        headers.insert(ACCEPT, HeaderValue::from_static(ACCEPT_HTML));
        headers.insert(
            ACCEPT_LANGUAGE,
            HeaderValue::from_str(&config.accept_language)?,
        );
        headers.insert(UPGRADE_INSECURE_REQUESTS, HeaderValue::from_static("1"));

        let client = reqwest::Client::builder()
            .user_agent(config.user_agent.as_str())
            .default_headers(headers)
            .timeout(config.timeout())
            .gzip(true)
            .build()?;

        Ok(Self { client })
    }

    /// GET `url` and return the decoded body of a 2xx response.
    async fn get_html(&self, url: &str) -> Result<String, ScrapeError> {
        let target = url::Url::parse(url).map_err(|source| ScrapeError::InvalidUrl {
            url: url.to_string(),
            source,
        })?;
        debug!(%url, "GET");
        let response = self
            .client
            .get(target)
            .send()
            .await
            .map_err(|source| ScrapeError::Network {
                url: url.to_string(),
                source,
            })?;

        let status = response.status();
        if !status.is_success() {
            return Err(ScrapeError::HttpStatus {
                url: url.to_string(),
                status,
            });
        }
        info!(%url, %status, "HTTP response received");

        response.text().await.map_err(|source| ScrapeError::Network {
            url: url.to_string(),
            source,
        })
    }

    /// Fetch an article and run the body-text cascade over it.
    ///
    /// # Returns
    ///
    /// `Ok(Some(_))` with method `static` when a block clears the length gate,
    /// `Ok(None)` when every rule was exhausted.
    ///
    /// # Errors
    ///
    /// [`ScrapeError::Network`] or [`ScrapeError::HttpStatus`] when the page
    /// could not be fetched.
    #[instrument(level = "info", skip_all, fields(%url))]
    pub async fn fetch_content(
        &self,
        url: &str,
        rules: &[Selector],
    ) -> Result<Option<ExtractedContent>, ScrapeError> {
        let html = self.get_html(url).await?;
        Ok(extract_content(url, &html, rules))
    }

    /// Fetch a source's listing page and harvest article links from it.
    #[instrument(level = "info", skip_all, fields(source = %source.name, url = %source.listing_url))]
    pub async fn fetch_listing(
        &self,
        source: &Source,
        rules: &[Selector],
    ) -> Result<Vec<ListingCandidate>, ScrapeError> {
        let html = self.get_html(&source.listing_url).await?;
        Ok(harvest_listing(source, &html, rules))
    }
}

fn compile(selector: &Selector) -> Option<CssSelector> {
    match selector {
        Selector::Css(expr) => match CssSelector::parse(expr) {
            Ok(compiled) => Some(compiled),
            Err(e) => {
                warn!(selector = %expr, error = ?e, "Unparseable CSS selector");
                None
            }
        },
        Selector::XPath(expr) => {
            debug!(selector = %expr, "XPath rule skipped by static tier");
            None
        }
    }
}

/// Text of an element with each text node trimmed and joined by one space.
fn element_text(element: ElementRef<'_>) -> String {
    element
        .text()
        .map(str::trim)
        .filter(|t| !t.is_empty())
        .join(" ")
}

/// Run the body-text cascade over an already fetched page.
///
/// Rules are tried in order and, within a rule, matches in document order;
/// the first block that clears the length gate wins.
pub fn extract_content(url: &str, html: &str, rules: &[Selector]) -> Option<ExtractedContent> {
    let document = Html::parse_document(html);

    for selector in rules {
        let Some(compiled) = compile(selector) else {
            continue;
        };
        let body = document
            .select(&compiled)
            .find_map(|element| accept_body(&element_text(element)));

        if let Some(body) = body {
            info!(selector = %selector.expr(), chars = body.chars().count(), "Article body found");
            return Some(ExtractedContent {
                title: extract_title(&document),
                body,
                url: url.to_string(),
                extraction_method: ExtractionMethod::Static,
            });
        }
    }

    debug!(%url, rules = rules.len(), "No block passed the length gate");
    None
}

/// Best-effort title: first title rule whose first match has enough text.
pub fn extract_title(document: &Html) -> String {
    title_rules()
        .iter()
        .filter_map(compile)
        .find_map(|compiled| {
            document
                .select(&compiled)
                .next()
                .and_then(|element| accept_title(&element_text(element)))
        })
        .unwrap_or_else(|| TITLE_PLACEHOLDER.to_string())
}

/// Harvest listing candidates from an already fetched listing page.
///
/// For each rule in order, up to [`HARVEST_PER_SELECTOR`] anchors are offered
/// to the harvest; the loop stops at the first rule that yields any accepted
/// candidate.
pub fn harvest_listing(source: &Source, html: &str, rules: &[Selector]) -> Vec<ListingCandidate> {
    let document = Html::parse_document(html);
    let nested = CssSelector::parse(STATIC_NESTED_TITLE).ok();
    let mut harvest = LinkHarvest::new(source);

    for selector in rules {
        let Some(compiled) = compile(selector) else {
            continue;
        };
        let anchors: Vec<ElementRef<'_>> = document
            .select(&compiled)
            .take(HARVEST_PER_SELECTOR)
            .collect();
        debug!(selector = %selector.expr(), matched = anchors.len(), "Listing selector evaluated");

        for anchor in anchors {
            let Some(href) = anchor.value().attr("href") else {
                continue;
            };
            let title = element_text(anchor);
            let nested_title = nested
                .as_ref()
                .and_then(|sel| anchor.select(sel).next())
                .map(element_text);
            harvest.offer(href, &title, nested_title.as_deref());
            if harvest.is_full() {
                break;
            }
        }

        if !harvest.is_empty() {
            info!(selector = %selector.expr(), count = harvest.len(), "Listing candidates collected");
            break;
        }
    }

    harvest.into_candidates()
}
