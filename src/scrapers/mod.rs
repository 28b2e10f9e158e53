//! News scraping core: listing pages and article bodies.
//!
//! Every scrape follows the same two-tier strategy:
//!
//! 1. **Static**: HTTP GET + `scraper` ([`static_fetch`])
//! 2. **Dynamic**: headless Chromium render ([`dynamic_fetch`])
//!
//! Tiers are attempts in an ordered pipeline. Each returns found, not found
//! or an error; the orchestrator logs the outcome and moves to the next tier
//! until one reports found. Errors never escape a tier.
//!
//! # Submodules
//!
//! | Module | Role |
//! |--------|------|
//! | [`normalize`] | Text cleanup for article bodies |
//! | [`selectors`] | Selector descriptors and per-site rule tables |
//! | [`cascade`] | Length gate, title acceptance, listing harvest policy |
//! | [`static_fetch`] | Static tier |
//! | [`dynamic_fetch`] | Dynamic tier |
//! | [`listing`] | Listing scraper (`list_articles`) |
//! | [`content`] | Content scraper (`extract_content`) |

pub mod cascade;
pub mod content;
pub mod dynamic_fetch;
pub mod listing;
pub mod normalize;
pub mod selectors;
pub mod static_fetch;

use crate::config::AppConfig;
use crate::error::ScrapeError;
use crate::models::ExtractionMethod;
use crate::storage::Registry;
use dynamic_fetch::DynamicFetcher;
use futures::future::LocalBoxFuture;
use static_fetch::StaticFetcher;
use std::error::Error;
use tracing::{info, warn};

/// One tier attempt: which tier it is and the (not yet started) work.
type Attempt<'a, T> = (ExtractionMethod, LocalBoxFuture<'a, Result<Option<T>, ScrapeError>>);

/// Entry point for listing and content scrapes.
///
/// Holds no connection state: the registry is opened per call.
#[derive(Debug, Clone)]
pub struct NewsScraper {
    static_tier: StaticFetcher,
    dynamic_tier: DynamicFetcher,
    registry: Registry,
}

impl NewsScraper {
    /// Build both tiers from configuration.
    ///
    /// # Errors
    ///
    /// Returns an error if the HTTP client cannot be constructed.
    pub fn new(config: &AppConfig, registry: Registry) -> Result<Self, Box<dyn Error>> {
        Ok(Self {
            static_tier: StaticFetcher::new(&config.static_fetch)?,
            dynamic_tier: DynamicFetcher::new(&config.browser),
            registry,
        })
    }
}

/// Await attempts in order until one reports found.
///
/// Futures are lazy, so a later tier does no work unless every earlier tier
/// missed or failed.
async fn first_found<T>(target: &str, attempts: Vec<Attempt<'_, T>>) -> Option<T> {
    for (method, attempt) in attempts {
        match attempt.await {
            Ok(Some(found)) => {
                info!(%target, %method, "Tier succeeded");
                return Some(found);
            }
            Ok(None) => info!(%target, %method, "Tier found nothing; falling through"),
            Err(e) => warn!(%target, %method, error = %e, "Tier failed; falling through"),
        }
    }
    None
}
