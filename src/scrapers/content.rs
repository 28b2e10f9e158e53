//! Content scraper: full body text and a best-effort title for one article.

use super::selectors::{SiteTemplate, content_rules};
use super::{Attempt, NewsScraper, first_found};
use crate::models::{ExtractedContent, ExtractionMethod};
use futures::FutureExt;
use tracing::{info, instrument, warn};

impl NewsScraper {
    /// Extract the body of the article at `url`.
    ///
    /// Site rules are picked from the URL's host when it belongs to one of the
    /// known templates; otherwise only the generic rules run. The static tier
    /// is tried first, then the dynamic tier with the same rules.
    ///
    /// # Returns
    ///
    /// `None` when both tiers missed or failed. The caller reports this as
    /// "content unavailable"; unlike listings there is no placeholder.
    #[instrument(level = "info", skip(self))]
    pub async fn extract_content(&self, url: &str) -> Option<ExtractedContent> {
        let template = SiteTemplate::from_url(url);
        let rules = content_rules(template);
        info!(
            template = template.map(SiteTemplate::source_name),
            rules = rules.len(),
            "Extracting article content"
        );

        let attempts: Vec<Attempt<'_, ExtractedContent>> = vec![
            (
                ExtractionMethod::Static,
                self.static_tier.fetch_content(url, &rules).boxed_local(),
            ),
            (
                ExtractionMethod::Dynamic,
                self.dynamic_tier.fetch_content(url, &rules).boxed_local(),
            ),
        ];

        let content = first_found(url, attempts).await;
        match &content {
            Some(found) => info!(
                method = %found.extraction_method,
                chars = found.body.chars().count(),
                title = %found.title,
                "Article content extracted"
            ),
            None => warn!("Both tiers exhausted; content unavailable"),
        }
        content
    }
}
