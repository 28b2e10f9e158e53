//! Listing scraper: article candidates for a (category, source) selection.
//!
//! Listings always produce something to show. A missing registry entry, a
//! registry failure, or two failed tiers all degrade to the placeholder
//! listing for the category instead of an error.

use super::selectors::{MAX_CANDIDATES, SiteTemplate, dynamic_listing_rules, static_listing_rules};
use super::{Attempt, NewsScraper, first_found};
use crate::error::ScrapeError;
use crate::models::{ExtractionMethod, ListingCandidate, Source, sample_listing};
use futures::FutureExt;
use itertools::Itertools;
use tracing::{info, instrument, warn};

fn non_empty(
    result: Result<Vec<ListingCandidate>, ScrapeError>,
) -> Result<Option<Vec<ListingCandidate>>, ScrapeError> {
    result.map(|candidates| (!candidates.is_empty()).then_some(candidates))
}

impl NewsScraper {
    /// List article candidates for `category`.
    ///
    /// With `source_name`, only the `(source_name, category)` registry entry is
    /// scraped; without it, every source registered for the category is
    /// scraped in turn. A failing source never stops the others. The combined
    /// result stays unique by URL and capped at fifteen entries.
    ///
    /// # Returns
    ///
    /// The scraped candidates, or [`sample_listing`] when there is no matching
    /// source or nothing could be scraped.
    #[instrument(level = "info", skip(self))]
    pub async fn list_articles(
        &self,
        category: &str,
        source_name: Option<&str>,
    ) -> Vec<ListingCandidate> {
        let sources = match source_name {
            Some(name) => self
                .registry
                .get_source(name, category)
                .await
                .map(|found| found.into_iter().collect::<Vec<_>>()),
            None => self.registry.get_sources(Some(category)).await,
        };

        let sources = match sources {
            Ok(sources) if !sources.is_empty() => sources,
            Ok(_) => {
                info!("No registered source; serving sample listing");
                return sample_listing(category);
            }
            Err(e) => {
                warn!(error = %e, "Registry lookup failed; serving sample listing");
                return sample_listing(category);
            }
        };

        let mut collected = Vec::new();
        for source in &sources {
            let candidates = self.scrape_source(source).await;
            info!(source = %source.name, count = candidates.len(), "Source scraped");
            collected.extend(candidates);
        }

        let collected: Vec<ListingCandidate> = collected
            .into_iter()
            .unique_by(|c| c.url.clone())
            .take(MAX_CANDIDATES)
            .collect();

        if collected.is_empty() {
            warn!("Every source came back empty; serving sample listing");
            return sample_listing(category);
        }
        collected
    }

    /// Scrape one source's listing page with the static tier, then the
    /// dynamic tier. Returns an empty list when both come back empty.
    #[instrument(level = "info", skip_all, fields(source = %source.name, category = %source.category))]
    pub async fn scrape_source(&self, source: &Source) -> Vec<ListingCandidate> {
        let template = SiteTemplate::from_source_name(&source.name);
        let static_rules = static_listing_rules(template);
        let dynamic_rules = dynamic_listing_rules(template);

        let attempts: Vec<Attempt<'_, Vec<ListingCandidate>>> = vec![
            (
                ExtractionMethod::Static,
                self.static_tier
                    .fetch_listing(source, &static_rules)
                    .map(non_empty)
                    .boxed_local(),
            ),
            (
                ExtractionMethod::Dynamic,
                self.dynamic_tier
                    .fetch_listing(source, &dynamic_rules)
                    .map(non_empty)
                    .boxed_local(),
            ),
        ];

        first_found(&source.listing_url, attempts)
            .await
            .unwrap_or_default()
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::config::AppConfig;
    use crate::storage::Registry;
    use std::collections::HashSet;

    async fn scraper_with(dir: &tempfile::TempDir, sources: &[Source]) -> NewsScraper {
        let registry = Registry::new(dir.path().join("news.db"));
        for source in sources {
            registry.add_source(source).await.unwrap();
        }
        let mut config = AppConfig::default();
        config.browser.chrome_executable = Some("/nonexistent/chromium-for-tests".into());
        config.static_fetch.timeout_secs = 5;
        NewsScraper::new(&config, registry).unwrap()
    }

    fn source(name: &str, category: &str, server_url: &str, path: &str) -> Source {
        Source {
            name: name.into(),
            category: category.into(),
            base_url: server_url.into(),
            listing_url: format!("{server_url}{path}"),
        }
    }

    const CHOSUN_POLITICS: &str = r#"<html><body>
        <header><a href="/">홈</a><a href="/login">로그인</a></header>
        <section>
          <div class="story-item"><a href="/politics/2025/10/14/AAA/">여야, 내년도 예산안 심사 착수</a></div>
          <div class="story-item"><a href="/politics/2025/10/14/BBB/">국정감사 첫날부터 공방 이어져</a></div>
          <div class="story-item"><a href="/politics/2025/10/14/CCC/">대통령실, 개각 발표 예정이라고 밝혀</a></div>
        </section>
    </body></html>"#;

    #[tokio::test]
    async fn test_story_items_become_candidates() {
        let mut server = mockito::Server::new_async().await;
        server
            .mock("GET", "/politics/")
            .with_status(200)
            .with_header("content-type", "text/html; charset=utf-8")
            .with_body(CHOSUN_POLITICS)
            .create_async()
            .await;

        let dir = tempfile::tempdir().unwrap();
        let chosun = source("조선일보", "정치", &server.url(), "/politics/");
        let scraper = scraper_with(&dir, &[chosun]).await;

        let candidates = scraper.list_articles("정치", Some("조선일보")).await;
        assert_eq!(candidates.len(), 3);
        for candidate in &candidates {
            assert_eq!(candidate.category, "정치");
            assert_eq!(candidate.source_name, "조선일보");
            assert!(candidate.url.starts_with(&server.url()));
            assert!(candidate.url.contains("/politics/2025/10/14/"));
        }
        assert_eq!(candidates[1].title, "국정감사 첫날부터 공방 이어져");
    }

    #[tokio::test]
    async fn test_unregistered_source_serves_samples() {
        let dir = tempfile::tempdir().unwrap();
        let scraper = scraper_with(&dir, &[]).await;

        let politics = scraper.list_articles("정치", Some("조선일보")).await;
        assert_eq!(politics, sample_listing("정치"));

        let sports = scraper.list_articles("스포츠", None).await;
        assert_eq!(sports.len(), 5);
        assert_eq!(sports[0].title, "스포츠 관련 뉴스 1");
    }

    #[tokio::test]
    async fn test_both_tiers_failing_serves_samples() {
        let mut server = mockito::Server::new_async().await;
        server
            .mock("GET", "/economy/")
            .with_status(503)
            .create_async()
            .await;

        let dir = tempfile::tempdir().unwrap();
        let broken = source("한국일보", "경제", &server.url(), "/economy/");
        let scraper = scraper_with(&dir, &[broken]).await;

        assert_eq!(scraper.list_articles("경제", None).await, sample_listing("경제"));
    }

    #[tokio::test]
    async fn test_failing_source_does_not_abort_others() {
        let mut server = mockito::Server::new_async().await;
        server
            .mock("GET", "/broken/")
            .with_status(500)
            .create_async()
            .await;
        server
            .mock("GET", "/politics/")
            .with_status(200)
            .with_body(CHOSUN_POLITICS)
            .create_async()
            .await;

        let dir = tempfile::tempdir().unwrap();
        let sources = [
            source("한국일보", "정치", &server.url(), "/broken/"),
            source("조선일보", "정치", &server.url(), "/politics/"),
        ];
        let scraper = scraper_with(&dir, &sources).await;

        let candidates = scraper.list_articles("정치", None).await;
        assert_eq!(candidates.len(), 3);
        assert!(candidates.iter().all(|c| c.source_name == "조선일보"));
    }

    #[tokio::test]
    async fn test_combined_listing_is_unique_and_capped() {
        let mut server = mockito::Server::new_async().await;
        let mut page = String::from("<html><body>");
        for i in 0..12 {
            page.push_str(&format!("<a href=\"/news/{i}\">공통 기사 제목 번호 {i}</a>"));
        }
        page.push_str("</body></html>");
        for path in ["/a/", "/b/"] {
            server
                .mock("GET", path)
                .with_status(200)
                .with_body(page.clone())
                .create_async()
                .await;
        }

        let dir = tempfile::tempdir().unwrap();
        let sources = [
            source("경향신문", "사회", &server.url(), "/a/"),
            source("서울신문", "사회", &server.url(), "/b/"),
        ];
        let scraper = scraper_with(&dir, &sources).await;

        let candidates = scraper.list_articles("사회", None).await;
        assert!(candidates.len() <= MAX_CANDIDATES);
        assert_eq!(candidates.len(), 12);
        let urls: HashSet<&str> = candidates.iter().map(|c| c.url.as_str()).collect();
        assert_eq!(urls.len(), candidates.len());
    }
}
