//! Caller flow for one selected article: extract, summarize, persist.
//!
//! | Step | Outcome on failure |
//! |------|--------------------|
//! | URL already stored | stored record returned, nothing recomputed |
//! | Content scraper | [`PipelineError::ContentUnavailable`] |
//! | Summarizer | [`PipelineError::Summarizer`], nothing written |
//! | Insert | [`PipelineError::Store`] |

use crate::api::Summarizer;
use crate::error::{PipelineError, StoreError};
use crate::models::{NewArticle, PersistedArticle};
use crate::scrapers::NewsScraper;
use crate::storage::ArticleStore;
use tracing::{info, instrument, warn};

/// Wires the content scraper, a summarizer and the article store together.
#[derive(Debug)]
pub struct Pipeline<S> {
    scraper: NewsScraper,
    store: ArticleStore,
    summarizer: S,
}

impl<S: Summarizer> Pipeline<S> {
    pub fn new(scraper: NewsScraper, store: ArticleStore, summarizer: S) -> Self {
        Self {
            scraper,
            store,
            summarizer,
        }
    }

    /// Summarize and store the article at `url`, unless it is already stored.
    ///
    /// # Arguments
    ///
    /// * `title` - Title shown in the listing; the extracted title is used when
    ///   this is `None` or blank.
    ///
    /// # Returns
    ///
    /// The stored record, either pre-existing or freshly inserted.
    #[instrument(level = "info", skip(self, title))]
    pub async fn process_article(
        &self,
        url: &str,
        title: Option<&str>,
        category: &str,
        source_name: &str,
    ) -> Result<PersistedArticle, PipelineError> {
        if self.store.exists_by_url(url).await? {
            if let Some(existing) = self.store.get_by_url(url).await? {
                info!(id = existing.id, "Article already stored; skipping");
                return Ok(existing);
            }
        }

        let Some(content) = self.scraper.extract_content(url).await else {
            warn!("Content unavailable");
            return Err(PipelineError::ContentUnavailable {
                url: url.to_string(),
            });
        };

        let title = title
            .map(str::trim)
            .filter(|t| !t.is_empty())
            .unwrap_or(content.title.as_str());

        let summary = self
            .summarizer
            .summarize(title, &content.body)
            .await
            .map_err(|e| PipelineError::Summarizer(e.to_string()))?;

        let id = self
            .store
            .insert(&NewArticle {
                title,
                url,
                category,
                source_name,
                summary: &summary,
                content: Some(&content.body),
            })
            .await?;

        info!(id, method = %content.extraction_method, "Article summarized and stored");
        self.store
            .get_by_url(url)
            .await?
            .ok_or_else(|| StoreError::Data(format!("article {id} vanished after insert")).into())
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::config::AppConfig;
    use crate::storage::Registry;
    use std::cell::Cell;
    use std::error::Error;

    #[derive(Debug, Default)]
    struct CountingSummarizer {
        calls: Cell<usize>,
        fail: bool,
    }

    impl Summarizer for CountingSummarizer {
        async fn summarize(&self, title: &str, body: &str) -> Result<String, Box<dyn Error>> {
            self.calls.set(self.calls.get() + 1);
            if self.fail {
                return Err("model overloaded".into());
            }
            Ok(format!("{title} 요약 ({}자)", body.chars().count()))
        }
    }

    fn pipeline(dir: &tempfile::TempDir, fail: bool) -> Pipeline<CountingSummarizer> {
        let db = dir.path().join("news.db");
        let mut config = AppConfig::default();
        config.browser.chrome_executable = Some("/nonexistent/chromium-for-tests".into());
        config.static_fetch.timeout_secs = 5;
        let scraper = NewsScraper::new(&config, Registry::new(&db)).unwrap();
        Pipeline::new(
            scraper,
            ArticleStore::new(&db),
            CountingSummarizer {
                calls: Cell::new(0),
                fail,
            },
        )
    }

    async fn article_server() -> mockito::ServerGuard {
        let mut server = mockito::Server::new_async().await;
        let body = format!(
            "<html><body><h1>기준금리 동결 결정</h1><div class=\"article-body\">{}</div></body></html>",
            "한국은행이 기준금리를 연 3.5%로 동결했다. ".repeat(6)
        );
        server
            .mock("GET", "/view/1")
            .with_status(200)
            .with_body(body)
            .create_async()
            .await;
        server
    }

    #[tokio::test]
    async fn test_article_is_summarized_once() {
        let server = article_server().await;
        let dir = tempfile::tempdir().unwrap();
        let pipeline = pipeline(&dir, false);
        let url = format!("{}/view/1", server.url());

        let first = pipeline
            .process_article(&url, Some("금리 동결"), "경제", "연합뉴스")
            .await
            .unwrap();
        assert_eq!(first.title, "금리 동결");
        assert_eq!(first.category, "경제");
        assert!(first.summary.starts_with("금리 동결 요약"));
        assert!(first.content.as_deref().unwrap().starts_with("한국은행이"));

        let second = pipeline
            .process_article(&url, Some("금리 동결"), "경제", "연합뉴스")
            .await
            .unwrap();
        assert_eq!(second.id, first.id);
        assert_eq!(pipeline.summarizer.calls.get(), 1);
    }

    #[tokio::test]
    async fn test_extracted_title_used_when_none_given() {
        let server = article_server().await;
        let dir = tempfile::tempdir().unwrap();
        let url = format!("{}/view/1", server.url());

        let stored = pipeline(&dir, false)
            .process_article(&url, None, "경제", "연합뉴스")
            .await
            .unwrap();
        assert_eq!(stored.title, "기준금리 동결 결정");
    }

    #[tokio::test]
    async fn test_summarizer_failure_writes_nothing() {
        let server = article_server().await;
        let dir = tempfile::tempdir().unwrap();
        let pipeline = pipeline(&dir, true);
        let url = format!("{}/view/1", server.url());
        assert!(!pipeline.store.exists_by_url(&url).await.unwrap());

        let result = pipeline
            .process_article(&url, Some("금리 동결"), "경제", "연합뉴스")
            .await;
        assert!(matches!(result, Err(PipelineError::Summarizer(_))));
        assert_eq!(pipeline.summarizer.calls.get(), 1);
        assert!(!pipeline.store.exists_by_url(&url).await.unwrap());
        assert!(pipeline.store.list(None).await.unwrap().is_empty());
    }

    #[tokio::test]
    async fn test_stored_article_survives_failing_summarizer() {
        let dir = tempfile::tempdir().unwrap();
        let pipeline = pipeline(&dir, true);
        let url = "https://www.yna.co.kr/view/AKR20251014000100003";
        let id = pipeline
            .store
            .insert(&NewArticle {
                title: "기준금리 동결 결정",
                url,
                category: "경제",
                source_name: "연합뉴스",
                summary: "한국은행이 금리를 동결했다.",
                content: None,
            })
            .await
            .unwrap();
        let before = pipeline.store.get_by_url(url).await.unwrap().unwrap();

        let stored = pipeline
            .process_article(url, Some("다른 제목"), "경제", "연합뉴스")
            .await
            .unwrap();
        assert_eq!(stored, before);
        assert_eq!(stored.id, id);
        assert_eq!(pipeline.summarizer.calls.get(), 0);
        assert!(pipeline.store.exists_by_url(url).await.unwrap());
        assert_eq!(pipeline.store.list(None).await.unwrap().len(), 1);
    }

    #[tokio::test]
    async fn test_unavailable_content_is_reported() {
        let mut server = mockito::Server::new_async().await;
        server
            .mock("GET", "/gone")
            .with_status(404)
            .create_async()
            .await;
        let dir = tempfile::tempdir().unwrap();
        let pipeline = pipeline(&dir, false);
        let url = format!("{}/gone", server.url());

        let result = pipeline.process_article(&url, None, "사회", "한국일보").await;
        assert!(matches!(result, Err(PipelineError::ContentUnavailable { .. })));
        assert_eq!(pipeline.summarizer.calls.get(), 0);
        assert!(pipeline.store.list(None).await.unwrap().is_empty());
    }
}
