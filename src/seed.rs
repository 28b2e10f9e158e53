//! Initial load of the source registry from a media-company JSON file.
//!
//! # File Format
//!
//! ```json
//! {
//!   "언론사": [
//!     { "name": "연합뉴스", "categories": { "정치": "https://www.yna.co.kr/politics/all" } }
//!   ]
//! }
//! ```
//!
//! Each `(name, category)` pair is upserted; `base_url` is the origin of the
//! category's listing URL. A malformed pair is logged and skipped, it does not
//! abort the rest of the file.

use crate::error::SeedError;
use crate::models::Source;
use crate::storage::Registry;
use serde::Deserialize;
use std::collections::BTreeMap;
use std::path::Path;
use tokio::fs;
use tracing::{info, instrument, warn};

#[derive(Debug, Deserialize)]
pub struct MediaCatalog {
    #[serde(rename = "언론사", default)]
    pub companies: Vec<MediaCompany>,
}

#[derive(Debug, Deserialize)]
pub struct MediaCompany {
    pub name: String,
    /// Category name to listing-page URL.
    #[serde(default)]
    pub categories: BTreeMap<String, String>,
}

impl MediaCatalog {
    pub fn from_json(raw: &str) -> Result<Self, SeedError> {
        Ok(serde_json::from_str(raw)?)
    }

    /// Registry records described by the catalog, skipping invalid entries.
    pub fn sources(&self) -> Vec<Source> {
        self.companies
            .iter()
            .flat_map(|company| {
                company.categories.iter().filter_map(|(category, url)| {
                    Source::new(&company.name, category, url, None)
                        .inspect_err(|e| {
                            warn!(name = %company.name, %category, error = %e, "Skipping seed entry")
                        })
                        .ok()
                })
            })
            .collect()
    }
}

/// Upsert every entry of `catalog` into `registry`.
///
/// # Returns
///
/// Number of `(name, category)` pairs written.
///
/// # Errors
///
/// The first database error; pairs before it stay written.
pub async fn apply(catalog: &MediaCatalog, registry: &Registry) -> Result<usize, SeedError> {
    let sources = catalog.sources();
    for source in &sources {
        registry.add_source(source).await?;
    }
    info!(count = sources.len(), "Seed entries applied");
    Ok(sources.len())
}

/// Read the catalog at `path` and load it into `registry`.
#[instrument(level = "info", skip(registry), fields(path = %path.display()))]
pub async fn seed_from_file(path: &Path, registry: &Registry) -> Result<usize, SeedError> {
    let raw = fs::read_to_string(path).await?;
    let catalog = MediaCatalog::from_json(&raw)?;
    apply(&catalog, registry).await
}

#[cfg(test)]
mod tests {
    use super::*;
    use tempfile::tempdir;

    const CATALOG: &str = r#"{
        "언론사": [
            {
                "name": "연합뉴스",
                "categories": {
                    "정치": "https://www.yna.co.kr/politics/all",
                    "경제": "https://www.yna.co.kr/economy/all"
                }
            },
            {
                "name": "조선일보",
                "categories": {
                    "정치": "https://www.chosun.com/politics/",
                    "사회": "not a url"
                }
            }
        ]
    }"#;

    #[test]
    fn test_catalog_sources_skip_invalid_urls() {
        let catalog = MediaCatalog::from_json(CATALOG).unwrap();
        let sources = catalog.sources();
        assert_eq!(sources.len(), 3);
        assert!(sources.iter().all(|s| s.category != "사회"));
        let chosun = sources.iter().find(|s| s.name == "조선일보").unwrap();
        assert_eq!(chosun.base_url, "https://www.chosun.com");
    }

    #[test]
    fn test_missing_key_is_empty_catalog() {
        let catalog = MediaCatalog::from_json("{}").unwrap();
        assert!(catalog.sources().is_empty());
        assert!(matches!(
            MediaCatalog::from_json("[1, 2"),
            Err(SeedError::Json(_))
        ));
    }

    #[tokio::test]
    async fn test_seed_from_file_is_repeatable() {
        let dir = tempdir().unwrap();
        let file = dir.path().join("mediacompany.json");
        std::fs::write(&file, CATALOG).unwrap();
        let registry = Registry::new(dir.path().join("news.db"));

        assert_eq!(seed_from_file(&file, &registry).await.unwrap(), 3);
        assert_eq!(seed_from_file(&file, &registry).await.unwrap(), 3);
        assert_eq!(registry.get_sources(None).await.unwrap().len(), 3);
        assert_eq!(
            registry.get_sources(Some("정치")).await.unwrap().len(),
            2
        );
    }

    #[tokio::test]
    async fn test_missing_file_is_io_error() {
        let dir = tempdir().unwrap();
        let registry = Registry::new(dir.path().join("news.db"));
        let result = seed_from_file(&dir.path().join("absent.json"), &registry).await;
        assert!(matches!(result, Err(SeedError::Io(_))));
    }
}
