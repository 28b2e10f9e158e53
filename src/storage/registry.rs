//! Source registry: the catalog of listing pages per (source, category).

use super::{connect, now_timestamp};
use crate::error::StoreError;
use crate::models::Source;
use libsql::{Row, params};
use std::path::PathBuf;
use tracing::{info, instrument};
use url::Url;

/// Handle on the `sources` table.
#[derive(Debug, Clone)]
pub struct Registry {
    path: PathBuf,
}

/// Origin (`scheme://host[:port]`) of an absolute listing URL.
///
/// # Errors
///
/// [`StoreError::Data`] if `listing_url` is not an absolute http(s) URL.
pub fn derive_base_url(listing_url: &str) -> Result<String, StoreError> {
    let parsed = Url::parse(listing_url)
        .map_err(|e| StoreError::Data(format!("listing url {listing_url:?}: {e}")))?;
    if !matches!(parsed.scheme(), "http" | "https") || parsed.host_str().is_none() {
        return Err(StoreError::Data(format!(
            "listing url {listing_url:?} is not an absolute http(s) url"
        )));
    }
    Ok(parsed.origin().ascii_serialization())
}

impl Source {
    /// Build a source, deriving `base_url` from the listing URL when absent.
    ///
    /// # Errors
    ///
    /// [`StoreError::Data`] for an empty name or category, or a listing URL
    /// that is not absolute.
    pub fn new(
        name: &str,
        category: &str,
        listing_url: &str,
        base_url: Option<&str>,
    ) -> Result<Self, StoreError> {
        let name = name.trim();
        let category = category.trim();
        if name.is_empty() || category.is_empty() {
            return Err(StoreError::Data(
                "source name and category must not be empty".into(),
            ));
        }

        let derived = derive_base_url(listing_url)?;
        // An explicit base keeps its path and trailing slash: relative hrefs
        // resolve against it as a directory.
        let base_url = base_url
            .map(str::trim)
            .filter(|b| !b.is_empty())
            .map(str::to_string)
            .unwrap_or(derived);

        Ok(Self {
            name: name.to_string(),
            category: category.to_string(),
            base_url,
            listing_url: listing_url.to_string(),
        })
    }
}

fn row_to_source(row: &Row) -> Result<Source, StoreError> {
    Ok(Source {
        name: row.get(0)?,
        category: row.get(1)?,
        base_url: row.get(2)?,
        listing_url: row.get(3)?,
    })
}

impl Registry {
    pub fn new(path: impl Into<PathBuf>) -> Self {
        Self { path: path.into() }
    }

    /// Insert a source, or update the URLs of an existing `(name, category)`.
    #[instrument(level = "info", skip_all, fields(name = %source.name, category = %source.category))]
    pub async fn add_source(&self, source: &Source) -> Result<(), StoreError> {
        let conn = connect(&self.path).await?;
        let now = now_timestamp();
        conn.execute(
            "INSERT INTO sources (name, category, base_url, listing_url, created_at, updated_at)
             VALUES (?1, ?2, ?3, ?4, ?5, ?5)
             ON CONFLICT(name, category) DO UPDATE SET
             base_url = excluded.base_url,
             listing_url = excluded.listing_url,
             updated_at = excluded.updated_at",
            params![
                source.name.as_str(),
                source.category.as_str(),
                source.base_url.as_str(),
                source.listing_url.as_str(),
                now,
            ],
        )
        .await?;
        info!(url = %source.listing_url, "Source registered");
        Ok(())
    }

    /// All sources, or only those of `category`, ordered by name.
    #[instrument(level = "debug", skip(self))]
    pub async fn get_sources(&self, category: Option<&str>) -> Result<Vec<Source>, StoreError> {
        let conn = connect(&self.path).await?;
        let mut rows = match category {
            Some(category) => {
                conn.query(
                    "SELECT name, category, base_url, listing_url FROM sources
                     WHERE category = ?1 ORDER BY name, id",
                    params![category],
                )
                .await?
            }
            None => {
                conn.query(
                    "SELECT name, category, base_url, listing_url FROM sources
                     ORDER BY category, name, id",
                    params![],
                )
                .await?
            }
        };

        let mut sources = Vec::new();
        while let Some(row) = rows.next().await? {
            sources.push(row_to_source(&row)?);
        }
        Ok(sources)
    }

    /// The source registered under `(name, category)`, if any.
    #[instrument(level = "debug", skip(self))]
    pub async fn get_source(&self, name: &str, category: &str) -> Result<Option<Source>, StoreError> {
        let conn = connect(&self.path).await?;
        let mut rows = conn
            .query(
                "SELECT name, category, base_url, listing_url FROM sources
                 WHERE name = ?1 AND category = ?2",
                params![name, category],
            )
            .await?;

        match rows.next().await? {
            Some(row) => Ok(Some(row_to_source(&row)?)),
            None => Ok(None),
        }
    }

    /// Remove `(name, category)`. Returns whether a row was deleted.
    #[instrument(level = "info", skip(self))]
    pub async fn delete_source(&self, name: &str, category: &str) -> Result<bool, StoreError> {
        let conn = connect(&self.path).await?;
        let deleted = conn
            .execute(
                "DELETE FROM sources WHERE name = ?1 AND category = ?2",
                params![name, category],
            )
            .await?;
        info!(deleted, "Source removal processed");
        Ok(deleted > 0)
    }

    /// Distinct categories with at least one source, sorted.
    pub async fn categories(&self) -> Result<Vec<String>, StoreError> {
        let conn = connect(&self.path).await?;
        let mut rows = conn
            .query(
                "SELECT DISTINCT category FROM sources ORDER BY category",
                params![],
            )
            .await?;

        let mut categories = Vec::new();
        while let Some(row) = rows.next().await? {
            categories.push(row.get::<String>(0)?);
        }
        Ok(categories)
    }
}
