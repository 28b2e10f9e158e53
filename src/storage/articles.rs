//! Article store: summarized articles keyed by URL.
//!
//! Records are only ever inserted. The URL column is indexed but not unique;
//! callers guard against recomputation with [`ArticleStore::exists_by_url`],
//! and [`ArticleStore::get_by_url`] returns the newest record for a URL.

use super::{TIMESTAMP_FORMAT, connect, now_timestamp};
use crate::error::StoreError;
use crate::models::{NewArticle, PersistedArticle};
use chrono::NaiveDateTime;
use libsql::{Row, Value, params};
use std::path::PathBuf;
use tracing::{info, instrument};

const ARTICLE_COLUMNS: &str =
    "id, title, url, category, source_name, summary, content, created_at";

/// Handle on the `articles` table.
#[derive(Debug, Clone)]
pub struct ArticleStore {
    path: PathBuf,
}

fn row_to_article(row: &Row) -> Result<PersistedArticle, StoreError> {
    let content = match row.get_value(6)? {
        Value::Text(text) => Some(text),
        Value::Null => None,
        other => {
            return Err(StoreError::Data(format!(
                "unexpected content column value: {other:?}"
            )));
        }
    };

    let raw_created: String = row.get(7)?;
    let created_at = NaiveDateTime::parse_from_str(&raw_created, TIMESTAMP_FORMAT)
        .map_err(|e| StoreError::Data(format!("created_at {raw_created:?}: {e}")))?;

    Ok(PersistedArticle {
        id: row.get(0)?,
        title: row.get(1)?,
        url: row.get(2)?,
        category: row.get(3)?,
        source_name: row.get(4)?,
        summary: row.get(5)?,
        content,
        created_at,
    })
}

impl ArticleStore {
    pub fn new(path: impl Into<PathBuf>) -> Self {
        Self { path: path.into() }
    }

    /// Whether any record exists for `url`.
    #[instrument(level = "debug", skip(self))]
    pub async fn exists_by_url(&self, url: &str) -> Result<bool, StoreError> {
        let conn = connect(&self.path).await?;
        let mut rows = conn
            .query(
                "SELECT 1 FROM articles WHERE url = ?1 LIMIT 1",
                params![url],
            )
            .await?;
        Ok(rows.next().await?.is_some())
    }

    /// Insert a new record stamped with the current UTC time.
    ///
    /// # Returns
    ///
    /// The row id of the new record.
    #[instrument(level = "info", skip_all, fields(url = %article.url, category = %article.category))]
    pub async fn insert(&self, article: &NewArticle<'_>) -> Result<i64, StoreError> {
        let conn = connect(&self.path).await?;
        let content = article
            .content
            .map(|c| Value::Text(c.to_string()))
            .unwrap_or(Value::Null);

        conn.execute(
            "INSERT INTO articles (title, url, category, source_name, summary, content, created_at)
             VALUES (?1, ?2, ?3, ?4, ?5, ?6, ?7)",
            params![
                article.title,
                article.url,
                article.category,
                article.source_name,
                article.summary,
                content,
                now_timestamp(),
            ],
        )
        .await?;

        let id = conn.last_insert_rowid();
        info!(id, "Article stored");
        Ok(id)
    }

    /// The most recently inserted record for `url`.
    pub async fn get_by_url(&self, url: &str) -> Result<Option<PersistedArticle>, StoreError> {
        let conn = connect(&self.path).await?;
        let mut rows = conn
            .query(
                &format!("SELECT {ARTICLE_COLUMNS} FROM articles WHERE url = ?1 ORDER BY id DESC LIMIT 1"),
                params![url],
            )
            .await?;

        match rows.next().await? {
            Some(row) => Ok(Some(row_to_article(&row)?)),
            None => Ok(None),
        }
    }

    /// Stored articles, newest first, optionally for one category.
    #[instrument(level = "debug", skip(self))]
    pub async fn list(&self, category: Option<&str>) -> Result<Vec<PersistedArticle>, StoreError> {
        let conn = connect(&self.path).await?;
        let mut rows = match category {
            Some(category) => {
                conn.query(
                    &format!(
                        "SELECT {ARTICLE_COLUMNS} FROM articles WHERE category = ?1
                         ORDER BY created_at DESC, id DESC"
                    ),
                    params![category],
                )
                .await?
            }
            None => {
                conn.query(
                    &format!("SELECT {ARTICLE_COLUMNS} FROM articles ORDER BY created_at DESC, id DESC"),
                    params![],
                )
                .await?
            }
        };

        let mut articles = Vec::new();
        while let Some(row) = rows.next().await? {
            articles.push(row_to_article(&row)?);
        }
        Ok(articles)
    }
}
