//! # Local Storage
//!
//! One SQLite file (opened through `libsql`) holds two tables:
//!
//! | Table | Owner | Key |
//! |-------|-------|-----|
//! | `sources` | [`Registry`] | `(name, category)` |
//! | `articles` | [`ArticleStore`] | `url` (looked up, not enforced) |
//!
//! Neither handle keeps a connection open. Each operation opens the file,
//! makes sure the schema exists, runs its statements and drops the
//! connection, so handles are cheap to clone and safe to share.
//!
//! Deleting a source never touches the articles collected from it.

pub mod articles;
pub mod registry;

pub use articles::ArticleStore;
pub use registry::Registry;

use crate::error::StoreError;
use libsql::{Connection, params};
use std::path::Path;
use tracing::debug;

/// Timestamp layout used for `created_at` columns (UTC).
pub(crate) const TIMESTAMP_FORMAT: &str = "%Y-%m-%d %H:%M:%S";

/// Open the database at `path`, creating the file, its parent directory and
/// the schema as needed.
pub(crate) async fn connect(path: &Path) -> Result<Connection, StoreError> {
    if let Some(parent) = path.parent() {
        if !parent.as_os_str().is_empty() {
            tokio::fs::create_dir_all(parent).await?;
        }
    }

    let db = libsql::Builder::new_local(path).build().await?;
    let conn = db.connect()?;
    initialize_schema(&conn).await?;
    debug!(path = %path.display(), "Database connection opened");
    Ok(conn)
}

async fn initialize_schema(conn: &Connection) -> Result<(), StoreError> {
    conn.execute(
        "CREATE TABLE IF NOT EXISTS sources (
            id INTEGER PRIMARY KEY AUTOINCREMENT,
            name TEXT NOT NULL,
            category TEXT NOT NULL,
            base_url TEXT NOT NULL,
            listing_url TEXT NOT NULL,
            created_at TEXT NOT NULL,
            updated_at TEXT NOT NULL,
            UNIQUE(name, category)
        )",
        params![],
    )
    .await?;

    conn.execute(
        "CREATE TABLE IF NOT EXISTS articles (
            id INTEGER PRIMARY KEY AUTOINCREMENT,
            title TEXT NOT NULL,
            url TEXT NOT NULL,
            category TEXT NOT NULL,
            source_name TEXT NOT NULL,
            summary TEXT NOT NULL,
            content TEXT,
            created_at TEXT NOT NULL
        )",
        params![],
    )
    .await?;

    conn.execute(
        "CREATE INDEX IF NOT EXISTS idx_articles_url ON articles(url)",
        params![],
    )
    .await?;

    conn.execute(
        "CREATE INDEX IF NOT EXISTS idx_articles_category ON articles(category)",
        params![],
    )
    .await?;

    Ok(())
}

/// Current UTC time in [`TIMESTAMP_FORMAT`].
pub(crate) fn now_timestamp() -> String {
    chrono::Utc::now().format(TIMESTAMP_FORMAT).to_string()
}
