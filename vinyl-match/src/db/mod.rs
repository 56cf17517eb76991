//! SQLite access for the record collection
//!
//! The `records` table is shared with the collection manager; this crate
//! reads it, writes catalog selections back, and owns `cover_embeddings`
//! and `tracks`.

pub mod embeddings;
pub mod records;

pub use embeddings::SqliteEmbeddingStore;
pub use records::SqliteRecordLookup;

use sqlx::SqlitePool;
use std::path::Path;
use vinyl_common::Result;

/// Open (or create) the collection database and ensure the tables exist
pub async fn init_database_pool(db_path: &Path) -> Result<SqlitePool> {
    if let Some(parent) = db_path.parent() {
        std::fs::create_dir_all(parent)?;
    }

    let db_url = format!("sqlite://{}?mode=rwc", db_path.display());
    tracing::debug!("Connecting to database: {}", db_url);

    let pool = SqlitePool::connect(&db_url).await?;
    init_tables(&pool).await?;

    Ok(pool)
}

/// Create `records`, `tracks` and `cover_embeddings` if missing
pub async fn init_tables(pool: &SqlitePool) -> Result<()> {
    sqlx::query(
        r#"
        CREATE TABLE IF NOT EXISTS records (
            id INTEGER PRIMARY KEY AUTOINCREMENT,
            artist TEXT NOT NULL,
            title TEXT NOT NULL,
            year INTEGER,
            label TEXT,
            country TEXT,
            catalog_number TEXT,
            barcode TEXT,
            cover_url TEXT,
            cover_local TEXT,
            cover_url_auto TEXT,
            discogs_thumb TEXT,
            discogs_release_id INTEGER,
            created_at TEXT NOT NULL DEFAULT CURRENT_TIMESTAMP
        )
        "#,
    )
    .execute(pool)
    .await?;

    sqlx::query(
        r#"
        CREATE TABLE IF NOT EXISTS tracks (
            id INTEGER PRIMARY KEY AUTOINCREMENT,
            record_id INTEGER NOT NULL REFERENCES records(id) ON DELETE CASCADE,
            side TEXT NOT NULL,
            position TEXT,
            title TEXT NOT NULL,
            duration TEXT
        )
        "#,
    )
    .execute(pool)
    .await?;

    sqlx::query("CREATE INDEX IF NOT EXISTS idx_tracks_record ON tracks(record_id)")
        .execute(pool)
        .await?;

    sqlx::query(
        r#"
        CREATE TABLE IF NOT EXISTS cover_embeddings (
            record_id INTEGER PRIMARY KEY,
            vec TEXT NOT NULL,
            updated_at TEXT NOT NULL
        )
        "#,
    )
    .execute(pool)
    .await?;

    tracing::info!("Database tables initialized (records, tracks, cover_embeddings)");

    Ok(())
}
