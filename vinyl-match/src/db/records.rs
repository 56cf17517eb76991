//! The `records` table and its `tracks`

use crate::catalog::Track;
use crate::embeddings::{CoverReferenceLookup, CoverReferences};
use crate::error::StoreError;
use crate::models::{RecordAttributes, RecordId, RecordLookup};
use crate::resolution::{CoverSelection, TrackSelection};
use async_trait::async_trait;
use sqlx::{Row, SqliteConnection, SqlitePool};

#[derive(Clone)]
pub struct SqliteRecordLookup {
    pool: SqlitePool,
}

impl SqliteRecordLookup {
    pub fn new(pool: SqlitePool) -> Self {
        Self { pool }
    }

    pub fn pool(&self) -> &SqlitePool {
        &self.pool
    }

    /// Store a chosen catalog release and its artwork on the record
    ///
    /// The record's year is only filled in when it was empty.
    pub async fn save_cover_selection(
        &self,
        record_id: RecordId,
        selection: &CoverSelection,
    ) -> Result<bool, StoreError> {
        let release_id = i64::try_from(selection.release_id)
            .map_err(|_| StoreError::InvalidData(format!("release id {} out of range", selection.release_id)))?;

        let result = sqlx::query(
            r#"
            UPDATE records SET
                discogs_release_id = ?,
                cover_url_auto = ?,
                discogs_thumb = ?,
                year = COALESCE(year, ?)
            WHERE id = ?
            "#,
        )
        .bind(release_id)
        .bind(&selection.cover_url)
        .bind(&selection.thumbnail_url)
        .bind(selection.derived_year)
        .bind(record_id)
        .execute(&self.pool)
        .await?;

        Ok(result.rows_affected() > 0)
    }

    /// Replace the record's tracklist
    pub async fn replace_tracks(
        &self,
        record_id: RecordId,
        tracks: &[Track],
    ) -> Result<(), StoreError> {
        let mut tx = self.pool.begin().await?;
        write_tracks(&mut tx, record_id, tracks).await?;
        tx.commit().await?;
        Ok(())
    }

    /// Store a chosen release's tracklist, filling the year when it was empty
    ///
    /// Returns `false` without writing anything when the record does not exist.
    pub async fn save_track_selection(
        &self,
        record_id: RecordId,
        selection: &TrackSelection,
    ) -> Result<bool, StoreError> {
        let mut tx = self.pool.begin().await?;

        let updated = sqlx::query("UPDATE records SET year = COALESCE(year, ?) WHERE id = ?")
            .bind(selection.derived_year)
            .bind(record_id)
            .execute(&mut *tx)
            .await?;
        if updated.rows_affected() == 0 {
            return Ok(false);
        }

        write_tracks(&mut tx, record_id, &selection.tracks).await?;
        tx.commit().await?;
        Ok(true)
    }

    /// Stored tracklist in insertion order
    pub async fn tracks(&self, record_id: RecordId) -> Result<Vec<Track>, StoreError> {
        let rows = sqlx::query(
            "SELECT side, position, title, duration FROM tracks WHERE record_id = ? ORDER BY id",
        )
        .bind(record_id)
        .fetch_all(&self.pool)
        .await?;

        Ok(rows
            .into_iter()
            .map(|row| Track {
                side: row.get("side"),
                position: row.get("position"),
                title: row.get("title"),
                duration: row.get("duration"),
            })
            .collect())
    }
}

async fn write_tracks(
    conn: &mut SqliteConnection,
    record_id: RecordId,
    tracks: &[Track],
) -> Result<(), StoreError> {
    sqlx::query("DELETE FROM tracks WHERE record_id = ?")
        .bind(record_id)
        .execute(&mut *conn)
        .await?;

    for track in tracks {
        sqlx::query(
            r#"
            INSERT INTO tracks (record_id, side, position, title, duration)
            VALUES (?, ?, ?, ?, ?)
            "#,
        )
        .bind(record_id)
        .bind(&track.side)
        .bind(&track.position)
        .bind(&track.title)
        .bind(&track.duration)
        .execute(&mut *conn)
        .await?;
    }

    Ok(())
}

#[async_trait]
impl RecordLookup for SqliteRecordLookup {
    async fn get_attributes(
        &self,
        record_id: RecordId,
    ) -> Result<Option<RecordAttributes>, StoreError> {
        let row = sqlx::query(
            r#"
            SELECT artist, title, year, label, catalog_number, barcode, country
            FROM records
            WHERE id = ?
            "#,
        )
        .bind(record_id)
        .fetch_optional(&self.pool)
        .await?;

        Ok(row.map(|row| RecordAttributes {
            artist: row.get::<Option<String>, _>("artist").unwrap_or_default(),
            title: row.get::<Option<String>, _>("title").unwrap_or_default(),
            year: row.get::<Option<i64>, _>("year").and_then(|y| i32::try_from(y).ok()).filter(|y| *y > 0),
            label: row.get("label"),
            catalog_number: row.get("catalog_number"),
            barcode: row.get("barcode"),
            country: row.get("country"),
        }))
    }

    async fn list_record_ids(&self) -> Result<Vec<RecordId>, StoreError> {
        let ids = sqlx::query_scalar::<_, i64>("SELECT id FROM records ORDER BY id")
            .fetch_all(&self.pool)
            .await?;
        Ok(ids)
    }
}

#[async_trait]
impl CoverReferenceLookup for SqliteRecordLookup {
    async fn cover_refs(&self, record_id: RecordId) -> Result<Option<CoverReferences>, StoreError> {
        let row = sqlx::query(
            r#"
            SELECT cover_local, cover_url, cover_url_auto, discogs_thumb
            FROM records
            WHERE id = ?
            "#,
        )
        .bind(record_id)
        .fetch_optional(&self.pool)
        .await?;

        Ok(row.map(|row| CoverReferences {
            cover_local: row.get("cover_local"),
            cover_url: row.get("cover_url"),
            cover_url_auto: row.get("cover_url_auto"),
            discogs_thumb: row.get("discogs_thumb"),
        }))
    }
}
