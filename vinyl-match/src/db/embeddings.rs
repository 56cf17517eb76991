//! `cover_embeddings` table
//!
//! `vec` holds a JSON list of vectors. Older rows store a single flat vector
//! and some writers stored components as strings; both still load.

use crate::embeddings::{EmbeddingSet, EmbeddingStore, EmbeddingVector};
use crate::error::StoreError;
use crate::models::RecordId;
use async_trait::async_trait;
use serde_json::Value;
use sqlx::{Row, SqlitePool};

pub struct SqliteEmbeddingStore {
    pool: SqlitePool,
}

impl SqliteEmbeddingStore {
    pub fn new(pool: SqlitePool) -> Self {
        Self { pool }
    }
}

#[async_trait]
impl EmbeddingStore for SqliteEmbeddingStore {
    async fn get_all(&self) -> Result<EmbeddingSet, StoreError> {
        let rows = sqlx::query("SELECT record_id, vec FROM cover_embeddings ORDER BY record_id")
            .fetch_all(&self.pool)
            .await?;

        let mut set = EmbeddingSet::new();
        for row in rows {
            let record_id: RecordId = row.get("record_id");
            let raw: String = row.get("vec");
            match parse_vectors(&raw) {
                Ok(vectors) => {
                    set.insert(record_id, vectors);
                }
                Err(reason) => {
                    tracing::warn!(record_id, %reason, "Skipping malformed embedding row");
                }
            }
        }

        Ok(set)
    }

    async fn put(
        &self,
        record_id: RecordId,
        vectors: Vec<EmbeddingVector>,
    ) -> Result<(), StoreError> {
        let vec = serde_json::to_string(&vectors)?;
        let updated_at = chrono::Utc::now().to_rfc3339();

        sqlx::query(
            r#"
            INSERT INTO cover_embeddings (record_id, vec, updated_at)
            VALUES (?, ?, ?)
            ON CONFLICT(record_id) DO UPDATE SET
                vec = excluded.vec,
                updated_at = excluded.updated_at
            "#,
        )
        .bind(record_id)
        .bind(&vec)
        .bind(&updated_at)
        .execute(&self.pool)
        .await?;

        Ok(())
    }
}

/// Decode a stored `vec` column
///
/// Accepts `[[..], [..]]`, a flat `[..]`, and numeric strings as components.
pub fn parse_vectors(raw: &str) -> Result<Vec<EmbeddingVector>, String> {
    let value: Value = serde_json::from_str(raw).map_err(|e| e.to_string())?;
    let Value::Array(items) = value else {
        return Err("not a JSON array".to_string());
    };

    if items.is_empty() {
        return Ok(Vec::new());
    }

    if items.iter().all(Value::is_array) {
        items
            .iter()
            .map(|item| match item {
                Value::Array(components) => parse_vector(components),
                _ => Err("mixed vector list".to_string()),
            })
            .collect()
    } else {
        Ok(vec![parse_vector(&items)?])
    }
}

fn parse_vector(components: &[Value]) -> Result<EmbeddingVector, String> {
    if components.is_empty() {
        return Err("empty vector".to_string());
    }
    components
        .iter()
        .map(|c| {
            let component = match c {
                Value::Number(n) => n.as_f64().map(|x| x as f32),
                Value::String(s) => s.trim().parse::<f32>().ok(),
                _ => None,
            };
            component
                .filter(|x| x.is_finite())
                .ok_or_else(|| format!("invalid component {}", c))
        })
        .collect()
}
