//! Batch (re)computation of cover embeddings

use super::cover_source::CoverSource;
use super::provider::EmbeddingProvider;
use super::store::EmbeddingStore;
use crate::error::StoreError;
use crate::models::{RecordId, RecordLookup};
use serde::{Deserialize, Serialize};
use std::collections::BTreeSet;
use std::sync::Arc;
use tracing::{debug, info, warn};

/// Which records a rebuild visits
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum RebuildMode {
    /// Every record, replacing existing vectors
    #[default]
    All,
    /// Only records without stored vectors
    MissingOnly,
}

/// Rebuild counters
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq, Serialize)]
pub struct RebuildReport {
    pub processed: usize,
    pub skipped_no_image: usize,
    pub errors: usize,
}

/// Walks records, embeds their covers, and stores the vectors
///
/// Per-record failures are counted and logged; the batch always continues.
pub struct EmbeddingRebuilder {
    provider: Arc<dyn EmbeddingProvider>,
    store: Arc<dyn EmbeddingStore>,
    records: Arc<dyn RecordLookup>,
    rotations_deg: Vec<f32>,
}

impl EmbeddingRebuilder {
    pub fn new(
        provider: Arc<dyn EmbeddingProvider>,
        store: Arc<dyn EmbeddingStore>,
        records: Arc<dyn RecordLookup>,
        rotations_deg: Vec<f32>,
    ) -> Self {
        Self {
            provider,
            store,
            records,
            rotations_deg,
        }
    }

    /// Embed covers until `limit` records have been processed
    ///
    /// Fails only when the record list itself cannot be read.
    pub async fn rebuild_embeddings(
        &self,
        covers: &dyn CoverSource,
        limit: Option<usize>,
        mode: RebuildMode,
    ) -> Result<RebuildReport, StoreError> {
        let record_ids = self.records.list_record_ids().await?;

        let existing: BTreeSet<RecordId> = match mode {
            RebuildMode::All => BTreeSet::new(),
            RebuildMode::MissingOnly => self.store.record_ids().await?.into_iter().collect(),
        };

        info!(
            records = record_ids.len(),
            already_embedded = existing.len(),
            ?mode,
            ?limit,
            "Starting embedding rebuild"
        );

        let mut report = RebuildReport::default();

        for record_id in record_ids {
            if limit.is_some_and(|limit| report.processed >= limit) {
                debug!(processed = report.processed, "Rebuild limit reached");
                break;
            }
            if existing.contains(&record_id) {
                continue;
            }

            let Some(image) = covers.cover_bytes(record_id).await else {
                report.skipped_no_image += 1;
                continue;
            };

            let vectors = match self.provider.embed_variants(&image, &self.rotations_deg).await {
                Ok(vectors) => vectors,
                Err(e) => {
                    warn!(record_id, error = %e, "Failed to embed cover");
                    report.errors += 1;
                    continue;
                }
            };

            if let Err(e) = self.store.put(record_id, vectors).await {
                warn!(record_id, error = %e, "Failed to store embeddings");
                report.errors += 1;
                continue;
            }

            report.processed += 1;
        }

        info!(
            processed = report.processed,
            skipped_no_image = report.skipped_no_image,
            errors = report.errors,
            "Embedding rebuild complete"
        );

        Ok(report)
    }
}
