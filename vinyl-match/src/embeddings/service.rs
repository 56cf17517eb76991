//! Cover photo → local record matching

use super::matcher::{EmbeddingMatcher, MatchOutcome};
use super::provider::EmbeddingProvider;
use super::store::EmbeddingStore;
use crate::error::{EmbeddingError, StoreError};
use crate::models::RecordLookup;
use std::sync::Arc;
use thiserror::Error;
use tracing::{debug, info, warn};

#[derive(Debug, Error)]
pub enum CoverMatchError {
    #[error("Uploaded image is empty")]
    EmptyUpload,

    #[error(transparent)]
    Embedding(#[from] EmbeddingError),

    #[error(transparent)]
    Store(#[from] StoreError),
}

/// Identifies which local record a cover photo shows
pub struct CoverMatcher {
    provider: Arc<dyn EmbeddingProvider>,
    store: Arc<dyn EmbeddingStore>,
    records: Arc<dyn RecordLookup>,
    matcher: EmbeddingMatcher,
}

impl CoverMatcher {
    pub fn new(
        provider: Arc<dyn EmbeddingProvider>,
        store: Arc<dyn EmbeddingStore>,
        records: Arc<dyn RecordLookup>,
        matcher: EmbeddingMatcher,
    ) -> Self {
        Self {
            provider,
            store,
            records,
            matcher,
        }
    }

    /// Rank local records by similarity to `image`
    ///
    /// An empty store yields [`MatchOutcome::NoEmbeddingsAvailable`] without
    /// calling the embedding backend.
    pub async fn match_cover_image(&self, image: &[u8]) -> Result<MatchOutcome, CoverMatchError> {
        if image.is_empty() {
            return Err(CoverMatchError::EmptyUpload);
        }

        let embeddings = self.store.get_all().await?;
        if embeddings.values().all(|vectors| vectors.is_empty()) {
            info!("No stored cover embeddings, rebuild required");
            return Ok(MatchOutcome::NoEmbeddingsAvailable);
        }

        let query = self.provider.embed(image).await?;
        let mut outcome = self.matcher.rank(&query, &embeddings);

        if let MatchOutcome::Matched(result) = &mut outcome {
            for ranked in &mut result.top_k {
                match self.records.get_attributes(ranked.record_id).await {
                    Ok(Some(attrs)) => {
                        ranked.artist = attrs.artist().map(str::to_string);
                        ranked.title = attrs.title().map(str::to_string);
                    }
                    Ok(None) => {
                        debug!(record_id = ranked.record_id, "Matched record no longer exists");
                    }
                    Err(e) => {
                        warn!(record_id = ranked.record_id, error = %e, "Failed to load record metadata");
                    }
                }
            }

            info!(
                best_record_id = result.best_record_id,
                best_score = result.best_score,
                gap = result.gap,
                confident = result.confident,
                "Cover match complete"
            );
        }

        Ok(outcome)
    }
}
