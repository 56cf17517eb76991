//! Cover-image similarity matching
//!
//! Each local record owns one or more cover embeddings (rotated variants of
//! its cover). A photographed cover is embedded once and compared against
//! every stored vector.

pub mod cover_source;
pub mod matcher;
pub mod provider;
pub mod rebuild;
pub mod service;
pub mod similarity;
pub mod store;

use crate::models::RecordId;
use std::collections::BTreeMap;

/// Fixed-dimension image embedding
pub type EmbeddingVector = Vec<f32>;

/// All stored vectors, keyed by record
pub type EmbeddingSet = BTreeMap<RecordId, Vec<EmbeddingVector>>;

pub use cover_source::{CoverReferenceLookup, CoverReferences, CoverSource, RecordCoverSource};
pub use matcher::{
    ConfidenceThresholds, EmbeddingMatcher, MatchOutcome, MatchResult, RankedRecord,
    ThresholdPreset, DEFAULT_TOP_K,
};
pub use provider::{
    ensure_image, ComputeDevice, DevicePreference, EmbeddingProvider, LoadedModel,
    RemoteEmbeddingProvider, RemoteEmbeddingSettings,
};
pub use rebuild::{EmbeddingRebuilder, RebuildMode, RebuildReport};
pub use service::{CoverMatchError, CoverMatcher};
pub use similarity::cosine_similarity;
pub use store::{EmbeddingStore, MemoryEmbeddingStore};
