//! External release catalog
//!
//! The resolution pipeline only sees the two provider traits below; the
//! Discogs HTTP client is one implementation.

pub mod discogs;
pub mod query;
pub mod types;

pub use discogs::{DiscogsClient, DiscogsSettings, DISCOGS_API_BASE};
pub use query::QuerySpec;
pub use types::{
    CoverImage, ReleaseArtist, ReleaseDetail, ReleaseFormat, ReleaseImage, ReleaseLabel,
    SearchResultItem, Track, TrackEntry,
};

use crate::error::ProviderError;
use async_trait::async_trait;

/// Catalog release search
#[async_trait]
pub trait CatalogSearchProvider: Send + Sync {
    async fn search(&self, spec: &QuerySpec) -> Result<Vec<SearchResultItem>, ProviderError>;
}

/// Catalog release lookup by id
#[async_trait]
pub trait CatalogDetailProvider: Send + Sync {
    /// Fails with [`ProviderError::NotFound`] for unknown ids
    async fn release(&self, release_id: u64) -> Result<ReleaseDetail, ProviderError>;
}
