//! Test doubles for the catalog, embedding backend, records and covers

#![allow(dead_code)]

use async_trait::async_trait;
use std::collections::{BTreeMap, HashMap, HashSet};
use std::sync::atomic::{AtomicUsize, Ordering};
use std::sync::Mutex;
use vinyl_match::catalog::{
    CatalogDetailProvider, CatalogSearchProvider, QuerySpec, ReleaseArtist, ReleaseDetail,
    ReleaseFormat, ReleaseImage, SearchResultItem,
};
use vinyl_match::embeddings::{CoverSource, EmbeddingProvider, EmbeddingVector};
use vinyl_match::models::{RecordAttributes, RecordId, RecordLookup};
use vinyl_match::{EmbeddingError, ProviderError, StoreError};

/// In-memory catalog; unknown searches fail with a network error and unknown
/// releases with `NotFound`
#[derive(Default)]
pub struct FakeCatalog {
    searches: HashMap<QuerySpec, Vec<SearchResultItem>>,
    releases: HashMap<u64, ReleaseDetail>,
    pub search_calls: Mutex<Vec<QuerySpec>>,
    pub release_calls: Mutex<Vec<u64>>,
}

impl FakeCatalog {
    pub fn new() -> Self {
        Self::default()
    }

    pub fn with_search(mut self, spec: QuerySpec, hits: Vec<SearchResultItem>) -> Self {
        self.searches.insert(spec, hits);
        self
    }

    pub fn with_release(mut self, detail: ReleaseDetail) -> Self {
        self.releases.insert(detail.id, detail);
        self
    }

    pub fn search_count(&self) -> usize {
        self.search_calls.lock().unwrap().len()
    }
}

#[async_trait]
impl CatalogSearchProvider for FakeCatalog {
    async fn search(&self, spec: &QuerySpec) -> Result<Vec<SearchResultItem>, ProviderError> {
        self.search_calls.lock().unwrap().push(spec.clone());
        self.searches
            .get(spec)
            .cloned()
            .ok_or_else(|| ProviderError::Network("connection reset".to_string()))
    }
}

#[async_trait]
impl CatalogDetailProvider for FakeCatalog {
    async fn release(&self, release_id: u64) -> Result<ReleaseDetail, ProviderError> {
        self.release_calls.lock().unwrap().push(release_id);
        self.releases
            .get(&release_id)
            .cloned()
            .ok_or_else(|| ProviderError::NotFound(format!("release {}", release_id)))
    }
}

/// Search hit for a US vinyl LP; `title` is `"Artist - Title"`
pub fn us_lp_hit(id: u64, title: &str) -> SearchResultItem {
    SearchResultItem {
        id,
        title: title.to_string(),
        country: Some("US".to_string()),
        format: vec!["Vinyl".to_string(), "LP".to_string()],
        ..Default::default()
    }
}

pub fn us_lp_release(id: u64, artist: &str, title: &str) -> ReleaseDetail {
    ReleaseDetail {
        id,
        title: title.to_string(),
        country: Some("US".to_string()),
        artists: vec![ReleaseArtist {
            name: artist.to_string(),
            id: None,
        }],
        formats: vec![ReleaseFormat {
            name: "Vinyl".to_string(),
            qty: Some("1".to_string()),
            descriptions: vec!["LP".to_string()],
        }],
        ..Default::default()
    }
}

pub fn primary_image(uri: &str) -> ReleaseImage {
    ReleaseImage {
        kind: "primary".to_string(),
        uri: Some(uri.to_string()),
        uri150: None,
        resource_url: None,
    }
}

/// Embedding backend answering from a lookup table keyed by image bytes
#[derive(Default)]
pub struct FakeEmbedder {
    vectors: HashMap<Vec<u8>, EmbeddingVector>,
    failing: HashSet<Vec<u8>>,
    pub calls: AtomicUsize,
}

impl FakeEmbedder {
    pub fn new() -> Self {
        Self::default()
    }

    pub fn with_vector(mut self, image: &[u8], vector: EmbeddingVector) -> Self {
        self.vectors.insert(image.to_vec(), vector);
        self
    }

    pub fn failing_on(mut self, image: &[u8]) -> Self {
        self.failing.insert(image.to_vec());
        self
    }

    pub fn call_count(&self) -> usize {
        self.calls.load(Ordering::SeqCst)
    }
}

#[async_trait]
impl EmbeddingProvider for FakeEmbedder {
    async fn embed(&self, image: &[u8]) -> Result<EmbeddingVector, EmbeddingError> {
        self.calls.fetch_add(1, Ordering::SeqCst);
        if image.is_empty() {
            return Err(EmbeddingError::EmptyImage);
        }
        if self.failing.contains(image) {
            return Err(EmbeddingError::UndecodableImage("corrupt JPEG".to_string()));
        }
        Ok(self
            .vectors
            .get(image)
            .cloned()
            .unwrap_or_else(|| vec![1.0, 0.0, 0.0]))
    }
}

#[derive(Default)]
pub struct FakeRecords {
    records: BTreeMap<RecordId, RecordAttributes>,
}

impl FakeRecords {
    pub fn new() -> Self {
        Self::default()
    }

    pub fn with_record(mut self, record_id: RecordId, attributes: RecordAttributes) -> Self {
        self.records.insert(record_id, attributes);
        self
    }

    /// Records `1..=count` named after their id
    pub fn numbered(count: RecordId) -> Self {
        (1..=count).fold(Self::new(), |records, id| {
            records.with_record(id, RecordAttributes::new(format!("Artist {}", id), format!("Album {}", id)))
        })
    }
}

#[async_trait]
impl RecordLookup for FakeRecords {
    async fn get_attributes(
        &self,
        record_id: RecordId,
    ) -> Result<Option<RecordAttributes>, StoreError> {
        Ok(self.records.get(&record_id).cloned())
    }

    async fn list_record_ids(&self) -> Result<Vec<RecordId>, StoreError> {
        Ok(self.records.keys().copied().collect())
    }
}

#[derive(Default)]
pub struct FakeCovers {
    covers: HashMap<RecordId, Vec<u8>>,
}

impl FakeCovers {
    pub fn new() -> Self {
        Self::default()
    }

    pub fn with_cover(mut self, record_id: RecordId, bytes: Vec<u8>) -> Self {
        self.covers.insert(record_id, bytes);
        self
    }
}

#[async_trait]
impl CoverSource for FakeCovers {
    async fn cover_bytes(&self, record_id: RecordId) -> Option<Vec<u8>> {
        self.covers.get(&record_id).cloned()
    }
}
