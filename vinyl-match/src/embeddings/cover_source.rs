//! Cover image bytes for local records

use crate::error::StoreError;
use crate::models::RecordId;
use async_trait::async_trait;
use reqwest::Client;
use serde::{Deserialize, Serialize};
use std::path::PathBuf;
use std::time::Duration;
use tracing::{debug, warn};

/// Supplies the cover image of a record, `None` when it has none
#[async_trait]
pub trait CoverSource: Send + Sync {
    async fn cover_bytes(&self, record_id: RecordId) -> Option<Vec<u8>>;
}

/// Where a record's cover may be found
#[derive(Debug, Clone, Default, PartialEq, Eq, Serialize, Deserialize)]
pub struct CoverReferences {
    /// Path relative to the data folder
    pub cover_local: Option<String>,
    pub cover_url: Option<String>,
    pub cover_url_auto: Option<String>,
    pub discogs_thumb: Option<String>,
}

impl CoverReferences {
    /// Remote URLs in preference order, blanks removed
    pub fn urls(&self) -> impl Iterator<Item = &str> {
        [&self.cover_url, &self.cover_url_auto, &self.discogs_thumb]
            .into_iter()
            .filter_map(|url| url.as_deref().map(str::trim))
            .filter(|url| !url.is_empty())
    }
}

#[async_trait]
pub trait CoverReferenceLookup: Send + Sync {
    async fn cover_refs(&self, record_id: RecordId) -> Result<Option<CoverReferences>, StoreError>;
}

/// Local file first, then the record's remote cover URLs
pub struct RecordCoverSource<L> {
    refs: L,
    data_dir: PathBuf,
    http: Client,
}

impl<L: CoverReferenceLookup> RecordCoverSource<L> {
    pub fn new(refs: L, data_dir: impl Into<PathBuf>, timeout: Duration) -> Result<Self, reqwest::Error> {
        let http = Client::builder()
            .user_agent(vinyl_common::config::get_user_agent())
            .timeout(timeout)
            .build()?;
        Ok(Self {
            refs,
            data_dir: data_dir.into(),
            http,
        })
    }

    async fn read_local(&self, relative: &str) -> Option<Vec<u8>> {
        let relative = relative.trim();
        if relative.is_empty() {
            return None;
        }
        let path = self.data_dir.join(relative);
        match tokio::fs::read(&path).await {
            Ok(bytes) if !bytes.is_empty() => Some(bytes),
            Ok(_) => {
                debug!(path = %path.display(), "Local cover is empty");
                None
            }
            Err(e) => {
                debug!(path = %path.display(), error = %e, "Local cover unreadable");
                None
            }
        }
    }

    async fn download(&self, url: &str) -> Option<Vec<u8>> {
        let response = match self.http.get(url).send().await {
            Ok(response) => response,
            Err(e) => {
                debug!(url, error = %e, "Cover download failed");
                return None;
            }
        };
        if !response.status().is_success() {
            debug!(url, status = %response.status(), "Cover download refused");
            return None;
        }
        match response.bytes().await {
            Ok(bytes) if !bytes.is_empty() => Some(bytes.to_vec()),
            Ok(_) => None,
            Err(e) => {
                debug!(url, error = %e, "Cover download interrupted");
                None
            }
        }
    }
}

#[async_trait]
impl<L: CoverReferenceLookup> CoverSource for RecordCoverSource<L> {
    async fn cover_bytes(&self, record_id: RecordId) -> Option<Vec<u8>> {
        let refs = match self.refs.cover_refs(record_id).await {
            Ok(Some(refs)) => refs,
            Ok(None) => return None,
            Err(e) => {
                warn!(record_id, error = %e, "Failed to read cover references");
                return None;
            }
        };

        if let Some(local) = refs.cover_local.as_deref() {
            if let Some(bytes) = self.read_local(local).await {
                return Some(bytes);
            }
        }

        for url in refs.urls() {
            if let Some(bytes) = self.download(url).await {
                return Some(bytes);
            }
        }

        None
    }
}
