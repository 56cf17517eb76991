//! Discogs API client
//!
//! Implements catalog search (`/database/search`) and release lookup
//! (`/releases/{id}`) with a client-side rate limiter and a per-request
//! timeout. API documentation: https://www.discogs.com/developers

use super::{CatalogDetailProvider, CatalogSearchProvider, QuerySpec, ReleaseDetail, SearchResultItem};
use crate::error::ProviderError;
use async_trait::async_trait;
use governor::{Quota, RateLimiter};
use reqwest::{Client, StatusCode};
use serde::de::DeserializeOwned;
use serde::Deserialize;
use std::num::NonZeroU32;
use std::time::Duration;

pub const DISCOGS_API_BASE: &str = "https://api.discogs.com";

/// Results requested per search page
const PER_PAGE: &str = "50";

/// Discogs client settings
#[derive(Debug, Clone)]
pub struct DiscogsSettings {
    pub base_url: String,
    /// Personal access token; anonymous requests get a lower quota
    pub token: Option<String>,
    pub user_agent: String,
    pub request_timeout: Duration,
    pub requests_per_minute: u32,
}

impl Default for DiscogsSettings {
    fn default() -> Self {
        Self {
            base_url: DISCOGS_API_BASE.to_string(),
            token: None,
            user_agent: vinyl_common::config::get_user_agent(),
            request_timeout: Duration::from_secs(20),
            requests_per_minute: 60,
        }
    }
}

#[derive(Debug, Deserialize)]
struct SearchResponse {
    #[serde(default)]
    results: Vec<SearchResultItem>,
}

/// Discogs API client
pub struct DiscogsClient {
    http: Client,
    base_url: String,
    token: Option<String>,
    request_timeout: Duration,
    rate_limiter: RateLimiter<
        governor::state::direct::NotKeyed,
        governor::state::InMemoryState,
        governor::clock::DefaultClock,
    >,
}

impl DiscogsClient {
    pub fn new(settings: DiscogsSettings) -> Result<Self, ProviderError> {
        let http = Client::builder()
            .user_agent(settings.user_agent.as_str())
            .timeout(settings.request_timeout)
            .connect_timeout(Duration::from_secs(5))
            .build()
            .map_err(|e| ProviderError::Config(e.to_string()))?;

        let per_minute = NonZeroU32::new(settings.requests_per_minute).unwrap_or(NonZeroU32::MIN);
        let rate_limiter = RateLimiter::direct(Quota::per_minute(per_minute));

        Ok(Self {
            http,
            base_url: settings.base_url.trim_end_matches('/').to_string(),
            token: settings.token,
            request_timeout: settings.request_timeout,
            rate_limiter,
        })
    }

    async fn get_json<T: DeserializeOwned>(
        &self,
        url: &str,
        query: &[(&str, &str)],
        what: &str,
    ) -> Result<T, ProviderError> {
        self.rate_limiter.until_ready().await;

        let mut request = self.http.get(url).query(query);
        if let Some(token) = &self.token {
            request = request.header("Authorization", format!("Discogs token={}", token));
        }

        let response = request.send().await.map_err(|e| {
            if e.is_timeout() {
                ProviderError::Timeout(format!("{} after {:?}", what, self.request_timeout))
            } else {
                ProviderError::Network(e.to_string())
            }
        })?;

        let status = response.status();
        if !status.is_success() {
            let body = response.text().await.unwrap_or_default();
            return Err(classify_status(status, body, what));
        }

        response
            .json::<T>()
            .await
            .map_err(|e| ProviderError::Parse(format!("{}: {}", what, e)))
    }
}

/// Map a non-2xx status to a provider error
fn classify_status(status: StatusCode, body: String, what: &str) -> ProviderError {
    match status {
        StatusCode::NOT_FOUND => ProviderError::NotFound(what.to_string()),
        StatusCode::TOO_MANY_REQUESTS => ProviderError::RateLimited,
        other => ProviderError::Status(other.as_u16(), body),
    }
}

#[async_trait]
impl CatalogSearchProvider for DiscogsClient {
    async fn search(&self, spec: &QuerySpec) -> Result<Vec<SearchResultItem>, ProviderError> {
        let url = format!("{}/database/search", self.base_url);
        let mut query: Vec<(&str, &str)> = spec.iter().collect();
        query.push(("per_page", PER_PAGE));
        query.push(("page", "1"));

        tracing::debug!(url = %url, params = ?spec, "Querying Discogs search");

        let response: SearchResponse = self.get_json(&url, &query, "search").await?;

        tracing::debug!(results = response.results.len(), "Discogs search returned");
        Ok(response.results)
    }
}

#[async_trait]
impl CatalogDetailProvider for DiscogsClient {
    async fn release(&self, release_id: u64) -> Result<ReleaseDetail, ProviderError> {
        let url = format!("{}/releases/{}", self.base_url, release_id);
        let what = format!("release {}", release_id);

        tracing::debug!(release_id, "Fetching Discogs release");

        let detail: ReleaseDetail = self.get_json(&url, &[], &what).await?;

        tracing::debug!(
            release_id,
            title = %detail.title,
            country = detail.country.as_deref().unwrap_or("?"),
            "Retrieved release from Discogs"
        );
        Ok(detail)
    }
}
