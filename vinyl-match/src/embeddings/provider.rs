//! Image embedding backend
//!
//! The model runs in a separate embedding sidecar (CLIP-style vision
//! encoder). `RemoteEmbeddingProvider` is constructed explicitly and must be
//! initialised once before use: initialisation picks the compute device from
//! what the sidecar reports and loads the model there.

use super::EmbeddingVector;
use crate::error::EmbeddingError;
use async_trait::async_trait;
use reqwest::{Client, StatusCode};
use serde::{Deserialize, Serialize};
use std::fmt;
use std::str::FromStr;
use std::time::Duration;
use tokio::sync::RwLock;
use tracing::{debug, info, warn};

/// Converts image bytes into embedding vectors
#[async_trait]
pub trait EmbeddingProvider: Send + Sync {
    async fn embed(&self, image: &[u8]) -> Result<EmbeddingVector, EmbeddingError>;

    /// One vector per rotation of the image
    ///
    /// Backends without rotation support return a single vector of the
    /// unrotated image.
    async fn embed_variants(
        &self,
        image: &[u8],
        rotations_deg: &[f32],
    ) -> Result<Vec<EmbeddingVector>, EmbeddingError> {
        let _ = rotations_deg;
        Ok(vec![self.embed(image).await?])
    }
}

/// Hardware the model can run on
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum ComputeDevice {
    Cuda,
    Mps,
    Cpu,
}

impl fmt::Display for ComputeDevice {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        let name = match self {
            ComputeDevice::Cuda => "cuda",
            ComputeDevice::Mps => "mps",
            ComputeDevice::Cpu => "cpu",
        };
        f.write_str(name)
    }
}

impl FromStr for ComputeDevice {
    type Err = String;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        match s.trim().to_lowercase().as_str() {
            "cuda" => Ok(ComputeDevice::Cuda),
            "mps" => Ok(ComputeDevice::Mps),
            "cpu" => Ok(ComputeDevice::Cpu),
            other => Err(format!("unknown compute device '{}'", other)),
        }
    }
}

/// Configured device choice: `auto` or an explicit device
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq, Serialize, Deserialize)]
#[serde(try_from = "String", into = "String")]
pub enum DevicePreference {
    #[default]
    Auto,
    Device(ComputeDevice),
}

impl DevicePreference {
    /// Pick a device from the ones the backend reports
    ///
    /// `Auto` prefers CUDA, then MPS, then CPU. CPU is always usable; any
    /// other explicit device must be reported as available.
    pub fn select(self, available: &[ComputeDevice]) -> Result<ComputeDevice, EmbeddingError> {
        match self {
            DevicePreference::Auto => Ok([ComputeDevice::Cuda, ComputeDevice::Mps]
                .into_iter()
                .find(|d| available.contains(d))
                .unwrap_or(ComputeDevice::Cpu)),
            DevicePreference::Device(ComputeDevice::Cpu) => Ok(ComputeDevice::Cpu),
            DevicePreference::Device(device) if available.contains(&device) => Ok(device),
            DevicePreference::Device(device) => Err(EmbeddingError::Unavailable(format!(
                "{} requested but backend reports {:?}",
                device, available
            ))),
        }
    }
}

impl TryFrom<String> for DevicePreference {
    type Error = String;

    fn try_from(value: String) -> Result<Self, Self::Error> {
        if value.trim().eq_ignore_ascii_case("auto") {
            Ok(DevicePreference::Auto)
        } else {
            value.parse().map(DevicePreference::Device)
        }
    }
}

impl From<DevicePreference> for String {
    fn from(pref: DevicePreference) -> Self {
        match pref {
            DevicePreference::Auto => "auto".to_string(),
            DevicePreference::Device(device) => device.to_string(),
        }
    }
}

/// Check that `bytes` look like an image and return its MIME type
pub fn ensure_image(bytes: &[u8]) -> Result<&'static str, EmbeddingError> {
    if bytes.is_empty() {
        return Err(EmbeddingError::EmptyImage);
    }
    match infer::get(bytes) {
        Some(kind) if kind.matcher_type() == infer::MatcherType::Image => Ok(kind.mime_type()),
        Some(kind) => Err(EmbeddingError::UndecodableImage(format!(
            "expected an image, got {}",
            kind.mime_type()
        ))),
        None => Err(EmbeddingError::UndecodableImage(
            "unrecognised image format".to_string(),
        )),
    }
}

/// Sidecar connection settings
#[derive(Debug, Clone)]
pub struct RemoteEmbeddingSettings {
    pub endpoint: String,
    pub model: String,
    pub device: DevicePreference,
    pub request_timeout: Duration,
}

impl Default for RemoteEmbeddingSettings {
    fn default() -> Self {
        Self {
            endpoint: "http://127.0.0.1:8765".to_string(),
            model: "ViT-B/32".to_string(),
            device: DevicePreference::Auto,
            request_timeout: Duration::from_secs(60),
        }
    }
}

/// Model loaded by [`RemoteEmbeddingProvider::initialize`]
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct LoadedModel {
    pub model: String,
    pub device: ComputeDevice,
    pub dimension: usize,
}

#[derive(Debug, Deserialize)]
struct HealthResponse {
    #[serde(default)]
    devices: Vec<String>,
}

#[derive(Debug, Serialize)]
struct LoadRequest<'a> {
    model: &'a str,
    device: ComputeDevice,
}

#[derive(Debug, Deserialize)]
struct EmbedResponse {
    embeddings: Vec<Vec<f32>>,
}

/// Embedding sidecar client
pub struct RemoteEmbeddingProvider {
    http: Client,
    endpoint: String,
    settings: RemoteEmbeddingSettings,
    loaded: RwLock<Option<LoadedModel>>,
}

impl RemoteEmbeddingProvider {
    pub fn new(settings: RemoteEmbeddingSettings) -> Result<Self, EmbeddingError> {
        let http = Client::builder()
            .user_agent(vinyl_common::config::get_user_agent())
            .timeout(settings.request_timeout)
            .connect_timeout(Duration::from_secs(5))
            .build()
            .map_err(|e| EmbeddingError::Unavailable(e.to_string()))?;

        Ok(Self {
            http,
            endpoint: settings.endpoint.trim_end_matches('/').to_string(),
            settings,
            loaded: RwLock::new(None),
        })
    }

    /// Select the device and load the model
    ///
    /// Calling again reloads with the same settings.
    pub async fn initialize(&self) -> Result<LoadedModel, EmbeddingError> {
        let health: HealthResponse = self
            .http
            .get(format!("{}/health", self.endpoint))
            .send()
            .await
            .map_err(|e| EmbeddingError::Unavailable(e.to_string()))?
            .error_for_status()
            .map_err(|e| EmbeddingError::Unavailable(e.to_string()))?
            .json()
            .await
            .map_err(|e| EmbeddingError::InvalidResponse(e.to_string()))?;

        let available: Vec<ComputeDevice> = health
            .devices
            .iter()
            .filter_map(|d| match d.parse() {
                Ok(device) => Some(device),
                Err(e) => {
                    warn!("Ignoring device reported by embedding backend: {}", e);
                    None
                }
            })
            .collect();

        let device = self.settings.device.select(&available)?;
        debug!(?available, %device, "Selected compute device");

        let response = self
            .http
            .post(format!("{}/load", self.endpoint))
            .json(&LoadRequest {
                model: &self.settings.model,
                device,
            })
            .send()
            .await
            .map_err(|e| EmbeddingError::Unavailable(e.to_string()))?;

        let status = response.status();
        if !status.is_success() {
            let body = response.text().await.unwrap_or_default();
            return Err(EmbeddingError::Unavailable(format!(
                "model load failed ({}): {}",
                status, body
            )));
        }

        let loaded: LoadedModel = response
            .json()
            .await
            .map_err(|e| EmbeddingError::InvalidResponse(e.to_string()))?;

        info!(
            model = %loaded.model,
            device = %loaded.device,
            dimension = loaded.dimension,
            "Embedding model loaded"
        );

        *self.loaded.write().await = Some(loaded.clone());
        Ok(loaded)
    }

    pub async fn loaded_model(&self) -> Option<LoadedModel> {
        self.loaded.read().await.clone()
    }

    async fn request_embeddings(
        &self,
        image: &[u8],
        rotations_deg: &[f32],
    ) -> Result<Vec<EmbeddingVector>, EmbeddingError> {
        let dimension = self
            .loaded
            .read()
            .await
            .as_ref()
            .map(|m| m.dimension)
            .ok_or(EmbeddingError::NotInitialized)?;

        let mime = ensure_image(image)?;

        let rotations = if rotations_deg.is_empty() {
            "0".to_string()
        } else {
            rotations_deg
                .iter()
                .map(|r| r.to_string())
                .collect::<Vec<_>>()
                .join(",")
        };

        let response = self
            .http
            .post(format!("{}/embed", self.endpoint))
            .query(&[("rotations", rotations.as_str())])
            .header(reqwest::header::CONTENT_TYPE, mime)
            .body(image.to_vec())
            .send()
            .await
            .map_err(|e| EmbeddingError::Unavailable(e.to_string()))?;

        let status = response.status();
        if !status.is_success() {
            let body = response.text().await.unwrap_or_default();
            return Err(classify_status(status, body));
        }

        let parsed: EmbedResponse = response
            .json()
            .await
            .map_err(|e| EmbeddingError::InvalidResponse(e.to_string()))?;

        validate_embeddings(parsed.embeddings, dimension)
    }
}

fn classify_status(status: StatusCode, body: String) -> EmbeddingError {
    match status {
        StatusCode::BAD_REQUEST | StatusCode::UNSUPPORTED_MEDIA_TYPE | StatusCode::UNPROCESSABLE_ENTITY => {
            EmbeddingError::UndecodableImage(body)
        }
        StatusCode::CONFLICT => EmbeddingError::NotInitialized,
        other => EmbeddingError::Unavailable(format!("status {}: {}", other.as_u16(), body)),
    }
}

/// Reject empty, wrongly sized, or non-finite vectors
///
/// A `dimension` of 0 accepts any non-zero length.
fn validate_embeddings(
    embeddings: Vec<EmbeddingVector>,
    dimension: usize,
) -> Result<Vec<EmbeddingVector>, EmbeddingError> {
    if embeddings.is_empty() {
        return Err(EmbeddingError::InvalidResponse("no embeddings returned".to_string()));
    }
    for vector in &embeddings {
        if vector.is_empty() || (dimension > 0 && vector.len() != dimension) {
            return Err(EmbeddingError::InvalidResponse(format!(
                "vector of length {} (expected {})",
                vector.len(),
                dimension
            )));
        }
        if vector.iter().any(|x| !x.is_finite()) {
            return Err(EmbeddingError::InvalidResponse("non-finite component".to_string()));
        }
    }
    Ok(embeddings)
}

#[async_trait]
impl EmbeddingProvider for RemoteEmbeddingProvider {
    async fn embed(&self, image: &[u8]) -> Result<EmbeddingVector, EmbeddingError> {
        let mut vectors = self.request_embeddings(image, &[0.0]).await?;
        Ok(vectors.swap_remove(0))
    }

    async fn embed_variants(
        &self,
        image: &[u8],
        rotations_deg: &[f32],
    ) -> Result<Vec<EmbeddingVector>, EmbeddingError> {
        self.request_embeddings(image, rotations_deg).await
    }
}
