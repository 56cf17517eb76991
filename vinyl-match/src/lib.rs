//! vinyl-match: catalog resolution and cover matching for a vinyl collection
//!
//! Two independent pipelines:
//! - [`resolution`]: local record attributes → best US LP release in the
//!   Discogs catalog (tiered search, hard constraints, weighted scoring)
//! - [`embeddings`]: cover photo → most similar local record by image
//!   embedding
//!
//! Both talk to the outside world only through the traits in [`catalog`],
//! [`embeddings`] and [`models`].

pub mod catalog;
pub mod config;
pub mod db;
pub mod embeddings;
pub mod error;
pub mod models;
pub mod resolution;

pub use crate::error::{EmbeddingError, ProviderError, StoreError};
