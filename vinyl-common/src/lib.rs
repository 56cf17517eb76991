//! # Vinyl Common Library
//!
//! Shared code for the vinyl record tools:
//! - Error type and result alias
//! - TOML configuration loading and root folder resolution
//! - Logging bootstrap
//! - Secret and User-Agent resolution for outbound HTTP clients

pub mod config;
pub mod error;
pub mod logging;

pub use error::{Error, Result};
