//! Data models shared by the resolution and matching pipelines

pub mod record;

pub use record::{RecordAttributes, RecordId, RecordLookup, DEFAULT_COUNTRY};
