//! Catalog search query specification

use serde::Serialize;
use std::collections::BTreeMap;

/// Search parameter names understood by the catalog
pub mod params {
    pub const TYPE: &str = "type";
    pub const FORMAT: &str = "format";
    pub const COUNTRY: &str = "country";
    pub const BARCODE: &str = "barcode";
    pub const CATNO: &str = "catno";
    pub const LABEL: &str = "label";
    pub const ARTIST: &str = "artist";
    pub const RELEASE_TITLE: &str = "release_title";
    pub const QUERY: &str = "q";
    pub const YEAR: &str = "year";
}

/// One catalog search request: parameter name → value
///
/// Keys are kept sorted so two specs with the same key/value set compare
/// equal regardless of insertion order. Built once with [`QuerySpec::with`]
/// and never changed afterwards.
#[derive(Debug, Clone, Default, PartialEq, Eq, Hash, Serialize)]
#[serde(transparent)]
pub struct QuerySpec {
    params: BTreeMap<String, String>,
}

impl QuerySpec {
    pub fn new() -> Self {
        Self::default()
    }

    /// Add (or replace) a parameter
    pub fn with(mut self, key: &str, value: impl Into<String>) -> Self {
        self.params.insert(key.to_string(), value.into());
        self
    }

    /// Add a parameter only when a value is present
    pub fn with_opt(self, key: &str, value: Option<impl Into<String>>) -> Self {
        match value {
            Some(v) => self.with(key, v),
            None => self,
        }
    }

    pub fn get(&self, key: &str) -> Option<&str> {
        self.params.get(key).map(String::as_str)
    }

    pub fn contains_key(&self, key: &str) -> bool {
        self.params.contains_key(key)
    }

    pub fn len(&self) -> usize {
        self.params.len()
    }

    pub fn is_empty(&self) -> bool {
        self.params.is_empty()
    }

    pub fn iter(&self) -> impl Iterator<Item = (&str, &str)> {
        self.params.iter().map(|(k, v)| (k.as_str(), v.as_str()))
    }
}
