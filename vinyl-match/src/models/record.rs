//! Local record attributes as entered by the user

use crate::error::StoreError;
use async_trait::async_trait;
use serde::{Deserialize, Serialize};

/// Local record identifier (`records.id`)
pub type RecordId = i64;

/// Country assumed when a record does not name one
pub const DEFAULT_COUNTRY: &str = "US";

/// Sparse, user-entered metadata for one physical record
///
/// Immutable input to catalog resolution. Accessors trim whitespace and treat
/// blank strings as absent.
#[derive(Debug, Clone, Default, PartialEq, Eq, Serialize, Deserialize)]
pub struct RecordAttributes {
    pub artist: String,
    pub title: String,
    pub year: Option<i32>,
    pub label: Option<String>,
    pub catalog_number: Option<String>,
    pub barcode: Option<String>,
    pub country: Option<String>,
}

impl RecordAttributes {
    pub fn new(artist: impl Into<String>, title: impl Into<String>) -> Self {
        Self {
            artist: artist.into(),
            title: title.into(),
            ..Default::default()
        }
    }

    pub fn with_year(mut self, year: i32) -> Self {
        self.year = Some(year);
        self
    }

    pub fn with_label(mut self, label: impl Into<String>) -> Self {
        self.label = Some(label.into());
        self
    }

    pub fn with_catalog_number(mut self, catalog_number: impl Into<String>) -> Self {
        self.catalog_number = Some(catalog_number.into());
        self
    }

    pub fn with_barcode(mut self, barcode: impl Into<String>) -> Self {
        self.barcode = Some(barcode.into());
        self
    }

    pub fn with_country(mut self, country: impl Into<String>) -> Self {
        self.country = Some(country.into());
        self
    }

    pub fn artist(&self) -> Option<&str> {
        non_blank(Some(&self.artist))
    }

    pub fn title(&self) -> Option<&str> {
        non_blank(Some(&self.title))
    }

    pub fn label(&self) -> Option<&str> {
        non_blank(self.label.as_deref())
    }

    pub fn catalog_number(&self) -> Option<&str> {
        non_blank(self.catalog_number.as_deref())
    }

    pub fn barcode(&self) -> Option<&str> {
        non_blank(self.barcode.as_deref())
    }

    /// Required release country, upper-cased
    ///
    /// Country is always constrained: a record without one is treated as
    /// [`DEFAULT_COUNTRY`].
    pub fn country(&self) -> String {
        non_blank(self.country.as_deref())
            .map(str::to_uppercase)
            .unwrap_or_else(|| DEFAULT_COUNTRY.to_string())
    }
}

fn non_blank(value: Option<&str>) -> Option<&str> {
    value.map(str::trim).filter(|v| !v.is_empty())
}

/// Read-only access to local records
///
/// Used for display metadata next to cover matches and to enumerate records
/// during an embedding rebuild.
#[async_trait]
pub trait RecordLookup: Send + Sync {
    /// Attributes of one record, `None` if the id is unknown
    async fn get_attributes(&self, record_id: RecordId)
        -> Result<Option<RecordAttributes>, StoreError>;

    /// All record ids in ascending order
    async fn list_record_ids(&self) -> Result<Vec<RecordId>, StoreError>;
}
