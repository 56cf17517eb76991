//! Query planner: record attributes → ordered catalog searches
//!
//! Tiers run from most to least specific. Barcodes and catalogue numbers
//! disambiguate pressings far better than free text, so they go first; the
//! loose text tier catches sparse records.

use crate::catalog::query::params;
use crate::catalog::QuerySpec;
use crate::models::RecordAttributes;
use serde::Serialize;

/// Identifying signal a planned query is built from
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize)]
#[serde(rename_all = "snake_case")]
pub enum QueryTier {
    Barcode,
    CatalogNumber,
    Structured,
    LooseText,
}

/// A search spec tagged with the tier that produced it
#[derive(Debug, Clone, PartialEq, Eq, Serialize)]
pub struct PlannedQuery {
    pub tier: QueryTier,
    pub spec: QuerySpec,
}

/// Builds one tier's spec on top of the base spec, or `None` if the record
/// lacks the tier's signal
pub type TierBuilder = fn(&RecordAttributes, QuerySpec) -> Option<QuerySpec>;

/// Tiers in precedence order
pub const TIERS: [(QueryTier, TierBuilder); 4] = [
    (QueryTier::Barcode, barcode_tier),
    (QueryTier::CatalogNumber, catalog_number_tier),
    (QueryTier::Structured, structured_tier),
    (QueryTier::LooseText, loose_text_tier),
];

/// Stateless query planner
#[derive(Debug, Clone, Copy, Default)]
pub struct QueryPlanner;

impl QueryPlanner {
    pub fn new() -> Self {
        Self
    }

    /// Ordered, de-duplicated search plan for `record`
    ///
    /// An empty plan means the record carries no searchable signal.
    pub fn plan(&self, record: &RecordAttributes) -> Vec<PlannedQuery> {
        let base = base_spec(record);
        let mut plan: Vec<PlannedQuery> = Vec::with_capacity(TIERS.len());

        for (tier, build) in TIERS {
            let Some(spec) = build(record, base.clone()) else {
                continue;
            };
            if plan.iter().any(|planned| planned.spec == spec) {
                tracing::trace!(?tier, "Dropping duplicate query spec");
                continue;
            }
            plan.push(PlannedQuery { tier, spec });
        }

        plan
    }
}

/// `{type=release, format=LP, country=<record country>}`
pub fn base_spec(record: &RecordAttributes) -> QuerySpec {
    QuerySpec::new()
        .with(params::TYPE, "release")
        .with(params::FORMAT, "LP")
        .with(params::COUNTRY, record.country())
}

fn year_param(record: &RecordAttributes) -> Option<String> {
    record.year.map(|y| y.to_string())
}

pub fn barcode_tier(record: &RecordAttributes, base: QuerySpec) -> Option<QuerySpec> {
    let barcode = record.barcode()?;
    Some(
        base.with(params::BARCODE, barcode)
            .with_opt(params::ARTIST, record.artist())
            .with_opt(params::RELEASE_TITLE, record.title())
            .with_opt(params::YEAR, year_param(record)),
    )
}

pub fn catalog_number_tier(record: &RecordAttributes, base: QuerySpec) -> Option<QuerySpec> {
    let catno = record.catalog_number()?;
    Some(
        base.with(params::CATNO, catno)
            .with_opt(params::LABEL, record.label())
            .with_opt(params::ARTIST, record.artist())
            .with_opt(params::YEAR, year_param(record)),
    )
}

pub fn structured_tier(record: &RecordAttributes, base: QuerySpec) -> Option<QuerySpec> {
    if record.artist().is_none() && record.title().is_none() {
        return None;
    }
    Some(
        base.with_opt(params::ARTIST, record.artist())
            .with_opt(params::RELEASE_TITLE, record.title())
            .with_opt(params::YEAR, year_param(record)),
    )
}

pub fn loose_text_tier(record: &RecordAttributes, base: QuerySpec) -> Option<QuerySpec> {
    let words: Vec<&str> = [record.artist(), record.title()].into_iter().flatten().collect();
    if words.is_empty() {
        return None;
    }
    Some(
        base.with(params::QUERY, words.join(" "))
            .with_opt(params::YEAR, year_param(record)),
    )
}
