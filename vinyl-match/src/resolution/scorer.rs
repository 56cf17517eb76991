//! Table-driven candidate scoring
//!
//! Scores are additive integers with no normalisation. They only rank
//! candidates within one resolution call.

use super::Candidate;
use crate::models::RecordAttributes;
use serde::{Deserialize, Serialize};
use thiserror::Error;

/// Tunable scoring weights
///
/// Only the relative ordering is a contract: exact beats substring for the
/// same field, and the catalogue number is the dominant single signal.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(default)]
pub struct ScoringWeights {
    pub artist_exact: u32,
    pub artist_partial: u32,
    pub title_exact: u32,
    pub title_partial: u32,
    pub year_near: u32,
    /// Maximum year difference still counted as agreement
    pub year_tolerance: u32,
    pub country_match: u32,
    pub catalog_number_exact: u32,
    pub album_format: u32,
    pub has_image: u32,
}

impl Default for ScoringWeights {
    fn default() -> Self {
        Self {
            artist_exact: 30,
            artist_partial: 12,
            title_exact: 30,
            title_partial: 12,
            year_near: 10,
            year_tolerance: 1,
            country_match: 10,
            catalog_number_exact: 40,
            album_format: 4,
            has_image: 8,
        }
    }
}

/// Weight configuration breaking the ordering contract
#[derive(Debug, Clone, PartialEq, Eq, Error)]
pub enum WeightsError {
    #[error("{field}: exact weight {exact} must exceed partial weight {partial}")]
    ExactNotAbovePartial {
        field: &'static str,
        exact: u32,
        partial: u32,
    },

    #[error("catalog_number_exact ({catalog_number}) must be the largest weight, {other} is {weight}")]
    CatalogNumberNotDominant {
        catalog_number: u32,
        other: &'static str,
        weight: u32,
    },
}

impl ScoringWeights {
    pub fn validate(&self) -> Result<(), WeightsError> {
        for (field, exact, partial) in [
            ("artist", self.artist_exact, self.artist_partial),
            ("title", self.title_exact, self.title_partial),
        ] {
            if exact <= partial {
                return Err(WeightsError::ExactNotAbovePartial {
                    field,
                    exact,
                    partial,
                });
            }
        }

        for (other, weight) in [
            ("artist_exact", self.artist_exact),
            ("title_exact", self.title_exact),
            ("year_near", self.year_near),
            ("country_match", self.country_match),
            ("album_format", self.album_format),
            ("has_image", self.has_image),
        ] {
            if weight > self.catalog_number_exact {
                return Err(WeightsError::CatalogNumberNotDominant {
                    catalog_number: self.catalog_number_exact,
                    other,
                    weight,
                });
            }
        }

        Ok(())
    }

    /// Points awarded for one signal
    pub fn points(&self, signal: Signal) -> u32 {
        match signal {
            Signal::ArtistExact => self.artist_exact,
            Signal::ArtistPartial => self.artist_partial,
            Signal::TitleExact => self.title_exact,
            Signal::TitlePartial => self.title_partial,
            Signal::YearNear => self.year_near,
            Signal::CountryMatch => self.country_match,
            Signal::CatalogNumberExact => self.catalog_number_exact,
            Signal::AlbumFormat => self.album_format,
            Signal::HasImage => self.has_image,
        }
    }
}

/// One row of the scoring table
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize)]
#[serde(rename_all = "snake_case")]
pub enum Signal {
    ArtistExact,
    ArtistPartial,
    TitleExact,
    TitlePartial,
    YearNear,
    CountryMatch,
    CatalogNumberExact,
    AlbumFormat,
    HasImage,
}

/// Signals that fired for one candidate, with their points
#[derive(Debug, Clone, Default, PartialEq, Eq, Serialize)]
pub struct ScoreBreakdown {
    pub contributions: Vec<(Signal, u32)>,
}

impl ScoreBreakdown {
    pub fn total(&self) -> u32 {
        self.contributions.iter().map(|(_, points)| points).sum()
    }

    pub fn has(&self, signal: Signal) -> bool {
        self.contributions.iter().any(|(s, _)| *s == signal)
    }
}

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
enum TextAgreement {
    Exact,
    Partial,
    None,
}

/// Case-insensitive comparison of a record field against a candidate field
///
/// Partial means the record value is contained in the candidate value.
fn text_agreement(record_value: Option<&str>, candidate_value: Option<&str>) -> TextAgreement {
    let (Some(wanted), Some(found)) = (record_value, candidate_value) else {
        return TextAgreement::None;
    };
    let wanted = normalize_text(wanted);
    let found = normalize_text(found);
    if wanted.is_empty() || found.is_empty() {
        TextAgreement::None
    } else if wanted == found {
        TextAgreement::Exact
    } else if found.contains(&wanted) {
        TextAgreement::Partial
    } else {
        TextAgreement::None
    }
}

/// Lower-case and collapse internal whitespace
fn normalize_text(value: &str) -> String {
    value
        .split_whitespace()
        .collect::<Vec<_>>()
        .join(" ")
        .to_lowercase()
}

/// Catalogue numbers compare on alphanumerics only: `"CL-1355"` == `"cl 1355"`
fn normalize_catalog_number(value: &str) -> String {
    value
        .chars()
        .filter(|c| c.is_alphanumeric())
        .flat_map(char::to_uppercase)
        .collect()
}

/// Weighted field-agreement scorer
#[derive(Debug, Clone)]
pub struct CandidateScorer {
    weights: ScoringWeights,
}

impl Default for CandidateScorer {
    fn default() -> Self {
        Self {
            weights: ScoringWeights::default(),
        }
    }
}

impl CandidateScorer {
    pub fn new(weights: ScoringWeights) -> Result<Self, WeightsError> {
        weights.validate()?;
        Ok(Self { weights })
    }

    pub fn weights(&self) -> &ScoringWeights {
        &self.weights
    }

    pub fn score(&self, candidate: &Candidate, record: &RecordAttributes) -> u32 {
        self.breakdown(candidate, record).total()
    }

    /// Evaluate every signal of the scoring table
    pub fn breakdown(&self, candidate: &Candidate, record: &RecordAttributes) -> ScoreBreakdown {
        let mut fired: Vec<Signal> = Vec::new();

        let candidate_artist = candidate.artist();
        match text_agreement(record.artist(), candidate_artist.as_deref()) {
            TextAgreement::Exact => fired.push(Signal::ArtistExact),
            TextAgreement::Partial => fired.push(Signal::ArtistPartial),
            TextAgreement::None => {}
        }

        match text_agreement(record.title(), Some(candidate.title())) {
            TextAgreement::Exact => fired.push(Signal::TitleExact),
            TextAgreement::Partial => fired.push(Signal::TitlePartial),
            TextAgreement::None => {}
        }

        if let (Some(wanted), Some(found)) = (record.year, candidate.year()) {
            if wanted.abs_diff(found) <= self.weights.year_tolerance {
                fired.push(Signal::YearNear);
            }
        }

        if candidate
            .country()
            .is_some_and(|c| c.to_uppercase() == record.country())
        {
            fired.push(Signal::CountryMatch);
        }

        if let Some(wanted) = record.catalog_number().map(normalize_catalog_number) {
            let matched = !wanted.is_empty()
                && candidate
                    .catalog_numbers()
                    .into_iter()
                    .any(|catno| normalize_catalog_number(catno) == wanted);
            if matched {
                fired.push(Signal::CatalogNumberExact);
            }
        }

        if candidate.format_tokens().contains("album") {
            fired.push(Signal::AlbumFormat);
        }

        if candidate.has_images() {
            fired.push(Signal::HasImage);
        }

        ScoreBreakdown {
            contributions: fired
                .into_iter()
                .map(|signal| (signal, self.weights.points(signal)))
                .collect(),
        }
    }
}
