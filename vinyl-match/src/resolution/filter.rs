//! Hard constraints on catalog candidates: LP format and exact country

use super::Candidate;
use serde::Serialize;
use thiserror::Error;

/// Format token every accepted candidate must carry
pub const LP_TOKEN: &str = "lp";

/// Why a candidate failed the constraints
#[derive(Debug, Clone, PartialEq, Eq, Error, Serialize)]
#[serde(tag = "reason", rename_all = "snake_case")]
pub enum ConstraintViolation {
    #[error("format {found:?} does not include '{required}'")]
    FormatMismatch { required: String, found: Vec<String> },

    #[error("release has no country (required {required})")]
    MissingCountry { required: String },

    #[error("country {found} does not match required {required}")]
    CountryMismatch { required: String, found: String },
}

/// Candidate constraint check
///
/// Never mutates the candidate. Country comparison is case-insensitive and
/// exact; a candidate without a country always fails.
#[derive(Debug, Clone)]
pub struct CandidateFilter {
    format_token: String,
}

impl Default for CandidateFilter {
    fn default() -> Self {
        Self::lp_only()
    }
}

impl CandidateFilter {
    pub fn lp_only() -> Self {
        Self {
            format_token: LP_TOKEN.to_string(),
        }
    }

    /// Check both constraints, reporting the first one that fails
    pub fn check(
        &self,
        candidate: &Candidate,
        required_country: &str,
    ) -> Result<(), ConstraintViolation> {
        let tokens = candidate.format_tokens();
        if !tokens.contains(&self.format_token) {
            return Err(ConstraintViolation::FormatMismatch {
                required: self.format_token.clone(),
                found: tokens.into_iter().collect(),
            });
        }

        let required = required_country.trim().to_uppercase();
        match candidate.country() {
            None => Err(ConstraintViolation::MissingCountry { required }),
            Some(country) if country.to_uppercase() != required => {
                Err(ConstraintViolation::CountryMismatch {
                    required,
                    found: country.to_string(),
                })
            }
            Some(_) => Ok(()),
        }
    }

    pub fn allowed(&self, candidate: &Candidate, required_country: &str) -> bool {
        self.check(candidate, required_country).is_ok()
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::catalog::{ReleaseDetail, ReleaseFormat, SearchResultItem};

    fn hit(country: Option<&str>, formats: &[&str]) -> Candidate {
        Candidate::Summary(SearchResultItem {
            id: 1,
            country: country.map(str::to_string),
            format: formats.iter().map(|f| f.to_string()).collect(),
            ..Default::default()
        })
    }

    #[test]
    fn test_lp_in_required_country_passes() {
        let filter = CandidateFilter::default();
        assert!(filter.allowed(&hit(Some("US"), &["Vinyl", "LP", "Album"]), "US"));
        assert!(filter.allowed(&hit(Some("us"), &["vinyl", "lp"]), "US"));
        assert!(filter.allowed(&hit(Some("US"), &["LP"]), "us"));
    }

    #[test]
    fn test_non_lp_rejected_regardless_of_country() {
        let filter = CandidateFilter::default();
        let cases: [&[&str]; 4] = [&["CD", "Album"], &["Vinyl", "7\"", "Single"], &["Cassette"], &[]];
        for formats in cases {
            let candidate = hit(Some("US"), formats);
            assert!(matches!(
                filter.check(&candidate, "US"),
                Err(ConstraintViolation::FormatMismatch { .. })
            ));
        }
    }

    #[test]
    fn test_lp_token_must_be_whole() {
        // "LP" inside a longer token is not an LP
        let filter = CandidateFilter::default();
        assert!(!filter.allowed(&hit(Some("US"), &["2xLP Box Set"]), "US"));
    }

    #[test]
    fn test_country_mismatch_rejected() {
        let filter = CandidateFilter::default();
        let result = filter.check(&hit(Some("UK"), &["Vinyl", "LP"]), "US");
        assert_eq!(
            result,
            Err(ConstraintViolation::CountryMismatch {
                required: "US".to_string(),
                found: "UK".to_string(),
            })
        );
    }

    #[test]
    fn test_missing_country_fails_closed() {
        let filter = CandidateFilter::default();
        assert!(matches!(
            filter.check(&hit(None, &["LP"]), "US"),
            Err(ConstraintViolation::MissingCountry { .. })
        ));
        assert!(!filter.allowed(&hit(Some("  "), &["LP"]), "US"));
    }

    #[test]
    fn test_release_detail_descriptions_count() {
        let filter = CandidateFilter::default();
        let candidate = Candidate::Release(ReleaseDetail {
            id: 2,
            country: Some("Germany".to_string()),
            formats: vec![ReleaseFormat {
                name: "Vinyl".to_string(),
                qty: Some("1".to_string()),
                descriptions: vec!["LP".to_string(), "Album".to_string()],
            }],
            ..Default::default()
        });
        assert!(filter.allowed(&candidate, "germany"));
        assert!(!filter.allowed(&candidate, "US"));
    }

    #[test]
    fn test_filter_does_not_mutate() {
        let filter = CandidateFilter::default();
        let candidate = hit(Some("us"), &["LP"]);
        let before = candidate.clone();
        let _ = filter.check(&candidate, "US");
        assert_eq!(candidate, before);
    }
}
