//! Nearest-record ranking over stored cover embeddings

use super::similarity::cosine_similarity;
use super::EmbeddingSet;
use crate::models::RecordId;
use serde::{Deserialize, Serialize};
use std::cmp::Ordering;

/// Acceptance thresholds for a cover match
#[derive(Debug, Clone, Copy, PartialEq, Serialize, Deserialize)]
pub struct ConfidenceThresholds {
    /// Minimum best similarity
    pub min_score: f64,
    /// Minimum lead of the best over the second best
    pub min_gap: f64,
}

/// Slack for comparing differences of similarities against a threshold
const THRESHOLD_EPSILON: f64 = 1e-9;

impl ConfidenceThresholds {
    pub const STRICT: Self = Self {
        min_score: 0.80,
        min_gap: 0.10,
    };

    pub const LENIENT: Self = Self {
        min_score: 0.35,
        min_gap: 0.05,
    };

    /// Both bounds are inclusive
    pub fn is_confident(&self, best: f64, second: f64) -> bool {
        best + THRESHOLD_EPSILON >= self.min_score
            && best - second + THRESHOLD_EPSILON >= self.min_gap
    }
}

impl Default for ConfidenceThresholds {
    fn default() -> Self {
        Self::STRICT
    }
}

/// Named threshold calibration
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum ThresholdPreset {
    #[default]
    Strict,
    Lenient,
}

impl ThresholdPreset {
    pub fn thresholds(self) -> ConfidenceThresholds {
        match self {
            ThresholdPreset::Strict => ConfidenceThresholds::STRICT,
            ThresholdPreset::Lenient => ConfidenceThresholds::LENIENT,
        }
    }
}

/// One entry of the ranked list
#[derive(Debug, Clone, PartialEq, Serialize)]
pub struct RankedRecord {
    pub record_id: RecordId,
    pub score: f64,
    pub artist: Option<String>,
    pub title: Option<String>,
}

#[derive(Debug, Clone, PartialEq, Serialize)]
pub struct MatchResult {
    pub best_record_id: RecordId,
    pub best_score: f64,
    /// 0.0 when only one record was ranked
    pub second_best_score: f64,
    pub gap: f64,
    pub confident: bool,
    pub top_k: Vec<RankedRecord>,
}

#[derive(Debug, Clone, PartialEq, Serialize)]
#[serde(tag = "outcome", rename_all = "snake_case")]
pub enum MatchOutcome {
    /// The store holds no vectors; rebuild embeddings first
    NoEmbeddingsAvailable,
    Matched(MatchResult),
}

pub const DEFAULT_TOP_K: usize = 5;

/// Ranks records by their closest stored embedding
#[derive(Debug, Clone)]
pub struct EmbeddingMatcher {
    thresholds: ConfidenceThresholds,
    top_k: usize,
}

impl Default for EmbeddingMatcher {
    fn default() -> Self {
        Self::new(ConfidenceThresholds::default(), DEFAULT_TOP_K)
    }
}

impl EmbeddingMatcher {
    /// `top_k` is clamped to at least 1
    pub fn new(thresholds: ConfidenceThresholds, top_k: usize) -> Self {
        Self {
            thresholds,
            top_k: top_k.max(1),
        }
    }

    pub fn thresholds(&self) -> &ConfidenceThresholds {
        &self.thresholds
    }

    pub fn rank(&self, query: &[f32], set: &EmbeddingSet) -> MatchOutcome {
        let mut scored: Vec<(RecordId, f64)> = set
            .iter()
            .filter(|(_, vectors)| !vectors.is_empty())
            .map(|(&record_id, vectors)| {
                let best = vectors
                    .iter()
                    .map(|v| cosine_similarity(query, v))
                    .fold(f64::NEG_INFINITY, f64::max);
                (record_id, best)
            })
            .collect();

        if scored.is_empty() {
            return MatchOutcome::NoEmbeddingsAvailable;
        }

        scored.sort_by(|a, b| {
            b.1.partial_cmp(&a.1)
                .unwrap_or(Ordering::Equal)
                .then_with(|| a.0.cmp(&b.0))
        });

        let (best_record_id, best_score) = scored[0];
        let second_best_score = scored.get(1).map_or(0.0, |(_, score)| *score);
        let gap = best_score - second_best_score;

        tracing::debug!(
            candidates = scored.len(),
            best_record_id,
            best_score,
            second_best_score,
            "Ranked cover embeddings"
        );

        MatchOutcome::Matched(MatchResult {
            best_record_id,
            best_score,
            second_best_score,
            gap,
            confident: self.thresholds.is_confident(best_score, second_best_score),
            top_k: scored
                .into_iter()
                .take(self.top_k)
                .map(|(record_id, score)| RankedRecord {
                    record_id,
                    score,
                    artist: None,
                    title: None,
                })
                .collect(),
        })
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    fn set(entries: &[(RecordId, Vec<Vec<f32>>)]) -> EmbeddingSet {
        entries.iter().cloned().collect()
    }

    fn matched(outcome: MatchOutcome) -> MatchResult {
        match outcome {
            MatchOutcome::Matched(result) => result,
            MatchOutcome::NoEmbeddingsAvailable => panic!("expected a match"),
        }
    }

    #[test]
    fn test_empty_set() {
        let matcher = EmbeddingMatcher::default();
        assert_eq!(
            matcher.rank(&[1.0, 0.0], &EmbeddingSet::new()),
            MatchOutcome::NoEmbeddingsAvailable
        );
        let hollow = set(&[(1, vec![]), (2, vec![])]);
        assert_eq!(
            matcher.rank(&[1.0, 0.0], &hollow),
            MatchOutcome::NoEmbeddingsAvailable
        );
    }

    #[test]
    fn test_max_over_record_vectors() {
        let matcher = EmbeddingMatcher::default();
        let embeddings = set(&[
            (1, vec![vec![0.0, 1.0], vec![1.0, 0.0]]),
            (2, vec![vec![1.0, 1.0]]),
        ]);
        let result = matched(matcher.rank(&[1.0, 0.0], &embeddings));

        assert_eq!(result.best_record_id, 1);
        assert!((result.best_score - 1.0).abs() < 1e-9);
        assert!((result.second_best_score - std::f64::consts::FRAC_1_SQRT_2).abs() < 1e-6);
        assert!(result.confident);
    }

    #[test]
    fn test_single_record_second_best_is_zero() {
        let matcher = EmbeddingMatcher::default();
        let result = matched(matcher.rank(&[1.0, 0.0], &set(&[(9, vec![vec![1.0, 0.1]])])));
        assert_eq!(result.second_best_score, 0.0);
        assert_eq!(result.gap, result.best_score);
        assert_eq!(result.top_k.len(), 1);
    }

    #[test]
    fn test_ties_break_by_record_id() {
        let matcher = EmbeddingMatcher::default();
        let embeddings = set(&[
            (30, vec![vec![1.0, 0.0]]),
            (10, vec![vec![1.0, 0.0]]),
            (20, vec![vec![1.0, 0.0]]),
        ]);
        let result = matched(matcher.rank(&[1.0, 0.0], &embeddings));
        let ids: Vec<RecordId> = result.top_k.iter().map(|r| r.record_id).collect();
        assert_eq!(ids, vec![10, 20, 30]);
        // Zero gap is never confident
        assert!(!result.confident);
    }

    #[test]
    fn test_top_k_truncates() {
        let matcher = EmbeddingMatcher::new(ConfidenceThresholds::STRICT, 2);
        let embeddings = set(&[
            (1, vec![vec![1.0, 0.0]]),
            (2, vec![vec![0.9, 0.1]]),
            (3, vec![vec![0.5, 0.5]]),
            (4, vec![vec![0.0, 1.0]]),
        ]);
        let result = matched(matcher.rank(&[1.0, 0.0], &embeddings));
        assert_eq!(result.top_k.len(), 2);
        assert_eq!(result.top_k[0].record_id, 1);
        assert_eq!(result.top_k[1].record_id, 2);
        assert!(result.top_k[0].score >= result.top_k[1].score);
    }

    #[test]
    fn test_strict_thresholds() {
        let strict = ConfidenceThresholds::STRICT;
        assert!(strict.is_confident(0.95, 0.50));
        assert!(!strict.is_confident(0.79, 0.0));
        assert!(!strict.is_confident(0.90, 0.85));
    }

    #[test]
    fn test_thresholds_are_inclusive() {
        let strict = ConfidenceThresholds::STRICT;
        // 0.9 - 0.8 is 0.09999999999999998 in f64
        assert!(strict.is_confident(0.9, 0.8));
        assert!(strict.is_confident(0.8, 0.7));
        assert!(!strict.is_confident(0.9, 0.81));
    }

    #[test]
    fn test_lenient_accepts_weaker_match() {
        let lenient = ThresholdPreset::Lenient.thresholds();
        assert!(lenient.is_confident(0.40, 0.30));
        assert!(!ThresholdPreset::Strict.thresholds().is_confident(0.40, 0.30));
    }

    #[test]
    fn test_preset_deserializes_lowercase() {
        let preset: ThresholdPreset = serde_json::from_str("\"lenient\"").unwrap();
        assert_eq!(preset, ThresholdPreset::Lenient);
        assert_eq!(ThresholdPreset::default(), ThresholdPreset::Strict);
    }
}
