//! Release resolution: plan → search → filter → expand → score → select
//!
//! Tiers run sequentially in plan order. The running best is kept across all
//! tiers and only replaced by a strictly higher score, so ties go to the
//! earlier tier. A failing tier is skipped, never retried.

use super::filter::{CandidateFilter, ConstraintViolation};
use super::planner::{QueryPlanner, QueryTier};
use super::scorer::CandidateScorer;
use super::Candidate;
use crate::catalog::{CatalogDetailProvider, CatalogSearchProvider, QuerySpec, Track};
use crate::error::ProviderError;
use crate::models::RecordAttributes;
use serde::Serialize;
use std::collections::HashSet;
use thiserror::Error;
use tracing::{debug, info, warn};

/// Resolution tuning
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct ResolverSettings {
    /// Search hits per tier expanded through a detail fetch
    pub detail_fetch_limit: usize,
    /// Stop after the tier in which the running best reaches this score
    pub strong_match_score: u32,
}

impl Default for ResolverSettings {
    fn default() -> Self {
        Self {
            detail_fetch_limit: 8,
            strong_match_score: 40,
        }
    }
}

/// Winning candidate with its score
#[derive(Debug, Clone, PartialEq, Serialize)]
pub struct ScoredCandidate {
    pub candidate: Candidate,
    pub score: u32,
    /// Tier that produced the candidate, `None` for a manual override
    pub tier: Option<QueryTier>,
}

#[derive(Debug, Clone, PartialEq, Serialize)]
#[serde(tag = "outcome", rename_all = "snake_case")]
pub enum ResolveOutcome {
    Matched(ScoredCandidate),
    /// No constraint-satisfying candidate in any tier
    NoSuitableRelease,
}

#[derive(Debug, Clone, PartialEq, Error)]
pub enum ResolveError {
    #[error("Release {release_id} violates constraints: {violation}")]
    ConstraintViolation {
        release_id: u64,
        violation: ConstraintViolation,
    },
}

/// Cover artwork chosen for a record
#[derive(Debug, Clone, PartialEq, Serialize)]
pub struct CoverSelection {
    pub release_id: u64,
    pub cover_url: String,
    pub thumbnail_url: Option<String>,
    /// Release year, reported only when the record has none
    pub derived_year: Option<i32>,
    pub score: u32,
}

#[derive(Debug, Clone, PartialEq, Error)]
pub enum CoverSelectionError {
    #[error("No suitable US LP release found")]
    NoSuitableRelease,

    #[error("Release {release_id} violates constraints: {violation}")]
    ConstraintViolation {
        release_id: u64,
        violation: ConstraintViolation,
    },

    #[error("Release {release_id} has no images")]
    NoImages { release_id: u64 },
}

/// Tracklist of the release chosen for a record
#[derive(Debug, Clone, PartialEq, Serialize)]
pub struct TrackSelection {
    pub release_id: u64,
    pub tracks: Vec<Track>,
    /// Release year, reported only when the record has none
    pub derived_year: Option<i32>,
}

#[derive(Debug, Clone, PartialEq, Error)]
pub enum TrackSelectionError {
    #[error("No suitable US LP release found")]
    NoSuitableRelease,

    #[error("Release {release_id} violates constraints: {violation}")]
    ConstraintViolation {
        release_id: u64,
        violation: ConstraintViolation,
    },

    #[error("Release {release_id} details unavailable: {reason}")]
    DetailUnavailable { release_id: u64, reason: String },
}

impl From<ResolveError> for TrackSelectionError {
    fn from(err: ResolveError) -> Self {
        match err {
            ResolveError::ConstraintViolation {
                release_id,
                violation,
            } => TrackSelectionError::ConstraintViolation {
                release_id,
                violation,
            },
        }
    }
}

impl From<ResolveError> for CoverSelectionError {
    fn from(err: ResolveError) -> Self {
        match err {
            ResolveError::ConstraintViolation {
                release_id,
                violation,
            } => CoverSelectionError::ConstraintViolation {
                release_id,
                violation,
            },
        }
    }
}

/// Resolves local records against a catalog
pub struct ReleaseResolver<C> {
    catalog: C,
    planner: QueryPlanner,
    filter: CandidateFilter,
    scorer: CandidateScorer,
    settings: ResolverSettings,
}

impl<C> ReleaseResolver<C>
where
    C: CatalogSearchProvider + CatalogDetailProvider,
{
    pub fn new(catalog: C, scorer: CandidateScorer, settings: ResolverSettings) -> Self {
        Self {
            catalog,
            planner: QueryPlanner::new(),
            filter: CandidateFilter::lp_only(),
            scorer,
            settings,
        }
    }

    pub fn catalog(&self) -> &C {
        &self.catalog
    }

    pub fn settings(&self) -> &ResolverSettings {
        &self.settings
    }

    /// Best constraint-satisfying release for `record`
    ///
    /// With `override_id` the planner is bypassed and that release alone is
    /// checked. Catalog failures never surface here; they skip a tier or
    /// degrade to [`ResolveOutcome::NoSuitableRelease`].
    pub async fn resolve_catalog_match(
        &self,
        record: &RecordAttributes,
        override_id: Option<u64>,
    ) -> Result<ResolveOutcome, ResolveError> {
        let country = record.country();

        if let Some(release_id) = override_id {
            return self.resolve_override(record, release_id, &country).await;
        }

        let plan = self.planner.plan(record);
        if plan.is_empty() {
            info!("Record has no searchable attributes");
            return Ok(ResolveOutcome::NoSuitableRelease);
        }

        let mut best: Option<ScoredCandidate> = None;

        for planned in plan {
            let candidates = match self.tier_candidates(&planned.spec, &country).await {
                Ok(candidates) => candidates,
                Err(e) => {
                    warn!(tier = ?planned.tier, error = %e, "Catalog search failed, skipping tier");
                    continue;
                }
            };

            debug!(
                tier = ?planned.tier,
                candidates = candidates.len(),
                "Scoring tier candidates"
            );

            for candidate in candidates {
                let score = self.scorer.score(&candidate, record);
                if best.as_ref().map_or(true, |b| score > b.score) {
                    best = Some(ScoredCandidate {
                        candidate,
                        score,
                        tier: Some(planned.tier),
                    });
                }
            }

            if let Some(b) = &best {
                if b.score >= self.settings.strong_match_score {
                    debug!(tier = ?planned.tier, score = b.score, "Strong match, stopping early");
                    break;
                }
            }
        }

        match best {
            Some(winner) => {
                info!(
                    release_id = winner.candidate.id(),
                    score = winner.score,
                    tier = ?winner.tier,
                    "Resolved catalog release"
                );
                Ok(ResolveOutcome::Matched(winner))
            }
            None => {
                info!(country = %country, "No suitable release found");
                Ok(ResolveOutcome::NoSuitableRelease)
            }
        }
    }

    /// Resolve, then pick the winning release's cover artwork
    pub async fn select_cover(
        &self,
        record: &RecordAttributes,
        override_id: Option<u64>,
    ) -> Result<CoverSelection, CoverSelectionError> {
        let ResolveOutcome::Matched(winner) =
            self.resolve_catalog_match(record, override_id).await?
        else {
            return Err(CoverSelectionError::NoSuitableRelease);
        };

        let release_id = winner.candidate.id();
        let cover = winner
            .candidate
            .cover_image()
            .ok_or(CoverSelectionError::NoImages { release_id })?;

        Ok(CoverSelection {
            release_id,
            cover_url: cover.uri,
            thumbnail_url: cover.thumbnail,
            derived_year: record.year.is_none().then(|| winner.candidate.year()).flatten(),
            score: winner.score,
        })
    }

    /// Resolve, then take the winning release's tracklist
    ///
    /// A winner known only from search results is expanded first and must
    /// still satisfy the constraints.
    pub async fn select_tracks(
        &self,
        record: &RecordAttributes,
        override_id: Option<u64>,
    ) -> Result<TrackSelection, TrackSelectionError> {
        let ResolveOutcome::Matched(winner) =
            self.resolve_catalog_match(record, override_id).await?
        else {
            return Err(TrackSelectionError::NoSuitableRelease);
        };

        let release_id = winner.candidate.id();
        let detail = match winner.candidate {
            Candidate::Release(detail) => detail,
            Candidate::Summary(_) => {
                let detail = self.catalog.release(release_id).await.map_err(|e| {
                    TrackSelectionError::DetailUnavailable {
                        release_id,
                        reason: e.to_string(),
                    }
                })?;
                self.filter
                    .check(&Candidate::Release(detail.clone()), &record.country())
                    .map_err(|violation| TrackSelectionError::ConstraintViolation {
                        release_id,
                        violation,
                    })?;
                detail
            }
        };

        let tracks = detail.tracks();
        debug!(release_id, tracks = tracks.len(), "Selected tracklist");

        Ok(TrackSelection {
            release_id,
            derived_year: record.year.is_none().then(|| detail.derived_year()).flatten(),
            tracks,
        })
    }

    /// Every constraint-satisfying candidate for `record`, best first
    ///
    /// All tiers are searched. Equal scores keep first-seen order, and a
    /// release found by several tiers is listed once, under its earliest
    /// tier. Failing tiers are skipped.
    pub async fn candidates(&self, record: &RecordAttributes) -> Vec<ScoredCandidate> {
        let country = record.country();
        let mut seen = HashSet::new();
        let mut listed = Vec::new();

        for planned in self.planner.plan(record) {
            let candidates = match self.tier_candidates(&planned.spec, &country).await {
                Ok(candidates) => candidates,
                Err(e) => {
                    warn!(tier = ?planned.tier, error = %e, "Catalog search failed, skipping tier");
                    continue;
                }
            };

            for candidate in candidates {
                if !seen.insert(candidate.id()) {
                    continue;
                }
                let score = self.scorer.score(&candidate, record);
                listed.push(ScoredCandidate {
                    candidate,
                    score,
                    tier: Some(planned.tier),
                });
            }
        }

        // Stable sort keeps first-seen order among equal scores
        listed.sort_by(|a, b| b.score.cmp(&a.score));
        info!(candidates = listed.len(), "Listed catalog candidates");
        listed
    }

    async fn resolve_override(
        &self,
        record: &RecordAttributes,
        release_id: u64,
        country: &str,
    ) -> Result<ResolveOutcome, ResolveError> {
        let detail = match self.catalog.release(release_id).await {
            Ok(detail) => detail,
            Err(e) => {
                warn!(release_id, error = %e, "Override release fetch failed");
                return Ok(ResolveOutcome::NoSuitableRelease);
            }
        };

        let candidate = Candidate::Release(detail);
        self.filter
            .check(&candidate, country)
            .map_err(|violation| ResolveError::ConstraintViolation {
                release_id,
                violation,
            })?;

        let score = self.scorer.score(&candidate, record);
        info!(release_id, score, "Using override release");

        Ok(ResolveOutcome::Matched(ScoredCandidate {
            candidate,
            score,
            tier: None,
        }))
    }

    /// Search one tier and return its constraint-satisfying candidates
    async fn tier_candidates(
        &self,
        spec: &QuerySpec,
        country: &str,
    ) -> Result<Vec<Candidate>, ProviderError> {
        let hits = self.catalog.search(spec).await?;
        let total = hits.len();

        let survivors: Vec<Candidate> = hits
            .into_iter()
            .map(Candidate::Summary)
            .filter(|hit| self.filter.allowed(hit, country))
            .collect();

        debug!(hits = total, survivors = survivors.len(), "Filtered search hits");

        let mut candidates = Vec::with_capacity(survivors.len());
        for (index, hit) in survivors.into_iter().enumerate() {
            if index >= self.settings.detail_fetch_limit {
                candidates.push(hit);
                continue;
            }

            let release_id = hit.id();
            match self.catalog.release(release_id).await {
                Ok(detail) => {
                    let expanded = Candidate::Release(detail);
                    if let Err(violation) = self.filter.check(&expanded, country) {
                        debug!(release_id, %violation, "Dropping expanded release");
                    } else {
                        candidates.push(expanded);
                    }
                }
                Err(e) => {
                    debug!(release_id, error = %e, "Detail fetch failed, keeping search hit");
                    candidates.push(hit);
                }
            }
        }

        Ok(candidates)
    }
}
