//! Catalog release resolution
//!
//! Maps sparse local record attributes to the single best US LP release in
//! the external catalog.

pub mod candidate;
pub mod filter;
pub mod orchestrator;
pub mod planner;
pub mod scorer;

pub use candidate::Candidate;
pub use filter::{CandidateFilter, ConstraintViolation, LP_TOKEN};
pub use orchestrator::{
    CoverSelection, CoverSelectionError, ReleaseResolver, ResolveError, ResolveOutcome,
    ResolverSettings, ScoredCandidate, TrackSelection, TrackSelectionError,
};
pub use planner::{PlannedQuery, QueryPlanner, QueryTier};
pub use scorer::{CandidateScorer, ScoreBreakdown, ScoringWeights, Signal, WeightsError};
