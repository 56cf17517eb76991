//! End-to-end catalog resolution against an in-memory catalog

mod helpers;

use helpers::{primary_image, us_lp_hit, us_lp_release, FakeCatalog};
use vinyl_match::catalog::{SearchResultItem, TrackEntry};
use vinyl_match::models::RecordAttributes;
use vinyl_match::resolution::{
    Candidate, CandidateScorer, ConstraintViolation, QueryPlanner, QueryTier, ReleaseResolver,
    ResolveError, ResolveOutcome, ResolverSettings, ScoredCandidate, TrackSelectionError,
};

fn kind_of_blue() -> RecordAttributes {
    RecordAttributes::new("Miles Davis", "Kind of Blue")
        .with_country("US")
        .with_catalog_number("CL 1355")
}

/// Query spec of `tier` in the record's plan
fn spec_for(record: &RecordAttributes, tier: QueryTier) -> vinyl_match::catalog::QuerySpec {
    QueryPlanner::new()
        .plan(record)
        .into_iter()
        .find(|planned| planned.tier == tier)
        .map(|planned| planned.spec)
        .unwrap()
}

fn exhaustive() -> ResolverSettings {
    ResolverSettings {
        strong_match_score: 1000,
        ..Default::default()
    }
}

async fn resolve(
    catalog: FakeCatalog,
    settings: ResolverSettings,
    record: &RecordAttributes,
) -> (ResolveOutcome, ReleaseResolver<FakeCatalog>) {
    let resolver = ReleaseResolver::new(catalog, CandidateScorer::default(), settings);
    let outcome = resolver.resolve_catalog_match(record, None).await.unwrap();
    (outcome, resolver)
}

fn winner(outcome: ResolveOutcome) -> ScoredCandidate {
    match outcome {
        ResolveOutcome::Matched(winner) => winner,
        ResolveOutcome::NoSuitableRelease => panic!("expected a match"),
    }
}

/// Artist exact (30) + country (10) + album (4) + image (8) = 52
fn fifty_two_point_hit(id: u64) -> SearchResultItem {
    SearchResultItem {
        format: vec!["Vinyl".to_string(), "LP".to_string(), "Album".to_string()],
        thumb: Some(format!("https://img/{}-150.jpg", id)),
        ..us_lp_hit(id, "Miles Davis - Sketches Of Spain")
    }
}

#[tokio::test]
async fn test_best_is_global_across_tiers() {
    let record = kind_of_blue();
    let catalog = FakeCatalog::new()
        .with_search(
            spec_for(&record, QueryTier::CatalogNumber),
            vec![us_lp_hit(1, "Someone Else - Another Record")],
        )
        .with_search(
            spec_for(&record, QueryTier::Structured),
            vec![us_lp_hit(2, "Miles Davis - Kind Of Blue")],
        )
        .with_search(
            spec_for(&record, QueryTier::LooseText),
            vec![us_lp_hit(3, "Miles Davis - Milestones")],
        );

    let (outcome, resolver) = resolve(catalog, exhaustive(), &record).await;
    let winner = winner(outcome);

    assert_eq!(winner.candidate.id(), 2);
    assert_eq!(winner.score, 70);
    assert_eq!(winner.tier, Some(QueryTier::Structured));
    assert_eq!(resolver.catalog().search_count(), 3);
}

#[tokio::test]
async fn test_tie_keeps_earlier_tier() {
    let record = kind_of_blue();
    let catalog = FakeCatalog::new()
        .with_search(
            spec_for(&record, QueryTier::Structured),
            vec![fifty_two_point_hit(200)],
        )
        .with_search(
            spec_for(&record, QueryTier::LooseText),
            vec![fifty_two_point_hit(300)],
        );

    let (outcome, _) = resolve(catalog, exhaustive(), &record).await;
    let winner = winner(outcome);

    assert_eq!(winner.score, 52);
    assert_eq!(winner.candidate.id(), 200);
    assert_eq!(winner.tier, Some(QueryTier::Structured));
}

#[tokio::test]
async fn test_strong_match_stops_early() {
    let record = kind_of_blue();
    let strong = SearchResultItem {
        catno: Some("CL 1355".to_string()),
        ..us_lp_hit(10, "Miles Davis - Kind Of Blue")
    };
    let catalog = FakeCatalog::new()
        .with_search(spec_for(&record, QueryTier::CatalogNumber), vec![strong])
        .with_search(
            spec_for(&record, QueryTier::Structured),
            vec![us_lp_hit(11, "Miles Davis - Kind Of Blue")],
        );

    let (outcome, resolver) = resolve(catalog, ResolverSettings::default(), &record).await;
    let winner = winner(outcome);

    assert_eq!(winner.candidate.id(), 10);
    assert_eq!(winner.score, 110);
    assert_eq!(resolver.catalog().search_count(), 1);
}

#[tokio::test]
async fn test_failing_tier_is_skipped() {
    let record = kind_of_blue();
    // Catalogue-number search is not registered and fails
    let catalog = FakeCatalog::new().with_search(
        spec_for(&record, QueryTier::Structured),
        vec![us_lp_hit(5, "Miles Davis - Kind Of Blue")],
    );

    let (outcome, resolver) = resolve(catalog, ResolverSettings::default(), &record).await;
    let winner = winner(outcome);

    assert_eq!(winner.candidate.id(), 5);
    assert_eq!(winner.tier, Some(QueryTier::Structured));
    assert_eq!(resolver.catalog().search_count(), 2);
}

#[tokio::test]
async fn test_constraints_beat_text_similarity() {
    let record = kind_of_blue();
    let uk_pressing = SearchResultItem {
        country: Some("UK".to_string()),
        catno: Some("CL 1355".to_string()),
        ..us_lp_hit(20, "Miles Davis - Kind Of Blue")
    };
    let cd = SearchResultItem {
        format: vec!["CD".to_string(), "Album".to_string()],
        ..us_lp_hit(21, "Miles Davis - Kind Of Blue")
    };
    let weak_us_lp = us_lp_hit(22, "Various - Jazz Classics");

    let catalog = FakeCatalog::new().with_search(
        spec_for(&record, QueryTier::CatalogNumber),
        vec![uk_pressing, cd, weak_us_lp],
    );

    let (outcome, _) = resolve(catalog, exhaustive(), &record).await;
    let winner = winner(outcome);
    assert_eq!(winner.candidate.id(), 22);
    assert_eq!(winner.score, 10);
}

#[tokio::test]
async fn test_only_non_conforming_hits_is_no_suitable_release() {
    let record = kind_of_blue();
    let catalog = FakeCatalog::new().with_search(
        spec_for(&record, QueryTier::Structured),
        vec![SearchResultItem {
            country: None,
            ..us_lp_hit(30, "Miles Davis - Kind Of Blue")
        }],
    );

    let (outcome, resolver) = resolve(catalog, ResolverSettings::default(), &record).await;
    assert_eq!(outcome, ResolveOutcome::NoSuitableRelease);
    // No detail fetches for filtered-out hits
    assert!(resolver.catalog().release_calls.lock().unwrap().is_empty());
}

#[tokio::test]
async fn test_winner_has_maximum_score() {
    let record = kind_of_blue().with_year(1959);
    let structured = vec![
        us_lp_hit(40, "Miles Davis Quintet - Kind Of Blue"),
        SearchResultItem {
            year: Some(1959),
            ..us_lp_hit(41, "Miles Davis - Kind Of Blue (Mono)")
        },
    ];
    let loose = vec![
        SearchResultItem {
            year: Some(1960),
            catno: Some("CL-1355".to_string()),
            ..us_lp_hit(42, "Miles Davis - Kind Of Blue")
        },
        us_lp_hit(43, "Bill Evans - Kind Of Blue"),
    ];
    let all: Vec<SearchResultItem> = structured.iter().chain(loose.iter()).cloned().collect();

    let catalog = FakeCatalog::new()
        .with_search(spec_for(&record, QueryTier::Structured), structured)
        .with_search(spec_for(&record, QueryTier::LooseText), loose);

    let (outcome, _) = resolve(catalog, exhaustive(), &record).await;
    let winner = winner(outcome);

    let scorer = CandidateScorer::default();
    let max = all
        .into_iter()
        .map(|hit| scorer.score(&Candidate::Summary(hit), &record))
        .max()
        .unwrap();
    assert_eq!(winner.score, max);
    assert_eq!(winner.candidate.id(), 42);
}

#[tokio::test]
async fn test_expanded_detail_replaces_search_hit() {
    let record = kind_of_blue();
    let mut detail = us_lp_release(50, "Miles Davis", "Kind Of Blue");
    detail.images = vec![primary_image("https://img/50.jpg")];

    let catalog = FakeCatalog::new()
        .with_search(
            spec_for(&record, QueryTier::Structured),
            vec![us_lp_hit(50, "Miles Davis - Kind Of Blue")],
        )
        .with_release(detail);

    let (outcome, _) = resolve(catalog, ResolverSettings::default(), &record).await;
    let winner = winner(outcome);

    assert!(matches!(winner.candidate, Candidate::Release(_)));
    // Summary score 70 plus the image bonus from the detail
    assert_eq!(winner.score, 78);
}

#[tokio::test]
async fn test_override_outside_country_is_rejected() {
    let mut detail = us_lp_release(60, "Miles Davis", "Kind Of Blue");
    detail.country = Some("Japan".to_string());
    let resolver = ReleaseResolver::new(
        FakeCatalog::new().with_release(detail),
        CandidateScorer::default(),
        ResolverSettings::default(),
    );

    let err = resolver
        .resolve_catalog_match(&kind_of_blue(), Some(60))
        .await
        .unwrap_err();

    assert_eq!(
        err,
        ResolveError::ConstraintViolation {
            release_id: 60,
            violation: ConstraintViolation::CountryMismatch {
                required: "US".to_string(),
                found: "Japan".to_string(),
            },
        }
    );
    assert_eq!(resolver.catalog().search_count(), 0);
}

#[tokio::test]
async fn test_candidates_listed_best_first() {
    let record = kind_of_blue();
    // Catalogue-number search fails and is skipped
    let catalog = FakeCatalog::new()
        .with_search(
            spec_for(&record, QueryTier::Structured),
            vec![
                fifty_two_point_hit(200),
                us_lp_hit(2, "Miles Davis - Kind Of Blue"),
            ],
        )
        .with_search(
            spec_for(&record, QueryTier::LooseText),
            vec![
                fifty_two_point_hit(300),
                us_lp_hit(2, "Miles Davis - Kind Of Blue"),
                SearchResultItem {
                    country: Some("UK".to_string()),
                    ..us_lp_hit(301, "Miles Davis - Kind Of Blue")
                },
            ],
        );

    let resolver = ReleaseResolver::new(
        catalog,
        CandidateScorer::default(),
        ResolverSettings::default(),
    );
    let listed = resolver.candidates(&record).await;

    let ranking: Vec<(u64, u32)> = listed.iter().map(|c| (c.candidate.id(), c.score)).collect();
    assert_eq!(ranking, vec![(2, 70), (200, 52), (300, 52)]);
    assert_eq!(listed[0].tier, Some(QueryTier::Structured));
    assert_eq!(listed[2].tier, Some(QueryTier::LooseText));
    // No early exit when listing
    assert_eq!(resolver.catalog().search_count(), 3);
}

#[tokio::test]
async fn test_candidates_empty_when_every_tier_fails() {
    let resolver = ReleaseResolver::new(
        FakeCatalog::new(),
        CandidateScorer::default(),
        ResolverSettings::default(),
    );
    assert!(resolver.candidates(&kind_of_blue()).await.is_empty());
}

fn kind_of_blue_tracklist() -> Vec<TrackEntry> {
    [("A1", "So What", "9:22"), ("A2", "Freddie Freeloader", "9:46"), ("B1", "Blue In Green", "5:37")]
        .into_iter()
        .map(|(position, title, duration)| TrackEntry {
            position: position.to_string(),
            title: title.to_string(),
            duration: duration.to_string(),
        })
        .collect()
}

#[tokio::test]
async fn test_select_tracks_expands_search_winner() {
    let record = kind_of_blue();
    let mut detail = us_lp_release(70, "Miles Davis", "Kind Of Blue");
    detail.year = Some(1959);
    detail.tracklist = kind_of_blue_tracklist();

    let catalog = FakeCatalog::new()
        .with_search(
            spec_for(&record, QueryTier::Structured),
            vec![us_lp_hit(70, "Miles Davis - Kind Of Blue")],
        )
        .with_release(detail);
    // Winner stays a search hit until tracks are requested
    let settings = ResolverSettings {
        detail_fetch_limit: 0,
        ..Default::default()
    };
    let resolver = ReleaseResolver::new(catalog, CandidateScorer::default(), settings);

    let selection = resolver.select_tracks(&record, None).await.unwrap();

    assert_eq!(selection.release_id, 70);
    assert_eq!(selection.derived_year, Some(1959));
    let sides: Vec<&str> = selection.tracks.iter().map(|t| t.side.as_str()).collect();
    assert_eq!(sides, vec!["A", "A", "B"]);
    assert_eq!(selection.tracks[2].title, "Blue In Green");
    assert_eq!(*resolver.catalog().release_calls.lock().unwrap(), vec![70]);
}

#[tokio::test]
async fn test_select_tracks_rechecks_expanded_release() {
    let record = kind_of_blue();
    let mut detail = us_lp_release(71, "Miles Davis", "Kind Of Blue");
    detail.formats[0].descriptions = vec!["Album".to_string()];

    let catalog = FakeCatalog::new()
        .with_search(
            spec_for(&record, QueryTier::Structured),
            vec![us_lp_hit(71, "Miles Davis - Kind Of Blue")],
        )
        .with_release(detail);
    let settings = ResolverSettings {
        detail_fetch_limit: 0,
        ..Default::default()
    };
    let resolver = ReleaseResolver::new(catalog, CandidateScorer::default(), settings);

    let err = resolver.select_tracks(&record, None).await.unwrap_err();
    assert!(matches!(
        err,
        TrackSelectionError::ConstraintViolation { release_id: 71, .. }
    ));
}

#[tokio::test]
async fn test_select_tracks_without_release_details() {
    let record = kind_of_blue();
    let catalog = FakeCatalog::new().with_search(
        spec_for(&record, QueryTier::Structured),
        vec![us_lp_hit(72, "Miles Davis - Kind Of Blue")],
    );
    let resolver = ReleaseResolver::new(catalog, CandidateScorer::default(), ResolverSettings::default());

    let err = resolver.select_tracks(&record, None).await.unwrap_err();
    assert!(matches!(
        err,
        TrackSelectionError::DetailUnavailable { release_id: 72, .. }
    ));
}
