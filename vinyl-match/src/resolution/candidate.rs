//! Uniform view over search hits and release details

use crate::catalog::types::strip_disambiguation;
use crate::catalog::{CoverImage, ReleaseDetail, SearchResultItem};
use serde::Serialize;
use std::collections::BTreeSet;

/// A catalog entry under evaluation
///
/// Search hits carry less information than release details (no artist list,
/// no image list), so every accessor answers from whatever is available.
#[derive(Debug, Clone, PartialEq, Serialize)]
#[serde(tag = "kind", content = "data", rename_all = "snake_case")]
pub enum Candidate {
    Summary(SearchResultItem),
    Release(ReleaseDetail),
}

impl Candidate {
    pub fn id(&self) -> u64 {
        match self {
            Candidate::Summary(item) => item.id,
            Candidate::Release(detail) => detail.id,
        }
    }

    /// Release title without the artist prefix
    pub fn title(&self) -> &str {
        match self {
            Candidate::Summary(item) => split_search_title(&item.title).1,
            Candidate::Release(detail) => detail.title.trim(),
        }
    }

    /// Artist credit, if the candidate carries one
    pub fn artist(&self) -> Option<String> {
        let artist = match self {
            Candidate::Summary(item) => {
                split_search_title(&item.title).0.map(|a| strip_disambiguation(a).to_string())
            }
            Candidate::Release(detail) => Some(detail.artist_names()),
        };
        artist.filter(|a| !a.is_empty())
    }

    pub fn year(&self) -> Option<i32> {
        match self {
            Candidate::Summary(item) => item.year,
            Candidate::Release(detail) => detail.derived_year(),
        }
    }

    pub fn country(&self) -> Option<&str> {
        let country = match self {
            Candidate::Summary(item) => item.country.as_deref(),
            Candidate::Release(detail) => detail.country.as_deref(),
        };
        country.map(str::trim).filter(|c| !c.is_empty())
    }

    /// Lower-cased format tokens: each format name plus its descriptions
    pub fn format_tokens(&self) -> BTreeSet<String> {
        match self {
            Candidate::Summary(item) => item
                .format
                .iter()
                .map(|f| f.trim().to_lowercase())
                .filter(|f| !f.is_empty())
                .collect(),
            Candidate::Release(detail) => detail
                .formats
                .iter()
                .flat_map(|f| std::iter::once(&f.name).chain(f.descriptions.iter()))
                .map(|f| f.trim().to_lowercase())
                .filter(|f| !f.is_empty())
                .collect(),
        }
    }

    pub fn catalog_numbers(&self) -> Vec<&str> {
        match self {
            Candidate::Summary(item) => item.catno.as_deref().into_iter().collect(),
            Candidate::Release(detail) => detail
                .labels
                .iter()
                .filter_map(|l| l.catno.as_deref())
                .collect(),
        }
    }

    pub fn has_images(&self) -> bool {
        match self {
            Candidate::Summary(item) => [&item.cover_image, &item.thumb]
                .iter()
                .any(|url| url.as_deref().is_some_and(|u| !u.trim().is_empty())),
            Candidate::Release(detail) => !detail.images.is_empty(),
        }
    }

    /// Cover artwork for this candidate
    pub fn cover_image(&self) -> Option<CoverImage> {
        match self {
            Candidate::Release(detail) => detail.best_image(),
            Candidate::Summary(item) => {
                let thumb = item.thumb.clone().filter(|u| !u.trim().is_empty());
                let full = item.cover_image.clone().filter(|u| !u.trim().is_empty());
                match (full, thumb) {
                    (Some(uri), thumbnail) => Some(CoverImage { uri, thumbnail }),
                    (None, Some(thumb)) => Some(CoverImage {
                        uri: thumb.clone(),
                        thumbnail: Some(thumb),
                    }),
                    (None, None) => None,
                }
            }
        }
    }
}

/// Split `"Artist - Title"` at the first separator
fn split_search_title(title: &str) -> (Option<&str>, &str) {
    match title.split_once(" - ") {
        Some((artist, release)) => (Some(artist.trim()), release.trim()),
        None => (None, title.trim()),
    }
}
