//! Catalog response types (Discogs search hits and release details)
//!
//! Field names follow the Discogs JSON. Everything except the id is optional
//! in practice, so fields default instead of failing deserialization.

use serde::{Deserialize, Deserializer, Serialize};

/// Search hit from `/database/search`
///
/// `title` has the form `"Artist - Release Title"`.
#[derive(Debug, Clone, Default, PartialEq, Serialize, Deserialize)]
pub struct SearchResultItem {
    pub id: u64,
    #[serde(default)]
    pub title: String,
    #[serde(default, deserialize_with = "deserialize_year")]
    pub year: Option<i32>,
    #[serde(default)]
    pub country: Option<String>,
    #[serde(default)]
    pub format: Vec<String>,
    #[serde(default)]
    pub label: Vec<String>,
    #[serde(default)]
    pub catno: Option<String>,
    #[serde(default)]
    pub barcode: Vec<String>,
    #[serde(default)]
    pub thumb: Option<String>,
    #[serde(default)]
    pub cover_image: Option<String>,
}

/// Full release from `/releases/{id}`
#[derive(Debug, Clone, Default, PartialEq, Serialize, Deserialize)]
pub struct ReleaseDetail {
    pub id: u64,
    #[serde(default)]
    pub title: String,
    /// Release year; Discogs reports 0 when unknown, which maps to `None`
    #[serde(default, deserialize_with = "deserialize_year")]
    pub year: Option<i32>,
    /// Release date, `YYYY`, `YYYY-MM` or `YYYY-MM-DD`
    #[serde(default)]
    pub released: Option<String>,
    #[serde(default)]
    pub country: Option<String>,
    #[serde(default)]
    pub formats: Vec<ReleaseFormat>,
    #[serde(default)]
    pub artists: Vec<ReleaseArtist>,
    #[serde(default)]
    pub labels: Vec<ReleaseLabel>,
    #[serde(default)]
    pub images: Vec<ReleaseImage>,
    #[serde(default)]
    pub tracklist: Vec<TrackEntry>,
}

#[derive(Debug, Clone, Default, PartialEq, Serialize, Deserialize)]
pub struct ReleaseFormat {
    #[serde(default)]
    pub name: String,
    #[serde(default)]
    pub qty: Option<String>,
    #[serde(default)]
    pub descriptions: Vec<String>,
}

#[derive(Debug, Clone, Default, PartialEq, Serialize, Deserialize)]
pub struct ReleaseArtist {
    #[serde(default)]
    pub name: String,
    #[serde(default)]
    pub id: Option<u64>,
}

#[derive(Debug, Clone, Default, PartialEq, Serialize, Deserialize)]
pub struct ReleaseLabel {
    #[serde(default)]
    pub name: String,
    #[serde(default)]
    pub catno: Option<String>,
}

#[derive(Debug, Clone, Default, PartialEq, Serialize, Deserialize)]
pub struct ReleaseImage {
    /// `"primary"` or `"secondary"`
    #[serde(rename = "type", default)]
    pub kind: String,
    #[serde(default)]
    pub uri: Option<String>,
    #[serde(default)]
    pub uri150: Option<String>,
    #[serde(default)]
    pub resource_url: Option<String>,
}

#[derive(Debug, Clone, Default, PartialEq, Serialize, Deserialize)]
pub struct TrackEntry {
    #[serde(default)]
    pub position: String,
    #[serde(default)]
    pub title: String,
    #[serde(default)]
    pub duration: String,
}

/// Track normalised for local storage
#[derive(Debug, Clone, PartialEq, Eq, Serialize)]
pub struct Track {
    pub side: String,
    pub position: Option<String>,
    pub title: String,
    pub duration: Option<String>,
}

/// Chosen cover artwork: full-size URI plus optional 150px thumbnail
#[derive(Debug, Clone, PartialEq, Eq, Serialize)]
pub struct CoverImage {
    pub uri: String,
    pub thumbnail: Option<String>,
}

impl ReleaseDetail {
    /// Artist credit as one display string
    ///
    /// Discogs disambiguation suffixes such as `"Nirvana (2)"` are removed.
    pub fn artist_names(&self) -> String {
        self.artists
            .iter()
            .map(|a| strip_disambiguation(&a.name))
            .filter(|name| !name.is_empty())
            .collect::<Vec<_>>()
            .join(", ")
    }

    /// Year from `year`, falling back to the first four characters of `released`
    pub fn derived_year(&self) -> Option<i32> {
        if let Some(year) = self.year {
            return Some(year);
        }
        let released = self.released.as_deref()?.trim();
        released
            .get(..4)
            .and_then(|y| y.parse::<i32>().ok())
            .filter(|y| *y > 0)
    }

    /// Preferred cover: first primary image with a URI, else first image with a URI
    ///
    /// The thumbnail is the 150px variant, or the image's resource URL when
    /// Discogs omits it.
    pub fn best_image(&self) -> Option<CoverImage> {
        let has_uri = |img: &&ReleaseImage| img.uri.as_deref().is_some_and(|u| !u.is_empty());

        let winner = self
            .images
            .iter()
            .filter(has_uri)
            .find(|img| img.kind == "primary")
            .or_else(|| self.images.iter().find(has_uri))?;

        Some(CoverImage {
            uri: winner.uri.clone()?,
            thumbnail: [&winner.uri150, &winner.resource_url]
                .into_iter()
                .flatten()
                .find(|u| !u.is_empty())
                .cloned(),
        })
    }

    /// Tracklist with vinyl sides derived from positions (`"B2"` → side `"B"`)
    pub fn tracks(&self) -> Vec<Track> {
        self.tracklist
            .iter()
            .map(|t| {
                let position = t.position.trim();
                let side = position
                    .chars()
                    .next()
                    .filter(|c| c.is_alphabetic())
                    .map(|c| c.to_uppercase().to_string())
                    .unwrap_or_else(|| "A".to_string());
                let title = t.title.trim();
                let duration = t.duration.trim();

                Track {
                    side,
                    position: (!position.is_empty()).then(|| position.to_string()),
                    title: if title.is_empty() {
                        "Untitled".to_string()
                    } else {
                        title.to_string()
                    },
                    duration: (!duration.is_empty()).then(|| duration.to_string()),
                }
            })
            .collect()
    }
}

/// Remove a trailing Discogs disambiguation number: `"Nirvana (2)"` → `"Nirvana"`
pub fn strip_disambiguation(name: &str) -> &str {
    let trimmed = name.trim();
    if let Some(open) = trimmed.rfind(" (") {
        let suffix = &trimmed[open + 2..];
        if let Some(digits) = suffix.strip_suffix(')') {
            if !digits.is_empty() && digits.chars().all(|c| c.is_ascii_digit()) {
                return trimmed[..open].trim_end();
            }
        }
    }
    trimmed
}

#[derive(Deserialize)]
#[serde(untagged)]
enum YearRepr {
    Number(i64),
    Text(String),
}

/// Accept `1959`, `"1959"`, `0`, `""` or `null`; non-positive years become `None`
fn deserialize_year<'de, D>(deserializer: D) -> Result<Option<i32>, D::Error>
where
    D: Deserializer<'de>,
{
    let raw: Option<YearRepr> = Option::deserialize(deserializer)?;
    Ok(raw.and_then(|repr| match repr {
        YearRepr::Number(n) => i32::try_from(n).ok(),
        YearRepr::Text(s) => s.trim().parse::<i32>().ok(),
    })
    .filter(|y| *y > 0))
}
