//! Domain types for media entries and their franchise graph.
//!
//! A [`Media`] is one entry of a franchise (a season, a movie, an OVA) as the
//! metadata provider describes it. Only prequel and sequel edges take part in
//! release resolution; every other relation kind is carried as [`RelationKind::Other`].

pub mod events;

use chrono::{DateTime, NaiveDate, Utc};
use serde::{Deserialize, Serialize};
use std::fmt;

/// Unique identifier of a media entry at the metadata provider.
///
/// # Examples
///
/// ```rust
/// use release_resolver::domain::MediaId;
///
/// let id = MediaId::new(42);
/// assert_eq!(id.value(), 42);
/// assert_eq!(id.to_string(), "42");
/// ```
#[derive(Debug, Clone, Copy, PartialEq, Eq, PartialOrd, Ord, Hash, Default)]
pub struct MediaId(i32);

impl MediaId {
    #[must_use]
    pub const fn new(id: i32) -> Self {
        debug_assert!(id >= 0, "MediaId should be non-negative");
        Self(id)
    }

    #[must_use]
    pub const fn value(&self) -> i32 {
        self.0
    }
}

impl fmt::Display for MediaId {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "{}", self.0)
    }
}

impl From<MediaId> for i32 {
    fn from(id: MediaId) -> Self {
        id.0
    }
}

impl From<i32> for MediaId {
    fn from(id: i32) -> Self {
        Self::new(id)
    }
}

impl Serialize for MediaId {
    fn serialize<S>(&self, serializer: S) -> Result<S::Ok, S::Error>
    where
        S: serde::Serializer,
    {
        serializer.serialize_i32(self.0)
    }
}

impl<'de> Deserialize<'de> for MediaId {
    fn deserialize<D>(deserializer: D) -> Result<Self, D::Error>
    where
        D: serde::Deserializer<'de>,
    {
        let id = i32::deserialize(deserializer)?;
        Ok(Self::new(id))
    }
}

/// Airing status. Cancelled and hiatus entries land in `Other` and never
/// count as released for date windows or sequel lookups.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize, Default)]
#[serde(rename_all = "SCREAMING_SNAKE_CASE")]
pub enum MediaStatus {
    NotYetReleased,
    Releasing,
    Finished,
    #[default]
    #[serde(other)]
    Other,
}

impl MediaStatus {
    /// Releasing or finished: the entry has (or had) episodes on the feeds.
    #[must_use]
    pub const fn has_aired(self) -> bool {
        matches!(self, Self::Releasing | Self::Finished)
    }
}

#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize, Default)]
#[serde(rename_all = "SCREAMING_SNAKE_CASE")]
pub enum MediaFormat {
    Tv,
    TvShort,
    Movie,
    Special,
    Ova,
    Ona,
    Music,
    #[default]
    #[serde(other)]
    Unknown,
}

#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "SCREAMING_SNAKE_CASE")]
pub enum RelationKind {
    Prequel,
    Sequel,
    #[serde(other)]
    Other,
}

/// A possibly incomplete calendar date as published by the metadata provider.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize, Default)]
pub struct FuzzyDate {
    pub year: Option<i32>,
    pub month: Option<u32>,
    pub day: Option<u32>,
}

impl FuzzyDate {
    #[must_use]
    pub const fn new(year: i32, month: u32, day: u32) -> Self {
        Self {
            year: Some(year),
            month: Some(month),
            day: Some(day),
        }
    }

    /// Midnight UTC of this date. A missing month or day counts as the first;
    /// a missing year means the date is unknown.
    #[must_use]
    pub fn to_datetime(&self) -> Option<DateTime<Utc>> {
        let date =
            NaiveDate::from_ymd_opt(self.year?, self.month.unwrap_or(1), self.day.unwrap_or(1))?;
        Some(date.and_hms_opt(0, 0, 0)?.and_utc())
    }
}

/// Every localized title the provider knows for a media.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize, Default)]
#[serde(rename_all = "camelCase")]
pub struct MediaTitle {
    pub romaji: Option<String>,
    pub english: Option<String>,
    pub native: Option<String>,
    pub user_preferred: Option<String>,
}

impl MediaTitle {
    /// Title fields in provider order, skipping absent ones.
    pub fn iter(&self) -> impl Iterator<Item = &str> {
        [
            self.romaji.as_deref(),
            self.english.as_deref(),
            self.native.as_deref(),
            self.user_preferred.as_deref(),
        ]
        .into_iter()
        .flatten()
    }

    /// Best display title.
    #[must_use]
    pub fn display(&self) -> &str {
        self.user_preferred
            .as_deref()
            .or(self.english.as_deref())
            .or(self.romaji.as_deref())
            .or(self.native.as_deref())
            .unwrap_or("?")
    }
}

/// The adjacent entry at the far end of a franchise edge.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct RelatedMedia {
    pub id: MediaId,
    #[serde(default)]
    pub title: MediaTitle,
    #[serde(default)]
    pub status: MediaStatus,
    #[serde(default)]
    pub format: MediaFormat,
    pub episodes: Option<u32>,
    pub start_date: Option<FuzzyDate>,
    pub end_date: Option<FuzzyDate>,
}

#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct MediaEdge {
    pub kind: RelationKind,
    pub node: RelatedMedia,
}

#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize, Default)]
#[serde(rename_all = "camelCase")]
pub struct Media {
    pub id: MediaId,
    pub title: MediaTitle,
    #[serde(default)]
    pub synonyms: Vec<String>,
    /// `None` when the provider does not know the count yet; never read as zero.
    pub episodes: Option<u32>,
    pub next_airing_episode: Option<u32>,
    #[serde(default)]
    pub status: MediaStatus,
    #[serde(default)]
    pub format: MediaFormat,
    pub season: Option<String>,
    pub season_year: Option<i32>,
    pub start_date: Option<FuzzyDate>,
    pub end_date: Option<FuzzyDate>,
    #[serde(default)]
    pub relations: Vec<MediaEdge>,
}

impl Media {
    /// First edge of the given kind. `RelationKind::Other` never matches.
    #[must_use]
    pub fn edge(&self, kind: RelationKind) -> Option<&RelatedMedia> {
        if kind == RelationKind::Other {
            return None;
        }
        self.relations
            .iter()
            .find(|e| e.kind == kind)
            .map(|e| &e.node)
    }

    #[must_use]
    pub fn prequel(&self) -> Option<&RelatedMedia> {
        self.edge(RelationKind::Prequel)
    }

    #[must_use]
    pub fn sequel(&self) -> Option<&RelatedMedia> {
        self.edge(RelationKind::Sequel)
    }

    /// Known episode count, else the last aired episode inferred from the
    /// next airing one.
    #[must_use]
    pub fn max_episode(&self) -> Option<u32> {
        self.episodes.or_else(|| {
            self.next_airing_episode
                .map(|next| next.saturating_sub(1))
                .filter(|&ep| ep > 0)
        })
    }

    #[must_use]
    pub fn is_single_episode(&self) -> bool {
        self.episodes == Some(1)
    }

    /// Finished airing with more than one episode, so whole-season batches exist.
    #[must_use]
    pub fn is_batch_eligible(&self) -> bool {
        self.status == MediaStatus::Finished && self.episodes.is_some_and(|eps| eps > 1)
    }
}
