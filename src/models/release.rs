use chrono::{DateTime, Utc};
use serde::{Deserialize, Serialize};

/// Placeholder the feed parser uses for missing text fields.
pub const UNKNOWN_FIELD: &str = "?";

/// One item of a release feed.
///
/// `link` identifies the entry: within a single resolution result no two
/// entries share it.
#[derive(Debug, Clone, Serialize, Deserialize, PartialEq, Eq)]
pub struct ReleaseEntry {
    pub title: String,

    pub link: String,

    pub seeders: Option<u32>,

    pub leechers: Option<u32>,

    pub downloads: Option<u32>,

    pub size: Option<String>,

    pub date: Option<DateTime<Utc>>,

    /// Set when the link's numeric id is in the curated verified list.
    #[serde(default)]
    pub verified: bool,
}

impl ReleaseEntry {
    #[must_use]
    pub fn new(title: impl Into<String>, link: impl Into<String>) -> Self {
        Self {
            title: title.into(),
            link: link.into(),
            seeders: None,
            leechers: None,
            downloads: None,
            size: None,
            date: None,
            verified: false,
        }
    }

    #[must_use]
    pub const fn with_date(mut self, date: DateTime<Utc>) -> Self {
        self.date = Some(date);
        self
    }

    /// Size in bytes when the feed published a parseable size.
    #[must_use]
    pub fn size_bytes(&self) -> Option<i64> {
        self.size
            .as_deref()
            .and_then(crate::parser::size::parse_size)
    }
}

/// A parsed feed: the channel's top publish date plus its items in feed order.
#[derive(Debug, Clone, Default, PartialEq, Eq)]
pub struct FeedDocument {
    /// Raw text of the first `pubDate` in the document, used as a change marker.
    pub pub_date: Option<String>,

    pub items: Vec<ReleaseEntry>,
}

/// Fields recovered from a release title by the filename parser.
#[derive(Debug, Clone, Serialize, Deserialize, PartialEq)]
pub struct ParsedRelease {
    pub original_filename: String,

    pub title: String,

    pub episode_number: f32,

    pub season: Option<i32>,

    pub group: Option<String>,

    pub resolution: Option<String>,

    pub source: Option<String>,

    pub version: Option<i32>,
}

impl ParsedRelease {
    /// Whole episode number, if the parsed number has no fractional part.
    #[must_use]
    #[allow(clippy::cast_possible_truncation, clippy::cast_sign_loss)]
    pub fn whole_episode(&self) -> Option<u32> {
        (self.episode_number >= 0.0 && self.episode_number.fract() == 0.0)
            .then_some(self.episode_number as u32)
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn size_bytes_parses_feed_sizes() {
        let mut entry = ReleaseEntry::new("title", "https://nyaa.si/download/1.torrent");
        assert_eq!(entry.size_bytes(), None);
        entry.size = Some("1.5 GiB".to_string());
        assert_eq!(entry.size_bytes(), Some(1_610_612_736));
    }

    #[test]
    fn whole_episode_rejects_specials() {
        let mut parsed = ParsedRelease {
            original_filename: String::new(),
            title: "Show".to_string(),
            episode_number: 12.0,
            season: None,
            group: None,
            resolution: None,
            source: None,
            version: None,
        };
        assert_eq!(parsed.whole_episode(), Some(12));
        parsed.episode_number = 12.5;
        assert_eq!(parsed.whole_episode(), None);
    }
}
