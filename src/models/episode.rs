use crate::domain::Media;
use serde::Serialize;

/// Per-episode descriptor from the episode-metadata provider.
#[derive(Debug, Clone, Serialize, PartialEq, Eq)]
pub struct EpisodeMetadata {
    pub number: u32,
    pub title: Option<String>,
    pub thumbnail: Option<String>,
    pub aired: Option<String>,
}

/// One candidate returned by the title-to-media resolver.
#[derive(Debug, Clone, Serialize)]
pub struct MediaMatch {
    /// Title text the match was made from.
    pub parsed_title: String,

    pub media: Option<Media>,

    /// Episode the release claims, if the title carried one.
    pub episode: Option<u32>,

    /// The claimed episode does not fit the matched media.
    pub failed: bool,
}

impl MediaMatch {
    #[must_use]
    pub fn unresolved(parsed_title: impl Into<String>, episode: Option<u32>) -> Self {
        Self {
            parsed_title: parsed_title.into(),
            media: None,
            episode,
            failed: false,
        }
    }
}

/// A feed item paired with its best media guess.
#[derive(Debug, Clone, Serialize)]
pub struct ResolvedRelease {
    pub title: String,

    /// What a download action needs; adding the torrent is the caller's job.
    pub link: String,

    pub matched: Option<MediaMatch>,

    pub episode_data: Option<EpisodeMetadata>,
}

impl ResolvedRelease {
    #[must_use]
    pub fn media(&self) -> Option<&Media> {
        self.matched.as_ref().and_then(|m| m.media.as_ref())
    }
}
