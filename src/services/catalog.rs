//! AniList-backed franchise graph, title resolver and episode metadata.

use crate::clients::anilist::AnilistClient;
use crate::constants::limits::MAX_SEASON_WALK;
use crate::domain::{Media, MediaFormat, MediaId};
use crate::models::episode::{EpisodeMetadata, MediaMatch};
use crate::parser::title::{
    detect_season_from_title, normalize_for_matching, parse_release_title, parse_show_title,
};
use crate::services::completeness::episode_in_range;
use crate::services::providers::{
    EpisodeMetadataProvider, FranchiseGraph, ProviderError, SeasonOffset, TitleResolver,
};
use std::collections::HashSet;
use std::sync::Arc;
use tracing::debug;

#[derive(Clone)]
pub struct AnilistCatalog {
    client: Arc<AnilistClient>,
}

impl AnilistCatalog {
    #[must_use]
    pub const fn new(client: Arc<AnilistClient>) -> Self {
        Self { client }
    }
}

/// Formats whose episodes continue the season numbering.
const fn counts_toward_offset(format: MediaFormat) -> bool {
    matches!(
        format,
        MediaFormat::Tv | MediaFormat::TvShort | MediaFormat::Ona
    )
}

/// Search text and claimed episode for a release title.
fn search_terms(text: &str) -> (String, Option<u32>) {
    match parse_release_title(text) {
        Some(parsed) => {
            let episode = parsed.whole_episode();
            let search = match parsed.season {
                Some(season) if season > 1 && detect_season_from_title(&parsed.title).is_none() => {
                    format!("{} Season {season}", parsed.title)
                }
                _ => parsed.title,
            };
            (search, episode)
        }
        None => (parse_show_title(text), None),
    }
}

fn matches_exactly(media: &Media, normalized: &str) -> bool {
    media
        .title
        .iter()
        .chain(media.synonyms.iter().map(String::as_str))
        .any(|t| normalize_for_matching(t) == normalized)
}

#[async_trait::async_trait]
impl FranchiseGraph for AnilistCatalog {
    async fn media(&self, id: MediaId) -> Result<Media, ProviderError> {
        self.client
            .get_media(id)
            .await?
            .ok_or(ProviderError::NotFound(id))
    }

    async fn resolve_season(
        &self,
        media: &Media,
        episode: u32,
        force: bool,
    ) -> Result<Option<SeasonOffset>, ProviderError> {
        let Some(first) = media.prequel() else {
            return Ok(None);
        };
        if !force && media.max_episode().is_none_or(|max| episode <= max) {
            return Ok(None);
        }

        let mut visited = HashSet::from([media.id]);
        let mut next = Some(first.id);
        let mut offset: u32 = 0;
        let mut root = None;

        for _ in 0..MAX_SEASON_WALK {
            let Some(id) = next.take() else { break };
            if !visited.insert(id) {
                break;
            }

            let prequel = self.media(id).await?;
            if counts_toward_offset(prequel.format) {
                let Some(count) = prequel.episodes else {
                    debug!(media_id = %id, "Prequel episode count unknown, no offset");
                    return Ok(None);
                };
                offset = offset.saturating_add(count);
            }
            next = prequel.prequel().map(|p| p.id);
            root = Some(prequel);
        }

        Ok(root.map(|root| SeasonOffset { offset, root }))
    }
}

#[async_trait::async_trait]
impl TitleResolver for AnilistCatalog {
    async fn resolve_title(&self, text: &str) -> Result<Vec<MediaMatch>, ProviderError> {
        let (search, episode) = search_terms(text);
        if search.is_empty() {
            return Err(ProviderError::Unresolved(text.to_string()));
        }

        let mut results = self.client.search_media(&search).await?;
        if results.is_empty() {
            return Err(ProviderError::Unresolved(text.to_string()));
        }

        let normalized = normalize_for_matching(&search);
        results.sort_by_key(|m| !matches_exactly(m, &normalized));

        Ok(results
            .into_iter()
            .map(|media| MediaMatch {
                parsed_title: search.clone(),
                failed: !episode_in_range(&media, episode),
                episode,
                media: Some(media),
            })
            .collect())
    }
}

#[async_trait::async_trait]
impl EpisodeMetadataProvider for AnilistCatalog {
    async fn episodes(&self, media: &Media) -> Result<Vec<EpisodeMetadata>, ProviderError> {
        self.client.get_episodes(media.id).await
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::domain::MediaTitle;

    #[test]
    fn test_search_terms_from_episode_release() {
        let (search, episode) =
            search_terms("[SubsPlease] Sousou no Frieren - 05 (1080p) [ABCD1234].mkv");
        assert_eq!(search, "Sousou no Frieren");
        assert_eq!(episode, Some(5));
    }

    #[test]
    fn test_search_terms_from_batch() {
        let (search, episode) = search_terms("[Group] Sousou no Frieren (BD 1080p) [Batch]");
        assert_eq!(search, "Sousou no Frieren");
        assert_eq!(episode, None);
    }

    #[test]
    fn test_exact_title_match() {
        let media = Media {
            title: MediaTitle {
                romaji: Some("Sousou no Frieren".into()),
                ..Default::default()
            },
            synonyms: vec!["Frieren: Beyond Journey's End".into()],
            ..Default::default()
        };
        assert!(matches_exactly(&media, &normalize_for_matching("sousou no frieren")));
        assert!(matches_exactly(
            &media,
            &normalize_for_matching("Frieren - Beyond Journey's End")
        ));
        assert!(!matches_exactly(&media, "frieren"));
    }

    #[test]
    fn test_offset_formats() {
        assert!(counts_toward_offset(MediaFormat::Tv));
        assert!(!counts_toward_offset(MediaFormat::Movie));
    }
}
