//! Whether a release's claimed episode fits a matched media.
//!
//! Unknown counts are not zero. An unknown count only lets a release through
//! when the release itself reads as single-episode, and the checks below run
//! in a fixed order: single-episode inference first, then the two episode
//! numbers, then the comparison.

use crate::domain::{Media, MediaFormat};

/// Single-episode release: no known count and no episode beyond 1 claimed, or
/// a one-episode movie.
#[must_use]
pub fn is_single_episode(media: &Media, claimed: Option<u32>) -> bool {
    (media.episodes.is_none() && claimed.is_none_or(|ep| ep == 1))
        || (media.format == MediaFormat::Movie && media.episodes == Some(1))
}

/// Episode the release stands for.
#[must_use]
pub fn video_episode(media: &Media, claimed: Option<u32>) -> Option<u32> {
    claimed.or_else(|| is_single_episode(media, claimed).then_some(1))
}

/// Last episode the media is known to have.
#[must_use]
pub fn media_episode(media: &Media, claimed: Option<u32>) -> Option<u32> {
    media
        .max_episode()
        .or_else(|| is_single_episode(media, claimed).then_some(1))
}

/// Both numbers known and the release's episode does not exceed the media's.
#[must_use]
pub fn episode_in_range(media: &Media, claimed: Option<u32>) -> bool {
    match (video_episode(media, claimed), media_episode(media, claimed)) {
        (Some(video), Some(max)) => video <= max,
        _ => false,
    }
}
