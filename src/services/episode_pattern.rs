//! Episode tokens: the query clauses that ask the feed for an episode, and the
//! matcher that tells a numbered release from a batch.
//!
//! In the query syntax a space inside quotes is the `+` of the search URL, so
//! `"E05 "` means "E05 followed by a separator".

use regex::Regex;
use std::sync::OnceLock;

/// Left-pads with zeros to at least `width` digits.
#[must_use]
pub fn zero_pad(value: u32, width: usize) -> String {
    format!("{value:0width$}")
}

/// Digits needed to print `max`, never fewer than two.
#[must_use]
pub fn pad_width(max: u32) -> usize {
    let digits = max.checked_ilog10().map_or(1, |d| d as usize + 1);
    digits.max(2)
}

/// The four delimiter/prefix forms one episode is published under.
#[must_use]
pub fn episode_variants(episode: u32) -> String {
    let ep = zero_pad(episode, 2);
    format!(r#""E{ep} "|"E{ep}v"|" {ep} "|" {ep}v""#)
}

/// Disjunction over every candidate episode number.
#[must_use]
pub fn episode_clause(episodes: &[u32]) -> String {
    let variants: Vec<String> = episodes.iter().map(|&ep| episode_variants(ep)).collect();
    format!("({})", variants.join("|"))
}

/// Whole-season tokens: `01-24` and `01~24` ranges, `Batch`/`Complete`, and
/// the current episode as a last-episode marker.
#[must_use]
pub fn batch_clause(total_episodes: u32, episode: u32) -> String {
    let width = pad_width(total_episodes);
    let first = zero_pad(1, width);
    let last = zero_pad(total_episodes, width);
    let ep = zero_pad(episode, 2);
    format!(
        r#"("{first}-{last}"|"{first}~{last}"|"Batch"|"Complete"|"{ep} "|"{ep}v")"#
    )
}

fn episode_number_re() -> &'static Regex {
    static RE: OnceLock<Regex> = OnceLock::new();
    RE.get_or_init(|| {
        Regex::new(
            r"(?i)[EO]?[-EPD]\d{2}(?:[-v.]|$)|[EO]?[EPD ]\d{2}(?:[v .]|$)|[EO]?[EPD_]\d{2}(?:[v_.]|$)|[EO]?[EPD—]\d{2}(?:[v.—]|$)|\d{2} ?[-~—] ?\d{2}",
        )
        .expect("Invalid regex")
    })
}

/// True when the title names a single episode (`E05`, ` 05 `, `-05-`, `_05_`,
/// `—05—`, `OP01`) or an `NN-NN` range. Batch-only results keep entries for
/// which this is false.
#[must_use]
pub fn encodes_episode_number(title: &str) -> bool {
    episode_number_re().is_match(title)
}
