//! Release-title parsing for the title-to-media resolver.
//!
//! Feed titles look like `[Group] Show Title S2 - 05 (1080p) [ABCD1234].mkv`.
//! The parser recovers the show title, the claimed episode and a few tags;
//! anything it cannot place is left out rather than guessed.

use crate::models::release::ParsedRelease;
use regex::{Captures, Regex};
use std::sync::OnceLock;

#[must_use]
pub fn parse_release_title(raw: &str) -> Option<ParsedRelease> {
    let name = strip_extension(raw.trim());
    parse_dash_episode(raw, name)
        .or_else(|| parse_sxxexx(raw, name))
        .or_else(|| parse_loose_episode(raw, name))
}

/// Title-only parse for batches and movies, which carry no episode number.
#[must_use]
pub fn parse_show_title(raw: &str) -> String {
    let name = strip_extension(raw.trim());
    let without_group = strip_leading_group(name);
    clean_title(&strip_trailing_tags(without_group))
}

fn get_regex(re: &'static OnceLock<Regex>, pattern: &str) -> &'static Regex {
    re.get_or_init(|| Regex::new(pattern).expect("Invalid regex pattern defined in code"))
}

fn strip_extension(name: &str) -> &str {
    static RE: OnceLock<Regex> = OnceLock::new();
    let re = get_regex(&RE, r"(?i)\.(?:mkv|mp4|avi|webm|m4v|ts)$");
    re.find(name).map_or(name, |m| &name[..m.start()])
}

fn strip_leading_group(name: &str) -> &str {
    static RE: OnceLock<Regex> = OnceLock::new();
    let re = get_regex(&RE, r"^\s*\[[^\]]*\]\s*");
    re.find(name).map_or(name, |m| &name[m.end()..])
}

fn strip_trailing_tags(name: &str) -> String {
    static RE: OnceLock<Regex> = OnceLock::new();
    let re = get_regex(&RE, r"\s*(?:\[[^\]]*\]|\([^)]*\))");
    re.replace_all(name, "").into_owned()
}

// [Group] Title - 05v2 [tags]
fn parse_dash_episode(raw: &str, name: &str) -> Option<ParsedRelease> {
    static RE: OnceLock<Regex> = OnceLock::new();
    let re = get_regex(
        &RE,
        r"^(?:\[(?P<group>[^\]]+)\]\s*)?(?P<title>.+?)\s+-\s+(?:E|EP|Episode\s*)?(?P<episode>\d{1,4}(?:\.\d)?)(?:v(?P<version>\d))?(?:\s|$|\[|\()",
    );
    let caps = re.captures(name)?;
    build(raw, &caps)
}

// [Group] Title S02E05 [tags]
fn parse_sxxexx(raw: &str, name: &str) -> Option<ParsedRelease> {
    static RE: OnceLock<Regex> = OnceLock::new();
    let re = get_regex(
        &RE,
        r"(?i)^(?:\[(?P<group>[^\]]+)\]\s*)?(?P<title>.+?)[\s._-]+S(?P<season>\d{1,2})E(?P<episode>\d{1,4})(?:v(?P<version>\d))?",
    );
    let caps = re.captures(name)?;
    let mut release = build(raw, &caps)?;
    release.title = clean_title(&release.title.replace('.', " "));
    Some(release)
}

// [Group] Title 05 [tags]
fn parse_loose_episode(raw: &str, name: &str) -> Option<ParsedRelease> {
    static RE: OnceLock<Regex> = OnceLock::new();
    let re = get_regex(
        &RE,
        r"^(?:\[(?P<group>[^\]]+)\]\s*)?(?P<title>.+?)[\s_](?:E|EP)?(?P<episode>\d{1,3})(?:v(?P<version>\d))?(?:[\s_]*(?:\[|\()|$)",
    );
    let caps = re.captures(name)?;
    let release = build(raw, &caps)?;

    #[allow(clippy::cast_possible_truncation)]
    let episode = release.episode_number as i32;
    if [480, 576, 720].contains(&episode) {
        return None;
    }
    Some(release)
}

fn build(raw: &str, caps: &Captures) -> Option<ParsedRelease> {
    let title = caps.name("title")?.as_str();
    let episode_number = caps.name("episode")?.as_str().parse::<f32>().ok()?;

    let season = caps
        .name("season")
        .and_then(|m| m.as_str().parse().ok())
        .or_else(|| detect_season_from_title(title));

    Some(ParsedRelease {
        original_filename: raw.to_string(),
        title: clean_title(title),
        episode_number,
        season,
        group: caps.name("group").map(|m| m.as_str().trim().to_string()),
        resolution: extract_resolution(raw),
        source: None,
        version: caps.name("version").and_then(|m| m.as_str().parse().ok()),
    })
}

#[must_use]
pub fn extract_resolution(s: &str) -> Option<String> {
    static RE: OnceLock<Regex> = OnceLock::new();
    let re = get_regex(&RE, r"(?i)\b(2160p|1080p|720p|576p|480p|4K)\b");

    re.find(s).map(|m| {
        let res = m.as_str();
        if res.eq_ignore_ascii_case("4K") {
            "2160p".to_string()
        } else {
            res.to_lowercase()
        }
    })
}

/// Season number written into a title (`Season 2`, `S2`, `2nd Season`).
#[must_use]
pub fn detect_season_from_title(title: &str) -> Option<i32> {
    static PATTERNS: OnceLock<Vec<Regex>> = OnceLock::new();
    let patterns = PATTERNS.get_or_init(|| {
        vec![
            Regex::new(r"(?i)\b(?:Season|S)\s*(\d+)\b").expect("Invalid Regex"),
            Regex::new(r"(?i)\b(\d+)(?:st|nd|rd|th)\s+Season\b").expect("Invalid Regex"),
        ]
    });

    patterns
        .iter()
        .filter_map(|p| p.captures(title))
        .find_map(|c| c.get(1)?.as_str().parse().ok())
}

#[must_use]
pub fn clean_title(title: &str) -> String {
    title
        .trim()
        .trim_end_matches(['-', '_', ' '])
        .split(|c: char| c.is_whitespace() || c == '_')
        .filter(|part| !part.is_empty())
        .collect::<Vec<_>>()
        .join(" ")
}

/// Lowercased alphanumeric form for comparing titles across sources.
#[must_use]
pub fn normalize_for_matching(title: &str) -> String {
    title
        .to_lowercase()
        .chars()
        .map(|c| if c.is_alphanumeric() { c } else { ' ' })
        .collect::<String>()
        .split_whitespace()
        .collect::<Vec<_>>()
        .join(" ")
}
