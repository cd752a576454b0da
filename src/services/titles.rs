//! Query-safe title candidates for a media.
//!
//! Over-generation is fine here: every localized title, synonym, compact
//! season form and hyphen-free spelling goes into the query, and the date and
//! episode filters downstream take care of precision.

use crate::domain::Media;
use regex::Regex;
use std::collections::HashSet;
use std::sync::OnceLock;

/// Titles shorter than this match too much of the feed to be useful.
const MIN_TITLE_CHARS: usize = 4;

fn season_word_re() -> &'static Regex {
    static RE: OnceLock<Regex> = OnceLock::new();
    RE.get_or_init(|| Regex::new(r"(?i)Season (\d)").expect("Invalid regex"))
}

fn ordinal_season_re() -> &'static Regex {
    static RE: OnceLock<Regex> = OnceLock::new();
    RE.get_or_init(|| Regex::new(r"(?i)(\d)(?:st|nd|rd|th) Season").expect("Invalid regex"))
}

/// Escapes characters that would end or split the feed query.
#[must_use]
pub fn escape_query_text(title: &str) -> String {
    title
        .replace('&', "%26")
        .replace('?', "%3F")
        .replace('#', "%23")
}

/// `Show Season 2` / `Show 2nd Season` to `Show S2`.
fn compact_season(title: &str) -> Option<String> {
    if let Some(caps) = season_word_re().captures(title) {
        return Some(
            season_word_re()
                .replace(title, format!("S{}", &caps[1]))
                .into_owned(),
        );
    }
    ordinal_season_re().captures(title).map(|caps| {
        ordinal_season_re()
            .replace(title, format!("S{}", &caps[1]))
            .into_owned()
    })
}

/// Every plausible query form of the media's titles, in a stable order.
#[must_use]
pub fn candidate_titles(media: &Media) -> Vec<String> {
    let mut seen_source = HashSet::new();
    let sources: Vec<&str> = media
        .title
        .iter()
        .chain(media.synonyms.iter().map(String::as_str))
        .filter(|t| t.chars().count() >= MIN_TITLE_CHARS)
        .filter(|t| seen_source.insert(*t))
        .collect();

    let mut titles = Vec::new();
    let mut push = |title: String| {
        if !titles.contains(&title) {
            titles.push(title);
        }
    };

    for source in sources {
        let mut variants = vec![source.to_string()];
        if source.contains('-') {
            variants.push(source.replace('-', ""));
        }

        for variant in variants {
            let escaped = escape_query_text(&variant);
            let compact = compact_season(&escaped);
            push(escaped);
            if let Some(compact) = compact {
                push(compact);
            }
        }
    }

    titles
}

/// `(t1)|(t2)|...` group for the feed query.
#[must_use]
pub fn title_clause(titles: &[String]) -> String {
    format!("({})", titles.join(")|("))
}
