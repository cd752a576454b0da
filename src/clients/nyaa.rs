use crate::constants::feed::{ALL_CATEGORIES, CATEGORY, NO_FILTER};
use crate::models::release::{FeedDocument, ReleaseEntry, UNKNOWN_FIELD};
use chrono::{DateTime, Utc};
use regex::Regex;
use reqwest::Client;
use std::sync::OnceLock;
use thiserror::Error;
use tracing::debug;
use url::Url;

/// Failures of the feed transport.
#[derive(Debug, Error)]
pub enum FeedError {
    /// The server answered with a non-success status.
    #[error("Feed request failed with status {status}: {reason}")]
    Status { status: u16, reason: String },

    #[error("Feed transport error: {0}")]
    Transport(#[from] reqwest::Error),

    #[error("Invalid feed URL: {0}")]
    InvalidUrl(String),
}

impl FeedError {
    #[must_use]
    pub const fn status(&self) -> Option<u16> {
        match self {
            Self::Status { status, .. } => Some(*status),
            _ => None,
        }
    }
}

/// Consolidates regexes for XML parsing to avoid per-call overhead.
struct FeedRegex {
    title: Regex,
    link: Regex,
    pub_date: Regex,
    seeders: Regex,
    leechers: Regex,
    downloads: Regex,
    size: Regex,
    item: Regex,
    cdata: Regex,
}

impl FeedRegex {
    fn get() -> Option<&'static Self> {
        static INSTANCE: OnceLock<Option<FeedRegex>> = OnceLock::new();
        INSTANCE
            .get_or_init(|| {
                Some(Self {
                    title: Regex::new(r"(?s)<title>(.*?)</title>").ok()?,
                    link: Regex::new(r"(?s)<link>(.*?)</link>").ok()?,
                    pub_date: Regex::new(r"<pubDate>([^<]*)</pubDate>").ok()?,
                    seeders: Regex::new(r"<nyaa:seeders>([^<]*)</nyaa:seeders>").ok()?,
                    leechers: Regex::new(r"<nyaa:leechers>([^<]*)</nyaa:leechers>").ok()?,
                    downloads: Regex::new(r"<nyaa:downloads>([^<]*)</nyaa:downloads>").ok()?,
                    size: Regex::new(r"<nyaa:size>([^<]*)</nyaa:size>").ok()?,
                    item: Regex::new(r"(?s)<item>(.*?)</item>").ok()?,
                    cdata: Regex::new(r"(?s)^\s*<!\[CDATA\[(.*?)\]\]>\s*$").ok()?,
                })
            })
            .as_ref()
    }
}

fn extract_tag(xml: &str, re: &Regex) -> Option<String> {
    re.captures(xml)
        .and_then(|c| c.get(1))
        .map(|m| m.as_str().trim().to_string())
}

fn extract_text(xml: &str, re: &Regex, cdata: &Regex) -> Option<String> {
    let raw = extract_tag(xml, re)?;
    let inner = cdata
        .captures(&raw)
        .and_then(|c| c.get(1))
        .map_or(raw.as_str(), |m| m.as_str());
    let text = html_escape::decode_html_entities(inner).trim().to_string();
    (!text.is_empty()).then_some(text)
}

fn parse_date(raw: &str) -> Option<DateTime<Utc>> {
    DateTime::parse_from_rfc2822(raw.trim())
        .ok()
        .map(|d| d.with_timezone(&Utc))
}

fn parse_item(item_xml: &str, re: &FeedRegex) -> ReleaseEntry {
    ReleaseEntry {
        title: extract_text(item_xml, &re.title, &re.cdata)
            .unwrap_or_else(|| UNKNOWN_FIELD.to_string()),
        link: extract_text(item_xml, &re.link, &re.cdata)
            .unwrap_or_else(|| UNKNOWN_FIELD.to_string()),
        seeders: extract_tag(item_xml, &re.seeders).and_then(|s| s.parse().ok()),
        leechers: extract_tag(item_xml, &re.leechers).and_then(|s| s.parse().ok()),
        downloads: extract_tag(item_xml, &re.downloads).and_then(|s| s.parse().ok()),
        size: extract_tag(item_xml, &re.size),
        date: extract_tag(item_xml, &re.pub_date).and_then(|d| parse_date(&d)),
        verified: false,
    }
}

/// Parses an RSS document. Malformed or missing fields never fail the parse:
/// text fields fall back to `?`, everything else to `None`.
#[must_use]
pub fn parse_feed(xml: &str) -> FeedDocument {
    let Some(re) = FeedRegex::get() else {
        return FeedDocument::default();
    };

    let items = re
        .item
        .captures_iter(xml)
        .filter_map(|c| c.get(1))
        .map(|m| parse_item(m.as_str(), re))
        .collect();

    FeedDocument {
        pub_date: extract_tag(xml, &re.pub_date),
        items,
    }
}

/// Search URL for a raw query expression. The expression is placed verbatim:
/// quoting and `|` alternation are the feed's search syntax.
pub fn search_url(base_url: &str, query: &str) -> Result<Url, FeedError> {
    let raw = format!(
        "{}/?page=rss&c={CATEGORY}&f={NO_FILTER}&s=seeders&o=desc&q={query}",
        base_url.trim_end_matches('/')
    );
    Url::parse(&raw).map_err(|e| FeedError::InvalidUrl(format!("{raw}: {e}")))
}

const PRESETS: &[(&str, &str)] = &[
    ("SubsPlease", "subsplease"),
    ("Erai-raws [Multi-Sub]", "Erai-raws"),
    ("NC-Raws", "BraveSail"),
];

/// Feed URL for a release-group preset name, or the value itself when it is
/// not a preset. Presets carry the quoted quality token.
pub fn feed_url_for(
    base_url: &str,
    preset_or_url: &str,
    quality: Option<&str>,
) -> Result<Url, FeedError> {
    let raw = match PRESETS.iter().find(|(name, _)| *name == preset_or_url) {
        Some((_, user)) => {
            let quality = quality
                .map(|q| urlencoding::encode(&format!("\"{q}\"")).into_owned())
                .unwrap_or_default();
            format!(
                "{}/?page=rss&c={ALL_CATEGORIES}&f={NO_FILTER}&u={user}&q={quality}",
                base_url.trim_end_matches('/')
            )
        }
        None => preset_or_url.to_string(),
    };
    Url::parse(&raw).map_err(|e| FeedError::InvalidUrl(format!("{raw}: {e}")))
}

#[must_use]
pub fn preset_names() -> Vec<&'static str> {
    PRESETS.iter().map(|(name, _)| *name).collect()
}

#[derive(Clone)]
pub struct NyaaClient {
    client: Client,
}

impl NyaaClient {
    /// Creates a new `NyaaClient` using a shared HTTP client.
    #[must_use]
    pub const fn with_shared_client(client: Client) -> Self {
        Self { client }
    }

    pub async fn fetch_feed(&self, url: &Url) -> Result<FeedDocument, FeedError> {
        debug!(url = %url, "Fetching feed");
        metrics::counter!("feed_fetches_total").increment(1);

        let response = self.client.get(url.clone()).send().await?;
        let status = response.status();
        if !status.is_success() {
            metrics::counter!("feed_fetch_failures_total").increment(1);
            return Err(FeedError::Status {
                status: status.as_u16(),
                reason: status.canonical_reason().unwrap_or("Unknown").to_string(),
            });
        }

        let xml = response.text().await?;
        Ok(parse_feed(&xml))
    }
}

#[async_trait::async_trait]
impl crate::services::providers::FeedSource for NyaaClient {
    async fn fetch(&self, url: &Url) -> Result<FeedDocument, FeedError> {
        self.fetch_feed(url).await
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    const SAMPLE: &str = r#"<?xml version="1.0" encoding="UTF-8"?>
<rss xmlns:atom="http://www.w3.org/2005/Atom" xmlns:nyaa="https://nyaa.si/xmlns/nyaa" version="2.0">
  <channel>
    <title>Nyaa - "Frieren" - Torrent File RSS</title>
    <item>
      <title>[SubsPlease] Sousou no Frieren - 05 (1080p) [F0E1D2C3].mkv</title>
      <link>https://nyaa.si/download/1701234.torrent</link>
      <guid isPermaLink="true">https://nyaa.si/view/1701234</guid>
      <pubDate>Fri, 06 Oct 2023 15:31:02 -0000</pubDate>
      <nyaa:seeders>1520</nyaa:seeders>
      <nyaa:leechers>12</nyaa:leechers>
      <nyaa:downloads>40211</nyaa:downloads>
      <nyaa:size>1.4 GiB</nyaa:size>
    </item>
    <item>
      <title>Tom &amp; Jerry</title>
      <link>https://nyaa.si/download/1700000.torrent</link>
    </item>
    <item>
      <nyaa:seeders>n/a</nyaa:seeders>
    </item>
  </channel>
</rss>"#;

    #[test]
    fn test_parse_feed_items() {
        let doc = parse_feed(SAMPLE);
        assert_eq!(doc.items.len(), 3);
        assert_eq!(
            doc.pub_date.as_deref(),
            Some("Fri, 06 Oct 2023 15:31:02 -0000")
        );

        let first = &doc.items[0];
        assert_eq!(first.link, "https://nyaa.si/download/1701234.torrent");
        assert_eq!(first.seeders, Some(1520));
        assert_eq!(first.downloads, Some(40211));
        assert_eq!(first.size.as_deref(), Some("1.4 GiB"));
        assert_eq!(
            first.date.map(|d| d.to_rfc3339()),
            Some("2023-10-06T15:31:02+00:00".to_string())
        );
    }

    #[test]
    fn test_parse_feed_tolerates_missing_fields() {
        let doc = parse_feed(SAMPLE);
        assert_eq!(doc.items[1].title, "Tom & Jerry");
        assert_eq!(doc.items[1].date, None);
        assert_eq!(doc.items[1].seeders, None);

        let broken = &doc.items[2];
        assert_eq!(broken.title, "?");
        assert_eq!(broken.link, "?");
        assert_eq!(broken.seeders, None);
    }

    #[test]
    fn test_parse_garbage() {
        let doc = parse_feed("<html>not a feed</html>");
        assert!(doc.items.is_empty());
        assert!(doc.pub_date.is_none());
    }

    #[test]
    fn test_search_url_keeps_query_syntax() {
        let url = search_url("https://nyaa.si/", r#"(Frieren)("E05 "|"E05v")"1080""#).unwrap();
        let s = url.as_str();
        assert!(s.starts_with("https://nyaa.si/?page=rss&c=1_2&f=0&s=seeders&o=desc&q="));
        assert!(s.contains("(Frieren)"));
        assert!(s.contains("%22E05%20%22|%22E05v%22"));
    }

    #[test]
    fn test_feed_url_for_preset() {
        let url = feed_url_for("https://nyaa.si", "SubsPlease", Some("1080")).unwrap();
        assert!(url.as_str().contains("u=subsplease"));
        assert!(url.as_str().contains("q=%221080%22"));

        let url = feed_url_for("https://nyaa.si", "NC-Raws", None).unwrap();
        assert!(url.as_str().contains("u=BraveSail"));
        assert!(url.as_str().ends_with("q="));
    }

    #[test]
    fn test_feed_url_for_literal() {
        let url = feed_url_for("https://nyaa.si", "https://example.org/rss", None).unwrap();
        assert_eq!(url.as_str(), "https://example.org/rss");
        assert!(feed_url_for("https://nyaa.si", "nonsense", None).is_err());
    }
}
