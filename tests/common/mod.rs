#![allow(dead_code)]

use release_resolver::clients::nyaa::FeedError;
use release_resolver::models::release::{FeedDocument, ReleaseEntry};
use release_resolver::services::FeedSource;
use std::sync::Mutex;
use url::Url;

/// In-memory feed. Every fetched URL is recorded (percent-decoded); the
/// response is the first rule whose needle occurs in the decoded URL.
#[derive(Default)]
pub struct FakeFeed {
    rules: Vec<(String, Vec<ReleaseEntry>)>,
    failing: Vec<String>,
    pub_date: Mutex<Option<String>>,
    fetched: Mutex<Vec<String>>,
}

impl FakeFeed {
    pub fn new() -> Self {
        Self::default()
    }

    pub fn respond(mut self, needle: &str, entries: Vec<ReleaseEntry>) -> Self {
        self.rules.push((needle.to_string(), entries));
        self
    }

    pub fn fail(mut self, needle: &str) -> Self {
        self.failing.push(needle.to_string());
        self
    }

    pub fn set_pub_date(&self, date: &str) {
        *self.pub_date.lock().unwrap() = Some(date.to_string());
    }

    pub fn fetched(&self) -> Vec<String> {
        self.fetched.lock().unwrap().clone()
    }
}

#[async_trait::async_trait]
impl FeedSource for FakeFeed {
    async fn fetch(&self, url: &Url) -> Result<FeedDocument, FeedError> {
        let decoded = urlencoding::decode(url.as_str()).unwrap().into_owned();
        self.fetched.lock().unwrap().push(decoded.clone());

        if self.failing.iter().any(|n| decoded.contains(n.as_str())) {
            return Err(FeedError::Status {
                status: 503,
                reason: "Service Unavailable".to_string(),
            });
        }

        let items = self
            .rules
            .iter()
            .find(|(needle, _)| decoded.contains(needle.as_str()))
            .map(|(_, entries)| entries.clone())
            .unwrap_or_default();

        Ok(FeedDocument {
            pub_date: self.pub_date.lock().unwrap().clone(),
            items,
        })
    }
}

pub fn entry(title: &str, id: u32) -> ReleaseEntry {
    ReleaseEntry::new(title, format!("https://nyaa.si/download/{id}.torrent"))
}
