//! Notification events raised while resolving releases.
//!
//! Events go out on a `tokio::sync::broadcast` bus; a UI layer subscribes and
//! turns them into toasts. Nothing in the engine waits on a subscriber.

use serde::Serialize;

#[derive(Clone, Debug, Serialize, PartialEq, Eq)]
#[serde(tag = "type", content = "payload")]
pub enum NotificationEvent {
    /// A feed fetch failed. The branch that issued it continued with no entries.
    SearchFailed {
        url: String,
        status: Option<u16>,
        message: String,
    },

    VerifiedIndexReady {
        count: usize,
    },

    VerifiedIndexFailed {
        message: String,
    },
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn serializes_with_type_tag() {
        let event = NotificationEvent::SearchFailed {
            url: "https://nyaa.si/?page=rss".to_string(),
            status: Some(503),
            message: "Service Unavailable".to_string(),
        };
        let json = serde_json::to_value(&event).unwrap();
        assert_eq!(json["type"], "SearchFailed");
        assert_eq!(json["payload"]["status"], 503);
    }
}
