use crate::domain::{
    FuzzyDate, Media, MediaEdge, MediaFormat, MediaId, MediaStatus, MediaTitle, RelatedMedia,
    RelationKind,
};
use crate::models::episode::EpisodeMetadata;
use crate::services::providers::ProviderError;
use chrono::{DateTime, Utc};
use regex::Regex;
use reqwest::Client;
use serde::de::DeserializeOwned;
use serde::{Deserialize, Serialize};
use std::collections::BTreeMap;
use std::sync::OnceLock;
use tracing::debug;

const MEDIA_FIELDS: &str = r"
    fragment MediaFields on Media {
        id
        title { romaji english native userPreferred }
        synonyms
        episodes
        status
        format
        season
        seasonYear
        startDate { year month day }
        endDate { year month day }
        nextAiringEpisode { episode }
        relations {
            edges {
                relationType
                node {
                    id
                    type
                    title { romaji english native userPreferred }
                    status
                    format
                    episodes
                    startDate { year month day }
                    endDate { year month day }
                }
            }
        }
    }
";

#[derive(Serialize)]
struct GraphQLRequest<'a, V> {
    query: &'a str,
    variables: V,
}

#[derive(Deserialize)]
struct GraphQLResponse<T> {
    data: Option<T>,
    #[serde(default)]
    errors: Vec<GraphQLError>,
}

#[derive(Deserialize)]
struct GraphQLError {
    message: String,
}

impl<T> GraphQLResponse<T> {
    fn into_data(self) -> Result<T, ProviderError> {
        self.data.ok_or_else(|| {
            let messages: Vec<String> = self.errors.into_iter().map(|e| e.message).collect();
            ProviderError::Graphql(if messages.is_empty() {
                "empty response".to_string()
            } else {
                messages.join("; ")
            })
        })
    }
}

#[derive(Deserialize)]
#[serde(rename_all = "camelCase")]
struct MediaNode {
    id: i32,
    title: Option<MediaTitle>,
    synonyms: Option<Vec<String>>,
    episodes: Option<u32>,
    status: Option<MediaStatus>,
    format: Option<MediaFormat>,
    season: Option<String>,
    season_year: Option<i32>,
    start_date: Option<FuzzyDate>,
    end_date: Option<FuzzyDate>,
    next_airing_episode: Option<NextAiringEpisode>,
    relations: Option<Relations>,
}

#[derive(Deserialize)]
struct NextAiringEpisode {
    episode: u32,
}

#[derive(Deserialize)]
struct Relations {
    edges: Vec<RelationEdge>,
}

#[derive(Deserialize)]
#[serde(rename_all = "camelCase")]
struct RelationEdge {
    relation_type: Option<RelationKind>,
    node: Option<RelatedNode>,
}

#[derive(Deserialize)]
#[serde(rename_all = "camelCase")]
struct RelatedNode {
    id: i32,
    #[serde(rename = "type")]
    media_type: Option<String>,
    title: Option<MediaTitle>,
    status: Option<MediaStatus>,
    format: Option<MediaFormat>,
    episodes: Option<u32>,
    start_date: Option<FuzzyDate>,
    end_date: Option<FuzzyDate>,
}

impl From<MediaNode> for Media {
    fn from(m: MediaNode) -> Self {
        let relations = m
            .relations
            .map(|r| r.edges)
            .unwrap_or_default()
            .into_iter()
            .filter_map(|edge| {
                let node = edge.node?;
                // Manga and novel adaptations share the franchise graph.
                if node.media_type.as_deref() != Some("ANIME") {
                    return None;
                }
                Some(MediaEdge {
                    kind: edge.relation_type.unwrap_or(RelationKind::Other),
                    node: RelatedMedia {
                        id: MediaId::new(node.id),
                        title: node.title.unwrap_or_default(),
                        status: node.status.unwrap_or_default(),
                        format: node.format.unwrap_or_default(),
                        episodes: node.episodes,
                        start_date: node.start_date,
                        end_date: node.end_date,
                    },
                })
            })
            .collect();

        Self {
            id: MediaId::new(m.id),
            title: m.title.unwrap_or_default(),
            synonyms: m.synonyms.unwrap_or_default(),
            episodes: m.episodes,
            next_airing_episode: m.next_airing_episode.map(|n| n.episode),
            status: m.status.unwrap_or_default(),
            format: m.format.unwrap_or_default(),
            season: m.season,
            season_year: m.season_year,
            start_date: m.start_date,
            end_date: m.end_date,
            relations,
        }
    }
}

#[derive(Debug, Deserialize)]
struct StreamingEpisode {
    title: Option<String>,
    thumbnail: Option<String>,
}

fn episode_title_re() -> &'static Regex {
    static RE: OnceLock<Regex> = OnceLock::new();
    RE.get_or_init(|| Regex::new(r"(?i)^Episode\s+(\d+)").expect("Invalid regex"))
}

fn streaming_episode_number(title: &str) -> Option<u32> {
    episode_title_re()
        .captures(title)
        .and_then(|c| c[1].parse().ok())
}

/// Merges streaming episodes (titles, thumbnails) with the airing schedule
/// (air dates). Episodes only on the schedule get a generic title.
fn merge_episodes(
    streaming: Vec<StreamingEpisode>,
    schedule: Vec<(u32, i64)>,
) -> Vec<EpisodeMetadata> {
    let air_dates: BTreeMap<u32, String> = schedule
        .into_iter()
        .filter_map(|(ep, at)| {
            DateTime::<Utc>::from_timestamp(at, 0).map(|dt| (ep, dt.to_rfc3339()))
        })
        .collect();

    let mut episodes: BTreeMap<u32, EpisodeMetadata> = BTreeMap::new();
    for ep in streaming {
        let Some(number) = ep.title.as_deref().and_then(streaming_episode_number) else {
            continue;
        };
        episodes.entry(number).or_insert_with(|| EpisodeMetadata {
            number,
            title: ep.title,
            thumbnail: ep.thumbnail,
            aired: air_dates.get(&number).cloned(),
        });
    }

    for (number, aired) in air_dates {
        episodes.entry(number).or_insert_with(|| EpisodeMetadata {
            number,
            title: Some(format!("Episode {number}")),
            thumbnail: None,
            aired: Some(aired),
        });
    }

    episodes.into_values().collect()
}

#[derive(Clone)]
pub struct AnilistClient {
    client: Client,
    api_url: String,
}

impl AnilistClient {
    #[must_use]
    pub fn with_shared_client(client: Client, api_url: impl Into<String>) -> Self {
        Self {
            client,
            api_url: api_url.into(),
        }
    }

    async fn query<V, T>(&self, query: &str, variables: V) -> Result<GraphQLResponse<T>, ProviderError>
    where
        V: Serialize + Send,
        T: DeserializeOwned,
    {
        let request_body = GraphQLRequest { query, variables };

        Ok(self
            .client
            .post(&self.api_url)
            .json(&request_body)
            .send()
            .await?
            .json()
            .await?)
    }

    pub async fn search_media(&self, search: &str) -> Result<Vec<Media>, ProviderError> {
        let gql_query = format!(
            r"
            query ($search: String) {{
                Page(page: 1, perPage: 10) {{
                    media(search: $search, type: ANIME) {{ ...MediaFields }}
                }}
            }}
            {MEDIA_FIELDS}"
        );

        #[derive(Serialize)]
        struct SearchVar<'a> {
            search: &'a str,
        }

        #[derive(Deserialize)]
        struct Data {
            #[serde(rename = "Page")]
            page: Page,
        }

        #[derive(Deserialize)]
        struct Page {
            media: Vec<MediaNode>,
        }

        debug!(search, "Searching AniList");
        let data: Data = self
            .query(&gql_query, SearchVar { search })
            .await?
            .into_data()?;

        Ok(data.page.media.into_iter().map(Media::from).collect())
    }

    pub async fn get_media(&self, id: MediaId) -> Result<Option<Media>, ProviderError> {
        let gql_query = format!(
            r"
            query ($id: Int) {{
                Media(id: $id, type: ANIME) {{ ...MediaFields }}
            }}
            {MEDIA_FIELDS}"
        );

        #[derive(Serialize)]
        struct IdVar {
            id: i32,
        }

        #[derive(Deserialize)]
        struct MediaWrapper {
            #[serde(rename = "Media")]
            media: Option<MediaNode>,
        }

        debug!(media_id = %id, "Fetching AniList media");
        let data: MediaWrapper = self
            .query(&gql_query, IdVar { id: id.value() })
            .await?
            .into_data()?;

        Ok(data.media.map(Media::from))
    }

    pub async fn get_episodes(&self, id: MediaId) -> Result<Vec<EpisodeMetadata>, ProviderError> {
        let gql_query = r"
            query ($id: Int) {
                Media(id: $id, type: ANIME) {
                    streamingEpisodes {
                        title
                        thumbnail
                    }
                    airingSchedule(perPage: 500) {
                        nodes {
                            episode
                            airingAt
                        }
                    }
                }
            }
        ";

        #[derive(Serialize)]
        struct IdVar {
            id: i32,
        }

        #[derive(Deserialize)]
        struct MediaWrapper {
            #[serde(rename = "Media")]
            media: Option<MediaEpisodes>,
        }

        #[derive(Deserialize)]
        #[serde(rename_all = "camelCase")]
        struct MediaEpisodes {
            #[serde(default)]
            streaming_episodes: Vec<StreamingEpisode>,
            airing_schedule: Option<AiringScheduleConnection>,
        }

        #[derive(Deserialize)]
        struct AiringScheduleConnection {
            nodes: Vec<AiringScheduleNode>,
        }

        #[derive(Deserialize)]
        #[serde(rename_all = "camelCase")]
        struct AiringScheduleNode {
            episode: u32,
            airing_at: i64,
        }

        let data: MediaWrapper = self
            .query(gql_query, IdVar { id: id.value() })
            .await?
            .into_data()?;

        let Some(media) = data.media else {
            return Ok(Vec::new());
        };

        let schedule = media
            .airing_schedule
            .map(|s| s.nodes)
            .unwrap_or_default()
            .into_iter()
            .map(|n| (n.episode, n.airing_at))
            .collect();

        Ok(merge_episodes(media.streaming_episodes, schedule))
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_media_node_maps_anime_edges_only() {
        let json = r#"{
            "id": 2,
            "title": {"romaji": "Show 2nd Season", "english": null, "native": null, "userPreferred": "Show 2nd Season"},
            "synonyms": null,
            "episodes": 12,
            "status": "FINISHED",
            "format": "TV",
            "season": "SPRING",
            "seasonYear": 2023,
            "startDate": {"year": 2023, "month": 4, "day": 2},
            "endDate": {"year": 2023, "month": 6, "day": 25},
            "nextAiringEpisode": null,
            "relations": {"edges": [
                {"relationType": "PREQUEL", "node": {"id": 1, "type": "ANIME", "title": {"romaji": "Show"}, "status": "FINISHED", "format": "TV", "episodes": 12, "startDate": null, "endDate": {"year": 2022, "month": 12, "day": 20}}},
                {"relationType": "ADAPTATION", "node": {"id": 3, "type": "MANGA", "title": {"romaji": "Show"}, "status": "RELEASING", "format": "MANGA", "episodes": null}},
                {"relationType": "SIDE_STORY", "node": {"id": 4, "type": "ANIME", "title": null, "status": "HIATUS", "format": "OVA", "episodes": 1}}
            ]}
        }"#;

        let node: MediaNode = serde_json::from_str(json).unwrap();
        let media = Media::from(node);

        assert_eq!(media.id, MediaId::new(2));
        assert_eq!(media.status, MediaStatus::Finished);
        assert_eq!(media.relations.len(), 2);
        let prequel = media.prequel().unwrap();
        assert_eq!(prequel.id, MediaId::new(1));
        assert_eq!(prequel.end_date, Some(FuzzyDate::new(2022, 12, 20)));
        assert_eq!(media.relations[1].kind, RelationKind::Other);
        assert_eq!(media.relations[1].node.status, MediaStatus::Other);
    }

    #[test]
    fn test_merge_episodes_fills_from_schedule() {
        let streaming = vec![
            StreamingEpisode {
                title: Some("Episode 2 - The Journey".to_string()),
                thumbnail: Some("https://img/2.jpg".to_string()),
            },
            StreamingEpisode {
                title: Some("Recap".to_string()),
                thumbnail: None,
            },
        ];
        let schedule = vec![(1, 1_696_000_000), (2, 1_696_600_000)];

        let episodes = merge_episodes(streaming, schedule);
        assert_eq!(episodes.len(), 2);
        assert_eq!(episodes[0].number, 1);
        assert_eq!(episodes[0].title.as_deref(), Some("Episode 1"));
        assert_eq!(episodes[1].thumbnail.as_deref(), Some("https://img/2.jpg"));
        assert!(episodes[1].aired.is_some());
    }

    #[test]
    fn test_graphql_errors_surface() {
        let response: GraphQLResponse<serde_json::Value> =
            serde_json::from_str(r#"{"data": null, "errors": [{"message": "Too Many Requests."}]}"#)
                .unwrap();
        let err = response.into_data().unwrap_err();
        assert!(err.to_string().contains("Too Many Requests."));
    }
}
