use std::sync::Arc;

use engine_logging::engine_debug;
use follow_core::{RelationshipType, SubjectId, Transport};
use serde::Deserialize;
use serde_json::json;

use crate::fetch::PageFetcher;
use crate::http::{ApiClient, RequestAuth};
use crate::wire::{parse_body, ApiUser};
use crate::{Cursor, FailureKind, FetchError, Page};

pub const FOLLOWERS_QUERY_HASH: &str = "c76146de99bb02f6415203be841dd25a";
pub const FOLLOWING_QUERY_HASH: &str = "d04b0a864b4b54837c0d870b0e77e076";

#[derive(Debug, Deserialize)]
struct QueryResponse {
    data: Option<QueryData>,
}

#[derive(Debug, Deserialize)]
struct QueryData {
    user: Option<QueryUser>,
}

#[derive(Debug, Deserialize)]
struct QueryUser {
    edge_followed_by: Option<Connection>,
    edge_follow: Option<Connection>,
}

#[derive(Debug, Deserialize)]
struct Connection {
    #[serde(default)]
    edges: Vec<Edge>,
    #[serde(default)]
    page_info: PageInfo,
}

#[derive(Debug, Deserialize)]
struct Edge {
    node: ApiUser,
}

#[derive(Debug, Default, Deserialize)]
struct PageInfo {
    #[serde(default)]
    has_next_page: bool,
    #[serde(default)]
    end_cursor: Option<String>,
}

/// Query transport: `graphql/query/` keyed by a per-type query hash and paged by
/// an `end_cursor`/`has_next_page` pair.
pub struct FallbackFetcher {
    client: Arc<ApiClient>,
    page_size: u32,
    followers_hash: String,
    following_hash: String,
}

impl FallbackFetcher {
    pub fn new(client: Arc<ApiClient>, page_size: u32) -> Self {
        Self::with_query_hashes(client, page_size, FOLLOWERS_QUERY_HASH, FOLLOWING_QUERY_HASH)
    }

    pub fn with_query_hashes(
        client: Arc<ApiClient>,
        page_size: u32,
        followers_hash: impl Into<String>,
        following_hash: impl Into<String>,
    ) -> Self {
        Self {
            client,
            page_size,
            followers_hash: followers_hash.into(),
            following_hash: following_hash.into(),
        }
    }

    fn query_hash(&self, kind: RelationshipType) -> &str {
        match kind {
            RelationshipType::Followers => &self.followers_hash,
            RelationshipType::Following => &self.following_hash,
        }
    }
}

#[async_trait::async_trait]
impl PageFetcher for FallbackFetcher {
    fn transport(&self) -> Transport {
        Transport::Fallback
    }

    async fn fetch_page(
        &self,
        subject: &SubjectId,
        kind: RelationshipType,
        cursor: Option<&Cursor>,
    ) -> Result<Page, FetchError> {
        let after = match cursor {
            None => None,
            Some(Cursor::Fallback { end_cursor, .. }) => Some(end_cursor.as_str()),
            Some(other) => {
                return Err(FetchError::new(
                    FailureKind::CursorMismatch,
                    format!("fallback transport cannot continue from {other:?}"),
                ))
            }
        };

        let mut variables = json!({
            "id": subject.as_str(),
            "include_reel": false,
            "fetch_mutual": false,
            "first": self.page_size,
        });
        if let Some(after) = after {
            variables["after"] = json!(after);
        }

        let mut url = self.client.endpoint("graphql/query/")?;
        url.query_pairs_mut()
            .append_pair("query_hash", self.query_hash(kind))
            .append_pair("variables", &variables.to_string());

        engine_debug!("Fetching {} page (alt): {}", kind, url);
        let response = self.client.get(url, RequestAuth::Credentials).await?;
        let body: QueryResponse = parse_body(&response.body)?;

        let connection = body.data.and_then(|data| data.user).and_then(|user| match kind {
            RelationshipType::Followers => user.edge_followed_by,
            RelationshipType::Following => user.edge_follow,
        });
        let Some(connection) = connection else {
            engine_debug!("No {} connection in query response", kind);
            return Ok(Page {
                entries: Vec::new(),
                next_cursor: None,
                status_code: response.status,
            });
        };

        let page_info = connection.page_info;
        let next_cursor = page_info
            .end_cursor
            .filter(|end_cursor| !end_cursor.is_empty())
            .map(|end_cursor| Cursor::Fallback {
                end_cursor,
                has_next: page_info.has_next_page,
            });
        let entries: Vec<_> = connection
            .edges
            .into_iter()
            .filter_map(|edge| edge.node.into_entry())
            .collect();
        engine_debug!(
            "Got {} {} (alt, more pages: {})",
            entries.len(),
            kind,
            next_cursor.as_ref().is_some_and(Cursor::has_more)
        );

        Ok(Page {
            entries,
            next_cursor,
            status_code: response.status,
        })
    }
}
