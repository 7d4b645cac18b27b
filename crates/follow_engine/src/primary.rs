use std::sync::Arc;

use engine_logging::engine_debug;
use follow_core::{RelationshipType, SubjectId, Transport};
use serde::Deserialize;
use serde_json::Value;

use crate::fetch::PageFetcher;
use crate::http::{ApiClient, RequestAuth};
use crate::wire::{parse_body, scalar_to_string, ApiUser};
use crate::{Cursor, FailureKind, FetchError, Page};

#[derive(Debug, Deserialize)]
struct FriendshipsPage {
    #[serde(default)]
    users: Vec<ApiUser>,
    #[serde(default)]
    next_max_id: Option<Value>,
}

/// REST transport: `api/v1/friendships/<id>/<kind>/` paged by `max_id`.
pub struct PrimaryFetcher {
    client: Arc<ApiClient>,
    page_size: u32,
}

impl PrimaryFetcher {
    pub fn new(client: Arc<ApiClient>, page_size: u32) -> Self {
        Self { client, page_size }
    }
}

#[async_trait::async_trait]
impl PageFetcher for PrimaryFetcher {
    fn transport(&self) -> Transport {
        Transport::Primary
    }

    async fn fetch_page(
        &self,
        subject: &SubjectId,
        kind: RelationshipType,
        cursor: Option<&Cursor>,
    ) -> Result<Page, FetchError> {
        let max_id = match cursor {
            None => None,
            Some(Cursor::Primary(token)) => Some(token.as_str()),
            Some(other) => {
                return Err(FetchError::new(
                    FailureKind::CursorMismatch,
                    format!("primary transport cannot continue from {other:?}"),
                ))
            }
        };

        let mut url = self
            .client
            .endpoint(&format!("api/v1/friendships/{subject}/{kind}/"))?;
        {
            let mut query = url.query_pairs_mut();
            query.append_pair("count", &self.page_size.to_string());
            if kind == RelationshipType::Followers {
                query.append_pair("search_surface", "follow_list_page");
            }
            if let Some(max_id) = max_id {
                query.append_pair("max_id", max_id);
            }
        }

        engine_debug!("Fetching {} page: {}", kind, url);
        let response = self.client.get(url, RequestAuth::Credentials).await?;
        let page: FriendshipsPage = parse_body(&response.body)?;
        let next_cursor = page
            .next_max_id
            .as_ref()
            .and_then(scalar_to_string)
            .map(Cursor::Primary);
        let entries: Vec<_> = page.users.into_iter().filter_map(ApiUser::into_entry).collect();
        engine_debug!(
            "Got {} {} (more pages: {})",
            entries.len(),
            kind,
            next_cursor.is_some()
        );

        Ok(Page {
            entries,
            next_cursor,
            status_code: response.status,
        })
    }
}
