use follow_core::{RelationshipType, SubjectId, Transport};

use crate::{Cursor, FetchError, Page, ProgressUpdate};

pub trait ProgressSink: Send + Sync {
    fn emit(&self, update: ProgressUpdate);
}

/// Retrieves one page of a relationship list over a single transport.
#[async_trait::async_trait]
pub trait PageFetcher: Send + Sync {
    fn transport(&self) -> Transport;

    async fn fetch_page(
        &self,
        subject: &SubjectId,
        kind: RelationshipType,
        cursor: Option<&Cursor>,
    ) -> Result<Page, FetchError>;
}
