use crate::{CollectionResult, ListEntry, RelationshipType, Stage, SubjectIdentity};

#[derive(Debug, Clone, PartialEq)]
pub enum Msg {
    /// Host asked for a new run.
    StartRequested,
    /// Fine-grained progress from a collector or the materializer.
    Progress { percent: f32, message: String },
    /// Identity stage finished.
    IdentityResolved(SubjectIdentity),
    /// One relationship list finished (possibly partial or via the fallback transport).
    Collected {
        kind: RelationshipType,
        result: CollectionResult,
    },
    /// Display-set entries with embedded images where conversion succeeded.
    AssetsMaterialized(Vec<ListEntry>),
    /// A stage failed terminally.
    StageFailed { stage: Stage, reason: String },
}
