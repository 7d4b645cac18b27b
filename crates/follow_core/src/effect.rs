use crate::{ListEntry, RelationshipType, SubjectId};

#[derive(Debug, Clone, PartialEq, Eq)]
pub enum Effect {
    ResolveIdentity,
    Collect {
        subject: SubjectId,
        kind: RelationshipType,
    },
    MaterializeAssets { entries: Vec<ListEntry> },
}
