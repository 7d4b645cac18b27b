//! Follow audit core: pure run state machine, list model and reconciliation.
mod effect;
mod entry;
mod msg;
mod progress;
mod reconcile;
mod state;
mod update;
mod view_model;

pub use effect::Effect;
pub use entry::{
    dedupe_by_handle, CollectionResult, CollectionStatus, ImageRef, ListEntry, RelationshipType,
    SubjectId, SubjectIdentity, Transport,
};
pub use msg::Msg;
pub use progress::{
    asset_percent, collection_base, collection_percent, ASSET_BAND_START, ASSET_BAND_WIDTH,
    COLLECTION_BAND, COMPLETE_PERCENT, IDENTITY_PERCENT, START_PERCENT,
};
pub use reconcile::{reconcile, Reconciled};
pub use state::{RunState, RunStatus, Stage};
pub use update::update;
pub use view_model::{DisplayTab, EntryRowView, RunViewModel};
