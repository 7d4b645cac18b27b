//! Progress bands of a run.
//!
//! 0..10 is identity resolution, 10..50 followers, 55..95 following and
//! 95..100 asset materialization. 100 is only reported on completion.
use crate::{RelationshipType, Transport};

pub const START_PERCENT: f32 = 5.0;
pub const IDENTITY_PERCENT: f32 = 10.0;
pub const COLLECTION_BAND: f32 = 40.0;
pub const ASSET_BAND_START: f32 = 95.0;
pub const ASSET_BAND_WIDTH: f32 = 4.0;
pub const COMPLETE_PERCENT: f32 = 100.0;

pub fn collection_base(kind: RelationshipType) -> f32 {
    match kind {
        RelationshipType::Followers => 10.0,
        RelationshipType::Following => 55.0,
    }
}

/// Entries per percent point. The fallback transport reports more coarsely.
fn scale_factor(transport: Transport) -> f32 {
    match transport {
        Transport::Primary => 100.0,
        Transport::Fallback => 50.0,
    }
}

pub fn collection_percent(kind: RelationshipType, transport: Transport, collected: usize) -> f32 {
    let advance = collected as f32 / scale_factor(transport);
    collection_base(kind) + advance.min(COLLECTION_BAND)
}

pub fn asset_percent(batches_done: usize, batches_total: usize) -> f32 {
    if batches_total == 0 {
        return ASSET_BAND_START + ASSET_BAND_WIDTH;
    }
    let done = batches_done.min(batches_total) as f32;
    ASSET_BAND_START + ASSET_BAND_WIDTH * done / batches_total as f32
}
