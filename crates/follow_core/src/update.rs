use std::collections::HashMap;

use crate::progress::{ASSET_BAND_START, IDENTITY_PERCENT, START_PERCENT};
use crate::{
    collection_base, Effect, ImageRef, Msg, RelationshipType, RunState, RunStatus, Stage,
};

/// Pure update function: applies a message to state and returns any effects.
///
/// Messages other than `StartRequested` are ignored unless a run is in progress,
/// so a late message can never reopen a terminal run.
pub fn update(mut state: RunState, msg: Msg) -> (RunState, Vec<Effect>) {
    if let Msg::StartRequested = msg {
        if state.status() == RunStatus::Running {
            return (state, Vec::new());
        }
        state.begin(START_PERCENT, "Detecting handle...");
        return (state, vec![Effect::ResolveIdentity]);
    }
    if state.status() != RunStatus::Running {
        return (state, Vec::new());
    }

    let effects = match msg {
        Msg::StartRequested => Vec::new(),
        Msg::Progress { percent, message } => {
            state.set_progress(percent, message);
            Vec::new()
        }
        Msg::IdentityResolved(identity) => {
            if state.stage() != Some(Stage::ResolvingIdentity) {
                return (state, Vec::new());
            }
            state.set_progress(
                IDENTITY_PERCENT,
                format!("Found @{}, fetching followers...", identity.handle),
            );
            state.set_stage(Stage::CollectingFollowers);
            let subject = identity.id.clone();
            state.set_subject(identity);
            vec![Effect::Collect {
                subject,
                kind: RelationshipType::Followers,
            }]
        }
        Msg::Collected { kind, result } => {
            if state.stage() != Some(Stage::collecting(kind)) {
                return (state, Vec::new());
            }
            let count = result.len();
            state.set_collection(kind, result);
            match kind {
                RelationshipType::Followers => {
                    let Some(subject) = state.subject().map(|s| s.id.clone()) else {
                        state.fail(Stage::CollectingFollowers, "subject identity missing");
                        return (state, Vec::new());
                    };
                    state.set_progress(
                        collection_base(RelationshipType::Following),
                        format!("Got {count} followers, fetching following..."),
                    );
                    state.set_stage(Stage::CollectingFollowing);
                    vec![Effect::Collect {
                        subject,
                        kind: RelationshipType::Following,
                    }]
                }
                RelationshipType::Following => {
                    let display = state.reconciled().display_set();
                    if display.is_empty() {
                        finish(&mut state);
                        Vec::new()
                    } else {
                        state.set_progress(ASSET_BAND_START, "Converting profile pictures...");
                        state.set_stage(Stage::MaterializingAssets);
                        vec![Effect::MaterializeAssets { entries: display }]
                    }
                }
            }
        }
        Msg::AssetsMaterialized(converted) => {
            if state.stage() != Some(Stage::MaterializingAssets) {
                return (state, Vec::new());
            }
            let images: HashMap<String, ImageRef> = converted
                .into_iter()
                .filter_map(|entry| entry.image.map(|image| (entry.handle, image)))
                .collect();
            for collection in state.collections_mut() {
                for entry in collection.entries.iter_mut() {
                    if let Some(image) = images.get(&entry.handle) {
                        entry.image = Some(image.clone());
                    }
                }
            }
            finish(&mut state);
            Vec::new()
        }
        Msg::StageFailed { stage, reason } => {
            state.fail(stage, &reason);
            Vec::new()
        }
    };

    (state, effects)
}

fn finish(state: &mut RunState) {
    let message = format!(
        "Analysis complete: {} followers, {} following",
        state.followers().len(),
        state.following().len()
    );
    state.complete(message);
}
