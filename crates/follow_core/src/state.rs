use crate::progress::COMPLETE_PERCENT;
use crate::view_model::{EntryRowView, RunViewModel};
use crate::{reconcile, CollectionResult, Reconciled, RelationshipType, SubjectIdentity};

#[derive(Debug, Clone, Copy, PartialEq, Eq, Default)]
pub enum RunStatus {
    #[default]
    Idle,
    Running,
    Complete,
    Error,
}

impl RunStatus {
    pub fn is_terminal(self) -> bool {
        matches!(self, RunStatus::Complete | RunStatus::Error)
    }
}

/// Pipeline stage of a running collection.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum Stage {
    ResolvingIdentity,
    CollectingFollowers,
    CollectingFollowing,
    MaterializingAssets,
}

impl Stage {
    pub fn collecting(kind: RelationshipType) -> Self {
        match kind {
            RelationshipType::Followers => Stage::CollectingFollowers,
            RelationshipType::Following => Stage::CollectingFollowing,
        }
    }

    fn failure_prefix(self) -> &'static str {
        match self {
            Stage::ResolvingIdentity => "Could not detect identity",
            Stage::CollectingFollowers => "Error fetching followers",
            Stage::CollectingFollowing => "Error fetching following",
            Stage::MaterializingAssets => "Error converting profile pictures",
        }
    }
}

#[derive(Debug, Clone, PartialEq, Default)]
pub struct RunState {
    status: RunStatus,
    progress_percent: f32,
    message: String,
    stage: Option<Stage>,
    failed_stage: Option<Stage>,
    subject: Option<SubjectIdentity>,
    followers: CollectionResult,
    following: CollectionResult,
}

impl RunState {
    pub fn new() -> Self {
        Self::default()
    }

    pub fn status(&self) -> RunStatus {
        self.status
    }

    pub fn progress_percent(&self) -> f32 {
        self.progress_percent
    }

    pub fn message(&self) -> &str {
        &self.message
    }

    pub fn stage(&self) -> Option<Stage> {
        self.stage
    }

    pub fn failed_stage(&self) -> Option<Stage> {
        self.failed_stage
    }

    pub fn subject(&self) -> Option<&SubjectIdentity> {
        self.subject.as_ref()
    }

    pub fn followers(&self) -> &CollectionResult {
        &self.followers
    }

    pub fn following(&self) -> &CollectionResult {
        &self.following
    }

    pub fn reconciled(&self) -> Reconciled {
        reconcile(&self.followers.entries, &self.following.entries)
    }

    pub fn view(&self) -> RunViewModel {
        let reconciled = self.reconciled();
        RunViewModel {
            status: self.status,
            progress_percent: self.progress_percent.round().clamp(0.0, 100.0) as u8,
            message: self.message.clone(),
            followers_count: self.followers.len(),
            following_count: self.following.len(),
            not_reciprocating: reconciled
                .not_reciprocating
                .iter()
                .map(EntryRowView::from_entry)
                .collect(),
            admirers: reconciled.admirers.iter().map(EntryRowView::from_entry).collect(),
        }
    }

    /// Fresh running state: everything from a previous run is dropped.
    pub(crate) fn begin(&mut self, percent: f32, message: impl Into<String>) {
        *self = Self {
            status: RunStatus::Running,
            progress_percent: percent,
            message: message.into(),
            stage: Some(Stage::ResolvingIdentity),
            ..Self::default()
        };
    }

    /// Progress never moves backwards while running; the message always updates.
    pub(crate) fn set_progress(&mut self, percent: f32, message: impl Into<String>) {
        let percent = percent.clamp(0.0, COMPLETE_PERCENT);
        if percent > self.progress_percent {
            self.progress_percent = percent;
        }
        self.message = message.into();
    }

    pub(crate) fn set_stage(&mut self, stage: Stage) {
        self.stage = Some(stage);
    }

    pub(crate) fn set_subject(&mut self, subject: SubjectIdentity) {
        self.subject = Some(subject);
    }

    pub(crate) fn set_collection(&mut self, kind: RelationshipType, result: CollectionResult) {
        match kind {
            RelationshipType::Followers => self.followers = result,
            RelationshipType::Following => self.following = result,
        }
    }

    pub(crate) fn collections_mut(&mut self) -> [&mut CollectionResult; 2] {
        [&mut self.followers, &mut self.following]
    }

    pub(crate) fn fail(&mut self, stage: Stage, reason: &str) {
        self.status = RunStatus::Error;
        self.failed_stage = Some(stage);
        self.stage = None;
        self.message = format!("{}: {}", stage.failure_prefix(), reason);
    }

    pub(crate) fn complete(&mut self, message: impl Into<String>) {
        self.set_progress(COMPLETE_PERCENT, message);
        self.status = RunStatus::Complete;
        self.stage = None;
    }
}
