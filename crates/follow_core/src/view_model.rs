use crate::{ImageRef, ListEntry, RunStatus};

#[derive(Debug, Clone, Copy, PartialEq, Eq, Default)]
pub enum DisplayTab {
    #[default]
    NotReciprocating,
    Admirers,
}

impl DisplayTab {
    pub fn title(self) -> &'static str {
        match self {
            DisplayTab::NotReciprocating => "Not Following Back",
            DisplayTab::Admirers => "Admirers You Don't Follow Back",
        }
    }
}

#[derive(Debug, Clone, PartialEq, Eq, Default)]
pub struct RunViewModel {
    pub status: RunStatus,
    pub progress_percent: u8,
    pub message: String,
    pub followers_count: usize,
    pub following_count: usize,
    pub not_reciprocating: Vec<EntryRowView>,
    pub admirers: Vec<EntryRowView>,
}

impl RunViewModel {
    /// Rows of a tab whose handle contains `search`, ignoring case.
    pub fn rows(&self, tab: DisplayTab, search: &str) -> Vec<&EntryRowView> {
        let rows = match tab {
            DisplayTab::NotReciprocating => &self.not_reciprocating,
            DisplayTab::Admirers => &self.admirers,
        };
        let needle = search.trim().to_lowercase();
        rows.iter()
            .filter(|row| needle.is_empty() || row.handle.to_lowercase().contains(&needle))
            .collect()
    }
}

#[derive(Debug, Clone, PartialEq, Eq)]
pub struct EntryRowView {
    pub handle: String,
    pub display_name: Option<String>,
    pub verified: bool,
    pub image: Option<ImageRef>,
}

impl EntryRowView {
    pub fn from_entry(entry: &ListEntry) -> Self {
        Self {
            handle: entry.handle.clone(),
            display_name: entry.display_name.clone(),
            verified: entry.verified,
            image: entry.image.clone(),
        }
    }
}
