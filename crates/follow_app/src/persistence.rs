use std::fs;
use std::path::Path;

use anyhow::{Context, Result};
use chrono::{DateTime, Utc};
use engine_logging::{engine_info, engine_warn};
use follow_core::{
    DisplayTab, EntryRowView, ImageRef, ListEntry, RunState, RunStatus, RunViewModel, SubjectId,
};
use follow_engine::AtomicFileWriter;
use serde::{Deserialize, Serialize};

pub const CACHE_FILENAME: &str = ".follow_cache.ron";

#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct CachedEntry {
    pub handle: String,
    pub display_name: Option<String>,
    /// Remote reference only; embedded images are never written.
    pub image_url: Option<String>,
    pub verified: bool,
    pub id: String,
}

impl CachedEntry {
    fn from_entry(entry: &ListEntry) -> Self {
        let entry = entry.without_embedded_image();
        Self {
            handle: entry.handle,
            display_name: entry.display_name,
            image_url: entry.image.map(|image| image.as_str().to_string()),
            verified: entry.verified,
            id: entry.subject_id.as_str().to_string(),
        }
    }

    pub fn into_entry(self) -> ListEntry {
        ListEntry {
            handle: self.handle,
            display_name: self.display_name,
            image: self.image_url.map(ImageRef::parse),
            verified: self.verified,
            subject_id: SubjectId::new(self.id),
        }
    }
}

/// Last successful run as written to the output directory.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct CachedResult {
    pub handle: Option<String>,
    pub followers: Vec<CachedEntry>,
    pub following: Vec<CachedEntry>,
    pub not_reciprocating: Vec<CachedEntry>,
    pub admirers: Vec<CachedEntry>,
    pub last_updated: DateTime<Utc>,
}

impl CachedResult {
    pub fn from_state(state: &RunState, now: DateTime<Utc>) -> Self {
        let convert = |entries: &[ListEntry]| -> Vec<CachedEntry> {
            entries.iter().map(CachedEntry::from_entry).collect()
        };
        let reconciled = state.reconciled();
        Self {
            handle: state.subject().map(|subject| subject.handle.clone()),
            followers: convert(&state.followers().entries),
            following: convert(&state.following().entries),
            not_reciprocating: convert(&reconciled.not_reciprocating),
            admirers: convert(&reconciled.admirers),
            last_updated: now,
        }
    }

    /// View of the cached sets, shaped like the view of a finished run.
    pub fn view(&self) -> RunViewModel {
        let rows = |entries: &[CachedEntry]| -> Vec<EntryRowView> {
            entries
                .iter()
                .map(|cached| EntryRowView::from_entry(&cached.clone().into_entry()))
                .collect()
        };
        RunViewModel {
            status: RunStatus::Complete,
            progress_percent: 100,
            message: format!("Last updated: {}", self.last_updated.to_rfc3339()),
            followers_count: self.followers.len(),
            following_count: self.following.len(),
            not_reciprocating: rows(&self.not_reciprocating),
            admirers: rows(&self.admirers),
        }
    }

    pub fn entries(&self, tab: DisplayTab) -> Vec<ListEntry> {
        let cached = match tab {
            DisplayTab::NotReciprocating => &self.not_reciprocating,
            DisplayTab::Admirers => &self.admirers,
        };
        cached.iter().cloned().map(CachedEntry::into_entry).collect()
    }
}

pub fn save_cache(output_dir: &Path, cached: &CachedResult) -> Result<()> {
    let pretty = ron::ser::PrettyConfig::new();
    let content = ron::ser::to_string_pretty(cached, pretty).context("serializing result cache")?;
    let writer = AtomicFileWriter::new(output_dir.to_path_buf());
    let path = writer
        .write(CACHE_FILENAME, &content)
        .with_context(|| format!("writing result cache to {}", output_dir.display()))?;
    engine_info!("Saved result cache to {:?}", path);
    Ok(())
}

/// A missing or unreadable cache is reported as absent.
pub fn load_cache(output_dir: &Path) -> Option<CachedResult> {
    let path = output_dir.join(CACHE_FILENAME);
    let content = match fs::read_to_string(&path) {
        Ok(text) => text,
        Err(err) if err.kind() == std::io::ErrorKind::NotFound => return None,
        Err(err) => {
            engine_warn!("Failed to read result cache from {:?}: {}", path, err);
            return None;
        }
    };

    match ron::from_str(&content) {
        Ok(cached) => Some(cached),
        Err(err) => {
            engine_warn!("Failed to parse result cache from {:?}: {}", path, err);
            None
        }
    }
}

pub fn clear_cache(output_dir: &Path) -> Result<bool> {
    let writer = AtomicFileWriter::new(output_dir.to_path_buf());
    writer
        .remove(CACHE_FILENAME)
        .with_context(|| format!("removing result cache in {}", output_dir.display()))
}

#[cfg(test)]
mod tests {
    use super::*;
    use chrono::TimeZone;
    use pretty_assertions::assert_eq;

    fn entry(handle: &str, image: Option<&str>) -> ListEntry {
        ListEntry {
            image: image.map(ImageRef::parse),
            ..ListEntry::new(handle, SubjectId::new(format!("id-{handle}")))
        }
    }

    fn sample() -> CachedResult {
        CachedResult {
            handle: Some("me".into()),
            followers: vec![CachedEntry::from_entry(&entry("ann", None))],
            following: vec![CachedEntry::from_entry(&entry(
                "dee",
                Some("data:image/png;base64,AAAA"),
            ))],
            not_reciprocating: vec![CachedEntry::from_entry(&entry(
                "dee",
                Some("data:image/png;base64,AAAA"),
            ))],
            admirers: vec![CachedEntry::from_entry(&entry(
                "ann",
                Some("https://cdn.example.com/ann.jpg"),
            ))],
            last_updated: Utc.with_ymd_and_hms(2026, 10, 18, 9, 30, 0).unwrap(),
        }
    }

    #[test]
    fn embedded_images_are_stripped_and_remote_kept() {
        let cached = sample();
        assert_eq!(cached.following[0].image_url, None);
        assert_eq!(
            cached.admirers[0].image_url.as_deref(),
            Some("https://cdn.example.com/ann.jpg")
        );
        assert_eq!(
            cached.admirers[0].clone().into_entry().image,
            Some(ImageRef::Remote("https://cdn.example.com/ann.jpg".into()))
        );
    }

    #[test]
    fn cache_survives_a_save_and_load() {
        let dir = tempfile::tempdir().unwrap();
        let cached = sample();

        save_cache(dir.path(), &cached).unwrap();
        let text = fs::read_to_string(dir.path().join(CACHE_FILENAME)).unwrap();
        assert!(!text.contains("data:"));

        assert_eq!(load_cache(dir.path()), Some(cached));
    }

    #[test]
    fn cached_view_filters_like_a_live_run() {
        let view = sample().view();
        assert_eq!(view.followers_count, 1);
        assert_eq!(view.rows(DisplayTab::Admirers, "AN").len(), 1);
        assert!(view.rows(DisplayTab::NotReciprocating, "zzz").is_empty());
        assert_eq!(sample().entries(DisplayTab::NotReciprocating)[0].handle, "dee");
    }

    #[test]
    fn clearing_removes_the_cache() {
        let dir = tempfile::tempdir().unwrap();
        save_cache(dir.path(), &sample()).unwrap();

        assert!(clear_cache(dir.path()).unwrap());
        assert_eq!(load_cache(dir.path()), None);
        assert!(!clear_cache(dir.path()).unwrap());
    }

    #[test]
    fn corrupt_cache_is_treated_as_absent() {
        let dir = tempfile::tempdir().unwrap();
        fs::write(dir.path().join(CACHE_FILENAME), "not ron at all (").unwrap();

        assert_eq!(load_cache(dir.path()), None);
    }
}
