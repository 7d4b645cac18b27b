use std::collections::HashMap;
use std::fmt;

use url::Url;

/// Stable identifier of an account on the remote service.
#[derive(Debug, Clone, PartialEq, Eq, Hash, Default)]
pub struct SubjectId(String);

impl SubjectId {
    pub fn new(id: impl Into<String>) -> Self {
        Self(id.into())
    }

    pub fn as_str(&self) -> &str {
        &self.0
    }
}

impl fmt::Display for SubjectId {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(&self.0)
    }
}

/// The account being analyzed, resolved once per run.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct SubjectIdentity {
    pub handle: String,
    pub id: SubjectId,
}

#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub enum RelationshipType {
    Followers,
    Following,
}

impl RelationshipType {
    pub fn as_str(self) -> &'static str {
        match self {
            RelationshipType::Followers => "followers",
            RelationshipType::Following => "following",
        }
    }
}

impl fmt::Display for RelationshipType {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.as_str())
    }
}

/// Profile image reference. Embedded images are `data:` URLs; everything else is
/// a remote reference that still has to be loaded by whoever renders it.
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum ImageRef {
    Remote(String),
    Embedded(String),
}

impl ImageRef {
    pub fn parse(raw: impl Into<String>) -> Self {
        let raw = raw.into();
        if raw.starts_with("data:") {
            ImageRef::Embedded(raw)
        } else {
            ImageRef::Remote(raw)
        }
    }

    pub fn as_str(&self) -> &str {
        match self {
            ImageRef::Remote(value) | ImageRef::Embedded(value) => value,
        }
    }

    pub fn is_embedded(&self) -> bool {
        matches!(self, ImageRef::Embedded(_))
    }

    pub fn remote_url(&self) -> Option<&str> {
        match self {
            ImageRef::Remote(url) => Some(url),
            ImageRef::Embedded(_) => None,
        }
    }
}

#[derive(Debug, Clone, PartialEq, Eq)]
pub struct ListEntry {
    pub handle: String,
    pub display_name: Option<String>,
    pub image: Option<ImageRef>,
    pub verified: bool,
    pub subject_id: SubjectId,
}

impl ListEntry {
    pub fn new(handle: impl Into<String>, subject_id: SubjectId) -> Self {
        Self {
            handle: handle.into(),
            display_name: None,
            image: None,
            verified: false,
            subject_id,
        }
    }

    /// Public profile address of this account relative to the service root.
    pub fn profile_url(&self, base: &Url) -> Option<Url> {
        base.join(&self.handle).ok()
    }

    /// Copy of the entry that keeps only remote image references.
    pub fn without_embedded_image(&self) -> Self {
        Self {
            image: self.image.as_ref().filter(|image| !image.is_embedded()).cloned(),
            ..self.clone()
        }
    }
}

/// Removes repeated handles. The first position of a handle is kept while its
/// contents are refreshed from the last occurrence.
pub fn dedupe_by_handle(entries: Vec<ListEntry>) -> Vec<ListEntry> {
    let mut positions: HashMap<String, usize> = HashMap::with_capacity(entries.len());
    let mut unique: Vec<ListEntry> = Vec::with_capacity(entries.len());
    for entry in entries {
        match positions.get(&entry.handle) {
            Some(&idx) => unique[idx] = entry,
            None => {
                positions.insert(entry.handle.clone(), unique.len());
                unique.push(entry);
            }
        }
    }
    unique
}

/// Which API produced a list.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Default)]
pub enum Transport {
    #[default]
    Primary,
    Fallback,
}

impl fmt::Display for Transport {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            Transport::Primary => f.write_str("primary"),
            Transport::Fallback => f.write_str("fallback"),
        }
    }
}

#[derive(Debug, Clone, PartialEq, Eq, Default)]
pub enum CollectionStatus {
    #[default]
    Empty,
    Complete,
    /// Collection stopped early on a terminal error; the entries gathered so far are kept.
    Partial { reason: String },
}

#[derive(Debug, Clone, PartialEq, Eq, Default)]
pub struct CollectionResult {
    pub entries: Vec<ListEntry>,
    pub status: CollectionStatus,
    pub transport: Transport,
}

impl CollectionResult {
    pub fn complete(entries: Vec<ListEntry>, transport: Transport) -> Self {
        let status = if entries.is_empty() {
            CollectionStatus::Empty
        } else {
            CollectionStatus::Complete
        };
        Self {
            entries,
            status,
            transport,
        }
    }

    pub fn partial(entries: Vec<ListEntry>, transport: Transport, reason: impl Into<String>) -> Self {
        Self {
            entries,
            status: CollectionStatus::Partial {
                reason: reason.into(),
            },
            transport,
        }
    }

    pub fn len(&self) -> usize {
        self.entries.len()
    }

    pub fn is_empty(&self) -> bool {
        self.entries.is_empty()
    }

    pub fn is_partial(&self) -> bool {
        matches!(self.status, CollectionStatus::Partial { .. })
    }
}
