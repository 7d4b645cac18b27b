//! JSON shapes shared by both list transports.
use follow_core::{ImageRef, ListEntry, SubjectId};
use serde::Deserialize;
use serde_json::Value;

use engine_logging::engine_debug;

use crate::{FailureKind, FetchError};

/// A user object as returned by either list endpoint.
#[derive(Debug, Deserialize)]
pub(crate) struct ApiUser {
    #[serde(default)]
    username: Option<String>,
    #[serde(default)]
    full_name: Option<String>,
    #[serde(default)]
    profile_pic_url: Option<String>,
    #[serde(default)]
    is_verified: Option<bool>,
    #[serde(default)]
    pk: Option<Value>,
    #[serde(default)]
    id: Option<Value>,
}

impl ApiUser {
    /// `None` for records without a handle; those are skipped, not fatal.
    pub(crate) fn into_entry(self) -> Option<ListEntry> {
        let Some(handle) = self.username.filter(|name| !name.is_empty()) else {
            engine_debug!("Skipping user record without a username");
            return None;
        };
        let subject_id = [self.pk.as_ref(), self.id.as_ref()]
            .into_iter()
            .flatten()
            .find_map(scalar_to_string)
            .unwrap_or_default();
        Some(ListEntry {
            handle,
            display_name: self.full_name.filter(|name| !name.trim().is_empty()),
            image: self
                .profile_pic_url
                .filter(|url| !url.is_empty())
                .map(ImageRef::parse),
            verified: self.is_verified.unwrap_or(false),
            subject_id: SubjectId::new(subject_id),
        })
    }
}

/// Ids and cursors arrive as either JSON strings or numbers.
pub(crate) fn scalar_to_string(value: &Value) -> Option<String> {
    match value {
        Value::String(text) if !text.is_empty() => Some(text.clone()),
        Value::Number(number) => Some(number.to_string()),
        _ => None,
    }
}

pub(crate) fn parse_body<'a, T: Deserialize<'a>>(body: &'a [u8]) -> Result<T, FetchError> {
    serde_json::from_slice(body).map_err(|err| FetchError::new(FailureKind::Decode, err.to_string()))
}
