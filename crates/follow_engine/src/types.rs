use std::fmt;

use follow_core::ListEntry;

/// Continuation token of one transport. The two encodings are never interchangeable.
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum Cursor {
    /// `max_id` token of the REST transport.
    Primary(String),
    /// `end_cursor`/`has_next_page` pair of the query transport.
    Fallback { end_cursor: String, has_next: bool },
}

impl Cursor {
    /// Whether the list continues past the page that produced this cursor.
    pub fn has_more(&self) -> bool {
        match self {
            Cursor::Primary(_) => true,
            Cursor::Fallback { has_next, .. } => *has_next,
        }
    }
}

/// One page of a relationship list.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct Page {
    pub entries: Vec<ListEntry>,
    /// `None`, or a cursor without `has_more()`, when this was the last page.
    pub next_cursor: Option<Cursor>,
    pub status_code: u16,
}

#[derive(Debug, Clone, PartialEq)]
pub struct ProgressUpdate {
    pub percent: f32,
    pub message: String,
}

#[derive(Debug, Clone, PartialEq, Eq)]
pub struct FetchError {
    pub kind: FailureKind,
    pub message: String,
}

impl FetchError {
    pub fn new(kind: FailureKind, message: impl Into<String>) -> Self {
        Self {
            kind,
            message: message.into(),
        }
    }
}

impl fmt::Display for FetchError {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        if self.message.is_empty() {
            write!(f, "{}", self.kind)
        } else {
            write!(f, "{}: {}", self.kind, self.message)
        }
    }
}

impl std::error::Error for FetchError {}

#[derive(Debug, Clone, PartialEq, Eq)]
pub enum FailureKind {
    InvalidUrl,
    RateLimited,
    Unauthorized(u16),
    HttpStatus(u16),
    Timeout,
    RedirectLimitExceeded,
    TooLarge { max_bytes: u64, actual: Option<u64> },
    UnsupportedContentType { content_type: String },
    Decode,
    CursorMismatch,
    Network,
}

/// How the collector treats a failure.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum FailureClass {
    RateLimit,
    Transient,
    Fatal,
}

impl FailureKind {
    pub fn class(&self) -> FailureClass {
        match self {
            FailureKind::RateLimited => FailureClass::RateLimit,
            FailureKind::Unauthorized(_)
            | FailureKind::CursorMismatch
            | FailureKind::InvalidUrl => FailureClass::Fatal,
            FailureKind::HttpStatus(_)
            | FailureKind::Timeout
            | FailureKind::RedirectLimitExceeded
            | FailureKind::TooLarge { .. }
            | FailureKind::UnsupportedContentType { .. }
            | FailureKind::Decode
            | FailureKind::Network => FailureClass::Transient,
        }
    }

    pub(crate) fn from_status(status: u16) -> Self {
        match status {
            429 => FailureKind::RateLimited,
            401 | 403 => FailureKind::Unauthorized(status),
            _ => FailureKind::HttpStatus(status),
        }
    }
}

impl fmt::Display for FailureKind {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            FailureKind::InvalidUrl => write!(f, "invalid url"),
            FailureKind::RateLimited => write!(f, "rate limited"),
            FailureKind::Unauthorized(code) => write!(f, "not authorized (http {code})"),
            FailureKind::HttpStatus(code) => write!(f, "http status {code}"),
            FailureKind::Timeout => write!(f, "timeout"),
            FailureKind::RedirectLimitExceeded => write!(f, "redirect limit exceeded"),
            FailureKind::TooLarge { max_bytes, actual } => {
                write!(f, "response too large (max {max_bytes}, actual {actual:?})")
            }
            FailureKind::UnsupportedContentType { content_type } => {
                write!(f, "unsupported content type {content_type}")
            }
            FailureKind::Decode => write!(f, "malformed response body"),
            FailureKind::CursorMismatch => write!(f, "cursor belongs to the other transport"),
            FailureKind::Network => write!(f, "network error"),
        }
    }
}
