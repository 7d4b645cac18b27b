#![allow(dead_code)]

use std::collections::VecDeque;
use std::sync::{Arc, Mutex, Once};
use std::time::Duration;

use follow_core::{ListEntry, RelationshipType, SubjectId, Transport};
use follow_engine::{
    CollectorSettings, Cursor, FailureKind, FetchError, Page, PageFetcher, ProgressSink,
    ProgressUpdate, RetryPolicy,
};
use tokio::time::Instant;

static INIT: Once = Once::new();

pub fn init_logging() {
    INIT.call_once(engine_logging::initialize_for_tests);
}

pub fn entries(prefix: &str, count: usize) -> Vec<ListEntry> {
    (0..count)
        .map(|i| ListEntry::new(format!("{prefix}{i}"), SubjectId::new(format!("{i}"))))
        .collect()
}

pub fn page(entries: Vec<ListEntry>, next_cursor: Option<Cursor>) -> Result<Page, FetchError> {
    Ok(Page {
        entries,
        next_cursor,
        status_code: 200,
    })
}

pub fn failure(kind: FailureKind) -> Result<Page, FetchError> {
    Err(FetchError::new(kind, "scripted"))
}

/// Settings without any waiting, for tests that only care about control flow.
pub fn instant_settings() -> CollectorSettings {
    CollectorSettings {
        retry: RetryPolicy {
            transient_delay: Duration::ZERO,
            rate_limit_step: Duration::ZERO,
            ..RetryPolicy::default()
        },
        page_delay_min: Duration::ZERO,
        page_delay_max: Duration::ZERO,
        ..CollectorSettings::default()
    }
}

#[derive(Debug, Clone)]
pub struct Call {
    pub cursor: Option<Cursor>,
    pub at: Instant,
}

/// Replays scripted page results; once the script runs out it returns an empty
/// last page.
pub struct ScriptedFetcher {
    transport: Transport,
    script: Mutex<VecDeque<Result<Page, FetchError>>>,
    calls: Mutex<Vec<Call>>,
}

impl ScriptedFetcher {
    pub fn new(transport: Transport, script: Vec<Result<Page, FetchError>>) -> Self {
        Self {
            transport,
            script: Mutex::new(script.into()),
            calls: Mutex::new(Vec::new()),
        }
    }

    pub fn calls(&self) -> Vec<Call> {
        self.calls.lock().unwrap().clone()
    }

    pub fn call_count(&self) -> usize {
        self.calls.lock().unwrap().len()
    }
}

#[async_trait::async_trait]
impl PageFetcher for ScriptedFetcher {
    fn transport(&self) -> Transport {
        self.transport
    }

    async fn fetch_page(
        &self,
        _subject: &SubjectId,
        _kind: RelationshipType,
        cursor: Option<&Cursor>,
    ) -> Result<Page, FetchError> {
        self.calls.lock().unwrap().push(Call {
            cursor: cursor.cloned(),
            at: Instant::now(),
        });
        self.script.lock().unwrap().pop_front().unwrap_or_else(|| page(Vec::new(), None))
    }
}

/// Never runs out of pages.
pub struct EndlessFetcher {
    pub transport: Transport,
    pub page_size: usize,
    calls: Mutex<usize>,
}

impl EndlessFetcher {
    pub fn new(transport: Transport, page_size: usize) -> Self {
        Self {
            transport,
            page_size,
            calls: Mutex::new(0),
        }
    }

    pub fn call_count(&self) -> usize {
        *self.calls.lock().unwrap()
    }
}

#[async_trait::async_trait]
impl PageFetcher for EndlessFetcher {
    fn transport(&self) -> Transport {
        self.transport
    }

    async fn fetch_page(
        &self,
        _subject: &SubjectId,
        _kind: RelationshipType,
        _cursor: Option<&Cursor>,
    ) -> Result<Page, FetchError> {
        let mut calls = self.calls.lock().unwrap();
        let prefix = format!("p{}_", *calls);
        *calls += 1;
        page(
            entries(&prefix, self.page_size),
            Some(Cursor::Fallback {
                end_cursor: format!("cursor-{}", *calls),
                has_next: true,
            }),
        )
    }
}

#[derive(Default, Clone)]
pub struct RecordingSink {
    updates: Arc<Mutex<Vec<ProgressUpdate>>>,
}

impl RecordingSink {
    pub fn updates(&self) -> Vec<ProgressUpdate> {
        self.updates.lock().unwrap().clone()
    }

    pub fn messages(&self) -> Vec<String> {
        self.updates().into_iter().map(|u| u.message).collect()
    }
}

impl ProgressSink for RecordingSink {
    fn emit(&self, update: ProgressUpdate) {
        self.updates.lock().unwrap().push(update);
    }
}
