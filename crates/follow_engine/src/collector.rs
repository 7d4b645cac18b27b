use std::time::Duration;

use engine_logging::{engine_debug, engine_info, engine_warn};
use follow_core::{
    collection_base, collection_percent, dedupe_by_handle, CollectionResult, ListEntry,
    RelationshipType, SubjectId, Transport,
};

use crate::fetch::{PageFetcher, ProgressSink};
use crate::retry::{page_pause, RetryBudget, RetryDecision, RetryPolicy};
use crate::{Cursor, FailureKind, FetchError, ProgressUpdate};

#[derive(Debug, Clone)]
pub struct CollectorSettings {
    pub retry: RetryPolicy,
    /// Bounds of the jittered pause between two pages.
    pub page_delay_min: Duration,
    pub page_delay_max: Duration,
    /// Ceiling on entries gathered through the fallback transport.
    pub fallback_cap: usize,
}

impl Default for CollectorSettings {
    fn default() -> Self {
        Self {
            retry: RetryPolicy::default(),
            page_delay_min: Duration::from_millis(1000),
            page_delay_max: Duration::from_millis(1500),
            fallback_cap: 2000,
        }
    }
}

#[derive(Debug, Clone, PartialEq, Eq, thiserror::Error)]
pub enum CollectError {
    #[error("{0}; make sure you are logged in and viewing your own profile")]
    Unauthorized(FetchError),
    #[error("rate limited; wait a few minutes and try again")]
    RateLimitExceeded,
    #[error("gave up after {attempts} attempts: {error}")]
    Exhausted { attempts: u32, error: FetchError },
    #[error("{0}")]
    Fatal(FetchError),
}

impl CollectError {
    pub fn is_unauthorized(&self) -> bool {
        matches!(self, CollectError::Unauthorized(_))
    }
}

enum CollectorState {
    AwaitingPage,
    Backoff { attempt: u32, delay: Duration },
    Retry { attempt: u32, delay: Duration },
    Pacing,
    Done,
    Failed(CollectError),
}

/// Drives one transport across every page of one relationship list.
pub struct ListCollector<'a> {
    fetcher: &'a dyn PageFetcher,
    settings: &'a CollectorSettings,
    sink: &'a dyn ProgressSink,
}

impl<'a> ListCollector<'a> {
    pub fn new(
        fetcher: &'a dyn PageFetcher,
        settings: &'a CollectorSettings,
        sink: &'a dyn ProgressSink,
    ) -> Self {
        Self {
            fetcher,
            settings,
            sink,
        }
    }

    /// Collects every page. A terminal failure after at least one page yields a
    /// partial result; with no page collected the failure is returned.
    pub async fn collect(
        &self,
        subject: &SubjectId,
        kind: RelationshipType,
    ) -> Result<CollectionResult, CollectError> {
        let transport = self.fetcher.transport();
        let cap = match transport {
            Transport::Primary => None,
            Transport::Fallback => Some(self.settings.fallback_cap),
        };
        let policy = &self.settings.retry;

        let mut entries: Vec<ListEntry> = Vec::new();
        let mut cursor: Option<Cursor> = None;
        let mut budget = RetryBudget::default();
        let mut pages = 0usize;
        let mut state = CollectorState::AwaitingPage;

        loop {
            state = match state {
                CollectorState::AwaitingPage => {
                    match self.fetcher.fetch_page(subject, kind, cursor.as_ref()).await {
                        Ok(page) => {
                            budget.reset();
                            pages += 1;
                            entries.extend(page.entries);
                            let capped = match cap {
                                Some(cap) if entries.len() >= cap => {
                                    entries.truncate(cap);
                                    engine_warn!("Stopping {} at the {} entry cap", kind, cap);
                                    true
                                }
                                _ => false,
                            };
                            self.report_count(kind, transport, entries.len());
                            match page.next_cursor {
                                Some(next) if !capped && next.has_more() => {
                                    cursor = Some(next);
                                    CollectorState::Pacing
                                }
                                _ => CollectorState::Done,
                            }
                        }
                        Err(error) => {
                            engine_warn!("Fetching {} page failed: {}", kind, error);
                            match policy.decide(error.kind.class(), &mut budget) {
                                RetryDecision::Backoff { attempt, delay } => {
                                    CollectorState::Backoff { attempt, delay }
                                }
                                RetryDecision::Retry { attempt, delay } => {
                                    CollectorState::Retry { attempt, delay }
                                }
                                RetryDecision::RateLimitExceeded => {
                                    CollectorState::Failed(CollectError::RateLimitExceeded)
                                }
                                RetryDecision::Exhausted { attempts } => {
                                    CollectorState::Failed(CollectError::Exhausted { attempts, error })
                                }
                                RetryDecision::Fatal => CollectorState::Failed(fatal(error)),
                            }
                        }
                    }
                }
                CollectorState::Backoff { attempt, delay } => {
                    self.report_message(
                        kind,
                        format!(
                            "Rate limited, waiting... (retry {attempt}/{})",
                            policy.max_rate_limit_retries
                        ),
                    );
                    tokio::time::sleep(delay).await;
                    CollectorState::AwaitingPage
                }
                CollectorState::Retry { attempt, delay } => {
                    self.report_message(
                        kind,
                        format!(
                            "Retrying {kind}... ({attempt}/{})",
                            policy.max_transient_retries
                        ),
                    );
                    tokio::time::sleep(delay).await;
                    CollectorState::AwaitingPage
                }
                CollectorState::Pacing => {
                    let pause = page_pause(self.settings.page_delay_min, self.settings.page_delay_max);
                    engine_debug!("Pausing {:?} before the next {} page", pause, kind);
                    tokio::time::sleep(pause).await;
                    CollectorState::AwaitingPage
                }
                CollectorState::Done => {
                    let entries = dedupe_by_handle(entries);
                    engine_info!("Total {} fetched via {}: {}", kind, transport, entries.len());
                    return Ok(CollectionResult::complete(entries, transport));
                }
                CollectorState::Failed(error) => {
                    if pages == 0 {
                        return Err(error);
                    }
                    let entries = dedupe_by_handle(entries);
                    engine_warn!(
                        "Continuing with {} {} collected before: {}",
                        entries.len(),
                        kind,
                        error
                    );
                    return Ok(CollectionResult::partial(entries, transport, error.to_string()));
                }
            };
        }
    }

    fn report_count(&self, kind: RelationshipType, transport: Transport, collected: usize) {
        let label = match transport {
            Transport::Primary => "",
            Transport::Fallback => " (alt)",
        };
        self.sink.emit(ProgressUpdate {
            percent: collection_percent(kind, transport, collected),
            message: format!("Fetching {kind}{label}: {collected} found..."),
        });
    }

    /// Message-only update: the band base never lowers reported progress.
    fn report_message(&self, kind: RelationshipType, message: String) {
        self.sink.emit(ProgressUpdate {
            percent: collection_base(kind),
            message,
        });
    }
}

fn fatal(error: FetchError) -> CollectError {
    match error.kind {
        FailureKind::Unauthorized(_) => CollectError::Unauthorized(error),
        _ => CollectError::Fatal(error),
    }
}

/// Collects one list through the primary transport and falls back to the second
/// transport, exactly once, when the primary yields nothing or fails for any
/// reason other than missing authorization.
pub async fn collect_with_fallback(
    primary: &dyn PageFetcher,
    fallback: &dyn PageFetcher,
    settings: &CollectorSettings,
    sink: &dyn ProgressSink,
    subject: &SubjectId,
    kind: RelationshipType,
) -> Result<CollectionResult, CollectError> {
    let primary_error = match ListCollector::new(primary, settings, sink)
        .collect(subject, kind)
        .await
    {
        Ok(result) if !result.is_empty() => return Ok(result),
        Ok(_) => {
            engine_warn!("Primary transport returned 0 {}, trying fallback", kind);
            None
        }
        Err(error) if error.is_unauthorized() => return Err(error),
        Err(error) => {
            engine_warn!("Primary transport failed for {}: {}; trying fallback", kind, error);
            Some(error)
        }
    };

    sink.emit(ProgressUpdate {
        percent: collection_base(kind),
        message: format!("Trying alternative method for {kind}..."),
    });

    match ListCollector::new(fallback, settings, sink)
        .collect(subject, kind)
        .await
    {
        Ok(result) => Ok(result),
        Err(fallback_error) => match primary_error {
            Some(primary_error) => {
                engine_warn!("Fallback transport also failed for {}: {}", kind, fallback_error);
                Err(primary_error)
            }
            None => {
                engine_warn!(
                    "Fallback transport failed for {} after an empty primary result: {}",
                    kind,
                    fallback_error
                );
                Ok(CollectionResult::complete(Vec::new(), Transport::Primary))
            }
        },
    }
}
