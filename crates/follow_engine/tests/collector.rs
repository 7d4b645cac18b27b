mod common;

use std::time::Duration;

use common::{
    entries, failure, init_logging, instant_settings, page, EndlessFetcher, RecordingSink,
    ScriptedFetcher,
};
use follow_core::{CollectionStatus, ListEntry, RelationshipType, SubjectId, Transport};
use follow_engine::{
    collect_with_fallback, CollectError, CollectorSettings, Cursor, FailureKind, ListCollector,
};
use pretty_assertions::assert_eq;

const FOLLOWERS: RelationshipType = RelationshipType::Followers;

fn subject() -> SubjectId {
    SubjectId::new("4242")
}

fn handles(entries: &[ListEntry]) -> Vec<String> {
    entries.iter().map(|e| e.handle.clone()).collect()
}

#[tokio::test]
async fn pages_are_concatenated_in_order() {
    init_logging();
    let fetcher = ScriptedFetcher::new(
        Transport::Primary,
        vec![
            page(entries("a", 50), Some(Cursor::Primary("c1".into()))),
            page(entries("b", 30), None),
        ],
    );
    let sink = RecordingSink::default();
    let settings = instant_settings();

    let result = ListCollector::new(&fetcher, &settings, &sink)
        .collect(&subject(), FOLLOWERS)
        .await
        .unwrap();

    assert_eq!(result.len(), 80);
    assert_eq!(result.status, CollectionStatus::Complete);
    assert_eq!(result.entries[0].handle, "a0");
    assert_eq!(result.entries[79].handle, "b29");
    let cursors: Vec<_> = fetcher.calls().into_iter().map(|c| c.cursor).collect();
    assert_eq!(cursors, vec![None, Some(Cursor::Primary("c1".into()))]);
    assert_eq!(
        sink.messages(),
        vec![
            "Fetching followers: 50 found...".to_string(),
            "Fetching followers: 80 found...".to_string(),
        ]
    );
}

#[tokio::test]
async fn repeated_handles_across_pages_collapse() {
    init_logging();
    let mut renamed = ListEntry::new("a1", SubjectId::new("1"));
    renamed.display_name = Some("Renamed".into());
    let fetcher = ScriptedFetcher::new(
        Transport::Primary,
        vec![
            page(entries("a", 3), Some(Cursor::Primary("c1".into()))),
            page(vec![renamed], None),
        ],
    );
    let sink = RecordingSink::default();
    let settings = instant_settings();

    let result = ListCollector::new(&fetcher, &settings, &sink)
        .collect(&subject(), FOLLOWERS)
        .await
        .unwrap();

    assert_eq!(handles(&result.entries), vec!["a0", "a1", "a2"]);
    assert_eq!(result.entries[1].display_name.as_deref(), Some("Renamed"));
}

#[tokio::test(start_paused = true)]
async fn rate_limit_waits_grow_linearly_then_succeed() {
    init_logging();
    let fetcher = ScriptedFetcher::new(
        Transport::Primary,
        vec![
            failure(FailureKind::RateLimited),
            failure(FailureKind::RateLimited),
            failure(FailureKind::RateLimited),
            page(entries("a", 10), None),
        ],
    );
    let sink = RecordingSink::default();
    let settings = CollectorSettings::default();

    let result = ListCollector::new(&fetcher, &settings, &sink)
        .collect(&subject(), FOLLOWERS)
        .await
        .unwrap();
    assert_eq!(result.len(), 10);

    let calls = fetcher.calls();
    assert_eq!(calls.len(), 4);
    let expected = [5u64, 10, 15];
    for (pair, secs) in calls.windows(2).zip(expected) {
        let gap = pair[1].at - pair[0].at;
        let want = Duration::from_secs(secs);
        assert!(
            gap >= want && gap < want + Duration::from_millis(10),
            "expected ~{want:?}, waited {gap:?}"
        );
    }
    let messages = sink.messages();
    assert!(messages.contains(&"Rate limited, waiting... (retry 1/3)".to_string()));
    assert!(messages.contains(&"Rate limited, waiting... (retry 3/3)".to_string()));
}

#[tokio::test]
async fn fourth_consecutive_rate_limit_gives_up() {
    init_logging();
    let fetcher = ScriptedFetcher::new(
        Transport::Primary,
        (0..4).map(|_| failure(FailureKind::RateLimited)).collect(),
    );
    let sink = RecordingSink::default();
    let settings = instant_settings();

    let err = ListCollector::new(&fetcher, &settings, &sink)
        .collect(&subject(), FOLLOWERS)
        .await
        .unwrap_err();

    assert_eq!(err, CollectError::RateLimitExceeded);
    assert_eq!(fetcher.call_count(), 4);
}

#[tokio::test]
async fn transient_failures_are_retried_three_times() {
    init_logging();
    let fetcher = ScriptedFetcher::new(
        Transport::Primary,
        (0..5).map(|_| failure(FailureKind::HttpStatus(500))).collect(),
    );
    let sink = RecordingSink::default();
    let settings = instant_settings();

    let err = ListCollector::new(&fetcher, &settings, &sink)
        .collect(&subject(), FOLLOWERS)
        .await
        .unwrap_err();

    assert!(matches!(err, CollectError::Exhausted { attempts: 4, .. }), "{err:?}");
    assert_eq!(fetcher.call_count(), 4);
    assert!(sink.messages().contains(&"Retrying followers... (3/3)".to_string()));
}

#[tokio::test]
async fn retry_budget_resets_after_a_successful_page() {
    init_logging();
    let fetcher = ScriptedFetcher::new(
        Transport::Primary,
        vec![
            failure(FailureKind::Network),
            failure(FailureKind::Network),
            failure(FailureKind::Network),
            page(entries("a", 2), Some(Cursor::Primary("c1".into()))),
            failure(FailureKind::Network),
            failure(FailureKind::Network),
            failure(FailureKind::Network),
            page(entries("b", 2), None),
        ],
    );
    let sink = RecordingSink::default();
    let settings = instant_settings();

    let result = ListCollector::new(&fetcher, &settings, &sink)
        .collect(&subject(), FOLLOWERS)
        .await
        .unwrap();

    assert_eq!(result.len(), 4);
    assert_eq!(result.status, CollectionStatus::Complete);
}

#[tokio::test]
async fn unauthorized_is_never_retried() {
    init_logging();
    let fetcher = ScriptedFetcher::new(
        Transport::Primary,
        vec![failure(FailureKind::Unauthorized(401)), page(entries("a", 1), None)],
    );
    let sink = RecordingSink::default();
    let settings = instant_settings();

    let err = ListCollector::new(&fetcher, &settings, &sink)
        .collect(&subject(), FOLLOWERS)
        .await
        .unwrap_err();

    assert!(err.is_unauthorized());
    assert_eq!(fetcher.call_count(), 1);
}

#[tokio::test]
async fn terminal_failure_after_a_page_keeps_partial_entries() {
    init_logging();
    let fetcher = ScriptedFetcher::new(
        Transport::Primary,
        vec![
            page(entries("a", 50), Some(Cursor::Primary("c1".into()))),
            failure(FailureKind::Unauthorized(403)),
        ],
    );
    let sink = RecordingSink::default();
    let settings = instant_settings();

    let result = ListCollector::new(&fetcher, &settings, &sink)
        .collect(&subject(), FOLLOWERS)
        .await
        .unwrap();

    assert_eq!(result.len(), 50);
    assert!(result.is_partial());
}

#[tokio::test]
async fn wrong_cursor_variant_is_fatal() {
    init_logging();
    let fetcher = ScriptedFetcher::new(
        Transport::Fallback,
        vec![failure(FailureKind::CursorMismatch), page(entries("a", 1), None)],
    );
    let sink = RecordingSink::default();
    let settings = instant_settings();

    let err = ListCollector::new(&fetcher, &settings, &sink)
        .collect(&subject(), FOLLOWERS)
        .await
        .unwrap_err();

    assert!(matches!(&err, CollectError::Fatal(e) if e.kind == FailureKind::CursorMismatch));
    assert_eq!(fetcher.call_count(), 1);
}

#[tokio::test]
async fn reported_progress_never_decreases() {
    init_logging();
    let fetcher = ScriptedFetcher::new(
        Transport::Primary,
        vec![
            page(entries("a", 50), Some(Cursor::Primary("c1".into()))),
            failure(FailureKind::RateLimited),
            page(entries("b", 50), Some(Cursor::Primary("c2".into()))),
            page(entries("c", 50), None),
        ],
    );
    let sink = RecordingSink::default();
    let settings = instant_settings();

    ListCollector::new(&fetcher, &settings, &sink)
        .collect(&subject(), RelationshipType::Following)
        .await
        .unwrap();

    let percents: Vec<f32> = sink
        .updates()
        .into_iter()
        .filter(|u| u.message.starts_with("Fetching"))
        .map(|u| u.percent)
        .collect();
    assert_eq!(percents, vec![55.5, 56.0, 56.5]);
}

#[tokio::test]
async fn fallback_runs_exactly_once_after_an_empty_primary() {
    init_logging();
    let primary = ScriptedFetcher::new(Transport::Primary, vec![page(Vec::new(), None)]);
    let fallback = ScriptedFetcher::new(
        Transport::Fallback,
        vec![
            page(
                entries("a", 50),
                Some(Cursor::Fallback {
                    end_cursor: "e1".into(),
                    has_next: true,
                }),
            ),
            page(
                entries("b", 50),
                Some(Cursor::Fallback {
                    end_cursor: "e2".into(),
                    has_next: true,
                }),
            ),
            page(
                entries("c", 20),
                Some(Cursor::Fallback {
                    end_cursor: "e3".into(),
                    has_next: false,
                }),
            ),
        ],
    );
    let sink = RecordingSink::default();
    let settings = instant_settings();

    let result = collect_with_fallback(&primary, &fallback, &settings, &sink, &subject(), FOLLOWERS)
        .await
        .unwrap();

    assert_eq!(result.len(), 120);
    assert_eq!(result.transport, Transport::Fallback);
    assert_eq!(primary.call_count(), 1);
    assert_eq!(fallback.call_count(), 3);
    let messages = sink.messages();
    assert_eq!(
        messages
            .iter()
            .filter(|m| *m == "Trying alternative method for followers...")
            .count(),
        1
    );
    assert!(messages.contains(&"Fetching followers (alt): 120 found...".to_string()));
}

#[tokio::test]
async fn primary_success_skips_fallback() {
    init_logging();
    let primary = ScriptedFetcher::new(Transport::Primary, vec![page(entries("a", 3), None)]);
    let fallback = ScriptedFetcher::new(Transport::Fallback, vec![page(entries("z", 3), None)]);
    let sink = RecordingSink::default();
    let settings = instant_settings();

    let result = collect_with_fallback(&primary, &fallback, &settings, &sink, &subject(), FOLLOWERS)
        .await
        .unwrap();

    assert_eq!(result.transport, Transport::Primary);
    assert_eq!(fallback.call_count(), 0);
}

#[tokio::test]
async fn unauthorized_primary_does_not_fall_back() {
    init_logging();
    let primary = ScriptedFetcher::new(
        Transport::Primary,
        vec![failure(FailureKind::Unauthorized(401))],
    );
    let fallback = ScriptedFetcher::new(Transport::Fallback, vec![page(entries("z", 3), None)]);
    let sink = RecordingSink::default();
    let settings = instant_settings();

    let err = collect_with_fallback(&primary, &fallback, &settings, &sink, &subject(), FOLLOWERS)
        .await
        .unwrap_err();

    assert!(err.is_unauthorized());
    assert_eq!(fallback.call_count(), 0);
}

#[tokio::test]
async fn failed_primary_recovers_through_fallback() {
    init_logging();
    let primary = ScriptedFetcher::new(
        Transport::Primary,
        (0..4).map(|_| failure(FailureKind::HttpStatus(500))).collect(),
    );
    let fallback = ScriptedFetcher::new(Transport::Fallback, vec![page(entries("z", 3), None)]);
    let sink = RecordingSink::default();
    let settings = instant_settings();

    let result = collect_with_fallback(&primary, &fallback, &settings, &sink, &subject(), FOLLOWERS)
        .await
        .unwrap();

    assert_eq!(handles(&result.entries), vec!["z0", "z1", "z2"]);
    assert_eq!(fallback.call_count(), 1);
}

#[tokio::test]
async fn both_transports_failing_surfaces_the_primary_error() {
    init_logging();
    let primary = ScriptedFetcher::new(
        Transport::Primary,
        (0..4).map(|_| failure(FailureKind::HttpStatus(500))).collect(),
    );
    let fallback = ScriptedFetcher::new(
        Transport::Fallback,
        vec![failure(FailureKind::Unauthorized(401))],
    );
    let sink = RecordingSink::default();
    let settings = instant_settings();

    let err = collect_with_fallback(&primary, &fallback, &settings, &sink, &subject(), FOLLOWERS)
        .await
        .unwrap_err();

    assert!(matches!(err, CollectError::Exhausted { attempts: 4, .. }), "{err:?}");
}

#[tokio::test]
async fn empty_primary_and_failed_fallback_is_an_empty_result() {
    init_logging();
    let primary = ScriptedFetcher::new(Transport::Primary, vec![page(Vec::new(), None)]);
    let fallback = ScriptedFetcher::new(
        Transport::Fallback,
        vec![failure(FailureKind::Unauthorized(401))],
    );
    let sink = RecordingSink::default();
    let settings = instant_settings();

    let result = collect_with_fallback(&primary, &fallback, &settings, &sink, &subject(), FOLLOWERS)
        .await
        .unwrap();

    assert!(result.is_empty());
    assert_eq!(result.status, CollectionStatus::Empty);
}

#[tokio::test]
async fn fallback_stops_at_the_entry_cap() {
    init_logging();
    let primary = ScriptedFetcher::new(Transport::Primary, vec![page(Vec::new(), None)]);
    let fallback = EndlessFetcher::new(Transport::Fallback, 500);
    let sink = RecordingSink::default();
    let settings = instant_settings();

    let result = collect_with_fallback(&primary, &fallback, &settings, &sink, &subject(), FOLLOWERS)
        .await
        .unwrap();

    assert_eq!(result.len(), 2000);
    assert_eq!(fallback.call_count(), 4);
    assert_eq!(result.status, CollectionStatus::Complete);
}
