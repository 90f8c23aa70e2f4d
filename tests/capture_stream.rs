// tests/capture_stream.rs
use std::fs;
use std::time::Duration;

use chrono::{TimeZone, Utc};
use social_pipeline::verify::capture::CaptureStream;
use social_pipeline::verify::matcher::{parse_window_time, WindowStartMatcher};
use social_pipeline::verify::{
    EventPosition, EventStreamClient, PartitionSelector, StreamVerifier, VerificationOutcome,
    VerifierConfig,
};
use social_pipeline::PipelineError;

const PARTITION_0: &str = r#"{"sequenceNumber":1,"offset":"0","enqueuedTime":"2024-01-01T09:58:00Z","body":{"windowStart":"2024-01-01 09:55:00","count":3}}
not a capture line
{"sequenceNumber":2,"offset":"120","enqueuedTime":"2024-01-01T10:01:00Z","body":{"count":1}}
{"sequenceNumber":3,"offset":"240","enqueuedTime":"2024-01-01T10:06:00Z","body":{"windowStart":"2024-01-01 10:05:00","count":7}}
{"sequenceNumber":4,"offset":"360","enqueuedTime":"2024-01-01T10:11:00Z","body":{"windowStart":"2024-01-01 10:10:00","count":2}}
"#;

fn capture_dir() -> tempfile::TempDir {
    let dir = tempfile::tempdir().unwrap();
    fs::write(dir.path().join("0.jsonl"), PARTITION_0).unwrap();
    fs::write(
        dir.path().join("1.jsonl"),
        r#"{"sequenceNumber":1,"body":{"windowStart":"2023-12-31 23:00:00"}}"#,
    )
    .unwrap();
    fs::write(dir.path().join("README.txt"), "ignored").unwrap();
    dir
}

fn matcher(reference: &str) -> WindowStartMatcher {
    WindowStartMatcher::new(parse_window_time(reference).unwrap())
}

fn config() -> VerifierConfig {
    VerifierConfig::default()
        .with_deadline(Duration::from_secs(5))
        .with_batch_size(2)
}

#[tokio::test]
async fn partitions_are_sorted_jsonl_stems() {
    let dir = capture_dir();
    let ids = CaptureStream::new(dir.path()).partition_ids().await.unwrap();
    assert_eq!(ids, vec!["0".to_string(), "1".to_string()]);
}

#[tokio::test]
async fn finds_first_window_after_reference() {
    let dir = capture_dir();
    let outcome = StreamVerifier::new(config())
        .run(CaptureStream::new(dir.path()), &matcher("2024-01-01 10:00:00"))
        .await
        .unwrap();
    match outcome {
        VerificationOutcome::Found(found) => {
            assert_eq!(found.sequence_number, 3);
            assert_eq!(found.records_seen, 4);
            assert!(found.payload.contains("10:05:00"));
        }
        other => panic!("expected Found, got {other:?}"),
    }
}

#[tokio::test]
async fn end_of_file_is_exhausted() {
    let dir = capture_dir();
    let outcome = StreamVerifier::new(config().with_partition(PartitionSelector::Id("1".into())))
        .run(CaptureStream::new(dir.path()), &matcher("2024-01-01 10:00:00"))
        .await
        .unwrap();
    assert_eq!(outcome, VerificationOutcome::Exhausted);
}

#[tokio::test]
async fn enqueued_position_skips_older_events() {
    let dir = capture_dir();
    let after = Utc.with_ymd_and_hms(2024, 1, 1, 10, 7, 0).unwrap();
    let outcome = StreamVerifier::new(config().with_position(EventPosition::EnqueuedAfter(after)))
        .run(CaptureStream::new(dir.path()), &matcher("2024-01-01 10:00:00"))
        .await
        .unwrap();
    match outcome {
        VerificationOutcome::Found(found) => {
            assert_eq!(found.sequence_number, 4);
            assert_eq!(found.records_seen, 1);
        }
        other => panic!("expected Found, got {other:?}"),
    }
}

#[tokio::test]
async fn missing_capture_dir_is_a_connection_error() {
    let dir = tempfile::tempdir().unwrap();
    let missing = dir.path().join("nope");
    let err = StreamVerifier::new(config())
        .run(CaptureStream::new(missing), &matcher("2024-01-01 10:00:00"))
        .await
        .unwrap_err();
    assert!(matches!(err, PipelineError::Connection(_)));
}

#[tokio::test]
async fn bare_json_lines_are_matched_as_payloads() {
    let dir = tempfile::tempdir().unwrap();
    fs::write(
        dir.path().join("0.jsonl"),
        "{\"windowStart\":\"2024-01-01 09:50:00\"}\n{\"windowStart\":\"2024-01-01 10:05:00\"}\n",
    )
    .unwrap();
    let outcome = StreamVerifier::new(config())
        .run(CaptureStream::new(dir.path()), &matcher("2024-01-01 10:00:00"))
        .await
        .unwrap();
    match outcome {
        VerificationOutcome::Found(found) => {
            assert_eq!(found.sequence_number, 1);
            assert_eq!(found.records_seen, 2);
            assert!(found.payload.contains("10:05:00"));
        }
        other => panic!("expected Found, got {other:?}"),
    }
}

#[tokio::test]
async fn unknown_offset_is_a_connection_error() {
    let dir = capture_dir();
    let err = StreamVerifier::new(config().with_position(EventPosition::Offset("999".into())))
        .run(CaptureStream::new(dir.path()), &matcher("2024-01-01 10:00:00"))
        .await
        .unwrap_err();
    assert!(matches!(err, PipelineError::Connection(_)));
}
