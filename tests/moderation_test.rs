//! Integration tests for reporting prompts.

mod common;

use std::sync::Arc;

use bytes::Bytes;
use prompt_gallery::adapters::mock::{BackendOp, InMemoryBackend, InMemorySessionStore};
use prompt_gallery::gallery::Gallery;
use prompt_gallery::moderation::{DeletePath, ImageCleanup, ReportOutcome, REPORT_DELETE_THRESHOLD};
use prompt_gallery::traits::ObjectStorage;

use common::*;

async fn privileged_gallery(backend: &InMemoryBackend) -> Gallery<InMemoryBackend> {
    let config = test_config().with_delete_path(DeletePath::Privileged);
    let mut gallery = Gallery::new(
        Arc::new(backend.clone()),
        Box::new(InMemorySessionStore::new()),
        &config,
    );
    gallery.start().await;
    gallery
}

#[test]
fn test_threshold_is_ten() {
    assert_eq!(REPORT_DELETE_THRESHOLD, 10);
}

#[tokio::test]
async fn test_eighth_report_count_persists_nine() {
    let backend = seeded_backend(&["cat"]);
    backend.update_prompt(1, |p| p.report_count = 8);
    let mut gallery = privileged_gallery(&backend).await;

    let outcome = gallery.report(1).await.unwrap();
    assert_eq!(outcome, ReportOutcome::Reported { report_count: 9 });
    assert_eq!(backend.prompt(1).unwrap().report_count, 9);
    assert!(gallery.feed().listing().contains(1));
    assert_eq!(gallery.feed().listing().get(1).unwrap().report_count, 9);
}

#[tokio::test]
async fn test_ninth_report_count_deletes() {
    let backend = seeded_backend(&["cat", "dog"]);
    let path = "someone/1700000000000.png";
    backend.put_object(path, Bytes::from_static(b"png"));
    let url = backend.public_url(path);
    backend.update_prompt(1, |p| {
        p.report_count = 9;
        p.image_url = Some(url);
    });
    let mut gallery = privileged_gallery(&backend).await;

    let outcome = gallery.report(1).await.unwrap();
    assert_eq!(
        outcome,
        ReportOutcome::Deleted {
            image: ImageCleanup::Removed
        }
    );
    assert_eq!(outcome.notice().message, "Prompt deleted due to reports");
    assert!(backend.prompt(1).is_none());
    assert!(!backend.has_object(path));
    assert!(!gallery.feed().listing().contains(1));
    assert_eq!(gallery.feed().listing().total(), 1);
    assert_eq!(backend.call_count(BackendOp::DeleteReportedPrompt), 1);
}

#[tokio::test]
async fn test_report_needs_no_login() {
    let backend = seeded_backend(&["cat"]);
    let mut gallery = started_gallery(&backend).await;
    assert!(gallery.current_user().is_none());
    assert!(gallery.report(1).await.is_ok());
}

#[tokio::test]
async fn test_failed_report_leaves_listing_alone() {
    let backend = seeded_backend(&["cat"]);
    backend.update_prompt(1, |p| p.report_count = 3);
    let mut gallery = started_gallery(&backend).await;
    backend.fail(
        BackendOp::UpdateCounter,
        prompt_gallery::error::RemoteError::Decode("down".to_string()),
    );

    let err = gallery.report(1).await.unwrap_err();
    assert!(err.user_message().starts_with("Error reporting prompt"));
    assert_eq!(gallery.feed().listing().get(1).unwrap().report_count, 3);
}
