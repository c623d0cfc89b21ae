//! Integration tests for session persistence across gallery restarts.

mod common;

use std::sync::Arc;

use prompt_gallery::adapters::mock::InMemoryBackend;
use prompt_gallery::adapters::FileSessionStore;
use prompt_gallery::gallery::Gallery;
use prompt_gallery::models::Like;
use prompt_gallery::session::SessionEvent;
use prompt_gallery::traits::SessionStore;
use tempfile::TempDir;

use common::*;

fn file_gallery(backend: &InMemoryBackend, dir: &TempDir) -> Gallery<InMemoryBackend> {
    let store = FileSessionStore::with_path(dir.path().join("session.json"));
    Gallery::new(Arc::new(backend.clone()), Box::new(store), &test_config())
}

#[tokio::test]
async fn test_session_survives_restart() {
    let dir = TempDir::new().unwrap();
    let backend = seeded_backend(&["cat"]);
    let user = test_account(&backend);
    backend.seed_like(Like {
        user_id: user.id,
        prompt_id: 1,
    });

    let mut first = file_gallery(&backend, &dir);
    first.start().await;
    first.sign_in(TEST_EMAIL, TEST_PASSWORD).await.unwrap();
    drop(first);

    let mut second = file_gallery(&backend, &dir);
    let restored = second.start().await;
    assert_eq!(restored.map(|u| u.id), Some(user.id));
    assert!(second.is_liked(1));
    assert_eq!(backend.bound_user(), Some(user.id));
}

#[tokio::test]
async fn test_expired_session_is_refreshed_on_start() {
    let dir = TempDir::new().unwrap();
    let backend = seeded_backend(&[]);
    let user = test_account(&backend);
    let mut session = backend.issue_session(user.id).unwrap();
    session.expires_at = 0;
    let store = FileSessionStore::with_path(dir.path().join("session.json"));
    store.save(&session).await.unwrap();

    let mut gallery = file_gallery(&backend, &dir);
    assert!(gallery.start().await.is_some());

    let saved = store.load().await.unwrap().unwrap();
    assert!(!saved.is_expired());
    assert_ne!(saved.access_token, session.access_token);
}

#[tokio::test]
async fn test_logout_removes_session_file() {
    let dir = TempDir::new().unwrap();
    let backend = seeded_backend(&[]);
    test_account(&backend);

    let mut gallery = file_gallery(&backend, &dir);
    gallery.start().await;
    gallery.sign_in(TEST_EMAIL, TEST_PASSWORD).await.unwrap();
    assert!(dir.path().join("session.json").exists());

    gallery.sign_out().await.unwrap();
    assert!(!dir.path().join("session.json").exists());

    let mut again = file_gallery(&backend, &dir);
    assert!(again.start().await.is_none());
}

#[tokio::test]
async fn test_corrupt_session_file_starts_signed_out() {
    let dir = TempDir::new().unwrap();
    std::fs::write(dir.path().join("session.json"), "{ not json").unwrap();
    let backend = seeded_backend(&["cat"]);

    let mut gallery = file_gallery(&backend, &dir);
    assert!(gallery.start().await.is_none());
    assert_eq!(gallery.feed().listing().len(), 1);
}

#[tokio::test]
async fn test_gallery_holds_one_subscription() {
    let backend = seeded_backend(&[]);
    test_account(&backend);
    let mut gallery = started_gallery(&backend).await;
    assert_eq!(gallery.session().listener_count(), 1);

    let mut extra = gallery.session().subscribe();
    assert_eq!(gallery.session().listener_count(), 2);

    gallery.sign_in(TEST_EMAIL, TEST_PASSWORD).await.unwrap();
    assert_eq!(extra.current().event, SessionEvent::SignedIn);

    extra.unsubscribe();
    assert_eq!(gallery.session().listener_count(), 1);
}
