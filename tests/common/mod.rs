//! Common test utilities for integration tests.
//!
//! This module provides reusable fixtures for driving a [`Gallery`] against
//! the in-memory backend, plus wire fixtures for the REST bindings.
//!
//! # Example
//!
//! ```ignore
//! let backend = seeded_backend(&["Cat haiku", "Dog poem"]);
//! let mut gallery = started_gallery(&backend).await;
//! ```

#![allow(dead_code)]

pub mod mocks;

pub use mocks::*;

use std::sync::Arc;

use prompt_gallery::adapters::mock::{InMemoryBackend, InMemorySessionStore};
use prompt_gallery::config::GalleryConfig;
use prompt_gallery::gallery::Gallery;
use prompt_gallery::models::User;

pub const TEST_EMAIL: &str = "ana@example.com";
pub const TEST_PASSWORD: &str = "correct horse";

/// Configuration pointing at a host that is never contacted.
pub fn test_config() -> GalleryConfig {
    GalleryConfig::new("https://gallery.test", "anon-key")
}

/// Backend holding one prompt per title, ids in title order.
pub fn seeded_backend(titles: &[&str]) -> InMemoryBackend {
    let backend = InMemoryBackend::new();
    for title in titles {
        backend.seed_prompt(title, &format!("{} body", title), None);
    }
    backend
}

/// Register the standard test account.
pub fn test_account(backend: &InMemoryBackend) -> User {
    backend.add_account(TEST_EMAIL, TEST_PASSWORD, Some("Ana"))
}

pub fn gallery_with_store(
    backend: &InMemoryBackend,
    store: InMemorySessionStore,
) -> Gallery<InMemoryBackend> {
    Gallery::new(Arc::new(backend.clone()), Box::new(store), &test_config())
}

/// A gallery that has restored its (empty) session and loaded page 1.
pub async fn started_gallery(backend: &InMemoryBackend) -> Gallery<InMemoryBackend> {
    let mut gallery = gallery_with_store(backend, InMemorySessionStore::new());
    gallery.start().await;
    gallery
}

/// A started gallery signed in as the standard test account.
pub async fn signed_in_gallery(backend: &InMemoryBackend) -> (Gallery<InMemoryBackend>, User) {
    let user = test_account(backend);
    let mut gallery = started_gallery(backend).await;
    gallery
        .sign_in(TEST_EMAIL, TEST_PASSWORD)
        .await
        .expect("sign-in should succeed");
    (gallery, user)
}
