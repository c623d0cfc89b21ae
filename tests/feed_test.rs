//! Integration tests for browsing the feed: ordering, pagination and search.

mod common;

use std::collections::HashSet;
use std::sync::Arc;

use prompt_gallery::adapters::mock::{BackendOp, InMemoryBackend};
use prompt_gallery::error::RemoteError;
use prompt_gallery::feed::PromptFeed;
use prompt_gallery::models::{Prompt, PromptId, SortKey};

use common::*;

/// Backend with colliding like and copy counts so the id tie-break matters.
fn backend_with_collisions(n: i64) -> InMemoryBackend {
    let backend = InMemoryBackend::new();
    for i in 0..n {
        let title = if i % 3 == 0 {
            format!("Cat {}", i)
        } else {
            format!("Dog {}", i)
        };
        let prompt = backend.seed_prompt(&title, "text", None);
        backend.update_prompt(prompt.id, |p| {
            p.likes = (i % 4) as u64;
            p.copy_count = (i % 2) as u64;
        });
    }
    backend
}

async fn all_pages(feed: &mut PromptFeed<InMemoryBackend>) -> Vec<Prompt> {
    feed.refresh().await;
    let pages = feed.total_pages();
    let mut seen = Vec::new();
    for page in 1..=pages {
        assert!(feed.set_page(page as u32).await);
        seen.extend(feed.listing().prompts().iter().cloned());
    }
    seen
}

#[tokio::test]
async fn test_pages_partition_result_for_every_sort_key() {
    let backend = backend_with_collisions(23);
    let total: HashSet<PromptId> = (1..=23).collect();

    for sort in SortKey::ALL {
        let mut feed = PromptFeed::new(Arc::new(backend.clone()), 5);
        feed.set_sort(sort).await;
        let seen = all_pages(&mut feed).await;

        let ids: Vec<PromptId> = seen.iter().map(|p| p.id).collect();
        let unique: HashSet<PromptId> = ids.iter().copied().collect();
        assert_eq!(ids.len(), 23, "{} produced duplicates or gaps", sort);
        assert_eq!(unique, total);
        for pair in seen.windows(2) {
            assert_ne!(
                sort.compare(&pair[0], &pair[1]),
                std::cmp::Ordering::Greater,
                "{} out of order",
                sort
            );
        }
    }
}

#[tokio::test]
async fn test_search_is_case_insensitive_over_title_and_text() {
    let backend = seeded_backend(&["Cat haiku", "Dog poem", "Bird song"]);
    backend.seed_prompt("Recipe", "Describe a CATERPILLAR", None);

    for sort in SortKey::ALL {
        let mut feed = PromptFeed::new(Arc::new(backend.clone()), 9);
        feed.set_sort(sort).await;
        feed.set_search("cat").await;

        let mut titles: Vec<&str> = feed
            .listing()
            .iter()
            .map(|p| p.title.as_str())
            .collect();
        titles.sort_unstable();
        assert_eq!(titles, vec!["Cat haiku", "Recipe"]);
        assert_eq!(feed.listing().total(), 2);
    }
}

#[tokio::test]
async fn test_total_pages_follow_total() {
    let backend = backend_with_collisions(19);
    let mut feed = PromptFeed::new(Arc::new(backend), 9);
    feed.refresh().await;

    assert_eq!(feed.listing().total(), 19);
    assert_eq!(feed.total_pages(), 3);
    feed.set_page(3).await;
    assert_eq!(feed.listing().len(), 1);
}

#[tokio::test]
async fn test_failed_fetch_keeps_stale_page() {
    let backend = seeded_backend(&["Cat haiku", "Dog poem"]);
    let mut gallery = started_gallery(&backend).await;
    assert_eq!(gallery.feed().listing().len(), 2);

    backend.fail(
        BackendOp::FetchPrompts,
        RemoteError::Status {
            status: 503,
            message: "unavailable".to_string(),
        },
    );
    assert!(!gallery.browse("dog", SortKey::Newest, 1).await);
    assert_eq!(gallery.feed().listing().len(), 2);
    assert_eq!(gallery.feed().listing().total(), 2);
    assert!(gallery.feed_error().is_some());

    backend.clear_failures();
    assert!(gallery.browse("dog", SortKey::Newest, 1).await);
    assert_eq!(gallery.feed().listing().len(), 1);
    assert!(gallery.feed_error().is_none());
}

#[tokio::test]
async fn test_copy_counts_and_returns_text() {
    let backend = seeded_backend(&["Cat haiku"]);
    let mut gallery = started_gallery(&backend).await;

    let copied = gallery.copy(1).await.unwrap();
    assert_eq!(copied.text, "Cat haiku body");
    assert!(copied.counted);
    assert_eq!(backend.prompt(1).unwrap().copy_count, 1);
}
