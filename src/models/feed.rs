//! Feed query parameters and result pages.

use std::fmt;
use std::str::FromStr;

use super::prompt::Prompt;

/// Default number of prompts per page.
pub const DEFAULT_PAGE_SIZE: u32 = 9;

/// Feed ordering. Every key sorts descending with `id` as tie-breaker.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Default)]
pub enum SortKey {
    /// Creation timestamp, newest first.
    #[default]
    Newest,
    /// Like count, most liked first.
    Likes,
    /// Copy count, most copied first.
    Copies,
}

impl SortKey {
    pub const ALL: [SortKey; 3] = [SortKey::Newest, SortKey::Likes, SortKey::Copies];

    pub fn as_str(&self) -> &'static str {
        match self {
            SortKey::Newest => "newest",
            SortKey::Likes => "likes",
            SortKey::Copies => "copies",
        }
    }

    /// Remote column the key orders by.
    pub fn column(&self) -> &'static str {
        match self {
            SortKey::Newest => "created_at",
            SortKey::Likes => "likes",
            SortKey::Copies => "copy_count",
        }
    }

    /// Total order used for pagination: key descending, then id descending.
    pub fn compare(&self, a: &Prompt, b: &Prompt) -> std::cmp::Ordering {
        let primary = match self {
            SortKey::Newest => b.created_at.cmp(&a.created_at),
            SortKey::Likes => b.likes.cmp(&a.likes),
            SortKey::Copies => b.copy_count.cmp(&a.copy_count),
        };
        primary.then_with(|| b.id.cmp(&a.id))
    }
}

impl fmt::Display for SortKey {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.as_str())
    }
}

impl FromStr for SortKey {
    type Err = String;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        match s.trim().to_ascii_lowercase().as_str() {
            "newest" | "new" => Ok(SortKey::Newest),
            "likes" | "liked" => Ok(SortKey::Likes),
            "copies" | "copied" => Ok(SortKey::Copies),
            other => Err(format!(
                "unknown sort key '{}' (expected newest, likes or copies)",
                other
            )),
        }
    }
}

/// Inputs of a feed fetch. Pages are 1-based.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct FeedQuery {
    pub search: String,
    pub page: u32,
    pub page_size: u32,
    pub sort: SortKey,
}

impl Default for FeedQuery {
    fn default() -> Self {
        Self {
            search: String::new(),
            page: 1,
            page_size: DEFAULT_PAGE_SIZE,
            sort: SortKey::Newest,
        }
    }
}

impl FeedQuery {
    pub fn new(page_size: u32) -> Self {
        Self {
            page_size: page_size.max(1),
            ..Self::default()
        }
    }

    /// Zero-based offset of the first row on this page.
    pub fn offset(&self) -> u64 {
        u64::from(self.page.max(1) - 1) * u64::from(self.limit())
    }

    pub fn limit(&self) -> u32 {
        self.page_size.max(1)
    }

    /// The search term, or `None` when it is blank.
    pub fn search_term(&self) -> Option<&str> {
        let term = self.search.trim();
        (!term.is_empty()).then_some(term)
    }
}

/// One page of prompts plus the total number of matches.
#[derive(Debug, Clone, PartialEq, Default)]
pub struct PromptPage {
    pub prompts: Vec<Prompt>,
    pub total: u64,
}

/// Number of pages needed to show `total` rows.
pub fn total_pages(total: u64, page_size: u32) -> u64 {
    let size = u64::from(page_size.max(1));
    total.div_ceil(size)
}
