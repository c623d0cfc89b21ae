pub mod feed;
mod prompt;
mod user;

pub use feed::{total_pages, FeedQuery, PromptPage, SortKey, DEFAULT_PAGE_SIZE};
pub use prompt::{CounterUpdate, Like, NewPrompt, Prompt, PromptId};
pub use user::{Session, SignUpOutcome, User};
