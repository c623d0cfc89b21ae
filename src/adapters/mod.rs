//! Concrete implementations of trait abstractions.
//!
//! # Adapters
//!
//! - [`ReqwestHttpClient`] - HTTP client using reqwest
//! - [`FileSessionStore`] - JSON file session storage
//!
//! # Mock Implementations
//!
//! The [`mock`] submodule provides test doubles:
//! - [`mock::MockHttpClient`] - Scripted HTTP responses
//! - [`mock::InMemorySessionStore`] - In-memory session storage
//! - [`mock::InMemoryBackend`] - In-memory hosted backend

pub mod file_session;
pub mod mock;
pub mod reqwest_http;

pub use file_session::FileSessionStore;
pub use mock::{InMemoryBackend, InMemorySessionStore, MockHttpClient};
pub use reqwest_http::ReqwestHttpClient;
