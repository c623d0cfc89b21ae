//! Mock implementations for testing.
//!
//! # Available Mocks
//!
//! - [`MockHttpClient`] - HTTP client with scripted responses
//! - [`InMemorySessionStore`] - In-memory session storage
//! - [`InMemoryBackend`] - Auth, tables and storage held in memory

pub mod backend;
pub mod http;
pub mod session_store;

pub use backend::{BackendOp, InMemoryBackend};
pub use http::{MockHttpClient, MockResponse, RecordedRequest};
pub use session_store::InMemorySessionStore;
