//! Trait abstractions for dependency injection and testability.
//!
//! # Traits
//!
//! - [`HttpClient`] - HTTP client operations
//! - [`SessionStore`] - Persisted session storage
//! - [`AuthService`], [`Database`], [`ObjectStorage`] - Hosted backend capabilities

pub mod backend;
pub mod http;
pub mod session_store;

pub use backend::{AuthService, Backend, Database, ObjectStorage};
pub use http::{Headers, HttpClient, HttpError, Response};
pub use session_store::{SessionStore, SessionStoreError};
