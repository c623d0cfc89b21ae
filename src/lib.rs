//! prompt-gallery - client core for a community prompt gallery
//!
//! Browse, search, copy, like and report prompts stored in a hosted
//! backend; submit and manage your own. The backend is reached through the
//! [`traits::AuthService`], [`traits::Database`] and [`traits::ObjectStorage`]
//! traits; [`backend::RestBackend`] implements them over HTTP.

pub mod adapters;
pub mod backend;
pub mod cli;
pub mod config;
pub mod error;
pub mod feed;
pub mod gallery;
pub mod likes;
pub mod models;
pub mod moderation;
pub mod notice;
pub mod profile;
pub mod session;
pub mod submission;
pub mod traits;

pub use config::GalleryConfig;
pub use error::{GalleryError, GalleryResult};
pub use gallery::Gallery;
