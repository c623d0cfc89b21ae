//! User-facing outcome of an action.
//!
//! Front ends render a [`Notice`] as a toast and follow a [`Route`] as a
//! navigation hint; neither carries any presentation detail.

use std::fmt;

use crate::error::GalleryError;

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum NoticeKind {
    Success,
    Error,
}

/// Short message describing what just happened.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct Notice {
    pub kind: NoticeKind,
    pub message: String,
}

impl Notice {
    pub fn success(message: impl Into<String>) -> Self {
        Self {
            kind: NoticeKind::Success,
            message: message.into(),
        }
    }

    pub fn error(message: impl Into<String>) -> Self {
        Self {
            kind: NoticeKind::Error,
            message: message.into(),
        }
    }

    pub fn is_error(&self) -> bool {
        self.kind == NoticeKind::Error
    }
}

impl From<&GalleryError> for Notice {
    fn from(err: &GalleryError) -> Self {
        Notice::error(err.user_message())
    }
}

impl fmt::Display for Notice {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(&self.message)
    }
}

/// Where the front end should go next.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum Route {
    Gallery,
    Submit,
    Profile,
    Login,
}

impl Route {
    pub fn as_str(&self) -> &'static str {
        match self {
            Route::Gallery => "/",
            Route::Submit => "/submit",
            Route::Profile => "/profile",
            Route::Login => "/login",
        }
    }
}
