//! Error handling for the gallery.
//!
//! - **Error Categories**: the taxonomy front ends branch on
//! - **Remote Errors**: failures of a single backend call
//! - **Unified Error Type**: `GalleryError` for every user action
//! - **Result Type Alias**: `GalleryResult<T>`
//!
//! | Category | Raised when | Remote state changed |
//! |----------|-------------|----------------------|
//! | Unauthenticated | action needs a user | No |
//! | Validation | form input rejected | No |
//! | RemoteFailure | one remote call failed | No |
//! | PartialFailure | a later step of a two-step write failed | Possibly |

mod category;
mod gallery_error;
mod remote;
mod result;

pub use category::ErrorCategory;
pub use gallery_error::GalleryError;
pub use remote::RemoteError;
pub use result::{GalleryResult, RemoteResultExt};
