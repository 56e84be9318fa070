//! File registry for the upload flow.
//!
//! [`UploadStore`] is a cloneable handle to a single [`UploadState`]. All
//! mutations go through the store and are applied atomically; subscribers
//! are notified only when something actually changed.

mod artifact;
mod file;
mod size;
mod state;
mod store;

pub use artifact::UploadedArtifact;
pub use file::{FileId, TrackedFile};
pub use size::format_file_size;
pub use state::{UploadState, UploadStats};
pub use store::{Selector, UploadStore};
