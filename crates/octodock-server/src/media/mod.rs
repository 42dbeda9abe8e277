//! Media storage: uploaded files on disk plus a pluggable metadata index.
//!
//! File placement is `{upload_root}/{id}{extension}`. The index is the
//! source of truth for which uploads exist; [`MediaService`] keeps the two
//! in step.

mod error;
mod index;
mod record;
mod service;
mod sqlite_index;


pub use error::MediaError;
pub use index::{InMemoryIndex, MetadataIndex};
pub use record::{DEFAULT_MIME_TYPE, MediaRecord};
pub use service::{MediaService, UploadContent};
pub use sqlite_index::SqliteIndex;
