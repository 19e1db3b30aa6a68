mod error;
mod path;
mod traits;

pub mod filesystem;

pub use error::StorageError;
pub use path::{FilenameError, MediaKind, MediaPath, validate_flat_filename};
pub use traits::{BoxReader, MediaStore};
