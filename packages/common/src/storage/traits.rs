use std::io::Cursor;

use async_trait::async_trait;
use tokio::io::AsyncRead;

use super::error::StorageError;
use super::path::MediaPath;

/// Type alias for a boxed async reader.
pub type BoxReader = Box<dyn AsyncRead + Unpin + Send>;

/// Path-addressed storage for uploaded images.
///
/// Files are keyed by their [`MediaPath`]; writing to an existing path replaces it.
#[async_trait]
pub trait MediaStore: Send + Sync {
    /// Store bytes at the given path.
    async fn put(&self, path: &MediaPath, data: &[u8]) -> Result<(), StorageError> {
        let reader: BoxReader = Box::new(Cursor::new(data.to_vec()));
        self.put_stream(path, reader).await
    }

    /// Store data from an async reader at the given path.
    async fn put_stream(&self, path: &MediaPath, reader: BoxReader) -> Result<(), StorageError>;

    /// Open a stored file for streaming.
    async fn get_stream(&self, path: &MediaPath) -> Result<BoxReader, StorageError>;

    /// Size in bytes of a stored file.
    async fn size(&self, path: &MediaPath) -> Result<u64, StorageError>;
}
