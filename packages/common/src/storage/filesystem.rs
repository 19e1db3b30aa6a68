use std::path::PathBuf;
use std::sync::atomic::{AtomicU64, Ordering};

use async_trait::async_trait;
use tokio::fs;
use tokio::io::{AsyncReadExt, AsyncWriteExt, BufReader};

use super::error::StorageError;
use super::path::MediaPath;
use super::traits::{BoxReader, MediaStore};

/// Filesystem-backed media store.
///
/// Files live at `{base_path}/{kind}/{slug}/{filename}`, mirroring [`MediaPath`].
/// Writes go to `{base_path}/.tmp` first and are renamed into place.
pub struct FilesystemMediaStore {
    base_path: PathBuf,
    max_size: u64,
    tmp_counter: AtomicU64,
}

impl FilesystemMediaStore {
    /// Create a new store rooted at `base_path`, creating directories as needed.
    pub async fn new(base_path: PathBuf, max_size: u64) -> Result<Self, StorageError> {
        fs::create_dir_all(&base_path).await?;
        fs::create_dir_all(base_path.join(".tmp")).await?;
        Ok(Self {
            base_path,
            max_size,
            tmp_counter: AtomicU64::new(0),
        })
    }

    fn file_path(&self, path: &MediaPath) -> PathBuf {
        self.base_path
            .join(path.kind().as_str())
            .join(path.slug())
            .join(path.filename())
    }

    fn temp_path(&self) -> PathBuf {
        let n = self.tmp_counter.fetch_add(1, Ordering::Relaxed);
        self.base_path
            .join(".tmp")
            .join(format!("{}-{n}", std::process::id()))
    }
}

#[async_trait]
impl MediaStore for FilesystemMediaStore {
    async fn put_stream(
        &self,
        path: &MediaPath,
        mut reader: BoxReader,
    ) -> Result<(), StorageError> {
        let temp_path = self.temp_path();
        let mut total_bytes: u64 = 0;

        let mut buf = vec![0u8; 64 * 1024];
        let mut temp_file = fs::File::create(&temp_path).await?;

        loop {
            let n = reader.read(&mut buf).await?;
            if n == 0 {
                break;
            }

            total_bytes += n as u64;
            if total_bytes > self.max_size {
                drop(temp_file);
                let _ = fs::remove_file(&temp_path).await;
                return Err(StorageError::SizeLimitExceeded {
                    actual: total_bytes,
                    limit: self.max_size,
                });
            }

            temp_file.write_all(&buf[..n]).await?;
        }

        temp_file.flush().await?;
        drop(temp_file);

        let target = self.file_path(path);
        if let Some(parent) = target.parent() {
            fs::create_dir_all(parent).await?;
        }

        if let Err(e) = fs::rename(&temp_path, &target).await {
            let _ = fs::remove_file(&temp_path).await;
            return Err(e.into());
        }

        tracing::debug!(path = %path, bytes = total_bytes, "Stored media file");
        Ok(())
    }

    async fn get_stream(&self, path: &MediaPath) -> Result<BoxReader, StorageError> {
        match fs::File::open(self.file_path(path)).await {
            Ok(file) => Ok(Box::new(BufReader::new(file))),
            Err(e) if e.kind() == std::io::ErrorKind::NotFound => {
                Err(StorageError::NotFound(path.to_string()))
            }
            Err(e) => Err(e.into()),
        }
    }

    async fn size(&self, path: &MediaPath) -> Result<u64, StorageError> {
        match fs::metadata(self.file_path(path)).await {
            Ok(meta) => Ok(meta.len()),
            Err(e) if e.kind() == std::io::ErrorKind::NotFound => {
                Err(StorageError::NotFound(path.to_string()))
            }
            Err(e) => Err(e.into()),
        }
    }
}
