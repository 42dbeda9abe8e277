//! Media storage service: disk placement plus index bookkeeping.

use std::io::ErrorKind;
use std::path::{Path, PathBuf};
use std::pin::Pin;
use std::sync::Arc;

use bytes::Bytes;
use tokio::fs::File;
use tokio::io::{AsyncRead, AsyncReadExt, AsyncWriteExt};
use tracing::{debug, info, instrument, warn};

use octodock_core::db::unix_timestamp;

use super::error::MediaError;
use super::index::MetadataIndex;
use super::record::{DEFAULT_MIME_TYPE, MediaRecord};

const COPY_BUF_SIZE: usize = 64 * 1024;

/// Upload payload shapes accepted by [`MediaService::upload`].
pub enum UploadContent<'a> {
    Bytes(Bytes),
    /// Stored as its UTF-8 encoding.
    Text(String),
    /// Drained to completion before the upload returns.
    Stream(Pin<Box<dyn AsyncRead + Send + 'a>>),
}

impl UploadContent<'_> {
    fn kind(&self) -> &'static str {
        match self {
            Self::Bytes(_) => "bytes",
            Self::Text(_) => "text",
            Self::Stream(_) => "stream",
        }
    }
}

impl std::fmt::Debug for UploadContent<'_> {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        match self {
            Self::Bytes(b) => write!(f, "Bytes({} bytes)", b.len()),
            Self::Text(t) => write!(f, "Text({} bytes)", t.len()),
            Self::Stream(_) => f.write_str("Stream"),
        }
    }
}

/// Stores uploads under a fixed root and records them in a [`MetadataIndex`].
///
/// Uploads are not atomic: a crash between the file write and the index
/// insert leaves an orphan file behind.
#[derive(Clone)]
pub struct MediaService {
    root: PathBuf,
    index: Arc<dyn MetadataIndex>,
}

impl MediaService {
    /// Create the service, creating `root` if it doesn't exist.
    pub fn new(root: impl Into<PathBuf>, index: Arc<dyn MetadataIndex>) -> Result<Self, MediaError> {
        let root = root.into();
        std::fs::create_dir_all(&root).map_err(|e| {
            MediaError::Storage(format!("create upload dir {}: {}", root.display(), e))
        })?;

        info!(path = %root.display(), "Media storage ready");
        Ok(Self { root, index })
    }

    pub fn root(&self) -> &Path {
        &self.root
    }

    /// Write `content` to `{root}/{id}{ext}` and index it.
    #[instrument(skip(self, content), fields(kind = content.kind()))]
    pub async fn upload(
        &self,
        content: UploadContent<'_>,
        original_name: &str,
        mime_type: Option<&str>,
    ) -> Result<MediaRecord, MediaError> {
        match &content {
            UploadContent::Bytes(b) if b.is_empty() => {
                return Err(MediaError::InvalidInput("File content is required".into()));
            }
            UploadContent::Text(t) if t.is_empty() => {
                return Err(MediaError::InvalidInput("File content is required".into()));
            }
            _ => {}
        }

        let id = uuid::Uuid::new_v4().to_string();
        let stored_file_name = format!("{id}{}", extension_of(original_name));
        let path = self.root.join(&stored_file_name);

        tokio::fs::create_dir_all(&self.root).await.map_err(|e| {
            MediaError::Storage(format!("create upload dir {}: {}", self.root.display(), e))
        })?;

        let size_bytes = match write_content(&path, content).await {
            Ok(0) => {
                remove_quietly(&path).await;
                return Err(MediaError::InvalidInput("File content is required".into()));
            }
            Ok(size) => size,
            Err(e) => {
                remove_quietly(&path).await;
                return Err(e);
            }
        };

        let record = MediaRecord {
            id,
            stored_file_name,
            original_name: original_name.to_string(),
            mime_type: mime_type
                .filter(|m| !m.is_empty())
                .unwrap_or(DEFAULT_MIME_TYPE)
                .to_string(),
            size_bytes,
            storage_path: path,
            created_at: unix_timestamp(),
        };

        if let Err(e) = self.index.put(record.clone()).await {
            remove_quietly(&record.storage_path).await;
            return Err(e);
        }

        info!(
            id = %record.id,
            original_name = %record.original_name,
            size = record.size_bytes,
            "Stored media file"
        );
        Ok(record)
    }

    pub async fn get_metadata(&self, id: &str) -> Result<MediaRecord, MediaError> {
        self.index
            .get(id)
            .await?
            .ok_or_else(|| MediaError::NotFound(id.to_string()))
    }

    /// Open the stored file for sequential reading.
    pub async fn open_read_stream(&self, id: &str) -> Result<File, MediaError> {
        let record = self.get_metadata(id).await?;
        File::open(&record.storage_path).await.map_err(|e| {
            MediaError::Storage(format!("open {}: {}", record.storage_path.display(), e))
        })
    }

    /// Records `[(page-1)*limit, (page-1)*limit + limit)` in insertion order.
    ///
    /// A page past the end yields an empty list.
    pub async fn list(&self, page: usize, limit: usize) -> Result<Vec<MediaRecord>, MediaError> {
        if page == 0 || limit == 0 {
            return Err(MediaError::InvalidInput(
                "page and limit must be at least 1".into(),
            ));
        }
        let Some(offset) = (page - 1).checked_mul(limit) else {
            return Ok(Vec::new());
        };
        self.index.list(offset, limit).await
    }

    /// Drop the index entry and remove the file.
    ///
    /// A file that is already gone is not an error.
    #[instrument(skip(self))]
    pub async fn delete(&self, id: &str) -> Result<(), MediaError> {
        let record = self
            .index
            .delete(id)
            .await?
            .ok_or_else(|| MediaError::NotFound(id.to_string()))?;

        match tokio::fs::remove_file(&record.storage_path).await {
            Ok(()) => {}
            Err(e) if e.kind() == ErrorKind::NotFound => {
                debug!(path = %record.storage_path.display(), "Media file already absent");
            }
            Err(e) => {
                warn!(
                    path = %record.storage_path.display(),
                    error = %e,
                    "Failed to remove media file"
                );
            }
        }

        info!(id = %id, "Deleted media");
        Ok(())
    }
}

/// `".ext"` of the final path component, or `""`.
fn extension_of(name: &str) -> String {
    Path::new(name)
        .extension()
        .and_then(|ext| ext.to_str())
        .map(|ext| format!(".{ext}"))
        .unwrap_or_default()
}

async fn write_content(path: &Path, content: UploadContent<'_>) -> Result<u64, MediaError> {
    let write_err = |e: std::io::Error| MediaError::Storage(format!("write {}: {}", path.display(), e));

    let mut file = File::create(path).await.map_err(write_err)?;
    match content {
        UploadContent::Bytes(bytes) => file.write_all(&bytes).await.map_err(write_err)?,
        UploadContent::Text(text) => file.write_all(text.as_bytes()).await.map_err(write_err)?,
        UploadContent::Stream(mut reader) => {
            let mut buf = vec![0u8; COPY_BUF_SIZE];
            loop {
                let n = reader.read(&mut buf).await.map_err(|e| {
                    MediaError::InvalidInput(format!("Failed to read upload content: {e}"))
                })?;
                if n == 0 {
                    break;
                }
                file.write_all(&buf[..n]).await.map_err(write_err)?;
            }
        }
    }
    file.flush().await.map_err(write_err)?;
    file.sync_all().await.map_err(write_err)?;

    let metadata = file.metadata().await.map_err(write_err)?;
    Ok(metadata.len())
}

async fn remove_quietly(path: &Path) {
    if let Err(e) = tokio::fs::remove_file(path).await {
        if e.kind() != ErrorKind::NotFound {
            warn!(path = %path.display(), error = %e, "Failed to clean up partial upload");
        }
    }
}

#[cfg(test)]
mod tests {
    use super::extension_of;

    #[test]
    fn extension_comes_from_last_component() {
        assert_eq!(extension_of("note.txt"), ".txt");
        assert_eq!(extension_of("archive.tar.gz"), ".gz");
        assert_eq!(extension_of("../../etc/passwd"), "");
        assert_eq!(extension_of("dir/photo.PNG"), ".PNG");
        assert_eq!(extension_of(".bashrc"), "");
        assert_eq!(extension_of(""), "");
    }
}
