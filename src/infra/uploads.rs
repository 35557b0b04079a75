//! Filesystem storage for post images.

use std::path::{Component, Path, PathBuf};

use bytes::Bytes;
use thiserror::Error;
use tokio::{fs, io::AsyncWriteExt};
use uuid::Uuid;

#[derive(Debug, Error)]
pub enum UploadStorageError {
    #[error("invalid stored path")]
    InvalidPath,
    #[error("uploaded file is empty")]
    EmptyPayload,
    #[error(transparent)]
    Io(#[from] std::io::Error),
}

/// Filesystem-backed image storage rooted at a configured directory.
///
/// Stored paths are relative (`posts/<uuid>-<name>`) and are what the post
/// record carries; resolution rejects any path that would escape the root.
#[derive(Debug)]
pub struct UploadStorage {
    root: PathBuf,
}

impl UploadStorage {
    /// Initialise storage rooted at the provided directory, creating it if
    /// necessary.
    pub fn new(root: PathBuf) -> Result<Self, std::io::Error> {
        std::fs::create_dir_all(&root)?;
        Ok(Self { root })
    }

    /// Store an image payload and return the relative path to record.
    pub async fn store(
        &self,
        original_name: &str,
        payload: Bytes,
    ) -> Result<String, UploadStorageError> {
        if payload.is_empty() {
            return Err(UploadStorageError::EmptyPayload);
        }

        let stored_path = build_stored_path(original_name);
        let absolute = self.resolve(&stored_path)?;
        if let Some(parent) = absolute.parent() {
            fs::create_dir_all(parent).await?;
        }

        let mut file = fs::File::create(&absolute).await?;
        file.write_all(&payload).await?;
        file.flush().await?;
        Ok(stored_path)
    }

    pub async fn read(&self, stored_path: &str) -> Result<Bytes, UploadStorageError> {
        let absolute = self.resolve(stored_path)?;
        Ok(Bytes::from(fs::read(absolute).await?))
    }

    fn resolve(&self, stored_path: &str) -> Result<PathBuf, UploadStorageError> {
        let relative = Path::new(stored_path);
        let traversal_free = relative
            .components()
            .all(|component| matches!(component, Component::Normal(_)));
        if stored_path.is_empty() || !traversal_free {
            return Err(UploadStorageError::InvalidPath);
        }
        Ok(self.root.join(relative))
    }
}

fn build_stored_path(original_name: &str) -> String {
    let sanitized: String = Path::new(original_name)
        .file_name()
        .and_then(|name| name.to_str())
        .unwrap_or("upload")
        .chars()
        .map(|c| {
            if c.is_ascii_alphanumeric() || matches!(c, '.' | '-' | '_') {
                c
            } else {
                '-'
            }
        })
        .collect();
    format!("posts/{}-{sanitized}", Uuid::new_v4().simple())
}

#[cfg(test)]
mod tests {
    use super::*;

    #[tokio::test]
    async fn stores_and_reads_back_a_payload() {
        let dir = tempfile::tempdir().expect("tempdir");
        let storage = UploadStorage::new(dir.path().to_path_buf()).expect("storage");

        let stored = storage
            .store("picture.png", Bytes::from_static(b"not really a png"))
            .await
            .expect("store");
        assert!(stored.starts_with("posts/"));
        assert!(stored.ends_with("picture.png"));

        let read = storage.read(&stored).await.expect("read back");
        assert_eq!(&read[..], b"not really a png");
    }

    #[tokio::test]
    async fn rejects_path_traversal() {
        let dir = tempfile::tempdir().expect("tempdir");
        let storage = UploadStorage::new(dir.path().to_path_buf()).expect("storage");

        let err = storage.read("../outside").await.expect_err("must fail");
        assert!(matches!(err, UploadStorageError::InvalidPath));
    }

    #[tokio::test]
    async fn rejects_empty_payloads() {
        let dir = tempfile::tempdir().expect("tempdir");
        let storage = UploadStorage::new(dir.path().to_path_buf()).expect("storage");

        let err = storage
            .store("empty.png", Bytes::new())
            .await
            .expect_err("must fail");
        assert!(matches!(err, UploadStorageError::EmptyPayload));
    }
}
