use std::path::PathBuf;

use async_trait::async_trait;
use bytes::Bytes;

use crate::errors::AppError;
use crate::uploads::FileStorage;

/// Stores files under a local directory, served back by `ServeDir` at `/uploads`.
#[derive(Debug, Clone)]
pub struct LocalStorage {
    root: PathBuf,
}

impl LocalStorage {
    pub fn new(root: impl Into<PathBuf>) -> Self {
        Self { root: root.into() }
    }
}

#[async_trait]
impl FileStorage for LocalStorage {
    async fn put(
        &self,
        folder: &str,
        key: &str,
        bytes: Bytes,
        _content_type: Option<&str>,
    ) -> Result<(), AppError> {
        let dir = self.root.join(folder);
        tokio::fs::create_dir_all(&dir)
            .await
            .map_err(|e| AppError::Storage(format!("creating {}: {e}", dir.display())))?;

        let path = dir.join(key);
        tokio::fs::write(&path, &bytes)
            .await
            .map_err(|e| AppError::Storage(format!("writing {}: {e}", path.display())))
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::uploads::{PendingUpload, UploadKind};
    use chrono::Utc;

    #[tokio::test]
    async fn test_store_writes_under_folder() {
        let dir = tempfile::tempdir().unwrap();
        let storage = LocalStorage::new(dir.path());
        let now = Utc::now();

        let pending = PendingUpload::new(
            UploadKind::Resume,
            "my cv.pdf",
            Some("application/pdf".into()),
            Bytes::from_static(b"%PDF-1.4"),
            now,
        )
        .unwrap();
        let expected = pending.reference();
        let reference = pending.store(&storage).await.unwrap();

        let key = format!("{}-my_cv.pdf", now.timestamp_millis());
        assert_eq!(reference, expected);
        assert_eq!(reference, format!("/uploads/resumes/{key}"));
        let written = std::fs::read(dir.path().join("resumes").join(&key)).unwrap();
        assert_eq!(written, b"%PDF-1.4");
    }

    #[tokio::test]
    async fn test_missing_root_is_created() {
        let dir = tempfile::tempdir().unwrap();
        let storage = LocalStorage::new(dir.path().join("data").join("uploads"));

        storage
            .put("cover-letters", "1-letter.txt", Bytes::from_static(b"hi"), None)
            .await
            .unwrap();

        let written = dir.path().join("data/uploads/cover-letters/1-letter.txt");
        assert_eq!(std::fs::read(written).unwrap(), b"hi");
    }
}
