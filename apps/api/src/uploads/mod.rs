//! Resume and cover-letter uploads.
//!
//! Only the returned reference (`/uploads/<folder>/<key>`) is persisted on the
//! application row. The bytes go to whichever [`FileStorage`] backend is
//! configured: a local directory or an S3-compatible bucket.

pub mod local;
pub mod s3;

use std::path::Path;

use async_trait::async_trait;
use bytes::Bytes;
use chrono::{DateTime, Utc};
use tracing::info;

use crate::errors::AppError;

pub use local::LocalStorage;
pub use s3::S3Storage;

/// URL prefix under which stored files are served.
pub const PUBLIC_PREFIX: &str = "/uploads";

/// Storage backend for uploaded documents.
///
/// Carried in `AppState` as `Arc<dyn FileStorage>`.
#[async_trait]
pub trait FileStorage: Send + Sync {
    /// Writes `bytes` under `folder/key`, replacing anything already there.
    async fn put(
        &self,
        folder: &str,
        key: &str,
        bytes: Bytes,
        content_type: Option<&str>,
    ) -> Result<(), AppError>;
}

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum UploadKind {
    Resume,
    CoverLetter,
}

impl UploadKind {
    pub fn folder(self) -> &'static str {
        match self {
            UploadKind::Resume => "resumes",
            UploadKind::CoverLetter => "cover-letters",
        }
    }

    pub fn allowed_extensions(self) -> &'static [&'static str] {
        match self {
            UploadKind::Resume => &["pdf", "doc", "docx"],
            UploadKind::CoverLetter => &["pdf", "doc", "docx", "txt"],
        }
    }

    fn label(self) -> &'static str {
        match self {
            UploadKind::Resume => "resume",
            UploadKind::CoverLetter => "cover letter",
        }
    }
}

/// Rejects a file name whose extension is not allowed for `kind`. Case-insensitive.
pub fn validate_extension(kind: UploadKind, file_name: &str) -> Result<(), AppError> {
    let extension = Path::new(file_name)
        .extension()
        .and_then(|ext| ext.to_str())
        .map(str::to_ascii_lowercase);

    match extension {
        Some(ext) if kind.allowed_extensions().contains(&ext.as_str()) => Ok(()),
        _ => Err(AppError::Validation(format!(
            "Invalid {} file type '{file_name}'. Allowed: {}",
            kind.label(),
            kind.allowed_extensions()
                .iter()
                .map(|ext| format!(".{ext}"))
                .collect::<Vec<_>>()
                .join(", ")
        ))),
    }
}

/// Replaces every character outside `[A-Za-z0-9._-]` with `_`.
pub fn sanitise_file_name(file_name: &str) -> String {
    file_name
        .chars()
        .map(|c| {
            if c.is_ascii_alphanumeric() || matches!(c, '.' | '_' | '-') {
                c
            } else {
                '_'
            }
        })
        .collect()
}

/// `<unix-millis>-<sanitised name>`.
pub fn object_key(file_name: &str, now: DateTime<Utc>) -> String {
    format!("{}-{}", now.timestamp_millis(), sanitise_file_name(file_name))
}

/// An accepted upload whose reference is known before anything is written.
///
/// The caller can validate the row that will carry [`PendingUpload::reference`]
/// first and only then [`store`](PendingUpload::store) the bytes.
#[derive(Debug)]
pub struct PendingUpload {
    kind: UploadKind,
    key: String,
    content_type: Option<String>,
    bytes: Bytes,
}

impl PendingUpload {
    /// Checks the extension and fixes the object key. Writes nothing.
    pub fn new(
        kind: UploadKind,
        file_name: &str,
        content_type: Option<String>,
        bytes: Bytes,
        now: DateTime<Utc>,
    ) -> Result<Self, AppError> {
        validate_extension(kind, file_name)?;
        Ok(Self {
            kind,
            key: object_key(file_name, now),
            content_type,
            bytes,
        })
    }

    pub fn kind(&self) -> UploadKind {
        self.kind
    }

    /// `/uploads/<folder>/<key>`, the value persisted on the row.
    pub fn reference(&self) -> String {
        format!("{PUBLIC_PREFIX}/{}/{}", self.kind.folder(), self.key)
    }

    pub async fn store(self, storage: &dyn FileStorage) -> Result<String, AppError> {
        let reference = self.reference();
        let folder = self.kind.folder();
        let size = self.bytes.len();
        storage
            .put(folder, &self.key, self.bytes, self.content_type.as_deref())
            .await?;

        info!("Stored {} upload {folder}/{} ({size} bytes)", self.kind.label(), self.key);
        Ok(reference)
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use chrono::TimeZone;

    #[test]
    fn test_extension_allow_list_is_case_insensitive() {
        assert!(validate_extension(UploadKind::Resume, "CV.PDF").is_ok());
        assert!(validate_extension(UploadKind::Resume, "cv.docx").is_ok());
        assert!(validate_extension(UploadKind::Resume, "cv.txt").is_err());
        assert!(validate_extension(UploadKind::CoverLetter, "letter.TXT").is_ok());
        assert!(validate_extension(UploadKind::CoverLetter, "letter").is_err());
        assert!(validate_extension(UploadKind::CoverLetter, "payload.exe").is_err());
    }

    #[test]
    fn test_sanitise_replaces_unsafe_chars() {
        assert_eq!(sanitise_file_name("My CV (final).pdf"), "My_CV__final_.pdf");
        assert_eq!(sanitise_file_name("../../etc/passwd"), ".._.._etc_passwd");
        assert_eq!(sanitise_file_name("résumé.pdf"), "r_sum_.pdf");
    }

    #[test]
    fn test_pending_reference_known_before_store() {
        let now = Utc.timestamp_millis_opt(1_700_000_000_123).unwrap();
        let pending = PendingUpload::new(
            UploadKind::CoverLetter,
            "letter.txt",
            None,
            Bytes::from_static(b"hi"),
            now,
        )
        .unwrap();
        assert_eq!(pending.kind(), UploadKind::CoverLetter);
        assert_eq!(pending.reference(), "/uploads/cover-letters/1700000000123-letter.txt");

        let rejected = PendingUpload::new(UploadKind::Resume, "cv.exe", None, Bytes::new(), now);
        assert!(matches!(rejected, Err(AppError::Validation(_))));
    }

    #[test]
    fn test_object_key_prefixes_millis() {
        let now = Utc.timestamp_millis_opt(1_700_000_000_123).unwrap();
        assert_eq!(object_key("cv.pdf", now), "1700000000123-cv.pdf");
    }
}
