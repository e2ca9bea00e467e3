//! File upload payloads and the attachment policy.

use serde::{Deserialize, Serialize};
use thiserror::Error;

/// Maximum accepted upload size: 5 MiB.
pub const MAX_UPLOAD_BYTES: usize = 5 * 1024 * 1024;

/// Content types accepted for attachments.
pub const ALLOWED_CONTENT_TYPES: [&str; 3] = ["image/jpeg", "image/png", "application/pdf"];

/// A file violates the attachment policy.
#[derive(Debug, Clone, PartialEq, Error)]
pub enum FileConstraintError {
    /// The content type is not in the allow-list.
    #[error("file '{name}' has unsupported content type '{content_type}'")]
    UnsupportedType { name: String, content_type: String },

    /// The file exceeds the size limit.
    #[error("file '{name}' is {size} bytes, over the {limit} byte limit")]
    TooLarge {
        name: String,
        size: usize,
        limit: usize,
    },
}

/// An in-memory file selected for upload.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct FileUpload {
    /// Original file name, used only for error messages.
    pub file_name: String,

    /// MIME content type reported by the client.
    pub content_type: String,

    /// Raw file bytes.
    pub bytes: Vec<u8>,
}

impl FileUpload {
    /// Creates a new upload payload.
    pub fn new(
        file_name: impl Into<String>,
        content_type: impl Into<String>,
        bytes: Vec<u8>,
    ) -> Self {
        Self {
            file_name: file_name.into(),
            content_type: content_type.into(),
            bytes,
        }
    }

    /// Returns the file size in bytes.
    pub fn size(&self) -> usize {
        self.bytes.len()
    }

    /// Returns the storage extension for the content type.
    pub fn extension(&self) -> &'static str {
        match self.content_type.as_str() {
            "image/jpeg" => "jpg",
            "image/png" => "png",
            "application/pdf" => "pdf",
            _ => "bin",
        }
    }

    /// Checks the file against the attachment policy.
    pub fn validate(&self) -> Result<(), FileConstraintError> {
        if !ALLOWED_CONTENT_TYPES.contains(&self.content_type.as_str()) {
            return Err(FileConstraintError::UnsupportedType {
                name: self.file_name.clone(),
                content_type: self.content_type.clone(),
            });
        }
        if self.size() > MAX_UPLOAD_BYTES {
            return Err(FileConstraintError::TooLarge {
                name: self.file_name.clone(),
                size: self.size(),
                limit: MAX_UPLOAD_BYTES,
            });
        }
        Ok(())
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn accepts_allowed_types_within_limit() {
        for content_type in ALLOWED_CONTENT_TYPES {
            let file = FileUpload::new("f", content_type, vec![0; 16]);
            assert!(file.validate().is_ok());
        }
    }

    #[test]
    fn rejects_unsupported_type() {
        let file = FileUpload::new("notes.txt", "text/plain", vec![0; 16]);
        assert!(matches!(
            file.validate(),
            Err(FileConstraintError::UnsupportedType { .. })
        ));
    }

    #[test]
    fn rejects_oversized_file() {
        let file = FileUpload::new("big.png", "image/png", vec![0; MAX_UPLOAD_BYTES + 1]);
        let err = file.validate().unwrap_err();
        assert!(matches!(err, FileConstraintError::TooLarge { size, .. } if size == MAX_UPLOAD_BYTES + 1));
    }

    #[test]
    fn boundary_size_is_accepted() {
        let file = FileUpload::new("max.pdf", "application/pdf", vec![0; MAX_UPLOAD_BYTES]);
        assert!(file.validate().is_ok());
    }

    #[test]
    fn extension_follows_content_type() {
        assert_eq!(FileUpload::new("a", "image/jpeg", vec![]).extension(), "jpg");
        assert_eq!(FileUpload::new("a", "image/png", vec![]).extension(), "png");
        assert_eq!(
            FileUpload::new("a", "application/pdf", vec![]).extension(),
            "pdf"
        );
        assert_eq!(FileUpload::new("a", "text/plain", vec![]).extension(), "bin");
    }
}
