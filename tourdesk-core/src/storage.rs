use async_trait::async_trait;

use crate::{CoreError, CoreResult};

pub const MAX_UPLOAD_BYTES: usize = 5 * 1024 * 1024;

/// An uploaded file as received from the UI layer.
#[derive(Debug, Clone)]
pub struct Upload {
    pub file_name: String,
    pub content_type: String,
    pub bytes: Vec<u8>,
}

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum FileKind {
    Image,
    Pdf,
}

impl FileKind {
    /// Folder the file is filed under inside its category.
    pub fn folder(&self) -> &'static str {
        match self {
            FileKind::Image => "images",
            FileKind::Pdf => "pdfs",
        }
    }
}

impl Upload {
    /// Accepts JPEG, PNG, GIF and PDF files up to `max_bytes`.
    pub fn validate(&self, max_bytes: usize) -> CoreResult<FileKind> {
        let kind = match self.content_type.to_ascii_lowercase().as_str() {
            "image/jpeg" | "image/jpg" | "image/png" | "image/gif" => FileKind::Image,
            "application/pdf" => FileKind::Pdf,
            other => {
                return Err(CoreError::ValidationError(format!(
                    "file must be an image (JPEG, PNG, GIF) or PDF, got {}",
                    other
                )))
            }
        };
        if self.bytes.is_empty() {
            return Err(CoreError::ValidationError("file is empty".to_string()));
        }
        if self.bytes.len() > max_bytes {
            return Err(CoreError::ValidationError(format!(
                "file is {} bytes, the limit is {} bytes",
                self.bytes.len(),
                max_bytes
            )));
        }
        Ok(kind)
    }

    /// Extension taken from the client file name, falling back to the type.
    pub fn extension(&self, kind: FileKind) -> String {
        let from_name = self
            .file_name
            .rsplit_once('.')
            .map(|(_, ext)| ext.to_ascii_lowercase())
            .filter(|ext| !ext.is_empty() && ext.chars().all(|c| c.is_ascii_alphanumeric()));
        from_name.unwrap_or_else(|| match kind {
            FileKind::Pdf => "pdf".to_string(),
            FileKind::Image => match self.content_type.as_str() {
                "image/png" => "png".to_string(),
                "image/gif" => "gif".to_string(),
                _ => "jpg".to_string(),
            },
        })
    }
}

/// File storage collaborator. Returns an opaque reference to the stored file.
#[async_trait]
pub trait ReceiptStorage: Send + Sync {
    async fn store(&self, upload: &Upload, category: &str) -> CoreResult<String>;
}
