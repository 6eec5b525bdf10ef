//! Uploaded file model and kind detection

use bytes::Bytes;

use crate::UploadError;

/// Supported upload kinds
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum FileKind {
    Pdf,
    Image,
}

impl FileKind {
    /// Detect the kind from the declared content type, falling back to the
    /// file name extension when the content type is missing or generic.
    pub fn detect(
        content_type: Option<&str>,
        file_name: Option<&str>,
    ) -> Result<Self, UploadError> {
        let declared = content_type
            .map(|ct| ct.split(';').next().unwrap_or(ct).trim().to_ascii_lowercase())
            .filter(|ct| !ct.is_empty() && ct != "application/octet-stream");

        let mime = match declared {
            Some(ct) => ct,
            None => file_name
                .and_then(|name| mime_guess::from_path(name).first())
                .map(|m| m.essence_str().to_string())
                .ok_or_else(|| {
                    UploadError::UnsupportedType(file_name.unwrap_or("unnamed file").to_string())
                })?,
        };

        match mime.as_str() {
            "application/pdf" => Ok(FileKind::Pdf),
            "image/png" | "image/jpeg" | "image/jpg" => Ok(FileKind::Image),
            other => Err(UploadError::UnsupportedType(other.to_string())),
        }
    }
}

impl std::fmt::Display for FileKind {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        match self {
            FileKind::Pdf => write!(f, "pdf"),
            FileKind::Image => write!(f, "image"),
        }
    }
}

/// A file received from the client, held until it is analyzed
#[derive(Debug, Clone)]
pub struct UploadedFile {
    pub name: String,
    pub kind: FileKind,
    pub bytes: Bytes,
}

impl UploadedFile {
    pub fn new(name: impl Into<String>, kind: FileKind, bytes: impl Into<Bytes>) -> Self {
        Self {
            name: name.into(),
            kind,
            bytes: bytes.into(),
        }
    }

    pub fn size(&self) -> usize {
        self.bytes.len()
    }
}
