//! PDF text extraction

use std::panic::{self, AssertUnwindSafe};

use crate::UploadError;

/// Turns document bytes into plain text
pub trait DocumentExtractor: Send + Sync {
    fn extract(&self, bytes: &[u8]) -> Result<String, UploadError>;
}

/// `pdf-extract` backed extractor
#[derive(Debug, Clone, Copy, Default)]
pub struct PdfTextExtractor;

impl DocumentExtractor for PdfTextExtractor {
    fn extract(&self, bytes: &[u8]) -> Result<String, UploadError> {
        if bytes.is_empty() {
            return Err(UploadError::Extraction("file is empty".to_string()));
        }

        // pdf-extract panics on some malformed inputs instead of erroring
        let outcome = panic::catch_unwind(AssertUnwindSafe(|| {
            pdf_extract::extract_text_from_mem(bytes)
        }));

        match outcome {
            Ok(Ok(text)) => {
                tracing::debug!(
                    bytes = bytes.len(),
                    chars = text.chars().count(),
                    "Extracted PDF text"
                );
                Ok(text)
            }
            Ok(Err(e)) => Err(UploadError::Extraction(e.to_string())),
            Err(_) => Err(UploadError::Extraction("malformed PDF".to_string())),
        }
    }
}
