//! Uploaded file handling
//!
//! An upload is either a PDF, whose text is extracted, or a PNG/JPEG image,
//! which is only decoded to prove it opens. Both collaborators sit behind
//! traits so the conversation domain can be exercised without real files.

pub mod document;
pub mod file;
pub mod raster;

pub use document::{DocumentExtractor, PdfTextExtractor};
pub use file::{FileKind, UploadedFile};
pub use raster::{DecodedImage, ImageDecoder, RasterImageDecoder};

/// Errors raised while reading an uploaded file
#[derive(Debug, Clone, PartialEq, thiserror::Error)]
pub enum UploadError {
    #[error("Unsupported file type: {0}")]
    UnsupportedType(String),

    #[error("Could not extract text from PDF: {0}")]
    Extraction(String),

    #[error("Could not open image: {0}")]
    Decode(String),
}
