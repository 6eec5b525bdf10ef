//! Raster image validation

use crate::UploadError;

/// What decoding an image tells us
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct DecodedImage {
    pub width: u32,
    pub height: u32,
}

/// Opens image bytes
pub trait ImageDecoder: Send + Sync {
    fn decode(&self, bytes: &[u8]) -> Result<DecodedImage, UploadError>;
}

/// `image` crate backed decoder (PNG and JPEG)
#[derive(Debug, Clone, Copy, Default)]
pub struct RasterImageDecoder;

impl ImageDecoder for RasterImageDecoder {
    fn decode(&self, bytes: &[u8]) -> Result<DecodedImage, UploadError> {
        let img = image::load_from_memory(bytes).map_err(|e| UploadError::Decode(e.to_string()))?;

        let decoded = DecodedImage {
            width: img.width(),
            height: img.height(),
        };
        tracing::debug!(width = decoded.width, height = decoded.height, "Decoded image");
        Ok(decoded)
    }
}
