//! Tile image re-encoding.
//!
//! Imagery services answer with whatever format they store (JPEG, PNG,
//! sometimes with alpha). Harvested artifacts are normalised to RGB JPEG so
//! downstream tooling sees a single format.
//!
//! The [`TileEncoder`] trait is the seam the harvester depends on; the
//! production implementation is [`JpegReencoder`].

use image::codecs::jpeg::JpegEncoder;
use image::{ExtendedColorType, ImageReader};
use std::io::Cursor;
use thiserror::Error;

/// JPEG quality used for harvested artifacts.
pub const DEFAULT_JPEG_QUALITY: u8 = 95;

/// Errors raised while converting a downloaded tile.
#[derive(Debug, Clone, PartialEq, Error)]
pub enum ImageryError {
    /// The payload is empty or its format cannot be recognised
    #[error("unrecognised image format: {0}")]
    UnknownFormat(String),
    /// The payload claims a known format but failed to decode
    #[error("image decode failed: {0}")]
    Decode(String),
    /// Re-encoding the decoded pixels failed
    #[error("image encode failed: {0}")]
    Encode(String),
}

/// Converts raw tile payloads into JPEG artifact bytes.
///
/// The output is stored as `tile_id_{identifier}.jpg` without further
/// checks, so implementations must produce JPEG. Conversions run on the
/// blocking pool while other tiles download.
pub trait TileEncoder: Send + Sync {
    /// Decodes `data` and re-encodes it as JPEG.
    fn reencode(&self, data: &[u8]) -> Result<Vec<u8>, ImageryError>;
}

/// Decodes any format supported by `image` and writes RGB8 JPEG.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct JpegReencoder {
    quality: u8,
}

impl JpegReencoder {
    /// Creates an encoder with the given JPEG quality (clamped to 1..=100).
    pub fn new(quality: u8) -> Self {
        Self {
            quality: quality.clamp(1, 100),
        }
    }

    /// Returns the configured JPEG quality.
    pub fn quality(&self) -> u8 {
        self.quality
    }
}

impl Default for JpegReencoder {
    fn default() -> Self {
        Self::new(DEFAULT_JPEG_QUALITY)
    }
}

impl TileEncoder for JpegReencoder {
    fn reencode(&self, data: &[u8]) -> Result<Vec<u8>, ImageryError> {
        if data.is_empty() {
            return Err(ImageryError::UnknownFormat("empty payload".to_string()));
        }

        let reader = ImageReader::new(Cursor::new(data))
            .with_guessed_format()
            .map_err(|e| ImageryError::UnknownFormat(e.to_string()))?;
        if reader.format().is_none() {
            return Err(ImageryError::UnknownFormat(format!(
                "{} bytes with no known signature",
                data.len()
            )));
        }

        let decoded = reader
            .decode()
            .map_err(|e| ImageryError::Decode(e.to_string()))?;
        let rgb = decoded.to_rgb8();

        let mut out = Vec::with_capacity(data.len());
        {
            let mut encoder = JpegEncoder::new_with_quality(&mut out, self.quality);
            encoder
                .encode(
                    rgb.as_raw(),
                    rgb.width(),
                    rgb.height(),
                    ExtendedColorType::Rgb8,
                )
                .map_err(|e| ImageryError::Encode(e.to_string()))?;
        }

        Ok(out)
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use image::{ImageFormat, Rgba, RgbaImage};

    fn png_with_alpha() -> Vec<u8> {
        let img = RgbaImage::from_pixel(8, 8, Rgba([10, 200, 30, 128]));
        let mut out = Vec::new();
        img.write_to(&mut Cursor::new(&mut out), ImageFormat::Png)
            .unwrap();
        out
    }

    #[test]
    fn test_png_becomes_rgb_jpeg() {
        let encoder = JpegReencoder::default();
        let jpeg = encoder.reencode(&png_with_alpha()).unwrap();

        assert_eq!(&jpeg[..2], &[0xFF, 0xD8], "JPEG SOI marker");
        let decoded = image::load_from_memory(&jpeg).unwrap();
        assert_eq!(decoded.color(), image::ColorType::Rgb8);
        assert_eq!((decoded.width(), decoded.height()), (8, 8));
    }

    #[test]
    fn test_jpeg_input_is_reencoded() {
        let encoder = JpegReencoder::new(80);
        let first = encoder.reencode(&png_with_alpha()).unwrap();
        let second = JpegReencoder::default().reencode(&first).unwrap();
        assert_eq!(&second[..2], &[0xFF, 0xD8]);
    }

    #[test]
    fn test_empty_payload_rejected() {
        let result = JpegReencoder::default().reencode(&[]);
        assert!(matches!(result, Err(ImageryError::UnknownFormat(_))));
    }

    #[test]
    fn test_garbage_payload_rejected() {
        let result = JpegReencoder::default().reencode(b"<html>rate limited</html>");
        assert!(result.is_err());
    }

    #[test]
    fn test_truncated_png_fails_to_decode() {
        let png = png_with_alpha();
        let result = JpegReencoder::default().reencode(&png[..png.len() / 2]);
        assert!(matches!(result, Err(ImageryError::Decode(_))));
    }

    #[test]
    fn test_quality_clamped() {
        assert_eq!(JpegReencoder::new(0).quality(), 1);
        assert_eq!(JpegReencoder::new(255).quality(), 100);
        assert_eq!(JpegReencoder::default().quality(), DEFAULT_JPEG_QUALITY);
    }
}
