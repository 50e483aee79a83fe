//! JPEG and PNG encoding using the `image` crate's encoders.

use std::io::Cursor;

use image::codecs::jpeg::JpegEncoder;
use image::codecs::png::PngEncoder;
use image::{ExtendedColorType, ImageEncoder};
use serde::{Deserialize, Serialize};
use thiserror::Error;

use crate::decode::RgbBuffer;

/// Errors that can occur while encoding a cropped buffer.
#[derive(Debug, Error)]
pub enum EncodeError {
    /// Pixel data length doesn't match the buffer dimensions
    #[error("Invalid pixel data: expected {expected} bytes (width * height * 3), got {actual}")]
    InvalidPixelData { expected: usize, actual: usize },

    #[error("Invalid dimensions: width ({width}) and height ({height}) must be non-zero")]
    InvalidDimensions { width: u32, height: u32 },

    #[error("Encoding failed: {0}")]
    EncodingFailed(String),
}

/// Container format for an encoded crop.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(tag = "type", rename_all = "lowercase")]
pub enum OutputFormat {
    /// Quality 1-100; values outside the range are clamped.
    Jpeg { quality: u8 },
    Png,
}

impl Default for OutputFormat {
    fn default() -> Self {
        OutputFormat::Jpeg { quality: 90 }
    }
}

/// Encode an RGB buffer as JPEG or PNG bytes.
pub fn encode_output(buffer: &RgbBuffer, format: OutputFormat) -> Result<Vec<u8>, EncodeError> {
    let (width, height) = (buffer.width, buffer.height);
    if width == 0 || height == 0 {
        return Err(EncodeError::InvalidDimensions { width, height });
    }

    let expected = (width as usize) * (height as usize) * 3;
    if buffer.pixels.len() != expected {
        return Err(EncodeError::InvalidPixelData {
            expected,
            actual: buffer.pixels.len(),
        });
    }

    let mut out = Cursor::new(Vec::new());
    let written = match format {
        OutputFormat::Jpeg { quality } => JpegEncoder::new_with_quality(&mut out, quality.clamp(1, 100))
            .write_image(&buffer.pixels, width, height, ExtendedColorType::Rgb8),
        OutputFormat::Png => PngEncoder::new(&mut out).write_image(
            &buffer.pixels,
            width,
            height,
            ExtendedColorType::Rgb8,
        ),
    };
    written.map_err(|e| EncodeError::EncodingFailed(e.to_string()))?;

    Ok(out.into_inner())
}


#[cfg(test)]
mod proptests {
    use super::*;
    use proptest::prelude::*;

    proptest! {
        #[test]
        fn prop_any_quality_produces_jpeg(
            (width, height) in (1u32..=40, 1u32..=40),
            quality in any::<u8>(),
        ) {
            let img = RgbBuffer::new(width, height, vec![100; (width * height * 3) as usize]);
            let jpeg = encode_output(&img, OutputFormat::Jpeg { quality }).unwrap();
            prop_assert_eq!(&jpeg[0..2], &[0xFF, 0xD8]);
            prop_assert_eq!(&jpeg[jpeg.len() - 2..], &[0xFF, 0xD9]);
        }

        #[test]
        fn prop_mismatched_length_rejected(
            (width, height) in (1u32..=20, 1u32..=20),
            delta in 1usize..10,
            extra in any::<bool>(),
        ) {
            let expected = (width * height * 3) as usize;
            let len = if extra { expected + delta } else { expected.saturating_sub(delta) };
            let img = RgbBuffer { width, height, pixels: vec![0; len] };
            let is_invalid_pixel_data = matches!(
                encode_output(&img, OutputFormat::Png),
                Err(EncodeError::InvalidPixelData { .. })
            );
            prop_assert!(is_invalid_pixel_data);
        }
    }
}
