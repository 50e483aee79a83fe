//! Core types for sampled decoding.

use serde::{Deserialize, Serialize};
use thiserror::Error;

/// Error types for image source operations.
#[derive(Debug, Clone, PartialEq, Eq, Error)]
pub enum DecodeError {
    /// An allocation exceeded the memory budget or failed outright.
    /// This is the only variant the decode loops retry on.
    #[error("Resource exhausted while allocating pixel buffer")]
    ResourceExhausted,

    /// The data format is not recognized or supported.
    #[error("Invalid or unsupported image format")]
    InvalidFormat,

    /// The image data is corrupted or incomplete.
    #[error("Corrupted or incomplete image file: {0}")]
    CorruptedFile(String),

    /// The source cannot decode a sub-rectangle without the full image.
    #[error("Region decoding is not supported by this source")]
    RegionUnsupported,

    /// I/O error while reading the source.
    #[error("I/O error: {0}")]
    IoError(String),
}

impl DecodeError {
    /// True if retrying at a larger sample size might succeed.
    #[inline]
    pub fn is_resource_exhausted(&self) -> bool {
        matches!(self, DecodeError::ResourceExhausted)
    }
}

/// Filter type for image resizing operations.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Default, Serialize, Deserialize)]
pub enum FilterType {
    /// Nearest neighbor interpolation (fastest, lowest quality).
    Nearest,
    /// Bilinear interpolation (fast, acceptable quality).
    #[default]
    Bilinear,
    /// Lanczos3 interpolation (slower, highest quality).
    Lanczos3,
}

impl FilterType {
    /// Convert to the image crate's FilterType.
    pub fn to_image_filter(self) -> image::imageops::FilterType {
        match self {
            FilterType::Nearest => image::imageops::FilterType::Nearest,
            FilterType::Bilinear => image::imageops::FilterType::Triangle,
            FilterType::Lanczos3 => image::imageops::FilterType::Lanczos3,
        }
    }
}

/// EXIF orientation values (1-8).
/// See: https://exiftool.org/TagNames/EXIF.html
#[derive(Debug, Clone, Copy, PartialEq, Eq, Default, Serialize, Deserialize)]
#[repr(u8)]
pub enum Orientation {
    #[default]
    Normal = 1,
    FlipHorizontal = 2,
    Rotate180 = 3,
    FlipVertical = 4,
    /// Mirror across the top-left to bottom-right diagonal.
    Transpose = 5,
    Rotate90CW = 6,
    /// Mirror across the top-right to bottom-left diagonal.
    Transverse = 7,
    Rotate270CW = 8,
}

impl Orientation {
    /// Returns true if this orientation swaps width and height dimensions.
    #[inline]
    pub fn swaps_dimensions(self) -> bool {
        matches!(
            self,
            Orientation::Transpose
                | Orientation::Rotate90CW
                | Orientation::Transverse
                | Orientation::Rotate270CW
        )
    }

    /// Rotation in degrees the crop pipeline must apply to show the image
    /// upright. Transpose and Transverse are a 90 degree turn plus a flip.
    pub fn rotation_degrees(self) -> u32 {
        match self {
            Orientation::Rotate90CW | Orientation::Transpose | Orientation::Transverse => 90,
            Orientation::Rotate180 => 180,
            Orientation::Rotate270CW => 270,
            _ => 0,
        }
    }

    /// Whether a horizontal flip accompanies [`Self::rotation_degrees`].
    pub fn flip_horizontal(self) -> bool {
        matches!(self, Orientation::FlipHorizontal | Orientation::Transpose)
    }

    /// Whether a vertical flip accompanies [`Self::rotation_degrees`].
    pub fn flip_vertical(self) -> bool {
        matches!(self, Orientation::FlipVertical | Orientation::Transverse)
    }
}

impl From<u32> for Orientation {
    fn from(value: u32) -> Self {
        match value {
            1 => Orientation::Normal,
            2 => Orientation::FlipHorizontal,
            3 => Orientation::Rotate180,
            4 => Orientation::FlipVertical,
            5 => Orientation::Transpose,
            6 => Orientation::Rotate90CW,
            7 => Orientation::Transverse,
            8 => Orientation::Rotate270CW,
            _ => Orientation::Normal,
        }
    }
}

/// Caps the size of any single pixel buffer allocation.
///
/// Exceeding the cap, or a failed reservation, is reported as
/// [`DecodeError::ResourceExhausted`] so callers can back off instead of
/// aborting the process.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Default, Serialize, Deserialize)]
pub struct MemoryBudget {
    limit_bytes: Option<usize>,
}

impl MemoryBudget {
    /// No cap beyond what the allocator can satisfy.
    pub const UNLIMITED: MemoryBudget = MemoryBudget { limit_bytes: None };

    pub fn new(limit_bytes: Option<usize>) -> Self {
        Self { limit_bytes }
    }

    pub fn with_limit(limit_bytes: usize) -> Self {
        Self {
            limit_bytes: Some(limit_bytes),
        }
    }

    pub fn limit_bytes(&self) -> Option<usize> {
        self.limit_bytes
    }

    /// Check a prospective allocation against the cap without allocating.
    pub fn check(&self, bytes: usize) -> Result<(), DecodeError> {
        match self.limit_bytes {
            Some(limit) if bytes > limit => Err(DecodeError::ResourceExhausted),
            _ => Ok(()),
        }
    }

    /// Allocate a zero-filled byte buffer of `bytes` length.
    pub fn allocate(&self, bytes: usize) -> Result<Vec<u8>, DecodeError> {
        self.check(bytes)?;
        let mut buffer = Vec::new();
        buffer
            .try_reserve_exact(bytes)
            .map_err(|_| DecodeError::ResourceExhausted)?;
        buffer.resize(bytes, 0);
        Ok(buffer)
    }
}

/// Number of bytes an RGB buffer of the given size occupies.
pub fn rgb_byte_size(width: u32, height: u32) -> Result<usize, DecodeError> {
    (width as usize)
        .checked_mul(height as usize)
        .and_then(|n| n.checked_mul(3))
        .ok_or(DecodeError::ResourceExhausted)
}

/// Random access to a pixel grid, independent of any graphics stack.
pub trait PixelBuffer {
    fn width(&self) -> u32;
    fn height(&self) -> u32;
    /// Read the RGB value at `(row, col)`.
    fn get(&self, row: u32, col: u32) -> [u8; 3];
    /// Write the RGB value at `(row, col)`.
    fn set(&mut self, row: u32, col: u32, rgb: [u8; 3]);
}

/// A decoded image with RGB pixel data.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct RgbBuffer {
    /// Image width in pixels.
    pub width: u32,
    /// Image height in pixels.
    pub height: u32,
    /// RGB pixel data in row-major order (3 bytes per pixel).
    pub pixels: Vec<u8>,
}

impl RgbBuffer {
    /// Create a buffer from existing pixel data.
    pub fn new(width: u32, height: u32, pixels: Vec<u8>) -> Self {
        debug_assert_eq!(
            pixels.len(),
            width as usize * height as usize * 3,
            "Pixel buffer size mismatch"
        );
        Self {
            width,
            height,
            pixels,
        }
    }

    /// Allocate a black buffer through the memory budget.
    pub fn allocate(width: u32, height: u32, budget: &MemoryBudget) -> Result<Self, DecodeError> {
        let pixels = budget.allocate(rgb_byte_size(width, height)?)?;
        Ok(Self {
            width,
            height,
            pixels,
        })
    }

    /// Create a buffer from an image::RgbImage.
    pub fn from_rgb_image(img: image::RgbImage) -> Self {
        let (width, height) = img.dimensions();
        let pixels = img.into_raw();
        Self {
            width,
            height,
            pixels,
        }
    }

    /// Convert into an image::RgbImage without copying.
    pub fn into_rgb_image(self) -> Option<image::RgbImage> {
        image::RgbImage::from_raw(self.width, self.height, self.pixels)
    }

    /// Borrow the pixels as an image::RgbImage view for read-only operations.
    pub fn as_rgb_view(&self) -> Option<image::ImageBuffer<image::Rgb<u8>, &[u8]>> {
        image::ImageBuffer::from_raw(self.width, self.height, self.pixels.as_slice())
    }

    /// Check if this is an empty/invalid image.
    pub fn is_empty(&self) -> bool {
        self.width == 0 || self.height == 0 || self.pixels.is_empty()
    }

    #[inline]
    fn index(&self, row: u32, col: u32) -> usize {
        (row as usize * self.width as usize + col as usize) * 3
    }
}

impl PixelBuffer for RgbBuffer {
    fn width(&self) -> u32 {
        self.width
    }

    fn height(&self) -> u32 {
        self.height
    }

    fn get(&self, row: u32, col: u32) -> [u8; 3] {
        let idx = self.index(row, col);
        [self.pixels[idx], self.pixels[idx + 1], self.pixels[idx + 2]]
    }

    fn set(&mut self, row: u32, col: u32, rgb: [u8; 3]) {
        let idx = self.index(row, col);
        self.pixels[idx..idx + 3].copy_from_slice(&rgb);
    }
}

/// A decoded buffer together with the sample size used to produce it.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct SampledImage {
    pub buffer: RgbBuffer,
    /// Power-of-two downscale factor relative to the source.
    pub sample_size: u32,
}
