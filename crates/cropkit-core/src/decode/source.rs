//! Image sources the sampled decode pipeline can pull pixels from.
//!
//! A source exposes a bounds-only probe, a full decode at a given sample size
//! and, optionally, a windowed region decode. Sources without region support
//! are a valid configuration; the crop pipeline then falls back to a full
//! decode followed by an in-memory extraction.

use std::io::Cursor;
use std::sync::Arc;

use image::ImageReader;

use super::orientation::read_orientation;
use super::{DecodeError, MemoryBudget, Orientation, RgbBuffer};
use crate::geometry::PixelRect;

/// A decodable image.
pub trait ImageSource: Send + Sync {
    /// Intrinsic `(width, height)` without decoding any pixel data.
    fn probe_size(&self) -> Result<(u32, u32), DecodeError>;

    /// Decode the whole image, keeping every `sample_size`-th pixel on each axis.
    fn decode(&self, sample_size: u32) -> Result<RgbBuffer, DecodeError>;

    /// Decode only `region` (in intrinsic pixels) at `sample_size`.
    fn decode_region(&self, region: PixelRect, sample_size: u32) -> Result<RgbBuffer, DecodeError> {
        let _ = (region, sample_size);
        Err(DecodeError::RegionUnsupported)
    }

    /// EXIF orientation recorded with the image, if any.
    fn orientation(&self) -> Orientation {
        Orientation::Normal
    }
}

/// Output size of a sampled decode: each axis divided by the sample size,
/// never collapsing below one pixel.
#[inline]
pub fn sampled_dimension(size: u32, sample_size: u32) -> u32 {
    (size / sample_size.max(1)).max(1)
}

/// Copy `region` out of `src`, keeping the top-left pixel of every
/// `sample_size` x `sample_size` block.
pub fn subsample_region(
    src: &RgbBuffer,
    region: PixelRect,
    sample_size: u32,
    budget: &MemoryBudget,
) -> Result<RgbBuffer, DecodeError> {
    if region.is_empty() || !region.fits_within(src.width, src.height) {
        return Err(DecodeError::CorruptedFile(format!(
            "region {}x{}+{}+{} outside {}x{} image",
            region.width, region.height, region.x, region.y, src.width, src.height
        )));
    }

    let step = sample_size.max(1);
    let out_width = sampled_dimension(region.width, step);
    let out_height = sampled_dimension(region.height, step);
    let mut out = RgbBuffer::allocate(out_width, out_height, budget)?;

    let src_stride = src.width as usize * 3;
    let dst_stride = out_width as usize * 3;

    if step == 1 {
        for row in 0..out_height as usize {
            let src_start = (region.y as usize + row) * src_stride + region.x as usize * 3;
            let dst_start = row * dst_stride;
            out.pixels[dst_start..dst_start + dst_stride]
                .copy_from_slice(&src.pixels[src_start..src_start + dst_stride]);
        }
        return Ok(out);
    }

    for row in 0..out_height as usize {
        let src_row = region.y as usize + row * step as usize;
        for col in 0..out_width as usize {
            let src_col = region.x as usize + col * step as usize;
            let s = src_row * src_stride + src_col * 3;
            let d = row * dst_stride + col * 3;
            out.pixels[d..d + 3].copy_from_slice(&src.pixels[s..s + 3]);
        }
    }
    Ok(out)
}

/// Encoded image bytes (JPEG or PNG) decoded with the `image` crate.
///
/// The `image` decoders have no windowed mode, so region decoding is not
/// supported. The budget governs the retained sampled buffer; the decoder's
/// transient full-resolution frame is released before it is allocated.
#[derive(Debug, Clone)]
pub struct EncodedImage {
    bytes: Arc<[u8]>,
    budget: MemoryBudget,
}

impl EncodedImage {
    pub fn new(bytes: impl Into<Arc<[u8]>>) -> Self {
        Self {
            bytes: bytes.into(),
            budget: MemoryBudget::UNLIMITED,
        }
    }

    pub fn with_budget(mut self, budget: MemoryBudget) -> Self {
        self.budget = budget;
        self
    }

    pub fn bytes(&self) -> &[u8] {
        &self.bytes
    }

    fn reader(&self) -> Result<ImageReader<Cursor<&[u8]>>, DecodeError> {
        let reader = ImageReader::new(Cursor::new(&self.bytes[..]))
            .with_guessed_format()
            .map_err(|e| DecodeError::IoError(e.to_string()))?;
        if reader.format().is_none() {
            return Err(DecodeError::InvalidFormat);
        }
        Ok(reader)
    }
}

impl ImageSource for EncodedImage {
    fn probe_size(&self) -> Result<(u32, u32), DecodeError> {
        self.reader()?
            .into_dimensions()
            .map_err(|e| DecodeError::CorruptedFile(e.to_string()))
    }

    fn decode(&self, sample_size: u32) -> Result<RgbBuffer, DecodeError> {
        let (width, height) = self.probe_size()?;
        let out_bytes = super::rgb_byte_size(
            sampled_dimension(width, sample_size),
            sampled_dimension(height, sample_size),
        )?;
        // Fail fast before paying for the decode.
        self.budget.check(out_bytes)?;

        let img = self
            .reader()?
            .decode()
            .map_err(|e| DecodeError::CorruptedFile(e.to_string()))?;
        let full = RgbBuffer::from_rgb_image(img.into_rgb8());
        if sample_size <= 1 {
            return Ok(full);
        }
        let region = PixelRect::new(0, 0, full.width, full.height);
        subsample_region(&full, region, sample_size, &self.budget)
    }

    fn orientation(&self) -> Orientation {
        read_orientation(&self.bytes)
    }
}

/// An already-decoded buffer. Supports region decoding by direct extraction.
#[derive(Debug, Clone)]
pub struct MemoryImage {
    buffer: Arc<RgbBuffer>,
    budget: MemoryBudget,
    orientation: Orientation,
}

impl MemoryImage {
    pub fn new(buffer: impl Into<Arc<RgbBuffer>>) -> Self {
        Self {
            buffer: buffer.into(),
            budget: MemoryBudget::UNLIMITED,
            orientation: Orientation::Normal,
        }
    }

    pub fn with_budget(mut self, budget: MemoryBudget) -> Self {
        self.budget = budget;
        self
    }

    pub fn with_orientation(mut self, orientation: Orientation) -> Self {
        self.orientation = orientation;
        self
    }

    pub fn buffer(&self) -> &Arc<RgbBuffer> {
        &self.buffer
    }
}

impl ImageSource for MemoryImage {
    fn probe_size(&self) -> Result<(u32, u32), DecodeError> {
        Ok((self.buffer.width, self.buffer.height))
    }

    fn decode(&self, sample_size: u32) -> Result<RgbBuffer, DecodeError> {
        let region = PixelRect::new(0, 0, self.buffer.width, self.buffer.height);
        subsample_region(&self.buffer, region, sample_size, &self.budget)
    }

    fn decode_region(&self, region: PixelRect, sample_size: u32) -> Result<RgbBuffer, DecodeError> {
        subsample_region(&self.buffer, region, sample_size, &self.budget)
    }

    fn orientation(&self) -> Orientation {
        self.orientation
    }
}


#[cfg(test)]
mod tests {
    use super::test_support::*;
    use super::*;

    #[test]
    fn test_subsample_full_copy() {
        let src = gradient(10, 6);
        let out = subsample_region(
            &src,
            PixelRect::new(0, 0, 10, 6),
            1,
            &MemoryBudget::UNLIMITED,
        )
        .unwrap();
        assert_eq!(out, src);
    }

    #[test]
    fn test_subsample_region_offsets() {
        let src = gradient(10, 6);
        let out = subsample_region(
            &src,
            PixelRect::new(2, 1, 4, 3),
            1,
            &MemoryBudget::UNLIMITED,
        )
        .unwrap();
        assert_eq!((out.width, out.height), (4, 3));
        assert_eq!(out.pixels[0..3], [2, 1, 3]);
    }

    #[test]
    fn test_subsample_keeps_block_origin() {
        let src = gradient(8, 8);
        let out = subsample_region(
            &src,
            PixelRect::new(0, 0, 8, 8),
            4,
            &MemoryBudget::UNLIMITED,
        )
        .unwrap();
        assert_eq!((out.width, out.height), (2, 2));
        // Pixel (col 1, row 1) comes from source (4, 4)
        let idx = (2 + 1) * 3;
        assert_eq!(out.pixels[idx..idx + 3], [4, 4, 8]);
    }

    #[test]
    fn test_subsample_never_collapses_to_zero() {
        let src = gradient(3, 3);
        let out = subsample_region(
            &src,
            PixelRect::new(0, 0, 3, 3),
            16,
            &MemoryBudget::UNLIMITED,
        )
        .unwrap();
        assert_eq!((out.width, out.height), (1, 1));
    }

    #[test]
    fn test_subsample_out_of_bounds() {
        let src = gradient(4, 4);
        let result = subsample_region(
            &src,
            PixelRect::new(2, 2, 4, 4),
            1,
            &MemoryBudget::UNLIMITED,
        );
        assert!(matches!(result, Err(DecodeError::CorruptedFile(_))));
    }

    #[test]
    fn test_memory_image_budget() {
        let image = MemoryImage::new(gradient(20, 20)).with_budget(MemoryBudget::with_limit(300));
        assert_eq!(image.decode(1), Err(DecodeError::ResourceExhausted));
        // 10x10x3 = 300 bytes fits
        assert_eq!(image.decode(2).map(|b| (b.width, b.height)), Ok((10, 10)));
    }

    #[test]
    fn test_encoded_image_probe_and_decode() {
        let src = gradient(12, 8);
        let encoded = EncodedImage::new(png_bytes(&src));

        assert_eq!(encoded.probe_size(), Ok((12, 8)));
        assert_eq!(encoded.decode(1).unwrap(), src);
        let half = encoded.decode(2).unwrap();
        assert_eq!((half.width, half.height), (6, 4));
        assert_eq!(
            encoded.decode_region(PixelRect::new(0, 0, 4, 4), 1),
            Err(DecodeError::RegionUnsupported)
        );
        assert_eq!(encoded.orientation(), Orientation::Normal);
    }

    #[test]
    fn test_encoded_image_budget_checked_before_decode() {
        let encoded = EncodedImage::new(png_bytes(&gradient(16, 16)))
            .with_budget(MemoryBudget::with_limit(16 * 16 * 3 - 1));
        assert_eq!(encoded.decode(1), Err(DecodeError::ResourceExhausted));
        assert!(encoded.decode(2).is_ok());
    }

    #[test]
    fn test_encoded_image_garbage() {
        let encoded = EncodedImage::new(vec![0u8, 1, 2, 3]);
        assert_eq!(encoded.probe_size(), Err(DecodeError::InvalidFormat));
        assert!(encoded.decode(1).is_err());
    }
}
