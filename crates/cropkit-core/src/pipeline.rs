//! The crop pipeline.
//!
//! [`crop`] turns a [`CropRequest`] into a [`CropResult`]:
//!
//! ```text
//! quad -> rect (clamped, ratio-trimmed)
//!      -> region decode with backoff ----------------+
//!         | region unsupported / memory exhausted    |
//!         v                                          v
//!         full decode with backoff -> extract -> rotate/flip -> filler correction
//!                                                    -> resize
//! ```
//!
//! Resource exhaustion anywhere in the chain is retried at a coarser sample
//! size (or, for in-memory buffers, a smaller output scale). Every loop is
//! bounded; running out of room surfaces [`CropError::OutOfMemoryExhausted`].
//! [`load`] is the matching entry point for showing an image in the viewport.

use std::fmt;
use std::sync::Arc;

use tracing::debug;

use crate::decode::{
    apply_resize, choose_sample_size, decode_with_backoff, region_decode_with_backoff,
    sample_size_for_request, BackoffError, DecodeError, FilterType, ImageSource, MemoryBudget,
    Orientation, ResizePolicy, RgbBuffer,
};
use crate::error::CropError;
use crate::geometry::{BoundsQuad, PixelRect};
use crate::task::CancelToken;
use crate::transform::{crop_in_memory, rect_from_points, transform_decoded_region, CropTransform};
use crate::window::{AspectRatio, CropShape};

/// Largest output scale-down tried when an in-memory transform runs out of
/// memory.
pub const MAX_SCALE_DOWN: u32 = 8;

/// Largest multiplier applied on top of the requested-size sample size.
pub const MAX_SAMPLE_MULTIPLIER: u32 = 16;

/// Where the pixels of a crop come from.
#[derive(Clone)]
pub enum CropSource {
    /// An already decoded buffer with random access.
    Buffer(Arc<RgbBuffer>),
    /// A decodable source with a known intrinsic size.
    Image(Arc<dyn ImageSource>),
}

impl fmt::Debug for CropSource {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            CropSource::Buffer(buffer) => f
                .debug_struct("Buffer")
                .field("width", &buffer.width)
                .field("height", &buffer.height)
                .finish(),
            CropSource::Image(_) => f.write_str("Image(..)"),
        }
    }
}

/// Everything needed to produce a cropped buffer.
#[derive(Debug, Clone)]
pub struct CropRequest {
    pub source: CropSource,
    /// Crop outline in source-image pixels.
    pub quad: BoundsQuad,
    /// Clockwise rotation in degrees; any value, normalized into `[0, 360)`.
    pub rotation_degrees: i32,
    pub flip_horizontal: bool,
    pub flip_vertical: bool,
    /// Carried for the host; the pipeline always produces a rectangle.
    pub shape: CropShape,
    pub aspect_ratio: AspectRatio,
    /// Requested output size; zero means "no preference" on that axis.
    pub req_width: u32,
    pub req_height: u32,
    pub resize_policy: ResizePolicy,
    pub filter: FilterType,
    /// Cap for buffers allocated by the transform and resize steps.
    pub budget: MemoryBudget,
}

impl CropRequest {
    pub fn new(source: CropSource, quad: BoundsQuad) -> Self {
        Self {
            source,
            quad,
            rotation_degrees: 0,
            flip_horizontal: false,
            flip_vertical: false,
            shape: CropShape::Rectangle,
            aspect_ratio: AspectRatio::Free,
            req_width: 0,
            req_height: 0,
            resize_policy: ResizePolicy::None,
            filter: FilterType::default(),
            budget: MemoryBudget::UNLIMITED,
        }
    }

    pub fn with_rotation(mut self, degrees: i32) -> Self {
        self.rotation_degrees = degrees;
        self
    }

    pub fn with_flips(mut self, horizontal: bool, vertical: bool) -> Self {
        self.flip_horizontal = horizontal;
        self.flip_vertical = vertical;
        self
    }

    pub fn with_aspect_ratio(mut self, aspect_ratio: AspectRatio) -> Self {
        self.aspect_ratio = aspect_ratio;
        self
    }

    pub fn with_requested_size(mut self, width: u32, height: u32, policy: ResizePolicy) -> Self {
        self.req_width = width;
        self.req_height = height;
        self.resize_policy = policy;
        self
    }

    pub fn with_budget(mut self, budget: MemoryBudget) -> Self {
        self.budget = budget;
        self
    }

    pub fn transform(&self) -> CropTransform {
        CropTransform::new(self.rotation_degrees, self.flip_horizontal, self.flip_vertical)
            .with_aspect_ratio(self.aspect_ratio)
    }

    /// Reject degenerate requests before any decode work.
    pub fn validate(&self) -> Result<(), CropError> {
        self.aspect_ratio.validate()?;
        if self.quad.points.iter().any(|v| !v.is_finite()) {
            return Err(CropError::InvalidGeometry(
                "crop quad has non-finite coordinates".to_string(),
            ));
        }
        let envelope = self.quad.envelope();
        if envelope.width() <= 0.0 || envelope.height() <= 0.0 {
            return Err(CropError::InvalidGeometry(format!(
                "crop quad has zero area ({}x{})",
                envelope.width(),
                envelope.height()
            )));
        }
        Ok(())
    }

    /// Size used to pick the decode sample size for `rect`.
    fn sampling_size(&self, rect: PixelRect) -> (u32, u32) {
        if !self.resize_policy.uses_requested_size() {
            return (rect.width, rect.height);
        }
        let width = if self.req_width > 0 { self.req_width } else { rect.width };
        let height = if self.req_height > 0 { self.req_height } else { rect.height };
        (width, height)
    }
}

/// Output of a successful crop.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct CropResult {
    pub buffer: RgbBuffer,
    /// Downscale factor relative to the source the crop was taken at.
    pub sample_size: u32,
}

/// Crop, rotate, flip and resize as described by `request`.
///
/// # Errors
///
/// - [`CropError::InvalidGeometry`] for degenerate requests, before decoding
/// - [`CropError::DecodeFailure`] for unreadable sources, without retry
/// - [`CropError::OutOfMemoryExhausted`] when every backoff bound is spent
/// - [`CropError::Cancelled`] when `cancel` fires between attempts
pub fn crop(request: &CropRequest, cancel: &CancelToken) -> Result<CropResult, CropError> {
    request.validate()?;
    cancel.check()?;

    let transform = request.transform();
    let result = match &request.source {
        CropSource::Buffer(buffer) => crop_buffer(buffer, request, &transform, cancel)?,
        CropSource::Image(source) => crop_image(source.as_ref(), request, &transform, cancel)?,
    };
    cancel.check()?;

    let (width, height) = (result.buffer.width, result.buffer.height);
    let buffer = apply_resize(
        result.buffer,
        request.req_width,
        request.req_height,
        request.resize_policy,
        request.filter,
        &request.budget,
    );
    debug!(
        width,
        height,
        out_width = buffer.width,
        out_height = buffer.height,
        sample_size = result.sample_size,
        "crop complete"
    );

    Ok(CropResult {
        buffer,
        sample_size: result.sample_size,
    })
}

/// In-memory path: retry the transform at a halved output scale whenever it
/// exhausts memory.
fn crop_buffer(
    buffer: &RgbBuffer,
    request: &CropRequest,
    transform: &CropTransform,
    cancel: &CancelToken,
) -> Result<CropResult, CropError> {
    let rect = rect_from_points(&request.quad, buffer.width, buffer.height, request.aspect_ratio);
    if rect.is_empty() {
        return Err(outside_image(buffer.width, buffer.height));
    }

    let mut scale_down = 1u32;
    let mut attempts = 0u32;
    while scale_down <= MAX_SCALE_DOWN {
        cancel.check()?;
        attempts += 1;
        let scale = 1.0 / scale_down as f32;
        match crop_in_memory(buffer, &request.quad, transform, scale, &request.budget) {
            Ok(buffer) => {
                return Ok(CropResult {
                    buffer,
                    sample_size: scale_down,
                })
            }
            Err(e) if e.is_resource_exhausted() => {
                debug!(scale_down, "in-memory transform exhausted memory, scaling down");
                scale_down *= 2;
            }
            Err(e) => return Err(e.into()),
        }
    }
    Err(CropError::OutOfMemoryExhausted { attempts })
}

/// Decoding path: region decode first, full decode as fallback, retried with
/// a growing sample multiplier when the transform runs out of memory.
fn crop_image(
    source: &dyn ImageSource,
    request: &CropRequest,
    transform: &CropTransform,
    cancel: &CancelToken,
) -> Result<CropResult, CropError> {
    let (width, height) = source.probe_size()?;
    let rect = rect_from_points(&request.quad, width, height, request.aspect_ratio);
    if rect.is_empty() {
        return Err(outside_image(width, height));
    }

    let (req_width, req_height) = request.sampling_size(rect);
    let base_sample = sample_size_for_request(rect.width, rect.height, req_width, req_height);

    let mut multiplier = 1u32;
    let mut attempts = 0u32;
    while multiplier <= MAX_SAMPLE_MULTIPLIER {
        cancel.check()?;
        attempts += 1;
        let sample_size = base_sample.saturating_mul(multiplier);
        if let Some(result) = crop_image_at(source, request, transform, rect, sample_size, cancel)? {
            return Ok(result);
        }
        debug!(sample_size, "crop transform exhausted memory, raising sample multiplier");
        multiplier *= 2;
    }
    Err(CropError::OutOfMemoryExhausted { attempts })
}

/// One attempt at `sample_size`. `Ok(None)` means the transform step ran out
/// of memory and a coarser sample may succeed.
fn crop_image_at(
    source: &dyn ImageSource,
    request: &CropRequest,
    transform: &CropTransform,
    rect: PixelRect,
    sample_size: u32,
    cancel: &CancelToken,
) -> Result<Option<CropResult>, CropError> {
    match region_decode_with_backoff(source, rect, sample_size, cancel) {
        Ok(sampled) => {
            let result = transform_decoded_region(
                sampled.buffer,
                &request.quad,
                rect,
                transform,
                sampled.sample_size,
                &request.budget,
            );
            return finish_attempt(result, sampled.sample_size);
        }
        Err(BackoffError::Decode(DecodeError::RegionUnsupported)) => {
            debug!("source has no region decoder, using full decode");
        }
        Err(BackoffError::Exhausted {
            attempts,
            last_sample_size,
        }) => {
            debug!(
                attempts,
                last_sample_size, "region decode exhausted memory, falling back to full decode"
            );
        }
        Err(e) => return Err(e.into()),
    }

    let sampled = decode_with_backoff(source, sample_size, cancel)?;
    let quad = request.quad.scaled(1.0 / sampled.sample_size as f32);
    let result = crop_in_memory(&sampled.buffer, &quad, transform, 1.0, &request.budget);
    finish_attempt(result, sampled.sample_size)
}

fn finish_attempt(
    result: Result<RgbBuffer, DecodeError>,
    sample_size: u32,
) -> Result<Option<CropResult>, CropError> {
    match result {
        Ok(buffer) => Ok(Some(CropResult {
            buffer,
            sample_size,
        })),
        Err(e) if e.is_resource_exhausted() => Ok(None),
        Err(e) => Err(e.into()),
    }
}

fn outside_image(width: u32, height: u32) -> CropError {
    CropError::InvalidGeometry(format!("crop quad lies outside the {width}x{height} image"))
}

/// A sampled image ready for display, with the EXIF correction to apply.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct LoadResult {
    pub buffer: RgbBuffer,
    pub sample_size: u32,
    pub intrinsic_width: u32,
    pub intrinsic_height: u32,
    pub orientation: Orientation,
}

impl LoadResult {
    /// Clockwise rotation that shows the image upright.
    pub fn rotation_degrees(&self) -> u32 {
        self.orientation.rotation_degrees()
    }

    pub fn flip_horizontal(&self) -> bool {
        self.orientation.flip_horizontal()
    }

    pub fn flip_vertical(&self) -> bool {
        self.orientation.flip_vertical()
    }

    /// Intrinsic size once the EXIF correction is applied.
    pub fn upright_size(&self) -> (u32, u32) {
        if self.orientation.swaps_dimensions() {
            (self.intrinsic_height, self.intrinsic_width)
        } else {
            (self.intrinsic_width, self.intrinsic_height)
        }
    }
}

/// Probe, sample and decode `source` for display at about
/// `req_width` x `req_height`, never exceeding `max_texture_size` per side.
pub fn load(
    source: &dyn ImageSource,
    req_width: u32,
    req_height: u32,
    max_texture_size: u32,
    cancel: &CancelToken,
) -> Result<LoadResult, CropError> {
    cancel.check()?;
    let (width, height) = source.probe_size()?;
    let initial = choose_sample_size(width, height, req_width, req_height, max_texture_size);
    let sampled = decode_with_backoff(source, initial, cancel)?;
    let orientation = source.orientation();

    debug!(
        width,
        height,
        sample_size = sampled.sample_size,
        ?orientation,
        "image loaded"
    );

    Ok(LoadResult {
        buffer: sampled.buffer,
        sample_size: sampled.sample_size,
        intrinsic_width: width,
        intrinsic_height: height,
        orientation,
    })
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::decode::test_support::*;
    use crate::decode::{EncodedImage, MemoryImage};
    use crate::geometry::{rotate_quad, Rect};

    fn full_quad(width: u32, height: u32) -> BoundsQuad {
        BoundsQuad::from_rect(&Rect::new(0.0, 0.0, width as f32, height as f32))
    }

    fn image_source(source: impl ImageSource + 'static) -> CropSource {
        CropSource::Image(Arc::new(source))
    }

    #[test]
    fn test_full_bounds_round_trip_buffer() {
        let img = gradient(64, 48);
        let request = CropRequest::new(CropSource::Buffer(Arc::new(img.clone())), full_quad(64, 48));
        let result = crop(&request, &CancelToken::new()).unwrap();
        assert_eq!(result.sample_size, 1);
        assert_eq!(result.buffer, img);
    }

    #[test]
    fn test_full_bounds_round_trip_image() {
        let img = gradient(64, 48);
        let request = CropRequest::new(image_source(MemoryImage::new(img.clone())), full_quad(64, 48));
        let result = crop(&request, &CancelToken::new()).unwrap();
        assert_eq!(result.sample_size, 1);
        assert_eq!(result.buffer, img);
    }

    #[test]
    fn test_sub_region_crop() {
        let img = gradient(100, 100);
        let quad = BoundsQuad::from_rect(&Rect::new(20.0, 30.0, 70.0, 60.0));
        let request = CropRequest::new(image_source(MemoryImage::new(img)), quad);
        let result = crop(&request, &CancelToken::new()).unwrap();
        assert_eq!((result.buffer.width, result.buffer.height), (50, 30));
        assert_eq!(&result.buffer.pixels[..3], &[20, 30, 50]);
    }

    #[test]
    fn test_rotated_crop_size() {
        let img = RgbBuffer::new(200, 200, vec![150; 200 * 200 * 3]);
        let upright = BoundsQuad::from_rect(&Rect::new(60.0, 70.0, 140.0, 130.0));
        let quad = rotate_quad(&upright, 100.0, 100.0, -30.0);
        let request = CropRequest::new(image_source(MemoryImage::new(img)), quad).with_rotation(30);

        let result = crop(&request, &CancelToken::new()).unwrap();
        assert!(result.buffer.width.abs_diff(80) <= 2, "width {}", result.buffer.width);
        assert!(result.buffer.height.abs_diff(60) <= 2, "height {}", result.buffer.height);
    }

    #[test]
    fn test_negative_rotation_normalized() {
        let img = gradient(40, 20);
        let request = CropRequest::new(CropSource::Buffer(Arc::new(img)), full_quad(40, 20))
            .with_rotation(-90);
        let result = crop(&request, &CancelToken::new()).unwrap();
        assert_eq!((result.buffer.width, result.buffer.height), (20, 40));
    }

    #[test]
    fn test_region_backoff_doubles_sample_size() {
        let img = gradient(64, 64);
        let source = FlakySource::new(MemoryImage::new(img), 2);
        let request = CropRequest::new(image_source(source), full_quad(64, 64));
        let result = crop(&request, &CancelToken::new()).unwrap();
        assert_eq!(result.sample_size, 4);
        assert_eq!((result.buffer.width, result.buffer.height), (16, 16));
    }

    #[test]
    fn test_region_unsupported_falls_back_to_full_decode() {
        let img = gradient(80, 60);
        let source = FlakySource::new(MemoryImage::new(img.clone()), 0).without_region();
        let quad = BoundsQuad::from_rect(&Rect::new(10.0, 10.0, 50.0, 40.0));
        let request = CropRequest::new(image_source(source), quad);
        let result = crop(&request, &CancelToken::new()).unwrap();
        assert_eq!((result.buffer.width, result.buffer.height), (40, 30));
        assert_eq!(&result.buffer.pixels[..3], &[10, 10, 20]);
    }

    #[test]
    fn test_full_decode_fallback_scales_quad() {
        let img = gradient(128, 128);
        let source = FlakySource::new(MemoryImage::new(img), 1).without_region();
        let quad = BoundsQuad::from_rect(&Rect::new(0.0, 0.0, 64.0, 64.0));
        let request = CropRequest::new(image_source(source), quad);
        let result = crop(&request, &CancelToken::new()).unwrap();
        // One failure doubles the full decode to 1/2; the quad follows
        assert_eq!(result.sample_size, 2);
        assert_eq!((result.buffer.width, result.buffer.height), (32, 32));
    }

    #[test]
    fn test_corrupt_source_fails_without_retry() {
        let request = CropRequest::new(image_source(CorruptSource), full_quad(100, 100));
        let result = crop(&request, &CancelToken::new());
        assert!(matches!(result, Err(CropError::DecodeFailure(_))));
    }

    #[test]
    fn test_invalid_bytes_fail_to_decode() {
        let source = EncodedImage::new(vec![0u8, 1, 2, 3]);
        let request = CropRequest::new(image_source(source), full_quad(10, 10));
        let result = crop(&request, &CancelToken::new());
        assert!(matches!(result, Err(CropError::DecodeFailure(_))));
    }

    #[test]
    fn test_degenerate_quad_rejected_before_decode() {
        // A corrupt source would report DecodeFailure if it were touched
        let quad = BoundsQuad::from_rect(&Rect::new(10.0, 10.0, 10.0, 50.0));
        let request = CropRequest::new(image_source(CorruptSource), quad);
        assert!(matches!(
            crop(&request, &CancelToken::new()),
            Err(CropError::InvalidGeometry(_))
        ));

        let request = CropRequest::new(image_source(CorruptSource), full_quad(100, 100))
            .with_aspect_ratio(AspectRatio::Fixed(0, 3));
        assert!(matches!(
            crop(&request, &CancelToken::new()),
            Err(CropError::InvalidGeometry(_))
        ));
    }

    #[test]
    fn test_quad_outside_image_rejected() {
        let img = gradient(50, 50);
        let quad = BoundsQuad::from_rect(&Rect::new(60.0, 60.0, 90.0, 90.0));
        let request = CropRequest::new(CropSource::Buffer(Arc::new(img)), quad);
        assert!(matches!(
            crop(&request, &CancelToken::new()),
            Err(CropError::InvalidGeometry(_))
        ));
    }

    #[test]
    fn test_in_memory_transform_scales_down() {
        let img = gradient(100, 100);
        // Enough for a 50x50 result but not the full 100x100
        let budget = MemoryBudget::with_limit(100 * 100 * 3 - 1);
        let request = CropRequest::new(CropSource::Buffer(Arc::new(img)), full_quad(100, 100))
            .with_rotation(90)
            .with_budget(budget);
        let result = crop(&request, &CancelToken::new()).unwrap();
        assert_eq!(result.sample_size, 2);
        assert_eq!((result.buffer.width, result.buffer.height), (50, 50));
    }

    #[test]
    fn test_in_memory_transform_bound() {
        let img = gradient(100, 100);
        let request = CropRequest::new(CropSource::Buffer(Arc::new(img)), full_quad(100, 100))
            .with_budget(MemoryBudget::with_limit(10));
        assert_eq!(
            crop(&request, &CancelToken::new()),
            Err(CropError::OutOfMemoryExhausted { attempts: 4 })
        );
    }

    #[test]
    fn test_source_out_of_memory_is_surfaced() {
        let img = gradient(32, 32);
        let source = MemoryImage::new(img).with_budget(MemoryBudget::with_limit(0));
        let request = CropRequest::new(image_source(source), full_quad(32, 32));
        assert!(matches!(
            crop(&request, &CancelToken::new()),
            Err(CropError::OutOfMemoryExhausted { .. })
        ));
    }

    #[test]
    fn test_requested_size_samples_and_resizes() {
        let img = gradient(400, 400);
        let request = CropRequest::new(image_source(MemoryImage::new(img)), full_quad(400, 400))
            .with_requested_size(100, 100, ResizePolicy::ResizeInside);
        let result = crop(&request, &CancelToken::new()).unwrap();
        assert_eq!(result.sample_size, 2);
        assert_eq!((result.buffer.width, result.buffer.height), (100, 100));
    }

    #[test]
    fn test_sampling_policy_never_resizes() {
        let img = gradient(400, 400);
        let request = CropRequest::new(image_source(MemoryImage::new(img)), full_quad(400, 400))
            .with_requested_size(100, 100, ResizePolicy::Sampling);
        let result = crop(&request, &CancelToken::new()).unwrap();
        assert_eq!(result.sample_size, 2);
        assert_eq!((result.buffer.width, result.buffer.height), (200, 200));
    }

    #[test]
    fn test_exact_policy() {
        let img = gradient(60, 40);
        let request = CropRequest::new(CropSource::Buffer(Arc::new(img)), full_quad(60, 40))
            .with_requested_size(30, 30, ResizePolicy::ResizeExact);
        let result = crop(&request, &CancelToken::new()).unwrap();
        assert_eq!((result.buffer.width, result.buffer.height), (30, 30));
    }

    #[test]
    fn test_cancelled_before_start() {
        let cancel = CancelToken::new();
        cancel.cancel();
        let img = gradient(10, 10);
        let request = CropRequest::new(CropSource::Buffer(Arc::new(img)), full_quad(10, 10));
        assert_eq!(crop(&request, &cancel), Err(CropError::Cancelled));
    }

    #[test]
    fn test_load_reports_sampling_and_orientation() {
        let img = gradient(300, 300);
        let source = MemoryImage::new(img).with_orientation(Orientation::Transpose);
        let loaded = load(&source, 100, 100, 2048, &CancelToken::new()).unwrap();
        assert_eq!(loaded.sample_size, 2);
        assert_eq!((loaded.buffer.width, loaded.buffer.height), (150, 150));
        assert_eq!((loaded.intrinsic_width, loaded.intrinsic_height), (300, 300));
        assert_eq!(loaded.rotation_degrees(), 90);
        assert!(loaded.flip_horizontal());
        assert!(!loaded.flip_vertical());
    }

    #[test]
    fn test_load_respects_texture_limit() {
        let img = gradient(300, 100);
        let loaded = load(&MemoryImage::new(img), 0, 0, 128, &CancelToken::new()).unwrap();
        assert_eq!(loaded.sample_size, 4);
        assert_eq!(loaded.buffer.width, 75);
        assert_eq!(loaded.upright_size(), (300, 100));
    }

    #[test]
    fn test_load_upright_size_for_quarter_turn() {
        let source = MemoryImage::new(gradient(60, 20)).with_orientation(Orientation::Rotate90CW);
        let loaded = load(&source, 0, 0, 2048, &CancelToken::new()).unwrap();
        assert_eq!((loaded.intrinsic_width, loaded.intrinsic_height), (60, 20));
        assert_eq!(loaded.upright_size(), (20, 60));
    }

    #[test]
    fn test_load_encoded_png() {
        let img = gradient(40, 30);
        let source = EncodedImage::new(png_bytes(&img));
        let loaded = load(&source, 0, 0, 2048, &CancelToken::new()).unwrap();
        assert_eq!(loaded.buffer, img);
        assert_eq!(loaded.orientation, Orientation::Normal);
    }
}
