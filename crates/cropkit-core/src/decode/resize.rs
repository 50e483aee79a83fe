//! Output resizing policies applied after cropping.
//!
//! Uses the `image` crate's resampling filters. A failed resize is not
//! fatal: the unresized buffer is returned and a warning is logged.

use serde::{Deserialize, Serialize};
use tracing::warn;

use super::{rgb_byte_size, FilterType, MemoryBudget, RgbBuffer};

/// How the requested output size is honored.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Default, Serialize, Deserialize)]
pub enum ResizePolicy {
    /// Ignore the requested size entirely.
    None,
    /// Use the requested size only to pick the decode sample size.
    Sampling,
    /// Downscale uniformly if larger than the requested size; never upscale.
    #[default]
    ResizeInside,
    /// Scale uniformly to fit the requested size, upscaling if needed.
    ResizeFit,
    /// Scale non-uniformly to exactly the requested size.
    ResizeExact,
}

impl ResizePolicy {
    /// Whether the requested size feeds into the decode sample size.
    pub fn uses_requested_size(self) -> bool {
        !matches!(self, ResizePolicy::None)
    }

    /// Whether a post-crop resize may happen.
    pub fn resizes(self) -> bool {
        matches!(
            self,
            ResizePolicy::ResizeInside | ResizePolicy::ResizeFit | ResizePolicy::ResizeExact
        )
    }
}

/// Dimensions `(width, height)` after applying `policy`, or `None` if the
/// buffer should be kept as is.
pub fn target_dimensions(
    width: u32,
    height: u32,
    req_width: u32,
    req_height: u32,
    policy: ResizePolicy,
) -> Option<(u32, u32)> {
    if req_width == 0 || req_height == 0 || width == 0 || height == 0 || !policy.resizes() {
        return None;
    }

    let target = match policy {
        ResizePolicy::ResizeExact => (req_width, req_height),
        _ => {
            let scale = (width as f32 / req_width as f32).max(height as f32 / req_height as f32);
            if scale > 1.0 || policy == ResizePolicy::ResizeFit {
                (
                    ((width as f32 / scale) as u32).max(1),
                    ((height as f32 / scale) as u32).max(1),
                )
            } else {
                return None;
            }
        }
    };

    (target != (width, height)).then_some(target)
}

/// Resize `buffer` according to `policy`. The input is consumed and released
/// as soon as the resized buffer exists.
///
/// # Arguments
///
/// * `buffer` - The cropped image
/// * `req_width`, `req_height` - Requested output size; zero disables resizing
/// * `policy` - How to honor the requested size
/// * `filter` - Interpolation filter
/// * `budget` - Allocation cap for the resized buffer
pub fn apply_resize(
    buffer: RgbBuffer,
    req_width: u32,
    req_height: u32,
    policy: ResizePolicy,
    filter: FilterType,
    budget: &MemoryBudget,
) -> RgbBuffer {
    let Some((width, height)) =
        target_dimensions(buffer.width, buffer.height, req_width, req_height, policy)
    else {
        return buffer;
    };

    if let Err(e) = rgb_byte_size(width, height).and_then(|bytes| budget.check(bytes)) {
        warn!(width, height, error = %e, "resize skipped, returning unresized crop");
        return buffer;
    }

    let resized = match buffer.as_rgb_view() {
        Some(view) => image::imageops::resize(&view, width, height, filter.to_image_filter()),
        None => {
            warn!(
                width = buffer.width,
                height = buffer.height,
                "pixel data does not match dimensions, returning unresized crop"
            );
            return buffer;
        }
    };
    drop(buffer);
    RgbBuffer::from_rgb_image(resized)
}

#[cfg(test)]
mod tests {
    use super::*;

    fn create_test_image(width: u32, height: u32) -> RgbBuffer {
        let mut pixels = Vec::with_capacity((width * height * 3) as usize);
        for y in 0..height {
            for x in 0..width {
                pixels.push(((x * 255) / width.max(1)) as u8);
                pixels.push(((y * 255) / height.max(1)) as u8);
                pixels.push(128);
            }
        }
        RgbBuffer::new(width, height, pixels)
    }

    #[test]
    fn test_exact_is_non_uniform() {
        assert_eq!(
            target_dimensions(400, 200, 100, 100, ResizePolicy::ResizeExact),
            Some((100, 100))
        );
    }

    #[test]
    fn test_inside_downscales_only() {
        assert_eq!(
            target_dimensions(400, 200, 100, 100, ResizePolicy::ResizeInside),
            Some((100, 50))
        );
        assert_eq!(
            target_dimensions(50, 20, 100, 100, ResizePolicy::ResizeInside),
            None
        );
    }

    #[test]
    fn test_fit_upscales() {
        assert_eq!(
            target_dimensions(50, 20, 100, 100, ResizePolicy::ResizeFit),
            Some((100, 40))
        );
    }

    #[test]
    fn test_none_and_sampling_never_resize() {
        assert_eq!(target_dimensions(400, 200, 100, 100, ResizePolicy::None), None);
        assert_eq!(
            target_dimensions(400, 200, 100, 100, ResizePolicy::Sampling),
            None
        );
        assert!(ResizePolicy::Sampling.uses_requested_size());
        assert!(!ResizePolicy::None.uses_requested_size());
    }

    #[test]
    fn test_zero_request_disables_resize() {
        assert_eq!(
            target_dimensions(400, 200, 0, 0, ResizePolicy::ResizeExact),
            None
        );
    }

    #[test]
    fn test_apply_resize_inside() {
        let img = create_test_image(200, 100);
        let out = apply_resize(
            img,
            50,
            50,
            ResizePolicy::ResizeInside,
            FilterType::Bilinear,
            &MemoryBudget::UNLIMITED,
        );
        assert_eq!((out.width, out.height), (50, 25));
        assert_eq!(out.pixels.len(), 50 * 25 * 3);
    }

    #[test]
    fn test_apply_resize_over_budget_returns_original() {
        let img = create_test_image(10, 10);
        let out = apply_resize(
            img.clone(),
            100,
            100,
            ResizePolicy::ResizeExact,
            FilterType::Nearest,
            &MemoryBudget::with_limit(1000),
        );
        assert_eq!(out, img);
    }
}
