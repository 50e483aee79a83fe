//! Cropkit Core - Interactive crop engine
//!
//! This crate provides the interactive crop window (hit-testing, constrained
//! drags, aspect-ratio locking against a possibly rotated image) and a
//! memory-bounded pipeline that decodes, rotates, flips, trims and resizes the
//! selected region.
//!
//! # Coordinate Spaces
//!
//! - Viewport pixels: the crop window, touch events and the displayed image
//!   outline (`BoundsQuad`)
//! - Source-image pixels: crop requests and `initial_crop_rect`
//!
//! The window's scale factors are source pixels per viewport pixel.

pub mod decode;
pub mod encode;
pub mod engine;
pub mod error;
pub mod geometry;
pub mod options;
pub mod pipeline;
pub mod task;
pub mod transform;
pub mod window;

pub use decode::{EncodedImage, ImageSource, MemoryBudget, MemoryImage, RgbBuffer};
pub use encode::{encode_output, EncodeError, OutputFormat};
pub use engine::{CropEngine, CropState, TransformState};
pub use error::CropError;
pub use geometry::{BoundsQuad, PixelRect, Point, Rect};
pub use options::{CropOptions, RubberBand};
pub use pipeline::{crop, load, CropRequest, CropResult, CropSource, LoadResult};
pub use task::{CancelToken, TaskHandle};
pub use transform::CropTransform;
pub use window::{AspectRatio, CropShape, CropWindow, HandleType, SizeConstraints};

#[cfg(test)]
mod tests {
    use super::*;
    use crate::decode::test_support::{gradient, png_bytes};
    use std::sync::Arc;

    /// Select a region on screen, map it to image pixels and crop it.
    #[test]
    fn test_gesture_to_encoded_crop() {
        let options = CropOptions::default();
        let image = gradient(400, 300);
        let (viewport_width, viewport_height) = (200.0, 150.0);

        // Image displayed at half size filling the viewport
        let constraints = options.constraints(viewport_width, viewport_height, 2.0, 2.0).unwrap();
        let mut window = CropWindow::new(constraints);
        let quad = BoundsQuad::from_rect(&Rect::new(0.0, 0.0, viewport_width, viewport_height));
        window.init_for_bounds(&quad, viewport_width, viewport_height, &options);
        assert_eq!(window.rect(), Rect::new(20.0, 15.0, 180.0, 135.0));

        let rect = window.rect();
        assert_eq!(window.press(rect.right, rect.bottom, &options), Some(HandleType::BottomRight));
        assert!(window.drag(160.0, 115.0, &quad, viewport_width, viewport_height, &options));
        window.release();
        assert_eq!(window.rect(), Rect::new(20.0, 15.0, 160.0, 115.0));

        let selected = window.rect();
        let image_quad = BoundsQuad::from_rect(&Rect::new(
            selected.left * 2.0,
            selected.top * 2.0,
            selected.right * 2.0,
            selected.bottom * 2.0,
        ));
        let source: Arc<dyn ImageSource> = Arc::new(EncodedImage::new(png_bytes(&image)));
        let result = crop(
            &CropRequest::new(CropSource::Image(source), image_quad),
            &CancelToken::new(),
        )
        .unwrap();
        assert_eq!((result.buffer.width, result.buffer.height), (280, 200));
        assert_eq!(&result.buffer.pixels[..3], &[40, 30, 70]);

        let jpeg = encode_output(&result.buffer, OutputFormat::default()).unwrap();
        assert_eq!(&jpeg[0..2], &[0xFF, 0xD8]);
    }
}
