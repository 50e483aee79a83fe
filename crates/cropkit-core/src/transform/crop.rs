//! Crop rectangle extraction.
//!
//! The crop quad describes the selected region in source-image pixels. Its
//! envelope, clamped into the image, is the coarse region handed to the
//! rotation step. When the rotation is not a right angle the rotated buffer
//! still carries filler around the crop; [`crop_for_rotated_image`] projects the
//! quad onto the rotated axes and cuts the filler away.

use crate::decode::{subsample_region, DecodeError, MemoryBudget, RgbBuffer};
use crate::geometry::{BoundsQuad, PixelRect};
use crate::window::AspectRatio;

use super::rotation::{rotate_and_flip, sin_cos};
use super::CropTransform;

/// Integer crop region covered by `quad`, clamped into a `width` x `height`
/// image and trimmed to `aspect` when it is locked.
pub fn rect_from_points(
    quad: &BoundsQuad,
    image_width: u32,
    image_height: u32,
    aspect: AspectRatio,
) -> PixelRect {
    let envelope = quad.envelope();
    let clamp = |v: f32, max: u32| v.clamp(0.0, max as f32).round() as u32;

    let left = clamp(envelope.left, image_width);
    let top = clamp(envelope.top, image_height);
    let right = clamp(envelope.right, image_width).max(left);
    let bottom = clamp(envelope.bottom, image_height).max(top);

    let mut rect = PixelRect::new(left, top, right - left, bottom - top);
    fix_rect_for_aspect_ratio(&mut rect, aspect);
    rect
}

/// Trim the larger dimension so the rectangle matches the locked ratio,
/// keeping the top-left corner.
pub fn fix_rect_for_aspect_ratio(rect: &mut PixelRect, aspect: AspectRatio) {
    let Some(ratio) = aspect.ratio() else {
        return;
    };
    if rect.is_empty() {
        return;
    }

    let width_for_height = ((rect.height as f32 * ratio).round() as u32).max(1);
    if width_for_height < rect.width {
        rect.width = width_for_height;
        return;
    }
    let height_for_width = ((rect.width as f32 / ratio).round() as u32).max(1);
    if height_for_width < rect.height {
        rect.height = height_for_width;
    }
}

/// Remove the filler a non-right-angle rotation leaves around the crop.
///
/// `quad` and `rect` are in the coordinate space the coarse crop was computed
/// in; `scale` maps that space onto `rotated`'s pixels.
pub fn crop_for_rotated_image(
    rotated: &RgbBuffer,
    quad: &BoundsQuad,
    rect: PixelRect,
    degrees: u32,
    aspect: AspectRatio,
    scale: f32,
    budget: &MemoryBudget,
) -> Result<RgbBuffer, DecodeError> {
    let degrees = degrees % 360;
    if degrees % 90 == 0 {
        return Ok(rotated.clone());
    }

    let (left, top) = (rect.x as f32, rect.y as f32);
    let (right, bottom) = (rect.right() as f32, rect.bottom() as f32);

    // The quad corner lying on the envelope's leading edge
    let compare_to = if degrees < 90 || (181..270).contains(&degrees) {
        left
    } else {
        right
    };
    let corner = (0..4)
        .map(|i| quad.point(i))
        .min_by(|a, b| (a.x - compare_to).abs().total_cmp(&(b.x - compare_to).abs()))
        .unwrap_or_default();

    let (sin, cos) = sin_cos(degrees);
    let (sin, cos) = (sin as f32, cos as f32);
    let adj_left = (sin * (bottom - corner.y)).abs() * scale;
    let adj_top = (cos * (corner.y - top)).abs() * scale;
    let width = ((corner.y - top) / sin).abs() * scale;
    let height = ((bottom - corner.y) / cos).abs() * scale;

    let x = (adj_left as u32).min(rotated.width.saturating_sub(1));
    let y = (adj_top as u32).min(rotated.height.saturating_sub(1));
    let mut region = PixelRect::new(
        x,
        y,
        (width as u32).clamp(1, rotated.width - x),
        (height as u32).clamp(1, rotated.height - y),
    );
    fix_rect_for_aspect_ratio(&mut region, aspect);

    subsample_region(rotated, region, 1, budget)
}

/// Crop `quad` out of an in-memory buffer, rotating, flipping and scaling the
/// result by `scale`.
///
/// # Errors
///
/// `ResourceExhausted` when an intermediate buffer does not fit the budget;
/// callers retry with a smaller `scale`.
pub fn crop_in_memory(
    buffer: &RgbBuffer,
    quad: &BoundsQuad,
    transform: &CropTransform,
    scale: f32,
    budget: &MemoryBudget,
) -> Result<RgbBuffer, DecodeError> {
    let rect = rect_from_points(quad, buffer.width, buffer.height, transform.aspect_ratio);
    let rotated = rotate_and_flip(
        buffer,
        rect,
        transform.rotation_degrees,
        transform.flip_horizontal,
        transform.flip_vertical,
        scale,
        budget,
    )?;
    if !transform.is_right_angle() {
        return crop_for_rotated_image(
            &rotated,
            quad,
            rect,
            transform.rotation_degrees,
            transform.aspect_ratio,
            scale,
            budget,
        );
    }
    Ok(rotated)
}

/// Rotate and flip a region that was decoded on its own.
///
/// `region` holds the pixels of `rect` (intrinsic coordinates) sampled down by
/// `sample_size`.
pub fn transform_decoded_region(
    region: RgbBuffer,
    quad: &BoundsQuad,
    rect: PixelRect,
    transform: &CropTransform,
    sample_size: u32,
    budget: &MemoryBudget,
) -> Result<RgbBuffer, DecodeError> {
    if transform.is_identity() {
        return Ok(region);
    }

    let full = PixelRect::new(0, 0, region.width, region.height);
    let rotated = rotate_and_flip(
        &region,
        full,
        transform.rotation_degrees,
        transform.flip_horizontal,
        transform.flip_vertical,
        1.0,
        budget,
    )?;
    drop(region);

    if !transform.is_right_angle() {
        return crop_for_rotated_image(
            &rotated,
            quad,
            rect,
            transform.rotation_degrees,
            transform.aspect_ratio,
            1.0 / sample_size.max(1) as f32,
            budget,
        );
    }
    Ok(rotated)
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::decode::test_support::gradient;
    use crate::decode::PixelBuffer;
    use crate::geometry::{rotate_quad, Rect};

    fn transform(degrees: u32) -> CropTransform {
        CropTransform {
            rotation_degrees: degrees,
            ..Default::default()
        }
    }

    #[test]
    fn test_rect_from_points_clamps() {
        let quad = BoundsQuad::from_rect(&Rect::new(-10.0, 5.4, 120.0, 60.6));
        let rect = rect_from_points(&quad, 100, 50, AspectRatio::Free);
        assert_eq!(rect, PixelRect::new(0, 5, 100, 45));
    }

    #[test]
    fn test_rect_from_points_trims_to_ratio() {
        let quad = BoundsQuad::from_rect(&Rect::new(10.0, 10.0, 110.0, 60.0));
        let square = rect_from_points(&quad, 200, 200, AspectRatio::Fixed(1, 1));
        assert_eq!(square, PixelRect::new(10, 10, 50, 50));

        let quad = BoundsQuad::from_rect(&Rect::new(0.0, 0.0, 160.0, 100.0));
        let wide = rect_from_points(&quad, 200, 200, AspectRatio::Fixed(16, 9));
        assert_eq!(wide, PixelRect::new(0, 0, 160, 90));
    }

    #[test]
    fn test_rect_from_points_outside_is_empty() {
        let quad = BoundsQuad::from_rect(&Rect::new(150.0, 150.0, 200.0, 200.0));
        assert!(rect_from_points(&quad, 100, 100, AspectRatio::Free).is_empty());
    }

    #[test]
    fn test_crop_in_memory_axis_aligned() {
        let img = gradient(100, 80);
        let quad = BoundsQuad::from_rect(&Rect::new(10.0, 20.0, 60.0, 50.0));
        let out = crop_in_memory(&img, &quad, &transform(0), 1.0, &MemoryBudget::UNLIMITED)
            .unwrap();
        assert_eq!((out.width, out.height), (50, 30));
        assert_eq!(&out.pixels[..3], &[10, 20, 30]);
    }

    #[test]
    fn test_crop_in_memory_quarter_turn_swaps() {
        let img = gradient(100, 80);
        let quad = BoundsQuad::from_rect(&Rect::new(10.0, 20.0, 60.0, 50.0));
        let out = crop_in_memory(&img, &quad, &transform(90), 1.0, &MemoryBudget::UNLIMITED)
            .unwrap();
        assert_eq!((out.width, out.height), (30, 50));
    }

    #[test]
    fn test_rotated_crop_removes_filler() {
        let img = RgbBuffer::new(200, 200, vec![180; 200 * 200 * 3]);
        // An 80x60 crop centered in the image, displayed rotated by 30 degrees:
        // in image space the crop is the upright rect turned the other way.
        let upright = BoundsQuad::from_rect(&Rect::new(60.0, 70.0, 140.0, 130.0));
        let quad = rotate_quad(&upright, 100.0, 100.0, -30.0);

        let out = crop_in_memory(&img, &quad, &transform(30), 1.0, &MemoryBudget::UNLIMITED)
            .unwrap();
        assert!(out.width.abs_diff(80) <= 2, "width {}", out.width);
        assert!(out.height.abs_diff(60) <= 2, "height {}", out.height);
        // Filler is gone apart from truncation at the very edge
        for (row, col) in [(2, 2), (out.height - 3, out.width - 3), (out.height / 2, out.width / 2)] {
            let pixel = out.get(row, col);
            assert!(pixel.iter().all(|&v| v > 100), "({row}, {col}) = {pixel:?}");
        }
    }

    #[test]
    fn test_rotated_crop_with_scale() {
        let img = RgbBuffer::new(200, 200, vec![90; 200 * 200 * 3]);
        let upright = BoundsQuad::from_rect(&Rect::new(60.0, 70.0, 140.0, 130.0));
        let quad = rotate_quad(&upright, 100.0, 100.0, -30.0);

        let out = crop_in_memory(&img, &quad, &transform(30), 0.5, &MemoryBudget::UNLIMITED)
            .unwrap();
        assert!(out.width.abs_diff(40) <= 2, "width {}", out.width);
        assert!(out.height.abs_diff(30) <= 2, "height {}", out.height);
    }

    #[test]
    fn test_transform_decoded_region_identity() {
        let region = gradient(30, 20);
        let quad = BoundsQuad::from_rect(&Rect::new(0.0, 0.0, 30.0, 20.0));
        let out = transform_decoded_region(
            region.clone(),
            &quad,
            PixelRect::new(0, 0, 30, 20),
            &transform(0),
            1,
            &MemoryBudget::UNLIMITED,
        )
        .unwrap();
        assert_eq!(out, region);
    }

    #[test]
    fn test_transform_decoded_region_sampled_rotation() {
        // Region decoded at sample size 2: 100x92 intrinsic -> 50x46
        let upright = BoundsQuad::from_rect(&Rect::new(60.0, 70.0, 140.0, 130.0));
        let quad = rotate_quad(&upright, 100.0, 100.0, -30.0);
        let rect = rect_from_points(&quad, 200, 200, AspectRatio::Free);
        let region = RgbBuffer::new(
            rect.width / 2,
            rect.height / 2,
            vec![120; (rect.width / 2 * (rect.height / 2) * 3) as usize],
        );

        let out = transform_decoded_region(
            region,
            &quad,
            rect,
            &transform(30),
            2,
            &MemoryBudget::UNLIMITED,
        )
        .unwrap();
        assert!(out.width.abs_diff(40) <= 2, "width {}", out.width);
        assert!(out.height.abs_diff(30) <= 2, "height {}", out.height);
    }
}
