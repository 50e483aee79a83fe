//! Rotation and flipping of a pixel region.
//!
//! Rotation is clockwise on screen (y grows downward) around the region's
//! origin; the output canvas is the bounding box of the rotated region so
//! nothing is clipped. Flips mirror the rotated result. Corners exposed by a
//! non-right-angle rotation are filled with black.
//!
//! The transform uses inverse mapping: for every output pixel center the
//! contributing source position is computed and sampled.
//!
//! ```text
//! forward:  x' = x * cos - y * sin
//!           y' = x * sin + y * cos
//! inverse:  x  =  x' * cos + y' * sin
//!           y  = -x' * sin + y' * cos
//! ```

use crate::decode::{subsample_region, DecodeError, MemoryBudget, RgbBuffer};
use crate::geometry::PixelRect;

/// `(sin, cos)` of a clockwise rotation, exact for right angles.
pub(crate) fn sin_cos(degrees: u32) -> (f64, f64) {
    match degrees % 360 {
        0 => (0.0, 1.0),
        90 => (1.0, 0.0),
        180 => (0.0, -1.0),
        270 => (-1.0, 0.0),
        other => (other as f64).to_radians().sin_cos(),
    }
}

/// Axis-aligned extent `(min_x, min_y, max_x, max_y)` of a `width` x `height`
/// box after rotating it around its origin.
fn rotated_extent(width: f64, height: f64, sin: f64, cos: f64) -> (f64, f64, f64, f64) {
    let corners = [
        (0.0, 0.0),
        (width, 0.0),
        (width, height),
        (0.0, height),
    ];
    let mut extent = (f64::MAX, f64::MAX, f64::MIN, f64::MIN);
    for (x, y) in corners {
        let rx = x * cos - y * sin;
        let ry = x * sin + y * cos;
        extent.0 = extent.0.min(rx);
        extent.1 = extent.1.min(ry);
        extent.2 = extent.2.max(rx);
        extent.3 = extent.3.max(ry);
    }
    extent
}

/// Output dimensions for a region rotated by `degrees` and scaled by `scale`.
///
/// # Example
///
/// ```ignore
/// // 90-degree rotation swaps dimensions
/// assert_eq!(rotated_bounds(100, 50, 90, 1.0), (50, 100));
/// // Halving applies after rotation
/// assert_eq!(rotated_bounds(100, 50, 180, 0.5), (50, 25));
/// ```
pub fn rotated_bounds(width: u32, height: u32, degrees: u32, scale: f32) -> (u32, u32) {
    let scale = scale as f64;
    let scaled = |v: f64| ((v * scale).round() as u32).max(1);

    match degrees % 360 {
        0 | 180 => (scaled(width as f64), scaled(height as f64)),
        90 | 270 => (scaled(height as f64), scaled(width as f64)),
        other => {
            let (sin, cos) = sin_cos(other);
            let (min_x, min_y, max_x, max_y) =
                rotated_extent(width as f64, height as f64, sin, cos);
            (scaled(max_x - min_x), scaled(max_y - min_y))
        }
    }
}

/// Rotate `region` of `src` clockwise by `degrees`, mirror it as requested and
/// scale the result by `scale`.
///
/// Right angles and scaled output use nearest-neighbor sampling, so a plain
/// quarter turn is lossless; other angles are sampled bilinearly.
///
/// # Errors
///
/// `ResourceExhausted` when the output does not fit the budget, and
/// `CorruptedFile` when `region` is empty or outside `src`.
pub fn rotate_and_flip(
    src: &RgbBuffer,
    region: PixelRect,
    degrees: u32,
    flip_horizontal: bool,
    flip_vertical: bool,
    scale: f32,
    budget: &MemoryBudget,
) -> Result<RgbBuffer, DecodeError> {
    let degrees = degrees % 360;
    if degrees == 0 && !flip_horizontal && !flip_vertical && scale == 1.0 {
        return subsample_region(src, region, 1, budget);
    }
    if region.is_empty() || !region.fits_within(src.width, src.height) {
        return Err(DecodeError::CorruptedFile(format!(
            "region {}x{}+{}+{} outside {}x{} image",
            region.width, region.height, region.x, region.y, src.width, src.height
        )));
    }

    let (sin, cos) = sin_cos(degrees);
    let (min_x, min_y, max_x, max_y) =
        rotated_extent(region.width as f64, region.height as f64, sin, cos);
    let (out_width, out_height) = rotated_bounds(region.width, region.height, degrees, scale);
    let mut out = RgbBuffer::allocate(out_width, out_height, budget)?;

    // Output pixels per rotated unit, per axis, so rounding of the output size
    // stretches rather than shifts the content.
    let step_x = (max_x - min_x) / out_width as f64;
    let step_y = (max_y - min_y) / out_height as f64;
    let nearest = degrees % 90 == 0 || scale != 1.0;

    let src_stride = src.width as usize * 3;
    let dst_stride = out_width as usize * 3;
    let (w, h) = (region.width as f64, region.height as f64);

    for oy in 0..out_height {
        let ry = if flip_vertical { out_height - 1 - oy } else { oy };
        let qy = (ry as f64 + 0.5) * step_y + min_y;
        for ox in 0..out_width {
            let rx = if flip_horizontal { out_width - 1 - ox } else { ox };
            let qx = (rx as f64 + 0.5) * step_x + min_x;

            let sx = qx * cos + qy * sin;
            let sy = -qx * sin + qy * cos;
            if sx < 0.0 || sy < 0.0 || sx >= w || sy >= h {
                continue;
            }

            let pixel = if nearest {
                let px = region.x as usize + sx as usize;
                let py = region.y as usize + sy as usize;
                let idx = py * src_stride + px * 3;
                [src.pixels[idx], src.pixels[idx + 1], src.pixels[idx + 2]]
            } else {
                sample_bilinear(src, region, sx - 0.5, sy - 0.5)
            };

            let d = oy as usize * dst_stride + ox as usize * 3;
            out.pixels[d..d + 3].copy_from_slice(&pixel);
        }
    }

    Ok(out)
}

/// Get a pixel as [f64; 3], clamping the coordinates into `region`.
#[inline]
fn clamped_pixel(src: &RgbBuffer, region: PixelRect, x: i64, y: i64) -> [f64; 3] {
    let px = region.x as i64 + x.clamp(0, region.width as i64 - 1);
    let py = region.y as i64 + y.clamp(0, region.height as i64 - 1);
    let idx = (py as usize * src.width as usize + px as usize) * 3;
    [
        src.pixels[idx] as f64,
        src.pixels[idx + 1] as f64,
        src.pixels[idx + 2] as f64,
    ]
}

/// Bilinear sample at region-relative `(x, y)`, replicating edge pixels.
fn sample_bilinear(src: &RgbBuffer, region: PixelRect, x: f64, y: f64) -> [u8; 3] {
    let x0 = x.floor();
    let y0 = y.floor();
    let fx = x - x0;
    let fy = y - y0;
    let (x0, y0) = (x0 as i64, y0 as i64);

    let p00 = clamped_pixel(src, region, x0, y0);
    let p10 = clamped_pixel(src, region, x0 + 1, y0);
    let p01 = clamped_pixel(src, region, x0, y0 + 1);
    let p11 = clamped_pixel(src, region, x0 + 1, y0 + 1);

    let mut result = [0u8; 3];
    for i in 0..3 {
        let v = p00[i] * (1.0 - fx) * (1.0 - fy)
            + p10[i] * fx * (1.0 - fy)
            + p01[i] * (1.0 - fx) * fy
            + p11[i] * fx * fy;
        result[i] = v.clamp(0.0, 255.0).round() as u8;
    }
    result
}
