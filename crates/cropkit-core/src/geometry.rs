//! Geometry kernel: rectangles, bounds quads and hit-test primitives.
//!
//! All interactive geometry is in viewport pixels and uses `f32`, since it is
//! evaluated once per input event. Crop quads handed to the pipeline use the
//! same representation in source-image pixels.
//!
//! # Coordinate System
//!
//! - Origin is top-left, y grows downward
//! - A [`BoundsQuad`] lists its corners clockwise starting at the image's
//!   top-left corner: `[x0, y0, x1, y1, x2, y2, x3, y3]`

use serde::{Deserialize, Serialize};

/// Tolerance used when deciding whether a quad edge is axis-parallel.
const AXIS_EPSILON: f32 = 1e-3;

/// Axis-aligned rectangle, kept normalized so that `left <= right` and
/// `top <= bottom`.
#[derive(Debug, Clone, Copy, PartialEq, Default, Serialize, Deserialize)]
pub struct Rect {
    pub left: f32,
    pub top: f32,
    pub right: f32,
    pub bottom: f32,
}

impl Rect {
    /// Create a rectangle, swapping edges if they are given out of order.
    pub fn new(left: f32, top: f32, right: f32, bottom: f32) -> Self {
        Self {
            left: left.min(right),
            top: top.min(bottom),
            right: left.max(right),
            bottom: top.max(bottom),
        }
    }

    /// Create a rectangle from its top-left corner and size.
    pub fn from_xywh(x: f32, y: f32, width: f32, height: f32) -> Self {
        Self::new(x, y, x + width, y + height)
    }

    #[inline]
    pub fn width(&self) -> f32 {
        self.right - self.left
    }

    #[inline]
    pub fn height(&self) -> f32 {
        self.bottom - self.top
    }

    #[inline]
    pub fn center_x(&self) -> f32 {
        (self.left + self.right) / 2.0
    }

    #[inline]
    pub fn center_y(&self) -> f32 {
        (self.top + self.bottom) / 2.0
    }

    /// True if the rectangle has no area.
    pub fn is_empty(&self) -> bool {
        self.width() <= 0.0 || self.height() <= 0.0
    }

    /// Translate the rectangle in place.
    pub fn offset(&mut self, dx: f32, dy: f32) {
        self.left += dx;
        self.right += dx;
        self.top += dy;
        self.bottom += dy;
    }

    /// Shrink (positive) or grow (negative) the rectangle symmetrically.
    pub fn inset(&mut self, dx: f32, dy: f32) {
        self.left += dx;
        self.right -= dx;
        self.top += dy;
        self.bottom -= dy;
    }

    /// Intersection with another rectangle. Empty intersections collapse to a
    /// zero-area rectangle at the nearest edge instead of inverting.
    pub fn intersect(&self, other: &Rect) -> Rect {
        let left = self.left.max(other.left);
        let top = self.top.max(other.top);
        let right = self.right.min(other.right).max(left);
        let bottom = self.bottom.min(other.bottom).max(top);
        Rect {
            left,
            top,
            right,
            bottom,
        }
    }

    /// True if `other` lies inside `self`, allowing `epsilon` of float slack.
    pub fn contains_rect(&self, other: &Rect, epsilon: f32) -> bool {
        other.left >= self.left - epsilon
            && other.top >= self.top - epsilon
            && other.right <= self.right + epsilon
            && other.bottom <= self.bottom + epsilon
    }

    /// Open containment test used for center hit zones.
    #[inline]
    pub fn contains_point_open(&self, x: f32, y: f32) -> bool {
        x > self.left && x < self.right && y > self.top && y < self.bottom
    }
}

/// A 2D point.
#[derive(Debug, Clone, Copy, PartialEq, Default, Serialize, Deserialize)]
pub struct Point {
    pub x: f32,
    pub y: f32,
}

impl Point {
    pub fn new(x: f32, y: f32) -> Self {
        Self { x, y }
    }
}

/// Integer pixel rectangle, used for region decodes and buffer extraction.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Default, Serialize, Deserialize)]
pub struct PixelRect {
    pub x: u32,
    pub y: u32,
    pub width: u32,
    pub height: u32,
}

impl PixelRect {
    pub fn new(x: u32, y: u32, width: u32, height: u32) -> Self {
        Self {
            x,
            y,
            width,
            height,
        }
    }

    #[inline]
    pub fn right(&self) -> u32 {
        self.x + self.width
    }

    #[inline]
    pub fn bottom(&self) -> u32 {
        self.y + self.height
    }

    pub fn is_empty(&self) -> bool {
        self.width == 0 || self.height == 0
    }

    /// True if the rectangle lies within a `width` x `height` image.
    pub fn fits_within(&self, width: u32, height: u32) -> bool {
        self.x.checked_add(self.width).is_some_and(|r| r <= width)
            && self.y.checked_add(self.height).is_some_and(|b| b <= height)
    }
}

/// Outline of the displayed image: four corners, possibly rotated.
#[derive(Debug, Clone, Copy, PartialEq, Default, Serialize, Deserialize)]
pub struct BoundsQuad {
    pub points: [f32; 8],
}

impl BoundsQuad {
    pub fn new(points: [f32; 8]) -> Self {
        Self { points }
    }

    /// Quad covering an axis-aligned rectangle.
    pub fn from_rect(rect: &Rect) -> Self {
        Self {
            points: [
                rect.left,
                rect.top,
                rect.right,
                rect.top,
                rect.right,
                rect.bottom,
                rect.left,
                rect.bottom,
            ],
        }
    }

    #[inline]
    pub fn point(&self, index: usize) -> Point {
        Point::new(self.points[index * 2], self.points[index * 2 + 1])
    }

    /// Axis-aligned bounding box of the four corners.
    pub fn envelope(&self) -> Rect {
        envelope_of(&self.points)
    }

    /// True if the quad's edges are parallel to the axes (rotation of 0, 90,
    /// 180 or 270 degrees).
    pub fn is_axis_aligned(&self) -> bool {
        let p = &self.points;
        (p[0] - p[6]).abs() < AXIS_EPSILON || (p[1] - p[7]).abs() < AXIS_EPSILON
    }

    /// Scale every coordinate, e.g. to map a quad into a sampled buffer.
    pub fn scaled(&self, factor: f32) -> BoundsQuad {
        let mut points = self.points;
        for v in points.iter_mut() {
            *v *= factor;
        }
        BoundsQuad { points }
    }
}

/// Axis-aligned bounding box of four points given as `[x0, y0, .., x3, y3]`.
pub fn envelope_of(points: &[f32; 8]) -> Rect {
    let xs = [points[0], points[2], points[4], points[6]];
    let ys = [points[1], points[3], points[5], points[7]];
    Rect {
        left: xs.iter().copied().fold(f32::INFINITY, f32::min),
        top: ys.iter().copied().fold(f32::INFINITY, f32::min),
        right: xs.iter().copied().fold(f32::NEG_INFINITY, f32::max),
        bottom: ys.iter().copied().fold(f32::NEG_INFINITY, f32::max),
    }
}

/// Compute the axis-aligned box the crop rectangle may occupy without
/// leaving the (possibly rotated) image quad.
///
/// For an axis-aligned quad this is just its envelope. For a rotated quad the
/// rectangle's diagonals through its center are intersected with the quad's
/// supporting lines; the tightest intersections bound the box. The result
/// depends on the rectangle's current shape, so it must be recomputed for
/// every move.
pub fn bounds_for_rect(rect: &Rect, quad: &BoundsQuad) -> Rect {
    let envelope = quad.envelope();
    if quad.is_axis_aligned() {
        return envelope;
    }

    let (mut left, mut top, mut right, mut bottom) =
        (envelope.left, envelope.top, envelope.right, envelope.bottom);

    // Pick the corner that is currently top-most as p0 so that the line
    // p0 -> p3 always has the same orientation regardless of rotation.
    let p = &quad.points;
    let (p0, p2, p3) = if p[7] < p[1] {
        if p[1] < p[3] {
            (quad.point(3), quad.point(1), quad.point(2))
        } else {
            (quad.point(2), quad.point(0), quad.point(1))
        }
    } else if p[1] > p[3] {
        (quad.point(1), quad.point(3), quad.point(0))
    } else {
        (quad.point(0), quad.point(2), quad.point(3))
    };

    // Supporting lines of the quad: slopes a0 (p0->p3) and a1 (perpendicular).
    let a0 = (p3.y - p0.y) / (p3.x - p0.x);
    let a1 = -1.0 / a0;
    let b0 = p0.y - a0 * p0.x;
    let b1 = p0.y - a1 * p0.x;
    let b2 = p2.y - a0 * p2.x;
    let b3 = p2.y - a1 * p2.x;

    // Diagonals of the crop rectangle.
    let c0 = (rect.center_y() - rect.top) / (rect.center_x() - rect.left);
    let c1 = -c0;
    let d0 = rect.top - c0 * rect.left;
    let d1 = rect.top - c1 * rect.right;

    let candidate_left = |x: f32, current: f32| if x < rect.right { x } else { current };
    let candidate_right = |x: f32, current: f32| if x > rect.left { x } else { current };

    left = left.max(candidate_left((d0 - b0) / (a0 - c0), left));
    left = left.max(candidate_left((d0 - b1) / (a1 - c0), left));
    left = left.max(candidate_left((d1 - b3) / (a1 - c1), left));
    right = right.min(candidate_right((d1 - b1) / (a1 - c1), right));
    right = right.min(candidate_right((d1 - b2) / (a0 - c1), right));
    right = right.min(candidate_right((d0 - b2) / (a0 - c0), right));

    top = top.max((a0 * left + b0).max(a1 * right + b1));
    bottom = bottom.min((a1 * left + b3).min(a0 * right + b2));

    Rect {
        left,
        top,
        right,
        bottom,
    }
}

/// Chebyshev distance, used for corner hit zones: a square target is cheaper
/// to evaluate and matches the drawn corner handles.
#[inline]
pub fn chebyshev_distance(x1: f32, y1: f32, x2: f32, y2: f32) -> f32 {
    (x1 - x2).abs().max((y1 - y2).abs())
}

/// Euclidean distance between two points.
#[inline]
pub fn distance(x1: f32, y1: f32, x2: f32, y2: f32) -> f32 {
    ((x1 - x2).powi(2) + (y1 - y2).powi(2)).sqrt()
}

/// Rotate `quad` around `(cx, cy)` by `degrees` (clockwise on screen).
pub fn rotate_quad(quad: &BoundsQuad, cx: f32, cy: f32, degrees: f32) -> BoundsQuad {
    let (sin, cos) = degrees.to_radians().sin_cos();
    let mut points = [0.0f32; 8];
    for i in 0..4 {
        let dx = quad.points[i * 2] - cx;
        let dy = quad.points[i * 2 + 1] - cy;
        points[i * 2] = cx + dx * cos - dy * sin;
        points[i * 2 + 1] = cy + dx * sin + dy * cos;
    }
    BoundsQuad { points }
}
