//! Crop window model.
//!
//! [`CropWindow`] owns the interactive crop rectangle in viewport pixels and
//! the size constraints that bound it. It hit-tests touches against the
//! window's handles and drives one [`MoveHandler`] per gesture.
//!
//! # Gesture Lifecycle
//!
//! ```text
//! press(x, y)    -> find_handle -> MoveHandler::new (touch offset fixed)
//! drag(x, y)*    -> bounds_for_rect -> MoveHandler::move_rect -> commit rect
//! release()      -> handler discarded
//! ```

mod move_handler;
mod zoom;

use serde::{Deserialize, Serialize};
use tracing::debug;

use crate::error::CropError;
use crate::geometry::{bounds_for_rect, chebyshev_distance, distance, BoundsQuad, Rect};
use crate::options::CropOptions;

pub use move_handler::{MoveContext, MoveHandler};
pub use zoom::AutoZoom;

/// Below this size on either side the window hides its guidelines and
/// prefers moving over resizing.
const GUIDELINES_MIN_SIZE: f32 = 100.0;

/// Shape of the crop window; decides which handles exist.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Default, Serialize, Deserialize)]
pub enum CropShape {
    #[default]
    Rectangle,
    Oval,
    RectangleVerticalOnly,
    RectangleHorizontalOnly,
}

/// Part of the window a gesture manipulates.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
pub enum HandleType {
    TopLeft,
    TopRight,
    BottomLeft,
    BottomRight,
    Left,
    Top,
    Right,
    Bottom,
    Center,
}

/// Width-to-height constraint on the crop window.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Default, Serialize, Deserialize)]
pub enum AspectRatio {
    #[default]
    Free,
    /// `numerator / denominator`, both positive.
    Fixed(u32, u32),
}

impl AspectRatio {
    /// Fixed ratio, rejecting zero terms.
    pub fn fixed(numerator: u32, denominator: u32) -> Result<Self, CropError> {
        let ratio = AspectRatio::Fixed(numerator, denominator);
        ratio.validate()?;
        Ok(ratio)
    }

    pub fn validate(&self) -> Result<(), CropError> {
        match self {
            AspectRatio::Fixed(n, d) if *n == 0 || *d == 0 => Err(CropError::InvalidGeometry(
                format!("aspect ratio {n}:{d} must be positive"),
            )),
            _ => Ok(()),
        }
    }

    /// Width divided by height, if locked.
    pub fn ratio(&self) -> Option<f32> {
        match *self {
            AspectRatio::Fixed(n, d) if n > 0 && d > 0 => Some(n as f32 / d as f32),
            _ => None,
        }
    }

    pub fn is_fixed(&self) -> bool {
        self.ratio().is_some()
    }
}

/// Minimum and maximum width/height.
#[derive(Debug, Clone, Copy, PartialEq, Default, Serialize, Deserialize)]
pub struct SizeLimits {
    pub min_width: f32,
    pub min_height: f32,
    pub max_width: f32,
    pub max_height: f32,
}

impl SizeLimits {
    pub fn new(min_width: f32, min_height: f32, max_width: f32, max_height: f32) -> Self {
        Self {
            min_width,
            min_height,
            max_width,
            max_height,
        }
    }

    fn validate(&self, what: &str) -> Result<(), CropError> {
        let values = [self.min_width, self.min_height, self.max_width, self.max_height];
        if values.iter().any(|v| v.is_nan() || *v < 0.0) {
            return Err(CropError::InvalidGeometry(format!(
                "{what} limits must be non-negative numbers"
            )));
        }
        if self.min_width > self.max_width || self.min_height > self.max_height {
            return Err(CropError::InvalidGeometry(format!(
                "{what} minimum {}x{} exceeds maximum {}x{}",
                self.min_width, self.min_height, self.max_width, self.max_height
            )));
        }
        Ok(())
    }
}

/// Window-space and result-space size limits, plus the scale between them.
#[derive(Debug, Clone, Copy, PartialEq, Serialize, Deserialize)]
pub struct SizeConstraints {
    window: SizeLimits,
    result: SizeLimits,
    /// Source-image pixels per viewport pixel.
    scale_x: f32,
    scale_y: f32,
}

impl SizeConstraints {
    /// `window` bounds the rectangle in viewport pixels, `result` bounds the
    /// cropped output in source-image pixels.
    pub fn new(window: SizeLimits, result: SizeLimits) -> Result<Self, CropError> {
        window.validate("window")?;
        result.validate("result")?;
        Ok(Self {
            window,
            result,
            scale_x: 1.0,
            scale_y: 1.0,
        })
    }

    pub fn set_constraints(&mut self, window: SizeLimits, result: SizeLimits) -> Result<(), CropError> {
        *self = Self {
            scale_x: self.scale_x,
            scale_y: self.scale_y,
            ..Self::new(window, result)?
        };
        Ok(())
    }

    /// Set the source-image pixels per viewport pixel on each axis.
    pub fn set_scale_factors(&mut self, scale_x: f32, scale_y: f32) -> Result<(), CropError> {
        if !(scale_x.is_finite() && scale_y.is_finite() && scale_x > 0.0 && scale_y > 0.0) {
            return Err(CropError::InvalidGeometry(format!(
                "scale factors {scale_x}x{scale_y} must be positive"
            )));
        }
        self.scale_x = scale_x;
        self.scale_y = scale_y;
        Ok(())
    }

    pub fn scale_factors(&self) -> (f32, f32) {
        (self.scale_x, self.scale_y)
    }

    /// Smallest window width that still yields the minimum result width.
    pub fn effective_min_width(&self) -> f32 {
        self.window.min_width.max(self.result.min_width / self.scale_x)
    }

    pub fn effective_min_height(&self) -> f32 {
        self.window.min_height.max(self.result.min_height / self.scale_y)
    }

    /// Largest window width that stays within the maximum result width.
    pub fn effective_max_width(&self) -> f32 {
        self.window.max_width.min(self.result.max_width / self.scale_x)
    }

    pub fn effective_max_height(&self) -> f32 {
        self.window.max_height.min(self.result.max_height / self.scale_y)
    }
}

/// The interactive crop window.
#[derive(Debug, Clone)]
pub struct CropWindow {
    rect: Rect,
    constraints: SizeConstraints,
    gesture: Option<MoveHandler>,
}

impl CropWindow {
    pub fn new(constraints: SizeConstraints) -> Self {
        Self {
            rect: Rect::default(),
            constraints,
            gesture: None,
        }
    }

    pub fn rect(&self) -> Rect {
        self.rect
    }

    pub fn set_rect(&mut self, rect: Rect) {
        self.rect = rect;
    }

    pub fn constraints(&self) -> &SizeConstraints {
        &self.constraints
    }

    pub fn set_constraints(&mut self, window: SizeLimits, result: SizeLimits) -> Result<(), CropError> {
        self.constraints.set_constraints(window, result)
    }

    pub fn set_scale_factors(&mut self, scale_x: f32, scale_y: f32) -> Result<(), CropError> {
        self.constraints.set_scale_factors(scale_x, scale_y)
    }

    /// Guidelines are only drawn once the window is large enough.
    pub fn show_guidelines(&self) -> bool {
        !(self.rect.width() < GUIDELINES_MIN_SIZE || self.rect.height() < GUIDELINES_MIN_SIZE)
    }

    /// Handle under `(x, y)`, if any.
    pub fn find_handle(
        &self,
        x: f32,
        y: f32,
        touch_radius: f32,
        shape: CropShape,
        center_move_enabled: bool,
    ) -> Option<HandleType> {
        match shape {
            CropShape::Rectangle => self.rectangle_handle(x, y, touch_radius, center_move_enabled),
            CropShape::Oval => self.oval_handle(x, y, center_move_enabled),
            CropShape::RectangleVerticalOnly => {
                self.vertical_only_handle(x, y, touch_radius, center_move_enabled)
            }
            CropShape::RectangleHorizontalOnly => {
                self.horizontal_only_handle(x, y, touch_radius, center_move_enabled)
            }
        }
    }

    fn rectangle_handle(
        &self,
        x: f32,
        y: f32,
        radius: f32,
        center_move_enabled: bool,
    ) -> Option<HandleType> {
        let r = &self.rect;
        let in_center = center_move_enabled && r.contains_point_open(x, y);
        let focus_center = !self.show_guidelines();

        if chebyshev_distance(x, y, r.left, r.top) <= radius {
            Some(HandleType::TopLeft)
        } else if chebyshev_distance(x, y, r.right, r.top) <= radius {
            Some(HandleType::TopRight)
        } else if chebyshev_distance(x, y, r.left, r.bottom) <= radius {
            Some(HandleType::BottomLeft)
        } else if chebyshev_distance(x, y, r.right, r.bottom) <= radius {
            Some(HandleType::BottomRight)
        } else if in_center && focus_center {
            Some(HandleType::Center)
        } else if in_horizontal_zone(x, y, r.left, r.right, r.top, radius) {
            Some(HandleType::Top)
        } else if in_horizontal_zone(x, y, r.left, r.right, r.bottom, radius) {
            Some(HandleType::Bottom)
        } else if in_vertical_zone(x, y, r.left, r.top, r.bottom, radius) {
            Some(HandleType::Left)
        } else if in_vertical_zone(x, y, r.right, r.top, r.bottom, radius) {
            Some(HandleType::Right)
        } else if in_center {
            Some(HandleType::Center)
        } else {
            self.oval_handle(x, y, center_move_enabled)
        }
    }

    /// Classify the touch into a 3x3 grid whose outer cells are one sixth of
    /// the window on each side.
    fn oval_handle(&self, x: f32, y: f32, center_move_enabled: bool) -> Option<HandleType> {
        let r = &self.rect;
        let cell_width = r.width() / 6.0;
        let left_center = r.left + cell_width;
        let right_center = r.left + 5.0 * cell_width;
        let cell_height = r.height() / 6.0;
        let top_center = r.top + cell_height;
        let bottom_center = r.top + 5.0 * cell_height;

        let handle = if x < left_center {
            if y < top_center {
                HandleType::TopLeft
            } else if y < bottom_center {
                HandleType::Left
            } else {
                HandleType::BottomLeft
            }
        } else if x < right_center {
            if y < top_center {
                HandleType::Top
            } else if y < bottom_center {
                if !center_move_enabled {
                    return None;
                }
                HandleType::Center
            } else {
                HandleType::Bottom
            }
        } else if y < top_center {
            HandleType::TopRight
        } else if y < bottom_center {
            HandleType::Right
        } else {
            HandleType::BottomRight
        };
        Some(handle)
    }

    fn vertical_only_handle(
        &self,
        x: f32,
        y: f32,
        radius: f32,
        center_move_enabled: bool,
    ) -> Option<HandleType> {
        let r = &self.rect;
        if distance(x, y, r.center_x(), r.top) <= radius {
            Some(HandleType::Top)
        } else if distance(x, y, r.center_x(), r.bottom) <= radius {
            Some(HandleType::Bottom)
        } else if center_move_enabled && r.contains_point_open(x, y) {
            Some(HandleType::Center)
        } else {
            self.oval_handle(x, y, center_move_enabled)
        }
    }

    fn horizontal_only_handle(
        &self,
        x: f32,
        y: f32,
        radius: f32,
        center_move_enabled: bool,
    ) -> Option<HandleType> {
        let r = &self.rect;
        if distance(x, y, r.left, r.center_y()) <= radius {
            Some(HandleType::Left)
        } else if distance(x, y, r.right, r.center_y()) <= radius {
            Some(HandleType::Right)
        } else if center_move_enabled && r.contains_point_open(x, y) {
            Some(HandleType::Center)
        } else {
            self.oval_handle(x, y, center_move_enabled)
        }
    }

    /// Place the window for a freshly loaded, rotated or reset image.
    ///
    /// `quad` is the displayed image outline in viewport pixels. When
    /// `options.initial_crop_rect` is set it is interpreted in source-image
    /// pixels and mapped through the scale factors; otherwise the window is
    /// inset by the padding ratio, or centered at the locked aspect ratio.
    /// Does nothing if the image does not intersect the viewport.
    pub fn init_for_bounds(
        &mut self,
        quad: &BoundsQuad,
        viewport_width: f32,
        viewport_height: f32,
        options: &CropOptions,
    ) {
        self.gesture = None;
        let viewport = Rect::new(0.0, 0.0, viewport_width, viewport_height);
        let limits = quad.envelope().intersect(&viewport);
        if limits.is_empty() {
            return;
        }

        let horizontal_padding = options.initial_padding_ratio * limits.width();
        let vertical_padding = options.initial_padding_ratio * limits.height();
        let (scale_x, scale_y) = self.constraints.scale_factors();

        let mut rect = match (&options.initial_crop_rect, options.aspect_ratio.ratio()) {
            (Some(initial), _) if !initial.is_empty() => {
                let left = limits.left + initial.left / scale_x;
                let top = limits.top + initial.top / scale_y;
                Rect {
                    left,
                    top,
                    right: left + initial.width() / scale_x,
                    bottom: top + initial.height() / scale_y,
                }
                .intersect(&limits)
            }
            (_, Some(ratio)) => {
                if limits.width() / limits.height() > ratio {
                    let top = limits.top + vertical_padding;
                    let bottom = limits.bottom - vertical_padding;
                    let width = self
                        .constraints
                        .effective_min_width()
                        .max((bottom - top) * ratio);
                    let center_x = viewport_width / 2.0;
                    Rect {
                        left: center_x - width / 2.0,
                        top,
                        right: center_x + width / 2.0,
                        bottom,
                    }
                } else {
                    let left = limits.left + horizontal_padding;
                    let right = limits.right - horizontal_padding;
                    let height = self
                        .constraints
                        .effective_min_height()
                        .max((right - left) / ratio);
                    let center_y = viewport_height / 2.0;
                    Rect {
                        left,
                        top: center_y - height / 2.0,
                        right,
                        bottom: center_y + height / 2.0,
                    }
                }
            }
            _ => Rect {
                left: limits.left + horizontal_padding,
                top: limits.top + vertical_padding,
                right: limits.right - horizontal_padding,
                bottom: limits.bottom - vertical_padding,
            },
        };

        self.fix_rect_by_rules(&mut rect, quad, viewport_width, viewport_height, options.aspect_ratio);
        debug!(
            left = rect.left,
            top = rect.top,
            right = rect.right,
            bottom = rect.bottom,
            "crop window initialized"
        );
        self.rect = rect;
    }

    /// Bring `rect` back within the size limits and the image bounds, then
    /// trim it symmetrically to the locked aspect ratio.
    ///
    /// Clamping to the bounds runs after the growth to the minimum size, so a
    /// rect grown against an edge, or an image smaller than the minimum,
    /// leaves the result below the effective minimum width or height.
    pub fn fix_rect_by_rules(
        &self,
        rect: &mut Rect,
        quad: &BoundsQuad,
        viewport_width: f32,
        viewport_height: f32,
        aspect: AspectRatio,
    ) {
        let c = &self.constraints;
        if rect.width() < c.effective_min_width() {
            let adj = (c.effective_min_width() - rect.width()) / 2.0;
            rect.left -= adj;
            rect.right += adj;
        }
        if rect.height() < c.effective_min_height() {
            let adj = (c.effective_min_height() - rect.height()) / 2.0;
            rect.top -= adj;
            rect.bottom += adj;
        }
        if rect.width() > c.effective_max_width() {
            let adj = (rect.width() - c.effective_max_width()) / 2.0;
            rect.left += adj;
            rect.right -= adj;
        }
        if rect.height() > c.effective_max_height() {
            let adj = (rect.height() - c.effective_max_height()) / 2.0;
            rect.top += adj;
            rect.bottom -= adj;
        }

        let viewport = Rect::new(0.0, 0.0, viewport_width, viewport_height);
        let bounds = bounds_for_rect(rect, quad);
        if !bounds.is_empty() {
            let limits = bounds.intersect(&viewport);
            rect.left = rect.left.max(limits.left);
            rect.top = rect.top.max(limits.top);
            rect.right = rect.right.min(limits.right);
            rect.bottom = rect.bottom.min(limits.bottom);
        }

        if let Some(ratio) = aspect.ratio() {
            if rect.width() > rect.height() * ratio {
                let adj = (rect.width() - rect.height() * ratio) / 2.0;
                rect.left += adj;
                rect.right = rect.left + rect.height() * ratio;
            } else if rect.width() < rect.height() * ratio {
                let adj = (rect.height() - rect.width() / ratio) / 2.0;
                rect.top += adj;
                rect.bottom = rect.top + rect.width() / ratio;
            }
        }
    }

    /// Start a gesture. Returns the grabbed handle, or `None` if the touch
    /// missed the window, in which case the gesture is ignored.
    pub fn press(&mut self, x: f32, y: f32, options: &CropOptions) -> Option<HandleType> {
        let handle = self.find_handle(
            x,
            y,
            options.touch_radius,
            options.shape,
            options.center_move_enabled,
        )?;
        self.gesture = Some(MoveHandler::new(handle, &self.rect, x, y));
        Some(handle)
    }

    /// Continue the active gesture. Returns `false` if no gesture is active.
    pub fn drag(
        &mut self,
        x: f32,
        y: f32,
        quad: &BoundsQuad,
        viewport_width: f32,
        viewport_height: f32,
        options: &CropOptions,
    ) -> bool {
        let Some(handler) = self.gesture.as_mut() else {
            return false;
        };

        let viewport = Rect::new(0.0, 0.0, viewport_width, viewport_height);
        let bounds = bounds_for_rect(&self.rect, quad).intersect(&viewport);
        // Snapping onto the edges of a rotated image would pull the window
        // across the image outline.
        let snap_margin = if quad.is_axis_aligned() {
            options.snap_radius
        } else {
            0.0
        };

        let ctx = MoveContext {
            bounds,
            viewport_width,
            viewport_height,
            snap_margin,
            aspect: options.aspect_ratio,
            rubber_band: options.rubber_band,
        };
        let mut rect = self.rect;
        handler.move_rect(&mut rect, x, y, &ctx, &self.constraints);
        self.rect = rect;
        true
    }

    /// End the active gesture.
    pub fn release(&mut self) -> Option<HandleType> {
        self.gesture.take().map(|handler| handler.handle())
    }

    pub fn active_handle(&self) -> Option<HandleType> {
        self.gesture.as_ref().map(MoveHandler::handle)
    }
}

/// Touch is within `radius` of a horizontal edge at `handle_y`, between its ends.
#[inline]
fn in_horizontal_zone(x: f32, y: f32, left: f32, right: f32, handle_y: f32, radius: f32) -> bool {
    x > left && x < right && (y - handle_y).abs() <= radius
}

/// Touch is within `radius` of a vertical edge at `handle_x`, between its ends.
#[inline]
fn in_vertical_zone(x: f32, y: f32, handle_x: f32, top: f32, bottom: f32, radius: f32) -> bool {
    (x - handle_x).abs() <= radius && y > top && y < bottom
}
