//! Cropper configuration.
//!
//! [`CropOptions`] is the single option bag hosts fill in (or deserialize)
//! before creating a crop window. Unset fields fall back to the defaults
//! below, so a partial JSON object is a valid configuration.

use serde::{Deserialize, Serialize};

use crate::decode::MemoryBudget;
use crate::error::CropError;
use crate::geometry::Rect;
use crate::window::{AspectRatio, AutoZoom, CropShape, SizeConstraints, SizeLimits};

/// Soft resistance applied when a drag pushes an edge past the viewport.
#[derive(Debug, Clone, Copy, PartialEq, Serialize, Deserialize)]
#[serde(default)]
pub struct RubberBand {
    /// Overshoot past the viewport edge is divided by this.
    pub divisor: f32,
    /// Fraction of an edge overshoot folded back into the touch offset.
    pub offset_feedback: f32,
    /// Fraction of a center-move overshoot folded back into the touch offset.
    pub center_feedback: f32,
}

impl Default for RubberBand {
    fn default() -> Self {
        Self {
            divisor: 1.05,
            offset_feedback: 1.1,
            center_feedback: 2.0,
        }
    }
}

/// Configuration for the interactive cropper and the crop pipeline.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(default)]
pub struct CropOptions {
    pub shape: CropShape,
    pub aspect_ratio: AspectRatio,
    /// Allow dragging the whole window from its interior.
    pub center_move_enabled: bool,
    /// Hit-test radius around handles, in viewport pixels.
    pub touch_radius: f32,
    /// Distance within which edges snap onto the image bounds.
    pub snap_radius: f32,
    /// Initial window inset as a fraction of the image size.
    pub initial_padding_ratio: f32,
    pub min_window_width: f32,
    pub min_window_height: f32,
    /// Output size limits, in source-image pixels.
    pub min_result_width: u32,
    pub min_result_height: u32,
    pub max_result_width: u32,
    pub max_result_height: u32,
    /// Starting crop region in source-image pixels.
    pub initial_crop_rect: Option<Rect>,
    pub max_zoom: u32,
    pub auto_zoom_enabled: bool,
    pub rubber_band: RubberBand,
    pub auto_zoom: AutoZoom,
    /// Largest single pixel buffer the pipeline may allocate.
    pub memory_budget_bytes: Option<usize>,
}

impl Default for CropOptions {
    fn default() -> Self {
        Self {
            shape: CropShape::Rectangle,
            aspect_ratio: AspectRatio::Free,
            center_move_enabled: true,
            touch_radius: 24.0,
            snap_radius: 3.0,
            initial_padding_ratio: 0.1,
            min_window_width: 42.0,
            min_window_height: 42.0,
            min_result_width: 40,
            min_result_height: 40,
            max_result_width: 99_999,
            max_result_height: 99_999,
            initial_crop_rect: None,
            max_zoom: 4,
            auto_zoom_enabled: true,
            rubber_band: RubberBand::default(),
            auto_zoom: AutoZoom::default(),
            memory_budget_bytes: None,
        }
    }
}

impl CropOptions {
    /// Reject inconsistent settings.
    pub fn validate(&self) -> Result<(), CropError> {
        self.aspect_ratio.validate()?;

        if self.touch_radius.is_nan() || self.touch_radius <= 0.0 {
            return Err(invalid("touch radius must be positive"));
        }
        if self.snap_radius.is_nan() || self.snap_radius < 0.0 {
            return Err(invalid("snap radius must not be negative"));
        }
        if !(0.0..0.5).contains(&self.initial_padding_ratio) {
            return Err(invalid("initial padding ratio must be in [0, 0.5)"));
        }
        if self.min_window_width.is_nan()
            || self.min_window_height.is_nan()
            || self.min_window_width < 0.0
            || self.min_window_height < 0.0
        {
            return Err(invalid("minimum window size must not be negative"));
        }
        if self.min_result_width > self.max_result_width
            || self.min_result_height > self.max_result_height
        {
            return Err(invalid("minimum result size exceeds maximum"));
        }
        if self.max_zoom == 0 {
            return Err(invalid("max zoom must be at least 1"));
        }
        let band = &self.rubber_band;
        if band.divisor.is_nan()
            || band.divisor < 1.0
            || band.offset_feedback.is_nan()
            || band.offset_feedback <= 0.0
            || band.center_feedback.is_nan()
            || band.center_feedback <= 0.0
        {
            return Err(invalid("rubber band parameters out of range"));
        }
        if let Some(rect) = &self.initial_crop_rect {
            if rect.is_empty() {
                return Err(invalid("initial crop rect is empty"));
            }
        }
        Ok(())
    }

    /// Size constraints for a viewport of the given size.
    ///
    /// `scale_x`/`scale_y` are source-image pixels per viewport pixel. The
    /// window may grow up to the full viewport.
    pub fn constraints(
        &self,
        viewport_width: f32,
        viewport_height: f32,
        scale_x: f32,
        scale_y: f32,
    ) -> Result<SizeConstraints, CropError> {
        let window = SizeLimits::new(
            self.min_window_width,
            self.min_window_height,
            viewport_width,
            viewport_height,
        );
        let result = SizeLimits::new(
            self.min_result_width as f32,
            self.min_result_height as f32,
            self.max_result_width as f32,
            self.max_result_height as f32,
        );
        let mut constraints = SizeConstraints::new(window, result)?;
        constraints.set_scale_factors(scale_x, scale_y)?;
        Ok(constraints)
    }

    pub fn memory_budget(&self) -> MemoryBudget {
        MemoryBudget::new(self.memory_budget_bytes)
    }
}

fn invalid(msg: &str) -> CropError {
    CropError::InvalidGeometry(msg.to_string())
}
