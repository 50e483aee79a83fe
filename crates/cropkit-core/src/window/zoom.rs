//! Auto-zoom advice for the viewport.
//!
//! After a gesture ends the viewport may zoom in on a small crop window or
//! back out when the window grows large. The thresholds are tuned values and
//! are kept overridable.

use serde::{Deserialize, Serialize};

/// Zoom thresholds, as fractions of the viewport size.
#[derive(Debug, Clone, Copy, PartialEq, Serialize, Deserialize)]
#[serde(default)]
pub struct AutoZoom {
    /// Zoom in when both window sides are below this fraction of the viewport.
    pub zoom_in_trigger: f32,
    /// After zooming in, the window fills this fraction of the viewport.
    pub zoom_in_fill: f32,
    /// Zoom out when either window side exceeds this fraction.
    pub zoom_out_trigger: f32,
    /// After zooming out, the window fills this fraction of the viewport.
    pub zoom_out_fill: f32,
}

impl Default for AutoZoom {
    fn default() -> Self {
        Self {
            zoom_in_trigger: 0.5,
            zoom_in_fill: 0.64,
            zoom_out_trigger: 0.65,
            zoom_out_fill: 0.51,
        }
    }
}

impl AutoZoom {
    /// Compute the zoom level to switch to once a gesture ends.
    ///
    /// `crop_width`/`crop_height` are the window size in viewport pixels at the
    /// current `zoom`. Returns `None` when the zoom should stay as it is.
    ///
    /// # Example
    ///
    /// ```ignore
    /// let zoom = AutoZoom::default();
    /// // A 100x100 window in a 1000x1000 viewport at zoom 1
    /// assert_eq!(zoom.next_zoom(1.0, 100.0, 100.0, 1000.0, 1000.0, 4.0, true), Some(4.0));
    /// ```
    #[allow(clippy::too_many_arguments)]
    pub fn next_zoom(
        &self,
        zoom: f32,
        crop_width: f32,
        crop_height: f32,
        viewport_width: f32,
        viewport_height: f32,
        max_zoom: f32,
        enabled: bool,
    ) -> Option<f32> {
        if !(enabled || zoom > 1.0) || crop_width <= 0.0 || crop_height <= 0.0 {
            return None;
        }

        let mut new_zoom = 0.0f32;
        if zoom < max_zoom
            && crop_width < viewport_width * self.zoom_in_trigger
            && crop_height < viewport_height * self.zoom_in_trigger
        {
            new_zoom = max_zoom.min(
                (viewport_width / (crop_width / zoom / self.zoom_in_fill))
                    .min(viewport_height / (crop_height / zoom / self.zoom_in_fill)),
            );
        }
        if zoom > 1.0
            && (crop_width > viewport_width * self.zoom_out_trigger
                || crop_height > viewport_height * self.zoom_out_trigger)
        {
            new_zoom = 1.0f32.max(
                (viewport_width / (crop_width / zoom / self.zoom_out_fill))
                    .min(viewport_height / (crop_height / zoom / self.zoom_out_fill)),
            );
        }
        if !enabled {
            new_zoom = 1.0;
        }

        (new_zoom > 0.0 && new_zoom != zoom).then_some(new_zoom)
    }
}
