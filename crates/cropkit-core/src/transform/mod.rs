//! Crop transform operations: rotation, flipping and crop extraction.
//!
//! # Transform Order
//!
//! 1. Extract the envelope of the crop quad (trimmed to a locked ratio)
//! 2. Rotate clockwise, then mirror
//! 3. For non-right angles, cut away the filler the rotation exposed
//!
//! # Coordinate System
//!
//! - Rotation angles are in whole degrees, positive = clockwise on screen
//! - Crop quads are in source-image pixels
//! - Origin is top-left corner

mod crop;
mod rotation;

use serde::{Deserialize, Serialize};

use crate::window::AspectRatio;

pub use crop::{
    crop_for_rotated_image, crop_in_memory, fix_rect_for_aspect_ratio, rect_from_points,
    transform_decoded_region,
};
pub use rotation::{rotate_and_flip, rotated_bounds};

/// Rotation, flips and ratio applied to a crop.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Default, Serialize, Deserialize)]
pub struct CropTransform {
    /// Clockwise rotation in `[0, 360)`.
    pub rotation_degrees: u32,
    pub flip_horizontal: bool,
    pub flip_vertical: bool,
    pub aspect_ratio: AspectRatio,
}

impl CropTransform {
    /// Build a transform from any whole-degree angle, normalizing it into
    /// `[0, 360)`.
    pub fn new(rotation_degrees: i32, flip_horizontal: bool, flip_vertical: bool) -> Self {
        Self {
            rotation_degrees: normalize_degrees(rotation_degrees),
            flip_horizontal,
            flip_vertical,
            aspect_ratio: AspectRatio::Free,
        }
    }

    pub fn with_aspect_ratio(mut self, aspect_ratio: AspectRatio) -> Self {
        self.aspect_ratio = aspect_ratio;
        self
    }

    /// True for rotations by a multiple of 90 degrees.
    pub fn is_right_angle(&self) -> bool {
        self.rotation_degrees % 90 == 0
    }

    /// True when the transform leaves pixels untouched.
    pub fn is_identity(&self) -> bool {
        self.rotation_degrees % 360 == 0 && !self.flip_horizontal && !self.flip_vertical
    }
}

/// Normalize an angle into `[0, 360)`.
#[inline]
pub fn normalize_degrees(degrees: i32) -> u32 {
    degrees.rem_euclid(360) as u32
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_normalize_degrees() {
        assert_eq!(normalize_degrees(0), 0);
        assert_eq!(normalize_degrees(360), 0);
        assert_eq!(normalize_degrees(-90), 270);
        assert_eq!(normalize_degrees(725), 5);
    }

    #[test]
    fn test_transform_flags() {
        let t = CropTransform::new(-270, false, false);
        assert_eq!(t.rotation_degrees, 90);
        assert!(t.is_right_angle());
        assert!(!t.is_identity());

        assert!(CropTransform::new(0, false, false).is_identity());
        assert!(!CropTransform::new(0, true, false).is_identity());
        assert!(!CropTransform::new(30, false, false).is_right_angle());
    }
}
