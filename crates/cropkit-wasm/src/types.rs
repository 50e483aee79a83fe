//! WASM-compatible wrapper types for image data.
//!
//! This module provides JavaScript-friendly types that wrap the core cropkit
//! types, handling the conversion between Rust and JavaScript data
//! representations.

use cropkit_core::decode::{FilterType, ResizePolicy, RgbBuffer};
use cropkit_core::geometry::BoundsQuad;
use cropkit_core::window::HandleType;
use cropkit_core::CropError;
use wasm_bindgen::prelude::*;

/// An RGB image wrapper for JavaScript.
///
/// The pixel data is stored in WASM memory. When you call `pixels()`, a copy is
/// made to JavaScript memory as a `Uint8Array`.
#[wasm_bindgen]
pub struct JsImage {
    width: u32,
    height: u32,
    pixels: Vec<u8>,
}

#[wasm_bindgen]
impl JsImage {
    /// Create a new JsImage from dimensions and RGB pixel data
    /// (3 bytes per pixel, row-major order).
    #[wasm_bindgen(constructor)]
    pub fn new(width: u32, height: u32, pixels: Vec<u8>) -> JsImage {
        JsImage {
            width,
            height,
            pixels,
        }
    }

    #[wasm_bindgen(getter)]
    pub fn width(&self) -> u32 {
        self.width
    }

    #[wasm_bindgen(getter)]
    pub fn height(&self) -> u32 {
        self.height
    }

    /// Number of bytes in the pixel buffer (width * height * 3)
    #[wasm_bindgen(getter)]
    pub fn byte_length(&self) -> usize {
        self.pixels.len()
    }

    /// Returns RGB pixel data as Uint8Array. This copies the data.
    pub fn pixels(&self) -> Vec<u8> {
        self.pixels.clone()
    }

    /// Explicitly free WASM memory.
    ///
    /// Optional; wasm-bindgen's finalizer also releases it.
    pub fn free(self) {}
}

impl JsImage {
    pub(crate) fn from_buffer(buffer: RgbBuffer) -> Self {
        Self {
            width: buffer.width,
            height: buffer.height,
            pixels: buffer.pixels,
        }
    }

    /// Copy into a core buffer, checking the pixel length.
    pub(crate) fn to_buffer(&self) -> Result<RgbBuffer, CropError> {
        let expected = self.width as usize * self.height as usize * 3;
        if self.pixels.len() != expected {
            return Err(CropError::InvalidGeometry(format!(
                "expected {expected} pixel bytes for {}x{}, got {}",
                self.width,
                self.height,
                self.pixels.len()
            )));
        }
        Ok(RgbBuffer {
            width: self.width,
            height: self.height,
            pixels: self.pixels.clone(),
        })
    }
}

/// Build a quad from `[x0, y0, x1, y1, x2, y2, x3, y3]`.
pub(crate) fn quad_from_slice(points: &[f32]) -> Result<BoundsQuad, CropError> {
    let points: [f32; 8] = points.try_into().map_err(|_| {
        CropError::InvalidGeometry(format!("expected 8 quad coordinates, got {}", points.len()))
    })?;
    Ok(BoundsQuad::new(points))
}

/// Convert a u8 filter value to the core FilterType.
///
/// 0 = Nearest, 1 = Bilinear, 2 = Lanczos3; anything else is Bilinear.
pub(crate) fn filter_from_u8(value: u8) -> FilterType {
    match value {
        0 => FilterType::Nearest,
        2 => FilterType::Lanczos3,
        _ => FilterType::Bilinear,
    }
}

/// Convert a u8 policy value to the core ResizePolicy.
///
/// 0 = None, 1 = Sampling, 2 = ResizeInside, 3 = ResizeFit, 4 = ResizeExact;
/// anything else is ResizeInside.
pub(crate) fn policy_from_u8(value: u8) -> ResizePolicy {
    match value {
        0 => ResizePolicy::None,
        1 => ResizePolicy::Sampling,
        3 => ResizePolicy::ResizeFit,
        4 => ResizePolicy::ResizeExact,
        _ => ResizePolicy::ResizeInside,
    }
}

pub(crate) fn handle_name(handle: HandleType) -> &'static str {
    match handle {
        HandleType::TopLeft => "top-left",
        HandleType::TopRight => "top-right",
        HandleType::BottomLeft => "bottom-left",
        HandleType::BottomRight => "bottom-right",
        HandleType::Left => "left",
        HandleType::Top => "top",
        HandleType::Right => "right",
        HandleType::Bottom => "bottom",
        HandleType::Center => "center",
    }
}

pub(crate) fn to_js_error(err: impl std::fmt::Display) -> JsValue {
    JsValue::from_str(&err.to_string())
}
