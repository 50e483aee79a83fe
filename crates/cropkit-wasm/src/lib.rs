//! Cropkit WASM - WebAssembly bindings for the cropkit crop engine
//!
//! This crate exposes the interactive crop window and the crop pipeline to
//! browser hosts. The host owns the canvas and pointer events; the crop
//! geometry and pixel work happen here.
//!
//! # Module Structure
//!
//! - `window` - Interactive crop window (hit-testing, gestures, rotation state)
//! - `decode` - Sampled image loading with EXIF orientation
//! - `crop` - Crop pipeline on encoded bytes or decoded pixels
//! - `encode` - JPEG/PNG output
//! - `types` - WASM-compatible wrapper types for image data
//!
//! # Usage
//!
//! ```typescript
//! import init, { JsCropWindow, crop_image, encode_jpeg } from '@cropkit/wasm';
//!
//! await init();
//! const win = new JsCropWindow(undefined, 800, 600, scale, scale);
//! win.set_image_bounds(outline);
//! // ... forward pointer events to win.press / win.drag / win.release ...
//! const cropped = crop_image(bytes, toImageQuad(win.rect()), { rotation_degrees: win.rotation_degrees });
//! const jpeg = encode_jpeg(cropped, 90);
//! ```

use wasm_bindgen::prelude::*;

mod crop;
mod decode;
mod encode;
mod types;
mod window;

pub use crop::{crop_image, crop_pixels};
pub use decode::{load_image, JsLoadedImage};
pub use encode::{encode_jpeg, encode_png};
pub use types::JsImage;
pub use window::JsCropWindow;

/// Initialize the WASM module (called automatically on load)
#[wasm_bindgen(start)]
pub fn init() {}

/// Get the version of the WASM module
#[wasm_bindgen]
pub fn version() -> String {
    env!("CARGO_PKG_VERSION").to_string()
}
