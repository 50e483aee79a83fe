//! Output encoding WASM bindings.
//!
//! # Example
//!
//! ```typescript
//! const jpeg = encode_jpeg(cropped, 90);
//! await writable.write(new Blob([jpeg], { type: 'image/jpeg' }));
//! ```

use crate::types::{to_js_error, JsImage};
use cropkit_core::{encode_output, OutputFormat};
use wasm_bindgen::prelude::*;

/// Encode an image as JPEG. Quality is clamped to 1-100.
#[wasm_bindgen]
pub fn encode_jpeg(image: &JsImage, quality: u8) -> Result<Vec<u8>, JsValue> {
    let buffer = image.to_buffer().map_err(to_js_error)?;
    encode_output(&buffer, OutputFormat::Jpeg { quality }).map_err(to_js_error)
}

#[wasm_bindgen]
pub fn encode_png(image: &JsImage) -> Result<Vec<u8>, JsValue> {
    let buffer = image.to_buffer().map_err(to_js_error)?;
    encode_output(&buffer, OutputFormat::Png).map_err(to_js_error)
}
