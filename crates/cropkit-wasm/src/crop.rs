//! Crop pipeline WASM bindings.
//!
//! Crops run synchronously here; hosts call them from a Web Worker. The quad
//! is given in source-image pixels as 8 coordinates.
//!
//! # Example
//!
//! ```typescript
//! const cropped = crop_image(bytes, quad, {
//!   rotation_degrees: win.rotation_degrees,
//!   flip_horizontal: win.flip_horizontal,
//!   req_width: 1080, req_height: 1080, resize_policy: "ResizeInside",
//! });
//! const jpeg = encode_jpeg(cropped, 90);
//! ```

use std::sync::Arc;

use crate::types::{quad_from_slice, to_js_error, JsImage};
use cropkit_core::decode::{EncodedImage, FilterType, MemoryBudget, ResizePolicy};
use cropkit_core::{
    crop, AspectRatio, BoundsQuad, CancelToken, CropError, CropRequest, CropResult, CropSource,
    RgbBuffer,
};
use serde::Deserialize;
use wasm_bindgen::prelude::*;

/// Crop parameters accepted from JavaScript; every field is optional.
#[derive(Debug, Clone, Default, Deserialize)]
#[serde(default)]
pub(crate) struct CropParams {
    pub rotation_degrees: i32,
    pub flip_horizontal: bool,
    pub flip_vertical: bool,
    pub aspect_ratio: AspectRatio,
    pub req_width: u32,
    pub req_height: u32,
    pub resize_policy: ResizePolicy,
    pub filter: FilterType,
    pub memory_budget_bytes: Option<usize>,
}

impl CropParams {
    fn into_request(self, source: CropSource, quad: BoundsQuad) -> CropRequest {
        let mut request = CropRequest::new(source, quad)
            .with_rotation(self.rotation_degrees)
            .with_flips(self.flip_horizontal, self.flip_vertical)
            .with_aspect_ratio(self.aspect_ratio)
            .with_requested_size(self.req_width, self.req_height, self.resize_policy)
            .with_budget(MemoryBudget::new(self.memory_budget_bytes));
        request.filter = self.filter;
        request
    }
}

fn parse_params(params: JsValue) -> Result<CropParams, JsValue> {
    if params.is_undefined() || params.is_null() {
        return Ok(CropParams::default());
    }
    serde_wasm_bindgen::from_value(params).map_err(to_js_error)
}

pub(crate) fn crop_bytes(
    bytes: &[u8],
    quad: BoundsQuad,
    params: CropParams,
) -> Result<CropResult, CropError> {
    let source = CropSource::Image(Arc::new(EncodedImage::new(bytes.to_vec())));
    crop(&params.into_request(source, quad), &CancelToken::new())
}

pub(crate) fn crop_buffer(
    buffer: RgbBuffer,
    quad: BoundsQuad,
    params: CropParams,
) -> Result<CropResult, CropError> {
    let source = CropSource::Buffer(Arc::new(buffer));
    crop(&params.into_request(source, quad), &CancelToken::new())
}

/// Crop encoded JPEG or PNG bytes.
#[wasm_bindgen]
pub fn crop_image(bytes: &[u8], quad: &[f32], params: JsValue) -> Result<JsImage, JsValue> {
    let quad = quad_from_slice(quad).map_err(to_js_error)?;
    let params = parse_params(params)?;
    crop_bytes(bytes, quad, params)
        .map(|result| JsImage::from_buffer(result.buffer))
        .map_err(to_js_error)
}

/// Crop an image that is already decoded.
#[wasm_bindgen]
pub fn crop_pixels(image: &JsImage, quad: &[f32], params: JsValue) -> Result<JsImage, JsValue> {
    let quad = quad_from_slice(quad).map_err(to_js_error)?;
    let params = parse_params(params)?;
    let buffer = image.to_buffer().map_err(to_js_error)?;
    crop_buffer(buffer, quad, params)
        .map(|result| JsImage::from_buffer(result.buffer))
        .map_err(to_js_error)
}
