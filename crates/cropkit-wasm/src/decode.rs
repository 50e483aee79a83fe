//! Image loading WASM bindings.
//!
//! Decodes encoded bytes for display, sampled down to the requested size and
//! the texture limit, and reports the EXIF correction the host should apply.
//!
//! # Example
//!
//! ```typescript
//! const loaded = load_image(bytes, canvas.width, canvas.height, gl.getParameter(gl.MAX_TEXTURE_SIZE));
//! drawUpright(loaded.image(), loaded.rotation_degrees, loaded.flip_horizontal);
//! ```

use crate::types::{to_js_error, JsImage};
use cropkit_core::decode::{CachedTextureLimit, EncodedImage, FixedTextureLimit};
use cropkit_core::{load, CancelToken, CropError, LoadResult};
use wasm_bindgen::prelude::*;

/// A sampled image plus the metadata needed to display it upright.
#[wasm_bindgen]
pub struct JsLoadedImage {
    inner: LoadResult,
}

#[wasm_bindgen]
impl JsLoadedImage {
    /// The sampled pixels. This copies the data.
    pub fn image(&self) -> JsImage {
        JsImage::from_buffer(self.inner.buffer.clone())
    }

    #[wasm_bindgen(getter)]
    pub fn sample_size(&self) -> u32 {
        self.inner.sample_size
    }

    /// Width of the encoded image before sampling.
    #[wasm_bindgen(getter)]
    pub fn intrinsic_width(&self) -> u32 {
        self.inner.intrinsic_width
    }

    #[wasm_bindgen(getter)]
    pub fn intrinsic_height(&self) -> u32 {
        self.inner.intrinsic_height
    }

    /// Clockwise rotation from the EXIF orientation.
    #[wasm_bindgen(getter)]
    pub fn rotation_degrees(&self) -> u32 {
        self.inner.rotation_degrees()
    }

    #[wasm_bindgen(getter)]
    pub fn flip_horizontal(&self) -> bool {
        self.inner.flip_horizontal()
    }

    #[wasm_bindgen(getter)]
    pub fn flip_vertical(&self) -> bool {
        self.inner.flip_vertical()
    }
}

pub(crate) fn load_bytes(
    bytes: &[u8],
    req_width: u32,
    req_height: u32,
    max_texture_size: u32,
) -> Result<LoadResult, CropError> {
    let source = EncodedImage::new(bytes.to_vec());
    let max_texture_size =
        CachedTextureLimit::new(FixedTextureLimit(max_texture_size)).max_texture_size();
    load(&source, req_width, req_height, max_texture_size, &CancelToken::new())
}

/// Decode JPEG or PNG bytes for display at about `req_width` x `req_height`.
///
/// A zero request decodes at full size (within `max_texture_size`, which is
/// never taken below 2048).
#[wasm_bindgen]
pub fn load_image(
    bytes: &[u8],
    req_width: u32,
    req_height: u32,
    max_texture_size: u32,
) -> Result<JsLoadedImage, JsValue> {
    load_bytes(bytes, req_width, req_height, max_texture_size)
        .map(|inner| JsLoadedImage { inner })
        .map_err(to_js_error)
}


/// WASM-specific tests that require JsValue.
#[cfg(all(test, target_arch = "wasm32"))]
mod wasm_tests {
    use super::*;
    use wasm_bindgen_test::*;

    wasm_bindgen_test_configure!(run_in_browser);

    #[wasm_bindgen_test]
    fn test_load_image_invalid() {
        assert!(load_image(&[0, 1, 2, 3], 0, 0, 0).is_err());
    }

    #[wasm_bindgen_test]
    fn test_load_image_empty() {
        assert!(load_image(&[], 0, 0, 0).is_err());
    }
}
