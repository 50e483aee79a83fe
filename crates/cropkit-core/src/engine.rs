//! Background crop engine and editable transform state.
//!
//! [`CropEngine`] runs loads and crops off the interactive thread. At most one
//! load and one crop are in flight per engine: starting a new one cancels the
//! previous task of the same kind, which then reports
//! [`CropError::Cancelled`].
//!
//! # Example
//!
//! ```ignore
//! let mut engine = CropEngine::new(CropOptions::default())?;
//! let source: Arc<dyn ImageSource> = Arc::new(EncodedImage::new(bytes));
//! let loaded = engine.load_async(Arc::clone(&source), 1080, 1920)?.wait()?;
//! let request = engine.crop_request(CropSource::Image(source), quad, &TransformState::default());
//! let cropped = engine.crop_async(request)?.wait()?;
//! ```

use std::sync::Arc;

use serde::{Deserialize, Serialize};
use tracing::debug;

use crate::decode::{
    CachedTextureLimit, FixedTextureLimit, ImageSource, TextureLimit, DEFAULT_MAX_TEXTURE_SIZE,
};
use crate::error::CropError;
use crate::geometry::{BoundsQuad, Rect};
use crate::options::CropOptions;
use crate::pipeline::{crop, load, CropRequest, CropResult, CropSource, LoadResult};
use crate::task::{CancelToken, TaskHandle};
use crate::transform::{normalize_degrees, CropTransform};
use crate::window::{AspectRatio, CropShape};

/// Rotation and flips the user applied on top of the image.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Default, Serialize, Deserialize)]
pub struct TransformState {
    /// Clockwise rotation in `[0, 360)`.
    pub rotation_degrees: u32,
    pub flip_horizontal: bool,
    pub flip_vertical: bool,
}

impl TransformState {
    /// Rotate by `degrees` (any sign). Returns true when the step turned the
    /// image sideways with a free ratio; the flips then trade places and the
    /// host should swap the crop window's axes.
    pub fn rotate(&mut self, degrees: i32, aspect: AspectRatio) -> bool {
        let step = normalize_degrees(degrees);
        let flip_axes =
            !aspect.is_fixed() && ((46..=134).contains(&step) || (216..=304).contains(&step));
        if flip_axes {
            std::mem::swap(&mut self.flip_horizontal, &mut self.flip_vertical);
        }
        self.rotation_degrees = (self.rotation_degrees + step) % 360;
        flip_axes
    }

    pub fn flip_horizontally(&mut self) {
        self.flip_horizontal = !self.flip_horizontal;
    }

    pub fn flip_vertically(&mut self) {
        self.flip_vertical = !self.flip_vertical;
    }

    pub fn to_transform(&self, aspect: AspectRatio) -> CropTransform {
        CropTransform {
            rotation_degrees: self.rotation_degrees,
            flip_horizontal: self.flip_horizontal,
            flip_vertical: self.flip_vertical,
            aspect_ratio: aspect,
        }
    }
}

/// Swap a rectangle's width and height about its center.
pub fn swap_axes(rect: &Rect) -> Rect {
    let half_width = rect.height() / 2.0;
    let half_height = rect.width() / 2.0;
    let (cx, cy) = (rect.center_x(), rect.center_y());
    Rect::new(
        cx - half_width,
        cy - half_height,
        cx + half_width,
        cy + half_height,
    )
}

/// Everything a host needs to restore a crop session.
#[derive(Debug, Clone, Copy, PartialEq, Serialize, Deserialize)]
pub struct CropState {
    pub rect: Rect,
    pub rotation_degrees: u32,
    pub flip_horizontal: bool,
    pub flip_vertical: bool,
    pub shape: CropShape,
    pub aspect_ratio: AspectRatio,
}

impl CropState {
    pub fn new(rect: Rect, transform: &TransformState, options: &CropOptions) -> Self {
        Self {
            rect,
            rotation_degrees: transform.rotation_degrees,
            flip_horizontal: transform.flip_horizontal,
            flip_vertical: transform.flip_vertical,
            shape: options.shape,
            aspect_ratio: options.aspect_ratio,
        }
    }

    pub fn transform_state(&self) -> TransformState {
        TransformState {
            rotation_degrees: self.rotation_degrees % 360,
            flip_horizontal: self.flip_horizontal,
            flip_vertical: self.flip_vertical,
        }
    }
}

type SharedTextureLimit = Arc<CachedTextureLimit<Box<dyn TextureLimit>>>;

/// Runs loads and crops on worker threads.
pub struct CropEngine {
    options: CropOptions,
    texture_limit: SharedTextureLimit,
    load_cancel: Option<CancelToken>,
    crop_cancel: Option<CancelToken>,
}

impl CropEngine {
    pub fn new(options: CropOptions) -> Result<Self, CropError> {
        options.validate()?;
        let limit: Box<dyn TextureLimit> = Box::new(FixedTextureLimit(DEFAULT_MAX_TEXTURE_SIZE));
        Ok(Self {
            options,
            texture_limit: Arc::new(CachedTextureLimit::new(limit)),
            load_cancel: None,
            crop_cancel: None,
        })
    }

    /// Use `limit` to learn the display's texture size. It is queried at most
    /// once, on the first load.
    pub fn with_texture_limit(mut self, limit: impl TextureLimit + 'static) -> Self {
        let limit: Box<dyn TextureLimit> = Box::new(limit);
        self.texture_limit = Arc::new(CachedTextureLimit::new(limit));
        self
    }

    pub fn options(&self) -> &CropOptions {
        &self.options
    }

    pub fn max_texture_size(&self) -> u32 {
        self.texture_limit.max_texture_size()
    }

    /// Build a crop request from the engine's options and the current
    /// transform state.
    pub fn crop_request(
        &self,
        source: CropSource,
        quad: BoundsQuad,
        transform: &TransformState,
    ) -> CropRequest {
        let mut request = CropRequest::new(source, quad)
            .with_rotation(transform.rotation_degrees as i32)
            .with_flips(transform.flip_horizontal, transform.flip_vertical)
            .with_aspect_ratio(self.options.aspect_ratio)
            .with_budget(self.options.memory_budget());
        request.shape = self.options.shape;
        request
    }

    /// Decode `source` for display in the background, superseding any load
    /// still in flight.
    pub fn load_async(
        &mut self,
        source: Arc<dyn ImageSource>,
        req_width: u32,
        req_height: u32,
    ) -> Result<TaskHandle<LoadResult>, CropError> {
        if let Some(previous) = self.load_cancel.take() {
            debug!("cancelling superseded load");
            previous.cancel();
        }

        let texture_limit = Arc::clone(&self.texture_limit);
        let handle = TaskHandle::spawn("cropkit-load", move |cancel| {
            let max_texture_size = texture_limit.max_texture_size();
            let result = load(source.as_ref(), req_width, req_height, max_texture_size, cancel);
            match &result {
                Ok(_) => debug!("load task finished"),
                Err(e) => debug!(error = %e, "load task failed"),
            }
            result
        })?;
        self.load_cancel = Some(handle.cancel_token().clone());
        Ok(handle)
    }

    /// Run `request` in the background, superseding any crop still in flight.
    pub fn crop_async(&mut self, request: CropRequest) -> Result<TaskHandle<CropResult>, CropError> {
        if let Some(previous) = self.crop_cancel.take() {
            debug!("cancelling superseded crop");
            previous.cancel();
        }

        let handle = TaskHandle::spawn("cropkit-crop", move |cancel| {
            let result = crop(&request, cancel);
            match &result {
                Ok(_) => debug!("crop task finished"),
                Err(e) => debug!(error = %e, "crop task failed"),
            }
            result
        })?;
        self.crop_cancel = Some(handle.cancel_token().clone());
        Ok(handle)
    }

    /// Cancel every task this engine started.
    pub fn cancel_all(&mut self) {
        for token in [self.load_cancel.take(), self.crop_cancel.take()]
            .into_iter()
            .flatten()
        {
            token.cancel();
        }
    }
}

impl Drop for CropEngine {
    fn drop(&mut self) {
        self.cancel_all();
    }
}
