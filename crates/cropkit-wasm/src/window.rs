//! Interactive crop window bindings.
//!
//! [`JsCropWindow`] keeps the crop rectangle, the displayed image outline and
//! the rotation/flip state on the Rust side. The host forwards pointer events
//! and redraws from `rect()` after each one.
//!
//! # Example
//!
//! ```typescript
//! const win = new JsCropWindow({ aspect_ratio: { Fixed: [1, 1] } }, 800, 600, 2.5, 2.5);
//! win.set_image_bounds(new Float32Array([0, 0, 800, 0, 800, 600, 0, 600]));
//!
//! canvas.onpointerdown = (e) => win.press(e.offsetX, e.offsetY);
//! canvas.onpointermove = (e) => win.drag(e.offsetX, e.offsetY) && redraw(win.rect());
//! canvas.onpointerup = () => win.release();
//! ```

use crate::types::{handle_name, quad_from_slice, to_js_error};
use cropkit_core::engine::{swap_axes, CropState, TransformState};
use cropkit_core::geometry::{BoundsQuad, Rect};
use cropkit_core::window::CropWindow;
use cropkit_core::{CropError, CropOptions};
use wasm_bindgen::prelude::*;

/// Crop window wrapper for JavaScript.
#[wasm_bindgen]
pub struct JsCropWindow {
    window: CropWindow,
    options: CropOptions,
    transform: TransformState,
    quad: BoundsQuad,
    viewport_width: f32,
    viewport_height: f32,
}

impl JsCropWindow {
    pub(crate) fn with_options(
        options: CropOptions,
        viewport_width: f32,
        viewport_height: f32,
        scale_x: f32,
        scale_y: f32,
    ) -> Result<Self, CropError> {
        options.validate()?;
        let constraints = options.constraints(viewport_width, viewport_height, scale_x, scale_y)?;
        Ok(Self {
            window: CropWindow::new(constraints),
            options,
            transform: TransformState::default(),
            quad: BoundsQuad::from_rect(&Rect::new(0.0, 0.0, viewport_width, viewport_height)),
            viewport_width,
            viewport_height,
        })
    }

    pub(crate) fn set_quad(&mut self, quad: BoundsQuad) {
        self.quad = quad;
        self.window
            .init_for_bounds(&quad, self.viewport_width, self.viewport_height, &self.options);
    }

    pub(crate) fn crop_state(&self) -> CropState {
        CropState::new(self.window.rect(), &self.transform, &self.options)
    }

    pub(crate) fn apply_state(&mut self, state: CropState) -> Result<(), CropError> {
        state.aspect_ratio.validate()?;
        self.options.shape = state.shape;
        self.options.aspect_ratio = state.aspect_ratio;
        self.transform = state.transform_state();
        self.window.set_rect(state.rect);
        Ok(())
    }
}

#[wasm_bindgen]
impl JsCropWindow {
    /// Create a window for a viewport.
    ///
    /// `options` is a partial `CropOptions` object (or `undefined` for the
    /// defaults). `scale_x`/`scale_y` are image pixels per viewport pixel.
    #[wasm_bindgen(constructor)]
    pub fn new(
        options: JsValue,
        viewport_width: f32,
        viewport_height: f32,
        scale_x: f32,
        scale_y: f32,
    ) -> Result<JsCropWindow, JsValue> {
        let options: CropOptions = if options.is_undefined() || options.is_null() {
            CropOptions::default()
        } else {
            serde_wasm_bindgen::from_value(options).map_err(to_js_error)?
        };
        Self::with_options(options, viewport_width, viewport_height, scale_x, scale_y)
            .map_err(to_js_error)
    }

    /// Set the displayed image outline (8 viewport coordinates, clockwise from
    /// the top-left corner) and place the window inside it.
    pub fn set_image_bounds(&mut self, points: &[f32]) -> Result<(), JsValue> {
        let quad = quad_from_slice(points).map_err(to_js_error)?;
        self.set_quad(quad);
        Ok(())
    }

    /// Update image pixels per viewport pixel, e.g. after a zoom.
    pub fn set_scale_factors(&mut self, scale_x: f32, scale_y: f32) -> Result<(), JsValue> {
        self.window
            .set_scale_factors(scale_x, scale_y)
            .map_err(to_js_error)
    }

    /// Name of the handle under the point, or `undefined`.
    pub fn find_handle(&self, x: f32, y: f32) -> Option<String> {
        self.window
            .find_handle(
                x,
                y,
                self.options.touch_radius,
                self.options.shape,
                self.options.center_move_enabled,
            )
            .map(|handle| handle_name(handle).to_string())
    }

    /// Begin a gesture; returns the grabbed handle's name.
    pub fn press(&mut self, x: f32, y: f32) -> Option<String> {
        self.window
            .press(x, y, &self.options)
            .map(|handle| handle_name(handle).to_string())
    }

    /// Move the active gesture. Returns `false` if nothing is grabbed.
    pub fn drag(&mut self, x: f32, y: f32) -> bool {
        self.window.drag(
            x,
            y,
            &self.quad,
            self.viewport_width,
            self.viewport_height,
            &self.options,
        )
    }

    pub fn release(&mut self) -> Option<String> {
        self.window
            .release()
            .map(|handle| handle_name(handle).to_string())
    }

    /// Current rectangle as `[left, top, right, bottom]`.
    pub fn rect(&self) -> Vec<f32> {
        let r = self.window.rect();
        vec![r.left, r.top, r.right, r.bottom]
    }

    pub fn show_guidelines(&self) -> bool {
        self.window.show_guidelines()
    }

    /// Rotate by `degrees`. Returns true when the window's axes were swapped;
    /// the host then sends the rotated outline via `set_image_bounds`.
    pub fn rotate(&mut self, degrees: i32) -> bool {
        let flip_axes = self.transform.rotate(degrees, self.options.aspect_ratio);
        if flip_axes {
            self.window.set_rect(swap_axes(&self.window.rect()));
        }
        flip_axes
    }

    pub fn flip_horizontally(&mut self) {
        self.transform.flip_horizontally();
    }

    pub fn flip_vertically(&mut self) {
        self.transform.flip_vertically();
    }

    #[wasm_bindgen(getter)]
    pub fn rotation_degrees(&self) -> u32 {
        self.transform.rotation_degrees
    }

    #[wasm_bindgen(getter)]
    pub fn flip_horizontal(&self) -> bool {
        self.transform.flip_horizontal
    }

    #[wasm_bindgen(getter)]
    pub fn flip_vertical(&self) -> bool {
        self.transform.flip_vertical
    }

    /// Zoom the viewport should switch to now that a gesture ended, or
    /// `undefined` to keep the current zoom.
    pub fn next_zoom(&self, zoom: f32) -> Option<f32> {
        let r = self.window.rect();
        self.options.auto_zoom.next_zoom(
            zoom,
            r.width(),
            r.height(),
            self.viewport_width,
            self.viewport_height,
            self.options.max_zoom as f32,
            self.options.auto_zoom_enabled,
        )
    }

    /// Snapshot for persistence.
    pub fn state(&self) -> Result<JsValue, JsValue> {
        serde_wasm_bindgen::to_value(&self.crop_state()).map_err(to_js_error)
    }

    pub fn restore_state(&mut self, state: JsValue) -> Result<(), JsValue> {
        let state: CropState = serde_wasm_bindgen::from_value(state).map_err(to_js_error)?;
        self.apply_state(state).map_err(to_js_error)
    }
}
