//! Per-gesture move handler.
//!
//! A [`MoveHandler`] lives for exactly one press-drag-release gesture. It
//! remembers the offset between the touch point and the grabbed anchor so the
//! window does not jump when the gesture starts slightly off the handle.
//!
//! Each edge adjustment clamps in a fixed order: rubber-band at the viewport,
//! snap onto the bounds, clamp to the effective min/max size, snap again, and
//! finally (with a locked ratio) keep the derived edges inside the bounds.
//! The `*_moves` flags name the perpendicular edges that will follow the
//! adjusted edge through the aspect ratio, so their final position is checked
//! too.

use crate::geometry::{Point, Rect};
use crate::options::RubberBand;

use super::{AspectRatio, HandleType, SizeConstraints};

/// Everything a move needs besides the rectangle itself.
#[derive(Debug, Clone, Copy, PartialEq)]
pub struct MoveContext {
    /// Box the rectangle must stay within, already clipped to the viewport.
    pub bounds: Rect,
    pub viewport_width: f32,
    pub viewport_height: f32,
    /// Edges closer than this to a bound snap onto it.
    pub snap_margin: f32,
    pub aspect: AspectRatio,
    pub rubber_band: RubberBand,
}

/// Moves or resizes the crop window for a single gesture.
#[derive(Debug, Clone, PartialEq)]
pub struct MoveHandler {
    handle: HandleType,
    touch_offset: Point,
}

impl MoveHandler {
    /// Start a gesture on `handle` at `(touch_x, touch_y)`.
    pub fn new(handle: HandleType, rect: &Rect, touch_x: f32, touch_y: f32) -> Self {
        let (dx, dy) = match handle {
            HandleType::TopLeft => (rect.left - touch_x, rect.top - touch_y),
            HandleType::TopRight => (rect.right - touch_x, rect.top - touch_y),
            HandleType::BottomLeft => (rect.left - touch_x, rect.bottom - touch_y),
            HandleType::BottomRight => (rect.right - touch_x, rect.bottom - touch_y),
            HandleType::Left => (rect.left - touch_x, 0.0),
            HandleType::Top => (0.0, rect.top - touch_y),
            HandleType::Right => (rect.right - touch_x, 0.0),
            HandleType::Bottom => (0.0, rect.bottom - touch_y),
            HandleType::Center => (rect.center_x() - touch_x, rect.center_y() - touch_y),
        };
        Self {
            handle,
            touch_offset: Point::new(dx, dy),
        }
    }

    pub fn handle(&self) -> HandleType {
        self.handle
    }

    pub fn touch_offset(&self) -> Point {
        self.touch_offset
    }

    /// Apply a touch at `(x, y)` to `rect`.
    pub fn move_rect(
        &mut self,
        rect: &mut Rect,
        x: f32,
        y: f32,
        ctx: &MoveContext,
        limits: &SizeConstraints,
    ) {
        let adj_x = x + self.touch_offset.x;
        let adj_y = y + self.touch_offset.y;

        let mut edges = EdgeAdjuster {
            rect,
            offset: &mut self.touch_offset,
            ctx,
            min_width: limits.effective_min_width(),
            min_height: limits.effective_min_height(),
            max_width: limits.effective_max_width(),
            max_height: limits.effective_max_height(),
        };

        if self.handle == HandleType::Center {
            edges.move_center(adj_x, adj_y);
        } else if let Some(ratio) = ctx.aspect.ratio() {
            edges.move_fixed(self.handle, adj_x, adj_y, ratio);
        } else {
            edges.move_free(self.handle, adj_x, adj_y);
        }
    }
}

/// Borrowed state for one move step.
struct EdgeAdjuster<'a> {
    rect: &'a mut Rect,
    offset: &'a mut Point,
    ctx: &'a MoveContext,
    min_width: f32,
    min_height: f32,
    max_width: f32,
    max_height: f32,
}

impl EdgeAdjuster<'_> {
    fn move_center(&mut self, x: f32, y: f32) {
        let b = self.ctx.bounds;
        let band = self.ctx.rubber_band;
        let r = *self.rect;

        let mut dx = x - r.center_x();
        let mut dy = y - r.center_y();
        if r.left + dx < 0.0
            || r.right + dx > self.ctx.viewport_width
            || r.left + dx < b.left
            || r.right + dx > b.right
        {
            dx /= band.divisor;
            self.offset.x -= dx / band.center_feedback;
        }
        if r.top + dy < 0.0
            || r.bottom + dy > self.ctx.viewport_height
            || r.top + dy < b.top
            || r.bottom + dy > b.bottom
        {
            dy /= band.divisor;
            self.offset.y -= dy / band.center_feedback;
        }

        self.rect.offset(dx, dy);
        self.snap_edges_to_bounds();
    }

    /// Pull any edge within the snap margin exactly onto its bound.
    fn snap_edges_to_bounds(&mut self) {
        let b = self.ctx.bounds;
        let margin = self.ctx.snap_margin;
        let rect = &mut *self.rect;

        if rect.left < b.left + margin {
            rect.offset(b.left - rect.left, 0.0);
        }
        if rect.top < b.top + margin {
            rect.offset(0.0, b.top - rect.top);
        }
        if rect.right > b.right - margin {
            rect.offset(b.right - rect.right, 0.0);
        }
        if rect.bottom > b.bottom - margin {
            rect.offset(0.0, b.bottom - rect.bottom);
        }
    }

    fn move_free(&mut self, handle: HandleType, x: f32, y: f32) {
        match handle {
            HandleType::TopLeft => {
                self.adjust_top(y, 0.0, false, false);
                self.adjust_left(x, 0.0, false, false);
            }
            HandleType::TopRight => {
                self.adjust_top(y, 0.0, false, false);
                self.adjust_right(x, 0.0, false, false);
            }
            HandleType::BottomLeft => {
                self.adjust_bottom(y, 0.0, false, false);
                self.adjust_left(x, 0.0, false, false);
            }
            HandleType::BottomRight => {
                self.adjust_bottom(y, 0.0, false, false);
                self.adjust_right(x, 0.0, false, false);
            }
            HandleType::Left => self.adjust_left(x, 0.0, false, false),
            HandleType::Top => self.adjust_top(y, 0.0, false, false),
            HandleType::Right => self.adjust_right(x, 0.0, false, false),
            HandleType::Bottom => self.adjust_bottom(y, 0.0, false, false),
            HandleType::Center => {}
        }
    }

    /// Corner drags adjust whichever edge drives the ratio and derive the
    /// other; edge drags resize symmetrically about the center line.
    fn move_fixed(&mut self, handle: HandleType, x: f32, y: f32, ratio: f32) {
        let r = *self.rect;
        match handle {
            HandleType::TopLeft => {
                if aspect_of(x, y, r.right, r.bottom) < ratio {
                    self.adjust_top(y, ratio, true, false);
                    self.left_by_ratio(ratio);
                } else {
                    self.adjust_left(x, ratio, true, false);
                    self.top_by_ratio(ratio);
                }
            }
            HandleType::TopRight => {
                if aspect_of(r.left, y, x, r.bottom) < ratio {
                    self.adjust_top(y, ratio, false, true);
                    self.right_by_ratio(ratio);
                } else {
                    self.adjust_right(x, ratio, true, false);
                    self.top_by_ratio(ratio);
                }
            }
            HandleType::BottomLeft => {
                if aspect_of(x, r.top, r.right, y) < ratio {
                    self.adjust_bottom(y, ratio, true, false);
                    self.left_by_ratio(ratio);
                } else {
                    self.adjust_left(x, ratio, false, true);
                    self.bottom_by_ratio(ratio);
                }
            }
            HandleType::BottomRight => {
                if aspect_of(r.left, r.top, x, y) < ratio {
                    self.adjust_bottom(y, ratio, false, true);
                    self.right_by_ratio(ratio);
                } else {
                    self.adjust_right(x, ratio, false, true);
                    self.bottom_by_ratio(ratio);
                }
            }
            HandleType::Left => {
                self.adjust_left(x, ratio, true, true);
                self.top_bottom_by_ratio(ratio);
            }
            HandleType::Top => {
                self.adjust_top(y, ratio, true, true);
                self.left_right_by_ratio(ratio);
            }
            HandleType::Right => {
                self.adjust_right(x, ratio, true, true);
                self.top_bottom_by_ratio(ratio);
            }
            HandleType::Bottom => {
                self.adjust_bottom(y, ratio, true, true);
                self.left_right_by_ratio(ratio);
            }
            HandleType::Center => {}
        }
    }

    /// `ratio` of zero means free aspect.
    fn adjust_left(&mut self, left: f32, ratio: f32, top_moves: bool, bottom_moves: bool) {
        let b = self.ctx.bounds;
        let band = self.ctx.rubber_band;
        let snap = self.ctx.snap_margin;
        let r = *self.rect;

        let mut new_left = left;
        if new_left < 0.0 {
            new_left /= band.divisor;
            self.offset.x -= new_left / band.offset_feedback;
        }
        if new_left < b.left {
            self.offset.x -= (new_left - b.left) / 2.0;
        }
        if new_left - b.left < snap {
            new_left = b.left;
        }
        if r.right - new_left < self.min_width {
            new_left = r.right - self.min_width;
        }
        if r.right - new_left > self.max_width {
            new_left = r.right - self.max_width;
        }
        if new_left - b.left < snap {
            new_left = b.left;
        }

        if ratio > 0.0 {
            let mut new_height = (r.right - new_left) / ratio;
            if new_height < self.min_height {
                new_left = b.left.max(r.right - self.min_height * ratio);
                new_height = (r.right - new_left) / ratio;
            }
            if new_height > self.max_height {
                new_left = b.left.max(r.right - self.max_height * ratio);
                new_height = (r.right - new_left) / ratio;
            }
            if top_moves && bottom_moves {
                new_left = new_left.max(b.left.max(r.right - b.height() * ratio));
            } else {
                if top_moves && r.bottom - new_height < b.top {
                    new_left = b.left.max(r.right - (r.bottom - b.top) * ratio);
                    new_height = (r.right - new_left) / ratio;
                }
                if bottom_moves && r.top + new_height > b.bottom {
                    new_left = new_left.max(b.left.max(r.right - (b.bottom - r.top) * ratio));
                }
            }
        }
        self.rect.left = new_left;
    }

    fn adjust_right(&mut self, right: f32, ratio: f32, top_moves: bool, bottom_moves: bool) {
        let b = self.ctx.bounds;
        let band = self.ctx.rubber_band;
        let snap = self.ctx.snap_margin;
        let view_width = self.ctx.viewport_width;
        let r = *self.rect;

        let mut new_right = right;
        if new_right > view_width {
            new_right = view_width + (new_right - view_width) / band.divisor;
            self.offset.x -= (new_right - view_width) / band.offset_feedback;
        }
        if new_right > b.right {
            self.offset.x -= (new_right - b.right) / 2.0;
        }
        if b.right - new_right < snap {
            new_right = b.right;
        }
        if new_right - r.left < self.min_width {
            new_right = r.left + self.min_width;
        }
        if new_right - r.left > self.max_width {
            new_right = r.left + self.max_width;
        }
        if b.right - new_right < snap {
            new_right = b.right;
        }

        if ratio > 0.0 {
            let mut new_height = (new_right - r.left) / ratio;
            if new_height < self.min_height {
                new_right = b.right.min(r.left + self.min_height * ratio);
                new_height = (new_right - r.left) / ratio;
            }
            if new_height > self.max_height {
                new_right = b.right.min(r.left + self.max_height * ratio);
                new_height = (new_right - r.left) / ratio;
            }
            if top_moves && bottom_moves {
                new_right = new_right.min(b.right.min(r.left + b.height() * ratio));
            } else {
                if top_moves && r.bottom - new_height < b.top {
                    new_right = b.right.min(r.left + (r.bottom - b.top) * ratio);
                    new_height = (new_right - r.left) / ratio;
                }
                if bottom_moves && r.top + new_height > b.bottom {
                    new_right = new_right.min(b.right.min(r.left + (b.bottom - r.top) * ratio));
                }
            }
        }
        self.rect.right = new_right;
    }

    fn adjust_top(&mut self, top: f32, ratio: f32, left_moves: bool, right_moves: bool) {
        let b = self.ctx.bounds;
        let band = self.ctx.rubber_band;
        let snap = self.ctx.snap_margin;
        let r = *self.rect;

        let mut new_top = top;
        if new_top < 0.0 {
            new_top /= band.divisor;
            self.offset.y -= new_top / band.offset_feedback;
        }
        if new_top < b.top {
            self.offset.y -= (new_top - b.top) / 2.0;
        }
        if new_top - b.top < snap {
            new_top = b.top;
        }
        if r.bottom - new_top < self.min_height {
            new_top = r.bottom - self.min_height;
        }
        if r.bottom - new_top > self.max_height {
            new_top = r.bottom - self.max_height;
        }
        if new_top - b.top < snap {
            new_top = b.top;
        }

        if ratio > 0.0 {
            let mut new_width = (r.bottom - new_top) * ratio;
            if new_width < self.min_width {
                new_top = b.top.max(r.bottom - self.min_width / ratio);
                new_width = (r.bottom - new_top) * ratio;
            }
            if new_width > self.max_width {
                new_top = b.top.max(r.bottom - self.max_width / ratio);
                new_width = (r.bottom - new_top) * ratio;
            }
            if left_moves && right_moves {
                new_top = new_top.max(b.top.max(r.bottom - b.width() / ratio));
            } else {
                if left_moves && r.right - new_width < b.left {
                    new_top = b.top.max(r.bottom - (r.right - b.left) / ratio);
                    new_width = (r.bottom - new_top) * ratio;
                }
                if right_moves && r.left + new_width > b.right {
                    new_top = new_top.max(b.top.max(r.bottom - (b.right - r.left) / ratio));
                }
            }
        }
        self.rect.top = new_top;
    }

    fn adjust_bottom(&mut self, bottom: f32, ratio: f32, left_moves: bool, right_moves: bool) {
        let b = self.ctx.bounds;
        let band = self.ctx.rubber_band;
        let snap = self.ctx.snap_margin;
        let view_height = self.ctx.viewport_height;
        let r = *self.rect;

        let mut new_bottom = bottom;
        if new_bottom > view_height {
            new_bottom = view_height + (new_bottom - view_height) / band.divisor;
            self.offset.y -= (new_bottom - view_height) / band.offset_feedback;
        }
        if new_bottom > b.bottom {
            self.offset.y -= (new_bottom - b.bottom) / 2.0;
        }
        if b.bottom - new_bottom < snap {
            new_bottom = b.bottom;
        }
        if new_bottom - r.top < self.min_height {
            new_bottom = r.top + self.min_height;
        }
        if new_bottom - r.top > self.max_height {
            new_bottom = r.top + self.max_height;
        }
        if b.bottom - new_bottom < snap {
            new_bottom = b.bottom;
        }

        if ratio > 0.0 {
            let mut new_width = (new_bottom - r.top) * ratio;
            if new_width < self.min_width {
                new_bottom = b.bottom.min(r.top + self.min_width / ratio);
                new_width = (new_bottom - r.top) * ratio;
            }
            if new_width > self.max_width {
                new_bottom = b.bottom.min(r.top + self.max_width / ratio);
                new_width = (new_bottom - r.top) * ratio;
            }
            if left_moves && right_moves {
                new_bottom = new_bottom.min(b.bottom.min(r.top + b.width() / ratio));
            } else {
                if left_moves && r.right - new_width < b.left {
                    new_bottom = b.bottom.min(r.top + (r.right - b.left) / ratio);
                    new_width = (new_bottom - r.top) * ratio;
                }
                if right_moves && r.left + new_width > b.right {
                    new_bottom = new_bottom.min(b.bottom.min(r.top + (b.right - r.left) / ratio));
                }
            }
        }
        self.rect.bottom = new_bottom;
    }

    fn left_by_ratio(&mut self, ratio: f32) {
        self.rect.left = self.rect.right - self.rect.height() * ratio;
    }

    fn top_by_ratio(&mut self, ratio: f32) {
        self.rect.top = self.rect.bottom - self.rect.width() / ratio;
    }

    fn right_by_ratio(&mut self, ratio: f32) {
        self.rect.right = self.rect.left + self.rect.height() * ratio;
    }

    fn bottom_by_ratio(&mut self, ratio: f32) {
        self.rect.bottom = self.rect.top + self.rect.width() / ratio;
    }

    /// Resize horizontally about the vertical center line, then shift back
    /// inside the bounds.
    fn left_right_by_ratio(&mut self, ratio: f32) {
        let b = self.ctx.bounds;
        let rect = &mut *self.rect;
        let width = rect.height() * ratio;
        let center_x = rect.center_x();
        rect.left = center_x - width / 2.0;
        rect.right = rect.left + width;
        if rect.left < b.left {
            rect.offset(b.left - rect.left, 0.0);
        }
        if rect.right > b.right {
            rect.offset(b.right - rect.right, 0.0);
        }
    }

    /// Resize vertically about the horizontal center line, then shift back
    /// inside the bounds.
    fn top_bottom_by_ratio(&mut self, ratio: f32) {
        let b = self.ctx.bounds;
        let rect = &mut *self.rect;
        let height = rect.width() / ratio;
        let center_y = rect.center_y();
        rect.top = center_y - height / 2.0;
        rect.bottom = rect.top + height;
        if rect.top < b.top {
            rect.offset(0.0, b.top - rect.top);
        }
        if rect.bottom > b.bottom {
            rect.offset(0.0, b.bottom - rect.bottom);
        }
    }
}

/// Width over height of the box spanned by two corners.
#[inline]
fn aspect_of(left: f32, top: f32, right: f32, bottom: f32) -> f32 {
    (right - left) / (bottom - top)
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::window::SizeLimits;

    fn constraints() -> SizeConstraints {
        SizeConstraints::new(
            SizeLimits::new(42.0, 42.0, 10_000.0, 10_000.0),
            SizeLimits::new(40.0, 40.0, 99_999.0, 99_999.0),
        )
        .unwrap()
    }

    fn context(bounds: Rect, aspect: AspectRatio) -> MoveContext {
        MoveContext {
            bounds,
            viewport_width: bounds.right,
            viewport_height: bounds.bottom,
            snap_margin: 3.0,
            aspect,
            rubber_band: RubberBand::default(),
        }
    }

    fn drag(
        handle: HandleType,
        rect: Rect,
        from: (f32, f32),
        to: (f32, f32),
        ctx: &MoveContext,
    ) -> Rect {
        let mut rect = rect;
        let mut handler = MoveHandler::new(handle, &rect, from.0, from.1);
        handler.move_rect(&mut rect, to.0, to.1, ctx, &constraints());
        rect
    }

    #[test]
    fn test_touch_offset_per_handle() {
        let rect = Rect::new(10.0, 20.0, 110.0, 220.0);
        let handler = MoveHandler::new(HandleType::TopLeft, &rect, 15.0, 25.0);
        assert_eq!(handler.touch_offset(), Point::new(-5.0, -5.0));

        let handler = MoveHandler::new(HandleType::Right, &rect, 100.0, 50.0);
        assert_eq!(handler.touch_offset(), Point::new(10.0, 0.0));

        let handler = MoveHandler::new(HandleType::Center, &rect, 60.0, 100.0);
        assert_eq!(handler.touch_offset(), Point::new(0.0, 20.0));
    }

    #[test]
    fn test_off_anchor_press_does_not_jump() {
        let ctx = context(Rect::new(0.0, 0.0, 500.0, 500.0), AspectRatio::Free);
        let rect = Rect::new(100.0, 100.0, 300.0, 300.0);
        // Press 10px inside the corner and drag without moving
        let moved = drag(HandleType::BottomRight, rect, (290.0, 290.0), (290.0, 290.0), &ctx);
        assert_eq!(moved, rect);
    }

    #[test]
    fn test_top_left_drag_clamps_at_origin() {
        let ctx = context(Rect::new(0.0, 0.0, 200.0, 200.0), AspectRatio::Free);
        let rect = Rect::new(10.0, 10.0, 110.0, 110.0);
        let moved = drag(HandleType::TopLeft, rect, (10.0, 10.0), (-50.0, -50.0), &ctx);
        assert_eq!(moved, Rect::new(0.0, 0.0, 110.0, 110.0));
    }

    #[test]
    fn test_rubber_band_feeds_offset() {
        let ctx = context(Rect::new(0.0, 0.0, 200.0, 200.0), AspectRatio::Free);
        let mut rect = Rect::new(10.0, 10.0, 110.0, 110.0);
        let mut handler = MoveHandler::new(HandleType::Left, &rect, 10.0, 50.0);
        handler.move_rect(&mut rect, -21.0, 50.0, &ctx, &constraints());
        assert_eq!(rect.left, 0.0);
        // -21 / 1.05 = -20, folded back as 20 / 1.1 plus the overshoot past the bound
        let expected = 20.0 / 1.1 + 10.0;
        assert!((handler.touch_offset().x - expected).abs() < 1e-4);
    }

    #[test]
    fn test_free_edge_respects_min_width() {
        let ctx = context(Rect::new(0.0, 0.0, 500.0, 500.0), AspectRatio::Free);
        let rect = Rect::new(100.0, 100.0, 300.0, 300.0);
        let moved = drag(HandleType::Left, rect, (100.0, 200.0), (290.0, 200.0), &ctx);
        assert_eq!(moved.left, 300.0 - 42.0);
        assert_eq!(moved.right, 300.0);
    }

    #[test]
    fn test_free_edge_respects_max_width() {
        let ctx = context(Rect::new(0.0, 0.0, 500.0, 500.0), AspectRatio::Free);
        let limits = SizeConstraints::new(
            SizeLimits::new(42.0, 42.0, 250.0, 250.0),
            SizeLimits::new(40.0, 40.0, 99_999.0, 99_999.0),
        )
        .unwrap();
        let mut rect = Rect::new(100.0, 100.0, 300.0, 300.0);
        let mut handler = MoveHandler::new(HandleType::Right, &rect, 300.0, 200.0);
        handler.move_rect(&mut rect, 450.0, 200.0, &ctx, &limits);
        assert_eq!(rect.right, 350.0);
    }

    #[test]
    fn test_snap_to_bound() {
        let ctx = context(Rect::new(0.0, 0.0, 500.0, 500.0), AspectRatio::Free);
        let rect = Rect::new(100.0, 100.0, 300.0, 300.0);
        let moved = drag(HandleType::Right, rect, (300.0, 200.0), (498.0, 200.0), &ctx);
        assert_eq!(moved.right, 500.0);
    }

    #[test]
    fn test_fixed_right_edge_recenters_vertically() {
        let ctx = context(Rect::new(0.0, 0.0, 400.0, 400.0), AspectRatio::Fixed(1, 1));
        let rect = Rect::new(100.0, 100.0, 200.0, 200.0);
        let moved = drag(HandleType::Right, rect, (200.0, 150.0), (250.0, 150.0), &ctx);
        assert_eq!(moved, Rect::new(100.0, 75.0, 250.0, 225.0));
    }

    #[test]
    fn test_fixed_right_edge_clamped_to_bounds() {
        let ctx = context(Rect::new(0.0, 0.0, 400.0, 200.0), AspectRatio::Fixed(1, 1));
        let rect = Rect::new(100.0, 20.0, 200.0, 120.0);
        let moved = drag(HandleType::Right, rect, (200.0, 70.0), (250.0, 70.0), &ctx);
        assert!((moved.width() - 150.0).abs() < 1e-4);
        assert!((moved.height() - 150.0).abs() < 1e-4);
        // Centered at 70 the window would start at -5; shifted down onto the bound
        assert_eq!(moved.top, 0.0);
        assert_eq!(moved.bottom, 150.0);
    }

    #[test]
    fn test_fixed_corner_keeps_ratio() {
        let ctx = context(Rect::new(0.0, 0.0, 1000.0, 1000.0), AspectRatio::Fixed(16, 9));
        let rect = Rect::new(100.0, 100.0, 260.0, 190.0);
        let moved = drag(HandleType::BottomRight, rect, (260.0, 190.0), (500.0, 260.0), &ctx);
        assert!((moved.width() / moved.height() - 16.0 / 9.0).abs() < 1e-3);
        assert_eq!(moved.left, 100.0);
        assert_eq!(moved.top, 100.0);
    }

    #[test]
    fn test_center_move_and_snap() {
        let ctx = context(Rect::new(0.0, 0.0, 500.0, 500.0), AspectRatio::Free);
        let rect = Rect::new(100.0, 100.0, 200.0, 200.0);
        let moved = drag(HandleType::Center, rect, (150.0, 150.0), (200.0, 160.0), &ctx);
        assert_eq!(moved, Rect::new(150.0, 110.0, 250.0, 210.0));

        // Dragged past the right edge: rubber-banded, then snapped inside
        let moved = drag(HandleType::Center, rect, (150.0, 150.0), (600.0, 150.0), &ctx);
        assert_eq!(moved.right, 500.0);
        assert_eq!(moved.width(), 100.0);
    }
}
