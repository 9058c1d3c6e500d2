//! Panel geometry: position, size, viewport and display mode.
//!
//! All coordinates are CSS pixels relative to the viewport's top-left corner.

#[cfg(test)]
#[path = "geometry_test.rs"]
mod geometry_test;

use crate::consts::{
    DEFAULT_HEIGHT_PX, DEFAULT_WIDTH_PX, DOCK_THRESHOLD_PX, DOCKED_INSET_PX, MAX_SIDE_INSET_PX,
    MAX_SIDE_PX, MIN_HEIGHT_PX, MIN_WIDTH_PX, VIEWPORT_MARGIN_PX,
};

/// A point in viewport space.
#[derive(Debug, Clone, Copy, PartialEq)]
pub struct Point {
    pub x: f64,
    pub y: f64,
}

impl Point {
    #[must_use]
    pub fn new(x: f64, y: f64) -> Self {
        Self { x, y }
    }
}

/// Panel width and height.
#[derive(Debug, Clone, Copy, PartialEq)]
pub struct Size {
    pub width: f64,
    pub height: f64,
}

impl Size {
    #[must_use]
    pub fn new(width: f64, height: f64) -> Self {
        Self { width, height }
    }
}

impl Default for Size {
    fn default() -> Self {
        Self { width: DEFAULT_WIDTH_PX, height: DEFAULT_HEIGHT_PX }
    }
}

/// The panel's on-screen bounding box as reported by the host at
/// pointer-down time.
#[derive(Debug, Clone, Copy, PartialEq)]
pub struct Rect {
    pub x: f64,
    pub y: f64,
    pub width: f64,
    pub height: f64,
}

impl Rect {
    #[must_use]
    pub fn new(x: f64, y: f64, width: f64, height: f64) -> Self {
        Self { x, y, width, height }
    }

    #[must_use]
    pub fn origin(&self) -> Point {
        Point::new(self.x, self.y)
    }
}

/// Inner size of the browser window (or terminal stand-in).
#[derive(Debug, Clone, Copy, PartialEq)]
pub struct Viewport {
    pub width: f64,
    pub height: f64,
}

impl Viewport {
    #[must_use]
    pub fn new(width: f64, height: f64) -> Self {
        Self { width, height }
    }

    /// Clamp a top-left corner into the margin band on every side.
    #[must_use]
    pub fn clamp_position(&self, p: Point) -> Point {
        Point {
            x: clamp_axis(p.x, self.width),
            y: clamp_axis(p.y, self.height),
        }
    }

    /// Largest size a resize may produce in this viewport.
    #[must_use]
    pub fn max_size(&self) -> Size {
        Size {
            width: (self.width - MAX_SIDE_INSET_PX).min(MAX_SIDE_PX),
            height: (self.height - MAX_SIDE_INSET_PX).min(MAX_SIDE_PX),
        }
    }

    /// Clamp a size into `[MIN, max_size()]`. The upper bound wins when the
    /// viewport is too small to honour both.
    #[must_use]
    pub fn clamp_size(&self, s: Size) -> Size {
        let max = self.max_size();
        Size {
            width: s.width.max(MIN_WIDTH_PX).min(max.width),
            height: s.height.max(MIN_HEIGHT_PX).min(max.height),
        }
    }
}

/// `max(margin, min(v, extent - margin))`: the lower bound wins on a
/// viewport narrower than twice the margin.
fn clamp_axis(v: f64, extent: f64) -> f64 {
    v.min(extent - VIEWPORT_MARGIN_PX).max(VIEWPORT_MARGIN_PX)
}

/// Whether a clamped position sits close enough to the corner to dock.
#[must_use]
pub fn within_dock_zone(p: Point) -> bool {
    p.x <= DOCK_THRESHOLD_PX && p.y <= DOCK_THRESHOLD_PX
}

/// How the panel is presented.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Default)]
pub enum DisplayMode {
    /// Free-floating widget; drag and resize handles are live.
    #[default]
    Floating,
    /// Covers the viewport; drag and resize are disabled.
    Fullscreen,
}

/// Everything the shell needs to place the panel.
#[derive(Debug, Clone, Copy, PartialEq, Default)]
pub struct PanelGeometry {
    /// Explicit top-left corner, or `None` while the stylesheet's default
    /// placement applies. Becomes `Some` once a drag or resize moves it.
    pub position: Option<Point>,
    pub size: Size,
    /// Docked/enlarged visual mode, entered by dragging into the corner.
    pub docked_top_left: bool,
    pub mode: DisplayMode,
}

impl PanelGeometry {
    /// Where the shell should draw the top-left corner.
    ///
    /// Fullscreen and unset positions yield `None`; a docked panel is pinned
    /// at [`DOCKED_INSET_PX`].
    #[must_use]
    pub fn rendered_origin(&self) -> Option<Point> {
        if self.mode == DisplayMode::Fullscreen {
            return None;
        }
        let pos = self.position?;
        if self.docked_top_left {
            Some(Point::new(DOCKED_INSET_PX, DOCKED_INSET_PX))
        } else {
            Some(pos)
        }
    }

    #[must_use]
    pub fn is_fullscreen(&self) -> bool {
        self.mode == DisplayMode::Fullscreen
    }
}
