//! Panel interaction controller.
//!
//! DESIGN
//! ======
//! `PanelController` owns the geometry and the gesture state. The host feeds
//! it pointer and viewport events and applies the returned [`Action`]s; the
//! controller never touches the DOM. `CaptureGlobalPointer` asks the host to
//! start listening for window-level move/up events and
//! `ReleaseGlobalPointer` to stop, so those listeners exist only while a
//! gesture is active.
//!
//! Transition table (fullscreen blocks every pointer-down):
//!
//! | State      | Event                  | Next       |
//! |------------|------------------------|------------|
//! | Idle       | down on header         | Dragging   |
//! | Idle       | down on corner handle  | Resizing   |
//! | Dragging   | move                   | Dragging   |
//! | Resizing   | move                   | Resizing   |
//! | any        | up                     | Idle       |

#[cfg(test)]
#[path = "controller_test.rs"]
mod controller_test;

use crate::geometry::{
    DisplayMode, PanelGeometry, Point, Rect, Size, Viewport, within_dock_zone,
};
use crate::input::{InteractionState, PointerTarget, ResizeHandle};

/// Cursor shown while dragging by the header.
pub const DRAG_CURSOR: &str = "grabbing";

/// Side effects the host applies after each event.
#[derive(Debug, Clone, PartialEq)]
pub enum Action {
    /// Install window-level pointer move/up listeners.
    CaptureGlobalPointer,
    /// Remove the listeners installed for the last capture.
    ReleaseGlobalPointer,
    /// Re-render with the new geometry.
    GeometryChanged(PanelGeometry),
    /// The docked flag flipped.
    DockChanged(bool),
    /// Change the document cursor; empty restores the default.
    SetCursor(String),
}

/// Drag/resize/dock state machine for the floating chat panel.
#[derive(Debug, Clone)]
pub struct PanelController {
    geometry: PanelGeometry,
    state: InteractionState,
    viewport: Viewport,
}

impl PanelController {
    #[must_use]
    pub fn new(viewport: Viewport) -> Self {
        Self { geometry: PanelGeometry::default(), state: InteractionState::Idle, viewport }
    }

    #[must_use]
    pub fn geometry(&self) -> &PanelGeometry {
        &self.geometry
    }

    #[must_use]
    pub fn state(&self) -> &InteractionState {
        &self.state
    }

    #[must_use]
    pub fn viewport(&self) -> Viewport {
        self.viewport
    }

    // --- Pointer events ---

    /// Begin a drag or resize. `rect` is the panel's rendered bounding box.
    pub fn on_pointer_down(&mut self, target: PointerTarget, pointer: Point, rect: Rect) -> Vec<Action> {
        if self.geometry.mode == DisplayMode::Fullscreen || !self.state.is_idle() {
            return Vec::new();
        }

        match target {
            PointerTarget::Header => {
                self.state = InteractionState::Dragging {
                    offset: Point::new(pointer.x - rect.x, pointer.y - rect.y),
                };
                vec![Action::CaptureGlobalPointer, Action::SetCursor(DRAG_CURSOR.to_owned())]
            }
            PointerTarget::Handle(handle) => {
                self.state = InteractionState::Resizing {
                    handle,
                    start: pointer,
                    orig_x: rect.x,
                    orig_y: rect.y,
                    orig_w: rect.width,
                    orig_h: rect.height,
                };
                // Pin the panel where it is drawn so the first move has an
                // explicit origin to work from.
                self.geometry.position = Some(rect.origin());
                vec![
                    Action::CaptureGlobalPointer,
                    Action::SetCursor(handle.cursor().to_owned()),
                    Action::GeometryChanged(self.geometry),
                ]
            }
            PointerTarget::Body => Vec::new(),
        }
    }

    pub fn on_pointer_move(&mut self, pointer: Point) -> Vec<Action> {
        match self.state {
            InteractionState::Idle => Vec::new(),
            InteractionState::Dragging { offset } => self.drag_to(pointer, offset),
            InteractionState::Resizing { handle, start, orig_x, orig_y, orig_w, orig_h } => {
                let dx = pointer.x - start.x;
                let dy = pointer.y - start.y;
                let (x, y, size) = resize_from(handle, dx, dy, orig_x, orig_y, Size::new(orig_w, orig_h));
                self.geometry.size = self.viewport.clamp_size(size);
                self.geometry.position = Some(self.viewport.clamp_position(Point::new(x, y)));
                vec![Action::GeometryChanged(self.geometry)]
            }
        }
    }

    pub fn on_pointer_up(&mut self) -> Vec<Action> {
        if self.state.is_idle() {
            return Vec::new();
        }
        self.state = InteractionState::Idle;
        vec![Action::ReleaseGlobalPointer, Action::SetCursor(String::new())]
    }

    // --- Host events ---

    /// Record a new viewport and pull an explicit position back inside it.
    pub fn set_viewport(&mut self, viewport: Viewport) -> Vec<Action> {
        self.viewport = viewport;
        let Some(pos) = self.geometry.position else {
            return Vec::new();
        };
        let clamped = viewport.clamp_position(pos);
        if clamped == pos {
            return Vec::new();
        }
        self.geometry.position = Some(clamped);
        vec![Action::GeometryChanged(self.geometry)]
    }

    /// Switch display mode. Entering fullscreen abandons any gesture.
    pub fn set_display_mode(&mut self, mode: DisplayMode) -> Vec<Action> {
        if self.geometry.mode == mode {
            return Vec::new();
        }
        let mut actions = Vec::new();
        if mode == DisplayMode::Fullscreen {
            actions.extend(self.on_pointer_up());
        }
        self.geometry.mode = mode;
        actions.push(Action::GeometryChanged(self.geometry));
        actions
    }

    fn drag_to(&mut self, pointer: Point, offset: Point) -> Vec<Action> {
        let next = self
            .viewport
            .clamp_position(Point::new(pointer.x - offset.x, pointer.y - offset.y));
        self.geometry.position = Some(next);

        let mut actions = Vec::with_capacity(2);
        let docked = within_dock_zone(next);
        if docked != self.geometry.docked_top_left {
            self.geometry.docked_top_left = docked;
            actions.push(Action::DockChanged(docked));
        }
        actions.push(Action::GeometryChanged(self.geometry));
        actions
    }
}

/// Apply a pointer delta to the gesture-origin box for one handle.
///
/// Returns the unclamped `(x, y, size)`.
#[must_use]
pub fn resize_from(handle: ResizeHandle, dx: f64, dy: f64, x: f64, y: f64, orig: Size) -> (f64, f64, Size) {
    let (width, x) = if handle.anchors_left() { (orig.width - dx, x + dx) } else { (orig.width + dx, x) };
    let (height, y) = if handle.anchors_top() { (orig.height - dy, y + dy) } else { (orig.height + dy, y) };
    (x, y, Size::new(width, height))
}
