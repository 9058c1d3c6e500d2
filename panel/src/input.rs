//! Input model: pointer targets, resize handles, and the gesture state machine.
//!
//! `PointerTarget` names the part of the panel a pointer-down landed on.
//! `InteractionState` is the gesture being tracked between pointer-down and
//! pointer-up, carrying the context captured at pointer-down so each move is
//! computed from the gesture origin rather than accumulated deltas.

#[cfg(test)]
#[path = "input_test.rs"]
mod input_test;

use crate::geometry::Point;

/// One of the four invisible corner handles.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum ResizeHandle {
    TopLeft,
    TopRight,
    BottomLeft,
    BottomRight,
}

impl ResizeHandle {
    pub const ALL: [ResizeHandle; 4] =
        [Self::TopLeft, Self::TopRight, Self::BottomLeft, Self::BottomRight];

    /// Handle moves the left edge, so x shifts with the pointer.
    #[must_use]
    pub fn anchors_left(self) -> bool {
        matches!(self, Self::TopLeft | Self::BottomLeft)
    }

    /// Handle moves the top edge, so y shifts with the pointer.
    #[must_use]
    pub fn anchors_top(self) -> bool {
        matches!(self, Self::TopLeft | Self::TopRight)
    }

    /// CSS cursor shown while hovering or dragging this handle.
    #[must_use]
    pub fn cursor(self) -> &'static str {
        match self {
            Self::TopLeft | Self::BottomRight => "nwse-resize",
            Self::TopRight | Self::BottomLeft => "nesw-resize",
        }
    }

    /// Short DOM class suffix (`tl`, `tr`, `bl`, `br`).
    #[must_use]
    pub fn class_suffix(self) -> &'static str {
        match self {
            Self::TopLeft => "tl",
            Self::TopRight => "tr",
            Self::BottomLeft => "bl",
            Self::BottomRight => "br",
        }
    }
}

/// Where a pointer-down landed.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum PointerTarget {
    /// The title bar; starts a drag.
    Header,
    /// A corner handle; starts a resize.
    Handle(ResizeHandle),
    /// Anywhere else on the panel; ignored.
    Body,
}

/// The active gesture.
///
/// Dragging and resizing are separate variants, so both can never be active.
#[derive(Debug, Clone, Copy, PartialEq, Default)]
pub enum InteractionState {
    /// No gesture in progress; waiting for the next pointer-down.
    #[default]
    Idle,
    /// The user is moving the panel by its header.
    Dragging {
        /// Pointer position minus the panel's top-left at pointer-down.
        offset: Point,
    },
    /// The user is resizing from a corner handle.
    Resizing {
        /// Which corner is being dragged.
        handle: ResizeHandle,
        /// Pointer position at the start of the resize.
        start: Point,
        /// Panel x at the start of the resize.
        orig_x: f64,
        /// Panel y at the start of the resize.
        orig_y: f64,
        /// Panel width at the start of the resize.
        orig_w: f64,
        /// Panel height at the start of the resize.
        orig_h: f64,
    },
}

impl InteractionState {
    #[must_use]
    pub fn is_idle(&self) -> bool {
        matches!(self, Self::Idle)
    }
}
