//! Spatial interaction engine for the floating chat panel.
//!
//! Pure state machine with no browser dependencies: the shell translates DOM
//! pointer and resize events into calls on [`controller::PanelController`]
//! and applies the returned [`controller::Action`]s.
//!
//! ## Module layout
//!
//! | Module | Role |
//! |--------|------|
//! | [`controller`] | Gesture handling, clamping and docking |
//! | [`geometry`] | Points, sizes, viewport clamps, display mode |
//! | [`input`] | Pointer targets, resize handles, gesture state |
//! | [`consts`] | Margins, thresholds and size limits |

pub mod consts;
pub mod controller;
pub mod geometry;
pub mod input;

pub use controller::{Action, PanelController};
pub use geometry::{DisplayMode, PanelGeometry, Point, Rect, Size, Viewport};
pub use input::{InteractionState, PointerTarget, ResizeHandle};
