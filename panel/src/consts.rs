//! Shared numeric constants for the panel crate.

// ── Viewport ────────────────────────────────────────────────────

/// Gap in CSS pixels the panel's top-left corner keeps from every viewport edge.
pub const VIEWPORT_MARGIN_PX: f64 = 8.0;

/// A dragged panel docks when both coordinates are at or below this value.
pub const DOCK_THRESHOLD_PX: f64 = 30.0;

/// Rendered inset of a docked panel from the top-left corner.
pub const DOCKED_INSET_PX: f64 = 16.0;

// ── Size limits ─────────────────────────────────────────────────

/// Smallest width a resize may produce.
pub const MIN_WIDTH_PX: f64 = 300.0;

/// Smallest height a resize may produce.
pub const MIN_HEIGHT_PX: f64 = 320.0;

/// Hard cap on either dimension regardless of viewport size.
pub const MAX_SIDE_PX: f64 = 900.0;

/// Amount subtracted from the viewport before applying [`MAX_SIDE_PX`].
pub const MAX_SIDE_INSET_PX: f64 = 32.0;

/// Width of a panel that has never been resized.
pub const DEFAULT_WIDTH_PX: f64 = 380.0;

/// Height of a panel that has never been resized.
pub const DEFAULT_HEIGHT_PX: f64 = 500.0;
