//! Inline placement for the floating panel.
//!
//! DESIGN
//! ======
//! The stylesheet owns the default bottom-right placement, the docked
//! enlargement and fullscreen. Inline style is emitted only once a gesture has
//! given the panel an explicit position or size.

#[cfg(test)]
#[path = "panel_layout_test.rs"]
mod panel_layout_test;

use panel::{PanelGeometry, Viewport};

/// Viewport used when no window is available.
pub const FALLBACK_VIEWPORT: (f64, f64) = (1280.0, 800.0);

/// Current window inner size.
pub fn current_viewport() -> Viewport {
    #[cfg(feature = "hydrate")]
    {
        if let Some(window) = web_sys::window() {
            let width = window.inner_width().ok().and_then(|v| v.as_f64());
            let height = window.inner_height().ok().and_then(|v| v.as_f64());
            if let (Some(width), Some(height)) = (width, height) {
                return Viewport::new(width, height);
            }
        }
    }
    Viewport::new(FALLBACK_VIEWPORT.0, FALLBACK_VIEWPORT.1)
}

/// Inline `style` for the panel root.
pub fn panel_style(geometry: &PanelGeometry) -> String {
    if geometry.is_fullscreen() {
        return String::new();
    }
    let Some(origin) = geometry.rendered_origin() else {
        if geometry.size == panel::Size::default() {
            return String::new();
        }
        return format!("width: {}px; height: {}px;", geometry.size.width, geometry.size.height);
    };
    let place = format!("left: {}px; top: {}px; right: auto; bottom: auto;", origin.x, origin.y);
    if geometry.docked_top_left {
        return place;
    }
    format!("{place} width: {}px; height: {}px;", geometry.size.width, geometry.size.height)
}
