//! Window-level pointer listeners for an in-progress panel gesture.
//!
//! SYSTEM CONTEXT
//! ==============
//! The panel controller asks for global pointer capture when a drag or resize
//! starts and releases it on pointer-up. Listeners exist only between those
//! two actions, so nothing stays attached to `window` while the panel idles.

use leptos::prelude::*;
use wasm_bindgen::JsCast;
use wasm_bindgen::closure::Closure;
use web_sys::PointerEvent;

type PointerCallback = Closure<dyn FnMut(PointerEvent)>;

/// Attached `pointermove`/`pointerup` listeners. Detaching is explicit; the
/// closures must outlive the event that triggers the release.
pub struct GlobalPointer {
    window: web_sys::Window,
    on_move: PointerCallback,
    on_up: PointerCallback,
}

impl GlobalPointer {
    /// Attach both listeners to `window`.
    pub fn install(
        on_move: impl FnMut(PointerEvent) + 'static,
        on_up: impl FnMut(PointerEvent) + 'static,
    ) -> Option<Self> {
        let window = web_sys::window()?;
        let pointer = Self {
            window,
            on_move: Closure::wrap(Box::new(on_move) as Box<dyn FnMut(PointerEvent)>),
            on_up: Closure::wrap(Box::new(on_up) as Box<dyn FnMut(PointerEvent)>),
        };
        let _ = pointer
            .window
            .add_event_listener_with_callback("pointermove", pointer.on_move.as_ref().unchecked_ref());
        let _ = pointer
            .window
            .add_event_listener_with_callback("pointerup", pointer.on_up.as_ref().unchecked_ref());
        let _ = pointer
            .window
            .add_event_listener_with_callback("pointercancel", pointer.on_up.as_ref().unchecked_ref());
        Some(pointer)
    }

    fn detach(&self) {
        let _ = self
            .window
            .remove_event_listener_with_callback("pointermove", self.on_move.as_ref().unchecked_ref());
        let _ = self
            .window
            .remove_event_listener_with_callback("pointerup", self.on_up.as_ref().unchecked_ref());
        let _ = self
            .window
            .remove_event_listener_with_callback("pointercancel", self.on_up.as_ref().unchecked_ref());
    }
}

/// Slot holding the active capture, if any.
pub type CaptureSlot = StoredValue<Option<GlobalPointer>, LocalStorage>;

/// Detach and drop the capture in `slot`.
///
/// Release usually runs inside the `pointerup` callback itself, so the
/// closures are dropped on the next task instead of mid-call.
pub fn release(slot: CaptureSlot) {
    let Some(pointer) = slot.try_update_value(Option::take).flatten() else {
        return;
    };
    pointer.detach();
    leptos::task::spawn_local(async move {
        drop(pointer);
    });
}

/// Replace whatever capture `slot` holds with `pointer`.
pub fn capture(slot: CaptureSlot, pointer: Option<GlobalPointer>) {
    release(slot);
    slot.set_value(pointer);
}

/// Cursor for the whole document while a gesture runs; empty restores it.
pub fn set_document_cursor(cursor: &str) {
    let body = web_sys::window().and_then(|w| w.document()).and_then(|d| d.body());
    if let Some(body) = body {
        let _ = body.style().set_property("cursor", cursor);
    }
}
