//=========================================================================
// Mouse
//=========================================================================
//
// Cursor control and mouse signals.
//
// Like the keyboard, the mouse holds only its signals; visibility and
// position are read from the platform on demand.
//
//=========================================================================

//=== External Crates =====================================================

use glam::IVec2;
use log::debug;

//=== Internal Imports ====================================================

use super::event::{EventCategory, MouseButton, PlatformEvent};
use crate::core::signal::Signal;
use crate::core::window::Window;
use crate::engine::router::EventSink;
use crate::platform::SharedPlatform;

//=== Mouse ===============================================================

/// Mouse component.
pub struct Mouse {
    platform: SharedPlatform,
    button_down: Signal<(MouseButton, IVec2)>,
    button_up: Signal<(MouseButton, IVec2)>,
    moved: Signal<(IVec2, IVec2)>,
    wheel: Signal<IVec2>,
}

impl Mouse {
    pub fn new(platform: SharedPlatform) -> Self {
        Self {
            platform,
            button_down: Signal::new(),
            button_up: Signal::new(),
            moved: Signal::new(),
            wheel: Signal::new(),
        }
    }

    //--- Cursor -----------------------------------------------------------

    /// Shows or hides the cursor.
    ///
    /// A hidden cursor also switches to relative mode: motion events keep
    /// arriving (as deltas) even at the window edge.
    pub fn set_cursor_visible(&self, visible: bool) {
        let mut platform = self.platform.borrow_mut();
        platform.set_cursor_visible(visible);
        platform.set_relative_mouse_mode(!visible);
        debug!(target: "mouse", "Cursor {}", if visible { "shown" } else { "hidden" });
    }

    pub fn is_cursor_visible(&self) -> bool {
        self.platform.borrow().is_cursor_visible()
    }

    /// Cursor position in window pixels.
    pub fn cursor_position(&self) -> IVec2 {
        self.platform.borrow().cursor_position()
    }

    /// Warps the cursor inside `window`. No motion event is emitted.
    pub fn move_cursor(&self, window: &Window, position: IVec2) {
        if let Some(handle) = window.native_window() {
            self.platform.borrow_mut().warp_cursor(handle, position);
        }
    }

    //--- Signals ----------------------------------------------------------

    /// Emitted with the button and the cursor position at press time.
    pub fn on_button_down(&self) -> &Signal<(MouseButton, IVec2)> {
        &self.button_down
    }

    pub fn on_button_up(&self) -> &Signal<(MouseButton, IVec2)> {
        &self.button_up
    }

    /// Emitted with `(position, relative)`.
    pub fn on_move(&self) -> &Signal<(IVec2, IVec2)> {
        &self.moved
    }

    /// Emitted with the scroll amount in lines (y > 0 scrolls away from
    /// the user).
    pub fn on_wheel(&self) -> &Signal<IVec2> {
        &self.wheel
    }
}

//=== Event Handling ======================================================

impl EventSink for Mouse {
    fn handles(category: EventCategory) -> bool {
        matches!(
            category,
            EventCategory::MouseButtonDown
                | EventCategory::MouseButtonUp
                | EventCategory::MouseMotion
                | EventCategory::MouseWheel
        )
    }

    fn handle_event(&self, event: &PlatformEvent) {
        match event {
            PlatformEvent::MouseButtonDown { button, position } => {
                self.button_down.emit(&(*button, *position));
            }
            PlatformEvent::MouseButtonUp { button, position } => {
                self.button_up.emit(&(*button, *position));
            }
            PlatformEvent::MouseMotion { position, relative } => {
                self.moved.emit(&(*position, *relative));
            }
            PlatformEvent::MouseWheel { delta } => {
                self.wheel.emit(delta);
            }
            other => crate::fail!("Mouse cannot handle {:?}", other.category()),
        }
    }
}

//=========================================================================
// Unit Tests
//=========================================================================
