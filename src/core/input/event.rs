//=========================================================================
// Platform Event Types
//
// Engine-level representation of the events a platform backend polls.
//
// Every backend (winit, headless) converts its native events into
// `PlatformEvent` before the engine sees them. The router in
// `engine::router` only looks at `PlatformEvent::category()`.
//
// Event Flow:
// ```text
// Platform backend (winit / headless)
//         ↓ poll_event()
//    PlatformEvent (this module)
//         ↓ category()
//    Engine router
//         ↓
//    Window / Keyboard / Mouse ──> signals
// ```
//
//=========================================================================

//=== External Crates =====================================================

use glam::{IVec2, UVec2};

//=== Internal Imports ====================================================

use super::key::{Key, Modifiers};
use crate::platform::WindowHandle;

//=== MouseButton =========================================================

/// Physical mouse button identifier.
///
/// Numbering follows the platform convention 1 = left, 2 = middle,
/// 3 = right, 4 = back, 5 = forward; see [`MouseButton::from_index`].
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub enum MouseButton {
    Left,
    Middle,
    Right,
    /// Side button, usually "back" (button 4).
    Back,
    /// Side button, usually "forward" (button 5).
    Forward,
    /// Any other button, by platform index.
    Other(u16),
}

impl MouseButton {
    pub fn from_index(index: u16) -> Self {
        match index {
            1 => Self::Left,
            2 => Self::Middle,
            3 => Self::Right,
            4 => Self::Back,
            5 => Self::Forward,
            other => Self::Other(other),
        }
    }

    pub fn index(self) -> u16 {
        match self {
            Self::Left => 1,
            Self::Middle => 2,
            Self::Right => 3,
            Self::Back => 4,
            Self::Forward => 5,
            Self::Other(index) => index,
        }
    }
}

//=== WindowEventKind =====================================================

/// Window-level notifications.
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum WindowEventKind {
    /// The user resized the window.
    Resized(UVec2),

    /// The size changed for any reason (user, program, display change).
    SizeChanged(UVec2),

    /// Close requested (title bar button, Alt+F4, ...).
    Close,

    /// Focus, move, expose and similar notifications the engine does not
    /// route.
    Other,
}

//=== PlatformEvent =======================================================

/// One event as delivered by [`Platform::poll_event`](crate::platform::Platform::poll_event).
#[derive(Debug, Clone, PartialEq)]
pub enum PlatformEvent {
    /// Application quit requested (last window closed, OS shutdown).
    Quit,

    /// Notification for one native window.
    Window {
        window: WindowHandle,
        kind: WindowEventKind,
    },

    /// Key pressed (or auto-repeated when `repeat` is set).
    KeyDown {
        key: Key,
        modifiers: Modifiers,
        repeat: bool,
    },

    /// Key released.
    KeyUp { key: Key, modifiers: Modifiers },

    /// Committed text input (already composed, UTF-8).
    TextInput(String),

    /// In-progress IME composition.
    TextEditing {
        text: String,
        cursor: Option<(usize, usize)>,
    },

    /// Mouse button pressed at `position` (window pixels, top-left origin).
    MouseButtonDown { button: MouseButton, position: IVec2 },

    /// Mouse button released at `position`.
    MouseButtonUp { button: MouseButton, position: IVec2 },

    /// Cursor moved. `relative` is the delta since the previous motion
    /// event; in relative mouse mode `position` stays put.
    MouseMotion { position: IVec2, relative: IVec2 },

    /// Wheel scrolled, in whole lines (x = horizontal, y = vertical).
    MouseWheel { delta: IVec2 },

    /// Anything else the backend saw. Routed nowhere.
    Other(&'static str),
}

impl PlatformEvent {
    /// Classifies the event for routing.
    pub fn category(&self) -> EventCategory {
        match self {
            Self::Quit => EventCategory::Quit,
            Self::Window { kind, .. } => match kind {
                WindowEventKind::Resized(_) => EventCategory::WindowResized,
                WindowEventKind::SizeChanged(_) => EventCategory::WindowSizeChanged,
                WindowEventKind::Close => EventCategory::WindowClose,
                WindowEventKind::Other => EventCategory::WindowOther,
            },
            Self::KeyDown { .. } => EventCategory::KeyDown,
            Self::KeyUp { .. } => EventCategory::KeyUp,
            Self::TextInput(_) => EventCategory::TextInput,
            Self::TextEditing { .. } => EventCategory::TextEditing,
            Self::MouseButtonDown { .. } => EventCategory::MouseButtonDown,
            Self::MouseButtonUp { .. } => EventCategory::MouseButtonUp,
            Self::MouseMotion { .. } => EventCategory::MouseMotion,
            Self::MouseWheel { .. } => EventCategory::MouseWheel,
            Self::Other(_) => EventCategory::Other,
        }
    }
}

//=== EventCategory =======================================================

/// Payload-free event classification used by the router.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub enum EventCategory {
    Quit,
    WindowResized,
    WindowSizeChanged,
    WindowClose,
    WindowOther,
    KeyDown,
    KeyUp,
    TextInput,
    TextEditing,
    MouseButtonDown,
    MouseButtonUp,
    MouseMotion,
    MouseWheel,
    Other,
}

impl EventCategory {
    /// Every category, for exhaustive routing checks.
    pub const ALL: [EventCategory; 14] = [
        Self::Quit,
        Self::WindowResized,
        Self::WindowSizeChanged,
        Self::WindowClose,
        Self::WindowOther,
        Self::KeyDown,
        Self::KeyUp,
        Self::TextInput,
        Self::TextEditing,
        Self::MouseButtonDown,
        Self::MouseButtonUp,
        Self::MouseMotion,
        Self::MouseWheel,
        Self::Other,
    ];
}

//=========================================================================
// Unit Tests
//=========================================================================

#[cfg(test)]
mod tests {
    use super::*;

    fn handle() -> WindowHandle {
        WindowHandle::from_raw(1)
    }

    #[test]
    fn mouse_button_index_round_trip() {
        for index in 1..=8 {
            assert_eq!(MouseButton::from_index(index).index(), index);
        }
        assert_eq!(MouseButton::from_index(1), MouseButton::Left);
        assert_eq!(MouseButton::from_index(2), MouseButton::Middle);
        assert_eq!(MouseButton::from_index(3), MouseButton::Right);
        assert_eq!(MouseButton::from_index(9), MouseButton::Other(9));
    }

    #[test]
    fn window_events_categorize_by_kind() {
        let size = UVec2::new(10, 20);
        let cases = [
            (WindowEventKind::Resized(size), EventCategory::WindowResized),
            (WindowEventKind::SizeChanged(size), EventCategory::WindowSizeChanged),
            (WindowEventKind::Close, EventCategory::WindowClose),
            (WindowEventKind::Other, EventCategory::WindowOther),
        ];
        for (kind, expected) in cases {
            let event = PlatformEvent::Window { window: handle(), kind };
            assert_eq!(event.category(), expected);
        }
    }

    #[test]
    fn input_events_categorize() {
        let key_down = PlatformEvent::KeyDown {
            key: Key::KeyA,
            modifiers: Modifiers::NONE,
            repeat: false,
        };
        assert_eq!(key_down.category(), EventCategory::KeyDown);
        assert_eq!(
            PlatformEvent::TextInput("x".into()).category(),
            EventCategory::TextInput
        );
        assert_eq!(
            PlatformEvent::MouseWheel { delta: IVec2::Y }.category(),
            EventCategory::MouseWheel
        );
        assert_eq!(PlatformEvent::Other("Focused").category(), EventCategory::Other);
        assert_eq!(PlatformEvent::Quit.category(), EventCategory::Quit);
    }

    #[test]
    fn all_lists_each_category_once() {
        let unique: std::collections::HashSet<_> = EventCategory::ALL.iter().collect();
        assert_eq!(unique.len(), EventCategory::ALL.len());
    }
}
