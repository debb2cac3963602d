//=========================================================================
// Event Router
//
// Classifies polled platform events and names the component that
// consumes each category.
//
// ```text
//   Quit                                        ─> Stop
//   WindowResized | WindowSizeChanged | Close   ─> Window
//   KeyDown | KeyUp | TextInput | TextEditing   ─> Keyboard
//   MouseButtonDown | Up | MouseMotion | Wheel  ─> Mouse
//   anything else                               ─> Ignore
// ```
//
// Routing is a pure function of the category; the engine performs the
// dispatch and skips targets that do not exist (keyboard or mouse turned
// off).
//
//=========================================================================

//=== Internal Imports ====================================================

use crate::core::input::event::{EventCategory, PlatformEvent};

//=== EventSink ===========================================================

/// Receiver side of the router.
///
/// `handles` declares the categories a component accepts. Routing an
/// event whose category it does not declare is a programming error and
/// `handle_event` fails fatally on it.
pub(crate) trait EventSink {
    fn handles(category: EventCategory) -> bool;

    fn handle_event(&self, event: &PlatformEvent);
}

//=== Route ===============================================================

/// Destination of one event category.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub(crate) enum Route {
    Stop,
    Window,
    Keyboard,
    Mouse,
    Ignore,
}

pub(crate) fn route(category: EventCategory) -> Route {
    use EventCategory::*;

    match category {
        Quit => Route::Stop,
        WindowResized | WindowSizeChanged | WindowClose => Route::Window,
        KeyDown | KeyUp | TextInput | TextEditing => Route::Keyboard,
        MouseButtonDown | MouseButtonUp | MouseMotion | MouseWheel => Route::Mouse,
        WindowOther | Other => Route::Ignore,
    }
}

//=========================================================================
// Unit Tests
//=========================================================================
