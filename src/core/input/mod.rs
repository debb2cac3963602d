//=========================================================================
// Input
//
// Keyboard and mouse components plus the event and key types they share.
//
// Event flow:
// ```text
//   Platform::poll_event() ─> PlatformEvent ─> router ─┬─> Keyboard ─> key/text signals
//                                                      └─> Mouse    ─> button/move/wheel signals
// ```
//
// Neither component caches input state: queries such as
// `Keyboard::is_pressed` and `Mouse::cursor_position` go to the platform
// every time.
//
//=========================================================================

//=== Submodules ==========================================================

pub mod event;
pub mod key;
mod keyboard;
mod mouse;

//=== Re-exports ==========================================================

pub use event::{EventCategory, MouseButton, PlatformEvent, WindowEventKind};
pub use key::{Key, Modifiers, KEY_STATE_LEN};
pub use keyboard::Keyboard;
pub use mouse::Mouse;
