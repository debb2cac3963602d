//=========================================================================
// Keyboard
//=========================================================================
//
// Key-state queries and keyboard signals.
//
// The keyboard keeps no state of its own: `is_pressed` reads the
// platform's key-state array on every call, and routed events are
// re-published through three signals.
//
//=========================================================================

//=== External Crates =====================================================

use log::debug;

//=== Internal Imports ====================================================

use super::event::{EventCategory, PlatformEvent};
use super::key::{Key, Modifiers};
use crate::core::signal::Signal;
use crate::engine::router::EventSink;
use crate::platform::SharedPlatform;

//=== Keyboard ============================================================

/// Keyboard component.
///
/// # Examples
///
/// ```
/// use rime_engine::core::input::{Key, Keyboard};
/// use rime_engine::platform::{shared, HeadlessPlatform};
///
/// let keyboard = Keyboard::new(shared(HeadlessPlatform::new()));
/// keyboard.on_key_down().connect(|(modifiers, key)| {
///     println!("{:?} + {}", modifiers, key);
/// });
/// assert!(!keyboard.is_pressed(Key::Space));
/// ```
pub struct Keyboard {
    platform: SharedPlatform,
    key_down: Signal<(Modifiers, Key)>,
    key_up: Signal<(Modifiers, Key)>,
    text: Signal<str>,
}

impl Keyboard {
    pub fn new(platform: SharedPlatform) -> Self {
        Self {
            platform,
            key_down: Signal::new(),
            key_up: Signal::new(),
            text: Signal::new(),
        }
    }

    /// Whether `key` is currently held, as reported by the platform.
    pub fn is_pressed(&self, key: Key) -> bool {
        let platform = self.platform.borrow();
        let state = platform.key_state();
        let index = key.scancode() as usize;
        crate::check!(index < state.len(), "scancode {} outside key state", index);
        state[index]
    }

    //--- Signals ----------------------------------------------------------

    /// Emitted for every key press, including auto-repeat.
    pub fn on_key_down(&self) -> &Signal<(Modifiers, Key)> {
        &self.key_down
    }

    pub fn on_key_up(&self) -> &Signal<(Modifiers, Key)> {
        &self.key_up
    }

    /// Emitted with committed text input (UTF-8).
    pub fn on_text(&self) -> &Signal<str> {
        &self.text
    }
}

//=== Event Handling ======================================================

impl EventSink for Keyboard {
    fn handles(category: EventCategory) -> bool {
        matches!(
            category,
            EventCategory::KeyDown
                | EventCategory::KeyUp
                | EventCategory::TextInput
                | EventCategory::TextEditing
        )
    }

    fn handle_event(&self, event: &PlatformEvent) {
        match event {
            PlatformEvent::KeyDown { key, modifiers, .. } => {
                self.key_down.emit(&(*modifiers, *key));
            }
            PlatformEvent::KeyUp { key, modifiers } => {
                self.key_up.emit(&(*modifiers, *key));
            }
            PlatformEvent::TextInput(text) => {
                self.text.emit(text.as_str());
            }
            PlatformEvent::TextEditing { text, cursor } => {
                debug!(target: "keyboard", "Composition '{}' (cursor {:?})", text, cursor);
            }
            other => crate::fail!("Keyboard cannot handle {:?}", other.category()),
        }
    }
}

//=========================================================================
// Unit Tests
//=========================================================================
