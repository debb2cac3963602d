//=========================================================================
// Input Processor
//=========================================================================
//
// Converts Winit input events into engine `PlatformEvent`s.
//
// Architecture:
//   Winit WindowEvent → InputProcessor → PlatformEvent → event queue
//
// Stateful tracking:
// - Modifier state from `ModifiersChanged` is applied to all following key
//   events.
// - The last cursor position is kept so motion events carry a delta.
// - Pixel-precise wheel deltas (touchpads) are accumulated until they add
//   up to whole lines.
//
//=========================================================================

//=== External Dependencies ===============================================

use glam::{DVec2, IVec2};
use winit::{
    dpi::PhysicalPosition,
    event::{ElementState, KeyEvent, MouseButton as WinitMouseButton, MouseScrollDelta},
    keyboard::{KeyCode as WinitKeyCode, ModifiersState, PhysicalKey},
};

//=== Internal Dependencies ===============================================

use crate::core::input::event::{MouseButton, PlatformEvent};
use crate::core::input::key::{Key, Modifiers};

/// Pixels per wheel line for touchpad-style scroll deltas.
const PIXELS_PER_LINE: f64 = 20.0;

//=== InputProcessor ======================================================

/// Converts Winit events to engine events with stateful modifier, cursor
/// and scroll tracking.
pub(crate) struct InputProcessor {
    current_modifiers: Modifiers,
    cursor: IVec2,
    scroll_remainder: DVec2,
}

impl InputProcessor {
    //--- Construction -----------------------------------------------------

    pub(crate) fn new() -> Self {
        Self {
            current_modifiers: Modifiers::NONE,
            cursor: IVec2::ZERO,
            scroll_remainder: DVec2::ZERO,
        }
    }

    //--- State Management -------------------------------------------------

    /// Updates cached modifier state (applied to subsequent events).
    pub(crate) fn update_modifiers(&mut self, modifiers_state: ModifiersState) {
        self.current_modifiers = Modifiers::from(modifiers_state);
    }

    /// Last known cursor position in window pixels.
    pub(crate) fn cursor(&self) -> IVec2 {
        self.cursor
    }

    /// Overrides the tracked cursor (after a warp).
    pub(crate) fn set_cursor(&mut self, position: IVec2) {
        self.cursor = position;
    }

    //--- Keyboard ---------------------------------------------------------

    /// Converts a Winit key event. Keys without a scancode are dropped.
    pub(crate) fn process_key_event(&self, key_event: &KeyEvent) -> Option<PlatformEvent> {
        let key = match key_event.physical_key {
            PhysicalKey::Code(code) => Key::from(code),
            PhysicalKey::Unidentified(_) => return None,
        };

        if key == Key::Unidentified {
            return None;
        }

        Some(self.create_key_event(key, key_event.state, key_event.repeat))
    }

    /// Committed text carried by a key press, if any.
    ///
    /// Control characters (Enter, Backspace, Escape, ...) are not text.
    pub(crate) fn text_from_key_event(key_event: &KeyEvent) -> Option<PlatformEvent> {
        if key_event.state != ElementState::Pressed {
            return None;
        }
        let text = key_event.text.as_ref()?;
        text_input(text.as_str())
    }

    //--- Mouse ------------------------------------------------------------

    /// Converts a button press/release at the current cursor position.
    pub(crate) fn process_mouse_button(
        &self,
        button: WinitMouseButton,
        state: ElementState,
    ) -> PlatformEvent {
        let button = MouseButton::from(button);
        let position = self.cursor;

        match state {
            ElementState::Pressed => PlatformEvent::MouseButtonDown { button, position },
            ElementState::Released => PlatformEvent::MouseButtonUp { button, position },
        }
    }

    /// Converts an absolute cursor move. The delta is taken against the
    /// previous position.
    pub(crate) fn process_mouse_move(&mut self, position: PhysicalPosition<f64>) -> PlatformEvent {
        let position = IVec2::new(position.x.round() as i32, position.y.round() as i32);
        let relative = position - self.cursor;
        self.cursor = position;
        PlatformEvent::MouseMotion { position, relative }
    }

    /// Converts a raw device delta (relative mouse mode). The cursor stays
    /// where it is.
    pub(crate) fn process_raw_motion(&self, delta: (f64, f64)) -> Option<PlatformEvent> {
        let relative = IVec2::new(delta.0.round() as i32, delta.1.round() as i32);
        if relative == IVec2::ZERO {
            return None;
        }
        Some(PlatformEvent::MouseMotion {
            position: self.cursor,
            relative,
        })
    }

    /// Converts a scroll delta into whole lines. Returns `None` while a
    /// pixel delta is still below one line.
    pub(crate) fn process_wheel(&mut self, delta: MouseScrollDelta) -> Option<PlatformEvent> {
        let lines = match delta {
            MouseScrollDelta::LineDelta(x, y) => DVec2::new(x as f64, y as f64),
            MouseScrollDelta::PixelDelta(px) => {
                self.scroll_remainder += DVec2::new(px.x, px.y) / PIXELS_PER_LINE;
                let whole = self.scroll_remainder.trunc();
                self.scroll_remainder -= whole;
                whole
            }
        };

        let delta = lines.round().as_ivec2();
        if delta == IVec2::ZERO {
            return None;
        }
        Some(PlatformEvent::MouseWheel { delta })
    }

    //--- Internal Helpers -------------------------------------------------

    fn create_key_event(&self, key: Key, state: ElementState, repeat: bool) -> PlatformEvent {
        match state {
            ElementState::Pressed => PlatformEvent::KeyDown {
                key,
                modifiers: self.current_modifiers,
                repeat,
            },
            ElementState::Released => PlatformEvent::KeyUp {
                key,
                modifiers: self.current_modifiers,
            },
        }
    }
}

/// Wraps committed text, dropping empty strings and control characters.
pub(crate) fn text_input(text: &str) -> Option<PlatformEvent> {
    if text.is_empty() || text.chars().any(char::is_control) {
        return None;
    }
    Some(PlatformEvent::TextInput(text.to_owned()))
}

//=========================================================================
// Winit Conversions
//=========================================================================

/// Winit normalizes platform keys (Option → Alt); the Windows/Command key
/// is reported as `super`.
impl From<ModifiersState> for Modifiers {
    fn from(state: ModifiersState) -> Self {
        Self {
            shift: state.shift_key(),
            ctrl: state.control_key(),
            alt: state.alt_key(),
            meta: state.super_key(),
        }
    }
}

/// Maps Winit physical key codes onto scancodes.
///
/// Keys with no scancode equivalent (Fn, F25+, Hyper, ...) return
/// `Key::Unidentified`.
impl From<WinitKeyCode> for Key {
    fn from(code: WinitKeyCode) -> Self {
        use WinitKeyCode as W;
        match code {
            //--- Letters ------------------------------------------------------
            W::KeyA => Key::KeyA, W::KeyB => Key::KeyB, W::KeyC => Key::KeyC,
            W::KeyD => Key::KeyD, W::KeyE => Key::KeyE, W::KeyF => Key::KeyF,
            W::KeyG => Key::KeyG, W::KeyH => Key::KeyH, W::KeyI => Key::KeyI,
            W::KeyJ => Key::KeyJ, W::KeyK => Key::KeyK, W::KeyL => Key::KeyL,
            W::KeyM => Key::KeyM, W::KeyN => Key::KeyN, W::KeyO => Key::KeyO,
            W::KeyP => Key::KeyP, W::KeyQ => Key::KeyQ, W::KeyR => Key::KeyR,
            W::KeyS => Key::KeyS, W::KeyT => Key::KeyT, W::KeyU => Key::KeyU,
            W::KeyV => Key::KeyV, W::KeyW => Key::KeyW, W::KeyX => Key::KeyX,
            W::KeyY => Key::KeyY, W::KeyZ => Key::KeyZ,

            //--- Digits -------------------------------------------------------
            W::Digit0 => Key::Digit0, W::Digit1 => Key::Digit1,
            W::Digit2 => Key::Digit2, W::Digit3 => Key::Digit3,
            W::Digit4 => Key::Digit4, W::Digit5 => Key::Digit5,
            W::Digit6 => Key::Digit6, W::Digit7 => Key::Digit7,
            W::Digit8 => Key::Digit8, W::Digit9 => Key::Digit9,

            //--- Punctuation --------------------------------------------------
            W::Backquote => Key::Backquote,
            W::Backslash => Key::Backslash,
            W::BracketLeft => Key::BracketLeft,
            W::BracketRight => Key::BracketRight,
            W::Comma => Key::Comma,
            W::Equal => Key::Equal,
            W::Minus => Key::Minus,
            W::Period => Key::Period,
            W::Quote => Key::Quote,
            W::Semicolon => Key::Semicolon,
            W::Slash => Key::Slash,
            W::IntlBackslash => Key::NonUsBackslash,
            W::IntlRo => Key::International1,
            W::IntlYen => Key::International3,

            //--- Editing & Whitespace -----------------------------------------
            W::Enter => Key::Enter,
            W::Escape => Key::Escape,
            W::Backspace => Key::Backspace,
            W::Tab => Key::Tab,
            W::Space => Key::Space,
            W::CapsLock => Key::CapsLock,
            W::ContextMenu => Key::Application,

            //--- Modifiers ----------------------------------------------------
            W::ControlLeft => Key::ControlLeft,
            W::ShiftLeft => Key::ShiftLeft,
            W::AltLeft => Key::AltLeft,
            W::SuperLeft => Key::SuperLeft,
            W::ControlRight => Key::ControlRight,
            W::ShiftRight => Key::ShiftRight,
            W::AltRight => Key::AltRight,
            W::SuperRight => Key::SuperRight,

            //--- Navigation ---------------------------------------------------
            W::PrintScreen => Key::PrintScreen,
            W::ScrollLock => Key::ScrollLock,
            W::Pause => Key::Pause,
            W::Insert => Key::Insert,
            W::Home => Key::Home,
            W::PageUp => Key::PageUp,
            W::Delete => Key::Delete,
            W::End => Key::End,
            W::PageDown => Key::PageDown,
            W::ArrowRight => Key::ArrowRight,
            W::ArrowLeft => Key::ArrowLeft,
            W::ArrowDown => Key::ArrowDown,
            W::ArrowUp => Key::ArrowUp,

            //--- Numpad -------------------------------------------------------
            W::NumLock => Key::NumLockClear,
            W::NumpadDivide => Key::NumpadDivide,
            W::NumpadMultiply => Key::NumpadMultiply,
            W::NumpadSubtract => Key::NumpadSubtract,
            W::NumpadAdd => Key::NumpadAdd,
            W::NumpadEnter => Key::NumpadEnter,
            W::Numpad0 => Key::Numpad0, W::Numpad1 => Key::Numpad1,
            W::Numpad2 => Key::Numpad2, W::Numpad3 => Key::Numpad3,
            W::Numpad4 => Key::Numpad4, W::Numpad5 => Key::Numpad5,
            W::Numpad6 => Key::Numpad6, W::Numpad7 => Key::Numpad7,
            W::Numpad8 => Key::Numpad8, W::Numpad9 => Key::Numpad9,
            W::NumpadDecimal => Key::NumpadDecimal,
            W::NumpadEqual => Key::NumpadEqual,
            W::NumpadComma => Key::NumpadComma,
            W::NumpadParenLeft => Key::NumpadParenLeft,
            W::NumpadParenRight => Key::NumpadParenRight,
            W::NumpadBackspace => Key::NumpadBackspace,
            W::NumpadHash => Key::NumpadHash,
            W::NumpadClear => Key::NumpadClear,
            W::NumpadClearEntry => Key::NumpadClearEntry,
            W::NumpadMemoryStore => Key::NumpadMemStore,
            W::NumpadMemoryRecall => Key::NumpadMemRecall,
            W::NumpadMemoryClear => Key::NumpadMemClear,
            W::NumpadMemoryAdd => Key::NumpadMemAdd,
            W::NumpadMemorySubtract => Key::NumpadMemSubtract,

            //--- Function Keys ------------------------------------------------
            W::F1 => Key::F1, W::F2 => Key::F2, W::F3 => Key::F3,
            W::F4 => Key::F4, W::F5 => Key::F5, W::F6 => Key::F6,
            W::F7 => Key::F7, W::F8 => Key::F8, W::F9 => Key::F9,
            W::F10 => Key::F10, W::F11 => Key::F11, W::F12 => Key::F12,
            W::F13 => Key::F13, W::F14 => Key::F14, W::F15 => Key::F15,
            W::F16 => Key::F16, W::F17 => Key::F17, W::F18 => Key::F18,
            W::F19 => Key::F19, W::F20 => Key::F20, W::F21 => Key::F21,
            W::F22 => Key::F22, W::F23 => Key::F23, W::F24 => Key::F24,

            //--- International ------------------------------------------------
            W::KanaMode => Key::International2,
            W::Convert => Key::International4,
            W::NonConvert => Key::International5,
            W::Lang1 => Key::Lang1,
            W::Lang2 => Key::Lang2,
            W::Lang3 => Key::Lang3,
            W::Lang4 => Key::Lang4,
            W::Lang5 => Key::Lang5,

            //--- Editing Commands ---------------------------------------------
            W::Help => Key::Help,
            W::Select => Key::Select,
            W::Again => Key::Again,
            W::Undo => Key::Undo,
            W::Cut => Key::Cut,
            W::Copy => Key::Copy,
            W::Paste => Key::Paste,
            W::Find => Key::Find,

            //--- Media & Browser ----------------------------------------------
            W::AudioVolumeMute => Key::Mute,
            W::AudioVolumeUp => Key::VolumeUp,
            W::AudioVolumeDown => Key::VolumeDown,
            W::MediaTrackNext => Key::AudioNext,
            W::MediaTrackPrevious => Key::AudioPrev,
            W::MediaStop => Key::AudioStop,
            W::MediaPlayPause => Key::AudioPlay,
            W::MediaSelect => Key::MediaSelect,
            W::LaunchMail => Key::Mail,
            W::LaunchApp1 => Key::App1,
            W::LaunchApp2 => Key::App2,
            W::BrowserSearch => Key::AcSearch,
            W::BrowserHome => Key::AcHome,
            W::BrowserBack => Key::AcBack,
            W::BrowserForward => Key::AcForward,
            W::BrowserStop => Key::AcStop,
            W::BrowserRefresh => Key::AcRefresh,
            W::BrowserFavorites => Key::AcBookmarks,
            W::Eject => Key::Eject,
            W::Power => Key::Power,
            W::Sleep => Key::Sleep,

            //--- Unmapped -----------------------------------------------------
            _ => Key::Unidentified,
        }
    }
}

/// Left/Middle/Right/Back/Forward map directly; anything else keeps its
/// platform index.
impl From<WinitMouseButton> for MouseButton {
    fn from(button: WinitMouseButton) -> Self {
        match button {
            WinitMouseButton::Left => MouseButton::Left,
            WinitMouseButton::Right => MouseButton::Right,
            WinitMouseButton::Middle => MouseButton::Middle,
            WinitMouseButton::Back => MouseButton::Back,
            WinitMouseButton::Forward => MouseButton::Forward,
            WinitMouseButton::Other(index) => MouseButton::Other(index),
        }
    }
}

//=========================================================================
// Tests
//=========================================================================

#[cfg(test)]
mod tests {
    use super::*;

    fn make_modifiers(shift: bool, ctrl: bool, alt: bool, meta: bool) -> ModifiersState {
        let mut state = ModifiersState::empty();
        if shift { state.insert(ModifiersState::SHIFT); }
        if ctrl { state.insert(ModifiersState::CONTROL); }
        if alt { state.insert(ModifiersState::ALT); }
        if meta { state.insert(ModifiersState::SUPER); }
        state
    }

    #[test]
    fn starts_with_no_modifiers() {
        let processor = InputProcessor::new();
        assert!(processor.current_modifiers.is_empty());
    }

    #[test]
    fn update_modifiers_includes_meta() {
        let mut processor = InputProcessor::new();
        processor.update_modifiers(make_modifiers(true, false, true, true));

        let mods = processor.current_modifiers;
        assert!(mods.shift && !mods.ctrl && mods.alt && mods.meta);
    }

    #[test]
    fn key_down_carries_modifiers_and_repeat() {
        let mut processor = InputProcessor::new();
        processor.update_modifiers(make_modifiers(false, true, false, false));

        let event = processor.create_key_event(Key::KeyS, ElementState::Pressed, true);

        assert_eq!(
            event,
            PlatformEvent::KeyDown {
                key: Key::KeyS,
                modifiers: Modifiers::CTRL,
                repeat: true,
            }
        );
    }

    #[test]
    fn key_up_carries_modifiers() {
        let mut processor = InputProcessor::new();
        processor.update_modifiers(make_modifiers(true, true, false, false));

        let event = processor.create_key_event(Key::KeyA, ElementState::Released, false);

        assert_eq!(
            event,
            PlatformEvent::KeyUp {
                key: Key::KeyA,
                modifiers: Modifiers::SHIFT_CTRL,
            }
        );
    }

    #[test]
    fn keycode_conversion_uses_scancodes() {
        assert_eq!(Key::from(WinitKeyCode::KeyA).scancode(), 4);
        assert_eq!(Key::from(WinitKeyCode::Comma).scancode(), 54);
        assert_eq!(Key::from(WinitKeyCode::F13), Key::F13);
        assert_eq!(Key::from(WinitKeyCode::SuperLeft), Key::SuperLeft);
    }

    #[test]
    fn keycode_conversion_filters_unmapped() {
        assert_eq!(Key::from(WinitKeyCode::Fn), Key::Unidentified);
        assert_eq!(Key::from(WinitKeyCode::F30), Key::Unidentified);
    }

    #[test]
    fn mouse_button_uses_tracked_cursor() {
        let mut processor = InputProcessor::new();
        processor.process_mouse_move(PhysicalPosition::new(10.0, 20.0));

        let event = processor.process_mouse_button(WinitMouseButton::Left, ElementState::Pressed);

        assert_eq!(
            event,
            PlatformEvent::MouseButtonDown {
                button: MouseButton::Left,
                position: IVec2::new(10, 20),
            }
        );
    }

    #[test]
    fn mouse_move_reports_delta() {
        let mut processor = InputProcessor::new();
        processor.process_mouse_move(PhysicalPosition::new(100.0, 100.0));

        let event = processor.process_mouse_move(PhysicalPosition::new(103.4, 95.6));

        assert_eq!(
            event,
            PlatformEvent::MouseMotion {
                position: IVec2::new(103, 96),
                relative: IVec2::new(3, -4),
            }
        );
    }

    #[test]
    fn raw_motion_keeps_position() {
        let mut processor = InputProcessor::new();
        processor.set_cursor(IVec2::new(5, 5));

        assert_eq!(
            processor.process_raw_motion((2.0, -1.0)),
            Some(PlatformEvent::MouseMotion {
                position: IVec2::new(5, 5),
                relative: IVec2::new(2, -1),
            })
        );
        assert_eq!(processor.process_raw_motion((0.1, 0.2)), None);
    }

    #[test]
    fn line_wheel_maps_directly() {
        let mut processor = InputProcessor::new();
        assert_eq!(
            processor.process_wheel(MouseScrollDelta::LineDelta(0.0, -2.0)),
            Some(PlatformEvent::MouseWheel { delta: IVec2::new(0, -2) })
        );
    }

    #[test]
    fn pixel_wheel_accumulates_to_lines() {
        let mut processor = InputProcessor::new();
        let half_line = MouseScrollDelta::PixelDelta(PhysicalPosition::new(0.0, 10.0));

        assert_eq!(processor.process_wheel(half_line), None);
        assert_eq!(
            processor.process_wheel(half_line),
            Some(PlatformEvent::MouseWheel { delta: IVec2::new(0, 1) })
        );
    }

    #[test]
    fn text_input_drops_control_characters() {
        assert_eq!(text_input("é"), Some(PlatformEvent::TextInput("é".into())));
        assert_eq!(text_input("\r"), None);
        assert_eq!(text_input(""), None);
    }

    #[test]
    fn mouse_button_conversion() {
        assert_eq!(MouseButton::from(WinitMouseButton::Left), MouseButton::Left);
        assert_eq!(MouseButton::from(WinitMouseButton::Middle), MouseButton::Middle);
        assert_eq!(MouseButton::from(WinitMouseButton::Back), MouseButton::Back);
        assert_eq!(MouseButton::from(WinitMouseButton::Other(8)), MouseButton::Other(8));
    }
}
