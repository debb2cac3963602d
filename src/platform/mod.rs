//=========================================================================
// Platform Subsystem
//
// The seam between the engine core and the native window/event/graphics
// layer.
//
// Architecture:
// ```text
//   Engine ─┬─ Window ───┐
//           ├─ Keyboard ─┼──> SharedPlatform (Rc<RefCell<dyn Platform>>)
//           └─ Mouse ────┘            │
//                                     ├─ WinitPlatform    (desktop)
//                                     └─ HeadlessPlatform (tests, CI)
// ```
//
// Key Design Decisions:
// - **One owner thread**: every component shares the same backend through
//   an `Rc<RefCell<..>>`. Callers never hold a borrow across a signal
//   emission, so subscribers may call back into any component.
// - **Opaque handles**: windows and graphics contexts are small copyable
//   ids. The backend owns the native objects.
// - **Live queries**: key state, cursor position and window flags are read
//   from the backend on demand; components do not cache them.
//
//=========================================================================

//=== Submodules ==========================================================

pub mod headless;
mod input_processor;
pub mod winit_backend;

//=== Standard Library Imports ============================================

use std::cell::RefCell;
use std::fmt;
use std::rc::Rc;

//=== External Crates =====================================================

use glam::{IVec2, UVec2};

//=== Internal Imports ====================================================

use crate::core::input::event::PlatformEvent;

//=== Re-exports ==========================================================

pub use headless::{EventInjector, HeadlessPlatform, NativeCall};
pub use winit_backend::WinitPlatform;

//=== Handles =============================================================

/// Opaque id of a native window owned by the backend.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, PartialOrd, Ord)]
pub struct WindowHandle(u32);

impl WindowHandle {
    pub fn from_raw(raw: u32) -> Self {
        Self(raw)
    }

    pub fn raw(self) -> u32 {
        self.0
    }
}

/// Opaque id of a graphics context bound to one window.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, PartialOrd, Ord)]
pub struct ContextHandle(u32);

impl ContextHandle {
    pub fn from_raw(raw: u32) -> Self {
        Self(raw)
    }

    pub fn raw(self) -> u32 {
        self.0
    }
}

//=== Window Flags ========================================================

/// Native fullscreen state.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Default)]
pub enum Fullscreen {
    #[default]
    Off,
    /// Exclusive fullscreen with a display mode change.
    Exclusive,
    /// Borderless window covering the desktop at its current resolution.
    Desktop,
}

/// Native window flags as reported by the backend.
///
/// Several flags can be set at once; interpreting them is up to the
/// caller (see `Window::mode`).
#[derive(Debug, Clone, Copy, PartialEq, Eq, Default)]
pub struct WindowFlags {
    pub fullscreen: bool,
    pub fullscreen_desktop: bool,
    pub borderless: bool,
    pub resizable: bool,
}

/// Parameters for creating one native window.
#[derive(Debug, Clone, PartialEq)]
pub struct NativeWindowDesc {
    pub title: String,
    pub size: UVec2,
    pub fullscreen: Fullscreen,
    pub resizable: bool,
    pub bordered: bool,
}

/// RGBA clear color, each channel in `0.0..=1.0`.
pub type ClearColor = [f32; 4];

//=== PlatformError =======================================================

/// Backend failures.
///
/// Initialization and creation errors are reported to the caller rather
/// than aborting; what to do about them is the engine's decision.
#[derive(Debug, Clone, PartialEq)]
pub enum PlatformError {
    /// The video/event subsystem could not start.
    Init(String),

    /// An operation needed an initialized backend.
    NotInitialized,

    /// The native window could not be created.
    WindowCreation(String),

    /// The graphics context could not be created.
    ContextCreation(String),

    /// The handle does not name a live window or context.
    InvalidHandle,

    /// Presenting a frame failed.
    Present(String),
}

//--- Trait Implementations -----------------------------------------------

impl fmt::Display for PlatformError {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            Self::Init(e) => write!(f, "Platform initialization failed: {}", e),
            Self::NotInitialized => write!(f, "Platform is not initialized"),
            Self::WindowCreation(e) => write!(f, "Window creation failed: {}", e),
            Self::ContextCreation(e) => write!(f, "Graphics context creation failed: {}", e),
            Self::InvalidHandle => write!(f, "Invalid window or context handle"),
            Self::Present(e) => write!(f, "Frame presentation failed: {}", e),
        }
    }
}

impl std::error::Error for PlatformError {}

//=== Platform ============================================================

/// Native window, event and graphics operations consumed by the engine.
///
/// Implementations are single-threaded. Operations on an unknown or
/// destroyed handle are no-ops (queries return neutral values); creation
/// and presentation report failures through [`PlatformError`].
pub trait Platform {
    //--- Lifecycle --------------------------------------------------------

    /// Starts the video/event subsystem.
    fn init(&mut self) -> Result<(), PlatformError>;

    /// Shuts the subsystem down. Live windows are released.
    fn quit(&mut self);

    fn is_initialized(&self) -> bool;

    //--- Events -----------------------------------------------------------

    /// Returns the next pending event without blocking.
    fn poll_event(&mut self) -> Option<PlatformEvent>;

    //--- Windows & Contexts -----------------------------------------------

    fn create_window(&mut self, desc: &NativeWindowDesc) -> Result<WindowHandle, PlatformError>;

    fn destroy_window(&mut self, window: WindowHandle);

    fn create_context(&mut self, window: WindowHandle) -> Result<ContextHandle, PlatformError>;

    fn destroy_context(&mut self, context: ContextHandle);

    fn window_title(&self, window: WindowHandle) -> Option<String>;

    fn set_window_title(&mut self, window: WindowHandle, title: &str);

    /// Logical window size.
    fn window_size(&self, window: WindowHandle) -> UVec2;

    fn set_window_size(&mut self, window: WindowHandle, size: UVec2);

    /// Pixel size of the backing buffer (differs from the logical size
    /// under display scaling).
    fn drawable_size(&self, window: WindowHandle) -> UVec2;

    fn window_flags(&self, window: WindowHandle) -> WindowFlags;

    fn set_fullscreen(&mut self, window: WindowHandle, fullscreen: Fullscreen);

    fn set_resizable(&mut self, window: WindowHandle, resizable: bool);

    fn set_bordered(&mut self, window: WindowHandle, bordered: bool);

    //--- Drawing ----------------------------------------------------------

    fn set_viewport(&mut self, context: ContextHandle, size: UVec2);

    /// Clears the color and depth buffers.
    fn clear(&mut self, context: ContextHandle, color: ClearColor);

    /// Presents the back buffer.
    fn swap(&mut self, window: WindowHandle) -> Result<(), PlatformError>;

    //--- Keyboard ---------------------------------------------------------

    /// Pressed state indexed by scancode.
    fn key_state(&self) -> &[bool];

    //--- Mouse ------------------------------------------------------------

    fn set_cursor_visible(&mut self, visible: bool);

    fn is_cursor_visible(&self) -> bool;

    fn set_relative_mouse_mode(&mut self, enabled: bool);

    /// Cursor position relative to the focused window.
    fn cursor_position(&self) -> IVec2;

    fn warp_cursor(&mut self, window: WindowHandle, position: IVec2);
}

//=== SharedPlatform ======================================================

/// The backend as shared by Engine, Window, Keyboard and Mouse.
pub type SharedPlatform = Rc<RefCell<dyn Platform>>;

/// Wraps a backend for sharing.
pub fn shared<P: Platform + 'static>(platform: P) -> SharedPlatform {
    Rc::new(RefCell::new(platform))
}

//=========================================================================
// Unit Tests
//=========================================================================

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn platform_error_is_error_trait() {
        fn assert_error<T: std::error::Error>() {}
        assert_error::<PlatformError>();
    }

    #[test]
    fn platform_error_display_format() {
        let e = PlatformError::WindowCreation("no display".into());
        assert_eq!(e.to_string(), "Window creation failed: no display");
        assert_eq!(
            PlatformError::NotInitialized.to_string(),
            "Platform is not initialized"
        );
    }

    #[test]
    fn handles_round_trip_raw() {
        assert_eq!(WindowHandle::from_raw(7).raw(), 7);
        assert_eq!(ContextHandle::from_raw(9).raw(), 9);
    }

    #[test]
    fn default_flags_are_static() {
        assert_eq!(WindowFlags::default(), WindowFlags {
            fullscreen: false,
            fullscreen_desktop: false,
            borderless: false,
            resizable: false,
        });
        assert_eq!(Fullscreen::default(), Fullscreen::Off);
    }

    #[test]
    fn shared_coerces_any_backend() {
        let platform = shared(HeadlessPlatform::new());
        assert!(!platform.borrow().is_initialized());
    }
}
