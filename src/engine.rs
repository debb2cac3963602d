//=========================================================================
// Rime Engine
//
// Main entry point and coordinator for the engine.
//
// Architecture:
// ```text
//     EngineBuilder  ──build()──>  Engine  ──run()──>  tick() ... until stop
//         │                          │
//         ├─ with_size()             ├─ drain platform events ─> router
//         ├─ with_mode()             │     ├─ Quit      -> stop()
//         ├─ with_keyboard()         │     ├─ Window    -> Window
//         ├─ with_mouse()            │     ├─ Keyboard  -> Keyboard (if any)
//         └─ with_crash_handler()    │     └─ Mouse     -> Mouse    (if any)
//                                    └─ Window::draw()
// ```
//
// The loop never blocks: polling returns immediately and the engine spins
// until the running flag is cleared. `StopHandle` clears it from other
// threads or from inside signal callbacks.
//
//=========================================================================

//=== Submodules ==========================================================

pub(crate) mod router;

//=== Standard Library Imports ============================================

use std::fmt;
use std::sync::atomic::{AtomicBool, Ordering};
use std::sync::Arc;

//=== External Crates =====================================================

use glam::UVec2;
use log::info;

//=== Internal Imports ====================================================

use crate::core::debug::{self, CrashHandler};
use crate::core::input::{Keyboard, Mouse, PlatformEvent};
use crate::core::window::{Window, WindowDesc, WindowError, WindowMode};
use crate::platform::{shared, ClearColor, PlatformError, SharedPlatform, WinitPlatform};
use router::{route, EventSink, Route};

//=== EngineError =========================================================

/// Engine construction failures.
#[derive(Debug, Clone, PartialEq)]
pub enum EngineError {
    /// The platform's video/event subsystem could not start.
    Platform(PlatformError),

    /// The default window could not be opened.
    Window(WindowError),
}

impl fmt::Display for EngineError {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            Self::Platform(e) => write!(f, "Failed to initialize platform: {}", e),
            Self::Window(e) => write!(f, "Failed to open default window: {}", e),
        }
    }
}

impl std::error::Error for EngineError {
    fn source(&self) -> Option<&(dyn std::error::Error + 'static)> {
        match self {
            Self::Platform(e) => Some(e),
            Self::Window(e) => Some(e),
        }
    }
}

impl From<PlatformError> for EngineError {
    fn from(e: PlatformError) -> Self {
        Self::Platform(e)
    }
}

impl From<WindowError> for EngineError {
    fn from(e: WindowError) -> Self {
        Self::Window(e)
    }
}

//=== EngineBuilder =======================================================

/// Builder for configuring and constructing an [`Engine`].
///
/// # Default Values
///
/// - **Window**: 800x600, [`WindowMode::Static`], caption `"Rime Engine"`
/// - **Clear color**: opaque black
/// - **Keyboard / Mouse**: enabled
/// - **Crash handler**: enabled, dumps prefixed `"rime"`
///
/// # Examples
///
/// ```no_run
/// use rime_engine::EngineBuilder;
///
/// let mut engine = EngineBuilder::new()
///     .with_caption("Demo")
///     .build()
///     .expect("engine");
///
/// let stop = engine.stop_handle();
/// if let Some(window) = engine.window() {
///     window.on_close().connect(move |_| stop.stop());
/// }
/// engine.run();
/// ```
#[derive(Debug, Clone)]
pub struct EngineBuilder {
    window: WindowDesc,
    clear_color: ClearColor,
    keyboard: bool,
    mouse: bool,
    crash_handler: bool,
    crash_dump_prefix: Option<String>,
}

impl EngineBuilder {
    /// Creates a new builder with default settings.
    pub fn new() -> Self {
        Self {
            window: WindowDesc::default(),
            clear_color: [0.0, 0.0, 0.0, 1.0],
            keyboard: true,
            mouse: true,
            crash_handler: true,
            crash_dump_prefix: None,
        }
    }

    /// Logical size of the default window.
    ///
    /// # Panics
    ///
    /// Panics if either dimension is zero.
    pub fn with_size(mut self, width: u32, height: u32) -> Self {
        assert!(width > 0 && height > 0, "Window size must be positive, got {}x{}", width, height);
        self.window.size = UVec2::new(width, height);
        self
    }

    pub fn with_mode(mut self, mode: WindowMode) -> Self {
        self.window.mode = mode;
        self
    }

    pub fn with_caption(mut self, caption: impl Into<String>) -> Self {
        self.window.caption = caption.into();
        self
    }

    pub fn with_clear_color(mut self, color: ClearColor) -> Self {
        self.clear_color = color;
        self
    }

    /// Whether the engine creates a [`Keyboard`]. Without one, keyboard
    /// events are dropped.
    pub fn with_keyboard(mut self, enabled: bool) -> Self {
        self.keyboard = enabled;
        self
    }

    /// Whether the engine creates a [`Mouse`]. Without one, mouse events
    /// are dropped.
    pub fn with_mouse(mut self, enabled: bool) -> Self {
        self.mouse = enabled;
        self
    }

    /// Whether the engine holds a [`CrashHandler`] for its lifetime.
    pub fn with_crash_handler(mut self, enabled: bool) -> Self {
        self.crash_handler = enabled;
        self
    }

    /// File-name prefix for crash dumps.
    pub fn with_crash_dump_prefix(mut self, prefix: impl Into<String>) -> Self {
        self.crash_dump_prefix = Some(prefix.into());
        self
    }

    /// Builds the engine on the desktop (winit) backend.
    ///
    /// # Errors
    ///
    /// See [`build_with_platform`](Self::build_with_platform).
    pub fn build(self) -> Result<Engine, EngineError> {
        self.build_with_platform(shared(WinitPlatform::new()))
    }

    /// Builds the engine on the given backend.
    ///
    /// Initializes the platform and opens the default window.
    ///
    /// # Errors
    ///
    /// [`EngineError::Platform`] if initialization fails,
    /// [`EngineError::Window`] if the window or its graphics context cannot
    /// be created. The platform is shut down again in the second case.
    pub fn build_with_platform(self, platform: SharedPlatform) -> Result<Engine, EngineError> {
        info!(
            target: "engine",
            "Building engine ({}x{}, {:?}, keyboard: {}, mouse: {})",
            self.window.size.x, self.window.size.y, self.window.mode, self.keyboard, self.mouse
        );

        if let Some(prefix) = self.crash_dump_prefix {
            debug::set_crash_dump_prefix(prefix);
        }
        let crash_handler = self.crash_handler.then(CrashHandler::new);

        platform.borrow_mut().init()?;

        let window = match Window::new(platform.clone(), self.window) {
            Ok(window) => window,
            Err(e) => {
                platform.borrow_mut().quit();
                return Err(e.into());
            }
        };
        window.set_clear_color(self.clear_color);

        let keyboard = self.keyboard.then(|| Keyboard::new(platform.clone()));
        let mouse = self.mouse.then(|| Mouse::new(platform.clone()));

        info!(target: "engine", "Engine ready");

        Ok(Engine {
            platform,
            window: Some(window),
            keyboard,
            mouse,
            running: Arc::new(AtomicBool::new(false)),
            crash_handler,
        })
    }
}

impl Default for EngineBuilder {
    fn default() -> Self {
        Self::new()
    }
}

//=== StopHandle ==========================================================

/// Thread-safe handle that stops a running [`Engine`].
///
/// The engine observes the request at the next tick boundary.
#[derive(Debug, Clone)]
pub struct StopHandle {
    running: Arc<AtomicBool>,
}

impl StopHandle {
    pub fn stop(&self) {
        self.running.store(false, Ordering::Release);
    }

    pub fn is_running(&self) -> bool {
        self.running.load(Ordering::Acquire)
    }
}

//=== Engine ==============================================================

/// Rime Engine runtime.
///
/// Owns the platform session, the default window and the optional input
/// components. Create via [`EngineBuilder`].
///
/// The engine and its components are bound to the thread that built them;
/// use [`stop_handle`](Self::stop_handle) to stop it from elsewhere.
pub struct Engine {
    platform: SharedPlatform,
    window: Option<Window>,
    keyboard: Option<Keyboard>,
    mouse: Option<Mouse>,
    running: Arc<AtomicBool>,
    crash_handler: Option<CrashHandler>,
}

impl Engine {
    //--- Execution --------------------------------------------------------

    /// Ticks until [`stop`](Self::stop) is observed.
    pub fn run(&mut self) {
        self.start();

        while self.is_running() {
            self.tick();
        }

        info!(target: "engine", "Main loop exited");
    }

    /// Sets the running flag for a caller-driven loop:
    ///
    /// ```no_run
    /// # use rime_engine::prelude::*;
    /// # let mut engine = EngineBuilder::new().build().unwrap();
    /// engine.start();
    /// while engine.is_running() {
    ///     engine.tick();
    /// }
    /// ```
    pub fn start(&self) {
        info!(target: "engine", "Entering main loop");
        self.running.store(true, Ordering::Release);
    }

    /// Clears the running flag; [`run`](Self::run) returns after the
    /// current tick.
    pub fn stop(&self) {
        self.running.store(false, Ordering::Release);
    }

    pub fn is_running(&self) -> bool {
        self.running.load(Ordering::Acquire)
    }

    pub fn stop_handle(&self) -> StopHandle {
        StopHandle {
            running: Arc::clone(&self.running),
        }
    }

    /// Routes every pending platform event, then draws one frame.
    pub fn tick(&mut self) {
        self.route_events();

        if let Some(window) = &self.window {
            window.draw();
        }
    }

    fn route_events(&self) {
        loop {
            // The platform borrow must end before dispatch; handlers and
            // their subscribers call back into it.
            let next = self.platform.borrow_mut().poll_event();
            let Some(event) = next else {
                break;
            };
            self.dispatch(&event);
        }
    }

    fn dispatch(&self, event: &PlatformEvent) {
        match route(event.category()) {
            Route::Stop => {
                info!(target: "engine", "Quit requested");
                self.stop();
            }
            Route::Window => {
                if let Some(window) = &self.window {
                    window.handle_event(event);
                }
            }
            Route::Keyboard => {
                if let Some(keyboard) = &self.keyboard {
                    keyboard.handle_event(event);
                }
            }
            Route::Mouse => {
                if let Some(mouse) = &self.mouse {
                    mouse.handle_event(event);
                }
            }
            Route::Ignore => {}
        }
    }

    //--- Components -------------------------------------------------------

    pub fn window(&self) -> Option<&Window> {
        self.window.as_ref()
    }

    pub fn window_mut(&mut self) -> Option<&mut Window> {
        self.window.as_mut()
    }

    pub fn keyboard(&self) -> Option<&Keyboard> {
        self.keyboard.as_ref()
    }

    pub fn mouse(&self) -> Option<&Mouse> {
        self.mouse.as_ref()
    }

    /// The backend shared by all components.
    pub fn platform(&self) -> &SharedPlatform {
        &self.platform
    }

    pub fn has_crash_handler(&self) -> bool {
        self.crash_handler.is_some()
    }
}

impl Drop for Engine {
    fn drop(&mut self) {
        // Window first: its handles must be released before the platform
        // shuts down.
        self.window = None;
        self.keyboard = None;
        self.mouse = None;
        self.platform.borrow_mut().quit();
        info!(target: "engine", "Engine shutdown complete");
    }
}

//=========================================================================
// Unit Tests
//=========================================================================
