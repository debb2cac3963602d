//=========================================================================
// Window
//
// One native window paired with one graphics context.
//
// Lifecycle:
// ```text
//   Window::new ─> create_window ─> create_context ─> open
//                        │                 │
//                        └─ error ─────────┴─ error: release what exists, Err(WindowError)
//
//   close() / Drop ─> destroy_context ─> destroy_window ─> closed (idempotent)
// ```
//
// Per frame (`draw`): viewport = drawable size, clear, emit `on_draw`,
// present. Subscribers render inside the draw signal.
//
// Mode changes (`resize` with a different mode) follow a fixed native
// call order: fullscreen off, resizable, bordered, size, then fullscreen
// back on for the fullscreen modes. Resizable/bordered cannot be changed
// while fullscreen.
//
//=========================================================================

//=== Standard Library Imports ============================================

use std::cell::Cell;
use std::fmt;

//=== External Crates =====================================================

use glam::UVec2;
use log::{debug, info, warn};

//=== Internal Imports ====================================================

use crate::core::input::event::{EventCategory, PlatformEvent, WindowEventKind};
use crate::core::signal::Signal;
use crate::engine::router::EventSink;
use crate::platform::{
    ClearColor, ContextHandle, Fullscreen, NativeWindowDesc, PlatformError, SharedPlatform,
    WindowHandle,
};

//=== WindowMode ==========================================================

/// Presentation style of a window.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Default)]
pub enum WindowMode {
    /// Fixed-size, bordered.
    #[default]
    Static,
    /// Bordered and user-resizable.
    Resizable,
    /// No decorations.
    Borderless,
    /// Exclusive fullscreen (changes the display mode).
    Fullscreen,
    /// Fullscreen at the desktop resolution.
    DesktopFullscreen,
}

impl WindowMode {
    fn fullscreen(self) -> Fullscreen {
        match self {
            Self::Fullscreen => Fullscreen::Exclusive,
            Self::DesktopFullscreen => Fullscreen::Desktop,
            _ => Fullscreen::Off,
        }
    }
}

//=== WindowDesc ==========================================================

/// Window creation parameters.
#[derive(Debug, Clone, PartialEq)]
pub struct WindowDesc {
    pub size: UVec2,
    pub mode: WindowMode,
    pub caption: String,
}

impl Default for WindowDesc {
    fn default() -> Self {
        Self {
            size: UVec2::new(800, 600),
            mode: WindowMode::Static,
            caption: "Rime Engine".to_owned(),
        }
    }
}

//=== WindowError =========================================================

/// Window construction failures.
#[derive(Debug, Clone, PartialEq)]
pub enum WindowError {
    /// The native window could not be created.
    Window(PlatformError),

    /// The window was created but its graphics context was not.
    Context(PlatformError),
}

impl fmt::Display for WindowError {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            Self::Window(e) => write!(f, "Unable to create window: {}", e),
            Self::Context(e) => write!(f, "Unable to create graphics context: {}", e),
        }
    }
}

impl std::error::Error for WindowError {
    fn source(&self) -> Option<&(dyn std::error::Error + 'static)> {
        match self {
            Self::Window(e) | Self::Context(e) => Some(e),
        }
    }
}

//=== Window ==============================================================

#[derive(Debug, Clone, Copy)]
struct NativeHandles {
    window: WindowHandle,
    context: ContextHandle,
}

/// A native window and its graphics context.
///
/// Both handles exist together or not at all. After [`close`](Self::close)
/// every query returns a neutral value (empty caption, zero size,
/// `Static`) and every command is a no-op.
pub struct Window {
    platform: SharedPlatform,
    native: Option<NativeHandles>,
    clear_color: Cell<ClearColor>,

    draw: Signal<()>,
    close: Signal<()>,
    resize: Signal<UVec2>,
}

impl Window {
    //--- Construction -----------------------------------------------------

    /// Opens a window.
    ///
    /// The platform must already be initialized; calling this earlier is a
    /// programming error and fails fatally.
    ///
    /// # Errors
    ///
    /// Returns [`WindowError`] with the platform's reason if the window or
    /// its context cannot be created. Nothing is leaked in either case.
    pub fn new(platform: SharedPlatform, desc: WindowDesc) -> Result<Self, WindowError> {
        crate::check!(platform.borrow().is_initialized());

        let native_desc = NativeWindowDesc {
            title: desc.caption.clone(),
            size: desc.size,
            fullscreen: desc.mode.fullscreen(),
            resizable: desc.mode == WindowMode::Resizable,
            bordered: desc.mode != WindowMode::Borderless,
        };

        let native = {
            let mut p = platform.borrow_mut();
            let window = p.create_window(&native_desc).map_err(WindowError::Window)?;
            match p.create_context(window) {
                Ok(context) => NativeHandles { window, context },
                Err(e) => {
                    p.destroy_window(window);
                    return Err(WindowError::Context(e));
                }
            }
        };

        info!(
            target: "window",
            "Opened '{}' ({}x{}, {:?})",
            desc.caption, desc.size.x, desc.size.y, desc.mode
        );

        Ok(Self {
            platform,
            native: Some(native),
            clear_color: Cell::new([0.0, 0.0, 0.0, 1.0]),
            draw: Signal::new(),
            close: Signal::new(),
            resize: Signal::new(),
        })
    }

    //--- Attributes -------------------------------------------------------

    pub fn set_caption(&self, caption: &str) {
        if let Some(native) = self.native {
            self.platform.borrow_mut().set_window_title(native.window, caption);
        }
    }

    pub fn caption(&self) -> String {
        self.native
            .and_then(|native| self.platform.borrow().window_title(native.window))
            .unwrap_or_default()
    }

    /// Changes size and, if different, the display mode.
    pub fn resize(&self, size: UVec2, mode: WindowMode) {
        let Some(native) = self.native else {
            return;
        };
        let current = self.mode();
        let window = native.window;
        let mut p = self.platform.borrow_mut();

        if mode == current {
            p.set_window_size(window, size);
            return;
        }

        debug!(target: "window", "Mode change {:?} -> {:?}", current, mode);
        p.set_fullscreen(window, Fullscreen::Off);
        p.set_resizable(window, mode == WindowMode::Resizable);
        p.set_bordered(window, mode != WindowMode::Borderless);
        if mode != WindowMode::DesktopFullscreen {
            p.set_window_size(window, size);
        }
        if mode.fullscreen() != Fullscreen::Off {
            p.set_fullscreen(window, mode.fullscreen());
        }
    }

    /// Logical size.
    pub fn size(&self) -> UVec2 {
        self.native
            .map(|native| self.platform.borrow().window_size(native.window))
            .unwrap_or(UVec2::ZERO)
    }

    /// Size of the pixel buffer; larger than [`size`](Self::size) on
    /// scaled displays.
    pub fn drawable_size(&self) -> UVec2 {
        self.native
            .map(|native| self.platform.borrow().drawable_size(native.window))
            .unwrap_or(UVec2::ZERO)
    }

    /// Current mode, derived from the native flags.
    ///
    /// Several flags may be reported at once; the first match in the order
    /// fullscreen, desktop fullscreen, borderless, resizable wins.
    pub fn mode(&self) -> WindowMode {
        let Some(native) = self.native else {
            return WindowMode::Static;
        };
        let flags = self.platform.borrow().window_flags(native.window);

        if flags.fullscreen {
            WindowMode::Fullscreen
        } else if flags.fullscreen_desktop {
            WindowMode::DesktopFullscreen
        } else if flags.borderless {
            WindowMode::Borderless
        } else if flags.resizable {
            WindowMode::Resizable
        } else {
            WindowMode::Static
        }
    }

    /// Color used by the clear at the start of every [`draw`](Self::draw).
    pub fn set_clear_color(&self, color: ClearColor) {
        self.clear_color.set(color);
    }

    pub fn clear_color(&self) -> ClearColor {
        self.clear_color.get()
    }

    pub fn is_open(&self) -> bool {
        self.native.is_some()
    }

    /// Native window id, while open.
    pub fn native_window(&self) -> Option<WindowHandle> {
        self.native.map(|native| native.window)
    }

    //--- Frame ------------------------------------------------------------

    /// Renders one frame: viewport, clear, `on_draw`, present.
    pub fn draw(&self) {
        let Some(native) = self.native else {
            return;
        };

        {
            let mut p = self.platform.borrow_mut();
            let drawable = p.drawable_size(native.window);
            p.set_viewport(native.context, drawable);
            p.clear(native.context, self.clear_color.get());
        }

        self.draw.emit(&());

        if let Err(e) = self.platform.borrow_mut().swap(native.window) {
            warn!(target: "window", "Present failed: {}", e);
        }
    }

    /// Releases the graphics context and the native window. Idempotent.
    pub fn close(&mut self) {
        if let Some(native) = self.native.take() {
            let mut p = self.platform.borrow_mut();
            p.destroy_context(native.context);
            p.destroy_window(native.window);
            info!(target: "window", "Closed window {:?}", native.window);
        }
    }

    //--- Signals ----------------------------------------------------------

    /// Emitted once per [`draw`](Self::draw), between clear and present.
    pub fn on_draw(&self) -> &Signal<()> {
        &self.draw
    }

    /// Emitted when the user asks to close the window.
    pub fn on_close(&self) -> &Signal<()> {
        &self.close
    }

    /// Emitted with the new logical size, once per `Resized` or
    /// `SizeChanged` event routed to this window. Backends report one OS
    /// resize as one event.
    pub fn on_resize(&self) -> &Signal<UVec2> {
        &self.resize
    }
}

impl Drop for Window {
    fn drop(&mut self) {
        self.close();
    }
}

//=== Event Handling ======================================================

impl EventSink for Window {
    fn handles(category: EventCategory) -> bool {
        matches!(
            category,
            EventCategory::WindowResized | EventCategory::WindowSizeChanged | EventCategory::WindowClose
        )
    }

    fn handle_event(&self, event: &PlatformEvent) {
        let PlatformEvent::Window { window, kind } = event else {
            crate::fail!("Window cannot handle {:?}", event.category());
        };

        if self.native_window() != Some(*window) {
            debug!(target: "window", "Ignoring event for foreign window {:?}", window);
            return;
        }

        match kind {
            WindowEventKind::Resized(size) | WindowEventKind::SizeChanged(size) => {
                self.resize.emit(size);
            }
            WindowEventKind::Close => self.close.emit(&()),
            WindowEventKind::Other => crate::fail!("Window cannot handle {:?}", event.category()),
        }
    }
}

//=========================================================================
// Unit Tests
//=========================================================================

#[cfg(test)]
mod tests {
    use super::*;
    use crate::platform::{HeadlessPlatform, NativeCall, Platform, WindowFlags};
    use std::cell::RefCell;
    use std::rc::Rc;

    fn platform() -> Rc<RefCell<HeadlessPlatform>> {
        let platform = Rc::new(RefCell::new(HeadlessPlatform::new()));
        platform.borrow_mut().init().unwrap();
        platform
    }

    fn open(platform: &Rc<RefCell<HeadlessPlatform>>, mode: WindowMode) -> Window {
        let window = Window::new(
            platform.clone(),
            WindowDesc {
                size: UVec2::new(800, 600),
                mode,
                caption: "test".into(),
            },
        )
        .unwrap();
        platform.borrow_mut().clear_calls();
        window
    }

    fn handle(window: &Window) -> WindowHandle {
        window.native_window().unwrap()
    }

    //=====================================================================
    // Construction
    //=====================================================================

    #[test]
    fn default_desc() {
        let desc = WindowDesc::default();
        assert_eq!(desc.size, UVec2::new(800, 600));
        assert_eq!(desc.mode, WindowMode::Static);
        assert_eq!(desc.caption, "Rime Engine");
    }

    #[test]
    fn new_creates_window_and_context() {
        let p = platform();
        let window = open(&p, WindowMode::Resizable);

        assert!(window.is_open());
        assert_eq!(p.borrow().live_windows(), 1);
        assert_eq!(p.borrow().live_contexts(), 1);
        assert_eq!(window.mode(), WindowMode::Resizable);
        assert_eq!(window.caption(), "test");
        assert_eq!(window.size(), UVec2::new(800, 600));
    }

    #[test]
    fn window_failure_is_reported() {
        let p = Rc::new(RefCell::new(HeadlessPlatform::new().with_window_failure("no display")));
        p.borrow_mut().init().unwrap();

        let err = Window::new(p.clone(), WindowDesc::default()).err().unwrap();

        assert_eq!(err, WindowError::Window(PlatformError::WindowCreation("no display".into())));
        assert_eq!(err.to_string(), "Unable to create window: Window creation failed: no display");
    }

    #[test]
    fn context_failure_releases_window() {
        let p = Rc::new(RefCell::new(HeadlessPlatform::new().with_context_failure("no GL")));
        p.borrow_mut().init().unwrap();

        let err = Window::new(p.clone(), WindowDesc::default()).err().unwrap();

        assert!(matches!(err, WindowError::Context(_)));
        assert!(std::error::Error::source(&err).is_some());
        assert_eq!(p.borrow().live_windows(), 0);
    }

    //=====================================================================
    // Resize
    //=====================================================================

    #[test]
    fn same_mode_only_resizes() {
        let p = platform();
        let window = open(&p, WindowMode::Static);
        let w = handle(&window);

        window.resize(UVec2::new(1024, 768), WindowMode::Static);

        assert_eq!(p.borrow().calls(), &[NativeCall::SetSize(w, UVec2::new(1024, 768))]);
    }

    #[test]
    fn mode_change_clears_fullscreen_first() {
        let p = platform();
        let window = open(&p, WindowMode::Static);
        let w = handle(&window);
        let size = UVec2::new(640, 480);

        window.resize(size, WindowMode::Resizable);

        assert_eq!(
            p.borrow().calls(),
            &[
                NativeCall::SetFullscreen(w, Fullscreen::Off),
                NativeCall::SetResizable(w, true),
                NativeCall::SetBordered(w, true),
                NativeCall::SetSize(w, size),
            ]
        );
        assert_eq!(window.mode(), WindowMode::Resizable);
    }

    #[test]
    fn borderless_drops_border() {
        let p = platform();
        let window = open(&p, WindowMode::Resizable);
        let w = handle(&window);

        window.resize(UVec2::new(640, 480), WindowMode::Borderless);

        let calls = p.borrow().calls().to_vec();
        assert_eq!(calls[0], NativeCall::SetFullscreen(w, Fullscreen::Off));
        assert!(calls.contains(&NativeCall::SetResizable(w, false)));
        assert!(calls.contains(&NativeCall::SetBordered(w, false)));
        assert_eq!(window.mode(), WindowMode::Borderless);
    }

    #[test]
    fn fullscreen_is_reapplied_last() {
        let p = platform();
        let window = open(&p, WindowMode::Static);
        let w = handle(&window);
        let size = UVec2::new(1920, 1080);

        window.resize(size, WindowMode::Fullscreen);

        assert_eq!(
            p.borrow().calls(),
            &[
                NativeCall::SetFullscreen(w, Fullscreen::Off),
                NativeCall::SetResizable(w, false),
                NativeCall::SetBordered(w, true),
                NativeCall::SetSize(w, size),
                NativeCall::SetFullscreen(w, Fullscreen::Exclusive),
            ]
        );
        assert_eq!(window.mode(), WindowMode::Fullscreen);
    }

    #[test]
    fn desktop_fullscreen_keeps_size() {
        let p = platform();
        let window = open(&p, WindowMode::Static);
        let w = handle(&window);

        window.resize(UVec2::new(1, 1), WindowMode::DesktopFullscreen);

        let calls = p.borrow().calls().to_vec();
        assert!(!calls.iter().any(|c| matches!(c, NativeCall::SetSize(..))));
        assert_eq!(calls.last(), Some(&NativeCall::SetFullscreen(w, Fullscreen::Desktop)));
        assert_eq!(window.mode(), WindowMode::DesktopFullscreen);
    }

    //=====================================================================
    // Mode Priority
    //=====================================================================

    #[test]
    fn mode_priority_order() {
        let p = platform();
        let window = open(&p, WindowMode::Static);
        let w = handle(&window);

        let cases = [
            (WindowFlags { fullscreen: true, borderless: true, ..Default::default() }, WindowMode::Fullscreen),
            (WindowFlags { fullscreen: true, fullscreen_desktop: true, ..Default::default() }, WindowMode::Fullscreen),
            (WindowFlags { fullscreen_desktop: true, resizable: true, ..Default::default() }, WindowMode::DesktopFullscreen),
            (WindowFlags { borderless: true, resizable: true, ..Default::default() }, WindowMode::Borderless),
            (WindowFlags { resizable: true, ..Default::default() }, WindowMode::Resizable),
            (WindowFlags::default(), WindowMode::Static),
        ];

        for (flags, expected) in cases {
            p.borrow_mut().set_flags(w, flags);
            assert_eq!(window.mode(), expected, "{:?}", flags);
        }
    }

    //=====================================================================
    // Draw
    //=====================================================================

    #[test]
    fn draw_sequence() {
        let p = Rc::new(RefCell::new(HeadlessPlatform::new().with_scale_factor(2)));
        p.borrow_mut().init().unwrap();
        let window = open(&p, WindowMode::Static);
        window.set_clear_color([0.1, 0.2, 0.3, 1.0]);

        let calls_at_draw = Rc::new(RefCell::new(0));
        let probe = p.clone();
        let seen = calls_at_draw.clone();
        window
            .on_draw()
            .connect(move |_| *seen.borrow_mut() = probe.borrow().calls().len());

        window.draw();

        let calls = p.borrow().calls().to_vec();
        assert!(matches!(calls[0], NativeCall::SetViewport(_, size) if size == UVec2::new(1600, 1200)));
        assert!(matches!(calls[1], NativeCall::Clear(_, [r, ..]) if r == 0.1));
        assert!(matches!(calls[2], NativeCall::Swap(_)));
        // Draw signal fires after clear, before swap.
        assert_eq!(*calls_at_draw.borrow(), 2);
        assert_eq!(p.borrow().frames_presented(handle(&window)), 1);
    }

    //=====================================================================
    // Close
    //=====================================================================

    #[test]
    fn close_releases_both_handles_once() {
        let p = platform();
        let mut window = open(&p, WindowMode::Static);

        window.close();
        window.close();

        assert!(!window.is_open());
        assert_eq!(p.borrow().live_windows(), 0);
        assert_eq!(p.borrow().live_contexts(), 0);
        assert_eq!(p.borrow().calls().len(), 2);

        assert_eq!(window.size(), UVec2::ZERO);
        assert_eq!(window.caption(), "");
        assert_eq!(window.mode(), WindowMode::Static);
        window.draw();
        window.resize(UVec2::ONE, WindowMode::Fullscreen);
        assert_eq!(p.borrow().calls().len(), 2);
    }

    #[test]
    fn drop_releases_handles() {
        let p = platform();
        drop(open(&p, WindowMode::Static));
        assert_eq!(p.borrow().live_windows(), 0);
        assert_eq!(p.borrow().live_contexts(), 0);
    }

    //=====================================================================
    // Events
    //=====================================================================

    #[test]
    fn resize_and_close_events_emit_signals() {
        let p = platform();
        let window = open(&p, WindowMode::Resizable);
        let w = handle(&window);
        let sizes = Rc::new(RefCell::new(Vec::new()));
        let closes = Rc::new(RefCell::new(0));

        let s = sizes.clone();
        window.on_resize().connect(move |size| s.borrow_mut().push(*size));
        let c = closes.clone();
        window.on_close().connect(move |_| *c.borrow_mut() += 1);

        window.handle_event(&PlatformEvent::Window { window: w, kind: WindowEventKind::Resized(UVec2::new(1, 2)) });
        window.handle_event(&PlatformEvent::Window { window: w, kind: WindowEventKind::SizeChanged(UVec2::new(3, 4)) });
        window.handle_event(&PlatformEvent::Window { window: w, kind: WindowEventKind::Close });

        assert_eq!(*sizes.borrow(), vec![UVec2::new(1, 2), UVec2::new(3, 4)]);
        assert_eq!(*closes.borrow(), 1);
    }

    #[test]
    fn foreign_window_events_are_ignored() {
        let p = platform();
        let window = open(&p, WindowMode::Static);
        let closes = Rc::new(RefCell::new(0));
        let c = closes.clone();
        window.on_close().connect(move |_| *c.borrow_mut() += 1);

        window.handle_event(&PlatformEvent::Window {
            window: WindowHandle::from_raw(999),
            kind: WindowEventKind::Close,
        });

        assert_eq!(*closes.borrow(), 0);
    }

    #[test]
    fn handles_only_routed_window_categories() {
        assert!(Window::handles(EventCategory::WindowResized));
        assert!(Window::handles(EventCategory::WindowSizeChanged));
        assert!(Window::handles(EventCategory::WindowClose));
        assert!(!Window::handles(EventCategory::WindowOther));
        assert!(!Window::handles(EventCategory::KeyDown));
    }
}
