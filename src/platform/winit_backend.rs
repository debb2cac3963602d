//=========================================================================
// Winit Platform
//=========================================================================
//
// Desktop backend: winit for windows and events, softbuffer for pixels.
//
// Architecture:
// ```text
//   poll_event() ──(queue empty)──> pump_app_events(ZERO, &mut state)
//                                          │
//                     ApplicationHandler (WinitState)
//                       ├─ creates pending windows (resumed / about_to_wait)
//                       ├─ InputProcessor: Winit → PlatformEvent
//                       └─ pushes into `events`
//   poll_event() <──── events.pop_front()
// ```
//
// Key Design Decisions:
// - **Pumped, not run**: the engine owns the frame loop, so the event
//   loop is pumped with a zero timeout instead of `run_app`.
// - **Creation inside the handler**: winit 0.30 creates windows from an
//   `ActiveEventLoop`, so `create_window` parks the attributes and pumps
//   once.
// - **Clear on present**: `clear` records a fill color; `swap` fills the
//   softbuffer surface and presents it.
// - **One event loop per process**: winit refuses to build a second one,
//   so `quit` keeps the loop and `init` reuses it.
//
//=========================================================================

//=== Standard Library Imports ============================================

use std::collections::{HashMap, VecDeque};
use std::num::NonZeroU32;
use std::sync::Arc;
use std::time::Duration;

//=== External Crates =====================================================

use glam::{IVec2, UVec2};
use log::{debug, info, warn};
use softbuffer::{Context, Surface};
use winit::{
    application::ApplicationHandler,
    dpi::{LogicalSize, PhysicalPosition},
    error::OsError,
    event::{DeviceEvent, DeviceId, Ime, WindowEvent},
    event_loop::{ActiveEventLoop, EventLoop, OwnedDisplayHandle},
    platform::pump_events::{EventLoopExtPumpEvents, PumpStatus},
    window::{
        CursorGrabMode, Fullscreen as WinitFullscreen, Window as WinitWindow, WindowAttributes,
        WindowId,
    },
};

//=== Internal Imports ====================================================

use super::input_processor::{text_input, InputProcessor};
use super::{
    ClearColor, ContextHandle, Fullscreen, NativeWindowDesc, Platform, PlatformError,
    WindowFlags, WindowHandle,
};
use crate::core::input::event::{PlatformEvent, WindowEventKind};
use crate::core::input::key::{Key, KEY_STATE_LEN};

//=== Internal Records ====================================================

type PixelSurface = Surface<OwnedDisplayHandle, Arc<WinitWindow>>;

struct NativeContext {
    window: WindowHandle,
    surface: PixelSurface,
    viewport: UVec2,
    fill: u32,
}

/// Packs an RGBA float color into softbuffer's `0RGB` layout.
fn pack_color(color: ClearColor) -> u32 {
    let channel = |c: f32| (c.clamp(0.0, 1.0) * 255.0).round() as u32;
    (channel(color[0]) << 16) | (channel(color[1]) << 8) | channel(color[2])
}

//=== WinitState ==========================================================

/// Everything the `ApplicationHandler` callbacks touch.
struct WinitState {
    windows: HashMap<WindowHandle, Arc<WinitWindow>>,
    ids: HashMap<WindowId, WindowHandle>,

    pending: Option<WindowAttributes>,
    created: Option<Result<WinitWindow, OsError>>,

    events: VecDeque<PlatformEvent>,
    input: InputProcessor,
    key_state: Vec<bool>,
    relative_mouse: bool,
}

impl WinitState {
    fn new() -> Self {
        Self {
            windows: HashMap::new(),
            ids: HashMap::new(),
            pending: None,
            created: None,
            events: VecDeque::new(),
            input: InputProcessor::new(),
            key_state: vec![false; KEY_STATE_LEN],
            relative_mouse: false,
        }
    }

    fn create_pending(&mut self, event_loop: &ActiveEventLoop) {
        if let Some(attrs) = self.pending.take() {
            self.created = Some(event_loop.create_window(attrs));
        }
    }

    fn push_window(&mut self, window: WindowHandle, kind: WindowEventKind) {
        self.events.push_back(PlatformEvent::Window { window, kind });
    }

    /// One OS resize, user-driven or requested, is one `SizeChanged`.
    fn push_resize(&mut self, window: WindowHandle, size: UVec2) {
        self.push_window(window, WindowEventKind::SizeChanged(size));
    }

    fn track_key(&mut self, event: &PlatformEvent) {
        let (key, pressed) = match event {
            PlatformEvent::KeyDown { key, .. } => (*key, true),
            PlatformEvent::KeyUp { key, .. } => (*key, false),
            _ => return,
        };
        if key != Key::Unidentified {
            self.key_state[key.scancode() as usize] = pressed;
        }
    }
}

impl ApplicationHandler for WinitState {
    fn resumed(&mut self, event_loop: &ActiveEventLoop) {
        self.create_pending(event_loop);
    }

    fn about_to_wait(&mut self, event_loop: &ActiveEventLoop) {
        self.create_pending(event_loop);
    }

    fn window_event(&mut self, _: &ActiveEventLoop, id: WindowId, event: WindowEvent) {
        let Some(&handle) = self.ids.get(&id) else {
            return;
        };

        match event {
            //--- Window -------------------------------------------------------
            WindowEvent::CloseRequested => {
                self.push_window(handle, WindowEventKind::Close);
                if self.windows.len() == 1 {
                    self.events.push_back(PlatformEvent::Quit);
                }
            }
            WindowEvent::Resized(physical) => {
                let scale = self
                    .windows
                    .get(&handle)
                    .map(|w| w.scale_factor())
                    .unwrap_or(1.0);
                let logical = physical.to_logical::<u32>(scale);
                self.push_resize(handle, UVec2::new(logical.width, logical.height));
            }
            WindowEvent::Focused(_)
            | WindowEvent::Moved(_)
            | WindowEvent::Occluded(_)
            | WindowEvent::ScaleFactorChanged { .. } => {
                self.push_window(handle, WindowEventKind::Other);
            }

            //--- Keyboard -----------------------------------------------------
            WindowEvent::ModifiersChanged(modifiers) => {
                self.input.update_modifiers(modifiers.state());
            }
            WindowEvent::KeyboardInput { event, .. } => {
                if let Some(key_event) = self.input.process_key_event(&event) {
                    self.track_key(&key_event);
                    self.events.push_back(key_event);
                }
                if let Some(text) = InputProcessor::text_from_key_event(&event) {
                    self.events.push_back(text);
                }
            }
            WindowEvent::Ime(Ime::Preedit(text, cursor)) => {
                self.events.push_back(PlatformEvent::TextEditing { text, cursor });
            }
            WindowEvent::Ime(Ime::Commit(text)) => {
                if let Some(text) = text_input(&text) {
                    self.events.push_back(text);
                }
            }

            //--- Mouse --------------------------------------------------------
            WindowEvent::CursorMoved { position, .. } => {
                let motion = self.input.process_mouse_move(position);
                if !self.relative_mouse {
                    self.events.push_back(motion);
                }
            }
            WindowEvent::MouseInput { state, button, .. } => {
                let event = self.input.process_mouse_button(button, state);
                self.events.push_back(event);
            }
            WindowEvent::MouseWheel { delta, .. } => {
                if let Some(event) = self.input.process_wheel(delta) {
                    self.events.push_back(event);
                }
            }

            WindowEvent::RedrawRequested => {}
            _ => self.events.push_back(PlatformEvent::Other("window")),
        }
    }

    fn device_event(&mut self, _: &ActiveEventLoop, _: DeviceId, event: DeviceEvent) {
        if !self.relative_mouse {
            return;
        }
        if let DeviceEvent::MouseMotion { delta } = event {
            if let Some(motion) = self.input.process_raw_motion(delta) {
                self.events.push_back(motion);
            }
        }
    }
}

//=== WinitPlatform =======================================================

/// Desktop [`Platform`] built on winit and softbuffer.
///
/// Must be used from the main thread on macOS.
pub struct WinitPlatform {
    // Fields drop in order: surfaces, windows, display, event loop.
    contexts: HashMap<ContextHandle, NativeContext>,
    state: WinitState,
    display: Option<Context<OwnedDisplayHandle>>,
    event_loop: Option<EventLoop<()>>,

    next_handle: u32,
    initialized: bool,
    exited: bool,
    cursor_visible: bool,
}

impl WinitPlatform {
    pub fn new() -> Self {
        Self {
            contexts: HashMap::new(),
            state: WinitState::new(),
            display: None,
            event_loop: None,
            next_handle: 1,
            initialized: false,
            exited: false,
            cursor_visible: true,
        }
    }

    //--- Internal Helpers -------------------------------------------------

    fn allocate(&mut self) -> u32 {
        let raw = self.next_handle;
        self.next_handle += 1;
        raw
    }

    fn window(&self, window: WindowHandle) -> Option<&Arc<WinitWindow>> {
        let found = self.state.windows.get(&window);
        if found.is_none() {
            debug!(target: "platform", "Ignoring call on unknown window {:?}", window);
        }
        found
    }

    /// Drains pending OS events into the queue without blocking.
    fn pump(&mut self) {
        if self.exited {
            return;
        }
        let Some(event_loop) = self.event_loop.as_mut() else {
            return;
        };

        let status = event_loop.pump_app_events(Some(Duration::ZERO), &mut self.state);
        self.record_pump_status(status);
    }

    /// An exited loop is never pumped again and leaves a final `Quit`.
    fn record_pump_status(&mut self, status: PumpStatus) {
        if let PumpStatus::Exit(code) = status {
            info!(target: "platform", "Event loop exited (code {})", code);
            self.exited = true;
            self.state.events.push_back(PlatformEvent::Quit);
        }
    }

    fn fullscreen_mode(window: &WinitWindow, fullscreen: Fullscreen) -> Option<WinitFullscreen> {
        match fullscreen {
            Fullscreen::Off => None,
            Fullscreen::Desktop => Some(WinitFullscreen::Borderless(None)),
            Fullscreen::Exclusive => {
                let mode = window
                    .current_monitor()
                    .and_then(|monitor| monitor.video_modes().next());
                match mode {
                    Some(mode) => Some(WinitFullscreen::Exclusive(mode)),
                    None => {
                        warn!(target: "platform", "No video mode available; using desktop fullscreen");
                        Some(WinitFullscreen::Borderless(None))
                    }
                }
            }
        }
    }
}

impl Default for WinitPlatform {
    fn default() -> Self {
        Self::new()
    }
}

//=== Platform Implementation =============================================

impl Platform for WinitPlatform {
    //--- Lifecycle --------------------------------------------------------

    fn init(&mut self) -> Result<(), PlatformError> {
        if self.event_loop.is_none() {
            let event_loop = EventLoop::new().map_err(|e| PlatformError::Init(e.to_string()))?;
            let display = Context::new(event_loop.owned_display_handle())
                .map_err(|e| PlatformError::Init(e.to_string()))?;
            self.event_loop = Some(event_loop);
            self.display = Some(display);
        }
        self.initialized = true;
        self.exited = false;
        info!(target: "platform", "Winit platform initialized");
        Ok(())
    }

    fn quit(&mut self) {
        self.contexts.clear();
        self.state.windows.clear();
        self.state.ids.clear();
        self.state.events.clear();
        self.initialized = false;
        info!(target: "platform", "Winit platform shut down");
    }

    fn is_initialized(&self) -> bool {
        self.initialized
    }

    //--- Events -----------------------------------------------------------

    fn poll_event(&mut self) -> Option<PlatformEvent> {
        if self.state.events.is_empty() {
            self.pump();
        }
        self.state.events.pop_front()
    }

    //--- Windows & Contexts -----------------------------------------------

    fn create_window(&mut self, desc: &NativeWindowDesc) -> Result<WindowHandle, PlatformError> {
        if !self.initialized {
            return Err(PlatformError::NotInitialized);
        }
        let event_loop = self.event_loop.as_mut().ok_or(PlatformError::NotInitialized)?;

        self.state.pending = Some(
            WindowAttributes::default()
                .with_title(desc.title.clone())
                .with_inner_size(LogicalSize::new(desc.size.x, desc.size.y))
                .with_resizable(desc.resizable)
                .with_decorations(desc.bordered),
        );
        if !self.exited {
            let status = event_loop.pump_app_events(Some(Duration::ZERO), &mut self.state);
            self.record_pump_status(status);
        }

        let window = match self.state.created.take() {
            Some(Ok(window)) => Arc::new(window),
            Some(Err(e)) => return Err(PlatformError::WindowCreation(e.to_string())),
            None => {
                self.state.pending = None;
                return Err(PlatformError::WindowCreation("event loop never resumed".into()));
            }
        };

        window.set_fullscreen(Self::fullscreen_mode(&window, desc.fullscreen));
        window.set_cursor_visible(self.cursor_visible);

        let handle = WindowHandle::from_raw(self.allocate());
        self.state.ids.insert(window.id(), handle);
        self.state.windows.insert(handle, window);
        debug!(target: "platform", "Created window {:?} '{}'", handle, desc.title);
        Ok(handle)
    }

    fn destroy_window(&mut self, window: WindowHandle) {
        self.contexts.retain(|_, context| context.window != window);
        if let Some(native) = self.state.windows.remove(&window) {
            self.state.ids.remove(&native.id());
            debug!(target: "platform", "Destroyed window {:?}", window);
        }
    }

    fn create_context(&mut self, window: WindowHandle) -> Result<ContextHandle, PlatformError> {
        let native = self
            .state
            .windows
            .get(&window)
            .cloned()
            .ok_or(PlatformError::InvalidHandle)?;
        let display = self.display.as_ref().ok_or(PlatformError::NotInitialized)?;

        let surface = Surface::new(display, native.clone())
            .map_err(|e| PlatformError::ContextCreation(e.to_string()))?;
        let size = native.inner_size();

        let handle = ContextHandle::from_raw(self.allocate());
        self.contexts.insert(
            handle,
            NativeContext {
                window,
                surface,
                viewport: UVec2::new(size.width, size.height),
                fill: 0,
            },
        );
        Ok(handle)
    }

    fn destroy_context(&mut self, context: ContextHandle) {
        self.contexts.remove(&context);
    }

    fn window_title(&self, window: WindowHandle) -> Option<String> {
        self.state.windows.get(&window).map(|w| w.title())
    }

    fn set_window_title(&mut self, window: WindowHandle, title: &str) {
        if let Some(w) = self.window(window) {
            w.set_title(title);
        }
    }

    fn window_size(&self, window: WindowHandle) -> UVec2 {
        self.state
            .windows
            .get(&window)
            .map(|w| {
                let logical = w.inner_size().to_logical::<u32>(w.scale_factor());
                UVec2::new(logical.width, logical.height)
            })
            .unwrap_or(UVec2::ZERO)
    }

    fn set_window_size(&mut self, window: WindowHandle, size: UVec2) {
        if let Some(w) = self.window(window) {
            let _ = w.request_inner_size(LogicalSize::new(size.x, size.y));
        }
    }

    fn drawable_size(&self, window: WindowHandle) -> UVec2 {
        self.state
            .windows
            .get(&window)
            .map(|w| {
                let physical = w.inner_size();
                UVec2::new(physical.width, physical.height)
            })
            .unwrap_or(UVec2::ZERO)
    }

    fn window_flags(&self, window: WindowHandle) -> WindowFlags {
        let Some(w) = self.state.windows.get(&window) else {
            return WindowFlags::default();
        };
        let fullscreen = w.fullscreen();
        WindowFlags {
            fullscreen: matches!(fullscreen, Some(WinitFullscreen::Exclusive(_))),
            fullscreen_desktop: matches!(fullscreen, Some(WinitFullscreen::Borderless(_))),
            borderless: !w.is_decorated(),
            resizable: w.is_resizable(),
        }
    }

    fn set_fullscreen(&mut self, window: WindowHandle, fullscreen: Fullscreen) {
        if let Some(w) = self.window(window) {
            w.set_fullscreen(Self::fullscreen_mode(w, fullscreen));
        }
    }

    fn set_resizable(&mut self, window: WindowHandle, resizable: bool) {
        if let Some(w) = self.window(window) {
            w.set_resizable(resizable);
        }
    }

    fn set_bordered(&mut self, window: WindowHandle, bordered: bool) {
        if let Some(w) = self.window(window) {
            w.set_decorations(bordered);
        }
    }

    //--- Drawing ----------------------------------------------------------

    fn set_viewport(&mut self, context: ContextHandle, size: UVec2) {
        if let Some(ctx) = self.contexts.get_mut(&context) {
            ctx.viewport = size;
        }
    }

    fn clear(&mut self, context: ContextHandle, color: ClearColor) {
        if let Some(ctx) = self.contexts.get_mut(&context) {
            ctx.fill = pack_color(color);
        }
    }

    fn swap(&mut self, window: WindowHandle) -> Result<(), PlatformError> {
        let native = self
            .state
            .windows
            .get(&window)
            .cloned()
            .ok_or(PlatformError::InvalidHandle)?;
        let Some(ctx) = self.contexts.values_mut().find(|c| c.window == window) else {
            return Err(PlatformError::InvalidHandle);
        };

        let (Some(width), Some(height)) =
            (NonZeroU32::new(ctx.viewport.x), NonZeroU32::new(ctx.viewport.y))
        else {
            // Minimized; nothing to present.
            return Ok(());
        };

        let present = |e: softbuffer::SoftBufferError| PlatformError::Present(e.to_string());
        ctx.surface.resize(width, height).map_err(present)?;
        let mut buffer = ctx.surface.buffer_mut().map_err(present)?;
        buffer.fill(ctx.fill);

        native.pre_present_notify();
        buffer.present().map_err(present)
    }

    //--- Keyboard ---------------------------------------------------------

    fn key_state(&self) -> &[bool] {
        &self.state.key_state
    }

    //--- Mouse ------------------------------------------------------------

    fn set_cursor_visible(&mut self, visible: bool) {
        self.cursor_visible = visible;
        for w in self.state.windows.values() {
            w.set_cursor_visible(visible);
        }
    }

    fn is_cursor_visible(&self) -> bool {
        self.cursor_visible
    }

    fn set_relative_mouse_mode(&mut self, enabled: bool) {
        self.state.relative_mouse = enabled;
        for w in self.state.windows.values() {
            let result = if enabled {
                w.set_cursor_grab(CursorGrabMode::Locked)
                    .or_else(|_| w.set_cursor_grab(CursorGrabMode::Confined))
            } else {
                w.set_cursor_grab(CursorGrabMode::None)
            };
            if let Err(e) = result {
                warn!(target: "platform", "Cursor grab change failed: {}", e);
            }
        }
    }

    fn cursor_position(&self) -> IVec2 {
        self.state.input.cursor()
    }

    fn warp_cursor(&mut self, window: WindowHandle, position: IVec2) {
        let Some(w) = self.window(window) else {
            return;
        };
        match w.set_cursor_position(PhysicalPosition::new(position.x, position.y)) {
            Ok(()) => self.state.input.set_cursor(position),
            Err(e) => warn!(target: "platform", "Cursor warp failed: {}", e),
        }
    }
}

//=========================================================================
// Unit Tests
//=========================================================================
