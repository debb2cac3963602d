//=========================================================================
// Headless Platform
//=========================================================================
//
// In-memory backend with no display connection.
//
// - Windows and contexts are plain records; every native operation is
//   appended to a call log so callers can assert on exact sequences.
// - Events come from a local script queue (`push_event`) and from any
//   number of cross-thread `EventInjector`s (crossbeam channel).
// - Programmatic size changes post a `SizeChanged` event, matching what
//   desktop backends do.
//
//=========================================================================

//=== Standard Library Imports ============================================

use std::collections::{BTreeMap, VecDeque};

//=== External Crates =====================================================

use crossbeam_channel::{unbounded, Receiver, Sender, TrySendError};
use glam::{IVec2, UVec2};
use log::{debug, info};

//=== Internal Imports ====================================================

use super::{
    ClearColor, ContextHandle, Fullscreen, NativeWindowDesc, Platform, PlatformError,
    WindowFlags, WindowHandle,
};
use crate::core::input::event::{PlatformEvent, WindowEventKind};
use crate::core::input::key::{Key, KEY_STATE_LEN};

//=== NativeCall ==========================================================

/// One native operation issued against the headless backend.
#[derive(Debug, Clone, PartialEq)]
pub enum NativeCall {
    Init,
    Quit,
    CreateWindow(WindowHandle),
    DestroyWindow(WindowHandle),
    CreateContext(ContextHandle),
    DestroyContext(ContextHandle),
    SetTitle(WindowHandle, String),
    SetSize(WindowHandle, UVec2),
    SetFullscreen(WindowHandle, Fullscreen),
    SetResizable(WindowHandle, bool),
    SetBordered(WindowHandle, bool),
    SetViewport(ContextHandle, UVec2),
    Clear(ContextHandle, ClearColor),
    Swap(WindowHandle),
    SetCursorVisible(bool),
    SetRelativeMouseMode(bool),
    WarpCursor(WindowHandle, IVec2),
}

//=== EventInjector =======================================================

/// Cross-thread producer of events for a [`HeadlessPlatform`].
///
/// Cloneable and `Send`; events arrive in send order after any locally
/// scripted events.
#[derive(Debug, Clone)]
pub struct EventInjector {
    sender: Sender<PlatformEvent>,
}

impl EventInjector {
    /// Queues `event`. Returns `false` if the platform has been dropped.
    pub fn send(&self, event: PlatformEvent) -> bool {
        match self.sender.try_send(event) {
            Ok(()) => true,
            Err(TrySendError::Disconnected(_)) | Err(TrySendError::Full(_)) => false,
        }
    }
}

//=== Internal Records ====================================================

#[derive(Debug, Clone)]
struct HeadlessWindow {
    title: String,
    size: UVec2,
    flags: WindowFlags,
    frames: u64,
}

//=== HeadlessPlatform ====================================================

/// Display-less [`Platform`] implementation.
///
/// # Examples
///
/// ```
/// use rime_engine::core::input::event::PlatformEvent;
/// use rime_engine::platform::{HeadlessPlatform, Platform};
///
/// let mut platform = HeadlessPlatform::new();
/// platform.init().unwrap();
/// platform.push_event(PlatformEvent::Quit);
///
/// assert_eq!(platform.poll_event(), Some(PlatformEvent::Quit));
/// assert_eq!(platform.poll_event(), None);
/// ```
pub struct HeadlessPlatform {
    initialized: bool,
    scale_factor: u32,

    windows: BTreeMap<WindowHandle, HeadlessWindow>,
    contexts: BTreeMap<ContextHandle, WindowHandle>,
    next_handle: u32,

    script: VecDeque<PlatformEvent>,
    injected: Receiver<PlatformEvent>,
    injector: Sender<PlatformEvent>,

    key_state: Vec<bool>,
    cursor_visible: bool,
    relative_mouse: bool,
    cursor_position: IVec2,

    calls: Vec<NativeCall>,

    init_failure: Option<String>,
    window_failure: Option<String>,
    context_failure: Option<String>,
}

impl HeadlessPlatform {
    //--- Construction -----------------------------------------------------

    pub fn new() -> Self {
        let (injector, injected) = unbounded();
        Self {
            initialized: false,
            scale_factor: 1,
            windows: BTreeMap::new(),
            contexts: BTreeMap::new(),
            next_handle: 1,
            script: VecDeque::new(),
            injected,
            injector,
            key_state: vec![false; KEY_STATE_LEN],
            cursor_visible: true,
            relative_mouse: false,
            cursor_position: IVec2::ZERO,
            calls: Vec::new(),
            init_failure: None,
            window_failure: None,
            context_failure: None,
        }
    }

    /// Drawable size = logical size × `factor` (simulated HiDPI).
    pub fn with_scale_factor(mut self, factor: u32) -> Self {
        self.scale_factor = factor.max(1);
        self
    }

    /// Makes `init()` fail with `message`.
    pub fn with_init_failure(mut self, message: impl Into<String>) -> Self {
        self.init_failure = Some(message.into());
        self
    }

    /// Makes every `create_window()` fail with `message`.
    pub fn with_window_failure(mut self, message: impl Into<String>) -> Self {
        self.window_failure = Some(message.into());
        self
    }

    /// Makes every `create_context()` fail with `message`.
    pub fn with_context_failure(mut self, message: impl Into<String>) -> Self {
        self.context_failure = Some(message.into());
        self
    }

    //--- Scripting --------------------------------------------------------

    /// Queues an event for the next `poll_event()`.
    pub fn push_event(&mut self, event: PlatformEvent) {
        self.script.push_back(event);
    }

    /// Queues several events in order.
    pub fn push_events<I: IntoIterator<Item = PlatformEvent>>(&mut self, events: I) {
        self.script.extend(events);
    }

    /// Returns a `Send` handle for feeding events from other threads.
    pub fn injector(&self) -> EventInjector {
        EventInjector {
            sender: self.injector.clone(),
        }
    }

    /// Sets the pressed state of `key` without generating an event.
    pub fn set_key_pressed(&mut self, key: Key, pressed: bool) {
        self.key_state[key.scancode() as usize] = pressed;
    }

    /// Moves the simulated cursor without generating an event.
    pub fn set_cursor(&mut self, position: IVec2) {
        self.cursor_position = position;
    }

    /// Overrides the raw flags reported for `window`.
    pub fn set_flags(&mut self, window: WindowHandle, flags: WindowFlags) {
        if let Some(w) = self.windows.get_mut(&window) {
            w.flags = flags;
        }
    }

    //--- Inspection -------------------------------------------------------

    /// Every native call issued so far, oldest first.
    pub fn calls(&self) -> &[NativeCall] {
        &self.calls
    }

    pub fn clear_calls(&mut self) {
        self.calls.clear();
    }

    pub fn live_windows(&self) -> usize {
        self.windows.len()
    }

    pub fn live_contexts(&self) -> usize {
        self.contexts.len()
    }

    /// Number of frames presented to `window`.
    pub fn frames_presented(&self, window: WindowHandle) -> u64 {
        self.windows.get(&window).map(|w| w.frames).unwrap_or(0)
    }

    pub fn is_relative_mouse_mode(&self) -> bool {
        self.relative_mouse
    }

    pub fn pending_events(&self) -> usize {
        self.script.len() + self.injected.len()
    }

    //--- Internal Helpers -------------------------------------------------

    fn allocate(&mut self) -> u32 {
        let raw = self.next_handle;
        self.next_handle += 1;
        raw
    }

    fn window_mut(&mut self, window: WindowHandle) -> Option<&mut HeadlessWindow> {
        let found = self.windows.get_mut(&window);
        if found.is_none() {
            debug!(target: "platform", "Ignoring call on unknown window {:?}", window);
        }
        found
    }
}

impl Default for HeadlessPlatform {
    fn default() -> Self {
        Self::new()
    }
}

//=== Platform Implementation =============================================

impl Platform for HeadlessPlatform {
    //--- Lifecycle --------------------------------------------------------

    fn init(&mut self) -> Result<(), PlatformError> {
        if let Some(message) = &self.init_failure {
            return Err(PlatformError::Init(message.clone()));
        }
        self.calls.push(NativeCall::Init);
        self.initialized = true;
        info!(target: "platform", "Headless platform initialized");
        Ok(())
    }

    fn quit(&mut self) {
        let contexts: Vec<_> = self.contexts.keys().copied().collect();
        for context in contexts {
            self.destroy_context(context);
        }
        let windows: Vec<_> = self.windows.keys().copied().collect();
        for window in windows {
            self.destroy_window(window);
        }
        self.calls.push(NativeCall::Quit);
        self.initialized = false;
        info!(target: "platform", "Headless platform shut down");
    }

    fn is_initialized(&self) -> bool {
        self.initialized
    }

    //--- Events -----------------------------------------------------------

    fn poll_event(&mut self) -> Option<PlatformEvent> {
        self.script
            .pop_front()
            .or_else(|| self.injected.try_recv().ok())
    }

    //--- Windows & Contexts -----------------------------------------------

    fn create_window(&mut self, desc: &NativeWindowDesc) -> Result<WindowHandle, PlatformError> {
        if !self.initialized {
            return Err(PlatformError::NotInitialized);
        }
        if let Some(message) = &self.window_failure {
            return Err(PlatformError::WindowCreation(message.clone()));
        }

        let handle = WindowHandle::from_raw(self.allocate());
        self.windows.insert(
            handle,
            HeadlessWindow {
                title: desc.title.clone(),
                size: desc.size,
                flags: WindowFlags {
                    fullscreen: desc.fullscreen == Fullscreen::Exclusive,
                    fullscreen_desktop: desc.fullscreen == Fullscreen::Desktop,
                    borderless: !desc.bordered,
                    resizable: desc.resizable,
                },
                frames: 0,
            },
        );
        self.calls.push(NativeCall::CreateWindow(handle));
        Ok(handle)
    }

    fn destroy_window(&mut self, window: WindowHandle) {
        if self.windows.remove(&window).is_some() {
            self.calls.push(NativeCall::DestroyWindow(window));
        }
    }

    fn create_context(&mut self, window: WindowHandle) -> Result<ContextHandle, PlatformError> {
        if !self.windows.contains_key(&window) {
            return Err(PlatformError::InvalidHandle);
        }
        if let Some(message) = &self.context_failure {
            return Err(PlatformError::ContextCreation(message.clone()));
        }

        let handle = ContextHandle::from_raw(self.allocate());
        self.contexts.insert(handle, window);
        self.calls.push(NativeCall::CreateContext(handle));
        Ok(handle)
    }

    fn destroy_context(&mut self, context: ContextHandle) {
        if self.contexts.remove(&context).is_some() {
            self.calls.push(NativeCall::DestroyContext(context));
        }
    }

    fn window_title(&self, window: WindowHandle) -> Option<String> {
        self.windows.get(&window).map(|w| w.title.clone())
    }

    fn set_window_title(&mut self, window: WindowHandle, title: &str) {
        if let Some(w) = self.window_mut(window) {
            w.title = title.to_owned();
            self.calls.push(NativeCall::SetTitle(window, title.to_owned()));
        }
    }

    fn window_size(&self, window: WindowHandle) -> UVec2 {
        self.windows.get(&window).map(|w| w.size).unwrap_or(UVec2::ZERO)
    }

    fn set_window_size(&mut self, window: WindowHandle, size: UVec2) {
        let Some(w) = self.window_mut(window) else {
            return;
        };
        let changed = w.size != size;
        w.size = size;
        self.calls.push(NativeCall::SetSize(window, size));

        if changed {
            self.script.push_back(PlatformEvent::Window {
                window,
                kind: WindowEventKind::SizeChanged(size),
            });
        }
    }

    fn drawable_size(&self, window: WindowHandle) -> UVec2 {
        self.window_size(window) * self.scale_factor
    }

    fn window_flags(&self, window: WindowHandle) -> WindowFlags {
        self.windows.get(&window).map(|w| w.flags).unwrap_or_default()
    }

    fn set_fullscreen(&mut self, window: WindowHandle, fullscreen: Fullscreen) {
        if let Some(w) = self.window_mut(window) {
            w.flags.fullscreen = fullscreen == Fullscreen::Exclusive;
            w.flags.fullscreen_desktop = fullscreen == Fullscreen::Desktop;
            self.calls.push(NativeCall::SetFullscreen(window, fullscreen));
        }
    }

    fn set_resizable(&mut self, window: WindowHandle, resizable: bool) {
        if let Some(w) = self.window_mut(window) {
            w.flags.resizable = resizable;
            self.calls.push(NativeCall::SetResizable(window, resizable));
        }
    }

    fn set_bordered(&mut self, window: WindowHandle, bordered: bool) {
        if let Some(w) = self.window_mut(window) {
            w.flags.borderless = !bordered;
            self.calls.push(NativeCall::SetBordered(window, bordered));
        }
    }

    //--- Drawing ----------------------------------------------------------

    fn set_viewport(&mut self, context: ContextHandle, size: UVec2) {
        if self.contexts.contains_key(&context) {
            self.calls.push(NativeCall::SetViewport(context, size));
        }
    }

    fn clear(&mut self, context: ContextHandle, color: ClearColor) {
        if self.contexts.contains_key(&context) {
            self.calls.push(NativeCall::Clear(context, color));
        }
    }

    fn swap(&mut self, window: WindowHandle) -> Result<(), PlatformError> {
        let w = self.windows.get_mut(&window).ok_or(PlatformError::InvalidHandle)?;
        w.frames += 1;
        self.calls.push(NativeCall::Swap(window));
        Ok(())
    }

    //--- Keyboard ---------------------------------------------------------

    fn key_state(&self) -> &[bool] {
        &self.key_state
    }

    //--- Mouse ------------------------------------------------------------

    fn set_cursor_visible(&mut self, visible: bool) {
        self.cursor_visible = visible;
        self.calls.push(NativeCall::SetCursorVisible(visible));
    }

    fn is_cursor_visible(&self) -> bool {
        self.cursor_visible
    }

    fn set_relative_mouse_mode(&mut self, enabled: bool) {
        self.relative_mouse = enabled;
        self.calls.push(NativeCall::SetRelativeMouseMode(enabled));
    }

    fn cursor_position(&self) -> IVec2 {
        self.cursor_position
    }

    fn warp_cursor(&mut self, window: WindowHandle, position: IVec2) {
        if self.windows.contains_key(&window) {
            self.cursor_position = position;
            self.calls.push(NativeCall::WarpCursor(window, position));
        }
    }
}

//=========================================================================
// Unit Tests
//=========================================================================
