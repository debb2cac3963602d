//=========================================================================
// Prelude
//=========================================================================
//
// Convenience module that re-exports commonly used types.
//
// Usage:
//   use rime_engine::prelude::*;
//
//=========================================================================

//=== Public API ==========================================================

// Engine core
pub use crate::engine::{Engine, EngineBuilder, EngineError, StopHandle};

// Window
pub use crate::core::window::{Window, WindowDesc, WindowError, WindowMode};

// Input
pub use crate::core::input::{Key, Keyboard, Modifiers, Mouse, MouseButton};

// Signals
pub use crate::core::signal::{Connection, ScopedConnection, Signal};

// Diagnostics
pub use crate::core::debug::CrashHandler;

// Math
pub use glam::{IVec2, UVec2};
