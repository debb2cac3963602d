//=========================================================================
// Core
//
// Engine components that sit above the platform seam.
//
// Layout:
// ```text
//   signal   Signal / Connection publish-subscribe
//   input    Keyboard, Mouse, PlatformEvent, Key
//   window   Window (native window + graphics context)
//   debug    trace / fail / checks, stack traces, crash handling
// ```
//
//=========================================================================

pub mod debug;
pub mod input;
pub mod signal;
pub mod window;
