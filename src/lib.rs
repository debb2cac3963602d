//=========================================================================
// Rime Engine: Library Root
//
// Public API surface of the engine core.
//
// Responsibilities:
// - Expose the engine facade (`Engine`, `EngineBuilder`)
// - Expose the components it owns (window, keyboard, mouse) and the
//   signals they publish through
// - Expose the diagnostics facility and its macros
// - Expose the `Platform` seam with a desktop and a headless backend
//
// Typical usage:
// ```no_run
// use rime_engine::EngineBuilder;
//
// fn main() -> Result<(), rime_engine::EngineError> {
//     EngineBuilder::new().build()?.run();
//     Ok(())
// }
// ```
//
//=========================================================================

//--- Public Modules ------------------------------------------------------
//
// `core` holds the components (window, input, signals, diagnostics).
// `platform` holds the backend trait and its implementations; tests and
// tools drive the engine through `HeadlessPlatform`.
//
pub mod core;
pub mod platform;
pub mod prelude;

//--- Internal Modules ----------------------------------------------------

mod engine;

//--- Public Exports ------------------------------------------------------

pub use engine::{Engine, EngineBuilder, EngineError, StopHandle};
