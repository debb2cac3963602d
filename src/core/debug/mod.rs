//=========================================================================
// Diagnostics
//
// Trace lines, fatal assertions, stack traces and crash dumps.
//
// Macros (exported at the crate root):
// ```text
//   trace!("loaded {} assets", n)   -> "loader.rs(42): load_all: loaded 3 assets"
//   fail!() / fail!("reason")       -> trace, dump, exit(1)
//   check!(cond)                    -> fail("check failed") when false
//   require!(cond)                  -> precondition,  "require failed"
//   ensure!(cond)                   -> postcondition, "ensure failed"
// ```
//
// Fatal path:
// ```text
//   fail ─> trace line ─┬─ debugger attached ─> abort (traps into it)
//                       └─ otherwise ─> crash dump ─> error! ─> exit(1)
// ```
//
// Trace lines go to a process-wide sink (stderr by default). Sinks are
// swapped with `set_trace_sink`, which hands back the previous one so it
// can be restored.
//
//=========================================================================

//=== Submodules ==========================================================

pub mod crash;
pub mod stack;

//=== Standard Library Imports ============================================

use std::fmt;
use std::io::Write;
use std::sync::{Arc, RwLock};

//=== External Crates =====================================================

use log::error;

//=== Re-exports ==========================================================

pub use crash::{
    create_crash_dump_name, crash_dumps_enabled, set_crash_dump_prefix,
    set_crash_dumps_enabled, write_crash_dump, CrashHandler, NO_CRASH_DUMP_ENV,
};
pub use stack::{get_stack_trace, StackFrame};

//=== SourceLocation ======================================================

/// Where a trace or failure originated.
///
/// Built by [`source_location!`](crate::source_location); `function` is
/// the fully qualified path of the enclosing function.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct SourceLocation {
    pub file: &'static str,
    pub line: u32,
    pub function: &'static str,
}

impl SourceLocation {
    pub const fn new(file: &'static str, line: u32, function: &'static str) -> Self {
        Self {
            file,
            line,
            function,
        }
    }

    /// File name without its directory.
    pub fn file_name(&self) -> &'static str {
        self.file
            .rsplit(['/', '\\'])
            .next()
            .unwrap_or(self.file)
    }

    /// Innermost named function, skipping closure frames.
    pub fn function_name(&self) -> &'static str {
        self.function
            .rsplit("::")
            .find(|segment| !segment.starts_with("{{"))
            .unwrap_or(self.function)
    }
}

impl fmt::Display for SourceLocation {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "{}({}): {}", self.file_name(), self.line, self.function_name())
    }
}

//=== Trace Sink ==========================================================

/// Destination for formatted trace lines (each ends with `\n`).
pub type TraceSink = Arc<dyn Fn(&str) + Send + Sync>;

static TRACE_SINK: RwLock<Option<TraceSink>> = RwLock::new(None);

/// Replaces the trace sink; `None` restores stderr. Returns the previous
/// sink (`None` if it was stderr).
pub fn set_trace_sink(sink: Option<TraceSink>) -> Option<TraceSink> {
    let mut slot = TRACE_SINK.write().unwrap_or_else(|e| e.into_inner());
    std::mem::replace(&mut *slot, sink)
}

fn write_line(line: &str) {
    let sink = TRACE_SINK
        .read()
        .unwrap_or_else(|e| e.into_inner())
        .clone();

    match sink {
        Some(sink) => sink(line),
        None => {
            let mut stderr = std::io::stderr().lock();
            let _ = stderr.write_all(line.as_bytes());
            let _ = stderr.flush();
        }
    }
}

//=== Trace & Fail ========================================================

/// Writes `"<file>(<line>): <function>: <message>\n"` to the trace sink.
pub fn trace(message: &str, location: SourceLocation) {
    write_line(&format!("{}: {}\n", location, message));
}

/// Reports a fatal error and terminates the process.
///
/// With a debugger attached the process aborts so the debugger stops at
/// the failure. Otherwise a crash dump is written (unless disabled) and
/// the process exits with status 1.
pub fn fail(message: &str, location: SourceLocation) -> ! {
    trace(message, location);

    if debugger_attached() {
        error!(target: "debug", "{}: {} (debugger attached, aborting)", location, message);
        std::process::abort();
    }

    if crash_dumps_enabled() {
        let path = crash::default_dump_path();
        crash::write_report(&path, Some(message));
    }

    error!(target: "debug", "Fatal error at {}: {}", location, message);
    std::process::exit(1)
}

/// Whether a tracer (debugger) is attached to this process.
#[cfg(target_os = "linux")]
pub fn debugger_attached() -> bool {
    std::fs::read_to_string("/proc/self/status")
        .ok()
        .and_then(|status| parse_tracer_pid(&status))
        .is_some_and(|pid| pid != 0)
}

/// Whether a tracer (debugger) is attached to this process.
#[cfg(not(target_os = "linux"))]
pub fn debugger_attached() -> bool {
    false
}

#[cfg_attr(not(target_os = "linux"), allow(dead_code))]
fn parse_tracer_pid(status: &str) -> Option<u32> {
    status
        .lines()
        .find_map(|line| line.strip_prefix("TracerPid:"))
        .and_then(|value| value.trim().parse().ok())
}

//=== Macros ==============================================================

/// Captures file, line and enclosing function as a
/// [`SourceLocation`](crate::core::debug::SourceLocation).
#[macro_export]
macro_rules! source_location {
    () => {{
        fn __here() {}
        fn __type_name_of<T>(_: T) -> &'static str {
            ::std::any::type_name::<T>()
        }
        let name = __type_name_of(__here);
        $crate::core::debug::SourceLocation::new(
            ::std::file!(),
            ::std::line!(),
            name.strip_suffix("::__here").unwrap_or(name),
        )
    }};
}

/// Writes a formatted trace line tagged with the call site.
#[macro_export]
macro_rules! trace {
    ($($arg:tt)+) => {
        $crate::core::debug::trace(&::std::format!($($arg)+), $crate::source_location!())
    };
}

/// Terminates the process with a formatted message (default `"failed"`).
#[macro_export]
macro_rules! fail {
    () => {
        $crate::core::debug::fail("failed", $crate::source_location!())
    };
    ($($arg:tt)+) => {
        $crate::core::debug::fail(&::std::format!($($arg)+), $crate::source_location!())
    };
}

/// Fails with `"check failed"` when the condition is false.
#[macro_export]
macro_rules! check {
    ($cond:expr $(,)?) => {
        if !$cond {
            $crate::core::debug::fail("check failed", $crate::source_location!());
        }
    };
    ($cond:expr, $($arg:tt)+) => {
        if !$cond {
            $crate::core::debug::fail(
                &::std::format!("check failed: {}", ::std::format_args!($($arg)+)),
                $crate::source_location!(),
            );
        }
    };
}

/// Precondition: fails with `"require failed"` when false.
#[macro_export]
macro_rules! require {
    ($cond:expr $(,)?) => {
        if !$cond {
            $crate::core::debug::fail("require failed", $crate::source_location!());
        }
    };
    ($cond:expr, $($arg:tt)+) => {
        if !$cond {
            $crate::core::debug::fail(
                &::std::format!("require failed: {}", ::std::format_args!($($arg)+)),
                $crate::source_location!(),
            );
        }
    };
}

/// Postcondition: fails with `"ensure failed"` when false.
#[macro_export]
macro_rules! ensure {
    ($cond:expr $(,)?) => {
        if !$cond {
            $crate::core::debug::fail("ensure failed", $crate::source_location!());
        }
    };
    ($cond:expr, $($arg:tt)+) => {
        if !$cond {
            $crate::core::debug::fail(
                &::std::format!("ensure failed: {}", ::std::format_args!($($arg)+)),
                $crate::source_location!(),
            );
        }
    };
}

//=========================================================================
// Unit Tests
//=========================================================================

#[cfg(test)]
pub(crate) mod tests {
    use super::*;
    use std::sync::{Mutex, MutexGuard};

    /// Serializes tests that touch the process-wide sink or panic hook.
    pub(crate) fn global_lock() -> MutexGuard<'static, ()> {
        static LOCK: Mutex<()> = Mutex::new(());
        LOCK.lock().unwrap_or_else(|e| e.into_inner())
    }

    /// Runs `f` with trace output captured into a string.
    pub(crate) fn capture_trace<F: FnOnce()>(f: F) -> String {
        let captured = Arc::new(Mutex::new(String::new()));
        let sink = captured.clone();
        let previous = set_trace_sink(Some(Arc::new(move |line: &str| {
            sink.lock().unwrap().push_str(line);
        })));

        f();

        set_trace_sink(previous);
        let out = captured.lock().unwrap().clone();
        out
    }

    //=====================================================================
    // SourceLocation
    //=====================================================================

    #[test]
    fn file_name_strips_directories() {
        let unix = SourceLocation::new("src/core/debug/mod.rs", 1, "f");
        let windows = SourceLocation::new("src\\core\\window.rs", 1, "f");
        assert_eq!(unix.file_name(), "mod.rs");
        assert_eq!(windows.file_name(), "window.rs");
    }

    #[test]
    fn function_name_skips_closures() {
        let loc = SourceLocation::new("a.rs", 1, "crate::module::outer::{{closure}}::{{closure}}");
        assert_eq!(loc.function_name(), "outer");
    }

    #[test]
    fn source_location_names_enclosing_function() {
        let loc = crate::source_location!();
        assert_eq!(loc.file_name(), "mod.rs");
        assert_eq!(loc.function_name(), "source_location_names_enclosing_function");
        assert_eq!(loc.line, line!() - 3);
    }

    //=====================================================================
    // Trace
    //=====================================================================

    #[test]
    fn trace_line_format() {
        let _guard = global_lock();
        let mut line = 0;
        let out = capture_trace(|| {
            line = line!() + 1;
            crate::trace!("value is {}", 7);
        });
        assert_eq!(out, format!("mod.rs({}): trace_line_format: value is 7\n", line));
    }

    #[test]
    fn passing_checks_are_silent() {
        let _guard = global_lock();
        let out = capture_trace(|| {
            crate::check!(1 + 1 == 2);
            crate::require!(true);
            crate::ensure!(!false, "with {}", "context");
        });
        assert!(out.is_empty());
    }

    #[test]
    fn set_trace_sink_returns_previous() {
        let _guard = global_lock();
        let first: TraceSink = Arc::new(|_: &str| {});
        let old = set_trace_sink(Some(first.clone()));
        let replaced = set_trace_sink(old);
        assert!(Arc::ptr_eq(&replaced.unwrap(), &first));
    }

    //=====================================================================
    // Debugger Detection
    //=====================================================================

    #[test]
    fn tracer_pid_parsing() {
        let status = "Name:\tcargo\nTracerPid:\t0\nUid:\t1000\n";
        assert_eq!(parse_tracer_pid(status), Some(0));
        assert_eq!(parse_tracer_pid("TracerPid:\t4242\n"), Some(4242));
        assert_eq!(parse_tracer_pid("Name:\tx\n"), None);
    }
}
