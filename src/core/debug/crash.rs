//=========================================================================
// Crash Handling
//
// Crash reports and the scoped panic-hook guard.
//
// Handler stack:
// ```text
//   CrashHandler::new()  (first)  take_hook() -> saved, set_hook(crash_hook)
//   CrashHandler::new()  (more)   push id
//   drop(any guard)               remove that guard's id
//   drop(last guard)              set_hook(saved)
// ```
//
// Guards may be dropped in any order; the hook stays installed while at
// least one is alive.
//
//=========================================================================

//=== Standard Library Imports ============================================

use std::fmt::Write as _;
use std::panic::{self, PanicHookInfo};
use std::path::{Path, PathBuf};
use std::sync::atomic::{AtomicBool, Ordering};
use std::sync::{Mutex, MutexGuard, RwLock};

//=== External Crates =====================================================

use chrono::Local;
use log::{error, info};

//=== Internal Imports ====================================================

use super::stack::{format_stack_trace, get_stack_trace};
use super::SourceLocation;

//=== Settings ============================================================

/// Setting this environment variable (to anything) disables crash dumps.
pub const NO_CRASH_DUMP_ENV: &str = "RIME_NO_CRASH_DUMP";

const DEFAULT_PREFIX: &str = "rime";

static DUMPS_ENABLED: AtomicBool = AtomicBool::new(true);
static DUMP_PREFIX: RwLock<Option<String>> = RwLock::new(None);

/// Turns crash-dump writing on `fail` on or off for the whole process.
pub fn set_crash_dumps_enabled(enabled: bool) {
    DUMPS_ENABLED.store(enabled, Ordering::Release);
}

/// Whether `fail` writes a crash dump.
pub fn crash_dumps_enabled() -> bool {
    DUMPS_ENABLED.load(Ordering::Acquire) && std::env::var_os(NO_CRASH_DUMP_ENV).is_none()
}

/// File-name prefix for dumps written by `fail` (default `"rime"`).
pub fn set_crash_dump_prefix(prefix: impl Into<String>) {
    *DUMP_PREFIX.write().unwrap_or_else(|e| e.into_inner()) = Some(prefix.into());
}

pub(crate) fn default_dump_path() -> PathBuf {
    let prefix = DUMP_PREFIX.read().unwrap_or_else(|e| e.into_inner());
    create_crash_dump_name(prefix.as_deref().unwrap_or(DEFAULT_PREFIX))
}

//=== Crash Dumps =========================================================

/// `<temp dir>/<prefix>_<YYYY-MM-DD_HH-MM-SS>.dmp`, local time.
pub fn create_crash_dump_name(prefix: &str) -> PathBuf {
    let stamp = Local::now().format("%Y-%m-%d_%H-%M-%S");
    std::env::temp_dir().join(format!("{}_{}.dmp", prefix, stamp))
}

/// Writes a crash report for the calling thread to `path`.
///
/// Returns `false` if the file could not be written; the failure is
/// traced, never escalated.
pub fn write_crash_dump(path: &Path) -> bool {
    write_report(path, None)
}

pub(crate) fn write_report(path: &Path, reason: Option<&str>) -> bool {
    let report = render_report(reason);
    match std::fs::write(path, report) {
        Ok(()) => {
            crate::trace!("Crash dump written to {}", path.display());
            true
        }
        Err(e) => {
            crate::trace!("Unable to write crash dump to {}: {}", path.display(), e);
            false
        }
    }
}

fn render_report(reason: Option<&str>) -> String {
    let thread = std::thread::current();
    let mut report = String::new();

    let _ = writeln!(report, "Crash report");
    let _ = writeln!(report, "Time: {}", Local::now().format("%Y-%m-%d %H:%M:%S%.3f %z"));
    let _ = writeln!(report, "Process: {}", std::process::id());
    let _ = writeln!(
        report,
        "Thread: {} ({:?})",
        thread.name().unwrap_or("<unnamed>"),
        thread.id()
    );
    if let Some(reason) = reason {
        let _ = writeln!(report, "Reason: {}", reason);
    }
    let _ = writeln!(report, "\nStack trace:");
    report.push_str(&format_stack_trace(&get_stack_trace()));
    report
}

//=== Handler Stack =======================================================

type PanicHook = Box<dyn Fn(&PanicHookInfo<'_>) + Sync + Send + 'static>;

struct HandlerStack {
    active: Vec<u64>,
    next_id: u64,
    saved: Option<PanicHook>,
}

static HANDLERS: Mutex<HandlerStack> = Mutex::new(HandlerStack {
    active: Vec::new(),
    next_id: 1,
    saved: None,
});

fn handlers() -> MutexGuard<'static, HandlerStack> {
    HANDLERS.lock().unwrap_or_else(|e| e.into_inner())
}

fn crash_hook(info: &PanicHookInfo<'_>) {
    let payload = info.payload();
    let message = payload
        .downcast_ref::<&str>()
        .copied()
        .or_else(|| payload.downcast_ref::<String>().map(String::as_str))
        .unwrap_or("<non-string panic payload>");

    let location = info
        .location()
        .map(|l| SourceLocation::new(static_file(l.file()), l.line(), "panic"))
        .unwrap_or(SourceLocation::new("<unknown>", 0, "panic"));

    error!(target: "debug", "Unhandled panic: {}", message);
    super::trace(&format!("Unhandled panic: {}", message), location);
    super::fail("Unexpected termination.", location);
}

/// Leaked; the hook never returns.
fn static_file(file: &str) -> &'static str {
    Box::leak(file.to_owned().into_boxed_str())
}

//=== CrashHandler ========================================================

/// Scoped guard that turns panics into fatal failures with a crash dump.
///
/// While at least one guard is alive, a panic anywhere in the process is
/// traced, a crash report is written and the process exits with status 1.
/// Dropping the last guard restores the hook that was installed before
/// the first one.
///
/// # Examples
///
/// ```no_run
/// use rime_engine::core::debug::CrashHandler;
///
/// let _guard = CrashHandler::new();
/// // panics from here on are fatal and produce a crash dump
/// ```
#[derive(Debug)]
pub struct CrashHandler {
    id: u64,
}

impl CrashHandler {
    pub fn new() -> Self {
        let mut stack = handlers();

        if stack.active.is_empty() {
            stack.saved = Some(panic::take_hook());
            panic::set_hook(Box::new(crash_hook));
            info!(target: "debug", "Crash handler installed");
        }

        let id = stack.next_id;
        stack.next_id += 1;
        stack.active.push(id);
        Self { id }
    }

    /// Number of live guards in the process.
    pub fn depth() -> usize {
        handlers().active.len()
    }

    /// Whether this guard is the innermost live one.
    pub fn is_active(&self) -> bool {
        handlers().active.last() == Some(&self.id)
    }
}

impl Default for CrashHandler {
    fn default() -> Self {
        Self::new()
    }
}

impl Drop for CrashHandler {
    fn drop(&mut self) {
        let mut stack = handlers();
        if let Some(index) = stack.active.iter().position(|&id| id == self.id) {
            stack.active.remove(index);
        }

        // set_hook panics while unwinding; leave the hook in place then.
        if stack.active.is_empty() && !std::thread::panicking() {
            if let Some(saved) = stack.saved.take() {
                panic::set_hook(saved);
                info!(target: "debug", "Crash handler removed");
            }
        }
    }
}

//=========================================================================
// Unit Tests
//=========================================================================
