//=========================================================================
// Stack Traces
//=========================================================================
//
// Walks the current thread's stack with the `backtrace` crate and
// resolves each frame to a `StackFrame` record.
//
//=========================================================================

//=== Standard Library Imports ============================================

use std::fmt;

//=== External Crates =====================================================

use backtrace::Symbol;

//=== StackFrame ==========================================================

/// One resolved frame.
///
/// `module` is the crate the symbol belongs to (first path segment of the
/// demangled name). Unknown parts are empty (`file`), zero (`line`) or
/// `"Unknown Module"` / `"Unknown Function"`.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct StackFrame {
    pub address: usize,
    pub name: String,
    pub module: String,
    pub file: String,
    pub line: u32,
}

const UNKNOWN_MODULE: &str = "Unknown Module";
const UNKNOWN_FUNCTION: &str = "Unknown Function";

impl StackFrame {
    fn unresolved(address: usize) -> Self {
        Self {
            address,
            name: UNKNOWN_FUNCTION.to_owned(),
            module: UNKNOWN_MODULE.to_owned(),
            file: String::new(),
            line: 0,
        }
    }

    fn from_symbol(address: usize, symbol: &Symbol) -> Self {
        let name = symbol
            .name()
            .map(|n| format!("{:#}", n))
            .unwrap_or_else(|| UNKNOWN_FUNCTION.to_owned());

        Self {
            address,
            module: module_of(&name),
            name,
            file: symbol
                .filename()
                .map(|p| p.display().to_string())
                .unwrap_or_default(),
            line: symbol.lineno().unwrap_or(0),
        }
    }
}

impl fmt::Display for StackFrame {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "0x{:x}: {}({}) in {}", self.address, self.name, self.line, self.module)
    }
}

/// Crate name of a demangled symbol (`<T as Trait>::f` uses `T`'s crate).
fn module_of(name: &str) -> String {
    let path = name.trim_start_matches(['<', '&', '*']).trim_start_matches("mut ");
    match path.split_once("::") {
        Some((head, _)) if !head.is_empty() && !head.contains(' ') => head.to_owned(),
        _ => UNKNOWN_MODULE.to_owned(),
    }
}

//=== Walking =============================================================

/// Captures the calling thread's stack, innermost frame first.
///
/// Frames belonging to the walker itself are dropped, so the first entry
/// is the caller of `get_stack_trace`. When the platform cannot unwind,
/// a notice is traced and the result is empty.
pub fn get_stack_trace() -> Vec<StackFrame> {
    let mut resolved = Vec::new();
    backtrace::trace(|frame| {
        let address = frame.ip() as usize;
        let mut record = None;
        backtrace::resolve_frame(frame, |symbol| {
            if record.is_none() {
                record = Some(StackFrame::from_symbol(address, symbol));
            }
        });
        resolved.push(record.unwrap_or_else(|| StackFrame::unresolved(address)));
        true
    });

    if let Some(own) = resolved
        .iter()
        .rposition(|frame| frame.name.contains("get_stack_trace"))
    {
        resolved.drain(..=own);
    }

    if resolved.is_empty() {
        crate::trace!("Stack trace is not available.");
    }
    resolved
}

/// Formats frames one per line, as written into crash reports.
pub fn format_stack_trace(frames: &[StackFrame]) -> String {
    let mut out = String::new();
    for frame in frames {
        out.push_str(&frame.to_string());
        out.push('\n');
    }
    out
}

//=========================================================================
// Unit Tests
//=========================================================================
