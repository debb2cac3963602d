//=========================================================================
// Diagnostics Integration Tests
//
// Fatal paths terminate the process, so each death test re-runs this
// test binary filtered to itself with `RIME_DEATH_TEST` set. The child
// executes the fatal body; the parent inspects exit status and stderr.
//
//=========================================================================

use std::panic;
use std::process::{Command, Output};
use std::sync::atomic::{AtomicBool, Ordering};
use std::sync::{Arc, Mutex};

use rime_engine::core::debug::{self, CrashHandler, NO_CRASH_DUMP_ENV};

const CHILD_ENV: &str = "RIME_DEATH_TEST";
const PREFIX_ENV: &str = "RIME_DEATH_TEST_PREFIX";

/// Runs `body` in a child process when called from inside that child;
/// otherwise spawns the child and returns its output.
fn death_test(name: &str, dumps: bool, body: fn()) -> Output {
    if std::env::var(CHILD_ENV).as_deref() == Ok(name) {
        if let Ok(prefix) = std::env::var(PREFIX_ENV) {
            debug::set_crash_dump_prefix(prefix);
        }
        body();
        // Surviving the body is a failure the parent detects by status 0.
        std::process::exit(0);
    }

    let mut child = Command::new(std::env::current_exe().expect("test binary path"));
    child
        .args(["--exact", name, "--nocapture", "--test-threads=1"])
        .env(CHILD_ENV, name);
    if dumps {
        child
            .env_remove(NO_CRASH_DUMP_ENV)
            .env(PREFIX_ENV, format!("rime_death_{}", std::process::id()));
    } else {
        child.env(NO_CRASH_DUMP_ENV, "1");
    }
    child.output().expect("spawn death test child")
}

fn stderr_of(output: &Output) -> String {
    String::from_utf8_lossy(&output.stderr).into_owned()
}

//=========================================================================
// Death Tests
//=========================================================================

#[test]
fn ensure_false_terminates() {
    // Parent and child run the same source, so the call site matches.
    let line = line!() + 2;
    let output = death_test("ensure_false_terminates", false, || {
        rime_engine::ensure!(false);
    });

    assert!(!output.status.success());
    let stderr = stderr_of(&output);
    let site = format!("diagnostics.rs({}): ", line);
    let trace = stderr
        .lines()
        .find(|l| l.contains(&site))
        .unwrap_or_else(|| panic!("no trace line for {}:\n{}", site, stderr));
    assert!(trace.ends_with("ensure failed"), "{}", trace);
}

#[test]
fn require_with_message_terminates() {
    let output = death_test("require_with_message_terminates", false, || {
        let count = 0;
        rime_engine::require!(count > 0, "count was {}", count);
    });

    assert!(!output.status.success());
    assert!(stderr_of(&output).contains("require failed: count was 0"));
}

#[test]
fn fail_terminates_with_message() {
    let output = death_test("fail_terminates_with_message", false, || {
        rime_engine::fail!("renderer lost");
    });

    assert!(!output.status.success());
    assert!(stderr_of(&output).contains("renderer lost"));
}

#[test]
fn passing_checks_survive() {
    let output = death_test("passing_checks_survive", false, || {
        rime_engine::check!(true);
        rime_engine::require!(1 < 2);
        rime_engine::ensure!(!false, "never shown");
    });

    assert!(output.status.success(), "{}", stderr_of(&output));
}

#[test]
fn panic_under_crash_handler_writes_dump() {
    let prefix = format!("rime_death_{}", std::process::id());
    let output = death_test("panic_under_crash_handler_writes_dump", true, || {
        let _guard = CrashHandler::new();
        panic!("boom");
    });

    assert!(!output.status.success());
    let stderr = stderr_of(&output);
    assert!(stderr.contains("Unhandled panic: boom"), "{}", stderr);
    assert!(stderr.contains("Unexpected termination."), "{}", stderr);

    let dumps: Vec<_> = std::fs::read_dir(std::env::temp_dir())
        .expect("temp dir")
        .filter_map(Result::ok)
        .map(|entry| entry.path())
        .filter(|path| {
            path.file_name()
                .and_then(|name| name.to_str())
                .is_some_and(|name| name.starts_with(&prefix) && name.ends_with(".dmp"))
        })
        .collect();

    // Tracer-attached children abort before dumping.
    if !debug::debugger_attached() {
        assert!(!dumps.is_empty(), "{}", stderr);
        let report = std::fs::read_to_string(&dumps[0]).expect("dump readable");
        assert!(report.contains("Reason: Unexpected termination."));
        assert!(report.contains("Stack trace:"));
    }
    for dump in dumps {
        let _ = std::fs::remove_file(dump);
    }
}

//=========================================================================
// In-Process Tests
//=========================================================================

#[test]
fn trace_format_names_call_site() {
    let captured = Arc::new(Mutex::new(String::new()));
    let sink = captured.clone();
    let previous = debug::set_trace_sink(Some(Arc::new(move |line: &str| {
        sink.lock().unwrap().push_str(line);
    })));

    let line = line!() + 1;
    rime_engine::trace!("frame {} took {}ms", 3, 16);

    debug::set_trace_sink(previous);
    assert_eq!(
        *captured.lock().unwrap(),
        format!("diagnostics.rs({}): trace_format_names_call_site: frame 3 took 16ms\n", line)
    );
}

#[test]
fn nested_crash_handlers_restore_original_hook() {
    let original_ran = Arc::new(AtomicBool::new(false));
    let flag = original_ran.clone();
    let previous = panic::take_hook();
    panic::set_hook(Box::new(move |_| flag.store(true, Ordering::SeqCst)));

    {
        let outer = CrashHandler::new();
        let inner = CrashHandler::new();
        assert_eq!(CrashHandler::depth(), 2);
        assert!(inner.is_active());
        assert!(!outer.is_active());

        drop(inner);
        assert_eq!(CrashHandler::depth(), 1);
        assert!(outer.is_active());
    }
    assert_eq!(CrashHandler::depth(), 0);

    let result = panic::catch_unwind(|| panic!("after restore"));
    assert!(result.is_err());
    assert!(original_ran.load(Ordering::SeqCst));

    panic::set_hook(previous);
}
