//! Log capture for tests.
//!
//! Installs a process-wide logger once and records each thread's log lines
//! separately, so tests running in parallel only see their own diagnostics.

use log::{Level, LevelFilter, Log, Metadata, Record};
use std::cell::RefCell;
use std::sync::Once;

/// One captured log line.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct CapturedLine {
    pub level: Level,
    pub target: String,
    pub message: String,
}

thread_local! {
    static LINES: RefCell<Option<Vec<CapturedLine>>> = const { RefCell::new(None) };
}

struct ThreadCaptureLogger;

impl Log for ThreadCaptureLogger {
    fn enabled(&self, _metadata: &Metadata<'_>) -> bool {
        true
    }

    fn log(&self, record: &Record<'_>) {
        LINES.with(|lines| {
            if let Some(lines) = lines.borrow_mut().as_mut() {
                lines.push(CapturedLine {
                    level: record.level(),
                    target: record.target().to_string(),
                    message: record.args().to_string(),
                });
            }
        });
    }

    fn flush(&self) {}
}

static LOGGER: ThreadCaptureLogger = ThreadCaptureLogger;
static INSTALL: Once = Once::new();

/// Runs `f` and returns its result with every line logged on this thread
/// meanwhile.
///
/// # Panics
/// Panics if a different logger was installed before the first call.
pub fn capture_logs<R>(f: impl FnOnce() -> R) -> (R, Vec<CapturedLine>) {
    INSTALL.call_once(|| {
        log::set_logger(&LOGGER).expect("another logger is already installed");
        log::set_max_level(LevelFilter::Trace);
    });
    LINES.with(|lines| *lines.borrow_mut() = Some(Vec::new()));
    let result = f();
    let captured = LINES.with(|lines| lines.borrow_mut().take().unwrap_or_default());
    (result, captured)
}

/// Lines at warning level or above.
#[must_use]
pub fn diagnostics(lines: &[CapturedLine]) -> Vec<&CapturedLine> {
    lines.iter().filter(|l| l.level <= Level::Warn).collect()
}
