//! Last-resort failure capture.
//!
//! Panics that escape every other boundary, and errors that escape `main`,
//! are formatted with a full trace and reported through the status channel.

use std::any::Any;
use std::backtrace::Backtrace;
use std::cell::Cell;
use std::panic::{self, AssertUnwindSafe, PanicHookInfo};
use std::sync::{Arc, Once};

use super::HostBridge;

pub const UNHANDLED_PANIC_PREFIX: &str = "Unhandled panic:\n";
pub const UNHANDLED_ERROR_PREFIX: &str = "Unhandled error:\n";

static INSTALL: Once = Once::new();

thread_local! {
    static SUPERVISED: Cell<bool> = const { Cell::new(false) };
}

/// Install the process-wide panic hook. Only the first call takes effect.
///
/// The previous hook still runs, so the panic also shows up on local stderr.
pub fn install_crash_hook(bridge: Arc<HostBridge>) {
    INSTALL.call_once(|| {
        let previous = panic::take_hook();
        panic::set_hook(Box::new(move |info| {
            previous(info);
            // A supervisor further up the stack reports this one itself.
            if !SUPERVISED.with(Cell::get) {
                bridge.report_status(&format_panic(info));
            }
        }));
    });
}

/// Run `f` inside a panic boundary.
///
/// Panics raised inside are returned instead of unwinding further, and the
/// crash hook leaves reporting them to the caller. Nested calls keep the outer
/// boundary in place.
pub fn supervised<R>(f: impl FnOnce() -> R) -> std::thread::Result<R> {
    let outer = SUPERVISED.with(|flag| flag.replace(true));
    let result = panic::catch_unwind(AssertUnwindSafe(f));
    SUPERVISED.with(|flag| flag.set(outer));
    result
}

/// Best-effort text of a panic payload.
pub fn panic_message(payload: &(dyn Any + Send)) -> String {
    payload
        .downcast_ref::<&str>()
        .map(|s| s.to_string())
        .or_else(|| payload.downcast_ref::<String>().cloned())
        .unwrap_or_else(|| "Box<dyn Any>".to_string())
}

/// Report an error that reached the top of the process.
pub fn report_unhandled_error(bridge: &HostBridge, error: &anyhow::Error) {
    bridge.report_status(&format!("{UNHANDLED_ERROR_PREFIX}{error:?}"));
}

fn format_panic(info: &PanicHookInfo<'_>) -> String {
    let payload = panic_message(info.payload());

    let location = info
        .location()
        .map(|l| format!("{}:{}:{}", l.file(), l.line(), l.column()))
        .unwrap_or_else(|| "<unknown>".to_string());

    let thread = std::thread::current();
    let thread_name = thread.name().unwrap_or("<unnamed>");

    format!(
        "{UNHANDLED_PANIC_PREFIX}thread '{thread_name}' panicked at {location}:\n{payload}\n\nstack backtrace:\n{}",
        Backtrace::force_capture()
    )
}
