/*!
 * Signal Handler
 * Async-signal-safe execution of the signal table
 *
 * Everything reachable from [`deliver`] is restricted to atomic counter
 * updates, write(2) and _exit(2). Logging, allocation and locking happen
 * later, when the main flow drains the counters.
 */

use super::atomic_stats::AtomicSignalCounters;
use crate::core::limits::{EXIT_SOFTWARE, EXIT_TERMINATE_REQUEST};
use crate::core::types::Signal;
use nix::libc;

/// Process-wide counters shared by the installed handler and the dispatcher
pub(crate) static COUNTERS: AtomicSignalCounters = AtomicSignalCounters::new();

/// Entry point registered with sigaction(2)
pub(crate) extern "C" fn on_signal(signo: libc::c_int) {
    deliver(signo);
}

/// Run the table action for `signo` in the calling context
///
/// This is exactly what the OS-level handler does. Terminate requests and
/// unmapped signals do not return.
pub fn deliver(signo: i32) {
    match Signal::try_from(signo) {
        Ok(Signal::SIGHUP) => COUNTERS.inc_hangups(),
        Ok(Signal::SIGTSTP) => COUNTERS.inc_terminal_stops(),
        Ok(Signal::SIGCHLD) => COUNTERS.inc_child_events(),
        Ok(Signal::SIGTERM) => exit_now(EXIT_TERMINATE_REQUEST),
        Ok(other) => unhandled(other.as_str()),
        Err(_) => unhandled("UNKNOWN"),
    }
}

fn unhandled(name: &str) -> ! {
    write_stderr(b"procwarden: fatal: unhandled signal ");
    write_stderr(name.as_bytes());
    write_stderr(b"\n");
    exit_now(EXIT_SOFTWARE)
}

fn write_stderr(bytes: &[u8]) {
    // SAFETY: write(2) is async-signal-safe and `bytes` outlives the call.
    // A short or failed write only loses diagnostics.
    unsafe {
        libc::write(libc::STDERR_FILENO, bytes.as_ptr().cast(), bytes.len());
    }
}

fn exit_now(code: i32) -> ! {
    // SAFETY: _exit(2) is async-signal-safe and never returns.
    unsafe { libc::_exit(code) }
}
