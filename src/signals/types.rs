/*!
 * Signal Types
 * The supervisor's fixed signal-to-action table
 */

use crate::core::errors::{SupervisorError, SupervisorResult};
use crate::core::types::Signal;

/// What the supervisor does when a signal arrives
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub enum SignalAction {
    /// Note the signal and keep running
    Acknowledge,
    /// Exit the process immediately, without draining workers
    Terminate,
    /// Reap whichever workers have exited
    Reap,
}

/// Fixed table installed by every supervisor
pub const SIGNAL_TABLE: [(Signal, SignalAction); 4] = [
    (Signal::SIGHUP, SignalAction::Acknowledge),
    (Signal::SIGTSTP, SignalAction::Acknowledge),
    (Signal::SIGTERM, SignalAction::Terminate),
    (Signal::SIGCHLD, SignalAction::Reap),
];

/// Look up the action for a signal
///
/// Signals outside [`SIGNAL_TABLE`] have no action and are reported as
/// [`SupervisorError::UnhandledSignal`].
pub const fn action_for(signal: Signal) -> Option<SignalAction> {
    match signal {
        Signal::SIGHUP | Signal::SIGTSTP => Some(SignalAction::Acknowledge),
        Signal::SIGTERM => Some(SignalAction::Terminate),
        Signal::SIGCHLD => Some(SignalAction::Reap),
        _ => None,
    }
}

/// Like [`action_for`], but starting from a raw signal number
pub fn action_for_number(signo: i32) -> SupervisorResult<SignalAction> {
    Signal::try_from(signo)
        .ok()
        .and_then(action_for)
        .ok_or_else(|| SupervisorError::UnhandledSignal {
            signo,
            name: signal_name(signo).unwrap_or("UNKNOWN"),
        })
}

/// Symbolic name for a signal number, e.g. `"SIGCHLD"`
pub fn signal_name(signo: i32) -> SupervisorResult<&'static str> {
    Signal::try_from(signo)
        .map(Signal::as_str)
        .map_err(|_| SupervisorError::UnhandledSignal {
            signo,
            name: "UNKNOWN",
        })
}

/// Signal notifications gathered since the last service pass
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq)]
pub struct PendingSignals {
    pub hangups: u64,
    pub terminal_stops: u64,
    pub child_events: u64,
}

impl PendingSignals {
    pub fn is_empty(&self) -> bool {
        self.hangups == 0 && self.terminal_stops == 0 && self.child_events == 0
    }

    pub fn wants_reap(&self) -> bool {
        self.child_events > 0
    }
}
