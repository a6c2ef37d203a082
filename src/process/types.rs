/*!
 * Process Types
 * Common types for worker supervision
 */

use crate::core::types::{Pid, Role, Signal};
use crate::signals::PendingSignals;
use nix::sys::wait::WaitStatus;
use std::fmt;

/// Worker entry point: receives the worker's context and the arguments
/// passed to `fork`
///
/// Returning `Ok` exits the worker with status 0, `Err` with status 1.
pub type EntryPoint<A> = Box<dyn FnMut(&WorkerContext, A) -> anyhow::Result<()>>;

/// Supervisor state as seen by a freshly forked worker
///
/// Captured after the worker image has been reset and its CPU limit
/// applied, immediately before the entry point runs.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct WorkerContext {
    pub role: Role,
    /// getpid() of the worker
    pub pid: Pid,
    /// Pid of the master that forked this worker
    pub parent: Pid,
    /// Workers tracked by this image; the master's set is not inherited
    pub tracked_children: usize,
    /// Notifications recorded since the worker's counters were cleared
    pub pending: PendingSignals,
    pub cpu_limit_secs: u64,
}

/// How `dispatch` waits for exited workers
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum ReapMode {
    /// Reap everything already exited, never wait
    NonBlocking,
    /// Wait until one worker has been reaped
    Blocking,
}

/// Why a reaped worker terminated
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum TerminationReason {
    /// Normal exit with status code
    Exited(i32),
    /// Killed by signal
    Signaled(Signal),
}

impl TerminationReason {
    /// Extract the reason from a wait status, if it describes a termination
    pub fn from_wait_status(status: WaitStatus) -> Option<Self> {
        match status {
            WaitStatus::Exited(_, code) => Some(Self::Exited(code)),
            WaitStatus::Signaled(_, signal, _) => Some(Self::Signaled(signal)),
            _ => None,
        }
    }

    pub fn is_success(&self) -> bool {
        matches!(self, Self::Exited(0))
    }
}

impl fmt::Display for TerminationReason {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            Self::Exited(code) => write!(f, "exited with code {}", code),
            Self::Signaled(signal) => write!(f, "killed by signal {}", signal.as_str()),
        }
    }
}

/// Record of a reaped worker
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct ExitReport {
    pub pid: Pid,
    pub reason: TerminationReason,
}
