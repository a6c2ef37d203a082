/*!
 * Signal Dispatcher
 * Installs the process-wide signal table and hands pending work to the main flow
 */

use super::handler::{self, on_signal, COUNTERS};
use super::types::{PendingSignals, SIGNAL_TABLE};
use crate::core::errors::{SupervisorError, SupervisorResult};
use nix::sys::signal::{sigaction, SaFlags, SigAction, SigHandler, SigSet};
use std::sync::atomic::{AtomicU64, Ordering};
use tracing::info;

/// Bumped on every install; the latest installer owns the table
static GENERATION: AtomicU64 = AtomicU64::new(0);

/// Handle to the process-wide signal table
///
/// Signal dispositions belong to the process, not to a supervisor value:
/// there is exactly one active table per process image. Installing again
/// (e.g. constructing a second supervisor) replaces the dispositions
/// wholesale and discards notifications that were still pending. Older
/// handles keep working but report `is_active() == false`.
#[derive(Debug)]
pub struct SignalDispatcher {
    generation: u64,
}

impl SignalDispatcher {
    /// Register the handler for every signal in [`SIGNAL_TABLE`]
    pub fn install() -> SupervisorResult<Self> {
        // Table signals are masked while the handler runs so one handler
        // invocation never interrupts another.
        let mut mask = SigSet::empty();
        for (signal, _) in SIGNAL_TABLE {
            mask.add(signal);
        }
        let action = SigAction::new(
            SigHandler::Handler(on_signal),
            SaFlags::SA_RESTART | SaFlags::SA_NOCLDSTOP,
            mask,
        );

        for (signal, _) in SIGNAL_TABLE {
            // SAFETY: `on_signal` only performs atomic updates, write(2) and
            // _exit(2), all of which are async-signal-safe.
            unsafe { sigaction(signal, &action) }
                .map_err(|source| SupervisorError::SignalInstall { signal, source })?;
        }

        COUNTERS.drain();
        let generation = GENERATION.fetch_add(1, Ordering::AcqRel) + 1;

        info!(
            generation,
            signals = ?SIGNAL_TABLE.map(|(signal, _)| signal.as_str()),
            "Signal table installed"
        );

        Ok(Self { generation })
    }

    pub fn generation(&self) -> u64 {
        self.generation
    }

    /// Whether this handle belongs to the most recent install
    pub fn is_active(&self) -> bool {
        GENERATION.load(Ordering::Acquire) == self.generation
    }

    /// Take every notification recorded since the last call
    pub fn take_pending(&self) -> PendingSignals {
        COUNTERS.drain()
    }

    /// Look at pending notifications without consuming them
    pub fn peek_pending(&self) -> PendingSignals {
        COUNTERS.snapshot()
    }

    /// Forget notifications inherited across fork
    pub fn reset(&self) {
        COUNTERS.drain();
    }

    /// Run the table action for `signo` as if the OS had delivered it
    pub fn deliver(&self, signo: i32) {
        handler::deliver(signo);
    }
}
