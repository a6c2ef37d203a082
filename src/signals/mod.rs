/*!
 * Signals Module
 * Process-wide signal table and async-signal-safe dispatch
 */

mod atomic_stats;
mod dispatcher;
mod handler;
pub mod types;

// Re-export public API
pub use atomic_stats::AtomicSignalCounters;
pub use dispatcher::SignalDispatcher;
pub use handler::deliver;
pub use types::{
    action_for, action_for_number, signal_name, PendingSignals, SignalAction, SIGNAL_TABLE,
};
