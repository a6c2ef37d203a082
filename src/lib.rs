/*!
 * Procwarden Library
 * Forking process supervisor exposed as a library
 */

pub mod core;
pub mod monitoring;
pub mod process;
pub mod security;
pub mod signals;

// Re-exports
pub use crate::core::{
    terminate, Gid, IdentityKind, Pid, PrivilegeStep, Role, Signal, SupervisorConfig,
    SupervisorError, SupervisorResult, Uid,
};
pub use monitoring::{init_tracing, span_worker, WorkerSpan};
pub use process::{
    sanitize_session, ChildSet, EntryPoint, ExitReport, ProcessSupervisor, ReapMode,
    SessionControl, SupervisorBuilder, SystemSession, TerminationReason, WorkerContext,
};
pub use security::{
    CpuLimit, CredentialControl, Identity, IdentityResolver, PrivilegeTransition, SystemResolver,
};
pub use signals::{deliver, signal_name, PendingSignals, SignalAction, SignalDispatcher};
