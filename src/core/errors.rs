/*!
 * Error Types
 * Centralized error handling with thiserror and miette diagnostics
 */

use super::limits::{
    EXIT_CONFIG, EXIT_NO_PERMISSION, EXIT_NO_USER, EXIT_OS_ERROR, EXIT_SOFTWARE,
};
use super::types::{IdentityKind, Pid, PrivilegeStep, Signal};
use miette::Diagnostic;
use nix::errno::Errno;
use thiserror::Error;

/// Supervisor operation result
pub type SupervisorResult<T> = Result<T, SupervisorError>;

/// Unified supervisor error type with miette diagnostics
#[derive(Error, Debug, Diagnostic)]
pub enum SupervisorError {
    #[error("Configuration error: {0}")]
    #[diagnostic(
        code(supervisor::config),
        help("Worker cap and CPU limit must be non-negative integers.")
    )]
    Config(String),

    #[error("Unknown {kind} '{name}'")]
    #[diagnostic(
        code(identity::unknown),
        help("The name was not found in the system identity database (passwd/group).")
    )]
    UnknownIdentity { kind: IdentityKind, name: String },

    #[error("Failed to look up {kind} '{name}': {source}")]
    #[diagnostic(
        code(identity::lookup_failed),
        help("The identity database could not be read. Check NSS configuration.")
    )]
    IdentityLookup {
        kind: IdentityKind,
        name: String,
        #[source]
        source: Errno,
    },

    #[error("Could not {step} to {id}: {source}")]
    #[diagnostic(
        code(privilege::rejected),
        help("Changing credentials usually requires starting the supervisor as root.")
    )]
    Privilege {
        step: PrivilegeStep,
        id: u32,
        #[source]
        source: Errno,
    },

    #[error("Failed to fork: {0}")]
    #[diagnostic(
        code(process::fork_failed),
        help("The system may be out of process slots or memory. Check ulimit -u.")
    )]
    Fork(#[source] Errno),

    #[error("Process {0} is not one of our workers")]
    #[diagnostic(
        code(process::not_owned),
        help("A supervisor may only signal workers it forked and has not yet reaped.")
    )]
    NotOwned(Pid),

    #[error("Failed to send {signal} to {pid}: {source}")]
    #[diagnostic(code(process::signal_failed))]
    Signal {
        pid: Pid,
        signal: Signal,
        #[source]
        source: Errno,
    },

    #[error("Unhandled signal {name} ({signo})")]
    #[diagnostic(
        code(signals::unhandled),
        help("Only SIGHUP, SIGTSTP, SIGTERM and SIGCHLD have supervisor actions.")
    )]
    UnhandledSignal { signo: i32, name: &'static str },

    #[error("Failed to install handler for {signal}: {source}")]
    #[diagnostic(code(signals::install_failed))]
    SignalInstall {
        signal: Signal,
        #[source]
        source: Errno,
    },

    #[error("Failed to become session leader: {0}")]
    #[diagnostic(
        code(session::setsid_failed),
        help("The process is probably already a process group leader. Fork before sanitizing.")
    )]
    SessionLeader(#[source] Errno),

    #[error("Failed to detach standard streams: {0}")]
    #[diagnostic(code(session::detach_failed))]
    DetachStreams(#[source] Errno),

    #[error("Failed to apply CPU limit of {secs}s: {source}")]
    #[diagnostic(code(process::cpu_limit_failed))]
    CpuLimit {
        secs: u64,
        #[source]
        source: Errno,
    },

    #[error("Failed to reap workers: {0}")]
    #[diagnostic(code(process::reap_failed))]
    Reap(#[source] Errno),

    #[error("I/O error: {0}")]
    #[diagnostic(
        code(supervisor::io),
        help("Filesystem or I/O operation failed. Check file permissions.")
    )]
    Io(#[from] std::io::Error),

    #[error("Invalid configuration file: {0}")]
    #[diagnostic(code(supervisor::json))]
    Json(#[from] serde_json::Error),
}

impl SupervisorError {
    /// Whether the process state is no longer known to be safe to continue from
    pub fn is_fatal(&self) -> bool {
        matches!(
            self,
            SupervisorError::Privilege { .. }
                | SupervisorError::Fork(_)
                | SupervisorError::UnhandledSignal { .. }
                | SupervisorError::SignalInstall { .. }
                | SupervisorError::SessionLeader(_)
                | SupervisorError::DetachStreams(_)
                | SupervisorError::CpuLimit { .. }
        )
    }

    /// Process exit status used when this error terminates the process
    pub fn exit_code(&self) -> i32 {
        match self {
            SupervisorError::Config(_) | SupervisorError::Json(_) => EXIT_CONFIG,
            SupervisorError::UnknownIdentity { .. } | SupervisorError::IdentityLookup { .. } => {
                EXIT_NO_USER
            }
            SupervisorError::Privilege { .. } => EXIT_NO_PERMISSION,
            SupervisorError::UnhandledSignal { .. } | SupervisorError::NotOwned(_) => {
                EXIT_SOFTWARE
            }
            SupervisorError::Fork(_)
            | SupervisorError::Signal { .. }
            | SupervisorError::SignalInstall { .. }
            | SupervisorError::SessionLeader(_)
            | SupervisorError::DetachStreams(_)
            | SupervisorError::CpuLimit { .. }
            | SupervisorError::Reap(_)
            | SupervisorError::Io(_) => EXIT_OS_ERROR,
        }
    }
}

/// Log `err` and terminate the process with its exit code
pub fn terminate(err: &SupervisorError) -> ! {
    tracing::error!(
        error = %err,
        fatal = err.is_fatal(),
        exit_code = err.exit_code(),
        "supervisor terminating"
    );
    std::process::exit(err.exit_code())
}
