/*!
 * Core Module
 * Shared types, errors, configuration and constants
 */

pub mod config;
pub mod errors;
pub mod limits;
pub mod types;

// Re-export commonly used types
pub use config::SupervisorConfig;
pub use errors::{terminate, SupervisorError, SupervisorResult};
pub use types::{Gid, IdentityKind, Pid, PrivilegeStep, Role, Signal, Uid};
