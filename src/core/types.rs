/*!
 * Core Types
 * Common types used across the supervisor
 */

use std::fmt;

/// Process ID type
pub use nix::unistd::Pid;

/// Signal type
pub use nix::sys::signal::Signal;

/// Numeric user and group identities
pub use nix::unistd::{Gid, Uid};

/// Which side of a fork the current process image is on
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub enum Role {
    /// Root of the supervision tree, owns `children`
    Master,
    /// Forked process running the entry point
    Worker,
}

impl Role {
    pub fn is_master(&self) -> bool {
        matches!(self, Role::Master)
    }

    pub fn is_worker(&self) -> bool {
        matches!(self, Role::Worker)
    }
}

impl fmt::Display for Role {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            Role::Master => write!(f, "master"),
            Role::Worker => write!(f, "worker"),
        }
    }
}

/// Kind of identity named in configuration
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum IdentityKind {
    User,
    Group,
}

impl fmt::Display for IdentityKind {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            IdentityKind::User => write!(f, "user"),
            IdentityKind::Group => write!(f, "group"),
        }
    }
}

/// Credential change performed during privilege transition
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum PrivilegeStep {
    SetGroup,
    SetUser,
}

impl fmt::Display for PrivilegeStep {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            PrivilegeStep::SetGroup => write!(f, "setgid"),
            PrivilegeStep::SetUser => write!(f, "setuid"),
        }
    }
}
