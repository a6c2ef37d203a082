/*!
 * Resource Limits
 * OS-level per-worker CPU time limit (RLIMIT_CPU)
 */

use crate::core::errors::{SupervisorError, SupervisorResult};
use crate::core::limits::UNLIMITED_CPU_SECS;
use nix::sys::resource::{getrlimit, setrlimit, Resource};
use tracing::debug;

/// CPU seconds a worker may consume before the kernel kills it
#[derive(Debug, Clone, Copy, PartialEq, Eq, Default)]
pub struct CpuLimit {
    secs: u64,
}

impl CpuLimit {
    pub fn new(secs: u64) -> Self {
        Self { secs }
    }

    pub fn unlimited() -> Self {
        Self::new(UNLIMITED_CPU_SECS)
    }

    pub fn secs(&self) -> u64 {
        self.secs
    }

    pub fn is_unlimited(&self) -> bool {
        self.secs == UNLIMITED_CPU_SECS
    }

    /// Apply to the calling process
    ///
    /// Soft and hard limits are set to the same value, so reaching the limit
    /// kills the worker (SIGKILL on Linux, SIGXCPU on systems that only
    /// check the soft limit). An unlimited value inherits whatever limit the
    /// parent had.
    pub fn apply(&self) -> SupervisorResult<()> {
        if self.is_unlimited() {
            return Ok(());
        }

        setrlimit(Resource::RLIMIT_CPU, self.secs, self.secs).map_err(|source| {
            SupervisorError::CpuLimit {
                secs: self.secs,
                source,
            }
        })?;

        debug!(secs = self.secs, "Applied CPU time limit");
        Ok(())
    }
}

/// Current (soft, hard) CPU limit of the calling process
pub fn current_cpu_limit() -> nix::Result<(u64, u64)> {
    let (soft, hard) = getrlimit(Resource::RLIMIT_CPU)?;
    Ok((soft as u64, hard as u64))
}
