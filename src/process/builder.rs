/*!
 * Supervisor Builder
 * Builder pattern for ProcessSupervisor construction
 */

use super::children::ChildSet;
use super::supervisor::ProcessSupervisor;
use super::types::{EntryPoint, WorkerContext};
use crate::core::config::{validate_cpu_limit, validate_worker_cap, SupervisorConfig};
use crate::core::errors::{SupervisorError, SupervisorResult};
use crate::core::types::Role;
use crate::security::{CpuLimit, Identity, IdentityResolver, SystemResolver};
use crate::signals::SignalDispatcher;
use nix::unistd::getpid;
use std::collections::VecDeque;
use std::path::PathBuf;
use tracing::info;

/// Builder for ProcessSupervisor
pub struct SupervisorBuilder<A> {
    config: SupervisorConfig,
    entry: Option<EntryPoint<A>>,
    resolver: Box<dyn IdentityResolver>,
}

impl<A> SupervisorBuilder<A> {
    /// Create a new builder with default configuration
    pub fn new() -> Self {
        Self {
            config: SupervisorConfig::default(),
            entry: None,
            resolver: Box::new(SystemResolver),
        }
    }

    /// Replace every configured value with `config`
    pub fn with_config(mut self, config: SupervisorConfig) -> Self {
        self.config = config;
        self
    }

    pub fn with_working_dir(mut self, dir: impl Into<PathBuf>) -> Self {
        self.config.working_dir = dir.into();
        self
    }

    /// Worker cap, 0 = unbounded
    pub fn with_max_workers(mut self, n: i64) -> Self {
        self.config.max_workers = n;
        self
    }

    /// Per-worker CPU limit in seconds, 0 = unlimited
    pub fn with_cpu_limit(mut self, secs: i64) -> Self {
        self.config.cpu_limit_secs = secs;
        self
    }

    pub fn with_user(mut self, name: impl Into<String>) -> Self {
        self.config.user = Some(name.into());
        self
    }

    pub fn with_group(mut self, name: impl Into<String>) -> Self {
        self.config.group = Some(name.into());
        self
    }

    /// Resolve user and group names through `resolver` instead of the system databases
    pub fn with_resolver<R: IdentityResolver + 'static>(mut self, resolver: R) -> Self {
        self.resolver = Box::new(resolver);
        self
    }

    /// Function every worker runs after fork
    pub fn entry<F>(mut self, entry: F) -> Self
    where
        F: FnMut(&WorkerContext, A) -> anyhow::Result<()> + 'static,
    {
        self.entry = Some(Box::new(entry));
        self
    }

    /// Build the supervisor and install its signal table
    pub fn build(self) -> SupervisorResult<ProcessSupervisor<A>> {
        let entry = self
            .entry
            .ok_or_else(|| SupervisorError::Config("worker entry point not set".into()))?;

        let max_workers = validate_worker_cap(self.config.max_workers)?;
        let cpu_limit = CpuLimit::new(validate_cpu_limit(self.config.cpu_limit_secs)?);
        let identity = Identity::resolve(
            self.resolver.as_ref(),
            self.config.user.as_deref(),
            self.config.group.as_deref(),
        )?;
        let signals = SignalDispatcher::install()?;

        let mut features = Vec::new();
        if max_workers > 0 {
            features.push("worker-cap");
        }
        if !cpu_limit.is_unlimited() {
            features.push("cpu-limit");
        }
        if !identity.is_unchanged() {
            features.push("privilege-drop");
        }
        info!(
            max_workers,
            cpu_limit_secs = cpu_limit.secs(),
            working_dir = %self.config.working_dir.display(),
            "Process supervisor initialized with: {}",
            if features.is_empty() { "defaults".to_string() } else { features.join(", ") }
        );

        Ok(ProcessSupervisor {
            role: Role::Master,
            self_pid: getpid(),
            children: ChildSet::new(),
            max_workers,
            cpu_limit,
            identity,
            working_dir: self.config.working_dir,
            entry,
            resolver: self.resolver,
            signals,
            exits: VecDeque::new(),
        })
    }
}

impl<A> Default for SupervisorBuilder<A> {
    fn default() -> Self {
        Self::new()
    }
}
