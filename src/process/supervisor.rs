/*!
 * Process Supervisor
 * Admission-controlled forking, reaping and role tracking
 */

use super::builder::SupervisorBuilder;
use super::children::ChildSet;
use super::session::{sanitize_session, SystemSession};
use super::traits::SessionControl;
use super::types::{EntryPoint, ExitReport, ReapMode, TerminationReason, WorkerContext};
use crate::core::config::{validate_cpu_limit, validate_worker_cap};
use crate::core::errors::{SupervisorError, SupervisorResult};
use crate::core::limits::{
    EXIT_OK, EXIT_REPORT_HISTORY, EXIT_WORKER_FAILED, EXIT_WORKER_PANICKED, UNBOUNDED_WORKERS,
};
use crate::core::types::{Pid, Role, Signal};
use crate::monitoring::span_worker;
use crate::security::{CpuLimit, Identity, IdentityResolver};
use crate::signals::SignalDispatcher;
use nix::errno::Errno;
use nix::libc;
use nix::sys::wait::{waitpid, WaitPidFlag, WaitStatus};
use nix::unistd::{getpid, ForkResult};
use std::collections::VecDeque;
use std::io::Write;
use std::panic::{self, AssertUnwindSafe};
use std::path::{Path, PathBuf};
use tracing::{debug, error, info, warn};

/// Forks and supervises a bounded pool of worker processes
///
/// One supervisor is expected per process image. Constructing it installs
/// the process-wide signal table (see [`SignalDispatcher`]). The type is
/// neither `Send` nor `Sync`; fork must be driven from a single thread.
pub struct ProcessSupervisor<A> {
    pub(super) role: Role,
    pub(super) self_pid: Pid,
    pub(super) children: ChildSet,
    pub(super) max_workers: usize,
    pub(super) cpu_limit: CpuLimit,
    pub(super) identity: Identity,
    pub(super) working_dir: PathBuf,
    pub(super) entry: EntryPoint<A>,
    pub(super) resolver: Box<dyn IdentityResolver>,
    pub(super) signals: SignalDispatcher,
    pub(super) exits: VecDeque<ExitReport>,
}

impl<A> ProcessSupervisor<A> {
    /// Create a builder
    pub fn builder() -> SupervisorBuilder<A> {
        SupervisorBuilder::new()
    }

    /// Supervisor with default configuration and the given entry point
    pub fn new<F>(entry: F) -> SupervisorResult<Self>
    where
        F: FnMut(&WorkerContext, A) -> anyhow::Result<()> + 'static,
    {
        SupervisorBuilder::new().entry(entry).build()
    }

    // ==================== Accessors ====================

    pub fn role(&self) -> Role {
        self.role
    }

    pub fn is_master(&self) -> bool {
        self.role.is_master()
    }

    pub fn is_worker(&self) -> bool {
        self.role.is_worker()
    }

    /// Pid of the current process image, refreshed after every fork
    pub fn self_pid(&self) -> Pid {
        self.self_pid
    }

    /// Tracked workers, oldest first
    pub fn children(&self) -> &[Pid] {
        self.children.pids()
    }

    /// Number of tracked workers
    pub fn procs(&self) -> usize {
        self.children.len()
    }

    pub fn max_workers(&self) -> usize {
        self.max_workers
    }

    pub fn cpu_limit_secs(&self) -> u64 {
        self.cpu_limit.secs()
    }

    pub fn identity(&self) -> &Identity {
        &self.identity
    }

    pub fn working_dir(&self) -> &Path {
        &self.working_dir
    }

    pub fn signals(&self) -> &SignalDispatcher {
        &self.signals
    }

    // ==================== Configuration ====================

    /// Resolve and store the identity applied by `sanitize`
    ///
    /// On failure the previous identity is kept.
    pub fn set_identity(&mut self, user: Option<&str>, group: Option<&str>) -> SupervisorResult<()> {
        self.identity = Identity::resolve(self.resolver.as_ref(), user, group)?;
        Ok(())
    }

    /// Set the worker cap, 0 = unbounded
    pub fn set_worker_cap(&mut self, n: i64) -> SupervisorResult<()> {
        self.max_workers = validate_worker_cap(n)?;
        Ok(())
    }

    /// Set the per-worker CPU time limit in seconds, 0 = unlimited
    pub fn set_cpu_limit(&mut self, secs: i64) -> SupervisorResult<()> {
        self.cpu_limit = CpuLimit::new(validate_cpu_limit(secs)?);
        Ok(())
    }

    pub fn set_working_dir(&mut self, dir: impl Into<PathBuf>) {
        self.working_dir = dir.into();
    }

    // ==================== Forking ====================

    /// Fork a worker running the entry point with `args`
    ///
    /// Pending child notifications are serviced first, so workers that
    /// already exited stop counting against the cap. Blocks while the
    /// worker cap is reached. In the master this returns the new worker's
    /// pid. In the worker it never returns: the entry point runs and the
    /// process exits.
    pub fn fork(&mut self, args: A) -> SupervisorResult<Pid> {
        self.service_signals()?;
        self.admit()?;

        match fork_process()? {
            ForkResult::Parent { child } => {
                self.children.insert(child);
                debug!(
                    worker = %child,
                    procs = self.children.len(),
                    max_workers = self.max_workers,
                    "Forked worker"
                );
                Ok(child)
            }
            ForkResult::Child => self.run_worker(args),
        }
    }

    /// Background the process
    ///
    /// The original process exits with success; the forked copy becomes the
    /// new master, with no workers, and returns.
    pub fn daemonize(&mut self) -> SupervisorResult<()> {
        match fork_process()? {
            ForkResult::Parent { child } => {
                info!(successor = %child, "Daemonized, original process exiting");
                std::process::exit(EXIT_OK);
            }
            ForkResult::Child => {
                self.enter_new_image(Role::Master);
                info!(pid = %self.self_pid, "Continuing as detached master");
                Ok(())
            }
        }
    }

    /// Drop privileges and detach from the terminal
    pub fn sanitize(&self) -> SupervisorResult<()> {
        self.sanitize_with(&SystemSession)
    }

    /// [`sanitize`](Self::sanitize) against an arbitrary session backend
    pub fn sanitize_with<S: SessionControl + ?Sized>(&self, host: &S) -> SupervisorResult<()> {
        sanitize_session(host, &self.identity, &self.working_dir)
    }

    // ==================== Signalling ====================

    /// Send `signal` to one of our workers
    ///
    /// SIGKILL removes the worker from the child set immediately; its exit
    /// is not reported again when the zombie is collected.
    pub fn kill(&mut self, pid: Pid, signal: Signal) -> SupervisorResult<()> {
        self.service_signals()?;
        if !self.children.contains(pid) {
            return Err(SupervisorError::NotOwned(pid));
        }

        nix::sys::signal::kill(pid, signal)
            .map_err(|source| SupervisorError::Signal { pid, signal, source })?;
        debug!(worker = %pid, signal = signal.as_str(), "Signalled worker");

        if signal == Signal::SIGKILL {
            self.children.remove(pid);
        }
        Ok(())
    }

    /// Ask a worker to terminate (SIGTERM)
    pub fn terminate(&mut self, pid: Pid) -> SupervisorResult<()> {
        self.kill(pid, Signal::SIGTERM)
    }

    /// Handle notifications recorded by the signal handler
    ///
    /// Acknowledged signals are logged; pending child notifications trigger
    /// a non-blocking reap. Returns the number of workers reaped.
    pub fn service_signals(&mut self) -> SupervisorResult<usize> {
        let pending = self.signals.take_pending();

        if pending.hangups > 0 {
            info!(count = pending.hangups, "Acknowledged SIGHUP");
        }
        if pending.terminal_stops > 0 {
            info!(count = pending.terminal_stops, "Acknowledged SIGTSTP");
        }

        if pending.wants_reap() {
            self.dispatch(ReapMode::NonBlocking)
        } else {
            Ok(0)
        }
    }

    // ==================== Reaping ====================

    /// Reap exited workers
    ///
    /// `NonBlocking` collects every worker that has already exited.
    /// `Blocking` waits until exactly one tracked worker has been reaped,
    /// and returns 0 at once if none are tracked. Children that are not
    /// tracked (e.g. collected after a SIGKILL) are reaped silently and not
    /// counted.
    pub fn dispatch(&mut self, mode: ReapMode) -> SupervisorResult<usize> {
        let flags = match mode {
            ReapMode::NonBlocking => Some(WaitPidFlag::WNOHANG),
            ReapMode::Blocking => None,
        };

        let mut reaped = 0;
        loop {
            if mode == ReapMode::Blocking && (reaped > 0 || self.children.is_empty()) {
                break;
            }

            // -1: any child of this process
            match waitpid(Pid::from_raw(-1), flags) {
                Ok(WaitStatus::StillAlive) => break,
                Ok(status) => {
                    if self.record_exit(status) {
                        reaped += 1;
                    }
                }
                Err(Errno::EINTR) => continue,
                Err(Errno::ECHILD) => {
                    self.forget_vanished();
                    break;
                }
                Err(e) => return Err(SupervisorError::Reap(e)),
            }
        }

        if reaped > 0 {
            debug!(
                reaped,
                remaining = self.children.len(),
                ?mode,
                "Reaped workers"
            );
        }
        Ok(reaped)
    }

    /// Exit reports collected since the last call, oldest first
    pub fn take_exit_reports(&mut self) -> Vec<ExitReport> {
        self.exits.drain(..).collect()
    }

    // ==================== Internals ====================

    fn at_capacity(&self) -> bool {
        self.max_workers != UNBOUNDED_WORKERS && self.children.len() >= self.max_workers
    }

    /// Wait until the worker cap allows one more fork
    ///
    /// Rather than polling, this blocks in waitpid until a worker exits, so
    /// the count cannot change between the check and the fork.
    fn admit(&mut self) -> SupervisorResult<()> {
        if !self.at_capacity() {
            return Ok(());
        }

        debug!(
            procs = self.children.len(),
            max_workers = self.max_workers,
            "Worker cap reached, waiting for a worker to exit"
        );
        while self.at_capacity() {
            self.dispatch(ReapMode::Blocking)?;
        }
        Ok(())
    }

    fn record_exit(&mut self, status: WaitStatus) -> bool {
        let (Some(pid), Some(reason)) = (status.pid(), TerminationReason::from_wait_status(status))
        else {
            return false;
        };

        if !self.children.remove(pid) {
            debug!(pid = %pid, %reason, "Reaped untracked child");
            return false;
        }

        if reason.is_success() {
            info!(worker = %pid, %reason, "Worker reaped");
        } else {
            warn!(worker = %pid, %reason, "Worker reaped");
        }

        if self.exits.len() == EXIT_REPORT_HISTORY {
            self.exits.pop_front();
        }
        self.exits.push_back(ExitReport { pid, reason });
        true
    }

    /// waitpid reported no children at all; anything still tracked is gone
    fn forget_vanished(&mut self) {
        if !self.children.is_empty() {
            warn!(
                count = self.children.len(),
                "Tracked workers are no longer children of this process"
            );
            self.children.clear();
        }
    }

    /// Reset per-image state on the surviving side of a fork
    fn enter_new_image(&mut self, role: Role) {
        self.role = role;
        self.self_pid = getpid();
        self.children.clear();
        self.exits.clear();
        self.signals.reset();
    }

    fn worker_context(&self, parent: Pid) -> WorkerContext {
        WorkerContext {
            role: self.role,
            pid: self.self_pid,
            parent,
            tracked_children: self.children.len(),
            pending: self.signals.peek_pending(),
            cpu_limit_secs: self.cpu_limit.secs(),
        }
    }

    fn run_worker(&mut self, args: A) -> ! {
        let parent = self.self_pid;
        self.enter_new_image(Role::Worker);
        let span = span_worker(self.self_pid.as_raw());
        let entered = span.enter();
        debug!("Worker started");

        let code = match self.cpu_limit.apply() {
            Err(e) => {
                error!(error = %e, "Worker could not apply CPU limit");
                e.exit_code()
            }
            Ok(()) => {
                let ctx = self.worker_context(parent);
                match panic::catch_unwind(AssertUnwindSafe(|| (self.entry)(&ctx, args))) {
                    Ok(Ok(())) => EXIT_OK,
                    Ok(Err(e)) => {
                        error!(pid = %ctx.pid, error = %format!("{:#}", e), "Worker failed");
                        EXIT_WORKER_FAILED
                    }
                    Err(_) => {
                        error!(pid = %ctx.pid, "Worker panicked");
                        EXIT_WORKER_PANICKED
                    }
                }
            }
        };
        drop(entered);
        span.finish(code);

        let _ = std::io::stdout().flush();
        let _ = std::io::stderr().flush();
        // SAFETY: _exit(2) ends the worker without running the caller's code
        // or the parent's atexit handlers inherited across fork.
        unsafe { libc::_exit(code) }
    }
}

/// fork(2) with the standard streams flushed first
///
/// Flushing beforehand keeps buffered parent output from being written a
/// second time by the child.
fn fork_process() -> SupervisorResult<ForkResult> {
    let _ = std::io::stdout().flush();
    let _ = std::io::stderr().flush();

    // SAFETY: the child only resets supervisor bookkeeping before handing
    // control to the entry point or back to the caller.
    unsafe { nix::unistd::fork() }.map_err(SupervisorError::Fork)
}
