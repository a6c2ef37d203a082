/*!
 * Supervisor Tests
 * Admission control, reaping and worker signalling against real forks
 */

use nix::sys::wait::{waitpid, WaitStatus};
use pretty_assertions::assert_eq;
use procwarden::{
    Pid, ProcessSupervisor, ReapMode, Signal, SupervisorError, TerminationReason,
};
use serial_test::serial;
use std::time::{Duration, Instant};

fn sleeper(max_workers: i64) -> ProcessSupervisor<u64> {
    ProcessSupervisor::builder()
        .with_max_workers(max_workers)
        .entry(|_, ms: u64| {
            std::thread::sleep(Duration::from_millis(ms));
            Ok(())
        })
        .build()
        .unwrap()
}

/// Poll non-blocking reaps until every worker is gone or the deadline passes
fn drain_nonblocking(sup: &mut ProcessSupervisor<u64>, deadline: Duration) -> usize {
    let start = Instant::now();
    let mut reaped = 0;
    while sup.procs() > 0 && start.elapsed() < deadline {
        reaped += sup.dispatch(ReapMode::NonBlocking).unwrap();
        std::thread::sleep(Duration::from_millis(10));
    }
    reaped
}

#[test]
#[serial]
fn test_blocking_dispatch_reaps_one_at_a_time() {
    let mut sup = sleeper(3);

    let pids: Vec<Pid> = (0..3).map(|_| sup.fork(100).unwrap()).collect();
    assert_eq!(sup.children(), pids.as_slice());

    for remaining in (0..3).rev() {
        assert_eq!(sup.dispatch(ReapMode::Blocking).unwrap(), 1);
        assert_eq!(sup.procs(), remaining);
    }

    // Nothing tracked: returns at once instead of blocking
    assert_eq!(sup.dispatch(ReapMode::Blocking).unwrap(), 0);
}

#[test]
#[serial]
fn test_unbounded_fork_then_drain() {
    let mut sup = sleeper(0);

    for _ in 0..10 {
        sup.fork(200).unwrap();
    }
    assert_eq!(sup.procs(), 10);

    let reaped = drain_nonblocking(&mut sup, Duration::from_secs(10));
    assert_eq!(reaped, 10);
    assert!(sup.children().is_empty());
}

/// Wait for the handler to record a SIGCHLD
fn await_child_event(sup: &ProcessSupervisor<u64>, deadline: Duration) {
    let start = Instant::now();
    while !sup.signals().peek_pending().wants_reap() {
        assert!(start.elapsed() < deadline, "no SIGCHLD recorded");
        std::thread::sleep(Duration::from_millis(5));
    }
}

#[test]
#[serial]
fn test_fork_reaps_exited_workers_below_cap() {
    let mut sup = sleeper(0);

    let mut last = None;
    for _ in 0..20 {
        last = Some(sup.fork(0).unwrap());
        await_child_event(&sup, Duration::from_secs(5));
        // The previous worker was collected by this fork; at most the
        // newest one is still tracked
        assert!(sup.procs() <= 1, "exited workers still tracked: {}", sup.procs());
    }

    // kill services the last notification before checking ownership
    let last = last.unwrap();
    let result = sup.kill(last, Signal::SIGTERM);
    assert!(matches!(result, Err(SupervisorError::NotOwned(pid)) if pid == last));
    assert_eq!(sup.procs(), 0);

    let reports = sup.take_exit_reports();
    assert_eq!(reports.len(), 20);
    assert!(reports.iter().all(|r| r.reason == TerminationReason::Exited(0)));
}

#[test]
#[serial]
fn test_worker_cap_is_never_exceeded() {
    let mut sup = sleeper(2);

    for _ in 0..6 {
        sup.fork(50).unwrap();
        assert!(sup.procs() <= 2, "cap exceeded: {} workers", sup.procs());
    }

    while sup.procs() > 0 {
        sup.dispatch(ReapMode::Blocking).unwrap();
    }

    let reports = sup.take_exit_reports();
    assert_eq!(reports.len(), 6);
    assert!(reports.iter().all(|r| r.reason.is_success()));
}

#[test]
#[serial]
fn test_non_blocking_dispatch_with_live_workers() {
    let mut sup = sleeper(0);
    sup.fork(500).unwrap();

    assert_eq!(sup.dispatch(ReapMode::NonBlocking).unwrap(), 0);
    assert_eq!(sup.procs(), 1);

    assert_eq!(sup.dispatch(ReapMode::Blocking).unwrap(), 1);
}

#[test]
#[serial]
fn test_kill_rejects_foreign_pid() {
    let mut sup = sleeper(0);
    let worker = sup.fork(200).unwrap();

    let foreign = Pid::from_raw(1);
    let result = sup.kill(foreign, Signal::SIGTERM);
    assert!(matches!(result, Err(SupervisorError::NotOwned(pid)) if pid == foreign));
    assert_eq!(sup.children(), &[worker]);

    assert_eq!(sup.dispatch(ReapMode::Blocking).unwrap(), 1);
}

#[test]
#[serial]
fn test_terminate_runs_worker_terminate_action() {
    let mut sup = sleeper(0);
    let worker = sup.fork(30_000).unwrap();

    sup.terminate(worker).unwrap();
    // Still tracked until reaped
    assert_eq!(sup.children(), &[worker]);

    assert_eq!(sup.dispatch(ReapMode::Blocking).unwrap(), 1);
    let reports = sup.take_exit_reports();
    assert_eq!(reports.len(), 1);
    assert_eq!(reports[0].pid, worker);
    assert_eq!(reports[0].reason, TerminationReason::Exited(0));
}

#[test]
#[serial]
fn test_sigkill_removes_worker_eagerly() {
    let mut sup = sleeper(0);
    let worker = sup.fork(30_000).unwrap();

    sup.kill(worker, Signal::SIGKILL).unwrap();
    assert_eq!(sup.procs(), 0);

    // Already forgotten, so a blocking dispatch has nothing to wait for
    assert_eq!(sup.dispatch(ReapMode::Blocking).unwrap(), 0);

    // Collect the zombie ourselves; it must never show up as a tracked exit
    match waitpid(worker, None).unwrap() {
        WaitStatus::Signaled(pid, Signal::SIGKILL, _) => assert_eq!(pid, worker),
        other => panic!("unexpected wait status {:?}", other),
    }
    assert!(sup.take_exit_reports().is_empty());
}

#[test]
#[serial]
fn test_reaping_after_sigkill_does_not_double_count() {
    let mut sup = sleeper(0);
    let killed = sup.fork(30_000).unwrap();
    let normal = sup.fork(200).unwrap();

    sup.kill(killed, Signal::SIGKILL).unwrap();
    assert_eq!(sup.children(), &[normal]);

    // Blocking dispatch may collect the killed zombie first; only the
    // tracked worker is counted
    assert_eq!(sup.dispatch(ReapMode::Blocking).unwrap(), 1);
    drain_nonblocking(&mut sup, Duration::from_secs(2));

    let reports = sup.take_exit_reports();
    assert_eq!(reports.len(), 1);
    assert_eq!(reports[0].pid, normal);

    // Make sure the killed worker is gone before the next test forks
    let _ = waitpid(killed, None);
}
