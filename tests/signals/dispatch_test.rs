/*!
 * Signal Dispatch Tests
 * Table lookups, handler actions and delivery through the OS
 */

use nix::sys::signal::raise;
use nix::sys::wait::{waitpid, WaitStatus};
use nix::unistd::{fork, ForkResult};
use pretty_assertions::assert_eq;
use procwarden::signals::{action_for, action_for_number, SIGNAL_TABLE};
use procwarden::{
    deliver, signal_name, ProcessSupervisor, ReapMode, Signal, SignalAction, SignalDispatcher,
    SupervisorError,
};
use serial_test::serial;
use std::time::{Duration, Instant};

/// Deliver `signo` inside a forked child, which exits with 42 if the action returns
fn deliver_in_child(signo: i32) -> WaitStatus {
    match unsafe { fork() }.unwrap() {
        ForkResult::Child => {
            deliver(signo);
            unsafe { nix::libc::_exit(42) }
        }
        ForkResult::Parent { child } => waitpid(child, None).unwrap(),
    }
}

#[test]
fn test_signal_table() {
    assert_eq!(SIGNAL_TABLE.len(), 4);
    for (signal, action) in SIGNAL_TABLE {
        assert_eq!(action_for(signal), Some(action));
    }
    assert_eq!(action_for(Signal::SIGHUP), Some(SignalAction::Acknowledge));
    assert_eq!(action_for(Signal::SIGTSTP), Some(SignalAction::Acknowledge));
    assert_eq!(action_for(Signal::SIGTERM), Some(SignalAction::Terminate));
    assert_eq!(action_for(Signal::SIGCHLD), Some(SignalAction::Reap));
    assert_eq!(action_for(Signal::SIGUSR1), None);
}

#[test]
fn test_unmapped_signal_names_the_signal() {
    match action_for_number(Signal::SIGUSR2 as i32) {
        Err(SupervisorError::UnhandledSignal { signo, name }) => {
            assert_eq!(signo, Signal::SIGUSR2 as i32);
            assert_eq!(name, "SIGUSR2");
        }
        other => panic!("expected unhandled signal, got {:?}", other),
    }

    assert_eq!(signal_name(Signal::SIGCHLD as i32).unwrap(), "SIGCHLD");
    assert!(signal_name(0).is_err());
}

#[test]
#[serial]
fn test_unhandled_signal_is_fatal() {
    let status = deliver_in_child(Signal::SIGUSR1 as i32);
    assert!(matches!(status, WaitStatus::Exited(_, 70)), "{:?}", status);
}

#[test]
#[serial]
fn test_terminate_request_exits_immediately() {
    let status = deliver_in_child(Signal::SIGTERM as i32);
    assert!(matches!(status, WaitStatus::Exited(_, 0)), "{:?}", status);
}

#[test]
#[serial]
fn test_acknowledged_signals_return() {
    for signal in [Signal::SIGHUP, Signal::SIGTSTP, Signal::SIGCHLD] {
        let status = deliver_in_child(signal as i32);
        assert!(matches!(status, WaitStatus::Exited(_, 42)), "{:?}", status);
    }
}

#[test]
#[serial]
fn test_raised_signals_are_counted() {
    let dispatcher = SignalDispatcher::install().unwrap();
    assert!(dispatcher.is_active());
    assert_eq!(dispatcher.take_pending().hangups, 0);

    raise(Signal::SIGHUP).unwrap();
    raise(Signal::SIGHUP).unwrap();
    raise(Signal::SIGTSTP).unwrap();

    let pending = dispatcher.take_pending();
    assert_eq!(pending.hangups, 2);
    assert_eq!(pending.terminal_stops, 1);
    assert_eq!(dispatcher.peek_pending().hangups, 0);
}

#[test]
#[serial]
fn test_reinstall_supersedes_previous_handle() {
    let first = SignalDispatcher::install().unwrap();
    let second = SignalDispatcher::install().unwrap();

    assert!(second.generation() > first.generation());
    assert!(!first.is_active());
    assert!(second.is_active());
}

#[test]
#[serial]
fn test_child_exit_is_reaped_by_service_pass() {
    let mut sup = ProcessSupervisor::new(|_, _: ()| Ok(())).unwrap();
    let worker = sup.fork(()).unwrap();

    // Wait for the SIGCHLD notification, then let the main flow handle it
    let deadline = Instant::now() + Duration::from_secs(5);
    let mut reaped = 0;
    while reaped == 0 && Instant::now() < deadline {
        if sup.signals().peek_pending().wants_reap() {
            reaped += sup.service_signals().unwrap();
        } else {
            std::thread::sleep(Duration::from_millis(5));
        }
    }

    assert_eq!(reaped, 1);
    assert!(sup.children().is_empty());
    assert_eq!(sup.take_exit_reports()[0].pid, worker);
    assert_eq!(sup.dispatch(ReapMode::NonBlocking).unwrap(), 0);
}
