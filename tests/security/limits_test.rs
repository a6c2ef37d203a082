/*!
 * Limits and Credentials Tests
 * CPU limits and privilege drops applied to real forked processes
 */

use nix::sys::wait::{waitpid, WaitStatus};
use nix::unistd::{fork, getgid, getpid, getsid, getuid, ForkResult};
use procwarden::security::current_cpu_limit;
use procwarden::{
    CpuLimit, IdentityResolver, PrivilegeStep, ProcessSupervisor, SupervisorError,
    SystemResolver,
};
use serial_test::serial;

/// Run `check` in a forked child and return its exit status
fn in_child<F: FnOnce() -> bool>(check: F) -> WaitStatus {
    match unsafe { fork() }.unwrap() {
        ForkResult::Child => {
            let code = match std::panic::catch_unwind(std::panic::AssertUnwindSafe(check)) {
                Ok(true) => 0,
                _ => 1,
            };
            unsafe { nix::libc::_exit(code) }
        }
        ForkResult::Parent { child } => waitpid(child, None).unwrap(),
    }
}

#[test]
fn test_cpu_limit_values() {
    assert!(CpuLimit::unlimited().is_unlimited());
    assert!(CpuLimit::new(0).is_unlimited());
    assert_eq!(CpuLimit::new(30).secs(), 30);
}

#[test]
#[serial]
fn test_cpu_limit_applies_soft_and_hard() {
    let status = in_child(|| {
        CpuLimit::new(120).apply().is_ok() && current_cpu_limit().ok() == Some((120, 120))
    });
    assert!(matches!(status, WaitStatus::Exited(_, 0)), "{:?}", status);
}

#[test]
#[serial]
fn test_unlimited_cpu_keeps_inherited_limit() {
    let before = current_cpu_limit().unwrap();
    let status = in_child(move || {
        CpuLimit::unlimited().apply().is_ok() && current_cpu_limit().ok() == Some(before)
    });
    assert!(matches!(status, WaitStatus::Exited(_, 0)), "{:?}", status);
}

#[test]
fn test_unprivileged_user_switch_is_rejected() {
    if getuid().is_root() {
        return;
    }

    let mut sup = ProcessSupervisor::new(|_, _: ()| Ok(())).unwrap();
    sup.set_identity(Some("root"), None).unwrap();

    let err = sup.sanitize().unwrap_err();
    assert!(matches!(
        err,
        SupervisorError::Privilege {
            step: PrivilegeStep::SetUser,
            id: 0,
            ..
        }
    ));
}

#[test]
#[serial]
fn test_root_sanitize_drops_to_nobody() {
    if !getuid().is_root() {
        return;
    }

    let group = ["nogroup", "nobody"]
        .into_iter()
        .find(|name| SystemResolver.resolve_group(name).is_ok());
    let (Some(group), Ok(nobody)) = (group, SystemResolver.resolve_user("nobody")) else {
        return;
    };
    let Ok(gid) = SystemResolver.resolve_group(group) else {
        return;
    };

    let status = in_child(move || {
        let Ok(sup) = ProcessSupervisor::builder()
            .with_user("nobody")
            .with_group(group)
            .with_working_dir("/")
            .entry(|_, _: ()| Ok(()))
            .build()
        else {
            return false;
        };

        sup.sanitize().is_ok()
            && getuid() == nobody
            && getgid() == gid
            && getsid(None).ok() == Some(getpid())
            && std::env::current_dir().ok().as_deref() == Some(std::path::Path::new("/"))
    });
    assert!(matches!(status, WaitStatus::Exited(_, 0)), "{:?}", status);
}
