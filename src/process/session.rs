/*!
 * Session Setup
 * Detaches a process from its terminal and drops privileges
 */

use super::traits::SessionControl;
use crate::core::errors::{SupervisorError, SupervisorResult};
use crate::core::limits::NULL_DEVICE;
use crate::core::types::{Gid, Pid, Uid};
use crate::security::{CredentialControl, Identity, PrivilegeTransition, SystemCredentials};
use nix::fcntl::{open, OFlag};
use nix::libc;
use nix::sys::stat::{umask, Mode};
use nix::unistd::{chdir, close, dup2, setsid};
use std::path::Path;
use tracing::{debug, info};

/// Session control backed by the real system calls
#[derive(Debug, Clone, Copy, Default)]
pub struct SystemSession;

impl CredentialControl for SystemSession {
    fn set_group(&self, gid: Gid) -> nix::Result<()> {
        SystemCredentials.set_group(gid)
    }

    fn set_user(&self, uid: Uid) -> nix::Result<()> {
        SystemCredentials.set_user(uid)
    }
}

impl SessionControl for SystemSession {
    fn create_session(&self) -> nix::Result<Pid> {
        setsid()
    }

    fn detach_streams(&self) -> nix::Result<()> {
        let null = open(NULL_DEVICE, OFlag::O_RDWR, Mode::empty())?;
        for fd in [libc::STDIN_FILENO, libc::STDOUT_FILENO, libc::STDERR_FILENO] {
            if null != fd {
                dup2(null, fd)?;
            }
        }
        if null > libc::STDERR_FILENO {
            close(null)?;
        }
        Ok(())
    }

    fn change_dir(&self, dir: &Path) -> nix::Result<()> {
        chdir(dir)
    }

    fn clear_umask(&self) {
        umask(Mode::empty());
    }
}

/// Drop privileges and detach from the controlling terminal
///
/// Order: group id, user id, new session, standard streams, working
/// directory, umask. Any failure before the working directory step aborts
/// the sequence, so a rejected credential change never reaches setsid.
/// A failed chdir is logged and ignored.
pub fn sanitize_session<S: SessionControl + ?Sized>(
    host: &S,
    identity: &Identity,
    working_dir: &Path,
) -> SupervisorResult<()> {
    PrivilegeTransition::new(identity).apply(host)?;

    let sid = host
        .create_session()
        .map_err(SupervisorError::SessionLeader)?;
    info!(sid = %sid, "Became session leader");

    host.detach_streams()
        .map_err(SupervisorError::DetachStreams)?;

    if let Err(e) = host.change_dir(working_dir) {
        debug!(dir = %working_dir.display(), error = %e, "Ignoring failed chdir");
    }

    host.clear_umask();
    Ok(())
}
