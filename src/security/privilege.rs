/*!
 * Privilege Transition
 * Drops to the configured group and user, in that order
 */

use super::identity::Identity;
use super::traits::CredentialControl;
use crate::core::errors::{SupervisorError, SupervisorResult};
use crate::core::types::{Gid, PrivilegeStep, Uid};
use tracing::info;

/// Credential control backed by setgid(2) / setuid(2)
#[derive(Debug, Clone, Copy, Default)]
pub struct SystemCredentials;

impl CredentialControl for SystemCredentials {
    fn set_group(&self, gid: Gid) -> nix::Result<()> {
        nix::unistd::setgid(gid)
    }

    fn set_user(&self, uid: Uid) -> nix::Result<()> {
        nix::unistd::setuid(uid)
    }
}

/// Applies an [`Identity`] to the current process
///
/// The group is always changed before the user: once the uid is dropped the
/// process normally no longer has the right to change its gid.
pub struct PrivilegeTransition<'a> {
    identity: &'a Identity,
}

impl<'a> PrivilegeTransition<'a> {
    pub fn new(identity: &'a Identity) -> Self {
        Self { identity }
    }

    /// Apply the group then the user change
    ///
    /// Stops at the first rejected step; the user change is never attempted
    /// after a failed group change.
    pub fn apply<C: CredentialControl + ?Sized>(&self, host: &C) -> SupervisorResult<()> {
        if let Some(group) = &self.identity.group {
            host.set_group(group.id)
                .map_err(|source| SupervisorError::Privilege {
                    step: PrivilegeStep::SetGroup,
                    id: group.id.as_raw(),
                    source,
                })?;
            info!(group = %group.name, gid = group.id.as_raw(), "Changed group id");
        }

        if let Some(user) = &self.identity.user {
            host.set_user(user.id)
                .map_err(|source| SupervisorError::Privilege {
                    step: PrivilegeStep::SetUser,
                    id: user.id.as_raw(),
                    source,
                })?;
            info!(user = %user.name, uid = user.id.as_raw(), "Changed user id");
        }

        Ok(())
    }
}
