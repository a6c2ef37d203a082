/*!
 * Security Traits
 * Identity and credential abstractions
 */

use crate::core::errors::SupervisorResult;
use crate::core::types::{Gid, Uid};

/// Name-to-id lookup against an identity database
pub trait IdentityResolver {
    /// Resolve a user name to its numeric uid
    fn resolve_user(&self, name: &str) -> SupervisorResult<Uid>;

    /// Resolve a group name to its numeric gid
    fn resolve_group(&self, name: &str) -> SupervisorResult<Gid>;
}

/// Credential changes applied to the current process
///
/// Implementations report the raw OS error; callers decide how fatal it is.
pub trait CredentialControl {
    /// Change the real, effective and saved group id
    fn set_group(&self, gid: Gid) -> nix::Result<()>;

    /// Change the real, effective and saved user id
    fn set_user(&self, uid: Uid) -> nix::Result<()>;
}
