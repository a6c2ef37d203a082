/*!
 * Process Traits
 * Session detachment abstractions
 */

use crate::core::types::Pid;
use crate::security::CredentialControl;
use std::path::Path;

/// Everything `sanitize` asks of the operating system
///
/// Credential changes come from the [`CredentialControl`] supertrait so the
/// privilege drop and the session steps go through one seam.
pub trait SessionControl: CredentialControl {
    /// Become leader of a new session (setsid)
    fn create_session(&self) -> nix::Result<Pid>;

    /// Point stdin, stdout and stderr away from the controlling terminal
    fn detach_streams(&self) -> nix::Result<()>;

    /// Change the working directory
    fn change_dir(&self, dir: &Path) -> nix::Result<()>;

    /// Reset the file-mode creation mask to 0
    fn clear_umask(&self);
}
