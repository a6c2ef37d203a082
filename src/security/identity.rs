/*!
 * Identity Resolution
 * Maps user and group names to numeric ids via the system database
 */

use super::traits::IdentityResolver;
use crate::core::errors::{SupervisorError, SupervisorResult};
use crate::core::types::{Gid, IdentityKind, Uid};
use nix::unistd::{Group, User};
use tracing::debug;

/// Resolver backed by getpwnam(3) / getgrnam(3)
#[derive(Debug, Clone, Copy, Default)]
pub struct SystemResolver;

impl IdentityResolver for SystemResolver {
    fn resolve_user(&self, name: &str) -> SupervisorResult<Uid> {
        match User::from_name(name) {
            Ok(Some(user)) => {
                debug!(user = name, uid = user.uid.as_raw(), "Resolved user");
                Ok(user.uid)
            }
            Ok(None) => Err(SupervisorError::UnknownIdentity {
                kind: IdentityKind::User,
                name: name.to_string(),
            }),
            Err(source) => Err(SupervisorError::IdentityLookup {
                kind: IdentityKind::User,
                name: name.to_string(),
                source,
            }),
        }
    }

    fn resolve_group(&self, name: &str) -> SupervisorResult<Gid> {
        match Group::from_name(name) {
            Ok(Some(group)) => {
                debug!(group = name, gid = group.gid.as_raw(), "Resolved group");
                Ok(group.gid)
            }
            Ok(None) => Err(SupervisorError::UnknownIdentity {
                kind: IdentityKind::Group,
                name: name.to_string(),
            }),
            Err(source) => Err(SupervisorError::IdentityLookup {
                kind: IdentityKind::Group,
                name: name.to_string(),
                source,
            }),
        }
    }
}

/// A name together with the id it resolved to
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct Resolved<T> {
    pub name: String,
    pub id: T,
}

/// Identity a sanitized process switches to
#[derive(Debug, Clone, Default, PartialEq, Eq)]
pub struct Identity {
    pub user: Option<Resolved<Uid>>,
    pub group: Option<Resolved<Gid>>,
}

impl Identity {
    /// Resolve both names up front so a failure leaves no partial identity
    pub fn resolve<R: IdentityResolver + ?Sized>(
        resolver: &R,
        user: Option<&str>,
        group: Option<&str>,
    ) -> SupervisorResult<Self> {
        let user = user
            .map(|name| {
                resolver.resolve_user(name).map(|id| Resolved {
                    name: name.to_string(),
                    id,
                })
            })
            .transpose()?;
        let group = group
            .map(|name| {
                resolver.resolve_group(name).map(|id| Resolved {
                    name: name.to_string(),
                    id,
                })
            })
            .transpose()?;

        Ok(Self { user, group })
    }

    /// No credential change requested
    pub fn is_unchanged(&self) -> bool {
        self.user.is_none() && self.group.is_none()
    }

    pub fn uid(&self) -> Option<Uid> {
        self.user.as_ref().map(|u| u.id)
    }

    pub fn gid(&self) -> Option<Gid> {
        self.group.as_ref().map(|g| g.id)
    }
}
