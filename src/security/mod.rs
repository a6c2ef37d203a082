/*!
 * Security Module
 * Identity resolution, privilege transition and resource limits
 */

pub mod identity;
pub mod limits;
pub mod privilege;
pub mod traits;

// Re-export for convenience
pub use identity::{Identity, Resolved, SystemResolver};
pub use limits::{current_cpu_limit, CpuLimit};
pub use privilege::{PrivilegeTransition, SystemCredentials};
pub use traits::*;
