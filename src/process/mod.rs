/*!
 * Process Module
 * Worker forking, admission control and reaping
 */

pub mod builder;
pub mod children;
pub mod session;
pub mod supervisor;
pub mod traits;
pub mod types;

// Re-export for convenience
pub use builder::SupervisorBuilder;
pub use children::ChildSet;
pub use session::{sanitize_session, SystemSession};
pub use supervisor::ProcessSupervisor;
pub use traits::SessionControl;
pub use types::{EntryPoint, ExitReport, ReapMode, TerminationReason, WorkerContext};
