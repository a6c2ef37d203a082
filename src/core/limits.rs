/*!
 * Supervisor Limits and Constants
 *
 * Centralized location for defaults, sentinels and exit codes.
 * Organized by domain for maintainability and discoverability.
 *
 * ## Conventions
 * - Exit codes follow sysexits(3) where a matching code exists
 * - Linux-compatible values are marked with [LINUX-COMPAT]
 */

// =============================================================================
// CONFIGURATION DEFAULTS
// =============================================================================

/// Working directory a sanitized process moves to when none is configured
pub const DEFAULT_WORKING_DIR: &str = "/";

/// Worker cap sentinel meaning "no admission limit"
pub const UNBOUNDED_WORKERS: usize = 0;

/// CPU limit sentinel meaning "no per-worker CPU cutoff"
pub const UNLIMITED_CPU_SECS: u64 = 0;

/// Device the standard streams are pointed at after detaching
pub const NULL_DEVICE: &str = "/dev/null";

// =============================================================================
// EXIT CODES
// =============================================================================

/// Worker entry point returned normally
pub const EXIT_OK: i32 = 0;

/// Worker entry point returned an error
pub const EXIT_WORKER_FAILED: i32 = 1;

/// Worker entry point panicked
/// [LINUX-COMPAT] Same code the Rust runtime uses for a panicking main
pub const EXIT_WORKER_PANICKED: i32 = 101;

/// Exit status used by the terminate-request action
pub const EXIT_TERMINATE_REQUEST: i32 = 0;

/// Internal software error (unhandled signal) - EX_SOFTWARE
pub const EXIT_SOFTWARE: i32 = 70;

/// User or group unknown - EX_NOUSER
pub const EXIT_NO_USER: i32 = 67;

/// Operating system error (fork, setsid, wait) - EX_OSERR
pub const EXIT_OS_ERROR: i32 = 71;

/// Permission denied (setgid/setuid) - EX_NOPERM
pub const EXIT_NO_PERMISSION: i32 = 77;

/// Configuration error - EX_CONFIG
pub const EXIT_CONFIG: i32 = 78;

// =============================================================================
// BOOKKEEPING
// =============================================================================

/// Exit reports kept for `take_exit_reports` before the oldest are dropped
pub const EXIT_REPORT_HISTORY: usize = 256;
