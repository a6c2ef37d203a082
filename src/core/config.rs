/*!
 * Supervisor Configuration
 *
 * Embedder-facing configuration surface, loadable from the environment or a
 * JSON file. Values are validated before they reach the supervisor.
 */

use super::errors::{SupervisorError, SupervisorResult};
use super::limits::{DEFAULT_WORKING_DIR, UNBOUNDED_WORKERS, UNLIMITED_CPU_SECS};
use serde::{Deserialize, Serialize};
use std::path::{Path, PathBuf};

/// Environment variable names read by [`SupervisorConfig::from_env`]
pub const ENV_WORKDIR: &str = "PROCWARDEN_WORKDIR";
pub const ENV_MAX_WORKERS: &str = "PROCWARDEN_MAX_WORKERS";
pub const ENV_CPU_LIMIT: &str = "PROCWARDEN_CPU_LIMIT";
pub const ENV_USER: &str = "PROCWARDEN_USER";
pub const ENV_GROUP: &str = "PROCWARDEN_GROUP";

/// Supervisor configuration
///
/// Numeric fields are signed so that out-of-range input can be rejected with
/// a [`SupervisorError::Config`] instead of failing to parse.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
#[serde(default, rename_all = "snake_case")]
pub struct SupervisorConfig {
    /// Directory a sanitized process changes into
    pub working_dir: PathBuf,
    /// Maximum concurrent workers, 0 = unbounded
    pub max_workers: i64,
    /// Per-worker CPU time limit in seconds, 0 = unlimited
    pub cpu_limit_secs: i64,
    /// User to switch to during sanitize
    #[serde(skip_serializing_if = "Option::is_none")]
    pub user: Option<String>,
    /// Group to switch to during sanitize
    #[serde(skip_serializing_if = "Option::is_none")]
    pub group: Option<String>,
}

impl Default for SupervisorConfig {
    fn default() -> Self {
        Self {
            working_dir: PathBuf::from(DEFAULT_WORKING_DIR),
            max_workers: UNBOUNDED_WORKERS as i64,
            cpu_limit_secs: UNLIMITED_CPU_SECS as i64,
            user: None,
            group: None,
        }
    }
}

impl SupervisorConfig {
    /// Load configuration from `PROCWARDEN_*` environment variables
    ///
    /// Unset variables keep their defaults.
    pub fn from_env() -> SupervisorResult<Self> {
        Self::from_lookup(|key| std::env::var(key).ok())
    }

    /// Load configuration through an arbitrary key lookup
    pub fn from_lookup<F>(lookup: F) -> SupervisorResult<Self>
    where
        F: Fn(&str) -> Option<String>,
    {
        let mut config = Self::default();

        if let Some(dir) = lookup(ENV_WORKDIR) {
            config.working_dir = PathBuf::from(dir);
        }
        if let Some(raw) = lookup(ENV_MAX_WORKERS) {
            config.max_workers = parse_integer(ENV_MAX_WORKERS, &raw)?;
        }
        if let Some(raw) = lookup(ENV_CPU_LIMIT) {
            config.cpu_limit_secs = parse_integer(ENV_CPU_LIMIT, &raw)?;
        }
        config.user = lookup(ENV_USER).filter(|s| !s.is_empty());
        config.group = lookup(ENV_GROUP).filter(|s| !s.is_empty());

        config.validate()?;
        Ok(config)
    }

    /// Load configuration from a JSON file
    pub fn from_file(path: impl AsRef<Path>) -> SupervisorResult<Self> {
        let contents = std::fs::read_to_string(path.as_ref())?;
        let config: Self = serde_json::from_str(&contents)?;
        config.validate()?;
        Ok(config)
    }

    /// Reject values the supervisor cannot honor
    pub fn validate(&self) -> SupervisorResult<()> {
        validate_worker_cap(self.max_workers)?;
        validate_cpu_limit(self.cpu_limit_secs)?;
        Ok(())
    }
}

/// Convert a requested worker cap into its admission-control form
pub fn validate_worker_cap(n: i64) -> SupervisorResult<usize> {
    usize::try_from(n).map_err(|_| {
        SupervisorError::Config(format!("worker cap must be non-negative, got {}", n))
    })
}

/// Convert a requested CPU limit into seconds
pub fn validate_cpu_limit(secs: i64) -> SupervisorResult<u64> {
    u64::try_from(secs).map_err(|_| {
        SupervisorError::Config(format!("CPU limit must be non-negative, got {}", secs))
    })
}

fn parse_integer(key: &str, raw: &str) -> SupervisorResult<i64> {
    raw.trim()
        .parse::<i64>()
        .map_err(|e| SupervisorError::Config(format!("{} should be an integer: {}", key, e)))
}
