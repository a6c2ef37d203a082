/*!
 * Structured Tracing
 * Subscriber setup and worker lifetime spans using the tracing crate
 *
 * Features:
 * - JSON-formatted logs for structured parsing
 * - Compact human-readable output for development
 * - Per-worker spans carrying the worker pid and run time
 */

use tracing::{debug, info, span, warn, Level, Span};
use tracing_subscriber::{
    fmt::format::FmtSpan, layer::SubscriberExt, util::SubscriberInitExt, EnvFilter,
};
use std::time::Instant;

/// Environment variable enabling JSON output
pub const ENV_TRACE_JSON: &str = "PROCWARDEN_TRACE_JSON";

/// Workers running longer than this are logged at warn level on exit
const SLOW_WORKER_MS: u128 = 60_000;

/// Initialize structured tracing
///
/// Environment variables:
/// - RUST_LOG: Set log level (default: info)
/// - PROCWARDEN_TRACE_JSON: Enable JSON output (default: false)
///
/// Output goes to stderr so worker stdout stays untouched. Returns false if
/// a global subscriber was already installed.
pub fn init_tracing() -> bool {
    let env_filter = EnvFilter::try_from_default_env().unwrap_or_else(|_| EnvFilter::new("info"));

    let use_json = std::env::var(ENV_TRACE_JSON)
        .map(|v| v == "1" || v == "true")
        .unwrap_or(false);

    let registry = tracing_subscriber::registry().with(env_filter);

    let installed = if use_json {
        registry
            .with(
                tracing_subscriber::fmt::layer()
                    .json()
                    .with_writer(std::io::stderr)
                    .with_target(true)
                    .with_line_number(true)
                    .with_file(true)
                    .with_current_span(true)
                    .with_span_list(true)
                    .with_span_events(FmtSpan::CLOSE),
            )
            .try_init()
            .is_ok()
    } else {
        registry
            .with(
                tracing_subscriber::fmt::layer()
                    .with_writer(std::io::stderr)
                    .with_target(true)
                    .with_line_number(true)
                    .compact(),
            )
            .try_init()
            .is_ok()
    };

    if installed {
        info!(json = use_json, "Structured tracing initialized");
    }
    installed
}

/// Span covering one worker process from fork to exit
///
/// Workers leave through _exit(2), which skips destructors, so the span is
/// closed explicitly with [`WorkerSpan::finish`].
pub struct WorkerSpan {
    span: Span,
    start: Instant,
}

impl WorkerSpan {
    pub fn new(pid: i32) -> Self {
        let span = span!(
            Level::INFO,
            "worker",
            pid = pid,
            exit_code = tracing::field::Empty,
            duration_ms = tracing::field::Empty,
        );

        Self {
            span,
            start: Instant::now(),
        }
    }

    /// Enter the span context
    pub fn enter(&self) -> tracing::span::Entered<'_> {
        self.span.enter()
    }

    /// Record the exit code and run time
    pub fn finish(self, exit_code: i32) {
        let duration_ms = self.start.elapsed().as_millis();
        self.span.record("exit_code", exit_code);
        self.span.record("duration_ms", duration_ms);

        let _entered = self.span.enter();
        if duration_ms > SLOW_WORKER_MS {
            warn!(exit_code, duration_ms, slow = true, "Worker finished");
        } else {
            debug!(exit_code, duration_ms, "Worker finished");
        }
    }
}

/// Open a span for the worker with `pid`
pub fn span_worker(pid: i32) -> WorkerSpan {
    WorkerSpan::new(pid)
}
