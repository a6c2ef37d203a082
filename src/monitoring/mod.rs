/*!
 * Monitoring
 * Tracing subscriber setup and worker spans
 */

mod tracer;

pub use tracer::{init_tracing, span_worker, WorkerSpan, ENV_TRACE_JSON};
