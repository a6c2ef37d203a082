/*!
 * Procwarden - Main Entry Point
 *
 * Small supervisor that:
 * - Loads configuration from the environment or a JSON file
 * - Optionally backgrounds itself and detaches from the terminal
 * - Runs a batch of demonstration workers under the worker cap
 * - Reaps every worker before exiting
 */

use std::time::Duration;
use tracing::info;

use procwarden::core::limits::EXIT_SOFTWARE;
use procwarden::{
    init_tracing, terminate, ProcessSupervisor, ReapMode, SupervisorConfig, SupervisorError,
    SupervisorResult,
};

/// Number of demonstration workers to run
const ENV_JOBS: &str = "PROCWARDEN_JOBS";
/// Set to 1 to daemonize and sanitize before forking workers
const ENV_DAEMONIZE: &str = "PROCWARDEN_DAEMONIZE";
const DEFAULT_JOBS: u32 = 10;

fn main() {
    // Initialize structured tracing
    init_tracing();

    if let Err(e) = run() {
        // Human-readable diagnostic before the structured exit log
        let report = miette::Report::new(e);
        eprintln!("{:?}", report);
        match report.downcast_ref::<SupervisorError>() {
            Some(err) => terminate(err),
            None => std::process::exit(EXIT_SOFTWARE),
        }
    }
}

fn run() -> SupervisorResult<()> {
    info!("Procwarden starting...");

    let config = match std::env::args().nth(1) {
        Some(path) => {
            info!(path = %path, "Loading configuration file");
            SupervisorConfig::from_file(path)?
        }
        None => SupervisorConfig::from_env()?,
    };
    let jobs = job_count()?;

    let mut supervisor = ProcessSupervisor::builder()
        .with_config(config)
        .entry(|_, job: u32| {
            info!(job, "Working");
            std::thread::sleep(Duration::from_millis(100 * u64::from(job % 5 + 1)));
            Ok(())
        })
        .build()?;

    if std::env::var(ENV_DAEMONIZE).map(|v| v == "1").unwrap_or(false) {
        supervisor.daemonize()?;
        supervisor.sanitize()?;
    }

    for job in 0..jobs {
        let pid = supervisor.fork(job)?;
        info!(job, worker = %pid, procs = supervisor.procs(), "Started worker");
        supervisor.service_signals()?;
    }

    while supervisor.procs() > 0 {
        supervisor.dispatch(ReapMode::Blocking)?;
    }

    let reports = supervisor.take_exit_reports();
    let failed = reports.iter().filter(|r| !r.reason.is_success()).count();
    info!(reaped = reports.len(), failed, "All workers reaped");
    Ok(())
}

fn job_count() -> SupervisorResult<u32> {
    match std::env::var(ENV_JOBS) {
        Ok(raw) => raw.trim().parse().map_err(|e| {
            SupervisorError::Config(format!("{} should be a non-negative integer: {}", ENV_JOBS, e))
        }),
        Err(_) => Ok(DEFAULT_JOBS),
    }
}
