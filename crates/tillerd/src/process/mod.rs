//! Daemon process supervision: run the server until a signal or an engine
//! stop request asks it to exit.

mod engine;
mod errors;
mod shutdown;

use std::sync::Arc;

use tracing::{info, warn};

use crate::bootstrap::{ConfigLoader, SystemConfigLoader, bootstrap_with};
use crate::health::{HealthReporter, StructuredHealthReporter};

pub use engine::StandaloneEngine;
pub use errors::LaunchError;
pub use shutdown::{
    ShutdownError, ShutdownReason, ShutdownRequests, ShutdownSignal, ShutdownTrigger,
    SystemShutdownSignal, shutdown_channel,
};

pub(crate) const PROCESS_TARGET: &str = concat!(env!("CARGO_PKG_NAME"), "::process");

/// Runs the daemon using the production collaborators.
///
/// # Errors
///
/// Returns [`LaunchError`] when bootstrap, the server or signal installation
/// fails.
pub fn run_daemon() -> Result<(), LaunchError> {
    let reporter = Arc::new(StructuredHealthReporter::new());
    run_daemon_with(&SystemConfigLoader, reporter, &SystemShutdownSignal::new()).map(|_| ())
}

/// Runs the daemon with injected collaborators and returns why it stopped.
///
/// # Errors
///
/// Returns [`LaunchError`] when bootstrap, the server or signal installation
/// fails.
pub fn run_daemon_with(
    loader: &dyn ConfigLoader,
    reporter: Arc<dyn HealthReporter>,
    signal: &dyn ShutdownSignal,
) -> Result<ShutdownReason, LaunchError> {
    let daemon = bootstrap_with(loader, reporter)?;
    let (trigger, requests) = shutdown_channel();
    let engine = Arc::new(StandaloneEngine::new(trigger.clone()));
    let server = daemon.serve(engine)?;

    if let Err(error) = signal.install(trigger) {
        if let Err(close_error) = server.close() {
            warn!(
                target: PROCESS_TARGET,
                error = %close_error,
                "failed to close command server"
            );
        }
        return Err(error.into());
    }

    let reason = requests.wait();
    info!(
        target: PROCESS_TARGET,
        reason = %reason,
        "daemon shutting down"
    );
    server.close()?;
    Ok(reason)
}
