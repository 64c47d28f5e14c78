//! Engine used when the daemon runs without an embedding proxy.

use std::sync::atomic::{AtomicU64, Ordering};

use tracing::info;

use crate::service::{ServiceError, ServiceHandler};

use super::PROCESS_TARGET;
use super::shutdown::{ShutdownReason, ShutdownTrigger};

/// Minimal engine: stop ends the daemon, reload bumps a generation counter,
/// and there are never any proxied connections.
#[derive(Debug)]
pub struct StandaloneEngine {
    trigger: ShutdownTrigger,
    reload_generation: AtomicU64,
}

impl StandaloneEngine {
    /// Creates an engine that requests daemon shutdown through `trigger`.
    #[must_use]
    pub fn new(trigger: ShutdownTrigger) -> Self {
        Self {
            trigger,
            reload_generation: AtomicU64::new(0),
        }
    }

    /// Number of reloads handled so far.
    #[must_use]
    pub fn reload_generation(&self) -> u64 {
        self.reload_generation.load(Ordering::SeqCst)
    }
}

impl ServiceHandler for StandaloneEngine {
    fn stop(&self) -> Result<(), ServiceError> {
        if self.trigger.request(ShutdownReason::EngineStop) {
            info!(target: PROCESS_TARGET, "engine stop requested");
            Ok(())
        } else {
            Err(ServiceError::new("daemon is already shutting down"))
        }
    }

    fn reload(&self) -> Result<(), ServiceError> {
        let generation = self.reload_generation.fetch_add(1, Ordering::SeqCst) + 1;
        info!(target: PROCESS_TARGET, generation, "engine reloaded");
        Ok(())
    }

    fn close_connections(&self) -> Result<(), ServiceError> {
        info!(target: PROCESS_TARGET, closed = 0, "engine closed connections");
        Ok(())
    }

    fn connection_count(&self) -> usize {
        0
    }
}
