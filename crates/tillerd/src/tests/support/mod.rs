//! Shared doubles and fixtures for the daemon test suites.

mod config_loader;
mod engine;
mod reporter;
mod signal;
mod world;

pub use config_loader::{FailingConfigLoader, TestConfigLoader};
pub use engine::StubEngine;
pub use reporter::{HealthEvent, RecordingHealthReporter};
pub use signal::ManualShutdownSignal;
pub use world::ServerWorld;

use std::time::{Duration, Instant};

/// Polls `condition` every few milliseconds until it holds or `timeout`
/// elapses. Returns the final observation.
pub fn eventually(timeout: Duration, mut condition: impl FnMut() -> bool) -> bool {
    let deadline = Instant::now() + timeout;
    loop {
        if condition() {
            return true;
        }
        if Instant::now() >= deadline {
            return false;
        }
        std::thread::sleep(Duration::from_millis(5));
    }
}
