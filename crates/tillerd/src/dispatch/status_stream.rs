//! `Status` sub-protocol: one record per client-chosen interval.

use std::os::unix::net::UnixStream;
use std::sync::atomic::{AtomicBool, Ordering};
use std::time::Instant;

use tiller_proto::{interval_from_wire, read_interval, write_status};

use crate::status::StatusSampler;
use crate::transport::Liveness;

use super::POLL_SLICE;
use super::errors::ConnectionError;

/// Reads the interval, then writes a fresh record immediately and after each
/// interval until a write fails, the client goes away or the server shuts
/// down. A non-positive interval is a protocol error and nothing is written.
pub(super) fn serve(
    stream: &mut UnixStream,
    sampler: &dyn StatusSampler,
    shutdown: &AtomicBool,
) -> Result<(), ConnectionError> {
    let interval = interval_from_wire(read_interval(stream)?)?;
    let liveness = Liveness::watch(stream).map_err(|source| ConnectionError::Watch { source })?;

    loop {
        write_status(stream, &sampler.sample())?;
        // Measured from the end of the write: ticks may slip, never come early.
        let deadline = Instant::now().checked_add(interval);
        if !wait_for_tick(deadline, &liveness, shutdown) {
            return Ok(());
        }
    }
}

/// Returns `true` once `deadline` passes, or `false` if the client left or
/// the server is shutting down first. `None` never expires.
fn wait_for_tick(deadline: Option<Instant>, liveness: &Liveness, shutdown: &AtomicBool) -> bool {
    loop {
        if shutdown.load(Ordering::SeqCst) {
            return false;
        }
        let slice = match deadline {
            Some(deadline) => {
                let remaining = deadline.saturating_duration_since(Instant::now());
                if remaining.is_zero() {
                    return true;
                }
                remaining.min(POLL_SLICE)
            }
            None => POLL_SLICE,
        };
        if liveness.wait(slice) {
            return false;
        }
    }
}
