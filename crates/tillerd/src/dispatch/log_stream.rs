//! `Log` sub-protocol: replay the backlog, then forward live lines.

use std::os::unix::net::UnixStream;
use std::sync::mpsc::RecvTimeoutError;

use tiller_proto::write_log_line;
use tracing::debug;

use crate::log_bus::LogBus;
use crate::transport::Liveness;

use super::errors::ConnectionError;
use super::{DISPATCH_TARGET, POLL_SLICE};

/// Streams log lines until a write fails, the client goes away or the bus is
/// closed. The subscription is released when this returns.
pub(super) fn serve(stream: &mut UnixStream, bus: &LogBus) -> Result<(), ConnectionError> {
    let Ok((subscription, backlog)) = bus.subscribe() else {
        debug!(target: DISPATCH_TARGET, "log bus closed, ending subscription");
        return Ok(());
    };
    let liveness = Liveness::watch(stream).map_err(|source| ConnectionError::Watch { source })?;

    for line in &backlog {
        write_log_line(stream, line)?;
    }

    loop {
        match subscription.recv_timeout(POLL_SLICE) {
            Ok(line) => write_log_line(stream, &line)?,
            Err(RecvTimeoutError::Timeout) => {}
            Err(RecvTimeoutError::Disconnected) => break,
        }
        if liveness.is_lost() {
            break;
        }
    }

    debug!(
        target: DISPATCH_TARGET,
        dropped = subscription.dropped(),
        "log subscription ended"
    );
    Ok(())
}
