//! Fixed-size runtime status record and interval conversion.

use std::time::Duration;

use crate::error::ProtocolError;

/// Encoded size of a [`StatusMessage`].
pub const STATUS_RECORD_LEN: usize = 16;

/// Point-in-time runtime snapshot streamed to status subscribers.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Default)]
pub struct StatusMessage {
    /// Resident memory in bytes.
    pub memory: i64,
    /// Number of live threads in the process.
    pub threads: i32,
    /// Number of proxied connections reported by the engine.
    pub connections: i32,
}

impl StatusMessage {
    /// Encodes the record as `memory:i64 | threads:i32 | connections:i32`.
    #[must_use]
    pub fn to_bytes(&self) -> [u8; STATUS_RECORD_LEN] {
        let mut bytes = [0_u8; STATUS_RECORD_LEN];
        let (memory, rest) = bytes.split_at_mut(8);
        let (threads, connections) = rest.split_at_mut(4);
        memory.copy_from_slice(&self.memory.to_be_bytes());
        threads.copy_from_slice(&self.threads.to_be_bytes());
        connections.copy_from_slice(&self.connections.to_be_bytes());
        bytes
    }

    /// Decodes a record produced by [`StatusMessage::to_bytes`].
    #[must_use]
    pub fn from_bytes(bytes: [u8; STATUS_RECORD_LEN]) -> Self {
        let [m0, m1, m2, m3, m4, m5, m6, m7, t0, t1, t2, t3, c0, c1, c2, c3] = bytes;
        Self {
            memory: i64::from_be_bytes([m0, m1, m2, m3, m4, m5, m6, m7]),
            threads: i32::from_be_bytes([t0, t1, t2, t3]),
            connections: i32::from_be_bytes([c0, c1, c2, c3]),
        }
    }
}

/// Converts a wire interval in nanoseconds into a [`Duration`].
///
/// # Errors
///
/// Returns [`ProtocolError::InvalidInterval`] when the value is zero or
/// negative.
pub fn interval_from_wire(nanos: i64) -> Result<Duration, ProtocolError> {
    u64::try_from(nanos)
        .ok()
        .filter(|value| *value > 0)
        .map(Duration::from_nanos)
        .ok_or(ProtocolError::InvalidInterval(nanos))
}

/// Converts a [`Duration`] into wire nanoseconds, saturating at `i64::MAX`.
#[must_use]
pub fn interval_to_wire(interval: Duration) -> i64 {
    i64::try_from(interval.as_nanos()).unwrap_or(i64::MAX)
}
