//! Wire protocol shared by the Tiller daemon and its local clients.
//!
//! Every connection to the command socket begins with a single command byte
//! that selects a sub-protocol; the sub-protocol then owns the remainder of
//! the stream. All multi-byte integers are big-endian.
//!
//! | Command            | Byte | Request body        | Response                        |
//! |--------------------|------|---------------------|---------------------------------|
//! | `Log`              | 0    | none                | length-prefixed lines, forever  |
//! | `Status`           | 1    | `i64` interval (ns) | 16-byte status record per tick  |
//! | `ServiceStop`      | 2    | none                | one acknowledgement             |
//! | `ServiceReload`    | 3    | none                | one acknowledgement             |
//! | `CloseConnections` | 4    | none                | one acknowledgement             |
//!
//! Log lines are framed as a `u16` byte length followed by UTF-8 text. An
//! acknowledgement is a `u8` status: `0` on success, or `1` followed by a
//! length-prefixed error message.

mod ack;
#[cfg(unix)]
mod client;
mod codec;
mod command;
mod error;
mod status;

pub use ack::ServiceAck;
#[cfg(unix)]
pub use client::{ClientError, CommandClient, LogStream, StatusStream};
pub use codec::{
    MAX_LINE_BYTES, read_ack, read_command, read_interval, read_log_line, read_status,
    truncate_line, write_ack, write_command, write_interval, write_log_line, write_status,
};
pub use command::{Command, ServiceVerb};
pub use error::{CodecError, ProtocolError};
pub use status::{STATUS_RECORD_LEN, StatusMessage, interval_from_wire, interval_to_wire};
