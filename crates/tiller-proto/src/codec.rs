//! Blocking readers and writers for every framed value on the command socket.
//!
//! Readers that return `Option` yield `Ok(None)` when the peer closes the
//! stream cleanly on a frame boundary. A close in the middle of a frame is
//! reported as a [`CodecError::Read`] with
//! [`std::io::ErrorKind::UnexpectedEof`].

use std::io::{self, Read, Write};

use crate::ack::ServiceAck;
use crate::command::Command;
use crate::error::CodecError;
use crate::status::{STATUS_RECORD_LEN, StatusMessage};

/// Longest string payload a `u16` length prefix can describe.
pub const MAX_LINE_BYTES: usize = u16::MAX as usize;

/// Reads the raw command byte that opens a connection.
///
/// The byte is returned undecoded so callers can report unknown values.
///
/// # Errors
///
/// Returns [`CodecError::Read`] if the stream fails.
pub fn read_command(reader: &mut impl Read) -> Result<Option<u8>, CodecError> {
    let mut byte = [0_u8; 1];
    if !fill_or_eof(reader, &mut byte, "command")? {
        return Ok(None);
    }
    let [command] = byte;
    Ok(Some(command))
}

/// Writes the command byte that opens a connection.
///
/// # Errors
///
/// Returns [`CodecError::Write`] if the stream fails.
pub fn write_command(writer: &mut impl Write, command: Command) -> Result<(), CodecError> {
    writer
        .write_all(&[command.as_byte()])
        .map_err(|source| CodecError::write("command", source))
}

/// Reads the signed nanosecond interval that follows a status command.
///
/// # Errors
///
/// Returns [`CodecError::Read`] if the stream fails or closes early.
pub fn read_interval(reader: &mut impl Read) -> Result<i64, CodecError> {
    let mut bytes = [0_u8; 8];
    reader
        .read_exact(&mut bytes)
        .map_err(|source| CodecError::read("status interval", source))?;
    Ok(i64::from_be_bytes(bytes))
}

/// Writes a signed nanosecond interval.
///
/// # Errors
///
/// Returns [`CodecError::Write`] if the stream fails.
pub fn write_interval(writer: &mut impl Write, nanos: i64) -> Result<(), CodecError> {
    writer
        .write_all(&nanos.to_be_bytes())
        .map_err(|source| CodecError::write("status interval", source))
}

/// Writes one 16-byte status record.
///
/// # Errors
///
/// Returns [`CodecError::Write`] if the stream fails.
pub fn write_status(writer: &mut impl Write, message: &StatusMessage) -> Result<(), CodecError> {
    writer
        .write_all(&message.to_bytes())
        .map_err(|source| CodecError::write("status record", source))
}

/// Reads one 16-byte status record.
///
/// # Errors
///
/// Returns [`CodecError::Read`] if the stream fails or a record is cut short.
pub fn read_status(reader: &mut impl Read) -> Result<Option<StatusMessage>, CodecError> {
    let mut bytes = [0_u8; STATUS_RECORD_LEN];
    if !fill_or_eof(reader, &mut bytes, "status record")? {
        return Ok(None);
    }
    Ok(Some(StatusMessage::from_bytes(bytes)))
}

/// Shortens `line` to at most [`MAX_LINE_BYTES`] without splitting a
/// character.
#[must_use]
pub fn truncate_line(line: &str) -> &str {
    if line.len() <= MAX_LINE_BYTES {
        return line;
    }
    let mut end = MAX_LINE_BYTES;
    while !line.is_char_boundary(end) {
        end -= 1;
    }
    line.get(..end).unwrap_or_default()
}

/// Writes one length-prefixed log line, truncating oversized lines.
///
/// # Errors
///
/// Returns [`CodecError::Write`] if the stream fails.
pub fn write_log_line(writer: &mut impl Write, line: &str) -> Result<(), CodecError> {
    write_string(writer, truncate_line(line), "log line")
}

/// Reads one length-prefixed log line.
///
/// # Errors
///
/// Returns [`CodecError::Read`] if the stream fails or a frame is cut short,
/// and [`CodecError::InvalidUtf8`] if the payload is not UTF-8.
pub fn read_log_line(reader: &mut impl Read) -> Result<Option<String>, CodecError> {
    let mut prefix = [0_u8; 2];
    if !fill_or_eof(reader, &mut prefix, "log line")? {
        return Ok(None);
    }
    read_string_body(reader, u16::from_be_bytes(prefix), "log line").map(Some)
}

/// Writes a service acknowledgement.
///
/// # Errors
///
/// Returns [`CodecError::Write`] if the stream fails.
pub fn write_ack(writer: &mut impl Write, ack: &ServiceAck) -> Result<(), CodecError> {
    match ack {
        ServiceAck::Ok => writer
            .write_all(&[ServiceAck::OK_STATUS])
            .map_err(|source| CodecError::write("acknowledgement", source)),
        ServiceAck::Failed(message) => {
            writer
                .write_all(&[ServiceAck::FAILED_STATUS])
                .map_err(|source| CodecError::write("acknowledgement", source))?;
            write_string(writer, truncate_line(message), "acknowledgement message")
        }
    }
}

/// Reads a service acknowledgement.
///
/// # Errors
///
/// Returns [`CodecError::Read`] if the stream fails or closes early,
/// [`CodecError::InvalidAck`] for unknown status bytes, and
/// [`CodecError::InvalidUtf8`] for malformed failure messages.
pub fn read_ack(reader: &mut impl Read) -> Result<ServiceAck, CodecError> {
    let mut status = [0_u8; 1];
    reader
        .read_exact(&mut status)
        .map_err(|source| CodecError::read("acknowledgement", source))?;
    let [status] = status;
    match status {
        ServiceAck::OK_STATUS => Ok(ServiceAck::Ok),
        ServiceAck::FAILED_STATUS => {
            let mut prefix = [0_u8; 2];
            reader
                .read_exact(&mut prefix)
                .map_err(|source| CodecError::read("acknowledgement message", source))?;
            let message =
                read_string_body(reader, u16::from_be_bytes(prefix), "acknowledgement message")?;
            Ok(ServiceAck::Failed(message))
        }
        status => Err(CodecError::InvalidAck { status }),
    }
}

fn write_string(writer: &mut impl Write, text: &str, context: &'static str) -> Result<(), CodecError> {
    let len = u16::try_from(text.len()).unwrap_or(u16::MAX);
    let body = text.as_bytes().get(..usize::from(len)).unwrap_or_default();
    writer
        .write_all(&len.to_be_bytes())
        .and_then(|()| writer.write_all(body))
        .map_err(|source| CodecError::write(context, source))
}

fn read_string_body(
    reader: &mut impl Read,
    len: u16,
    context: &'static str,
) -> Result<String, CodecError> {
    let mut body = vec![0_u8; usize::from(len)];
    reader
        .read_exact(&mut body)
        .map_err(|source| CodecError::read(context, source))?;
    String::from_utf8(body).map_err(|_| CodecError::InvalidUtf8 { context })
}

/// Fills `buf` completely, or returns `false` if the stream ended before the
/// first byte.
fn fill_or_eof(
    reader: &mut impl Read,
    buf: &mut [u8],
    context: &'static str,
) -> Result<bool, CodecError> {
    let mut filled = 0;
    while filled < buf.len() {
        let remaining = buf.get_mut(filled..).unwrap_or_default();
        match reader.read(remaining) {
            Ok(0) if filled == 0 => return Ok(false),
            Ok(0) => {
                return Err(CodecError::read(
                    context,
                    io::Error::from(io::ErrorKind::UnexpectedEof),
                ));
            }
            Ok(read) => filled += read,
            Err(error) if error.kind() == io::ErrorKind::Interrupted => {}
            Err(source) => return Err(CodecError::read(context, source)),
        }
    }
    Ok(true)
}
