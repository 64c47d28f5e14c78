//! Per-connection command dispatch.
//!
//! Every connection runs a small state machine:
//!
//! ```text
//! AwaitCommand -> Dispatched(<command>) -> Closed
//! ```
//!
//! The first byte selects the sub-protocol, which then owns the rest of the
//! stream. `Closed` is reached on every path, including read failures and
//! unknown commands, and the connection guard closes the socket there.
//! Errors are logged and reported to the health reporter; they never reach
//! the listener or other connections.

mod errors;
mod handler;
mod log_stream;
mod status_stream;

use std::time::Duration;

pub use self::errors::ConnectionError;
pub(crate) use self::handler::CommandDispatcher;
pub use self::handler::ConnectionState;

pub(crate) const DISPATCH_TARGET: &str = concat!(env!("CARGO_PKG_NAME"), "::dispatch");

/// Longest uninterrupted wait in a streaming loop before liveness and the
/// shutdown flag are checked again.
const POLL_SLICE: Duration = Duration::from_millis(50);
