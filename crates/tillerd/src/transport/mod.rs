//! Domain-socket transport for the command server.
//!
//! The listener owns the socket file, accepts connections in a background
//! thread and hands every accepted stream to a [`ConnectionHandler`] on its
//! own thread.

mod connection;
mod errors;
mod listener;
mod liveness;
#[cfg(test)]
mod test_utils;

pub(crate) use self::connection::{ConnectionGuard, ConnectionHandler};
pub use self::errors::ListenerError;
pub(crate) use self::listener::{ListenerHandle, SocketListener};
pub(crate) use self::liveness::Liveness;
#[cfg(test)]
pub(crate) use self::test_utils::EchoHandler;

const LISTENER_TARGET: &str = concat!(env!("CARGO_PKG_NAME"), "::transport");
