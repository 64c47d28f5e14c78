//! Command identifiers selecting a sub-protocol.

use std::fmt;

use crate::error::ProtocolError;

/// Sub-protocol requested by the first byte of a connection.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub enum Command {
    /// Stream the log backlog followed by live lines.
    Log,
    /// Poll runtime status at a client-chosen interval.
    Status,
    /// Ask the engine to stop.
    ServiceStop,
    /// Ask the engine to reload its configuration.
    ServiceReload,
    /// Ask the engine to close every active proxied connection.
    CloseConnections,
}

impl Command {
    /// Wire representation of the command.
    #[must_use]
    pub const fn as_byte(self) -> u8 {
        match self {
            Self::Log => 0,
            Self::Status => 1,
            Self::ServiceStop => 2,
            Self::ServiceReload => 3,
            Self::CloseConnections => 4,
        }
    }

    /// Decodes a command byte.
    ///
    /// # Errors
    ///
    /// Returns [`ProtocolError::UnknownCommand`] for bytes outside the command
    /// table.
    pub const fn from_byte(byte: u8) -> Result<Self, ProtocolError> {
        match byte {
            0 => Ok(Self::Log),
            1 => Ok(Self::Status),
            2 => Ok(Self::ServiceStop),
            3 => Ok(Self::ServiceReload),
            4 => Ok(Self::CloseConnections),
            other => Err(ProtocolError::UnknownCommand(other)),
        }
    }

    /// Control verb carried by one-shot commands.
    #[must_use]
    pub const fn service_verb(self) -> Option<ServiceVerb> {
        match self {
            Self::ServiceStop => Some(ServiceVerb::Stop),
            Self::ServiceReload => Some(ServiceVerb::Reload),
            Self::CloseConnections => Some(ServiceVerb::CloseConnections),
            Self::Log | Self::Status => None,
        }
    }

    /// Canonical lowercase name used in logs.
    #[must_use]
    pub const fn as_str(self) -> &'static str {
        match self {
            Self::Log => "log",
            Self::Status => "status",
            Self::ServiceStop => "service_stop",
            Self::ServiceReload => "service_reload",
            Self::CloseConnections => "close_connections",
        }
    }
}

impl TryFrom<u8> for Command {
    type Error = ProtocolError;

    fn try_from(byte: u8) -> Result<Self, Self::Error> {
        Self::from_byte(byte)
    }
}

impl From<Command> for u8 {
    fn from(command: Command) -> Self {
        command.as_byte()
    }
}

impl fmt::Display for Command {
    fn fmt(&self, formatter: &mut fmt::Formatter<'_>) -> fmt::Result {
        formatter.write_str(self.as_str())
    }
}

/// One-shot control verbs forwarded to the engine.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub enum ServiceVerb {
    /// Stop the engine.
    Stop,
    /// Reload the engine.
    Reload,
    /// Close all active proxied connections.
    CloseConnections,
}

impl ServiceVerb {
    /// Canonical lowercase name used in logs and CLI output.
    #[must_use]
    pub const fn as_str(self) -> &'static str {
        match self {
            Self::Stop => "stop",
            Self::Reload => "reload",
            Self::CloseConnections => "close_connections",
        }
    }
}

impl From<ServiceVerb> for Command {
    fn from(verb: ServiceVerb) -> Self {
        match verb {
            ServiceVerb::Stop => Self::ServiceStop,
            ServiceVerb::Reload => Self::ServiceReload,
            ServiceVerb::CloseConnections => Self::CloseConnections,
        }
    }
}

impl fmt::Display for ServiceVerb {
    fn fmt(&self, formatter: &mut fmt::Formatter<'_>) -> fmt::Result {
        formatter.write_str(self.as_str())
    }
}
