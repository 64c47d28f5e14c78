//! Shared configuration for the Tiller control socket daemon and its clients.
//!
//! Configuration is layered by [`ortho_config`]: built-in defaults, an optional
//! TOML file supplied with `--config-path` (or `TILLER_CONFIG_PATH`),
//! `TILLER_*` environment variables, and finally command-line flags. Both the
//! daemon and the CLI read the same structure so they always agree on the
//! socket location.

mod defaults;
mod limits;
mod logging;
mod socket;

use camino::{Utf8Path, Utf8PathBuf};
use ortho_config::OrthoConfig;
use serde::{Deserialize, Serialize};

pub use defaults::{
    DEFAULT_LOG_FILTER, DEFAULT_LOG_HISTORY, DEFAULT_SUBSCRIBER_CAPACITY, SOCKET_FILE_NAME,
    default_log_filter, default_log_filter_string, default_log_format, default_socket_path,
};
pub use limits::{ConfigLimitError, MAX_LOG_HISTORY, MAX_SUBSCRIBER_CAPACITY};
pub use logging::{LogFormat, LogFormatParseError};
pub use socket::{SocketPreparationError, prepare_socket_directory};

/// Resolved configuration shared by the daemon and CLI.
#[derive(Debug, Clone, PartialEq, Eq, Deserialize, Serialize, OrthoConfig)]
#[ortho_config(prefix = "TILLER_")]
pub struct Config {
    /// Filesystem path of the command socket.
    #[ortho_config(default = default_socket_path())]
    pub socket_path: Utf8PathBuf,
    /// `tracing` filter expression applied to daemon telemetry.
    #[ortho_config(default = default_log_filter_string())]
    pub log_filter: String,
    /// Output format for daemon telemetry.
    #[ortho_config(default = default_log_format())]
    pub log_format: LogFormat,
    /// Number of recent log lines replayed to new subscribers.
    #[ortho_config(default = DEFAULT_LOG_HISTORY)]
    pub log_history: usize,
    /// Mailbox capacity of each log subscriber.
    #[ortho_config(default = DEFAULT_SUBSCRIBER_CAPACITY)]
    pub subscriber_capacity: usize,
}

impl Config {
    /// Path of the command socket.
    #[must_use]
    pub fn socket_path(&self) -> &Utf8Path {
        self.socket_path.as_path()
    }

    /// Telemetry filter expression.
    #[must_use]
    pub fn log_filter(&self) -> &str {
        &self.log_filter
    }

    /// Telemetry output format.
    #[must_use]
    pub const fn log_format(&self) -> LogFormat {
        self.log_format
    }

    /// Capacity of the log replay buffer.
    #[must_use]
    pub const fn log_history(&self) -> usize {
        self.log_history
    }

    /// Capacity of each subscriber mailbox.
    #[must_use]
    pub const fn subscriber_capacity(&self) -> usize {
        self.subscriber_capacity
    }
}

impl Default for Config {
    fn default() -> Self {
        Self {
            socket_path: default_socket_path(),
            log_filter: default_log_filter_string(),
            log_format: default_log_format(),
            log_history: DEFAULT_LOG_HISTORY,
            subscriber_capacity: DEFAULT_SUBSCRIBER_CAPACITY,
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn default_configuration_uses_shared_defaults() {
        let config = Config::default();
        assert_eq!(config.log_filter(), DEFAULT_LOG_FILTER);
        assert_eq!(config.log_format(), LogFormat::Json);
        assert_eq!(config.log_history(), DEFAULT_LOG_HISTORY);
        assert_eq!(config.subscriber_capacity(), DEFAULT_SUBSCRIBER_CAPACITY);
        assert_eq!(config.socket_path().file_name(), Some(SOCKET_FILE_NAME));
    }
}
