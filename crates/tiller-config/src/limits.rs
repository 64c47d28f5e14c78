use thiserror::Error;

use crate::Config;

/// Largest accepted `log_history`.
pub const MAX_LOG_HISTORY: usize = 65_536;

/// Largest accepted `subscriber_capacity`. Each log subscriber allocates a
/// mailbox of this size up front.
pub const MAX_SUBSCRIBER_CAPACITY: usize = 4_096;

/// A sizing value outside its accepted range.
#[derive(Debug, Error, PartialEq, Eq)]
pub enum ConfigLimitError {
    /// `log_history` exceeds [`MAX_LOG_HISTORY`].
    #[error("log_history {value} exceeds the maximum of {MAX_LOG_HISTORY}")]
    LogHistory { value: usize },
    /// `subscriber_capacity` exceeds [`MAX_SUBSCRIBER_CAPACITY`].
    #[error("subscriber_capacity {value} exceeds the maximum of {MAX_SUBSCRIBER_CAPACITY}")]
    SubscriberCapacity { value: usize },
}

impl Config {
    /// Checks the bus sizing values against their upper bounds.
    ///
    /// # Errors
    ///
    /// Returns the first [`ConfigLimitError`] found, `log_history` first.
    pub fn validate(&self) -> Result<(), ConfigLimitError> {
        if self.log_history > MAX_LOG_HISTORY {
            return Err(ConfigLimitError::LogHistory {
                value: self.log_history,
            });
        }
        if self.subscriber_capacity > MAX_SUBSCRIBER_CAPACITY {
            return Err(ConfigLimitError::SubscriberCapacity {
                value: self.subscriber_capacity,
            });
        }
        Ok(())
    }
}
