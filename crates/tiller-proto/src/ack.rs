//! Outcome of a one-shot service command.

/// Acknowledgement written after a service verb has been executed.
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum ServiceAck {
    /// The engine carried out the request.
    Ok,
    /// The engine rejected or failed the request.
    Failed(String),
}

impl ServiceAck {
    pub(crate) const OK_STATUS: u8 = 0;
    pub(crate) const FAILED_STATUS: u8 = 1;

    /// Builds a failure acknowledgement from any displayable error.
    #[must_use]
    pub fn failed(error: &impl std::fmt::Display) -> Self {
        Self::Failed(error.to_string())
    }

    /// Reports whether the request succeeded.
    #[must_use]
    pub const fn is_ok(&self) -> bool {
        matches!(self, Self::Ok)
    }
}
