//! Bridge between one-shot control commands and the proxy engine.

use std::sync::Arc;

use thiserror::Error;
use tiller_proto::{ServiceAck, ServiceVerb};
use tracing::{info, warn};

const SERVICE_TARGET: &str = concat!(env!("CARGO_PKG_NAME"), "::service");

/// Failure reported by the engine for a control request.
#[derive(Debug, Clone, PartialEq, Eq, Error)]
#[error("{message}")]
pub struct ServiceError {
    message: String,
}

impl ServiceError {
    /// Builds an error carrying the engine's description.
    pub fn new(message: impl Into<String>) -> Self {
        Self {
            message: message.into(),
        }
    }

    /// Engine-provided description.
    #[must_use]
    pub fn message(&self) -> &str {
        &self.message
    }
}

/// Operations the proxy engine exposes to the control plane.
#[cfg_attr(test, mockall::automock)]
pub trait ServiceHandler: Send + Sync {
    /// Stops the engine.
    fn stop(&self) -> Result<(), ServiceError>;

    /// Reloads the engine configuration.
    fn reload(&self) -> Result<(), ServiceError>;

    /// Closes every active proxied connection.
    fn close_connections(&self) -> Result<(), ServiceError>;

    /// Number of proxied connections currently open.
    fn connection_count(&self) -> usize;
}

impl<T> ServiceHandler for Arc<T>
where
    T: ServiceHandler + ?Sized,
{
    fn stop(&self) -> Result<(), ServiceError> {
        (**self).stop()
    }

    fn reload(&self) -> Result<(), ServiceError> {
        (**self).reload()
    }

    fn close_connections(&self) -> Result<(), ServiceError> {
        (**self).close_connections()
    }

    fn connection_count(&self) -> usize {
        (**self).connection_count()
    }
}

/// Forwards control verbs to the engine and turns the outcome into an
/// acknowledgement.
#[derive(Clone)]
pub struct ServiceBridge {
    handler: Arc<dyn ServiceHandler>,
}

impl ServiceBridge {
    /// Wraps an engine handler.
    #[must_use]
    pub fn new(handler: Arc<dyn ServiceHandler>) -> Self {
        Self { handler }
    }

    /// Executes `verb` synchronously. Engine failures become
    /// [`ServiceAck::Failed`] and never propagate further.
    #[must_use]
    pub fn execute(&self, verb: ServiceVerb) -> ServiceAck {
        let outcome = match verb {
            ServiceVerb::Stop => self.handler.stop(),
            ServiceVerb::Reload => self.handler.reload(),
            ServiceVerb::CloseConnections => self.handler.close_connections(),
        };
        match outcome {
            Ok(()) => {
                info!(target: SERVICE_TARGET, verb = %verb, "service command succeeded");
                ServiceAck::Ok
            }
            Err(error) => {
                warn!(
                    target: SERVICE_TARGET,
                    verb = %verb,
                    error = %error,
                    "service command failed"
                );
                ServiceAck::failed(&error)
            }
        }
    }
}

impl std::fmt::Debug for ServiceBridge {
    fn fmt(&self, formatter: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        formatter.debug_struct("ServiceBridge").finish_non_exhaustive()
    }
}

#[cfg(test)]
mod tests {
    use rstest::rstest;

    use super::*;

    #[rstest]
    #[case(ServiceVerb::Stop)]
    #[case(ServiceVerb::Reload)]
    #[case(ServiceVerb::CloseConnections)]
    fn each_verb_reaches_its_engine_operation(#[case] verb: ServiceVerb) {
        let mut handler = MockServiceHandler::new();
        match verb {
            ServiceVerb::Stop => {
                handler.expect_stop().times(1).returning(|| Ok(()));
            }
            ServiceVerb::Reload => {
                handler.expect_reload().times(1).returning(|| Ok(()));
            }
            ServiceVerb::CloseConnections => {
                handler.expect_close_connections().times(1).returning(|| Ok(()));
            }
        }

        let bridge = ServiceBridge::new(Arc::new(handler));
        assert_eq!(bridge.execute(verb), ServiceAck::Ok);
    }

    #[test]
    fn engine_failures_become_failed_acknowledgements() {
        let mut handler = MockServiceHandler::new();
        handler
            .expect_reload()
            .returning(|| Err(ServiceError::new("config invalid")));

        let bridge = ServiceBridge::new(Arc::new(handler));
        assert_eq!(
            bridge.execute(ServiceVerb::Reload),
            ServiceAck::Failed("config invalid".to_owned())
        );
    }
}
