//! Engine double with scripted outcomes.

use std::sync::Mutex;

use tiller_proto::ServiceVerb;

use crate::service::{ServiceError, ServiceHandler};

/// Engine that records verbs, fails the ones it was told to fail and never
/// proxies any connection.
#[derive(Debug, Default)]
pub struct StubEngine {
    failures: Mutex<Vec<(ServiceVerb, String)>>,
    calls: Mutex<Vec<ServiceVerb>>,
}

impl StubEngine {
    /// Makes every later `verb` request fail with `message`.
    pub fn fail_on(&self, verb: ServiceVerb, message: &str) {
        self.failures
            .lock()
            .expect("engine mutex poisoned")
            .push((verb, message.to_owned()));
    }

    /// Verbs received so far.
    #[must_use]
    pub fn calls(&self) -> Vec<ServiceVerb> {
        self.calls.lock().expect("engine mutex poisoned").clone()
    }

    fn run(&self, verb: ServiceVerb) -> Result<(), ServiceError> {
        self.calls.lock().expect("engine mutex poisoned").push(verb);
        let failures = self.failures.lock().expect("engine mutex poisoned");
        match failures.iter().find(|(failing, _)| *failing == verb) {
            Some((_, message)) => Err(ServiceError::new(message.clone())),
            None => Ok(()),
        }
    }
}

impl ServiceHandler for StubEngine {
    fn stop(&self) -> Result<(), ServiceError> {
        self.run(ServiceVerb::Stop)
    }

    fn reload(&self) -> Result<(), ServiceError> {
        self.run(ServiceVerb::Reload)
    }

    fn close_connections(&self) -> Result<(), ServiceError> {
        self.run(ServiceVerb::CloseConnections)
    }

    fn connection_count(&self) -> usize {
        0
    }
}
