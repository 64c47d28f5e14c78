//! Shutdown signal double fired explicitly by tests.

use std::sync::Mutex;

use crate::process::{ShutdownError, ShutdownReason, ShutdownSignal, ShutdownTrigger};

/// Captures the installed trigger so a test can fire it.
#[derive(Debug, Default)]
pub struct ManualShutdownSignal {
    trigger: Mutex<Option<ShutdownTrigger>>,
}

impl ManualShutdownSignal {
    /// Reports whether the daemon installed its trigger.
    #[must_use]
    pub fn is_installed(&self) -> bool {
        self.trigger.lock().expect("signal mutex poisoned").is_some()
    }

    /// Delivers `signal` as if the operating system had sent it.
    pub fn raise(&self, signal: i32) -> bool {
        self.trigger
            .lock()
            .expect("signal mutex poisoned")
            .as_ref()
            .is_some_and(|trigger| trigger.request(ShutdownReason::Signal(signal)))
    }
}

impl ShutdownSignal for ManualShutdownSignal {
    fn install(&self, trigger: ShutdownTrigger) -> Result<(), ShutdownError> {
        *self.trigger.lock().expect("signal mutex poisoned") = Some(trigger);
        Ok(())
    }
}
