//! Point-in-time runtime snapshots for the status sub-protocol.

use std::sync::Arc;
use std::sync::atomic::{AtomicUsize, Ordering};

use sysinfo::{Pid, ProcessRefreshKind, ProcessesToUpdate, System};
use tiller_proto::StatusMessage;

use crate::service::ServiceHandler;

/// Produces a fresh [`StatusMessage`] on demand.
pub trait StatusSampler: Send + Sync {
    /// Samples the current process state.
    fn sample(&self) -> StatusMessage;
}

/// Sampler reading memory and thread counts for the current process through
/// `sysinfo`, and the connection count from the engine handler.
///
/// Every call queries the operating system afresh, so concurrent callers share
/// no mutable state.
pub struct ProcessSampler {
    pid: Option<Pid>,
    handler: Arc<dyn ServiceHandler>,
    active_sessions: Arc<AtomicUsize>,
}

impl ProcessSampler {
    /// Builds a sampler for the current process.
    ///
    /// `active_sessions` counts open control connections and is used to
    /// estimate the thread count on platforms where `sysinfo` cannot list
    /// tasks.
    #[must_use]
    pub fn new(handler: Arc<dyn ServiceHandler>, active_sessions: Arc<AtomicUsize>) -> Self {
        Self {
            pid: sysinfo::get_current_pid().ok(),
            handler,
            active_sessions,
        }
    }

    fn process_usage(&self) -> Option<(u64, Option<usize>)> {
        let pid = self.pid?;
        let mut system = System::new();
        system.refresh_processes_specifics(
            ProcessesToUpdate::Some(&[pid]),
            true,
            ProcessRefreshKind::nothing().with_memory().with_tasks(),
        );
        let process = system.process(pid)?;
        Some((process.memory(), process.tasks().map(|tasks| tasks.len())))
    }

    fn fallback_threads(&self) -> usize {
        // Listener thread plus one handler per open session.
        self.active_sessions.load(Ordering::SeqCst).saturating_add(1)
    }
}

impl StatusSampler for ProcessSampler {
    fn sample(&self) -> StatusMessage {
        let (memory, tasks) = self.process_usage().unwrap_or((0, None));
        let threads = tasks
            .filter(|count| *count > 0)
            .unwrap_or_else(|| self.fallback_threads());
        StatusMessage {
            memory: saturate_i64(memory),
            threads: saturate_i32(threads),
            connections: saturate_i32(self.handler.connection_count()),
        }
    }
}

fn saturate_i64(value: u64) -> i64 {
    i64::try_from(value).unwrap_or(i64::MAX)
}

fn saturate_i32(value: usize) -> i32 {
    i32::try_from(value).unwrap_or(i32::MAX)
}
