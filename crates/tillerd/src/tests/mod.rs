//! Test suites for the tiller daemon.

mod log_stream_behaviour;
pub(crate) mod support;
