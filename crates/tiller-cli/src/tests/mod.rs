//! Test suites for the Tiller CLI runtime.

mod support;
