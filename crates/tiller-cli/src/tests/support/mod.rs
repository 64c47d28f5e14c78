//! Test support utilities for Tiller CLI coverage.
//!
//! Supplies a world that runs the CLI against a fake daemon and captures its
//! output so step definitions and unit tests stay focused on assertions.

mod fake_daemon;

use std::cell::RefCell;
use std::ffi::OsString;
use std::process::ExitCode;

use anyhow::{Context, Result, ensure};
use camino::Utf8PathBuf;
use rstest::fixture;
use tiller_config::Config;

use crate::config::ConfigLoader;
use crate::errors::AppError;
use crate::{IoStreams, run_with_loader};

pub(super) use fake_daemon::{FakeDaemon, Reply, Request};

pub(super) struct StaticConfigLoader {
    config: Config,
}

impl StaticConfigLoader {
    pub(super) fn new(config: Config) -> Self {
        Self { config }
    }
}

impl ConfigLoader for StaticConfigLoader {
    fn load(&self, _args: &[OsString]) -> Result<Config, AppError> {
        Ok(self.config.clone())
    }
}

#[derive(Default)]
pub(super) struct TestWorld {
    pub config: Config,
    pub daemon: Option<FakeDaemon>,
    pub request: Option<Request>,
    pub stdout: Vec<u8>,
    pub stderr: Vec<u8>,
    pub exit_code: Option<ExitCode>,
}

impl TestWorld {
    pub fn start_daemon(&mut self, reply: Reply) -> Result<()> {
        let daemon = FakeDaemon::spawn(reply)?;
        self.config.socket_path = Utf8PathBuf::from_path_buf(daemon.socket_path().clone())
            .map_err(|path| anyhow::anyhow!("socket path {} is not UTF-8", path.display()))?;
        self.daemon = Some(daemon);
        Ok(())
    }

    pub fn point_at_missing_socket(&mut self) {
        self.config.socket_path = Utf8PathBuf::from("/nonexistent/tiller/command.sock");
    }

    pub fn run(&mut self, command: &str) -> Result<()> {
        self.stdout.clear();
        self.stderr.clear();
        let args = build_args(command);
        let loader = StaticConfigLoader::new(self.config.clone());
        let mut io = IoStreams::new(&mut self.stdout, &mut self.stderr);
        let exit = run_with_loader(args, &mut io, &loader);
        self.exit_code = Some(exit);
        if let Some(mut daemon) = self.daemon.take() {
            self.request = Some(daemon.take_request()?);
        }
        Ok(())
    }

    pub fn stdout_text(&self) -> Result<String> {
        String::from_utf8(self.stdout.clone()).context("stdout was not UTF-8")
    }

    pub fn stderr_text(&self) -> Result<String> {
        String::from_utf8(self.stderr.clone()).context("stderr was not UTF-8")
    }

    pub fn assert_exit(&self, expected: ExitCode) -> Result<()> {
        let exit = self.exit_code.context("exit code recorded")?;
        ensure!(exit == expected, "expected {expected:?}, got {exit:?}");
        Ok(())
    }
}

pub(super) fn build_args(command: &str) -> Vec<OsString> {
    let mut args = vec![OsString::from("tiller")];
    args.extend(command.split_whitespace().map(OsString::from));
    args
}

#[fixture]
pub(super) fn world() -> RefCell<TestWorld> {
    RefCell::new(TestWorld::default())
}
