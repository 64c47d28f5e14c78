//! Test configuration loaders for scenarios covering success and failure
//! paths.

use std::ffi::OsString;
use std::sync::Arc;

use camino::Utf8PathBuf;
use ortho_config::{OrthoConfig, OrthoError};
use tempfile::TempDir;
use tiller_config::Config;

use crate::bootstrap::ConfigLoader;

/// Loader that provisions a socket path under a temporary directory.
pub struct TestConfigLoader {
    socket_dir: TempDir,
}

impl TestConfigLoader {
    #[must_use]
    pub fn new() -> Self {
        let socket_dir =
            TempDir::new().expect("failed to create temporary directory for socket");
        Self { socket_dir }
    }

    /// Socket path handed to the daemon. Its parent directory does not exist
    /// until bootstrap prepares it.
    #[must_use]
    pub fn socket_path(&self) -> Utf8PathBuf {
        let path = self.socket_dir.path().join("run").join("tillerd.sock");
        Utf8PathBuf::from_path_buf(path).expect("temporary socket path was not valid UTF-8")
    }
}

impl ConfigLoader for TestConfigLoader {
    fn load(&self) -> Result<Config, Arc<OrthoError>> {
        Ok(Config {
            socket_path: self.socket_path(),
            ..Config::default()
        })
    }
}

/// Loader that intentionally fails by passing invalid CLI arguments.
pub struct FailingConfigLoader;

impl ConfigLoader for FailingConfigLoader {
    fn load(&self) -> Result<Config, Arc<OrthoError>> {
        let args = vec![
            OsString::from("tillerd"),
            OsString::from("--log-format"),
            OsString::from("pretty"),
        ];
        Config::load_from_iter(args)
    }
}
