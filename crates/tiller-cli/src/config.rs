//! Configuration loading helpers for the Tiller CLI.
//!
//! Leading configuration flags are routed to `ortho-config` so the client
//! resolves the socket exactly as the daemon does; everything from the first
//! other token onwards belongs to the `clap` command parser.

use std::ffi::{OsStr, OsString};

use ortho_config::OrthoConfig;
use tiller_config::Config;

use crate::errors::AppError;

/// CLI flags recognised by the configuration loader.
const CONFIG_CLI_FLAGS: &[&str] = &["--config-path", "--socket-path"];

pub(crate) trait ConfigLoader {
    /// Loads configuration from the leading configuration flags.
    ///
    /// # Flag Ordering
    ///
    /// Configuration flags must appear before the subcommand. Later
    /// occurrences are handed to the command parser, which rejects them.
    fn load(&self, args: &[OsString]) -> Result<Config, AppError>;
}

pub(crate) struct OrthoConfigLoader;

impl ConfigLoader for OrthoConfigLoader {
    fn load(&self, args: &[OsString]) -> Result<Config, AppError> {
        Config::load_from_iter(args.iter().cloned()).map_err(AppError::LoadConfiguration)
    }
}

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
enum FlagAction {
    Include { needs_value: bool },
    Skip,
}

fn classify_flag(argument: &OsStr) -> FlagAction {
    let text = argument.to_string_lossy();
    let (flag, inline_value) = match text.split_once('=') {
        Some((flag, _)) => (flag, true),
        None => (text.as_ref(), false),
    };

    if CONFIG_CLI_FLAGS.contains(&flag) {
        FlagAction::Include {
            needs_value: !inline_value,
        }
    } else {
        FlagAction::Skip
    }
}

/// Arguments split between the configuration loader and the command parser.
/// Both halves keep the program name in front.
#[derive(Debug, Default, PartialEq, Eq)]
pub(crate) struct ConfigArgumentSplit {
    pub(crate) config_arguments: Vec<OsString>,
    pub(crate) command_arguments: Vec<OsString>,
}

pub(crate) fn split_config_arguments(args: &[OsString]) -> ConfigArgumentSplit {
    let Some((program, rest)) = args.split_first() else {
        return ConfigArgumentSplit::default();
    };

    let mut config_arguments = vec![program.clone()];
    let mut remaining = rest.iter().peekable();
    while let Some(argument) = remaining.next_if(|argument| {
        classify_flag(argument) != FlagAction::Skip
    }) {
        config_arguments.push(argument.clone());
        if classify_flag(argument) == (FlagAction::Include { needs_value: true })
            && let Some(value) = remaining.next()
        {
            config_arguments.push(value.clone());
        }
    }

    let mut command_arguments = vec![program.clone()];
    command_arguments.extend(remaining.cloned());
    ConfigArgumentSplit {
        config_arguments,
        command_arguments,
    }
}
