//! Executes parsed subcommands against the daemon.

use std::io::Write;
use std::time::Duration;

use tiller_proto::{CommandClient, ServiceAck, ServiceVerb, StatusMessage};

use crate::cli::CliCommand;
use crate::errors::AppError;

/// Runs `command` and writes its output to `stdout`.
pub(crate) fn execute<W: Write>(
    command: CliCommand,
    client: &CommandClient,
    stdout: &mut W,
) -> Result<(), AppError> {
    match command {
        CliCommand::Stop => acknowledge(client, ServiceVerb::Stop, stdout),
        CliCommand::Reload => acknowledge(client, ServiceVerb::Reload, stdout),
        CliCommand::CloseConnections => {
            acknowledge(client, ServiceVerb::CloseConnections, stdout)
        }
        CliCommand::Status { interval_ms, count } => {
            let records = client.status(Duration::from_millis(interval_ms.get()))?;
            for record in records.take(count.unwrap_or(usize::MAX)) {
                emit(stdout, &render_status(&record?))?;
            }
            Ok(())
        }
        CliCommand::Logs { count } => {
            let lines = client.logs()?;
            for line in lines.take(count.unwrap_or(usize::MAX)) {
                emit(stdout, &line?)?;
            }
            Ok(())
        }
    }
}

fn acknowledge<W: Write>(
    client: &CommandClient,
    verb: ServiceVerb,
    stdout: &mut W,
) -> Result<(), AppError> {
    match client.service(verb)? {
        ServiceAck::Ok => emit(stdout, "ok"),
        ServiceAck::Failed(message) => Err(AppError::Rejected {
            verb: verb.to_string(),
            message,
        }),
    }
}

fn emit<W: Write>(stdout: &mut W, line: &str) -> Result<(), AppError> {
    writeln!(stdout, "{line}")
        .and_then(|()| stdout.flush())
        .map_err(AppError::Output)
}

pub(crate) fn render_status(record: &StatusMessage) -> String {
    format!(
        "memory={} threads={} connections={}",
        record.memory, record.threads, record.connections
    )
}
