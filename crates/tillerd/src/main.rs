use std::io::{self, Write};
use std::process::ExitCode;

fn main() -> ExitCode {
    match tillerd::run_daemon() {
        Ok(()) => ExitCode::SUCCESS,
        Err(error) => {
            drop(writeln!(io::stderr(), "tillerd: {error}"));
            ExitCode::FAILURE
        }
    }
}
