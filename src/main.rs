//! Binary entry point for the `slack` command.

use std::process::ExitCode;

#[tokio::main]
async fn main() -> ExitCode {
    match slack_cli::cli::run().await {
        Ok(()) => ExitCode::SUCCESS,
        Err(err) => {
            eprintln!("error: {:#}", err);
            ExitCode::FAILURE
        }
    }
}
