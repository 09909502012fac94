use assets_retry_core::logging;

mod cli;

use crate::cli::CliCommand;

#[tokio::main]
async fn main() {
    if let Err(err) = logging::init_logging() {
        match logging::init_logging_stderr() {
            Ok(()) => tracing::warn!("file logging unavailable, using stderr: {err:#}"),
            Err(stderr_err) => eprintln!("assets-retry: logging disabled: {err:#}; {stderr_err:#}"),
        }
    }

    if let Err(err) = CliCommand::run_from_args().await {
        eprintln!("assets-retry error: {:#}", err);
        std::process::exit(1);
    }
}
