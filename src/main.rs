use ramlguard::cli::run_cli;
use ramlguard::logging::{init_logging, LogConfig};
use std::process::ExitCode;

fn main() -> ExitCode {
    let _guard = match init_logging(&LogConfig::from_env()) {
        Ok(guard) => guard,
        Err(e) => {
            eprintln!("Failed to initialize logging: {e:#}");
            return ExitCode::FAILURE;
        }
    };

    match run_cli() {
        Ok(true) => ExitCode::SUCCESS,
        Ok(false) => ExitCode::FAILURE,
        Err(e) => {
            tracing::error!(error = %format!("{e:#}"), "Command failed");
            eprintln!("error: {e:#}");
            ExitCode::FAILURE
        }
    }
}
