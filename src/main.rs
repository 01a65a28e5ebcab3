use std::process::ExitCode;

use clap::Parser;

use steamchain::cli::{run, Cli};
use steamchain::config::schema::Verbosity;
use steamchain::error::SteamChainError;
use steamchain::observability::{init_logging, redact_secrets};

#[tokio::main]
async fn main() -> ExitCode {
    let cli = Cli::parse();

    let result = tokio::select! {
        result = run(cli) => result,
        _ = tokio::signal::ctrl_c() => Err(SteamChainError::Interrupted),
    };

    match result {
        Ok(outcome) => {
            tracing::debug!("Done: {} finds", outcome.finds.len());
            ExitCode::SUCCESS
        }
        Err(e) => {
            // Config errors and early interrupts happen before logging is set up.
            init_logging(Verbosity::Info);
            match &e {
                SteamChainError::Interrupted => tracing::warn!("Interrupted"),
                other => tracing::error!("{}", redact_secrets(&other.to_string())),
            }
            ExitCode::from(e.exit_code())
        }
    }
}
