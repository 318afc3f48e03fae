//! Docfill: HTML template filler with generated placeholder rules.
//!
//! This is the main entry point for the `docfill` CLI. It loads `.env`,
//! parses arguments, initializes logging, dispatches to the appropriate
//! command handler, and handles errors with proper exit codes.

mod cli;
mod commands;
pub mod config;
pub mod context;
pub mod data;
pub mod documents;
pub mod error;
pub mod events;
pub mod exit_codes;
pub mod fs;
pub mod llm;
pub mod logging;
pub mod pdf;
pub mod process;
pub mod rules;
pub mod server;
pub mod service;
pub mod template;
pub mod vars;

#[cfg(test)]
mod test_support;

use cli::Cli;
use std::process::ExitCode;

#[tokio::main]
async fn main() -> ExitCode {
    // A missing .env file is normal; the credential may come from the environment.
    let _ = dotenvy::dotenv();

    let cli = Cli::parse_args();
    logging::init_tracing(cli.verbose);

    match commands::dispatch(cli).await {
        Ok(()) => ExitCode::from(exit_codes::SUCCESS as u8),
        Err(err) => {
            // Print user-actionable error message to stderr
            eprintln!("Error: {}", err);

            // Return appropriate exit code
            ExitCode::from(err.exit_code() as u8)
        }
    }
}
