//! pct CLI - Main entry point.
//!
//! Exit codes:
//! - 0: Success
//! - 1: General error
//! - 2: Invalid arguments
//! - 4: Template error

use std::process::ExitCode;

use clap::Parser;
use pct_templates::TemplateError;
use tracing_subscriber::{fmt, prelude::*, EnvFilter};

mod commands;

use commands::{Cli, Commands};

/// CI-friendly exit codes
pub struct ExitCodes;

impl ExitCodes {
    pub const SUCCESS: u8 = 0;
    pub const GENERAL_ERROR: u8 = 1;
    pub const INVALID_ARGS: u8 = 2;
    pub const TEMPLATE_ERROR: u8 = 4;
}

fn main() -> ExitCode {
    let cli = Cli::parse();

    let default_level = if cli.verbose {
        "pct=debug,pct_templates=debug"
    } else if cli.quiet {
        "error"
    } else {
        "pct=info,pct_templates=info"
    };
    let filter = EnvFilter::try_from_default_env()
        .unwrap_or_else(|_| EnvFilter::new(format!("warn,{}", default_level)));

    // Ignore the error if a subscriber is already installed
    let _ = tracing_subscriber::registry()
        .with(fmt::layer().with_target(false).with_writer(std::io::stderr))
        .with(filter)
        .try_init();

    let result = match cli.command {
        Commands::New(args) => commands::new::execute(args),
        Commands::Version(args) => commands::version::execute(args),
    };

    match result {
        Ok(()) => ExitCode::from(ExitCodes::SUCCESS),
        Err(e) => {
            eprintln!("Error: {:#}", e);
            ExitCode::from(categorize_error(&e))
        }
    }
}

/// Map an error to an exit code
fn categorize_error(e: &anyhow::Error) -> u8 {
    match e.downcast_ref::<TemplateError>() {
        Some(TemplateError::TemplateNotFound(_)) => ExitCodes::INVALID_ARGS,
        Some(_) => ExitCodes::TEMPLATE_ERROR,
        None => ExitCodes::GENERAL_ERROR,
    }
}
