//! Pingen command-line client
//!
//! Thin shell over `pingen_core`: parses flags, initialises logging, dispatches
//! to a command handler and maps failures to exit codes.

mod cli;
mod commands;
mod output;

use cli::GlobalOptions;
use commands::AppContext;
use pingen_core::PingenError;
use std::process::ExitCode;

/// Exit code for usage and validation errors, matching clap's own
const EXIT_USAGE: u8 = 2;
const EXIT_FAILURE: u8 = 1;

#[tokio::main(flavor = "current_thread")]
async fn main() -> ExitCode {
    let matches = cli::build_cli().get_matches();
    let globals = GlobalOptions::from_matches(&matches);

    // RUST_LOG wins over the verbosity flags
    env_logger::Builder::from_env(env_logger::Env::default().default_filter_or(globals.log_filter()))
        .init();

    match run(globals, &matches).await {
        Ok(()) => ExitCode::SUCCESS,
        Err(e) => {
            eprintln!("error: {}", e);
            ExitCode::from(exit_code(&e))
        }
    }
}

async fn run(globals: GlobalOptions, matches: &clap::ArgMatches) -> anyhow::Result<()> {
    let ctx = AppContext::new(globals)?;
    match matches.subcommand() {
        Some(("auth", args)) => commands::auth::run(&ctx, args).await,
        Some(("config", args)) => commands::config::run(&ctx, args),
        Some(("org", args)) => commands::org::run(&ctx, args).await,
        Some(("letters", args)) => commands::letters::run(&ctx, args).await,
        _ => unreachable!("subcommand required"),
    }
}

fn exit_code(err: &anyhow::Error) -> u8 {
    match err.downcast_ref::<PingenError>() {
        Some(e) if e.is_validation() => EXIT_USAGE,
        _ => EXIT_FAILURE,
    }
}
