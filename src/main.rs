//! implgen CLI entry point.

use clap::Parser;
use implgen::cli::{self, Cli, Commands, EXIT_ERROR};
use tracing_subscriber::EnvFilter;

/// Log filter: IMPLGEN_LOG if set, else debug with -v, else warnings only.
fn init_tracing(verbose: bool) {
    let filter = EnvFilter::try_from_env("IMPLGEN_LOG").unwrap_or_else(|_| {
        EnvFilter::new(if verbose { "implgen=debug" } else { "warn" })
    });
    tracing_subscriber::fmt()
        .with_env_filter(filter)
        .with_target(true)
        .with_writer(std::io::stderr)
        .init();
}

fn main() {
    let cli = Cli::parse();
    init_tracing(cli.verbose);

    let result = match &cli.command {
        Commands::Parse(args) => cli::run_parse(args),
        Commands::Locate(args) => cli::run_locate(args),
    };

    let exit_code = match result {
        Ok(code) => code,
        Err(e) => {
            eprintln!("Error: {:#}", e);
            EXIT_ERROR
        }
    };

    std::process::exit(exit_code);
}
