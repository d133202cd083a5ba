//! TimeBlocks main entrypoint.

use clap::Parser;
use timeblocks::cli::parser::Cli;
use timeblocks::run;
use timeblocks::ui::messages::error;
use tracing_subscriber::EnvFilter;

/// Diagnostics go to stderr. `TIMEBLOCKS_LOG` takes precedence over `--verbose`.
fn init_tracing(verbose: bool) {
    let default = if verbose { "debug" } else { "warn" };
    let filter =
        EnvFilter::try_from_env("TIMEBLOCKS_LOG").unwrap_or_else(|_| EnvFilter::new(default));

    let _ = tracing_subscriber::fmt()
        .with_env_filter(filter)
        .with_writer(std::io::stderr)
        .with_target(false)
        .try_init();
}

fn main() {
    let cli = Cli::parse();
    init_tracing(cli.verbose);

    println!();
    if let Err(e) = run(&cli) {
        tracing::error!(error = %e, "command failed");
        error(format!("Error: {e}"));
        std::process::exit(1);
    }
}
