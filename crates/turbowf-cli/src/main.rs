mod cli;
mod commands;
mod config;
mod error;
mod logging;

use clap::Parser;
use cli::{Cli, Commands};
use error::Result;
use tracing::{debug, error, info};

fn run_app() -> Result<()> {
    let cli = Cli::parse();

    logging::setup_logging(cli.verbose, cli.quiet, cli.log_file.clone())?;

    info!("turbowf v{} starting up.", env!("CARGO_PKG_VERSION"));
    debug!("Parsed CLI arguments: {:?}", cli);

    let config = cli.config.as_deref();
    let result = match cli.command {
        Commands::Info(args) => commands::info::run(args, config),
        Commands::Check(args) => commands::check::run(args, config),
        Commands::SetIoFlag(args) => commands::edit::set_io_flag(args, config),
        Commands::SetMo(args) => commands::edit::set_mo(args, config),
        Commands::PatchMatrix(args) => commands::edit::patch_matrix(args, config),
        Commands::Rewrite(args) => commands::edit::rewrite(args, config),
    };

    match &result {
        Ok(_) => info!("Command completed successfully."),
        Err(e) => error!("Command failed: {}", e),
    }
    result
}

fn main() {
    if let Err(e) = run_app() {
        eprintln!("\nError: {}", e);
        std::process::exit(1);
    }
}
