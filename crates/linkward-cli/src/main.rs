use std::process::ExitCode;

use clap::Parser;

use crate::cli::app::{App, Commands};
use crate::logging::Verbosity;

mod cli;
mod links;
mod logging;

#[tokio::main]
async fn main() -> anyhow::Result<ExitCode> {
    let app = App::parse();
    logging::init(Verbosity::from_flags(app.verbose, app.quiet));

    let valid = match app.cmd {
        Commands::Check(arg) => arg.run().await?,
    };
    Ok(if valid { ExitCode::SUCCESS } else { ExitCode::FAILURE })
}
