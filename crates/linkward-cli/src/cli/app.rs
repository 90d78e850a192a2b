use clap::{ArgAction, Parser, Subcommand};

use crate::cli::check::CheckArg;

#[derive(Clone, Debug, Parser)]
#[command(name = "linkward", version = env!("CARGO_PKG_VERSION"), about, long_about = None, propagate_version = true)]
pub struct App {
    #[command(subcommand)]
    pub cmd: Commands,

    /// More logging; repeat for debug output
    #[arg(short, long, action = ArgAction::Count, global = true)]
    pub verbose: u8,

    /// Only log errors
    #[arg(short, long, global = true, conflicts_with = "verbose")]
    pub quiet: bool,
}

#[derive(Clone, Debug, Subcommand)]
pub enum Commands {
    /// Validate the links of a link list
    #[command(alias = "c", name = "check")]
    Check(CheckArg),
}
