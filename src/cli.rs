use clap::{Parser, Subcommand};
use std::path::PathBuf;

#[derive(Parser)]
#[command(name = "dropwatch")]
#[command(about = "Watches an e-commerce listing page and reports product changes")]
#[command(version)]
pub struct Cli {
    /// Path to the config file (defaults to the platform config dir)
    #[arg(long, global = true)]
    pub config: Option<PathBuf>,

    #[command(subcommand)]
    pub command: Command,
}

#[derive(Subcommand)]
pub enum Command {
    /// Run the monitoring loop until interrupted
    Watch,

    /// Run a single pass and exit
    Check(CheckArgs),

    /// Display the persisted snapshot
    Show(ShowArgs),
}

#[derive(Parser)]
pub struct CheckArgs {
    /// Print detected changes without notifying or saving
    #[arg(long, default_value_t = false)]
    pub dry_run: bool,
}

#[derive(Parser)]
pub struct ShowArgs {
    /// Output as JSON instead of a table
    #[arg(long, default_value_t = false)]
    pub json: bool,
}
