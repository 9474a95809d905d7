use super::commands::check::CheckCommands;
use super::commands::init::InitCommands;
use super::commands::navigate::NavigateCommands;
use super::commands::run::RunCommands;
use clap::{Parser, Subcommand};
use std::path::PathBuf;

#[derive(Parser)]
#[command(name = "hitscreen")]
#[command(about = "Screen navigation and hit-region runtime")]
pub struct Cli {
    /// Config file (defaults to <config dir>/hitscreen/config.toml)
    #[arg(long, global = true)]
    pub config: Option<PathBuf>,

    #[command(subcommand)]
    pub command: Commands,
}

#[derive(Subcommand)]
pub enum Commands {
    /// Run the screens in the terminal
    Run(RunCommands),
    /// Validate the registry and every hitbox document it references
    Check(CheckCommands),
    /// Navigate through screens headlessly and print each step
    Navigate(NavigateCommands),
    /// Write a config file
    Init(InitCommands),
}
