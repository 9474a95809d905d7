use anyhow::{Context, Result};
use clap::Parser;
use log::info;
use once_cell::sync::OnceCell;

mod cli;
mod tui;

use cli::{Cli, Commands};
use hitscreen::config::Config;

// Global Config instance
static CONFIG: OnceCell<Config> = OnceCell::new();

/// Get a reference to the global Config, defaults until `main` has loaded it
pub fn global_config() -> &'static Config {
    CONFIG.get_or_init(Config::default)
}

#[tokio::main]
async fn main() -> Result<()> {
    let cli = Cli::parse();

    let config = match cli.config.as_deref() {
        Some(path) => Config::load_from(path)?,
        None => Config::load()?,
    };

    // Initialize logger to file (truncate on each run)
    let log_file = std::fs::OpenOptions::new()
        .create(true)
        .write(true)
        .truncate(true)
        .open(&config.log_file)
        .with_context(|| format!("Failed to open log file: {:?}", config.log_file))?;
    env_logger::Builder::from_env(env_logger::Env::default().default_filter_or("info"))
        .target(env_logger::Target::Pipe(Box::new(log_file)))
        .init();

    info!("Starting hitscreen");
    CONFIG.set(config).map_err(|_| anyhow::anyhow!("Failed to initialize global Config"))?;
    let config = global_config();

    match cli.command {
        Commands::Run(args) => cli::commands::run::run_command(args, config).await,
        Commands::Check(args) => cli::commands::check::check_command(args, config).await,
        Commands::Navigate(args) => cli::commands::navigate::navigate_command(args, config).await,
        Commands::Init(args) => cli::commands::init::init_command(args, cli.config).await,
    }
}
