use anyhow::{Result, bail};
use clap::Args;
use colored::*;
use std::path::{Path, PathBuf};

use hitscreen::config::Config;

#[derive(Args)]
pub struct InitCommands {
    /// Registry path or URL to record
    #[arg(long)]
    pub registry: Option<String>,

    /// Directory relative resource paths resolve against
    #[arg(long)]
    pub assets_dir: Option<PathBuf>,

    /// Fetch relative resources from this URL
    #[arg(long)]
    pub base_url: Option<String>,

    /// Replace an existing config file
    #[arg(long)]
    pub force: bool,
}

impl InitCommands {
    /// `base` with the given flags applied
    fn apply(&self, mut base: Config) -> Config {
        if let Some(registry) = &self.registry {
            base.registry = registry.clone();
        }
        if let Some(assets_dir) = &self.assets_dir {
            base.assets_dir = assets_dir.clone();
        }
        if let Some(base_url) = &self.base_url {
            base.base_url = Some(base_url.clone());
        }
        base
    }
}

/// Write a config file at `path`, refusing to overwrite unless forced
pub fn write_config(args: &InitCommands, path: &Path) -> Result<Config> {
    if path.exists() && !args.force {
        bail!("Config file {:?} already exists (use --force to replace it)", path);
    }
    let config = args.apply(Config::default());
    config.save_to(path)?;
    Ok(config)
}

pub async fn init_command(args: InitCommands, path: Option<PathBuf>) -> Result<()> {
    let path = match path {
        Some(path) => path,
        None => Config::get_config_path()?,
    };
    let config = write_config(&args, &path)?;

    println!("{} Wrote {}", "✓".bright_green().bold(), path.display().to_string().cyan());
    println!("    registry: {}", config.registry);
    println!("    assets:   {}", config.assets_dir.display());
    if let Some(base_url) = &config.base_url {
        println!("    base url: {}", base_url);
    }
    Ok(())
}
