pub mod check;
pub mod init;
pub mod navigate;
pub mod run;

use anyhow::{Context, Result};
use std::sync::Arc;

use hitscreen::config::Config;
use hitscreen::{ControllerRegistry, Registry, Session};

/// Registry source: the command line wins over the config file
fn registry_source<'a>(config: &'a Config, registry: Option<&'a str>) -> &'a str {
    registry.unwrap_or(&config.registry)
}

/// Load the registry and boot a session with the built-in controllers
async fn open_session(config: &Config, registry: Option<&str>) -> Result<Session> {
    let fetcher = Arc::new(config.build_fetcher()?);
    let source = registry_source(config, registry);
    let registry = Registry::open(source, fetcher.as_ref())
        .await
        .with_context(|| format!("Failed to load screen registry from {}", source))?;

    Ok(Session::boot(registry, fetcher, ControllerRegistry::with_builtin()))
}
