use anyhow::Result;
use clap::Args;
use colored::*;

use hitscreen::config::Config;
use hitscreen::document::lock_document;
use hitscreen::hitregion;
use hitscreen::{RouteOutcome, Session, ShowOutcome};

#[derive(Args)]
pub struct NavigateCommands {
    /// Screens to visit, in order
    #[arg(required = true)]
    pub screens: Vec<String>,

    /// Registry path or URL (overrides the config file)
    #[arg(long)]
    pub registry: Option<String>,
}

pub async fn navigate_command(args: NavigateCommands, config: &Config) -> Result<()> {
    let session = super::open_session(config, args.registry.as_deref()).await?;

    report(&session, "start", &session.start().await);
    for screen in &args.screens {
        report(&session, screen, &session.go(screen).await);
    }
    Ok(())
}

fn report(session: &Session, requested: &str, outcome: &RouteOutcome) {
    match outcome {
        RouteOutcome::Rejected(rejection) => {
            println!("{} {} rejected: {:?}", "✗".bright_red().bold(), requested.bright_yellow(), rejection);
            return;
        }
        RouteOutcome::Delegated(ShowOutcome::Missing(id)) => {
            println!("{} {} has no container", "✗".bright_red().bold(), id.bright_yellow());
            return;
        }
        RouteOutcome::Delegated(_) => {}
    }

    let active = session.active_screen().unwrap_or_default();
    let (regions, stylesheets) = {
        let doc = lock_document(session.document());
        let regions = session
            .manager()
            .container(&active)
            .map(|container| hitregion::read_regions(&doc, container).len())
            .unwrap_or(0);
        (regions, doc.stylesheets())
    };

    println!(
        "{} {} {} hitboxes, stylesheets: [{}]",
        "→".bright_green().bold(),
        active.cyan().bold(),
        regions,
        stylesheets.join(", ").dimmed()
    );
}
