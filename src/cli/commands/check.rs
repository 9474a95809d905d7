use anyhow::{Context, Result};
use clap::Args;
use colored::*;
use std::fmt;
use std::sync::Arc;

use hitscreen::config::Config;
use hitscreen::hitregion::{HitRegion, HitRegionLoader, LoadIssue};
use hitscreen::{Action, ActionError, ControllerRegistry, Registry};

#[derive(Args)]
pub struct CheckCommands {
    /// Registry path or URL (overrides the config file)
    #[arg(long)]
    pub registry: Option<String>,
}

#[derive(Debug, Clone, PartialEq)]
pub enum Problem {
    MissingStartScreen(String),
    UnknownController(String),
    Document(LoadIssue),
    SkippedEntries(usize),
    InvalidAction { region: String, error: ActionError },
    UnknownTarget { region: String, target: String },
    OutOfBounds { region: String },
    ZeroSize { region: String },
}

impl fmt::Display for Problem {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            Problem::MissingStartScreen(id) => write!(f, "start screen '{}' is not registered", id),
            Problem::UnknownController(id) => write!(f, "unknown controller '{}'", id),
            Problem::Document(issue) => write!(f, "hitbox document {}", issue),
            Problem::SkippedEntries(n) => write!(f, "{} hitbox entries are not objects", n),
            Problem::InvalidAction { region, error } => write!(f, "{}: {}", region, error),
            Problem::UnknownTarget { region, target } => write!(f, "{}: target screen '{}' is not registered", region, target),
            Problem::OutOfBounds { region } => write!(f, "{}: extends past the screen edge", region),
            Problem::ZeroSize { region } => write!(f, "{}: has no area", region),
        }
    }
}

#[derive(Debug, Clone, PartialEq)]
pub struct ScreenAudit {
    pub screen_id: String,
    pub regions: usize,
    pub problems: Vec<Problem>,
}

fn region_name(region: &HitRegion, index: usize) -> String {
    region
        .id
        .as_deref()
        .or(region.label.as_deref())
        .map(str::to_string)
        .unwrap_or_else(|| format!("#{}", index))
}

fn audit_region(registry: &Registry, region: &HitRegion, index: usize) -> Vec<Problem> {
    let name = region_name(region, index);
    let mut problems = Vec::new();

    match Action::parse(&region.action) {
        Ok(action) if !registry.contains(action.target()) => problems.push(Problem::UnknownTarget {
            region: name.clone(),
            target: action.target().to_string(),
        }),
        Ok(_) => {}
        Err(error) => problems.push(Problem::InvalidAction { region: name.clone(), error }),
    }

    if region.w <= 0.0 || region.h <= 0.0 {
        problems.push(Problem::ZeroSize { region: name });
    } else if region.x + region.w > 100.0 || region.y + region.h > 100.0 {
        problems.push(Problem::OutOfBounds { region: name });
    }
    problems
}

/// Audit every registered screen; the first entry covers the registry itself
pub async fn audit(registry: &Registry, controllers: &ControllerRegistry, loader: &HitRegionLoader) -> Vec<ScreenAudit> {
    let mut audits = Vec::with_capacity(registry.len() + 1);

    let mut global = Vec::new();
    if !registry.contains(registry.start_screen()) {
        global.push(Problem::MissingStartScreen(registry.start_screen().to_string()));
    }
    audits.push(ScreenAudit { screen_id: "(registry)".to_string(), regions: 0, problems: global });

    for screen_id in registry.screen_ids() {
        let Some(descriptor) = registry.get(screen_id) else { continue };
        let mut problems = Vec::new();

        if let Some(controller) = descriptor.controller.as_deref().map(str::trim).filter(|c| !c.is_empty()) {
            if !controllers.contains(controller) {
                problems.push(Problem::UnknownController(controller.to_string()));
            }
        }

        let report = loader.load_report(descriptor.hitboxes.as_deref()).await;
        if let Some(issue) = report.issue {
            problems.push(Problem::Document(issue));
        }
        if report.skipped > 0 {
            problems.push(Problem::SkippedEntries(report.skipped));
        }
        for (index, region) in report.regions.iter().enumerate() {
            problems.extend(audit_region(registry, region, index));
        }

        audits.push(ScreenAudit {
            screen_id: screen_id.to_string(),
            regions: report.regions.len(),
            problems,
        });
    }
    audits
}

pub async fn check_command(args: CheckCommands, config: &Config) -> Result<()> {
    let fetcher = Arc::new(config.build_fetcher()?);
    let source = super::registry_source(config, args.registry.as_deref());
    println!("Checking {}", source.cyan());

    let registry = Registry::open(source, fetcher.as_ref())
        .await
        .with_context(|| format!("Failed to load screen registry from {}", source))?;
    let loader = HitRegionLoader::new(fetcher);
    let audits = audit(&registry, &ControllerRegistry::with_builtin(), &loader).await;

    let mut total = 0;
    for screen in &audits {
        if screen.problems.is_empty() {
            println!("{} {} ({} hitboxes)", "✓".bright_green().bold(), screen.screen_id, screen.regions);
            continue;
        }
        println!(
            "{} {} ({} hitboxes)",
            "✗".bright_red().bold(),
            screen.screen_id.bright_yellow().bold(),
            screen.regions
        );
        for problem in &screen.problems {
            println!("    {}", problem.to_string().red());
        }
        total += screen.problems.len();
    }

    println!();
    if total > 0 {
        anyhow::bail!("{} problems found in {} screens", total, registry.len());
    }
    println!("{}", format!("All {} screens look good", registry.len()).green());
    Ok(())
}
