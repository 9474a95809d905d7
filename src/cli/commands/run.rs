use anyhow::{Context, Result};
use clap::Args;
use crossterm::{
    event::{self, DisableMouseCapture, EnableMouseCapture, Event, KeyEventKind},
    execute,
    terminal::{EnterAlternateScreen, LeaveAlternateScreen, disable_raw_mode, enable_raw_mode},
};
use ratatui::{
    Terminal,
    backend::{Backend, CrosstermBackend},
};
use std::io;
use std::sync::Arc;
use std::time::Duration;

use crate::tui::ScreenHost;
use hitscreen::config::Config;

#[derive(Args)]
pub struct RunCommands {
    /// Registry path or URL (overrides the config file)
    #[arg(long)]
    pub registry: Option<String>,

    /// Screen to open instead of the registry's start screen
    #[arg(long)]
    pub start: Option<String>,

    /// Enable the calibrator overlay (F2)
    #[arg(long)]
    pub debug: bool,
}

pub async fn run_command(args: RunCommands, config: &Config) -> Result<()> {
    let session = Arc::new(super::open_session(config, args.registry.as_deref()).await?);

    let outcome = match args.start.as_deref() {
        Some(start) => session.go(start).await,
        None => session.start().await,
    };
    if outcome.is_rejected() {
        log::warn!("Start navigation rejected: {:?}", outcome);
    }

    let host = ScreenHost::new(Arc::clone(&session), args.debug || config.debug);
    launch_host(host, config.tick()).await
}

async fn launch_host(mut host: ScreenHost, tick: Duration) -> Result<()> {
    // Setup terminal
    enable_raw_mode().context("Failed to enable raw mode")?;
    let mut terminal = setup_or_restore(setup_terminal, restore_after_failed_setup)?;

    let result = run_host(&mut terminal, &mut host, tick).await;

    // Restore terminal
    disable_raw_mode()?;
    execute!(terminal.backend_mut(), LeaveAlternateScreen, DisableMouseCapture)?;
    terminal.show_cursor()?;

    result
}

/// Run `setup`; when it fails, run `restore` before handing the error back
fn setup_or_restore<T>(setup: impl FnOnce() -> Result<T>, restore: impl FnOnce()) -> Result<T> {
    setup().inspect_err(|_| restore())
}

fn setup_terminal() -> Result<Terminal<CrosstermBackend<io::Stdout>>> {
    let mut stdout = io::stdout();
    execute!(stdout, EnterAlternateScreen, EnableMouseCapture).context("Failed to enter alternate screen")?;
    Terminal::new(CrosstermBackend::new(stdout)).context("Failed to create terminal")
}

/// Best-effort teardown after a failed setup
fn restore_after_failed_setup() {
    if let Err(e) = execute!(io::stdout(), LeaveAlternateScreen, DisableMouseCapture) {
        log::warn!("Failed to leave alternate screen: {}", e);
    }
    if let Err(e) = disable_raw_mode() {
        log::warn!("Failed to disable raw mode: {}", e);
    }
}

async fn run_host<B: Backend>(terminal: &mut Terminal<B>, host: &mut ScreenHost, tick: Duration) -> Result<()> {
    loop {
        let frame_start = std::time::Instant::now();

        // Process all pending events first for minimal input latency
        let mut should_quit = false;
        while event::poll(Duration::from_millis(0))? {
            match event::read()? {
                Event::Key(key) if key.kind == KeyEventKind::Press => {
                    if !host.handle_key(key)? {
                        should_quit = true;
                        break;
                    }
                }
                Event::Mouse(mouse) => {
                    if !host.handle_mouse(mouse).await? {
                        should_quit = true;
                        break;
                    }
                }
                _ => {}
            }
        }

        if should_quit {
            break;
        }

        host.poll();
        terminal.draw(|frame| host.render(frame))?;

        // Sleep for the remainder of the frame
        if let Some(remaining) = tick.checked_sub(frame_start.elapsed()) {
            tokio::time::sleep(remaining).await;
        }
    }

    Ok(())
}

#[cfg(test)]
mod tests {
    use super::*;
    use std::cell::Cell;

    /// Test that a failed terminal setup still restores the terminal
    #[test]
    fn test_failed_setup_restores() {
        let restored = Cell::new(false);
        let result: Result<()> = setup_or_restore(|| anyhow::bail!("no tty"), || restored.set(true));
        assert!(result.is_err());
        assert!(restored.get());
    }

    /// Test that a successful setup leaves the terminal alone
    #[test]
    fn test_successful_setup_does_not_restore() {
        let restored = Cell::new(false);
        let value = setup_or_restore(|| Ok(7), || restored.set(true)).unwrap();
        assert_eq!(value, 7);
        assert!(!restored.get());
    }
}
