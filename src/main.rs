mod animation;
mod app;
mod config;
mod dial;
mod error;
mod event;
mod ui;

use std::io;
use std::path::Path;
use std::time::Duration;

use clap::Parser;
use color_eyre::eyre::{Result, WrapErr};
use crossterm::{
    execute,
    terminal::{disable_raw_mode, enable_raw_mode, EnterAlternateScreen, LeaveAlternateScreen},
};
use ratatui::backend::CrosstermBackend;
use ratatui::Terminal;
use tokio::sync::mpsc;
use tracing::info;

use crate::app::App;
use crate::config::{CliArgs, DialConfig};
use crate::dial::NavigationDial;
use crate::error::DialError;
use crate::event::{DriveCommand, Event, EventHandler};

#[tokio::main]
async fn main() -> Result<()> {
    let cli = CliArgs::parse();

    if cli.print_default_config {
        print!("{}", config::default_config_toml());
        return Ok(());
    }

    // Initialize color-eyre with a panic hook that restores the terminal
    install_panic_hook();

    let config = config::load(&cli)?;

    // The guard must live for the whole run or buffered log lines are lost
    let _log_guard = init_logging(cli.log.as_deref(), &config.general.log_level)?;

    info!("navdial starting");

    let dial_config = DialConfig::resolve(&config)?;
    let mut app = App::new(NavigationDial::new(dial_config));

    // Setup terminal
    enable_raw_mode()
        .map_err(|e| DialError::Terminal(format!("Failed to enable raw mode: {e}")))?;
    let mut stdout = io::stdout();
    execute!(stdout, EnterAlternateScreen)?;
    let backend = CrosstermBackend::new(stdout);
    let mut terminal = Terminal::new(backend)?;
    terminal.clear()?;

    // Create event handler
    let mut event_handler = EventHandler::new(config.tick_rate_ms());

    if cli.tour {
        spawn_demo_tour(event_handler.sender());
    }

    // ── Main event loop ───────────────────────────────────────────────
    loop {
        // Draw
        terminal.draw(|f| ui::draw(f, &mut app))?;

        // Handle events
        if let Some(event) = event_handler.next().await {
            app.handle_event(event);
            if app.should_quit {
                break;
            }
        } else {
            break;
        }
    }
    event_handler.stop();

    // Restore terminal
    disable_raw_mode()?;
    execute!(terminal.backend_mut(), LeaveAlternateScreen)?;
    terminal.show_cursor()?;

    info!("navdial exiting");
    Ok(())
}

/// Install a panic hook that restores the terminal before printing the panic
fn install_panic_hook() {
    let default_hook = std::panic::take_hook();
    std::panic::set_hook(Box::new(move |panic_info| {
        // Restore terminal
        let _ = disable_raw_mode();
        let _ = execute!(io::stdout(), LeaveAlternateScreen);
        // Call default handler
        default_hook(panic_info);
    }));
    color_eyre::install().ok();
}

/// Initialize tracing to a log file. Without a log path all output is
/// discarded (a TUI cannot log to stdout).
fn init_logging(
    log_path: Option<&Path>,
    level: &str,
) -> Result<Option<tracing_appender::non_blocking::WorkerGuard>> {
    use tracing_subscriber::EnvFilter;

    match log_path {
        Some(path) => {
            let file = std::fs::File::create(path)
                .wrap_err_with(|| format!("Failed to create log file {}", path.display()))?;
            let (writer, guard) = tracing_appender::non_blocking(file);
            tracing_subscriber::fmt()
                .with_env_filter(
                    EnvFilter::try_from_default_env()
                        .unwrap_or_else(|_| EnvFilter::new(level.to_string())),
                )
                .with_writer(writer)
                .with_ansi(false)
                .init();
            Ok(Some(guard))
        }
        None => {
            tracing_subscriber::fmt()
                .with_env_filter(EnvFilter::new("off"))
                .with_writer(io::sink)
                .init();
            Ok(None)
        }
    }
}

/// The scripted demo: grow progress to arrival, dwell, approach, back out,
/// approach again.
fn spawn_demo_tour(tx: mpsc::UnboundedSender<Event>) {
    tokio::spawn(async move {
        let send = |cmd: DriveCommand| tx.send(Event::Drive(cmd)).is_ok();

        // Ride the smooth driver from 60% to arrival in small increments
        if !send(DriveCommand::SetProgress(0.6)) {
            return;
        }
        let mut progress = 6000u32;
        while progress < 10_000 {
            if !send(DriveCommand::SmoothProgress(progress as f32 / 10_000.0)) {
                return;
            }
            progress += 5;
            tokio::time::sleep(Duration::from_millis(5)).await;
        }
        if !send(DriveCommand::SmoothProgress(1.0)) {
            return;
        }
        tokio::time::sleep(Duration::from_secs(5)).await;

        if !send(DriveCommand::Nearby(true)) {
            return;
        }
        tokio::time::sleep(Duration::from_secs(5)).await;

        if !send(DriveCommand::SmoothProgress(0.7)) {
            return;
        }
        tokio::time::sleep(Duration::from_secs(2)).await;

        send(DriveCommand::Nearby(true));
    });
}
