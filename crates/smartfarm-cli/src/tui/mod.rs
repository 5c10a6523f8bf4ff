//! Main entry point for the terminal dashboard.
//!
//! This module ties together the TUI components and provides the main
//! event loop. It handles:
//!
//! - Terminal setup and restoration
//! - Channel creation for worker communication
//! - The main event loop with input handling and rendering
//! - Releasing the live subscription on exit

pub mod app;
pub mod input;
pub mod ui;
pub mod worker;

pub use app::App;
pub use worker::DashboardWorker;

use std::io::{self, stdout};
use std::sync::Arc;
use std::time::{Duration, Instant};

use anyhow::Result;
use crossterm::{
    ExecutableCommand,
    event::{self, Event, KeyEventKind},
    terminal::{EnterAlternateScreen, LeaveAlternateScreen, disable_raw_mode, enable_raw_mode},
};
use ratatui::prelude::*;
use tokio::sync::mpsc;
use tracing::{info, warn};

use smartfarm_core::{Command, DashboardEvent, DevicePath, RealtimeSource, Thresholds};
use smartfarm_types::TimeRange;

/// Redraw at least this often so the clock keeps ticking.
const REDRAW_INTERVAL: Duration = Duration::from_secs(1);

/// Set up the terminal for TUI rendering.
///
/// Enables raw mode and switches to the alternate screen buffer.
pub fn setup_terminal() -> Result<Terminal<CrosstermBackend<io::Stdout>>> {
    enable_raw_mode()?;
    stdout().execute(EnterAlternateScreen)?;
    let backend = CrosstermBackend::new(stdout());
    let terminal = Terminal::new(backend)?;
    Ok(terminal)
}

/// Restore the terminal to its original state.
pub fn restore_terminal() -> Result<()> {
    disable_raw_mode()?;
    stdout().execute(LeaveAlternateScreen)?;
    Ok(())
}

/// Run the dashboard until the user quits.
///
/// 1. Creates the channels between UI loop and worker
/// 2. Spawns the background worker that owns `source`; opening the live
///    subscription is bounded by `open_timeout`
/// 3. Opens the live subscription and requests the initial window
/// 4. Runs the main event loop
/// 5. Shuts the worker down, which releases the subscription
pub async fn run(
    source: Arc<dyn RealtimeSource>,
    device: DevicePath,
    range: TimeRange,
    thresholds: Thresholds,
    open_timeout: Duration,
) -> Result<()> {
    let (cmd_tx, cmd_rx) = mpsc::channel::<Command>(32);
    let (event_tx, event_rx) = mpsc::unbounded_channel::<DashboardEvent>();

    info!(source = source.name(), device = %device, range = %range, "Starting dashboard");
    let mut app = App::new(source.name(), device.clone(), range, thresholds, event_rx);

    let worker =
        DashboardWorker::new(source, device, cmd_rx, event_tx).with_open_timeout(open_timeout);
    let worker_handle = tokio::spawn(worker.run());

    let initial = [
        Command::Subscribe {
            session: app.dashboard.session(),
        },
        Command::FetchHistory(app.dashboard.refresh_history()),
    ];
    for cmd in initial {
        send_command(&cmd_tx, cmd).await;
    }

    let mut terminal = setup_terminal()?;

    let result = run_event_loop(&mut terminal, &mut app, &cmd_tx).await;

    let _ = cmd_tx.send(Command::Shutdown).await;

    restore_terminal()?;

    let _ = worker_handle.await;
    info!("Dashboard closed");

    result
}

/// Send a command to the worker, waiting for room in the channel.
async fn send_command(command_tx: &mpsc::Sender<Command>, cmd: Command) {
    if let Err(e) = command_tx.send(cmd).await {
        warn!(command = ?e.0, "Worker stopped, command dropped");
    }
}

/// Main event loop for the TUI.
async fn run_event_loop(
    terminal: &mut Terminal<CrosstermBackend<io::Stdout>>,
    app: &mut App,
    command_tx: &mpsc::Sender<Command>,
) -> Result<()> {
    let mut last_draw: Option<Instant> = None;

    while !app.should_quit {
        let stale = last_draw.is_none_or(|at| at.elapsed() >= REDRAW_INTERVAL);
        if app.take_dirty() || stale {
            terminal.draw(|f| ui::draw(f, app))?;
            last_draw = Some(Instant::now());
        }

        // Poll for keyboard events with timeout
        if event::poll(Duration::from_millis(100))?
            && let Event::Key(key) = event::read()?
            && key.kind == KeyEventKind::Press
        {
            let action = input::handle_key(key.code, app.is_error(), app.show_help);
            for cmd in input::apply_action(app, action) {
                send_command(command_tx, cmd).await;
            }
        }

        // Non-blocking receive of worker events
        while let Ok(event) = app.event_rx.try_recv() {
            app.handle_dashboard_event(event);
        }
    }

    Ok(())
}
