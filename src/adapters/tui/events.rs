use std::io::{self, Stdout};
use std::sync::Arc;
use std::time::Duration;

use crossterm::event::{
    DisableFocusChange, DisableMouseCapture, EnableFocusChange, EnableMouseCapture, EventStream,
};
use crossterm::execute;
use crossterm::terminal::{disable_raw_mode, enable_raw_mode, EnterAlternateScreen, LeaveAlternateScreen};
use futures::StreamExt;
use ratatui::{backend::CrosstermBackend, Terminal};
use thiserror::Error;
use tokio::sync::mpsc;
use tokio::task::JoinHandle;
use tokio::time::MissedTickBehavior;

use crate::ports::WalletPort;
use super::app::{App, AppEvent};
use super::ui;

/// Redraw cadence so "Last updated" stays current without input
const RENDER_TICK: Duration = Duration::from_secs(1);

#[derive(Debug, Error)]
pub enum TuiError {
    #[error("Terminal error: {0}")]
    Io(#[from] io::Error),
}

/// Raw mode, alternate screen, mouse capture and focus reporting for as long
/// as it lives
struct TerminalGuard;

impl TerminalGuard {
    fn enter() -> Result<Self, TuiError> {
        enable_raw_mode()?;
        execute!(io::stdout(), EnterAlternateScreen, EnableMouseCapture, EnableFocusChange)?;
        Ok(Self)
    }
}

impl Drop for TerminalGuard {
    fn drop(&mut self) {
        let _ = disable_raw_mode();
        let _ = execute!(io::stdout(), DisableFocusChange, DisableMouseCapture, LeaveAlternateScreen);
    }
}

/// Run the dashboard until the user quits
pub async fn run(
    mut app: App,
    mut events: mpsc::UnboundedReceiver<AppEvent>,
    session_poll: Duration,
) -> Result<(), TuiError> {
    let _guard = TerminalGuard::enter()?;
    let mut terminal = Terminal::new(CrosstermBackend::new(io::stdout()))?;
    terminal.clear()?;

    let interval = app.poller().spawn_interval();
    let sync = spawn_session_sync(app.wallet(), session_poll);

    app.start().await;
    let result = event_loop(&mut terminal, &mut app, &mut events).await;

    interval.abort();
    sync.abort();
    terminal.show_cursor()?;
    tracing::info!("Dashboard closed");
    result
}

async fn event_loop(
    terminal: &mut Terminal<CrosstermBackend<Stdout>>,
    app: &mut App,
    events: &mut mpsc::UnboundedReceiver<AppEvent>,
) -> Result<(), TuiError> {
    let mut input = EventStream::new();
    let mut snapshots = app.poller().subscribe();
    let mut session = app.session_context();
    let mut tick = tokio::time::interval(RENDER_TICK);
    tick.set_missed_tick_behavior(MissedTickBehavior::Skip);

    loop {
        let area = terminal.draw(|f| ui::render_ui(f, app))?.area;
        app.set_viewport(area);

        if app.should_quit {
            return Ok(());
        }

        tokio::select! {
            maybe_event = input.next() => match maybe_event {
                Some(Ok(event)) => app.handle_terminal_event(event).await,
                Some(Err(e)) => return Err(e.into()),
                None => return Ok(()),
            },
            Some(event) = events.recv() => app.handle_app_event(event),
            Ok(()) = snapshots.changed() => {
                let snapshot = snapshots.borrow_and_update().clone();
                app.set_snapshot(snapshot);
            }
            true = session.changed() => app.on_session_changed(),
            _ = tick.tick() => {}
        }
    }
}

/// Poll the provider for account and chain changes
fn spawn_session_sync(wallet: Arc<dyn WalletPort>, every: Duration) -> JoinHandle<()> {
    tokio::spawn(async move {
        let mut interval = tokio::time::interval(every);
        interval.set_missed_tick_behavior(MissedTickBehavior::Delay);
        loop {
            interval.tick().await;
            if let Err(e) = wallet.sync().await {
                tracing::debug!("Session sync failed: {}", e);
            }
        }
    })
}
