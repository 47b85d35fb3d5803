use anyhow::{Context, Result};
use clap::Parser;
use crossterm::event::{
    self, DisableMouseCapture, EnableMouseCapture, Event, KeyCode, KeyEventKind, MouseButton,
    MouseEvent, MouseEventKind,
};
use crossterm::execute;
use ratatui::DefaultTerminal;
use std::fs::File;
use std::path::Path;
use std::sync::Mutex;
use std::time::{Duration, Instant};
use tracing::warn;
use tracing_subscriber::{layer::SubscriberExt, util::SubscriberInitExt};
use tui_route_map::app::App;
use tui_route_map::config::{Cli, MapConfig};
use tui_route_map::input::WheelDirection;
use tui_route_map::ui;

/// Raw mode, alternate screen and mouse capture, released on drop
struct TerminalGuard {
    terminal: DefaultTerminal,
}

impl TerminalGuard {
    fn new() -> Result<Self> {
        let guard = Self {
            terminal: ratatui::init(),
        };
        execute!(std::io::stdout(), EnableMouseCapture)?;
        Ok(guard)
    }
}

impl Drop for TerminalGuard {
    fn drop(&mut self) {
        let _ = execute!(std::io::stdout(), DisableMouseCapture);
        ratatui::restore();
    }
}

fn init_logging(path: &Path) -> Result<()> {
    let file = File::create(path).with_context(|| format!("creating log file {}", path.display()))?;
    tracing_subscriber::registry()
        .with(
            tracing_subscriber::EnvFilter::try_from_default_env()
                .unwrap_or_else(|_| "tui_route_map=debug".into()),
        )
        .with(
            tracing_subscriber::fmt::layer()
                .with_ansi(false)
                .with_writer(Mutex::new(file)),
        )
        .init();
    Ok(())
}

fn main() -> Result<()> {
    let cli = Cli::parse();
    if let Some(path) = &cli.log_file {
        init_logging(path)?;
    }
    let config = MapConfig::from(&cli);

    let mut guard = TerminalGuard::new()?;
    guard.terminal.clear()?;

    let size = guard.terminal.size()?;
    let mut app = App::new(config, size.width as usize, size.height as usize);

    if let Some(path) = &cli.route {
        if let Err(e) = app.load_route(path) {
            warn!("failed to load route: {e:#}");
            app.set_status(format!("could not load {}", path.display()));
        }
    }

    run(&mut guard.terminal, &mut app)
}

/// Handle mouse events for panning, zooming and placing waypoints
fn handle_mouse(app: &mut App, mouse: MouseEvent) {
    // Always track mouse position for cursor marker
    app.set_mouse_pos(mouse.column, mouse.row);

    match mouse.kind {
        MouseEventKind::ScrollUp => app.wheel(mouse.column, mouse.row, WheelDirection::ZoomIn),
        MouseEventKind::ScrollDown => app.wheel(mouse.column, mouse.row, WheelDirection::ZoomOut),
        // Horizontal scroll for panning (trackpad two-finger swipe)
        MouseEventKind::ScrollLeft => app.pan(-1, 0),
        MouseEventKind::ScrollRight => app.pan(1, 0),
        MouseEventKind::Down(MouseButton::Left) => app.pointer_down(mouse.column, mouse.row),
        MouseEventKind::Drag(MouseButton::Left) => app.pointer_drag(mouse.column, mouse.row),
        MouseEventKind::Up(MouseButton::Left) => app.pointer_up(mouse.column, mouse.row),
        MouseEventKind::Down(MouseButton::Right) => app.remove_last_waypoint(),
        _ => {}
    }
}

fn handle_key(app: &mut App, code: KeyCode) {
    match code {
        KeyCode::Char('q') | KeyCode::Esc => app.quit(),

        // Pan with hjkl or arrow keys
        KeyCode::Left | KeyCode::Char('h') => app.pan(-1, 0),
        KeyCode::Right | KeyCode::Char('l') => app.pan(1, 0),
        KeyCode::Up | KeyCode::Char('k') => app.pan(0, -1),
        KeyCode::Down | KeyCode::Char('j') => app.pan(0, 1),

        KeyCode::Char('+') | KeyCode::Char('=') => app.zoom_in(),
        KeyCode::Char('-') | KeyCode::Char('_') => app.zoom_out(),

        KeyCode::Char('r') | KeyCode::Char('0') => app.reset_view(),

        KeyCode::Backspace | KeyCode::Char('u') => app.remove_last_waypoint(),
        KeyCode::Char('c') | KeyCode::Char('C') => app.clear_route(),
        KeyCode::Char('w') | KeyCode::Char('W') => {
            if let Err(e) = app.export_route() {
                warn!("export failed: {e:#}");
                app.set_status(format!("export failed: {e}"));
            }
        }

        _ => {}
    }
}

fn handle_event(app: &mut App, event: Event) {
    match event {
        // Only handle key press events (not release)
        Event::Key(key) if key.kind == KeyEventKind::Press => handle_key(app, key.code),
        Event::Mouse(mouse) => handle_mouse(app, mouse),
        Event::Resize(width, height) => app.resize(width as usize, height as usize),
        _ => {}
    }
}

fn run(terminal: &mut DefaultTerminal, app: &mut App) -> Result<()> {
    loop {
        // Frame boundary: coalesced input becomes one viewport recompute
        let now = Instant::now();
        app.tick(now);

        if app.take_redraw(now) {
            terminal.draw(|frame| ui::render(frame, app))?;
        }

        if event::poll(app.poll_timeout(Instant::now()))? {
            // Drain everything already queued before the next tick
            handle_event(app, event::read()?);
            while event::poll(Duration::ZERO)? {
                handle_event(app, event::read()?);
            }
        }

        if app.should_quit {
            break;
        }
    }

    Ok(())
}
