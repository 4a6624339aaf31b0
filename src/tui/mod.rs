pub mod app;
pub mod input;
pub mod ui;

use anyhow::{anyhow, Result};
use ratatui::{backend::CrosstermBackend, prelude::*};
use std::{
    io::{self, Stdout},
    time::Duration,
};

use crate::{
    api::HttpTransport,
    cli::config::ClientConfig,
    core::{join_core, spawn_core, Controller, Session},
    tui::input::map_key,
};
use app::App;

const CORE_SHUTDOWN_GRACE: Duration = Duration::from_millis(500);

pub fn start(config: &ClientConfig) -> Result<()> {
    log::info!("[TUI] regpanel starting against {}", config.backend_url);

    let transport = HttpTransport::new(&config.backend_url, config.timeout());
    let (bus, core_handle) = spawn_core(transport)?;
    let mut app = App::new(Controller::new(Session::new(config.coercion), bus));
    app.refresh()?;

    // Setup terminal
    let mut stdout = io::stdout();
    crossterm::terminal::enable_raw_mode()?;
    crossterm::execute!(stdout, crossterm::terminal::EnterAlternateScreen)?;
    let backend = CrosstermBackend::new(stdout);
    let mut terminal = Terminal::new(backend)?;

    let res = run_app(&mut terminal, &mut app);

    // Restore terminal
    let mut stdout = io::stdout();
    crossterm::execute!(stdout, crossterm::terminal::LeaveAlternateScreen)?;
    crossterm::terminal::disable_raw_mode()?;

    app.controller.shutdown();
    join_core(core_handle, CORE_SHUTDOWN_GRACE);

    res
}

fn run_app(terminal: &mut Terminal<CrosstermBackend<Stdout>>, app: &mut App) -> Result<()> {
    loop {
        app.sync()?;
        terminal.draw(|f| ui::render_ui(f, app))?;

        if !crossterm::event::poll(Duration::from_millis(100))? {
            continue;
        }
        let event = crossterm::event::read().map_err(|err| anyhow!("input read error: {err}"))?;

        if let crossterm::event::Event::Key(key) = event {
            // Only handle the initial key press event. Ignore Repeat and Release
            // events so a single physical key press maps to a single action.
            if key.kind != crossterm::event::KeyEventKind::Press {
                continue;
            }
            if app.handle(map_key(key, app.focus))? {
                break;
            }
        }
    }

    terminal.clear()?;
    Ok(())
}
