//! Market View - Terminal UI for the coin market
//!
//! Treemap of the whole market next to the selected coin's live chart,
//! estimates and recent trades.

use std::io;
use std::time::Duration;

use anyhow::{Context, Result};
use crossterm::{
    event::{
        self, DisableFocusChange, DisableMouseCapture, EnableFocusChange, EnableMouseCapture,
        Event, KeyCode, KeyEventKind,
    },
    execute,
    terminal::{disable_raw_mode, enable_raw_mode, EnterAlternateScreen, LeaveAlternateScreen},
};
use ratatui::{backend::CrosstermBackend, Terminal};

use coinmarket::application::visualizer::{ui, App};
use coinmarket::TerminalConfig;
use coinmarket_terminal::bin_common::{load_config_from_env, ConfigType};

fn main() -> Result<()> {
    // Note: Logging is disabled for TUI - it would corrupt the alternate screen display

    let config_path = load_config_from_env(ConfigType::Terminal);
    let config = TerminalConfig::load(&config_path)
        .with_context(|| format!("loading {}", config_path.display()))?;

    // Create tokio runtime
    let runtime = tokio::runtime::Runtime::new()?;

    // Initialize the app (market listing, first coin, live feed)
    let mut app = runtime.block_on(async { App::initialize(runtime.handle().clone(), config).await })?;

    // Setup terminal
    enable_raw_mode()?;
    let mut stdout = io::stdout();
    execute!(stdout, EnterAlternateScreen, EnableMouseCapture, EnableFocusChange)?;
    let backend = CrosstermBackend::new(stdout);
    let mut terminal = Terminal::new(backend)?;

    // Run the main loop
    let result = run_app(&mut terminal, &mut app);

    // Restore terminal
    disable_raw_mode()?;
    execute!(
        terminal.backend_mut(),
        LeaveAlternateScreen,
        DisableMouseCapture,
        DisableFocusChange
    )?;
    terminal.show_cursor()?;

    // Shutdown app
    app.shutdown();

    if let Err(e) = result {
        eprintln!("Error: {}", e);
    }

    Ok(())
}

fn run_app<B: ratatui::backend::Backend>(terminal: &mut Terminal<B>, app: &mut App) -> Result<()> {
    loop {
        // Fold queued stream events before drawing
        app.tick();

        terminal.draw(|frame| ui::draw(frame, app))?;

        // Handle input with a short timeout (for real-time updates)
        if event::poll(Duration::from_millis(50))? {
            match event::read()? {
                Event::Key(key) if key.kind == KeyEventKind::Press => match key.code {
                    KeyCode::Char('q') | KeyCode::Esc => app.should_quit = true,
                    KeyCode::Char('j') | KeyCode::Down => app.next_coin(),
                    KeyCode::Char('k') | KeyCode::Up => app.prev_coin(),
                    KeyCode::Char('b') => app.buy(),
                    KeyCode::Char('s') => app.sell(),
                    KeyCode::Char('+') | KeyCode::Char('=') => app.increase_size(),
                    KeyCode::Char('-') => app.decrease_size(),
                    KeyCode::Char('r') => app.refresh(),
                    _ => {}
                },
                // Hidden terminal: stop polling and backoff until focus returns
                Event::FocusLost => app.suspend(),
                Event::FocusGained => app.resume(),
                _ => {}
            }
        }

        if app.should_quit {
            break;
        }
    }

    Ok(())
}
