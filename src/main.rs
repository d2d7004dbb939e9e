use std::fs::OpenOptions;
use std::io;
use std::sync::Mutex;

use crossterm::{
    execute,
    terminal::{disable_raw_mode, enable_raw_mode, EnterAlternateScreen, LeaveAlternateScreen},
};
use ratatui::{backend::CrosstermBackend, Terminal};
use tracing_subscriber::EnvFilter;

use termtasks::{app::App, config::Config, storage, ui};

fn init_logging(config: &Config) {
    let file = match OpenOptions::new()
        .create(true)
        .append(true)
        .open(&config.log_file)
    {
        Ok(file) => file,
        Err(err) => {
            eprintln!("Logging disabled, cannot open {}: {}", config.log_file.display(), err);
            return;
        }
    };

    tracing_subscriber::fmt()
        .with_env_filter(
            EnvFilter::try_from_default_env().unwrap_or_else(|_| EnvFilter::new(&config.log_level)),
        )
        .with_writer(Mutex::new(file))
        .with_ansi(false)
        .init();
}

fn main() -> Result<(), Box<dyn std::error::Error>> {
    let (config, config_err) = match Config::load() {
        Ok(config) => (config, None),
        Err(err) => (Config::default(), Some(err)),
    };
    init_logging(&config);

    let (loaded, load_err) = storage::load_or_default(&config.data_file);
    let mut app = App::new(loaded.store);
    if let Some(err) = &config_err {
        tracing::warn!(error = %err, "Failed to read config, using defaults");
    }
    if let Some(err) = load_err {
        app.error(format!("Failed to load tasks: {err}"));
    } else if let Some(err) = config_err {
        app.error(format!("Config ignored: {err}"));
    } else if loaded.first_run {
        app.info("Welcome! This is your first run. Press 'a' to add a task.");
    }

    // Terminal setup
    enable_raw_mode()?;
    let mut stdout = io::stdout();
    execute!(stdout, EnterAlternateScreen)?;
    let backend = CrosstermBackend::new(stdout);
    let mut terminal = Terminal::new(backend)?;

    let result = ui::run_app(&mut terminal, &mut app, &config.data_file);

    // Restore terminal
    disable_raw_mode()?;
    execute!(terminal.backend_mut(), LeaveAlternateScreen)?;
    terminal.show_cursor()?;

    match result {
        Ok(true) => println!("Tasks saved to {}. Bye!", config.data_file.display()),
        Ok(false) => println!("Changes not saved."),
        Err(err) => eprintln!("Terminal error, changes not saved: {:?}", err),
    }
    Ok(())
}
