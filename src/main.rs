mod app;
mod catalog;
mod config;
mod export;
mod input;
mod logging;
mod session;
mod ui;
mod validators;
mod views;
mod wizard;

use std::io;
use std::path::PathBuf;
use std::time::{Duration, Instant};

use anyhow::{Context, Result};
use clap::Parser;
use crossterm::event::{Event, KeyEventKind};
use crossterm::execute;
use crossterm::terminal::{
    EnterAlternateScreen, LeaveAlternateScreen, disable_raw_mode, enable_raw_mode,
};
use ratatui::{DefaultTerminal, Terminal};
use tracing::{debug, info, warn};

use crate::app::App;
use crate::catalog::Catalog;
use crate::config::{Config, LoadedConfig};
use crate::input::handle_key;
use crate::ui::draw_ui;

/// Gamified wizard for finding AI opportunities in everyday workflows.
#[derive(Parser, Debug)]
#[command(name = "detective", version, about)]
struct Cli {
    /// Use this config file instead of the platform default
    #[arg(long, value_name = "PATH")]
    config: Option<PathBuf>,

    /// Load workflows and AI capabilities from this TOML file
    #[arg(long, value_name = "PATH")]
    catalog: Option<PathBuf>,

    /// Directory where exported plans are written
    #[arg(long, value_name = "DIR")]
    export_dir: Option<PathBuf>,

    /// Print the built-in catalog as TOML and exit
    #[arg(long)]
    print_catalog: bool,
}

/// Command-line flags win over file and environment values.
fn apply_cli_overrides(mut config: Config, cli: &Cli) -> Config {
    if let Some(path) = &cli.catalog {
        config.paths.catalog = path.display().to_string();
    }
    if let Some(dir) = &cli.export_dir {
        config.paths.export_dir = dir.display().to_string();
    }
    config
}

/// Built-in catalog unless a catalog file is configured.
fn load_catalog(config: &Config) -> Result<Catalog> {
    match config.catalog_path() {
        Some(path) => Catalog::load(&path)
            .with_context(|| format!("Could not load catalog {}", path.display())),
        None => {
            debug!("catalog_builtin");
            Ok(Catalog::builtin())
        }
    }
}

fn main() -> Result<()> {
    let cli = Cli::parse();

    if cli.print_catalog {
        print!("{}", Catalog::builtin().to_toml_string()?);
        return Ok(());
    }

    let start_time = Instant::now();

    // Initialize logging before anything else
    let logging = match logging::init() {
        Ok(ctx) => Some(ctx),
        Err(e) => {
            eprintln!("Warning: Failed to initialize logging: {}", e);
            None
        }
    };
    let session_id = logging
        .as_ref()
        .map(|ctx| ctx.session_id.clone())
        .unwrap_or_else(logging::generate_session_id);
    let log_directory = logging.as_ref().map(|ctx| ctx.log_directory.clone());

    // Load configuration
    let LoadedConfig {
        config,
        config_path,
        status,
    } = config::load_config(cli.config.as_deref());
    let config = apply_cli_overrides(config, &cli);
    debug!(
        config_path = %config_path.display(),
        status = ?status,
        "config_resolved"
    );

    if let Some(ctx) = &logging {
        if let Err(e) = logging::update_log_level(&ctx.reload_handle, &config.logging.level) {
            warn!(error = %e, "log_level_rejected");
        }
        logging::cleanup_old_logs(&ctx.log_directory);
    }

    // A bad catalog is fatal; report it before touching the terminal
    let catalog = load_catalog(&config)?;

    let app = App::new(catalog, &config, config_path, status, session_id.clone(), log_directory);

    // Setup terminal
    enable_raw_mode()?;
    let mut stdout = io::stdout();
    execute!(stdout, EnterAlternateScreen)?;
    let terminal = Terminal::new(ratatui::backend::CrosstermBackend::new(stdout))?;

    let result = run_app(terminal, app);

    // Restore terminal
    disable_raw_mode()?;
    execute!(io::stdout(), LeaveAlternateScreen)?;

    info!(
        session_id = %session_id,
        duration_secs = start_time.elapsed().as_secs_f64(),
        "session_end"
    );

    result
}

fn run_app(mut terminal: DefaultTerminal, mut app: App) -> Result<()> {
    loop {
        app.tick();
        terminal.draw(|f| draw_ui(f, &app))?;

        if crossterm::event::poll(Duration::from_millis(50))?
            && let Event::Key(key) = crossterm::event::read()?
            && key.kind == KeyEventKind::Press
        {
            handle_key(&mut app, key.code, key.modifiers);
        }

        if app.should_quit {
            let state = app.wizard.state();
            info!(
                stage = ?state.stage,
                score = state.score,
                badges = state.earned_badges.len(),
                "wizard_quit"
            );
            return Ok(());
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use tempfile::TempDir;

    #[test]
    fn test_cli_parses_flags() {
        let cli = Cli::parse_from([
            "detective",
            "--config",
            "/tmp/c.toml",
            "--catalog",
            "cat.toml",
            "--export-dir",
            "out",
        ]);
        assert_eq!(cli.config, Some(PathBuf::from("/tmp/c.toml")));
        assert!(!cli.print_catalog);

        let config = apply_cli_overrides(Config::default(), &cli);
        assert_eq!(config.paths.catalog, "cat.toml");
        assert_eq!(config.paths.export_dir, "out");
    }

    #[test]
    fn test_cli_without_flags_keeps_config() {
        let cli = Cli::parse_from(["detective"]);
        let config = apply_cli_overrides(Config::default(), &cli);
        assert_eq!(config.paths.export_dir, ".");
        assert!(config.catalog_path().is_none());
    }

    #[test]
    fn test_load_catalog_builtin_by_default() {
        let catalog = load_catalog(&Config::default()).unwrap();
        assert_eq!(catalog, Catalog::builtin());
    }

    #[test]
    fn test_load_catalog_missing_file_errors() {
        let dir = TempDir::new().unwrap();
        let mut config = Config::default();
        config.paths.catalog = dir.path().join("nope.toml").display().to_string();
        assert!(load_catalog(&config).is_err());
    }
}
