use std::time::Duration;

use anyhow::Result;
use crossterm::event::{Event, KeyEventKind};
use ratatui::DefaultTerminal;

use btc_forecast::config::Config;
use btc_forecast::forecast::Horizon;
use btc_forecast::input::{parse_command, UiCommand};
use btc_forecast::session;
use btc_forecast::ui::{self, AppState};

fn init_tracing(config: &Config) -> Result<()> {
    // Log to file so it doesn't interfere with the TUI
    let log_file = std::fs::File::create(&config.logging.file)?;
    tracing_subscriber::fmt()
        .with_env_filter(
            tracing_subscriber::EnvFilter::try_from_default_env().unwrap_or_else(|_| {
                tracing_subscriber::EnvFilter::new(config.logging.level.as_str())
            }),
        )
        .with_writer(log_file)
        .with_ansi(false)
        .json()
        .init();
    Ok(())
}

fn run_once(config: &Config, horizon: Horizon, app_state: &mut AppState) {
    let result = session::build_view(config, horizon);
    if let Err(e) = &result {
        tracing::error!(error = %e, "Dashboard run halted");
    }
    app_state.set_run_result(result);
}

/// Draw/poll loop. Returns on quit or on the first terminal error; the caller
/// restores the terminal either way.
fn run_dashboard(
    terminal: &mut DefaultTerminal,
    config: &Config,
    horizon: Horizon,
    app_state: &mut AppState,
) -> Result<()> {
    terminal.draw(|frame| ui::render(frame, app_state))?;
    run_once(config, horizon, app_state);

    loop {
        terminal.draw(|frame| ui::render(frame, app_state))?;

        if !crossterm::event::poll(Duration::from_millis(config.ui.refresh_rate_ms))? {
            continue;
        }
        let Event::Key(key) = crossterm::event::read()? else {
            continue;
        };
        if key.kind != KeyEventKind::Press {
            continue;
        }
        let Some(cmd) = parse_command(&key.code) else {
            continue;
        };
        if cmd == UiCommand::Quit {
            tracing::info!("User quit");
            return Ok(());
        }
        if let Some(next) = app_state.apply(cmd) {
            tracing::info!(horizon_minutes = next.minutes(), "Horizon changed, re-running");
            run_once(config, next, app_state);
        }
    }
}

fn main() -> Result<()> {
    let config = match Config::load() {
        Ok(c) => c,
        Err(e) => {
            eprintln!("Failed to load config: {:#}", e);
            std::process::exit(1);
        }
    };

    init_tracing(&config)?;

    tracing::info!(
        csv = %config.data.csv_path.display(),
        model = %config.model.path.display(),
        horizon_minutes = config.forecast.default_horizon_minutes,
        "Starting btc-forecast"
    );

    let horizon = Horizon::new(config.forecast.default_horizon_minutes as i64)?;
    let mut app_state = AppState::new(horizon, config.ui.chart_points);

    let mut terminal = ratatui::init();
    let result = run_dashboard(&mut terminal, &config, horizon, &mut app_state);
    ratatui::restore();
    if let Err(e) = &result {
        tracing::error!(error = %e, "Terminal loop failed");
    }
    tracing::info!("Shutdown complete");
    result
}
