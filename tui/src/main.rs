use std::{env, fs::File};

use anyhow::{anyhow, Result};
use model_dashboard::DashboardConfig;

mod app;
mod ui;

use ui::screens::Route;

/// File to write logs to; the terminal itself is taken by the UI.
const LOG_VAR: &str = "DASHBOARD_LOG";

fn main() -> Result<()> {
    init_logging()?;

    let args: Vec<String> = env::args().skip(1).collect();
    let config = DashboardConfig::resolve(args.first().map(String::as_str))?;
    let start = match args.get(1) {
        Some(path) => Route::from_path(path).ok_or_else(|| anyhow!("unknown route: {path}"))?,
        None => Route::ModelSummary,
    };

    app::run::run(config, start)
}

fn init_logging() -> Result<()> {
    let Ok(path) = env::var(LOG_VAR) else {
        return Ok(());
    };

    let file = File::create(&path)?;
    env_logger::Builder::from_env(env_logger::Env::default().default_filter_or("info"))
        .target(env_logger::Target::Pipe(Box::new(file)))
        .init();

    log::info!("logging to {path}");
    Ok(())
}
