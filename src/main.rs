mod app;

use app::NiftyApp;
use nifty_app::config::Config;
use nifty_app::database::{ItemStore, SystemClock};
use std::process::ExitCode;

fn main() -> ExitCode {
    env_logger::Builder::from_env(env_logger::Env::default().default_filter_or("info")).init();

    let config = match Config::load() {
        Ok(config) => config,
        Err(e) => {
            log::error!("{}", e);
            return ExitCode::FAILURE;
        }
    };
    let combo = match config.key_combo() {
        Ok(combo) => combo,
        Err(e) => {
            log::error!("{}", e);
            return ExitCode::FAILURE;
        }
    };

    let store = match ItemStore::open(&config.database_path, SystemClock) {
        Ok(store) => store,
        Err(e) => {
            log::error!(
                "Cannot open item store {}: {}",
                config.database_path.display(),
                e
            );
            return ExitCode::FAILURE;
        }
    };

    match store.get_stats() {
        Ok(stats) => log::info!("{} items, {} due for review", stats.total, stats.due),
        Err(e) => log::warn!("Could not read statistics: {}", e),
    }

    let options = eframe::NativeOptions {
        viewport: egui::ViewportBuilder::default()
            .with_inner_size([config.window_width, config.window_height]),
        ..Default::default()
    };
    let result = eframe::run_native(
        "Spaced Repetition Learning",
        options,
        Box::new(move |cc| Ok(Box::new(NiftyApp::new(cc, store, combo)))),
    );

    match result {
        Ok(()) => ExitCode::SUCCESS,
        Err(e) => {
            log::error!("Window error: {}", e);
            ExitCode::FAILURE
        }
    }
}
