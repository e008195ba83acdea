mod app;
mod config;
mod headless;

use anyhow::Result;
use clap::Parser;

use lens_engine::logging::{init_logging, LoggingConfig};
use lens_engine::window::Runtime;

use crate::app::{ClearApp, LensApp};
use crate::config::{Cli, Preset, ViewConfig};

fn main() {
    let cli = Cli::parse();

    init_logging(LoggingConfig {
        env_filter: cli.log.clone(),
        ..LoggingConfig::default()
    });

    if let Err(err) = cli.into_config().and_then(run) {
        log::error!("{err:#}");
        std::process::exit(-1);
    }
}

fn run(config: ViewConfig) -> Result<()> {
    log::info!(
        "starting {:?} preset: {}x{} \"{}\"",
        config.preset,
        config.window.size.width,
        config.window.size.height,
        config.window.title
    );

    if config.headless {
        return headless::run(&config);
    }

    match config.preset {
        Preset::Lens => Runtime::run(
            config.window,
            config.gpu,
            LensApp::new(config.clear, config.blur, config.frames),
        ),
        Preset::Clear => Runtime::run(
            config.window,
            config.gpu,
            ClearApp::new(config.clear, config.frames),
        ),
    }
}
