use std::io;

use clap::Parser;
use log::info;

use pendulum::config::Cli;
use pendulum::simulation::run_headless;
use pendulum::{widget, Result};

/// Main function
fn main() -> Result<()> {
    env_logger::init();

    let config = Cli::parse().into_config()?;
    info!(
        "g = {} m/s², L1 = {} m, L2 = {} m, {} fps, {:?} clock",
        config.physics.g, config.physics.l1, config.physics.l2, config.fps, config.clock
    );

    match config.frames {
        Some(frames) => run_headless(
            config.physics,
            config.initial_state,
            config.fps,
            frames,
            &mut io::stdout().lock(),
        ),
        None => widget::run(&config),
    }
}
