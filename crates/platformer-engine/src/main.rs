//! # Platformer Engine
//!
//! Headless runner for the platformer simulation.
//!
//! Drives the core for a number of frames, either from a scripted autopilot
//! or from a recorded replay, and reports what happened through `tracing`.

#![warn(missing_docs)]
#![warn(clippy::all)]
#![deny(clippy::unwrap_used)]

mod app;
mod autopilot;

use anyhow::Result;
use clap::Parser;
use tracing::info;
use tracing_subscriber::{fmt, prelude::*, EnvFilter};

/// Main entry point.
fn main() -> Result<()> {
    let options = app::RunOptions::parse();

    let filter = EnvFilter::from_default_env().add_directive("platformer=info".parse()?);
    if options.log_json {
        tracing_subscriber::registry()
            .with(fmt::layer().json())
            .with(filter)
            .init();
    } else {
        tracing_subscriber::registry()
            .with(fmt::layer())
            .with(filter)
            .init();
    }

    info!("Platformer starting...");
    info!("Version: {}", env!("CARGO_PKG_VERSION"));

    app::run(&options)?;

    info!("Platformer shutdown complete");
    Ok(())
}
