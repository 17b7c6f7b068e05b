// SPDX-License-Identifier: MIT OR Apache-2.0
//! `NodeFlow` command-line driver.
//!
//! Runs the conversion engine against scene documents stored as RON:
//! - Scanning a scene for convertible materials
//! - Suggesting a target schema
//! - Validating and executing slot transfers
//! - Converting a single upstream network
//! - Inspecting and dumping the conversion tables
//! - Writing a default settings file
//!
//! Settings come from `nodeflow.ron` (see [`settings::NodeFlowSettings`]).

mod cli;
mod commands;
mod error;
mod settings;

use clap::Parser;
use cli::Cli;
use error::CliError;
use settings::NodeFlowSettings;
use tracing_subscriber::layer::SubscriberExt;
use tracing_subscriber::util::SubscriberInitExt;
use tracing_subscriber::{fmt, EnvFilter};

fn main() {
    let cli = Cli::parse();
    let settings = NodeFlowSettings::load_or_default(&cli.settings);

    // RUST_LOG wins over the settings file
    let directive = settings
        .as_ref()
        .map_or_else(|_| NodeFlowSettings::default().log_filter, |s| s.log_filter.clone());
    let env_filter = EnvFilter::try_from_default_env().unwrap_or_else(|_| EnvFilter::new(directive));

    tracing_subscriber::registry()
        .with(env_filter)
        .with(fmt::layer().with_writer(std::io::stderr))
        .init();

    tracing::debug!("NodeFlow v{}", env!("CARGO_PKG_VERSION"));

    let result = settings
        .map_err(CliError::from)
        .and_then(|settings| commands::run(cli.command, &settings, &cli.settings));
    if let Err(e) = result {
        tracing::error!("{e}");
        std::process::exit(1);
    }
}
