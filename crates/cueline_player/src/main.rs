// SPDX-License-Identifier: MIT OR Apache-2.0
//! `cueline` headless player.
//!
//! Loads a project document and a settings file, wires the timeline through
//! the event router to logging receivers and drives it frame by frame:
//! - `play`: forward playback over a tick range
//! - `scrub`: arbitrary seeks, as an editor scrub bar would issue them
//! - `inspect`: channel summary and curve sampling
//! - `normalize`: import/export round trip of a document

mod commands;
mod driver;
mod receivers;
mod settings;

use clap::Parser;
use commands::Command;
use settings::PlayerSettings;
use std::path::PathBuf;
use tracing_subscriber::layer::SubscriberExt;
use tracing_subscriber::util::SubscriberInitExt;

/// Headless trigger/curve timeline player
#[derive(Parser, Debug)]
#[command(author, version, about, long_about = None)]
struct Cli {
    /// Player settings (RON); defaults are used when omitted
    #[arg(short = 's', long = "settings", value_name = "FILE", global = true)]
    settings: Option<PathBuf>,

    #[command(subcommand)]
    command: Command,
}

fn init_logging() {
    let mut env_filter = tracing_subscriber::EnvFilter::from_default_env();
    for directive in ["cueline_player=info", "cueline_sequencer=info", "cueline_router=info"] {
        match directive.parse() {
            Ok(directive) => env_filter = env_filter.add_directive(directive),
            Err(e) => eprintln!("Ignoring log directive '{directive}': {e}"),
        }
    }

    tracing_subscriber::registry()
        .with(env_filter)
        .with(tracing_subscriber::fmt::layer().with_writer(std::io::stderr))
        .init();
}

fn main() {
    init_logging();
    let cli = Cli::parse();

    tracing::info!("Starting cueline player v{}", env!("CARGO_PKG_VERSION"));

    let settings = match cli.settings.as_deref().map(PlayerSettings::load) {
        None => PlayerSettings::default(),
        Some(Ok(settings)) => settings,
        Some(Err(e)) => {
            tracing::error!("Could not load settings: {e}");
            std::process::exit(2);
        }
    };

    if let Err(e) = commands::run(cli.command, &settings) {
        tracing::error!("{e}");
        std::process::exit(1);
    }
}
