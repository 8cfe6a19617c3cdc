// SPDX-License-Identifier: MIT OR Apache-2.0
//! Command implementations for the player binary.

use crate::driver::{Player, RunReport};
use crate::settings::{PlayerSettings, SettingsError};
use clap::Subcommand;
use cueline_sequencer::{
    curve_value_at, DocumentError, ImportSummary, ProjectDocument, TimelineProject,
};
use std::path::{Path, PathBuf};
use thiserror::Error;

/// Errors surfaced to the command line
#[derive(Debug, Error)]
pub enum PlayerError {
    /// Project document problem
    #[error(transparent)]
    Document(#[from] DocumentError),
    /// Settings problem
    #[error(transparent)]
    Settings(#[from] SettingsError),
}

/// Result alias for commands
pub type Result<T> = std::result::Result<T, PlayerError>;

/// Player subcommands
#[derive(Subcommand, Debug)]
pub enum Command {
    /// Play a project forward frame by frame
    Play {
        /// Project document (JSON)
        #[arg(value_name = "DOCUMENT")]
        document: PathBuf,
        /// First tick
        #[arg(long, default_value_t = 0)]
        from: i64,
        /// Last tick (defaults to the project duration)
        #[arg(long)]
        to: Option<i64>,
    },
    /// Visit arbitrary ticks in order, as an editor scrub bar would
    Scrub {
        /// Project document (JSON)
        #[arg(value_name = "DOCUMENT")]
        document: PathBuf,
        /// Ticks to visit
        #[arg(value_name = "TICK", required = true, allow_negative_numbers = true)]
        times: Vec<i64>,
    },
    /// Summarize a project
    Inspect {
        /// Project document (JSON)
        #[arg(value_name = "DOCUMENT")]
        document: PathBuf,
        /// Also sample every curve at these ticks
        #[arg(long = "at", value_name = "TICK")]
        at: Vec<i64>,
    },
    /// Write the effective settings (defaults when none were given)
    Settings {
        /// Output path
        #[arg(value_name = "FILE")]
        output: PathBuf,
    },
    /// Re-import and re-export a document, dropping malformed records
    Normalize {
        /// Project document (JSON)
        #[arg(value_name = "DOCUMENT")]
        document: PathBuf,
        /// Output path (defaults to overwriting the input)
        #[arg(short, long, value_name = "FILE")]
        output: Option<PathBuf>,
    },
}

fn load_project(path: &Path) -> Result<(TimelineProject, ImportSummary)> {
    let document = ProjectDocument::load(path)?;
    let (project, summary) = document.to_project();
    tracing::info!(
        "Loaded {}: {} records imported, {} skipped",
        path.display(),
        summary.imported,
        summary.skipped
    );
    Ok((project, summary))
}

fn print_report(report: &RunReport) {
    for call in &report.calls {
        println!("{call}");
    }
    println!(
        "-- {} frames: {} advanced, {} jumped, {} idle, {} receiver calls",
        report.frames,
        report.advanced,
        report.jumped,
        report.idle,
        report.calls.len()
    );
}

/// Human-readable project summary
pub fn describe(project: &TimelineProject, sample_at: &[i64]) -> Vec<String> {
    let mut lines = vec![
        format!("background: {}", project.background()),
        format!("duration: {} ticks", project.duration()),
        format!(
            "elements: {} triggers, {} keyframes",
            project.events().total_count(),
            project.keyframes().total_count()
        ),
    ];

    for channel in project.events().channels_in_use() {
        let events = project.events().elements(channel).unwrap_or_default();
        lines.push(format!("trigger channel {channel}: {} events", events.len()));
    }

    for channel in project.keyframes().channels_in_use() {
        let knots = project.keyframes().elements(channel).unwrap_or_default();
        let mut line = format!("curve channel {channel}: {} keyframes", knots.len());
        for &time in sample_at {
            if let Some(value) = curve_value_at(knots, time) {
                line.push_str(&format!(", @{time}={value:.3}"));
            }
        }
        lines.push(line);
    }

    lines
}

/// Run one subcommand
pub fn run(command: Command, settings: &PlayerSettings) -> Result<()> {
    match command {
        Command::Play { document, from, to } => {
            let (project, _) = load_project(&document)?;
            let to = to.unwrap_or_else(|| project.duration());
            tracing::info!(
                "Frame step {} ticks ({:.4}s at {} ticks/s)",
                settings.frame_step,
                settings.frame_seconds(),
                settings.tick_rate
            );
            let mut player = Player::new(project, settings);
            player.take_calls();
            print_report(&player.play(from, to));
        }
        Command::Scrub { document, times } => {
            let (project, _) = load_project(&document)?;
            let mut player = Player::new(project, settings);
            player.take_calls();
            print_report(&player.scrub(&times));
        }
        Command::Inspect { document, at } => {
            let (project, summary) = load_project(&document)?;
            for line in describe(&project, &at) {
                println!("{line}");
            }
            if summary.skipped > 0 {
                println!("skipped records: {}", summary.skipped);
            }
        }
        Command::Settings { output } => {
            settings.save(&output)?;
            println!("wrote {}", output.display());
        }
        Command::Normalize { document, output } => {
            let (project, summary) = load_project(&document)?;
            let output = output.unwrap_or(document);
            ProjectDocument::from_project(&project).save(&output)?;
            println!(
                "wrote {} ({} records, {} dropped)",
                output.display(),
                summary.imported,
                summary.skipped
            );
        }
    }
    Ok(())
}
