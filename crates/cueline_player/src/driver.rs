// SPDX-License-Identifier: MIT OR Apache-2.0
//! Frame-driven headless playback.
//!
//! The driver owns a project and a playback engine wired through the router
//! to logging receivers, and steps it the way a host update loop would.

use crate::receivers::{logging_registry, CallLog, ReceiverCall};
use crate::settings::PlayerSettings;
use cueline_router::{EventRouter, RoutedSink};
use cueline_sequencer::{PlaybackEngine, PlaybackStep, TimelineProject};

/// What a run did
#[derive(Debug, Clone, Default, PartialEq)]
pub struct RunReport {
    /// Frames stepped
    pub frames: usize,
    /// Frames served by incremental advance
    pub advanced: usize,
    /// Frames that rebuilt state with a jump
    pub jumped: usize,
    /// Frames at an unchanged time
    pub idle: usize,
    /// Receiver calls, in order
    pub calls: Vec<ReceiverCall>,
}

impl RunReport {
    fn count(&mut self, step: PlaybackStep) {
        self.frames += 1;
        match step {
            PlaybackStep::Advanced => self.advanced += 1,
            PlaybackStep::Jumped => self.jumped += 1,
            PlaybackStep::Idle => self.idle += 1,
        }
    }
}

/// Headless host for one project
pub struct Player {
    project: TimelineProject,
    engine: PlaybackEngine<RoutedSink>,
    frame_step: i64,
    log: CallLog,
}

impl Player {
    /// Wire a project to logging receivers
    pub fn new(project: TimelineProject, settings: &PlayerSettings) -> Self {
        let log = CallLog::default();
        let registry = logging_registry(&settings.receivers, &log);
        let router = EventRouter::build(&settings.routes, registry);
        let sink = RoutedSink::new(router, settings.bindings.clone());

        let mut engine = PlaybackEngine::with_settings(sink, settings.playback);
        engine.set_sequence(&project);

        Self {
            project,
            engine,
            frame_step: settings.frame_step.max(1),
            log,
        }
    }

    /// Play from `from` to `to` inclusive, one frame per `frame_step` ticks.
    /// The last frame always lands exactly on `to`.
    pub fn play(&mut self, from: i64, to: i64) -> RunReport {
        let mut report = RunReport::default();
        let mut time = from;
        loop {
            let time_now = time.min(to);
            report.count(self.engine.update(&self.project, time_now));
            if time_now >= to {
                break;
            }
            time = time.saturating_add(self.frame_step);
        }
        tracing::info!(
            "Played {}..={} in {} frames ({} jumps)",
            from,
            to,
            report.frames,
            report.jumped
        );
        report.calls = self.take_calls();
        report
    }

    /// Visit each time in order, one frame each
    pub fn scrub(&mut self, times: &[i64]) -> RunReport {
        let mut report = RunReport::default();
        for &time in times {
            report.count(self.engine.update(&self.project, time));
        }
        report.calls = self.take_calls();
        report
    }

    /// Drain recorded receiver calls
    pub fn take_calls(&mut self) -> Vec<ReceiverCall> {
        std::mem::take(&mut *self.log.borrow_mut())
    }

    /// The loaded project, mutably; playback resyncs on the next frame
    #[cfg(test)]
    pub fn project_mut(&mut self) -> &mut TimelineProject {
        &mut self.project
    }
}
