// SPDX-License-Identifier: MIT OR Apache-2.0
//! Playback and scrubbing over a timeline project.
//!
//! The engine keeps one cursor per channel into each store. `advance`
//! moves cursors forward and only looks at elements it has not consumed
//! yet. `jump` resets receivers and rebuilds receiver state from scratch
//! for an arbitrary tick, so scrubbing backward or across a held trigger
//! lands on the same state forward playback would have produced.

use crate::channel_store::CHANNEL_COUNT;
use crate::event::{Edge, TriggerKind};
use crate::keyframe::Interpolation;
use crate::project::{ProjectId, TimelineProject};
use serde::{Deserialize, Serialize};

/// Receives resolved playback output.
///
/// Calls may be redundant (an `Off` with nothing held, a curve value equal
/// to the previous frame); implementations must tolerate that.
pub trait ReceiverSink {
    /// A trigger edge on a channel
    fn on_trigger(&mut self, channel: usize, edge: Edge, value: u8);

    /// The resolved curve value of a channel for this frame
    fn on_curve(&mut self, channel: usize, value: f32);

    /// Return every receiver to its default/off state
    fn reset_all(&mut self);
}

/// Playback tuning
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
pub struct PlaybackSettings {
    /// Largest forward delta (in ticks) `update` plays through with `advance`
    pub jump_threshold: i64,
}

impl Default for PlaybackSettings {
    fn default() -> Self {
        Self { jump_threshold: 1000 }
    }
}

/// What `update` did
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum PlaybackStep {
    /// Time did not move forward
    Idle,
    /// Incremental forward scan
    Advanced,
    /// Full resynchronization
    Jumped,
}

#[derive(Debug, Clone, Copy, Default)]
struct ChannelCursor {
    /// Last consumed trigger index
    on_off: Option<usize>,
    /// Last reached keyframe index
    keyframe: Option<usize>,
}

/// Drives a [`ReceiverSink`] from a [`TimelineProject`]
#[derive(Debug)]
pub struct PlaybackEngine<S> {
    sink: S,
    cursors: Vec<ChannelCursor>,
    last_time: Option<i64>,
    /// Project and revision the cursors were built against
    synced: Option<(ProjectId, u64)>,
    settings: PlaybackSettings,
}

impl<S: ReceiverSink> PlaybackEngine<S> {
    /// Create an engine with default settings
    pub fn new(sink: S) -> Self {
        Self::with_settings(sink, PlaybackSettings::default())
    }

    /// Create an engine with custom settings
    pub fn with_settings(sink: S, settings: PlaybackSettings) -> Self {
        Self {
            sink,
            cursors: vec![ChannelCursor::default(); CHANNEL_COUNT],
            last_time: None,
            synced: None,
            settings,
        }
    }

    /// Bind to a project: reset every cursor and every receiver
    pub fn set_sequence(&mut self, project: &TimelineProject) {
        self.cursors.fill(ChannelCursor::default());
        self.last_time = None;
        self.synced = Some((project.id(), project.revision()));
        self.sink.reset_all();
    }

    /// Play forward to `time`.
    ///
    /// Emits every trigger between the last processed tick (exclusive) and
    /// `time` (inclusive), then every curve value at `time`. Returns `false`
    /// without emitting anything if `time` is not past the last processed
    /// tick; moving backward needs [`Self::jump`].
    pub fn advance(&mut self, project: &TimelineProject, time: i64) -> bool {
        let synced = self.synced;
        match synced {
            Some((id, _)) if id != project.id() => self.set_sequence(project),
            None => self.set_sequence(project),
            Some((_, revision)) if revision != project.revision() => {
                tracing::debug!("Project edited since last sync; resynchronizing at {}", time);
                self.jump(project, time);
                return true;
            }
            Some(_) => {}
        }

        if self.last_time.is_some_and(|last| time <= last) {
            return false;
        }

        let events = project.events();
        for channel in events.channels_in_use() {
            let Ok(items) = events.elements(channel) else {
                continue;
            };
            let cursor = &mut self.cursors[channel].on_off;
            let mut next = cursor.map_or(0, |i| i + 1);
            while let Some(event) = items.get(next).filter(|e| e.time <= time) {
                for edge in event.kind.edges() {
                    self.sink.on_trigger(channel, *edge, event.value);
                }
                *cursor = Some(next);
                next += 1;
            }
        }

        self.resolve_curves(project, time);
        self.last_time = Some(time);
        true
    }

    /// Reset receivers and rebuild their state at `time`.
    ///
    /// For each channel only a still-held `On` is re-emitted; pulses and
    /// closed holds before `time` are not replayed.
    pub fn jump(&mut self, project: &TimelineProject, time: i64) {
        self.synced = Some((project.id(), project.revision()));
        self.sink.reset_all();

        let events = project.events();
        for (channel, cursor) in self.cursors.iter_mut().enumerate() {
            cursor.on_off = None;
            cursor.keyframe = None;

            let Ok(items) = events.elements(channel) else {
                continue;
            };
            let mut held = None;
            for (index, event) in items.iter().enumerate().take_while(|(_, e)| e.time <= time) {
                held = match event.kind {
                    TriggerKind::On => Some(event.value),
                    TriggerKind::Off | TriggerKind::OnOff => None,
                };
                cursor.on_off = Some(index);
            }
            if let Some(value) = held {
                self.sink.on_trigger(channel, Edge::On, value);
            }
        }

        self.resolve_curves(project, time);
        self.last_time = Some(time);
    }

    /// Move to `time`, choosing `advance` for small forward steps and
    /// `jump` for backward moves, large forward moves, or the first call
    /// after binding.
    pub fn update(&mut self, project: &TimelineProject, time: i64) -> PlaybackStep {
        let step = match self.last_time {
            None => PlaybackStep::Jumped,
            Some(last) if time == last => PlaybackStep::Idle,
            Some(last) if time < last || time.saturating_sub(last) > self.settings.jump_threshold => PlaybackStep::Jumped,
            Some(_) => PlaybackStep::Advanced,
        };

        match step {
            PlaybackStep::Jumped => self.jump(project, time),
            PlaybackStep::Advanced => {
                self.advance(project, time);
            }
            PlaybackStep::Idle => {}
        }
        step
    }

    fn resolve_curves(&mut self, project: &TimelineProject, time: i64) {
        let keyframes = project.keyframes();
        for channel in keyframes.channels_in_use() {
            let Ok(knots) = keyframes.elements(channel) else {
                continue;
            };
            let cursor = &mut self.cursors[channel].keyframe;
            let mut next = cursor.map_or(0, |i| i + 1);
            while knots.get(next).is_some_and(|k| k.time <= time) {
                *cursor = Some(next);
                next += 1;
            }

            let value = match *cursor {
                None => f32::from(knots[0].value),
                Some(i) if i + 1 >= knots.len() => f32::from(knots[i].value),
                Some(i) => Interpolation::segment(&knots[i], &knots[i + 1], time),
            };
            self.sink.on_curve(channel, value);
        }
    }

    /// Last processed tick
    pub fn last_time(&self) -> Option<i64> {
        self.last_time
    }

    /// Playback settings
    pub fn settings(&self) -> &PlaybackSettings {
        &self.settings
    }

    /// The receiver sink
    pub fn sink(&self) -> &S {
        &self.sink
    }

    /// The receiver sink, mutably
    pub fn sink_mut(&mut self) -> &mut S {
        &mut self.sink
    }

    /// Release the receiver sink
    pub fn into_sink(self) -> S {
        self.sink
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::event::OnOffEvent;
    use crate::keyframe::{ControlKeyframe, InterpolationMode};
    use std::collections::BTreeMap;

    #[derive(Debug, Clone, PartialEq)]
    enum Emission {
        Trigger(usize, Edge, u8),
        Curve(usize, f32),
        Reset,
    }

    #[derive(Debug, Default)]
    struct RecordingSink {
        log: Vec<Emission>,
    }

    impl RecordingSink {
        fn take(&mut self) -> Vec<Emission> {
            std::mem::take(&mut self.log)
        }

        fn triggers(&mut self) -> Vec<Emission> {
            self.take()
                .into_iter()
                .filter(|e| matches!(e, Emission::Trigger(..)))
                .collect()
        }
    }

    impl ReceiverSink for RecordingSink {
        fn on_trigger(&mut self, channel: usize, edge: Edge, value: u8) {
            self.log.push(Emission::Trigger(channel, edge, value));
        }

        fn on_curve(&mut self, channel: usize, value: f32) {
            self.log.push(Emission::Curve(channel, value));
        }

        fn reset_all(&mut self) {
            self.log.push(Emission::Reset);
        }
    }

    /// Tracks what a real receiver would end up showing
    #[derive(Debug, Default, PartialEq)]
    struct StateSink {
        held: BTreeMap<usize, u8>,
        curves: BTreeMap<usize, f32>,
    }

    impl ReceiverSink for StateSink {
        fn on_trigger(&mut self, channel: usize, edge: Edge, value: u8) {
            match edge {
                Edge::On => {
                    self.held.insert(channel, value);
                }
                Edge::Off => {
                    self.held.remove(&channel);
                }
            }
        }

        fn on_curve(&mut self, channel: usize, value: f32) {
            self.curves.insert(channel, value);
        }

        fn reset_all(&mut self) {
            self.held.clear();
            self.curves.clear();
        }
    }

    fn project_with(events: &[(usize, OnOffEvent)], keyframes: &[(usize, ControlKeyframe)]) -> TimelineProject {
        let mut project = TimelineProject::new();
        let mut session = project.begin_edit("setup");
        for (channel, event) in events {
            session.add(*channel, *event).unwrap();
        }
        for (channel, keyframe) in keyframes {
            session.add(*channel, *keyframe).unwrap();
        }
        session.end();
        project
    }

    fn bound(project: &TimelineProject) -> PlaybackEngine<RecordingSink> {
        let mut engine = PlaybackEngine::new(RecordingSink::default());
        engine.set_sequence(project);
        assert_eq!(engine.sink_mut().take(), vec![Emission::Reset]);
        engine
    }

    #[test]
    fn test_jump_into_held_gesture() {
        let project = project_with(&[(3, OnOffEvent::on(100, 90)), (3, OnOffEvent::off(200, 0))], &[]);

        let mut engine = bound(&project);
        engine.jump(&project, 150);
        assert_eq!(engine.sink_mut().take(), vec![Emission::Reset, Emission::Trigger(3, Edge::On, 90)]);

        let mut engine = bound(&project);
        engine.jump(&project, 250);
        assert_eq!(engine.sink_mut().take(), vec![Emission::Reset]);
    }

    #[test]
    fn test_pulse_fires_on_then_off() {
        let project = project_with(&[(7, OnOffEvent::pulse(500, 42))], &[]);
        let mut engine = bound(&project);

        assert!(engine.advance(&project, 400));
        assert!(engine.sink_mut().triggers().is_empty());

        assert!(engine.advance(&project, 600));
        assert_eq!(
            engine.sink_mut().triggers(),
            vec![Emission::Trigger(7, Edge::On, 42), Emission::Trigger(7, Edge::Off, 42)]
        );

        for time in [500, 700, 450] {
            engine.jump(&project, time);
            assert!(engine.sink_mut().triggers().is_empty());
        }
    }

    #[test]
    fn test_advance_never_replays_consumed_triggers() {
        let project = project_with(
            &[
                (0, OnOffEvent::on(10, 1)),
                (0, OnOffEvent::off(20, 1)),
                (1, OnOffEvent::pulse(15, 2)),
            ],
            &[],
        );
        let mut engine = bound(&project);

        engine.advance(&project, 10);
        assert_eq!(engine.sink_mut().triggers(), vec![Emission::Trigger(0, Edge::On, 1)]);
        engine.advance(&project, 15);
        assert_eq!(
            engine.sink_mut().triggers(),
            vec![Emission::Trigger(1, Edge::On, 2), Emission::Trigger(1, Edge::Off, 2)]
        );
        engine.advance(&project, 30);
        assert_eq!(engine.sink_mut().triggers(), vec![Emission::Trigger(0, Edge::Off, 1)]);
        engine.advance(&project, 40);
        assert!(engine.sink_mut().triggers().is_empty());
    }

    #[test]
    fn test_advance_at_same_or_earlier_time_is_noop() {
        let project = project_with(&[(0, OnOffEvent::pulse(10, 1))], &[(1, ControlKeyframe::new(0, 5))]);
        let mut engine = bound(&project);

        assert!(engine.advance(&project, 20));
        engine.sink_mut().take();
        assert!(!engine.advance(&project, 20));
        assert!(!engine.advance(&project, 5));
        assert!(engine.sink_mut().take().is_empty());
        assert_eq!(engine.last_time(), Some(20));
    }

    #[test]
    fn test_jump_then_advance_same_time_emits_nothing() {
        let project = project_with(
            &[(2, OnOffEvent::on(10, 3)), (2, OnOffEvent::pulse(30, 4)), (5, OnOffEvent::on(30, 6))],
            &[(2, ControlKeyframe::new(0, 0)), (2, ControlKeyframe::new(100, 200))],
        );
        let mut engine = bound(&project);
        for time in [0, 10, 29, 30, 31, 500] {
            engine.jump(&project, time);
            engine.sink_mut().take();
            engine.advance(&project, time);
            assert!(engine.sink_mut().triggers().is_empty(), "at {time}");
        }
    }

    #[test]
    fn test_jump_is_path_independent() {
        let project = project_with(
            &[
                (0, OnOffEvent::on(10, 1)),
                (0, OnOffEvent::off(50, 0)),
                (0, OnOffEvent::on(80, 2)),
                (1, OnOffEvent::pulse(20, 9)),
                (1, OnOffEvent::on(20, 8)),
                (2, OnOffEvent::on(40, 5)),
                (2, OnOffEvent::pulse(60, 6)),
            ],
            &[
                (4, ControlKeyframe::new(0, 0).with_interpolation(InterpolationMode::EaseIn)),
                (4, ControlKeyframe::new(100, 100).with_interpolation(InterpolationMode::Constant)),
                (4, ControlKeyframe::new(150, 30)),
            ],
        );
        let ticks = [-10, 0, 10, 20, 45, 50, 60, 79, 80, 120, 200];

        for &target in &ticks {
            let mut direct = PlaybackEngine::new(StateSink::default());
            direct.jump(&project, target);

            for &from in &ticks {
                let mut via = PlaybackEngine::new(StateSink::default());
                via.jump(&project, from);
                via.jump(&project, target);
                assert_eq!(via.sink(), direct.sink(), "jump {from} -> {target}");
            }
        }
    }

    #[test]
    fn test_advance_and_jump_agree_on_state() {
        let project = project_with(
            &[
                (0, OnOffEvent::on(10, 1)),
                (0, OnOffEvent::pulse(30, 2)),
                (3, OnOffEvent::on(25, 7)),
                (3, OnOffEvent::off(60, 0)),
                (3, OnOffEvent::on(70, 4)),
            ],
            &[(9, ControlKeyframe::new(5, 10)), (9, ControlKeyframe::new(65, 70))],
        );

        let mut played = PlaybackEngine::new(StateSink::default());
        played.set_sequence(&project);
        for time in (0..=100).step_by(5) {
            played.advance(&project, time);

            let mut scrubbed = PlaybackEngine::new(StateSink::default());
            scrubbed.jump(&project, time);
            assert_eq!(played.sink(), scrubbed.sink(), "at {time}");
        }
    }

    #[test]
    fn test_same_time_on_off_follows_store_order() {
        // Store order decides; there is no Off-before-On tiebreak.
        let on_last = project_with(&[(0, OnOffEvent::off(100, 0)), (0, OnOffEvent::on(100, 5))], &[]);
        let mut engine = bound(&on_last);
        engine.jump(&on_last, 100);
        assert_eq!(engine.sink_mut().triggers(), vec![Emission::Trigger(0, Edge::On, 5)]);

        let off_last = project_with(&[(0, OnOffEvent::on(100, 5)), (0, OnOffEvent::off(100, 0))], &[]);
        let mut engine = bound(&off_last);
        engine.jump(&off_last, 100);
        assert!(engine.sink_mut().triggers().is_empty());

        engine.set_sequence(&off_last);
        engine.advance(&off_last, 100);
        assert_eq!(
            engine.sink_mut().triggers(),
            vec![Emission::Trigger(0, Edge::On, 5), Emission::Trigger(0, Edge::Off, 0)]
        );
    }

    #[test]
    fn test_curves_emit_every_frame() {
        let project = project_with(
            &[],
            &[(5, ControlKeyframe::new(100, 0)), (5, ControlKeyframe::new(200, 100))],
        );
        let mut engine = bound(&project);

        let curve_at = |engine: &mut PlaybackEngine<RecordingSink>, time| {
            engine.advance(&project, time);
            engine.sink_mut().take()
        };
        assert_eq!(curve_at(&mut engine, 50), vec![Emission::Curve(5, 0.0)]);
        assert_eq!(curve_at(&mut engine, 150), vec![Emission::Curve(5, 50.0)]);
        assert_eq!(curve_at(&mut engine, 200), vec![Emission::Curve(5, 100.0)]);
        assert_eq!(curve_at(&mut engine, 250), vec![Emission::Curve(5, 100.0)]);
        assert_eq!(curve_at(&mut engine, 260), vec![Emission::Curve(5, 100.0)]);

        engine.jump(&project, 125);
        assert_eq!(engine.sink_mut().take(), vec![Emission::Reset, Emission::Curve(5, 25.0)]);
    }

    #[test]
    fn test_edit_between_frames_resynchronizes() {
        let mut project = project_with(&[(0, OnOffEvent::on(10, 1))], &[]);
        let mut engine = bound(&project);
        engine.advance(&project, 20);
        engine.sink_mut().take();

        let mut session = project.begin_edit("insert earlier");
        session.add(0, OnOffEvent::on(5, 2)).unwrap();
        session.add(1, OnOffEvent::on(15, 3)).unwrap();
        session.end();

        assert!(engine.advance(&project, 25));
        assert_eq!(
            engine.sink_mut().take(),
            vec![
                Emission::Reset,
                Emission::Trigger(0, Edge::On, 1),
                Emission::Trigger(1, Edge::On, 3),
            ]
        );

        engine.advance(&project, 30);
        assert!(engine.sink_mut().take().is_empty());
    }

    #[test]
    fn test_update_chooses_strategy() {
        let project = project_with(&[(0, OnOffEvent::pulse(50, 1))], &[]);
        let mut engine = PlaybackEngine::with_settings(
            RecordingSink::default(),
            PlaybackSettings { jump_threshold: 100 },
        );
        engine.set_sequence(&project);

        assert_eq!(engine.update(&project, 0), PlaybackStep::Jumped);
        assert_eq!(engine.update(&project, 0), PlaybackStep::Idle);
        assert_eq!(engine.update(&project, 60), PlaybackStep::Advanced);
        assert_eq!(engine.update(&project, 30), PlaybackStep::Jumped);
        assert_eq!(engine.update(&project, 500), PlaybackStep::Jumped);

        let log = engine.into_sink().log;
        let pulses = log.iter().filter(|e| matches!(e, Emission::Trigger(0, Edge::On, 1))).count();
        assert_eq!(pulses, 1);
    }

    #[test]
    fn test_update_with_extreme_ticks() {
        let project = project_with(&[(0, OnOffEvent::pulse(50, 1))], &[]);
        let mut engine = bound(&project);

        assert_eq!(engine.update(&project, -10), PlaybackStep::Jumped);
        assert_eq!(engine.update(&project, i64::MAX), PlaybackStep::Jumped);
        assert_eq!(engine.update(&project, i64::MIN), PlaybackStep::Jumped);
    }

    #[test]
    fn test_curve_spanning_full_tick_range() {
        let project = project_with(
            &[],
            &[
                (2, ControlKeyframe::new(i64::MIN, 0)),
                (2, ControlKeyframe::new(i64::MAX, 200)),
            ],
        );
        let mut engine = bound(&project);

        engine.jump(&project, 0);
        assert_eq!(engine.sink_mut().take(), vec![Emission::Reset, Emission::Curve(2, 100.0)]);

        engine.advance(&project, i64::MAX);
        assert_eq!(engine.sink_mut().take(), vec![Emission::Curve(2, 200.0)]);
    }

    #[test]
    fn test_empty_project_emits_nothing() {
        let project = TimelineProject::new();
        let mut engine = bound(&project);
        assert!(engine.advance(&project, 100));
        engine.jump(&project, 0);
        assert_eq!(engine.sink_mut().take(), vec![Emission::Reset]);
    }
}
