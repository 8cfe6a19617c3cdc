// SPDX-License-Identifier: MIT OR Apache-2.0
//! Trigger/curve timeline engine for cueline.
//!
//! This crate provides:
//! - Per-channel, time-sorted element stores
//! - On/off triggers and interpolated control curves
//! - Edit sessions with compound undo/redo
//! - Flat record import/export
//! - Scrub-safe playback into a receiver sink
//!
//! ## Architecture
//!
//! A [`TimelineProject`] owns one [`ChannelStore`] per element kind plus an
//! [`UndoRedoHistory`]. Hosts mutate it only through an [`EditSession`],
//! and drive a [`PlaybackEngine`] with `advance`/`jump` once per frame.

pub mod channel_store;
pub mod event;
pub mod keyframe;
pub mod history;
pub mod session;
pub mod project;
pub mod interchange;
pub mod playback;

pub use channel_store::{ChannelStore, StoreError, TimedElement, CHANNEL_COUNT};
pub use event::{Edge, OnOffEvent, TriggerKind};
pub use keyframe::{curve_value_at, ControlKeyframe, Interpolation, InterpolationMode};
pub use history::{
    CompoundAction, ElementOp, HistoryError, HistoryStats, ReversibleOp, StoredElement,
    UndoRedoHistory, MAX_HISTORY,
};
pub use session::EditSession;
pub use project::{Color, Palette, ProjectId, TimelineData, TimelineProject, PALETTE_SIZE};
pub use interchange::{DocumentError, ImportSummary, ProjectDocument, TimelineRecord};
pub use playback::{PlaybackEngine, PlaybackSettings, PlaybackStep, ReceiverSink};
