// SPDX-License-Identifier: MIT OR Apache-2.0
//! Timeline project: element stores, metadata, and undo history.

use crate::channel_store::ChannelStore;
use crate::event::OnOffEvent;
use crate::history::{HistoryError, UndoRedoHistory};
use crate::keyframe::ControlKeyframe;
use crate::session::EditSession;
use serde::{Deserialize, Serialize};
use uuid::Uuid;

/// Number of palette slots
pub const PALETTE_SIZE: usize = 16;

/// RGBA color
pub type Color = [u8; 4];

/// Unique identifier for a project
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
pub struct ProjectId(pub Uuid);

impl ProjectId {
    /// Create a new random project ID
    pub fn new() -> Self {
        Self(Uuid::new_v4())
    }
}

impl Default for ProjectId {
    fn default() -> Self {
        Self::new()
    }
}

/// Fixed-size project palette
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
pub struct Palette(pub [Color; PALETTE_SIZE]);

impl Palette {
    /// Color in a slot
    pub fn get(&self, slot: usize) -> Option<Color> {
        self.0.get(slot).copied()
    }
}

impl Default for Palette {
    fn default() -> Self {
        Self([
            [255, 255, 255, 255],
            [255, 64, 64, 255],
            [255, 160, 64, 255],
            [255, 230, 64, 255],
            [128, 255, 64, 255],
            [64, 255, 160, 255],
            [64, 230, 255, 255],
            [64, 128, 255, 255],
            [128, 64, 255, 255],
            [230, 64, 255, 255],
            [255, 64, 160, 255],
            [192, 192, 192, 255],
            [128, 128, 128, 255],
            [64, 64, 64, 255],
            [32, 32, 32, 255],
            [0, 0, 0, 255],
        ])
    }
}

/// The element stores of a project
#[derive(Debug, Clone, Default, PartialEq)]
pub struct TimelineData {
    /// On/off triggers
    pub events: ChannelStore<OnOffEvent>,
    /// Control curve knots
    pub keyframes: ChannelStore<ControlKeyframe>,
}

impl TimelineData {
    /// Tick of the latest element in either store
    pub fn last_tick(&self) -> Option<i64> {
        let events = self.events.channels_in_use().filter_map(|c| {
            self.events.elements(c).ok()?.last().map(|e| e.time)
        });
        let keyframes = self.keyframes.channels_in_use().filter_map(|c| {
            self.keyframes.elements(c).ok()?.last().map(|k| k.time)
        });
        events.chain(keyframes).max()
    }
}

/// A timeline project.
///
/// Element stores are only mutated through an [`EditSession`] opened with
/// [`TimelineProject::begin_edit`], or by undo/redo.
#[derive(Debug, Clone)]
pub struct TimelineProject {
    /// Unique project ID
    id: ProjectId,
    /// Element stores
    pub(crate) data: TimelineData,
    /// Background identifier
    pub(crate) background: String,
    /// Color palette
    pub(crate) palette: Palette,
    /// Set by non-undoable property writes during a session
    pub(crate) dirty: bool,
    /// Undo/redo history
    pub(crate) history: UndoRedoHistory,
    /// Bumped on every store mutation
    pub(crate) revision: u64,
}

impl TimelineProject {
    /// Create an empty project
    pub fn new() -> Self {
        Self::with_history(UndoRedoHistory::new())
    }

    /// Create an empty project with a custom history
    pub fn with_history(history: UndoRedoHistory) -> Self {
        Self {
            id: ProjectId::new(),
            data: TimelineData::default(),
            background: String::new(),
            palette: Palette::default(),
            dirty: false,
            history,
            revision: 0,
        }
    }

    /// Open an edit session. Everything mutated before
    /// [`EditSession::end`] becomes one undo step.
    pub fn begin_edit(&mut self, description: impl Into<String>) -> EditSession<'_> {
        EditSession::begin(self, description.into())
    }

    /// Undo the last compound action
    pub fn undo(&mut self) -> Result<(), HistoryError> {
        self.history.undo(&mut self.data)?;
        self.revision += 1;
        Ok(())
    }

    /// Redo the next compound action
    pub fn redo(&mut self) -> Result<(), HistoryError> {
        self.history.redo(&mut self.data)?;
        self.revision += 1;
        Ok(())
    }

    /// Check if undo is available
    pub fn can_undo(&self) -> bool {
        self.history.can_undo()
    }

    /// Check if redo is available
    pub fn can_redo(&self) -> bool {
        self.history.can_redo()
    }

    /// Project ID
    pub fn id(&self) -> ProjectId {
        self.id
    }

    /// Element stores
    pub fn data(&self) -> &TimelineData {
        &self.data
    }

    /// Trigger store
    pub fn events(&self) -> &ChannelStore<OnOffEvent> {
        &self.data.events
    }

    /// Control curve store
    pub fn keyframes(&self) -> &ChannelStore<ControlKeyframe> {
        &self.data.keyframes
    }

    /// Background identifier
    pub fn background(&self) -> &str {
        &self.background
    }

    /// Color palette
    pub fn palette(&self) -> &Palette {
        &self.palette
    }

    /// Whether the last session made non-undoable changes
    pub fn is_dirty(&self) -> bool {
        self.dirty
    }

    /// Store mutation counter
    pub fn revision(&self) -> u64 {
        self.revision
    }

    /// Undo/redo history
    pub fn history(&self) -> &UndoRedoHistory {
        &self.history
    }

    /// Tick of the latest element
    pub fn duration(&self) -> i64 {
        self.data.last_tick().unwrap_or(0)
    }
}

impl Default for TimelineProject {
    fn default() -> Self {
        Self::new()
    }
}
