// SPDX-License-Identifier: MIT OR Apache-2.0
//! Undo/redo history built from tagged reversible operations.
//!
//! Every primitive store mutation is recorded as an [`ElementOp`] holding
//! exactly what is needed to apply or invert it against the store: the
//! channel, the index, and the element(s) involved. Inverting a removal
//! re-inserts at the original index, so later indices never drift.

use crate::channel_store::{ChannelStore, StoreError, TimedElement};
use crate::event::OnOffEvent;
use crate::keyframe::ControlKeyframe;
use crate::project::TimelineData;
use serde::{Deserialize, Serialize};
use std::collections::VecDeque;
use thiserror::Error;

/// Default maximum undo history depth
pub const MAX_HISTORY: usize = 1000;

/// History errors
#[derive(Debug, Error)]
pub enum HistoryError {
    /// Nothing to undo
    #[error("Nothing to undo")]
    NothingToUndo,

    /// Nothing to redo
    #[error("Nothing to redo")]
    NothingToRedo,

    /// A recorded operation no longer applies to the store
    #[error("History replay failed: {0}")]
    Replay(#[from] StoreError),
}

/// Result type for history operations
pub type Result<T> = std::result::Result<T, HistoryError>;

/// Element kinds that live in a [`TimelineData`] store
pub trait StoredElement: TimedElement + Sized {
    /// The store holding this kind
    fn store(data: &TimelineData) -> &ChannelStore<Self>;

    /// The store holding this kind, mutably
    fn store_mut(data: &mut TimelineData) -> &mut ChannelStore<Self>;

    /// Tag an operation on this kind
    fn wrap(op: ElementOp<Self>) -> ReversibleOp;

    /// Copy with a different tick
    fn retimed(&self, time: i64) -> Self;
}

impl StoredElement for OnOffEvent {
    fn store(data: &TimelineData) -> &ChannelStore<Self> {
        &data.events
    }

    fn store_mut(data: &mut TimelineData) -> &mut ChannelStore<Self> {
        &mut data.events
    }

    fn wrap(op: ElementOp<Self>) -> ReversibleOp {
        ReversibleOp::Event(op)
    }

    fn retimed(&self, time: i64) -> Self {
        Self { time, ..*self }
    }
}

impl StoredElement for ControlKeyframe {
    fn store(data: &TimelineData) -> &ChannelStore<Self> {
        &data.keyframes
    }

    fn store_mut(data: &mut TimelineData) -> &mut ChannelStore<Self> {
        &mut data.keyframes
    }

    fn wrap(op: ElementOp<Self>) -> ReversibleOp {
        ReversibleOp::Keyframe(op)
    }

    fn retimed(&self, time: i64) -> Self {
        Self { time, ..*self }
    }
}

/// A primitive indexed mutation on one channel
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub enum ElementOp<T> {
    /// `element` was inserted at `index`
    Insert {
        /// Channel
        channel: usize,
        /// Final index of the inserted element
        index: usize,
        /// Inserted element
        element: T,
    },
    /// `element` was removed from `index`
    Remove {
        /// Channel
        channel: usize,
        /// Index the element occupied
        index: usize,
        /// Removed element
        element: T,
    },
    /// Payload at `index` changed from `before` to `after`
    Replace {
        /// Channel
        channel: usize,
        /// Index of the replaced element
        index: usize,
        /// Element before the change
        before: T,
        /// Element after the change
        after: T,
    },
}

impl<T: TimedElement> ElementOp<T> {
    /// Apply the forward mutation
    pub fn apply(&self, store: &mut ChannelStore<T>) -> std::result::Result<(), StoreError> {
        match self {
            Self::Insert { channel, index, element } => {
                store.insert_at(*channel, *index, element.clone())
            }
            Self::Remove { channel, index, .. } => store.remove_at(*channel, *index).map(drop),
            Self::Replace { channel, index, after, .. } => {
                store.replace_at(*channel, *index, after.clone()).map(drop)
            }
        }
    }

    /// Apply the inverse mutation
    pub fn revert(&self, store: &mut ChannelStore<T>) -> std::result::Result<(), StoreError> {
        match self {
            Self::Insert { channel, index, .. } => store.remove_at(*channel, *index).map(drop),
            Self::Remove { channel, index, element } => {
                store.insert_at(*channel, *index, element.clone())
            }
            Self::Replace { channel, index, before, .. } => {
                store.replace_at(*channel, *index, before.clone()).map(drop)
            }
        }
    }
}

/// Store-tagged reversible operation
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub enum ReversibleOp {
    /// Operation on the trigger store
    Event(ElementOp<OnOffEvent>),
    /// Operation on the control curve store
    Keyframe(ElementOp<ControlKeyframe>),
}

impl ReversibleOp {
    /// Apply the forward mutation
    pub fn redo(&self, data: &mut TimelineData) -> std::result::Result<(), StoreError> {
        match self {
            Self::Event(op) => op.apply(&mut data.events),
            Self::Keyframe(op) => op.apply(&mut data.keyframes),
        }
    }

    /// Apply the inverse mutation
    pub fn undo(&self, data: &mut TimelineData) -> std::result::Result<(), StoreError> {
        match self {
            Self::Event(op) => op.revert(&mut data.events),
            Self::Keyframe(op) => op.revert(&mut data.keyframes),
        }
    }
}

/// Operations undone/redone together as one unit
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct CompoundAction {
    /// Human-readable description
    pub description: String,
    /// Operations in application order
    ops: Vec<ReversibleOp>,
}

impl CompoundAction {
    /// Create an empty compound action
    pub fn new(description: impl Into<String>) -> Self {
        Self {
            description: description.into(),
            ops: Vec::new(),
        }
    }

    /// Append an operation
    pub fn push(&mut self, op: ReversibleOp) {
        self.ops.push(op);
    }

    /// Recorded operations
    pub fn ops(&self) -> &[ReversibleOp] {
        &self.ops
    }

    /// Operation count
    pub fn len(&self) -> usize {
        self.ops.len()
    }

    /// Whether nothing was recorded
    pub fn is_empty(&self) -> bool {
        self.ops.is_empty()
    }

    /// Invert every operation, last first
    pub fn undo(&self, data: &mut TimelineData) -> std::result::Result<(), StoreError> {
        self.ops.iter().rev().try_for_each(|op| op.undo(data))
    }

    /// Reapply every operation, first first
    pub fn redo(&self, data: &mut TimelineData) -> std::result::Result<(), StoreError> {
        self.ops.iter().try_for_each(|op| op.redo(data))
    }
}

/// History statistics
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq, Serialize, Deserialize)]
pub struct HistoryStats {
    /// Actions that can be undone
    pub undo_count: usize,
    /// Actions that can be redone
    pub redo_count: usize,
    /// Maximum history depth
    pub max_depth: usize,
}

/// Linear undo/redo history
#[derive(Debug, Clone)]
pub struct UndoRedoHistory {
    /// Recorded actions, oldest first
    actions: VecDeque<CompoundAction>,
    /// Number of actions currently applied
    applied: usize,
    /// Maximum history depth
    max_depth: usize,
}

impl UndoRedoHistory {
    /// Create a new history
    pub fn new() -> Self {
        Self::with_max_depth(MAX_HISTORY)
    }

    /// Create with custom maximum depth
    pub fn with_max_depth(max_depth: usize) -> Self {
        Self {
            actions: VecDeque::new(),
            applied: 0,
            max_depth: max_depth.max(1),
        }
    }

    /// Push an already-applied action, discarding the redo branch
    pub fn record(&mut self, action: CompoundAction) {
        if action.is_empty() {
            return;
        }

        self.actions.truncate(self.applied);
        self.actions.push_back(action);

        while self.actions.len() > self.max_depth {
            self.actions.pop_front();
        }
        self.applied = self.actions.len();
    }

    /// Index of the last applied action, `None` when nothing is applied
    pub fn current_index(&self) -> Option<usize> {
        self.applied.checked_sub(1)
    }

    /// Check if undo is available
    pub fn can_undo(&self) -> bool {
        self.applied > 0
    }

    /// Check if redo is available
    pub fn can_redo(&self) -> bool {
        self.applied < self.actions.len()
    }

    /// Invert the action at the cursor, then step back
    pub fn undo(&mut self, data: &mut TimelineData) -> Result<()> {
        let index = self.current_index().ok_or(HistoryError::NothingToUndo)?;
        let action = &self.actions[index];
        action.undo(data)?;
        tracing::debug!("Undo: {}", action.description);
        self.applied = index;
        Ok(())
    }

    /// Step forward, then reapply the action there
    pub fn redo(&mut self, data: &mut TimelineData) -> Result<()> {
        let action = self
            .actions
            .get(self.applied)
            .ok_or(HistoryError::NothingToRedo)?;
        action.redo(data)?;
        tracing::debug!("Redo: {}", action.description);
        self.applied += 1;
        Ok(())
    }

    /// Recorded action count, applied or not
    pub fn len(&self) -> usize {
        self.actions.len()
    }

    /// Whether nothing has been recorded
    pub fn is_empty(&self) -> bool {
        self.actions.is_empty()
    }

    /// Clear all history
    pub fn clear(&mut self) {
        self.actions.clear();
        self.applied = 0;
    }

    /// Get history statistics
    pub fn stats(&self) -> HistoryStats {
        HistoryStats {
            undo_count: self.applied,
            redo_count: self.actions.len() - self.applied,
            max_depth: self.max_depth,
        }
    }

    /// Get description of next undo action
    pub fn undo_description(&self) -> Option<&str> {
        let index = self.current_index()?;
        self.actions.get(index).map(|a| a.description.as_str())
    }

    /// Get description of next redo action
    pub fn redo_description(&self) -> Option<&str> {
        self.actions.get(self.applied).map(|a| a.description.as_str())
    }
}

impl Default for UndoRedoHistory {
    fn default() -> Self {
        Self::new()
    }
}
