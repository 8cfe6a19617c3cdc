// SPDX-License-Identifier: MIT OR Apache-2.0
//! Edit sessions: one burst of mutations, one undo step.
//!
//! A session borrows the project mutably, so store mutations outside a
//! session, or overlapping sessions, do not compile.

use crate::channel_store::{ChannelStore, StoreError};
use crate::history::{CompoundAction, ElementOp, StoredElement};
use crate::project::{Color, Palette, TimelineProject};

/// Result type for session mutations
pub type Result<T> = std::result::Result<T, StoreError>;

/// An open edit session on a [`TimelineProject`]
#[derive(Debug)]
pub struct EditSession<'a> {
    project: &'a mut TimelineProject,
    action: Option<CompoundAction>,
}

impl<'a> EditSession<'a> {
    pub(crate) fn begin(project: &'a mut TimelineProject, description: String) -> Self {
        project.dirty = false;
        Self {
            project,
            action: Some(CompoundAction::new(description)),
        }
    }

    fn record<T: StoredElement>(&mut self, op: ElementOp<T>) {
        self.project.revision += 1;
        if let Some(action) = self.action.as_mut() {
            action.push(T::wrap(op));
        }
    }

    fn store<T: StoredElement>(&self) -> &ChannelStore<T> {
        T::store(&self.project.data)
    }

    fn store_mut<T: StoredElement>(&mut self) -> &mut ChannelStore<T> {
        T::store_mut(&mut self.project.data)
    }

    /// Read access to the project mid-session
    pub fn project(&self) -> &TimelineProject {
        self.project
    }

    /// Insert keeping tick order; returns the final index
    pub fn add<T: StoredElement>(&mut self, channel: usize, element: T) -> Result<usize> {
        let index = self.store_mut::<T>().add(channel, element.clone())?;
        self.record(ElementOp::Insert { channel, index, element });
        Ok(index)
    }

    /// Insert several elements into one channel; returns ascending final indices
    pub fn add_batch<T: StoredElement>(&mut self, channel: usize, mut elements: Vec<T>) -> Result<Vec<usize>> {
        ChannelStore::<T>::check_channel(channel)?;
        elements.sort_by_key(T::time);
        elements
            .into_iter()
            .map(|element| self.add(channel, element))
            .collect()
    }

    /// Insert at an explicit index
    pub fn insert_at<T: StoredElement>(&mut self, channel: usize, index: usize, element: T) -> Result<()> {
        self.store_mut::<T>().insert_at(channel, index, element.clone())?;
        self.record(ElementOp::Insert { channel, index, element });
        Ok(())
    }

    /// Replace the payload at `index`; returns the previous element
    pub fn replace_at<T: StoredElement>(&mut self, channel: usize, index: usize, element: T) -> Result<T> {
        let before = self.store_mut::<T>().replace_at(channel, index, element.clone())?;
        self.record(ElementOp::Replace {
            channel,
            index,
            before: before.clone(),
            after: element,
        });
        Ok(before)
    }

    /// Remove the element at `index`
    pub fn remove_at<T: StoredElement>(&mut self, channel: usize, index: usize) -> Result<T> {
        let element = self.store_mut::<T>().remove_at(channel, index)?;
        self.record(ElementOp::Remove {
            channel,
            index,
            element: element.clone(),
        });
        Ok(element)
    }

    /// Remove several indices from one channel.
    ///
    /// Indices are removed highest first so pending ones never shift.
    /// Duplicates are ignored. Nothing is removed if any index is missing.
    /// Returns the removed elements in ascending index order.
    pub fn remove_batch<T: StoredElement>(&mut self, channel: usize, mut indices: Vec<usize>) -> Result<Vec<T>> {
        let count = self.store::<T>().count(channel)?;
        indices.sort_unstable_by(|a, b| b.cmp(a));
        indices.dedup();
        if let Some(&index) = indices.first().filter(|&&index| index >= count) {
            return Err(StoreError::IndexOutOfRange { channel, index });
        }

        let mut removed = indices
            .into_iter()
            .map(|index| self.remove_at(channel, index))
            .collect::<Result<Vec<T>>>()?;
        removed.reverse();
        Ok(removed)
    }

    /// Move an element to a new tick; returns its new index
    pub fn move_element<T: StoredElement>(&mut self, channel: usize, index: usize, time: i64) -> Result<usize> {
        ChannelStore::<T>::check_channel(channel)?;
        let element = self
            .store::<T>()
            .get(channel, index)
            .ok_or(StoreError::IndexOutOfRange { channel, index })?
            .retimed(time);
        self.remove_at::<T>(channel, index)?;
        self.add(channel, element)
    }

    /// Remove every element of kind `T` from a channel; returns how many
    pub fn clear_channel<T: StoredElement>(&mut self, channel: usize) -> Result<usize> {
        let count = self.store::<T>().count(channel)?;
        for index in (0..count).rev() {
            self.remove_at::<T>(channel, index)?;
        }
        Ok(count)
    }

    /// Set the background identifier (not undoable)
    pub fn set_background(&mut self, background: impl Into<String>) {
        let background = background.into();
        if self.project.background != background {
            self.project.background = background;
            self.project.dirty = true;
        }
    }

    /// Replace the whole palette (not undoable)
    pub fn set_palette(&mut self, palette: Palette) {
        if self.project.palette != palette {
            self.project.palette = palette;
            self.project.dirty = true;
        }
    }

    /// Set one palette slot (not undoable); returns the previous color,
    /// `None` if the slot does not exist
    pub fn set_palette_color(&mut self, slot: usize, color: Color) -> Option<Color> {
        let entry = self.project.palette.0.get_mut(slot)?;
        let previous = std::mem::replace(entry, color);
        if previous != color {
            self.project.dirty = true;
        }
        Some(previous)
    }

    /// Operations recorded so far
    pub fn pending_ops(&self) -> usize {
        self.action.as_ref().map_or(0, CompoundAction::len)
    }

    /// Close the session. Returns whether the project was modified.
    pub fn end(mut self) -> bool {
        self.finish()
    }

    fn finish(&mut self) -> bool {
        let Some(action) = self.action.take() else {
            return false;
        };
        let modified = !action.is_empty() || self.project.dirty;
        if !action.is_empty() {
            tracing::debug!("Recorded '{}' ({} ops)", action.description, action.len());
        }
        self.project.history.record(action);
        modified
    }
}

impl Drop for EditSession<'_> {
    fn drop(&mut self) {
        if self.action.is_some() {
            tracing::debug!("Edit session dropped without end(); committing");
            self.finish();
        }
    }
}
