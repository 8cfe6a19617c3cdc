// SPDX-License-Identifier: MIT OR Apache-2.0
//! Per-channel, time-sorted element storage.
//!
//! Every channel holds its elements in ascending tick order. Elements that
//! share a tick keep the order they were inserted in; there is no secondary
//! sort key.

use std::ops::Range;
use thiserror::Error;

/// Number of independent channels in every store
pub const CHANNEL_COUNT: usize = 256;

/// Store errors
#[derive(Debug, Clone, Copy, PartialEq, Eq, Error)]
pub enum StoreError {
    /// Channel index outside `[0, CHANNEL_COUNT)`
    #[error("Invalid channel: {0}")]
    InvalidChannel(usize),

    /// No element at the requested index
    #[error("Index {index} out of range on channel {channel}")]
    IndexOutOfRange {
        /// Channel that was addressed
        channel: usize,
        /// Requested index
        index: usize,
    },

    /// The element's tick would break ascending order at that position
    #[error("Tick {time} breaks ordering on channel {channel} at index {index}")]
    OrderViolation {
        /// Channel that was addressed
        channel: usize,
        /// Requested index
        index: usize,
        /// Tick of the rejected element
        time: i64,
    },
}

/// Result type for store operations
pub type Result<T> = std::result::Result<T, StoreError>;

/// An element positioned on the timeline
pub trait TimedElement: Clone {
    /// Tick of this element
    fn time(&self) -> i64;
}

/// `CHANNEL_COUNT` independent sequences of `T`, each sorted by tick.
#[derive(Debug, Clone, PartialEq)]
pub struct ChannelStore<T> {
    channels: Vec<Vec<T>>,
}

impl<T: TimedElement> ChannelStore<T> {
    /// Create an empty store
    pub fn new() -> Self {
        Self {
            channels: (0..CHANNEL_COUNT).map(|_| Vec::new()).collect(),
        }
    }

    fn channel(&self, channel: usize) -> Result<&Vec<T>> {
        self.channels
            .get(channel)
            .ok_or(StoreError::InvalidChannel(channel))
    }

    fn channel_mut(&mut self, channel: usize) -> Result<&mut Vec<T>> {
        self.channels
            .get_mut(channel)
            .ok_or(StoreError::InvalidChannel(channel))
    }

    /// Validate a channel index without touching the store
    pub fn check_channel(channel: usize) -> Result<()> {
        if channel < CHANNEL_COUNT {
            Ok(())
        } else {
            Err(StoreError::InvalidChannel(channel))
        }
    }

    /// Insert keeping tick order. Lands after any elements already at the same tick.
    pub fn add(&mut self, channel: usize, element: T) -> Result<usize> {
        let index = self.first_index_at_or_after(channel, element.time())?;
        self.channel_mut(channel)?.insert(index, element);
        Ok(index)
    }

    /// Insert a batch into one channel.
    ///
    /// The batch is stably sorted by tick first, so the returned indices are
    /// ascending and stay valid once the whole batch is in.
    pub fn add_batch(&mut self, channel: usize, mut elements: Vec<T>) -> Result<Vec<usize>> {
        Self::check_channel(channel)?;
        elements.sort_by_key(TimedElement::time);
        elements
            .into_iter()
            .map(|element| self.add(channel, element))
            .collect()
    }

    /// Insert at an explicit index, rejecting positions that break tick order
    pub fn insert_at(&mut self, channel: usize, index: usize, element: T) -> Result<()> {
        let items = self.channel_mut(channel)?;
        if index > items.len() {
            return Err(StoreError::IndexOutOfRange { channel, index });
        }

        let time = element.time();
        let after_prev = index == 0 || items[index - 1].time() <= time;
        let before_next = index == items.len() || items[index].time() >= time;
        if !(after_prev && before_next) {
            return Err(StoreError::OrderViolation { channel, index, time });
        }

        items.insert(index, element);
        Ok(())
    }

    /// Swap the payload of an element. The tick must stay the same.
    pub fn replace_at(&mut self, channel: usize, index: usize, element: T) -> Result<T> {
        let items = self.channel_mut(channel)?;
        let slot = items
            .get_mut(index)
            .ok_or(StoreError::IndexOutOfRange { channel, index })?;

        if slot.time() != element.time() {
            return Err(StoreError::OrderViolation {
                channel,
                index,
                time: element.time(),
            });
        }

        Ok(std::mem::replace(slot, element))
    }

    /// Remove and return the element at `index`
    pub fn remove_at(&mut self, channel: usize, index: usize) -> Result<T> {
        let items = self.channel_mut(channel)?;
        if index >= items.len() {
            return Err(StoreError::IndexOutOfRange { channel, index });
        }
        Ok(items.remove(index))
    }

    /// Element count on a channel
    pub fn count(&self, channel: usize) -> Result<usize> {
        Ok(self.channel(channel)?.len())
    }

    /// Get an element by index
    pub fn get(&self, channel: usize, index: usize) -> Option<&T> {
        self.channels.get(channel)?.get(index)
    }

    /// Search point for `time`: one past every element strictly before it,
    /// then past every element exactly at it.
    pub fn first_index_at_or_after(&self, channel: usize, time: i64) -> Result<usize> {
        let items = self.channel(channel)?;
        let mut index = items.partition_point(|e| e.time() < time);
        while index < items.len() && items[index].time() == time {
            index += 1;
        }
        Ok(index)
    }

    /// Index of the last element at or before `time`, `None` if there is none
    pub fn last_index_before(&self, channel: usize, time: i64) -> Result<Option<usize>> {
        Ok(self.first_index_at_or_after(channel, time)?.checked_sub(1))
    }

    /// Index range of elements with `start <= time <= end`
    pub fn range(&self, channel: usize, start: i64, end: i64) -> Result<Range<usize>> {
        let items = self.channel(channel)?;
        let first = items.partition_point(|e| e.time() < start);
        let last = items.partition_point(|e| e.time() <= end).max(first);
        Ok(first..last)
    }

    /// Live view of a channel
    pub fn elements(&self, channel: usize) -> Result<&[T]> {
        Ok(self.channel(channel)?.as_slice())
    }

    /// Total element count across all channels
    pub fn total_count(&self) -> usize {
        self.channels.iter().map(Vec::len).sum()
    }

    /// Whether every channel is empty
    pub fn is_empty(&self) -> bool {
        self.channels.iter().all(Vec::is_empty)
    }

    /// Indices of channels holding at least one element
    pub fn channels_in_use(&self) -> impl Iterator<Item = usize> + '_ {
        self.channels
            .iter()
            .enumerate()
            .filter(|(_, items)| !items.is_empty())
            .map(|(channel, _)| channel)
    }
}

impl<T: TimedElement> Default for ChannelStore<T> {
    fn default() -> Self {
        Self::new()
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[derive(Debug, Clone, PartialEq)]
    struct Tick(i64, &'static str);

    impl TimedElement for Tick {
        fn time(&self) -> i64 {
            self.0
        }
    }

    fn assert_sorted(store: &ChannelStore<Tick>, channel: usize) {
        let items = store.elements(channel).unwrap();
        assert!(items.windows(2).all(|w| w[0].0 <= w[1].0), "{items:?}");
    }

    #[test]
    fn test_add_keeps_order_and_places_ties_last() {
        let mut store = ChannelStore::new();
        assert_eq!(store.add(0, Tick(100, "a")).unwrap(), 0);
        assert_eq!(store.add(0, Tick(50, "b")).unwrap(), 0);
        assert_eq!(store.add(0, Tick(100, "c")).unwrap(), 2);
        assert_eq!(store.add(0, Tick(75, "d")).unwrap(), 1);

        let labels: Vec<_> = store.elements(0).unwrap().iter().map(|t| t.1).collect();
        assert_eq!(labels, ["b", "d", "a", "c"]);
        assert_sorted(&store, 0);
    }

    #[test]
    fn test_invalid_channel() {
        let mut store = ChannelStore::new();
        assert_eq!(
            store.add(CHANNEL_COUNT, Tick(0, "x")),
            Err(StoreError::InvalidChannel(CHANNEL_COUNT))
        );
        assert!(store.count(CHANNEL_COUNT).is_err());
        assert!(store.elements(999).is_err());
    }

    #[test]
    fn test_insert_at_rejects_out_of_order() {
        let mut store = ChannelStore::new();
        store.add(1, Tick(10, "a")).unwrap();
        store.add(1, Tick(30, "b")).unwrap();

        assert!(matches!(
            store.insert_at(1, 1, Tick(40, "x")),
            Err(StoreError::OrderViolation { index: 1, .. })
        ));
        assert!(matches!(
            store.insert_at(1, 0, Tick(20, "x")),
            Err(StoreError::OrderViolation { .. })
        ));
        assert!(matches!(
            store.insert_at(1, 5, Tick(50, "x")),
            Err(StoreError::IndexOutOfRange { index: 5, .. })
        ));
        assert_eq!(store.count(1).unwrap(), 2);

        store.insert_at(1, 1, Tick(30, "c")).unwrap();
        store.insert_at(1, 3, Tick(30, "d")).unwrap();
        let labels: Vec<_> = store.elements(1).unwrap().iter().map(|t| t.1).collect();
        assert_eq!(labels, ["a", "c", "b", "d"]);
        assert_sorted(&store, 1);
    }

    #[test]
    fn test_replace_requires_same_time() {
        let mut store = ChannelStore::new();
        store.add(2, Tick(10, "a")).unwrap();

        assert!(store.replace_at(2, 0, Tick(11, "b")).is_err());
        assert_eq!(store.get(2, 0), Some(&Tick(10, "a")));

        let old = store.replace_at(2, 0, Tick(10, "b")).unwrap();
        assert_eq!(old, Tick(10, "a"));
        assert_eq!(store.get(2, 0), Some(&Tick(10, "b")));
        assert!(store.replace_at(2, 1, Tick(10, "c")).is_err());
    }

    #[test]
    fn test_remove_at() {
        let mut store = ChannelStore::new();
        store.add(3, Tick(1, "a")).unwrap();
        store.add(3, Tick(2, "b")).unwrap();

        assert_eq!(store.remove_at(3, 0).unwrap(), Tick(1, "a"));
        assert_eq!(
            store.remove_at(3, 1),
            Err(StoreError::IndexOutOfRange { channel: 3, index: 1 })
        );
        assert_eq!(store.count(3).unwrap(), 1);
    }

    #[test]
    fn test_search_skips_equal_ticks() {
        let mut store = ChannelStore::new();
        for (t, l) in [(10, "a"), (20, "b"), (20, "c"), (30, "d")] {
            store.add(0, Tick(t, l)).unwrap();
        }

        assert_eq!(store.first_index_at_or_after(0, 5).unwrap(), 0);
        assert_eq!(store.first_index_at_or_after(0, 20).unwrap(), 3);
        assert_eq!(store.first_index_at_or_after(0, 25).unwrap(), 3);
        assert_eq!(store.first_index_at_or_after(0, 99).unwrap(), 4);

        assert_eq!(store.last_index_before(0, 5).unwrap(), None);
        assert_eq!(store.last_index_before(0, 20).unwrap(), Some(2));
        assert_eq!(store.last_index_before(0, 30).unwrap(), Some(3));
    }

    #[test]
    fn test_add_batch_sorts_incoming() {
        let mut store = ChannelStore::new();
        store.add(4, Tick(15, "existing")).unwrap();

        let indices = store
            .add_batch(4, vec![Tick(30, "x"), Tick(10, "y"), Tick(15, "z")])
            .unwrap();
        assert_eq!(indices, vec![0, 2, 3]);

        let labels: Vec<_> = store.elements(4).unwrap().iter().map(|t| t.1).collect();
        assert_eq!(labels, ["y", "existing", "z", "x"]);
        for (index, label) in indices.iter().zip(["y", "z", "x"]) {
            assert_eq!(store.get(4, *index).unwrap().1, label);
        }
    }

    #[test]
    fn test_range_and_channels_in_use() {
        let mut store = ChannelStore::new();
        for t in [5, 10, 15, 20] {
            store.add(9, Tick(t, "")).unwrap();
        }
        store.add(200, Tick(0, "")).unwrap();

        assert_eq!(store.range(9, 10, 15).unwrap(), 1..3);
        assert_eq!(store.range(9, 16, 19).unwrap(), 3..3);
        assert_eq!(store.range(9, 30, 10).unwrap(), 4..4);
        assert_eq!(store.channels_in_use().collect::<Vec<_>>(), vec![9, 200]);
        assert_eq!(store.total_count(), 5);
    }

    #[test]
    fn test_mixed_mutations_stay_sorted() {
        let mut store = ChannelStore::new();
        let ticks = [40, 10, 40, 25, 0, 99, 25, 60];
        for (i, t) in ticks.iter().enumerate() {
            store.add(7, Tick(*t, "")).unwrap();
            assert_sorted(&store, 7);
            if i % 3 == 2 {
                store.remove_at(7, i / 3).unwrap();
                assert_sorted(&store, 7);
            }
            let last = store.count(7).unwrap() - 1;
            let time = store.get(7, last).unwrap().0;
            store.replace_at(7, last, Tick(time, "r")).unwrap();
            assert_sorted(&store, 7);
        }
    }
}
