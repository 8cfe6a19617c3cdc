// SPDX-License-Identifier: MIT OR Apache-2.0
//! Host receivers and the registry that owns them.
//!
//! A receiver declares its capabilities up front as string keys mapped to
//! typed callbacks. The router resolves keys to slots once, at build time.

use crate::param::{ParamSet, ParamValue};
use indexmap::IndexMap;
use std::fmt;

/// Callback for a discrete action
pub type ActionFn = Box<dyn FnMut(&ParamSet)>;

/// Callback for a continuous property
pub type PropertyFn = Box<dyn FnMut(&ParamValue)>;

/// Callback returning a receiver to its default state
pub type ResetFn = Box<dyn FnMut()>;

/// A named receiver and its capabilities
pub struct Receiver {
    name: String,
    actions: IndexMap<String, ActionFn>,
    properties: IndexMap<String, PropertyFn>,
    reset: Option<ResetFn>,
}

impl Receiver {
    /// Create a receiver with no capabilities
    pub fn new(name: impl Into<String>) -> Self {
        Self {
            name: name.into(),
            actions: IndexMap::new(),
            properties: IndexMap::new(),
            reset: None,
        }
    }

    /// Expose an action
    pub fn with_action(mut self, key: impl Into<String>, action: impl FnMut(&ParamSet) + 'static) -> Self {
        self.actions.insert(key.into(), Box::new(action));
        self
    }

    /// Expose a property
    pub fn with_property(mut self, key: impl Into<String>, property: impl FnMut(&ParamValue) + 'static) -> Self {
        self.properties.insert(key.into(), Box::new(property));
        self
    }

    /// Set the reset callback
    pub fn with_reset(mut self, reset: impl FnMut() + 'static) -> Self {
        self.reset = Some(Box::new(reset));
        self
    }

    /// Receiver name
    pub fn name(&self) -> &str {
        &self.name
    }

    /// Whether an action key is exposed
    pub fn exposes_action(&self, key: &str) -> bool {
        self.actions.contains_key(key)
    }

    /// Whether a property key is exposed
    pub fn exposes_property(&self, key: &str) -> bool {
        self.properties.contains_key(key)
    }

    fn reset(&mut self) {
        if let Some(reset) = self.reset.as_mut() {
            reset();
        }
    }
}

impl fmt::Debug for Receiver {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.debug_struct("Receiver")
            .field("name", &self.name)
            .field("actions", &self.actions.keys().collect::<Vec<_>>())
            .field("properties", &self.properties.keys().collect::<Vec<_>>())
            .finish()
    }
}

/// Slot of a resolved receiver entry point
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub(crate) struct Slot {
    pub receiver: usize,
    pub entry: usize,
}

/// Owns every receiver of a scene
#[derive(Debug, Default)]
pub struct ReceiverRegistry {
    receivers: IndexMap<String, Receiver>,
}

impl ReceiverRegistry {
    /// Create an empty registry
    pub fn new() -> Self {
        Self::default()
    }

    /// Register a receiver; returns the one it replaced, if any
    pub fn register(&mut self, receiver: Receiver) -> Option<Receiver> {
        let replaced = self.receivers.insert(receiver.name.clone(), receiver);
        if let Some(old) = &replaced {
            tracing::debug!("Receiver '{}' replaced", old.name);
        }
        replaced
    }

    /// Builder-style register
    pub fn with(mut self, receiver: Receiver) -> Self {
        self.register(receiver);
        self
    }

    /// Get a receiver by name
    pub fn get(&self, name: &str) -> Option<&Receiver> {
        self.receivers.get(name)
    }

    /// Number of receivers
    pub fn len(&self) -> usize {
        self.receivers.len()
    }

    /// Whether no receivers are registered
    pub fn is_empty(&self) -> bool {
        self.receivers.is_empty()
    }

    /// Reset every receiver
    pub fn reset_all(&mut self) {
        self.receivers.values_mut().for_each(Receiver::reset);
    }

    pub(crate) fn resolve_action(&self, target: &str, action: &str) -> Option<Slot> {
        let (receiver, _, entry) = self.receivers.get_full(target)?;
        let entry = entry.actions.get_index_of(action)?;
        Some(Slot { receiver, entry })
    }

    pub(crate) fn resolve_property(&self, target: &str, property: &str) -> Option<Slot> {
        let (receiver, _, entry) = self.receivers.get_full(target)?;
        let entry = entry.properties.get_index_of(property)?;
        Some(Slot { receiver, entry })
    }

    pub(crate) fn call_action(&mut self, slot: Slot, params: &ParamSet) {
        if let Some(action) = self
            .receivers
            .get_index_mut(slot.receiver)
            .and_then(|(_, r)| r.actions.get_index_mut(slot.entry))
            .map(|(_, action)| action)
        {
            action(params);
        }
    }

    pub(crate) fn set_property(&mut self, slot: Slot, value: &ParamValue) {
        if let Some(property) = self
            .receivers
            .get_index_mut(slot.receiver)
            .and_then(|(_, r)| r.properties.get_index_mut(slot.entry))
            .map(|(_, property)| property)
        {
            property(value);
        }
    }
}
