// SPDX-License-Identifier: MIT OR Apache-2.0
//! Declarative route tables: named events/properties to receiver mappings.

use crate::param::ParamTransform;
use indexmap::IndexMap;
use serde::{Deserialize, Serialize};

/// A wire from a named event or property to one receiver entry point
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct Mapping {
    /// Receiver name
    pub target: String,
    /// Action (for events) or property (for properties) key on the receiver
    pub action: String,
    /// Parameter transforms
    #[serde(default)]
    pub params: Vec<ParamTransform>,
}

impl Mapping {
    /// Create a mapping without parameters
    pub fn new(target: impl Into<String>, action: impl Into<String>) -> Self {
        Self {
            target: target.into(),
            action: action.into(),
            params: Vec::new(),
        }
    }

    /// Add a parameter transform
    pub fn with_param(mut self, param: ParamTransform) -> Self {
        self.params.push(param);
        self
    }
}

/// All declared events and properties of a scene
#[derive(Debug, Clone, Default, PartialEq, Serialize, Deserialize)]
pub struct RouteTable {
    /// Discrete triggers
    #[serde(default)]
    pub events: IndexMap<String, Vec<Mapping>>,
    /// Continuous values
    #[serde(default)]
    pub properties: IndexMap<String, Vec<Mapping>>,
}

impl RouteTable {
    /// Create an empty table
    pub fn new() -> Self {
        Self::default()
    }

    /// Wire an event to a receiver action
    pub fn map_event(&mut self, event: impl Into<String>, mapping: Mapping) -> &mut Self {
        self.events.entry(event.into()).or_default().push(mapping);
        self
    }

    /// Wire a property to a receiver property
    pub fn map_property(&mut self, property: impl Into<String>, mapping: Mapping) -> &mut Self {
        self.properties.entry(property.into()).or_default().push(mapping);
        self
    }

    /// Total declared mappings
    pub fn mapping_count(&self) -> usize {
        self.events.values().chain(self.properties.values()).map(Vec::len).sum()
    }

    /// Parse from RON
    pub fn from_ron(source: &str) -> Result<Self, ron::error::SpannedError> {
        ron::from_str(source)
    }

    /// Serialize to pretty RON
    pub fn to_ron(&self) -> Result<String, ron::Error> {
        ron::ser::to_string_pretty(self, ron::ser::PrettyConfig::default())
    }
}
