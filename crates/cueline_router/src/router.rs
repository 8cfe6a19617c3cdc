// SPDX-License-Identifier: MIT OR Apache-2.0
//! Composite dispatch of named events and properties.
//!
//! [`EventRouter::build`] resolves every mapping of a [`RouteTable`] against a
//! [`ReceiverRegistry`] exactly once. Mappings whose target does not expose the
//! requested entry point are dropped for good. Literal parameters are computed
//! at build time; only sourced parameters are evaluated per invocation.

use crate::param::{ParamSet, ParamTransform, ParamValue};
use crate::receiver::{ReceiverRegistry, Slot};
use crate::route::{Mapping, RouteTable};
use indexmap::IndexMap;

/// Live parameter a property mapping reads when it declares no transform
pub const VALUE_PARAM: &str = "value";

#[derive(Debug, Clone)]
enum ResolvedParam {
    Static(ParamValue),
    Dynamic(ParamTransform),
}

#[derive(Debug)]
struct EventTarget {
    slot: Slot,
    params: Vec<(String, ResolvedParam)>,
}

impl EventTarget {
    fn params(&self, live: &ParamSet) -> ParamSet {
        let mut out = ParamSet::with_capacity(self.params.len());
        for (name, param) in &self.params {
            let value = match param {
                ResolvedParam::Static(value) => Some(*value),
                ResolvedParam::Dynamic(transform) => transform.evaluate(live),
            };
            match value {
                Some(value) => {
                    out.insert(name.clone(), value);
                }
                None => tracing::trace!("Parameter '{}' has no live source, omitted", name),
            }
        }
        out
    }
}

#[derive(Debug)]
struct PropertyTarget {
    slot: Slot,
    transform: Option<ResolvedParam>,
    last: Option<ParamValue>,
}

impl PropertyTarget {
    fn value(&self, live: &ParamSet) -> Option<ParamValue> {
        match &self.transform {
            Some(ResolvedParam::Static(value)) => Some(*value),
            Some(ResolvedParam::Dynamic(transform)) => transform.evaluate(live),
            None => live.get(VALUE_PARAM).copied(),
        }
    }
}

/// Counts describing a built router
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq)]
pub struct RouterStats {
    /// Declared events
    pub events: usize,
    /// Declared properties
    pub properties: usize,
    /// Mappings that resolved to a receiver entry point
    pub live_mappings: usize,
    /// Mappings dropped at build time
    pub inert_mappings: usize,
}

fn resolve_param(transform: &ParamTransform) -> ResolvedParam {
    if transform.is_static() {
        ResolvedParam::Static(transform.literal_value())
    } else {
        ResolvedParam::Dynamic(transform.clone())
    }
}

fn log_inert(kind: &str, name: &str, mapping: &Mapping) {
    tracing::debug!(
        "Dropping {} mapping '{}' -> {}.{}: not exposed by receiver",
        kind,
        name,
        mapping.target,
        mapping.action
    );
}

/// Owned dispatch context for one loaded scene
#[derive(Debug)]
pub struct EventRouter {
    registry: ReceiverRegistry,
    events: IndexMap<String, Vec<EventTarget>>,
    properties: IndexMap<String, Vec<PropertyTarget>>,
    inert: usize,
}

impl EventRouter {
    /// Resolve a route table against the receivers of a scene
    pub fn build(table: &RouteTable, registry: ReceiverRegistry) -> Self {
        let mut inert = 0;

        let mut events = IndexMap::with_capacity(table.events.len());
        for (name, mappings) in &table.events {
            let mut targets = Vec::with_capacity(mappings.len());
            for mapping in mappings {
                match registry.resolve_action(&mapping.target, &mapping.action) {
                    Some(slot) => targets.push(EventTarget {
                        slot,
                        params: mapping
                            .params
                            .iter()
                            .map(|p| (p.name.clone(), resolve_param(p)))
                            .collect(),
                    }),
                    None => {
                        log_inert("event", name, mapping);
                        inert += 1;
                    }
                }
            }
            events.insert(name.clone(), targets);
        }

        let mut properties = IndexMap::with_capacity(table.properties.len());
        for (name, mappings) in &table.properties {
            let mut targets = Vec::with_capacity(mappings.len());
            for mapping in mappings {
                match registry.resolve_property(&mapping.target, &mapping.action) {
                    Some(slot) => targets.push(PropertyTarget {
                        slot,
                        transform: mapping.params.first().map(resolve_param),
                        last: None,
                    }),
                    None => {
                        log_inert("property", name, mapping);
                        inert += 1;
                    }
                }
            }
            properties.insert(name.clone(), targets);
        }

        let router = Self {
            registry,
            events,
            properties,
            inert,
        };
        let stats = router.stats();
        tracing::info!(
            "Router built: {} events, {} properties, {} live mappings, {} inert",
            stats.events,
            stats.properties,
            stats.live_mappings,
            stats.inert_mappings
        );
        router
    }

    /// Fire a named event. Returns the number of receiver actions invoked.
    pub fn invoke(&mut self, event: &str, live: &ParamSet) -> usize {
        let Some(targets) = self.events.get(event) else {
            tracing::trace!("Event '{}' is not declared", event);
            return 0;
        };
        for target in targets {
            let params = target.params(live);
            self.registry.call_action(target.slot, &params);
        }
        targets.len()
    }

    /// Propagate a named property. Mappings whose computed value is
    /// bit-identical to the one they last propagated are skipped.
    /// Returns the number of receiver properties set.
    pub fn propagate(&mut self, property: &str, live: &ParamSet) -> usize {
        let Some(targets) = self.properties.get_mut(property) else {
            tracing::trace!("Property '{}' is not declared", property);
            return 0;
        };
        let mut calls = 0;
        for target in targets {
            let Some(value) = target.value(live) else {
                continue;
            };
            if target.last.is_some_and(|last| last.bit_eq(&value)) {
                continue;
            }
            target.last = Some(value);
            self.registry.set_property(target.slot, &value);
            calls += 1;
        }
        calls
    }

    /// Reset every receiver and forget the last propagated values
    pub fn reset_all(&mut self) {
        self.registry.reset_all();
        for target in self.properties.values_mut().flatten() {
            target.last = None;
        }
    }

    /// Whether an event is declared
    pub fn has_event(&self, event: &str) -> bool {
        self.events.contains_key(event)
    }

    /// Whether a property is declared
    pub fn has_property(&self, property: &str) -> bool {
        self.properties.contains_key(property)
    }

    /// Receivers of this scene
    pub fn registry(&self) -> &ReceiverRegistry {
        &self.registry
    }

    /// Build statistics
    pub fn stats(&self) -> RouterStats {
        RouterStats {
            events: self.events.len(),
            properties: self.properties.len(),
            live_mappings: self.events.values().map(Vec::len).sum::<usize>()
                + self.properties.values().map(Vec::len).sum::<usize>(),
            inert_mappings: self.inert,
        }
    }
}
