// SPDX-License-Identifier: MIT OR Apache-2.0
//! Bridge from timeline playback to the event router.

use crate::param::{ParamSet, ParamValue};
use crate::router::{EventRouter, VALUE_PARAM};
use cueline_sequencer::{Edge, ReceiverSink};
use serde::{Deserialize, Serialize};
use std::collections::BTreeMap;

/// Live parameter carrying the trigger channel
pub const CHANNEL_PARAM: &str = "channel";

/// Live parameter carrying the edge (`true` on rising edges)
pub const ON_PARAM: &str = "on";

/// Events fired by one trigger channel
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct TriggerBinding {
    /// Event fired on rising edges
    pub event: String,
    /// Event fired on falling edges; `event` is reused when absent
    #[serde(default)]
    pub off: Option<String>,
}

impl TriggerBinding {
    /// Same event for both edges
    pub fn new(event: impl Into<String>) -> Self {
        Self {
            event: event.into(),
            off: None,
        }
    }

    /// Separate falling-edge event
    pub fn with_off(mut self, off: impl Into<String>) -> Self {
        self.off = Some(off.into());
        self
    }

    /// Event name for an edge
    pub fn event_for(&self, edge: Edge) -> &str {
        match (edge, &self.off) {
            (Edge::Off, Some(off)) => off,
            _ => &self.event,
        }
    }
}

/// Which named events and properties each channel drives
#[derive(Debug, Clone, Default, PartialEq, Eq, Serialize, Deserialize)]
pub struct ChannelBindings {
    /// Trigger channel bindings
    #[serde(default)]
    pub triggers: BTreeMap<usize, TriggerBinding>,
    /// Curve channel to property name
    #[serde(default)]
    pub curves: BTreeMap<usize, String>,
}

impl ChannelBindings {
    /// Create empty bindings
    pub fn new() -> Self {
        Self::default()
    }

    /// Bind a trigger channel
    pub fn bind_trigger(&mut self, channel: usize, binding: TriggerBinding) -> &mut Self {
        self.triggers.insert(channel, binding);
        self
    }

    /// Bind a curve channel
    pub fn bind_curve(&mut self, channel: usize, property: impl Into<String>) -> &mut Self {
        self.curves.insert(channel, property.into());
        self
    }
}

/// [`ReceiverSink`] that dispatches playback output through an [`EventRouter`]
#[derive(Debug)]
pub struct RoutedSink {
    router: EventRouter,
    bindings: ChannelBindings,
    live: ParamSet,
}

impl RoutedSink {
    /// Wrap a router
    pub fn new(router: EventRouter, bindings: ChannelBindings) -> Self {
        for (channel, binding) in &bindings.triggers {
            if !router.has_event(&binding.event) {
                tracing::warn!("Channel {} bound to undeclared event '{}'", channel, binding.event);
            }
        }
        for (channel, property) in &bindings.curves {
            if !router.has_property(property) {
                tracing::warn!("Channel {} bound to undeclared property '{}'", channel, property);
            }
        }
        Self {
            router,
            bindings,
            live: ParamSet::with_capacity(3),
        }
    }

    /// The wrapped router
    pub fn router(&self) -> &EventRouter {
        &self.router
    }

    /// Channel bindings
    pub fn bindings(&self) -> &ChannelBindings {
        &self.bindings
    }
}

impl ReceiverSink for RoutedSink {
    fn on_trigger(&mut self, channel: usize, edge: Edge, value: u8) {
        let Some(binding) = self.bindings.triggers.get(&channel) else {
            return;
        };
        self.live.clear();
        self.live.insert(VALUE_PARAM.to_string(), ParamValue::Int(i64::from(value)));
        self.live.insert(CHANNEL_PARAM.to_string(), ParamValue::Int(channel as i64));
        self.live.insert(ON_PARAM.to_string(), ParamValue::Bool(edge == Edge::On));
        self.router.invoke(binding.event_for(edge), &self.live);
    }

    fn on_curve(&mut self, channel: usize, value: f32) {
        let Some(property) = self.bindings.curves.get(&channel) else {
            return;
        };
        self.live.clear();
        self.live.insert(VALUE_PARAM.to_string(), ParamValue::Float(value));
        self.router.propagate(property, &self.live);
    }

    fn reset_all(&mut self) {
        self.router.reset_all();
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::param::{ParamTransform, ParamType};
    use crate::receiver::{Receiver, ReceiverRegistry};
    use crate::route::{Mapping, RouteTable};
    use cueline_sequencer::{
        ControlKeyframe, InterpolationMode, OnOffEvent, PlaybackEngine, TimelineProject,
    };
    use std::cell::RefCell;
    use std::rc::Rc;

    type Log = Rc<RefCell<Vec<String>>>;

    fn routed(log: &Log) -> RoutedSink {
        let strike = log.clone();
        let release = log.clone();
        let level = log.clone();
        let reset = log.clone();
        let registry = ReceiverRegistry::new().with(
            Receiver::new("pad")
                .with_action("strike", move |p: &ParamSet| {
                    strike.borrow_mut().push(format!(
                        "strike {:?} {:?}",
                        p.get("velocity"),
                        p.get("lit")
                    ));
                })
                .with_action("release", move |p: &ParamSet| {
                    release.borrow_mut().push(format!("release {:?}", p.get("lit")));
                })
                .with_property("level", move |v: &ParamValue| {
                    level.borrow_mut().push(format!("level {v:?}"));
                })
                .with_reset(move || reset.borrow_mut().push("reset".to_string())),
        );

        let mut table = RouteTable::new();
        table
            .map_event(
                "hit",
                Mapping::new("pad", "strike")
                    .with_param(ParamTransform::from_source("velocity", ParamType::Int, "value", 1.0, 0.0))
                    .with_param(ParamTransform::from_source("lit", ParamType::Bool, "on", 1.0, 0.0)),
            )
            .map_event(
                "hit_off",
                Mapping::new("pad", "release")
                    .with_param(ParamTransform::from_source("lit", ParamType::Bool, "on", 1.0, 0.0)),
            )
            .map_property("glow", Mapping::new("pad", "level"));

        let mut bindings = ChannelBindings::new();
        bindings
            .bind_trigger(7, TriggerBinding::new("hit").with_off("hit_off"))
            .bind_curve(2, "glow");

        RoutedSink::new(EventRouter::build(&table, registry), bindings)
    }

    #[test]
    fn test_trigger_edges_route_to_events() {
        let log = Log::default();
        let mut sink = routed(&log);

        sink.on_trigger(7, Edge::On, 42);
        sink.on_trigger(7, Edge::Off, 42);
        sink.on_trigger(9, Edge::On, 1);

        assert_eq!(
            *log.borrow(),
            vec!["strike Some(Int(42)) Some(Bool(true))", "release Some(Bool(false))"]
        );
    }

    #[test]
    fn test_off_reuses_event_without_off_binding() {
        let binding = TriggerBinding::new("hit");
        assert_eq!(binding.event_for(Edge::On), "hit");
        assert_eq!(binding.event_for(Edge::Off), "hit");
    }

    #[test]
    fn test_playback_through_router() {
        let log = Log::default();
        let mut project = TimelineProject::new();
        {
            let mut session = project.begin_edit("Pattern");
            session.add(7, OnOffEvent::pulse(500, 42)).unwrap();
            session
                .add(2, ControlKeyframe::new(0, 0).with_interpolation(InterpolationMode::Constant))
                .unwrap();
            session.add(2, ControlKeyframe::new(1000, 100)).unwrap();
            session.end();
        }

        let mut engine = PlaybackEngine::new(routed(&log));
        engine.set_sequence(&project);
        engine.advance(&project, 100);
        engine.advance(&project, 600);

        // Constant curve holds 0 across both frames, so only one level call
        assert_eq!(
            *log.borrow(),
            vec![
                "reset",
                "level Float(0.0)",
                "strike Some(Int(42)) Some(Bool(true))",
                "release Some(Bool(false))",
            ]
        );
    }
}
