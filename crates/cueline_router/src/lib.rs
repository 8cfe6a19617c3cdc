// SPDX-License-Identifier: MIT OR Apache-2.0
//! Named event and property routing for cueline.
//!
//! This crate provides:
//! - Declarative route tables (RON)
//! - Typed parameter transforms with build-time literal caching
//! - Receiver capability registries
//! - A [`cueline_sequencer::ReceiverSink`] that plays timelines through the router
//!
//! ## Architecture
//!
//! A host registers [`Receiver`]s, each exposing string-keyed actions and
//! properties. [`EventRouter::build`] resolves a [`RouteTable`] against them
//! once; afterwards [`EventRouter::invoke`] and [`EventRouter::propagate`] only
//! evaluate live parameters and call the resolved slots.

pub mod param;
pub mod route;
pub mod receiver;
pub mod router;
pub mod sink;

pub use param::{ParamSet, ParamTransform, ParamType, ParamValue};
pub use route::{Mapping, RouteTable};
pub use receiver::{ActionFn, PropertyFn, Receiver, ReceiverRegistry, ResetFn};
pub use router::{EventRouter, RouterStats, VALUE_PARAM};
pub use sink::{ChannelBindings, RoutedSink, TriggerBinding, CHANNEL_PARAM, ON_PARAM};
