// SPDX-License-Identifier: MIT OR Apache-2.0
//! Discrete on/off trigger elements.

use crate::channel_store::TimedElement;
use serde::{Deserialize, Serialize};

/// What a trigger does to its channel's held state
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
pub enum TriggerKind {
    /// Opens a held state
    On,
    /// Closes a held state
    Off,
    /// Instant pulse: on immediately followed by off, never held
    OnOff,
}

impl TriggerKind {
    /// Numeric code used by flat records
    pub fn code(&self) -> u8 {
        match self {
            Self::On => 0,
            Self::Off => 1,
            Self::OnOff => 2,
        }
    }

    /// Parse a record code
    pub fn from_code(code: u8) -> Option<Self> {
        match code {
            0 => Some(Self::On),
            1 => Some(Self::Off),
            2 => Some(Self::OnOff),
            _ => None,
        }
    }

    /// Edges this trigger fires, in order
    pub fn edges(&self) -> &'static [Edge] {
        match self {
            Self::On => &[Edge::On],
            Self::Off => &[Edge::Off],
            Self::OnOff => &[Edge::On, Edge::Off],
        }
    }
}

/// Edge delivered to receivers
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
pub enum Edge {
    /// Rising edge
    On,
    /// Falling edge
    Off,
}

/// A trigger on a channel
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
pub struct OnOffEvent {
    /// Tick
    pub time: i64,
    /// Trigger kind
    pub kind: TriggerKind,
    /// Velocity/intensity carried to receivers
    pub value: u8,
}

impl OnOffEvent {
    /// Create a trigger
    pub fn new(time: i64, kind: TriggerKind, value: u8) -> Self {
        Self { time, kind, value }
    }

    /// Opening trigger
    pub fn on(time: i64, value: u8) -> Self {
        Self::new(time, TriggerKind::On, value)
    }

    /// Closing trigger
    pub fn off(time: i64, value: u8) -> Self {
        Self::new(time, TriggerKind::Off, value)
    }

    /// Instant pulse
    pub fn pulse(time: i64, value: u8) -> Self {
        Self::new(time, TriggerKind::OnOff, value)
    }
}

impl TimedElement for OnOffEvent {
    fn time(&self) -> i64 {
        self.time
    }
}
