// SPDX-License-Identifier: MIT OR Apache-2.0
//! Parameter values and transforms for routed invocations.

use indexmap::IndexMap;
use serde::{Deserialize, Serialize};

/// Named parameters passed to a receiver action
pub type ParamSet = IndexMap<String, ParamValue>;

/// Data type of a parameter
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
pub enum ParamType {
    /// Boolean value
    Bool,
    /// Integer value
    Int,
    /// Floating point value
    Float,
}

/// Value of a parameter
#[derive(Debug, Clone, Copy, PartialEq, Serialize, Deserialize)]
pub enum ParamValue {
    /// Boolean
    Bool(bool),
    /// Integer
    Int(i64),
    /// Float
    Float(f32),
}

impl ParamValue {
    /// Get the type of this value
    pub fn param_type(&self) -> ParamType {
        match self {
            Self::Bool(_) => ParamType::Bool,
            Self::Int(_) => ParamType::Int,
            Self::Float(_) => ParamType::Float,
        }
    }

    /// Numeric view; `true` is 1
    pub fn as_f32(&self) -> f32 {
        match self {
            Self::Bool(b) => f32::from(u8::from(*b)),
            Self::Int(i) => *i as f32,
            Self::Float(f) => *f,
        }
    }

    /// Truth view; numbers are true when non-zero
    pub fn as_bool(&self) -> bool {
        match self {
            Self::Bool(b) => *b,
            Self::Int(i) => *i != 0,
            Self::Float(f) => *f != 0.0,
        }
    }

    /// Same type and same bits. `NaN` equals an identical `NaN`; `0.0` and
    /// `-0.0` differ.
    pub fn bit_eq(&self, other: &ParamValue) -> bool {
        match (self, other) {
            (Self::Bool(a), Self::Bool(b)) => a == b,
            (Self::Int(a), Self::Int(b)) => a == b,
            (Self::Float(a), Self::Float(b)) => a.to_bits() == b.to_bits(),
            _ => false,
        }
    }
}

fn default_scale() -> f32 {
    1.0
}

/// How one output parameter is computed.
///
/// With a `source`, the value is `source * scale + bias` (ints rounded;
/// bools are `source == (scale > 0)`). Without one it is a literal fixed at
/// build time: `bias` (ints rounded; bools `bias > 0`).
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct ParamTransform {
    /// Output parameter name
    pub name: String,
    /// Output parameter type
    pub param_type: ParamType,
    /// Multiplier applied to the source
    #[serde(default = "default_scale")]
    pub scale: f32,
    /// Offset added after scaling; the literal value when there is no source
    #[serde(default)]
    pub bias: f32,
    /// Live parameter to read
    #[serde(default)]
    pub source: Option<String>,
}

impl ParamTransform {
    /// Literal parameter
    pub fn literal(name: impl Into<String>, param_type: ParamType, value: f32) -> Self {
        Self {
            name: name.into(),
            param_type,
            scale: 1.0,
            bias: value,
            source: None,
        }
    }

    /// Parameter computed from a live one
    pub fn from_source(
        name: impl Into<String>,
        param_type: ParamType,
        source: impl Into<String>,
        scale: f32,
        bias: f32,
    ) -> Self {
        Self {
            name: name.into(),
            param_type,
            scale,
            bias,
            source: Some(source.into()),
        }
    }

    /// Whether the value is fixed at build time
    pub fn is_static(&self) -> bool {
        self.source.is_none()
    }

    /// Value of a literal parameter
    pub fn literal_value(&self) -> ParamValue {
        match self.param_type {
            ParamType::Bool => ParamValue::Bool(self.bias > 0.0),
            ParamType::Int => ParamValue::Int(self.bias.round() as i64),
            ParamType::Float => ParamValue::Float(self.bias),
        }
    }

    /// Transform a live source value
    pub fn apply(&self, source: &ParamValue) -> ParamValue {
        match self.param_type {
            ParamType::Bool => ParamValue::Bool(source.as_bool() == (self.scale > 0.0)),
            ParamType::Int => {
                ParamValue::Int((source.as_f32() * self.scale + self.bias).round() as i64)
            }
            ParamType::Float => ParamValue::Float(source.as_f32() * self.scale + self.bias),
        }
    }

    /// Compute this parameter from a live set; `None` if its source is absent
    pub fn evaluate(&self, live: &ParamSet) -> Option<ParamValue> {
        match &self.source {
            None => Some(self.literal_value()),
            Some(source) => live.get(source).map(|value| self.apply(value)),
        }
    }
}
