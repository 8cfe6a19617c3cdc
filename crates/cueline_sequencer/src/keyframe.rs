// SPDX-License-Identifier: MIT OR Apache-2.0
//! Control curve keyframes and interpolation.

use crate::channel_store::TimedElement;
use serde::{Deserialize, Serialize};

/// Interpolation mode from a keyframe to the next one
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[derive(Default)]
pub enum InterpolationMode {
    /// Constant (step)
    Constant,
    /// Linear interpolation
    #[default]
    Linear,
    /// Cubic smoothstep
    Smooth,
    /// Quadratic ease in
    EaseIn,
    /// Quadratic ease out
    EaseOut,
}

impl InterpolationMode {
    /// Numeric code used by flat records
    pub fn code(&self) -> u8 {
        match self {
            Self::Constant => 0,
            Self::Linear => 1,
            Self::Smooth => 2,
            Self::EaseIn => 3,
            Self::EaseOut => 4,
        }
    }

    /// Parse a record code
    pub fn from_code(code: u8) -> Option<Self> {
        match code {
            0 => Some(Self::Constant),
            1 => Some(Self::Linear),
            2 => Some(Self::Smooth),
            3 => Some(Self::EaseIn),
            4 => Some(Self::EaseOut),
            _ => None,
        }
    }

    /// Shape a normalized position `t` in `[0, 1]`
    pub fn shape(&self, t: f32) -> f32 {
        match self {
            Self::Constant => 0.0,
            Self::Linear => t,
            Self::Smooth => Interpolation::smoothstep(t),
            Self::EaseIn => Interpolation::ease_in(t),
            Self::EaseOut => Interpolation::ease_out(t),
        }
    }
}

/// One knot of a channel's control curve
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
pub struct ControlKeyframe {
    /// Tick
    pub time: i64,
    /// Interpolation towards the next keyframe
    pub interpolation: InterpolationMode,
    /// Raw curve value
    pub value: u8,
}

impl ControlKeyframe {
    /// Create a new keyframe
    pub fn new(time: i64, value: u8) -> Self {
        Self {
            time,
            interpolation: InterpolationMode::default(),
            value,
        }
    }

    /// Set interpolation mode
    pub fn with_interpolation(mut self, mode: InterpolationMode) -> Self {
        self.interpolation = mode;
        self
    }
}

impl TimedElement for ControlKeyframe {
    fn time(&self) -> i64 {
        self.time
    }
}

/// Interpolation utilities
pub struct Interpolation;

impl Interpolation {
    /// Linear interpolation between two floats
    pub fn lerp(a: f32, b: f32, t: f32) -> f32 {
        a + (b - a) * t
    }

    /// `3t² - 2t³`
    pub fn smoothstep(t: f32) -> f32 {
        t * t * (3.0 - 2.0 * t)
    }

    /// `t²`
    pub fn ease_in(t: f32) -> f32 {
        t * t
    }

    /// `1 - (1 - t)²`
    pub fn ease_out(t: f32) -> f32 {
        let inv = 1.0 - t;
        1.0 - inv * inv
    }

    /// Normalized position of `time` between two ticks, clamped to `[0, 1]`
    pub fn progress(start: i64, end: i64, time: i64) -> f32 {
        if end <= start {
            return 1.0;
        }
        let span = i128::from(end) - i128::from(start);
        let t = (i128::from(time) - i128::from(start)) as f64 / span as f64;
        t.clamp(0.0, 1.0) as f32
    }

    /// Value of the segment `a -> b` at `time`, shaped by `a`'s interpolation
    pub fn segment(a: &ControlKeyframe, b: &ControlKeyframe, time: i64) -> f32 {
        if time >= b.time {
            return f32::from(b.value);
        }
        let start = f32::from(a.value);
        if time <= a.time || a.interpolation == InterpolationMode::Constant {
            return start;
        }
        let t = Self::progress(a.time, b.time, time);
        Self::lerp(start, f32::from(b.value), a.interpolation.shape(t))
    }
}

/// Sample a sorted keyframe slice at `time`.
///
/// Before the first knot and after the last one the nearest raw value is
/// held; there is no extrapolation. `None` for an empty slice.
pub fn curve_value_at(keyframes: &[ControlKeyframe], time: i64) -> Option<f32> {
    let first = keyframes.first()?;
    let reached = keyframes.partition_point(|k| k.time <= time);
    match reached {
        0 => Some(f32::from(first.value)),
        n if n == keyframes.len() => keyframes.last().map(|k| f32::from(k.value)),
        n => Some(Interpolation::segment(&keyframes[n - 1], &keyframes[n], time)),
    }
}
