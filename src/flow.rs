//! Flow field parameters and the tuning constants of the simulation step.
//!
//! Tweak values are clamped to their ranges on every write. A clamp is not an
//! error: the clamped value is stored and a warning is logged.

use std::ops::RangeInclusive;

use serde::{Deserialize, Serialize};

/// Allowed range of [`FlowFieldParams::influence`].
pub const INFLUENCE_RANGE: RangeInclusive<f32> = 0.0..=1.0;
/// Allowed range of [`FlowFieldParams::strength`].
pub const STRENGTH_RANGE: RangeInclusive<f32> = 0.0..=10.0;
/// Allowed range of [`FlowFieldParams::frequency`].
pub const FREQUENCY_RANGE: RangeInclusive<f32> = 0.0..=1.0;
/// Allowed range of the render pass point size.
pub const POINT_SIZE_RANGE: RangeInclusive<f32> = 0.0..=1.0;
/// Allowed range of [`StepConstants::respawn_rate`].
pub const RESPAWN_RATE_RANGE: RangeInclusive<f32> = 0.0..=10.0;
/// Allowed range of [`StepConstants::return_rate`].
pub const RETURN_RATE_RANGE: RangeInclusive<f32> = 0.0..=10.0;
/// Allowed range of [`StepConstants::time_scale`].
pub const TIME_SCALE_RANGE: RangeInclusive<f32> = 0.0..=10.0;
/// Allowed range of [`StepConstants::shape_frequency`].
pub const SHAPE_FREQUENCY_RANGE: RangeInclusive<f32> = 0.0..=10.0;

/// Clamp `value` into `range`, logging when it had to move.
pub(crate) fn clamp_param(name: &str, value: f32, range: &RangeInclusive<f32>) -> f32 {
    let clamped = if value.is_nan() {
        *range.start()
    } else {
        value.clamp(*range.start(), *range.end())
    };
    if clamped != value {
        log::warn!(
            "{} = {} is outside [{}, {}], using {}",
            name,
            value,
            range.start(),
            range.end(),
            clamped
        );
    }
    clamped
}

/// Global flow field tunables, read by every simulation step.
#[derive(Debug, Clone, Copy, PartialEq, Serialize, Deserialize)]
#[serde(default)]
pub struct FlowFieldParams {
    /// How many particles leave the shape: 0 keeps every particle on its
    /// base position, 1 lets nearly all of them drift.
    pub influence: f32,
    /// Speed multiplier applied to the flow direction.
    pub strength: f32,
    /// Spatial frequency at which the flow noise is sampled.
    pub frequency: f32,
}

impl Default for FlowFieldParams {
    fn default() -> Self {
        Self {
            influence: 0.5,
            strength: 2.0,
            frequency: 0.5,
        }
    }
}

impl FlowFieldParams {
    /// Set influence, clamped to `[0, 1]`.
    pub fn set_influence(&mut self, value: f32) -> f32 {
        self.influence = clamp_param("flow field influence", value, &INFLUENCE_RANGE);
        self.influence
    }

    /// Set strength, clamped to `[0, 10]`.
    pub fn set_strength(&mut self, value: f32) -> f32 {
        self.strength = clamp_param("flow field strength", value, &STRENGTH_RANGE);
        self.strength
    }

    /// Set frequency, clamped to `[0, 1]`.
    pub fn set_frequency(&mut self, value: f32) -> f32 {
        self.frequency = clamp_param("flow field frequency", value, &FREQUENCY_RANGE);
        self.frequency
    }

    /// Re-apply every range clamp, e.g. after deserializing.
    pub fn clamped(mut self) -> Self {
        self.set_influence(self.influence);
        self.set_strength(self.strength);
        self.set_frequency(self.frequency);
        self
    }
}

/// Visual tuning constants of the step kernel.
///
/// These only change how the motion looks, never the structure of the
/// simulation, so they are configuration rather than literals in the shader.
#[derive(Debug, Clone, Copy, PartialEq, Serialize, Deserialize)]
#[serde(default)]
pub struct StepConstants {
    /// Life gained per second; a particle respawns every `1 / respawn_rate` seconds.
    pub respawn_rate: f32,
    /// Multiplier from elapsed seconds to noise time.
    pub time_scale: f32,
    /// Spatial frequency of the gating noise sampled at the base position.
    pub shape_frequency: f32,
    /// How fast a particle outside the flow is pulled back to its base
    /// position, as a fraction of the remaining distance per second.
    pub return_rate: f32,
}

impl Default for StepConstants {
    fn default() -> Self {
        Self {
            respawn_rate: 0.3,
            time_scale: 0.2,
            shape_frequency: 0.2,
            return_rate: 1.0,
        }
    }
}

impl StepConstants {
    /// Clamp every constant to its range. Keeps life growing and every
    /// value finite.
    pub fn clamped(self) -> Self {
        Self {
            respawn_rate: clamp_param("respawn rate", self.respawn_rate, &RESPAWN_RATE_RANGE),
            time_scale: clamp_param("time scale", self.time_scale, &TIME_SCALE_RANGE),
            shape_frequency: clamp_param("shape frequency", self.shape_frequency, &SHAPE_FREQUENCY_RANGE),
            return_rate: clamp_param("return rate", self.return_rate, &RETURN_RATE_RANGE),
        }
    }
}
