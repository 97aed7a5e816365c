//! The per-texel simulation step.
//!
//! `step_texel` is the whole simulation: it reads one particle's previous
//! state and its base texel, and returns the new state. It touches no other
//! texel, which is what lets the compute shader run it once per invocation.
//! `STEP_WGSL` in [`crate::shaders`] is the GPU rendition of the same code.

use bytemuck::{Pod, Zeroable};
use glam::{Vec3, Vec4};

use crate::flow::{FlowFieldParams, StepConstants};
use crate::noise::noise3;
use crate::sampler::GridSize;

/// Uniforms consumed by one simulation step.
///
/// Layout matches `StepUniforms` in the step shader (48 bytes, 16-byte aligned).
#[repr(C)]
#[derive(Copy, Clone, Debug, Default, PartialEq, Pod, Zeroable)]
pub struct StepUniforms {
    pub time: f32,
    pub delta_time: f32,
    pub influence: f32,
    pub strength: f32,
    pub frequency: f32,
    pub respawn_rate: f32,
    pub time_scale: f32,
    pub shape_frequency: f32,
    pub return_rate: f32,
    pub grid_size: u32,
    pub particle_count: u32,
    pub _padding: u32,
}

impl StepUniforms {
    /// Gather the values one step needs.
    pub fn new(
        time: f32,
        delta_time: f32,
        flow: &FlowFieldParams,
        constants: &StepConstants,
        grid: GridSize,
        particle_count: usize,
    ) -> Self {
        Self {
            time,
            delta_time,
            influence: flow.influence,
            strength: flow.strength,
            frequency: flow.frequency,
            respawn_rate: constants.respawn_rate,
            time_scale: constants.time_scale,
            shape_frequency: constants.shape_frequency,
            return_rate: constants.return_rate,
            grid_size: grid.side(),
            particle_count: particle_count as u32,
            _padding: 0,
        }
    }
}

/// Hermite smoothstep. Degenerate edges (`edge1 <= edge0`) act as a hard step at `edge1`.
pub fn smoothstep(edge0: f32, edge1: f32, x: f32) -> f32 {
    if edge1 <= edge0 {
        return if x >= edge1 { 1.0 } else { 0.0 };
    }
    let t = ((x - edge0) / (edge1 - edge0)).clamp(0.0, 1.0);
    t * t * (3.0 - 2.0 * t)
}

/// Velocity of a particle at `position` whose base position is `rest`.
///
/// A noise value sampled at the base position gates the particle between
/// free flow and a pull back toward `rest`; influence moves the threshold
/// of that gate.
pub fn flow_velocity(position: Vec3, rest: Vec3, u: &StepUniforms) -> Vec3 {
    let t = u.time * u.time_scale;

    let gate_noise = noise3(rest * u.shape_frequency + Vec3::splat(t + 1.0));
    let threshold = (u.influence - 0.5) * -2.0;
    let gate = smoothstep(threshold, 1.0, gate_noise);

    let q = position * u.frequency + Vec3::splat(t);
    let direction = Vec3::new(
        noise3(q),
        noise3(q + Vec3::splat(1.0)),
        noise3(q + Vec3::splat(2.0)),
    )
    .normalize_or_zero();

    let flow = direction * u.strength;
    let home = (rest - position) * u.return_rate;
    home.lerp(flow, gate)
}

/// Advance one particle by one step.
///
/// `previous` is `(x, y, z, life)`; `base` is the particle's base texel.
pub fn step_texel(previous: Vec4, base: Vec4, u: &StepUniforms) -> Vec4 {
    let rest = base.truncate();
    let life = previous.w + u.delta_time * u.respawn_rate;

    if life >= 1.0 {
        return rest.extend(life.fract());
    }

    let position = previous.truncate();
    let velocity = flow_velocity(position, rest, u);
    (position + velocity * u.delta_time).extend(life)
}

#[cfg(test)]
mod tests {
    use super::*;

    fn uniforms(delta_time: f32) -> StepUniforms {
        StepUniforms::new(
            3.0,
            delta_time,
            &FlowFieldParams {
                influence: 1.0,
                strength: 5.0,
                frequency: 0.8,
            },
            &StepConstants {
                respawn_rate: 1.0,
                ..Default::default()
            },
            GridSize::for_count(4),
            4,
        )
    }

    #[test]
    fn test_uniform_layout() {
        assert_eq!(std::mem::size_of::<StepUniforms>(), 48);
        assert_eq!(std::mem::size_of::<StepUniforms>() % 16, 0);
    }

    #[test]
    fn test_smoothstep() {
        assert_eq!(smoothstep(0.0, 1.0, -1.0), 0.0);
        assert_eq!(smoothstep(0.0, 1.0, 2.0), 1.0);
        assert_eq!(smoothstep(0.0, 1.0, 0.5), 0.5);
        assert_eq!(smoothstep(1.0, 1.0, 0.99), 0.0);
        assert_eq!(smoothstep(1.0, 1.0, 1.0), 1.0);
    }

    #[test]
    fn test_zero_delta_is_identity() {
        let previous = Vec4::new(0.4, -1.0, 2.5, 0.3);
        let base = Vec4::new(0.0, 1.0, 2.0, 0.9);
        assert_eq!(step_texel(previous, base, &uniforms(0.0)), previous);
    }

    #[test]
    fn test_respawn_resets_to_base() {
        let previous = Vec4::new(7.0, 8.0, 9.0, 0.95);
        let base = Vec4::new(1.0, 2.0, 3.0, 0.2);
        let next = step_texel(previous, base, &uniforms(0.1));

        assert_eq!(next.truncate(), Vec3::new(1.0, 2.0, 3.0));
        assert!((next.w - 0.05).abs() < 1e-5);
    }

    #[test]
    fn test_life_wraps_for_large_delta() {
        let next = step_texel(Vec4::new(0.0, 0.0, 0.0, 0.5), Vec4::ZERO, &uniforms(2.7));
        assert!((0.0..1.0).contains(&next.w));
        assert!((next.w - 0.2).abs() < 1e-5);
    }

    #[test]
    fn test_zero_strength_and_return_only_ages() {
        let mut u = uniforms(0.25);
        u.strength = 0.0;
        u.return_rate = 0.0;
        let previous = Vec4::new(0.4, -1.0, 2.5, 0.3);
        let next = step_texel(previous, Vec4::ONE, &u);
        assert_eq!(next.truncate(), previous.truncate());
        assert!((next.w - 0.55).abs() < 1e-6);
    }

    #[test]
    fn test_zero_influence_pulls_toward_base() {
        let mut u = uniforms(0.016);
        u.influence = 0.0;
        u.strength = 10.0;
        u.respawn_rate = 0.0;
        // Gate noise sampled at a lattice point, far below 1
        u.time_scale = 0.0;

        let base = Vec4::ZERO;
        let mut state = Vec4::new(2.0, 0.0, 0.0, 0.0);
        for frame in 0..100 {
            u.time = frame as f32 * 0.016;
            let next = step_texel(state, base, &u);
            assert!(next.truncate().length() <= state.truncate().length());
            state = next;
        }
        assert!(state.truncate().length() < 1.0, "ended at {}", state.truncate());
    }

    #[test]
    fn test_at_base_speed_bounded_by_strength() {
        let u = uniforms(0.016);
        for i in 0..100 {
            let p = Vec3::new(i as f32 * 0.37, (i as f32).sin(), -(i as f32) * 0.11);
            let v = flow_velocity(p, p, &u);
            assert!(v.length() <= u.strength + 1e-4);
        }
    }

    #[test]
    fn test_speed_bounded_by_flow_and_return() {
        let u = uniforms(0.016);
        for i in 0..100 {
            let p = Vec3::new(i as f32 * 0.37, (i as f32).sin(), -(i as f32) * 0.11);
            let rest = p * 0.5;
            let bound = u.strength.max((rest - p).length() * u.return_rate);
            assert!(flow_velocity(p, rest, &u).length() <= bound + 1e-4);
        }
    }
}
