//! Software backend for the simulation step.
//!
//! Runs [`step_texel`] over every texel of a CPU-side texture pair. It is the
//! reference the compute shader is checked against in tests and benches, and
//! works anywhere a GPU adapter is not available.

use glam::Vec4;

use crate::kernel::{step_texel, StepUniforms};
use crate::pingpong::PingPong;
use crate::sampler::{GridSize, ParticleGeometry};

/// One `N×N` texture of `(x, y, z, life)` texels.
pub type TexelBuffer = Vec<[f32; 4]>;

/// Simulation state held in main memory.
pub struct SoftwareSimulation {
    grid: GridSize,
    particle_count: usize,
    /// Immutable base texels (rest positions).
    base: TexelBuffer,
    state: PingPong<TexelBuffer>,
    steps: u64,
}

impl SoftwareSimulation {
    /// Allocate the texture pair. Texture A starts as a copy of the base texels.
    pub fn new(geometry: &ParticleGeometry) -> Self {
        let texels = geometry.grid.texel_count();
        Self {
            grid: geometry.grid,
            particle_count: geometry.count,
            base: geometry.base.clone(),
            state: PingPong::new(geometry.base.clone(), vec![[0.0; 4]; texels]),
            steps: 0,
        }
    }

    /// Run one step: read the current texture, write the other, swap roles.
    pub fn step(&mut self, uniforms: &StepUniforms) {
        let count = self.particle_count;
        let base = &self.base;
        let (previous, next) = self.state.split_mut();

        for (i, out) in next.iter_mut().enumerate() {
            *out = if i < count {
                step_texel(Vec4::from(previous[i]), Vec4::from(base[i]), uniforms).to_array()
            } else {
                [0.0; 4]
            };
        }

        self.state.swap();
        self.steps += 1;
    }

    /// Most recently written texels.
    pub fn current(&self) -> &[[f32; 4]] {
        self.state.current()
    }

    /// Current state of particle `i`.
    pub fn particle(&self, i: usize) -> Vec4 {
        Vec4::from(self.current()[i])
    }

    /// Base texels (never modified).
    pub fn base(&self) -> &[[f32; 4]] {
        &self.base
    }

    pub fn grid(&self) -> GridSize {
        self.grid
    }

    pub fn particle_count(&self) -> usize {
        self.particle_count
    }

    /// Number of steps run so far.
    pub fn step_count(&self) -> u64 {
        self.steps
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::flow::{FlowFieldParams, StepConstants};
    use crate::loader::MeshData;
    use crate::sampler::sample_geometry;
    use glam::Vec3;
    use rand::rngs::StdRng;
    use rand::SeedableRng;

    fn simulation(count: usize) -> SoftwareSimulation {
        let mesh = MeshData::from_positions(
            (0..count).map(|i| Vec3::new(i as f32 * 0.1, 0.0, -0.2)).collect(),
        );
        let geometry = sample_geometry(&mesh, &mut StdRng::seed_from_u64(11)).unwrap();
        SoftwareSimulation::new(&geometry)
    }

    fn uniforms(sim: &SoftwareSimulation, time: f32, delta_time: f32) -> StepUniforms {
        StepUniforms::new(
            time,
            delta_time,
            &FlowFieldParams::default(),
            &StepConstants::default(),
            sim.grid(),
            sim.particle_count(),
        )
    }

    #[test]
    fn test_initial_state_is_base() {
        let sim = simulation(5);
        assert_eq!(sim.current(), sim.base());
        assert_eq!(sim.step_count(), 0);
    }

    #[test]
    fn test_padding_stays_inert() {
        let mut sim = simulation(5);
        for frame in 0..20 {
            let u = uniforms(&sim, frame as f32 * 0.016, 0.016);
            sim.step(&u);
        }
        for texel in &sim.current()[5..] {
            assert_eq!(*texel, [0.0; 4]);
        }
        assert_eq!(sim.step_count(), 20);
    }

    #[test]
    fn test_base_is_untouched() {
        let mut sim = simulation(10);
        let before = sim.base().to_vec();
        for frame in 0..50 {
            let u = uniforms(&sim, frame as f32 * 0.05, 0.05);
            sim.step(&u);
        }
        assert_eq!(sim.base(), before.as_slice());
    }
}
