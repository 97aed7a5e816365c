//! Per-frame orchestration.
//!
//! Each frame: advance the clock, build the step uniforms from the current
//! tweak values, run exactly one simulation step, then draw from the texture
//! that step wrote. Everything happens on the event loop thread, so a step can
//! never start before the previous one has been recorded.

use crate::config::FlowConfig;
use crate::kernel::StepUniforms;
use crate::sampler::GridSize;
use crate::software::SoftwareSimulation;
use crate::time::Time;

/// A backend that can run one simulation step.
pub trait StepBackend {
    /// Read the current state, write the other texture, swap roles.
    fn step(&mut self, uniforms: &StepUniforms);
}

impl StepBackend for SoftwareSimulation {
    fn step(&mut self, uniforms: &StepUniforms) {
        SoftwareSimulation::step(self, uniforms);
    }
}

/// Timing of one frame.
#[derive(Debug, Clone, Copy, PartialEq)]
pub struct FrameTick {
    /// Seconds since the session started (`uTime`).
    pub time: f32,
    /// Seconds since the previous frame (`uDeltaTime`).
    pub delta: f32,
    /// Frame number, starting at 1.
    pub frame: u64,
}

/// Drives the simulation one frame at a time.
pub struct FrameDriver {
    time: Time,
    grid: GridSize,
    particle_count: usize,
}

impl FrameDriver {
    /// Driver for a simulation of `particle_count` particles on `grid`.
    pub fn new(grid: GridSize, particle_count: usize) -> Self {
        Self {
            time: Time::new(),
            grid,
            particle_count,
        }
    }

    /// Advance the clock from the wall clock.
    pub fn tick(&mut self) -> FrameTick {
        let (time, delta) = self.time.update();
        self.frame_tick(time, delta)
    }

    /// Advance the clock by an explicit delta.
    pub fn tick_by(&mut self, delta: f32) -> FrameTick {
        let (time, delta) = self.time.advance(delta);
        self.frame_tick(time, delta)
    }

    fn frame_tick(&self, time: f32, delta: f32) -> FrameTick {
        FrameTick {
            time,
            delta,
            frame: self.time.frame(),
        }
    }

    /// Step uniforms for this frame, reading the tweak values as they are now.
    pub fn step_uniforms(&self, tick: &FrameTick, config: &FlowConfig) -> StepUniforms {
        StepUniforms::new(
            tick.time,
            tick.delta,
            &config.flow_field,
            &config.step,
            self.grid,
            self.particle_count,
        )
    }

    /// Tick by `delta` and run one step on `backend`.
    pub fn advance<B: StepBackend>(&mut self, backend: &mut B, config: &FlowConfig, delta: f32) -> FrameTick {
        let tick = self.tick_by(delta);
        let uniforms = self.step_uniforms(&tick, config);
        backend.step(&uniforms);
        tick
    }

    /// The clock, e.g. to pause or fix the timestep.
    pub fn time_mut(&mut self) -> &mut Time {
        &mut self.time
    }

    pub fn time(&self) -> &Time {
        &self.time
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    struct Recorder(Vec<StepUniforms>);

    impl StepBackend for Recorder {
        fn step(&mut self, uniforms: &StepUniforms) {
            self.0.push(*uniforms);
        }
    }

    #[test]
    fn test_one_step_per_frame() {
        let mut driver = FrameDriver::new(GridSize::for_count(10), 10);
        let mut recorder = Recorder(Vec::new());
        let config = FlowConfig::default();

        for _ in 0..3 {
            driver.advance(&mut recorder, &config, 0.02);
        }

        assert_eq!(recorder.0.len(), 3);
        assert!((recorder.0[2].time - 0.06).abs() < 1e-6);
        assert_eq!(recorder.0[2].delta_time, 0.02);
        assert_eq!(recorder.0[0].grid_size, 4);
        assert_eq!(recorder.0[0].particle_count, 10);
    }

    #[test]
    fn test_uniforms_follow_tweaks() {
        let mut driver = FrameDriver::new(GridSize::for_count(4), 4);
        let mut recorder = Recorder(Vec::new());
        let mut config = FlowConfig::default();

        driver.advance(&mut recorder, &config, 0.01);
        config.flow_field.set_strength(7.5);
        driver.advance(&mut recorder, &config, 0.01);

        assert_eq!(recorder.0[0].strength, 2.0);
        assert_eq!(recorder.0[1].strength, 7.5);
    }

    #[test]
    fn test_paused_driver_steps_with_zero_delta() {
        let mut driver = FrameDriver::new(GridSize::for_count(4), 4);
        driver.time_mut().pause();
        let tick = driver.tick_by(0.5);
        assert_eq!(tick.delta, 0.0);
        assert_eq!(tick.frame, 1);
    }
}
