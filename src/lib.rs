//! # flowfield
//!
//! GPU flow-field particles seeded from the vertices of a 3D model.
//!
//! Every vertex of the model's first mesh becomes one particle. The particle
//! state (position and life) lives in a pair of square float textures that a
//! compute program ping-pongs between once per frame: particles drift along a
//! 3D simplex-noise flow field, age, and snap back to their base vertex when
//! their life wraps. The render pass reads positions straight from the state
//! texture, so particle data never round-trips through the CPU.
//!
//! ## Quick Start
//!
//! ```ignore
//! use flowfield::prelude::*;
//!
//! fn main() -> Result<(), SessionError> {
//!     let config = FlowConfig::new()
//!         .with_flow_field(FlowFieldParams { influence: 0.8, ..Default::default() })
//!         .with_seed(7);
//!     flowfield::run("model.glb", config)
//! }
//! ```
//!
//! ## Without a GPU
//!
//! [`SoftwareSimulation`](software::SoftwareSimulation) runs the same step on
//! plain texel buffers. It is what the tests and benchmarks drive:
//!
//! ```ignore
//! use flowfield::prelude::*;
//! use rand::SeedableRng;
//!
//! let mesh = MeshData::from_positions(vec![Vec3::ZERO, Vec3::X, Vec3::Y]);
//! let geometry = sample_geometry(&mesh, &mut rand::rngs::StdRng::seed_from_u64(1))?;
//! let mut sim = SoftwareSimulation::new(&geometry);
//! let mut driver = FrameDriver::new(geometry.grid, geometry.count);
//! driver.advance(&mut sim, &FlowConfig::default(), 1.0 / 60.0);
//! ```
//!
//! ## Features
//!
//! - `egui`: live tweak panel for influence, strength, frequency, point size,
//!   and background color.

pub mod config;
pub mod driver;
pub mod error;
pub mod flow;
mod gpu;
pub mod kernel;
pub mod loader;
pub mod noise;
#[cfg(feature = "egui")]
pub mod panel;
pub mod pingpong;
pub mod render;
pub mod sampler;
pub mod shaders;
pub mod software;
pub mod time;
mod window;

pub use glam::{Vec2, Vec3, Vec4};

pub use gpu::{Camera, GpuSimulation, GpuState};
pub use window::{run, run_geometry, sample_with_config};

/// Convenient re-exports for common usage.
///
/// ```ignore
/// use flowfield::prelude::*;
/// ```
pub mod prelude {
    pub use crate::config::{CameraSettings, FlowConfig, RenderSettings, WindowSettings};
    pub use crate::driver::{FrameDriver, FrameTick, StepBackend};
    pub use crate::error::{AssetLoadError, CompiledProgramError, ConfigError, GpuError, SessionError};
    pub use crate::flow::{FlowFieldParams, StepConstants};
    pub use crate::kernel::StepUniforms;
    pub use crate::loader::MeshData;
    pub use crate::sampler::{sample_geometry, GridSize, ParticleGeometry};
    pub use crate::software::SoftwareSimulation;
    pub use crate::time::Time;
    pub use crate::{run, run_geometry};
    pub use crate::{Vec2, Vec3, Vec4};
}
