//! CPU side of the particle render pass.
//!
//! The vertex program reads each particle's state from the current state
//! texture; the CPU only supplies per-instance constants (texture coordinate,
//! size, color) and the per-frame uniforms below.

use bytemuck::{Pod, Zeroable};
use glam::{Mat4, Vec2};

use crate::kernel::smoothstep;
use crate::sampler::{ParticleGeometry, DEFAULT_COLOR};

/// Per-particle instance data. Matches the vertex inputs of `vs_main`.
#[repr(C)]
#[derive(Copy, Clone, Debug, PartialEq, Pod, Zeroable)]
pub struct ParticleInstance {
    pub uv: [f32; 2],
    pub size: f32,
    pub color: [f32; 3],
}

impl ParticleInstance {
    /// Vertex attributes at locations 0..=2.
    pub const ATTRIBUTES: [wgpu::VertexAttribute; 3] =
        wgpu::vertex_attr_array![0 => Float32x2, 1 => Float32, 2 => Float32x3];

    pub fn layout() -> wgpu::VertexBufferLayout<'static> {
        wgpu::VertexBufferLayout {
            array_stride: std::mem::size_of::<Self>() as wgpu::BufferAddress,
            step_mode: wgpu::VertexStepMode::Instance,
            attributes: &Self::ATTRIBUTES,
        }
    }
}

/// One instance per real particle. Padding texels get no instance, so they
/// can never be drawn.
pub fn instances(geometry: &ParticleGeometry) -> Vec<ParticleInstance> {
    (0..geometry.count)
        .map(|i| ParticleInstance {
            uv: geometry.uvs[i],
            size: geometry.sizes[i],
            color: geometry.colors.get(i).copied().unwrap_or(DEFAULT_COLOR),
        })
        .collect()
}

/// Uniforms for the render program (144 bytes).
#[repr(C)]
#[derive(Copy, Clone, Debug, PartialEq, Pod, Zeroable)]
pub struct RenderUniforms {
    pub view: [[f32; 4]; 4],
    pub projection: [[f32; 4]; 4],
    pub resolution: [f32; 2],
    pub point_size: f32,
    pub grid_size: u32,
}

impl RenderUniforms {
    pub fn new(view: Mat4, projection: Mat4, viewport: &Viewport, point_size: f32, grid_size: u32) -> Self {
        Self {
            view: view.to_cols_array_2d(),
            projection: projection.to_cols_array_2d(),
            resolution: viewport.resolution().to_array(),
            point_size,
            grid_size,
        }
    }
}

/// Display size as the render pass sees it.
#[derive(Debug, Clone, Copy, PartialEq)]
pub struct Viewport {
    /// Logical width in points.
    pub width: f32,
    /// Logical height in points.
    pub height: f32,
    /// Device pixels per point, already capped.
    pub pixel_ratio: f32,
}

impl Viewport {
    pub fn new(width: f32, height: f32, pixel_ratio: f32) -> Self {
        Self {
            width,
            height,
            pixel_ratio,
        }
    }

    /// Build from a physical window size and scale factor, capping the pixel
    /// ratio at `max_pixel_ratio`.
    pub fn from_physical(width: u32, height: u32, scale_factor: f64, max_pixel_ratio: f32) -> Self {
        let scale = (scale_factor as f32).max(f32::EPSILON);
        Self {
            width: width as f32 / scale,
            height: height as f32 / scale,
            pixel_ratio: scale.min(max_pixel_ratio),
        }
    }

    /// Resolution uniform in pixels.
    pub fn resolution(&self) -> Vec2 {
        Vec2::new(self.width, self.height) * self.pixel_ratio
    }

    /// Camera aspect ratio.
    pub fn aspect(&self) -> f32 {
        if self.height > 0.0 {
            self.width / self.height
        } else {
            1.0
        }
    }
}

/// Size multiplier from life: fades in right after respawn, out before the next.
pub fn life_envelope(life: f32) -> f32 {
    let size_in = smoothstep(0.0, 0.1, life);
    let size_out = 1.0 - smoothstep(0.7, 1.0, life);
    size_in.min(size_out)
}

/// On-screen sprite diameter in pixels, as computed by `vs_main`.
pub fn sprite_pixel_size(life: f32, size: f32, point_size: f32, resolution_y: f32, view_depth: f32) -> f32 {
    life_envelope(life) * size * point_size * resolution_y / view_depth.max(0.0001)
}
