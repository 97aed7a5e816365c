//! GPU resources for the simulation step.
//!
//! Particle state lives in a pair of N×N `Rgba32Float` textures (`xyz` is the
//! position, `w` the life). Each step reads one texture and writes the other
//! through a storage binding; a third texture holds the base positions and is
//! never written after upload.

use crate::error::CompiledProgramError;
use crate::kernel::StepUniforms;
use crate::pingpong::PingPong;
use crate::sampler::{GridSize, ParticleGeometry};
use crate::shaders;

use super::checked_program;

pub(crate) const STATE_FORMAT: wgpu::TextureFormat = wgpu::TextureFormat::Rgba32Float;
const WORKGROUP_SIZE: u32 = 8;

/// One state texture and its view.
pub struct StateTexture {
    pub texture: wgpu::Texture,
    pub view: wgpu::TextureView,
}

impl StateTexture {
    fn new(device: &wgpu::Device, label: &str, grid: GridSize, usage: wgpu::TextureUsages) -> Self {
        let texture = device.create_texture(&wgpu::TextureDescriptor {
            label: Some(label),
            size: extent(grid),
            mip_level_count: 1,
            sample_count: 1,
            dimension: wgpu::TextureDimension::D2,
            format: STATE_FORMAT,
            usage,
            view_formats: &[],
        });
        let view = texture.create_view(&wgpu::TextureViewDescriptor::default());
        Self { texture, view }
    }

    fn upload(&self, queue: &wgpu::Queue, grid: GridSize, texels: &[[f32; 4]]) {
        queue.write_texture(
            wgpu::TexelCopyTextureInfo {
                texture: &self.texture,
                mip_level: 0,
                origin: wgpu::Origin3d::ZERO,
                aspect: wgpu::TextureAspect::All,
            },
            bytemuck::cast_slice(texels),
            wgpu::TexelCopyBufferLayout {
                offset: 0,
                bytes_per_row: Some(grid.side() * 16),
                rows_per_image: Some(grid.side()),
            },
            extent(grid),
        );
    }
}

fn extent(grid: GridSize) -> wgpu::Extent3d {
    wgpu::Extent3d {
        width: grid.side(),
        height: grid.side(),
        depth_or_array_layers: 1,
    }
}

/// The step program and the textures it ping-pongs between.
pub struct GpuSimulation {
    grid: GridSize,
    particle_count: usize,
    /// Held so the base positions outlive the bind groups.
    _base: StateTexture,
    state: PingPong<StateTexture>,
    uniform_buffer: wgpu::Buffer,
    pipeline: wgpu::ComputePipeline,
    /// `bind_groups[i]` reads state slot `i` and writes the other slot.
    bind_groups: [wgpu::BindGroup; 2],
    steps: u64,
}

impl GpuSimulation {
    /// Create the textures and upload the sampled geometry.
    ///
    /// Both the base texture and state texture A start out holding the base
    /// positions with their random initial lives.
    pub async fn new(
        device: &wgpu::Device,
        queue: &wgpu::Queue,
        geometry: &ParticleGeometry,
    ) -> Result<Self, CompiledProgramError> {
        let grid = geometry.grid;

        let base = StateTexture::new(
            device,
            "Base Position Texture",
            grid,
            wgpu::TextureUsages::TEXTURE_BINDING | wgpu::TextureUsages::COPY_DST,
        );
        let state_usage = wgpu::TextureUsages::TEXTURE_BINDING
            | wgpu::TextureUsages::STORAGE_BINDING
            | wgpu::TextureUsages::COPY_DST
            | wgpu::TextureUsages::COPY_SRC;
        let state = PingPong::new(
            StateTexture::new(device, "Particle State Texture A", grid, state_usage),
            StateTexture::new(device, "Particle State Texture B", grid, state_usage),
        );

        base.upload(queue, grid, &geometry.base);
        state.current().upload(queue, grid, &geometry.base);

        let uniform_buffer = device.create_buffer(&wgpu::BufferDescriptor {
            label: Some("Step Uniform Buffer"),
            size: std::mem::size_of::<StepUniforms>() as u64,
            usage: wgpu::BufferUsages::UNIFORM | wgpu::BufferUsages::COPY_DST,
            mapped_at_creation: false,
        });

        let bind_group_layout = device.create_bind_group_layout(&wgpu::BindGroupLayoutDescriptor {
            label: Some("Step Bind Group Layout"),
            entries: &[
                wgpu::BindGroupLayoutEntry {
                    binding: 0,
                    visibility: wgpu::ShaderStages::COMPUTE,
                    ty: wgpu::BindingType::Buffer {
                        ty: wgpu::BufferBindingType::Uniform,
                        has_dynamic_offset: false,
                        min_binding_size: None,
                    },
                    count: None,
                },
                // Previous state
                state_texture_entry(1),
                // Base positions
                state_texture_entry(2),
                // Next state
                wgpu::BindGroupLayoutEntry {
                    binding: 3,
                    visibility: wgpu::ShaderStages::COMPUTE,
                    ty: wgpu::BindingType::StorageTexture {
                        access: wgpu::StorageTextureAccess::WriteOnly,
                        format: STATE_FORMAT,
                        view_dimension: wgpu::TextureViewDimension::D2,
                    },
                    count: None,
                },
            ],
        });

        let pipeline = checked_program(device, "simulation step", || {
            let shader = device.create_shader_module(wgpu::ShaderModuleDescriptor {
                label: Some("Step Shader"),
                source: wgpu::ShaderSource::Wgsl(shaders::step_shader().into()),
            });

            let pipeline_layout = device.create_pipeline_layout(&wgpu::PipelineLayoutDescriptor {
                label: Some("Step Pipeline Layout"),
                bind_group_layouts: &[&bind_group_layout],
                push_constant_ranges: &[],
            });

            device.create_compute_pipeline(&wgpu::ComputePipelineDescriptor {
                label: Some("Step Pipeline"),
                layout: Some(&pipeline_layout),
                module: &shader,
                entry_point: Some("main"),
                compilation_options: Default::default(),
                cache: None,
            })
        })
        .await?;

        let bind_group = |label: &str, read: &StateTexture, write: &StateTexture| {
            device.create_bind_group(&wgpu::BindGroupDescriptor {
                label: Some(label),
                layout: &bind_group_layout,
                entries: &[
                    wgpu::BindGroupEntry {
                        binding: 0,
                        resource: uniform_buffer.as_entire_binding(),
                    },
                    wgpu::BindGroupEntry {
                        binding: 1,
                        resource: wgpu::BindingResource::TextureView(&read.view),
                    },
                    wgpu::BindGroupEntry {
                        binding: 2,
                        resource: wgpu::BindingResource::TextureView(&base.view),
                    },
                    wgpu::BindGroupEntry {
                        binding: 3,
                        resource: wgpu::BindingResource::TextureView(&write.view),
                    },
                ],
            })
        };
        let bind_groups = [
            bind_group("Step Bind Group A->B", state.current(), state.target()),
            bind_group("Step Bind Group B->A", state.target(), state.current()),
        ];

        log::info!(
            "Simulation textures ready: {}x{} texels for {} particles",
            grid.side(),
            grid.side(),
            geometry.count
        );

        Ok(Self {
            grid,
            particle_count: geometry.count,
            _base: base,
            state,
            uniform_buffer,
            pipeline,
            bind_groups,
            steps: 0,
        })
    }

    /// Record one step into `encoder` and swap the texture roles.
    ///
    /// After this returns, [`current_index`](Self::current_index) names the
    /// texture the recorded step writes, which is what this frame's render
    /// pass must read.
    pub fn encode_step(&mut self, encoder: &mut wgpu::CommandEncoder, queue: &wgpu::Queue, uniforms: &StepUniforms) {
        queue.write_buffer(&self.uniform_buffer, 0, bytemuck::bytes_of(uniforms));

        {
            let mut pass = encoder.begin_compute_pass(&wgpu::ComputePassDescriptor {
                label: Some("Step Pass"),
                timestamp_writes: None,
            });
            pass.set_pipeline(&self.pipeline);
            pass.set_bind_group(0, &self.bind_groups[self.state.current_index()], &[]);

            let workgroups = self.grid.side().div_ceil(WORKGROUP_SIZE);
            pass.dispatch_workgroups(workgroups, workgroups, 1);
        }

        self.state.swap();
        self.steps += 1;
    }

    /// Index (0 = A, 1 = B) of the texture holding the latest state.
    pub fn current_index(&self) -> usize {
        self.state.current_index()
    }

    /// Both state textures, A first.
    pub fn state_views(&self) -> [&wgpu::TextureView; 2] {
        let (current, target) = (&self.state.current().view, &self.state.target().view);
        if self.state.current_index() == 0 {
            [current, target]
        } else {
            [target, current]
        }
    }

    pub fn grid(&self) -> GridSize {
        self.grid
    }

    pub fn particle_count(&self) -> usize {
        self.particle_count
    }

    pub fn step_count(&self) -> u64 {
        self.steps
    }
}

fn state_texture_entry(binding: u32) -> wgpu::BindGroupLayoutEntry {
    wgpu::BindGroupLayoutEntry {
        binding,
        visibility: wgpu::ShaderStages::COMPUTE,
        ty: wgpu::BindingType::Texture {
            sample_type: wgpu::TextureSampleType::Float { filterable: false },
            view_dimension: wgpu::TextureViewDimension::D2,
            multisampled: false,
        },
        count: None,
    }
}
