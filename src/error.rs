//! Error types for flowfield.
//!
//! Everything here is a startup failure. Once the first frame has been
//! scheduled the per-frame tick has no fallible inputs; out-of-range tweak
//! values are clamped and logged instead of being reported as errors.

use std::path::PathBuf;

use thiserror::Error;

/// The model could not be turned into particles.
#[derive(Debug, Error)]
pub enum AssetLoadError {
    /// Failed to read the model file from disk.
    #[error("failed to read model '{}': {source}", path.display())]
    Io {
        path: PathBuf,
        #[source]
        source: std::io::Error,
    },
    /// The glTF document or one of its buffers is malformed.
    #[error("failed to parse glTF: {0}")]
    Gltf(#[from] gltf::Error),
    /// The document contains no mesh primitives at all.
    #[error("model contains no meshes")]
    NoMeshes,
    /// A primitive has no POSITION attribute.
    #[error("mesh '{mesh}' has a primitive without positions")]
    MissingPositions { mesh: String },
    /// The mesh was loaded but has zero vertices.
    #[error("model has no vertices to seed particles from")]
    Empty,
}

/// A WGSL program failed to build or link.
#[derive(Debug, Error)]
#[error("{program} program failed to compile: {message}")]
pub struct CompiledProgramError {
    /// Which program failed ("simulation step" or "particles").
    pub program: &'static str,
    /// Validation message reported by the backend.
    pub message: String,
}

/// Errors that can occur during GPU initialization.
#[derive(Debug, Error)]
pub enum GpuError {
    /// Failed to create a surface for rendering.
    #[error("failed to create GPU surface: {0}")]
    SurfaceCreation(#[from] wgpu::CreateSurfaceError),
    /// No compatible GPU adapter found.
    #[error("no compatible GPU adapter found; a Vulkan, Metal, DX12 or WebGPU capable device is required")]
    NoAdapter,
    /// Failed to create GPU device.
    #[error("failed to create GPU device: {0}")]
    DeviceCreation(#[from] wgpu::RequestDeviceError),
    /// A shader program did not compile.
    #[error(transparent)]
    Program(#[from] CompiledProgramError),
}

/// Errors that prevent a session from starting.
#[derive(Debug, Error)]
pub enum SessionError {
    /// The model could not be loaded.
    #[error(transparent)]
    Asset(#[from] AssetLoadError),
    /// GPU initialization failed.
    #[error("GPU error: {0}")]
    Gpu(#[from] GpuError),
    /// Failed to create event loop.
    #[error("failed to create event loop: {0}")]
    EventLoop(#[from] winit::error::EventLoopError),
    /// Failed to create window.
    #[error("failed to create window: {0}")]
    Window(#[from] winit::error::OsError),
    /// The settings file could not be read or parsed.
    #[error("invalid settings: {0}")]
    Config(#[from] ConfigError),
}

/// Errors from reading a settings file.
#[derive(Debug, Error)]
pub enum ConfigError {
    #[error("failed to read '{}': {source}", path.display())]
    Io {
        path: PathBuf,
        #[source]
        source: std::io::Error,
    },
    #[error("failed to parse settings: {0}")]
    Parse(#[from] serde_json::Error),
}
