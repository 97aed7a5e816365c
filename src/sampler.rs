//! Geometry sampling: one particle per mesh vertex.
//!
//! Each vertex becomes a texel in a square `N×N` grid, `N = ceil(sqrt(V))`,
//! filled in row-major order. The grid is the shape of the simulation state
//! textures; the texel coordinate assigned here identifies the particle for
//! the rest of the session.

use glam::Vec3;
use rand::Rng;

use crate::error::AssetLoadError;
use crate::loader::MeshData;

/// Side length of the square simulation grid.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct GridSize {
    side: u32,
}

impl GridSize {
    /// Smallest square grid holding `count` texels.
    pub fn for_count(count: usize) -> Self {
        let mut side = (count as f64).sqrt().ceil() as u64;
        // Guard against float rounding on either side of a perfect square.
        while side * side < count as u64 {
            side += 1;
        }
        while side > 0 && (side - 1) * (side - 1) >= count as u64 {
            side -= 1;
        }
        Self { side: side as u32 }
    }

    /// Number of texels along one edge.
    #[inline]
    pub fn side(&self) -> u32 {
        self.side
    }

    /// Total number of texels (`side²`).
    #[inline]
    pub fn texel_count(&self) -> usize {
        (self.side as usize) * (self.side as usize)
    }

    /// Texel coordinate `(x, y)` of linear index `i`.
    #[inline]
    pub fn coord(&self, i: usize) -> (u32, u32) {
        let side = self.side as usize;
        ((i % side) as u32, (i / side) as u32)
    }

    /// Linear index of texel `(x, y)`.
    #[inline]
    pub fn index(&self, x: u32, y: u32) -> usize {
        y as usize * self.side as usize + x as usize
    }

    /// Normalized texture coordinate of the center of texel `i`.
    pub fn uv(&self, i: usize) -> [f32; 2] {
        let (x, y) = self.coord(i);
        let side = self.side as f32;
        [(x as f32 + 0.5) / side, (y as f32 + 0.5) / side]
    }
}

/// Buffers produced once at startup from the source mesh.
#[derive(Debug, Clone)]
pub struct ParticleGeometry {
    /// Grid the particles are laid out on.
    pub grid: GridSize,
    /// Number of real particles (`V`). Texels past this are padding.
    pub count: usize,
    /// `N²` texels of `(x, y, z, life)`; padding texels are zero.
    pub base: Vec<[f32; 4]>,
    /// Per-particle texture coordinate into the state textures.
    pub uvs: Vec<[f32; 2]>,
    /// Per-particle size factor in `[0, 1)`.
    pub sizes: Vec<f32>,
    /// Per-particle color.
    pub colors: Vec<[f32; 3]>,
}

impl ParticleGeometry {
    /// Base position of particle `i`.
    pub fn base_position(&self, i: usize) -> Vec3 {
        let [x, y, z, _] = self.base[i];
        Vec3::new(x, y, z)
    }
}

/// Default particle color when the mesh has no vertex colors.
pub const DEFAULT_COLOR: [f32; 3] = [1.0, 1.0, 1.0];

/// Pack a mesh into simulation-ready particle buffers.
///
/// Initial life values and size factors are drawn uniformly from `[0, 1)`
/// so particles do not all respawn on the same frame.
pub fn sample_geometry<R: Rng + ?Sized>(
    mesh: &MeshData,
    rng: &mut R,
) -> Result<ParticleGeometry, AssetLoadError> {
    let count = mesh.vertex_count();
    if count == 0 {
        return Err(AssetLoadError::Empty);
    }

    let grid = GridSize::for_count(count);
    let mut base = vec![[0.0f32; 4]; grid.texel_count()];
    for (texel, position) in base.iter_mut().zip(&mesh.positions) {
        *texel = [position.x, position.y, position.z, rng.gen::<f32>()];
    }

    let uvs = (0..count).map(|i| grid.uv(i)).collect();
    let sizes = (0..count).map(|_| rng.gen::<f32>()).collect();
    // `colors` is public, so its length is not guaranteed to match
    let mut colors: Vec<[f32; 3]> = match &mesh.colors {
        Some(colors) => colors.iter().take(count).map(|c| c.to_array()).collect(),
        None => Vec::with_capacity(count),
    };
    if colors.len() < count {
        if mesh.colors.is_some() {
            log::warn!("Mesh has {} colors for {} vertices, padding with white", colors.len(), count);
        }
        colors.resize(count, DEFAULT_COLOR);
    }

    log::info!(
        "Sampled {} particles onto a {}x{} grid ({} padding texels)",
        count,
        grid.side(),
        grid.side(),
        grid.texel_count() - count
    );

    Ok(ParticleGeometry {
        grid,
        count,
        base,
        uvs,
        sizes,
        colors,
    })
}
