//! Model loading.
//!
//! Reads a glTF or GLB document and flattens the primitives of its first mesh
//! into a single list of vertex positions and (optional) vertex colors. Only
//! vertex data matters for seeding particles, so indices, normals and
//! materials are ignored.

use std::path::Path;

use glam::Vec3;

use crate::error::AssetLoadError;

/// Per-vertex data extracted from a model.
#[derive(Debug, Clone, Default, PartialEq)]
pub struct MeshData {
    /// Vertex positions in model space.
    pub positions: Vec<Vec3>,
    /// Linear RGB vertex colors, one per position, if the model carries any.
    pub colors: Option<Vec<Vec3>>,
}

impl MeshData {
    /// Build mesh data from positions alone.
    pub fn from_positions(positions: Vec<Vec3>) -> Self {
        Self {
            positions,
            colors: None,
        }
    }

    /// Attach per-vertex colors. Extra colors are dropped and missing ones
    /// are white, so there is always one color per vertex.
    pub fn with_colors(mut self, mut colors: Vec<Vec3>) -> Self {
        colors.resize(self.positions.len(), Vec3::ONE);
        self.colors = Some(colors);
        self
    }

    /// Number of vertices.
    pub fn vertex_count(&self) -> usize {
        self.positions.len()
    }

    /// Load a `.gltf` or `.glb` file from disk.
    ///
    /// External buffers referenced by a `.gltf` file are resolved relative to
    /// the file's directory.
    pub fn load<P: AsRef<Path>>(path: P) -> Result<Self, AssetLoadError> {
        let path = path.as_ref();
        let (document, buffers, _images) = gltf::import(path).map_err(|e| match e {
            gltf::Error::Io(source) => AssetLoadError::Io {
                path: path.to_path_buf(),
                source,
            },
            other => AssetLoadError::Gltf(other),
        })?;

        let mesh = Self::from_document(&document, &buffers)?;
        log::info!(
            "Loaded '{}' ({} vertices, colors: {})",
            path.display(),
            mesh.vertex_count(),
            mesh.colors.is_some()
        );
        Ok(mesh)
    }

    /// Load a GLB blob or a self-contained glTF document from memory.
    pub fn from_slice(data: &[u8]) -> Result<Self, AssetLoadError> {
        let (document, buffers, _images) = gltf::import_slice(data)?;
        Self::from_document(&document, &buffers)
    }

    fn from_document(
        document: &gltf::Document,
        buffers: &[gltf::buffer::Data],
    ) -> Result<Self, AssetLoadError> {
        let mesh = document.meshes().next().ok_or(AssetLoadError::NoMeshes)?;
        let name = mesh.name().unwrap_or("Unnamed").to_string();

        let mut positions = Vec::new();
        let mut colors = Vec::new();
        let mut any_colors = false;

        for primitive in mesh.primitives() {
            let reader =
                primitive.reader(|buffer| buffers.get(buffer.index()).map(|data| data.0.as_slice()));

            let start = positions.len();
            match reader.read_positions() {
                Some(iter) => positions.extend(iter.map(Vec3::from)),
                None => return Err(AssetLoadError::MissingPositions { mesh: name }),
            }
            let added = positions.len() - start;

            // Primitives without colors are padded with white so indices stay aligned.
            match reader.read_colors(0) {
                Some(iter) => {
                    any_colors = true;
                    colors.extend(iter.into_rgb_f32().map(Vec3::from).take(added));
                    colors.resize(positions.len(), Vec3::ONE);
                }
                None => colors.resize(positions.len(), Vec3::ONE),
            }
        }

        if positions.is_empty() {
            return Err(AssetLoadError::Empty);
        }

        Ok(Self {
            positions,
            colors: any_colors.then_some(colors),
        })
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_missing_file_is_io_error() {
        let err = MeshData::load("does/not/exist.glb").unwrap_err();
        assert!(matches!(err, AssetLoadError::Io { .. }));
    }

    #[test]
    fn test_garbage_is_gltf_error() {
        let err = MeshData::from_slice(b"definitely not a model").unwrap_err();
        assert!(matches!(err, AssetLoadError::Gltf(_)));
    }

    #[test]
    fn test_with_colors() {
        let mesh = MeshData::from_positions(vec![Vec3::ZERO, Vec3::X])
            .with_colors(vec![Vec3::X, Vec3::Y]);
        assert_eq!(mesh.vertex_count(), 2);
        assert_eq!(mesh.colors.as_ref().map(Vec::len), Some(2));
    }

    #[test]
    fn test_with_colors_matches_vertex_count() {
        let short = MeshData::from_positions(vec![Vec3::ZERO, Vec3::X]).with_colors(vec![Vec3::Z]);
        assert_eq!(short.colors, Some(vec![Vec3::Z, Vec3::ONE]));

        let long = MeshData::from_positions(vec![Vec3::ZERO]).with_colors(vec![Vec3::X, Vec3::Y]);
        assert_eq!(long.colors, Some(vec![Vec3::X]));
    }
}
