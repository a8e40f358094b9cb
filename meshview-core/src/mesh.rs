//! Mesh management module.
//!
//! This module defines the [`Mesh`] struct, CPU-side geometry plus the [`Material`] it is
//! drawn with, and the GPU buffers it is uploaded into. Vertices use the interleaved
//! [`Vertex`] layout.

use glam::{Vec2, Vec3};

use crate::{
    gpu::{Gpu, GpuError, MeshBuffers},
    material::Material,
};

/// An interleaved vertex: position, normal and texture coordinate.
///
/// Attribute locations are 0, 1 and 2 respectively.
#[repr(C)]
#[derive(Clone, Copy, Debug, Default, PartialEq)]
pub struct Vertex {
    pub position: [f32; 3],
    pub normal: [f32; 3],
    pub uv: [f32; 2],
}

impl Vertex {
    /// Size of one vertex in bytes.
    pub const STRIDE: usize = std::mem::size_of::<Vertex>();

    pub fn new(position: Vec3, normal: Vec3, uv: Vec2) -> Self {
        Self {
            position: position.to_array(),
            normal: normal.to_array(),
            uv: uv.to_array(),
        }
    }
}

/// Computes smooth per-vertex normals by accumulating face normals of indexed triangles.
///
/// Vertices not referenced by any triangle get a zero normal.
pub fn compute_normals(positions: &[Vec3], indices: &[u32]) -> Vec<Vec3> {
    let mut normals = vec![Vec3::ZERO; positions.len()];
    for tri in indices.chunks_exact(3) {
        let [a, b, c] = [tri[0] as usize, tri[1] as usize, tri[2] as usize];
        if a >= positions.len() || b >= positions.len() || c >= positions.len() {
            continue;
        }
        let face = (positions[b] - positions[a]).cross(positions[c] - positions[a]);
        normals[a] += face;
        normals[b] += face;
        normals[c] += face;
    }
    normals.iter().map(|n| n.normalize_or_zero()).collect()
}

/// Represents an indexed triangle mesh.
///
/// Geometry is immutable after construction; only the GPU buffers come and go.
pub struct Mesh {
    name: String,
    vertices: Vec<Vertex>,
    indices: Vec<u32>,
    material: Material,
    buffers: Option<MeshBuffers>,
}

impl Mesh {
    /// Creates a mesh that is not yet on the GPU.
    pub fn new(
        name: impl Into<String>,
        vertices: Vec<Vertex>,
        indices: Vec<u32>,
        material: Material,
    ) -> Self {
        Self {
            name: name.into(),
            vertices,
            indices,
            material,
            buffers: None,
        }
    }

    pub fn name(&self) -> &str {
        &self.name
    }

    pub fn material(&self) -> &Material {
        &self.material
    }

    pub fn vertices(&self) -> &[Vertex] {
        &self.vertices
    }

    pub fn indices(&self) -> &[u32] {
        &self.indices
    }

    /// Returns the amount of indices used in the mesh.
    pub fn index_count(&self) -> usize {
        self.indices.len()
    }

    pub fn is_uploaded(&self) -> bool {
        self.buffers.is_some()
    }

    /// Uploads the geometry. Does nothing if it is already uploaded.
    pub fn upload(&mut self, gpu: &dyn Gpu) -> Result<(), GpuError> {
        if self.buffers.is_none() {
            self.buffers = Some(gpu.create_mesh_buffers(&self.vertices, &self.indices)?);
        }
        Ok(())
    }

    /// Deletes the GPU buffers, if any.
    pub fn release(&mut self, gpu: &dyn Gpu) {
        if let Some(buffers) = self.buffers.take() {
            gpu.delete_mesh_buffers(buffers);
        }
    }

    /// Issues the draw call with whatever program and uniforms are currently bound.
    ///
    /// Returns `false` without drawing when the mesh is not uploaded.
    pub fn draw(&self, gpu: &dyn Gpu) -> bool {
        match &self.buffers {
            Some(buffers) => {
                gpu.draw_elements(buffers, self.indices.len());
                true
            }
            None => false,
        }
    }
}
