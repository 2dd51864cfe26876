//! Mesh geometry contract
//!
//! The scene core never loads or uploads meshes. It only needs triangles in
//! mesh space plus the mesh-space bounds, which is what [`Mesh`] exposes.

use std::fmt;

use crate::core::error::{EngineError, EngineResult};
use crate::foundation::math::Vec3;
use super::{Sphere, Triangle, AABB};

/// Geometry a scene node needs from a mesh resource
pub trait Mesh: fmt::Debug + Send + Sync {
    /// Triangles in mesh space, in index-buffer order
    fn triangles(&self) -> &[Triangle];

    /// Mesh-space bounding box
    fn aabb(&self) -> AABB;

    /// Mesh-space bounding sphere
    fn sphere(&self) -> Sphere;
}

/// In-memory triangle soup with precomputed bounds
#[derive(Debug, Clone)]
pub struct TriangleMesh {
    triangles: Vec<Triangle>,
    aabb: AABB,
    sphere: Sphere,
}

impl TriangleMesh {
    /// Build a mesh from triangles. Fails on an empty list.
    pub fn from_triangles(triangles: Vec<Triangle>) -> EngineResult<Self> {
        let aabb = AABB::from_points(triangles.iter().flat_map(Triangle::vertices))
            .ok_or(EngineError::EmptyMesh)?;

        let center = aabb.center();
        let radius = triangles
            .iter()
            .flat_map(Triangle::vertices)
            .map(|v| (v - center).magnitude())
            .fold(0.0f32, f32::max);

        Ok(Self {
            triangles,
            aabb,
            sphere: Sphere::new(center, radius),
        })
    }

    /// Build a mesh from a vertex list and a triangle index buffer.
    ///
    /// A trailing partial triangle in `indices` is ignored.
    pub fn from_vertices(vertices: &[Vec3], indices: &[u32]) -> EngineResult<Self> {
        let vertex = |index: u32| {
            vertices
                .get(index as usize)
                .copied()
                .ok_or(EngineError::InvalidIndex { index, vertex_count: vertices.len() })
        };

        let triangles = indices
            .chunks_exact(3)
            .map(|chunk| Ok(Triangle::new(vertex(chunk[0])?, vertex(chunk[1])?, vertex(chunk[2])?)))
            .collect::<EngineResult<Vec<_>>>()?;

        Self::from_triangles(triangles)
    }

    /// Axis-aligned box of the given half extents around the origin, 12 triangles
    pub fn cuboid(half_extents: Vec3) -> EngineResult<Self> {
        let aabb = AABB::from_center_extents(Vec3::zeros(), half_extents);
        let c = aabb.corners();
        let indices: [u32; 36] = [
            0, 2, 1,  1, 2, 3, // -z
            4, 5, 6,  5, 7, 6, // +z
            0, 1, 4,  1, 5, 4, // -y
            2, 6, 3,  3, 6, 7, // +y
            0, 4, 2,  2, 4, 6, // -x
            1, 3, 5,  3, 7, 5, // +x
        ];
        Self::from_vertices(&c, &indices)
    }
}

impl Mesh for TriangleMesh {
    fn triangles(&self) -> &[Triangle] {
        &self.triangles
    }

    fn aabb(&self) -> AABB {
        self.aabb
    }

    fn sphere(&self) -> Sphere {
        self.sphere
    }
}
