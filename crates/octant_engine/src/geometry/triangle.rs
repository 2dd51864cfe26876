//! Triangles and rays with their exact intersection tests

use crate::foundation::math::{Mat4, Point3, Vec3};
use super::AABB;

/// A ray for ray casting and picking
#[derive(Debug, Clone, Copy)]
pub struct Ray {
    /// The origin point of the ray
    pub origin: Vec3,
    /// The direction of the ray (normalized)
    pub direction: Vec3,
}

impl Ray {
    /// Creates a new ray with the given origin and direction
    pub fn new(origin: Vec3, direction: Vec3) -> Self {
        Self {
            origin,
            direction: direction.normalize(),
        }
    }

    /// Get a point along the ray at distance t
    pub fn point_at(&self, t: f32) -> Vec3 {
        self.origin + self.direction * t
    }
}

/// A triangle of a collider mesh
#[derive(Debug, Clone, Copy, PartialEq)]
pub struct Triangle {
    /// First vertex
    pub v0: Vec3,
    /// Second vertex
    pub v1: Vec3,
    /// Third vertex
    pub v2: Vec3,
}

impl Triangle {
    /// Creates a new triangle
    pub fn new(v0: Vec3, v1: Vec3, v2: Vec3) -> Self {
        Self { v0, v1, v2 }
    }

    /// Vertices in winding order
    pub fn vertices(&self) -> [Vec3; 3] {
        [self.v0, self.v1, self.v2]
    }

    /// Calculates the normal of the triangle (right-hand rule)
    pub fn normal(&self) -> Vec3 {
        self.scaled_normal().normalize()
    }

    fn scaled_normal(&self) -> Vec3 {
        (self.v1 - self.v0).cross(&(self.v2 - self.v0))
    }

    /// Calculates the centroid (center point) of the triangle
    pub fn centroid(&self) -> Vec3 {
        (self.v0 + self.v1 + self.v2) / 3.0
    }

    /// Tight axis-aligned box around the three vertices
    pub fn aabb(&self) -> AABB {
        AABB::new(
            self.v0.inf(&self.v1).inf(&self.v2),
            self.v0.sup(&self.v1).sup(&self.v2),
        )
    }

    /// Triangle with every vertex mapped through `matrix`
    #[must_use]
    pub fn transformed(&self, matrix: &Mat4) -> Self {
        let map = |v: Vec3| matrix.transform_point(&Point3::from(v)).coords;
        Self::new(map(self.v0), map(self.v1), map(self.v2))
    }

    /// Möller-Trumbore ray-triangle intersection algorithm
    /// Returns (t, u, v) barycentric coordinates if hit, None otherwise
    pub fn intersect_ray(&self, ray: &Ray) -> Option<(f32, f32, f32)> {
        const EPSILON: f32 = 0.000_001;

        let edge1 = self.v1 - self.v0;
        let edge2 = self.v2 - self.v0;

        let h = ray.direction.cross(&edge2);
        let a = edge1.dot(&h);

        // Ray parallel to triangle
        if a.abs() < EPSILON {
            return None;
        }

        let f = 1.0 / a;
        let s = ray.origin - self.v0;
        let u = f * s.dot(&h);
        if !(0.0..=1.0).contains(&u) {
            return None;
        }

        let q = s.cross(&edge1);
        let v = f * ray.direction.dot(&q);
        if v < 0.0 || u + v > 1.0 {
            return None;
        }

        let t = f * edge2.dot(&q);
        if t >= 0.0 {
            Some((t, u, v))
        } else {
            None
        }
    }

    /// Test if this triangle intersects another triangle
    ///
    /// Separating Axis Theorem over both face normals and the nine edge-edge
    /// cross products. Coplanar triangles are tested on the six in-plane
    /// edge normals instead, since every cross product is parallel to the
    /// shared normal there. Degenerate axes are skipped.
    pub fn intersects_triangle(&self, other: &Triangle) -> bool {
        const EPSILON: f32 = 0.000_001;

        fn project(tri: &Triangle, axis: Vec3) -> (f32, f32) {
            let p0 = axis.dot(&tri.v0);
            let p1 = axis.dot(&tri.v1);
            let p2 = axis.dot(&tri.v2);
            (p0.min(p1).min(p2), p0.max(p1).max(p2))
        }

        fn overlaps_on(a: &Triangle, b: &Triangle, axis: Vec3) -> bool {
            if axis.magnitude_squared() < EPSILON * EPSILON {
                return true;
            }
            let (min_a, max_a) = project(a, axis);
            let (min_b, max_b) = project(b, axis);
            max_a >= min_b && max_b >= min_a
        }

        let normal_a = self.scaled_normal();
        let normal_b = other.scaled_normal();
        if !overlaps_on(self, other, normal_a) || !overlaps_on(self, other, normal_b) {
            return false;
        }

        let edges_a = [self.v1 - self.v0, self.v2 - self.v1, self.v0 - self.v2];
        let edges_b = [other.v1 - other.v0, other.v2 - other.v1, other.v0 - other.v2];

        // Parallel normals that overlap on the normal axis mean a shared plane
        let parallel = normal_a.cross(&normal_b).magnitude_squared()
            <= EPSILON * normal_a.magnitude_squared() * normal_b.magnitude_squared();
        if parallel {
            return edges_a
                .iter()
                .map(|edge| normal_a.cross(edge))
                .chain(edges_b.iter().map(|edge| normal_b.cross(edge)))
                .all(|axis| overlaps_on(self, other, axis));
        }

        edges_a.iter().all(|edge_a| {
            edges_b
                .iter()
                .all(|edge_b| overlaps_on(self, other, edge_a.cross(edge_b)))
        })
    }
}
