//! Bounding sphere

use crate::foundation::math::{max_component, Vec3};
use super::AABB;

/// A bounding sphere for collision detection
#[derive(Debug, Clone, Copy, PartialEq)]
pub struct Sphere {
    /// The center position of the sphere
    pub center: Vec3,
    /// The radius of the sphere
    pub radius: f32,
}

impl Sphere {
    /// Creates a new bounding sphere with the given center and radius
    pub fn new(center: Vec3, radius: f32) -> Self {
        Self { center, radius }
    }

    /// Sphere moved by `translation` and grown by the largest axis of `scale`.
    ///
    /// Non-uniform scale always takes the maximum axis, so the result may be
    /// larger than the tight bound but never smaller.
    #[must_use]
    pub fn transformed(&self, translation: Vec3, scale: Vec3) -> Self {
        Self {
            center: self.center + translation,
            radius: max_component(&scale) * self.radius,
        }
    }

    /// Check if this sphere intersects with another
    pub fn intersects(&self, other: &Sphere) -> bool {
        let distance_squared = (self.center - other.center).magnitude_squared();
        let radius_sum = self.radius + other.radius;
        distance_squared <= radius_sum * radius_sum
    }

    /// Check if `other` lies completely inside this sphere
    pub fn contains_sphere(&self, other: &Sphere) -> bool {
        const TOLERANCE: f32 = 1e-5;
        (self.center - other.center).magnitude() + other.radius <= self.radius + TOLERANCE
    }

    /// Check if this sphere touches an axis-aligned box
    pub fn intersects_aabb(&self, aabb: &AABB) -> bool {
        let closest = aabb.closest_point(self.center);
        (closest - self.center).magnitude_squared() <= self.radius * self.radius
    }

    /// Box enclosing the sphere
    pub fn bounding_box(&self) -> AABB {
        AABB::from_center_extents(self.center, Vec3::repeat(self.radius))
    }
}
