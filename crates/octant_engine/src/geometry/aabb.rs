//! Axis-aligned bounding box

use crate::foundation::math::{Mat4, Point3, Vec3};

/// Axis-Aligned Bounding Box for spatial queries
#[derive(Debug, Clone, Copy, PartialEq)]
pub struct AABB {
    /// Minimum corner of the bounding box
    pub min: Vec3,
    /// Maximum corner of the bounding box
    pub max: Vec3,
}

impl AABB {
    /// Create a new AABB from min and max points
    pub fn new(min: Vec3, max: Vec3) -> Self {
        Self { min, max }
    }

    /// Create an AABB centered at a point with given half extents
    pub fn from_center_extents(center: Vec3, extents: Vec3) -> Self {
        Self {
            min: center - extents,
            max: center + extents,
        }
    }

    /// Smallest box containing every point; `None` for an empty iterator
    pub fn from_points<I>(points: I) -> Option<Self>
    where
        I: IntoIterator<Item = Vec3>,
    {
        let mut points = points.into_iter();
        let first = points.next()?;
        Some(points.fold(Self::new(first, first), |aabb, p| aabb.expanded_to(p)))
    }

    /// Get the center of the AABB
    pub fn center(&self) -> Vec3 {
        (self.min + self.max) * 0.5
    }

    /// Get the extents (half-size) of the AABB
    pub fn extents(&self) -> Vec3 {
        (self.max - self.min) * 0.5
    }

    /// Eight corners, ordered by the same bit layout as octree octants
    pub fn corners(&self) -> [Vec3; 8] {
        let mut corners = [Vec3::zeros(); 8];
        for (i, corner) in corners.iter_mut().enumerate() {
            *corner = Vec3::new(
                if i & 1 == 0 { self.min.x } else { self.max.x },
                if i & 2 == 0 { self.min.y } else { self.max.y },
                if i & 4 == 0 { self.min.z } else { self.max.z },
            );
        }
        corners
    }

    /// Box grown to include `point`
    #[must_use]
    pub fn expanded_to(&self, point: Vec3) -> Self {
        Self {
            min: self.min.inf(&point),
            max: self.max.sup(&point),
        }
    }

    /// Smallest box containing both boxes
    #[must_use]
    pub fn union(&self, other: &AABB) -> Self {
        Self {
            min: self.min.inf(&other.min),
            max: self.max.sup(&other.max),
        }
    }

    /// Axis-aligned box conservatively containing this box after `matrix`.
    ///
    /// All eight corners are transformed and re-boxed, so rotations grow the
    /// result but never cut into the transformed geometry.
    #[must_use]
    pub fn transformed(&self, matrix: &Mat4) -> Self {
        let corners = self.corners();
        let first = matrix.transform_point(&Point3::from(corners[0])).coords;
        corners[1..].iter().fold(Self::new(first, first), |aabb, corner| {
            aabb.expanded_to(matrix.transform_point(&Point3::from(*corner)).coords)
        })
    }

    /// Check if this AABB contains a point
    pub fn contains_point(&self, point: Vec3) -> bool {
        point.x >= self.min.x && point.x <= self.max.x &&
        point.y >= self.min.y && point.y <= self.max.y &&
        point.z >= self.min.z && point.z <= self.max.z
    }

    /// Check if `other` lies completely inside this box
    pub fn contains_aabb(&self, other: &AABB) -> bool {
        self.contains_point(other.min) && self.contains_point(other.max)
    }

    /// Check if this AABB intersects another AABB
    pub fn intersects(&self, other: &AABB) -> bool {
        self.min.x <= other.max.x && self.max.x >= other.min.x &&
        self.min.y <= other.max.y && self.max.y >= other.min.y &&
        self.min.z <= other.max.z && self.max.z >= other.min.z
    }

    /// Closest point of the box to `point`
    pub fn closest_point(&self, point: Vec3) -> Vec3 {
        Vec3::new(
            point.x.clamp(self.min.x, self.max.x),
            point.y.clamp(self.min.y, self.max.y),
            point.z.clamp(self.min.z, self.max.z),
        )
    }

    /// Test ray intersection with this AABB using slab method
    /// Returns the distance to the entry point if the ray intersects, None otherwise.
    /// An axis the ray does not move along only has to contain the origin,
    /// so rays grazing a face still hit.
    pub fn intersect_ray(&self, ray_origin: Vec3, ray_dir: Vec3) -> Option<f32> {
        let mut t_enter = f32::NEG_INFINITY;
        let mut t_exit = f32::INFINITY;

        for axis in 0..3 {
            let (origin, dir) = (ray_origin[axis], ray_dir[axis]);
            let (min, max) = (self.min[axis], self.max[axis]);

            if dir == 0.0 {
                if origin < min || origin > max {
                    return None;
                }
                continue;
            }

            let inv = 1.0 / dir;
            let t1 = (min - origin) * inv;
            let t2 = (max - origin) * inv;
            t_enter = t_enter.max(t1.min(t2));
            t_exit = t_exit.min(t1.max(t2));
        }

        (t_exit >= t_enter && t_exit >= 0.0).then_some(t_enter.max(0.0))
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::foundation::math::{constants, make_rotation, make_translation, quat_from_axis_angle};
    use approx::assert_relative_eq;

    fn unit_box() -> AABB {
        AABB::new(Vec3::new(-1.0, -1.0, -1.0), Vec3::new(1.0, 1.0, 1.0))
    }

    #[test]
    fn test_aabb_contains_point() {
        let aabb = unit_box();

        assert!(aabb.contains_point(Vec3::zeros()));
        assert!(aabb.contains_point(Vec3::new(0.5, 0.5, 0.5)));
        assert!(!aabb.contains_point(Vec3::new(2.0, 0.0, 0.0)));
    }

    #[test]
    fn test_aabb_intersects() {
        let aabb1 = AABB::new(Vec3::new(0.0, 0.0, 0.0), Vec3::new(2.0, 2.0, 2.0));
        let aabb2 = AABB::new(Vec3::new(1.0, 1.0, 1.0), Vec3::new(3.0, 3.0, 3.0));
        let aabb3 = AABB::new(Vec3::new(5.0, 5.0, 5.0), Vec3::new(7.0, 7.0, 7.0));

        assert!(aabb1.intersects(&aabb2));
        assert!(!aabb1.intersects(&aabb3));
    }

    #[test]
    fn test_transform_translates_box() {
        let moved = unit_box().transformed(&make_translation(&Vec3::new(5.0, 0.0, 0.0)));
        assert_relative_eq!(moved.min, Vec3::new(4.0, -1.0, -1.0));
        assert_relative_eq!(moved.max, Vec3::new(6.0, 1.0, 1.0));
    }

    #[test]
    fn test_rotated_box_contains_rotated_corners() {
        let aabb = AABB::new(Vec3::new(-2.0, -1.0, -1.0), Vec3::new(2.0, 1.0, 1.0));
        let rotation = make_rotation(&quat_from_axis_angle(&Vec3::z(), constants::PI * 0.25));
        let rotated = aabb.transformed(&rotation);

        for corner in aabb.corners() {
            let p = rotation.transform_point(&Point3::from(corner)).coords;
            assert!(rotated.contains_point(p));
        }
        assert!(rotated.extents().y > aabb.extents().y);
    }

    #[test]
    fn test_from_points() {
        assert!(AABB::from_points(Vec::new()).is_none());
        let aabb = AABB::from_points([Vec3::new(1.0, 5.0, -1.0), Vec3::new(-3.0, 2.0, 4.0)]).unwrap();
        assert_eq!(aabb.min, Vec3::new(-3.0, 2.0, -1.0));
        assert_eq!(aabb.max, Vec3::new(1.0, 5.0, 4.0));
    }

    #[test]
    fn test_ray_hits_box() {
        let aabb = unit_box();
        let t = aabb.intersect_ray(Vec3::new(-5.0, 0.0, 0.0), Vec3::x()).unwrap();
        assert_relative_eq!(t, 4.0);
        assert!(aabb.intersect_ray(Vec3::new(-5.0, 3.0, 0.0), Vec3::x()).is_none());
    }

    #[test]
    fn test_ray_along_face_plane() {
        let aabb = unit_box();

        let t = aabb.intersect_ray(Vec3::new(-2.0, 1.0, 0.0), Vec3::x()).unwrap();
        assert_relative_eq!(t, 1.0);
        assert!(aabb.intersect_ray(Vec3::new(-2.0, 1.5, 0.0), Vec3::x()).is_none());

        let t = aabb.intersect_ray(Vec3::new(1.0, 1.0, 5.0), -Vec3::z()).unwrap();
        assert_relative_eq!(t, 4.0);
    }

    #[test]
    fn test_ray_starting_inside_box() {
        let t = unit_box().intersect_ray(Vec3::zeros(), Vec3::y()).unwrap();
        assert_relative_eq!(t, 0.0);
    }
}
