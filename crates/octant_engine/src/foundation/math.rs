//! Math utilities and types
//!
//! Provides the vector, matrix and quaternion types shared by the scene
//! graph, the bounding volumes and the octree.

pub use nalgebra::{
    Vector3, Vector4,
    Matrix4,
    Quaternion,
    Unit,
};

/// 3D vector type
pub type Vec3 = Vector3<f32>;

/// 4D vector type
pub type Vec4 = Vector4<f32>;

/// 4x4 matrix type
pub type Mat4 = Matrix4<f32>;

/// 3D point type
pub type Point3 = nalgebra::Point3<f32>;

/// Raw (not necessarily normalized) quaternion.
///
/// Scene nodes and move components store rotations in this form because
/// the kinematic integrator advances the scalar part directly; the value is
/// normalized only when it is turned into a matrix.
pub type Quat = Quaternion<f32>;

/// Normalized quaternion
pub type UnitQuat = Unit<Quaternion<f32>>;

/// Identity rotation in raw quaternion form
pub fn quat_identity() -> Quat {
    Quat::identity()
}

/// Translation matrix
pub fn make_translation(translation: &Vec3) -> Mat4 {
    Mat4::new_translation(translation)
}

/// Non-uniform scale matrix
pub fn make_scale(scale: &Vec3) -> Mat4 {
    Mat4::new_nonuniform_scaling(scale)
}

/// Rotation matrix of a raw quaternion.
///
/// The quaternion is normalized first; a zero quaternion yields identity.
pub fn make_rotation(rotation: &Quat) -> Mat4 {
    if rotation.norm_squared() <= f32::EPSILON {
        return Mat4::identity();
    }
    UnitQuat::new_normalize(*rotation).to_homogeneous()
}

/// Quaternion rotating `angle` radians around `axis`
pub fn quat_from_axis_angle(axis: &Vec3, angle: f32) -> Quat {
    UnitQuat::from_axis_angle(&Unit::new_normalize(*axis), angle).into_inner()
}

/// Translation part of an affine matrix
pub fn translation_of(matrix: &Mat4) -> Vec3 {
    Vec3::new(matrix.m14, matrix.m24, matrix.m34)
}

/// Component-wise maximum of a vector
pub fn max_component(v: &Vec3) -> f32 {
    v.x.max(v.y).max(v.z)
}

/// Math constants
pub mod constants {
    /// Pi constant
    pub const PI: f32 = std::f32::consts::PI;

    /// Pi / 2
    pub const HALF_PI: f32 = PI * 0.5;

    /// Degrees to radians conversion factor
    pub const DEG_TO_RAD: f32 = PI / 180.0;
}

#[cfg(test)]
mod tests {
    use super::*;
    use approx::assert_relative_eq;

    #[test]
    fn test_rotation_normalizes_quaternion() {
        let q = quat_from_axis_angle(&Vec3::z(), constants::HALF_PI) * 3.0;
        let rotated = make_rotation(&q).transform_vector(&Vec3::x());
        assert_relative_eq!(rotated, Vec3::y(), epsilon = 1e-5);
    }

    #[test]
    fn test_zero_quaternion_is_identity() {
        let q = Quat::new(0.0, 0.0, 0.0, 0.0);
        assert_eq!(make_rotation(&q), Mat4::identity());
    }

    #[test]
    fn test_translation_roundtrip() {
        let t = Vec3::new(1.0, -2.0, 3.5);
        assert_eq!(translation_of(&make_translation(&t)), t);
    }
}
