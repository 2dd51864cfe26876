//! Kinematic movement component
//!
//! Integrates acceleration, velocity, rotation and scale with explicit
//! Euler steps and pushes the resulting local transform to its owner.

use crate::components::Component;
use crate::foundation::collections::ObjectKey;
use crate::foundation::math::{make_rotation, make_scale, make_translation, Mat4, Quat, Vec3};
use crate::scene::GameObject;

/// Initial motion of a [`MoveComponent`]
#[derive(Debug, Clone, Copy, PartialEq)]
pub struct MoveState {
    /// Orientation; `None` leaves the transform unrotated
    pub rotation: Option<Quat>,
    /// Added to the scalar part of the rotation each second
    pub rotation_speed: f32,
    /// Linear velocity in units per second
    pub velocity: Vec3,
    /// Starting location
    pub location: Vec3,
    /// Linear acceleration in units per second squared
    pub acceleration: Vec3,
    /// Starting scale
    pub scale: Vec3,
    /// Scale change per second
    pub scale_speed: Vec3,
}

impl Default for MoveState {
    fn default() -> Self {
        Self {
            rotation: None,
            rotation_speed: 0.0,
            velocity: Vec3::zeros(),
            location: Vec3::zeros(),
            acceleration: Vec3::zeros(),
            scale: Vec3::new(1.0, 1.0, 1.0),
            scale_speed: Vec3::zeros(),
        }
    }
}

/// Component for objects that move on their own
#[derive(Debug, Clone)]
pub struct MoveComponent {
    owner: Option<ObjectKey>,
    velocity: Vec3,
    acceleration: Vec3,
    rotation: Quat,
    has_rotation: bool,
    rotation_speed: f32,
    location: Vec3,
    scale: Vec3,
    scale_speed: Vec3,
}

impl MoveComponent {
    /// Stationary component at the origin with unit scale
    pub fn new() -> Self {
        Self::with_motion(MoveState::default())
    }

    /// Component starting from the given motion
    pub fn with_motion(state: MoveState) -> Self {
        Self {
            owner: None,
            velocity: state.velocity,
            acceleration: state.acceleration,
            rotation: state.rotation.unwrap_or_else(Quat::identity),
            has_rotation: state.rotation.is_some(),
            rotation_speed: state.rotation_speed,
            location: state.location,
            scale: state.scale,
            scale_speed: state.scale_speed,
        }
    }

    /// Handle of the object this component is bound to
    pub fn owner(&self) -> Option<ObjectKey> {
        self.owner
    }

    /// Local transform: translation, then rotation (if set), then scale
    pub fn transform(&self) -> Mat4 {
        let mut transform = make_translation(&self.location);
        if self.has_rotation {
            transform *= make_rotation(&self.rotation);
        }
        transform * make_scale(&self.scale)
    }

    /// Linear velocity
    pub fn velocity(&self) -> Vec3 {
        self.velocity
    }

    /// Linear acceleration
    pub fn acceleration(&self) -> Vec3 {
        self.acceleration
    }

    /// Current orientation (raw quaternion)
    pub fn rotation(&self) -> Quat {
        self.rotation
    }

    /// Integrated location
    pub fn location(&self) -> Vec3 {
        self.location
    }

    /// Scalar rotation speed
    pub fn rotation_speed(&self) -> f32 {
        self.rotation_speed
    }

    /// Current scale
    pub fn scale(&self) -> Vec3 {
        self.scale
    }

    /// Scale change per second
    pub fn scale_speed(&self) -> Vec3 {
        self.scale_speed
    }

    /// Set linear velocity
    pub fn set_velocity(&mut self, velocity: Vec3) {
        self.velocity = velocity;
    }

    /// Set linear acceleration
    pub fn set_acceleration(&mut self, acceleration: Vec3) {
        self.acceleration = acceleration;
    }

    /// Teleport to a location
    pub fn set_location(&mut self, location: Vec3) {
        self.location = location;
    }

    /// Set scalar rotation speed
    pub fn set_rotation_speed(&mut self, speed: f32) {
        self.rotation_speed = speed;
    }

    /// Set scale
    pub fn set_scale(&mut self, scale: Vec3) {
        self.scale = scale;
    }

    /// Set scale change per second
    pub fn set_scale_speed(&mut self, speed: Vec3) {
        self.scale_speed = speed;
    }

    /// Replace the orientation
    pub fn set_rotation(&mut self, rotation: Quat) {
        self.rotation = rotation;
        self.has_rotation = true;
    }

    /// Apply `delta` on top of the current orientation (`delta * rotation`)
    pub fn update_rotation(&mut self, delta: Quat) {
        let rotation = if self.has_rotation { delta * self.rotation } else { delta };
        self.set_rotation(rotation);
    }
}

impl Default for MoveComponent {
    fn default() -> Self {
        Self::new()
    }
}

impl Component for MoveComponent {
    fn bind(&mut self, owner: &GameObject) {
        self.owner = Some(owner.key());
    }

    fn update(&mut self, owner: &mut GameObject, dt: f32) {
        self.velocity += self.acceleration * dt;
        self.location += self.velocity * dt;
        self.rotation.w += self.rotation_speed * dt;
        self.scale += self.scale_speed * dt;

        owner.move_to(self.transform());
    }
}
