//! Collision event payload

use crate::foundation::collections::ObjectKey;
use crate::foundation::math::{Mat4, Vec3};
use crate::geometry::{Sphere, AABB};
use crate::physics::TypeIdentifier;

/// Read-only view of the other object in a collision.
///
/// Built by [`Scene::partner`](super::Scene::partner) right before events
/// are dispatched, so components can inspect the partner without borrowing
/// it while their own owner is mutably borrowed.
#[derive(Debug, Clone, Copy, PartialEq)]
pub struct CollisionPartner {
    /// Arena handle of the partner
    pub key: ObjectKey,
    /// Unique id of the partner
    pub id: u32,
    /// Collision group of the partner
    pub identifier: TypeIdentifier,
    /// World location composed from the partner's ancestors
    pub location: Vec3,
    /// World transform at snapshot time
    pub model_matrix: Mat4,
    /// Transformed bounding sphere, `None` without a mesh
    pub sphere: Option<Sphere>,
    /// Last transformed bounding box, `None` if never computed
    pub aabb: Option<AABB>,
    /// Whether the partner moves on its own
    pub dynamic: bool,
}
