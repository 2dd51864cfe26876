//! Physics module for collision detection
//!
//! Provides collision group tags and the driver that turns scene bounds and
//! collider octrees into collision events.

pub mod collision_layers;
pub mod collision_system;

pub use collision_layers::TypeIdentifier;
pub use collision_system::{CollisionConfig, CollisionPair, CollisionReport, CollisionSystem};
