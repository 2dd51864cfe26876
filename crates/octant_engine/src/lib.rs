//! # Octant Engine
//!
//! Scene core of a small 3D game engine: a hierarchy of game objects with
//! transform propagation, triangle octrees over collider meshes, and
//! components that react to frame updates and collision phases.
//!
//! ## Features
//!
//! - **Scene graph**: arena of [`GameObject`](scene::GameObject)s with parent handles
//! - **Spatial index**: static triangle [`Octree`](spatial::Octree) per collider
//! - **Bounding volumes**: transform-aware [`AABB`](geometry::AABB) and [`Sphere`](geometry::Sphere)
//! - **Components**: per-frame behaviours and collision callbacks
//! - **Collision driver**: before/during/after dispatch over scene roots
//!
//! ## Quick Start
//!
//! ```rust,no_run
//! use std::sync::Arc;
//! use octant_engine::prelude::*;
//!
//! fn main() -> Result<(), EngineError> {
//!     let mut scene = Scene::new();
//!     let cube: Arc<dyn Mesh> = Arc::new(TriangleMesh::cuboid(Vec3::new(1.0, 1.0, 1.0))?);
//!
//!     let body = scene.spawn(cube, None)?;
//!     if let Some(object) = scene.get_mut(body) {
//!         object.add_component(MoveComponent::with_motion(MoveState {
//!             velocity: Vec3::new(1.0, 0.0, 0.0),
//!             ..MoveState::default()
//!         }));
//!     }
//!
//!     let mut collisions = CollisionSystem::new();
//!     scene.update(1.0 / 60.0)?;
//!     collisions.detect(&mut scene)?;
//!     Ok(())
//! }
//! ```

#![warn(missing_docs)]
#![warn(clippy::all, clippy::pedantic, clippy::nursery)]
#![allow(clippy::module_name_repetitions, clippy::similar_names, clippy::too_many_arguments)]

pub mod core;
pub mod foundation;

pub mod components;
pub mod geometry;
pub mod physics;
pub mod scene;
pub mod spatial;

/// Common imports for engine users
pub mod prelude {
    pub use crate::{
        components::{Component, EventType, MoveComponent, MoveState, RenderComponent, ShaderProgramHandle},
        core::{Config, EngineConfig, EngineError, EngineResult},
        foundation::{
            collections::ObjectKey,
            math::{Mat4, Quat, Vec3},
            time::{Stopwatch, Timer},
        },
        geometry::{Mesh, Ray, Sphere, Triangle, TriangleMesh, AABB},
        physics::{CollisionConfig, CollisionSystem, TypeIdentifier},
        scene::{CollisionPartner, GameObject, Scene},
        spatial::{Octree, OctreeConfig},
    };
}
