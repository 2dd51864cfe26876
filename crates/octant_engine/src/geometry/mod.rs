//! Geometric primitives and bounding volumes
//!
//! - [`AABB`] and [`Sphere`] are value types; every transform returns a new value
//! - [`Triangle`] and [`Ray`] carry the exact intersection tests used after
//!   the octree has narrowed down candidates
//! - [`Mesh`] is the geometry contract the scene core needs from the
//!   resource layer, with [`TriangleMesh`] as the in-memory implementation

mod aabb;
mod sphere;
mod triangle;
mod mesh;

pub use aabb::AABB;
pub use sphere::Sphere;
pub use triangle::{Ray, Triangle};
pub use mesh::{Mesh, TriangleMesh};
