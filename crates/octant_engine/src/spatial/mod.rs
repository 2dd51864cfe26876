//! Spatial partitioning data structures
//!
//! Provides the static triangle octree each collider mesh is indexed by.
//! Queries are conservative: they return every triangle that might touch
//! the query region, and exact tests happen afterwards.

mod octree;

pub use octree::{Octree, OctreeConfig, OctreeNode};
