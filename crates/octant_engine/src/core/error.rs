//! Engine error taxonomy
//!
//! Every failure in the scene core is a caller or precondition error. None
//! of them are transient, so nothing here is retried.

use thiserror::Error;

use crate::core::config::ConfigError;
use crate::foundation::collections::ObjectKey;
use crate::foundation::math::Vec3;

/// Result alias used across the crate
pub type EngineResult<T> = Result<T, EngineError>;

/// Engine errors
#[derive(Error, Debug)]
pub enum EngineError {
    /// Octree region with a zero, negative or non-finite half extent
    #[error("degenerate octree bounds: half extent {half_extent:?} encloses no volume")]
    DegenerateBounds {
        /// Offending half extent
        half_extent: Vec3,
    },

    /// Mesh without triangles where geometry is required
    #[error("mesh contains no triangles")]
    EmptyMesh,

    /// Index buffer referencing a vertex that does not exist
    #[error("mesh index {index} out of range for {vertex_count} vertices")]
    InvalidIndex {
        /// Offending index
        index: u32,
        /// Number of vertices supplied
        vertex_count: usize,
    },

    /// Bounds or octree requested from an object that has no mesh
    #[error("game object {id} has no geometry")]
    MissingGeometry {
        /// Id of the object
        id: u32,
    },

    /// Handle not (or no longer) present in the scene
    #[error("unknown scene object {0:?}")]
    UnknownObject(ObjectKey),

    /// Re-parenting that would make a node its own ancestor
    #[error("attaching {child:?} below {parent:?} would create a cycle")]
    HierarchyCycle {
        /// Prospective parent
        parent: ObjectKey,
        /// Node being attached
        child: ObjectKey,
    },

    /// Configuration failure
    #[error("configuration error: {0}")]
    Config(#[from] ConfigError),
}
