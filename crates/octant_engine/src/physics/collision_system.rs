//! Collision detection driver
//!
//! Turns scene bounds and collider octrees into collision events. Every
//! frame the driver:
//!
//! 1. collects root objects that carry a collider and are still alive
//! 2. filters pairs by collision group, then by transformed box
//! 3. optionally confirms each pair with a triangle test over the octrees
//! 4. diffs the touching pairs against the previous frame and dispatches
//!    `BeforeCollision`, `DuringCollision` and `AfterCollision`
//!
//! Events go to both sides of a pair and reach each side's whole subtree
//! through [`Scene::call_event`].
//!
//! The broad phase uses transformed boxes rather than
//! [`GameObject::transformed_sphere`]: boxes follow the model matrix, so
//! objects moved by a [`MoveComponent`](crate::components::MoveComponent)
//! are tracked even though their relative location never changes.

use std::collections::HashSet;

use serde::{Deserialize, Serialize};

use crate::components::EventType;
use crate::core::error::EngineResult;
use crate::foundation::collections::ObjectKey;
use crate::geometry::AABB;
use crate::scene::{GameObject, Scene};

/// Collision driver settings
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(default)]
pub struct CollisionConfig {
    /// Confirm box overlaps with a triangle test over both octrees
    pub use_octree_narrow_phase: bool,
}

impl Default for CollisionConfig {
    fn default() -> Self {
        Self {
            use_octree_narrow_phase: true,
        }
    }
}

/// Unordered pair of touching objects, stored with the smaller key first
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, PartialOrd, Ord)]
pub struct CollisionPair {
    /// Smaller key
    pub object_a: ObjectKey,
    /// Larger key
    pub object_b: ObjectKey,
}

impl CollisionPair {
    /// Create a pair; argument order does not matter
    pub fn new(object_a: ObjectKey, object_b: ObjectKey) -> Self {
        if object_a <= object_b {
            Self { object_a, object_b }
        } else {
            Self { object_a: object_b, object_b: object_a }
        }
    }

    /// Whether `key` is one side of the pair
    pub fn contains(&self, key: ObjectKey) -> bool {
        self.object_a == key || self.object_b == key
    }
}

/// Pairs found by one [`CollisionSystem::detect`] call, each list sorted
#[derive(Debug, Clone, Default, PartialEq)]
pub struct CollisionReport {
    /// Pairs that started touching this frame
    pub entered: Vec<CollisionPair>,
    /// Every pair touching this frame, new ones included
    pub active: Vec<CollisionPair>,
    /// Pairs that touched last frame but not this one
    pub exited: Vec<CollisionPair>,
}

impl CollisionReport {
    /// Whether nothing touched and nothing separated
    pub fn is_empty(&self) -> bool {
        self.active.is_empty() && self.exited.is_empty()
    }
}

/// Broad phase plus optional narrow phase over the roots of a scene
#[derive(Debug, Default)]
pub struct CollisionSystem {
    config: CollisionConfig,

    /// Collision pairs from the current frame
    current_pairs: HashSet<CollisionPair>,

    /// Collision pairs from the previous frame
    previous_pairs: HashSet<CollisionPair>,
}

/// Per-frame data of one collider
struct Candidate {
    key: ObjectKey,
    aabb: AABB,
}

impl CollisionSystem {
    /// Driver with default settings
    pub fn new() -> Self {
        Self::default()
    }

    /// Driver with explicit settings
    pub fn with_config(config: CollisionConfig) -> Self {
        Self {
            config,
            ..Self::default()
        }
    }

    /// Current settings
    pub fn config(&self) -> &CollisionConfig {
        &self.config
    }

    /// Pairs touching as of the last [`detect`](Self::detect)
    pub fn current_collisions(&self) -> &HashSet<CollisionPair> {
        &self.current_pairs
    }

    /// Forget all contacts without sending `AfterCollision`
    pub fn clear(&mut self) {
        self.current_pairs.clear();
        self.previous_pairs.clear();
    }

    /// Find touching pairs and dispatch the collision phases for this frame.
    ///
    /// Transformed boxes are recomputed here, so world transforms should be
    /// current (call [`Scene::update`] first).
    pub fn detect(&mut self, scene: &mut Scene) -> EngineResult<CollisionReport> {
        std::mem::swap(&mut self.current_pairs, &mut self.previous_pairs);
        self.current_pairs.clear();

        let candidates = Self::collect_candidates(scene)?;
        for (i, a) in candidates.iter().enumerate() {
            for b in &candidates[i + 1..] {
                if self.touching(scene, a, b) {
                    self.current_pairs.insert(CollisionPair::new(a.key, b.key));
                }
            }
        }

        let mut report = CollisionReport {
            entered: self.current_pairs.difference(&self.previous_pairs).copied().collect(),
            active: self.current_pairs.iter().copied().collect(),
            exited: self
                .previous_pairs
                .difference(&self.current_pairs)
                .copied()
                .filter(|pair| scene.contains(pair.object_a) && scene.contains(pair.object_b))
                .collect(),
        };
        report.entered.sort_unstable();
        report.active.sort_unstable();
        report.exited.sort_unstable();

        if !report.is_empty() {
            log::trace!(
                "CollisionSystem: {} entered, {} active, {} exited",
                report.entered.len(),
                report.active.len(),
                report.exited.len()
            );
        }

        for pair in &report.entered {
            Self::dispatch(scene, pair, EventType::BeforeCollision)?;
        }
        for pair in &report.active {
            Self::dispatch(scene, pair, EventType::DuringCollision)?;
        }
        for pair in &report.exited {
            Self::dispatch(scene, pair, EventType::AfterCollision)?;
        }

        Ok(report)
    }

    fn collect_candidates(scene: &mut Scene) -> EngineResult<Vec<Candidate>> {
        let roots = scene.roots().to_vec();
        let mut candidates = Vec::with_capacity(roots.len());
        for key in roots {
            let Some(object) = scene.get_mut(key) else {
                continue;
            };
            if object.is_dirty() || object.octree().is_none() {
                continue;
            }
            candidates.push(Candidate {
                key,
                aabb: object.transformed_aabb()?,
            });
        }
        Ok(candidates)
    }

    fn touching(&self, scene: &Scene, a: &Candidate, b: &Candidate) -> bool {
        let (Some(object_a), Some(object_b)) = (scene.get(a.key), scene.get(b.key)) else {
            return false;
        };

        let allowed = object_a.collides_with(object_b.identifier()) || object_b.collides_with(object_a.identifier());
        if !allowed || !a.aabb.intersects(&b.aabb) {
            return false;
        }

        !self.config.use_octree_narrow_phase || Self::triangles_touch(object_a, object_b)
    }

    /// Exact test over the octree candidates of both colliders, done in the
    /// space of `a`'s collider mesh.
    fn triangles_touch(a: &GameObject, b: &GameObject) -> bool {
        let (Some(octree_a), Some(octree_b)) = (a.octree(), b.octree()) else {
            return false;
        };

        let Some(world_to_a) = a.model_matrix().try_inverse() else {
            log::warn!("CollisionSystem: object {} has a singular transform; keeping box result", a.id());
            return true;
        };
        let b_to_a = world_to_a * b.model_matrix();

        let candidates_a = octree_a.query_octree(octree_b, &b_to_a);
        if candidates_a.is_empty() {
            return false;
        }
        let candidates_b = match b.model_matrix().try_inverse() {
            Some(world_to_b) => octree_b.query_octree(octree_a, &(world_to_b * a.model_matrix())),
            None => octree_b.triangles().iter().collect(),
        };

        candidates_b.iter().any(|tri_b| {
            let tri_b = tri_b.transformed(&b_to_a);
            candidates_a.iter().any(|tri_a| tri_a.intersects_triangle(&tri_b))
        })
    }

    fn dispatch(scene: &mut Scene, pair: &CollisionPair, event: EventType) -> EngineResult<()> {
        let partner_a = scene.partner(pair.object_a)?;
        let partner_b = scene.partner(pair.object_b)?;
        scene.call_event(pair.object_a, event, &partner_b)?;
        scene.call_event(pair.object_b, event, &partner_a)
    }
}
