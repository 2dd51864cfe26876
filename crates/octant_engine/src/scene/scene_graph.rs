//! Scene arena and frame traversal
//!
//! The [`Scene`] owns every [`GameObject`] in a slot map and walks the
//! hierarchy for updates, rendering and collision events. Nodes refer to
//! each other through [`ObjectKey`] handles only.

use std::sync::Arc;

use crate::components::{EventType, ShaderProgramHandle};
use crate::core::config::EngineConfig;
use crate::core::error::{EngineError, EngineResult};
use crate::foundation::collections::{HandleMap, IdAllocator, ObjectKey};
use crate::foundation::math::{make_rotation, make_scale, make_translation, Mat4, Quat, Vec3};
use crate::geometry::Mesh;
use crate::spatial::OctreeConfig;

use super::event::CollisionPartner;
use super::game_object::GameObject;

/// Owner of all scene nodes
#[derive(Debug, Default)]
pub struct Scene {
    objects: HandleMap<GameObject>,
    roots: Vec<ObjectKey>,
    ids: IdAllocator,
    octree_config: OctreeConfig,
}

impl Scene {
    /// Empty scene with default octree settings
    pub fn new() -> Self {
        Self::default()
    }

    /// Empty scene using the octree settings of `config`
    pub fn with_config(config: &EngineConfig) -> Self {
        Self {
            octree_config: config.octree,
            ..Self::default()
        }
    }

    // ---- construction ----------------------------------------------------

    /// Spawn a node without geometry
    pub fn spawn_empty(&mut self, parent: Option<ObjectKey>) -> EngineResult<ObjectKey> {
        self.insert(None, None, parent)
    }

    /// Spawn a node whose octree is built from its own mesh
    pub fn spawn(&mut self, mesh: Arc<dyn Mesh>, parent: Option<ObjectKey>) -> EngineResult<ObjectKey> {
        self.insert(Some(mesh), None, parent)
    }

    /// Spawn a node with a separate, usually simpler, collider mesh
    pub fn spawn_with_collider(
        &mut self,
        mesh: Arc<dyn Mesh>,
        collider_mesh: Arc<dyn Mesh>,
        parent: Option<ObjectKey>,
    ) -> EngineResult<ObjectKey> {
        self.insert(Some(mesh), Some(collider_mesh), parent)
    }

    fn insert(
        &mut self,
        mesh: Option<Arc<dyn Mesh>>,
        collider_mesh: Option<Arc<dyn Mesh>>,
        parent: Option<ObjectKey>,
    ) -> EngineResult<ObjectKey> {
        if let Some(parent) = parent {
            self.object(parent)?;
        }

        let id = self.ids.next_id();
        let config = self.octree_config;
        let key = self
            .objects
            .try_insert_with_key(|key| GameObject::new(key, id, mesh, collider_mesh, parent, config))?;

        match parent {
            Some(parent) => self.object_mut(parent)?.children.push(key),
            None => self.roots.push(key),
        }

        log::debug!("Scene: spawned object {} (parent {:?})", id, parent);
        Ok(key)
    }

    // ---- access ----------------------------------------------------------

    /// Node behind `key`, if still alive
    pub fn get(&self, key: ObjectKey) -> Option<&GameObject> {
        self.objects.get(key)
    }

    /// Mutable node behind `key`, if still alive
    pub fn get_mut(&mut self, key: ObjectKey) -> Option<&mut GameObject> {
        self.objects.get_mut(key)
    }

    fn object(&self, key: ObjectKey) -> EngineResult<&GameObject> {
        self.objects.get(key).ok_or(EngineError::UnknownObject(key))
    }

    fn object_mut(&mut self, key: ObjectKey) -> EngineResult<&mut GameObject> {
        self.objects.get_mut(key).ok_or(EngineError::UnknownObject(key))
    }

    /// Whether `key` refers to a live node
    pub fn contains(&self, key: ObjectKey) -> bool {
        self.objects.contains_key(key)
    }

    /// Number of live nodes
    pub fn len(&self) -> usize {
        self.objects.len()
    }

    /// Whether the scene has no nodes
    pub fn is_empty(&self) -> bool {
        self.objects.is_empty()
    }

    /// Nodes without a parent, in spawn order
    pub fn roots(&self) -> &[ObjectKey] {
        &self.roots
    }

    /// Iterate over every node in arena order
    pub fn iter(&self) -> impl Iterator<Item = (ObjectKey, &GameObject)> {
        self.objects.iter()
    }

    // ---- hierarchy -------------------------------------------------------

    /// Move `child` (and its subtree) below `parent`
    pub fn attach_child(&mut self, parent: ObjectKey, child: ObjectKey) -> EngineResult<()> {
        self.object(child)?;

        let mut cursor = Some(parent);
        while let Some(key) = cursor {
            if key == child {
                return Err(EngineError::HierarchyCycle { parent, child });
            }
            cursor = self.object(key)?.parent;
        }

        self.unlink(child);
        self.object_mut(parent)?.children.push(child);
        let node = self.object_mut(child)?;
        node.parent = Some(parent);
        node.changed = true;
        Ok(())
    }

    /// Turn `child` into a root, keeping its subtree
    pub fn detach(&mut self, child: ObjectKey) -> EngineResult<()> {
        self.object(child)?;
        self.unlink(child);
        let node = self.object_mut(child)?;
        node.parent = None;
        node.changed = true;
        self.roots.push(child);
        Ok(())
    }

    fn unlink(&mut self, key: ObjectKey) {
        let parent = self.objects.get(key).and_then(GameObject::parent);
        let siblings = match parent.and_then(|parent| self.objects.get_mut(parent)) {
            Some(parent) => &mut parent.children,
            None => &mut self.roots,
        };
        siblings.retain(|&sibling| sibling != key);
    }

    /// Deallocate `key` and its whole subtree. Returns the number of nodes removed.
    pub fn remove(&mut self, key: ObjectKey) -> EngineResult<usize> {
        self.object(key)?;
        self.unlink(key);

        let mut pending = vec![key];
        let mut removed = 0;
        while let Some(next) = pending.pop() {
            if let Some(object) = self.objects.remove(next) {
                pending.extend_from_slice(object.children());
                removed += 1;
            }
        }

        log::debug!("Scene: removed {} object(s)", removed);
        Ok(removed)
    }

    /// Deallocate every node flagged by [`GameObject::make_dirty`] together
    /// with its subtree. Returns the number of nodes removed.
    pub fn remove_dirty(&mut self) -> usize {
        let dirty: Vec<ObjectKey> = self
            .objects
            .iter()
            .filter(|(_, object)| object.is_dirty())
            .map(|(key, _)| key)
            .collect();

        dirty
            .into_iter()
            .filter_map(|key| self.remove(key).ok())
            .sum()
    }

    // ---- absolute transform ----------------------------------------------

    /// Relative location summed over the node and its ancestors
    pub fn absolute_location(&self, key: ObjectKey) -> EngineResult<Vec3> {
        self.fold_ancestors(key, Vec3::zeros(), |acc, object| acc + object.relative_location())
    }

    /// Rotation composed as `own * parent_absolute`
    pub fn absolute_rotation(&self, key: ObjectKey) -> EngineResult<Quat> {
        self.fold_ancestors(key, Quat::identity(), |acc, object| acc * object.relative_rotation())
    }

    /// Scale summed over the node and its ancestors.
    ///
    /// Composition is additive, so a unit-scaled child of a unit-scaled
    /// parent ends up with scale 2.
    pub fn absolute_scale(&self, key: ObjectKey) -> EngineResult<Vec3> {
        self.fold_ancestors(key, Vec3::zeros(), |acc, object| acc + object.relative_scale())
    }

    fn fold_ancestors<T, F>(&self, key: ObjectKey, init: T, mut f: F) -> EngineResult<T>
    where
        F: FnMut(T, &GameObject) -> T,
    {
        let mut acc = init;
        let mut cursor = Some(key);
        while let Some(key) = cursor {
            let object = self.object(key)?;
            acc = f(acc, object);
            cursor = object.parent;
        }
        Ok(acc)
    }

    fn world_transform(&self, key: ObjectKey) -> EngineResult<Mat4> {
        let object = self.object(key)?;
        let rotation = make_rotation(&self.absolute_rotation(key)?);
        let scale = make_scale(&self.absolute_scale(key)?);

        Ok(match object.parent {
            Some(parent) => {
                make_translation(&self.absolute_location(parent)?)
                    * rotation
                    * make_translation(&object.relative_location())
                    * scale
            }
            None => make_translation(&object.relative_location()) * rotation * scale,
        })
    }

    // ---- frame traversal -------------------------------------------------

    /// Update every root and, through them, the whole scene
    pub fn update(&mut self, dt: f32) -> EngineResult<()> {
        for root in self.roots.clone() {
            self.update_object(root, dt)?;
        }
        Ok(())
    }

    /// Run the components of `key`, rebuild its world transform if it
    /// changed, then mark every child changed and update it.
    pub fn update_object(&mut self, key: ObjectKey, dt: f32) -> EngineResult<()> {
        let object = self.object_mut(key)?;
        object.for_each_component(|component, owner| component.update(owner, dt));

        if object.changed {
            let model_matrix = self.world_transform(key)?;
            let object = self.object_mut(key)?;
            object.changed = false;
            object.move_to(model_matrix);
            log::trace!("Scene: rebuilt world transform of object {}", object.id());
        }

        let children = self.object(key)?.children.clone();
        for child in children {
            self.object_mut(child)?.changed = true;
            self.update_object(child, dt)?;
        }
        Ok(())
    }

    /// Draw every root subtree
    pub fn render(&self) -> EngineResult<()> {
        self.roots.iter().try_for_each(|&root| self.render_object(root))
    }

    /// Draw `key` with its render component, if any, then its children
    pub fn render_object(&self, key: ObjectKey) -> EngineResult<()> {
        let object = self.object(key)?;
        if let Some(renderer) = object.render_component() {
            renderer.render(object);
        }
        object.children.iter().try_for_each(|&child| self.render_object(child))
    }

    /// Draw every root subtree into a shadow map
    pub fn render_shadow(&self, shader: ShaderProgramHandle) -> EngineResult<()> {
        self.roots.iter().try_for_each(|&root| self.render_shadow_object(root, shader))
    }

    /// Shadow-pass counterpart of [`render_object`](Self::render_object)
    pub fn render_shadow_object(&self, key: ObjectKey, shader: ShaderProgramHandle) -> EngineResult<()> {
        let object = self.object(key)?;
        if let Some(renderer) = object.render_component() {
            renderer.render_shadow(object, shader);
        }
        object
            .children
            .iter()
            .try_for_each(|&child| self.render_shadow_object(child, shader))
    }

    // ---- events ----------------------------------------------------------

    /// Snapshot of `key` handed to the components of the other object
    pub fn partner(&self, key: ObjectKey) -> EngineResult<CollisionPartner> {
        let object = self.object(key)?;
        Ok(CollisionPartner {
            key,
            id: object.id(),
            identifier: object.identifier(),
            location: self.absolute_location(key)?,
            model_matrix: object.model_matrix(),
            sphere: object.transformed_sphere().ok(),
            aabb: object.cached_aabb(),
            dynamic: object.is_dynamic(),
        })
    }

    /// Deliver `event` to every component of `key`, then to its whole
    /// subtree in depth-first pre-order.
    pub fn call_event(&mut self, key: ObjectKey, event: EventType, other: &CollisionPartner) -> EngineResult<()> {
        let object = self.object_mut(key)?;
        object.for_each_component(|component, owner| component.dispatch(event, owner, other));

        let children = object.children.clone();
        for child in children {
            self.call_event(child, event, other)?;
        }
        Ok(())
    }
}
