//! Scene graph node
//!
//! A [`GameObject`] owns its components, its mesh references and the octree
//! built from its collider mesh. Hierarchy links are arena handles: the
//! parent handle is non-owning, the children list is owned by the node but
//! the nodes themselves live in the [`Scene`](super::Scene).

use std::fmt;
use std::sync::Arc;

use crate::components::{AttachedComponent, Component, RenderComponent};
use crate::core::error::{EngineError, EngineResult};
use crate::foundation::collections::ObjectKey;
use crate::foundation::math::{Mat4, Quat, Vec3};
use crate::geometry::{Mesh, Sphere, Triangle, AABB};
use crate::physics::TypeIdentifier;
use crate::spatial::{Octree, OctreeConfig};

/// Smallest half extent given to a collider octree along a flat axis
const MIN_HALF_EXTENT: f32 = 1e-3;

/// Node of the scene graph
pub struct GameObject {
    id: u32,
    key: ObjectKey,

    mesh: Option<Arc<dyn Mesh>>,
    collider_mesh: Option<Arc<dyn Mesh>>,
    octree: Option<Octree>,
    sphere: Option<Sphere>,
    aabb: Option<AABB>,

    pub(super) parent: Option<ObjectKey>,
    pub(super) children: Vec<ObjectKey>,

    components: Vec<AttachedComponent>,

    location: Vec3,
    rotation: Quat,
    has_rotation: bool,
    scale: Vec3,
    model_matrix: Mat4,
    pub(super) changed: bool,

    dirty: bool,
    // Components are detached while `for_each_component` runs
    dispatching: bool,
    death_pending: bool,
    dynamic: bool,
    identifier: TypeIdentifier,
    collides_with: Vec<TypeIdentifier>,
}

impl GameObject {
    /// Create a node. When `mesh` is given, the octree is built from
    /// `collider_mesh` (or `mesh` itself when no collider is given).
    pub(crate) fn new(
        key: ObjectKey,
        id: u32,
        mesh: Option<Arc<dyn Mesh>>,
        collider_mesh: Option<Arc<dyn Mesh>>,
        parent: Option<ObjectKey>,
        octree_config: OctreeConfig,
    ) -> EngineResult<Self> {
        let collider_mesh = collider_mesh.or_else(|| mesh.clone());
        let octree = collider_mesh
            .as_deref()
            .map(|collider| Self::create_octree(collider, octree_config))
            .transpose()?;
        let sphere = mesh.as_ref().map(|mesh| mesh.sphere());

        Ok(Self {
            id,
            key,
            mesh,
            collider_mesh,
            octree,
            sphere,
            aabb: None,
            parent,
            children: Vec::new(),
            components: Vec::new(),
            location: Vec3::zeros(),
            rotation: Quat::identity(),
            has_rotation: false,
            scale: Vec3::new(1.0, 1.0, 1.0),
            model_matrix: Mat4::identity(),
            changed: false,
            dirty: false,
            dispatching: false,
            death_pending: false,
            dynamic: false,
            identifier: TypeIdentifier::NONE,
            collides_with: Vec::new(),
        })
    }

    fn create_octree(mesh: &dyn Mesh, config: OctreeConfig) -> EngineResult<Octree> {
        let triangles = mesh.triangles();
        if triangles.is_empty() {
            return Err(EngineError::EmptyMesh);
        }

        // Planar meshes get a thin slab instead of a zero-volume root
        let aabb = mesh.aabb();
        let half_extent = aabb.extents().map(|h| if h > MIN_HALF_EXTENT { h } else { MIN_HALF_EXTENT });

        let mut octree = Octree::with_config(aabb.center(), half_extent, config)?;
        octree.insert_all(triangles);
        Ok(octree)
    }

    /// Process-unique id assigned by the owning scene
    pub fn id(&self) -> u32 {
        self.id
    }

    /// Arena handle of this node
    pub fn key(&self) -> ObjectKey {
        self.key
    }

    /// Parent handle, `None` for roots
    pub fn parent(&self) -> Option<ObjectKey> {
        self.parent
    }

    /// Child handles in attachment order
    pub fn children(&self) -> &[ObjectKey] {
        &self.children
    }

    /// Render mesh, if any
    pub fn mesh(&self) -> Option<&Arc<dyn Mesh>> {
        self.mesh.as_ref()
    }

    /// Mesh the octree was built from, if any
    pub fn collider_mesh(&self) -> Option<&Arc<dyn Mesh>> {
        self.collider_mesh.as_ref()
    }

    /// Octree over the collider mesh
    pub fn octree(&self) -> Option<&Octree> {
        self.octree.as_ref()
    }

    /// Triangles of the render mesh (empty without a mesh)
    pub fn triangles(&self) -> &[Triangle] {
        self.mesh.as_deref().map_or(&[], |mesh| mesh.triangles())
    }

    // ---- transform -------------------------------------------------------

    /// Location relative to the parent
    pub fn relative_location(&self) -> Vec3 {
        self.location
    }

    /// Rotation relative to the parent
    pub fn relative_rotation(&self) -> Quat {
        self.rotation
    }

    /// Scale relative to the parent
    pub fn relative_scale(&self) -> Vec3 {
        self.scale
    }

    /// Set the relative location and schedule a transform rebuild
    pub fn set_location(&mut self, location: Vec3) {
        self.location = location;
        self.changed = true;
    }

    /// Set the relative rotation and schedule a transform rebuild
    pub fn set_rotation(&mut self, rotation: Quat) {
        self.rotation = rotation;
        self.has_rotation = true;
        self.changed = true;
    }

    /// Set the relative scale and schedule a transform rebuild
    pub fn set_scale(&mut self, scale: Vec3) {
        self.scale = scale;
        self.changed = true;
    }

    /// Apply `delta` on top of the current rotation (`delta * rotation`);
    /// the first call simply sets it.
    pub fn update_rotation(&mut self, delta: Quat) {
        let rotation = if self.has_rotation { delta * self.rotation } else { delta };
        self.set_rotation(rotation);
    }

    /// Whether the world transform will be rebuilt on the next update
    pub fn is_changed(&self) -> bool {
        self.changed
    }

    /// Cached world transform
    pub fn model_matrix(&self) -> Mat4 {
        self.model_matrix
    }

    /// Replace the world transform
    pub fn move_to(&mut self, model_matrix: Mat4) {
        self.model_matrix = model_matrix;
    }

    /// Post-multiply the world transform by `update`
    pub fn apply_transform(&mut self, update: &Mat4) {
        self.model_matrix *= *update;
    }

    // ---- bounds ----------------------------------------------------------

    /// Mesh sphere moved by the relative location and scaled by the largest
    /// scale axis.
    pub fn transformed_sphere(&self) -> EngineResult<Sphere> {
        self.sphere
            .map(|sphere| sphere.transformed(self.location, self.scale))
            .ok_or(EngineError::MissingGeometry { id: self.id })
    }

    /// Mesh box pushed through the current model matrix. The result is
    /// cached until the next call; see [`cached_aabb`](Self::cached_aabb).
    pub fn transformed_aabb(&mut self) -> EngineResult<AABB> {
        let mesh = self.mesh.as_deref().ok_or(EngineError::MissingGeometry { id: self.id })?;
        let aabb = mesh.aabb().transformed(&self.model_matrix);
        self.aabb = Some(aabb);
        Ok(aabb)
    }

    /// Box computed by the last [`transformed_aabb`](Self::transformed_aabb) call
    pub fn cached_aabb(&self) -> Option<AABB> {
        self.aabb
    }

    // ---- collision groups ------------------------------------------------

    /// Collision group of this object
    pub fn identifier(&self) -> TypeIdentifier {
        self.identifier
    }

    /// Move this object to another collision group
    pub fn set_identifier(&mut self, identifier: TypeIdentifier) {
        self.identifier = identifier;
    }

    /// Allow collisions with `identifier`
    pub fn add_collides_with(&mut self, identifier: TypeIdentifier) {
        self.collides_with.push(identifier);
    }

    /// Allow collisions with every listed group
    pub fn add_collides_with_all<I>(&mut self, identifiers: I)
    where
        I: IntoIterator<Item = TypeIdentifier>,
    {
        self.collides_with.extend(identifiers);
    }

    /// Whether `identifier` was allowed since the last clear
    pub fn collides_with(&self, identifier: TypeIdentifier) -> bool {
        self.collides_with.iter().any(|&allowed| allowed == identifier)
    }

    /// Forget every allowed group
    pub fn clear_collides_with_list(&mut self) {
        self.collides_with.clear();
    }

    /// Whether the object moves on its own
    pub fn is_dynamic(&self) -> bool {
        self.dynamic
    }

    /// Mark the object as moving or static
    pub fn set_dynamic(&mut self, dynamic: bool) {
        self.dynamic = dynamic;
    }

    // ---- components ------------------------------------------------------

    /// Attach a behaviour; it runs after every component attached before it
    pub fn add_component<C: Component + 'static>(&mut self, component: C) {
        self.attach(AttachedComponent::Behaviour(Box::new(component)));
    }

    /// Attach a render component. The most recently attached one is used
    /// for drawing; all of them still receive updates and events.
    pub fn add_render_component<R: RenderComponent + 'static>(&mut self, renderer: R) {
        self.attach(AttachedComponent::Render(Box::new(renderer)));
    }

    fn attach(&mut self, mut component: AttachedComponent) {
        component.bind(self);
        self.components.push(component);
    }

    /// Detach the component at `index` (attachment order). Returns `None`
    /// for an out-of-range index, including while components are running.
    pub fn remove_component(&mut self, index: usize) -> Option<AttachedComponent> {
        (index < self.components.len()).then(|| self.components.remove(index))
    }

    /// Number of attached components
    pub fn component_count(&self) -> usize {
        self.components.len()
    }

    /// Render component used for drawing
    pub fn render_component(&self) -> Option<&dyn RenderComponent> {
        self.components.iter().rev().find_map(AttachedComponent::as_render)
    }

    /// Run `f` over every component in attachment order while giving it
    /// mutable access to this object. Components attached during the run
    /// are kept after the existing ones. A [`make_dirty`](Self::make_dirty)
    /// issued from inside the run notifies every component once the list is
    /// restored.
    pub(crate) fn for_each_component<F>(&mut self, mut f: F)
    where
        F: FnMut(&mut AttachedComponent, &mut GameObject),
    {
        let mut components = std::mem::take(&mut self.components);
        let nested = std::mem::replace(&mut self.dispatching, true);
        for component in &mut components {
            f(component, self);
        }
        self.dispatching = nested;
        components.append(&mut self.components);
        self.components = components;

        if !self.dispatching && std::mem::take(&mut self.death_pending) {
            self.notify_death();
        }
    }

    // ---- lifecycle -------------------------------------------------------

    /// Notify every component that this object is about to die and flag it.
    /// Only the first call notifies; deallocation is up to the scene.
    pub fn make_dirty(&mut self) {
        if self.dirty {
            return;
        }
        if self.dispatching {
            self.death_pending = true;
        } else {
            self.notify_death();
        }
        self.dirty = true;
    }

    fn notify_death(&mut self) {
        for component in &mut self.components {
            component.on_death();
        }
    }

    /// Whether [`make_dirty`](Self::make_dirty) was called
    pub fn is_dirty(&self) -> bool {
        self.dirty
    }
}

impl fmt::Debug for GameObject {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.debug_struct("GameObject")
            .field("id", &self.id)
            .field("key", &self.key)
            .field("parent", &self.parent)
            .field("children", &self.children)
            .field("components", &self.components.len())
            .field("location", &self.location)
            .field("scale", &self.scale)
            .field("identifier", &self.identifier)
            .field("dirty", &self.dirty)
            .finish_non_exhaustive()
    }
}
