use std::cell::RefCell;
use std::rc::Rc;
use std::sync::Arc;

use approx::assert_relative_eq;

use super::*;
use crate::components::{Component, MoveComponent, MoveState, RenderComponent, ShaderProgramHandle};
use crate::core::error::EngineError;
use crate::foundation::math::{quat_from_axis_angle, translation_of, Vec3};
use crate::geometry::{Mesh, Triangle, TriangleMesh};

type Log = Rc<RefCell<Vec<String>>>;

struct Recorder {
    name: &'static str,
    log: Log,
}

impl Recorder {
    fn new(name: &'static str, log: &Log) -> Self {
        Self { name, log: Rc::clone(log) }
    }

    fn push(&self, entry: String) {
        self.log.borrow_mut().push(entry);
    }
}

impl Component for Recorder {
    fn update(&mut self, _owner: &mut GameObject, _dt: f32) {
        self.push(format!("{}:update", self.name));
    }

    fn before_collision(&mut self, _owner: &mut GameObject, other: &CollisionPartner) {
        self.push(format!("{}:before:{}", self.name, other.id));
    }

    fn during_collision(&mut self, _owner: &mut GameObject, other: &CollisionPartner) {
        self.push(format!("{}:during:{}", self.name, other.id));
    }

    fn after_collision(&mut self, _owner: &mut GameObject, other: &CollisionPartner) {
        self.push(format!("{}:after:{}", self.name, other.id));
    }

    fn on_death(&mut self) {
        self.push(format!("{}:death", self.name));
    }
}

impl RenderComponent for Recorder {
    fn render(&self, owner: &GameObject) {
        self.push(format!("{}:render:{}", self.name, owner.id()));
    }

    fn render_shadow(&self, _owner: &GameObject, shader: ShaderProgramHandle) {
        self.push(format!("{}:shadow:{}", self.name, shader.0));
    }
}

fn log() -> Log {
    Rc::new(RefCell::new(Vec::new()))
}

fn cube(half: f32) -> Arc<dyn Mesh> {
    Arc::new(TriangleMesh::cuboid(Vec3::new(half, half, half)).unwrap())
}

#[test]
fn root_absolute_location_equals_relative() {
    let mut scene = Scene::new();
    let root = scene.spawn(cube(1.0), None).unwrap();
    scene.get_mut(root).unwrap().set_location(Vec3::new(3.0, -1.0, 2.5));

    let relative = scene.get(root).unwrap().relative_location();
    assert_eq!(scene.absolute_location(root).unwrap(), relative);
}

#[test]
fn child_location_follows_parent_after_update() {
    let mut scene = Scene::new();
    let r = scene.spawn_empty(None).unwrap();
    let c = scene.spawn_empty(Some(r)).unwrap();
    scene.get_mut(c).unwrap().set_location(Vec3::new(1.0, 2.0, 3.0));

    scene.get_mut(r).unwrap().set_location(Vec3::new(5.0, 0.0, 0.0));
    scene.update(0.016).unwrap();

    assert_relative_eq!(scene.absolute_location(c).unwrap(), Vec3::new(6.0, 2.0, 3.0));
    assert_relative_eq!(
        translation_of(&scene.get(c).unwrap().model_matrix()),
        Vec3::new(6.0, 2.0, 3.0)
    );
}

#[test]
fn absolute_location_sums_over_ancestors() {
    let mut scene = Scene::new();
    let a = scene.spawn_empty(None).unwrap();
    let b = scene.spawn_empty(Some(a)).unwrap();
    let c = scene.spawn_empty(Some(b)).unwrap();
    scene.get_mut(a).unwrap().set_location(Vec3::new(1.0, 0.0, 0.0));
    scene.get_mut(b).unwrap().set_location(Vec3::new(0.0, 2.0, 0.0));
    scene.get_mut(c).unwrap().set_location(Vec3::new(0.0, 0.0, 3.0));

    let expected = scene.get(c).unwrap().relative_location() + scene.absolute_location(b).unwrap();
    assert_relative_eq!(scene.absolute_location(c).unwrap(), expected);
    assert_relative_eq!(expected, Vec3::new(1.0, 2.0, 3.0));
}

#[test]
fn absolute_rotation_composes_child_then_parent() {
    let mut scene = Scene::new();
    let parent = scene.spawn_empty(None).unwrap();
    let child = scene.spawn_empty(Some(parent)).unwrap();

    let parent_rotation = quat_from_axis_angle(&Vec3::y(), 0.7);
    let child_rotation = quat_from_axis_angle(&Vec3::x(), 0.3);
    scene.get_mut(parent).unwrap().set_rotation(parent_rotation);
    scene.get_mut(child).unwrap().set_rotation(child_rotation);

    let expected = child_rotation * parent_rotation;
    assert_relative_eq!(scene.absolute_rotation(child).unwrap().coords, expected.coords, epsilon = 1e-6);
}

#[test]
fn absolute_scale_is_additive() {
    let mut scene = Scene::new();
    let parent = scene.spawn_empty(None).unwrap();
    let child = scene.spawn_empty(Some(parent)).unwrap();
    scene.get_mut(parent).unwrap().set_scale(Vec3::new(2.0, 1.0, 1.0));

    assert_relative_eq!(scene.absolute_scale(child).unwrap(), Vec3::new(3.0, 2.0, 2.0));
}

#[test]
fn update_rotation_applies_delta_on_the_left() {
    let mut scene = Scene::new();
    let key = scene.spawn_empty(None).unwrap();
    let object = scene.get_mut(key).unwrap();

    let first = quat_from_axis_angle(&Vec3::z(), 0.5);
    let delta = quat_from_axis_angle(&Vec3::x(), 0.25);
    object.update_rotation(first);
    assert_eq!(object.relative_rotation(), first);

    object.update_rotation(delta);
    assert_relative_eq!(object.relative_rotation().coords, (delta * first).coords, epsilon = 1e-6);
    assert!(object.is_changed());
}

#[test]
fn update_with_zero_dt_is_idempotent() {
    let mut scene = Scene::new();
    let key = scene.spawn(cube(1.0), None).unwrap();
    {
        let object = scene.get_mut(key).unwrap();
        object.set_location(Vec3::new(1.0, 2.0, 3.0));
        object.set_rotation(quat_from_axis_angle(&Vec3::y(), 1.0));
        object.set_scale(Vec3::new(2.0, 2.0, 2.0));
    }

    scene.update(0.0).unwrap();
    let object = scene.get(key).unwrap();
    let (location, rotation, scale, model) = (
        object.relative_location(),
        object.relative_rotation(),
        object.relative_scale(),
        object.model_matrix(),
    );

    for _ in 0..3 {
        scene.update(0.0).unwrap();
    }

    let object = scene.get(key).unwrap();
    assert_eq!(object.relative_location(), location);
    assert_eq!(object.relative_rotation(), rotation);
    assert_eq!(object.relative_scale(), scale);
    assert_eq!(object.model_matrix(), model);
}

#[test]
fn move_component_moves_owner() {
    let mut scene = Scene::new();
    let key = scene.spawn(cube(1.0), None).unwrap();
    scene.get_mut(key).unwrap().add_component(MoveComponent::with_motion(MoveState {
        velocity: Vec3::new(1.0, 0.0, 0.0),
        ..MoveState::default()
    }));

    scene.update(1.0).unwrap();
    scene.update(1.0).unwrap();

    let model = scene.get(key).unwrap().model_matrix();
    assert_relative_eq!(translation_of(&model), Vec3::new(2.0, 0.0, 0.0));
}

#[test]
fn components_update_in_attachment_order() {
    let events = log();
    let mut scene = Scene::new();
    let key = scene.spawn_empty(None).unwrap();
    let object = scene.get_mut(key).unwrap();
    object.add_component(Recorder::new("first", &events));
    object.add_render_component(Recorder::new("second", &events));
    object.add_component(Recorder::new("third", &events));

    scene.update(0.1).unwrap();

    assert_eq!(*events.borrow(), vec!["first:update", "second:update", "third:update"]);
}

#[test]
fn children_update_every_frame() {
    let events = log();
    let mut scene = Scene::new();
    let parent = scene.spawn_empty(None).unwrap();
    let child = scene.spawn_empty(Some(parent)).unwrap();
    scene.get_mut(child).unwrap().add_component(Recorder::new("child", &events));

    scene.update(0.1).unwrap();
    scene.update(0.1).unwrap();

    assert_eq!(events.borrow().len(), 2);
    assert!(!scene.get(child).unwrap().is_changed());
}

#[test]
fn call_event_reaches_subtree_depth_first() {
    let events = log();
    let mut scene = Scene::new();
    let parent = scene.spawn_empty(None).unwrap();
    let left = scene.spawn_empty(Some(parent)).unwrap();
    let right = scene.spawn_empty(Some(parent)).unwrap();
    let other = scene.spawn(cube(1.0), None).unwrap();

    scene.get_mut(parent).unwrap().add_component(Recorder::new("parent", &events));
    scene.get_mut(left).unwrap().add_component(Recorder::new("left", &events));
    scene.get_mut(right).unwrap().add_component(Recorder::new("right", &events));

    let partner = scene.partner(other).unwrap();
    scene.call_event(parent, EventType::BeforeCollision, &partner).unwrap();

    let id = partner.id;
    assert_eq!(
        *events.borrow(),
        vec![
            format!("parent:before:{id}"),
            format!("left:before:{id}"),
            format!("right:before:{id}"),
        ]
    );
}

#[test]
fn call_event_visits_grandchildren_before_siblings() {
    let events = log();
    let mut scene = Scene::new();
    let root = scene.spawn_empty(None).unwrap();
    let a = scene.spawn_empty(Some(root)).unwrap();
    let a1 = scene.spawn_empty(Some(a)).unwrap();
    let b = scene.spawn_empty(Some(root)).unwrap();
    for (key, name) in [(a, "a"), (a1, "a1"), (b, "b")] {
        scene.get_mut(key).unwrap().add_component(Recorder::new(name, &events));
    }

    let partner = scene.partner(root).unwrap();
    scene.call_event(root, EventType::AfterCollision, &partner).unwrap();

    let names: Vec<String> = events.borrow().iter().map(|e| e.split(':').next().unwrap().to_owned()).collect();
    assert_eq!(names, vec!["a", "a1", "b"]);
}

#[test]
fn collides_with_tracks_added_identifiers() {
    let mut scene = Scene::new();
    let key = scene.spawn_empty(None).unwrap();
    let object = scene.get_mut(key).unwrap();

    assert!(!object.collides_with(TypeIdentifier::ENEMY));
    object.add_collides_with(TypeIdentifier::ENEMY);
    object.add_collides_with(TypeIdentifier::ENEMY);
    object.add_collides_with_all([TypeIdentifier::PROJECTILE, TypeIdentifier::custom(3)]);

    assert!(object.collides_with(TypeIdentifier::ENEMY));
    assert!(object.collides_with(TypeIdentifier::PROJECTILE));
    assert!(object.collides_with(TypeIdentifier::custom(3)));
    assert!(!object.collides_with(TypeIdentifier::PLAYER));

    object.clear_collides_with_list();
    assert!(!object.collides_with(TypeIdentifier::ENEMY));
    assert!(!object.collides_with(TypeIdentifier::PROJECTILE));
}

#[test]
fn make_dirty_notifies_components_once() {
    let events = log();
    let mut scene = Scene::new();
    let key = scene.spawn_empty(None).unwrap();
    let object = scene.get_mut(key).unwrap();
    object.add_component(Recorder::new("a", &events));
    object.add_component(Recorder::new("b", &events));

    object.make_dirty();
    object.make_dirty();

    assert!(object.is_dirty());
    assert_eq!(*events.borrow(), vec!["a:death", "b:death"]);
}

/// Kills its owner from inside a component callback
struct Suicide;

impl Component for Suicide {
    fn update(&mut self, owner: &mut GameObject, _dt: f32) {
        owner.make_dirty();
    }

    fn before_collision(&mut self, owner: &mut GameObject, _other: &CollisionPartner) {
        owner.make_dirty();
    }
}

#[test]
fn make_dirty_from_update_still_notifies_every_component() {
    let events = log();
    let mut scene = Scene::new();
    let key = scene.spawn_empty(None).unwrap();
    let object = scene.get_mut(key).unwrap();
    object.add_component(Recorder::new("a", &events));
    object.add_component(Suicide);
    object.add_component(Recorder::new("b", &events));

    scene.update(0.1).unwrap();

    assert!(scene.get(key).unwrap().is_dirty());
    assert_eq!(*events.borrow(), vec!["a:update", "b:update", "a:death", "b:death"]);
    assert_eq!(scene.get(key).unwrap().component_count(), 3);

    scene.get_mut(key).unwrap().make_dirty();
    assert_eq!(events.borrow().len(), 4);
}

#[test]
fn make_dirty_from_collision_event_notifies_after_dispatch() {
    let events = log();
    let mut scene = Scene::new();
    let key = scene.spawn_empty(None).unwrap();
    let other = scene.spawn(cube(1.0), None).unwrap();
    let object = scene.get_mut(key).unwrap();
    object.add_component(Suicide);
    object.add_component(Recorder::new("a", &events));

    let partner = scene.partner(other).unwrap();
    scene.call_event(key, EventType::BeforeCollision, &partner).unwrap();

    let id = partner.id;
    assert!(scene.get(key).unwrap().is_dirty());
    assert_eq!(*events.borrow(), vec![format!("a:before:{id}"), "a:death".to_owned()]);
}

#[test]
fn remove_dirty_drops_subtree() {
    let mut scene = Scene::new();
    let keep = scene.spawn_empty(None).unwrap();
    let doomed = scene.spawn_empty(None).unwrap();
    let child = scene.spawn_empty(Some(doomed)).unwrap();

    scene.get_mut(doomed).unwrap().make_dirty();
    assert_eq!(scene.remove_dirty(), 2);

    assert!(scene.contains(keep));
    assert!(!scene.contains(doomed));
    assert!(!scene.contains(child));
    assert_eq!(scene.roots(), &[keep]);
}

#[test]
fn missing_geometry_is_an_error() {
    let mut scene = Scene::new();
    let key = scene.spawn_empty(None).unwrap();
    let object = scene.get_mut(key).unwrap();
    let id = object.id();

    assert!(matches!(object.transformed_sphere(), Err(EngineError::MissingGeometry { id: got }) if got == id));
    assert!(matches!(object.transformed_aabb(), Err(EngineError::MissingGeometry { .. })));
    assert!(object.octree().is_none());
    assert!(object.triangles().is_empty());
}

#[test]
fn transformed_sphere_is_conservative() {
    let mut scene = Scene::new();
    let key = scene.spawn(cube(1.0), None).unwrap();
    let object = scene.get_mut(key).unwrap();
    object.set_location(Vec3::new(4.0, 0.0, -2.0));
    object.set_scale(Vec3::new(1.0, 3.0, 0.5));

    let mesh_sphere = object.mesh().unwrap().sphere();
    let sphere = object.transformed_sphere().unwrap();

    assert_relative_eq!(sphere.radius, mesh_sphere.radius * 3.0);
    let moved = crate::geometry::Sphere::new(mesh_sphere.center + object.relative_location(), mesh_sphere.radius);
    assert!(sphere.contains_sphere(&moved));
}

#[test]
fn transformed_aabb_follows_model_matrix() {
    let mut scene = Scene::new();
    let key = scene.spawn(cube(1.0), None).unwrap();
    scene.get_mut(key).unwrap().set_location(Vec3::new(5.0, 0.0, 0.0));
    scene.update(0.0).unwrap();

    let object = scene.get_mut(key).unwrap();
    assert!(object.cached_aabb().is_none());
    let aabb = object.transformed_aabb().unwrap();

    assert_relative_eq!(aabb.min, Vec3::new(4.0, -1.0, -1.0), epsilon = 1e-5);
    assert_relative_eq!(aabb.max, Vec3::new(6.0, 1.0, 1.0), epsilon = 1e-5);
    assert_eq!(object.cached_aabb(), Some(aabb));
}

#[test]
fn flat_collider_still_builds_an_octree() {
    let mut scene = Scene::new();
    let quad = TriangleMesh::from_triangles(vec![
        Triangle::new(Vec3::new(-1.0, 0.0, -1.0), Vec3::new(1.0, 0.0, -1.0), Vec3::new(1.0, 0.0, 1.0)),
        Triangle::new(Vec3::new(-1.0, 0.0, -1.0), Vec3::new(1.0, 0.0, 1.0), Vec3::new(-1.0, 0.0, 1.0)),
    ])
    .unwrap();
    let key = scene.spawn(Arc::new(quad), None).unwrap();

    let octree = scene.get(key).unwrap().octree().unwrap();
    assert_eq!(octree.triangle_count(), 2);
}

#[test]
fn separate_collider_mesh_feeds_the_octree() {
    let mut scene = Scene::new();
    let key = scene.spawn_with_collider(cube(1.0), cube(3.0), None).unwrap();

    let object = scene.get(key).unwrap();
    assert_relative_eq!(object.octree().unwrap().bounds().max, Vec3::new(3.0, 3.0, 3.0));
    assert_eq!(object.triangles().len(), 12);
}

#[test]
fn render_uses_last_render_component_and_recurses() {
    let events = log();
    let mut scene = Scene::new();
    let parent = scene.spawn_empty(None).unwrap();
    let child = scene.spawn_empty(Some(parent)).unwrap();
    {
        let object = scene.get_mut(child).unwrap();
        object.add_render_component(Recorder::new("old", &events));
        object.add_render_component(Recorder::new("new", &events));
    }
    let child_id = scene.get(child).unwrap().id();

    scene.render().unwrap();
    scene.render_shadow(ShaderProgramHandle(7)).unwrap();

    assert_eq!(*events.borrow(), vec![format!("new:render:{child_id}"), "new:shadow:7".to_owned()]);
}

#[test]
fn remove_component_by_index() {
    let events = log();
    let mut scene = Scene::new();
    let key = scene.spawn_empty(None).unwrap();
    let object = scene.get_mut(key).unwrap();
    object.add_component(Recorder::new("a", &events));
    object.add_component(Recorder::new("b", &events));

    assert!(object.remove_component(0).is_some());
    assert!(object.remove_component(5).is_none());
    assert_eq!(object.component_count(), 1);

    scene.update(0.0).unwrap();
    assert_eq!(*events.borrow(), vec!["b:update"]);
}

#[test]
fn attach_child_rejects_cycles() {
    let mut scene = Scene::new();
    let a = scene.spawn_empty(None).unwrap();
    let b = scene.spawn_empty(Some(a)).unwrap();
    let c = scene.spawn_empty(Some(b)).unwrap();

    assert!(matches!(scene.attach_child(c, a), Err(EngineError::HierarchyCycle { .. })));
    assert!(matches!(scene.attach_child(a, a), Err(EngineError::HierarchyCycle { .. })));

    scene.attach_child(a, c).unwrap();
    assert_eq!(scene.get(a).unwrap().children(), &[b, c]);
    assert!(scene.get(b).unwrap().children().is_empty());

    scene.detach(b).unwrap();
    assert_eq!(scene.roots(), &[a, b]);
    assert_eq!(scene.get(b).unwrap().parent(), None);
}

#[test]
fn removed_handles_are_unknown() {
    let mut scene = Scene::new();
    let parent = scene.spawn_empty(None).unwrap();
    let child = scene.spawn_empty(Some(parent)).unwrap();

    assert_eq!(scene.remove(parent).unwrap(), 2);
    assert!(scene.is_empty());
    assert!(matches!(scene.absolute_location(child), Err(EngineError::UnknownObject(key)) if key == child));
    assert!(matches!(scene.spawn_empty(Some(parent)), Err(EngineError::UnknownObject(_))));
}

#[test]
fn ids_are_unique_and_increasing() {
    let mut scene = Scene::new();
    let keys: Vec<ObjectKey> = (0..4).map(|_| scene.spawn_empty(None).unwrap()).collect();
    let ids: Vec<u32> = keys.iter().map(|&key| scene.get(key).unwrap().id()).collect();

    assert!(ids.windows(2).all(|pair| pair[0] < pair[1]));
}
