//! Scene core demo
//!
//! Builds a small scene (ground, a moving body, a target with a child part),
//! steps it at a fixed rate and logs the collision phases it produces.
//!
//! Usage: `scene_demo [config.toml | config.ron]`

use std::sync::Arc;
use std::time::Duration;

use octant_engine::foundation::logging;
use octant_engine::foundation::math::translation_of;
use octant_engine::foundation::time::FixedTimestep;
use octant_engine::prelude::*;
use thiserror::Error;

/// Simulation steps run by the demo
const STEPS: u32 = 240;

/// Catch-up limit after a slow frame
const MAX_STEPS_PER_FRAME: u32 = 5;

/// Fixed simulation step in seconds
const STEP: f32 = 1.0 / 60.0;

/// Step at which the target is destroyed
const TARGET_DIES_AT: u32 = 180;

#[derive(Error, Debug)]
enum DemoError {
    #[error(transparent)]
    Engine(#[from] EngineError),

    #[error("usage: scene_demo [config.toml | config.ron]")]
    Usage,
}

/// Logs every collision phase its owner goes through
struct ContactLogger {
    name: &'static str,
}

impl Component for ContactLogger {
    fn before_collision(&mut self, owner: &mut GameObject, other: &CollisionPartner) {
        log::info!("{} (object {}) hit object {}", self.name, owner.id(), other.id);
    }

    fn during_collision(&mut self, _owner: &mut GameObject, other: &CollisionPartner) {
        log::trace!("{} touching object {}", self.name, other.id);
    }

    fn after_collision(&mut self, owner: &mut GameObject, other: &CollisionPartner) {
        log::info!("{} (object {}) separated from object {}", self.name, owner.id(), other.id);
    }

    fn on_death(&mut self) {
        log::info!("{} destroyed", self.name);
    }
}

/// Stand-in renderer that logs draw calls
struct ConsoleRenderer;

impl Component for ConsoleRenderer {}

impl RenderComponent for ConsoleRenderer {
    fn render(&self, owner: &GameObject) {
        log::trace!("draw object {} at {:?}", owner.id(), translation_of(&owner.model_matrix()));
    }

    fn render_shadow(&self, owner: &GameObject, shader: ShaderProgramHandle) {
        log::trace!("shadow object {} with program {}", owner.id(), shader.0);
    }
}

fn load_config() -> Result<EngineConfig, DemoError> {
    let mut args = std::env::args().skip(1);
    let config = match args.next() {
        Some(path) => EngineConfig::load_from_file(&path).map_err(EngineError::from)?,
        None => EngineConfig::default(),
    };
    if args.next().is_some() {
        return Err(DemoError::Usage);
    }
    Ok(config)
}

fn cuboid(x: f32, y: f32, z: f32) -> Result<Arc<dyn Mesh>, EngineError> {
    Ok(Arc::new(TriangleMesh::cuboid(Vec3::new(x, y, z))?))
}

/// Spawn the demo objects and return the target's handle
fn build_scene(scene: &mut Scene) -> Result<ObjectKey, EngineError> {
    let ground = scene.spawn(cuboid(10.0, 0.5, 10.0)?, None)?;
    if let Some(object) = scene.get_mut(ground) {
        object.set_identifier(TypeIdentifier::ENVIRONMENT);
        object.set_location(Vec3::new(0.0, -2.0, 0.0));
        object.add_render_component(ConsoleRenderer);
    }

    let target = scene.spawn(cuboid(1.0, 1.0, 1.0)?, None)?;
    let antenna = scene.spawn(cuboid(0.1, 0.5, 0.1)?, Some(target))?;
    if let Some(object) = scene.get_mut(target) {
        object.set_identifier(TypeIdentifier::ENEMY);
        object.set_location(Vec3::new(6.0, 0.5, 0.5));
        object.add_component(ContactLogger { name: "target" });
        object.add_render_component(ConsoleRenderer);
    }
    if let Some(object) = scene.get_mut(antenna) {
        object.set_location(Vec3::new(0.0, 1.5, 0.0));
        object.add_component(ContactLogger { name: "antenna" });
    }

    let mover = scene.spawn(cuboid(1.0, 1.0, 1.0)?, None)?;
    if let Some(object) = scene.get_mut(mover) {
        object.set_identifier(TypeIdentifier::PLAYER);
        object.add_collides_with_all([TypeIdentifier::ENEMY, TypeIdentifier::ENVIRONMENT]);
        object.set_dynamic(true);
        object.add_component(MoveComponent::with_motion(MoveState {
            velocity: Vec3::new(2.0, 0.0, 0.0),
            ..MoveState::default()
        }));
        object.add_component(ContactLogger { name: "mover" });
        object.add_render_component(ConsoleRenderer);
    }

    log::info!("Scene built with {} objects", scene.len());
    Ok(target)
}

/// Advance the simulation by one fixed step
fn step(scene: &mut Scene, collisions: &mut CollisionSystem, target: ObjectKey, frame: u32) -> Result<(), EngineError> {
    scene.update(STEP)?;
    let report = collisions.detect(scene)?;
    for pair in &report.entered {
        log::debug!("step {}: contact began {:?}", frame, pair);
    }
    for pair in &report.exited {
        log::debug!("step {}: contact ended {:?}", frame, pair);
    }

    if frame == TARGET_DIES_AT {
        if let Some(object) = scene.get_mut(target) {
            object.make_dirty();
        }
    }
    let removed = scene.remove_dirty();
    if removed > 0 {
        log::info!("step {}: removed {} object(s)", frame, removed);
    }
    Ok(())
}

fn run() -> Result<(), DemoError> {
    let config = load_config()?;
    logging::init_with_level(&config.log_level);
    log::info!("Starting scene demo");

    let mut scene = Scene::with_config(&config);
    let mut collisions = CollisionSystem::with_config(config.collision);
    let target = build_scene(&mut scene)?;

    let mut timer = Timer::new();
    let mut stepper = FixedTimestep::new(STEP, MAX_STEPS_PER_FRAME);
    let stopwatch = Stopwatch::start_new();
    let mut frame = 0;
    while frame < STEPS {
        for _ in 0..stepper.advance(timer.tick()) {
            step(&mut scene, &mut collisions, target, frame)?;
            frame += 1;
        }

        scene.render()?;
        scene.render_shadow(ShaderProgramHandle(0))?;
        std::thread::sleep(Duration::from_secs_f32(stepper.step()));
    }

    log::info!(
        "Simulated {} steps over {} frames in {:.2} ms ({} objects left)",
        frame,
        timer.frame_count(),
        stopwatch.elapsed_millis(),
        scene.len()
    );
    Ok(())
}

fn main() {
    if let Err(e) = run() {
        log::error!("Scene demo failed: {}", e);
        eprintln!("scene_demo: {e}");
        std::process::exit(1);
    }
}
