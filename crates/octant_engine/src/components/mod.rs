//! Component system
//!
//! Components are behaviours attached to exactly one [`GameObject`]. The
//! owner drives them: every frame through [`Component::update`] and on
//! every collision phase through the `*_collision` callbacks. A component
//! never stores a reference to its owner; the owner is passed in on every
//! call, and [`Component::bind`] lets it remember the owner's handle.
//!
//! Render components are components with the extra rendering capability.
//! The scene core never draws anything itself; it only decides when a
//! render component is asked to.

mod movement;

pub use movement::{MoveComponent, MoveState};

use crate::scene::{CollisionPartner, GameObject};

/// Behaviour attached to a scene node. Every method has a no-op default.
pub trait Component {
    /// Called once when the component is attached to `owner`
    fn bind(&mut self, _owner: &GameObject) {}

    /// Called once per frame, in attachment order
    fn update(&mut self, _owner: &mut GameObject, _dt: f32) {}

    /// First frame `owner` (or an ancestor) touches `other`
    fn before_collision(&mut self, _owner: &mut GameObject, _other: &CollisionPartner) {}

    /// Every frame the contact with `other` persists, the first included
    fn during_collision(&mut self, _owner: &mut GameObject, _other: &CollisionPartner) {}

    /// First frame after the contact with `other` ended
    fn after_collision(&mut self, _owner: &mut GameObject, _other: &CollisionPartner) {}

    /// The owner has been flagged for removal
    fn on_death(&mut self) {}
}

/// Opaque handle of a shader program owned by the renderer
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub struct ShaderProgramHandle(pub u32);

/// Component that can draw its owner
pub trait RenderComponent: Component {
    /// Draw the owner in the main pass
    fn render(&self, owner: &GameObject);

    /// Draw the owner into a shadow map with the given shader program
    fn render_shadow(&self, owner: &GameObject, shader: ShaderProgramHandle);
}

/// A component as stored by its owner, keeping the render capability visible
pub enum AttachedComponent {
    /// Plain behaviour
    Behaviour(Box<dyn Component>),
    /// Behaviour that can also render
    Render(Box<dyn RenderComponent>),
}

impl AttachedComponent {
    pub(crate) fn bind(&mut self, owner: &GameObject) {
        match self {
            Self::Behaviour(c) => c.bind(owner),
            Self::Render(c) => c.bind(owner),
        }
    }

    pub(crate) fn update(&mut self, owner: &mut GameObject, dt: f32) {
        match self {
            Self::Behaviour(c) => c.update(owner, dt),
            Self::Render(c) => c.update(owner, dt),
        }
    }

    pub(crate) fn dispatch(&mut self, event: EventType, owner: &mut GameObject, other: &CollisionPartner) {
        match (self, event) {
            (Self::Behaviour(c), EventType::BeforeCollision) => c.before_collision(owner, other),
            (Self::Behaviour(c), EventType::DuringCollision) => c.during_collision(owner, other),
            (Self::Behaviour(c), EventType::AfterCollision) => c.after_collision(owner, other),
            (Self::Render(c), EventType::BeforeCollision) => c.before_collision(owner, other),
            (Self::Render(c), EventType::DuringCollision) => c.during_collision(owner, other),
            (Self::Render(c), EventType::AfterCollision) => c.after_collision(owner, other),
        }
    }

    pub(crate) fn on_death(&mut self) {
        match self {
            Self::Behaviour(c) => c.on_death(),
            Self::Render(c) => c.on_death(),
        }
    }

    /// Render capability, if this component has one
    pub fn as_render(&self) -> Option<&dyn RenderComponent> {
        match self {
            Self::Behaviour(_) => None,
            Self::Render(c) => Some(c.as_ref()),
        }
    }
}

/// Collision phase delivered through [`Scene::call_event`](crate::scene::Scene::call_event)
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub enum EventType {
    /// Contact started this frame
    BeforeCollision,
    /// Contact ongoing
    DuringCollision,
    /// Contact ended this frame
    AfterCollision,
}
