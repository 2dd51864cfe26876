//! Scene graph
//!
//! Game objects live in an arena owned by [`Scene`]. Each node keeps a
//! non-owning parent handle and the ordered handles of its children, and
//! the scene walks that hierarchy every frame:
//!
//! - [`Scene::update`] runs components and propagates world transforms
//! - [`Scene::render`] / [`Scene::render_shadow`] ask render components to draw
//! - [`Scene::call_event`] delivers collision phases to a whole subtree

mod event;
mod game_object;
mod scene_graph;

#[cfg(test)]
mod tests;

pub use event::CollisionPartner;
pub use game_object::GameObject;
pub use scene_graph::Scene;

pub use crate::components::EventType;
pub use crate::foundation::collections::ObjectKey;
pub use crate::physics::TypeIdentifier;
