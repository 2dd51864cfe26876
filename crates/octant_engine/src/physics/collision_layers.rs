//! Collision group identifiers
//!
//! Every scene node belongs to one group and keeps a list of groups it may
//! collide with. Identifiers are plain tags; games define their own on top
//! of the predefined ones.

use serde::{Deserialize, Serialize};

/// Collision group tag of a scene node
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, PartialOrd, Ord, Default, Serialize, Deserialize)]
pub struct TypeIdentifier(pub u32);

impl TypeIdentifier {
    /// Untagged objects
    pub const NONE: Self = Self(0);

    /// Player character
    pub const PLAYER: Self = Self(1);

    /// Enemy character
    pub const ENEMY: Self = Self(2);

    /// Projectiles (bullets, missiles, etc.)
    pub const PROJECTILE: Self = Self(3);

    /// Static environment geometry
    pub const ENVIRONMENT: Self = Self(4);

    /// Trigger volumes
    pub const TRIGGER: Self = Self(5);

    /// Pickups and collectibles
    pub const PICKUP: Self = Self(6);

    /// First value free for game-specific groups
    pub const FIRST_CUSTOM: u32 = 64;

    /// Game-specific group `FIRST_CUSTOM + offset`, saturating at `u32::MAX`
    pub const fn custom(offset: u32) -> Self {
        Self(Self::FIRST_CUSTOM.saturating_add(offset))
    }
}
