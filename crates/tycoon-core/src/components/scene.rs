//! Scene-graph components: every world object is a named node with an
//! optional parent. Physical objects additionally carry a [`Body`].

use glam::Vec3;
use hecs::Entity;
use serde::{Deserialize, Serialize};

use super::common::PlayerId;

/// Name and parent link of a world object.
#[derive(Debug, Clone)]
pub struct Node {
    pub name: String,
    pub parent: Option<Entity>,
}

/// Box-shaped physical body.
#[derive(Debug, Clone, Copy, PartialEq, Serialize, Deserialize)]
pub struct Body {
    /// Full extents of the box
    pub size: Vec3,
    /// Box centre relative to the object's transform
    pub offset: Vec3,
    /// Anchored bodies are not moved by physics
    pub anchored: bool,
    pub can_collide: bool,
}

impl Body {
    pub fn solid(size: Vec3) -> Self {
        Self {
            size,
            offset: Vec3::ZERO,
            anchored: true,
            can_collide: true,
        }
    }

    pub fn with_offset(mut self, offset: Vec3) -> Self {
        self.offset = offset;
        self
    }

    /// Immovable and non-colliding; placed structures are decor.
    pub fn decor(mut self) -> Self {
        self.anchored = true;
        self.can_collide = false;
        self
    }
}

/// Marks the avatar of a player.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct Character {
    pub player: PlayerId,
}
