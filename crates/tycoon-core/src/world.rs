//! In-process host world - a scene graph of named, parented objects stored
//! in an ECS world (`hecs`).
//!
//! A real engine binding owns its own instance tree; this wrapper gives the
//! plot logic the same shape (folders, bodies, characters, lookup of a
//! child by name, recursive destroy) so it can run and be tested headless.

use std::collections::HashMap;

use glam::Vec3;
use hecs::{Entity, World};

use crate::components::*;

/// Scene graph over a `hecs::World`
pub struct HostWorld {
    world: World,
    /// Parent -> children in spawn order. `None` keys the root objects.
    children: HashMap<Option<Entity>, Vec<Entity>>,
}

impl HostWorld {
    /// Create an empty world
    pub fn new() -> Self {
        Self {
            world: World::new(),
            children: HashMap::new(),
        }
    }

    fn link(&mut self, entity: Entity, parent: Option<Entity>) -> Entity {
        self.children.entry(parent).or_default().push(entity);
        entity
    }

    /// Spawn a grouping object with no body
    pub fn spawn_folder(&mut self, name: impl Into<String>, parent: Option<Entity>) -> Entity {
        let node = Node {
            name: name.into(),
            parent,
        };
        let entity = self.world.spawn((node, Transform::IDENTITY));
        self.link(entity, parent)
    }

    /// Spawn a physical object
    pub fn spawn_body(
        &mut self,
        name: impl Into<String>,
        parent: Option<Entity>,
        body: Body,
        transform: Transform,
    ) -> Entity {
        let node = Node {
            name: name.into(),
            parent,
        };
        let entity = self.world.spawn((node, transform, body));
        self.link(entity, parent)
    }

    /// Spawn a player's avatar at the world root
    pub fn spawn_character(
        &mut self,
        player: PlayerId,
        transform: Transform,
        size: Vec3,
    ) -> Entity {
        let node = Node {
            name: format!("Character {}", player.0),
            parent: None,
        };
        let body = Body {
            size,
            offset: Vec3::ZERO,
            anchored: false,
            can_collide: true,
        };
        let entity = self
            .world
            .spawn((node, transform, body, Character { player }));
        self.link(entity, None)
    }

    pub fn contains(&self, entity: Entity) -> bool {
        self.world.contains(entity)
    }

    pub fn name(&self, entity: Entity) -> Option<String> {
        self.world
            .get::<&Node>(entity)
            .ok()
            .map(|node| node.name.clone())
    }

    pub fn parent(&self, entity: Entity) -> Option<Entity> {
        self.world.get::<&Node>(entity).ok().and_then(|node| node.parent)
    }

    /// Direct children in spawn order. `None` lists root objects.
    pub fn children_of(&self, parent: Option<Entity>) -> Vec<Entity> {
        self.children.get(&parent).cloned().unwrap_or_default()
    }

    pub fn children(&self, parent: Entity) -> Vec<Entity> {
        self.children_of(Some(parent))
    }

    /// Every object below `root`, depth first, excluding `root` itself
    pub fn descendants(&self, root: Entity) -> Vec<Entity> {
        let mut found = Vec::new();
        let mut stack = self.children(root);
        stack.reverse();
        while let Some(entity) = stack.pop() {
            found.push(entity);
            let mut children = self.children(entity);
            children.reverse();
            stack.extend(children);
        }
        found
    }

    /// First direct child with the given name
    pub fn find_first_child(&self, parent: Entity, name: &str) -> Option<Entity> {
        self.find_in(Some(parent), name)
    }

    /// First root object with the given name
    pub fn find_root(&self, name: &str) -> Option<Entity> {
        self.find_in(None, name)
    }

    fn find_in(&self, parent: Option<Entity>, name: &str) -> Option<Entity> {
        self.children
            .get(&parent)?
            .iter()
            .copied()
            .find(|entity| self.name(*entity).as_deref() == Some(name))
    }

    /// Destroy an object and everything below it. Returns how many objects
    /// were removed.
    pub fn destroy(&mut self, entity: Entity) -> usize {
        if !self.world.contains(entity) {
            return 0;
        }
        let parent = self.parent(entity);
        if let Some(siblings) = self.children.get_mut(&parent) {
            siblings.retain(|sibling| *sibling != entity);
        }
        let mut doomed = self.descendants(entity);
        doomed.push(entity);
        doomed
            .into_iter()
            .filter(|e| {
                self.children.remove(&Some(*e));
                self.world.despawn(*e).is_ok()
            })
            .count()
    }

    pub fn transform(&self, entity: Entity) -> Option<Transform> {
        self.world.get::<&Transform>(entity).ok().map(|t| *t)
    }

    /// Returns false if the entity does not exist
    pub fn set_transform(&mut self, entity: Entity, transform: Transform) -> bool {
        match self.world.get::<&mut Transform>(entity) {
            Ok(mut current) => {
                *current = transform;
                true
            }
            Err(_) => false,
        }
    }

    pub fn body(&self, entity: Entity) -> Option<Body> {
        self.world.get::<&Body>(entity).ok().map(|b| *b)
    }

    pub fn character(&self, entity: Entity) -> Option<Character> {
        self.world.get::<&Character>(entity).ok().map(|c| *c)
    }

    /// World-space bounds of an object's body
    pub fn world_bounds(&self, entity: Entity) -> Option<Bounds> {
        let transform = self.transform(entity)?;
        let body = self.body(entity)?;
        Some(Bounds::of_box(&transform, body.offset, body.size))
    }

    /// All player avatars currently in the world
    pub fn characters(&self) -> Vec<Entity> {
        self.world
            .query::<&Character>()
            .iter()
            .map(|(entity, _)| entity)
            .collect()
    }

    /// Total number of objects
    pub fn node_count(&self) -> usize {
        self.world.len() as usize
    }
}

impl Default for HostWorld {
    fn default() -> Self {
        Self::new()
    }
}
