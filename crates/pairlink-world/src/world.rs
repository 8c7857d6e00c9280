//! Entity/tag store with typed side tables

use crate::{BodyId, EntityId, PairSide, Tag};
use indexmap::{IndexMap, IndexSet};
use serde::{Deserialize, Serialize};

/// Pair membership for a pairable entity
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
pub struct PairHalf {
    /// Which pair this entity belongs to; must match its partner
    pub pair_id: u32,
    /// Which half this entity represents; must differ from its partner
    pub side: PairSide,
}

/// Storage for all entities, their tags, and scene ownership links
///
/// Tag membership is kept per tag in insertion order of tag assignment.
/// That order is the deterministic iteration contract for queries; it is
/// *not* sorted and callers must not assume it is.
#[derive(Debug, Clone, Default, Serialize, Deserialize)]
pub struct World {
    /// All live entities in spawn order
    alive: IndexSet<EntityId>,
    /// Next entity ID to assign
    next_id: u64,
    /// Tag membership, insertion-ordered per tag
    tags: IndexMap<Tag, IndexSet<EntityId>>,
    /// Parent links (entity -> parent), explicit index rather than pointers
    parents: IndexMap<EntityId, EntityId>,
    /// Pair membership for `Tag::Pairable` entities
    pairables: IndexMap<EntityId, PairHalf>,
    /// Physics handles for `Tag::RigidBody` entities
    bodies: IndexMap<EntityId, BodyId>,
    /// Unlock-target references for `Tag::PuzzleAnchor` entities
    anchors: IndexMap<EntityId, EntityId>,
}

impl World {
    /// Create a new empty world
    pub fn new() -> Self {
        Self::default()
    }

    /// Create a new entity
    pub fn spawn(&mut self) -> EntityId {
        let id = EntityId::new(self.next_id);
        self.next_id += 1;
        self.alive.insert(id);
        id
    }

    /// Destroy an entity, scrubbing it from every tag set and side table
    ///
    /// Children keep their parent link to the dead entity; the ancestor
    /// resolver treats a dangling link as a stale-entity race.
    pub fn despawn(&mut self, id: EntityId) -> bool {
        if !self.alive.shift_remove(&id) {
            return false;
        }
        for members in self.tags.values_mut() {
            members.shift_remove(&id);
        }
        self.parents.shift_remove(&id);
        self.pairables.shift_remove(&id);
        self.bodies.shift_remove(&id);
        self.anchors.shift_remove(&id);
        true
    }

    /// Check whether an entity is still alive
    pub fn contains(&self, id: EntityId) -> bool {
        self.alive.contains(&id)
    }

    /// Set an entity's parent in the ownership hierarchy
    pub fn set_parent(&mut self, child: EntityId, parent: EntityId) {
        self.parents.insert(child, parent);
    }

    /// Get an entity's parent, if it has one
    pub fn parent(&self, id: EntityId) -> Option<EntityId> {
        self.parents.get(&id).copied()
    }

    /// Add a tag to a live entity; no-op for dead entities or repeat adds
    pub fn add_tag(&mut self, id: EntityId, tag: Tag) -> bool {
        if !self.alive.contains(&id) {
            return false;
        }
        self.tags.entry(tag).or_default().insert(id)
    }

    /// Remove a tag from an entity
    pub fn remove_tag(&mut self, id: EntityId, tag: Tag) -> bool {
        self.tags
            .get_mut(&tag)
            .map(|members| members.shift_remove(&id))
            .unwrap_or(false)
    }

    /// Check whether an entity carries a tag
    pub fn has_tag(&self, id: EntityId, tag: Tag) -> bool {
        self.tags
            .get(&tag)
            .map(|members| members.contains(&id))
            .unwrap_or(false)
    }

    /// Iterate entities carrying a tag, in insertion order of assignment
    pub fn tagged(&self, tag: Tag) -> impl Iterator<Item = EntityId> + '_ {
        self.tags
            .get(&tag)
            .into_iter()
            .flat_map(|members| members.iter().copied())
    }

    /// Get the first entity carrying a tag (the `any entity with` lookup)
    pub fn first_tagged(&self, tag: Tag) -> Option<EntityId> {
        self.tagged(tag).next()
    }

    /// Count entities carrying a tag
    pub fn tag_count(&self, tag: Tag) -> usize {
        self.tags.get(&tag).map(|members| members.len()).unwrap_or(0)
    }

    /// Mark an entity as one half of a connectable pair
    pub fn set_pairable(&mut self, id: EntityId, pair_id: u32, side: PairSide) {
        if self.add_tag(id, Tag::Pairable) || self.has_tag(id, Tag::Pairable) {
            self.pairables.insert(id, PairHalf { pair_id, side });
        }
    }

    /// Get an entity's pair membership
    pub fn pair_half(&self, id: EntityId) -> Option<PairHalf> {
        self.pairables.get(&id).copied()
    }

    /// Attach a physics body handle to an entity
    pub fn set_body(&mut self, id: EntityId, body: BodyId) {
        if self.add_tag(id, Tag::RigidBody) || self.has_tag(id, Tag::RigidBody) {
            self.bodies.insert(id, body);
        }
    }

    /// Get the physics body handle carried by an entity
    pub fn body_id(&self, id: EntityId) -> Option<BodyId> {
        self.bodies.get(&id).copied()
    }

    /// Mark an entity as a puzzle anchor revealing `unlock_target`
    pub fn set_anchor(&mut self, id: EntityId, unlock_target: EntityId) {
        if self.add_tag(id, Tag::PuzzleAnchor) || self.has_tag(id, Tag::PuzzleAnchor) {
            self.anchors.insert(id, unlock_target);
        }
    }

    /// Get the object a puzzle anchor reveals on completion
    pub fn unlock_target(&self, id: EntityId) -> Option<EntityId> {
        self.anchors.get(&id).copied()
    }

    /// Number of live entities
    pub fn len(&self) -> usize {
        self.alive.len()
    }

    /// Check if the world is empty
    pub fn is_empty(&self) -> bool {
        self.alive.is_empty()
    }
}
