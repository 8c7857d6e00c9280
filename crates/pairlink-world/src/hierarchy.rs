//! Ancestor resolution over explicit parent links
//!
//! Rigid bodies are frequently owned by a parent in the scene hierarchy,
//! not by the pairable leaf itself. The resolver walks parent links upward,
//! starting at the entity itself, until one carries [`Tag::RigidBody`].

use crate::{EntityId, Error, Result, Tag, World};

/// Maximum number of parent links the resolver will follow
pub const MAX_ANCESTOR_DEPTH: usize = 64;

/// Find the nearest ancestor (inclusive) carrying a rigid body
///
/// Resolution is deterministic: the walk stops at the first entity with
/// [`Tag::RigidBody`]. Fails with [`Error::EntityMissing`] if the chain hits
/// a dead entity, [`Error::NoRigidBodyAncestor`] if it is exhausted, and
/// [`Error::AncestorDepthExceeded`] if the depth cap trips.
pub fn resolve_body(world: &World, entity: EntityId) -> Result<EntityId> {
    let mut current = entity;
    for _ in 0..=MAX_ANCESTOR_DEPTH {
        if !world.contains(current) {
            return Err(Error::EntityMissing(current));
        }
        if world.has_tag(current, Tag::RigidBody) {
            return Ok(current);
        }
        match world.parent(current) {
            Some(parent) => current = parent,
            None => return Err(Error::NoRigidBodyAncestor(entity)),
        }
    }
    Err(Error::AncestorDepthExceeded(entity))
}
