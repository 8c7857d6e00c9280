//! Identity types for entities and physics bodies

use serde::{Deserialize, Serialize};
use std::fmt;

/// Unique identifier for an entity instance at runtime
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
pub struct EntityId(pub u64);

impl EntityId {
    /// Create a new entity ID
    pub fn new(id: u64) -> Self {
        Self(id)
    }

    /// Get the raw ID value
    pub fn raw(&self) -> u64 {
        self.0
    }
}

impl fmt::Display for EntityId {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "entity:{}", self.0)
    }
}

/// Handle for a rigid body inside the physics engine
///
/// Owned by some ancestor of a pairable entity in the scene hierarchy,
/// never allocated by this crate.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
pub struct BodyId(pub u32);

impl BodyId {
    /// Create a new body ID
    pub fn new(id: u32) -> Self {
        Self(id)
    }

    /// Get the raw handle value
    pub fn raw(&self) -> u32 {
        self.0
    }
}

impl fmt::Display for BodyId {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "body:{}", self.0)
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_entity_id() {
        let id = EntityId::new(42);
        assert_eq!(id.raw(), 42);
        assert_eq!(format!("{}", id), "entity:42");
    }

    #[test]
    fn test_body_id() {
        let id = BodyId::new(7);
        assert_eq!(id.raw(), 7);
        assert_eq!(format!("{}", id), "body:7");
    }
}
