//! Error types for pairlink-world

use crate::EntityId;
use thiserror::Error;

/// World error type
#[derive(Error, Debug, Clone, Copy, PartialEq, Eq)]
pub enum Error {
    /// The entity (or an ancestor in its chain) no longer exists.
    ///
    /// A stale-entity race, not a defect: callers skip the affected
    /// interaction silently.
    #[error("entity missing: {0}")]
    EntityMissing(EntityId),

    /// The ownership chain was exhausted without finding a rigid body.
    ///
    /// A scene-authoring defect; logged by callers, never fatal.
    #[error("no rigid-body ancestor for {0}")]
    NoRigidBodyAncestor(EntityId),

    /// The parent walk exceeded the depth cap.
    ///
    /// Authoring guarantees a tree; hitting the cap means a cycle crept in,
    /// so the resolver fails closed instead of looping.
    #[error("ancestor walk exceeded depth cap for {0}")]
    AncestorDepthExceeded(EntityId),
}

/// Result type alias
pub type Result<T> = std::result::Result<T, Error>;
