//! Tag vocabulary for the pair-connect domain
//!
//! Tags are plain markers; data that belongs with a tag (pair id, body
//! handle, unlock reference) lives in typed side tables on the
//! [`World`](crate::World). The vocabulary is closed, so predicates dispatch
//! over a `Copy` enum instead of runtime-reflected component handles.

use serde::{Deserialize, Serialize};
use std::fmt;

/// Boolean tags an entity can carry
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
pub enum Tag {
    /// One half of a connectable pair (pair id + side in the side table)
    Pairable,
    /// The owning rigid body has received its one-time ready configuration
    Initialized,
    /// Terminal: permanently joined to its partner
    Connected,
    /// Currently held by the left hand (written by the grab subsystem)
    HeldLeft,
    /// Currently held by the right hand (written by the grab subsystem)
    HeldRight,
    /// This system owns an active left-hand constraint on the body
    ConstraintLeft,
    /// This system owns an active right-hand constraint on the body
    ConstraintRight,
    /// Aggregate: at least one hand constraint is active on the body
    Constraint,
    /// Aggregates puzzle completion and reveals an unlock object
    PuzzleAnchor,
    /// Carries a physics body handle (side table holds the `BodyId`)
    RigidBody,
    /// Marks the left-hand interactor entity
    HandLeft,
    /// Marks the right-hand interactor entity
    HandRight,
}

impl fmt::Display for Tag {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "{:?}", self)
    }
}

/// One of the two fixed manipulation sources
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
pub enum Hand {
    Left,
    Right,
}

impl Hand {
    /// Both hands, right first to match the original processing order
    pub const BOTH: [Hand; 2] = [Hand::Right, Hand::Left];

    /// Tag the grab subsystem sets on an object held by this hand
    pub fn held_tag(&self) -> Tag {
        match self {
            Hand::Left => Tag::HeldLeft,
            Hand::Right => Tag::HeldRight,
        }
    }

    /// Tag marking an active constraint owned by this hand
    pub fn constraint_tag(&self) -> Tag {
        match self {
            Hand::Left => Tag::ConstraintLeft,
            Hand::Right => Tag::ConstraintRight,
        }
    }

    /// Tag marking this hand's interactor entity
    pub fn interactor_tag(&self) -> Tag {
        match self {
            Hand::Left => Tag::HandLeft,
            Hand::Right => Tag::HandRight,
        }
    }
}

impl fmt::Display for Hand {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            Hand::Left => write!(f, "left"),
            Hand::Right => write!(f, "right"),
        }
    }
}

/// Which half of a pair an entity represents
///
/// The two sides offset their connector edges in opposite directions along
/// the connector axis so the edges face each other.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
pub enum PairSide {
    A,
    B,
}

impl PairSide {
    /// Sign of the connector-edge offset along the connector axis
    pub fn axis_sign(&self) -> f32 {
        match self {
            PairSide::A => 1.0,
            PairSide::B => -1.0,
        }
    }

    /// The side a partner must carry to be connectable
    pub fn opposite(&self) -> PairSide {
        match self {
            PairSide::A => PairSide::B,
            PairSide::B => PairSide::A,
        }
    }
}
