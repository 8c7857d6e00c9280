//! Physics bridge - the consumed surface of the physics engine
//!
//! The orchestrator mutates body state only through this trait. All calls
//! are synchronous and return immediately; the engine integrates on its own
//! schedule and is never awaited.

use glam::Vec3;
use pairlink_world::{BodyId, EntityId};
use serde::{Deserialize, Serialize};

/// Simulation mode for a rigid body
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
pub enum BodyType {
    /// Fully simulated
    Dynamic,
    /// Driven externally, pushes but is not pushed
    Kinematic,
    /// Immobile and no longer interactive
    Static,
}

/// Sleep/wake policy for a rigid body
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
pub enum ActivationState {
    /// Awake now, may auto-deactivate when it settles
    Active,
    /// Never auto-deactivates
    DisableDeactivation,
}

/// Body parameters the orchestrator manages
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
pub struct BodyOptions {
    pub body_type: BodyType,
    pub activation: ActivationState,
}

impl BodyOptions {
    /// Options while a hand drives the body: tracks the hand exactly,
    /// never deactivating mid-drag
    pub fn held() -> Self {
        Self {
            body_type: BodyType::Dynamic,
            activation: ActivationState::DisableDeactivation,
        }
    }

    /// Default settled state: dynamic and awake
    pub fn released() -> Self {
        Self {
            body_type: BodyType::Dynamic,
            activation: ActivationState::Active,
        }
    }

    /// Terminal post-snap state: immobile, out of the interaction loop
    pub fn frozen() -> Self {
        Self {
            body_type: BodyType::Static,
            activation: ActivationState::Active,
        }
    }
}

/// Constraint topology
///
/// Exactly one topology is supported; the variant exists so the wire shape
/// matches the bridge's vocabulary rather than being an implicit default.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
pub enum ConstraintKind {
    PointToPoint,
}

/// Parameters for a constraint between two bodies
#[derive(Debug, Clone, Copy, PartialEq, Serialize, Deserialize)]
pub struct ConstraintSpec {
    pub kind: ConstraintKind,
    /// Pivot in the constrained body's local frame
    pub pivot_a: Vec3,
    /// Pivot in the target body's local frame
    pub pivot_b: Vec3,
}

impl ConstraintSpec {
    /// Point-to-point constraint pivoting at each body's local origin
    pub fn point_to_point() -> Self {
        Self {
            kind: ConstraintKind::PointToPoint,
            pivot_a: Vec3::ZERO,
            pivot_b: Vec3::ZERO,
        }
    }
}

/// Opaque handle for a collision partner reported by the engine
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
pub struct PhysicsHandle(pub u64);

/// The physics engine surface the orchestrator consumes
pub trait PhysicsBridge {
    /// Update a body's simulation parameters
    fn update_body_options(&mut self, body: BodyId, options: BodyOptions);

    /// Create a constraint between `body` and `target`, keyed by the
    /// interactor entity that owns it
    fn add_constraint(
        &mut self,
        interactor: EntityId,
        body: BodyId,
        target: BodyId,
        spec: ConstraintSpec,
    );

    /// Remove the constraint owned by an interactor, if any
    fn remove_constraint(&mut self, interactor: EntityId);

    /// Enumerate a body's currently active collision partners
    fn collisions(&self, body: BodyId) -> Vec<PhysicsHandle>;

    /// Map a collision partner back to its scene entity
    fn entity_for(&self, handle: PhysicsHandle) -> Option<EntityId>;
}
