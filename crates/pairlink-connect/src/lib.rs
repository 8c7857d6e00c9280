//! Pairlink Connect - Grab, snap, and puzzle-unlock orchestration
//!
//! The per-tick control logic for a connect-the-pieces puzzle: a user grabs
//! two pairable objects, drags them together, and they snap into a permanent
//! joined state once their connector edges align.
//!
//! ## Architecture
//!
//! ```text
//! PairConnect (owns the state machine)
//!  │
//!  ├── PhysicsBridge (trait) ← body options, constraints, collisions
//!  ├── Scene (trait)         ← position get/set, visibility
//!  └── FeedbackSink (trait)  ← success signal
//! ```
//!
//! The orchestrator never touches body state directly and holds no ambient
//! globals; collaborators arrive by constructor injection. One
//! [`PairConnect::tick`] call per simulation frame drives the whole state
//! machine; step ordering inside the tick substitutes for locking.

mod bridge;
mod config;
mod error;
mod scene;
mod system;

pub use bridge::{
    ActivationState, BodyOptions, BodyType, ConstraintKind, ConstraintSpec, PhysicsBridge,
    PhysicsHandle,
};
pub use config::SnapConfig;
pub use error::{ConfigError, Error, Result};
pub use scene::{FeedbackSink, Scene};
pub use system::{PairConnect, TickReport};
