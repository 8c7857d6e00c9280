//! Pairlink World - Tag-based entity store with transition queries
//!
//! This crate provides the query primitive layer for the pairlink engine:
//! - Entity and body identifiers
//! - A tag store with insertion-ordered membership and typed side tables
//! - Transition queries that report enter/exit sets between ticks
//! - Ancestor resolution over explicit parent links
//!
//! ## Transition Queries
//!
//! Steady-state membership is rarely what a per-frame system wants; it needs
//! to know what *changed* since the previous frame. [`TransitionQuery`]
//! remembers its previous matching set and reports the difference:
//!
//! ```
//! use pairlink_world::{Predicate, Tag, TransitionQuery, World};
//!
//! let mut world = World::new();
//! let mut held = TransitionQuery::new(Predicate::all([Tag::Pairable]));
//!
//! let e = world.spawn();
//! world.add_tag(e, Tag::Pairable);
//!
//! let snapshot = held.evaluate(&world);
//! assert_eq!(snapshot.entered, vec![e]);
//!
//! let snapshot = held.evaluate(&world);
//! assert!(snapshot.entered.is_empty()); // still matching, no transition
//! ```

mod error;
mod hierarchy;
mod identity;
mod query;
mod tag;
mod world;

pub use error::{Error, Result};
pub use hierarchy::{resolve_body, MAX_ANCESTOR_DEPTH};
pub use identity::{BodyId, EntityId};
pub use query::{Predicate, QuerySnapshot, TransitionQuery};
pub use tag::{Hand, PairSide, Tag};
pub use world::{PairHalf, World};
