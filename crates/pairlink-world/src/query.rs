//! Transition queries over tag predicates
//!
//! A predicate is a boolean combination of tag presence (AND) and absence
//! (NOT). A [`TransitionQuery`] keeps the predicate's previous-tick matching
//! set and reports enter/exit sets by set difference, so callers see
//! membership *transitions* instead of steady state.
//!
//! Evaluation never mutates the world. Tag mutations made after an
//! evaluation become visible at the next one; a per-tick system evaluates
//! all of its queries once at the start of the tick and works from those
//! snapshots.

use crate::{EntityId, Tag, World};
use indexmap::IndexSet;

/// A tag predicate: all of `all`, none of `none`
///
/// The first positive tag anchors iteration, so the matching set comes back
/// in insertion order of that tag's assignment.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct Predicate {
    all: Vec<Tag>,
    none: Vec<Tag>,
}

impl Predicate {
    /// Create a predicate requiring every tag in `tags`
    ///
    /// # Panics
    ///
    /// Panics if `tags` is empty: a predicate needs at least one positive
    /// tag to anchor iteration order.
    pub fn all(tags: impl IntoIterator<Item = Tag>) -> Self {
        let all: Vec<Tag> = tags.into_iter().collect();
        assert!(
            !all.is_empty(),
            "predicate requires at least one positive tag"
        );
        Self {
            all,
            none: Vec::new(),
        }
    }

    /// Additionally require the absence of `tag`
    pub fn without(mut self, tag: Tag) -> Self {
        self.none.push(tag);
        self
    }

    /// Check whether a single entity matches
    pub fn matches(&self, world: &World, id: EntityId) -> bool {
        world.contains(id)
            && self.all.iter().all(|&tag| world.has_tag(id, tag))
            && self.none.iter().all(|&tag| !world.has_tag(id, tag))
    }

    /// The current matching set, in insertion order of the anchor tag
    pub fn select(&self, world: &World) -> Vec<EntityId> {
        world
            .tagged(self.all[0])
            .filter(|&id| self.matches(world, id))
            .collect()
    }
}

/// Result of evaluating a [`TransitionQuery`] for one tick
#[derive(Debug, Clone, Default)]
pub struct QuerySnapshot {
    /// Entities newly matching since the previous evaluation
    pub entered: Vec<EntityId>,
    /// Entities that stopped matching since the previous evaluation
    pub exited: Vec<EntityId>,
    /// All entities currently matching
    pub current: Vec<EntityId>,
}

/// A predicate with memory of its previous-tick matching set
#[derive(Debug, Clone)]
pub struct TransitionQuery {
    predicate: Predicate,
    previous: IndexSet<EntityId>,
}

impl TransitionQuery {
    /// Create a query with an empty previous set
    ///
    /// Every entity matching at the first evaluation is reported as entered.
    pub fn new(predicate: Predicate) -> Self {
        Self {
            predicate,
            previous: IndexSet::new(),
        }
    }

    /// The predicate this query evaluates
    pub fn predicate(&self) -> &Predicate {
        &self.predicate
    }

    /// Evaluate against the world and advance the baseline
    ///
    /// Enter preserves current-set order, exit preserves previous-set order.
    pub fn evaluate(&mut self, world: &World) -> QuerySnapshot {
        let current = self.predicate.select(world);
        let current_set: IndexSet<EntityId> = current.iter().copied().collect();

        let entered = current
            .iter()
            .copied()
            .filter(|id| !self.previous.contains(id))
            .collect();
        let exited = self
            .previous
            .iter()
            .copied()
            .filter(|id| !current_set.contains(id))
            .collect();

        self.previous = current_set;
        QuerySnapshot {
            entered,
            exited,
            current,
        }
    }
}
