//! Pair-connect orchestrator
//!
//! One [`PairConnect::tick`] call per simulation frame drives the per-entity
//! state machine `Idle -> Held -> Connected` (`Held` can return to `Idle`;
//! `Connected` is terminal). The tick runs a fixed step order:
//!
//! 1. hide unlock targets of newly present puzzle anchors
//! 2. lazy catch-up initialization of untouched pairables
//! 3. grab handling (newly held entities)
//! 4. snap detection (held entities, including this frame's releases)
//! 5. release handling
//! 6. puzzle-completion re-evaluation (debounced on connect ticks)
//!
//! The order matters: initialization precedes grab handling, and snap
//! detection precedes release handling so a connect-on-release frame counts
//! as connecting, not releasing-to-idle. Tag mutations are not transactional
//! across steps; the ordering itself is the concurrency-correctness
//! mechanism.

use crate::{
    bridge::{BodyOptions, ConstraintSpec, PhysicsBridge},
    config::SnapConfig,
    error::Result,
    scene::{FeedbackSink, Scene},
};
use indexmap::IndexSet;
use pairlink_world::{
    resolve_body, EntityId, Error as WorldError, Hand, Predicate, QuerySnapshot, Tag,
    TransitionQuery, World,
};
use tracing::{debug, warn};

/// What happened during one orchestrator tick
#[derive(Debug, Clone, Default)]
pub struct TickReport {
    /// Pairs connected this tick (held entity, partner)
    pub connected: Vec<(EntityId, EntityId)>,
    /// Body entities that received their one-time ready configuration
    pub initialized: Vec<EntityId>,
    /// Grabs processed
    pub grabs: usize,
    /// Releases processed
    pub releases: usize,
}

/// The per-frame pair-connect state machine
///
/// Collaborators arrive by constructor injection; the orchestrator holds no
/// ambient globals and mutates physics state only through the bridge.
pub struct PairConnect<P, S, F> {
    physics: P,
    scene: S,
    feedback: F,
    config: SnapConfig,
    anchors: TransitionQuery,
    /// One held-query per hand, in [`Hand::BOTH`] order
    held: [TransitionQuery; 2],
    /// Entities already reported as authoring defects (warn once, not per frame)
    authoring_warned: IndexSet<EntityId>,
}

impl<P, S, F> PairConnect<P, S, F>
where
    P: PhysicsBridge,
    S: Scene,
    F: FeedbackSink,
{
    /// Create an orchestrator with the default snap geometry
    pub fn new(physics: P, scene: S, feedback: F) -> Self {
        Self::build(physics, scene, feedback, SnapConfig::default())
    }

    /// Create an orchestrator with explicit snap geometry
    pub fn with_config(physics: P, scene: S, feedback: F, config: SnapConfig) -> Result<Self> {
        config.validate()?;
        Ok(Self::build(physics, scene, feedback, config))
    }

    fn build(physics: P, scene: S, feedback: F, config: SnapConfig) -> Self {
        let held = Hand::BOTH.map(|hand| {
            TransitionQuery::new(
                Predicate::all([hand.held_tag(), Tag::Pairable]).without(Tag::Connected),
            )
        });
        Self {
            physics,
            scene,
            feedback,
            config,
            anchors: TransitionQuery::new(Predicate::all([Tag::PuzzleAnchor])),
            held,
            authoring_warned: IndexSet::new(),
        }
    }

    /// The snap geometry in use
    pub fn config(&self) -> &SnapConfig {
        &self.config
    }

    /// The injected physics bridge
    pub fn physics(&self) -> &P {
        &self.physics
    }

    /// Mutable access to the physics bridge (for hosts that feed it)
    pub fn physics_mut(&mut self) -> &mut P {
        &mut self.physics
    }

    /// The injected scene
    pub fn scene(&self) -> &S {
        &self.scene
    }

    /// Mutable access to the scene
    pub fn scene_mut(&mut self) -> &mut S {
        &mut self.scene
    }

    /// The injected feedback sink
    pub fn feedback(&self) -> &F {
        &self.feedback
    }

    /// Run one orchestrator pass
    pub fn tick(&mut self, world: &mut World) -> TickReport {
        let mut report = TickReport::default();

        // Snapshot every query before any mutation; the snapshots are the
        // view of this tick for all six steps.
        let anchors = self.anchors.evaluate(world);
        let held = [self.held[0].evaluate(world), self.held[1].evaluate(world)];
        let uninitialized = Predicate::all([Tag::Pairable])
            .without(Tag::Initialized)
            .select(world);

        self.hide_new_anchor_targets(world, &anchors.entered);
        self.catch_up_initialization(world, &held, &uninitialized, &mut report);
        for (snapshot, hand) in held.iter().zip(Hand::BOTH) {
            self.grab(world, hand, &snapshot.entered, &mut report);
        }
        self.debug_check_constraint_invariant(world);
        let connected_this_tick = self.detect_snaps(world, &held, &mut report);
        for (snapshot, hand) in held.iter().zip(Hand::BOTH) {
            self.release(world, hand, &snapshot.exited, &mut report);
        }
        self.debug_check_constraint_invariant(world);
        if !connected_this_tick {
            self.refresh_puzzle_anchors(world);
        }
        report
    }

    /// Step 1: puzzles start locked; hide unlock targets of new anchors
    fn hide_new_anchor_targets(&mut self, world: &World, entered: &[EntityId]) {
        for &anchor in entered {
            let Some(target) = world.unlock_target(anchor) else {
                continue;
            };
            self.scene.set_visible(target, false);
        }
    }

    /// Step 2: the first time any grab happens, settle every untouched
    /// pairable into the default released physics state
    fn catch_up_initialization(
        &mut self,
        world: &mut World,
        held: &[QuerySnapshot; 2],
        uninitialized: &[EntityId],
        report: &mut TickReport,
    ) {
        let newly_held: IndexSet<EntityId> = held
            .iter()
            .flat_map(|snapshot| snapshot.entered.iter().copied())
            .collect();
        if newly_held.is_empty() {
            return;
        }
        for &entity in uninitialized {
            if newly_held.contains(&entity) {
                continue;
            }
            let Some(body) = self.resolve_or_skip(world, entity) else {
                continue;
            };
            let Some(body_id) = world.body_id(body) else {
                continue;
            };
            self.physics.update_body_options(body_id, BodyOptions::released());
            mark_initialized(world, entity, body, report);
        }
    }

    /// Step 3: lock a newly held body to its hand
    fn grab(&mut self, world: &mut World, hand: Hand, entered: &[EntityId], report: &mut TickReport) {
        if entered.is_empty() {
            return;
        }
        let Some(interactor) = world.first_tagged(hand.interactor_tag()) else {
            debug!(%hand, "no interactor entity, grab skipped");
            return;
        };
        let Some(interactor_body) = world.body_id(interactor) else {
            if self.authoring_warned.insert(interactor) {
                warn!(%interactor, %hand, "interactor carries no rigid body, grab skipped");
            }
            return;
        };
        for &entity in entered {
            let Some(body) = self.resolve_or_skip(world, entity) else {
                continue;
            };
            let Some(body_id) = world.body_id(body) else {
                continue;
            };
            self.physics.update_body_options(body_id, BodyOptions::held());
            self.physics.add_constraint(
                interactor,
                body_id,
                interactor_body,
                ConstraintSpec::point_to_point(),
            );
            world.add_tag(body, Tag::Constraint);
            world.add_tag(body, hand.constraint_tag());
            mark_initialized(world, entity, body, report);
            report.grabs += 1;
            debug!(%entity, %hand, "grabbed");
        }
    }

    /// Step 4: look for a snap on every entity held this frame
    ///
    /// Includes entities whose held-tag exited this tick: they were held
    /// until this frame, and a connect-on-release frame counts as
    /// connecting. Returns whether any pair connected.
    fn detect_snaps(
        &mut self,
        world: &mut World,
        held: &[QuerySnapshot; 2],
        report: &mut TickReport,
    ) -> bool {
        let candidates: IndexSet<EntityId> = held
            .iter()
            .flat_map(|snapshot| snapshot.current.iter().chain(snapshot.exited.iter()))
            .copied()
            .collect();
        let mut connected_any = false;

        for &entity in &candidates {
            // The partner of an earlier snap this tick is already terminal.
            if world.has_tag(entity, Tag::Connected) {
                continue;
            }
            let Some(half) = world.pair_half(entity) else {
                continue;
            };
            let Some(body) = self.resolve_or_skip(world, entity) else {
                continue;
            };
            let Some(body_id) = world.body_id(body) else {
                continue;
            };

            // First collision partner with the same pair id and the opposite
            // side wins; enumeration order is the deterministic tie-break.
            let mut candidate = None;
            for handle in self.physics.collisions(body_id) {
                let Some(other) = self.physics.entity_for(handle) else {
                    continue;
                };
                if other == entity || !world.contains(other) {
                    continue;
                }
                if world.has_tag(other, Tag::Connected) {
                    continue;
                }
                let Some(other_half) = world.pair_half(other) else {
                    continue;
                };
                if other_half.pair_id == half.pair_id && other_half.side == half.side.opposite() {
                    candidate = Some((other, other_half));
                    break;
                }
            }
            let Some((partner, partner_half)) = candidate else {
                continue;
            };

            let (Some(position), Some(partner_position)) =
                (self.scene.position(entity), self.scene.position(partner))
            else {
                continue;
            };
            let offset = self.config.unit_axis() * self.config.connector_half_length;
            let edge = position + offset * half.side.axis_sign();
            let partner_edge = partner_position + offset * partner_half.side.axis_sign();
            if edge.distance(partner_edge) >= self.config.snap_threshold {
                continue;
            }

            let Some(partner_body) = self.resolve_or_skip(world, partner) else {
                continue;
            };
            let Some(partner_body_id) = world.body_id(partner_body) else {
                continue;
            };

            // Commit: land this object's edge exactly on the partner's,
            // freeze both bodies, and reclaim any live hand constraints so
            // nothing stale outlives the connection.
            self.scene
                .set_position(entity, partner_edge - offset * half.side.axis_sign());
            self.physics.update_body_options(body_id, BodyOptions::frozen());
            self.physics
                .update_body_options(partner_body_id, BodyOptions::frozen());
            self.clear_hand_constraints(world, body);
            self.clear_hand_constraints(world, partner_body);
            world.add_tag(entity, Tag::Connected);
            world.add_tag(partner, Tag::Connected);
            self.feedback.success();
            report.connected.push((entity, partner));
            connected_any = true;
            debug!(%entity, %partner, pair_id = half.pair_id, "pair connected");
        }
        connected_any
    }

    /// Step 5: return a released body to the default dynamic state
    fn release(&mut self, world: &mut World, hand: Hand, exited: &[EntityId], report: &mut TickReport) {
        if exited.is_empty() {
            return;
        }
        let interactor = world.first_tagged(hand.interactor_tag());
        for &entity in exited {
            if !world.contains(entity) {
                continue;
            }
            // An exit caused by connecting is not a release; the snap step
            // already froze the body and reclaimed the constraint.
            if world.has_tag(entity, Tag::Connected) {
                continue;
            }
            if !world.has_tag(entity, Tag::Pairable) {
                continue;
            }
            let Some(body) = self.resolve_or_skip(world, entity) else {
                continue;
            };
            let Some(body_id) = world.body_id(body) else {
                continue;
            };
            self.physics.update_body_options(body_id, BodyOptions::released());
            if let Some(interactor) = interactor {
                self.physics.remove_constraint(interactor);
            }
            world.remove_tag(body, hand.constraint_tag());
            if !world.has_tag(body, Tag::ConstraintLeft)
                && !world.has_tag(body, Tag::ConstraintRight)
            {
                world.remove_tag(body, Tag::Constraint);
            }
            report.releases += 1;
            debug!(%entity, %hand, "released");
        }
    }

    /// Step 6: reveal unlock targets iff every pairable is connected
    fn refresh_puzzle_anchors(&mut self, world: &World) {
        let complete = world.tag_count(Tag::Pairable) == world.tag_count(Tag::Connected);
        for anchor in world.tagged(Tag::PuzzleAnchor) {
            let Some(target) = world.unlock_target(anchor) else {
                continue;
            };
            if !world.contains(target) {
                continue;
            }
            self.scene.set_visible(target, complete);
        }
    }

    /// Remove every live hand constraint from a body and drop the aggregate
    fn clear_hand_constraints(&mut self, world: &mut World, body: EntityId) {
        for hand in Hand::BOTH {
            if world.remove_tag(body, hand.constraint_tag()) {
                if let Some(interactor) = world.first_tagged(hand.interactor_tag()) {
                    self.physics.remove_constraint(interactor);
                }
            }
        }
        world.remove_tag(body, Tag::Constraint);
    }

    /// Resolve an entity's owning body, applying the failure taxonomy:
    /// stale entities are silent, authoring defects warn once
    fn resolve_or_skip(&mut self, world: &World, entity: EntityId) -> Option<EntityId> {
        match resolve_body(world, entity) {
            Ok(body) => Some(body),
            Err(WorldError::EntityMissing(_)) => None,
            Err(err) => {
                if self.authoring_warned.insert(entity) {
                    warn!(%entity, %err, "scene authoring defect, entity skipped");
                }
                None
            }
        }
    }

    /// `Constraint` must hold iff at least one hand constraint holds
    fn debug_check_constraint_invariant(&self, world: &World) {
        if cfg!(debug_assertions) {
            for body in world.tagged(Tag::Constraint) {
                debug_assert!(
                    world.has_tag(body, Tag::ConstraintLeft)
                        || world.has_tag(body, Tag::ConstraintRight),
                    "aggregate constraint tag without a hand constraint on {body}"
                );
            }
            for hand in Hand::BOTH {
                for body in world.tagged(hand.constraint_tag()) {
                    debug_assert!(
                        world.has_tag(body, Tag::Constraint),
                        "{hand} hand constraint without the aggregate tag on {body}"
                    );
                }
            }
        }
    }
}

/// The ready configuration is issued against the resolved body entity; the
/// pairable leaf is tagged as well when they differ, so the catch-up query
/// converges instead of reprocessing the leaf on every grab.
fn mark_initialized(
    world: &mut World,
    entity: EntityId,
    body: EntityId,
    report: &mut TickReport,
) {
    if world.add_tag(body, Tag::Initialized) {
        report.initialized.push(body);
    }
    if entity != body {
        world.add_tag(entity, Tag::Initialized);
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::bridge::PhysicsHandle;
    use glam::Vec3;
    use indexmap::IndexMap;
    use pairlink_world::{BodyId, PairSide};

    #[derive(Default)]
    struct MockPhysics {
        /// Option history per body, newest last
        options: IndexMap<BodyId, Vec<BodyOptions>>,
        /// Live constraints keyed by interactor
        constraints: IndexMap<EntityId, (BodyId, BodyId, ConstraintSpec)>,
        /// Every remove_constraint call, in order
        removals: Vec<EntityId>,
        /// Scripted collision pairs
        contacts: IndexMap<BodyId, Vec<PhysicsHandle>>,
        handles: IndexMap<PhysicsHandle, EntityId>,
    }

    impl MockPhysics {
        fn register(&mut self, body: BodyId, entity: EntityId) {
            self.handles.insert(PhysicsHandle(body.raw() as u64), entity);
        }

        fn set_contact(&mut self, a: BodyId, b: BodyId) {
            self.contacts
                .entry(a)
                .or_default()
                .push(PhysicsHandle(b.raw() as u64));
            self.contacts
                .entry(b)
                .or_default()
                .push(PhysicsHandle(a.raw() as u64));
        }

        fn last_options(&self, body: BodyId) -> Option<BodyOptions> {
            self.options.get(&body).and_then(|history| history.last()).copied()
        }
    }

    impl PhysicsBridge for MockPhysics {
        fn update_body_options(&mut self, body: BodyId, options: BodyOptions) {
            self.options.entry(body).or_default().push(options);
        }

        fn add_constraint(
            &mut self,
            interactor: EntityId,
            body: BodyId,
            target: BodyId,
            spec: ConstraintSpec,
        ) {
            self.constraints.insert(interactor, (body, target, spec));
        }

        fn remove_constraint(&mut self, interactor: EntityId) {
            self.constraints.shift_remove(&interactor);
            self.removals.push(interactor);
        }

        fn collisions(&self, body: BodyId) -> Vec<PhysicsHandle> {
            self.contacts.get(&body).cloned().unwrap_or_default()
        }

        fn entity_for(&self, handle: PhysicsHandle) -> Option<EntityId> {
            self.handles.get(&handle).copied()
        }
    }

    #[derive(Default)]
    struct MockScene {
        positions: IndexMap<EntityId, Vec3>,
        visibility: IndexMap<EntityId, bool>,
    }

    impl Scene for MockScene {
        fn position(&self, entity: EntityId) -> Option<Vec3> {
            self.positions.get(&entity).copied()
        }

        fn set_position(&mut self, entity: EntityId, position: Vec3) {
            self.positions.insert(entity, position);
        }

        fn set_visible(&mut self, entity: EntityId, visible: bool) {
            self.visibility.insert(entity, visible);
        }
    }

    #[derive(Default)]
    struct MockFeedback {
        successes: usize,
    }

    impl FeedbackSink for MockFeedback {
        fn success(&mut self) {
            self.successes += 1;
        }
    }

    struct Fixture {
        system: PairConnect<MockPhysics, MockScene, MockFeedback>,
        world: World,
        right_hand: EntityId,
        left_hand: EntityId,
    }

    const RIGHT_HAND_BODY: BodyId = BodyId(100);
    const LEFT_HAND_BODY: BodyId = BodyId(101);

    impl Fixture {
        fn new() -> Self {
            let mut world = World::new();
            let right_hand = world.spawn();
            world.add_tag(right_hand, Tag::HandRight);
            world.set_body(right_hand, RIGHT_HAND_BODY);
            let left_hand = world.spawn();
            world.add_tag(left_hand, Tag::HandLeft);
            world.set_body(left_hand, LEFT_HAND_BODY);

            Self {
                system: PairConnect::new(
                    MockPhysics::default(),
                    MockScene::default(),
                    MockFeedback::default(),
                ),
                world,
                right_hand,
                left_hand,
            }
        }

        /// Spawn a pairable piece carrying its own rigid body
        fn add_piece(&mut self, pair_id: u32, side: PairSide, body: u32, position: Vec3) -> EntityId {
            let entity = self.world.spawn();
            self.world.set_pairable(entity, pair_id, side);
            self.world.set_body(entity, BodyId::new(body));
            self.system.physics_mut().register(BodyId::new(body), entity);
            self.system.scene_mut().positions.insert(entity, position);
            entity
        }

        fn tick(&mut self) -> TickReport {
            self.system.tick(&mut self.world)
        }
    }

    #[test]
    fn test_grab_locks_body_and_adds_constraint() {
        let mut fx = Fixture::new();
        let piece = fx.add_piece(1, PairSide::A, 10, Vec3::ZERO);

        fx.world.add_tag(piece, Tag::HeldRight);
        let report = fx.tick();

        assert_eq!(report.grabs, 1);
        assert_eq!(
            fx.system.physics().last_options(BodyId::new(10)),
            Some(BodyOptions::held())
        );
        let (body, target, spec) = fx.system.physics().constraints[&fx.right_hand];
        assert_eq!(body, BodyId::new(10));
        assert_eq!(target, RIGHT_HAND_BODY);
        assert_eq!(spec, ConstraintSpec::point_to_point());
        assert!(fx.world.has_tag(piece, Tag::Constraint));
        assert!(fx.world.has_tag(piece, Tag::ConstraintRight));
        assert!(fx.world.has_tag(piece, Tag::Initialized));
    }

    #[test]
    fn test_grab_triggers_catch_up_initialization() {
        let mut fx = Fixture::new();
        let grabbed = fx.add_piece(1, PairSide::A, 10, Vec3::ZERO);
        let untouched = fx.add_piece(1, PairSide::B, 11, Vec3::new(5.0, 0.0, 0.0));

        // No grab yet: nobody initializes
        fx.tick();
        assert!(!fx.world.has_tag(untouched, Tag::Initialized));
        assert!(fx.system.physics().last_options(BodyId::new(11)).is_none());

        // First grab initializes every other untouched pairable too
        fx.world.add_tag(grabbed, Tag::HeldRight);
        let report = fx.tick();

        assert!(fx.world.has_tag(grabbed, Tag::Initialized));
        assert!(fx.world.has_tag(untouched, Tag::Initialized));
        assert_eq!(
            fx.system.physics().last_options(BodyId::new(11)),
            Some(BodyOptions::released())
        );
        assert_eq!(report.initialized, vec![untouched, grabbed]);

        // Catch-up is one-time: a later grab touches nobody else
        fx.world.remove_tag(grabbed, Tag::HeldRight);
        fx.tick();
        fx.world.add_tag(grabbed, Tag::HeldRight);
        let report = fx.tick();
        assert!(report.initialized.is_empty());
    }

    #[test]
    fn test_initialization_lands_on_resolved_body_ancestor() {
        let mut fx = Fixture::new();
        let owner = fx.world.spawn();
        fx.world.set_body(owner, BodyId::new(20));
        let leaf = fx.world.spawn();
        fx.world.set_pairable(leaf, 2, PairSide::A);
        fx.world.set_parent(leaf, owner);
        fx.system.physics_mut().register(BodyId::new(20), leaf);
        fx.system.scene_mut().positions.insert(leaf, Vec3::ZERO);

        fx.world.add_tag(leaf, Tag::HeldRight);
        let report = fx.tick();

        assert_eq!(report.initialized, vec![owner]);
        assert!(fx.world.has_tag(owner, Tag::Initialized));
        assert!(fx.world.has_tag(owner, Tag::ConstraintRight));
        // The leaf converges too so catch-up stops considering it
        assert!(fx.world.has_tag(leaf, Tag::Initialized));
    }

    #[test]
    fn test_release_resets_body_and_clears_tags() {
        let mut fx = Fixture::new();
        let piece = fx.add_piece(1, PairSide::A, 10, Vec3::ZERO);

        fx.world.add_tag(piece, Tag::HeldRight);
        fx.tick();
        fx.world.remove_tag(piece, Tag::HeldRight);
        let report = fx.tick();

        assert_eq!(report.releases, 1);
        assert_eq!(
            fx.system.physics().last_options(BodyId::new(10)),
            Some(BodyOptions::released())
        );
        assert_eq!(fx.system.physics().removals, vec![fx.right_hand]);
        assert!(!fx.world.has_tag(piece, Tag::ConstraintRight));
        assert!(!fx.world.has_tag(piece, Tag::Constraint));
    }

    #[test]
    fn test_releasing_one_hand_keeps_aggregate_constraint() {
        let mut fx = Fixture::new();
        let piece = fx.add_piece(1, PairSide::A, 10, Vec3::ZERO);

        fx.world.add_tag(piece, Tag::HeldRight);
        fx.world.add_tag(piece, Tag::HeldLeft);
        fx.tick();
        assert!(fx.world.has_tag(piece, Tag::ConstraintRight));
        assert!(fx.world.has_tag(piece, Tag::ConstraintLeft));

        fx.world.remove_tag(piece, Tag::HeldLeft);
        fx.tick();
        assert!(!fx.world.has_tag(piece, Tag::ConstraintLeft));
        assert!(fx.world.has_tag(piece, Tag::ConstraintRight));
        assert!(fx.world.has_tag(piece, Tag::Constraint));

        fx.world.remove_tag(piece, Tag::HeldRight);
        fx.tick();
        assert!(!fx.world.has_tag(piece, Tag::ConstraintRight));
        assert!(!fx.world.has_tag(piece, Tag::Constraint));
    }

    #[test]
    fn test_snap_fires_exactly_when_distance_drops_below_threshold() {
        let mut fx = Fixture::new();
        // Side B at the origin: its edge sits at x = -0.25. Side A's edge is
        // its position + 0.25, so edge distance = |x_a + 0.5|.
        let stationary = fx.add_piece(1, PairSide::B, 11, Vec3::ZERO);
        let held = fx.add_piece(1, PairSide::A, 10, Vec3::new(-2.5, 0.0, 0.0));
        fx.system
            .physics_mut()
            .set_contact(BodyId::new(10), BodyId::new(11));

        fx.world.add_tag(held, Tag::HeldRight);
        let report = fx.tick();
        // Edge distance 2.0: colliding but not aligned
        assert!(report.connected.is_empty());

        fx.system
            .scene_mut()
            .positions
            .insert(held, Vec3::new(-0.6, 0.0, 0.0));
        let report = fx.tick();
        // Edge distance 0.1 < 0.25: snap
        assert_eq!(report.connected, vec![(held, stationary)]);
        assert!(fx.world.has_tag(held, Tag::Connected));
        assert!(fx.world.has_tag(stationary, Tag::Connected));
        assert_eq!(fx.system.feedback().successes, 1);
        assert_eq!(
            fx.system.physics().last_options(BodyId::new(10)),
            Some(BodyOptions::frozen())
        );
        assert_eq!(
            fx.system.physics().last_options(BodyId::new(11)),
            Some(BodyOptions::frozen())
        );
        // Held object lands exactly on the partner's mirrored edge point
        assert_eq!(
            fx.system.scene().positions[&held],
            Vec3::new(-0.5, 0.0, 0.0)
        );
        // The hand constraint did not leak past the connection
        assert!(fx.system.physics().constraints.is_empty());
        assert!(!fx.world.has_tag(held, Tag::Constraint));

        // Feedback fires once, and Connected is monotone
        fx.tick();
        assert_eq!(fx.system.feedback().successes, 1);
        assert!(fx.world.has_tag(held, Tag::Connected));
    }

    #[test]
    fn test_connected_entities_cannot_be_grabbed_again() {
        let mut fx = Fixture::new();
        let stationary = fx.add_piece(1, PairSide::B, 11, Vec3::ZERO);
        let held = fx.add_piece(1, PairSide::A, 10, Vec3::new(-0.6, 0.0, 0.0));
        fx.system
            .physics_mut()
            .set_contact(BodyId::new(10), BodyId::new(11));

        fx.world.add_tag(held, Tag::HeldRight);
        let report = fx.tick();
        assert_eq!(report.connected.len(), 1);

        // The enter predicate excludes Connected: grabbing does nothing
        fx.world.add_tag(stationary, Tag::HeldLeft);
        let report = fx.tick();
        assert_eq!(report.grabs, 0);
        assert!(fx.system.physics().constraints.is_empty());
        assert_eq!(
            fx.system.physics().last_options(BodyId::new(11)),
            Some(BodyOptions::frozen())
        );
    }

    #[test]
    fn test_connect_on_release_frame_counts_as_connecting() {
        let mut fx = Fixture::new();
        fx.add_piece(1, PairSide::B, 11, Vec3::ZERO);
        let held = fx.add_piece(1, PairSide::A, 10, Vec3::new(-2.5, 0.0, 0.0));
        fx.system
            .physics_mut()
            .set_contact(BodyId::new(10), BodyId::new(11));

        fx.world.add_tag(held, Tag::HeldRight);
        fx.tick();

        // Same frame: the object reaches alignment and the hand lets go
        fx.system
            .scene_mut()
            .positions
            .insert(held, Vec3::new(-0.6, 0.0, 0.0));
        fx.world.remove_tag(held, Tag::HeldRight);
        let report = fx.tick();

        assert_eq!(report.connected.len(), 1);
        assert_eq!(report.releases, 0);
        // Frozen by the snap, not reset to dynamic by the release path
        assert_eq!(
            fx.system.physics().last_options(BodyId::new(10)),
            Some(BodyOptions::frozen())
        );
    }

    #[test]
    fn test_mismatched_pairs_do_not_snap() {
        let mut fx = Fixture::new();
        // Same side: never a candidate
        fx.add_piece(1, PairSide::A, 11, Vec3::ZERO);
        // Different pair id: never a candidate
        fx.add_piece(2, PairSide::B, 12, Vec3::new(0.1, 0.0, 0.0));
        let held = fx.add_piece(1, PairSide::A, 10, Vec3::new(-0.6, 0.0, 0.0));
        fx.system
            .physics_mut()
            .set_contact(BodyId::new(10), BodyId::new(11));
        fx.system
            .physics_mut()
            .set_contact(BodyId::new(10), BodyId::new(12));

        fx.world.add_tag(held, Tag::HeldRight);
        let report = fx.tick();

        assert!(report.connected.is_empty());
        assert_eq!(fx.system.feedback().successes, 0);
    }

    #[test]
    fn test_puzzle_anchor_hides_then_reveals_debounced() {
        let mut fx = Fixture::new();
        let prize = fx.world.spawn();
        let anchor = fx.world.spawn();
        fx.world.set_anchor(anchor, prize);
        let stationary = fx.add_piece(1, PairSide::B, 11, Vec3::ZERO);
        let held = fx.add_piece(1, PairSide::A, 10, Vec3::new(-0.6, 0.0, 0.0));
        fx.system
            .physics_mut()
            .set_contact(BodyId::new(10), BodyId::new(11));

        // Anchor entry: the puzzle starts locked
        fx.tick();
        assert_eq!(fx.system.scene().visibility.get(&prize), Some(&false));

        fx.world.add_tag(held, Tag::HeldRight);
        let report = fx.tick();
        assert_eq!(report.connected, vec![(held, stationary)]);
        // Debounce: the snap tick never re-evaluates completion
        assert_eq!(fx.system.scene().visibility.get(&prize), Some(&false));

        fx.tick();
        assert_eq!(fx.system.scene().visibility.get(&prize), Some(&true));
    }

    #[test]
    fn test_unlock_requires_every_pair_connected() {
        let mut fx = Fixture::new();
        let prize = fx.world.spawn();
        let anchor = fx.world.spawn();
        fx.world.set_anchor(anchor, prize);

        fx.add_piece(1, PairSide::B, 11, Vec3::ZERO);
        let first = fx.add_piece(1, PairSide::A, 10, Vec3::new(-0.6, 0.0, 0.0));
        fx.add_piece(2, PairSide::B, 13, Vec3::new(10.0, 0.0, 0.0));
        let second = fx.add_piece(2, PairSide::A, 12, Vec3::new(9.4, 0.0, 0.0));
        fx.system
            .physics_mut()
            .set_contact(BodyId::new(10), BodyId::new(11));
        fx.system
            .physics_mut()
            .set_contact(BodyId::new(12), BodyId::new(13));

        fx.world.add_tag(first, Tag::HeldRight);
        fx.tick();
        fx.tick();
        // Half the puzzle done: still locked
        assert_eq!(fx.system.scene().visibility.get(&prize), Some(&false));

        fx.world.add_tag(second, Tag::HeldRight);
        fx.tick();
        fx.tick();
        assert_eq!(fx.system.scene().visibility.get(&prize), Some(&true));
    }

    #[test]
    fn test_missing_body_ancestor_is_skipped_not_fatal() {
        let mut fx = Fixture::new();
        let orphan = fx.world.spawn();
        fx.world.set_pairable(orphan, 1, PairSide::A);

        fx.world.add_tag(orphan, Tag::HeldRight);
        let report = fx.tick();

        assert_eq!(report.grabs, 0);
        assert!(fx.system.physics().constraints.is_empty());
    }

    #[test]
    fn test_entity_destroyed_before_tick_is_a_no_op() {
        let mut fx = Fixture::new();
        let piece = fx.add_piece(1, PairSide::A, 10, Vec3::ZERO);

        fx.world.add_tag(piece, Tag::HeldRight);
        fx.tick();
        fx.world.despawn(piece);
        let report = fx.tick();

        // The exit fires, but the stale entity degrades to nothing
        assert_eq!(report.releases, 0);
        assert_eq!(
            fx.system.physics().last_options(BodyId::new(10)),
            Some(BodyOptions::held())
        );
    }

    #[test]
    fn test_invalid_config_is_rejected() {
        let config = SnapConfig {
            snap_threshold: -1.0,
            ..Default::default()
        };
        let result = PairConnect::with_config(
            MockPhysics::default(),
            MockScene::default(),
            MockFeedback::default(),
            config,
        );
        assert!(result.is_err());
    }
}
