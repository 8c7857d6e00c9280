//! Tabletop Puzzle Demo
//!
//! Two connectable pairs on a table, a scripted right hand, and toy
//! in-memory collaborators:
//! - snap geometry loaded from a RON file
//! - a proximity physics stand-in that reports contacts within a radius
//! - a stdout feedback sink
//!
//! The hand drags each loose piece toward its partner tick by tick; when
//! both pairs have snapped, the puzzle anchor reveals the prize.

use glam::Vec3;
use indexmap::IndexMap;
use pairlink_connect::{
    BodyOptions, ConstraintSpec, FeedbackSink, PairConnect, PhysicsBridge, PhysicsHandle, Scene,
    SnapConfig,
};
use pairlink_world::{BodyId, EntityId, PairSide, Tag, World};
use std::cell::RefCell;
use std::fs;
use std::rc::Rc;

/// How close two bodies must be for the toy engine to report a contact
const CONTACT_RADIUS: f32 = 1.5;
/// How far the scripted hand drags its piece per tick
const DRAG_STEP: f32 = 0.4;

/// Object state shared between the scene and the physics stand-in
#[derive(Default)]
struct Stage {
    positions: IndexMap<EntityId, Vec3>,
    visibility: IndexMap<EntityId, bool>,
}

struct StageScene(Rc<RefCell<Stage>>);

impl Scene for StageScene {
    fn position(&self, entity: EntityId) -> Option<Vec3> {
        self.0.borrow().positions.get(&entity).copied()
    }

    fn set_position(&mut self, entity: EntityId, position: Vec3) {
        self.0.borrow_mut().positions.insert(entity, position);
    }

    fn set_visible(&mut self, entity: EntityId, visible: bool) {
        self.0.borrow_mut().visibility.insert(entity, visible);
    }
}

/// Toy physics: contacts are pure proximity over the shared stage
struct ProximityPhysics {
    stage: Rc<RefCell<Stage>>,
    bodies: IndexMap<BodyId, EntityId>,
}

impl ProximityPhysics {
    fn new(stage: Rc<RefCell<Stage>>) -> Self {
        Self {
            stage,
            bodies: IndexMap::new(),
        }
    }

    fn register(&mut self, body: BodyId, entity: EntityId) {
        self.bodies.insert(body, entity);
    }
}

impl PhysicsBridge for ProximityPhysics {
    fn update_body_options(&mut self, body: BodyId, options: BodyOptions) {
        println!("    [physics] {body} -> {:?}/{:?}", options.body_type, options.activation);
    }

    fn add_constraint(
        &mut self,
        interactor: EntityId,
        body: BodyId,
        target: BodyId,
        _spec: ConstraintSpec,
    ) {
        println!("    [physics] constraint {interactor}: {body} <-> {target}");
    }

    fn remove_constraint(&mut self, interactor: EntityId) {
        println!("    [physics] constraint {interactor}: removed");
    }

    fn collisions(&self, body: BodyId) -> Vec<PhysicsHandle> {
        let stage = self.stage.borrow();
        let Some(position) = self.bodies.get(&body).and_then(|e| stage.positions.get(e)) else {
            return Vec::new();
        };
        self.bodies
            .iter()
            .filter(|(&other, entity)| {
                other != body
                    && stage
                        .positions
                        .get(*entity)
                        .is_some_and(|p| p.distance(*position) <= CONTACT_RADIUS)
            })
            .map(|(&other, _)| PhysicsHandle(other.raw() as u64))
            .collect()
    }

    fn entity_for(&self, handle: PhysicsHandle) -> Option<EntityId> {
        self.bodies.get(&BodyId::new(handle.0 as u32)).copied()
    }
}

struct StdoutFeedback;

impl FeedbackSink for StdoutFeedback {
    fn success(&mut self) {
        println!("    *click* -- a pair snapped together");
    }
}

fn load_config() -> SnapConfig {
    let path = concat!(env!("CARGO_MANIFEST_DIR"), "/data/snap.ron");
    match fs::read_to_string(path).map_err(|e| e.to_string()).and_then(|text| {
        ron::from_str::<SnapConfig>(&text).map_err(|e| e.to_string())
    }) {
        Ok(config) => config,
        Err(err) => {
            eprintln!("falling back to default snap config: {err}");
            SnapConfig::default()
        }
    }
}

fn main() -> Result<(), Box<dyn std::error::Error>> {
    let stage = Rc::new(RefCell::new(Stage::default()));
    let mut world = World::new();
    let mut physics = ProximityPhysics::new(Rc::clone(&stage));

    // The right hand interactor
    let hand = world.spawn();
    world.add_tag(hand, Tag::HandRight);
    world.set_body(hand, BodyId::new(100));

    // Two pairs: loose A-side pieces on the left, fixed B-side sockets on
    // the right
    let spawn_piece = |world: &mut World,
                           physics: &mut ProximityPhysics,
                           pair_id: u32,
                           side: PairSide,
                           body: u32,
                           at: Vec3| {
        let entity = world.spawn();
        world.set_pairable(entity, pair_id, side);
        world.set_body(entity, BodyId::new(body));
        physics.register(BodyId::new(body), entity);
        stage.borrow_mut().positions.insert(entity, at);
        entity
    };
    let loose = [
        spawn_piece(&mut world, &mut physics, 1, PairSide::A, 1, Vec3::new(-3.0, 0.0, 0.0)),
        spawn_piece(&mut world, &mut physics, 2, PairSide::A, 2, Vec3::new(-3.0, 0.0, 1.0)),
    ];
    let sockets = [
        spawn_piece(&mut world, &mut physics, 1, PairSide::B, 3, Vec3::new(0.0, 0.0, 0.0)),
        spawn_piece(&mut world, &mut physics, 2, PairSide::B, 4, Vec3::new(0.0, 0.0, 1.0)),
    ];

    // The anchor reveals the prize once every pair is connected
    let prize = world.spawn();
    let anchor = world.spawn();
    world.set_anchor(anchor, prize);
    stage.borrow_mut().positions.insert(prize, Vec3::new(0.0, 1.0, 0.5));

    let config = load_config();
    let mut system = PairConnect::with_config(
        physics,
        StageScene(Rc::clone(&stage)),
        StdoutFeedback,
        config,
    )?;

    let mut tick = 0u64;
    for (piece, socket) in loose.into_iter().zip(sockets) {
        println!("-- grabbing {piece}");
        world.add_tag(piece, Tag::HeldRight);

        // Drag until the orchestrator reports the snap
        loop {
            tick += 1;
            println!("tick {tick}");
            let report = system.tick(&mut world);
            if report.connected.iter().any(|&(a, b)| a == piece || b == piece) {
                break;
            }
            let target = stage.borrow().positions[&socket];
            let current = stage.borrow().positions[&piece];
            let step = (target - current).clamp_length_max(DRAG_STEP);
            stage.borrow_mut().positions.insert(piece, current + step);
        }

        println!("-- releasing {piece}");
        world.remove_tag(piece, Tag::HeldRight);
        tick += 1;
        println!("tick {tick}");
        system.tick(&mut world);
    }

    // One settling tick re-evaluates puzzle completion
    tick += 1;
    println!("tick {tick}");
    system.tick(&mut world);

    let revealed = stage.borrow().visibility.get(&prize) == Some(&true);
    println!(
        "puzzle {}: prize {}",
        if revealed { "complete" } else { "incomplete" },
        if revealed { "revealed" } else { "hidden" }
    );
    Ok(())
}
