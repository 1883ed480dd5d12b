//! Setup utilities shared by the crate-level tests.

use glam::Vec2;

use crate::config::{LevelRules, SimConfig, SpriteLibrary};
use crate::entity::{Entity, EntityKind};
use crate::registry::Circle;
use crate::simulation::{FrameInput, SessionState, Simulation};
use crate::slab::ComponentSlab;

/// Window extent used throughout the tests.
pub const WINDOW: Vec2 = Vec2::new(1024.0, 768.0);

/// One 60 Hz frame.
pub const DT: f32 = 1.0 / 60.0;

/// Simulation with the default configuration.
pub fn default_sim() -> Simulation {
    Simulation::new(SimConfig::default(), SpriteLibrary::default())
        .expect("default configuration must assemble")
}

/// Simulation with a custom configuration and the default sprites.
pub fn sim_with(config: SimConfig) -> Simulation {
    Simulation::new(config, SpriteLibrary::default()).expect("test configuration must assemble")
}

/// One long level that spawns an asteroid nearly every frame.
pub fn eager_spawn_config() -> SimConfig {
    SimConfig {
        levels: vec![LevelRules {
            duration_seconds: 10_000.0,
            score_to_clear: u32::MAX,
            spawn_interval_frames: 1,
            spawn_probability: 1.0,
            asteroid_speed: (60.0, 140.0),
        }],
        ..SimConfig::default()
    }
}

/// One long level that never spawns, for tests that stage their own world.
pub fn quiet_config() -> SimConfig {
    SimConfig {
        levels: vec![LevelRules {
            duration_seconds: 10_000.0,
            score_to_clear: u32::MAX,
            spawn_interval_frames: 1,
            spawn_probability: 0.0,
            asteroid_speed: (60.0, 140.0),
        }],
        ..SimConfig::default()
    }
}

/// Steps the simulation `frames` times with the same input.
pub fn drive(sim: &mut Simulation, frames: usize, input: &FrameInput) {
    for _ in 0..frames {
        sim.update(DT, input).expect("update must succeed");
    }
}

/// Number of live entities of `kind`.
pub fn live_count(sim: &Simulation, kind: EntityKind) -> usize {
    sim.registry()
        .entities()
        .iter()
        .filter(|e| e.kind() == kind && e.is_active())
        .count()
}

/// Everything the rewind buffer snapshots, cloned out for comparison.
#[derive(Debug, Clone, PartialEq)]
pub struct WorldState {
    pub entities: Vec<Entity>,
    pub circles: Vec<Circle>,
    pub slab: ComponentSlab,
    pub session: SessionState,
}

/// Clones the comparable world state out of a simulation.
pub fn world_state(sim: &Simulation) -> WorldState {
    WorldState {
        entities: sim.registry().entities().to_vec(),
        circles: sim.registry().circles().to_vec(),
        slab: sim.registry().slab().clone(),
        session: sim.session().clone(),
    }
}
