mod common;

use std::path::PathBuf;

use rand::SeedableRng;
use rand_chacha::ChaCha8Rng;

use hexsettle::{
    commands::Command,
    components::MotionState,
    engine::{EngineBuilder, EngineSettings},
    hex::Layout,
    systems::{advance_agents, AgentConfig, AgentSystem, AgentTickOutcome},
    world::WorldState,
};

use common::plains_world;

fn agent_engine(seed: u64) -> hexsettle::Engine {
    EngineBuilder::new(EngineSettings {
        scenario_name: "agents".into(),
        seed,
        snapshot_interval_ms: 0,
        snapshot_dir: PathBuf::from("unused"),
    })
    .with_system(AgentSystem::default())
    .build()
}

#[test]
fn agents_converge_to_population() {
    let mut world = plains_world(10, 8);
    world.ledger_mut().population = 5;
    let mut engine = agent_engine(1);

    let mut counts = Vec::new();
    engine
        .run_with_hook(&mut world, 5, |_, world| counts.push(world.agents().len()))
        .unwrap();
    assert_eq!(counts, vec![1, 2, 3, 4, 5]);

    engine.submit(Command::SetPopulation { population: 2 });
    let mut counts = Vec::new();
    engine
        .run_with_hook(&mut world, 5, |_, world| counts.push(world.agents().len()))
        .unwrap();
    assert_eq!(counts, vec![4, 3, 2, 2, 2]);
}

#[test]
fn agent_ids_stay_unique_through_churn() {
    let mut world = plains_world(6, 6);
    let mut rng = ChaCha8Rng::seed_from_u64(8);
    let config = AgentConfig::default();
    let mut seen = Vec::new();
    for population in [3, 0, 4, 1, 3] {
        world.ledger_mut().population = population;
        for _ in 0..6 {
            if let AgentTickOutcome::Spawned(id) = advance_agents(&mut world, &config, &mut rng) {
                assert!(!seen.contains(&id));
                seen.push(id);
            }
        }
        assert_eq!(world.agents().len(), population as usize);
    }
}

/// World with one villager standing exactly on its own target.
fn world_with_arrived_agent() -> WorldState {
    let mut world = plains_world(8, 8);
    world.ledger_mut().population = 1;
    let mut rng = ChaCha8Rng::seed_from_u64(3);
    advance_agents(&mut world, &AgentConfig::default(), &mut rng);

    let mut record = world.to_persisted();
    let position = record.agents[0].position;
    record.agents[0].target = Some(position);
    record.agents[0].state = MotionState::Moving;
    WorldState::from_persisted(record).unwrap()
}

#[test]
fn arrived_agent_retargets_then_approaches() {
    for wrap_movement in [true, false] {
        let config = AgentConfig {
            wrap_movement,
            ..AgentConfig::default()
        };
        let mut world = world_with_arrived_agent();
        let mut rng = ChaCha8Rng::seed_from_u64(21);
        let old_target = world.agents()[0].target;

        let outcome = advance_agents(&mut world, &config, &mut rng);
        assert_eq!(outcome, AgentTickOutcome::Moved { retargeted: 1 });
        let agent = world.agents()[0].clone();
        assert_eq!(agent.state, MotionState::Moving);
        assert_ne!(agent.target, old_target);
        let target = agent.target.unwrap();
        let first_gap = agent.position.distance(target);

        advance_agents(&mut world, &config, &mut rng);
        let agent = &world.agents()[0];
        if agent.target == Some(target) {
            let second_gap = agent.position.distance(target);
            assert!(second_gap < first_gap || second_gap == 0.0);
        } else {
            // a fresh target means the first one was reached
            assert!(first_gap < config.arrival_epsilon * 2f64.sqrt());
        }
    }
}

#[test]
fn targets_lie_near_tile_centers() {
    let mut world = plains_world(6, 6);
    world.ledger_mut().population = 4;
    let config = AgentConfig {
        wrap_movement: false,
        ..AgentConfig::default()
    };
    let mut rng = ChaCha8Rng::seed_from_u64(5);
    for _ in 0..40 {
        advance_agents(&mut world, &config, &mut rng);
        for agent in world.agents() {
            if let Some(target) = agent.target {
                let tile = world.tile_at_pixel(target).expect("target over the map");
                let center = world.tile_center(tile.coord);
                assert!((target.x - center.x).abs() <= config.target_jitter + 1e-9);
            }
        }
    }
}

#[test]
fn tileless_world_never_spawns() {
    let mut world = WorldState::new(3, 3, Layout::default());
    world.ledger_mut().population = 2;
    let mut engine = agent_engine(4);
    engine.run(&mut world, 10).unwrap();
    assert!(world.agents().is_empty());
}
