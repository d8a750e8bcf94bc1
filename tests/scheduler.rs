use std::path::PathBuf;

use hexsettle::{
    commands::{Command, CommandError},
    components::{BuildingKind, ResourceKind},
    engine::{EngineBuilder, EngineSettings},
    scenario::ScenarioLoader,
    systems::{
        production_rates, AgentConfig, AgentSystem, EconomySystem, DEFAULT_ECONOMY_INTERVAL_MS,
    },
};

fn scenario_loader() -> ScenarioLoader {
    ScenarioLoader::new(env!("CARGO_MANIFEST_DIR"))
}

#[test]
fn scenario_files_parse() {
    let loader = scenario_loader();
    let default = loader.load("scenarios/default.yaml").expect("scenario parses");
    assert_eq!(default.name, "default");
    assert_eq!(default.map.width, 50);
    assert_eq!(default.agents, AgentConfig::default());
    assert_eq!(default.economy.interval_ms, DEFAULT_ECONOMY_INTERVAL_MS);

    let valley = loader.load("scenarios/river_valley.yaml").unwrap();
    assert_eq!(valley.map.width, 25);
    assert_eq!(valley.map.hex_size, 30.0);
    assert_eq!(valley.ledger.population, 6);
    assert_eq!(valley.ledger.iron, 0.0);
    assert_eq!(valley.agents.speed, 3.0);
    assert_eq!(valley.snapshot.interval_ms, 10_000);
}

#[test]
fn twenty_agent_ticks_per_economy_tick() {
    let scenario = scenario_loader().load("scenarios/river_valley.yaml").unwrap();
    let mut world = scenario.build_world().unwrap();
    let mut engine = EngineBuilder::new(EngineSettings {
        scenario_name: scenario.name.clone(),
        seed: scenario.seed,
        snapshot_interval_ms: 0,
        snapshot_dir: PathBuf::from("unused"),
    })
    .with_system(EconomySystem::new())
    .with_system(AgentSystem::new(scenario.agents.clone()))
    .build();

    let mut economy_steps = Vec::new();
    engine
        .run_with_hook(&mut world, 100, |report, _| {
            if report.ran.iter().any(|name| name == "economy") {
                economy_steps.push(report.step);
            }
        })
        .unwrap();

    assert_eq!(engine.step_ms(), 50);
    assert_eq!(economy_steps, vec![20, 40, 60, 80, 100]);
    assert_eq!(engine.system_ticks("agents"), Some(100));
    assert_eq!(engine.system_ticks("economy"), Some(5));
    assert_eq!(world.agents().len(), 6);
}

#[test]
fn same_seed_same_run() {
    let scenario = scenario_loader().load("scenarios/river_valley.yaml").unwrap();
    let run = || {
        let mut world = scenario.build_world().unwrap();
        let mut engine = EngineBuilder::new(EngineSettings {
            scenario_name: scenario.name.clone(),
            seed: scenario.seed,
            snapshot_interval_ms: 0,
            snapshot_dir: PathBuf::from("unused"),
        })
        .with_system(EconomySystem::new())
        .with_system(AgentSystem::new(scenario.agents.clone()))
        .build();
        engine.run_for(&mut world, 5_000).unwrap();
        world
    };
    assert_eq!(run(), run());
}

#[test]
fn queued_commands_apply_in_submission_order() {
    let scenario = scenario_loader().load("scenarios/river_valley.yaml").unwrap();
    let mut world = scenario.build_world().unwrap();
    let mut engine = EngineBuilder::new(EngineSettings {
        scenario_name: scenario.name.clone(),
        seed: scenario.seed,
        snapshot_interval_ms: 0,
        snapshot_dir: PathBuf::from("unused"),
    })
    .with_system(EconomySystem::new())
    .build();

    let free: Vec<_> = world
        .tiles()
        .filter(|tile| !tile.is_occupied())
        .map(|tile| tile.coord)
        .take(2)
        .collect();
    world.ledger_mut().wood = 80.0;
    // the first house leaves 30 wood, too little for the second
    engine.submit(Command::PlaceBuilding {
        coord: free[0],
        kind: BuildingKind::House,
    });
    engine.submit(Command::PlaceBuilding {
        coord: free[1],
        kind: BuildingKind::House,
    });
    assert_eq!(engine.pending_commands(), 2);
    assert_eq!(world.tile(free[0]).unwrap().building, None);

    let report = engine.step(&mut world).unwrap();
    assert_eq!(world.tile(free[0]).unwrap().building, Some(BuildingKind::House));
    assert_eq!(world.tile(free[1]).unwrap().building, None);
    assert_eq!(report.rejected.len(), 1);
    assert!(matches!(
        report.rejected[0].1,
        CommandError::InsufficientResources { .. }
    ));
    let produced = production_rates(&world)[&ResourceKind::Wood];
    assert_eq!(world.ledger().wood, 30.0 + produced);
}
