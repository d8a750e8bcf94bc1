mod common;

use std::fs;

use tempfile::tempdir;

use hexsettle::{
    commands::Command,
    components::BuildingKind,
    hex::HexCoord,
    scenario::Scenario,
    snapshot::{list_snapshots, load_snapshot, read_envelope, SnapshotError, SnapshotWriter},
    world::{RestoreError, WorldState},
};

fn running_world() -> (Scenario, WorldState) {
    let mut scenario = Scenario {
        name: "persist".into(),
        seed: 42,
        ..Scenario::default()
    };
    scenario.map.width = 12;
    scenario.map.height = 10;
    scenario.ledger.population = 4;
    let mut world = scenario.build_world().unwrap();
    let mut engine = scenario.build_engine();
    let free = world.tiles().find(|tile| !tile.is_occupied()).unwrap().coord;
    engine.submit(Command::PlaceBuilding {
        coord: free,
        kind: BuildingKind::Farm,
    });
    engine.run_for(&mut world, 3_000).unwrap();
    (scenario, world)
}

#[test]
fn snapshot_round_trip_restores_equal_world() {
    let (scenario, world) = running_world();
    let temp = tempdir().expect("tempdir");
    let writer = SnapshotWriter::new(temp.path(), 1_000);
    let path = writer.write(&world, &scenario.name, 60, 3_000).unwrap();

    let envelope = read_envelope(&path).unwrap();
    assert_eq!(envelope.scenario, "persist");
    assert_eq!(envelope.elapsed_ms, 3_000);

    let restored = load_snapshot(&path).unwrap();
    assert_eq!(restored, world);
    assert_eq!(restored.agents().len(), 4);
}

#[test]
fn engine_writes_periodic_snapshots() {
    let temp = tempdir().expect("tempdir");
    let mut scenario = Scenario::default();
    scenario.name = "periodic".into();
    scenario.map.width = 6;
    scenario.map.height = 6;
    scenario.snapshot.interval_ms = 1_000;
    scenario.snapshot.output_dir = temp.path().to_path_buf();

    let mut world = scenario.build_world().unwrap();
    let mut engine = scenario.build_engine();
    let mut written = Vec::new();
    engine
        .run_with_hook(&mut world, 60, |report, _| {
            if let Some(path) = &report.snapshot {
                written.push(path.clone());
            }
        })
        .unwrap();

    assert_eq!(written.len(), 3);
    assert_eq!(list_snapshots(temp.path().join("periodic")).unwrap(), written);
}

#[test]
fn restore_rejects_cube_violation() {
    let (_, world) = running_world();
    let mut record = world.to_persisted();
    let tile = record.tiles.get_mut("0,0").unwrap();
    tile.s = 5;
    assert_eq!(
        WorldState::from_persisted(record),
        Err(RestoreError::CubeInvariant { q: 0, r: 0, s: 5 })
    );
}

#[test]
fn restore_rejects_missing_and_stray_tiles() {
    let (_, world) = running_world();

    let mut missing = world.to_persisted();
    missing.tiles.remove("1,0");
    assert!(matches!(
        WorldState::from_persisted(missing),
        Err(RestoreError::IncompleteRegion { expected: 120, found: 119 })
    ));

    let mut stray = world.to_persisted();
    let mut tile = stray.tiles["0,0"].clone();
    tile.q = 40;
    tile.s = -40;
    stray.tiles.insert(HexCoord::new(40, 0).key(), tile);
    assert_eq!(
        WorldState::from_persisted(stray),
        Err(RestoreError::OutOfRegion(HexCoord::new(40, 0)))
    );
}

#[test]
fn restore_rejects_stale_agent_counter() {
    let (_, world) = running_world();
    let mut record = world.to_persisted();
    record.next_agent_id = 0;
    assert!(matches!(
        WorldState::from_persisted(record),
        Err(RestoreError::AgentIdAhead { .. })
    ));
}

#[test]
fn corrupt_snapshot_file_is_rejected() {
    let (scenario, world) = running_world();
    let temp = tempdir().expect("tempdir");
    let path = SnapshotWriter::new(temp.path(), 0)
        .write(&world, &scenario.name, 1, 50)
        .unwrap();
    let text = fs::read_to_string(&path).unwrap();
    let tampered = text.replacen("\"food\": ", "\"food\": -", 1);
    fs::write(&path, tampered).unwrap();
    assert!(matches!(
        load_snapshot(&path),
        Err(SnapshotError::Restore(RestoreError::InvalidLedger(_)))
    ));
}
