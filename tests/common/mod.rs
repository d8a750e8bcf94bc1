#![allow(dead_code)]

use std::collections::BTreeMap;

use hexsettle::{
    components::Biome,
    hex::HexCoord,
    world::{PersistedTile, PersistedWorld, ResourceLedger, WorldState},
};

/// An all-plains world with no buildings and the baseline ledger.
pub fn plains_world(width: u32, height: u32) -> WorldState {
    WorldState::from_persisted(plains_record(width, height)).expect("plains record is valid")
}

pub fn plains_record(width: u32, height: u32) -> PersistedWorld {
    let mut tiles = BTreeMap::new();
    for r in 0..height as i32 {
        let offset = r.div_euclid(2);
        for q in -offset..width as i32 - offset {
            let coord = HexCoord::new(q, r);
            tiles.insert(
                coord.key(),
                PersistedTile {
                    q,
                    r,
                    s: coord.s(),
                    biome: Biome::Plains,
                    building: None,
                    start_location: false,
                },
            );
        }
    }
    PersistedWorld {
        map_width: width,
        map_height: height,
        hex_size: 30.0,
        tiles,
        ledger: ResourceLedger::default(),
        agents: Vec::new(),
        next_agent_id: 0,
    }
}
