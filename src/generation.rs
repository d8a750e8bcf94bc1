//! Procedural world generation over a rectangular offset region of hexes

use thiserror::Error;
use tracing::{debug, info};

use crate::components::{Biome, BuildingKind, Tile};
use crate::hex::{HexCoord, Layout};
use crate::noise::NoiseField;
use crate::world::{LedgerError, ResourceLedger, WorldState};

const HALF_SQRT_3: f64 = 0.866_025_403_784_438_6;

/// Seed offset between the elevation and moisture fields.
const MOISTURE_SEED_OFFSET: u64 = 0x9e37_79b9_7f4a_7c15;

#[derive(Debug, Clone)]
pub struct GeneratorConfig {
    pub layout: Layout,
    /// Noise-space distance between neighbouring hexes.
    pub noise_scale: f64,
    pub starting_ledger: ResourceLedger,
    /// Fail instead of producing a world without a Town Hall.
    pub require_start: bool,
}

impl Default for GeneratorConfig {
    fn default() -> Self {
        Self {
            layout: Layout::default(),
            noise_scale: 0.1,
            starting_ledger: ResourceLedger::default(),
            require_start: false,
        }
    }
}

#[derive(Debug, Error, PartialEq)]
pub enum GenerationError {
    #[error("map generation is degenerate: {0}")]
    MapGenerationDegenerate(String),
    #[error("starting ledger is invalid: {0}")]
    InvalidLedger(#[from] LedgerError),
}

/// Biome thresholds, evaluated in order.
pub fn classify_biome(elevation: f64, moisture: f64) -> Biome {
    if elevation < -0.3 {
        Biome::Water
    } else if elevation > 0.4 {
        Biome::Mountain
    } else if elevation > 0.2 {
        Biome::Hills
    } else if moisture > 0.1 {
        Biome::Forest
    } else {
        Biome::Plains
    }
}

pub struct WorldGenerator {
    config: GeneratorConfig,
}

impl WorldGenerator {
    pub fn new(config: GeneratorConfig) -> Self {
        Self { config }
    }

    pub fn config(&self) -> &GeneratorConfig {
        &self.config
    }

    pub fn generate(
        &self,
        width: u32,
        height: u32,
        seed: u64,
    ) -> Result<WorldState, GenerationError> {
        if width == 0 || height == 0 {
            return Err(GenerationError::MapGenerationDegenerate(format!(
                "map of {width}x{height} hexes has no tiles"
            )));
        }
        self.config.starting_ledger.validate()?;

        let elevation = NoiseField::new(seed);
        let moisture = NoiseField::new(seed.wrapping_add(MOISTURE_SEED_OFFSET));
        let scale = self.config.noise_scale;

        let mut world = WorldState::new(width, height, self.config.layout);
        *world.ledger_mut() = self.config.starting_ledger.clone();

        let mut tiles = Vec::with_capacity(width as usize * height as usize);
        for r in 0..height as i32 {
            let offset = r.div_euclid(2);
            for q in -offset..width as i32 - offset {
                let nx = f64::from(q) * scale;
                let ny = f64::from(r) * scale;
                let biome = classify_biome(elevation.sample(nx, ny), moisture.sample(nx, ny));
                tiles.push(Tile::new(HexCoord::new(q, r), biome));
            }
        }
        world.insert_tiles(tiles);

        place_start(&mut world, self.config.require_start)?;

        info!(
            width,
            height,
            seed,
            tiles = world.tile_count(),
            "generated world"
        );
        Ok(world)
    }
}

/// Puts the Town Hall on the [`start_location`] tile.
///
/// Without a Plains tile the world keeps no Town Hall, or fails when
/// `require_start` is set.
pub fn place_start(world: &mut WorldState, require_start: bool) -> Result<(), GenerationError> {
    match start_location(world) {
        Some(coord) => {
            if let Some(tile) = world.tile_mut(coord) {
                tile.building = Some(BuildingKind::TownHall);
                tile.start_location = true;
            }
            debug!(%coord, "placed starting town hall");
            Ok(())
        }
        None if require_start => Err(GenerationError::MapGenerationDegenerate(
            "no plains tile for the starting town hall".into(),
        )),
        None => {
            debug!("no plains tile; world starts without a town hall");
            Ok(())
        }
    }
}

/// Plains tile nearest the map centre, measured in de-skewed hex space.
///
/// Ties go to the lowest `(r, q)`.
pub fn start_location(world: &WorldState) -> Option<HexCoord> {
    let center_x = f64::from(world.map_width()) / 2.0;
    let center_y = f64::from(world.map_height()) / 2.0 * HALF_SQRT_3;
    world
        .tiles()
        .filter(|tile| tile.biome == Biome::Plains)
        .map(|tile| {
            let q = f64::from(tile.coord.q);
            let r = f64::from(tile.coord.r);
            let dx = q + r / 2.0 - center_x;
            let dy = r * HALF_SQRT_3 - center_y;
            (dx * dx + dy * dy, tile.coord)
        })
        .min_by(|(da, ca), (db, cb)| {
            da.total_cmp(db)
                .then_with(|| (ca.r, ca.q).cmp(&(cb.r, cb.q)))
        })
        .map(|(_, coord)| coord)
}
