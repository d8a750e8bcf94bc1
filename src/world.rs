use std::collections::{BTreeMap, HashSet};

use serde::{Deserialize, Serialize};
use thiserror::Error;

use crate::components::{Agent, AgentId, Biome, BuildingKind, ResourceKind, Tile};
use crate::hex::{HexCoord, Layout, Point, Torus};

fn default_food() -> f64 {
    100.0
}

fn default_wood() -> f64 {
    100.0
}

fn default_stone() -> f64 {
    50.0
}

fn default_population() -> u32 {
    2
}

fn default_happiness() -> f64 {
    100.0
}

/// Aggregate resource counters for the whole world.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct ResourceLedger {
    #[serde(default = "default_food")]
    pub food: f64,
    #[serde(default = "default_wood")]
    pub wood: f64,
    #[serde(default = "default_stone")]
    pub stone: f64,
    #[serde(default)]
    pub iron: f64,
    #[serde(default)]
    pub gold: f64,
    #[serde(default = "default_population")]
    pub population: u32,
    #[serde(default = "default_happiness")]
    pub happiness: f64,
}

impl Default for ResourceLedger {
    fn default() -> Self {
        Self {
            food: default_food(),
            wood: default_wood(),
            stone: default_stone(),
            iron: 0.0,
            gold: 0.0,
            population: default_population(),
            happiness: default_happiness(),
        }
    }
}

impl ResourceLedger {
    pub fn amount(&self, kind: ResourceKind) -> f64 {
        match kind {
            ResourceKind::Food => self.food,
            ResourceKind::Wood => self.wood,
            ResourceKind::Stone => self.stone,
            ResourceKind::Iron => self.iron,
            ResourceKind::Gold => self.gold,
        }
    }

    fn amount_mut(&mut self, kind: ResourceKind) -> &mut f64 {
        match kind {
            ResourceKind::Food => &mut self.food,
            ResourceKind::Wood => &mut self.wood,
            ResourceKind::Stone => &mut self.stone,
            ResourceKind::Iron => &mut self.iron,
            ResourceKind::Gold => &mut self.gold,
        }
    }

    pub fn set(&mut self, kind: ResourceKind, value: f64) {
        *self.amount_mut(kind) = value;
    }

    pub(crate) fn credit(&mut self, kind: ResourceKind, amount: f64) {
        *self.amount_mut(kind) += amount;
    }

    /// Callers must have checked affordability first.
    pub(crate) fn debit(&mut self, kind: ResourceKind, amount: f64) {
        let slot = self.amount_mut(kind);
        *slot = (*slot - amount).max(0.0);
    }

    /// Checks that every resource is a non-negative number and happiness is finite.
    pub fn validate(&self) -> Result<(), LedgerError> {
        for kind in ResourceKind::ALL {
            let value = self.amount(kind);
            if !value.is_finite() || value < 0.0 {
                return Err(LedgerError::InvalidAmount { resource: kind, value });
            }
        }
        if !self.happiness.is_finite() {
            return Err(LedgerError::InvalidHappiness(self.happiness));
        }
        Ok(())
    }

    /// First resource in `costs` the ledger cannot cover, if any.
    pub fn shortfall(&self, costs: &[(ResourceKind, f64)]) -> Option<(ResourceKind, f64, f64)> {
        costs
            .iter()
            .find(|(kind, required)| self.amount(*kind) < *required)
            .map(|(kind, required)| (*kind, *required, self.amount(*kind)))
    }
}

/// The single mutable source of truth for tiles, resources and agents.
#[derive(Debug, Clone, PartialEq)]
pub struct WorldState {
    map_width: u32,
    map_height: u32,
    layout: Layout,
    tiles: BTreeMap<HexCoord, Tile>,
    /// Tile keys in map order, for constant-time random picks.
    tile_order: Vec<HexCoord>,
    ledger: ResourceLedger,
    agents: Vec<Agent>,
    next_agent_id: u64,
}

impl WorldState {
    pub fn new(map_width: u32, map_height: u32, layout: Layout) -> Self {
        Self {
            map_width,
            map_height,
            layout,
            tiles: BTreeMap::new(),
            tile_order: Vec::new(),
            ledger: ResourceLedger::default(),
            agents: Vec::new(),
            next_agent_id: 0,
        }
    }

    pub fn map_width(&self) -> u32 {
        self.map_width
    }

    pub fn map_height(&self) -> u32 {
        self.map_height
    }

    pub fn layout(&self) -> Layout {
        self.layout
    }

    pub fn torus(&self) -> Torus {
        Torus::new(self.layout, self.map_width, self.map_height)
    }

    /// Whether `coord` lies in the rectangular offset region of this map.
    pub fn in_region(&self, coord: HexCoord) -> bool {
        let column = coord.column();
        coord.r >= 0
            && (coord.r as i64) < i64::from(self.map_height)
            && column >= 0
            && (column as i64) < i64::from(self.map_width)
    }

    #[cfg(test)]
    pub(crate) fn insert_tile(&mut self, tile: Tile) {
        let coord = tile.coord;
        if self.tiles.insert(coord, tile).is_none() {
            if let Err(position) = self.tile_order.binary_search(&coord) {
                self.tile_order.insert(position, coord);
            }
        }
    }

    /// Bulk insert that rebuilds the tile order once.
    pub(crate) fn insert_tiles(&mut self, tiles: impl IntoIterator<Item = Tile>) {
        for tile in tiles {
            self.tiles.insert(tile.coord, tile);
        }
        self.tile_order = self.tiles.keys().copied().collect();
    }

    pub fn tiles(&self) -> impl Iterator<Item = &Tile> {
        self.tiles.values()
    }

    pub fn tile_count(&self) -> usize {
        self.tiles.len()
    }

    pub fn tile(&self, coord: HexCoord) -> Option<&Tile> {
        self.tiles.get(&coord)
    }

    pub(crate) fn tile_mut(&mut self, coord: HexCoord) -> Option<&mut Tile> {
        self.tiles.get_mut(&coord)
    }

    /// Tile by position in the stable key order.
    pub fn nth_tile(&self, index: usize) -> Option<&Tile> {
        self.tile_order
            .get(index)
            .and_then(|coord| self.tiles.get(coord))
    }

    pub fn tile_center(&self, coord: HexCoord) -> Point {
        self.layout.axial_to_pixel(coord)
    }

    /// Hit test that folds the pixel position onto the periodic map.
    pub fn tile_at_pixel(&self, point: Point) -> Option<&Tile> {
        let raw = self.layout.pixel_to_axial(point);
        self.tiles.get(&self.torus().wrap_coord(raw))
    }

    pub fn buildings(&self) -> impl Iterator<Item = (&Tile, BuildingKind)> {
        self.tiles
            .values()
            .filter_map(|tile| tile.building.map(|kind| (tile, kind)))
    }

    pub fn start_location(&self) -> Option<&Tile> {
        self.tiles.values().find(|tile| tile.start_location)
    }

    pub fn ledger(&self) -> &ResourceLedger {
        &self.ledger
    }

    /// Direct ledger access for population rules and scenario setup.
    pub fn ledger_mut(&mut self) -> &mut ResourceLedger {
        &mut self.ledger
    }

    pub fn agents(&self) -> &[Agent] {
        &self.agents
    }

    pub(crate) fn agents_mut(&mut self) -> &mut [Agent] {
        &mut self.agents
    }

    pub(crate) fn spawn_agent(&mut self, position: Point) -> AgentId {
        let id = AgentId::from_raw(self.next_agent_id);
        self.next_agent_id += 1;
        self.agents.push(Agent::villager(id, position));
        id
    }

    pub(crate) fn remove_first_agent(&mut self) -> Option<Agent> {
        if self.agents.is_empty() {
            None
        } else {
            Some(self.agents.remove(0))
        }
    }

    pub fn summary(&self) -> WorldSummary {
        let mut buildings: BTreeMap<String, usize> = BTreeMap::new();
        for (_, kind) in self.buildings() {
            *buildings.entry(kind.to_string()).or_default() += 1;
        }
        WorldSummary {
            map_width: self.map_width,
            map_height: self.map_height,
            tiles: self.tiles.len(),
            buildings,
            agents: self.agents.len(),
            ledger: self.ledger.clone(),
        }
    }

    pub fn to_persisted(&self) -> PersistedWorld {
        let tiles = self
            .tiles
            .values()
            .map(|tile| {
                (
                    tile.coord.key(),
                    PersistedTile {
                        q: tile.coord.q,
                        r: tile.coord.r,
                        s: tile.coord.s(),
                        biome: tile.biome,
                        building: tile.building,
                        start_location: tile.start_location,
                    },
                )
            })
            .collect();
        PersistedWorld {
            map_width: self.map_width,
            map_height: self.map_height,
            hex_size: self.layout.size,
            tiles,
            ledger: self.ledger.clone(),
            agents: self.agents.clone(),
            next_agent_id: self.next_agent_id,
        }
    }

    /// Rebuilds a world from a persisted record, rejecting anything that
    /// would break the world invariants.
    pub fn from_persisted(record: PersistedWorld) -> Result<Self, RestoreError> {
        if record.map_width == 0 || record.map_height == 0 {
            return Err(RestoreError::EmptyMap);
        }
        if !(record.hex_size.is_finite() && record.hex_size > 0.0) {
            return Err(RestoreError::InvalidHexSize(record.hex_size));
        }

        let mut world = WorldState::new(
            record.map_width,
            record.map_height,
            Layout::new(record.hex_size),
        );

        let mut tiles = Vec::with_capacity(record.tiles.len());
        for (key, tile) in record.tiles {
            let coord = HexCoord::new(tile.q, tile.r);
            if HexCoord::parse_key(&key) != Some(coord) {
                return Err(RestoreError::KeyMismatch { key });
            }
            if tile.q as i64 + tile.r as i64 + tile.s as i64 != 0 {
                return Err(RestoreError::CubeInvariant {
                    q: tile.q,
                    r: tile.r,
                    s: tile.s,
                });
            }
            if !world.in_region(coord) {
                return Err(RestoreError::OutOfRegion(coord));
            }
            tiles.push(Tile {
                coord,
                biome: tile.biome,
                building: tile.building,
                start_location: tile.start_location,
            });
        }
        world.insert_tiles(tiles);

        let expected = record.map_width as usize * record.map_height as usize;
        if world.tiles.len() != expected {
            return Err(RestoreError::IncompleteRegion {
                expected,
                found: world.tiles.len(),
            });
        }

        record.ledger.validate()?;
        world.ledger = record.ledger;

        let mut seen = HashSet::new();
        for agent in &record.agents {
            if !seen.insert(agent.id) {
                return Err(RestoreError::DuplicateAgent(agent.id));
            }
            if agent.id.raw() >= record.next_agent_id {
                return Err(RestoreError::AgentIdAhead {
                    id: agent.id,
                    next: record.next_agent_id,
                });
            }
        }
        world.agents = record.agents;
        world.next_agent_id = record.next_agent_id;
        Ok(world)
    }
}

/// Serialized form of a [`WorldState`]. Tiles are keyed by `"q,r"`.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct PersistedWorld {
    pub map_width: u32,
    pub map_height: u32,
    pub hex_size: f64,
    pub tiles: BTreeMap<String, PersistedTile>,
    pub ledger: ResourceLedger,
    pub agents: Vec<Agent>,
    pub next_agent_id: u64,
}

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct PersistedTile {
    pub q: i32,
    pub r: i32,
    pub s: i32,
    pub biome: Biome,
    pub building: Option<BuildingKind>,
    #[serde(default)]
    pub start_location: bool,
}

#[derive(Debug, Error, Clone, PartialEq)]
pub enum LedgerError {
    #[error("ledger {resource} is {value}, expected a non-negative number")]
    InvalidAmount { resource: ResourceKind, value: f64 },
    #[error("ledger happiness {0} is not finite")]
    InvalidHappiness(f64),
}

#[derive(Debug, Error, PartialEq)]
pub enum RestoreError {
    #[error("map dimensions must be positive")]
    EmptyMap,
    #[error("hex size {0} is not a positive number")]
    InvalidHexSize(f64),
    #[error("tile key '{key}' does not match its coordinate")]
    KeyMismatch { key: String },
    #[error("tile ({q}, {r}, {s}) violates q + r + s = 0")]
    CubeInvariant { q: i32, r: i32, s: i32 },
    #[error("tile {0} lies outside the generated region")]
    OutOfRegion(HexCoord),
    #[error("expected {expected} tiles, found {found}")]
    IncompleteRegion { expected: usize, found: usize },
    #[error(transparent)]
    InvalidLedger(#[from] LedgerError),
    #[error("agent id {0} appears more than once")]
    DuplicateAgent(AgentId),
    #[error("agent id {id} is not below the next allocated id {next}")]
    AgentIdAhead { id: AgentId, next: u64 },
}

/// Compact view of a world for logs and progress hooks.
#[derive(Debug, Clone, Serialize)]
pub struct WorldSummary {
    pub map_width: u32,
    pub map_height: u32,
    pub tiles: usize,
    pub buildings: BTreeMap<String, usize>,
    pub agents: usize,
    pub ledger: ResourceLedger,
}
