use std::fmt;

use serde::{Deserialize, Serialize};

use crate::hex::{HexCoord, Point};

#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(rename_all = "SCREAMING_SNAKE_CASE")]
pub enum Biome {
    Plains,
    Forest,
    Mountain,
    Desert,
    Water,
    Hills,
}

#[derive(Debug, Clone, Copy, PartialEq, Eq, PartialOrd, Ord, Hash, Serialize, Deserialize)]
#[serde(rename_all = "SCREAMING_SNAKE_CASE")]
pub enum ResourceKind {
    Food,
    Wood,
    Stone,
    Iron,
    Gold,
}

impl ResourceKind {
    pub const ALL: [ResourceKind; 5] = [
        ResourceKind::Food,
        ResourceKind::Wood,
        ResourceKind::Stone,
        ResourceKind::Iron,
        ResourceKind::Gold,
    ];
}

impl fmt::Display for ResourceKind {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        let name = match self {
            ResourceKind::Food => "food",
            ResourceKind::Wood => "wood",
            ResourceKind::Stone => "stone",
            ResourceKind::Iron => "iron",
            ResourceKind::Gold => "gold",
        };
        f.write_str(name)
    }
}

#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(rename_all = "SCREAMING_SNAKE_CASE")]
pub enum BuildingKind {
    TownHall,
    House,
    Farm,
    Sawmill,
    Mine,
}

/// Static configuration of a building kind.
#[derive(Debug)]
pub struct BuildingSpec {
    pub name: &'static str,
    pub description: &'static str,
    pub cost: &'static [(ResourceKind, f64)],
    pub production: &'static [(ResourceKind, f64)],
}

static TOWN_HALL: BuildingSpec = BuildingSpec {
    name: "Town Hall",
    description: "Center of your civilization",
    cost: &[(ResourceKind::Wood, 500.0), (ResourceKind::Stone, 500.0)],
    production: &[
        (ResourceKind::Food, 1.0),
        (ResourceKind::Wood, 1.0),
        (ResourceKind::Gold, 2.0),
    ],
};

static HOUSE: BuildingSpec = BuildingSpec {
    name: "House",
    description: "Provides population",
    cost: &[(ResourceKind::Wood, 50.0)],
    production: &[(ResourceKind::Gold, 0.5)],
};

static FARM: BuildingSpec = BuildingSpec {
    name: "Farm",
    description: "Produces Food",
    cost: &[(ResourceKind::Wood, 30.0), (ResourceKind::Stone, 10.0)],
    production: &[(ResourceKind::Food, 5.0)],
};

static SAWMILL: BuildingSpec = BuildingSpec {
    name: "Sawmill",
    description: "Produces Wood",
    cost: &[(ResourceKind::Wood, 40.0), (ResourceKind::Stone, 20.0)],
    production: &[(ResourceKind::Wood, 5.0)],
};

static MINE: BuildingSpec = BuildingSpec {
    name: "Mine",
    description: "Produces Stone and Iron",
    cost: &[(ResourceKind::Wood, 60.0), (ResourceKind::Stone, 40.0)],
    production: &[(ResourceKind::Stone, 3.0), (ResourceKind::Iron, 1.0)],
};

impl BuildingKind {
    pub const ALL: [BuildingKind; 5] = [
        BuildingKind::TownHall,
        BuildingKind::House,
        BuildingKind::Farm,
        BuildingKind::Sawmill,
        BuildingKind::Mine,
    ];

    pub fn spec(self) -> &'static BuildingSpec {
        match self {
            BuildingKind::TownHall => &TOWN_HALL,
            BuildingKind::House => &HOUSE,
            BuildingKind::Farm => &FARM,
            BuildingKind::Sawmill => &SAWMILL,
            BuildingKind::Mine => &MINE,
        }
    }

    pub fn cost(self) -> &'static [(ResourceKind, f64)] {
        self.spec().cost
    }

    pub fn production(self) -> &'static [(ResourceKind, f64)] {
        self.spec().production
    }

    /// The Town Hall only comes from world generation.
    pub fn is_player_buildable(self) -> bool {
        self != BuildingKind::TownHall
    }

    /// Kinds offered in the build menu.
    pub fn buildable() -> impl Iterator<Item = BuildingKind> {
        Self::ALL.into_iter().filter(|kind| kind.is_player_buildable())
    }
}

impl fmt::Display for BuildingKind {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.spec().name)
    }
}

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct Tile {
    pub coord: HexCoord,
    pub biome: Biome,
    pub building: Option<BuildingKind>,
    #[serde(default)]
    pub start_location: bool,
}

impl Tile {
    pub fn new(coord: HexCoord, biome: Biome) -> Self {
        Self {
            coord,
            biome,
            building: None,
            start_location: false,
        }
    }

    pub fn is_occupied(&self) -> bool {
        self.building.is_some()
    }
}

#[derive(Debug, Clone, Copy, PartialEq, Eq, PartialOrd, Ord, Hash, Serialize, Deserialize)]
pub struct AgentId(u64);

impl AgentId {
    pub fn raw(self) -> u64 {
        self.0
    }

    pub(crate) fn from_raw(raw: u64) -> Self {
        Self(raw)
    }
}

impl fmt::Display for AgentId {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "agent#{}", self.0)
    }
}

#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "SCREAMING_SNAKE_CASE")]
pub enum AgentKind {
    Villager,
}

#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "SCREAMING_SNAKE_CASE")]
pub enum MotionState {
    Idle,
    Moving,
    Working,
}

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct Agent {
    pub id: AgentId,
    pub kind: AgentKind,
    pub position: Point,
    pub target: Option<Point>,
    pub state: MotionState,
}

impl Agent {
    pub fn villager(id: AgentId, position: Point) -> Self {
        Self {
            id,
            kind: AgentKind::Villager,
            position,
            target: None,
            state: MotionState::Idle,
        }
    }

    /// True when the agent is within `epsilon` of its target on both axes.
    pub fn has_reached_target(&self, epsilon: f64) -> bool {
        match self.target {
            Some(target) => {
                (target.x - self.position.x).abs() < epsilon
                    && (target.y - self.position.y).abs() < epsilon
            }
            None => false,
        }
    }
}
