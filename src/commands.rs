//! Player intents validated against the world before anything is mutated

use serde::{Deserialize, Serialize};
use thiserror::Error;
use tracing::debug;

use crate::components::{BuildingKind, ResourceKind};
use crate::hex::HexCoord;
use crate::world::{ResourceLedger, WorldState};

#[derive(Debug, Error, Clone, PartialEq)]
pub enum CommandError {
    #[error("no tile at {0}")]
    InvalidCoordinate(HexCoord),
    #[error("tile {coord} already holds a {existing}")]
    TileOccupied {
        coord: HexCoord,
        existing: BuildingKind,
    },
    #[error("need {required} {resource}, have {available}")]
    InsufficientResources {
        resource: ResourceKind,
        required: f64,
        available: f64,
    },
    #[error("{0} cannot be built by players")]
    NotBuildable(BuildingKind),
    #[error("amount {0} must be a non-negative number")]
    InvalidAmount(f64),
}

pub fn can_afford(ledger: &ResourceLedger, kind: BuildingKind) -> bool {
    ledger.shortfall(kind.cost()).is_none()
}

/// Places `kind` on the tile at `coord`, paying its full cost.
///
/// Either both the payment and the placement happen or neither does.
pub fn place_building(
    world: &mut WorldState,
    coord: HexCoord,
    kind: BuildingKind,
) -> Result<(), CommandError> {
    let tile = world
        .tile(coord)
        .ok_or(CommandError::InvalidCoordinate(coord))?;
    if let Some(existing) = tile.building {
        return Err(CommandError::TileOccupied { coord, existing });
    }
    if let Some((resource, required, available)) = world.ledger().shortfall(kind.cost()) {
        return Err(CommandError::InsufficientResources {
            resource,
            required,
            available,
        });
    }

    let ledger = world.ledger_mut();
    for (resource, amount) in kind.cost() {
        ledger.debit(*resource, *amount);
    }
    if let Some(tile) = world.tile_mut(coord) {
        tile.building = Some(kind);
    }
    debug!(%coord, building = %kind, "placed building");
    Ok(())
}

/// Spends `amount` of one resource if the ledger holds enough.
pub fn spend(
    world: &mut WorldState,
    resource: ResourceKind,
    amount: f64,
) -> Result<(), CommandError> {
    if !amount.is_finite() || amount < 0.0 {
        return Err(CommandError::InvalidAmount(amount));
    }
    let available = world.ledger().amount(resource);
    if available < amount {
        return Err(CommandError::InsufficientResources {
            resource,
            required: amount,
            available,
        });
    }
    world.ledger_mut().debit(resource, amount);
    Ok(())
}

/// A queued external intent.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(tag = "type", rename_all = "snake_case")]
pub enum Command {
    PlaceBuilding { coord: HexCoord, kind: BuildingKind },
    Spend { resource: ResourceKind, amount: f64 },
    /// Target population set by the growth rules outside the core.
    SetPopulation { population: u32 },
}

impl Command {
    pub fn apply(&self, world: &mut WorldState) -> Result<(), CommandError> {
        match self {
            Command::PlaceBuilding { coord, kind } => {
                if !kind.is_player_buildable() {
                    return Err(CommandError::NotBuildable(*kind));
                }
                place_building(world, *coord, *kind)
            }
            Command::Spend { resource, amount } => spend(world, *resource, *amount),
            Command::SetPopulation { population } => {
                world.ledger_mut().population = *population;
                Ok(())
            }
        }
    }
}
