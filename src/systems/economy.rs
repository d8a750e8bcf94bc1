use std::collections::BTreeMap;

use anyhow::Result;
use tracing::debug;

use crate::{
    components::ResourceKind,
    engine::{System, SystemContext},
    rng::SystemRng,
    world::WorldState,
};

pub const DEFAULT_ECONOMY_INTERVAL_MS: u64 = 1_000;

/// Per-tick yield of every resource, zero for those nothing produces.
pub type ProductionRates = BTreeMap<ResourceKind, f64>;

/// Sums the production of every building on the map.
pub fn production_rates(world: &WorldState) -> ProductionRates {
    let mut rates: ProductionRates = ResourceKind::ALL.iter().map(|kind| (*kind, 0.0)).collect();
    for (_, building) in world.buildings() {
        for (resource, amount) in building.production() {
            *rates.entry(*resource).or_insert(0.0) += amount;
        }
    }
    rates
}

/// Credits one tick of production to the ledger and returns what was added.
///
/// Population and happiness are left alone.
pub fn apply_production(world: &mut WorldState) -> ProductionRates {
    let rates = production_rates(world);
    let ledger = world.ledger_mut();
    for (resource, amount) in &rates {
        if *amount > 0.0 {
            ledger.credit(*resource, *amount);
        }
    }
    rates
}

pub struct EconomySystem {
    interval_ms: u64,
}

impl EconomySystem {
    pub fn new() -> Self {
        Self::with_interval(DEFAULT_ECONOMY_INTERVAL_MS)
    }

    pub fn with_interval(interval_ms: u64) -> Self {
        Self { interval_ms }
    }
}

impl Default for EconomySystem {
    fn default() -> Self {
        Self::new()
    }
}

impl System for EconomySystem {
    fn name(&self) -> &str {
        "economy"
    }

    fn interval_ms(&self) -> u64 {
        self.interval_ms
    }

    fn run(
        &mut self,
        ctx: &SystemContext,
        world: &mut WorldState,
        _rng: &mut SystemRng<'_>,
    ) -> Result<()> {
        let added = apply_production(world);
        let ledger = world.ledger();
        debug!(
            tick = ctx.tick,
            food = added[&ResourceKind::Food],
            wood = added[&ResourceKind::Wood],
            stone = added[&ResourceKind::Stone],
            iron = added[&ResourceKind::Iron],
            gold = added[&ResourceKind::Gold],
            total_food = ledger.food,
            total_wood = ledger.wood,
            "economy tick"
        );
        Ok(())
    }
}
