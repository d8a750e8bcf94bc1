mod agents;
mod economy;

pub use agents::{advance_agents, AgentConfig, AgentSystem, AgentTickOutcome};
pub use economy::{
    apply_production, production_rates, EconomySystem, ProductionRates,
    DEFAULT_ECONOMY_INTERVAL_MS,
};
