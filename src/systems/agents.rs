use anyhow::Result;
use rand::Rng;
use serde::{Deserialize, Serialize};
use tracing::{debug, trace};

use crate::{
    components::{AgentId, MotionState},
    engine::{System, SystemContext},
    hex::Point,
    rng::SystemRng,
    world::WorldState,
};

fn default_interval_ms() -> u64 {
    50
}

fn default_speed() -> f64 {
    2.0
}

fn default_arrival_epsilon() -> f64 {
    5.0
}

fn default_target_jitter() -> f64 {
    10.0
}

fn default_wrap_movement() -> bool {
    true
}

/// Tuning for villager movement, in pixels and simulated milliseconds.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct AgentConfig {
    #[serde(default = "default_interval_ms")]
    pub interval_ms: u64,
    /// Distance covered per tick.
    #[serde(default = "default_speed")]
    pub speed: f64,
    /// Per-axis distance under which a target counts as reached.
    #[serde(default = "default_arrival_epsilon")]
    pub arrival_epsilon: f64,
    /// Half-width of the random offset added to a target tile centre.
    #[serde(default = "default_target_jitter")]
    pub target_jitter: f64,
    /// Walk across the map seams instead of across the whole map.
    #[serde(default = "default_wrap_movement")]
    pub wrap_movement: bool,
}

impl Default for AgentConfig {
    fn default() -> Self {
        Self {
            interval_ms: default_interval_ms(),
            speed: default_speed(),
            arrival_epsilon: default_arrival_epsilon(),
            target_jitter: default_target_jitter(),
            wrap_movement: default_wrap_movement(),
        }
    }
}

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum AgentTickOutcome {
    Spawned(AgentId),
    Despawned(AgentId),
    /// Agents moved; `retargeted` of them picked a new destination first.
    Moved { retargeted: usize },
    /// Population wants more agents but there is no tile to put them on.
    Stalled,
}

/// One agent tick.
///
/// A tick either reconciles the agent count with the population by one
/// agent, or moves every agent. Never both.
pub fn advance_agents<R: Rng + ?Sized>(
    world: &mut WorldState,
    config: &AgentConfig,
    rng: &mut R,
) -> AgentTickOutcome {
    let wanted = world.ledger().population as usize;
    let present = world.agents().len();

    if present < wanted {
        return match random_tile_center(world, rng) {
            Some(position) => {
                let id = world.spawn_agent(position);
                debug!(agent = %id, x = position.x, y = position.y, "spawned villager");
                AgentTickOutcome::Spawned(id)
            }
            None => AgentTickOutcome::Stalled,
        };
    }
    if present > wanted {
        if let Some(agent) = world.remove_first_agent() {
            debug!(agent = %agent.id, "removed villager");
            return AgentTickOutcome::Despawned(agent.id);
        }
    }

    let retargeted = assign_targets(world, config, rng);
    move_agents(world, config);
    AgentTickOutcome::Moved { retargeted }
}

fn random_tile_center<R: Rng + ?Sized>(world: &WorldState, rng: &mut R) -> Option<Point> {
    let count = world.tile_count();
    if count == 0 {
        return None;
    }
    let tile = world.nth_tile(rng.gen_range(0..count))?;
    Some(world.tile_center(tile.coord))
}

fn assign_targets<R: Rng + ?Sized>(
    world: &mut WorldState,
    config: &AgentConfig,
    rng: &mut R,
) -> usize {
    let idle: Vec<usize> = world
        .agents()
        .iter()
        .enumerate()
        .filter(|(_, agent)| {
            agent.target.is_none() || agent.has_reached_target(config.arrival_epsilon)
        })
        .map(|(index, _)| index)
        .collect();

    let jitter = config.target_jitter.max(0.0);
    let mut fresh = Vec::with_capacity(idle.len());
    for index in idle {
        let Some(center) = random_tile_center(world, rng) else {
            break;
        };
        let (dx, dy) = if jitter > 0.0 {
            (rng.gen_range(-jitter..jitter), rng.gen_range(-jitter..jitter))
        } else {
            (0.0, 0.0)
        };
        fresh.push((index, Point::new(center.x + dx, center.y + dy)));
    }

    let torus = world.torus();
    let agents = world.agents_mut();
    for (index, raw) in &fresh {
        let agent = &mut agents[*index];
        let target = if config.wrap_movement {
            torus.nearest_image(*raw, agent.position)
        } else {
            *raw
        };
        trace!(agent = %agent.id, x = target.x, y = target.y, "new target");
        agent.target = Some(target);
        agent.state = MotionState::Moving;
    }
    fresh.len()
}

fn move_agents(world: &mut WorldState, config: &AgentConfig) {
    let torus = world.torus();
    for agent in world.agents_mut() {
        let Some(target) = agent.target else {
            continue;
        };
        let dx = target.x - agent.position.x;
        let dy = target.y - agent.position.y;
        let dist = dx.hypot(dy);
        if dist > config.speed {
            agent.position.x += dx / dist * config.speed;
            agent.position.y += dy / dist * config.speed;
        } else {
            agent.position = target;
        }

        if config.wrap_movement {
            // Target moves with the agent so the pair stays on one image.
            let shift = torus.normalizing_shift(agent.position);
            agent.position = Point::new(agent.position.x + shift.x, agent.position.y + shift.y);
            agent.target = Some(Point::new(target.x + shift.x, target.y + shift.y));
        }
    }
}

pub struct AgentSystem {
    config: AgentConfig,
}

impl AgentSystem {
    pub fn new(config: AgentConfig) -> Self {
        Self { config }
    }

    pub fn config(&self) -> &AgentConfig {
        &self.config
    }
}

impl Default for AgentSystem {
    fn default() -> Self {
        Self::new(AgentConfig::default())
    }
}

impl System for AgentSystem {
    fn name(&self) -> &str {
        "agents"
    }

    fn interval_ms(&self) -> u64 {
        self.config.interval_ms
    }

    fn run(
        &mut self,
        ctx: &SystemContext,
        world: &mut WorldState,
        rng: &mut SystemRng<'_>,
    ) -> Result<()> {
        let outcome = advance_agents(world, &self.config, rng);
        if outcome == AgentTickOutcome::Stalled {
            debug!(tick = ctx.tick, "no tiles to spawn villagers on");
        }
        Ok(())
    }
}
