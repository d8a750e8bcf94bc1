use std::collections::VecDeque;
use std::path::PathBuf;

use anyhow::{Context, Result};
use tracing::{info, warn};

use crate::{
    commands::{Command, CommandError},
    rng::{RngManager, SystemRng},
    snapshot::SnapshotWriter,
    world::WorldState,
};

pub struct EngineSettings {
    pub scenario_name: String,
    pub seed: u64,
    /// Simulated milliseconds between snapshots; zero disables them.
    pub snapshot_interval_ms: u64,
    pub snapshot_dir: PathBuf,
}

pub struct EngineBuilder {
    settings: EngineSettings,
    systems: Vec<Box<dyn System>>,
}

impl EngineBuilder {
    pub fn new(settings: EngineSettings) -> Self {
        Self {
            settings,
            systems: Vec::new(),
        }
    }

    pub fn with_system(mut self, system: impl System + 'static) -> Self {
        self.systems.push(Box::new(system));
        self
    }

    pub fn push_system(&mut self, system: impl System + 'static) {
        self.systems.push(Box::new(system));
    }

    pub fn build(self) -> Engine {
        let systems: Vec<Scheduled> = self
            .systems
            .into_iter()
            .map(|system| Scheduled {
                interval_ms: system.interval_ms().max(1),
                ticks: 0,
                system,
            })
            .collect();
        let step_ms = systems
            .iter()
            .map(|scheduled| scheduled.interval_ms)
            .reduce(gcd)
            .unwrap_or(DEFAULT_STEP_MS);

        Engine {
            rng: RngManager::new(self.settings.seed),
            systems,
            step_ms,
            elapsed_ms: 0,
            steps: 0,
            pending: VecDeque::new(),
            snapshot_writer: SnapshotWriter::new(
                &self.settings.snapshot_dir,
                self.settings.snapshot_interval_ms,
            ),
            settings: self.settings,
        }
    }
}

const DEFAULT_STEP_MS: u64 = 50;

fn gcd(a: u64, b: u64) -> u64 {
    if b == 0 {
        a
    } else {
        gcd(b, a % b)
    }
}

struct Scheduled {
    system: Box<dyn System>,
    interval_ms: u64,
    ticks: u64,
}

/// What happened during one engine step.
#[derive(Debug, Default)]
pub struct StepReport {
    pub step: u64,
    pub elapsed_ms: u64,
    /// Names of the systems that ran, in registration order.
    pub ran: Vec<String>,
    pub rejected: Vec<(Command, CommandError)>,
    pub snapshot: Option<PathBuf>,
}

/// Fixed-step scheduler that owns the simulated clock.
///
/// Each step first drains queued commands, then runs every system whose
/// interval divides the new elapsed time.
pub struct Engine {
    rng: RngManager,
    systems: Vec<Scheduled>,
    step_ms: u64,
    elapsed_ms: u64,
    steps: u64,
    pending: VecDeque<Command>,
    snapshot_writer: SnapshotWriter,
    settings: EngineSettings,
}

impl Engine {
    pub fn step_ms(&self) -> u64 {
        self.step_ms
    }

    pub fn elapsed_ms(&self) -> u64 {
        self.elapsed_ms
    }

    pub fn steps(&self) -> u64 {
        self.steps
    }

    pub fn scenario_name(&self) -> &str {
        &self.settings.scenario_name
    }

    /// How many times the named system has run.
    pub fn system_ticks(&self, name: &str) -> Option<u64> {
        self.systems
            .iter()
            .find(|scheduled| scheduled.system.name() == name)
            .map(|scheduled| scheduled.ticks)
    }

    /// Queues a command for the start of the next step.
    pub fn submit(&mut self, command: Command) {
        self.pending.push_back(command);
    }

    pub fn pending_commands(&self) -> usize {
        self.pending.len()
    }

    pub fn step(&mut self, world: &mut WorldState) -> Result<StepReport> {
        let mut report = StepReport::default();

        while let Some(command) = self.pending.pop_front() {
            if let Err(err) = command.apply(world) {
                warn!(?command, error = %err, "command rejected");
                report.rejected.push((command, err));
            }
        }

        self.elapsed_ms += self.step_ms;
        self.steps += 1;
        report.step = self.steps;
        report.elapsed_ms = self.elapsed_ms;

        for scheduled in &mut self.systems {
            if self.elapsed_ms % scheduled.interval_ms != 0 {
                continue;
            }
            scheduled.ticks += 1;
            let mut rng_stream = self.rng.stream(scheduled.system.name());
            let ctx = SystemContext {
                tick: scheduled.ticks,
                elapsed_ms: self.elapsed_ms,
                scenario_name: &self.settings.scenario_name,
            };
            scheduled
                .system
                .run(&ctx, world, &mut rng_stream)
                .with_context(|| format!("system '{}' failed", scheduled.system.name()))?;
            report.ran.push(scheduled.system.name().to_string());
        }

        report.snapshot = self.snapshot_writer.maybe_write(
            world,
            &self.settings.scenario_name,
            self.steps,
            self.elapsed_ms,
        )?;
        Ok(report)
    }

    pub fn run(&mut self, world: &mut WorldState, steps: u64) -> Result<()> {
        self.run_with_hook(world, steps, |_, _| {})
    }

    /// Runs as many whole steps as fit in `duration_ms` of simulated time.
    pub fn run_for(&mut self, world: &mut WorldState, duration_ms: u64) -> Result<()> {
        let steps = duration_ms / self.step_ms;
        self.run(world, steps)
    }

    pub fn run_with_hook<F>(
        &mut self,
        world: &mut WorldState,
        steps: u64,
        mut hook: F,
    ) -> Result<()>
    where
        F: FnMut(&StepReport, &WorldState),
    {
        info!(
            scenario = %self.settings.scenario_name,
            steps,
            step_ms = self.step_ms,
            "running engine"
        );
        for _ in 0..steps {
            let report = self.step(world)?;
            hook(&report, world);
        }
        Ok(())
    }
}

pub struct SystemContext<'a> {
    /// Runs of this system so far, including the current one.
    pub tick: u64,
    pub elapsed_ms: u64,
    pub scenario_name: &'a str,
}

pub trait System {
    fn name(&self) -> &str;
    /// Simulated milliseconds between runs.
    fn interval_ms(&self) -> u64;
    fn run(
        &mut self,
        ctx: &SystemContext,
        world: &mut WorldState,
        rng: &mut SystemRng<'_>,
    ) -> Result<()>;
}
