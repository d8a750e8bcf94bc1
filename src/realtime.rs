//! Wall-clock driver for an engine over a shared world.

use std::{
    future,
    sync::{Arc, Mutex},
    time::Duration,
};

use anyhow::{anyhow, Result};
use tokio::{
    sync::{mpsc, watch},
    time::{self, MissedTickBehavior},
};
use tracing::{info, warn};

use crate::{
    commands::Command,
    engine::Engine,
    world::{WorldState, WorldSummary},
};

pub type SharedWorld = Arc<Mutex<WorldState>>;

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum StopReason {
    Interrupted,
    TimeLimit,
}

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct RealtimeStats {
    pub steps: u64,
    pub rejected_commands: usize,
    pub stop: StopReason,
}

/// Handles for talking to a running simulation from other tasks.
#[derive(Clone)]
pub struct RealtimeHandle {
    pub world: SharedWorld,
    pub commands: mpsc::UnboundedSender<Command>,
    pub summaries: watch::Receiver<WorldSummary>,
}

pub struct RealtimeRunner {
    engine: Engine,
    world: SharedWorld,
    commands: mpsc::UnboundedReceiver<Command>,
    summaries: watch::Sender<WorldSummary>,
}

impl RealtimeRunner {
    pub fn new(engine: Engine, world: WorldState) -> (Self, RealtimeHandle) {
        let (command_tx, command_rx) = mpsc::unbounded_channel();
        let (summary_tx, summary_rx) = watch::channel(world.summary());
        let world = Arc::new(Mutex::new(world));
        let runner = Self {
            engine,
            world: world.clone(),
            commands: command_rx,
            summaries: summary_tx,
        };
        let handle = RealtimeHandle {
            world,
            commands: command_tx,
            summaries: summary_rx,
        };
        (runner, handle)
    }

    /// Steps the engine once per base interval until Ctrl+C or `limit`.
    ///
    /// Late ticks are not replayed; the next step happens one interval after
    /// the late one.
    pub async fn run(mut self, limit: Option<Duration>) -> Result<(Engine, RealtimeStats)> {
        let mut ticker = time::interval(Duration::from_millis(self.engine.step_ms()));
        ticker.set_missed_tick_behavior(MissedTickBehavior::Delay);
        // the first tick completes immediately
        ticker.tick().await;

        let deadline = async {
            match limit {
                Some(limit) => time::sleep(limit).await,
                None => future::pending::<()>().await,
            }
        };
        tokio::pin!(deadline);
        let interrupt = tokio::signal::ctrl_c();
        tokio::pin!(interrupt);

        let mut commands_open = true;
        let mut steps = 0;
        let mut rejected_commands = 0;
        info!(step_ms = self.engine.step_ms(), "realtime loop started");

        let stop = loop {
            tokio::select! {
                _ = &mut interrupt => break StopReason::Interrupted,
                _ = &mut deadline => break StopReason::TimeLimit,
                command = self.commands.recv(), if commands_open => match command {
                    Some(command) => self.engine.submit(command),
                    None => commands_open = false,
                },
                _ = ticker.tick() => {
                    let summary = {
                        let mut world = self
                            .world
                            .lock()
                            .map_err(|_| anyhow!("world lock poisoned"))?;
                        let report = self.engine.step(&mut world)?;
                        rejected_commands += report.rejected.len();
                        world.summary()
                    };
                    steps += 1;
                    // no receivers left is fine
                    let _ = self.summaries.send(summary);
                }
            }
        };

        match stop {
            StopReason::Interrupted => warn!(steps, "interrupted; stopping realtime loop"),
            StopReason::TimeLimit => info!(steps, "time limit reached; stopping realtime loop"),
        }
        let stats = RealtimeStats {
            steps,
            rejected_commands,
            stop,
        };
        Ok((self.engine, stats))
    }
}
