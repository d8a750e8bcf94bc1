use std::{
    fs,
    path::{Path, PathBuf},
};

use anyhow::{Context, Result};
use serde::Deserialize;

use crate::{
    engine::{Engine, EngineBuilder, EngineSettings},
    generation::{GeneratorConfig, WorldGenerator},
    hex::{Layout, DEFAULT_HEX_SIZE},
    systems::{AgentConfig, AgentSystem, EconomySystem},
    world::{ResourceLedger, WorldState},
};

fn default_name() -> String {
    "default".into()
}

fn default_seed() -> u64 {
    1
}

fn default_width() -> u32 {
    50
}

fn default_height() -> u32 {
    40
}

fn default_hex_size() -> f64 {
    DEFAULT_HEX_SIZE
}

fn default_noise_scale() -> f64 {
    0.1
}

fn default_economy_interval_ms() -> u64 {
    crate::systems::DEFAULT_ECONOMY_INTERVAL_MS
}

fn default_duration_seconds() -> f64 {
    60.0
}

fn default_snapshot_dir() -> PathBuf {
    PathBuf::from("snapshots")
}

fn default_log_level() -> String {
    "info".into()
}

#[derive(Debug, Clone, Deserialize)]
pub struct Scenario {
    #[serde(default = "default_name")]
    pub name: String,
    pub description: Option<String>,
    #[serde(default = "default_seed")]
    pub seed: u64,
    #[serde(default)]
    pub map: MapSettings,
    #[serde(default)]
    pub ledger: ResourceLedger,
    #[serde(default)]
    pub economy: EconomySettings,
    #[serde(default)]
    pub agents: AgentConfig,
    /// Simulated run length for headless runs.
    #[serde(default = "default_duration_seconds")]
    pub duration_seconds: f64,
    #[serde(default)]
    pub snapshot: SnapshotSettings,
    #[serde(default)]
    pub logging: LoggingSettings,
}

#[derive(Debug, Clone, Deserialize)]
pub struct MapSettings {
    #[serde(default = "default_width")]
    pub width: u32,
    #[serde(default = "default_height")]
    pub height: u32,
    #[serde(default = "default_hex_size")]
    pub hex_size: f64,
    #[serde(default = "default_noise_scale")]
    pub noise_scale: f64,
    #[serde(default)]
    pub require_start: bool,
}

impl Default for MapSettings {
    fn default() -> Self {
        Self {
            width: default_width(),
            height: default_height(),
            hex_size: default_hex_size(),
            noise_scale: default_noise_scale(),
            require_start: false,
        }
    }
}

#[derive(Debug, Clone, Deserialize)]
pub struct EconomySettings {
    #[serde(default = "default_economy_interval_ms")]
    pub interval_ms: u64,
}

impl Default for EconomySettings {
    fn default() -> Self {
        Self {
            interval_ms: default_economy_interval_ms(),
        }
    }
}

#[derive(Debug, Clone, Deserialize)]
pub struct SnapshotSettings {
    /// Simulated milliseconds between snapshots; zero disables them.
    #[serde(default)]
    pub interval_ms: u64,
    #[serde(default = "default_snapshot_dir")]
    pub output_dir: PathBuf,
}

impl Default for SnapshotSettings {
    fn default() -> Self {
        Self {
            interval_ms: 0,
            output_dir: default_snapshot_dir(),
        }
    }
}

#[derive(Debug, Clone, Deserialize)]
pub struct LoggingSettings {
    #[serde(default = "default_log_level")]
    pub level: String,
}

impl Default for LoggingSettings {
    fn default() -> Self {
        Self {
            level: default_log_level(),
        }
    }
}

impl Default for Scenario {
    fn default() -> Self {
        Self {
            name: default_name(),
            description: None,
            seed: default_seed(),
            map: MapSettings::default(),
            ledger: ResourceLedger::default(),
            economy: EconomySettings::default(),
            agents: AgentConfig::default(),
            duration_seconds: default_duration_seconds(),
            snapshot: SnapshotSettings::default(),
            logging: LoggingSettings::default(),
        }
    }
}

pub struct ScenarioLoader {
    base_dir: PathBuf,
}

impl ScenarioLoader {
    pub fn new(base_dir: impl AsRef<Path>) -> Self {
        Self {
            base_dir: base_dir.as_ref().to_path_buf(),
        }
    }

    pub fn load(&self, file: impl AsRef<Path>) -> Result<Scenario> {
        let path = self.base_dir.join(file);
        let data = fs::read_to_string(&path)
            .with_context(|| format!("Failed to read scenario file {}", path.display()))?;
        let scenario: Scenario = serde_yaml::from_str(&data)
            .with_context(|| format!("Failed to parse {}", path.display()))?;
        Ok(scenario)
    }
}

impl Scenario {
    pub fn generator_config(&self) -> GeneratorConfig {
        GeneratorConfig {
            layout: Layout::new(self.map.hex_size),
            noise_scale: self.map.noise_scale,
            starting_ledger: self.ledger.clone(),
            require_start: self.map.require_start,
        }
    }

    pub fn build_world(&self) -> Result<WorldState> {
        let generator = WorldGenerator::new(self.generator_config());
        let world = generator
            .generate(self.map.width, self.map.height, self.seed)
            .with_context(|| format!("Failed to generate world for scenario '{}'", self.name))?;
        Ok(world)
    }

    pub fn engine_settings(&self) -> EngineSettings {
        EngineSettings {
            scenario_name: self.name.clone(),
            seed: self.seed,
            snapshot_interval_ms: self.snapshot.interval_ms,
            snapshot_dir: self.snapshot.output_dir.clone(),
        }
    }

    /// Engine with the economy and agent systems registered.
    pub fn build_engine(&self) -> Engine {
        EngineBuilder::new(self.engine_settings())
            .with_system(EconomySystem::with_interval(self.economy.interval_ms))
            .with_system(AgentSystem::new(self.agents.clone()))
            .build()
    }

    pub fn duration_ms(&self, override_seconds: Option<f64>) -> u64 {
        let seconds = override_seconds.unwrap_or(self.duration_seconds).max(0.0);
        (seconds * 1_000.0).round() as u64
    }
}
