pub mod commands;
pub mod components;
pub mod engine;
pub mod generation;
pub mod hex;
pub mod noise;
pub mod realtime;
pub mod rng;
pub mod scenario;
pub mod snapshot;
pub mod systems;
pub mod world;

pub use commands::{Command, CommandError};
pub use engine::{Engine, EngineBuilder, EngineSettings};
pub use hex::{HexCoord, Layout, Point};
pub use scenario::Scenario;
pub use world::WorldState;
