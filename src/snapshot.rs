//! Periodic JSON checkpoints of the world and loading them back

use std::fs;
use std::path::{Path, PathBuf};

use chrono::{DateTime, Utc};
use serde::{Deserialize, Serialize};
use thiserror::Error;
use tracing::info;

use crate::world::{PersistedWorld, RestoreError, WorldState};

#[derive(Debug, Error)]
pub enum SnapshotError {
    #[error("snapshot io error: {0}")]
    Io(#[from] std::io::Error),
    #[error("snapshot is not valid json: {0}")]
    Json(#[from] serde_json::Error),
    #[error("snapshot holds an invalid world: {0}")]
    Restore(#[from] RestoreError),
}

/// File layout of a snapshot.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct SnapshotEnvelope {
    pub scenario: String,
    pub step: u64,
    pub elapsed_ms: u64,
    pub saved_at: DateTime<Utc>,
    pub world: PersistedWorld,
}

pub struct SnapshotWriter {
    output_dir: PathBuf,
    interval_ms: u64,
    last_written_ms: u64,
}

impl SnapshotWriter {
    pub fn new(output_dir: impl AsRef<Path>, interval_ms: u64) -> Self {
        Self {
            output_dir: output_dir.as_ref().to_path_buf(),
            interval_ms,
            last_written_ms: 0,
        }
    }

    pub fn is_enabled(&self) -> bool {
        self.interval_ms > 0
    }

    /// Writes a snapshot once at least one interval has passed since the last.
    pub fn maybe_write(
        &mut self,
        world: &WorldState,
        scenario_name: &str,
        step: u64,
        elapsed_ms: u64,
    ) -> Result<Option<PathBuf>, SnapshotError> {
        if !self.is_enabled() || elapsed_ms < self.last_written_ms + self.interval_ms {
            return Ok(None);
        }
        let path = self.write(world, scenario_name, step, elapsed_ms)?;
        self.last_written_ms = elapsed_ms;
        Ok(Some(path))
    }

    pub fn write(
        &self,
        world: &WorldState,
        scenario_name: &str,
        step: u64,
        elapsed_ms: u64,
    ) -> Result<PathBuf, SnapshotError> {
        let dir = self.output_dir.join(scenario_name);
        fs::create_dir_all(&dir)?;
        let path = dir.join(format!("step_{step:08}.json"));
        let envelope = SnapshotEnvelope {
            scenario: scenario_name.to_string(),
            step,
            elapsed_ms,
            saved_at: Utc::now(),
            world: world.to_persisted(),
        };
        fs::write(&path, serde_json::to_string_pretty(&envelope)?)?;
        info!(path = %path.display(), step, "wrote snapshot");
        Ok(path)
    }
}

pub fn read_envelope(path: impl AsRef<Path>) -> Result<SnapshotEnvelope, SnapshotError> {
    let data = fs::read_to_string(path)?;
    Ok(serde_json::from_str(&data)?)
}

/// Reads a snapshot file and validates it into a world.
pub fn load_snapshot(path: impl AsRef<Path>) -> Result<WorldState, SnapshotError> {
    let envelope = read_envelope(path)?;
    Ok(WorldState::from_persisted(envelope.world)?)
}

/// Snapshot files under `dir`, oldest step first.
pub fn list_snapshots(dir: impl AsRef<Path>) -> Result<Vec<PathBuf>, SnapshotError> {
    let mut paths = Vec::new();
    for entry in fs::read_dir(dir)? {
        let path = entry?.path();
        if path.extension().is_some_and(|ext| ext == "json") {
            paths.push(path);
        }
    }
    paths.sort();
    Ok(paths)
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::components::{Biome, Tile};
    use crate::hex::{HexCoord, Layout};

    fn world() -> WorldState {
        let mut world = WorldState::new(1, 1, Layout::default());
        world.insert_tile(Tile::new(HexCoord::new(0, 0), Biome::Forest));
        world
    }

    #[test]
    fn test_disabled_writer_skips() {
        let dir = tempfile::tempdir().unwrap();
        let mut writer = SnapshotWriter::new(dir.path(), 0);
        let written = writer.maybe_write(&world(), "s", 1, 1_000).unwrap();
        assert!(written.is_none());
    }

    #[test]
    fn test_writes_on_interval() {
        let dir = tempfile::tempdir().unwrap();
        let mut writer = SnapshotWriter::new(dir.path(), 1_000);
        let world = world();
        assert!(writer.maybe_write(&world, "s", 10, 500).unwrap().is_none());
        let first = writer.maybe_write(&world, "s", 20, 1_000).unwrap().unwrap();
        assert!(writer.maybe_write(&world, "s", 30, 1_500).unwrap().is_none());
        assert!(writer.maybe_write(&world, "s", 40, 2_000).unwrap().is_some());
        assert!(first.exists());
        assert_eq!(list_snapshots(dir.path().join("s")).unwrap().len(), 2);
    }

    #[test]
    fn test_load_rejects_garbage() {
        let dir = tempfile::tempdir().unwrap();
        let path = dir.path().join("bad.json");
        fs::write(&path, "{ not json").unwrap();
        assert!(matches!(load_snapshot(&path), Err(SnapshotError::Json(_))));
    }
}
