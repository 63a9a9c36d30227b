use std::fs;
use std::path::{Path, PathBuf};

use anyhow::{Context, Result};

use crate::world::World;

/// Writes `<dir>/<scenario>/tick_NNNNNN.json` every `interval` ticks. An
/// interval of zero disables output.
pub struct SnapshotWriter {
    dir: PathBuf,
    interval: u64,
}

impl SnapshotWriter {
    pub fn new(dir: impl AsRef<Path>, interval: u64) -> Self {
        Self {
            dir: dir.as_ref().to_path_buf(),
            interval,
        }
    }

    pub fn is_due(&self, tick: u64) -> bool {
        self.interval > 0 && tick > 0 && tick % self.interval == 0
    }

    pub fn maybe_write(&self, world: &World, scenario: &str) -> Result<Option<PathBuf>> {
        if !self.is_due(world.tick()) {
            return Ok(None);
        }
        let dir = self.dir.join(scenario);
        fs::create_dir_all(&dir)
            .with_context(|| format!("Failed to create snapshot dir {}", dir.display()))?;
        let path = dir.join(format!("tick_{:06}.json", world.tick()));
        let json = serde_json::to_string_pretty(&world.snapshot(scenario))?;
        fs::write(&path, json)
            .with_context(|| format!("Failed to write snapshot {}", path.display()))?;
        tracing::debug!(path = %path.display(), "snapshot written");
        Ok(Some(path))
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn interval_gating() {
        let writer = SnapshotWriter::new("unused", 10);
        assert!(!writer.is_due(0));
        assert!(!writer.is_due(9));
        assert!(writer.is_due(10));
        assert!(writer.is_due(30));
        assert!(!SnapshotWriter::new("unused", 0).is_due(10));
    }
}
