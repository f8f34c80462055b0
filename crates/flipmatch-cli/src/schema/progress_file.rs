use std::path::Path;

use anyhow::Context;
use chrono::{DateTime, Utc};
use flipmatch_engine::{LevelCatalog, MemoryProgressStore, Progress};
use serde::{Deserialize, Serialize};

use crate::util;

/// Player progress as saved on disk between runs.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct ProgressFile {
    /// Timestamp of the last save (RFC 3339)
    pub saved_at: DateTime<Utc>,
    pub progress: Progress,
}

impl ProgressFile {
    pub fn new(progress: Progress) -> Self {
        Self {
            saved_at: Utc::now(),
            progress,
        }
    }

    pub fn open(path: &Path) -> anyhow::Result<Self> {
        util::read_json_file("progress", path)
    }

    /// Opens `path`, or starts from fresh progress if the file does not exist yet.
    pub fn open_or_default(path: &Path) -> anyhow::Result<Self> {
        if !path.try_exists().with_context(|| {
            format!("Failed to check progress file: {}", path.display())
        })? {
            log::info!("{} not found, starting from fresh progress", path.display());
            return Ok(Self::new(Progress::default()));
        }
        Self::open(path)
    }

    /// Wraps the progress in a store sized for the standard catalog.
    pub fn into_store(self) -> MemoryProgressStore {
        MemoryProgressStore::from_progress(self.progress, LevelCatalog::STANDARD_LEN)
    }

    /// Stamps the current time and writes the file.
    pub fn save(progress: Progress, path: &Path) -> anyhow::Result<()> {
        let file = Self::new(progress);
        util::write_json(&file, Some(path))?;
        log::info!("progress saved to {}", path.display());
        Ok(())
    }
}

#[cfg(test)]
mod tests {
    use flipmatch_engine::PowerupKind;

    use super::*;

    #[test]
    fn test_json_layout() {
        let store = MemoryProgressStore::default()
            .with_currency(75)
            .with_powerups(PowerupKind::Glimpse, 2);
        let file = ProgressFile::new(store.into_progress());
        let json = serde_json::to_value(&file).unwrap();
        assert!(json["saved_at"].is_string());
        assert_eq!(json["progress"]["currency"], 75);
        assert_eq!(json["progress"]["powerup_inventory"]["glimpse"], 2);

        let parsed: ProgressFile = serde_json::from_value(json).unwrap();
        assert_eq!(parsed.saved_at, file.saved_at);
        assert_eq!(parsed.progress, file.progress);
    }

    #[test]
    fn test_accepts_rfc3339_and_sparse_progress() {
        let file: ProgressFile = serde_json::from_str(
            r#"{"saved_at":"2024-05-01T12:30:00+02:00","progress":{"max_unlocked_level":4}}"#,
        )
        .unwrap();
        assert_eq!(file.saved_at.to_rfc3339(), "2024-05-01T10:30:00+00:00");
        assert_eq!(file.progress.max_unlocked_level, 4);
        assert_eq!(file.progress.currency, 0);
    }
}
