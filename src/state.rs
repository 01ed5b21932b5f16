//! Refresh state persisted between invocations.
//!
//! The engine itself is stateless. The host keeps two things across runs:
//!
//! - the id of the newest glucose entry last rendered, so an unchanged
//!   payload can be skipped;
//! - the insulin-on-board history, one value per refresh, newest first. The
//!   IOB endpoint only reports the current value, so the bar history has to be
//!   accumulated here. It is capped at one value per matrix column.

use std::collections::VecDeque;
use std::path::Path;

use anyhow::{Context, Result};
use log::{debug, warn};
use serde::{Deserialize, Serialize};

#[derive(Clone, Debug, Default, PartialEq, Serialize, Deserialize)]
#[serde(default)]
pub struct RefreshState {
    pub last_entry_id: Option<String>,
    pub iob_history: VecDeque<f32>,
}

impl RefreshState {
    /// Load state from `path`. A missing or unreadable file starts fresh.
    pub fn load(path: &Path) -> Self {
        let content = match std::fs::read_to_string(path) {
            Ok(content) => content,
            Err(e) => {
                debug!("No refresh state at {} ({e}), starting fresh", path.display());
                return Self::default();
            }
        };
        serde_json::from_str(&content).unwrap_or_else(|e| {
            warn!("Discarding corrupt refresh state {}: {e}", path.display());
            Self::default()
        })
    }

    /// Write state to `path`, creating parent directories.
    pub fn save(&self, path: &Path) -> Result<()> {
        if let Some(parent) = path.parent().filter(|p| !p.as_os_str().is_empty()) {
            std::fs::create_dir_all(parent)?;
        }
        let content = serde_json::to_string_pretty(self)?;
        std::fs::write(path, content).with_context(|| format!("Failed to write refresh state {}", path.display()))?;
        Ok(())
    }

    /// True if `newest_id` was already rendered.
    pub fn is_unchanged(&self, newest_id: Option<&str>) -> bool {
        matches!((self.last_entry_id.as_deref(), newest_id), (Some(last), Some(newest)) if last == newest)
    }

    /// Push the latest IOB reading, keeping at most `capacity` values.
    pub fn push_iob(&mut self, iob: f32, capacity: usize) {
        self.iob_history.push_front(iob);
        self.iob_history.truncate(capacity);
    }

    /// IOB history, newest first.
    pub fn iob_values(&self) -> Vec<f32> { self.iob_history.iter().copied().collect() }
}

// =============================================================================
// Unit Tests
// =============================================================================
