//! Application state snapshot and its backing stores

use std::path::{Path, PathBuf};

use pv_model::Reading;
use pv_rules::Rule;
use serde::{Deserialize, Serialize};
use tracing::{debug, info};

use crate::error::{AlertError, Result};
use crate::types::Alert;

/// Snapshot schema version
pub const STATE_VERSION: u32 = 1;

/// Everything that survives a restart
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct AppState {
    #[serde(default = "default_version")]
    pub version: u32,
    #[serde(default)]
    pub readings: Vec<Reading>,
    #[serde(default)]
    pub alerts: Vec<Alert>,
    #[serde(default)]
    pub rules: Vec<Rule>,
}

fn default_version() -> u32 {
    STATE_VERSION
}

impl Default for AppState {
    fn default() -> Self {
        Self::new(Vec::new(), Vec::new(), Vec::new())
    }
}

impl AppState {
    pub fn new(readings: Vec<Reading>, alerts: Vec<Alert>, rules: Vec<Rule>) -> Self {
        Self {
            version: STATE_VERSION,
            readings,
            alerts,
            rules,
        }
    }
}

/// Persistence backend for [`AppState`]
pub trait StateStore {
    /// Load the last snapshot; `None` on first run
    fn load(&self) -> Result<Option<AppState>>;

    /// Replace the stored snapshot
    fn save(&mut self, state: &AppState) -> Result<()>;
}

/// JSON file store; writes go to a sibling temp file and are renamed into place
#[derive(Debug, Clone)]
pub struct JsonFileStore {
    path: PathBuf,
}

impl JsonFileStore {
    pub fn new(path: impl Into<PathBuf>) -> Self {
        Self { path: path.into() }
    }

    pub fn path(&self) -> &Path {
        &self.path
    }

    fn temp_path(&self) -> PathBuf {
        let mut name = self
            .path
            .file_name()
            .map(|n| n.to_os_string())
            .unwrap_or_default();
        name.push(".tmp");
        self.path.with_file_name(name)
    }
}

impl StateStore for JsonFileStore {
    fn load(&self) -> Result<Option<AppState>> {
        if !self.path.exists() {
            debug!("No state snapshot at {}", self.path.display());
            return Ok(None);
        }

        let content = std::fs::read_to_string(&self.path)
            .map_err(|e| AlertError::storage(format!("{}: {}", self.path.display(), e)))?;
        let state: AppState = serde_json::from_str(&content)
            .map_err(|e| AlertError::storage(format!("{}: {}", self.path.display(), e)))?;

        if state.version > STATE_VERSION {
            return Err(AlertError::storage(format!(
                "{}: snapshot version {} is newer than supported {}",
                self.path.display(),
                state.version,
                STATE_VERSION
            )));
        }

        info!(
            "Loaded state from {}: {} readings, {} alerts, {} rules",
            self.path.display(),
            state.readings.len(),
            state.alerts.len(),
            state.rules.len()
        );
        Ok(Some(state))
    }

    fn save(&mut self, state: &AppState) -> Result<()> {
        if let Some(parent) = self.path.parent().filter(|p| !p.as_os_str().is_empty()) {
            std::fs::create_dir_all(parent)?;
        }

        let json = serde_json::to_string_pretty(state)?;
        let tmp = self.temp_path();
        std::fs::write(&tmp, json)
            .map_err(|e| AlertError::storage(format!("{}: {}", tmp.display(), e)))?;
        std::fs::rename(&tmp, &self.path)
            .map_err(|e| AlertError::storage(format!("{}: {}", self.path.display(), e)))?;

        debug!("State saved to {}", self.path.display());
        Ok(())
    }
}

/// In-memory store for tests and one-shot runs
#[derive(Debug, Clone, Default)]
pub struct MemoryStore {
    state: Option<AppState>,
    saves: usize,
}

impl MemoryStore {
    pub fn new() -> Self {
        Self::default()
    }

    pub fn with_state(state: AppState) -> Self {
        Self {
            state: Some(state),
            saves: 0,
        }
    }

    pub fn state(&self) -> Option<&AppState> {
        self.state.as_ref()
    }

    /// Number of snapshots written
    pub fn save_count(&self) -> usize {
        self.saves
    }
}

impl StateStore for MemoryStore {
    fn load(&self) -> Result<Option<AppState>> {
        Ok(self.state.clone())
    }

    fn save(&mut self, state: &AppState) -> Result<()> {
        self.state = Some(state.clone());
        self.saves += 1;
        Ok(())
    }
}
