//! Level unlock/completion persistence
//!
//! A flat keyed record, one entry per level index. Level 1 starts unlocked,
//! everything else locked and incomplete. Load failures fall back to defaults
//! so a corrupt save never blocks play.

use std::path::PathBuf;

use serde::{Deserialize, Serialize};
use thiserror::Error;

/// Persistence failures. Never fatal: callers substitute defaults.
#[derive(Debug, Error)]
pub enum ProgressError {
    #[error("progress io error: {0}")]
    Io(#[from] std::io::Error),
    #[error("progress format error: {0}")]
    Format(#[from] serde_json::Error),
}

/// Per-level progress record
#[derive(Debug, Clone, Copy, Serialize, Deserialize, Default)]
pub struct LevelRecord {
    pub unlocked: bool,
    pub completed: bool,
    pub best_score: u64,
}

/// Progress across all levels
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct Progress {
    pub levels: Vec<LevelRecord>,
}

impl Progress {
    /// Fresh progress for `level_count` levels: only level 0 unlocked
    pub fn new(level_count: usize) -> Self {
        let mut levels = vec![LevelRecord::default(); level_count];
        if let Some(first) = levels.first_mut() {
            first.unlocked = true;
        }
        Self { levels }
    }

    pub fn is_unlocked(&self, index: usize) -> bool {
        self.levels.get(index).map(|r| r.unlocked).unwrap_or(false)
    }

    /// Record a completion: marks the level done, raises the best score if
    /// improved, and unlocks the following level.
    pub fn record_completion(&mut self, index: usize, score: u64) {
        if let Some(record) = self.levels.get_mut(index) {
            record.completed = true;
            if score > record.best_score {
                record.best_score = score;
            }
        }
        if let Some(next) = self.levels.get_mut(index + 1) {
            next.unlocked = true;
        }
    }

    /// Grow the record list if a loaded save predates newly added levels
    pub fn ensure_len(&mut self, level_count: usize) {
        while self.levels.len() < level_count {
            self.levels.push(LevelRecord::default());
        }
        if let Some(first) = self.levels.first_mut() {
            first.unlocked = true;
        }
    }
}

/// Load/save boundary for progress records
pub trait ProgressStore {
    fn load(&self) -> Result<Progress, ProgressError>;
    fn save(&mut self, progress: &Progress) -> Result<(), ProgressError>;
}

/// JSON file-backed store for native builds
#[derive(Debug, Clone)]
pub struct JsonFileStore {
    path: PathBuf,
}

impl JsonFileStore {
    pub fn new(path: impl Into<PathBuf>) -> Self {
        Self { path: path.into() }
    }
}

impl ProgressStore for JsonFileStore {
    fn load(&self) -> Result<Progress, ProgressError> {
        let json = std::fs::read_to_string(&self.path)?;
        let progress = serde_json::from_str(&json)?;
        log::info!("Loaded progress from {:?}", self.path);
        Ok(progress)
    }

    fn save(&mut self, progress: &Progress) -> Result<(), ProgressError> {
        let json = serde_json::to_string_pretty(progress)?;
        std::fs::write(&self.path, json)?;
        log::info!("Progress saved to {:?}", self.path);
        Ok(())
    }
}

/// In-memory store for tests and demo runs
#[derive(Debug, Default)]
pub struct MemoryStore {
    saved: Option<Progress>,
}

impl MemoryStore {
    pub fn saved(&self) -> Option<&Progress> {
        self.saved.as_ref()
    }
}

impl ProgressStore for MemoryStore {
    fn load(&self) -> Result<Progress, ProgressError> {
        match &self.saved {
            Some(p) => Ok(p.clone()),
            None => Err(ProgressError::Io(std::io::Error::new(
                std::io::ErrorKind::NotFound,
                "no saved progress",
            ))),
        }
    }

    fn save(&mut self, progress: &Progress) -> Result<(), ProgressError> {
        self.saved = Some(progress.clone());
        Ok(())
    }
}

/// Load progress through a store, substituting fresh defaults on failure
pub fn load_or_default(store: &dyn ProgressStore, level_count: usize) -> Progress {
    match store.load() {
        Ok(mut progress) => {
            progress.ensure_len(level_count);
            progress
        }
        Err(err) => {
            log::warn!("progress load failed ({err}), starting fresh");
            Progress::new(level_count)
        }
    }
}
