//! Autosave System
//!
//! Writes the session whenever the engine has changed since the last save:
//! - Revision-based change detection
//! - Save counter and last-save timestamp
//! - Optional minimum interval between saves

use std::path::{Path, PathBuf};

use chrono::{DateTime, Duration, Utc};
use ld_draw::DrawEngine;
use serde::{Deserialize, Serialize};

use crate::session::{SessionFile, SessionResult};

// ============ Autosave Config ============

/// Autosave configuration
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
#[serde(default)]
pub struct AutosaveConfig {
    /// Enable autosave
    pub enabled: bool,
    /// Minimum time between saves (milliseconds)
    pub min_interval_ms: u64,
}

impl Default for AutosaveConfig {
    fn default() -> Self {
        Self {
            enabled: true,
            min_interval_ms: 0,
        }
    }
}

// ============ Autosaver ============

/// Saves a session when the engine revision moves
#[derive(Debug)]
pub struct Autosaver {
    config: AutosaveConfig,
    path: PathBuf,
    saved_revision: Option<u64>,
    save_count: u64,
    last_saved_at: Option<DateTime<Utc>>,
}

impl Autosaver {
    pub fn new(path: impl Into<PathBuf>, config: AutosaveConfig) -> Self {
        Self {
            config,
            path: path.into(),
            saved_revision: None,
            save_count: 0,
            last_saved_at: None,
        }
    }

    pub fn path(&self) -> &Path {
        &self.path
    }

    /// Treat `revision` as already on disk
    pub fn mark_saved(&mut self, revision: u64) {
        self.saved_revision = Some(revision);
    }

    /// Check if the engine has unsaved changes
    pub fn has_changes(&self, engine: &DrawEngine) -> bool {
        self.saved_revision != Some(engine.revision())
    }

    /// Check if autosave should happen now
    pub fn should_save(&self, engine: &DrawEngine) -> bool {
        if !self.config.enabled || engine.is_busy() || !self.has_changes(engine) {
            return false;
        }
        match self.last_saved_at {
            Some(at) => Utc::now() - at >= Duration::milliseconds(self.config.min_interval_ms as i64),
            None => true,
        }
    }

    /// Save if needed; returns whether a save happened
    pub fn maybe_save(&mut self, engine: &DrawEngine, session: &mut SessionFile) -> SessionResult<bool> {
        if !self.should_save(engine) {
            return Ok(false);
        }
        self.save(engine, session)?;
        Ok(true)
    }

    /// Save unconditionally
    pub fn save(&mut self, engine: &DrawEngine, session: &mut SessionFile) -> SessionResult<()> {
        session.update(engine);
        session.save_to(&self.path)?;
        self.saved_revision = Some(engine.revision());
        self.save_count += 1;
        self.last_saved_at = Some(session.saved_at);
        log::debug!("autosave #{} at revision {}", self.save_count, engine.revision());
        Ok(())
    }

    pub fn save_count(&self) -> u64 {
        self.save_count
    }

    pub fn last_saved_at(&self) -> Option<DateTime<Utc>> {
        self.last_saved_at
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use ld_draw::{DrawMode, ManualClock, RevealTiming, run_until_idle};
    use tempfile::tempdir;

    fn engine() -> DrawEngine {
        let mut engine = DrawEngine::new()
            .with_seed(3)
            .with_timing(RevealTiming::instant());
        engine.configure_entries("1-30", DrawMode::Numeric).unwrap();
        engine
    }

    #[test]
    fn test_saves_only_on_new_revision() {
        let dir = tempdir().unwrap();
        let mut engine = engine();
        let mut session = SessionFile::capture(&engine, "Gala", "1-30");
        let mut autosaver = Autosaver::new(dir.path().join("auto.json"), AutosaveConfig::default());

        assert!(autosaver.maybe_save(&engine, &mut session).unwrap());
        assert!(!autosaver.maybe_save(&engine, &mut session).unwrap());
        assert_eq!(autosaver.save_count(), 1);

        engine.draw_next(0).unwrap();
        run_until_idle(&mut engine, &ManualClock::new(0));
        assert!(autosaver.has_changes(&engine));
        assert!(autosaver.maybe_save(&engine, &mut session).unwrap());
        assert_eq!(autosaver.save_count(), 2);
        assert!(autosaver.last_saved_at().is_some());

        let on_disk = SessionFile::load(autosaver.path()).unwrap();
        assert_eq!(on_disk.engine, engine.export_state());
    }

    #[test]
    fn test_skips_while_drawing() {
        let dir = tempdir().unwrap();
        let mut engine = engine().with_timing(RevealTiming::normal());
        let mut session = SessionFile::capture(&engine, "Gala", "1-30");
        let mut autosaver = Autosaver::new(dir.path().join("auto.json"), AutosaveConfig::default());

        engine.draw_next(0).unwrap();
        assert!(engine.is_busy());
        assert!(!autosaver.maybe_save(&engine, &mut session).unwrap());
        assert!(!autosaver.path().exists());
    }

    #[test]
    fn test_disabled_and_mark_saved() {
        let dir = tempdir().unwrap();
        let engine = engine();
        let mut session = SessionFile::capture(&engine, "Gala", "1-30");

        let config = AutosaveConfig {
            enabled: false,
            ..Default::default()
        };
        let mut disabled = Autosaver::new(dir.path().join("a.json"), config);
        assert!(!disabled.maybe_save(&engine, &mut session).unwrap());

        let mut autosaver = Autosaver::new(dir.path().join("b.json"), AutosaveConfig::default());
        autosaver.mark_saved(engine.revision());
        assert!(!autosaver.has_changes(&engine));
        assert!(!autosaver.maybe_save(&engine, &mut session).unwrap());
    }
}
