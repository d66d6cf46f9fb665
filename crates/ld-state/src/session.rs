//! Session files
//!
//! A session is the full persisted state of one live event: the engine
//! state plus the text the operator typed to configure it.

use std::fs;
use std::path::{Path, PathBuf};

use chrono::{DateTime, Utc};
use ld_draw::{DrawEngine, DrawError, EngineState, RevealTiming};
use serde::{Deserialize, Serialize};
use thiserror::Error;

use crate::settings::DrawSettings;

/// Session error type
#[derive(Error, Debug)]
pub enum SessionError {
    #[error("I/O error: {0}")]
    Io(#[from] std::io::Error),

    #[error("JSON error: {0}")]
    Json(#[from] serde_json::Error),

    #[error("Invalid session: {0}")]
    Invalid(String),

    #[error("Session state rejected: {0}")]
    Engine(#[from] DrawError),
}

/// Result type alias
pub type SessionResult<T> = Result<T, SessionError>;

/// Persisted session
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct SessionFile {
    pub saved_at: DateTime<Utc>,
    pub title: String,
    /// Spec or import source the pool was built from
    pub input_spec: String,
    pub engine: EngineState,
}

impl Default for SessionFile {
    fn default() -> Self {
        Self::from_settings(&DrawSettings::default()).unwrap_or_else(|_| Self {
            saved_at: Utc::now(),
            title: String::new(),
            input_spec: String::new(),
            engine: EngineState::default(),
        })
    }
}

impl SessionFile {
    /// Capture the current engine state
    pub fn capture(engine: &DrawEngine, title: impl Into<String>, input_spec: impl Into<String>) -> Self {
        Self {
            saved_at: Utc::now(),
            title: title.into(),
            input_spec: input_spec.into(),
            engine: engine.export_state(),
        }
    }

    /// Fresh session configured from settings
    pub fn from_settings(settings: &DrawSettings) -> SessionResult<Self> {
        let engine = settings.build_engine()?;
        Ok(Self::capture(&engine, settings.title.clone(), settings.entries.clone()))
    }

    /// Load and validate a session
    pub fn load<P: AsRef<Path>>(path: P) -> SessionResult<Self> {
        let content = fs::read_to_string(path)?;
        if content.trim().is_empty() {
            return Err(SessionError::Invalid("file is empty".into()));
        }
        let session: Self = serde_json::from_str(&content)?;
        DrawEngine::from_state(session.engine.clone())?;
        Ok(session)
    }

    /// Load an existing session, or start one from `settings` if there is none
    ///
    /// A session file that exists but cannot be loaded is an error, so that
    /// the caller never saves a fresh session over it.
    pub fn load_or_new<P: AsRef<Path>>(path: P, settings: &DrawSettings) -> SessionResult<Self> {
        let path = path.as_ref();
        if path.exists() {
            Self::load(path)
        } else {
            Self::from_settings(settings)
        }
    }

    /// Load a session for reading, falling back to one built from `settings`
    pub fn load_or_default<P: AsRef<Path>>(path: P, settings: &DrawSettings) -> Self {
        let path = path.as_ref();
        let fallback = || Self::from_settings(settings).unwrap_or_default();
        if !path.exists() {
            return fallback();
        }
        match Self::load(path) {
            Ok(session) => session,
            Err(e) => {
                log::warn!("ignoring unreadable session {}: {e}", path.display());
                fallback()
            }
        }
    }

    /// Save session as pretty JSON, stamping `saved_at`
    pub fn save_to<P: AsRef<Path>>(&mut self, path: P) -> SessionResult<()> {
        let path = path.as_ref();
        if let Some(parent) = path.parent() {
            fs::create_dir_all(parent)?;
        }

        self.saved_at = Utc::now();
        let json = serde_json::to_string_pretty(self)?;
        fs::write(path, json)?;
        log::debug!("session saved to {}", path.display());
        Ok(())
    }

    /// Get default session file path
    pub fn default_path() -> PathBuf {
        crate::data_dir().join("session.json")
    }

    /// Rebuild a live engine from this session
    pub fn to_engine(&self, timing: RevealTiming) -> SessionResult<DrawEngine> {
        Ok(DrawEngine::from_state(self.engine.clone())?.with_timing(timing))
    }

    /// Replace the stored state with the engine's current state
    pub fn update(&mut self, engine: &DrawEngine) {
        self.engine = engine.export_state();
    }
}
