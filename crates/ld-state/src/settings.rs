//! Draw Settings
//!
//! Defaults used when a fresh session is created:
//! - Initial entry spec and mode
//! - Prize tiers and winners per prize
//! - Reveal timing profile
//! - Optional RNG seed for rehearsals

use std::fs;
use std::path::{Path, PathBuf};

use ld_draw::{DrawEngine, DrawMode, DrawResult, RevealTiming, TimingProfile};
use serde::{Deserialize, Serialize};

/// Settings file contents
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(default)]
pub struct DrawSettings {
    /// Event title shown by front ends
    pub title: String,
    /// Entry spec ("1-50", "7, 12, 99", "Alice, Bob")
    pub entries: String,
    /// How entries are interpreted
    pub mode: DrawMode,
    /// Prize tiers in draw order
    pub prizes: Vec<String>,
    /// Winners selected per prize tier
    pub winners_per_prize: usize,
    /// Reveal timing profile
    pub timing: TimingProfile,
    /// Timing values used when `timing` is `custom`
    pub custom_timing: Option<RevealTiming>,
    /// Fixed RNG seed (rehearsals only)
    pub seed: Option<u64>,
}

impl Default for DrawSettings {
    fn default() -> Self {
        Self {
            title: "Lucky Draw".to_string(),
            entries: "1-50".to_string(),
            mode: DrawMode::Numeric,
            prizes: vec![
                "3rd Prize".to_string(),
                "2nd Prize".to_string(),
                "1st Prize".to_string(),
            ],
            winners_per_prize: 1,
            timing: TimingProfile::Normal,
            custom_timing: None,
            seed: None,
        }
    }
}

impl DrawSettings {
    /// Load settings from standard location
    pub fn load() -> Self {
        Self::load_from(Self::default_path())
    }

    /// Load settings from specified path, falling back to defaults
    pub fn load_from<P: AsRef<Path>>(path: P) -> Self {
        let path = path.as_ref();
        match fs::read_to_string(path) {
            Ok(content) => serde_json::from_str(&content).unwrap_or_else(|e| {
                log::warn!("ignoring malformed settings {}: {e}", path.display());
                Self::default()
            }),
            Err(_) => Self::default(),
        }
    }

    /// Save settings to specified path
    pub fn save_to<P: AsRef<Path>>(&self, path: P) -> std::io::Result<()> {
        if let Some(parent) = path.as_ref().parent() {
            fs::create_dir_all(parent)?;
        }

        let json = serde_json::to_string_pretty(self).map_err(std::io::Error::other)?;
        fs::write(path, json)
    }

    /// Get default settings file path
    pub fn default_path() -> PathBuf {
        crate::config_dir().join("settings.json")
    }

    pub fn reveal_timing(&self) -> RevealTiming {
        match (self.timing, &self.custom_timing) {
            (TimingProfile::Custom, Some(custom)) => RevealTiming {
                profile: TimingProfile::Custom,
                ..custom.clone()
            },
            (TimingProfile::Custom, None) => {
                log::warn!("custom timing selected without custom_timing values; using normal");
                RevealTiming::normal()
            }
            (profile, _) => RevealTiming::from_profile(profile),
        }
    }

    /// Build an idle engine configured from these settings
    pub fn build_engine(&self) -> DrawResult<DrawEngine> {
        let mut engine = DrawEngine::new().with_timing(self.reveal_timing());
        if let Some(seed) = self.seed {
            engine.seed(seed);
        }
        engine.configure_entries(&self.entries, self.mode)?;
        engine.configure_prizes(&self.prizes)?;
        engine.set_winners_per_prize(self.winners_per_prize)?;
        Ok(engine)
    }
}
