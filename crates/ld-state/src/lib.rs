//! ld-state: Session persistence, autosave and settings
//!
//! Everything here consumes the engine's read model and persisted state;
//! nothing in the draw logic depends on it.

mod autosave;
mod session;
mod settings;

pub use autosave::*;
pub use session::*;
pub use settings::*;

use std::path::PathBuf;

/// Application data directory
pub(crate) fn data_dir() -> PathBuf {
    dirs::data_local_dir()
        .unwrap_or_else(|| PathBuf::from("."))
        .join("lucky-draw")
}

/// Application config directory
pub(crate) fn config_dir() -> PathBuf {
    dirs::config_dir()
        .unwrap_or_else(|| PathBuf::from("."))
        .join("lucky-draw")
}
