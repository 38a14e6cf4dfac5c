//! Persistence adapter for markers and display settings
//!
//! A store is a small key-value document: the marker list under one key,
//! each display setting under its own key. Stores hold no logic; the
//! registry decides what to write and when.

pub mod json;
pub mod memory;

use crate::config::StorageConfig;
use crate::error::StoreError;
use crate::marker::{DisplaySettings, Marker};

pub use json::JsonFileStore;
pub use memory::MemoryStore;

/// Key holding the marker array
pub const KEY_MARKERS: &str = "markers";
/// Key holding the marker diameter
pub const KEY_MARKER_SIZE: &str = "markerSizeUnits";
/// Key holding the marker opacity
pub const KEY_OPACITY: &str = "opacity";
/// Key holding the ARGB marker color
pub const KEY_COLOR: &str = "colorValue";

/// Trait for marker persistence backends
pub trait MarkerStore: Send + Sync {
    /// Load the stored marker list (ids may be stale or non-sequential)
    fn load_markers(&self) -> Result<Vec<Marker>, StoreError>;

    /// Replace the stored marker list
    fn save_markers(&self, markers: &[Marker]) -> Result<(), StoreError>;

    /// Load display settings, falling back to defaults for missing keys
    fn load_settings(&self) -> Result<DisplaySettings, StoreError>;

    /// Persist display settings
    fn save_settings(&self, settings: &DisplaySettings) -> Result<(), StoreError>;

    /// Human-readable description for logging
    fn describe(&self) -> String;
}

/// Factory function that builds the configured store
pub fn create_store(config: &StorageConfig) -> Box<dyn MarkerStore> {
    match config.resolve_path() {
        Some(path) => {
            tracing::debug!("Using marker store at {:?}", path);
            Box::new(JsonFileStore::new(path))
        }
        None => {
            tracing::info!("Using in-memory marker store, markers will not survive restart");
            Box::new(MemoryStore::new())
        }
    }
}
