//! In-memory marker store
//!
//! Used for ephemeral sessions (`storage.path = "memory"`) and tests.
//! Clones share the same backing state.

use super::MarkerStore;
use crate::error::StoreError;
use crate::marker::{DisplaySettings, Marker};
use std::sync::atomic::{AtomicBool, Ordering};
use std::sync::{Arc, Mutex, MutexGuard};

#[derive(Debug, Default)]
struct Inner {
    markers: Vec<Marker>,
    settings: DisplaySettings,
    writes: usize,
}

/// Volatile store shared between clones
#[derive(Debug, Clone, Default)]
pub struct MemoryStore {
    inner: Arc<Mutex<Inner>>,
    fail_writes: Arc<AtomicBool>,
}

impl MemoryStore {
    pub fn new() -> Self {
        Self::default()
    }

    /// Create a store pre-populated with markers (ids kept verbatim)
    pub fn with_markers(markers: Vec<Marker>) -> Self {
        let store = Self::new();
        store.lock().markers = markers;
        store
    }

    /// Make every subsequent write fail with `WriteFailed`
    pub fn set_fail_writes(&self, fail: bool) {
        self.fail_writes.store(fail, Ordering::SeqCst);
    }

    /// Markers as last written
    pub fn saved_markers(&self) -> Vec<Marker> {
        self.lock().markers.clone()
    }

    /// Number of successful writes
    pub fn write_count(&self) -> usize {
        self.lock().writes
    }

    fn lock(&self) -> MutexGuard<'_, Inner> {
        self.inner.lock().unwrap_or_else(|poisoned| poisoned.into_inner())
    }

    fn check_writable(&self) -> Result<(), StoreError> {
        if self.fail_writes.load(Ordering::SeqCst) {
            Err(StoreError::WriteFailed("memory store is read-only".to_string()))
        } else {
            Ok(())
        }
    }
}

impl MarkerStore for MemoryStore {
    fn load_markers(&self) -> Result<Vec<Marker>, StoreError> {
        Ok(self.lock().markers.clone())
    }

    fn save_markers(&self, markers: &[Marker]) -> Result<(), StoreError> {
        self.check_writable()?;
        let mut inner = self.lock();
        inner.markers = markers.to_vec();
        inner.writes += 1;
        Ok(())
    }

    fn load_settings(&self) -> Result<DisplaySettings, StoreError> {
        Ok(self.lock().settings)
    }

    fn save_settings(&self, settings: &DisplaySettings) -> Result<(), StoreError> {
        self.check_writable()?;
        let mut inner = self.lock();
        inner.settings = settings.clamped();
        inner.writes += 1;
        Ok(())
    }

    fn describe(&self) -> String {
        "memory".to_string()
    }
}
