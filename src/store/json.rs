//! JSON document store
//!
//! Keeps markers and display settings in a single JSON object on disk.
//! Every write rewrites the document through a temp file in the same
//! directory and renames it into place, so a crash never leaves a
//! half-written store behind.

use super::{MarkerStore, KEY_COLOR, KEY_MARKERS, KEY_MARKER_SIZE, KEY_OPACITY};
use crate::error::StoreError;
use crate::marker::{DisplaySettings, Marker};
use serde_json::{Map, Value};
use std::io::Write;
use std::path::{Path, PathBuf};

type Document = Map<String, Value>;

/// File-backed marker store
pub struct JsonFileStore {
    path: PathBuf,
}

impl JsonFileStore {
    /// Create a store backed by the given file (created on first write)
    pub fn new(path: impl Into<PathBuf>) -> Self {
        Self { path: path.into() }
    }

    /// Path of the backing file
    pub fn path(&self) -> &Path {
        &self.path
    }

    fn read_document(&self) -> Result<Document, StoreError> {
        let contents = match std::fs::read_to_string(&self.path) {
            Ok(contents) => contents,
            Err(e) if e.kind() == std::io::ErrorKind::NotFound => return Ok(Document::new()),
            Err(e) => return Err(StoreError::ReadFailed(format!("{:?}: {}", self.path, e))),
        };

        if contents.trim().is_empty() {
            return Ok(Document::new());
        }

        match serde_json::from_str::<Value>(&contents)? {
            Value::Object(doc) => Ok(doc),
            other => Err(StoreError::Corrupt(format!(
                "expected a JSON object, found {}",
                json_kind(&other)
            ))),
        }
    }

    fn write_document(&self, doc: &Document) -> Result<(), StoreError> {
        let dir = match self.path.parent() {
            Some(parent) if !parent.as_os_str().is_empty() => parent.to_path_buf(),
            _ => PathBuf::from("."),
        };

        std::fs::create_dir_all(&dir)
            .map_err(|e| StoreError::WriteFailed(format!("create {:?}: {}", dir, e)))?;

        let mut tmp = tempfile::NamedTempFile::new_in(&dir)
            .map_err(|e| StoreError::WriteFailed(format!("temp file in {:?}: {}", dir, e)))?;

        serde_json::to_writer_pretty(&mut tmp, doc)
            .map_err(|e| StoreError::WriteFailed(e.to_string()))?;
        tmp.write_all(b"\n")
            .map_err(|e| StoreError::WriteFailed(e.to_string()))?;

        tmp.persist(&self.path)
            .map_err(|e| StoreError::WriteFailed(format!("{:?}: {}", self.path, e.error)))?;

        tracing::trace!("Store written: {:?}", self.path);
        Ok(())
    }

    /// Read-modify-write the document, replacing the given keys
    fn update(&self, entries: Vec<(&str, Value)>) -> Result<(), StoreError> {
        let mut doc = match self.read_document() {
            Ok(doc) => doc,
            Err(StoreError::Corrupt(e)) => {
                tracing::warn!("Replacing corrupt store {:?}: {}", self.path, e);
                Document::new()
            }
            Err(e) => return Err(StoreError::WriteFailed(e.to_string())),
        };

        for (key, value) in entries {
            doc.insert(key.to_string(), value);
        }

        self.write_document(&doc)
    }
}

impl MarkerStore for JsonFileStore {
    fn load_markers(&self) -> Result<Vec<Marker>, StoreError> {
        let doc = self.read_document()?;
        let entries = match doc.get(KEY_MARKERS) {
            Some(Value::Array(entries)) => entries,
            Some(other) => {
                return Err(StoreError::Corrupt(format!(
                    "\"{}\" should be an array, found {}",
                    KEY_MARKERS,
                    json_kind(other)
                )))
            }
            None => return Ok(Vec::new()),
        };

        let markers: Vec<Marker> = entries.iter().filter_map(marker_from_value).collect();
        if markers.len() < entries.len() {
            tracing::warn!(
                "Dropped {} unreadable marker entries from {:?}",
                entries.len() - markers.len(),
                self.path
            );
        }
        Ok(markers)
    }

    fn save_markers(&self, markers: &[Marker]) -> Result<(), StoreError> {
        // JSON has no NaN or infinity; serde_json would write null
        if let Some(bad) = markers.iter().find(|m| !m.x.is_finite() || !m.y.is_finite()) {
            return Err(StoreError::WriteFailed(format!(
                "marker {} has a non-finite position",
                bad.id
            )));
        }

        let value =
            serde_json::to_value(markers).map_err(|e| StoreError::WriteFailed(e.to_string()))?;
        self.update(vec![(KEY_MARKERS, value)])
    }

    fn load_settings(&self) -> Result<DisplaySettings, StoreError> {
        let doc = self.read_document()?;
        let defaults = DisplaySettings::default();

        // Each key is independent; a missing or mistyped key keeps its default
        let marker_size_units = doc
            .get(KEY_MARKER_SIZE)
            .and_then(Value::as_u64)
            .map(|v| v.min(u32::MAX as u64) as u32)
            .unwrap_or(defaults.marker_size_units);

        let opacity = doc
            .get(KEY_OPACITY)
            .and_then(Value::as_f64)
            .map(|v| v as f32)
            .unwrap_or(defaults.opacity);

        // Colors written as signed 32-bit ARGB are reinterpreted bit-for-bit
        let color_value = doc
            .get(KEY_COLOR)
            .and_then(|v| {
                v.as_u64()
                    .and_then(|c| u32::try_from(c).ok())
                    .or_else(|| v.as_i64().and_then(|c| i32::try_from(c).ok()).map(|c| c as u32))
            })
            .unwrap_or(defaults.color_value);

        Ok(DisplaySettings {
            marker_size_units,
            opacity,
            color_value,
        }
        .clamped())
    }

    fn save_settings(&self, settings: &DisplaySettings) -> Result<(), StoreError> {
        let settings = settings.clamped();
        self.update(vec![
            (KEY_MARKER_SIZE, Value::from(settings.marker_size_units)),
            (KEY_OPACITY, Value::from(settings.opacity as f64)),
            (KEY_COLOR, Value::from(settings.color_value)),
        ])
    }

    fn describe(&self) -> String {
        format!("json file {:?}", self.path)
    }
}

/// Read one stored marker. Ids are only a hint (the registry renumbers on
/// load), so an id that is missing, negative or fractional reads as 0.
/// Entries without a finite position are unreadable.
fn marker_from_value(value: &Value) -> Option<Marker> {
    let x = value.get("x")?.as_f64()? as f32;
    let y = value.get("y")?.as_f64()? as f32;
    if !x.is_finite() || !y.is_finite() {
        return None;
    }

    let id = value
        .get("id")
        .and_then(Value::as_u64)
        .and_then(|id| u32::try_from(id).ok())
        .unwrap_or(0);

    Some(Marker::new(id, x, y))
}

fn json_kind(value: &Value) -> &'static str {
    match value {
        Value::Null => "null",
        Value::Bool(_) => "a boolean",
        Value::Number(_) => "a number",
        Value::String(_) => "a string",
        Value::Array(_) => "an array",
        Value::Object(_) => "an object",
    }
}
