//! Error types for voxtap
//!
//! Uses thiserror for ergonomic error definitions. Each concern gets its
//! own enum; `VoxtapError` aggregates them for the daemon and CLI.

use thiserror::Error;

/// Top-level error type for the voxtap application
#[derive(Error, Debug)]
pub enum VoxtapError {
    #[error("Configuration error: {0}")]
    Config(String),

    #[error("Marker error: {0}")]
    Marker(#[from] MarkerError),

    #[error("Gesture error: {0}")]
    Gesture(#[from] GestureError),

    #[error("Storage error: {0}")]
    Store(#[from] StoreError),

    #[error("Session is no longer running")]
    SessionClosed,

    #[error("IO error: {0}")]
    Io(#[from] std::io::Error),
}

/// Errors raised by the marker registry
#[derive(Error, Debug, Clone, PartialEq, Eq)]
pub enum MarkerError {
    #[error("Max {0} markers reached. Remove one before adding another.")]
    CapacityExceeded(usize),

    #[error("Marker {0} not found")]
    NotFound(u32),

    #[error("No markers defined. Tap the overlay to add markers.")]
    NoMarkers,

    /// Coordinates must be finite; NaN or infinity cannot be stored
    #[error("Invalid marker position ({0})")]
    InvalidPoint(String),
}

/// Errors related to gesture execution
#[derive(Error, Debug, Clone, PartialEq, Eq)]
pub enum GestureError {
    #[error("Gesture execution is not available. Check the configured gesture backend.")]
    ExecutionUnavailable,

    #[error("Tap injection failed: {0}")]
    InjectionFailed(String),

    #[error("ydotool not found in PATH. Install via your package manager.")]
    YdotoolNotFound,

    #[error("ydotool daemon not running.\n  Start with: systemctl --user start ydotool\n  Enable at boot: systemctl --user enable ydotool")]
    YdotoolNotRunning,

    #[error("Gesture dispatcher has been shut down")]
    DispatcherStopped,
}

/// Errors raised by marker/settings persistence
#[derive(Error, Debug)]
pub enum StoreError {
    /// Durable write failed; in-memory state stays authoritative
    #[error("Persistence write failed: {0}")]
    WriteFailed(String),

    #[error("Failed to read store: {0}")]
    ReadFailed(String),

    #[error("Store document is corrupt: {0}")]
    Corrupt(String),
}

/// Errors reported by an utterance source
#[derive(Error, Debug, Clone, PartialEq, Eq)]
pub enum RecognitionError {
    #[error("Speech recognition unavailable: {0}")]
    Unavailable(String),

    #[error("Speech recognition failed: {0}")]
    Failed(String),

    #[error("Utterance source closed")]
    Closed,
}

/// Typed failure of a spoken command
#[derive(Error, Debug, Clone, Copy, PartialEq, Eq)]
pub enum CommandError {
    #[error("Marker {0} not found")]
    MarkerNotFound(u32),

    #[error("No markers to click")]
    NoMarkers,

    #[error("Gesture execution unavailable")]
    ExecutionUnavailable,
}

/// Result type alias using VoxtapError
pub type Result<T> = std::result::Result<T, VoxtapError>;

impl From<serde_json::Error> for StoreError {
    fn from(e: serde_json::Error) -> Self {
        StoreError::Corrupt(e.to_string())
    }
}
