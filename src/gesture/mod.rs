//! Gesture execution
//!
//! The host supplies the ability to press the screen at a point for a
//! given duration. Everything above that (which points, in what order,
//! with what spacing) lives in the dispatcher.
//!
//! Backends:
//! 1. ydotool - moves the pointer and presses the left button via uinput
//! 2. dry_run - logs taps without touching the screen

pub mod dispatcher;
pub mod dry_run;
pub mod ydotool;

#[cfg(test)]
pub(crate) mod testing;

use crate::config::{GestureBackend, GestureConfig};
use crate::error::GestureError;

pub use dispatcher::{
    Dispatched, DispatchReport, Gesture, GestureDispatcher, GestureKind, ScheduledTap, TapOutcome,
    Timing,
};

/// How the host finished a single tap
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum GestureOutcome {
    Completed,
    Cancelled,
}

/// Trait for tap execution capabilities
#[async_trait::async_trait]
pub trait GestureExecutor: Send + Sync {
    /// Check if taps can be executed right now
    async fn is_available(&self) -> bool;

    /// Press at (x, y) for `duration_ms`, returning once the press is released
    async fn execute(&self, x: f32, y: f32, duration_ms: u64)
        -> Result<GestureOutcome, GestureError>;

    /// Human-readable name for logging
    fn name(&self) -> &'static str;
}

/// Factory function that returns the configured executor
pub fn create_executor(config: &GestureConfig) -> Box<dyn GestureExecutor> {
    match config.backend {
        GestureBackend::Ydotool => Box::new(ydotool::YdotoolExecutor::new()),
        GestureBackend::DryRun => Box::new(dry_run::DryRunExecutor::new()),
    }
}
