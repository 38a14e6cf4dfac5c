//! Voxtap: voice-driven tap markers for touchscreens
//!
//! This library provides the core functionality for:
//! - Keeping a small, numbered, persisted set of screen markers
//! - Tracking how overlay touches are interpreted (add or remove mode)
//! - Scheduling tap and double-tap sequences with fixed timing
//! - Mapping spoken commands ("click 2", "double click") onto all of the above
//!
//! # Architecture
//!
//! ```text
//!                     ┌─────────────────────────────────────┐
//!                     │               Daemon                │
//!                     └─────────────────────────────────────┘
//!                          │                          │
//!                          ▼                          ▼
//!                 ┌─────────────────┐        ┌─────────────────┐
//!                 │    Listener     │        │  Overlay input  │
//!                 │ (stdin / ASR)   │        │ (touch, drag)   │
//!                 └─────────────────┘        └─────────────────┘
//!                          │ utterance                │
//!                          ▼                          ▼
//!          ┌─────────────────────────────────────────────────────────┐
//!          │                   Session (single task)                 │
//!          │   Interpreter ──▶ Registry ──▶ Store                    │
//!          │        │            Mode                                │
//!          │        ▼                                                │
//!          │   Dispatcher ──▶ one tap at a time                      │
//!          └─────────────────────────────────────────────────────────┘
//!                                     │
//!                                     ▼
//!                            ┌──────────────────┐
//!                            │ Gesture executor │
//!                            │ ydotool/dry_run  │
//!                            └──────────────────┘
//! ```

pub mod cli;
pub mod config;
pub mod daemon;
pub mod error;
pub mod gesture;
pub mod logging;
pub mod marker;
pub mod mode;
pub mod notification;
pub mod overlay;
pub mod registry;
pub mod session;
pub mod store;
pub mod voice;

pub use cli::{Cli, Commands, MarkersAction};
pub use config::Config;
pub use daemon::Daemon;
pub use error::{CommandError, GestureError, MarkerError, Result, StoreError, VoxtapError};
pub use marker::{DisplaySettings, Marker, MAX_MARKERS};
pub use registry::MarkerRegistry;
pub use session::{Session, SessionHandle};
