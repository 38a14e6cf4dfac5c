// Command-line interface definitions for voxtap
//
// This module is separate so it can be used by both the binary (main.rs)
// and build.rs for generating man pages.

use clap::{Parser, Subcommand};

#[derive(Parser)]
#[command(name = "voxtap")]
#[command(author, version, about = "Voice-driven tap markers for touchscreens")]
#[command(long_about = "
Voxtap replays taps at saved screen points (markers) on spoken command.
Markers are numbered 1..N in order; \"click 2\" always means the second one.

SETUP:
  1. Start ydotool daemon: systemctl --user enable --now ydotool
  2. Add markers: voxtap markers add X Y (or tap the overlay in add mode)
  3. Pipe a speech transcriber into the daemon: my-transcriber | voxtap

COMMANDS (spoken):
  click, click N, double click, double click N, clicker activate,
  deactivate, show/hide overlay, show/hide markers, done, go home
")]
pub struct Cli {
    /// Path to config file
    #[arg(short, long, value_name = "FILE")]
    pub config: Option<std::path::PathBuf>,

    /// Increase verbosity (-v = debug, -vv = trace)
    #[arg(short, long, action = clap::ArgAction::Count)]
    pub verbose: u8,

    /// Quiet mode (errors only)
    #[arg(short, long)]
    pub quiet: bool,

    /// Log taps instead of performing them
    #[arg(long)]
    pub dry_run: bool,

    /// Override marker store ("auto", "memory", or a file path)
    #[arg(long, value_name = "PATH")]
    pub store: Option<String>,

    #[command(subcommand)]
    pub command: Option<Commands>,
}

#[derive(Subcommand)]
pub enum Commands {
    /// Run as daemon, reading utterances from stdin (default if no command specified)
    Daemon,

    /// Inspect or edit saved markers
    Markers {
        #[command(subcommand)]
        action: MarkersAction,
    },

    /// Show or change marker display settings
    Settings {
        /// Marker diameter in density-independent units
        #[arg(long)]
        size: Option<u32>,

        /// Marker opacity (0.0 to 1.0)
        #[arg(long)]
        opacity: Option<f32>,

        /// Marker color as #RRGGBB or #AARRGGBB
        #[arg(long)]
        color: Option<String>,
    },

    /// Tap one marker, or all markers in order
    Tap {
        /// Marker number (omit to tap every marker)
        id: Option<u32>,

        /// Double tap instead of single tap
        #[arg(long)]
        double: bool,
    },

    /// Show which command an utterance maps to, without running it
    Parse {
        /// Utterance text
        #[arg(required = true, num_args = 1..)]
        utterance: Vec<String>,
    },

    /// Show current configuration
    Config {
        /// Write a commented default config file instead of showing the current one
        #[arg(long)]
        init: bool,

        /// Overwrite an existing config file (with --init)
        #[arg(long, requires = "init")]
        force: bool,
    },
}

#[derive(Subcommand)]
pub enum MarkersAction {
    /// List markers in order
    List,

    /// Add a marker at a screen point
    Add { x: f32, y: f32 },

    /// Remove a marker by number
    Remove { id: u32 },

    /// Remove the highest-numbered marker
    RemoveLast,

    /// Remove the marker closest to a screen point
    Nearest { x: f32, y: f32 },

    /// Move a marker to a new screen point
    Move { id: u32, x: f32, y: f32 },

    /// Remove all markers
    Clear,
}
