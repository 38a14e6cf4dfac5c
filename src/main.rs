//! Voxtap - voice-driven tap markers for touchscreens
//!
//! Run with `voxtap` or `voxtap daemon` to start the daemon.
//! Use `voxtap markers` to manage markers and `voxtap tap` to test them.

use clap::Parser;
use std::path::Path;
use std::sync::Arc;
use voxtap::cli::{Cli, Commands, MarkersAction};
use voxtap::config::{self, Config, GestureBackend};
use voxtap::gesture::{self, Gesture, GestureDispatcher, GestureExecutor, Timing};
use voxtap::marker::{parse_color, DisplaySettings};
use voxtap::overlay::HeadlessOverlay;
use voxtap::registry::MarkerRegistry;
use voxtap::session::Session;
use voxtap::{logging, store, voice, Daemon, MarkerError};

#[tokio::main]
async fn main() -> anyhow::Result<()> {
    let cli = Cli::parse();

    // Initialize logging
    let log_level = if cli.quiet {
        "error"
    } else {
        match cli.verbose {
            0 => "info",
            1 => "debug",
            _ => "trace",
        }
    };

    // `config --init` has to work even when the existing file does not parse
    let loaded = config::load_config(cli.config.as_deref());
    let logging_config = loaded
        .as_ref()
        .map(|config| config.logging.clone())
        .unwrap_or_default();
    let _log_guard = logging::init(log_level, &logging_config);

    if let Some(Commands::Config { init: true, force }) = cli.command {
        return init_config(cli.config.as_deref(), force);
    }

    let mut config = loaded?;

    // Apply CLI overrides
    if cli.dry_run {
        config.gesture.backend = GestureBackend::DryRun;
    }
    if let Some(store) = cli.store {
        config.storage.path = store;
    }

    // Run the appropriate command
    match cli.command.unwrap_or(Commands::Daemon) {
        Commands::Daemon => {
            let mut daemon = Daemon::new(config);
            daemon.run().await?;
        }

        Commands::Markers { action } => {
            run_markers(&config, action)?;
        }

        Commands::Settings {
            size,
            opacity,
            color,
        } => {
            run_settings(&config, size, opacity, color.as_deref())?;
        }

        Commands::Tap { id, double } => {
            run_tap(&config, id, double).await?;
        }

        Commands::Parse { utterance } => {
            run_parse(&utterance.join(" "));
        }

        Commands::Config { .. } => {
            show_config(&config);
        }
    }

    Ok(())
}

fn open_registry(config: &Config) -> MarkerRegistry {
    let mut registry = MarkerRegistry::new(store::create_store(&config.storage));
    registry.load();
    registry
}

fn print_markers(registry: &MarkerRegistry) {
    if registry.is_empty() {
        println!("No markers defined.");
        return;
    }
    for marker in registry.markers() {
        println!("  {}", marker);
    }
}

/// Edit markers without starting a session
fn run_markers(config: &Config, action: MarkersAction) -> anyhow::Result<()> {
    let mut registry = open_registry(config);

    match action {
        MarkersAction::List => {
            println!("{} marker(s) in {}\n", registry.count(), registry.store().describe());
            print_markers(&registry);
            return Ok(());
        }
        MarkersAction::Add { x, y } => {
            let marker = registry.add(x, y)?;
            println!("Added marker {}", marker);
        }
        MarkersAction::Remove { id } => {
            let marker = registry.remove_by_id(id).ok_or(MarkerError::NotFound(id))?;
            println!("Removed marker {}", marker);
        }
        MarkersAction::RemoveLast => match registry.remove_last() {
            Some(marker) => println!("Removed marker {}", marker),
            None => println!("No markers to remove."),
        },
        MarkersAction::Nearest { x, y } => match registry.remove_nearest(x, y) {
            Some(marker) => println!("Removed marker {}", marker),
            None => println!("No markers to remove."),
        },
        MarkersAction::Move { id, x, y } => {
            let marker = registry.reposition(id, x, y)?;
            println!("Moved marker {}", marker);
        }
        MarkersAction::Clear => {
            let removed = registry.clear();
            println!("Cleared {} marker(s)", removed);
        }
    }

    if !registry.is_durable() {
        anyhow::bail!("Change could not be saved to {}", registry.store().describe());
    }

    println!();
    print_markers(&registry);
    Ok(())
}

fn run_settings(
    config: &Config,
    size: Option<u32>,
    opacity: Option<f32>,
    color: Option<&str>,
) -> anyhow::Result<()> {
    let store = store::create_store(&config.storage);
    let mut settings = store.load_settings()?;

    let changed = size.is_some() || opacity.is_some() || color.is_some();
    if let Some(size) = size {
        settings.marker_size_units = size;
    }
    if let Some(opacity) = opacity {
        settings.opacity = opacity;
    }
    if let Some(color) = color {
        settings.color_value = parse_color(color)
            .ok_or_else(|| anyhow::anyhow!("Invalid color '{}', use #RRGGBB or #AARRGGBB", color))?;
    }

    if changed {
        settings = settings.clamped();
        store.save_settings(&settings)?;
        println!("Saved display settings to {}\n", store.describe());
    }

    print_settings(&settings);
    Ok(())
}

fn print_settings(settings: &DisplaySettings) {
    println!("  size    = {}", settings.marker_size_units);
    println!("  opacity = {:.2}", settings.opacity);
    println!("  color   = {}", settings.color_hex());
}

/// Run one gesture through a short-lived session and wait for it to finish
async fn run_tap(config: &Config, id: Option<u32>, double: bool) -> anyhow::Result<()> {
    let executor: Arc<dyn GestureExecutor> =
        Arc::from(gesture::create_executor(&config.gesture));
    let dispatcher = GestureDispatcher::new(executor, Timing::from_config(&config.gesture));
    let mut session = Session::new(
        MarkerRegistry::new(store::create_store(&config.storage)),
        dispatcher,
        Arc::new(HeadlessOverlay::new()),
    );
    session.on_session_start();

    let gesture = match id {
        Some(id) => {
            let marker = session.registry().get(id).ok_or(MarkerError::NotFound(id))?;
            if double {
                Gesture::DoubleTapOne(marker)
            } else {
                Gesture::TapOne(marker)
            }
        }
        None => {
            if session.registry().is_empty() {
                return Err(MarkerError::NoMarkers.into());
            }
            let markers = session.registry().markers().to_vec();
            if double {
                Gesture::DoubleTapAll(markers)
            } else {
                Gesture::TapAll(markers)
            }
        }
    };

    let dispatched = session.dispatch(gesture).await?;
    println!(
        "Running {} x{} via {}",
        dispatched.kind,
        dispatched.taps(),
        config.gesture.backend
    );

    if let Some(report) = dispatched.finished().await {
        for (tap, outcome) in &report.outcomes {
            println!(
                "  +{:>4}ms  marker {}  {:?}",
                tap.offset.as_millis(),
                tap.marker_id,
                outcome
            );
        }
        if !report.all_completed() {
            println!("\n{} of {} presses completed", report.completed(), report.outcomes.len());
        }
    }

    session.on_session_end().await;
    Ok(())
}

fn run_parse(utterance: &str) {
    let normalized = voice::normalize(utterance);
    match voice::parse(&normalized) {
        Some(command) => println!("{:?} -> {}", normalized, command),
        None => println!("{:?} -> (no command, ignored)", normalized),
    }
}

fn init_config(path: Option<&Path>, force: bool) -> anyhow::Result<()> {
    let path = match path {
        Some(path) => path.to_path_buf(),
        None => Config::default_path()
            .ok_or_else(|| anyhow::anyhow!("Could not determine config directory"))?,
    };

    if config::write_default_config(&path, force)? {
        println!("Created {:?}", path);
    } else {
        println!("Config file exists: {:?} (use --force to overwrite)", path);
    }
    Ok(())
}

fn show_config(config: &Config) {
    println!("Current Configuration\n");
    println!("=====================\n");

    println!("[gesture]");
    println!("  backend = \"{}\"", config.gesture.backend);
    println!("  tap_duration_ms = {}", config.gesture.tap_duration_ms);
    println!("  inter_point_delay_ms = {}", config.gesture.inter_point_delay_ms);
    println!(
        "  inter_point_group_delay_ms = {}",
        config.gesture.inter_point_group_delay_ms
    );
    println!("  double_tap_gap_ms = {}", config.gesture.double_tap_gap_ms);

    println!("\n[recognition]");
    println!("  restart_delay_ms = {}", config.recognition.restart_delay_ms);
    println!("  error_retry_ms = {}", config.recognition.error_retry_ms);
    println!(
        "  unavailable_retry_ms = {}",
        config.recognition.unavailable_retry_ms
    );

    println!("\n[storage]");
    println!("  path = {:?}", config.storage.path);
    match config.storage.resolve_path() {
        Some(path) => println!("  (resolves to {:?})", path),
        None => println!("  (in memory, not saved)"),
    }

    println!("\n[feedback]");
    println!("  notify = {}", config.feedback.notify);
    println!("  echo_heard = {}", config.feedback.echo_heard);

    println!("\n[logging]");
    println!("  file = {}", config.logging.file);
    println!("  dir = {:?}", config.logging.dir);
    if config.logging.file {
        println!("  (writes to {:?})", config.logging.resolve_dir());
    }

    if let Some(path) = Config::default_path() {
        println!("\n---");
        println!("Config file: {:?}", path);
    }
}
