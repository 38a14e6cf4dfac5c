//! Daemon module - main event loop orchestration
//!
//! Wires the marker store, gesture executor, dispatcher and session
//! together, runs the recognition loop against an utterance source, and
//! tears everything down on "deactivate", end of input, or a signal.

use crate::config::Config;
use crate::error::{Result, VoxtapError};
use crate::gesture::{self, GestureDispatcher, GestureExecutor, Timing};
use crate::overlay::{HeadlessOverlay, OverlayHost};
use crate::registry::MarkerRegistry;
use crate::session::{self, Session};
use crate::store;
use crate::voice::{run_listener, ListenerTiming, StdinSource, UtteranceSource};
use std::sync::Arc;
use tokio::signal::unix::{signal, SignalKind};
use tokio::sync::watch;

/// Queued session requests before senders wait
const SESSION_QUEUE: usize = 32;

/// Main daemon that owns one overlay session
pub struct Daemon {
    config: Config,
    overlay: Arc<dyn OverlayHost>,
}

impl Daemon {
    /// Create a new daemon with the given configuration
    pub fn new(config: Config) -> Self {
        Self {
            config,
            overlay: Arc::new(HeadlessOverlay::new()),
        }
    }

    /// Use a different overlay host
    pub fn with_overlay(mut self, overlay: Arc<dyn OverlayHost>) -> Self {
        self.overlay = overlay;
        self
    }

    /// Run the daemon, reading utterances from stdin
    pub async fn run(&mut self) -> Result<()> {
        self.run_with(Box::new(StdinSource::stdin())).await
    }

    /// Run the daemon with the given utterance source
    pub async fn run_with(&mut self, mut source: Box<dyn UtteranceSource>) -> Result<()> {
        tracing::info!("Starting voxtap daemon");

        let mut sigterm = signal(SignalKind::terminate()).map_err(|e| {
            VoxtapError::Config(format!("Failed to set up SIGTERM handler: {}", e))
        })?;

        let store = store::create_store(&self.config.storage);
        tracing::info!("Marker store: {}", store.describe());

        let executor: Arc<dyn GestureExecutor> =
            Arc::from(gesture::create_executor(&self.config.gesture));
        if executor.is_available().await {
            tracing::info!("Gesture backend: {}", executor.name());
        } else {
            tracing::warn!(
                "Gesture backend {} is not available, clicks will be refused until it is",
                executor.name()
            );
        }

        let dispatcher =
            GestureDispatcher::new(executor, Timing::from_config(&self.config.gesture));
        let session = Session::new(
            MarkerRegistry::new(store),
            dispatcher,
            self.overlay.clone(),
        );
        let (handle, session_task) = session::spawn(session, SESSION_QUEUE);

        let (shutdown_tx, shutdown_rx) = watch::channel(false);
        let timing = ListenerTiming::from_config(&self.config.recognition);
        let feedback = self.config.feedback.clone();
        let listener_handle = handle.clone();

        let mut listener = tokio::spawn(async move {
            run_listener(
                source.as_mut(),
                &listener_handle,
                timing,
                &feedback,
                shutdown_rx,
            )
            .await
        });

        let finished = tokio::select! {
            joined = &mut listener => Some(joined),

            // Handle graceful shutdown (SIGINT from Ctrl+C)
            _ = tokio::signal::ctrl_c() => {
                tracing::info!("Received SIGINT, shutting down...");
                None
            }

            // Handle graceful shutdown (SIGTERM from systemctl stop)
            _ = sigterm.recv() => {
                tracing::info!("Received SIGTERM, shutting down...");
                None
            }
        };

        let joined = match finished {
            Some(joined) => joined,
            None => {
                shutdown_tx.send_replace(true);
                listener.await
            }
        };

        match joined {
            Ok(exit) => tracing::info!("Listening stopped: {:?}", exit),
            Err(e) => tracing::error!("Listener task failed: {}", e),
        }

        // Cleanup: no tap fires after the session task returns
        if handle.end().await.is_err() {
            tracing::debug!("Session already closed");
        }
        let session = session_task
            .await
            .map_err(|e| VoxtapError::Config(format!("Session task failed: {}", e)))?;

        if !session.registry().is_durable() {
            tracing::warn!("Last marker change was not saved");
        }

        tracing::info!(
            "Daemon stopped with {} markers",
            session.registry().count()
        );

        Ok(())
    }
}
