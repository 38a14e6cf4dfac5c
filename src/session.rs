//! Overlay session
//!
//! A session owns the marker registry, the mode controller and the gesture
//! dispatcher for one run from activation to teardown. All mutations go
//! through a single task: touch input, drags and voice commands are
//! messages handled one at a time, so a drag and a spoken removal can never
//! interleave, and each persistence write finishes before the next message
//! is read.
//!
//! Lifecycle:
//! ```text
//!   spawn() ─► on_session_start ─► [requests...] ─► end() ─► on_session_end
//! ```

use crate::error::{CommandError, GestureError, MarkerError, Result, VoxtapError};
use crate::gesture::{Dispatched, Gesture, GestureDispatcher};
use crate::marker::Marker;
use crate::mode::{ModeController, SessionMode};
use crate::overlay::{handle_input, OverlayEvent, OverlayHost, OverlayInput};
use crate::registry::MarkerRegistry;
use crate::voice::{Action, Interpreter};
use std::sync::Arc;
use tokio::sync::{mpsc, oneshot};
use tokio::task::JoinHandle;

/// Point-in-time view of a session
#[derive(Debug, Clone, PartialEq)]
pub struct Snapshot {
    pub markers: Vec<Marker>,
    pub mode: SessionMode,
    pub overlay_active: bool,
    /// False if the last store write failed
    pub durable: bool,
}

/// State owned by one overlay session
pub struct Session {
    registry: MarkerRegistry,
    mode: ModeController,
    dispatcher: GestureDispatcher,
    overlay: Arc<dyn OverlayHost>,
    started: bool,
}

impl Session {
    pub fn new(
        registry: MarkerRegistry,
        dispatcher: GestureDispatcher,
        overlay: Arc<dyn OverlayHost>,
    ) -> Self {
        Self {
            registry,
            mode: ModeController::new(),
            dispatcher,
            overlay,
            started: false,
        }
    }

    /// Entry action: default mode, markers read from the store.
    /// Returns the number of markers loaded.
    pub fn on_session_start(&mut self) -> usize {
        self.mode.reset();
        let markers = self.registry.load();
        self.started = true;
        tracing::info!(
            "Session started with {} markers ({} executor, {} overlay)",
            markers,
            self.dispatcher.executor_name(),
            self.overlay.name()
        );
        markers
    }

    /// Exit action: no tap fires after this returns
    pub async fn on_session_end(&mut self) {
        self.dispatcher.shutdown().await;
        self.started = false;
        tracing::info!("Session ended");
    }

    pub fn is_started(&self) -> bool {
        self.started
    }

    /// Interpret a recognized utterance
    pub async fn interpret(&mut self, utterance: &str) -> std::result::Result<Action, CommandError> {
        Interpreter::new(
            &mut self.registry,
            &mut self.mode,
            &self.dispatcher,
            self.overlay.as_ref(),
        )
        .interpret(utterance)
        .await
    }

    /// Apply overlay touch or control input
    pub fn handle_input(&mut self, input: OverlayInput) -> std::result::Result<OverlayEvent, MarkerError> {
        handle_input(
            input,
            &mut self.registry,
            &mut self.mode,
            self.overlay.as_ref(),
        )
    }

    /// Schedule a gesture directly, bypassing the voice grammar
    pub async fn dispatch(&self, gesture: Gesture) -> std::result::Result<Dispatched, GestureError> {
        self.dispatcher.dispatch(gesture).await
    }

    pub fn registry(&self) -> &MarkerRegistry {
        &self.registry
    }

    pub fn mode(&self) -> &ModeController {
        &self.mode
    }

    pub fn mode_mut(&mut self) -> &mut ModeController {
        &mut self.mode
    }

    pub fn snapshot(&self) -> Snapshot {
        Snapshot {
            markers: self.registry.markers().to_vec(),
            mode: self.mode.state(),
            overlay_active: self.overlay.is_overlay_active(),
            durable: self.registry.is_durable(),
        }
    }
}

enum Request {
    Interpret {
        utterance: String,
        reply: oneshot::Sender<std::result::Result<Action, CommandError>>,
    },
    Input {
        input: OverlayInput,
        reply: oneshot::Sender<std::result::Result<OverlayEvent, MarkerError>>,
    },
    Dispatch {
        gesture: Gesture,
        reply: oneshot::Sender<std::result::Result<Dispatched, GestureError>>,
    },
    SetMode {
        add_mode: bool,
        reply: oneshot::Sender<bool>,
    },
    Snapshot {
        reply: oneshot::Sender<Snapshot>,
    },
    End,
}

/// Cloneable handle to a running session task
#[derive(Clone)]
pub struct SessionHandle {
    tx: mpsc::Sender<Request>,
}

impl SessionHandle {
    async fn request<T>(&self, build: impl FnOnce(oneshot::Sender<T>) -> Request) -> Result<T> {
        let (reply, rx) = oneshot::channel();
        self.tx
            .send(build(reply))
            .await
            .map_err(|_| VoxtapError::SessionClosed)?;
        rx.await.map_err(|_| VoxtapError::SessionClosed)
    }

    pub async fn interpret(
        &self,
        utterance: impl Into<String>,
    ) -> Result<std::result::Result<Action, CommandError>> {
        let utterance = utterance.into();
        self.request(|reply| Request::Interpret { utterance, reply })
            .await
    }

    pub async fn input(
        &self,
        input: OverlayInput,
    ) -> Result<std::result::Result<OverlayEvent, MarkerError>> {
        self.request(|reply| Request::Input { input, reply }).await
    }

    pub async fn dispatch(
        &self,
        gesture: Gesture,
    ) -> Result<std::result::Result<Dispatched, GestureError>> {
        self.request(|reply| Request::Dispatch { gesture, reply })
            .await
    }

    /// Set add mode directly; returns true if it changed
    pub async fn set_mode(&self, add_mode: bool) -> Result<bool> {
        self.request(|reply| Request::SetMode { add_mode, reply })
            .await
    }

    pub async fn snapshot(&self) -> Result<Snapshot> {
        self.request(|reply| Request::Snapshot { reply }).await
    }

    /// Ask the session to tear down after the requests already queued
    pub async fn end(&self) -> Result<()> {
        self.tx
            .send(Request::End)
            .await
            .map_err(|_| VoxtapError::SessionClosed)
    }

    pub fn is_closed(&self) -> bool {
        self.tx.is_closed()
    }
}

/// Start the session task. The task runs `on_session_start`, serves
/// requests until `end()` is called or every handle is dropped, then runs
/// `on_session_end` and hands the session back.
pub fn spawn(mut session: Session, capacity: usize) -> (SessionHandle, JoinHandle<Session>) {
    let (tx, mut rx) = mpsc::channel(capacity.max(1));

    let task = tokio::spawn(async move {
        session.on_session_start();

        while let Some(request) = rx.recv().await {
            match request {
                Request::Interpret { utterance, reply } => {
                    let _ = reply.send(session.interpret(&utterance).await);
                }
                Request::Input { input, reply } => {
                    let _ = reply.send(session.handle_input(input));
                }
                Request::Dispatch { gesture, reply } => {
                    let _ = reply.send(session.dispatch(gesture).await);
                }
                Request::SetMode { add_mode, reply } => {
                    let _ = reply.send(session.mode_mut().set_mode(add_mode));
                }
                Request::Snapshot { reply } => {
                    let _ = reply.send(session.snapshot());
                }
                Request::End => break,
            }
        }

        rx.close();
        session.on_session_end().await;
        session
    });

    (SessionHandle { tx }, task)
}
