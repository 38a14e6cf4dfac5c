//! Voice command interpreter
//!
//! Runs a parsed [`Command`] against the session: marker lookups in the
//! registry, mode changes, overlay requests and gesture dispatch. Failures
//! come back as a typed [`CommandError`]; unmatched utterances are ignored.

use super::{normalize, parse, Command};
use crate::error::CommandError;
use crate::gesture::{Gesture, GestureDispatcher, GestureKind};
use crate::marker::Marker;
use crate::mode::ModeController;
use crate::overlay::{ensure_overlay, OverlayHost};
use crate::registry::MarkerRegistry;

/// What a handled utterance did
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum Action {
    /// Nothing matched; no state changed
    Ignored,
    Activated { markers: usize },
    /// The listening session should end
    StopListening,
    OverlayHidden,
    MarkersHidden,
    OverlayShown,
    MarkersShown,
    /// Markers hidden, controls kept
    Finished,
    Dispatched {
        kind: GestureKind,
        markers: Vec<u32>,
        taps: usize,
    },
    NavigateHome,
}

impl Action {
    /// Short user-facing description
    pub fn describe(&self) -> String {
        match self {
            Action::Ignored => "Not a command".to_string(),
            Action::Activated { markers: 0 } => {
                "Overlay activated in add mode. Tap to add markers.".to_string()
            }
            Action::Activated { markers } => format!(
                "Overlay activated with {} markers. Say 'click' to use them.",
                markers
            ),
            Action::StopListening => "Voice control stopped".to_string(),
            Action::OverlayHidden => "Overlay hidden".to_string(),
            Action::MarkersHidden => "Markers hidden".to_string(),
            Action::OverlayShown => "Overlay shown".to_string(),
            Action::MarkersShown => "Markers visible".to_string(),
            Action::Finished => "Markers hidden, ready for clicks".to_string(),
            Action::Dispatched { kind, markers, .. } => match markers.as_slice() {
                [id] => format!("Running {} on marker {}", kind, id),
                all => format!("Running {} on all {} markers", kind, all.len()),
            },
            Action::NavigateHome => "Going home".to_string(),
        }
    }
}

/// Borrowed view of the session state a command may touch
pub struct Interpreter<'a> {
    registry: &'a mut MarkerRegistry,
    mode: &'a mut ModeController,
    dispatcher: &'a GestureDispatcher,
    overlay: &'a dyn OverlayHost,
}

impl<'a> Interpreter<'a> {
    pub fn new(
        registry: &'a mut MarkerRegistry,
        mode: &'a mut ModeController,
        dispatcher: &'a GestureDispatcher,
        overlay: &'a dyn OverlayHost,
    ) -> Self {
        Self {
            registry,
            mode,
            dispatcher,
            overlay,
        }
    }

    /// Interpret the top transcription candidate
    pub async fn interpret(&mut self, utterance: &str) -> Result<Action, CommandError> {
        let normalized = normalize(utterance);

        match parse(&normalized) {
            Some(command) => {
                tracing::info!("Command: {}", command);
                self.execute(command).await
            }
            None => {
                tracing::debug!("No command matches {:?}", normalized);
                Ok(Action::Ignored)
            }
        }
    }

    /// Run an already-parsed command
    pub async fn execute(&mut self, command: Command) -> Result<Action, CommandError> {
        match command {
            Command::Activate => {
                ensure_overlay(self.overlay, self.mode);
                self.mode.show_markers();
                self.mode.set_mode(true);

                let markers = self.registry.count();
                tracing::info!("Activated with {} existing markers", markers);
                Ok(Action::Activated { markers })
            }
            Command::Deactivate => Ok(Action::StopListening),
            Command::HideOverlay => {
                self.overlay.request_overlay_hide();
                Ok(Action::OverlayHidden)
            }
            Command::HideMarkers => {
                self.mode.hide_markers();
                Ok(Action::MarkersHidden)
            }
            Command::ShowOverlay => {
                ensure_overlay(self.overlay, self.mode);
                Ok(Action::OverlayShown)
            }
            Command::ShowMarkers => {
                self.mode.show_markers();
                Ok(Action::MarkersShown)
            }
            Command::Done => {
                self.mode.hide_markers();
                Ok(Action::Finished)
            }
            Command::DoubleClickMarker(id) => {
                let marker = self.lookup(id)?;
                self.dispatch(Gesture::DoubleTapOne(marker)).await
            }
            Command::DoubleClickAll => {
                if self.registry.is_empty() {
                    return Err(CommandError::NoMarkers);
                }
                let markers = self.registry.markers().to_vec();
                self.dispatch(Gesture::DoubleTapAll(markers)).await
            }
            Command::ClickMarker(id) => {
                let marker = self.lookup(id)?;
                // Markers drawn over the target would swallow the tap
                self.mode.hide_markers();
                self.dispatch(Gesture::TapOne(marker)).await
            }
            Command::ClickAll => {
                if self.registry.is_empty() {
                    tracing::info!("No markers yet, showing overlay in add mode");
                    ensure_overlay(self.overlay, self.mode);
                    self.mode.show_markers();
                    self.mode.set_mode(true);
                    return Err(CommandError::NoMarkers);
                }
                self.mode.hide_markers();
                let markers = self.registry.markers().to_vec();
                self.dispatch(Gesture::TapAll(markers)).await
            }
            Command::Home => {
                self.overlay.request_home();
                Ok(Action::NavigateHome)
            }
        }
    }

    fn lookup(&self, id: u32) -> Result<Marker, CommandError> {
        self.registry.get(id).ok_or_else(|| {
            tracing::info!("Marker {} not found, have {:?}", id, self.registry.ids());
            CommandError::MarkerNotFound(id)
        })
    }

    async fn dispatch(&self, gesture: Gesture) -> Result<Action, CommandError> {
        let kind = gesture.kind();
        let markers: Vec<u32> = gesture.targets().iter().map(|m| m.id).collect();

        match self.dispatcher.dispatch(gesture).await {
            Ok(dispatched) => Ok(Action::Dispatched {
                kind,
                markers,
                taps: dispatched.taps(),
            }),
            Err(e) => {
                tracing::warn!("Cannot run {}: {}", kind, e);
                Err(CommandError::ExecutionUnavailable)
            }
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::gesture::testing::RecordingExecutor;
    use crate::gesture::Timing;
    use crate::mode::SessionMode;
    use crate::overlay::HeadlessOverlay;
    use crate::store::MemoryStore;
    use std::time::Duration;

    struct Fixture {
        registry: MarkerRegistry,
        mode: ModeController,
        dispatcher: GestureDispatcher,
        overlay: HeadlessOverlay,
        executor: RecordingExecutor,
    }

    impl Fixture {
        fn with_markers(points: &[(f32, f32)]) -> Self {
            let markers = points
                .iter()
                .enumerate()
                .map(|(i, &(x, y))| Marker::new(i as u32 + 1, x, y))
                .collect();
            let mut registry =
                MarkerRegistry::new(Box::new(MemoryStore::with_markers(markers)));
            registry.load();

            let executor = RecordingExecutor::new();
            Self {
                registry,
                mode: ModeController::new(),
                dispatcher: GestureDispatcher::new(executor.shared(), Timing::default()),
                overlay: HeadlessOverlay::new(),
                executor,
            }
        }

        async fn say(&mut self, utterance: &str) -> Result<Action, CommandError> {
            Interpreter::new(
                &mut self.registry,
                &mut self.mode,
                &self.dispatcher,
                &self.overlay,
            )
            .interpret(utterance)
            .await
        }

        async fn settle(&self) {
            tokio::time::sleep(Duration::from_secs(2)).await;
        }
    }

    #[tokio::test(start_paused = true)]
    async fn test_click_unknown_marker() {
        let mut f = Fixture::with_markers(&[(1.0, 1.0), (2.0, 2.0)]);
        let result = f.say("click 3").await;

        assert_eq!(result, Err(CommandError::MarkerNotFound(3)));
        f.settle().await;
        assert!(f.executor.calls().is_empty());
        assert!(f.mode.markers_visible());
    }

    #[tokio::test(start_paused = true)]
    async fn test_click_empty_registry_guides_user() {
        let mut f = Fixture::with_markers(&[]);
        f.mode.toggle_mode();

        let result = f.say("click").await;
        assert_eq!(result, Err(CommandError::NoMarkers));
        assert!(f.mode.is_add_mode());
        assert!(f.mode.markers_visible());
        assert_eq!(f.overlay.show_requests(), 1);

        f.settle().await;
        assert!(f.executor.calls().is_empty());
    }

    #[tokio::test(start_paused = true)]
    async fn test_click_all_hides_markers_and_taps() {
        let mut f = Fixture::with_markers(&[(5.0, 5.0), (20.0, 20.0)]);
        let action = f.say("Click.").await.unwrap();

        assert_eq!(
            action,
            Action::Dispatched {
                kind: GestureKind::Tap,
                markers: vec![1, 2],
                taps: 2
            }
        );
        assert!(!f.mode.markers_visible());

        f.settle().await;
        let calls = f.executor.calls();
        assert_eq!(calls.len(), 2);
        assert_eq!(calls[1].0, Duration::from_millis(120));
    }

    #[tokio::test(start_paused = true)]
    async fn test_click_one_marker() {
        let mut f = Fixture::with_markers(&[(5.0, 5.0), (20.0, 20.0)]);
        let action = f.say("click 2").await.unwrap();
        assert_eq!(action.describe(), "Running tap on marker 2");

        f.settle().await;
        assert_eq!(
            f.executor.calls(),
            vec![(Duration::ZERO, 20.0, 20.0)]
        );
    }

    #[tokio::test(start_paused = true)]
    async fn test_double_click_keeps_markers_visible() {
        let mut f = Fixture::with_markers(&[(5.0, 5.0)]);
        let action = f.say("double click 1").await.unwrap();
        assert!(matches!(action, Action::Dispatched { taps: 2, .. }));
        assert!(f.mode.markers_visible());

        assert_eq!(
            f.say("double click").await.unwrap(),
            Action::Dispatched {
                kind: GestureKind::DoubleTap,
                markers: vec![1],
                taps: 2
            }
        );
        assert_eq!(
            f.say("double click 4").await,
            Err(CommandError::MarkerNotFound(4))
        );
    }

    #[tokio::test(start_paused = true)]
    async fn test_double_click_all_empty() {
        let mut f = Fixture::with_markers(&[]);
        assert_eq!(f.say("double click").await, Err(CommandError::NoMarkers));
        assert_eq!(f.overlay.show_requests(), 0);
    }

    #[tokio::test(start_paused = true)]
    async fn test_unavailable_executor_still_does_bookkeeping() {
        let mut f = Fixture::with_markers(&[(5.0, 5.0)]);
        f.executor.set_available(false);

        assert_eq!(f.say("click 1").await, Err(CommandError::ExecutionUnavailable));
        assert!(!f.mode.markers_visible());
        assert_eq!(f.say("click 7").await, Err(CommandError::MarkerNotFound(7)));

        f.settle().await;
        assert!(f.executor.calls().is_empty());
    }

    #[tokio::test(start_paused = true)]
    async fn test_unrecognized_utterance_is_noop() {
        let mut f = Fixture::with_markers(&[(5.0, 5.0)]);
        f.mode.toggle_mode();
        let before = f.mode.state();

        assert_eq!(f.say("banana").await, Ok(Action::Ignored));
        assert_eq!(f.mode.state(), before);
        assert_eq!(f.registry.count(), 1);
        assert_eq!(f.overlay.show_requests(), 0);

        f.settle().await;
        assert!(f.executor.calls().is_empty());
    }

    #[tokio::test(start_paused = true)]
    async fn test_activate_resets_fresh_overlay() {
        let mut f = Fixture::with_markers(&[(5.0, 5.0), (6.0, 6.0)]);
        f.mode.toggle_mode();
        f.mode.hide_markers();

        assert_eq!(f.say("clicker activate").await, Ok(Action::Activated { markers: 2 }));
        assert_eq!(f.mode.state(), SessionMode::default());
        assert!(f.overlay.is_overlay_active());
    }

    #[tokio::test(start_paused = true)]
    async fn test_activate_on_active_overlay_forces_add_mode() {
        let mut f = Fixture::with_markers(&[]);
        f.say("activate").await.unwrap();
        f.mode.toggle_mode();
        f.mode.hide_markers();
        f.mode.set_controls_visible(false);

        f.say("clicker").await.unwrap();
        assert_eq!(f.mode.state(), SessionMode::default());
        assert_eq!(f.overlay.show_requests(), 1);
    }

    #[tokio::test(start_paused = true)]
    async fn test_visibility_commands() {
        let mut f = Fixture::with_markers(&[]);
        f.say("show overlay").await.unwrap();

        assert_eq!(f.say("done").await, Ok(Action::Finished));
        assert!(!f.mode.markers_visible());
        assert!(f.mode.controls_visible());

        assert_eq!(f.say("show markers").await, Ok(Action::MarkersShown));
        assert!(f.mode.markers_visible());

        assert_eq!(f.say("hide markers").await, Ok(Action::MarkersHidden));
        assert!(f.overlay.is_overlay_active());

        assert_eq!(f.say("hide overlay").await, Ok(Action::OverlayHidden));
        assert!(!f.overlay.is_overlay_active());
    }

    #[tokio::test(start_paused = true)]
    async fn test_deactivate_and_home() {
        let mut f = Fixture::with_markers(&[]);
        assert_eq!(f.say("deactivate").await, Ok(Action::StopListening));
        assert_eq!(f.say("go home").await, Ok(Action::NavigateHome));
        assert_eq!(f.overlay.home_requests(), 1);
    }
}
