//! Overlay host capability and touch mapping
//!
//! The overlay window itself (drawing markers, window placement) belongs to
//! the host. This module defines what voxtap needs from it and maps raw
//! overlay input onto the registry and mode controller.

use crate::error::MarkerError;
use crate::marker::{check_point, Marker};
use crate::mode::{ModeController, TouchMode};
use crate::registry::MarkerRegistry;
use std::sync::atomic::{AtomicBool, AtomicUsize, Ordering};

/// Trait for the window host that shows the marker overlay
pub trait OverlayHost: Send + Sync {
    /// Whether an overlay is currently on screen
    fn is_overlay_active(&self) -> bool;

    /// Ask the host to show the overlay; false if it could not
    fn request_overlay_show(&self) -> bool;

    /// Ask the host to remove the overlay
    fn request_overlay_hide(&self);

    /// Ask the host to navigate to its primary screen
    fn request_home(&self);

    /// Human-readable name for logging
    fn name(&self) -> &'static str;
}

/// Overlay host with no window; tracks the requested state only
#[derive(Debug, Default)]
pub struct HeadlessOverlay {
    active: AtomicBool,
    show_requests: AtomicUsize,
    home_requests: AtomicUsize,
}

impl HeadlessOverlay {
    pub fn new() -> Self {
        Self::default()
    }

    /// Number of times the overlay was asked to show
    pub fn show_requests(&self) -> usize {
        self.show_requests.load(Ordering::SeqCst)
    }

    /// Number of times navigation home was requested
    pub fn home_requests(&self) -> usize {
        self.home_requests.load(Ordering::SeqCst)
    }
}

impl OverlayHost for HeadlessOverlay {
    fn is_overlay_active(&self) -> bool {
        self.active.load(Ordering::SeqCst)
    }

    fn request_overlay_show(&self) -> bool {
        self.show_requests.fetch_add(1, Ordering::SeqCst);
        self.active.store(true, Ordering::SeqCst);
        tracing::info!("Overlay shown");
        true
    }

    fn request_overlay_hide(&self) {
        self.active.store(false, Ordering::SeqCst);
        tracing::info!("Overlay hidden");
    }

    fn request_home(&self) {
        self.home_requests.fetch_add(1, Ordering::SeqCst);
        tracing::info!("Navigate home requested");
    }

    fn name(&self) -> &'static str {
        "headless"
    }
}

/// Bring the overlay up. A fresh overlay starts from the default mode; an
/// overlay that is already up just gets its controls back.
pub fn ensure_overlay(overlay: &dyn OverlayHost, mode: &mut ModeController) {
    if overlay.is_overlay_active() {
        mode.set_controls_visible(true);
        return;
    }

    if !overlay.request_overlay_show() {
        tracing::warn!("{} could not show the overlay", overlay.name());
    }
    mode.reset();
}

/// Raw input from the overlay surface and its controls
#[derive(Debug, Clone, Copy, PartialEq)]
pub enum OverlayInput {
    /// Touch on the marker surface
    Touch { x: f32, y: f32 },
    /// A marker was dragged and released at a new point
    DragEnd { id: u32, x: f32, y: f32 },
    /// Long press on a marker
    LongPress { id: u32 },
    RemoveLast,
    ClearAll,
    ToggleMode,
    /// The "done" button: flips marker visibility
    ToggleMarkers,
    /// Hide everything except the bubble
    Minimize,
    BubbleTap,
    BubbleLongPress,
}

/// What an overlay input changed
#[derive(Debug, Clone, Copy, PartialEq)]
pub enum OverlayEvent {
    Added(Marker),
    Removed(Marker),
    Moved(Marker),
    Cleared(usize),
    ModeChanged(TouchMode),
    MarkersVisible(bool),
    ControlsVisible(bool),
    Closed,
    /// Input had nothing to act on
    Unchanged,
}

/// Apply one overlay input to the registry and mode controller
pub fn handle_input(
    input: OverlayInput,
    registry: &mut MarkerRegistry,
    mode: &mut ModeController,
    overlay: &dyn OverlayHost,
) -> Result<OverlayEvent, MarkerError> {
    let event = match input {
        OverlayInput::Touch { x, y } => {
            check_point(x, y)?;
            // Hidden markers let touches through to the screen below
            if !mode.markers_visible() {
                return Ok(OverlayEvent::Unchanged);
            }
            match mode.touch_mode() {
                TouchMode::Add => OverlayEvent::Added(registry.add(x, y)?),
                TouchMode::Remove => registry
                    .remove_nearest(x, y)
                    .map_or(OverlayEvent::Unchanged, OverlayEvent::Removed),
            }
        }
        OverlayInput::DragEnd { id, x, y } => OverlayEvent::Moved(registry.reposition(id, x, y)?),
        OverlayInput::LongPress { id } => registry
            .remove_by_id(id)
            .map_or(OverlayEvent::Unchanged, OverlayEvent::Removed),
        OverlayInput::RemoveLast => registry
            .remove_last()
            .map_or(OverlayEvent::Unchanged, OverlayEvent::Removed),
        OverlayInput::ClearAll => OverlayEvent::Cleared(registry.clear()),
        OverlayInput::ToggleMode => {
            mode.toggle_mode();
            OverlayEvent::ModeChanged(mode.touch_mode())
        }
        OverlayInput::ToggleMarkers => OverlayEvent::MarkersVisible(mode.toggle_markers()),
        OverlayInput::Minimize => {
            mode.set_controls_visible(false);
            OverlayEvent::ControlsVisible(false)
        }
        OverlayInput::BubbleTap => {
            if mode.controls_visible() {
                mode.toggle_mode();
                OverlayEvent::ModeChanged(mode.touch_mode())
            } else {
                mode.set_controls_visible(true);
                OverlayEvent::ControlsVisible(true)
            }
        }
        OverlayInput::BubbleLongPress => {
            overlay.request_overlay_hide();
            OverlayEvent::Closed
        }
    };

    tracing::debug!("Overlay {:?} -> {:?}", input, event);
    Ok(event)
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::store::MemoryStore;

    struct Fixture {
        registry: MarkerRegistry,
        mode: ModeController,
        overlay: HeadlessOverlay,
    }

    impl Fixture {
        fn new() -> Self {
            Self {
                registry: MarkerRegistry::new(Box::new(MemoryStore::new())),
                mode: ModeController::new(),
                overlay: HeadlessOverlay::new(),
            }
        }

        fn input(&mut self, input: OverlayInput) -> Result<OverlayEvent, MarkerError> {
            handle_input(input, &mut self.registry, &mut self.mode, &self.overlay)
        }
    }

    #[test]
    fn test_touch_adds_in_add_mode() {
        let mut f = Fixture::new();
        let event = f.input(OverlayInput::Touch { x: 1.0, y: 2.0 }).unwrap();
        assert_eq!(event, OverlayEvent::Added(Marker::new(1, 1.0, 2.0)));
        assert_eq!(f.registry.count(), 1);
    }

    #[test]
    fn test_touch_removes_nearest_in_remove_mode() {
        let mut f = Fixture::new();
        f.input(OverlayInput::Touch { x: 0.0, y: 0.0 }).unwrap();
        f.input(OverlayInput::Touch { x: 10.0, y: 10.0 }).unwrap();
        f.input(OverlayInput::ToggleMode).unwrap();

        let event = f.input(OverlayInput::Touch { x: 1.0, y: 1.0 }).unwrap();
        assert_eq!(event, OverlayEvent::Removed(Marker::new(1, 0.0, 0.0)));
        assert_eq!(f.registry.markers(), &[Marker::new(1, 10.0, 10.0)]);

        // Nothing left to remove after the last one goes
        f.input(OverlayInput::Touch { x: 1.0, y: 1.0 }).unwrap();
        let event = f.input(OverlayInput::Touch { x: 1.0, y: 1.0 }).unwrap();
        assert_eq!(event, OverlayEvent::Unchanged);
    }

    #[test]
    fn test_touch_surfaces_capacity() {
        let mut f = Fixture::new();
        for i in 0..10 {
            f.input(OverlayInput::Touch { x: i as f32, y: 0.0 }).unwrap();
        }
        let err = f.input(OverlayInput::Touch { x: 99.0, y: 0.0 }).unwrap_err();
        assert_eq!(err, MarkerError::CapacityExceeded(10));
        assert_eq!(f.registry.count(), 10);
    }

    #[test]
    fn test_non_finite_input_is_rejected() {
        let mut f = Fixture::new();
        f.input(OverlayInput::Touch { x: 4.0, y: 4.0 }).unwrap();

        let err = f.input(OverlayInput::Touch { x: f32::NAN, y: 1.0 }).unwrap_err();
        assert!(matches!(err, MarkerError::InvalidPoint(_)));

        f.input(OverlayInput::ToggleMode).unwrap();
        let err = f.input(OverlayInput::Touch { x: 1.0, y: f32::INFINITY }).unwrap_err();
        assert!(matches!(err, MarkerError::InvalidPoint(_)));

        let err = f
            .input(OverlayInput::DragEnd { id: 1, x: f32::NEG_INFINITY, y: 0.0 })
            .unwrap_err();
        assert!(matches!(err, MarkerError::InvalidPoint(_)));

        assert_eq!(f.registry.markers(), &[Marker::new(1, 4.0, 4.0)]);
    }

    #[test]
    fn test_touch_ignored_while_markers_hidden() {
        let mut f = Fixture::new();
        f.input(OverlayInput::ToggleMarkers).unwrap();
        let event = f.input(OverlayInput::Touch { x: 1.0, y: 1.0 }).unwrap();
        assert_eq!(event, OverlayEvent::Unchanged);
        assert!(f.registry.is_empty());
    }

    #[test]
    fn test_drag_and_long_press() {
        let mut f = Fixture::new();
        f.input(OverlayInput::Touch { x: 0.0, y: 0.0 }).unwrap();
        f.input(OverlayInput::Touch { x: 5.0, y: 5.0 }).unwrap();

        let event = f.input(OverlayInput::DragEnd { id: 1, x: 7.0, y: 8.0 }).unwrap();
        assert_eq!(event, OverlayEvent::Moved(Marker::new(1, 7.0, 8.0)));

        let err = f.input(OverlayInput::DragEnd { id: 9, x: 0.0, y: 0.0 }).unwrap_err();
        assert_eq!(err, MarkerError::NotFound(9));

        f.input(OverlayInput::LongPress { id: 1 }).unwrap();
        assert_eq!(f.registry.markers(), &[Marker::new(1, 5.0, 5.0)]);
    }

    #[test]
    fn test_bubble_tap_depends_on_controls() {
        let mut f = Fixture::new();
        let event = f.input(OverlayInput::BubbleTap).unwrap();
        assert_eq!(event, OverlayEvent::ModeChanged(TouchMode::Remove));

        f.input(OverlayInput::Minimize).unwrap();
        let event = f.input(OverlayInput::BubbleTap).unwrap();
        assert_eq!(event, OverlayEvent::ControlsVisible(true));
        assert_eq!(f.mode.touch_mode(), TouchMode::Remove);
    }

    #[test]
    fn test_bubble_long_press_closes_overlay() {
        let mut f = Fixture::new();
        ensure_overlay(&f.overlay, &mut f.mode);
        assert!(f.overlay.is_overlay_active());

        let event = f.input(OverlayInput::BubbleLongPress).unwrap();
        assert_eq!(event, OverlayEvent::Closed);
        assert!(!f.overlay.is_overlay_active());
    }

    #[test]
    fn test_ensure_overlay_resets_only_when_inactive() {
        let mut f = Fixture::new();
        f.mode.toggle_mode();
        ensure_overlay(&f.overlay, &mut f.mode);
        assert!(f.mode.is_add_mode());
        assert_eq!(f.overlay.show_requests(), 1);

        f.mode.toggle_mode();
        f.mode.set_controls_visible(false);
        ensure_overlay(&f.overlay, &mut f.mode);
        assert!(!f.mode.is_add_mode());
        assert!(f.mode.controls_visible());
        assert_eq!(f.overlay.show_requests(), 1);
    }

    #[test]
    fn test_clear_and_remove_last() {
        let mut f = Fixture::new();
        assert_eq!(f.input(OverlayInput::RemoveLast).unwrap(), OverlayEvent::Unchanged);
        f.input(OverlayInput::Touch { x: 0.0, y: 0.0 }).unwrap();
        f.input(OverlayInput::Touch { x: 1.0, y: 1.0 }).unwrap();
        f.input(OverlayInput::Touch { x: 2.0, y: 2.0 }).unwrap();

        let event = f.input(OverlayInput::RemoveLast).unwrap();
        assert_eq!(event, OverlayEvent::Removed(Marker::new(3, 2.0, 2.0)));
        assert_eq!(f.input(OverlayInput::ClearAll).unwrap(), OverlayEvent::Cleared(2));
        assert!(f.registry.is_empty());
    }
}
