//! Session mode state machine
//!
//! Tracks how overlay touches are interpreted (add or remove markers) and
//! what is currently visible. Transient: reset to the defaults whenever an
//! overlay session is (re)established.

/// What a touch on the overlay surface does
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum TouchMode {
    /// Touch creates a marker
    Add,
    /// Touch removes the nearest marker
    Remove,
}

/// Snapshot of the session mode flags
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct SessionMode {
    pub add_mode: bool,
    pub markers_visible: bool,
    pub controls_visible: bool,
}

impl Default for SessionMode {
    fn default() -> Self {
        Self {
            add_mode: true,
            markers_visible: true,
            controls_visible: true,
        }
    }
}

impl SessionMode {
    pub fn touch_mode(&self) -> TouchMode {
        if self.add_mode {
            TouchMode::Add
        } else {
            TouchMode::Remove
        }
    }
}

impl std::fmt::Display for SessionMode {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        write!(
            f,
            "{} (markers {}, controls {})",
            if self.add_mode { "ADD" } else { "REM" },
            if self.markers_visible { "shown" } else { "hidden" },
            if self.controls_visible { "shown" } else { "minimized" }
        )
    }
}

/// Sole owner of the session mode flags
#[derive(Debug, Default)]
pub struct ModeController {
    state: SessionMode,
}

impl ModeController {
    pub fn new() -> Self {
        Self::default()
    }

    /// Return to the session-start defaults
    pub fn reset(&mut self) {
        self.state = SessionMode::default();
        tracing::debug!("Mode reset: {}", self.state);
    }

    pub fn state(&self) -> SessionMode {
        self.state
    }

    pub fn touch_mode(&self) -> TouchMode {
        self.state.touch_mode()
    }

    pub fn is_add_mode(&self) -> bool {
        self.state.add_mode
    }

    pub fn markers_visible(&self) -> bool {
        self.state.markers_visible
    }

    pub fn controls_visible(&self) -> bool {
        self.state.controls_visible
    }

    /// Flip between add and remove mode; returns the new add flag
    pub fn toggle_mode(&mut self) -> bool {
        self.state.add_mode = !self.state.add_mode;
        tracing::debug!("Mode toggled: {}", self.state);
        self.state.add_mode
    }

    /// Set add mode directly; returns true if it changed
    pub fn set_mode(&mut self, add_mode: bool) -> bool {
        if self.state.add_mode == add_mode {
            return false;
        }
        self.state.add_mode = add_mode;
        tracing::info!("Set add mode to {}", add_mode);
        true
    }

    pub fn hide_markers(&mut self) {
        self.state.markers_visible = false;
    }

    pub fn show_markers(&mut self) {
        self.state.markers_visible = true;
    }

    /// Flip marker visibility; returns the new visibility
    pub fn toggle_markers(&mut self) -> bool {
        self.state.markers_visible = !self.state.markers_visible;
        self.state.markers_visible
    }

    /// Show or minimize the control affordances (the drag handle stays)
    pub fn set_controls_visible(&mut self, visible: bool) {
        self.state.controls_visible = visible;
    }
}
