//! Spoken command handling
//!
//! Recognized text arrives from an external transcriber. It is normalized,
//! matched against a fixed grammar, and the resulting [`Command`] is run by
//! the [`Interpreter`] against the session state.

pub mod interpreter;
pub mod listener;

use regex::Regex;
use std::sync::LazyLock;

pub use interpreter::{Action, Interpreter};
pub use listener::{
    run_listener, LineSource, ListenExit, ListenerTiming, StdinSource, UtteranceSource,
};

/// A parsed voice command
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum Command {
    /// "clicker activate" | "clicker" | "activate"
    Activate,
    /// "deactivate"
    Deactivate,
    /// "hide overlay"
    HideOverlay,
    /// "hide markers"
    HideMarkers,
    /// "show overlay"
    ShowOverlay,
    /// "show markers"
    ShowMarkers,
    /// "done" | "finish"
    Done,
    /// "double click N"
    DoubleClickMarker(u32),
    /// "double click"
    DoubleClickAll,
    /// "click N"
    ClickMarker(u32),
    /// "click"
    ClickAll,
    /// "home" | "go home"
    Home,
}

impl std::fmt::Display for Command {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        match self {
            Command::Activate => write!(f, "activate"),
            Command::Deactivate => write!(f, "deactivate"),
            Command::HideOverlay => write!(f, "hide overlay"),
            Command::HideMarkers => write!(f, "hide markers"),
            Command::ShowOverlay => write!(f, "show overlay"),
            Command::ShowMarkers => write!(f, "show markers"),
            Command::Done => write!(f, "done"),
            Command::DoubleClickMarker(id) => write!(f, "double click {}", id),
            Command::DoubleClickAll => write!(f, "double click"),
            Command::ClickMarker(id) => write!(f, "click {}", id),
            Command::ClickAll => write!(f, "click"),
            Command::Home => write!(f, "home"),
        }
    }
}

static DOUBLE_CLICK_ID: LazyLock<Regex> =
    LazyLock::new(|| Regex::new(r"^double click (\d+)$").expect("valid regex"));

static CLICK_ID: LazyLock<Regex> =
    LazyLock::new(|| Regex::new(r"^click (\d+)$").expect("valid regex"));

/// Normalize raw recognizer output: lowercase, trim, collapse inner
/// whitespace and drop trailing punctuation.
pub fn normalize(text: &str) -> String {
    let lowered = text.to_lowercase();
    let collapsed = lowered.split_whitespace().collect::<Vec<_>>().join(" ");
    collapsed
        .trim_end_matches(['.', '!', '?', ','])
        .trim_end()
        .to_string()
}

/// Parse a normalized utterance. Rules are tried in priority order and the
/// first match wins; `None` means nothing matched.
pub fn parse(normalized: &str) -> Option<Command> {
    let command = match normalized {
        "clicker activate" | "clicker" | "activate" => Command::Activate,
        "deactivate" => Command::Deactivate,
        "hide overlay" => Command::HideOverlay,
        "hide markers" => Command::HideMarkers,
        "show overlay" => Command::ShowOverlay,
        "show markers" => Command::ShowMarkers,
        "done" | "finish" => Command::Done,
        _ => {
            if let Some(id) = capture_id(&DOUBLE_CLICK_ID, normalized) {
                Command::DoubleClickMarker(id?)
            } else if normalized == "double click" {
                Command::DoubleClickAll
            } else if let Some(id) = capture_id(&CLICK_ID, normalized) {
                Command::ClickMarker(id?)
            } else if normalized == "click" {
                Command::ClickAll
            } else if normalized == "home" || normalized == "go home" {
                Command::Home
            } else {
                return None;
            }
        }
    };

    Some(command)
}

/// Outer `None`: pattern did not match. Inner `None`: the number does not
/// fit in a marker id, which makes the rule not match either.
fn capture_id(pattern: &Regex, text: &str) -> Option<Option<u32>> {
    let caps = pattern.captures(text)?;
    Some(caps.get(1).and_then(|m| m.as_str().parse().ok()))
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_normalize() {
        assert_eq!(normalize("  Click   3. "), "click 3");
        assert_eq!(normalize("DOUBLE CLICK!"), "double click");
        assert_eq!(normalize("go\thome?"), "go home");
        assert_eq!(normalize(""), "");
    }

    #[test]
    fn test_exact_phrases() {
        assert_eq!(parse("clicker activate"), Some(Command::Activate));
        assert_eq!(parse("clicker"), Some(Command::Activate));
        assert_eq!(parse("activate"), Some(Command::Activate));
        assert_eq!(parse("deactivate"), Some(Command::Deactivate));
        assert_eq!(parse("hide overlay"), Some(Command::HideOverlay));
        assert_eq!(parse("hide markers"), Some(Command::HideMarkers));
        assert_eq!(parse("show overlay"), Some(Command::ShowOverlay));
        assert_eq!(parse("show markers"), Some(Command::ShowMarkers));
        assert_eq!(parse("done"), Some(Command::Done));
        assert_eq!(parse("finish"), Some(Command::Done));
        assert_eq!(parse("home"), Some(Command::Home));
        assert_eq!(parse("go home"), Some(Command::Home));
    }

    #[test]
    fn test_click_rules() {
        assert_eq!(parse("click"), Some(Command::ClickAll));
        assert_eq!(parse("click 3"), Some(Command::ClickMarker(3)));
        assert_eq!(parse("double click"), Some(Command::DoubleClickAll));
        assert_eq!(parse("double click 12"), Some(Command::DoubleClickMarker(12)));
    }

    #[test]
    fn test_rejects_near_misses() {
        assert_eq!(parse("banana"), None);
        assert_eq!(parse("click three"), None);
        assert_eq!(parse("please click"), None);
        assert_eq!(parse("click 3 now"), None);
        assert_eq!(parse("double click -1"), None);
        assert_eq!(parse(""), None);
    }

    #[test]
    fn test_oversized_id_does_not_match() {
        assert_eq!(parse("click 99999999999"), None);
        assert_eq!(parse("double click 99999999999"), None);
    }

    #[test]
    fn test_normalized_recognizer_output_parses() {
        assert_eq!(parse(&normalize("Click 2.")), Some(Command::ClickMarker(2)));
        assert_eq!(parse(&normalize("  Clicker  Activate ")), Some(Command::Activate));
    }

    #[test]
    fn test_display_round_trips_through_parser() {
        for command in [
            Command::Deactivate,
            Command::ClickMarker(4),
            Command::DoubleClickMarker(1),
            Command::ClickAll,
            Command::DoubleClickAll,
        ] {
            assert_eq!(parse(&command.to_string()), Some(command));
        }
    }
}
