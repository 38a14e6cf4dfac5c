//! Platform-specific desktop notifications
//!
//! Used as spoken-command feedback:
//! - Linux: Uses notify-send (libnotify)
//! - macOS: Uses osascript (AppleScript)

use crate::error::CommandError;
use crate::voice::Action;
use std::process::Stdio;
use tokio::process::Command;

/// Send a desktop notification with the given title and body.
///
/// Notification failures are logged but don't propagate errors
/// (notifications are best-effort).
pub async fn send(title: &str, body: &str) {
    #[cfg(target_os = "linux")]
    send_linux(title, body).await;

    #[cfg(target_os = "macos")]
    send_macos(title, body).await;

    #[cfg(not(any(target_os = "linux", target_os = "macos")))]
    {
        tracing::debug!("Notifications not supported on this platform");
        let _ = (title, body);
    }
}

/// Notify the user about a handled utterance. Unmatched utterances are
/// not reported.
pub async fn command_feedback(
    heard: &str,
    outcome: &Result<Action, CommandError>,
    echo_heard: bool,
) {
    if let Some(body) = feedback_body(heard, outcome, echo_heard) {
        send("Voxtap", &body).await;
    }
}

/// Build the notification text for a handled utterance
pub fn feedback_body(
    heard: &str,
    outcome: &Result<Action, CommandError>,
    echo_heard: bool,
) -> Option<String> {
    let message = match outcome {
        Ok(Action::Ignored) => return None,
        Ok(action) => action.describe(),
        Err(CommandError::NoMarkers) => "No markers defined. Tap to add markers.".to_string(),
        Err(e) => e.to_string(),
    };

    if echo_heard {
        Some(format!("Heard: {}\n{}", heard.trim(), message))
    } else {
        Some(message)
    }
}

#[cfg(target_os = "linux")]
async fn send_linux(title: &str, body: &str) {
    let result = Command::new("notify-send")
        .args(["--app-name=Voxtap", "--expire-time=2000", title, body])
        .stdout(Stdio::null())
        .stderr(Stdio::null())
        .status()
        .await;

    if let Err(e) = result {
        tracing::debug!("Failed to send notification: {}", e);
    }
}

#[cfg(target_os = "macos")]
async fn send_macos(title: &str, body: &str) {
    let escaped_title = title.replace('"', "\\\"");
    let escaped_body = body.replace('"', "\\\"");

    let script = format!(
        r#"display notification "{}" with title "{}""#,
        escaped_body, escaped_title
    );

    let result = Command::new("osascript")
        .args(["-e", &script])
        .stdout(Stdio::null())
        .stderr(Stdio::null())
        .status()
        .await;

    if let Err(e) = result {
        tracing::debug!("Failed to send notification: {}", e);
    }
}
