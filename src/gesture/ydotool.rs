//! ydotool-based tap injection
//!
//! Moves the pointer to an absolute position, presses the left button,
//! holds it for the tap duration and releases. Works on X11, Wayland
//! and the console because ydotool talks to the uinput kernel interface.
//!
//! Requires:
//! - ydotool installed
//! - ydotoold daemon running (systemctl --user start ydotool)
//! - User in 'input' group

use super::{GestureExecutor, GestureOutcome};
use crate::error::GestureError;
use std::process::Stdio;
use std::time::Duration;
use tokio::process::Command;

/// Left button down (0x40) and up (0x80), see `ydotool click --help`
const LEFT_DOWN: &str = "0x40";
const LEFT_UP: &str = "0x80";

/// ydotool-based tap executor
#[derive(Debug, Default)]
pub struct YdotoolExecutor;

impl YdotoolExecutor {
    pub fn new() -> Self {
        Self
    }

    async fn run(&self, args: &[&str]) -> Result<(), GestureError> {
        let output = Command::new("ydotool")
            .args(args)
            .stdout(Stdio::null())
            .stderr(Stdio::piped())
            .output()
            .await
            .map_err(|e| {
                if e.kind() == std::io::ErrorKind::NotFound {
                    GestureError::YdotoolNotFound
                } else {
                    GestureError::InjectionFailed(e.to_string())
                }
            })?;

        if !output.status.success() {
            let stderr = String::from_utf8_lossy(&output.stderr);

            if stderr.contains("socket") || stderr.contains("connect") || stderr.contains("daemon")
            {
                return Err(GestureError::YdotoolNotRunning);
            }

            return Err(GestureError::InjectionFailed(stderr.trim().to_string()));
        }

        Ok(())
    }
}

/// Arguments for an absolute pointer move
fn move_args(x: f32, y: f32) -> Vec<String> {
    vec![
        "mousemove".to_string(),
        "--absolute".to_string(),
        "-x".to_string(),
        (x.round() as i64).to_string(),
        "-y".to_string(),
        (y.round() as i64).to_string(),
    ]
}

#[async_trait::async_trait]
impl GestureExecutor for YdotoolExecutor {
    async fn is_available(&self) -> bool {
        if which::which("ydotool").is_err() {
            tracing::debug!("ydotool not found in PATH");
            return false;
        }

        // A zero-distance relative move succeeds only when ydotoold is reachable
        Command::new("ydotool")
            .args(["mousemove", "-x", "0", "-y", "0"])
            .stdout(Stdio::null())
            .stderr(Stdio::null())
            .status()
            .await
            .map(|s| s.success())
            .unwrap_or(false)
    }

    async fn execute(
        &self,
        x: f32,
        y: f32,
        duration_ms: u64,
    ) -> Result<GestureOutcome, GestureError> {
        let args = move_args(x, y);
        let args: Vec<&str> = args.iter().map(String::as_str).collect();
        self.run(&args).await?;

        self.run(&["click", LEFT_DOWN]).await?;
        tokio::time::sleep(Duration::from_millis(duration_ms)).await;

        // A press that never got its release leaves the button stuck
        if let Err(e) = self.run(&["click", LEFT_UP]).await {
            tracing::warn!("Button release failed at ({:.0}, {:.0}): {}", x, y, e);
            return Ok(GestureOutcome::Cancelled);
        }

        Ok(GestureOutcome::Completed)
    }

    fn name(&self) -> &'static str {
        "ydotool"
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_move_args_round_coordinates() {
        assert_eq!(
            move_args(10.4, 20.6),
            vec!["mousemove", "--absolute", "-x", "10", "-y", "21"]
        );
    }

    #[test]
    fn test_name() {
        assert_eq!(YdotoolExecutor::new().name(), "ydotool");
    }
}
