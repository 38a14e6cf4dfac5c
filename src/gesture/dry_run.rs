//! Dry-run gesture backend
//!
//! Logs every tap and reports it completed. Useful for rehearsing a
//! marker layout or running without uinput access.

use super::{GestureExecutor, GestureOutcome};
use crate::error::GestureError;

#[derive(Debug, Default)]
pub struct DryRunExecutor;

impl DryRunExecutor {
    pub fn new() -> Self {
        Self
    }
}

#[async_trait::async_trait]
impl GestureExecutor for DryRunExecutor {
    async fn is_available(&self) -> bool {
        true
    }

    async fn execute(
        &self,
        x: f32,
        y: f32,
        duration_ms: u64,
    ) -> Result<GestureOutcome, GestureError> {
        tracing::info!("[dry-run] tap at ({:.0}, {:.0}) for {}ms", x, y, duration_ms);
        Ok(GestureOutcome::Completed)
    }

    fn name(&self) -> &'static str {
        "dry-run"
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[tokio::test]
    async fn test_always_completes() {
        let executor = DryRunExecutor::new();
        assert!(executor.is_available().await);
        assert_eq!(
            executor.execute(1.0, 2.0, 60).await,
            Ok(GestureOutcome::Completed)
        );
    }
}
