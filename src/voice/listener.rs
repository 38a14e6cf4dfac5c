//! Recognition loop
//!
//! listen → result or error → delay → listen, as one cancellable task.
//! A result is fully handled by the session before the next listen
//! starts, and the restart delay always follows, so recognition never
//! spins in a tight loop. Recognizer errors are retried for as long as the
//! loop runs; only a closed source, "deactivate" or shutdown end it.

use super::Action;
use crate::config::{FeedbackConfig, RecognitionConfig};
use crate::error::RecognitionError;
use crate::notification;
use crate::session::SessionHandle;
use std::time::Duration;
use tokio::io::{AsyncBufRead, AsyncBufReadExt, BufReader, Lines, Stdin};
use tokio::sync::watch;

/// Trait for recognizers that produce transcribed utterances
#[async_trait::async_trait]
pub trait UtteranceSource: Send {
    /// Wait for the next recognition result, best candidate first.
    /// An empty result means the recognizer heard nothing usable.
    async fn listen(&mut self) -> Result<Vec<String>, RecognitionError>;

    /// Human-readable name for logging
    fn name(&self) -> &'static str;
}

/// Reads one result per line. Alternates may follow the top candidate,
/// separated by `|`.
pub struct LineSource<R> {
    lines: Lines<R>,
    name: &'static str,
}

/// Utterances piped in from an external transcriber
pub type StdinSource = LineSource<BufReader<Stdin>>;

impl<R: AsyncBufRead + Unpin + Send> LineSource<R> {
    pub fn new(reader: R, name: &'static str) -> Self {
        Self {
            lines: reader.lines(),
            name,
        }
    }
}

impl LineSource<BufReader<Stdin>> {
    pub fn stdin() -> Self {
        Self::new(BufReader::new(tokio::io::stdin()), "stdin")
    }
}

#[async_trait::async_trait]
impl<R: AsyncBufRead + Unpin + Send> UtteranceSource for LineSource<R> {
    async fn listen(&mut self) -> Result<Vec<String>, RecognitionError> {
        match self.lines.next_line().await {
            Ok(Some(line)) => Ok(line
                .split('|')
                .map(str::trim)
                .filter(|candidate| !candidate.is_empty())
                .map(String::from)
                .collect()),
            Ok(None) => Err(RecognitionError::Closed),
            Err(e) => Err(RecognitionError::Failed(e.to_string())),
        }
    }

    fn name(&self) -> &'static str {
        self.name
    }
}

/// Delays between recognition cycles
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct ListenerTiming {
    /// After a result has been handled
    pub restart_delay: Duration,
    /// After a recognizer error
    pub error_retry: Duration,
    /// After the recognizer reported it is unavailable
    pub unavailable_retry: Duration,
}

impl Default for ListenerTiming {
    fn default() -> Self {
        Self {
            restart_delay: Duration::from_millis(400),
            error_retry: Duration::from_millis(800),
            unavailable_retry: Duration::from_millis(5000),
        }
    }
}

impl ListenerTiming {
    pub fn from_config(config: &RecognitionConfig) -> Self {
        Self {
            restart_delay: Duration::from_millis(config.restart_delay_ms),
            error_retry: Duration::from_millis(config.error_retry_ms),
            unavailable_retry: Duration::from_millis(config.unavailable_retry_ms),
        }
    }
}

/// Why the recognition loop stopped
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum ListenExit {
    /// User said "deactivate"
    Deactivated,
    /// The source has no more utterances
    SourceClosed,
    /// Shutdown was signalled
    Shutdown,
    /// The session task is gone
    SessionClosed,
}

/// Run the recognition loop until it is told to stop
pub async fn run_listener(
    source: &mut dyn UtteranceSource,
    session: &SessionHandle,
    timing: ListenerTiming,
    feedback: &FeedbackConfig,
    mut shutdown: watch::Receiver<bool>,
) -> ListenExit {
    tracing::info!("Listening for commands from {}", source.name());

    loop {
        let heard = tokio::select! {
            biased;
            _ = shutdown.changed() => return ListenExit::Shutdown,
            heard = source.listen() => heard,
        };

        let delay = match heard {
            Ok(candidates) => {
                // Alternates are never consulted
                if let Some(text) = candidates.first() {
                    tracing::info!("Heard: {:?}", text);

                    let outcome = match session.interpret(text.as_str()).await {
                        Ok(outcome) => outcome,
                        Err(e) => {
                            tracing::warn!("{}", e);
                            return ListenExit::SessionClosed;
                        }
                    };

                    match &outcome {
                        Ok(action) => tracing::debug!("{}", action.describe()),
                        Err(e) => tracing::info!("{}", e),
                    }

                    if feedback.notify {
                        notification::command_feedback(text, &outcome, feedback.echo_heard).await;
                    }

                    if outcome == Ok(Action::StopListening) {
                        tracing::info!("Deactivated by voice command");
                        return ListenExit::Deactivated;
                    }
                }
                timing.restart_delay
            }
            Err(RecognitionError::Closed) => {
                tracing::info!("{} closed", source.name());
                return ListenExit::SourceClosed;
            }
            Err(RecognitionError::Unavailable(msg)) => {
                tracing::warn!(
                    "Recognizer unavailable ({}), retrying in {}ms",
                    msg,
                    timing.unavailable_retry.as_millis()
                );
                timing.unavailable_retry
            }
            Err(e) => {
                tracing::warn!("{}, retrying in {}ms", e, timing.error_retry.as_millis());
                timing.error_retry
            }
        };

        tokio::select! {
            biased;
            _ = shutdown.changed() => return ListenExit::Shutdown,
            _ = tokio::time::sleep(delay) => {}
        }
    }
}
