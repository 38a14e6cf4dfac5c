//! Timed gesture dispatch
//!
//! Turns "tap these markers" into a schedule of single presses on one
//! timeline and feeds them to the executor one at a time. Taps are
//! staggered rather than simultaneous: hosts generally accept only one
//! active gesture stream, so at most one press is ever in flight.
//!
//! Timeline for `TapAll` with markers m0..mN:
//!
//! ```text
//!   m0 ──┬── m1 ──┬── m2 ...
//!   0    │  d     │  2d          d = inter_point_delay
//! ```
//!
//! `DoubleTapAll` presses every marker twice, `double_tap_gap` apart,
//! with groups `inter_point_group_delay` apart.
//!
//! Dispatch calls made while a batch is running queue behind it. When the
//! dispatcher shuts down, every tap that has not fired yet is skipped.

use super::{GestureExecutor, GestureOutcome};
use crate::config::GestureConfig;
use crate::error::GestureError;
use crate::marker::Marker;
use std::sync::Arc;
use std::time::Duration;
use tokio::sync::{mpsc, oneshot, watch};
use tokio::task::JoinHandle;
use tokio::time::Instant;

/// Delays used when building a schedule
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct Timing {
    /// Spacing between markers for single taps
    pub inter_point_delay: Duration,
    /// Spacing between markers for double taps
    pub inter_point_group_delay: Duration,
    /// Spacing between the two presses of a double tap
    pub double_tap_gap: Duration,
    /// How long each press is held
    pub tap_duration: Duration,
}

impl Default for Timing {
    fn default() -> Self {
        Self {
            inter_point_delay: Duration::from_millis(120),
            inter_point_group_delay: Duration::from_millis(220),
            double_tap_gap: Duration::from_millis(110),
            tap_duration: Duration::from_millis(60),
        }
    }
}

impl Timing {
    pub fn from_config(config: &GestureConfig) -> Self {
        Self {
            inter_point_delay: Duration::from_millis(config.inter_point_delay_ms),
            inter_point_group_delay: Duration::from_millis(config.inter_point_group_delay_ms),
            double_tap_gap: Duration::from_millis(config.double_tap_gap_ms),
            tap_duration: Duration::from_millis(config.tap_duration_ms),
        }
    }
}

/// Single or double tap
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum GestureKind {
    Tap,
    DoubleTap,
}

impl std::fmt::Display for GestureKind {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        match self {
            GestureKind::Tap => write!(f, "tap"),
            GestureKind::DoubleTap => write!(f, "double tap"),
        }
    }
}

/// A composite gesture over one or more markers
#[derive(Debug, Clone, PartialEq)]
pub enum Gesture {
    TapAll(Vec<Marker>),
    DoubleTapAll(Vec<Marker>),
    TapOne(Marker),
    DoubleTapOne(Marker),
}

impl Gesture {
    pub fn kind(&self) -> GestureKind {
        match self {
            Gesture::TapAll(_) | Gesture::TapOne(_) => GestureKind::Tap,
            Gesture::DoubleTapAll(_) | Gesture::DoubleTapOne(_) => GestureKind::DoubleTap,
        }
    }

    /// Markers in the order they are pressed
    pub fn targets(&self) -> &[Marker] {
        match self {
            Gesture::TapAll(markers) | Gesture::DoubleTapAll(markers) => markers,
            Gesture::TapOne(marker) | Gesture::DoubleTapOne(marker) => std::slice::from_ref(marker),
        }
    }

    /// Build the press schedule, ordered by offset
    pub fn plan(&self, timing: &Timing) -> Vec<ScheduledTap> {
        let mut taps = Vec::new();

        for (i, marker) in self.targets().iter().enumerate() {
            let i = i as u32;
            match self.kind() {
                GestureKind::Tap => {
                    taps.push(ScheduledTap::new(
                        timing.inter_point_delay.saturating_mul(i),
                        marker,
                    ));
                }
                GestureKind::DoubleTap => {
                    let base = timing.inter_point_group_delay.saturating_mul(i);
                    taps.push(ScheduledTap::new(base, marker));
                    taps.push(ScheduledTap::new(
                        base.saturating_add(timing.double_tap_gap),
                        marker,
                    ));
                }
            }
        }

        // Stable: presses sharing an offset keep marker order
        taps.sort_by_key(|tap| tap.offset);
        taps
    }
}

/// One press at an offset from the start of its batch
#[derive(Debug, Clone, Copy, PartialEq)]
pub struct ScheduledTap {
    pub offset: Duration,
    pub marker_id: u32,
    pub x: f32,
    pub y: f32,
}

impl ScheduledTap {
    fn new(offset: Duration, marker: &Marker) -> Self {
        Self {
            offset,
            marker_id: marker.id,
            x: marker.x,
            y: marker.y,
        }
    }
}

/// Terminal outcome of a scheduled press
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum TapOutcome {
    Completed,
    /// Host cancelled the press; never retried
    Cancelled,
    Failed(String),
    /// Never fired because the session ended first
    Skipped,
}

/// Outcomes of every press in a batch, in schedule order
#[derive(Debug, Clone, PartialEq)]
pub struct DispatchReport {
    pub kind: GestureKind,
    pub outcomes: Vec<(ScheduledTap, TapOutcome)>,
}

impl DispatchReport {
    pub fn count(&self, outcome: &TapOutcome) -> usize {
        self.outcomes.iter().filter(|(_, o)| o == outcome).count()
    }

    pub fn completed(&self) -> usize {
        self.count(&TapOutcome::Completed)
    }

    pub fn all_completed(&self) -> bool {
        self.completed() == self.outcomes.len()
    }
}

/// Handle to an accepted batch
#[derive(Debug)]
pub struct Dispatched {
    pub kind: GestureKind,
    pub schedule: Vec<ScheduledTap>,
    report: oneshot::Receiver<DispatchReport>,
}

impl Dispatched {
    pub fn taps(&self) -> usize {
        self.schedule.len()
    }

    /// Wait for every press in the batch to finish or be skipped
    pub async fn finished(self) -> Option<DispatchReport> {
        self.report.await.ok()
    }
}

struct Batch {
    kind: GestureKind,
    taps: Vec<ScheduledTap>,
    reply: oneshot::Sender<DispatchReport>,
}

/// Serializes gesture batches onto a single executor
pub struct GestureDispatcher {
    executor: Arc<dyn GestureExecutor>,
    timing: Timing,
    queue: mpsc::UnboundedSender<Batch>,
    shutdown: watch::Sender<bool>,
    worker: Option<JoinHandle<()>>,
}

impl GestureDispatcher {
    /// Create a dispatcher and start its worker on the current runtime
    pub fn new(executor: Arc<dyn GestureExecutor>, timing: Timing) -> Self {
        let (queue, queue_rx) = mpsc::unbounded_channel();
        let (shutdown, shutdown_rx) = watch::channel(false);
        let worker = tokio::spawn(run_worker(
            executor.clone(),
            timing.tap_duration,
            queue_rx,
            shutdown_rx,
        ));

        Self {
            executor,
            timing,
            queue,
            shutdown,
            worker: Some(worker),
        }
    }

    pub fn timing(&self) -> &Timing {
        &self.timing
    }

    pub fn executor_name(&self) -> &'static str {
        self.executor.name()
    }

    pub fn is_shut_down(&self) -> bool {
        *self.shutdown.borrow()
    }

    /// Schedule a gesture. Nothing is queued if the executor is unavailable.
    pub async fn dispatch(&self, gesture: Gesture) -> Result<Dispatched, GestureError> {
        if self.is_shut_down() {
            return Err(GestureError::DispatcherStopped);
        }

        if !self.executor.is_available().await {
            tracing::warn!(
                "{} not available, dropping {} on {} markers",
                self.executor.name(),
                gesture.kind(),
                gesture.targets().len()
            );
            return Err(GestureError::ExecutionUnavailable);
        }

        let kind = gesture.kind();
        let schedule = gesture.plan(&self.timing);
        let (reply, report) = oneshot::channel();

        self.queue
            .send(Batch {
                kind,
                taps: schedule.clone(),
                reply,
            })
            .map_err(|_| GestureError::DispatcherStopped)?;

        tracing::debug!(
            "Scheduled {} x{} over {}ms",
            kind,
            schedule.len(),
            schedule.last().map(|t| t.offset.as_millis()).unwrap_or(0)
        );

        Ok(Dispatched {
            kind,
            schedule,
            report,
        })
    }

    /// Stop the worker; pending taps are skipped, never fired
    pub async fn shutdown(&mut self) {
        self.shutdown.send_replace(true);

        if let Some(worker) = self.worker.take() {
            if let Err(e) = worker.await {
                tracing::warn!("Gesture worker ended abnormally: {}", e);
            }
        }
    }
}

async fn run_worker(
    executor: Arc<dyn GestureExecutor>,
    tap_duration: Duration,
    mut queue: mpsc::UnboundedReceiver<Batch>,
    mut shutdown: watch::Receiver<bool>,
) {
    loop {
        let batch = tokio::select! {
            biased;
            _ = shutdown.changed() => break,
            batch = queue.recv() => match batch {
                Some(batch) => batch,
                None => break,
            },
        };

        if run_batch(executor.as_ref(), tap_duration, batch, &mut shutdown).await {
            break;
        }
    }

    queue.close();
    while let Ok(batch) = queue.try_recv() {
        let outcomes = batch
            .taps
            .into_iter()
            .map(|tap| (tap, TapOutcome::Skipped))
            .collect();
        let _ = batch.reply.send(DispatchReport {
            kind: batch.kind,
            outcomes,
        });
    }

    tracing::debug!("Gesture dispatcher stopped");
}

/// Run one batch; returns true if shutdown interrupted it
async fn run_batch(
    executor: &dyn GestureExecutor,
    tap_duration: Duration,
    batch: Batch,
    shutdown: &mut watch::Receiver<bool>,
) -> bool {
    let Batch { kind, taps, reply } = batch;
    let started = Instant::now();
    let duration_ms = tap_duration.as_millis() as u64;
    let mut outcomes = Vec::with_capacity(taps.len());
    let mut stopped = false;

    for tap in taps {
        if !stopped {
            tokio::select! {
                biased;
                _ = shutdown.changed() => stopped = true,
                _ = tokio::time::sleep(tap.offset.saturating_sub(started.elapsed())) => {}
            }
        }

        if stopped {
            outcomes.push((tap, TapOutcome::Skipped));
            continue;
        }

        tracing::info!(
            "Tapping marker {} at ({:.0}, {:.0})",
            tap.marker_id,
            tap.x,
            tap.y
        );

        let outcome = match executor.execute(tap.x, tap.y, duration_ms).await {
            Ok(GestureOutcome::Completed) => TapOutcome::Completed,
            Ok(GestureOutcome::Cancelled) => {
                tracing::warn!("Tap on marker {} cancelled by host", tap.marker_id);
                TapOutcome::Cancelled
            }
            Err(e) => {
                tracing::warn!("Tap on marker {} failed: {}", tap.marker_id, e);
                TapOutcome::Failed(e.to_string())
            }
        };
        outcomes.push((tap, outcome));
    }

    if stopped {
        tracing::info!("Session ended, skipped remaining {} presses", kind);
    }

    let _ = reply.send(DispatchReport { kind, outcomes });
    stopped
}
