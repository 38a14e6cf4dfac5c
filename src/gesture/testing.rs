//! Recording executor for unit tests

use super::{GestureExecutor, GestureOutcome};
use crate::error::GestureError;
use std::sync::atomic::{AtomicBool, AtomicUsize, Ordering};
use std::sync::{Arc, Mutex};
use std::time::Duration;
use tokio::time::Instant;

/// Press start (relative to creation), x, y
pub(crate) type Call = (Duration, f32, f32);

#[derive(Clone)]
pub(crate) struct RecordingExecutor {
    origin: Instant,
    calls: Arc<Mutex<Vec<Call>>>,
    available: Arc<AtomicBool>,
    in_flight: Arc<AtomicUsize>,
    max_in_flight: Arc<AtomicUsize>,
    press_time: Arc<Mutex<Duration>>,
    outcome: Arc<Mutex<GestureOutcome>>,
}

impl RecordingExecutor {
    pub(crate) fn new() -> Self {
        Self {
            origin: Instant::now(),
            calls: Arc::default(),
            available: Arc::new(AtomicBool::new(true)),
            in_flight: Arc::default(),
            max_in_flight: Arc::default(),
            press_time: Arc::new(Mutex::new(Duration::ZERO)),
            outcome: Arc::new(Mutex::new(GestureOutcome::Completed)),
        }
    }

    pub(crate) fn shared(&self) -> Arc<dyn GestureExecutor> {
        Arc::new(self.clone())
    }

    pub(crate) fn set_available(&self, available: bool) {
        self.available.store(available, Ordering::SeqCst);
    }

    pub(crate) fn set_press_time(&self, time: Duration) {
        *self.press_time.lock().unwrap() = time;
    }

    pub(crate) fn set_outcome(&self, outcome: GestureOutcome) {
        *self.outcome.lock().unwrap() = outcome;
    }

    pub(crate) fn calls(&self) -> Vec<Call> {
        self.calls.lock().unwrap().clone()
    }

    pub(crate) fn max_in_flight(&self) -> usize {
        self.max_in_flight.load(Ordering::SeqCst)
    }
}

#[async_trait::async_trait]
impl GestureExecutor for RecordingExecutor {
    async fn is_available(&self) -> bool {
        self.available.load(Ordering::SeqCst)
    }

    async fn execute(
        &self,
        x: f32,
        y: f32,
        _duration_ms: u64,
    ) -> Result<GestureOutcome, GestureError> {
        let now = self.in_flight.fetch_add(1, Ordering::SeqCst) + 1;
        self.max_in_flight.fetch_max(now, Ordering::SeqCst);
        self.calls
            .lock()
            .unwrap()
            .push((self.origin.elapsed(), x, y));

        let press_time = *self.press_time.lock().unwrap();
        if !press_time.is_zero() {
            tokio::time::sleep(press_time).await;
        }

        self.in_flight.fetch_sub(1, Ordering::SeqCst);
        Ok(*self.outcome.lock().unwrap())
    }

    fn name(&self) -> &'static str {
        "recording"
    }
}
