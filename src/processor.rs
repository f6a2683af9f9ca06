//! Frame processing unit
//!
//! A [`FrameProcessor`] simulates the variable-latency processing of one
//! frame. The simulated load is a sleep of `minimum_sleep + uniform(0,1) *
//! max_random_sleep`, executed in fixed slices so a cancellation request is
//! observed within one slice.
//!
//! Each unit is independent: nothing is shared across units beyond the
//! read-only sleep configuration. The frame is always returned with its final
//! state; cancellation is reported through the frame state (`Aborted`), never
//! propagated as an error. Start and end observers fire around the work, the
//! end observer exactly once on every path.

use crate::types::{Frame, FrameState};
use crate::worker::CancelToken;
use rand::Rng;
use std::sync::Arc;
use std::time::Duration;

/// Granularity of the cancellable sleep
pub const SLEEP_SLICE: Duration = Duration::from_millis(100);

/// Diagnostic observer invoked around a unit's work
pub type ProcessingObserver = Arc<dyn Fn(&Arc<Frame>) + Send + Sync>;

/// Simulates one frame's processing, cooperatively cancellable
pub struct FrameProcessor {
    minimum_sleep: Duration,
    max_random_sleep: Duration,
    /// Identifier for log correlation, unique per unit
    processing_id: i64,
    on_start: Vec<ProcessingObserver>,
    on_end: Vec<ProcessingObserver>,
}

impl FrameProcessor {
    /// Create a processor with the given simulated-latency shape
    pub fn new(minimum_sleep: Duration, max_random_sleep: Duration) -> Self {
        Self {
            minimum_sleep,
            max_random_sleep,
            processing_id: chrono::Local::now().timestamp_micros(),
            on_start: Vec::new(),
            on_end: Vec::new(),
        }
    }

    /// Register an observer fired before the work starts
    pub fn with_start_observer(mut self, observer: ProcessingObserver) -> Self {
        self.on_start.push(observer);
        self
    }

    /// Register an observer fired after the work ends, on every path
    pub fn with_end_observer(mut self, observer: ProcessingObserver) -> Self {
        self.on_end.push(observer);
        self
    }

    /// Process one frame, observing the cancellation token between slices
    ///
    /// On completion the frame is `Processed`; if cancellation was requested
    /// it is `Aborted`. The frame is returned in both cases.
    pub fn process(&self, frame: Arc<Frame>, cancel: &CancelToken) -> Arc<Frame> {
        tracing::info!("{} : start processing {}", self.processing_id, frame);
        for observer in &self.on_start {
            observer(&frame);
        }

        frame.set_state(FrameState::Processing);
        self.run_simulated_load(&frame, cancel);

        for observer in &self.on_end {
            observer(&frame);
        }
        frame
    }

    /// The sliced sleep with cooperative cancellation
    fn run_simulated_load(&self, frame: &Arc<Frame>, cancel: &CancelToken) {
        let sleep = self.minimum_sleep
            + self.max_random_sleep.mul_f64(rand::thread_rng().gen::<f64>());
        tracing::info!("{} : sleep for {} ms", self.processing_id, sleep.as_millis());

        let mut remaining = sleep;
        loop {
            if cancel.is_cancelled() {
                frame.set_state(FrameState::Aborted);
                tracing::warn!(
                    "{} : frame {} processing cancelled",
                    self.processing_id,
                    frame.id
                );
                return;
            }
            if remaining.is_zero() {
                break;
            }
            let slice = remaining.min(SLEEP_SLICE);
            std::thread::sleep(slice);
            remaining -= slice;
        }

        frame.set_state(FrameState::Processed);
        tracing::info!(
            "{} : frame {} processing completed",
            self.processing_id,
            frame.id
        );
    }
}
