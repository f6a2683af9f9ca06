//! Producer/consumer orchestrator
//!
//! This module wires two [`SignalWorker`] instances into a bounded-staleness
//! handoff pipeline:
//!
//! - The **producer** worker fires on its wakeup interval, creates a frame,
//!   asks the payload populator to fill it, and hands it to the consumer side
//!   through a LIFO pending stack under the handoff lock.
//! - The **consumer** worker is purely trigger-driven. Each trigger pops the
//!   newest pending frame (latest wins), explicitly skips everything staler
//!   beneath it, and spawns a cancellable [`FrameProcessor`] unit unless the
//!   in-flight cap is reached, in which case the frame is rejected.
//!
//! Every drop, skip and rejection is counted; nothing is lost silently.
//!
//! # Locking
//!
//! Two independent critical sections: the handoff mutex guards the pending
//! stack together with the consumer-attached flag, and a finer counters mutex
//! guards the statistics. Lock order is handoff -> in-flight set -> counters;
//! the counters lock is only ever taken innermost and never held across the
//! coarser sections. Teardown detaches the consumer under the handoff lock
//! but joins threads and processing units outside of it.

use crate::config::GeneratorConfig;
use crate::error::{Result, ResultExt};
use crate::processor::{FrameProcessor, ProcessingObserver};
use crate::types::{CounterSnapshot, Frame, FrameState};
use crate::worker::{SignalContext, SignalKind, SignalWorker, WorkerHooks};
use serde_json::Value;
use std::collections::VecDeque;
use std::sync::atomic::{AtomicU32, Ordering};
use std::sync::{Arc, Mutex, PoisonError, RwLock};
use std::thread::JoinHandle;

/// Collaborator callback that fills a frame's payload at creation time
///
/// Invoked synchronously on the producer thread right after frame allocation,
/// so it must return quickly. A failure aborts only the current tick.
pub type PayloadPopulator = Arc<dyn Fn(u32) -> Result<Value> + Send + Sync>;

/// Pending frames plus the consumer attachment flag, one critical section
#[derive(Default)]
struct HandoffState {
    /// LIFO stack; the newest frame sits on top
    pending: Vec<Arc<Frame>>,
    /// Whether a consumer activation is currently attached
    consumer_attached: bool,
}

/// State shared between the two worker threads and the processing units
struct GeneratorInner {
    config: GeneratorConfig,
    producer: SignalWorker,
    consumer: SignalWorker,
    handoff: Mutex<HandoffState>,
    counters: Mutex<CounterSnapshot>,
    /// Diagnostic buffer of the most recent frames, arrival order
    view: RwLock<VecDeque<Arc<Frame>>>,
    /// Currently executing processing units
    inflight: Mutex<Vec<JoinHandle<Arc<Frame>>>>,
    next_frame_id: AtomicU32,
    payload_populator: Mutex<Option<PayloadPopulator>>,
    on_processing_start: Mutex<Vec<ProcessingObserver>>,
    on_processing_end: Mutex<Vec<ProcessingObserver>>,
}

impl GeneratorInner {
    fn lock_handoff(&self) -> std::sync::MutexGuard<'_, HandoffState> {
        self.handoff.lock().unwrap_or_else(PoisonError::into_inner)
    }

    fn lock_counters(&self) -> std::sync::MutexGuard<'_, CounterSnapshot> {
        self.counters.lock().unwrap_or_else(PoisonError::into_inner)
    }

    fn lock_inflight(&self) -> std::sync::MutexGuard<'_, Vec<JoinHandle<Arc<Frame>>>> {
        self.inflight.lock().unwrap_or_else(PoisonError::into_inner)
    }

    /// One producer tick: allocate, populate, publish, hand off
    fn producer_tick(&self) -> Result<()> {
        let id = self.next_frame_id.fetch_add(1, Ordering::SeqCst) + 1;

        let populator = self
            .payload_populator
            .lock()
            .unwrap_or_else(PoisonError::into_inner)
            .clone();
        let payload = match populator {
            Some(populate) => match populate(id) {
                Ok(value) => value,
                Err(e) => {
                    // The failing tick degrades to a no-op: no counters, no handoff.
                    tracing::error!("Producer : payload population failed for frame {} : {}", id, e);
                    return Ok(());
                }
            },
            None => Value::Null,
        };

        let frame = Arc::new(Frame::new(id, payload, FrameState::Created));
        tracing::info!("Producer : producing data '{}'", frame);

        self.lock_counters().produced += 1;

        {
            let mut view = self.view.write().unwrap_or_else(PoisonError::into_inner);
            while view.len() >= self.config.max_queue_view_size && view.pop_front().is_some() {}
            view.push_back(Arc::clone(&frame));
        }

        let mut handoff = self.lock_handoff();
        if handoff.consumer_attached && self.consumer.initialized() {
            handoff.pending.push(frame);
            self.lock_counters().produced_valid += 1;
            self.consumer.signal();
        } else {
            // Unattended: collapse the stack to the single newest frame.
            for stale in handoff.pending.drain(..) {
                stale.set_state(FrameState::Dropped);
                tracing::warn!(
                    "Producer : missing consumer : dropping frame {}",
                    stale.id
                );
                let mut counters = self.lock_counters();
                counters.produced_valid = counters.produced_valid.saturating_sub(1);
                counters.produced_dropped += 1;
            }
            handoff.pending.push(frame);
            self.lock_counters().produced_valid += 1;
        }
        Ok(())
    }

    /// Pop the newest pending frame, explicitly skipping everything beneath it
    ///
    /// Must be called with the handoff lock held.
    fn take_latest_frame(&self, handoff: &mut HandoffState) -> Option<Arc<Frame>> {
        let frame = match handoff.pending.pop() {
            Some(frame) => frame,
            None => {
                if self.producer.initialized() {
                    tracing::warn!("Consumer : signaling rate too high, but no frames are lost");
                }
                return None;
            }
        };
        for stale in handoff.pending.drain(..) {
            stale.set_state(FrameState::Skipped);
            tracing::warn!("Consumer : frame too old : skipping frame {}", stale.id);
            let mut counters = self.lock_counters();
            counters.consumed += 1;
            counters.consumed_skipped += 1;
        }
        Some(frame)
    }

    /// One consumer trigger: reap finished units, pop the latest frame, spawn
    fn consumer_trigger(self: &Arc<Self>, ctx: &SignalContext) -> Result<()> {
        {
            let mut inflight = self.lock_inflight();
            let handles = std::mem::take(&mut *inflight);
            for handle in handles {
                if handle.is_finished() {
                    let _ = handle.join();
                } else {
                    inflight.push(handle);
                }
            }
            tracing::info!("Consumer : task count = {}", inflight.len());
        }

        let mut handoff = self.lock_handoff();
        let frame = match self.take_latest_frame(&mut handoff) {
            Some(frame) => frame,
            None => return Ok(()),
        };

        let mut inflight = self.lock_inflight();
        if inflight.len() >= self.config.effective_parallelism() {
            tracing::error!("Consumer : can't process frame {}", frame.id);
            frame.set_state(FrameState::Rejected);
            let mut counters = self.lock_counters();
            counters.consumed += 1;
            counters.consumed_rejected += 1;
            return Ok(());
        }

        let processor = self.build_processor(&ctx.cancel);
        let cancel = ctx.cancel.clone();
        inflight.push(std::thread::spawn(move || processor.process(frame, &cancel)));
        Ok(())
    }

    /// Assemble a processing unit with the external observers plus the
    /// counting end-observer for this activation
    fn build_processor(self: &Arc<Self>, cancel: &crate::worker::CancelToken) -> FrameProcessor {
        let mut processor = FrameProcessor::new(
            self.config.processor_minimum_sleep(),
            self.config.processor_max_random_sleep(),
        );
        for observer in self
            .on_processing_start
            .lock()
            .unwrap_or_else(PoisonError::into_inner)
            .iter()
        {
            processor = processor.with_start_observer(Arc::clone(observer));
        }
        for observer in self
            .on_processing_end
            .lock()
            .unwrap_or_else(PoisonError::into_inner)
            .iter()
        {
            processor = processor.with_end_observer(Arc::clone(observer));
        }

        let counting = Arc::clone(self);
        let token = cancel.clone();
        processor.with_end_observer(Arc::new(move |frame: &Arc<Frame>| {
            let mut counters = counting.lock_counters();
            counters.consumed += 1;
            if !token.is_cancelled() && frame.is_processed() {
                counters.consumed_valid += 1;
            } else {
                counters.consumed_rejected += 1;
            }
        }))
    }

    /// Hooks driving a consumer activation
    fn consumer_hooks(self: &Arc<Self>) -> WorkerHooks {
        let inner = Arc::clone(self);
        WorkerHooks::new().on_trigger(move |ctx| inner.consumer_trigger(ctx))
    }

    /// Hooks driving a producer activation
    fn producer_hooks(self: &Arc<Self>) -> WorkerHooks {
        let inner = Arc::clone(self);
        WorkerHooks::new().on_timeout(move |_| inner.producer_tick())
    }

    /// Join every outstanding processing unit
    ///
    /// The wait is unbounded; a cancelled unit aborts within one sleep slice,
    /// so after `request_quit` this returns promptly unless a unit is stuck
    /// outside its cancellation checks.
    fn join_inflight(&self) {
        let handles = std::mem::take(&mut *self.lock_inflight());
        for handle in handles {
            let _ = handle.join();
        }
    }
}

/// The producer/consumer frame pipeline
///
/// The producer starts generating frames after [`start`](Self::start). Frames
/// are consumed after [`get_data`](Self::get_data) (fire-and-continue) or
/// [`get_data_once`](Self::get_data_once) (run-once, blocking). A call to
/// [`stop`](Self::stop) tears the whole pipeline down.
///
/// # Example
///
/// ```ignore
/// use frameflow_rs::{DataGenerator, GeneratorConfig};
/// use serde_json::json;
///
/// let generator = DataGenerator::new(GeneratorConfig::default())
///     .with_payload_populator(|id| Ok(json!({ "sample": id })));
/// generator.start()?;
/// generator.get_data()?;
/// // ... observe generator.view_frames() and generator.counters() ...
/// generator.stop();
/// ```
pub struct DataGenerator {
    inner: Arc<GeneratorInner>,
}

impl DataGenerator {
    /// Create a generator with the given configuration
    pub fn new(config: GeneratorConfig) -> Self {
        let producer_timeout = config.producer_timeout_ms;
        Self {
            inner: Arc::new(GeneratorInner {
                config,
                producer: SignalWorker::new("Producer", producer_timeout),
                consumer: SignalWorker::new("Consumer", 0),
                handoff: Mutex::new(HandoffState::default()),
                counters: Mutex::new(CounterSnapshot::default()),
                view: RwLock::new(VecDeque::new()),
                inflight: Mutex::new(Vec::new()),
                next_frame_id: AtomicU32::new(0),
                payload_populator: Mutex::new(None),
                on_processing_start: Mutex::new(Vec::new()),
                on_processing_end: Mutex::new(Vec::new()),
            }),
        }
    }

    /// Register the payload-population collaborator
    pub fn with_payload_populator(
        self,
        populate: impl Fn(u32) -> Result<Value> + Send + Sync + 'static,
    ) -> Self {
        *self
            .inner
            .payload_populator
            .lock()
            .unwrap_or_else(PoisonError::into_inner) = Some(Arc::new(populate));
        self
    }

    /// Register a diagnostic observer fired when a unit starts processing
    pub fn with_processing_start_observer(self, observer: ProcessingObserver) -> Self {
        self.inner
            .on_processing_start
            .lock()
            .unwrap_or_else(PoisonError::into_inner)
            .push(observer);
        self
    }

    /// Register a diagnostic observer fired when a unit finishes, on any path
    pub fn with_processing_end_observer(self, observer: ProcessingObserver) -> Self {
        self.inner
            .on_processing_end
            .lock()
            .unwrap_or_else(PoisonError::into_inner)
            .push(observer);
        self
    }

    /// Start the producer
    ///
    /// (Re)creates the producer side: frame numbering restarts at 1, producer
    /// counters reset, pending stack and view buffer are cleared, and the
    /// timer-driven worker loop begins ticking.
    pub fn start(&self) -> Result<()> {
        self.create_producer();
        self.inner.producer.create();
        self.inner
            .producer
            .start(false, self.inner.producer_hooks())
            .context("Failed to start producer")
    }

    /// Start consuming data, fire-and-continue
    ///
    /// (Re)creates the consumer side: consumer counters reset, a purely
    /// trigger-driven worker loop starts (with the trigger pre-raised) and
    /// runs until [`stop`](Self::stop).
    pub fn get_data(&self) -> Result<()> {
        self.create_consumer();
        // Attach before the loop starts; a tick in between must hand off,
        // not drop.
        self.inner.lock_handoff().consumer_attached = true;
        self.inner
            .consumer
            .start(true, self.inner.consumer_hooks())
            .context("Failed to start consumer")
    }

    /// Consume data with a run-once consumer, blocking the calling thread
    ///
    /// Creates and attaches the consumer, then dispatches wait-any cycles on
    /// the calling thread until a terminal signal (quit or a faulted hook),
    /// and tears the consumer down again. Only the caller blocks.
    pub fn get_data_once(&self) -> Result<()> {
        self.create_consumer();
        {
            let mut handoff = self.inner.lock_handoff();
            handoff.consumer_attached = true;
        }
        let mut hooks = self.inner.consumer_hooks();
        loop {
            match self.inner.consumer.wait_for_signal_once(0, &mut hooks) {
                SignalKind::Quit | SignalKind::Fault => break,
                _ => continue,
            }
        }
        self.destroy_consumer();
        Ok(())
    }

    /// Stop the whole pipeline
    ///
    /// Destroys both worker threads (bounded join) and waits for every
    /// outstanding processing unit to finish. Counters keep their values;
    /// they reset only when the corresponding side is recreated.
    pub fn stop(&self) {
        self.destroy_producer();
        self.destroy_consumer();
    }

    /// Point-in-time snapshot of the view buffer in arrival order
    pub fn view_frames(&self) -> Vec<Arc<Frame>> {
        self.inner
            .view
            .read()
            .unwrap_or_else(PoisonError::into_inner)
            .iter()
            .cloned()
            .collect()
    }

    /// Coherent snapshot of the pipeline counters
    pub fn counters(&self) -> CounterSnapshot {
        *self.inner.lock_counters()
    }

    fn create_producer(&self) {
        self.destroy_producer();
        self.inner.next_frame_id.store(0, Ordering::SeqCst);
        {
            let mut counters = self.inner.lock_counters();
            counters.produced = 0;
            counters.produced_dropped = 0;
            counters.produced_valid = 0;
        }
        self.inner
            .producer
            .set_wakeup_interval(self.inner.config.producer_timeout_ms);
        self.inner.lock_handoff().pending.clear();
        self.inner
            .view
            .write()
            .unwrap_or_else(PoisonError::into_inner)
            .clear();
    }

    fn destroy_producer(&self) {
        self.inner.producer.destroy();
        self.inner.lock_handoff().pending.clear();
        self.inner
            .view
            .write()
            .unwrap_or_else(PoisonError::into_inner)
            .clear();
    }

    fn create_consumer(&self) {
        self.destroy_consumer();
        {
            let mut counters = self.inner.lock_counters();
            counters.consumed = 0;
            counters.consumed_valid = 0;
            counters.consumed_skipped = 0;
            counters.consumed_rejected = 0;
        }
        self.inner.consumer.create();
    }

    fn destroy_consumer(&self) {
        // Detach under the handoff lock, join outside of it.
        {
            let mut handoff = self.inner.lock_handoff();
            handoff.consumer_attached = false;
        }
        self.inner.consumer.destroy();
        self.inner.join_inflight();
    }
}

impl Drop for DataGenerator {
    fn drop(&mut self) {
        self.stop();
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use serde_json::json;
    use std::sync::atomic::AtomicUsize;
    use std::time::Duration;

    /// Generator with instant processing, suitable for direct tick/trigger calls
    fn quick_generator(max_parallelism: usize, view_size: usize) -> DataGenerator {
        DataGenerator::new(GeneratorConfig {
            producer_timeout_ms: 0,
            processor_minimum_sleep_ms: 1,
            processor_max_random_sleep_ms: 0,
            max_parallelism,
            max_queue_view_size: view_size,
        })
        .with_payload_populator(|id| Ok(json!({ "seq": id })))
    }

    fn test_context(generator: &DataGenerator) -> SignalContext {
        SignalContext {
            worker: "Consumer".to_string(),
            cancel: generator.inner.consumer.cancel_token(),
        }
    }

    fn attach_consumer(generator: &DataGenerator) {
        generator.inner.consumer.create();
        generator.inner.lock_handoff().consumer_attached = true;
    }

    #[test]
    fn test_ticks_without_consumer_collapse_pending() {
        let generator = quick_generator(4, 5);

        for tick in 1..=5u64 {
            generator.inner.producer_tick().unwrap();
            assert_eq!(generator.inner.lock_handoff().pending.len(), 1);

            let counters = generator.counters();
            assert_eq!(counters.produced, tick);
            assert_eq!(counters.produced_dropped, tick - 1);
            assert_eq!(counters.produced_valid, 1);
        }
    }

    #[test]
    fn test_tick_during_consumer_activation_hands_off() {
        let generator = quick_generator(4, 5);

        // The consumer is created and attached but its loop has not started
        // yet, the state get_data() goes through mid-activation.
        generator.create_consumer();
        generator.inner.lock_handoff().consumer_attached = true;

        generator.inner.producer_tick().unwrap();

        let counters = generator.counters();
        assert_eq!(counters.produced_dropped, 0);
        assert_eq!(counters.produced_valid, 1);
        assert_eq!(generator.inner.lock_handoff().pending.len(), 1);
    }

    #[test]
    fn test_dropped_frames_are_marked() {
        let generator = quick_generator(4, 5);
        generator.inner.producer_tick().unwrap();
        let first = generator.view_frames()[0].clone();
        generator.inner.producer_tick().unwrap();

        assert_eq!(first.state(), FrameState::Dropped);
    }

    #[test]
    fn test_frame_ids_strictly_increasing_and_restart() {
        let generator = quick_generator(4, 10);
        for _ in 0..3 {
            generator.inner.producer_tick().unwrap();
        }
        let ids: Vec<u32> = generator.view_frames().iter().map(|f| f.id).collect();
        assert_eq!(ids, vec![1, 2, 3]);

        // A fresh producer activation restarts numbering at 1.
        generator.create_producer();
        generator.inner.producer_tick().unwrap();
        assert_eq!(generator.view_frames()[0].id, 1);
        assert_eq!(generator.counters().produced, 1);
    }

    #[test]
    fn test_payload_failure_aborts_tick_only() {
        let failures = Arc::new(AtomicUsize::new(0));
        let failures_populator = Arc::clone(&failures);
        let generator = DataGenerator::new(GeneratorConfig {
            producer_timeout_ms: 0,
            max_queue_view_size: 5,
            ..Default::default()
        })
        .with_payload_populator(move |id| {
            if id == 2 {
                failures_populator.fetch_add(1, Ordering::SeqCst);
                Err(crate::error::FrameFlowError::Payload {
                    frame_id: id,
                    message: "collaborator offline".to_string(),
                })
            } else {
                Ok(json!(id))
            }
        });

        generator.inner.producer_tick().unwrap();
        generator.inner.producer_tick().unwrap(); // fails, no counters advance
        generator.inner.producer_tick().unwrap();

        assert_eq!(failures.load(Ordering::SeqCst), 1);
        let counters = generator.counters();
        assert_eq!(counters.produced, 2);
        // The failing tick still consumed an id.
        let ids: Vec<u32> = generator.view_frames().iter().map(|f| f.id).collect();
        assert_eq!(ids, vec![1, 3]);
    }

    #[test]
    fn test_view_buffer_bounded_in_arrival_order() {
        let generator = quick_generator(4, 3);
        for _ in 0..6 {
            generator.inner.producer_tick().unwrap();
        }
        let ids: Vec<u32> = generator.view_frames().iter().map(|f| f.id).collect();
        assert_eq!(ids, vec![4, 5, 6]);
    }

    #[test]
    fn test_stale_frames_skipped_on_trigger() {
        let generator = quick_generator(4, 10);
        attach_consumer(&generator);

        // Three ticks before the consumer reacts once.
        for _ in 0..3 {
            generator.inner.producer_tick().unwrap();
        }
        let ctx = test_context(&generator);
        generator.inner.consumer_trigger(&ctx).unwrap();
        generator.inner.join_inflight();

        let frames = generator.view_frames();
        assert_eq!(frames[0].state(), FrameState::Skipped);
        assert_eq!(frames[1].state(), FrameState::Skipped);
        assert_eq!(frames[2].state(), FrameState::Processed);

        let counters = generator.counters();
        assert_eq!(counters.consumed, 3);
        assert_eq!(counters.consumed_skipped, 2);
        assert_eq!(counters.consumed_valid, 1);
    }

    #[test]
    fn test_trigger_on_empty_pending_is_a_noop() {
        let generator = quick_generator(4, 10);
        attach_consumer(&generator);

        let ctx = test_context(&generator);
        generator.inner.consumer_trigger(&ctx).unwrap();

        assert_eq!(generator.counters(), CounterSnapshot::default());
    }

    #[test]
    fn test_parallelism_cap_rejects_frame() {
        // Units sleep long enough to still be in flight at the second trigger.
        let generator = DataGenerator::new(GeneratorConfig {
            producer_timeout_ms: 0,
            processor_minimum_sleep_ms: 2000,
            processor_max_random_sleep_ms: 0,
            max_parallelism: 1,
            max_queue_view_size: 10,
        })
        .with_payload_populator(|id| Ok(json!(id)));
        attach_consumer(&generator);
        let ctx = test_context(&generator);

        generator.inner.producer_tick().unwrap();
        generator.inner.consumer_trigger(&ctx).unwrap();

        generator.inner.producer_tick().unwrap();
        generator.inner.consumer_trigger(&ctx).unwrap();

        let frames = generator.view_frames();
        assert_eq!(frames[1].state(), FrameState::Rejected);
        let counters = generator.counters();
        assert_eq!(counters.consumed_rejected, 1);

        // Cancel the in-flight unit so teardown is prompt.
        generator.inner.consumer.request_quit();
        generator.inner.join_inflight();
    }

    #[test]
    fn test_zero_parallelism_still_processes_one() {
        let generator = quick_generator(0, 10);
        attach_consumer(&generator);
        let ctx = test_context(&generator);

        generator.inner.producer_tick().unwrap();
        generator.inner.consumer_trigger(&ctx).unwrap();
        generator.inner.join_inflight();

        assert_eq!(generator.view_frames()[0].state(), FrameState::Processed);
        assert_eq!(generator.counters().consumed_valid, 1);
    }

    #[test]
    fn test_cancelled_unit_counts_as_rejected() {
        let generator = DataGenerator::new(GeneratorConfig {
            producer_timeout_ms: 0,
            processor_minimum_sleep_ms: 5000,
            processor_max_random_sleep_ms: 0,
            max_parallelism: 1,
            max_queue_view_size: 10,
        })
        .with_payload_populator(|id| Ok(json!(id)));
        attach_consumer(&generator);
        let ctx = test_context(&generator);

        generator.inner.producer_tick().unwrap();
        generator.inner.consumer_trigger(&ctx).unwrap();

        std::thread::sleep(Duration::from_millis(50));
        ctx.cancel.cancel();
        generator.inner.join_inflight();

        assert_eq!(generator.view_frames()[0].state(), FrameState::Aborted);
        let counters = generator.counters();
        assert_eq!(counters.consumed, 1);
        assert_eq!(counters.consumed_rejected, 1);
        assert_eq!(counters.consumed_valid, 0);
    }

    #[test]
    fn test_external_end_observer_sees_every_unit() {
        let seen = Arc::new(AtomicUsize::new(0));
        let seen_observer = Arc::clone(&seen);
        let generator = quick_generator(4, 10).with_processing_end_observer(Arc::new(move |_| {
            seen_observer.fetch_add(1, Ordering::SeqCst);
        }));
        attach_consumer(&generator);
        let ctx = test_context(&generator);

        for _ in 0..2 {
            generator.inner.producer_tick().unwrap();
            generator.inner.consumer_trigger(&ctx).unwrap();
        }
        generator.inner.join_inflight();

        assert_eq!(seen.load(Ordering::SeqCst), 2);
    }

    #[test]
    fn test_consumer_counters_reset_on_recreate() {
        let generator = quick_generator(4, 10);
        attach_consumer(&generator);
        let ctx = test_context(&generator);

        generator.inner.producer_tick().unwrap();
        generator.inner.consumer_trigger(&ctx).unwrap();
        generator.inner.join_inflight();
        assert_eq!(generator.counters().consumed, 1);

        generator.create_consumer();
        let counters = generator.counters();
        assert_eq!(counters.consumed, 0);
        assert_eq!(counters.consumed_valid, 0);
        // Producer counters survive a consumer recreation.
        assert_eq!(counters.produced, 1);
    }

    #[test]
    fn test_unused_cancel_token_keeps_units_valid() {
        let generator = quick_generator(2, 10);
        attach_consumer(&generator);
        let ctx = test_context(&generator);

        generator.inner.producer_tick().unwrap();
        generator.inner.consumer_trigger(&ctx).unwrap();
        generator.inner.join_inflight();

        let counters = generator.counters();
        assert_eq!(counters.consumed_valid, 1);
        assert_eq!(counters.consumed_rejected, 0);
    }
}
