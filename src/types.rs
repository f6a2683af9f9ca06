//! Core data types for the frameflow pipeline
//!
//! This module contains the fundamental data structures shared between the
//! producer, consumer, and processing units.
//!
//! # Main Types
//!
//! - [`FrameState`] - Lifecycle state of a frame (created, processing, dropped, ...)
//! - [`Frame`] - One unit of work: id, timestamp, opaque payload, and live state
//! - [`CounterSnapshot`] - Point-in-time copy of the pipeline counters
//!
//! # Frame Lifecycle
//!
//! A frame's state only moves forward. The producer side owns the
//! `Created -> {Processing | Dropped | Skipped | Rejected}` transitions and a
//! processing unit owns `Processing -> {Processed | Aborted}`. No other entity
//! mutates the state.
//!
//! Frames are shared as `Arc<Frame>` between the pending handoff stack, the
//! view buffer, and the processing units, so diagnostic readers observe state
//! transitions live. The state itself is an atomic so a processing unit can
//! advance it without any lock.

use chrono::{DateTime, Local};
use serde_json::Value;
use std::sync::atomic::{AtomicU8, Ordering};

/// Lifecycle state of a frame
#[derive(Debug, Clone, Copy, PartialEq, Eq, Default)]
#[repr(u8)]
pub enum FrameState {
    /// Constructor default state
    #[default]
    Unknown = 0,
    /// Data is created by the producer
    Created = 1,
    /// A processing unit started working on the frame
    Processing = 2,
    /// A processing unit completed the frame
    Processed = 3,
    /// The producer dropped the frame (no consumer attached)
    Dropped = 4,
    /// The consumer discarded the frame as stale before any processing
    Skipped = 5,
    /// The consumer could not process the frame (parallelism cap reached)
    Rejected = 6,
    /// Processing was cancelled or failed
    Aborted = 7,
}

impl FrameState {
    /// Decode a raw state byte, falling back to `Unknown` for invalid values
    pub fn from_u8(raw: u8) -> Self {
        match raw {
            1 => FrameState::Created,
            2 => FrameState::Processing,
            3 => FrameState::Processed,
            4 => FrameState::Dropped,
            5 => FrameState::Skipped,
            6 => FrameState::Rejected,
            7 => FrameState::Aborted,
            _ => FrameState::Unknown,
        }
    }

    /// True for states a frame can never leave
    pub fn is_terminal(&self) -> bool {
        matches!(
            self,
            FrameState::Processed
                | FrameState::Dropped
                | FrameState::Skipped
                | FrameState::Rejected
                | FrameState::Aborted
        )
    }
}

impl std::fmt::Display for FrameState {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        let name = match self {
            FrameState::Unknown => "unknown",
            FrameState::Created => "created",
            FrameState::Processing => "processing",
            FrameState::Processed => "processed",
            FrameState::Dropped => "dropped",
            FrameState::Skipped => "skipped",
            FrameState::Rejected => "rejected",
            FrameState::Aborted => "aborted",
        };
        write!(f, "{}", name)
    }
}

/// One unit of work handed from the producer to the consumer
///
/// Identity (`id`) and payload are fixed at creation; only the state advances
/// afterwards.
#[derive(Debug)]
pub struct Frame {
    /// Creation instant
    pub timestamp: DateTime<Local>,
    /// Frame number, strictly increasing within one producer lifetime
    pub id: u32,
    /// Opaque payload supplied by the external populator
    pub payload: Value,
    state: AtomicU8,
}

impl Frame {
    /// Create a frame in the given initial state
    pub fn new(id: u32, payload: Value, state: FrameState) -> Self {
        Self {
            timestamp: Local::now(),
            id,
            payload,
            state: AtomicU8::new(state as u8),
        }
    }

    /// Current lifecycle state
    pub fn state(&self) -> FrameState {
        FrameState::from_u8(self.state.load(Ordering::SeqCst))
    }

    /// Advance the lifecycle state
    ///
    /// Callers are the producer side and the processing units only, each
    /// within its owned transitions.
    pub fn set_state(&self, state: FrameState) {
        self.state.store(state as u8, Ordering::SeqCst);
    }

    /// True if processing completed successfully
    pub fn is_processed(&self) -> bool {
        self.state() == FrameState::Processed
    }
}

impl std::fmt::Display for Frame {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        write!(
            f,
            "Frame {} : {} : {} : {}",
            self.id,
            self.timestamp.format("%H:%M:%S"),
            self.state(),
            self.payload
        )
    }
}

/// Point-in-time copy of the pipeline counters
///
/// Producer counters reset when the producer is (re)created, consumer counters
/// when the consumer is (re)created. All values are monotonic in between.
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq)]
pub struct CounterSnapshot {
    /// Total frames produced
    pub produced: u64,
    /// Frames dropped by the producer because no consumer was attached
    pub produced_dropped: u64,
    /// Frames currently handed off and not dropped
    pub produced_valid: u64,
    /// Total frames taken off the pending structure by the consumer
    pub consumed: u64,
    /// Frames that completed processing successfully
    pub consumed_valid: u64,
    /// Frames the consumer could not process (cap reached or cancelled)
    pub consumed_rejected: u64,
    /// Stale frames discarded by the consumer without processing
    pub consumed_skipped: u64,
}

impl std::fmt::Display for CounterSnapshot {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        write!(
            f,
            "produced={} dropped={} valid={} consumed={} ok={} rejected={} skipped={}",
            self.produced,
            self.produced_dropped,
            self.produced_valid,
            self.consumed,
            self.consumed_valid,
            self.consumed_rejected,
            self.consumed_skipped
        )
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use serde_json::json;

    #[test]
    fn test_frame_state_roundtrip() {
        for state in [
            FrameState::Unknown,
            FrameState::Created,
            FrameState::Processing,
            FrameState::Processed,
            FrameState::Dropped,
            FrameState::Skipped,
            FrameState::Rejected,
            FrameState::Aborted,
        ] {
            assert_eq!(FrameState::from_u8(state as u8), state);
        }
        assert_eq!(FrameState::from_u8(200), FrameState::Unknown);
    }

    #[test]
    fn test_terminal_states() {
        assert!(!FrameState::Created.is_terminal());
        assert!(!FrameState::Processing.is_terminal());
        assert!(FrameState::Processed.is_terminal());
        assert!(FrameState::Dropped.is_terminal());
        assert!(FrameState::Skipped.is_terminal());
        assert!(FrameState::Rejected.is_terminal());
        assert!(FrameState::Aborted.is_terminal());
    }

    #[test]
    fn test_frame_state_transition() {
        let frame = Frame::new(1, json!({"value": 42}), FrameState::Created);
        assert_eq!(frame.state(), FrameState::Created);
        assert!(!frame.is_processed());

        frame.set_state(FrameState::Processing);
        frame.set_state(FrameState::Processed);
        assert!(frame.is_processed());
    }

    #[test]
    fn test_frame_display() {
        let frame = Frame::new(3, json!("hello"), FrameState::Created);
        let text = frame.to_string();
        assert!(text.starts_with("Frame 3 : "));
        assert!(text.contains("created"));
        assert!(text.contains("hello"));
    }
}
