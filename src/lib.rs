//! # FrameFlow-RS: producer/consumer frame pipeline
//!
//! A producer/consumer coordination core that hands discrete units of work
//! ("frames") from a periodic producer thread to a trigger-driven consumer
//! thread, with bounded-parallelism cancellable processing and explicit
//! accounting of every dropped, skipped, or rejected frame.
//!
//! ## Architecture
//!
//! - **Worker**: a generic signal-multiplexing worker thread blocking on a
//!   prioritized wait over quit/trigger/timeout signals (crossbeam channels)
//! - **Generator**: the orchestrator wiring a timer-driven producer and a
//!   trigger-driven consumer around a LIFO latest-wins handoff stack
//! - **Processor**: the per-frame processing unit simulating variable-latency
//!   work in cancellation-checked slices
//! - **Types**: the frame model with its forward-only lifecycle state and the
//!   pipeline counters
//!
//! The graphical shell, the log backend, and the application wiring are
//! external collaborators: the core only consumes a payload-population
//! callback, diagnostic observers, and exposes read-only snapshots.
//!
//! ## Example
//!
//! ```ignore
//! use frameflow_rs::{DataGenerator, GeneratorConfig};
//! use serde_json::json;
//!
//! fn main() -> anyhow::Result<()> {
//!     let generator = DataGenerator::new(GeneratorConfig::default())
//!         .with_payload_populator(|id| Ok(json!({ "sample": id })));
//!
//!     generator.start()?;     // producer begins ticking
//!     generator.get_data()?;  // consumer begins reacting to handoffs
//!
//!     std::thread::sleep(std::time::Duration::from_secs(5));
//!     for frame in generator.view_frames() {
//!         println!("{}", frame);
//!     }
//!     println!("{}", generator.counters());
//!
//!     generator.stop();
//!     Ok(())
//! }
//! ```

pub mod config;
pub mod error;
pub mod generator;
pub mod processor;
pub mod types;
pub mod worker;

// Re-export commonly used types
pub use config::GeneratorConfig;
pub use error::{FrameFlowError, Result};
pub use generator::{DataGenerator, PayloadPopulator};
pub use processor::{FrameProcessor, ProcessingObserver};
pub use types::{CounterSnapshot, Frame, FrameState};
pub use worker::{CancelToken, SignalContext, SignalKind, SignalWorker, WorkerHooks};
