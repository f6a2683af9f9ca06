//! FrameFlow demo - headless pipeline driver
//!
//! Runs the producer/consumer pipeline for a fixed duration, printing the
//! view-buffer snapshot and the counters on exit. An optional argument names
//! a TOML configuration file.

use anyhow::Context;
use frameflow_rs::{DataGenerator, GeneratorConfig};
use serde_json::json;
use std::time::Duration;
use tracing_subscriber::{layer::SubscriberExt, util::SubscriberInitExt, EnvFilter};

/// How long the demo keeps the pipeline running
const DEMO_RUNTIME: Duration = Duration::from_secs(10);

fn main() -> anyhow::Result<()> {
    // Console plus a daily log file, like the original tool chain.
    let file_appender = tracing_appender::rolling::daily("logs", "frameflow.log");
    let (file_writer, _guard) = tracing_appender::non_blocking(file_appender);
    tracing_subscriber::registry()
        .with(
            EnvFilter::try_from_default_env()
                .unwrap_or_else(|_| EnvFilter::new("info,frameflow_rs=debug")),
        )
        .with(tracing_subscriber::fmt::layer())
        .with(
            tracing_subscriber::fmt::layer()
                .with_ansi(false)
                .with_writer(file_writer),
        )
        .init();

    let config = match std::env::args().nth(1) {
        Some(path) => GeneratorConfig::load(&path)
            .with_context(|| format!("Failed to load config from {}", path))?,
        None => GeneratorConfig::default(),
    };
    tracing::info!("Starting FrameFlow demo with {:?}", config);

    let generator = DataGenerator::new(config).with_payload_populator(|id| {
        Ok(json!({
            "sequence": id,
            "source": "demo",
        }))
    });

    generator.start()?;
    generator.get_data()?;

    std::thread::sleep(DEMO_RUNTIME);

    println!("--- view buffer ---");
    for frame in generator.view_frames() {
        println!("{}", frame);
    }
    println!("--- counters ---");
    println!("{}", generator.counters());

    generator.stop();
    tracing::info!("FrameFlow demo finished");
    Ok(())
}
