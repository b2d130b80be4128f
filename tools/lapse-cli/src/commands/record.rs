//! Run the capture loop.

use std::sync::Arc;

use lapse_capture_engine::{CaptureSession, PngEncoder, SessionConfig};
use lapse_common::clock::SystemClock;
use lapse_common::config::AppConfig;

pub async fn run(
    config: AppConfig,
    layout: Option<String>,
    ticks: Option<u64>,
) -> anyhow::Result<()> {
    let backend = super::resolve_backend(&config.capture.backend, layout.as_deref())?;

    let mut session_config = SessionConfig::from_app_config(&config);
    session_config.max_ticks = ticks;

    println!("Recording to: {}", session_config.root_dir.display());
    println!("  Backend: {}", backend.name());
    println!("  Interval: {:.3}s", session_config.interval.as_secs_f64());
    println!("  Parallel captures: {}", session_config.max_parallel_captures);
    if let Some(ticks) = ticks {
        println!("  Ticks: {ticks}");
    }
    println!();

    let mut session = CaptureSession::new(
        session_config,
        backend,
        Arc::new(PngEncoder),
        Arc::new(SystemClock),
    );

    let resumed = session.resume()?;
    if resumed > 0 {
        println!("Resuming after {resumed} recorded tick(s)");
    }

    let shutdown = session.shutdown_signal();
    tokio::spawn(async move {
        if tokio::signal::ctrl_c().await.is_ok() {
            tracing::info!("Interrupt received, finishing current tick");
            shutdown.trigger();
        }
    });

    println!("Press Ctrl+C to stop recording...");
    let completed = session.run().await?;

    println!();
    println!(
        "Stopped after {completed} tick(s); MaxFrameCount is {}",
        session.max_frame_count()
    );
    Ok(())
}
