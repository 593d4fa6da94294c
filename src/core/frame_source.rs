// Frame producer unit - pulls frames from the camera and publishes them

use crate::core::frame_bus::FrameBus;
use crate::core::shutdown::ShutdownSignal;
use crate::models::capture::{CaptureError, CaptureResult, Frame};
use crate::models::session::SessionResult;
use async_trait::async_trait;
use std::sync::Arc;

/// Camera or any other producer of frames at its native rate
#[async_trait]
pub trait FrameSource: Send {
    /// Wait for and return the next frame.
    ///
    /// `ReadFailed` is transient, `EndOfStream` ends the session's video side
    /// normally and `DeviceUnavailable` is fatal to the producer.
    async fn capture_frame(&mut self) -> CaptureResult<Frame>;
}

/// Capture loop. Never waits on consumers; the bus drops what they can't take.
/// The bus is closed when the loop ends, whatever the reason.
pub async fn run_frame_producer(
    source: Box<dyn FrameSource>,
    bus: Arc<FrameBus>,
    shutdown: ShutdownSignal,
) -> SessionResult<()> {
    let result = capture_loop(source, &bus, &shutdown).await;
    bus.close();
    result
}

async fn capture_loop(
    mut source: Box<dyn FrameSource>,
    bus: &FrameBus,
    shutdown: &ShutdownSignal,
) -> SessionResult<()> {
    tracing::info!(subscribers = bus.subscriber_count(), "Frame producer started");
    let mut captured: u64 = 0;
    let mut failed_reads: u64 = 0;

    loop {
        if shutdown.is_triggered() {
            break;
        }

        let result = tokio::select! {
            result = source.capture_frame() => result,
            _ = shutdown.wait() => break,
        };

        match result {
            Ok(frame) => {
                captured += 1;
                bus.put(frame);
            }
            Err(CaptureError::EndOfStream) => {
                tracing::info!("Frame source exhausted");
                break;
            }
            Err(e) if e.is_transient() => {
                failed_reads += 1;
                tracing::debug!("Skipping frame: {}", e);
                tokio::task::yield_now().await;
            }
            Err(e) => {
                tracing::error!("Frame producer failed: {}", e);
                return Err(e.into());
            }
        }
    }

    let stats = bus.stats();
    tracing::info!(
        captured,
        failed_reads,
        dropped = stats.dropped,
        "Frame producer stopped"
    );
    Ok(())
}
