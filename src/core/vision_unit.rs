// Vision unit - drains one bus subscription through an extractor and a detector

use crate::core::alert_sink::AlertSink;
use crate::core::frame_bus::FrameReceiver;
use crate::core::shutdown::ShutdownSignal;
use crate::models::alert::Alert;
use crate::models::landmarks::{LandmarkError, LandmarkSet};
use crate::models::session::SessionResult;
use crate::platform::landmarks::LandmarkExtractor;
use std::sync::Arc;
use std::time::Instant;

/// A detector that consumes one landmark set per frame
pub trait FrameAnalyzer: Send {
    fn name(&self) -> &'static str;

    /// Process one frame captured at `now`; returns the alerts to emit
    fn analyze(&mut self, landmarks: &LandmarkSet, now: Instant) -> Vec<Alert>;
}

/// Consume frames until shutdown. Detector timing follows the capture
/// timestamp, not the time the frame was dequeued.
pub async fn run_vision_unit(
    mut analyzer: Box<dyn FrameAnalyzer>,
    extractor: Arc<dyn LandmarkExtractor>,
    frames: FrameReceiver,
    sink: AlertSink,
    shutdown: ShutdownSignal,
) -> SessionResult<()> {
    let name = analyzer.name();
    if !extractor.is_initialized() {
        tracing::error!(unit = name, "Landmark extractor not initialized");
        return Err(LandmarkError::NotInitialized.into());
    }
    tracing::info!(unit = name, model = %extractor.model_info(), "Vision unit started");

    let mut processed: u64 = 0;
    while let Some(frame) = frames.next(&shutdown).await {
        let landmarks = match extractor.extract(&frame) {
            Ok(landmarks) => landmarks,
            Err(LandmarkError::InferenceFailed(reason)) => {
                tracing::debug!(unit = name, sequence = frame.sequence, "Inference failed: {}", reason);
                continue;
            }
            Err(e) => {
                tracing::error!(unit = name, "Landmark extraction failed: {}", e);
                return Err(e.into());
            }
        };

        let alerts = analyzer.analyze(&landmarks, frame.captured_at);
        processed += 1;

        if shutdown.is_triggered() {
            break;
        }
        for alert in &alerts {
            sink.emit(alert);
        }
    }

    tracing::info!(unit = name, processed, missed = frames.dropped(), "Vision unit stopped");
    Ok(())
}
