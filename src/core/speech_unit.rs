// Speech unit - feeds transcript fragments through the filler detector

use crate::core::alert_sink::AlertSink;
use crate::core::filler_detector::FillerDetector;
use crate::core::shutdown::ShutdownSignal;
use crate::models::session::SessionResult;
use crate::models::speech::{SpeechError, SpeechResult, TranscriptFragment};
use async_trait::async_trait;
use std::time::Instant;

/// Streaming recognizer output
#[async_trait]
pub trait SpeechSource: Send {
    /// Next partial or final fragment; `None` once the stream has ended
    async fn next_fragment(&mut self) -> SpeechResult<Option<TranscriptFragment>>;
}

pub async fn run_speech_unit(
    mut source: Box<dyn SpeechSource>,
    mut detector: FillerDetector,
    sink: AlertSink,
    shutdown: ShutdownSignal,
) -> SessionResult<()> {
    tracing::info!("Speech unit started");
    let mut fragments: u64 = 0;

    loop {
        if shutdown.is_triggered() {
            break;
        }

        let next = tokio::select! {
            next = source.next_fragment() => next,
            _ = shutdown.wait() => break,
        };

        let fragment = match next {
            Ok(Some(fragment)) => fragment,
            Ok(None) => {
                tracing::info!("Speech stream ended");
                break;
            }
            Err(SpeechError::TranscriptionFailed(reason)) => {
                tracing::warn!("Transcription failed: {}", reason);
                tokio::task::yield_now().await;
                continue;
            }
            Err(e) => {
                tracing::error!("Speech unit failed: {}", e);
                return Err(e.into());
            }
        };

        fragments += 1;
        let alerts = detector.process(&fragment, Instant::now());

        if shutdown.is_triggered() {
            break;
        }
        for alert in &alerts {
            sink.emit(alert);
        }
    }

    tracing::info!(fragments, "Speech unit stopped");
    Ok(())
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::core::config::{CoachConfig, NotificationConfig};
    use crate::models::session::SessionError;
    use crate::platform::notification::LogNotifier;
    use std::collections::VecDeque;
    use std::sync::Arc;
    use std::time::Duration;

    struct ScriptedSpeech {
        results: VecDeque<SpeechResult<Option<TranscriptFragment>>>,
    }

    #[async_trait]
    impl SpeechSource for ScriptedSpeech {
        async fn next_fragment(&mut self) -> SpeechResult<Option<TranscriptFragment>> {
            self.results.pop_front().unwrap_or(Ok(None))
        }
    }

    struct SilentSpeech;

    #[async_trait]
    impl SpeechSource for SilentSpeech {
        async fn next_fragment(&mut self) -> SpeechResult<Option<TranscriptFragment>> {
            std::future::pending().await
        }
    }

    fn sink() -> AlertSink {
        AlertSink::new(&NotificationConfig::default(), Arc::new(LogNotifier))
    }

    fn detector() -> FillerDetector {
        FillerDetector::from_config(&CoachConfig::default())
    }

    #[tokio::test]
    async fn test_fillers_reach_the_sink() {
        let sink = sink();
        let source = ScriptedSpeech {
            results: VecDeque::from(vec![
                Ok(Some(TranscriptFragment::partial("um so"))),
                Err(SpeechError::TranscriptionFailed("decoder hiccup".into())),
                Ok(Some(TranscriptFragment::final_result("um so basically the um plan is good"))),
            ]),
        };

        run_speech_unit(Box::new(source), detector(), sink.clone(), ShutdownSignal::new())
            .await
            .unwrap();

        // "um" from the partial, then "um" and "basically" from the final
        assert_eq!(sink.stats().logged, 3);
    }

    #[tokio::test]
    async fn test_lost_microphone_is_fatal() {
        let source = ScriptedSpeech {
            results: VecDeque::from(vec![Err(SpeechError::DeviceUnavailable("mic".into()))]),
        };

        let result = run_speech_unit(Box::new(source), detector(), sink(), ShutdownSignal::new()).await;
        assert!(matches!(result, Err(SessionError::Speech(SpeechError::DeviceUnavailable(_)))));
    }

    #[tokio::test]
    async fn test_shutdown_interrupts_waiting_recognizer() {
        let shutdown = ShutdownSignal::new();
        let handle = tokio::spawn(run_speech_unit(
            Box::new(SilentSpeech),
            detector(),
            sink(),
            shutdown.clone(),
        ));

        tokio::time::sleep(Duration::from_millis(20)).await;
        shutdown.trigger();

        tokio::time::timeout(Duration::from_secs(1), handle)
            .await
            .expect("speech unit should stop")
            .unwrap()
            .unwrap();
    }
}
