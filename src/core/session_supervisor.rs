// Session supervisor - owns the units of one coaching session
//
// The supervisor spawns the frame producer, both vision units and the speech
// unit, waits for a stop request or for the units to finish, then raises the
// shared shutdown signal and collects every unit within the grace period.

use crate::core::alert_sink::AlertSink;
use crate::core::config::CoachConfig;
use crate::core::filler_detector::FillerDetector;
use crate::core::frame_bus::FrameBus;
use crate::core::frame_source::{run_frame_producer, FrameSource};
use crate::core::gaze_detector::GazeDetector;
use crate::core::motion_detector::MotionDetector;
use crate::core::shutdown::ShutdownSignal;
use crate::core::speech_unit::{run_speech_unit, SpeechSource};
use crate::core::vision_unit::run_vision_unit;
use crate::models::session::{
    SessionReport, SessionResult, StopReason, UnitKind, UnitOutcome, UnitReport,
};
use crate::platform::landmarks::LandmarkExtractor;
use crate::platform::notification::Notifier;
use chrono::{DateTime, Local};
use std::future::Future;
use std::sync::Arc;
use tokio::sync::mpsc;
use tokio::task::AbortHandle;
use uuid::Uuid;

/// External collaborators a session runs against
pub struct Collaborators {
    pub frame_source: Box<dyn FrameSource>,
    pub motion_extractor: Arc<dyn LandmarkExtractor>,
    pub gaze_extractor: Arc<dyn LandmarkExtractor>,
    pub speech_source: Box<dyn SpeechSource>,
    pub notifier: Arc<dyn Notifier>,
}

struct RunningUnit {
    unit: UnitKind,
    abort: AbortHandle,
}

pub struct SessionSupervisor {
    config: CoachConfig,
    session_id: String,
    started_at: DateTime<Local>,
    shutdown: ShutdownSignal,
    bus: Arc<FrameBus>,
    sink: AlertSink,
    running: Vec<RunningUnit>,
    exits: mpsc::UnboundedReceiver<(UnitKind, UnitOutcome)>,
    outcomes: Vec<UnitReport>,
    failed: Option<UnitKind>,
    report: Option<SessionReport>,
}

impl SessionSupervisor {
    /// Spawn every unit of a new session. Must be called within a tokio runtime.
    pub fn start(config: CoachConfig, collaborators: Collaborators) -> Self {
        let session_id = Uuid::new_v4().to_string();
        let shutdown = ShutdownSignal::new();
        let bus = Arc::new(FrameBus::new(
            config.pipeline.frame_bus_capacity,
            config.pipeline.poll_interval(),
        ));
        let sink = AlertSink::new(&config.notifications, collaborators.notifier);
        let (exit_tx, exits) = mpsc::unbounded_channel();

        // Subscribe before the producer runs so no frame is missed
        let motion_frames = bus.subscribe();
        let gaze_frames = bus.subscribe();

        let producer: UnitTask = Box::pin(run_frame_producer(
            collaborators.frame_source,
            bus.clone(),
            shutdown.clone(),
        ));
        let motion: UnitTask = Box::pin(run_vision_unit(
            Box::new(MotionDetector::from_config(&config)),
            collaborators.motion_extractor,
            motion_frames,
            sink.clone(),
            shutdown.clone(),
        ));
        let gaze: UnitTask = Box::pin(run_vision_unit(
            Box::new(GazeDetector::from_config(&config)),
            collaborators.gaze_extractor,
            gaze_frames,
            sink.clone(),
            shutdown.clone(),
        ));
        let speech: UnitTask = Box::pin(run_speech_unit(
            collaborators.speech_source,
            FillerDetector::from_config(&config),
            sink.clone(),
            shutdown.clone(),
        ));

        let running = vec![
            Self::spawn_unit(UnitKind::FrameProducer, producer, exit_tx.clone()),
            Self::spawn_unit(UnitKind::Motion, motion, exit_tx.clone()),
            Self::spawn_unit(UnitKind::Gaze, gaze, exit_tx.clone()),
            Self::spawn_unit(UnitKind::Speech, speech, exit_tx),
        ];

        tracing::info!(session_id = %session_id, units = running.len(), "Session started");

        Self {
            config,
            session_id,
            started_at: Local::now(),
            shutdown,
            bus,
            sink,
            running,
            exits,
            outcomes: Vec::new(),
            failed: None,
            report: None,
        }
    }

    /// Run the unit on its own task and report how it ended. A panic in the
    /// unit is reported as a failure.
    fn spawn_unit(
        unit: UnitKind,
        task: UnitTask,
        exit_tx: mpsc::UnboundedSender<(UnitKind, UnitOutcome)>,
    ) -> RunningUnit {
        let handle = tokio::spawn(task);
        let abort = handle.abort_handle();

        tokio::spawn(async move {
            let outcome = match handle.await {
                Ok(Ok(())) => UnitOutcome::Completed,
                Ok(Err(e)) => UnitOutcome::Failed(e.to_string()),
                Err(e) if e.is_panic() => UnitOutcome::Failed(format!("unit panicked: {}", e)),
                Err(_) => UnitOutcome::Aborted,
            };
            let _ = exit_tx.send((unit, outcome));
        });

        RunningUnit { unit, abort }
    }

    pub fn session_id(&self) -> &str {
        &self.session_id
    }

    /// Handle for anything that needs to observe or raise the stop signal
    pub fn shutdown_signal(&self) -> ShutdownSignal {
        self.shutdown.clone()
    }

    /// Wait until `stop` resolves, the signal is raised elsewhere, every unit
    /// has finished, or (under `abort_on_unit_failure`) a unit fails. Then
    /// shut the session down and return its report.
    pub async fn run<F>(&mut self, stop: F) -> SessionReport
    where
        F: Future<Output = ()>,
    {
        tokio::pin!(stop);
        let shutdown = self.shutdown.clone();

        let reason = loop {
            if self.report.is_some() {
                return self.shutdown().await;
            }
            if self.pending_units() == 0 {
                break StopReason::SourcesExhausted;
            }

            tokio::select! {
                _ = &mut stop => break StopReason::Requested,
                _ = shutdown.wait() => break StopReason::Requested,
                exit = self.exits.recv() => match exit {
                    Some((unit, outcome)) => {
                        let failed = matches!(outcome, UnitOutcome::Failed(_));
                        self.record(unit, outcome);
                        if failed && self.config.pipeline.abort_on_unit_failure {
                            break StopReason::UnitFailed(unit);
                        }
                    }
                    None => break StopReason::SourcesExhausted,
                },
            }
        };

        tracing::info!(reason = ?reason, "Stopping session");
        self.finish(reason).await
    }

    /// Stop the session. Idempotent: later calls return the first report.
    pub async fn shutdown(&mut self) -> SessionReport {
        self.finish(StopReason::Requested).await
    }

    async fn finish(&mut self, reason: StopReason) -> SessionReport {
        if let Some(report) = &self.report {
            return report.clone();
        }

        self.shutdown.trigger();

        let deadline = tokio::time::Instant::now() + self.config.pipeline.shutdown_grace();
        while self.pending_units() > 0 {
            match tokio::time::timeout_at(deadline, self.exits.recv()).await {
                Ok(Some((unit, outcome))) => self.record(unit, outcome),
                Ok(None) | Err(_) => break,
            }
        }

        for running in &self.running {
            if !self.outcomes.iter().any(|report| report.unit == running.unit) {
                tracing::warn!(unit = running.unit.to_string(), "Unit did not stop in time, aborting");
                running.abort.abort();
                self.outcomes.push(UnitReport {
                    unit: running.unit,
                    outcome: UnitOutcome::Aborted,
                });
            }
        }
        self.running.clear();

        let stop_reason = match (reason, self.failed) {
            (StopReason::SourcesExhausted, Some(unit)) => StopReason::UnitFailed(unit),
            (reason, _) => reason,
        };
        let sink_stats = self.sink.stats();
        let bus_stats = self.bus.stats();

        let report = SessionReport {
            session_id: self.session_id.clone(),
            started_at: self.started_at,
            ended_at: Local::now(),
            stop_reason,
            units: self.outcomes.clone(),
            alerts_logged: sink_stats.logged,
            notifications_sent: sink_stats.notified,
            frames_published: bus_stats.published,
            frames_dropped: bus_stats.dropped,
        };

        tracing::info!(
            session_id = %report.session_id,
            alerts = report.alerts_logged,
            notifications = report.notifications_sent,
            frames = report.frames_published,
            dropped = report.frames_dropped,
            clean = report.is_clean(),
            "Session ended"
        );

        self.report = Some(report.clone());
        report
    }

    fn record(&mut self, unit: UnitKind, outcome: UnitOutcome) {
        match &outcome {
            UnitOutcome::Failed(reason) => {
                tracing::error!(unit = unit.to_string(), "Unit failed: {}", reason);
                if self.failed.is_none() {
                    self.failed = Some(unit);
                }
            }
            _ => tracing::info!(unit = unit.to_string(), outcome = ?outcome, "Unit finished"),
        }
        self.outcomes.push(UnitReport { unit, outcome });
    }

    fn pending_units(&self) -> usize {
        self.running.len().saturating_sub(self.outcomes.len())
    }
}

type UnitTask = std::pin::Pin<Box<dyn Future<Output = SessionResult<()>> + Send + 'static>>;

#[cfg(test)]
mod tests {
    use super::*;
    use crate::models::capture::{CaptureError, CaptureResult, Frame};
    use crate::models::landmarks::{LandmarkResult, LandmarkSet};
    use crate::models::speech::{SpeechError, SpeechResult, TranscriptFragment};
    use crate::platform::landmarks::NullExtractor;
    use crate::platform::notification::LogNotifier;
    use async_trait::async_trait;
    use std::collections::VecDeque;
    use std::time::Duration;

    struct FiniteFrames {
        remaining: u64,
    }

    #[async_trait]
    impl FrameSource for FiniteFrames {
        async fn capture_frame(&mut self) -> CaptureResult<Frame> {
            if self.remaining == 0 {
                return Err(CaptureError::EndOfStream);
            }
            self.remaining -= 1;
            tokio::time::sleep(Duration::from_millis(1)).await;
            Ok(Frame::empty(10 - self.remaining))
        }
    }

    struct EndlessFrames {
        sequence: u64,
    }

    #[async_trait]
    impl FrameSource for EndlessFrames {
        async fn capture_frame(&mut self) -> CaptureResult<Frame> {
            tokio::time::sleep(Duration::from_millis(5)).await;
            self.sequence += 1;
            Ok(Frame::empty(self.sequence))
        }
    }

    struct DeadCamera;

    #[async_trait]
    impl FrameSource for DeadCamera {
        async fn capture_frame(&mut self) -> CaptureResult<Frame> {
            Err(CaptureError::DeviceUnavailable("camera 0".into()))
        }
    }

    struct Transcript {
        fragments: VecDeque<TranscriptFragment>,
    }

    #[async_trait]
    impl SpeechSource for Transcript {
        async fn next_fragment(&mut self) -> SpeechResult<Option<TranscriptFragment>> {
            Ok(self.fragments.pop_front())
        }
    }

    /// Keeps listening forever
    struct OpenMicrophone;

    #[async_trait]
    impl SpeechSource for OpenMicrophone {
        async fn next_fragment(&mut self) -> SpeechResult<Option<TranscriptFragment>> {
            std::future::pending().await
        }
    }

    /// Ignores the shutdown signal while "transcribing"
    struct StubbornMicrophone;

    #[async_trait]
    impl SpeechSource for StubbornMicrophone {
        async fn next_fragment(&mut self) -> SpeechResult<Option<TranscriptFragment>> {
            Err(SpeechError::TranscriptionFailed("busy".into()))
        }
    }

    fn collaborators(
        frame_source: Box<dyn FrameSource>,
        speech_source: Box<dyn SpeechSource>,
    ) -> Collaborators {
        Collaborators {
            frame_source,
            motion_extractor: Arc::new(NullExtractor),
            gaze_extractor: Arc::new(NullExtractor),
            speech_source,
            notifier: Arc::new(LogNotifier),
        }
    }

    #[tokio::test]
    async fn test_session_ends_when_sources_are_exhausted() {
        let speech = Transcript {
            fragments: VecDeque::from(vec![TranscriptFragment::final_result("um well")]),
        };
        let mut supervisor = SessionSupervisor::start(
            CoachConfig::default(),
            collaborators(Box::new(FiniteFrames { remaining: 10 }), Box::new(speech)),
        );

        let report = tokio::time::timeout(
            Duration::from_secs(2),
            supervisor.run(std::future::pending::<()>()),
        )
        .await
        .expect("session should end on its own");

        assert_eq!(report.stop_reason, StopReason::SourcesExhausted);
        assert_eq!(report.units.len(), 4);
        assert!(report.units.iter().all(|u| u.outcome == UnitOutcome::Completed));
        assert_eq!(report.alerts_logged, 2);
        assert_eq!(report.frames_published, 10);
    }

    #[tokio::test]
    async fn test_stop_request_completes_within_grace() {
        let mut supervisor = SessionSupervisor::start(
            CoachConfig::default(),
            collaborators(Box::new(EndlessFrames { sequence: 0 }), Box::new(OpenMicrophone)),
        );

        let started = std::time::Instant::now();
        let report = supervisor
            .run(tokio::time::sleep(Duration::from_millis(50)))
            .await;

        assert_eq!(report.stop_reason, StopReason::Requested);
        assert!(report.is_clean());
        assert!(report.units.iter().all(|u| u.outcome == UnitOutcome::Completed));
        assert!(started.elapsed() < Duration::from_millis(50) + Duration::from_millis(500));
    }

    #[tokio::test]
    async fn test_external_trigger_stops_session() {
        let mut supervisor = SessionSupervisor::start(
            CoachConfig::default(),
            collaborators(Box::new(EndlessFrames { sequence: 0 }), Box::new(OpenMicrophone)),
        );

        let signal = supervisor.shutdown_signal();
        tokio::spawn(async move {
            tokio::time::sleep(Duration::from_millis(30)).await;
            signal.trigger();
        });

        let report = supervisor.run(std::future::pending::<()>()).await;
        assert_eq!(report.stop_reason, StopReason::Requested);
    }

    #[tokio::test]
    async fn test_shutdown_is_idempotent() {
        let mut supervisor = SessionSupervisor::start(
            CoachConfig::default(),
            collaborators(Box::new(EndlessFrames { sequence: 0 }), Box::new(OpenMicrophone)),
        );

        let first = supervisor.shutdown().await;
        let second = supervisor.shutdown().await;

        assert_eq!(first.session_id, second.session_id);
        assert_eq!(first.units, second.units);
        assert_eq!(first.ended_at, second.ended_at);
    }

    #[tokio::test]
    async fn test_unit_failure_continues_by_default() {
        let mut supervisor = SessionSupervisor::start(
            CoachConfig::default(),
            collaborators(Box::new(DeadCamera), Box::new(OpenMicrophone)),
        );

        let report = supervisor
            .run(tokio::time::sleep(Duration::from_millis(100)))
            .await;

        // Camera loss closes the bus, the speech side keeps running until stopped
        assert_eq!(report.stop_reason, StopReason::Requested);
        assert!(matches!(
            report.outcome(UnitKind::FrameProducer),
            Some(UnitOutcome::Failed(_))
        ));
        assert_eq!(report.outcome(UnitKind::Motion), Some(&UnitOutcome::Completed));
        assert_eq!(report.outcome(UnitKind::Speech), Some(&UnitOutcome::Completed));
    }

    #[tokio::test]
    async fn test_unit_failure_aborts_session_when_configured() {
        let mut config = CoachConfig::default();
        config.pipeline.abort_on_unit_failure = true;
        let mut supervisor = SessionSupervisor::start(
            config,
            collaborators(Box::new(DeadCamera), Box::new(OpenMicrophone)),
        );

        let report = tokio::time::timeout(
            Duration::from_secs(2),
            supervisor.run(std::future::pending::<()>()),
        )
        .await
        .expect("failure should end the session");

        assert_eq!(report.stop_reason, StopReason::UnitFailed(UnitKind::FrameProducer));
        assert!(!report.is_clean());
    }

    /// Blocks its worker thread, so the unit cannot observe shutdown in time
    struct SlowExtractor;

    impl LandmarkExtractor for SlowExtractor {
        fn extract(&self, _frame: &Frame) -> LandmarkResult<LandmarkSet> {
            std::thread::sleep(Duration::from_millis(400));
            Ok(LandmarkSet::default())
        }

        fn model_info(&self) -> String {
            "slow".to_string()
        }
    }

    #[tokio::test(flavor = "multi_thread", worker_threads = 4)]
    async fn test_stragglers_are_aborted_after_grace() {
        let mut config = CoachConfig::default();
        config.pipeline.shutdown_grace_ms = 50;
        let mut supervisor = SessionSupervisor::start(
            config,
            Collaborators {
                frame_source: Box::new(EndlessFrames { sequence: 0 }),
                motion_extractor: Arc::new(SlowExtractor),
                gaze_extractor: Arc::new(NullExtractor),
                speech_source: Box::new(OpenMicrophone),
                notifier: Arc::new(LogNotifier),
            },
        );

        tokio::time::sleep(Duration::from_millis(30)).await;
        let started = std::time::Instant::now();
        let report = supervisor.shutdown().await;

        assert!(started.elapsed() < Duration::from_millis(300));
        assert_eq!(report.outcome(UnitKind::Motion), Some(&UnitOutcome::Aborted));
        assert_eq!(report.outcome(UnitKind::Gaze), Some(&UnitOutcome::Completed));
        assert_eq!(report.outcome(UnitKind::Speech), Some(&UnitOutcome::Completed));
        assert!(report.is_clean());
    }

    #[tokio::test]
    async fn test_transcription_errors_do_not_fail_the_unit() {
        let mut supervisor = SessionSupervisor::start(
            CoachConfig::default(),
            collaborators(Box::new(FiniteFrames { remaining: 1 }), Box::new(StubbornMicrophone)),
        );

        let report = supervisor
            .run(tokio::time::sleep(Duration::from_millis(50)))
            .await;

        assert_eq!(report.outcome(UnitKind::Speech), Some(&UnitOutcome::Completed));
    }
}
