// Session lifecycle types: unit identity, outcomes and the final report

use crate::models::capture::CaptureError;
use crate::models::landmarks::LandmarkError;
use crate::models::speech::SpeechError;
use chrono::{DateTime, Local};
use serde::Serialize;

// ==============================================================================
// Units
// ==============================================================================

#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize)]
#[serde(rename_all = "snake_case")]
pub enum UnitKind {
    FrameProducer,
    Motion,
    Gaze,
    Speech,
}

impl UnitKind {
    pub fn to_string(&self) -> &'static str {
        match self {
            UnitKind::FrameProducer => "frame_producer",
            UnitKind::Motion => "motion",
            UnitKind::Gaze => "gaze",
            UnitKind::Speech => "speech",
        }
    }
}

/// How a unit ended
#[derive(Debug, Clone, PartialEq, Eq, Serialize)]
#[serde(rename_all = "snake_case")]
pub enum UnitOutcome {
    Completed,
    Failed(String),
    /// Did not finish within the shutdown grace period
    Aborted,
}

#[derive(Debug, Clone, PartialEq, Eq, Serialize)]
pub struct UnitReport {
    pub unit: UnitKind,
    pub outcome: UnitOutcome,
}

// ==============================================================================
// Session Report
// ==============================================================================

#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize)]
#[serde(rename_all = "snake_case")]
pub enum StopReason {
    /// Ctrl+C, SIGTERM or an explicit shutdown call
    Requested,
    /// Every unit ran to completion on its own
    SourcesExhausted,
    UnitFailed(UnitKind),
}

#[derive(Debug, Clone, Serialize)]
pub struct SessionReport {
    pub session_id: String,
    pub started_at: DateTime<Local>,
    pub ended_at: DateTime<Local>,
    pub stop_reason: StopReason,
    pub units: Vec<UnitReport>,
    pub alerts_logged: u64,
    pub notifications_sent: u64,
    pub frames_published: u64,
    pub frames_dropped: u64,
}

impl SessionReport {
    pub fn outcome(&self, unit: UnitKind) -> Option<&UnitOutcome> {
        self.units
            .iter()
            .find(|report| report.unit == unit)
            .map(|report| &report.outcome)
    }

    /// True when no unit failed
    pub fn is_clean(&self) -> bool {
        !self
            .units
            .iter()
            .any(|report| matches!(report.outcome, UnitOutcome::Failed(_)))
    }
}

// ==============================================================================
// Error Types
// ==============================================================================

#[derive(Debug, thiserror::Error)]
pub enum SessionError {
    #[error("Capture error: {0}")]
    Capture(#[from] CaptureError),

    #[error("Landmark error: {0}")]
    Landmark(#[from] LandmarkError),

    #[error("Speech error: {0}")]
    Speech(#[from] SpeechError),

    #[error("Session already started")]
    AlreadyStarted,

    #[error("Replay script error: {0}")]
    Replay(String),
}

pub type SessionResult<T> = Result<T, SessionError>;
