// Scripted session replay
//
// A replay script is JSON lines, one event per line, offset from session
// start in milliseconds:
//
//   {"at_ms": 0,   "frame": {"hands": [...], "body_pose": {...}, "face_mesh": {...}}}
//   {"at_ms": 400, "speech": {"is_final": false, "text": "um so"}}
//
// Blank lines and lines starting with `#` are ignored. Frames become a frame
// source plus an extractor that returns the scripted landmarks for each frame;
// speech lines become a transcript source.

use crate::core::frame_source::FrameSource;
use crate::core::speech_unit::SpeechSource;
use crate::models::capture::{CaptureError, CaptureResult, Frame, PixelFormat};
use crate::models::landmarks::{LandmarkResult, LandmarkSet};
use crate::models::session::{SessionError, SessionResult};
use crate::models::speech::{SpeechResult, TranscriptFragment};
use crate::platform::landmarks::LandmarkExtractor;
use async_trait::async_trait;
use serde::Deserialize;
use std::collections::{HashMap, VecDeque};
use std::path::Path;
use std::sync::Arc;
use std::time::Duration;
use tokio::time::Instant;

#[derive(Debug, Deserialize)]
#[serde(deny_unknown_fields)]
struct ScriptLine {
    at_ms: u64,
    #[serde(default)]
    frame: Option<LandmarkSet>,
    #[serde(default)]
    speech: Option<TranscriptFragment>,
}

/// Parsed replay script, events ordered by offset
#[derive(Debug, Clone, Default)]
pub struct ReplayScript {
    pub frames: Vec<(u64, LandmarkSet)>,
    pub speech: Vec<(u64, TranscriptFragment)>,
}

impl ReplayScript {
    pub fn parse(text: &str) -> SessionResult<Self> {
        let mut script = ReplayScript::default();

        for (index, line) in text.lines().enumerate() {
            let line = line.trim();
            if line.is_empty() || line.starts_with('#') {
                continue;
            }

            let parsed: ScriptLine = serde_json::from_str(line)
                .map_err(|e| SessionError::Replay(format!("line {}: {}", index + 1, e)))?;

            match (parsed.frame, parsed.speech) {
                (Some(frame), None) => script.frames.push((parsed.at_ms, frame)),
                (None, Some(fragment)) => script.speech.push((parsed.at_ms, fragment)),
                _ => {
                    return Err(SessionError::Replay(format!(
                        "line {}: expected exactly one of \"frame\" or \"speech\"",
                        index + 1
                    )))
                }
            }
        }

        // Stable: events at the same offset keep script order
        script.frames.sort_by_key(|(at_ms, _)| *at_ms);
        script.speech.sort_by_key(|(at_ms, _)| *at_ms);

        Ok(script)
    }

    pub fn load(path: &Path) -> SessionResult<Self> {
        let text = std::fs::read_to_string(path)
            .map_err(|e| SessionError::Replay(format!("{}: {}", path.display(), e)))?;
        Self::parse(&text)
    }

    /// Offset of the last event
    pub fn duration(&self) -> Duration {
        let last_frame = self.frames.last().map_or(0, |(at_ms, _)| *at_ms);
        let last_speech = self.speech.last().map_or(0, |(at_ms, _)| *at_ms);
        Duration::from_millis(last_frame.max(last_speech))
    }

    /// Split into collaborators sharing one clock that starts now
    pub fn into_collaborators(self) -> (ReplayFrameSource, Arc<ReplayExtractor>, ReplaySpeechSource) {
        let start = Instant::now();

        let mut schedule = VecDeque::with_capacity(self.frames.len());
        let mut landmarks = HashMap::with_capacity(self.frames.len());
        for (sequence, (at_ms, set)) in self.frames.into_iter().enumerate() {
            let sequence = sequence as u64;
            schedule.push_back((sequence, at_ms));
            landmarks.insert(sequence, set);
        }

        (
            ReplayFrameSource { start, schedule },
            Arc::new(ReplayExtractor { landmarks }),
            ReplaySpeechSource {
                start,
                fragments: self.speech.into(),
            },
        )
    }
}

/// Emits one empty frame per scripted frame line, at its offset
pub struct ReplayFrameSource {
    start: Instant,
    schedule: VecDeque<(u64, u64)>,
}

#[async_trait]
impl FrameSource for ReplayFrameSource {
    async fn capture_frame(&mut self) -> CaptureResult<Frame> {
        let (sequence, at_ms) = self.schedule.pop_front().ok_or(CaptureError::EndOfStream)?;

        let due = self.start + Duration::from_millis(at_ms);
        tokio::time::sleep_until(due).await;

        Ok(Frame {
            sequence,
            captured_at: due.into_std(),
            timestamp: chrono::Utc::now().timestamp_millis(),
            width: 0,
            height: 0,
            data: Vec::new(),
            format: PixelFormat::RGB8,
        })
    }
}

/// Returns the scripted landmarks of a frame by its sequence number
pub struct ReplayExtractor {
    landmarks: HashMap<u64, LandmarkSet>,
}

impl LandmarkExtractor for ReplayExtractor {
    fn extract(&self, frame: &Frame) -> LandmarkResult<LandmarkSet> {
        Ok(self.landmarks.get(&frame.sequence).cloned().unwrap_or_default())
    }

    fn model_info(&self) -> String {
        format!("Replay extractor ({} scripted frames)", self.landmarks.len())
    }
}

pub struct ReplaySpeechSource {
    start: Instant,
    fragments: VecDeque<(u64, TranscriptFragment)>,
}

#[async_trait]
impl SpeechSource for ReplaySpeechSource {
    async fn next_fragment(&mut self) -> SpeechResult<Option<TranscriptFragment>> {
        let (at_ms, fragment) = match self.fragments.pop_front() {
            Some(next) => next,
            None => return Ok(None),
        };

        tokio::time::sleep_until(self.start + Duration::from_millis(at_ms)).await;
        Ok(Some(fragment))
    }
}
