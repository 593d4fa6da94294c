// Gaze detection - flags lost eye contact from iris position inside the eye
//
// A face has to be seen continuously for the stability window before it is
// evaluated at all. Losing the face restarts that window and drops any
// half-sustained away condition.

use crate::core::config::{CoachConfig, DebounceConfig, GazeConfig, NotificationConfig};
use crate::core::debounce::{AlertDebouncer, NotificationGate};
use crate::core::vision_unit::FrameAnalyzer;
use crate::models::alert::{Alert, RawSignal, SignalKind};
use crate::models::landmarks::{face_index, FaceMesh, LandmarkSet};
use std::time::{Duration, Instant};

/// Iris position relative to the eye, both ratios in [0, 1] when looking inside the eye
#[derive(Debug, Clone, Copy, PartialEq)]
pub struct GazeMeasurement {
    pub horizontal: f32,
    /// None when the lids coincide
    pub vertical: Option<f32>,
    pub eyes_closed: bool,
}

pub struct GazeDetector {
    config: GazeConfig,
    stability_window: Duration,
    stable_since: Option<Instant>,
    stable: bool,
    debouncer: AlertDebouncer,
    gate: NotificationGate,
}

impl GazeDetector {
    pub fn new(gaze: GazeConfig, debounce: DebounceConfig, notifications: &NotificationConfig) -> Self {
        Self {
            stability_window: Duration::from_secs_f32(gaze.stability_window_secs),
            config: gaze,
            stable_since: None,
            stable: false,
            debouncer: AlertDebouncer::new(debounce),
            gate: NotificationGate::new(notifications),
        }
    }

    pub fn from_config(config: &CoachConfig) -> Self {
        Self::new(
            config.gaze.clone(),
            config.debounce.clone(),
            &config.notifications,
        )
    }

    /// Compute gaze ratios from a refined face mesh. Returns `None` when the
    /// mesh lacks the eye landmarks or the eye corners coincide.
    pub fn measure(&self, mesh: &FaceMesh) -> Option<GazeMeasurement> {
        let point = |index: usize| mesh.landmark(index);

        let mut iris_x = 0.0;
        let mut iris_y = 0.0;
        for index in face_index::LEFT_IRIS {
            let keypoint = point(index)?;
            iris_x += keypoint.x;
            iris_y += keypoint.y;
        }
        let iris_count = face_index::LEFT_IRIS.len() as f32;
        iris_x /= iris_count;
        iris_y /= iris_count;

        let [left_corner, right_corner] = face_index::LEFT_EYE_CORNERS;
        let corner_left_x = point(left_corner)?.x;
        let corner_span = point(right_corner)?.x - corner_left_x;
        if corner_span.abs() < f32::EPSILON {
            return None;
        }
        let horizontal = (iris_x - corner_left_x) / corner_span;

        let [upper_l, lower_l, upper_r, lower_r] = face_index::EYE_LIDS;
        let upper_lid = (point(upper_l)?.y + point(upper_r)?.y) / 2.0;
        let lower_lid = (point(lower_l)?.y + point(lower_r)?.y) / 2.0;
        let lid_gap = lower_lid - upper_lid;

        let vertical = if lid_gap.abs() < f32::EPSILON {
            None
        } else {
            Some((iris_y - upper_lid) / lid_gap)
        };

        Some(GazeMeasurement {
            horizontal,
            vertical,
            eyes_closed: lid_gap.abs() < self.config.eye_closed_epsilon,
        })
    }

    pub fn is_away(&self, measurement: &GazeMeasurement) -> bool {
        let outside = |value: f32, (low, high): (f32, f32)| value < low || value > high;

        outside(measurement.horizontal, self.config.horizontal_range)
            || measurement
                .vertical
                .map_or(false, |vertical| outside(vertical, self.config.vertical_range))
            || measurement.eyes_closed
    }

    /// Stability gating plus classification for one frame
    pub fn observe(&mut self, landmarks: &LandmarkSet, now: Instant) -> Option<RawSignal> {
        let mesh = match &landmarks.face_mesh {
            Some(mesh) => mesh,
            None => {
                self.stable_since = None;
                self.stable = false;
                return None;
            }
        };

        if !self.stable {
            let since = *self.stable_since.get_or_insert(now);
            if now.saturating_duration_since(since) < self.stability_window {
                return None;
            }
            self.stable = true;
            tracing::debug!("Face stable, gaze evaluation started");
        }

        let measurement = self.measure(mesh)?;
        if !self.is_away(&measurement) {
            return None;
        }

        Some(RawSignal::new(
            SignalKind::GazeAway,
            None,
            measurement.horizontal,
            now,
        ))
    }

    pub fn is_stable(&self) -> bool {
        self.stable
    }
}

impl FrameAnalyzer for GazeDetector {
    fn name(&self) -> &'static str {
        "gaze"
    }

    fn analyze(&mut self, landmarks: &LandmarkSet, now: Instant) -> Vec<Alert> {
        let signals: Vec<RawSignal> = self.observe(landmarks, now).into_iter().collect();

        let mut alerts = self.debouncer.observe_frame(&signals, now);
        self.gate.apply(&mut alerts, now);
        alerts
    }
}
