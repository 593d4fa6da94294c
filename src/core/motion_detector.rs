// Motion detection - flags shaking hands and hands kept in view too long

use crate::core::config::{CoachConfig, DebounceConfig, MotionConfig, NotificationConfig};
use crate::core::debounce::{AlertDebouncer, NotificationGate};
use crate::core::vision_unit::FrameAnalyzer;
use crate::models::alert::{Alert, RawSignal, SignalKind};
use crate::models::landmarks::{Keypoint3D, LandmarkSet};
use std::collections::{HashMap, HashSet};
use std::time::{Duration, Instant};

/// Per-hand history, alive only while the hand stays in view
#[derive(Debug, Clone)]
pub struct TrackedEntity {
    pub previous_position: Keypoint3D,
    pub first_seen_at: Instant,
}

/// Raw measurements of one frame
#[derive(Debug, Default)]
pub struct MotionMeasurement {
    pub signals: Vec<RawSignal>,
    pub purged: Vec<String>,
}

/// Hand motion detector that compares wrist positions across frames
pub struct MotionDetector {
    shake_threshold: f32,
    held_too_long: Duration,
    entities: HashMap<String, TrackedEntity>,
    debouncer: AlertDebouncer,
    gate: NotificationGate,
}

impl MotionDetector {
    /// Create a new motion detector
    ///
    /// # Arguments
    /// * `motion` - Shake distance (normalized units) and held-too-long duration
    /// * `debounce` - Per-hand log debounce windows
    /// * `notifications` - Shared hand-motion notification cooldown
    pub fn new(
        motion: &MotionConfig,
        debounce: DebounceConfig,
        notifications: &NotificationConfig,
    ) -> Self {
        Self {
            shake_threshold: motion.shake_threshold,
            held_too_long: Duration::from_secs_f32(motion.held_too_long_secs),
            entities: HashMap::new(),
            debouncer: AlertDebouncer::new(debounce),
            gate: NotificationGate::new(notifications),
        }
    }

    pub fn from_config(config: &CoachConfig) -> Self {
        Self::new(&config.motion, config.debounce.clone(), &config.notifications)
    }

    /// Update hand tracking with one frame and collect raw signals
    pub fn measure(&mut self, landmarks: &LandmarkSet, now: Instant) -> MotionMeasurement {
        let head_y = landmarks.head_y();
        let mut measurement = MotionMeasurement::default();
        let mut visible = HashSet::new();

        for (index, hand) in landmarks.hands.iter().enumerate() {
            let wrist = match hand.wrist() {
                Some(wrist) => *wrist,
                None => continue,
            };
            let hand_id = format!("hand_{}", index);
            visible.insert(hand_id.clone());

            let is_above_head = head_y.map_or(false, |head_y| wrist.y < head_y);

            match self.entities.get_mut(&hand_id) {
                Some(entity) => {
                    let distance = entity.previous_position.planar_distance(&wrist);
                    if !is_above_head && distance > self.shake_threshold {
                        measurement.signals.push(RawSignal::new(
                            SignalKind::Shake,
                            Some(hand_id.clone()),
                            distance,
                            now,
                        ));
                    }

                    let visible_for = now.saturating_duration_since(entity.first_seen_at);
                    if visible_for >= self.held_too_long {
                        measurement.signals.push(RawSignal::new(
                            SignalKind::HeldTooLong,
                            Some(hand_id.clone()),
                            visible_for.as_secs_f32(),
                            now,
                        ));
                    }

                    entity.previous_position = wrist;
                }
                None => {
                    // First sighting: nothing to compare against yet
                    self.entities.insert(
                        hand_id,
                        TrackedEntity {
                            previous_position: wrist,
                            first_seen_at: now,
                        },
                    );
                }
            }
        }

        // Hands that left the frame lose all their history
        self.entities.retain(|hand_id, _| {
            let keep = visible.contains(hand_id);
            if !keep {
                measurement.purged.push(hand_id.clone());
            }
            keep
        });
        measurement.purged.sort();

        measurement
    }

    pub fn tracked(&self, hand_id: &str) -> Option<&TrackedEntity> {
        self.entities.get(hand_id)
    }

    pub fn tracked_count(&self) -> usize {
        self.entities.len()
    }

    /// Reset the detector (forgets every hand)
    pub fn reset(&mut self) {
        for hand_id in self.entities.keys() {
            self.debouncer.forget_entity(hand_id);
        }
        self.entities.clear();
    }
}

impl FrameAnalyzer for MotionDetector {
    fn name(&self) -> &'static str {
        "motion"
    }

    fn analyze(&mut self, landmarks: &LandmarkSet, now: Instant) -> Vec<Alert> {
        let measurement = self.measure(landmarks, now);

        for hand_id in &measurement.purged {
            self.debouncer.forget_entity(hand_id);
        }

        let mut alerts = self.debouncer.observe_frame(&measurement.signals, now);
        self.gate.apply(&mut alerts, now);
        alerts
    }
}
