// Raw detector signals and the user-facing alerts derived from them

use chrono::{DateTime, Local};
use serde::{Deserialize, Serialize};
use std::time::Instant;

// ==============================================================================
// Signal Kinds
// ==============================================================================

#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum SignalKind {
    Shake,
    HeldTooLong,
    GazeAway,
    Filler,
}

impl SignalKind {
    pub fn to_string(&self) -> &'static str {
        match self {
            SignalKind::Shake => "shake",
            SignalKind::HeldTooLong => "held_too_long",
            SignalKind::GazeAway => "gaze_away",
            SignalKind::Filler => "filler",
        }
    }

    /// Notification channel the kind is rate-limited under
    pub fn class(&self) -> SignalClass {
        match self {
            SignalKind::Shake | SignalKind::HeldTooLong => SignalClass::HandMotion,
            SignalKind::GazeAway => SignalClass::Gaze,
            SignalKind::Filler => SignalClass::Speech,
        }
    }

    pub fn severity(&self) -> Severity {
        match self {
            SignalKind::Shake | SignalKind::Filler => Severity::Info,
            SignalKind::HeldTooLong | SignalKind::GazeAway => Severity::Warning,
        }
    }
}

/// Groups of signal kinds that share one notification cooldown
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum SignalClass {
    HandMotion,
    Gaze,
    Speech,
}

impl SignalClass {
    pub fn notification_title(&self) -> &'static str {
        match self {
            SignalClass::HandMotion => "Hand Movement Alert",
            SignalClass::Gaze => "Eye Contact Alert",
            SignalClass::Speech => "Filler Word Alert",
        }
    }
}

#[derive(Debug, Clone, Copy, PartialEq, Eq, PartialOrd, Ord, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum Severity {
    Info,
    Warning,
}

// ==============================================================================
// Raw Signal
// ==============================================================================

/// Per-frame detection of a threshold condition. Not deduplicated: a detector
/// emits one every frame the condition holds.
#[derive(Debug, Clone, PartialEq)]
pub struct RawSignal {
    pub kind: SignalKind,
    pub entity_id: Option<String>,
    pub value: f32,
    pub timestamp: Instant,
}

impl RawSignal {
    pub fn new(kind: SignalKind, entity_id: Option<String>, value: f32, timestamp: Instant) -> Self {
        Self {
            kind,
            entity_id,
            value,
            timestamp,
        }
    }

    pub fn key(&self) -> SignalKey {
        SignalKey {
            kind: self.kind,
            entity_id: self.entity_id.clone(),
        }
    }
}

/// Debounce key: global for un-keyed kinds, per entity otherwise
#[derive(Debug, Clone, PartialEq, Eq, Hash)]
pub struct SignalKey {
    pub kind: SignalKind,
    pub entity_id: Option<String>,
}

impl SignalKey {
    pub fn global(kind: SignalKind) -> Self {
        Self {
            kind,
            entity_id: None,
        }
    }

    pub fn entity(kind: SignalKind, entity_id: impl Into<String>) -> Self {
        Self {
            kind,
            entity_id: Some(entity_id.into()),
        }
    }
}

// ==============================================================================
// Alert
// ==============================================================================

/// Deduplicated, cooldown-gated alert handed to the sink
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct Alert {
    pub id: String,
    pub kind: SignalKind,
    pub entity_id: Option<String>,
    pub message: String,
    pub timestamp: DateTime<Local>,
    pub severity: Severity,
    /// Set when the class notification gate admitted this alert
    pub notify: bool,
}

impl Alert {
    pub fn from_signal(signal: &RawSignal) -> Self {
        Self {
            id: uuid::Uuid::new_v4().to_string(),
            kind: signal.kind,
            entity_id: signal.entity_id.clone(),
            message: alert_message(signal),
            timestamp: Local::now(),
            severity: signal.kind.severity(),
            notify: false,
        }
    }
}

fn alert_message(signal: &RawSignal) -> String {
    match signal.kind {
        SignalKind::Shake => "Excessive hand movement".to_string(),
        SignalKind::HeldTooLong => "Hand visible too long".to_string(),
        SignalKind::GazeAway => "Eye contact lost".to_string(),
        SignalKind::Filler => format!(
            "Filler word detected: {}",
            signal.entity_id.as_deref().unwrap_or("").to_uppercase()
        ),
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_hand_kinds_share_a_class() {
        assert_eq!(SignalKind::Shake.class(), SignalKind::HeldTooLong.class());
        assert_ne!(SignalKind::Shake.class(), SignalKind::GazeAway.class());
        assert_eq!(SignalKind::Filler.class(), SignalClass::Speech);
    }

    #[test]
    fn test_filler_alert_message_names_token() {
        let signal = RawSignal::new(
            SignalKind::Filler,
            Some("basically".to_string()),
            1.0,
            Instant::now(),
        );
        let alert = Alert::from_signal(&signal);

        assert_eq!(alert.message, "Filler word detected: BASICALLY");
        assert_eq!(alert.entity_id.as_deref(), Some("basically"));
        assert!(!alert.notify);
    }

    #[test]
    fn test_signal_key_by_entity() {
        let now = Instant::now();
        let a = RawSignal::new(SignalKind::Shake, Some("hand_0".into()), 0.1, now);
        let b = RawSignal::new(SignalKind::Shake, Some("hand_1".into()), 0.1, now);

        assert_ne!(a.key(), b.key());
        assert_eq!(a.key(), SignalKey::entity(SignalKind::Shake, "hand_0"));
    }
}
