// Alert debouncing - turns per-frame raw signals into cooldown-gated alerts
//
// Two layers are kept apart on purpose: `AlertDebouncer` rate-limits per key
// (kind + entity) and decides what gets logged, `NotificationGate` rate-limits
// a whole signal class and decides what reaches the desktop notifier.

use crate::core::config::{DebounceConfig, DebounceWindow, NotificationConfig};
use crate::models::alert::{Alert, RawSignal, SignalClass, SignalKey};
use std::collections::{HashMap, HashSet};
use std::time::{Duration, Instant};

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum DebouncePhase {
    Idle,
    Pending,
    Alerted,
}

/// Debounce bookkeeping for one key
#[derive(Debug, Clone, PartialEq)]
pub struct DebounceState {
    pub phase: DebouncePhase,
    pub condition_active: bool,
    pub condition_started_at: Option<Instant>,
    pub last_alert_at: Option<Instant>,
}

impl Default for DebounceState {
    fn default() -> Self {
        Self {
            phase: DebouncePhase::Idle,
            condition_active: false,
            condition_started_at: None,
            last_alert_at: None,
        }
    }
}

impl DebounceState {
    /// True when nothing distinguishes this state from a fresh one at `now`
    fn is_settled(&self, cooldown: Duration, now: Instant) -> bool {
        self.phase == DebouncePhase::Idle
            && self
                .last_alert_at
                .map_or(true, |last| now.saturating_duration_since(last) >= cooldown)
    }
}

/// Advance one key by one frame. Returns true when an alert must be emitted.
fn transition(state: &mut DebounceState, window: DebounceWindow, present: bool, now: Instant) -> bool {
    if !present {
        state.phase = DebouncePhase::Idle;
        state.condition_active = false;
        state.condition_started_at = None;
        return false;
    }

    if state.phase == DebouncePhase::Idle {
        state.phase = DebouncePhase::Pending;
        state.condition_active = true;
        state.condition_started_at = Some(now);
    }

    let started = state.condition_started_at.unwrap_or(now);
    let sustained = now.saturating_duration_since(started) >= window.sustain();
    let cooled = state
        .last_alert_at
        .map_or(true, |last| now.saturating_duration_since(last) >= window.cooldown());

    if sustained && cooled {
        state.last_alert_at = Some(now);
        state.phase = DebouncePhase::Alerted;
        true
    } else {
        false
    }
}

/// Per-key sustain/cooldown state machine shared by every detector
pub struct AlertDebouncer {
    config: DebounceConfig,
    states: HashMap<SignalKey, DebounceState>,
}

impl AlertDebouncer {
    pub fn new(config: DebounceConfig) -> Self {
        Self {
            config,
            states: HashMap::new(),
        }
    }

    /// Feed every raw signal of one frame (or transcript fragment). Keys with
    /// no signal in this frame fall back to idle.
    pub fn observe_frame(&mut self, signals: &[RawSignal], now: Instant) -> Vec<Alert> {
        let mut alerts = Vec::new();
        let mut present = HashSet::new();

        for signal in signals {
            let key = signal.key();
            if !present.insert(key.clone()) {
                continue;
            }

            let window = self.config.window(key.kind);
            let state = self.states.entry(key).or_default();
            if transition(state, window, true, now) {
                alerts.push(Alert::from_signal(signal));
            }
        }

        let config = &self.config;
        self.states.retain(|key, state| {
            if present.contains(key) {
                return true;
            }
            let window = config.window(key.kind);
            transition(state, window, false, now);
            !state.is_settled(window.cooldown(), now)
        });

        alerts
    }

    /// Drop all state belonging to an entity that left the scene
    pub fn forget_entity(&mut self, entity_id: &str) {
        self.states
            .retain(|key, _| key.entity_id.as_deref() != Some(entity_id));
    }

    /// Return every key to idle, keeping cooldown memory
    pub fn interrupt_all(&mut self, now: Instant) {
        self.observe_frame(&[], now);
    }

    pub fn state(&self, key: &SignalKey) -> Option<&DebounceState> {
        self.states.get(key)
    }

    pub fn tracked_keys(&self) -> usize {
        self.states.len()
    }
}

/// Class-wide notification cooldown spanning every key of the class
pub struct NotificationGate {
    cooldowns: HashMap<SignalClass, Duration>,
    last_notified: HashMap<SignalClass, Instant>,
}

impl NotificationGate {
    pub fn new(config: &NotificationConfig) -> Self {
        let cooldowns = [SignalClass::HandMotion, SignalClass::Gaze, SignalClass::Speech]
            .into_iter()
            .map(|class| (class, config.cooldown(class)))
            .collect();

        Self {
            cooldowns,
            last_notified: HashMap::new(),
        }
    }

    /// Whether a notification for `class` may go out at `now`; records it if so
    pub fn admit(&mut self, class: SignalClass, now: Instant) -> bool {
        let cooldown = self.cooldowns.get(&class).copied().unwrap_or_default();
        let open = self
            .last_notified
            .get(&class)
            .map_or(true, |last| now.saturating_duration_since(*last) >= cooldown);

        if open {
            self.last_notified.insert(class, now);
        }
        open
    }

    /// Mark which of a frame's alerts get a desktop notification
    pub fn apply(&mut self, alerts: &mut [Alert], now: Instant) {
        for alert in alerts.iter_mut() {
            alert.notify = self.admit(alert.kind.class(), now);
        }
    }
}
