// Filler word detection over streaming transcript fragments

use crate::core::config::{CoachConfig, DebounceConfig, NotificationConfig, SpeechConfig};
use crate::core::debounce::{AlertDebouncer, NotificationGate};
use crate::models::alert::{Alert, RawSignal, SignalKind};
use crate::models::speech::TranscriptFragment;
use std::collections::HashSet;
use std::time::Instant;

/// A configured filler, as typed and as normalized words
#[derive(Debug, Clone)]
struct Filler {
    token: String,
    words: Vec<String>,
}

/// Matches fillers in partial and final transcript fragments
///
/// Partial fragments are checked by substring and each filler fires once per
/// utterance in progress. A final fragment is matched word by word (multi-word
/// fillers as consecutive words), fires each filler once, and closes the
/// utterance.
pub struct FillerDetector {
    fillers: Vec<Filler>,
    detected: HashSet<String>,
    debouncer: AlertDebouncer,
    gate: NotificationGate,
}

impl FillerDetector {
    pub fn new(speech: &SpeechConfig, debounce: DebounceConfig, notifications: &NotificationConfig) -> Self {
        let fillers = speech
            .filler_words
            .iter()
            .map(|word| {
                let token = word.trim().to_lowercase();
                let words = TranscriptFragment::final_result(token.clone()).words();
                Filler { token, words }
            })
            .filter(|filler| !filler.words.is_empty())
            .collect();

        Self {
            fillers,
            detected: HashSet::new(),
            debouncer: AlertDebouncer::new(debounce),
            gate: NotificationGate::new(notifications),
        }
    }

    pub fn from_config(config: &CoachConfig) -> Self {
        Self::new(&config.speech, config.debounce.clone(), &config.notifications)
    }

    /// Raw filler signals for one fragment, in order of appearance
    pub fn scan(&mut self, fragment: &TranscriptFragment, now: Instant) -> Vec<RawSignal> {
        let tokens = if fragment.is_final {
            let tokens = self.scan_final(fragment);
            self.detected.clear();
            tokens
        } else {
            self.scan_partial(fragment)
        };

        tokens
            .into_iter()
            .map(|token| RawSignal::new(SignalKind::Filler, Some(token), 1.0, now))
            .collect()
    }

    fn scan_final(&self, fragment: &TranscriptFragment) -> Vec<String> {
        let words = fragment.words();
        let mut seen = HashSet::new();
        let mut tokens = Vec::new();

        for start in 0..words.len() {
            for filler in &self.fillers {
                if words[start..].starts_with(&filler.words) && seen.insert(filler.token.clone()) {
                    tokens.push(filler.token.clone());
                }
            }
        }

        tokens
    }

    fn scan_partial(&mut self, fragment: &TranscriptFragment) -> Vec<String> {
        let text = fragment.text.to_lowercase();
        let mut tokens = Vec::new();

        for filler in &self.fillers {
            if text.contains(filler.token.as_str()) && self.detected.insert(filler.token.clone()) {
                tokens.push(filler.token.clone());
            }
        }

        tokens
    }

    /// Scan a fragment and run its signals through debounce and the speech gate
    pub fn process(&mut self, fragment: &TranscriptFragment, now: Instant) -> Vec<Alert> {
        let signals = self.scan(fragment, now);

        let mut alerts = self.debouncer.observe_frame(&signals, now);
        self.gate.apply(&mut alerts, now);
        alerts
    }

    /// Fillers already reported for the utterance in progress
    pub fn detected_in_utterance(&self) -> usize {
        self.detected.len()
    }
}
