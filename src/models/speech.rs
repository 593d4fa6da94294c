// Data models for streaming transcription

use serde::{Deserialize, Serialize};

/// A piece of transcript from the speech recognizer. Partial fragments are
/// re-issued as the recognizer refines the utterance in progress; a final
/// fragment closes the utterance.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct TranscriptFragment {
    pub is_final: bool,
    pub text: String,
}

impl TranscriptFragment {
    pub fn partial(text: impl Into<String>) -> Self {
        Self {
            is_final: false,
            text: text.into(),
        }
    }

    pub fn final_result(text: impl Into<String>) -> Self {
        Self {
            is_final: true,
            text: text.into(),
        }
    }

    /// Lowercased words with surrounding punctuation stripped
    pub fn words(&self) -> Vec<String> {
        self.text
            .split_whitespace()
            .map(|w| {
                w.trim_matches(|c: char| !c.is_alphanumeric() && c != '\'')
                    .to_lowercase()
            })
            .filter(|w| !w.is_empty())
            .collect()
    }
}

#[derive(Debug, thiserror::Error)]
pub enum SpeechError {
    #[error("Audio device unavailable: {0}")]
    DeviceUnavailable(String),

    #[error("Transcription failed: {0}")]
    TranscriptionFailed(String),
}

pub type SpeechResult<T> = Result<T, SpeechError>;
