// Landmark extraction bridge
// Abstraction over the hand/pose/face model backend. Inference itself lives
// outside this crate; implementations adapt a backend to `LandmarkSet`.

use crate::models::capture::Frame;
use crate::models::landmarks::{LandmarkResult, LandmarkSet};

/// Frame to landmarks. Called from a vision unit for every frame it takes off
/// the bus, so implementations should return promptly.
pub trait LandmarkExtractor: Send + Sync {
    /// Run inference on a frame. An empty set means nothing was detected.
    fn extract(&self, frame: &Frame) -> LandmarkResult<LandmarkSet>;

    /// Check if models are loaded
    fn is_initialized(&self) -> bool {
        true
    }

    fn model_info(&self) -> String;
}

/// Extractor that never detects anything
pub struct NullExtractor;

impl LandmarkExtractor for NullExtractor {
    fn extract(&self, _frame: &Frame) -> LandmarkResult<LandmarkSet> {
        Ok(LandmarkSet::default())
    }

    fn model_info(&self) -> String {
        "Null extractor (no detections)".to_string()
    }
}
