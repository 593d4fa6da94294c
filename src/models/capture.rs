// Data structures for camera frames

use std::time::Instant;

/// A captured camera frame
#[derive(Debug, Clone)]
pub struct Frame {
    pub sequence: u64,
    pub captured_at: Instant,
    pub timestamp: i64, // Wall clock, milliseconds since epoch
    pub width: u32,
    pub height: u32,
    pub data: Vec<u8>,
    pub format: PixelFormat,
}

impl Frame {
    /// Frame with no pixel payload, stamped now
    pub fn empty(sequence: u64) -> Self {
        Self {
            sequence,
            captured_at: Instant::now(),
            timestamp: chrono::Utc::now().timestamp_millis(),
            width: 0,
            height: 0,
            data: Vec::new(),
            format: PixelFormat::RGB8,
        }
    }
}

/// Pixel format of captured frames
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum PixelFormat {
    RGB8,
    BGR8,
    RGBA8,
}

/// Error types for frame acquisition
#[derive(Debug, thiserror::Error)]
pub enum CaptureError {
    #[error("Capture device unavailable: {0}")]
    DeviceUnavailable(String),

    #[error("Frame read failed: {0}")]
    ReadFailed(String),

    #[error("Frame source exhausted")]
    EndOfStream,
}

impl CaptureError {
    /// Whether the capture unit can keep going after this error
    pub fn is_transient(&self) -> bool {
        matches!(self, CaptureError::ReadFailed(_))
    }
}

pub type CaptureResult<T> = Result<T, CaptureError>;
