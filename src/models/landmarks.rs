// Data models for hand, body and face landmarks produced by the vision extractor

use serde::{Deserialize, Serialize};

// ==============================================================================
// Landmark Set (Unified Result)
// ==============================================================================

/// Everything the extractor found in a single frame. Each part is absent when
/// nothing was detected; that is a normal outcome, not an error.
#[derive(Debug, Clone, Default, Serialize, Deserialize)]
pub struct LandmarkSet {
    #[serde(default)]
    pub hands: Vec<HandPose>,
    #[serde(default)]
    pub body_pose: Option<BodyPose>,
    #[serde(default)]
    pub face_mesh: Option<FaceMesh>,
}

impl LandmarkSet {
    pub fn is_empty(&self) -> bool {
        self.hands.is_empty() && self.body_pose.is_none() && self.face_mesh.is_none()
    }

    /// Vertical position of the head (nose), if the body pose was detected
    pub fn head_y(&self) -> Option<f32> {
        self.body_pose
            .as_ref()
            .and_then(|pose| pose.landmark(BodyLandmark::Nose))
            .map(|nose| nose.y)
    }
}

// ==============================================================================
// Body Pose (33 keypoints)
// ==============================================================================

#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct BodyPose {
    pub keypoints: Vec<Keypoint3D>, // 33 body landmarks
}

impl BodyPose {
    pub fn landmark(&self, landmark: BodyLandmark) -> Option<&Keypoint3D> {
        self.keypoints.get(landmark as usize)
    }
}

/// MediaPipe Pose landmark indices used by the detectors
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
#[repr(u8)]
pub enum BodyLandmark {
    Nose = 0,
    LeftEye = 2,
    RightEye = 5,
    LeftShoulder = 11,
    RightShoulder = 12,
    LeftWrist = 15,
    RightWrist = 16,
}

// ==============================================================================
// Face Mesh (478 landmarks with refined irises)
// ==============================================================================

#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct FaceMesh {
    pub landmarks: Vec<Keypoint3D>,
}

impl FaceMesh {
    pub fn landmark(&self, index: usize) -> Option<&Keypoint3D> {
        self.landmarks.get(index)
    }
}

/// Face mesh indices for the left eye region (refined mesh)
pub mod face_index {
    pub const LEFT_IRIS: [usize; 4] = [474, 475, 476, 477];
    pub const LEFT_EYE_CORNERS: [usize; 2] = [33, 133];
    /// Upper and lower lid of each eye: [upper_l, lower_l, upper_r, lower_r]
    pub const EYE_LIDS: [usize; 4] = [159, 145, 386, 374];
    pub const REFINED_MESH_LEN: usize = 478;
}

// ==============================================================================
// Hand Tracking (21 keypoints per hand)
// ==============================================================================

#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct HandPose {
    #[serde(default)]
    pub handedness: Option<Handedness>,
    pub landmarks: Vec<Keypoint3D>, // 21 hand landmarks
    #[serde(default = "default_confidence")]
    pub confidence: f32,
}

impl HandPose {
    pub fn wrist(&self) -> Option<&Keypoint3D> {
        self.landmarks.get(HandLandmark::Wrist as usize)
    }
}

#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum Handedness {
    Left,
    Right,
}

/// MediaPipe Hand landmark indices used by the detectors
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
#[repr(u8)]
pub enum HandLandmark {
    Wrist = 0,
    IndexFingerTip = 8,
    MiddleFingerTip = 12,
}

// ==============================================================================
// Shared: 3D Keypoint
// ==============================================================================

/// A 3D keypoint with confidence score
#[derive(Debug, Clone, Copy, PartialEq, Serialize, Deserialize)]
pub struct Keypoint3D {
    pub x: f32, // Normalized [0, 1] for image coordinates
    pub y: f32, // Normalized [0, 1], grows downwards
    #[serde(default)]
    pub z: f32,
    #[serde(default = "default_confidence")]
    pub confidence: f32,
}

fn default_confidence() -> f32 {
    1.0
}

impl Keypoint3D {
    pub fn new(x: f32, y: f32, z: f32, confidence: f32) -> Self {
        Self {
            x,
            y,
            z,
            confidence,
        }
    }

    /// Planar point with full confidence
    pub fn xy(x: f32, y: f32) -> Self {
        Self::new(x, y, 0.0, 1.0)
    }

    /// Euclidean distance in the image plane
    pub fn planar_distance(&self, other: &Keypoint3D) -> f32 {
        ((self.x - other.x).powi(2) + (self.y - other.y).powi(2)).sqrt()
    }

    pub fn is_visible(&self, threshold: f32) -> bool {
        self.confidence >= threshold
    }
}

// ==============================================================================
// Error Types
// ==============================================================================

#[derive(Debug, thiserror::Error)]
pub enum LandmarkError {
    #[error("Landmark model not initialized")]
    NotInitialized,

    #[error("Model loading failed: {0}")]
    ModelLoadFailed(String),

    #[error("Inference failed: {0}")]
    InferenceFailed(String),
}

pub type LandmarkResult<T> = Result<T, LandmarkError>;
