pub mod config;
pub mod debounce;
pub mod shutdown;

// Frame fan-out and capture
pub mod frame_bus;
pub mod frame_source;

// Detectors
pub mod motion_detector;
pub mod gaze_detector;
pub mod filler_detector;

// Session units and alert delivery
pub mod alert_sink;
pub mod vision_unit;
pub mod speech_unit;
pub mod session_supervisor;
