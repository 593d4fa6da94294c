// Data models for frames, landmarks, transcripts, alerts and sessions

pub mod alert;
pub mod capture;
pub mod landmarks;
pub mod session;
pub mod speech;
