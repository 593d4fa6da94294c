use crate::models::alert::{SignalClass, SignalKind};
use serde::{Deserialize, Serialize};
use std::path::{Path, PathBuf};
use std::time::Duration;

type ConfigResult<T> = Result<T, Box<dyn std::error::Error + Send + Sync>>;

/// Upper bound for every seconds field
pub const MAX_DURATION_SECS: f32 = 3600.0;

pub const MAX_NOTIFICATION_TIMEOUT_SECS: u32 = 60;

/// A finite seconds value in [0, MAX_DURATION_SECS], or (0, MAX_DURATION_SECS]
/// when zero is not allowed
fn check_secs(name: &str, value: f32, allow_zero: bool) -> ConfigResult<()> {
    let above_floor = if allow_zero { value >= 0.0 } else { value > 0.0 };
    if value.is_finite() && above_floor && value <= MAX_DURATION_SECS {
        return Ok(());
    }

    let floor = if allow_zero { "[0" } else { "(0" };
    Err(format!(
        "Invalid {}: {}. Must be in {}, {}] seconds",
        name, value, floor, MAX_DURATION_SECS
    )
    .into())
}

/// Coaching session configuration
#[derive(Debug, Clone, Serialize, Deserialize, PartialEq)]
#[serde(default)]
pub struct CoachConfig {
    pub motion: MotionConfig,
    pub gaze: GazeConfig,
    pub speech: SpeechConfig,
    pub debounce: DebounceConfig,
    pub notifications: NotificationConfig,
    pub pipeline: PipelineConfig,
    pub logging: LoggingConfig,
}

#[derive(Debug, Clone, Serialize, Deserialize, PartialEq)]
#[serde(default)]
pub struct MotionConfig {
    /// Wrist displacement between frames, in normalized image units
    pub shake_threshold: f32,
    /// Continuous visibility before a hand counts as held too long
    pub held_too_long_secs: f32,
}

impl Default for MotionConfig {
    fn default() -> Self {
        Self {
            shake_threshold: 0.06,
            held_too_long_secs: 3.0,
        }
    }
}

#[derive(Debug, Clone, Serialize, Deserialize, PartialEq)]
#[serde(default)]
pub struct GazeConfig {
    /// Face must be continuously detected this long before gaze is evaluated
    pub stability_window_secs: f32,
    /// Acceptable iris position across the eye-corner span
    pub horizontal_range: (f32, f32),
    /// Acceptable iris position across the eyelid span
    pub vertical_range: (f32, f32),
    /// Eyelid gap below which the eyes count as closed
    pub eye_closed_epsilon: f32,
}

impl Default for GazeConfig {
    fn default() -> Self {
        Self {
            stability_window_secs: 1.5,
            horizontal_range: (0.25, 0.75),
            vertical_range: (0.3, 0.7),
            eye_closed_epsilon: 0.01,
        }
    }
}

#[derive(Debug, Clone, Serialize, Deserialize, PartialEq)]
#[serde(default)]
pub struct SpeechConfig {
    /// Filler tokens, matched case-insensitively; may span several words
    pub filler_words: Vec<String>,
}

impl Default for SpeechConfig {
    fn default() -> Self {
        let filler_words = [
            "uh", "um", "äh", "ähm", "you know", "actually", "basically", "ehh", "i mean",
            "well", "yeah", "eeh", "aahh", "oooh",
        ];

        Self {
            filler_words: filler_words.iter().map(|w| w.to_string()).collect(),
        }
    }
}

/// Sustain and cooldown for one signal kind
#[derive(Debug, Clone, Copy, Serialize, Deserialize, PartialEq)]
pub struct DebounceWindow {
    pub sustain_secs: f32,
    pub cooldown_secs: f32,
}

impl DebounceWindow {
    pub fn new(sustain_secs: f32, cooldown_secs: f32) -> Self {
        Self {
            sustain_secs,
            cooldown_secs,
        }
    }

    pub fn sustain(&self) -> Duration {
        Duration::from_secs_f32(self.sustain_secs)
    }

    pub fn cooldown(&self) -> Duration {
        Duration::from_secs_f32(self.cooldown_secs)
    }
}

/// Per-key log debounce windows
#[derive(Debug, Clone, Serialize, Deserialize, PartialEq)]
#[serde(default)]
pub struct DebounceConfig {
    pub shake: DebounceWindow,
    pub held_too_long: DebounceWindow,
    pub gaze_away: DebounceWindow,
    pub filler: DebounceWindow,
}

impl Default for DebounceConfig {
    fn default() -> Self {
        Self {
            shake: DebounceWindow::new(0.0, 2.0),
            held_too_long: DebounceWindow::new(0.0, 2.0),
            gaze_away: DebounceWindow::new(2.0, 5.0),
            filler: DebounceWindow::new(0.0, 0.0),
        }
    }
}

impl DebounceConfig {
    pub fn window(&self, kind: SignalKind) -> DebounceWindow {
        match kind {
            SignalKind::Shake => self.shake,
            SignalKind::HeldTooLong => self.held_too_long,
            SignalKind::GazeAway => self.gaze_away,
            SignalKind::Filler => self.filler,
        }
    }
}

#[derive(Debug, Clone, Serialize, Deserialize, PartialEq)]
#[serde(default)]
pub struct NotificationConfig {
    /// Deliver desktop notifications; alerts are logged either way
    pub enabled: bool,
    pub app_name: String,
    pub timeout_seconds: u32,
    /// Notification calls allowed in flight before new ones are dropped
    pub max_in_flight: usize,
    /// Shared by shake and held-too-long alerts across all hands
    pub hand_motion_cooldown_secs: f32,
    pub gaze_cooldown_secs: f32,
    pub filler_cooldown_secs: f32,
}

impl Default for NotificationConfig {
    fn default() -> Self {
        Self {
            enabled: true,
            app_name: "Speech Coach".to_string(),
            timeout_seconds: 5,
            max_in_flight: 4,
            hand_motion_cooldown_secs: 3.0,
            gaze_cooldown_secs: 5.0,
            filler_cooldown_secs: 0.0,
        }
    }
}

impl NotificationConfig {
    pub fn cooldown(&self, class: SignalClass) -> Duration {
        let secs = match class {
            SignalClass::HandMotion => self.hand_motion_cooldown_secs,
            SignalClass::Gaze => self.gaze_cooldown_secs,
            SignalClass::Speech => self.filler_cooldown_secs,
        };
        Duration::from_secs_f32(secs)
    }
}

#[derive(Debug, Clone, Serialize, Deserialize, PartialEq)]
#[serde(default)]
pub struct PipelineConfig {
    /// Frames buffered per consumer before new frames are dropped
    pub frame_bus_capacity: usize,
    /// Idle wait between bus checks
    pub poll_interval_ms: u64,
    /// Time units get to exit after shutdown before they are aborted
    pub shutdown_grace_ms: u64,
    /// Stop the whole session when any unit fails
    pub abort_on_unit_failure: bool,
}

impl Default for PipelineConfig {
    fn default() -> Self {
        Self {
            frame_bus_capacity: 5,
            poll_interval_ms: 10,
            shutdown_grace_ms: 500,
            abort_on_unit_failure: false,
        }
    }
}

impl PipelineConfig {
    pub fn poll_interval(&self) -> Duration {
        Duration::from_millis(self.poll_interval_ms)
    }

    pub fn shutdown_grace(&self) -> Duration {
        Duration::from_millis(self.shutdown_grace_ms)
    }
}

#[derive(Debug, Clone, Serialize, Deserialize, PartialEq)]
#[serde(default)]
pub struct LoggingConfig {
    /// "error", "warn", "info", "debug" or "trace"
    pub level: String,
    pub json: bool,
}

impl Default for LoggingConfig {
    fn default() -> Self {
        Self {
            level: "info".to_string(),
            json: false,
        }
    }
}

impl Default for CoachConfig {
    fn default() -> Self {
        Self {
            motion: MotionConfig::default(),
            gaze: GazeConfig::default(),
            speech: SpeechConfig::default(),
            debounce: DebounceConfig::default(),
            notifications: NotificationConfig::default(),
            pipeline: PipelineConfig::default(),
            logging: LoggingConfig::default(),
        }
    }
}

impl CoachConfig {
    /// Load configuration from the default location, creating it with defaults if it doesn't exist
    pub fn load() -> ConfigResult<Self> {
        let config_path = Self::get_config_path()?;

        if config_path.exists() {
            Self::load_from(&config_path)
        } else {
            let config = Self::default();
            config.save_to(&config_path)?;
            Ok(config)
        }
    }

    /// Load and validate configuration from an explicit file
    pub fn load_from(path: &Path) -> ConfigResult<Self> {
        let contents = std::fs::read_to_string(path)?;
        let config: CoachConfig = serde_json::from_str(&contents)?;
        config.validate()?;
        Ok(config)
    }

    /// Save configuration to the default location
    pub fn save(&self) -> ConfigResult<()> {
        self.save_to(&Self::get_config_path()?)
    }

    pub fn save_to(&self, path: &Path) -> ConfigResult<()> {
        self.validate()?;

        if let Some(parent) = path.parent() {
            std::fs::create_dir_all(parent)?;
        }

        let contents = serde_json::to_string_pretty(self)?;
        std::fs::write(path, contents)?;

        Ok(())
    }

    /// Validate configuration values
    pub fn validate(&self) -> ConfigResult<()> {
        if !(self.motion.shake_threshold > 0.0 && self.motion.shake_threshold <= 1.0) {
            return Err(format!(
                "Invalid shake threshold: {}. Must be in (0.0, 1.0]",
                self.motion.shake_threshold
            )
            .into());
        }

        check_secs("held-too-long duration", self.motion.held_too_long_secs, false)?;
        check_secs("gaze stability window", self.gaze.stability_window_secs, true)?;

        for (name, (low, high)) in [
            ("horizontal", self.gaze.horizontal_range),
            ("vertical", self.gaze.vertical_range),
        ] {
            if !(low < high) {
                return Err(format!(
                    "Invalid gaze {} range: ({}, {}). Lower bound must be below upper bound",
                    name, low, high
                )
                .into());
            }
        }

        if !(self.gaze.eye_closed_epsilon >= 0.0) {
            return Err(format!(
                "Invalid eye-closed epsilon: {}. Must not be negative",
                self.gaze.eye_closed_epsilon
            )
            .into());
        }

        if self.speech.filler_words.iter().any(|w| w.trim().is_empty()) {
            return Err("Filler words cannot be blank".into());
        }

        for kind in [
            SignalKind::Shake,
            SignalKind::HeldTooLong,
            SignalKind::GazeAway,
            SignalKind::Filler,
        ] {
            let window = self.debounce.window(kind);
            check_secs(&format!("{} sustain", kind.to_string()), window.sustain_secs, true)?;
            check_secs(&format!("{} cooldown", kind.to_string()), window.cooldown_secs, true)?;
        }

        let n = &self.notifications;
        check_secs("hand motion notification cooldown", n.hand_motion_cooldown_secs, true)?;
        check_secs("gaze notification cooldown", n.gaze_cooldown_secs, true)?;
        check_secs("filler notification cooldown", n.filler_cooldown_secs, true)?;

        if n.timeout_seconds == 0 || n.timeout_seconds > MAX_NOTIFICATION_TIMEOUT_SECS {
            return Err(format!(
                "Invalid notification timeout: {} s. Must be between 1 and {}",
                n.timeout_seconds, MAX_NOTIFICATION_TIMEOUT_SECS
            )
            .into());
        }

        if n.max_in_flight == 0 {
            return Err("Notification max_in_flight must be at least 1".into());
        }

        if self.pipeline.frame_bus_capacity == 0 || self.pipeline.frame_bus_capacity > 120 {
            return Err(format!(
                "Invalid frame bus capacity: {}. Must be between 1 and 120",
                self.pipeline.frame_bus_capacity
            )
            .into());
        }

        if self.pipeline.poll_interval_ms == 0 || self.pipeline.poll_interval_ms > 1000 {
            return Err(format!(
                "Invalid poll interval: {} ms. Must be between 1 and 1000",
                self.pipeline.poll_interval_ms
            )
            .into());
        }

        let valid_levels = ["error", "warn", "info", "debug", "trace"];
        if !valid_levels.contains(&self.logging.level.to_lowercase().as_str()) {
            return Err(format!(
                "Invalid log level: {}. Must be one of: error, warn, info, debug, trace",
                self.logging.level
            )
            .into());
        }

        Ok(())
    }

    /// Reset to default configuration
    pub fn reset() -> ConfigResult<Self> {
        let config = Self::default();
        config.save()?;
        Ok(config)
    }

    /// Get the configuration file path
    fn get_config_path() -> ConfigResult<PathBuf> {
        let mut path = crate::platform::get_platform().get_data_directory()?;
        path.push("config");
        path.push("settings.json");

        Ok(path)
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use std::fs;

    fn get_test_config_path(name: &str) -> PathBuf {
        let mut path = std::env::temp_dir();
        path.push(format!("speech_coach_test_config_{}", name));
        path.push("settings.json");
        path
    }

    fn cleanup_test_config(path: &Path) {
        if let Some(parent) = path.parent() {
            let _ = fs::remove_dir_all(parent);
        }
    }

    #[test]
    fn test_default_config() {
        let config = CoachConfig::default();
        assert_eq!(config.motion.shake_threshold, 0.06);
        assert_eq!(config.motion.held_too_long_secs, 3.0);
        assert_eq!(config.gaze.stability_window_secs, 1.5);
        assert_eq!(config.gaze.horizontal_range, (0.25, 0.75));
        assert_eq!(config.pipeline.frame_bus_capacity, 5);
        assert_eq!(config.pipeline.poll_interval_ms, 10);
        assert_eq!(config.notifications.hand_motion_cooldown_secs, 3.0);
        assert!(config.speech.filler_words.contains(&"um".to_string()));
        assert!(config.validate().is_ok());
    }

    #[test]
    fn test_config_validation() {
        let mut config = CoachConfig::default();

        config.motion.shake_threshold = 0.0;
        assert!(config.validate().is_err());
        config.motion.shake_threshold = 0.06;

        config.gaze.vertical_range = (0.7, 0.3);
        assert!(config.validate().is_err());
        config.gaze.vertical_range = (0.3, 0.7);

        config.debounce.gaze_away.cooldown_secs = -1.0;
        assert!(config.validate().is_err());
        config.debounce.gaze_away.cooldown_secs = 5.0;

        config.pipeline.frame_bus_capacity = 0;
        assert!(config.validate().is_err());
        config.pipeline.frame_bus_capacity = 5;

        config.speech.filler_words.push("  ".to_string());
        assert!(config.validate().is_err());
        config.speech.filler_words.pop();

        config.logging.level = "loud".to_string();
        assert!(config.validate().is_err());
        config.logging.level = "debug".to_string();

        assert!(config.validate().is_ok());
    }

    #[test]
    fn test_partial_config_fills_defaults() {
        let json = r#"{ "motion": { "shake_threshold": 0.1 }, "pipeline": { "frame_bus_capacity": 2 } }"#;
        let config: CoachConfig = serde_json::from_str(json).unwrap();

        assert_eq!(config.motion.shake_threshold, 0.1);
        assert_eq!(config.motion.held_too_long_secs, 3.0);
        assert_eq!(config.pipeline.frame_bus_capacity, 2);
        assert_eq!(config.gaze, GazeConfig::default());
    }

    #[test]
    fn test_save_and_load_from_path() {
        let path = get_test_config_path("roundtrip");
        cleanup_test_config(&path);

        let mut config = CoachConfig::default();
        config.notifications.gaze_cooldown_secs = 8.0;
        config.save_to(&path).unwrap();

        let loaded = CoachConfig::load_from(&path).unwrap();
        assert_eq!(loaded, config);

        cleanup_test_config(&path);
    }

    #[test]
    fn test_invalid_file_is_rejected() {
        let path = get_test_config_path("invalid");
        cleanup_test_config(&path);
        fs::create_dir_all(path.parent().unwrap()).unwrap();
        fs::write(&path, r#"{ "pipeline": { "poll_interval_ms": 0 } }"#).unwrap();

        assert!(CoachConfig::load_from(&path).is_err());

        cleanup_test_config(&path);
    }

    #[test]
    fn test_validate_rejects_oversized_durations() {
        let mut config = CoachConfig::default();

        config.motion.held_too_long_secs = 1e30;
        assert!(config.validate().is_err());
        config.motion.held_too_long_secs = f32::INFINITY;
        assert!(config.validate().is_err());
        config.motion.held_too_long_secs = 3.0;

        config.gaze.stability_window_secs = f32::NAN;
        assert!(config.validate().is_err());
        config.gaze.stability_window_secs = 1.5;

        config.debounce.held_too_long.sustain_secs = MAX_DURATION_SECS + 1.0;
        assert!(config.validate().is_err());
        config.debounce.held_too_long.sustain_secs = MAX_DURATION_SECS;
        assert!(config.validate().is_ok());
        config.debounce.held_too_long.sustain_secs = 0.0;

        config.notifications.gaze_cooldown_secs = 1e12;
        assert!(config.validate().is_err());
        config.notifications.gaze_cooldown_secs = 5.0;

        assert!(config.validate().is_ok());
    }

    #[test]
    fn test_oversized_duration_file_is_rejected() {
        let path = get_test_config_path("oversized");
        cleanup_test_config(&path);
        fs::create_dir_all(path.parent().unwrap()).unwrap();
        fs::write(&path, r#"{ "motion": { "held_too_long_secs": 1e30 } }"#).unwrap();

        assert!(CoachConfig::load_from(&path).is_err());

        cleanup_test_config(&path);
    }

    #[test]
    fn test_validate_bounds_notification_timeout() {
        let mut config = CoachConfig::default();

        config.notifications.timeout_seconds = 0;
        assert!(config.validate().is_err());

        config.notifications.timeout_seconds = u32::MAX;
        assert!(config.validate().is_err());

        config.notifications.timeout_seconds = MAX_NOTIFICATION_TIMEOUT_SECS;
        assert!(config.validate().is_ok());
    }

    #[test]
    fn test_debounce_window_lookup() {
        let config = DebounceConfig::default();
        assert_eq!(config.window(SignalKind::GazeAway).sustain(), Duration::from_secs(2));
        assert_eq!(config.window(SignalKind::Shake).cooldown(), Duration::from_secs(2));
        assert_eq!(
            NotificationConfig::default().cooldown(SignalClass::HandMotion),
            Duration::from_secs(3)
        );
    }
}
