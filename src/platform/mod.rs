use std::path::PathBuf;

#[cfg(target_os = "macos")]
mod macos;

#[cfg(target_os = "windows")]
mod windows;

#[cfg(target_os = "linux")]
mod linux;

pub mod landmarks;
pub mod notification;
pub mod replay;

pub type PlatformResult<T> = Result<T, Box<dyn std::error::Error + Send + Sync>>;

/// Name of the per-user directory holding configuration
pub const DATA_DIR_NAME: &str = ".speech_coach";

/// Platform abstraction trait for OS-specific operations
pub trait Platform: Send + Sync {
    /// Get the operating system name
    fn get_os_name(&self) -> String;

    /// Program used to show desktop notifications
    fn notification_backend(&self) -> &'static str;

    /// Get the default data directory for the application
    fn get_data_directory(&self) -> PlatformResult<PathBuf>;
}

/// Get the current platform implementation
pub fn get_platform() -> Box<dyn Platform> {
    #[cfg(target_os = "macos")]
    {
        Box::new(macos::MacOSPlatform::new())
    }

    #[cfg(target_os = "windows")]
    {
        Box::new(windows::WindowsPlatform::new())
    }

    #[cfg(target_os = "linux")]
    {
        Box::new(linux::LinuxPlatform::new())
    }
}
