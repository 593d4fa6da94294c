use super::{Platform, PlatformResult, DATA_DIR_NAME};
use std::path::PathBuf;
use std::process::Command;

pub struct WindowsPlatform;

impl WindowsPlatform {
    pub fn new() -> Self {
        Self
    }

    /// OS caption from wmic, e.g. "Microsoft Windows 11 Pro"
    fn get_windows_caption(&self) -> Option<String> {
        let output = Command::new("wmic")
            .args(["os", "get", "Caption", "/value"])
            .output()
            .ok()?;
        let stdout = String::from_utf8(output.stdout).ok()?;

        stdout
            .lines()
            .find_map(|line| line.trim().strip_prefix("Caption="))
            .map(|caption| caption.to_string())
            .filter(|caption| !caption.is_empty())
    }
}

impl Platform for WindowsPlatform {
    fn get_os_name(&self) -> String {
        self.get_windows_caption()
            .unwrap_or_else(|| "Windows".to_string())
    }

    fn notification_backend(&self) -> &'static str {
        "powershell"
    }

    fn get_data_directory(&self) -> PlatformResult<PathBuf> {
        let appdata = std::env::var("APPDATA")
            .or_else(|_| std::env::var("USERPROFILE"))
            .map_err(|_| "Could not determine user directory")?;

        let mut path = PathBuf::from(appdata);
        path.push(DATA_DIR_NAME);

        Ok(path)
    }
}
