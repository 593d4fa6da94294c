use super::{Platform, PlatformResult, DATA_DIR_NAME};
use std::path::PathBuf;
use std::process::Command;

pub struct MacOSPlatform;

impl MacOSPlatform {
    pub fn new() -> Self {
        Self
    }

    /// Query sw_vers for a single field
    fn get_sw_vers_output(&self, flag: &str) -> String {
        Command::new("sw_vers")
            .arg(flag)
            .output()
            .ok()
            .and_then(|output| String::from_utf8(output.stdout).ok())
            .map(|s| s.trim().to_string())
            .unwrap_or_else(|| "macOS".to_string())
    }
}

impl Platform for MacOSPlatform {
    fn get_os_name(&self) -> String {
        self.get_sw_vers_output("-productName")
    }

    fn notification_backend(&self) -> &'static str {
        "osascript"
    }

    fn get_data_directory(&self) -> PlatformResult<PathBuf> {
        let home = std::env::var("HOME").map_err(|_| "Could not determine home directory")?;

        let mut path = PathBuf::from(home);
        path.push(DATA_DIR_NAME);

        Ok(path)
    }
}
