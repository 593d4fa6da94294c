use super::{Platform, PlatformResult, DATA_DIR_NAME};
use std::collections::HashMap;
use std::path::PathBuf;

pub struct LinuxPlatform;

impl LinuxPlatform {
    pub fn new() -> Self {
        Self
    }

    /// Read /etc/os-release to get distribution info
    fn read_os_release(&self) -> HashMap<String, String> {
        let mut map = HashMap::new();

        if let Ok(content) = std::fs::read_to_string("/etc/os-release") {
            for line in content.lines() {
                if let Some((key, value)) = line.split_once('=') {
                    let value = value.trim_matches('"').to_string();
                    map.insert(key.to_string(), value);
                }
            }
        }

        map
    }
}

impl Platform for LinuxPlatform {
    fn get_os_name(&self) -> String {
        let os_release = self.read_os_release();

        // Try PRETTY_NAME first, then NAME, then fallback
        os_release
            .get("PRETTY_NAME")
            .or_else(|| os_release.get("NAME"))
            .cloned()
            .unwrap_or_else(|| "Linux".to_string())
    }

    fn notification_backend(&self) -> &'static str {
        "notify-send"
    }

    fn get_data_directory(&self) -> PlatformResult<PathBuf> {
        let home = std::env::var("HOME").map_err(|_| "Could not determine home directory")?;

        let mut path = PathBuf::from(home);
        path.push(DATA_DIR_NAME);

        Ok(path)
    }
}
