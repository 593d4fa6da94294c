// Desktop notification delivery
// Each platform module shells out to the notifier its desktop ships with

use async_trait::async_trait;
use std::sync::Arc;
use tokio::process::Command;

#[cfg(target_os = "macos")]
pub mod macos;

#[cfg(target_os = "macos")]
pub use macos::MacOSNotifier as DesktopNotifier;

#[cfg(target_os = "windows")]
pub mod windows;

#[cfg(target_os = "windows")]
pub use windows::WindowsNotifier as DesktopNotifier;

#[cfg(target_os = "linux")]
pub mod linux;

#[cfg(target_os = "linux")]
pub use linux::LinuxNotifier as DesktopNotifier;

/// A single desktop notification
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct Notification {
    pub title: String,
    pub message: String,
    pub app_name: String,
    pub timeout_seconds: u32,
}

#[derive(Debug, thiserror::Error)]
pub enum NotifyError {
    #[error("Notifier not available: {0}")]
    Unavailable(String),

    #[error("Notifier exited with failure: {0}")]
    CommandFailed(String),

    #[error("IO error: {0}")]
    Io(#[from] std::io::Error),
}

pub type NotifyResult<T> = Result<T, NotifyError>;

#[async_trait]
pub trait Notifier: Send + Sync {
    async fn notify(&self, notification: &Notification) -> NotifyResult<()>;
}

/// Writes notifications to the log instead of the desktop
pub struct LogNotifier;

#[async_trait]
impl Notifier for LogNotifier {
    async fn notify(&self, notification: &Notification) -> NotifyResult<()> {
        tracing::info!(
            title = %notification.title,
            app = %notification.app_name,
            "{}",
            notification.message
        );
        Ok(())
    }
}

/// Pick the notifier for this session
pub fn default_notifier(enabled: bool) -> Arc<dyn Notifier> {
    if !enabled {
        return Arc::new(LogNotifier);
    }

    #[cfg(any(target_os = "macos", target_os = "windows", target_os = "linux"))]
    {
        Arc::new(DesktopNotifier::new())
    }

    #[cfg(not(any(target_os = "macos", target_os = "windows", target_os = "linux")))]
    {
        Arc::new(LogNotifier)
    }
}

/// Run a notifier command to completion and map its exit status
pub(crate) async fn run_command(mut command: Command) -> NotifyResult<()> {
    let output = command.kill_on_drop(true).output().await.map_err(|e| match e.kind() {
        std::io::ErrorKind::NotFound => NotifyError::Unavailable(e.to_string()),
        _ => NotifyError::Io(e),
    })?;

    if output.status.success() {
        Ok(())
    } else {
        let stderr = String::from_utf8_lossy(&output.stderr);
        Err(NotifyError::CommandFailed(format!(
            "{}: {}",
            output.status,
            stderr.trim()
        )))
    }
}
