use super::{run_command, Notification, Notifier, NotifyResult};
use async_trait::async_trait;
use tokio::process::Command;

/// libnotify through `notify-send`
pub struct LinuxNotifier;

impl LinuxNotifier {
    pub fn new() -> Self {
        Self
    }

    fn command(notification: &Notification) -> Command {
        let mut command = Command::new("notify-send");
        command
            .arg("--app-name")
            .arg(&notification.app_name)
            .arg("--expire-time")
            .arg(notification.timeout_seconds.saturating_mul(1000).to_string())
            .arg(&notification.title)
            .arg(&notification.message);
        command
    }
}

#[async_trait]
impl Notifier for LinuxNotifier {
    async fn notify(&self, notification: &Notification) -> NotifyResult<()> {
        run_command(Self::command(notification)).await
    }
}
