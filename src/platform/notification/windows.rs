use super::{run_command, Notification, Notifier, NotifyResult};
use async_trait::async_trait;
use tokio::process::Command;

/// Tray balloon tip through PowerShell and Windows Forms
pub struct WindowsNotifier;

impl WindowsNotifier {
    pub fn new() -> Self {
        Self
    }

    fn script(notification: &Notification) -> String {
        format!(
            "Add-Type -AssemblyName System.Windows.Forms; \
             $n = New-Object System.Windows.Forms.NotifyIcon; \
             $n.Icon = [System.Drawing.SystemIcons]::Information; \
             $n.Text = '{app}'; \
             $n.Visible = $true; \
             $n.ShowBalloonTip({ms}, '{title}', '{message}', 'Warning'); \
             Start-Sleep -Seconds {secs}; \
             $n.Dispose()",
            app = quote(&notification.app_name),
            ms = notification.timeout_seconds.saturating_mul(1000),
            title = quote(&notification.title),
            message = quote(&notification.message),
            secs = notification.timeout_seconds,
        )
    }
}

/// PowerShell single-quoted string escaping
fn quote(text: &str) -> String {
    text.replace('\'', "''")
}

#[async_trait]
impl Notifier for WindowsNotifier {
    async fn notify(&self, notification: &Notification) -> NotifyResult<()> {
        let mut command = Command::new("powershell");
        command
            .arg("-NoProfile")
            .arg("-NonInteractive")
            .arg("-Command")
            .arg(Self::script(notification));
        run_command(command).await
    }
}
