use super::{run_command, Notification, Notifier, NotifyResult};
use async_trait::async_trait;
use tokio::process::Command;

/// Notification Center through `osascript`
pub struct MacOSNotifier;

impl MacOSNotifier {
    pub fn new() -> Self {
        Self
    }

    fn script(notification: &Notification) -> String {
        format!(
            "display notification \"{}\" with title \"{}\" subtitle \"{}\"",
            escape(&notification.message),
            escape(&notification.app_name),
            escape(&notification.title)
        )
    }
}

/// AppleScript string literal escaping
fn escape(text: &str) -> String {
    text.replace('\\', "\\\\").replace('"', "\\\"")
}

#[async_trait]
impl Notifier for MacOSNotifier {
    async fn notify(&self, notification: &Notification) -> NotifyResult<()> {
        let mut command = Command::new("osascript");
        command.arg("-e").arg(Self::script(notification));
        run_command(command).await
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_script_escapes_quotes() {
        let notification = Notification {
            title: "Filler Word Alert".to_string(),
            message: "Filler word detected: \"UM\"".to_string(),
            app_name: "Speech Coach".to_string(),
            timeout_seconds: 5,
        };

        let script = MacOSNotifier::script(&notification);
        assert_eq!(
            script,
            "display notification \"Filler word detected: \\\"UM\\\"\" with title \"Speech Coach\" subtitle \"Filler Word Alert\""
        );
    }
}
