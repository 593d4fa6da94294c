// Alert sink - logs every alert and hands admitted ones to the notifier
//
// Notification calls run on their own tasks so a slow desktop notifier never
// stalls a detector. The number of calls in flight is capped; past the cap a
// notification is skipped, the log line is still written.

use crate::core::config::NotificationConfig;
use crate::models::alert::Alert;
use crate::platform::notification::{Notification, Notifier};
use std::sync::atomic::{AtomicU64, Ordering};
use std::sync::Arc;
use tokio::sync::Semaphore;

#[derive(Debug, Clone, Copy, PartialEq, Eq, Default)]
pub struct SinkStats {
    pub logged: u64,
    pub notified: u64,
    pub skipped: u64,
}

#[derive(Default)]
struct Counters {
    logged: AtomicU64,
    notified: AtomicU64,
    skipped: AtomicU64,
}

#[derive(Clone)]
pub struct AlertSink {
    notifier: Arc<dyn Notifier>,
    enabled: bool,
    app_name: String,
    timeout_seconds: u32,
    in_flight: Arc<Semaphore>,
    counters: Arc<Counters>,
}

impl AlertSink {
    pub fn new(config: &NotificationConfig, notifier: Arc<dyn Notifier>) -> Self {
        Self {
            notifier,
            enabled: config.enabled,
            app_name: config.app_name.clone(),
            timeout_seconds: config.timeout_seconds,
            in_flight: Arc::new(Semaphore::new(config.max_in_flight.max(1))),
            counters: Arc::new(Counters::default()),
        }
    }

    /// Log the alert and, if the gate admitted it, notify without waiting.
    /// Must be called from within a tokio runtime.
    pub fn emit(&self, alert: &Alert) {
        tracing::warn!(
            alert_id = %alert.id,
            kind = alert.kind.to_string(),
            entity = alert.entity_id.as_deref().unwrap_or("-"),
            notify = alert.notify,
            "[ALERT] {} at {}",
            alert.message,
            alert.timestamp.format("%H:%M:%S")
        );
        self.counters.logged.fetch_add(1, Ordering::Relaxed);

        if alert.notify && self.enabled {
            self.dispatch(self.notification_for(alert));
        }
    }

    pub fn notification_for(&self, alert: &Alert) -> Notification {
        Notification {
            title: alert.kind.class().notification_title().to_string(),
            message: alert.message.clone(),
            app_name: self.app_name.clone(),
            timeout_seconds: self.timeout_seconds,
        }
    }

    fn dispatch(&self, notification: Notification) {
        let permit = match self.in_flight.clone().try_acquire_owned() {
            Ok(permit) => permit,
            Err(_) => {
                self.counters.skipped.fetch_add(1, Ordering::Relaxed);
                tracing::debug!(title = %notification.title, "Notification skipped, too many in flight");
                return;
            }
        };

        self.counters.notified.fetch_add(1, Ordering::Relaxed);
        let notifier = self.notifier.clone();
        tokio::spawn(async move {
            if let Err(e) = notifier.notify(&notification).await {
                tracing::warn!(title = %notification.title, "Failed to deliver notification: {}", e);
            }
            drop(permit);
        });
    }

    pub fn stats(&self) -> SinkStats {
        SinkStats {
            logged: self.counters.logged.load(Ordering::Relaxed),
            notified: self.counters.notified.load(Ordering::Relaxed),
            skipped: self.counters.skipped.load(Ordering::Relaxed),
        }
    }
}
