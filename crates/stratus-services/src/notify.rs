//! User-visible notifications.

use async_trait::async_trait;
use parking_lot::Mutex;

pub const ALERT_TITLE: &str = "Weather Alert";
pub const UNAVAILABLE_TEXT: &str = "Unable to fetch weather data";

#[derive(Debug, Clone, PartialEq, Eq)]
pub struct Notification {
    /// Alert the notification belongs to
    pub id: String,
    pub title: String,
    pub body: String,
}

impl Notification {
    /// Alert notification; `description` of `None` uses the placeholder text.
    pub fn weather_alert(alert_id: &str, description: Option<&str>) -> Self {
        Self {
            id: alert_id.to_string(),
            title: ALERT_TITLE.to_string(),
            body: format!("({})", description.unwrap_or(UNAVAILABLE_TEXT)),
        }
    }
}

#[async_trait]
pub trait Notifier: Send + Sync {
    /// Whether the host currently allows posting notifications.
    fn permission_granted(&self) -> bool;

    async fn notify(&self, notification: Notification) -> anyhow::Result<()>;
}

/// Writes notifications to the log and stdout.
#[derive(Debug, Clone)]
pub struct LogNotifier {
    permitted: bool,
}

impl LogNotifier {
    pub fn new(permitted: bool) -> Self {
        Self { permitted }
    }
}

#[async_trait]
impl Notifier for LogNotifier {
    fn permission_granted(&self) -> bool {
        self.permitted
    }

    async fn notify(&self, notification: Notification) -> anyhow::Result<()> {
        tracing::info!(alert = %notification.id, "{}: {}", notification.title, notification.body);
        println!("🔔 {} {}", notification.title, notification.body);
        Ok(())
    }
}

/// Keeps every notification in memory.
#[derive(Debug, Default)]
pub struct RecordingNotifier {
    denied: bool,
    sent: Mutex<Vec<Notification>>,
}

impl RecordingNotifier {
    pub fn new() -> Self {
        Self::default()
    }

    /// A notifier whose permission check always fails.
    pub fn denied() -> Self {
        Self {
            denied: true,
            ..Self::default()
        }
    }

    pub fn sent(&self) -> Vec<Notification> {
        self.sent.lock().clone()
    }
}

#[async_trait]
impl Notifier for RecordingNotifier {
    fn permission_granted(&self) -> bool {
        !self.denied
    }

    async fn notify(&self, notification: Notification) -> anyhow::Result<()> {
        self.sent.lock().push(notification);
        Ok(())
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_alert_body_wraps_description() {
        let n = Notification::weather_alert("a1", Some("light rain"));
        assert_eq!(n.title, "Weather Alert");
        assert_eq!(n.body, "(light rain)");
    }

    #[test]
    fn test_alert_body_placeholder() {
        let n = Notification::weather_alert("a1", None);
        assert_eq!(n.body, "(Unable to fetch weather data)");
    }

    #[tokio::test]
    async fn test_recording_notifier() {
        let notifier = RecordingNotifier::new();
        assert!(notifier.permission_granted());
        notifier
            .notify(Notification::weather_alert("x", Some("clear sky")))
            .await
            .unwrap();
        assert_eq!(notifier.sent().len(), 1);
        assert!(!RecordingNotifier::denied().permission_granted());
    }
}
