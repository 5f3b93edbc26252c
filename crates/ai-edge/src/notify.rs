//! Notification sink (§4.8): SMTP or an HTTP provider is an external
//! collaborator (§1), so this stays one trait with a deterministic
//! log-only implementation standing in for it — the same "one trait,
//! swappable implementation" shape as `ai_proctor::evidence::EvidenceSink`.

use async_trait::async_trait;

#[async_trait]
pub trait NotificationSink: Send + Sync {
    async fn send(&self, to: &str, subject: &str, body: &str) -> Result<(), String>;
}

/// Logs the notification instead of delivering it. Good enough for a
/// deployment with no SMTP/provider configured, and for tests.
pub struct LogNotificationSink;

#[async_trait]
impl NotificationSink for LogNotificationSink {
    async fn send(&self, to: &str, subject: &str, body: &str) -> Result<(), String> {
        tracing::info!(to, subject, body, "notification (log sink, not delivered)");
        Ok(())
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[tokio::test]
    async fn log_sink_never_fails() {
        let sink = LogNotificationSink;
        sink.send("candidate@example.com", "Interview scheduled", "details")
            .await
            .unwrap();
    }
}
