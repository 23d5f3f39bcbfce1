use async_trait::async_trait;

/// Notification port. Delivery is best-effort and fire-and-forget:
/// implementations log failures and never surface them to the caller.
#[async_trait]
pub trait AlertSink: Send + Sync {
    async fn send(&self, title: &str, body: &str);
}

/// Sink used when no alert channel is configured.
#[derive(Debug, Default)]
pub struct NullAlerts;

#[async_trait]
impl AlertSink for NullAlerts {
    async fn send(&self, title: &str, _body: &str) {
        tracing::debug!("Alert (no channel configured): {}", title);
    }
}
