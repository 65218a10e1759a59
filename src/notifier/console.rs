// Console delivery: writes notifications to the structured log.

use async_trait::async_trait;
use tracing::info;

use super::{DeliveryError, Notifier};

/// Log-based delivery. Stands in for an SMTP relay in deployments that
/// have none configured.
pub struct ConsoleNotifier;

impl ConsoleNotifier {
    pub fn new() -> Self {
        Self
    }
}

impl Default for ConsoleNotifier {
    fn default() -> Self {
        Self::new()
    }
}

#[async_trait]
impl Notifier for ConsoleNotifier {
    async fn deliver(
        &self,
        recipients: &[String],
        subject: &str,
        body: &str,
    ) -> Result<(), DeliveryError> {
        info!(
            component = "notifier",
            event = "delivered",
            recipients = ?recipients,
            subject = %subject,
            body = %body,
            "notification"
        );
        Ok(())
    }
}
