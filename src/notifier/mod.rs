//! Notification delivery and transition detection.

pub mod console;
pub mod transition;

pub use console::ConsoleNotifier;
pub use transition::{should_notify, TransitionNotifier};

use async_trait::async_trait;

#[derive(Debug, thiserror::Error)]
#[error("notification delivery failed: {0}")]
pub struct DeliveryError(pub String);

/// Delivery collaborator. Best-effort by contract: the engine logs
/// failures and moves on, so implementations should fail fast rather
/// than retry internally.
#[async_trait]
pub trait Notifier: Send + Sync {
    async fn deliver(
        &self,
        recipients: &[String],
        subject: &str,
        body: &str,
    ) -> Result<(), DeliveryError>;
}
