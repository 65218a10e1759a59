//! Transition detection: decides which status changes deserve a
//! notification and dispatches them through the delivery collaborator.

use std::sync::Arc;
use tracing::{debug, info, warn};

use crate::checker::counters::Counters;
use crate::model::{Status, StatusChange};

use super::Notifier;

/// Notification predicate.
///
/// Fires on a change into a failure state, and on recovery out of one.
/// Repeated identical statuses and movement among non-failure states
/// stay silent.
pub fn should_notify(prior: Status, current: Status) -> bool {
    (current.is_failure() && current != prior) || (prior.is_failure() && current == Status::Up)
}

/// Compares consecutive statuses and hands qualifying transitions to
/// the delivery collaborator, exactly once per transition.
pub struct TransitionNotifier {
    delivery: Arc<dyn Notifier>,
    counters: Arc<Counters>,
}

impl TransitionNotifier {
    pub fn new(delivery: Arc<dyn Notifier>, counters: Arc<Counters>) -> Self {
        Self { delivery, counters }
    }

    /// Evaluates one completed check. Delivery failures are logged and
    /// swallowed: a broken relay must never stop future probing.
    pub async fn on_transition(&self, change: &StatusChange) {
        if !should_notify(change.prior, change.current) {
            return;
        }

        let service = &change.record.name;
        if change.record.recipients.is_empty() {
            debug!(
                component = "notifier",
                event = "no_recipients",
                service = %service,
                prior = %change.prior,
                current = %change.current,
                "qualifying transition without recipients, skipping delivery"
            );
            return;
        }

        let (subject, body) = build_message(change);
        match self
            .delivery
            .deliver(&change.record.recipients, &subject, &body)
            .await
        {
            Ok(()) => {
                self.counters.record_notification();
                info!(
                    component = "notifier",
                    event = "transition_notified",
                    service = %service,
                    prior = %change.prior,
                    current = %change.current,
                    "transition notification dispatched"
                );
            }
            Err(e) => {
                self.counters.record_delivery_failure();
                warn!(
                    component = "notifier",
                    event = "delivery_failed",
                    service = %service,
                    error = %e,
                    "notification delivery failed, probing continues"
                );
            }
        }
    }
}

/// Subject and body for a transition notice. Recoveries get their own
/// subject prefix so mail filters can tell them apart from alerts.
fn build_message(change: &StatusChange) -> (String, String) {
    let rec = &change.record;
    let subject = if change.current == Status::Up {
        format!("RECOVERED: {} -> {}", rec.name, change.current)
    } else {
        format!("ALERT: {} -> {}", rec.name, change.current)
    };

    let checked_at = rec
        .last_checked
        .map(|t| t.to_rfc3339())
        .unwrap_or_default();
    let body = format!(
        "Service: {}\nEndpoint: {}\nPrevious status: {}\nCurrent status: {}\nTime: {}",
        rec.name, rec.endpoint, change.prior, change.current, checked_at,
    );

    (subject, body)
}
