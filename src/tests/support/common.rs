// Common test utilities for integration tests.

use async_trait::async_trait;
use std::path::PathBuf;
use std::sync::atomic::{AtomicBool, AtomicUsize, Ordering};
use std::sync::{Arc, Mutex};
use std::time::Duration;

use crate::model::ServiceRecord;
use crate::notifier::{DeliveryError, Notifier};

/// One captured notification.
#[derive(Debug, Clone)]
pub struct Delivery {
    pub recipients: Vec<String>,
    pub subject: String,
    pub body: String,
}

/// Notifier that records every delivery instead of sending anything.
/// Can be toggled to fail for delivery-failure tests.
pub struct RecordingNotifier {
    deliveries: Mutex<Vec<Delivery>>,
    fail: AtomicBool,
}

impl RecordingNotifier {
    pub fn new() -> Arc<Self> {
        Arc::new(Self {
            deliveries: Mutex::new(Vec::new()),
            fail: AtomicBool::new(false),
        })
    }

    pub fn set_failing(&self, failing: bool) {
        self.fail.store(failing, Ordering::Relaxed);
    }

    pub fn count(&self) -> usize {
        self.deliveries.lock().unwrap().len()
    }

    pub fn deliveries(&self) -> Vec<Delivery> {
        self.deliveries.lock().unwrap().clone()
    }

    pub fn subjects(&self) -> Vec<String> {
        self.deliveries
            .lock()
            .unwrap()
            .iter()
            .map(|d| d.subject.clone())
            .collect()
    }
}

#[async_trait]
impl Notifier for RecordingNotifier {
    async fn deliver(
        &self,
        recipients: &[String],
        subject: &str,
        body: &str,
    ) -> Result<(), DeliveryError> {
        if self.fail.load(Ordering::Relaxed) {
            return Err(DeliveryError("relay unreachable".into()));
        }
        self.deliveries.lock().unwrap().push(Delivery {
            recipients: recipients.to_vec(),
            subject: subject.to_string(),
            body: body.to_string(),
        });
        Ok(())
    }
}

/// Builds a record with recipients, ready for registration.
pub fn test_record(name: &str, endpoint: &str, interval: Duration) -> ServiceRecord {
    ServiceRecord::new(
        name.to_string(),
        endpoint.to_string(),
        interval,
        vec!["ops@example.com".to_string()],
    )
}

/// Unique temp file path for snapshot tests.
pub fn temp_snapshot_path(tag: &str) -> PathBuf {
    static SEQ: AtomicUsize = AtomicUsize::new(0);
    let seq = SEQ.fetch_add(1, Ordering::Relaxed);
    std::env::temp_dir().join(format!(
        "healthmon-test-{}-{}-{}.json",
        tag,
        std::process::id(),
        seq
    ))
}

/// Polls `check` until it returns true or the timeout elapses.
pub async fn wait_until<F>(timeout: Duration, check: F) -> bool
where
    F: Fn() -> bool,
{
    let deadline = tokio::time::Instant::now() + timeout;
    loop {
        if check() {
            return true;
        }
        if tokio::time::Instant::now() >= deadline {
            return false;
        }
        tokio::time::sleep(Duration::from_millis(20)).await;
    }
}
