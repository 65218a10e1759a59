//! Service registry: the single source of truth for which services exist
//! and what was last observed about them.

pub mod snapshot;

use chrono::{DateTime, Utc};
use parking_lot::Mutex;
use std::collections::HashMap;
use std::path::PathBuf;
use tracing::{info, warn};

use crate::model::{ServiceRecord, Status, StatusChange};

#[derive(Debug, thiserror::Error)]
pub enum RegistryError {
    /// Malformed registration input. Surfaced synchronously, never retried.
    #[error("invalid registration: {0}")]
    InvalidRegistration(String),
    /// The backing store could not serve the request.
    #[error("registry backend unavailable: {0}")]
    Unavailable(String),
}

/// Concurrent-safe mapping from service name to its current record.
///
/// All mutations are serialized by the implementation; `all` returns a
/// point-in-time copy so callers never iterate racing state. Status
/// writes go through `update_status` only, which reports the prior
/// status read inside the same critical section as the write.
pub trait Registry: Send + Sync {
    /// Inserts or overwrites the record for `record.name`.
    ///
    /// Re-registering an existing name replaces endpoint, interval and
    /// recipients but preserves the observed status and last-check time;
    /// those belong to the probing pipeline. Returns the stored record.
    fn register(&self, record: ServiceRecord) -> Result<ServiceRecord, RegistryError>;

    fn get(&self, name: &str) -> Result<Option<ServiceRecord>, RegistryError>;

    /// Point-in-time snapshot of every record.
    fn all(&self) -> Result<Vec<ServiceRecord>, RegistryError>;

    /// Atomically reads the prior status, writes the new status and
    /// timestamp, and reports both. Returns `Ok(None)` for an unknown
    /// name; writing an identical status is a no-op beyond the
    /// timestamp refresh and yields `prior == current`.
    fn update_status(
        &self,
        name: &str,
        status: Status,
        at: DateTime<Utc>,
    ) -> Result<Option<StatusChange>, RegistryError>;

    /// Removes the record. Returns whether anything was removed.
    fn remove(&self, name: &str) -> Result<bool, RegistryError>;
}

/// Mutex-guarded in-memory registry with optional JSON snapshot
/// persistence. A single lock is fine here: the expected service count
/// is in the tens to low hundreds and every critical section is short.
pub struct InMemoryRegistry {
    records: Mutex<HashMap<String, ServiceRecord>>,
    snapshot_path: Option<PathBuf>,
}

impl InMemoryRegistry {
    pub fn new() -> Self {
        Self {
            records: Mutex::new(HashMap::new()),
            snapshot_path: None,
        }
    }

    /// Creates a registry persisted to `path`. Existing snapshot content
    /// is loaded eagerly; a corrupt or unreadable snapshot starts the
    /// registry empty with a warning rather than failing startup.
    pub fn with_snapshot(path: PathBuf) -> Self {
        let mut records = HashMap::new();
        match snapshot::load(&path) {
            Ok(Some(list)) => {
                info!(
                    component = "registry",
                    event = "snapshot_loaded",
                    path = %path.display(),
                    services = list.len(),
                    "registry snapshot loaded"
                );
                for rec in list {
                    records.insert(rec.name.clone(), rec);
                }
            }
            Ok(None) => {}
            Err(e) => {
                warn!(
                    component = "registry",
                    event = "snapshot_load_failed",
                    path = %path.display(),
                    error = %e,
                    "failed to load registry snapshot, starting empty"
                );
            }
        }

        Self {
            records: Mutex::new(records),
            snapshot_path: Some(path),
        }
    }

    /// Rewrites the snapshot file. Best-effort: persistence failures are
    /// logged and retried implicitly on the next mutation, they never
    /// reach the probing pipeline.
    fn persist_locked(&self, records: &HashMap<String, ServiceRecord>) {
        let Some(path) = &self.snapshot_path else {
            return;
        };
        let list: Vec<ServiceRecord> = records.values().cloned().collect();
        if let Err(e) = snapshot::save(path, &list) {
            warn!(
                component = "registry",
                event = "snapshot_save_failed",
                path = %path.display(),
                error = %e,
                "failed to persist registry snapshot"
            );
        }
    }
}

impl Default for InMemoryRegistry {
    fn default() -> Self {
        Self::new()
    }
}

impl Registry for InMemoryRegistry {
    fn register(&self, mut record: ServiceRecord) -> Result<ServiceRecord, RegistryError> {
        if record.name.trim().is_empty() {
            return Err(RegistryError::InvalidRegistration(
                "service name must not be empty".into(),
            ));
        }
        if record.endpoint.trim().is_empty() {
            return Err(RegistryError::InvalidRegistration(
                "service endpoint must not be empty".into(),
            ));
        }

        let mut records = self.records.lock();
        if let Some(existing) = records.get(&record.name) {
            // Status is owned by the probing pipeline, not registration.
            record.status = existing.status;
            record.last_checked = existing.last_checked;
        }
        records.insert(record.name.clone(), record.clone());
        self.persist_locked(&records);
        Ok(record)
    }

    fn get(&self, name: &str) -> Result<Option<ServiceRecord>, RegistryError> {
        Ok(self.records.lock().get(name).cloned())
    }

    fn all(&self) -> Result<Vec<ServiceRecord>, RegistryError> {
        Ok(self.records.lock().values().cloned().collect())
    }

    fn update_status(
        &self,
        name: &str,
        status: Status,
        at: DateTime<Utc>,
    ) -> Result<Option<StatusChange>, RegistryError> {
        let mut records = self.records.lock();
        let Some(record) = records.get_mut(name) else {
            return Ok(None);
        };

        let prior = record.status;
        record.status = status;
        record.last_checked = Some(at);
        let change = StatusChange {
            prior,
            current: status,
            record: record.clone(),
        };
        self.persist_locked(&records);
        Ok(Some(change))
    }

    fn remove(&self, name: &str) -> Result<bool, RegistryError> {
        let mut records = self.records.lock();
        let removed = records.remove(name).is_some();
        if removed {
            self.persist_locked(&records);
        }
        Ok(removed)
    }
}
