//! Per-service polling worker.
//!
//! Each worker runs an independent check-then-wait cycle: one immediate
//! check on start, then a probe per interval until cancelled or until
//! its record disappears from the registry. The interval and endpoint
//! are re-read from the registry every cycle, so re-registration takes
//! effect no later than the next completed wait.

use chrono::Utc;
use std::sync::Arc;
use std::time::Duration;
use tokio::time::sleep;
use tokio_util::sync::CancellationToken;
use tracing::{debug, warn};

use crate::checker::counters::Counters;
use crate::notifier::TransitionNotifier;
use crate::prober::Prober;
use crate::registry::Registry;

pub(crate) struct WorkerDeps {
    pub registry: Arc<dyn Registry>,
    pub prober: Arc<dyn Prober>,
    pub notifier: Arc<TransitionNotifier>,
    pub counters: Arc<Counters>,
}

pub(crate) async fn run(
    ctx: CancellationToken,
    name: String,
    initial_interval: Duration,
    deps: WorkerDeps,
) {
    debug!(
        component = "worker",
        event = "started",
        service = %name,
        interval = ?initial_interval,
        "service worker started"
    );

    // Freshly registered services report promptly: first check is
    // immediate, not a full interval away.
    perform_check(&name, &deps).await;

    let mut interval = initial_interval;
    loop {
        match deps.registry.get(&name) {
            Ok(Some(record)) => interval = record.interval,
            Ok(None) => {
                debug!(
                    component = "worker",
                    event = "record_gone",
                    service = %name,
                    "record removed from registry, worker stopping"
                );
                return;
            }
            // Keep the last known interval and retry on the next cycle.
            Err(e) => warn!(
                component = "worker",
                event = "registry_read_failed",
                service = %name,
                error = %e,
                "failed to refresh record, keeping previous interval"
            ),
        }

        tokio::select! {
            _ = ctx.cancelled() => {
                debug!(
                    component = "worker",
                    event = "stopped",
                    service = %name,
                    "service worker stopped"
                );
                return;
            }
            _ = sleep(interval) => {
                // An in-flight check is never interrupted, but a
                // cancellation that arrived during the wait wins the
                // race before the next check starts.
                if ctx.is_cancelled() {
                    return;
                }
                perform_check(&name, &deps).await;
            }
        }
    }
}

/// One check: probe, atomically record the result, evaluate the
/// transition. Any failure here is logged and absorbed so the worker
/// keeps its schedule, and one service's fault never reaches another's
/// worker.
async fn perform_check(name: &str, deps: &WorkerDeps) {
    let record = match deps.registry.get(name) {
        Ok(Some(record)) => record,
        Ok(None) => return,
        Err(e) => {
            warn!(
                component = "worker",
                event = "registry_read_failed",
                service = %name,
                error = %e,
                "failed to read record before check"
            );
            return;
        }
    };

    let outcome = deps.prober.probe(&record.endpoint).await;
    deps.counters.record_probe(outcome.status);

    match deps.registry.update_status(name, outcome.status, Utc::now()) {
        Ok(Some(change)) => {
            debug!(
                component = "worker",
                event = "check_completed",
                service = %name,
                prior = %change.prior,
                status = %change.current,
                "check completed"
            );
            deps.notifier.on_transition(&change).await;
        }
        Ok(None) => {
            // Deregistered while the probe was in flight. Nothing to
            // compare against, and the supervisor will cancel us shortly.
            debug!(
                component = "worker",
                event = "record_gone",
                service = %name,
                "record removed during check, result dropped"
            );
        }
        Err(e) => {
            warn!(
                component = "worker",
                event = "status_write_failed",
                service = %name,
                error = %e,
                "failed to record check result, retrying on next tick"
            );
        }
    }
}
