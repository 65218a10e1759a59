//! Worker supervisor.
//!
//! Keeps exactly one running worker per service present in the registry
//! and none for services that are gone, by reconciling the private
//! worker map against a registry snapshot on a fixed period. The worker
//! map is touched only from the supervisor's own loop, so it needs no
//! cross-component locking.

use std::collections::HashMap;
use std::sync::Arc;
use tokio::task::JoinHandle;
use tokio::time::{interval, timeout, MissedTickBehavior};
use tokio_util::sync::CancellationToken;
use tracing::{debug, info, warn};

use crate::checker::counters::{self, Counters};
use crate::checker::worker::{self, WorkerDeps};
use crate::config::Checker as CheckerCfg;
use crate::notifier::TransitionNotifier;
use crate::prober::Prober;
use crate::registry::Registry;

/// Association between a service name and the means to stop its worker.
/// Owned exclusively by the supervisor.
struct WorkerHandle {
    token: CancellationToken,
    handle: JoinHandle<()>,
}

pub struct Supervisor {
    shutdown_token: CancellationToken,
    cfg: CheckerCfg,
    registry: Arc<dyn Registry>,
    prober: Arc<dyn Prober>,
    notifier: Arc<TransitionNotifier>,
    counters: Arc<Counters>,
}

impl Supervisor {
    pub fn new(
        shutdown_token: CancellationToken,
        cfg: CheckerCfg,
        registry: Arc<dyn Registry>,
        prober: Arc<dyn Prober>,
        notifier: Arc<TransitionNotifier>,
        counters: Arc<Counters>,
    ) -> Arc<Self> {
        Arc::new(Self {
            shutdown_token,
            cfg,
            registry,
            prober,
            notifier,
            counters,
        })
    }

    /// Runs the reconciliation loop until shutdown, then drains every
    /// live worker bounded by the shutdown deadline.
    pub async fn run(self: Arc<Self>) {
        let mut workers: HashMap<String, WorkerHandle> = HashMap::new();

        let mut reconcile = interval(self.cfg.reconcile_interval());
        reconcile.set_missed_tick_behavior(MissedTickBehavior::Skip);
        let mut telemetry = interval(self.cfg.telemetry_interval());
        telemetry.set_missed_tick_behavior(MissedTickBehavior::Skip);

        info!(
            component = "supervisor",
            event = "started",
            reconcile_interval = ?self.cfg.reconcile_interval(),
            "supervisor started"
        );

        loop {
            tokio::select! {
                _ = self.shutdown_token.cancelled() => {
                    self.drain(workers).await;
                    return;
                }
                _ = reconcile.tick() => {
                    self.reconcile(&mut workers);
                }
                _ = telemetry.tick() => {
                    counters::log_stats(&self.counters, workers.len());
                }
            }
        }
    }

    /// One reconciliation pass. A registry read failure is logged and
    /// retried on the next pass; it is never fatal.
    fn reconcile(&self, workers: &mut HashMap<String, WorkerHandle>) {
        let snapshot = match self.registry.all() {
            Ok(snapshot) => snapshot,
            Err(e) => {
                warn!(
                    component = "supervisor",
                    event = "reconcile_failed",
                    error = %e,
                    "failed to snapshot registry, retrying next pass"
                );
                return;
            }
        };

        // Workers stop on their own when their record disappears. Drop
        // those handles first, otherwise a stale entry would shadow a
        // service that was removed and re-registered between passes.
        workers.retain(|name, worker| {
            let finished = worker.handle.is_finished();
            if finished {
                debug!(
                    component = "supervisor",
                    event = "worker_reaped",
                    service = %name,
                    "finished worker handle dropped"
                );
            }
            !finished
        });

        // Start a worker for every service without one. Spawning never
        // blocks this loop; workers run independently.
        for record in &snapshot {
            if workers.contains_key(&record.name) {
                continue;
            }

            let token = self.shutdown_token.child_token();
            let deps = WorkerDeps {
                registry: self.registry.clone(),
                prober: self.prober.clone(),
                notifier: self.notifier.clone(),
                counters: self.counters.clone(),
            };
            let handle = tokio::spawn(worker::run(
                token.clone(),
                record.name.clone(),
                record.interval,
                deps,
            ));
            workers.insert(record.name.clone(), WorkerHandle { token, handle });

            info!(
                component = "supervisor",
                event = "worker_started",
                service = %record.name,
                "worker started for registered service"
            );
        }

        // Cancel workers whose services are gone.
        workers.retain(|name, worker| {
            let live = snapshot.iter().any(|record| record.name == *name);
            if !live {
                worker.token.cancel();
                info!(
                    component = "supervisor",
                    event = "worker_cancelled",
                    service = %name,
                    "worker cancelled for removed service"
                );
            }
            live
        });
    }

    /// Cancels every live worker and waits for each to observe the
    /// cancellation, bounded by the configured shutdown deadline.
    async fn drain(&self, workers: HashMap<String, WorkerHandle>) {
        let total = workers.len();
        info!(
            component = "supervisor",
            event = "drain_started",
            workers = total,
            "cancelling all workers"
        );

        let deadline = self.cfg.shutdown_timeout();
        for worker in workers.values() {
            worker.token.cancel();
        }

        let join_all = async {
            for (name, worker) in workers {
                if let Err(e) = worker.handle.await {
                    warn!(
                        component = "supervisor",
                        event = "worker_join_failed",
                        service = %name,
                        error = %e,
                        "worker task ended abnormally"
                    );
                }
            }
        };

        match timeout(deadline, join_all).await {
            Ok(()) => {
                info!(
                    component = "supervisor",
                    event = "drain_completed",
                    workers = total,
                    "all workers stopped"
                );
            }
            Err(_) => {
                warn!(
                    component = "supervisor",
                    event = "drain_timeout",
                    timeout = ?deadline,
                    "not all workers stopped within the shutdown deadline"
                );
            }
        }

        debug!(component = "supervisor", event = "stopped", "supervisor stopped");
    }
}
