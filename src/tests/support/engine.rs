// Full checker engine harness: registry + prober + notifier + supervisor
// with intervals short enough for tests to converge in milliseconds.

use std::sync::Arc;
use std::time::Duration;
use tokio::task::JoinHandle;
use tokio_util::sync::CancellationToken;

use crate::checker::{Counters, Supervisor};
use crate::config::{Checker, ClientErrorPolicy};
use crate::http::client::create_client;
use crate::model::Status;
use crate::notifier::TransitionNotifier;
use crate::prober::{HttpProber, Prober};
use crate::registry::{InMemoryRegistry, Registry};

use super::common::RecordingNotifier;

pub struct Engine {
    pub token: CancellationToken,
    pub registry: Arc<dyn Registry>,
    pub notifier: Arc<RecordingNotifier>,
    pub counters: Arc<Counters>,
    handle: JoinHandle<()>,
}

/// Checker settings tuned for tests: 50ms reconciliation, 1s probes.
pub fn fast_checker_cfg() -> Checker {
    Checker {
        reconcile_interval: Some(Duration::from_millis(50)),
        probe_timeout: Some(Duration::from_secs(1)),
        min_interval: Some(Duration::from_secs(10)),
        default_interval: Some(Duration::from_secs(30)),
        telemetry_interval: Some(Duration::from_secs(3600)),
        shutdown_timeout: Some(Duration::from_secs(5)),
        client_error_policy: Some(ClientErrorPolicy::Alarm),
    }
}

impl Engine {
    pub fn start() -> Self {
        Self::start_with(fast_checker_cfg())
    }

    pub fn start_with(cfg: Checker) -> Self {
        let token = CancellationToken::new();
        let registry: Arc<dyn Registry> = Arc::new(InMemoryRegistry::new());
        let notifier = RecordingNotifier::new();
        let counters = Arc::new(Counters::new());

        let prober: Arc<dyn Prober> = Arc::new(HttpProber::new(
            create_client().unwrap(),
            cfg.probe_timeout(),
            cfg.client_error_policy(),
        ));
        let transition = Arc::new(TransitionNotifier::new(
            notifier.clone(),
            counters.clone(),
        ));

        let supervisor = Supervisor::new(
            token.clone(),
            cfg,
            registry.clone(),
            prober,
            transition,
            counters.clone(),
        );
        let handle = tokio::spawn(supervisor.run());

        Self {
            token,
            registry,
            notifier,
            counters,
            handle,
        }
    }

    /// Current observed status for a service, if registered.
    pub fn status_of(&self, name: &str) -> Option<Status> {
        self.registry.get(name).unwrap().map(|r| r.status)
    }

    /// Cancels the engine and waits for the supervisor to drain.
    pub async fn stop(self) {
        self.token.cancel();
        let _ = self.handle.await;
    }
}
