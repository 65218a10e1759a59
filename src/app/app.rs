// Main monitor application implementation.

use anyhow::Result;
use std::path::PathBuf;
use std::sync::Arc;
use tokio_util::sync::CancellationToken;
use tracing::{error, info, warn};

use crate::checker::{Counters, Supervisor};
use crate::config::{Config, ConfigTrait};
use crate::http::client::create_client;
use crate::model::ServiceRecord;
use crate::notifier::{ConsoleNotifier, Notifier, TransitionNotifier};
use crate::prober::{HttpProber, Prober};
use crate::registry::{InMemoryRegistry, Registry};
use crate::shutdown::GracefulShutdown;

use super::server::ApiServer;

/// Encapsulates the entire monitor application state.
pub struct App {
    shutdown_token: CancellationToken,
    registry: Arc<dyn Registry>,
    supervisor: Arc<Supervisor>,
    server: Arc<ApiServer>,
}

impl App {
    /// Creates a new monitor application instance: registry (with
    /// optional snapshot persistence), prober, notifier, supervisor and
    /// API server, plus any services seeded from config.
    pub fn new(shutdown_token: CancellationToken, cfg: Config) -> Result<Self> {
        let registry: Arc<dyn Registry> = match cfg
            .registry()
            .and_then(|r| r.snapshot_path.as_ref())
        {
            Some(path) => Arc::new(InMemoryRegistry::with_snapshot(PathBuf::from(path))),
            None => Arc::new(InMemoryRegistry::new()),
        };

        seed_services(&cfg, registry.as_ref());

        let checker_cfg = cfg.checker();
        let client = create_client()?;
        let prober: Arc<dyn Prober> = Arc::new(HttpProber::new(
            client,
            checker_cfg.probe_timeout(),
            checker_cfg.client_error_policy(),
        ));

        let counters = Arc::new(Counters::new());
        let delivery: Arc<dyn Notifier> = Arc::new(ConsoleNotifier::new());
        let notifier = Arc::new(TransitionNotifier::new(delivery, counters.clone()));

        let supervisor = Supervisor::new(
            shutdown_token.clone(),
            checker_cfg,
            registry.clone(),
            prober,
            notifier,
            counters,
        );

        let server = Arc::new(ApiServer::new(
            shutdown_token.clone(),
            cfg,
            registry.clone(),
        )?);

        Ok(Self {
            shutdown_token,
            registry,
            supervisor,
            server,
        })
    }

    /// Starts the supervisor and the API server in background tasks.
    /// Both register with the graceful shutdown handler; the server
    /// going away triggers a full shutdown.
    pub fn serve(&self, gsh: Arc<GracefulShutdown>) {
        gsh.add(2);

        let supervisor = self.supervisor.clone();
        let gsh_supervisor = gsh.clone();
        tokio::task::spawn(async move {
            supervisor.run().await;
            gsh_supervisor.done();
        });

        let server = self.server.clone();
        let token = self.shutdown_token.clone();
        tokio::task::spawn(async move {
            if let Err(e) = server.listen_and_serve().await {
                error!(
                    component = "app",
                    scope = "server",
                    event = "serve_failed",
                    error = %e,
                    "server failed to serve"
                );
            }
            token.cancel();
            gsh.done();
        });

        info!(component = "app", event = "started", "application lifecycle");
    }

    #[allow(dead_code)]
    pub fn registry(&self) -> Arc<dyn Registry> {
        self.registry.clone()
    }
}

/// Registers the services listed in the config file, before the first
/// reconciliation pass picks them up.
fn seed_services(cfg: &Config, registry: &dyn Registry) {
    let checker = cfg.checker();
    for seed in cfg.services() {
        let interval = checker.clamp_interval(seed.interval);
        let record = ServiceRecord::new(
            seed.name.clone(),
            seed.endpoint.clone(),
            interval,
            seed.recipients.clone(),
        );
        match registry.register(record) {
            Ok(stored) => info!(
                component = "app",
                event = "service_seeded",
                service = %stored.name,
                endpoint = %stored.endpoint,
                interval = ?stored.interval,
                "service auto-registered from config"
            ),
            Err(e) => warn!(
                component = "app",
                event = "service_seed_failed",
                service = %seed.name,
                error = %e,
                "skipping invalid service entry from config"
            ),
        }
    }
}
